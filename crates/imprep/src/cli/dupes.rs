//! The `imprep dupes` command: near-duplicate groups across a corpus.

use clap::Args;
use imprep_core::{Config, ImageProcessor, ProcessingStats, RawImage, RecallIndex};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::common::{batch_size, create_progress_bar, print_summary, tick, OutputArgs};

/// Arguments for the `dupes` command.
#[derive(Args, Debug)]
pub struct DupesArgs {
    /// Image directory to search
    #[arg(required = true)]
    pub input: PathBuf,

    /// Maximum Hamming distance (defaults to `recall.max_distance`)
    #[arg(short = 'd', long)]
    pub max_distance: Option<u32>,

    /// Let color images match grayscale ones
    #[arg(long)]
    pub across_color: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Execute the dupes command.
pub async fn execute(args: DupesArgs, config: &Config) -> anyhow::Result<()> {
    let mut config = config.clone();
    config.recall.match_across_color |= args.across_color;
    let max_distance = args.max_distance.unwrap_or(config.recall.max_distance);

    let start = Instant::now();
    let (index, mut stats) = build_index(&args.input, &config).await?;
    let groups = index.duplicate_groups(max_distance);
    let duplicates: usize = groups.iter().map(|g| g.duplicates.len()).sum();
    tracing::info!(
        "Found {} groups ({} duplicates) within distance {}",
        groups.len(),
        duplicates,
        max_distance
    );

    let mut writer = args.output.open(&config)?;
    for group in &groups {
        writer.push(group)?;
    }
    writer.finish()?;

    stats.finish(start.elapsed());
    print_summary(
        "Duplicates",
        &stats,
        &[("Groups", groups.len()), ("Duplicates", duplicates)],
    );
    Ok(())
}

/// Decode every image under `input` and index it by path.
///
/// Images are decoded on the async pipeline and fingerprinted in parallel
/// batches so at most a few batches of pixels are resident at once. Failed
/// images are logged and counted.
pub(crate) async fn build_index(
    input: &Path,
    config: &Config,
) -> anyhow::Result<(RecallIndex<PathBuf>, ProcessingStats)> {
    let processor = ImageProcessor::new(config);
    let files = processor.discover(input);
    if files.is_empty() {
        anyhow::bail!("No supported images found at {}", input.display());
    }
    tracing::info!("Indexing {} images", files.len());

    let mut index = RecallIndex::from_config(config);
    let batch_size = batch_size(config);
    let mut batch: Vec<(PathBuf, RawImage)> = Vec::with_capacity(batch_size);
    let progress = create_progress_bar(files.len() as u64);
    let mut stats = ProcessingStats::default();
    let start = Instant::now();

    for file in &files {
        match processor.load(&file.path).await {
            Ok(decoded) => {
                stats.succeeded += 1;
                batch.push((file.path.clone(), decoded.image));
            }
            Err(e) => {
                stats.failed += 1;
                tracing::error!("Failed: {:?} - {}", file.path, e);
            }
        }
        if batch.len() >= batch_size {
            index.extend_par(std::mem::take(&mut batch));
        }
        tick(&progress, stats.succeeded + stats.failed, start);
    }
    index.extend_par(batch);
    progress.finish_and_clear();

    tracing::debug!("Indexed {} images in {:?}", index.len(), start.elapsed());
    Ok((index, stats))
}

//! The `imprep query` command: ranked matches for one image.

use anyhow::Context;
use clap::Args;
use imprep_core::{Config, ImageProcessor, QueryReport};
use std::path::PathBuf;

use super::common::OutputArgs;
use super::dupes::build_index;

/// Arguments for the `query` command.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Image to look up
    #[arg(required = true)]
    pub image: PathBuf,

    /// Corpus directory to search
    #[arg(required = true)]
    pub corpus: PathBuf,

    /// Maximum Hamming distance (defaults to `recall.max_distance`)
    #[arg(short = 'd', long)]
    pub max_distance: Option<u32>,

    /// Let color images match grayscale ones
    #[arg(long)]
    pub across_color: bool,

    /// Report at most this many matches
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Execute the query command.
pub async fn execute(args: QueryArgs, config: &Config) -> anyhow::Result<()> {
    let mut config = config.clone();
    config.recall.match_across_color |= args.across_color;
    let report = run(&args, &config).await?;

    tracing::info!(
        "{} matches for {:?} within distance {}",
        report.matches.len(),
        report.query,
        report.max_distance
    );
    let mut writer = args.output.open(&config)?;
    writer.write(&report)?;
    writer.finish()?;
    Ok(())
}

async fn run(args: &QueryArgs, config: &Config) -> anyhow::Result<QueryReport> {
    let max_distance = args.max_distance.unwrap_or(config.recall.max_distance);
    let processor = ImageProcessor::new(config);
    let needle = processor
        .load(&args.image)
        .await
        .with_context(|| format!("Cannot load query image {}", args.image.display()))?;

    let (index, _) = build_index(&args.corpus, config).await?;
    let mut matches = index.query(&needle.image, max_distance);
    if let Some(limit) = args.limit {
        matches.truncate(limit);
    }

    Ok(QueryReport {
        query: args.image.clone(),
        max_distance,
        matches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imprep_core::{Pixel, PixelMode, RawImage};
    use std::path::Path;

    fn save(path: &Path, value: impl Fn(u32, u32) -> u8) {
        let mut image = RawImage::filled(24, 24, PixelMode::Luma, Pixel::new(&[0])).unwrap();
        for (x, y, _) in image.clone().pixels() {
            image.put_pixel(x, y, Pixel::new(&[value(x, y)]));
        }
        image.to_dynamic().save(path).unwrap();
    }

    fn args(image: PathBuf, corpus: PathBuf) -> QueryArgs {
        QueryArgs {
            image,
            corpus,
            max_distance: None,
            across_color: false,
            limit: None,
            output: OutputArgs::default(),
        }
    }

    #[tokio::test]
    async fn test_query_ranks_exact_copy_first() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        let diagonal = |x: u32, y: u32| (5 * x + 4 * y + 7) as u8;
        save(&corpus.join("copy-1.png"), diagonal);
        save(&corpus.join("other-1.png"), |x, y| (5 * (23 - x) + 4 * y + 7) as u8);
        let needle = dir.path().join("needle.png");
        save(&needle, diagonal);

        let report = run(&args(needle.clone(), corpus.clone()), &Config::default())
            .await
            .unwrap();
        assert_eq!(report.query, needle);
        assert_eq!(report.matches[0].id, corpus.join("copy-1.png"));
        assert_eq!(report.matches[0].distance, 0);
        assert!(report.matches.iter().all(|m| m.distance <= 6));

        let mut limited = args(needle, corpus);
        limited.max_distance = Some(64);
        limited.limit = Some(1);
        let report = run(&limited, &Config::default()).await.unwrap();
        assert_eq!(report.matches.len(), 1);
    }

    #[tokio::test]
    async fn test_query_missing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &args(dir.path().join("nope.png"), dir.path().to_path_buf()),
            &Config::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("nope.png"));
    }
}

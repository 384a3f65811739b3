//! The `imprep scan` command: one normalization record per image.

use clap::Args;
use imprep_core::{Config, ImageProcessor, ProcessingStats};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::common::{batch_size, create_progress_bar, print_summary, tick, OutputArgs};

/// Arguments for the `scan` command.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Image file or directory to scan
    #[arg(required = true)]
    pub input: PathBuf,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Execute the scan command.
///
/// Files are processed in order-preserving parallel batches on the rayon
/// pool. Failed images are logged and counted; the batch continues.
pub async fn execute(args: ScanArgs, config: &Config) -> anyhow::Result<()> {
    let processor = Arc::new(ImageProcessor::new(config));
    let files = processor.discover(&args.input);
    if files.is_empty() {
        anyhow::bail!("No supported images found at {}", args.input.display());
    }
    tracing::info!("Scanning {} images", files.len());

    let mut writer = args.output.open(config)?;
    let progress = create_progress_bar(files.len() as u64);
    let mut stats = ProcessingStats::default();
    let start = Instant::now();

    for chunk in files.chunks(batch_size(config)) {
        let worker = Arc::clone(&processor);
        let owned = chunk.to_vec();
        let results = tokio::task::spawn_blocking(move || worker.process_batch(&owned)).await?;

        for (file, result) in chunk.iter().zip(results) {
            match result {
                Ok(record) => {
                    stats.succeeded += 1;
                    writer.push(&record)?;
                }
                Err(e) => {
                    stats.failed += 1;
                    tracing::error!("Failed: {:?} - {}", file.path, e);
                }
            }
        }
        tick(&progress, stats.succeeded + stats.failed, start);
    }

    writer.finish()?;
    progress.finish_and_clear();
    stats.finish(start.elapsed());
    if let Some(path) = &args.output.output {
        tracing::info!("Output written to {:?}", path);
    }
    print_summary("Scan", &stats, &[]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use imprep_core::{Pixel, PixelMode, RawImage};

    #[tokio::test]
    async fn test_scan_writes_records_and_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        RawImage::filled(8, 8, PixelMode::Rgb, Pixel::new(&[10, 20, 30]))
            .unwrap()
            .to_dynamic()
            .save(corpus.join("img-2.png"))
            .unwrap();
        std::fs::write(corpus.join("img-1.png"), b"broken").unwrap();

        let out = dir.path().join("records.jsonl");
        let args = ScanArgs {
            input: corpus,
            output: OutputArgs {
                output: Some(out.clone()),
                format: Some(super::super::common::OutputFormat::Jsonl),
                pretty: false,
            },
        };
        execute(args, &Config::default()).await.unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["file_name"], "img-2.png");
        assert_eq!(lines[0]["is_color"], true);
    }

    #[tokio::test]
    async fn test_scan_spans_batches_in_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        std::fs::create_dir(&corpus).unwrap();
        for i in 1..=11u8 {
            RawImage::filled(6, 6, PixelMode::Luma, Pixel::new(&[i * 20]))
                .unwrap()
                .to_dynamic()
                .save(corpus.join(format!("page-{i}.png")))
                .unwrap();
        }
        std::fs::write(corpus.join("page-5b.png"), b"broken").unwrap();

        let mut config = Config::default();
        config.processing.parallel_workers = 1;
        assert!(batch_size(&config) < 12);

        let out = dir.path().join("records.json");
        let args = ScanArgs {
            input: corpus,
            output: OutputArgs {
                output: Some(out.clone()),
                format: Some(super::super::common::OutputFormat::Json),
                pretty: false,
            },
        };
        execute(args, &config).await.unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        let names: Vec<String> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["file_name"].as_str().unwrap().to_string())
            .collect();
        let expected: Vec<String> = (1..=11).map(|i| format!("page-{i}.png")).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn test_scan_empty_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = ScanArgs {
            input: dir.path().to_path_buf(),
            output: OutputArgs::default(),
        };
        assert!(execute(args, &Config::default()).await.is_err());
    }
}

//! Pieces shared by the batch commands: output flags, progress, summaries.

use clap::{Args, ValueEnum};
use imprep_core::{Config, OutputFormat as CoreOutputFormat, OutputWriter, ProcessingStats};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::PathBuf;

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON value; batches become an array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Output flags shared by `scan`, `dupes` and `query`.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (defaults to `output.format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl OutputArgs {
    /// Resolve flags against the config and open the destination.
    pub fn open(&self, config: &Config) -> anyhow::Result<OutputWriter<Box<dyn Write>>> {
        let format = self
            .format
            .map(CoreOutputFormat::from)
            .unwrap_or_else(|| CoreOutputFormat::from_config(&config.output));
        let pretty = self.pretty || config.output.pretty;
        Ok(OutputWriter::create(self.output.as_deref(), format, pretty)?)
    }
}

/// Images held in memory per worker before a parallel pass.
const IMAGES_PER_WORKER: usize = 8;

/// Number of images handed to the rayon pool at once.
pub fn batch_size(config: &Config) -> usize {
    config.processing.parallel_workers.max(1) * IMAGES_PER_WORKER
}

/// Create a progress bar for batch processing.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Update the rate message after one more item.
pub fn tick(progress: &ProgressBar, processed: usize, start: std::time::Instant) {
    progress.inc(1);
    let elapsed = start.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        progress.set_message(format!("{:.1} img/sec", processed as f64 / elapsed));
    }
}

/// Print a formatted summary table to stderr.
pub fn print_summary(title: &str, stats: &ProcessingStats, extra: &[(&str, usize)]) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("  {:^34}", title);
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    for (label, value) in extra {
        eprintln!("    {:<14}{:>8}", format!("{label}:"), value);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.1} img/sec", stats.images_per_second);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_flag_overrides_config() {
        let mut config = Config::default();
        config.output.format = "jsonl".into();
        assert_eq!(
            CoreOutputFormat::from(OutputFormat::Json),
            CoreOutputFormat::Json
        );
        assert_eq!(
            CoreOutputFormat::from_config(&config.output),
            CoreOutputFormat::JsonLines
        );
    }

    #[test]
    fn test_open_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let args = OutputArgs {
            output: Some(path.clone()),
            format: Some(OutputFormat::Json),
            pretty: false,
        };
        let mut writer = args.open(&Config::default()).unwrap();
        writer.push(&serde_json::json!({"id": 1})).unwrap();
        writer.finish().unwrap();
        drop(writer);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[{\"id\":1}]\n");
    }
}

//! JSON and JSON Lines output for records and reports.

use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::config::OutputConfig;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// A single JSON value; batches become an array
    Json,
    /// One JSON object per line
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }

    /// The configured default. Validation guarantees a known name.
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::parse(&config.format).unwrap_or(Self::Json)
    }
}

/// Serializes items to a file or stdout.
///
/// JSON Lines items are written as they arrive. JSON items are buffered by
/// `push` and written as one array by `finish`, so a partially failed batch
/// still yields a valid document.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    pending: Vec<serde_json::Value>,
    items_written: usize,
}

impl OutputWriter<Box<dyn Write>> {
    /// Open `path` for writing, or stdout when `None`.
    pub fn create(path: Option<&Path>, format: OutputFormat, pretty: bool) -> io::Result<Self> {
        let writer: Box<dyn Write> = match path {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };
        Ok(Self::new(writer, format, pretty))
    }
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer. `pretty` only affects JSON.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            pending: Vec::new(),
            items_written: 0,
        }
    }

    /// Write one standalone value immediately.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        if self.pretty && self.format == OutputFormat::Json {
            serde_json::to_writer_pretty(&mut self.writer, item).map_err(io::Error::other)?;
        } else {
            serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        }
        writeln!(self.writer)?;
        self.items_written += 1;
        Ok(())
    }

    /// Add one element of a batch.
    pub fn push<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::JsonLines => self.write(item),
            OutputFormat::Json => {
                let value = serde_json::to_value(item).map_err(io::Error::other)?;
                self.pending.push(value);
                Ok(())
            }
        }
    }

    /// Write a whole batch.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        for item in items {
            self.push(item)?;
        }
        self.finish()
    }

    /// Emit any buffered JSON array and flush.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            let pending = std::mem::take(&mut self.pending);
            let count = pending.len();
            if self.pretty {
                serde_json::to_writer_pretty(&mut self.writer, &pending)
                    .map_err(io::Error::other)?;
            } else {
                serde_json::to_writer(&mut self.writer, &pending).map_err(io::Error::other)?;
            }
            writeln!(self.writer)?;
            self.items_written += count;
        }
        self.writer.flush()
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        distance: u32,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "a-1.png",
                distance: 0,
            },
            Row {
                name: "a-2.png",
                distance: 3,
            },
        ]
    }

    #[test]
    fn test_jsonl_one_line_per_item() {
        let mut writer = OutputWriter::new(Vec::new(), OutputFormat::JsonLines, true);
        writer.write_all(&rows()).unwrap();
        assert_eq!(writer.items_written(), 2);
        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], r#"{"name":"a-2.png","distance":3}"#);
    }

    #[test]
    fn test_json_batch_is_array() {
        let mut writer = OutputWriter::new(Vec::new(), OutputFormat::Json, false);
        for row in rows() {
            writer.push(&row).unwrap();
        }
        assert_eq!(writer.items_written(), 0);
        writer.finish().unwrap();
        assert_eq!(writer.items_written(), 2);
        let output = String::from_utf8(writer.into_inner()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_json_batch() {
        let mut writer = OutputWriter::new(Vec::new(), OutputFormat::Json, false);
        writer.finish().unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "[]\n");
    }

    #[test]
    fn test_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let mut writer = OutputWriter::create(Some(&path), OutputFormat::JsonLines, false).unwrap();
        writer.write(&rows()[0]).unwrap();
        writer.finish().unwrap();
        drop(writer);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("a-1.png"));
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("NDJSON"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("csv"), None);
        assert_eq!(
            OutputFormat::from_config(&OutputConfig::default()),
            OutputFormat::Json
        );
    }
}

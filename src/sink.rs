use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::record::{JobRecord, CSV_HEADERS};

const BLOCK_DELIMITER: &str = "---";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("serialising record: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Written,
    Duplicate,
}

/// Delete a sink file left over from a previous run.
pub fn remove_stale(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => info!("Removed old: {}", path.display()),
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}

fn open_append(path: &Path) -> Result<File, SinkError> {
    let io_err = |source| SinkError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)
}

/// Append-only CSV file; the header goes in when this sink creates the file.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &JobRecord) -> Result<(), SinkError> {
        let is_new = !self.path.exists();
        let file = open_append(&self.path)?;
        let csv_err = |source| SinkError::Csv {
            path: self.path.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(CSV_HEADERS).map_err(csv_err)?;
        }
        writer.write_record(record.row()).map_err(csv_err)?;
        writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Pretty JSON block per record, each followed by a `---` line.
pub struct TextSink {
    path: PathBuf,
}

impl TextSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &JobRecord) -> Result<(), SinkError> {
        let block = serde_json::to_string_pretty(record)?;
        let mut file = open_append(&self.path)?;
        writeln!(file, "{}\n{}", block, BLOCK_DELIMITER).map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Run-scoped dedup in front of both sinks.
pub struct SinkWriter {
    seen: HashSet<String>,
    csv: CsvSink,
    text: Option<TextSink>,
}

impl SinkWriter {
    pub fn new(csv: CsvSink, text: Option<TextSink>) -> Self {
        Self {
            seen: HashSet::new(),
            csv,
            text,
        }
    }

    pub fn csv_path(&self) -> &Path {
        self.csv.path()
    }

    pub fn text_path(&self) -> Option<&Path> {
        self.text.as_ref().map(TextSink::path)
    }

    /// Write `record` unless its `job_url` was already written this run.
    /// Sink failures are logged; one failing sink does not skip the other.
    pub fn accept(&mut self, record: &JobRecord) -> Accepted {
        if !self.seen.insert(record.job_url.clone()) {
            return Accepted::Duplicate;
        }

        if let Err(e) = self.csv.append(record) {
            warn!(error = %e, "CSV write failed");
        }
        if let Some(text) = &self.text {
            if let Err(e) = text.append(record) {
                warn!(error = %e, "text sink write failed");
            }
        }
        Accepted::Written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32) -> JobRecord {
        JobRecord {
            title: "Rust Engineer, Platform".into(),
            company: "Acme \"Labs\"".into(),
            location: "Austin, TX".into(),
            posted_date: "2024-05-13".into(),
            job_url: format!("https://www.linkedin.com/jobs/view/{}/", id),
        }
    }

    #[test]
    fn csv_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/applications.csv");
        let sink = CsvSink::new(&path);
        sink.append(&record(1)).unwrap();
        sink.append(&record(2)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "title,company,location,posted date,job url");
        assert_eq!(
            lines[1],
            r#""Rust Engineer, Platform","Acme ""Labs""","Austin, TX",2024-05-13,https://www.linkedin.com/jobs/view/1/"#
        );
    }

    #[test]
    fn existing_csv_gets_no_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("applications.csv");
        CsvSink::new(&path).append(&record(1)).unwrap();
        CsvSink::new(&path).append(&record(2)).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("title,company").count(), 1);
    }

    #[test]
    fn text_blocks_delimited() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.ndjson");
        let sink = TextSink::new(&path);
        sink.append(&record(1)).unwrap();
        sink.append(&record(2)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let blocks: Vec<_> = content.split("\n---\n").filter(|b| !b.trim().is_empty()).collect();
        assert_eq!(blocks.len(), 2);
        let first: serde_json::Value = serde_json::from_str(blocks[0]).unwrap();
        assert_eq!(first["job url"], "https://www.linkedin.com/jobs/view/1/");
        assert_eq!(first["posted date"], "2024-05-13");
        assert!(content.ends_with("---\n"));
    }

    #[test]
    fn duplicates_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("a.csv");
        let txt_path = dir.path().join("a.txt");
        let mut writer = SinkWriter::new(CsvSink::new(&csv_path), Some(TextSink::new(&txt_path)));

        assert_eq!(writer.accept(&record(7)), Accepted::Written);
        let csv_before = fs::read_to_string(&csv_path).unwrap();
        let txt_before = fs::read_to_string(&txt_path).unwrap();

        assert_eq!(writer.accept(&record(7)), Accepted::Duplicate);
        assert_eq!(fs::read_to_string(&csv_path).unwrap(), csv_before);
        assert_eq!(fs::read_to_string(&txt_path).unwrap(), txt_before);
    }

    #[test]
    fn text_sink_optional() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("a.csv");
        let mut writer = SinkWriter::new(CsvSink::new(&csv_path), None);
        assert_eq!(writer.accept(&record(1)), Accepted::Written);
        assert!(writer.text_path().is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failing_csv_does_not_block_text_sink() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the CSV file should be
        let csv_path = dir.path().join("blocked");
        fs::create_dir(&csv_path).unwrap();
        let txt_path = dir.path().join("jobs.txt");
        let mut writer = SinkWriter::new(CsvSink::new(&csv_path), Some(TextSink::new(&txt_path)));

        assert_eq!(writer.accept(&record(1)), Accepted::Written);
        assert!(fs::read_to_string(&txt_path).unwrap().contains("jobs/view/1/"));
    }

    #[test]
    fn remove_stale_deletes_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.csv");
        fs::write(&path, "stale").unwrap();
        remove_stale(&path);
        assert!(!path.exists());
        remove_stale(&path);
    }
}

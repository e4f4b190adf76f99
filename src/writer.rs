use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::{Result, TRACKING_COLUMN};

/// A record that can be laid out as one flat CSV row.
pub trait Row {
    /// Column names, in the order `fields` produces them.
    fn columns() -> Vec<&'static str>;

    fn fields(&self) -> Result<Vec<String>>;
}

/// Where the crawl loop hands finished records.
pub trait Sink<R> {
    fn append(&mut self, id: u64, record: &R) -> Result<()>;
}

/// Appends rows to a CSV file. Every call opens the file in append mode,
/// writes a single row and flushes, so nothing is buffered across calls.
#[derive(Debug, Clone)]
pub struct CsvAppender {
    path: PathBuf,
}

impl CsvAppender {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<R: Row> Sink<R> for CsvAppender {
    fn append(&mut self, id: u64, record: &R) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let mut row = Vec::with_capacity(R::columns().len() + 1);
        row.push(id.to_string());
        row.extend(record.fields()?);
        wtr.write_record(&row)?;
        wtr.flush()?;
        Ok(())
    }
}

/// Creates `path` with a header row (`url_id` plus the record columns) unless it
/// already exists with some content. Parent directories are created as needed.
pub fn ensure_header<R: Row>(path: &Path) -> Result<()> {
    if fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false) {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::Writer::from_writer(File::create(path)?);
    let mut header = vec![TRACKING_COLUMN];
    header.extend(R::columns());
    wtr.write_record(&header)?;
    wtr.flush()?;
    Ok(())
}

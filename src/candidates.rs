use std::fs::File;
use std::path::Path;

use crate::config::Partition;
use crate::{info_time, Error, Result};

const URL_COLUMN: &str = "url";

/// One unit of crawl work. `id` is the row position in the full candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: u64,
    pub url: String,
}

impl WorkItem {
    pub fn new(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }
}

/// Reads the `url` column of a CSV file, numbering rows from 0 and keeping
/// only the rows inside `partition`. Ids are never renumbered by the slice.
pub fn load_candidates(path: &Path, partition: Partition) -> Result<Vec<WorkItem>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(File::open(path)?);

    let url_idx = rdr
        .headers()?
        .iter()
        .position(|h| h == URL_COLUMN)
        .ok_or_else(|| Error::MissingColumn {
            column: URL_COLUMN,
            path: path.to_path_buf(),
        })?;

    let mut items = Vec::new();
    for (position, record) in rdr.records().enumerate() {
        if partition.end.is_some_and(|end| position >= end) {
            break;
        }
        let record = record?;
        if !partition.contains(position) {
            continue;
        }
        let url = record.get(url_idx).unwrap_or_default();
        items.push(WorkItem::new(position as u64, url));
    }

    info_time!(
        "Loaded {} candidates from {} in rows {:?}",
        items.len(),
        path.display(),
        partition
    );
    Ok(items)
}

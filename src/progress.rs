use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::candidates::WorkItem;
use crate::{info_time, Error, Result, TRACKING_COLUMN};

/// Ids already present in the tracking column of the output file.
/// A missing or empty file means nothing is done yet.
pub fn done_ids(output: &Path) -> Result<HashSet<u64>> {
    let file = match File::open(output) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e.into()),
    };
    if file.metadata()?.len() == 0 {
        return Ok(HashSet::new());
    }

    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let id_idx = rdr
        .headers()?
        .iter()
        .position(|h| h.trim() == TRACKING_COLUMN)
        .ok_or_else(|| Error::MissingColumn {
            column: TRACKING_COLUMN,
            path: output.to_path_buf(),
        })?;

    let mut done = HashSet::new();
    for record in rdr.records() {
        let record = record?;
        let Some(raw) = record.get(id_idx) else {
            continue;
        };
        let raw = raw.trim();
        let id = raw
            .parse::<u64>()
            .map_err(|_| Error::BadIdentifier(raw.to_string()))?;
        done.insert(id);
    }
    Ok(done)
}

/// Candidates whose id is not yet in `output`, in their original order.
///
/// This is a snapshot taken once per run; rows appended later in the same run are not seen.
pub fn remaining(candidates: Vec<WorkItem>, output: &Path) -> Result<Vec<WorkItem>> {
    let done = done_ids(output)?;
    let total = candidates.len();
    let remaining: Vec<WorkItem> = candidates
        .into_iter()
        .filter(|item| !done.contains(&item.id))
        .collect();

    info_time!(
        "{} of {} candidates already in {}, {} remaining",
        total - remaining.len(),
        total,
        output.display(),
        remaining.len()
    );
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn items(ids: &[u64]) -> Vec<WorkItem> {
        ids.iter()
            .map(|&id| WorkItem::new(id, format!("https://example.org/{id}")))
            .collect()
    }

    #[test]
    fn missing_or_empty_output_means_all_remaining() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        assert_eq!(remaining(items(&[0, 1, 2]), &path).unwrap(), items(&[0, 1, 2]));

        fs::write(&path, "").unwrap();
        assert_eq!(remaining(items(&[0, 1, 2]), &path).unwrap(), items(&[0, 1, 2]));
    }

    #[test]
    fn written_ids_are_filtered_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "url_id,match_id\n4,900\n1,901\n").unwrap();

        let left = remaining(items(&[0, 1, 2, 3, 4, 5]), &path).unwrap();
        assert_eq!(left, items(&[0, 2, 3, 5]));
    }

    #[test]
    fn header_without_tracking_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "match_id\n900\n").unwrap();

        let err = done_ids(&path).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { column: "url_id", .. }));
    }

    #[test]
    fn garbage_identifier_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "url_id\nabc\n").unwrap();

        assert!(matches!(done_ids(&path), Err(Error::BadIdentifier(s)) if s == "abc"));
    }
}

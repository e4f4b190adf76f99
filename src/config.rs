use std::path::PathBuf;
use std::time::Duration;

use crate::{
    BASE_URL, DATA_DIR, FETCH_TIMEOUT, STATS_ATTEMPTS, THROTTLE_EVERY, THROTTLE_PAUSE, URLS_FILE,
};

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Prefix for the relative links found on match reports.
    pub base_url: String,
    pub urls_file: PathBuf,
    pub data_dir: PathBuf,
    /// Output is written to `<data_dir>/matches/<output_name>.csv`.
    pub output_name: String,
    pub partition: Partition,
    pub fetch_timeout: Duration,
    /// Overrides the randomized user agent when set.
    pub user_agent: Option<String>,
    pub throttle: Throttle,
    pub stats_attempts: usize,
    pub on_missing: OnMissing,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            urls_file: PathBuf::from(URLS_FILE),
            data_dir: PathBuf::from(DATA_DIR),
            output_name: String::from("matches"),
            partition: Partition::default(),
            fetch_timeout: FETCH_TIMEOUT,
            user_agent: None,
            throttle: Throttle::default(),
            stats_attempts: STATS_ATTEMPTS,
            on_missing: OnMissing::default(),
        }
    }
}

impl CrawlConfig {
    pub fn output_path(&self) -> PathBuf {
        self.data_dir
            .join("matches")
            .join(format!("{}.csv", self.output_name))
    }
}

/// Row range `[start, end)` of the candidate list handled by one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Partition {
    pub start: usize,
    /// `None` runs to the end of the list.
    pub end: Option<usize>,
}

impl Partition {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && self.end.map_or(true, |end| position < end)
    }
}

/// Pause for `pause` after every `every` successful writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    pub every: usize,
    pub pause: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            every: THROTTLE_EVERY,
            pause: THROTTLE_PAUSE,
        }
    }
}

/// What the extractor does when an optional field is absent from a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OnMissing {
    Fail,
    #[default]
    SkipAndLog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_bounds_are_half_open() {
        let p = Partition::new(10, Some(20));
        assert!(!p.contains(9));
        assert!(p.contains(10));
        assert!(p.contains(19));
        assert!(!p.contains(20));

        let open = Partition::new(20, None);
        assert!(open.contains(usize::MAX));
        assert!(!open.contains(0));
    }

    #[test]
    fn output_lands_under_matches_dir() {
        let conf = CrawlConfig {
            data_dir: PathBuf::from("/tmp/data"),
            output_name: "bundesliga".into(),
            ..Default::default()
        };
        assert_eq!(conf.output_path(), PathBuf::from("/tmp/data/matches/bundesliga.csv"));
    }
}

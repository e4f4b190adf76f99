//! Resumable scraper for football match reports.
//!
//! Walks a list of candidate match URLs, skips the ones already present in the
//! output CSV, and appends one row per successfully extracted match.

mod error;
mod macros;

pub mod candidates;
pub mod config;
pub mod parse;
pub mod process;
pub mod progress;
pub mod request;
pub mod user_agent;
pub mod writer;

pub use config::{CrawlConfig, OnMissing, Partition};
pub use error::{Error, Result};
pub use process::{run_partition, CrawlSummary, Crawler, Pause, WallClock};
pub use request::{Fetch, HttpFetcher, Page};

use std::time::Duration;

const BASE_URL: &str = "https://www.transfermarkt.com";
const DATA_DIR: &str = "data";
const URLS_FILE: &str = "data/urls/match_urls.csv";
/// Column of the output file that holds the candidate row position.
pub const TRACKING_COLUMN: &str = "url_id";
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const THROTTLE_EVERY: usize = 50;
const THROTTLE_PAUSE: Duration = Duration::from_secs(30);
/// Attempts at the statistics sub-page before giving up on it.
const STATS_ATTEMPTS: usize = 7;

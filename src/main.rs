use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::Parser;
use matchscrap::config::Throttle;
use matchscrap::{info_time, run_partition, CrawlConfig, OnMissing, Partition, Result};

/// Crawl match reports into `<data-dir>/matches/<output>.csv`, resuming where the last run stopped.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Output file name, without directory or extension
    #[arg(long, short, env = "MATCHSCRAP_OUTPUT", default_value = "matches")]
    output: String,
    /// First candidate row of this partition
    #[arg(long, default_value_t = 0)]
    start: usize,
    /// Row after the last candidate of this partition
    #[arg(long)]
    end: Option<usize>,
    /// CSV file with a `url` column
    #[arg(long, env = "MATCHSCRAP_URLS_FILE")]
    urls_file: Option<PathBuf>,
    #[arg(long, env = "MATCHSCRAP_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Prefix for relative links found on match reports
    #[arg(long, env = "MATCHSCRAP_BASE_URL")]
    base_url: Option<String>,
    /// Successful writes between two cooldowns, 0 disables the throttle
    #[arg(long)]
    throttle_every: Option<usize>,
    /// Cooldown length in seconds
    #[arg(long)]
    throttle_secs: Option<u64>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Pin the user agent instead of randomizing it per request
    #[arg(long, env = "MATCHSCRAP_USER_AGENT")]
    user_agent: Option<String>,
    /// What to do when an optional field is missing from a page
    #[arg(value_enum, long, default_value_t = OnMissing::SkipAndLog)]
    on_missing: OnMissing,
}

impl From<Args> for CrawlConfig {
    fn from(args: Args) -> Self {
        let mut conf = CrawlConfig {
            output_name: args.output,
            partition: Partition::new(args.start, args.end),
            user_agent: args.user_agent,
            on_missing: args.on_missing,
            ..Default::default()
        };
        if let Some(urls_file) = args.urls_file {
            conf.urls_file = urls_file;
        }
        if let Some(data_dir) = args.data_dir {
            conf.data_dir = data_dir;
        }
        if let Some(base_url) = args.base_url {
            conf.base_url = base_url;
        }
        let Throttle { every, pause } = conf.throttle;
        conf.throttle = Throttle {
            every: args.throttle_every.unwrap_or(every),
            pause: args.throttle_secs.map(Duration::from_secs).unwrap_or(pause),
        };
        if let Some(secs) = args.timeout_secs {
            conf.fetch_timeout = Duration::from_secs(secs);
        }
        conf
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let config = CrawlConfig::from(Args::parse());
    run_partition(&config).await?;
    info_time!(start_time, "Full program time:");

    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;

use crate::candidates::{load_candidates, WorkItem};
use crate::config::{CrawlConfig, Throttle};
use crate::parse::{Extract, MatchExtractor, MatchRecord};
use crate::progress::remaining;
use crate::request::{Fetch, HttpFetcher};
use crate::user_agent::{FixedUserAgent, RandomUserAgent, UserAgentSource};
use crate::writer::{ensure_header, CsvAppender, Sink};
use crate::{info_time, warn_time, Result};

/// Cooldown capability used by the throttle.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

/// Real timer sleep.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock;

#[async_trait]
impl Pause for WallClock {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub attempted: usize,
    pub written: usize,
    pub skipped: usize,
    pub pauses: usize,
}

/// Sequential crawl over the remaining work.
///
/// A failed fetch is never retried: the loop skips forward to the next item.
/// Every `throttle.every` successful writes it pauses for `throttle.pause`.
/// Extraction and write errors abort the run; rows already appended stay and
/// are skipped by the next run.
pub struct Crawler<F, E, P> {
    fetcher: F,
    extractor: E,
    pause: P,
    throttle: Throttle,
}

impl<F, E, P> Crawler<F, E, P>
where
    F: Fetch,
    E: Extract,
    P: Pause,
{
    pub fn new(fetcher: F, extractor: E, pause: P, throttle: Throttle) -> Self {
        Self {
            fetcher,
            extractor,
            pause,
            throttle,
        }
    }

    pub async fn run<S>(&self, remaining: Vec<WorkItem>, sink: &mut S) -> Result<CrawlSummary>
    where
        S: Sink<E::Record>,
    {
        let mut summary = CrawlSummary::default();
        let mut since_pause = 0;

        for WorkItem { id, url } in remaining {
            summary.attempted += 1;
            info_time!("getting {id} {url}");

            let page = match self.fetcher.fetch(&url).await {
                Some(page) if page.is_success() => page,
                Some(page) => {
                    warn_time!("skipping {id} {url}: status {}", page.status);
                    summary.skipped += 1;
                    continue;
                }
                None => {
                    warn_time!("skipping {id} {url}");
                    summary.skipped += 1;
                    continue;
                }
            };

            let record = self.extractor.extract(&page).await?;
            sink.append(id, &record)?;
            summary.written += 1;
            info_time!("{} got {id} {url}", page.status);

            since_pause += 1;
            if self.throttle.every > 0 && since_pause == self.throttle.every {
                since_pause = 0;
                summary.pauses += 1;
                info_time!("cooling down for {:?}", self.throttle.pause);
                self.pause.pause(self.throttle.pause).await;
            }
        }

        Ok(summary)
    }
}

/// Crawls the candidate rows selected by `config.partition` into the configured output file,
/// skipping every row a previous run already wrote.
pub async fn run_partition(config: &CrawlConfig) -> Result<CrawlSummary> {
    let start_time = Local::now();
    let output = config.output_path();

    let candidates = load_candidates(&config.urls_file, config.partition)?;
    ensure_header::<MatchRecord>(&output)?;
    let remaining = remaining(candidates, &output)?;

    let agents: Arc<dyn UserAgentSource> = match &config.user_agent {
        Some(ua) => Arc::new(FixedUserAgent(ua.clone())),
        None => Arc::new(RandomUserAgent),
    };
    let fetcher = HttpFetcher::new(config.fetch_timeout, agents)?;
    let extractor = MatchExtractor::new(
        fetcher.clone(),
        config.base_url.clone(),
        config.stats_attempts,
        config.on_missing,
    );
    let crawler = Crawler::new(fetcher, extractor, WallClock, config.throttle);

    let mut sink = CsvAppender::new(&output);
    let summary = crawler.run(remaining, &mut sink).await?;
    info_time!(
        start_time,
        "Finished {}: {} written, {} skipped",
        output.display(),
        summary.written,
        summary.skipped
    );

    Ok(summary)
}

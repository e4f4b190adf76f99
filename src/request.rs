use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;

use crate::user_agent::UserAgentSource;
use crate::{warn_time, Result};

/// A successfully downloaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Final URL, after redirects.
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Page fetch capability. Failures come back as `None`, retry policy belongs to the caller.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<Page>;
}

/// `reqwest` backed fetcher. A fresh user agent is asked for on every request.
#[derive(Clone)]
pub struct HttpFetcher {
    // Client uses Arc so we can clone cheaply
    client: Client,
    agents: Arc<dyn UserAgentSource>,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, agents: Arc<dyn UserAgentSource>) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, agents })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<Page> {
        let res = match self
            .client
            .get(url)
            .header(USER_AGENT, self.agents.user_agent())
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                warn_time!("request failed {url}: {e}");
                return None;
            }
        };

        let status = res.status();
        if !status.is_success() {
            warn_time!("{status} for {url}");
            return None;
        }

        let final_url = res.url().to_string();
        match res.text().await {
            Ok(body) => Some(Page {
                url: final_url,
                status: status.as_u16(),
                body,
            }),
            Err(e) => {
                warn_time!("couldn't read body of {url}: {e}");
                None
            }
        }
    }
}

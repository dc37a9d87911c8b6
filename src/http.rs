use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ScrapeConfig;
use crate::error::{Error, Result};

/// HTTP front end for stats.ncaa.org: throttled, retried, status-checked.
pub(crate) struct HttpClient {
    client: reqwest::Client,
    politeness: Duration,
    retries: u32,
    backoff: Duration,
}

impl HttpClient {
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(Error::Client)?;
        Ok(Self {
            client,
            politeness: config.politeness,
            retries: config.retries,
            backoff: config.backoff,
        })
    }

    /// Fetch a page body. Sleeps the politeness delay before each request and
    /// retries transient failures with exponential backoff.
    pub async fn get(&self, url: &str) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            if !self.politeness.is_zero() {
                tokio::time::sleep(self.politeness).await;
            }
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(err) if attempt < self.retries && is_transient(&err) => {
                    let wait = self.backoff * 2u32.saturating_pow(attempt);
                    warn!(url, attempt, "transient failure, retrying in {wait:?}: {err}");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| Error::Request {
                url: url.to_string(),
                source,
            })?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(Error::status(status, url));
        }
        response.text().await.map_err(|source| Error::Request {
            url: url.to_string(),
            source,
        })
    }
}

fn is_transient(err: &Error) -> bool {
    match err {
        Error::Status { status, .. } => matches!(status, 408 | 429 | 500 | 502 | 503 | 504),
        Error::Request { source, .. } => source.is_timeout() || source.is_connect(),
        _ => false,
    }
}

// src/atp/client.rs
use std::future::Future;
use std::time::Duration;

use reqwest::header;

use super::models::SITE_ROOT;
use super::retry::{self, RetryPolicy};
use crate::dom::{DocumentTree, Marker};
use crate::extractors::section;
use crate::utils::error::FetchError;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Everything the acquisition side needs, fixed at construction time.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub site_root: String,
    /// Minimum pause before every request.
    pub request_delay: Duration,
    /// Random extra pause added to `request_delay`.
    pub delay_jitter: Duration,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            site_root: SITE_ROOT.to_string(),
            request_delay: Duration::from_millis(1000),
            delay_jitter: Duration::from_millis(4000),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Produces a ready document for a URL once `wait_for` is present in it.
pub trait Fetcher {
    fn fetch(
        &self,
        url: &str,
        wait_for: &Marker,
        timeout: Duration,
    ) -> impl Future<Output = Result<DocumentTree, FetchError>> + Send;
}

/// Plain HTTP acquisition with pacing and bounded retries.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// One attempt: pace, download, parse and check for the wait marker.
    async fn fetch_once(&self, url: &str, wait_for: &Marker, timeout: Duration) -> Result<DocumentTree, FetchError> {
        // --- Request pacing ---
        let pause = self.config.request_delay + retry::jitter(self.config.delay_jitter);
        tracing::debug!("Sleeping {:?} before requesting {}", pause, url);
        tokio::time::sleep(pause).await;

        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, "text/html,application/xhtml+xml,*/*")
            .send();
        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| timed_out(url, wait_for, timeout))??;

        // Check if the request was successful (status code 2xx)
        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("Received {} - slowing down may help.", status);
                return Err(FetchError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(FetchError::NotFound(url.to_string()));
            }
            return Err(FetchError::Http(status));
        }

        let body = response.text().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);

        let tree = DocumentTree::parse(&body);
        let ready = matches!(section::find_one(&tree, wait_for), Ok(Some(_)));
        if !ready {
            return Err(timed_out(url, wait_for, timeout));
        }
        Ok(tree)
    }
}

fn timed_out(url: &str, wait_for: &Marker, timeout: Duration) -> FetchError {
    FetchError::Timeout {
        url: url.to_string(),
        marker: wait_for.to_string(),
        timeout,
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        wait_for: &Marker,
        timeout: Duration,
    ) -> impl Future<Output = Result<DocumentTree, FetchError>> + Send {
        async move {
            tracing::info!("Fetching {}", url);
            self.config
                .retry
                .run(url, |_| self.fetch_once(url, wait_for, timeout))
                .await
        }
    }
}

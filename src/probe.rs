//! HTTP probing and page fetching
//!
//! One shared blocking-free reqwest client for the whole run. Fetch failures
//! of any kind (connect, timeout, TLS, DNS, HTTP error status, non-HTML body)
//! collapse to `None`; the distinction only matters at debug verbosity.

use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use reqwest::Client;

use crate::candidates::CandidateUrl;
use crate::config::HttpConfig;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct PageFetchResult {
    /// URL after redirects, used for provenance and link resolution
    pub final_url: String,
    pub status: u16,
    pub html: String,
    pub fetch_duration: Duration,
}

/// Shared HTTP client with run-wide timeout and user agent
pub struct ProbeClient {
    client: Client,
}

impl ProbeClient {
    pub fn new(config: &HttpConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .redirect(Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch a single page, returning `None` on any failure.
    ///
    /// Only 2xx responses whose content type is HTML (or unspecified) count
    /// as success. Error details go to debug logging, never to the caller.
    pub async fn fetch_page(&self, url: &str) -> Option<PageFetchResult> {
        let start = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url, error = %e, "request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "non-success status");
            return None;
        }

        if let Some(content_type) = response.headers().get(reqwest::header::CONTENT_TYPE) {
            let value = content_type.to_str().unwrap_or("");
            if !is_html_content_type(value) {
                tracing::debug!(url, content_type = value, "skipping non-HTML response");
                return None;
            }
        }

        let final_url = response.url().to_string();
        let status = status.as_u16();

        let html = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(url, error = %e, "failed to read response body");
                return None;
            }
        };

        Some(PageFetchResult {
            final_url,
            status,
            html,
            fetch_duration: start.elapsed(),
        })
    }

    /// Probe candidates in rank order, stopping at the first success.
    ///
    /// Later candidates are never contacted once one resolves.
    pub async fn probe_candidates(
        &self,
        candidates: &[CandidateUrl],
    ) -> Option<(CandidateUrl, PageFetchResult)> {
        for candidate in candidates {
            if let Some(page) = self.fetch_page(&candidate.url).await {
                return Some((candidate.clone(), page));
            }
        }
        None
    }
}

fn is_html_content_type(value: &str) -> bool {
    let value = value.to_lowercase();
    value.contains("text/html") || value.contains("application/xhtml")
}

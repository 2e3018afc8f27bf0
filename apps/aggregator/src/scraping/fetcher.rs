use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

/// Returns the HTML of a listing page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// What a link check concluded about a listed job URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Alive,
    /// Gone for good: 404/410, or the host cannot be reached at all.
    Dead,
    /// Blocked, rate limited, failing server side or timed out. Try again next sweep.
    Inconclusive,
}

impl LinkStatus {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            s if s.is_success() || s.is_redirection() => LinkStatus::Alive,
            StatusCode::NOT_FOUND | StatusCode::GONE => LinkStatus::Dead,
            _ => LinkStatus::Inconclusive,
        }
    }

    fn from_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            LinkStatus::Inconclusive
        } else if err.is_connect() {
            LinkStatus::Dead
        } else {
            LinkStatus::Inconclusive
        }
    }
}

/// Checks whether a previously listed job URL still answers.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn check(&self, url: &str) -> LinkStatus;
}

/// Plain HTTP fetcher with browser-like headers. No JavaScript rendering.
#[derive(Clone)]
pub struct SiteFetcher {
    client: reqwest::Client,
}

impl SiteFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("fr-MA,fr;q=0.9,ar-MA;q=0.6,en;q=0.5"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for SiteFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        debug!("Fetched {url} ({} bytes)", body.len());
        Ok(body)
    }
}

#[async_trait]
impl LinkProbe for SiteFetcher {
    async fn check(&self, url: &str) -> LinkStatus {
        let mut response = self.client.head(url).send().await;
        // Some servers refuse HEAD outright; ask again with GET.
        if let Ok(r) = &response {
            if matches!(
                r.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            ) {
                response = self.client.get(url).send().await;
            }
        }

        match response {
            Ok(r) => {
                let status = LinkStatus::from_status(r.status());
                debug!("Link check {url}: {} -> {status:?}", r.status());
                status
            }
            Err(e) => {
                let status = LinkStatus::from_error(&e);
                debug!("Link check {url} failed: {e} -> {status:?}");
                status
            }
        }
    }
}

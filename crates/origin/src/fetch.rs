//! Origin client.

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tracing::debug;

use crate::OriginError;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues GET requests against the origin site.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` and return the body as text.
    async fn get_text(&self, url: &str) -> Result<String, OriginError>;

    /// Fetch `url` and parse the body as JSON.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, OriginError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| OriginError::Parse(format!("JSON from {url}: {e}")))
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, OriginError> {
        Self::with_timeout(FETCH_TIMEOUT)
    }

    /// Client whose requests give up after `timeout`, connect included.
    pub fn with_timeout(timeout: Duration) -> Result<Self, OriginError> {
        Self::from_builder(client_builder(timeout))
    }

    fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, OriginError> {
        let client = builder
            .build()
            .map_err(|e| OriginError::Fetch(format!("build http client: {e}")))?;
        Ok(Self { client })
    }
}

fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("es-ES,es;q=0.9"));

    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, OriginError> {
        debug!(url = %url, "origin request");

        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                OriginError::Fetch(format!("timed out fetching {url}"))
            } else {
                OriginError::Fetch(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            return Err(OriginError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        resp.text()
            .await
            .map_err(|e| OriginError::Fetch(format!("read body of {url}: {e}")))
    }
}

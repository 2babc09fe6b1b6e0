//! Remote text sources
//!
//! `HttpSource` fetches over HTTP. `StaticSource` serves bodies registered
//! up front (offline runs and tests) and counts fetches.

use crate::config::Config;
use crate::error::{FetchError, Result};
use async_trait::async_trait;
use parser::decode_text;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch the resource at `url` as decoded text
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

// =============================================================================
// HTTP
// =============================================================================

#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("fetching {}", url);
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = resp.bytes().await?;
        debug!("downloaded {} bytes from {}", bytes.len(), url);
        Ok(decode_text(&bytes))
    }
}

// =============================================================================
// Static bodies
// =============================================================================

#[derive(Debug, Default)]
pub struct StaticSource {
    bodies: RwLock<HashMap<String, String>>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    pub fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        if let Ok(mut bodies) = self.bodies.write() {
            bodies.insert(url.into(), body.into());
        }
    }

    pub fn remove(&self, url: &str) {
        if let Ok(mut bodies) = self.bodies.write() {
            bodies.remove(url);
        }
    }

    /// Number of fetch attempts made so far, including failed ones
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for StaticSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let bodies = self
            .bodies
            .read()
            .map_err(|_| FetchError::Store("static source lock poisoned".to_string()))?;
        bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_serves_bodies() {
        let source = StaticSource::new().with("https://x/a.csv", "a,b\n");
        assert_eq!(source.fetch_text("https://x/a.csv").await.unwrap(), "a,b\n");
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_static_source_unknown_url() {
        let source = StaticSource::new();
        let err = source.fetch_text("https://x/missing.csv").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_static_source_remove() {
        let source = StaticSource::new().with("u", "body");
        source.remove("u");
        assert!(source.fetch_text("u").await.is_err());
    }
}

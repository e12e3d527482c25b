//! Where the dataset bytes come from on a cache miss

use async_trait::async_trait;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::LexiconConfig;
use crate::error::{LexiconError, Result};

/// Fetches the raw dataset bytes; the content is opaque at this layer
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Downloads the dataset over HTTP
pub struct HttpSource {
    url: String,
    http_client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Self {
        // Only the connect phase is bounded; a large body may take a while
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: url.into(),
            http_client,
        }
    }

    pub fn from_config(config: &LexiconConfig) -> Self {
        Self::new(config.dataset_url())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        info!("[Source] Downloading dataset from {}", self.url);
        let response = self.http_client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LexiconError::Fetch(format!(
                "GET {} returned {}",
                self.url, status
            )));
        }

        let bytes = response.bytes().await?;
        info!("[Source] Downloaded {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads the dataset from a local file
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DatasetSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|e| {
            LexiconError::Fetch(format!("{}: {}", self.path.display(), e))
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

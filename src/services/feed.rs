// src/services/feed.rs

//! Feed retrieval.
//!
//! Downloads the compressed sign feed, or reads a previously saved copy for
//! offline runs.

use std::path::PathBuf;

use reqwest::Client;

use crate::error::Result;
use crate::models::FeedConfig;
use crate::utils::http::create_async_client;

/// Where the compressed feed comes from.
enum Source {
    Http { url: String, client: Client },
    File(PathBuf),
}

/// Fetches the raw compressed feed bytes.
pub struct FeedFetcher {
    source: Source,
}

impl FeedFetcher {
    /// Fetch from the configured remote endpoint.
    pub fn remote(config: &FeedConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        Ok(Self {
            source: Source::Http {
                url: config.url.clone(),
                client,
            },
        })
    }

    /// Read a compressed feed from disk instead of the network.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    /// Human-readable origin of the feed.
    pub fn describe(&self) -> String {
        match &self.source {
            Source::Http { url, .. } => url.clone(),
            Source::File(path) => path.display().to_string(),
        }
    }

    /// Retrieve the whole compressed payload.
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        match &self.source {
            Source::Http { url, client } => {
                let response = client.get(url).send().await?.error_for_status()?;
                let bytes = response.bytes().await?;
                log::info!("Downloaded {} bytes from {}", bytes.len(), url);
                Ok(bytes.to_vec())
            }
            Source::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                log::info!("Read {} bytes from {}", bytes.len(), path.display());
                Ok(bytes)
            }
        }
    }
}

//! HTTP implementation of [`FeedSource`].
//!
//! Both queries are GET requests carrying the cursor and the search filter
//! as query parameters and answering with JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::config::{validate_url, FeedConfig, FilterConfig};
use crate::error::{FollowError, Result};
use crate::feed::source::FeedSource;
use crate::feed::types::{FeedCursor, FeedPage, FeedStatus};

/// Feed source talking to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    client: Client,
    status_url: String,
    entries_url: String,
    filter: FilterConfig,
    max_response_bytes: u64,
}

impl HttpFeedSource {
    /// Create a source from the feed configuration and search filter.
    pub fn new(config: &FeedConfig, filter: FilterConfig) -> Result<Self> {
        validate_url(&config.status_url)?;
        validate_url(&config.entries_url)?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FollowError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            status_url: config.status_url.clone(),
            entries_url: config.entries_url.clone(),
            filter,
            max_response_bytes: config.max_response_bytes,
        })
    }

    /// Issue a GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str, cursor: &FeedCursor) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(&[
                ("last_id", cursor.last_seen_id.to_string()),
                ("last_modified", cursor.last_modified.to_string()),
            ])
            .query(&self.filter.query_pairs())
            .send()
            .await
            .map_err(|e| FollowError::Fetch(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(FollowError::Fetch(format!(
                "HTTP error from {}: {}",
                url,
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_response_bytes {
                return Err(FollowError::Fetch(format!(
                    "response too large: {} bytes (max {} bytes)",
                    content_length, self.max_response_bytes
                )));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FollowError::Fetch(format!("failed to read response: {}", e)))?;

        if bytes.len() as u64 > self.max_response_bytes {
            return Err(FollowError::Fetch(format!(
                "response too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_response_bytes
            )));
        }

        trace!(url, bytes = bytes.len(), "response received");
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn status(&self, cursor: &FeedCursor) -> Result<FeedStatus> {
        self.get_json(&self.status_url, cursor).await
    }

    async fn entries(&self, cursor: &FeedCursor) -> Result<FeedPage> {
        self.get_json(&self.entries_url, cursor).await
    }
}

// src/services/fetcher.rs

//! Listing page source.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::Result;
use crate::models::SourceConfig;
use crate::utils::http;

/// Something that yields the raw listing markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the listing once.
    async fn fetch(&self) -> Result<String>;

    /// Where the markup comes from, for logging.
    fn location(&self) -> &str;
}

/// Fetches the listing over HTTP.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
            url: config.listing_url.clone(),
        })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn fetch(&self) -> Result<String> {
        log::debug!("GET {}", self.url);
        http::fetch_text(&self.client, &self.url).await
    }

    fn location(&self) -> &str {
        &self.url
    }
}

use async_trait::async_trait;
use regex::Regex;

use crate::download::{build_http_client, download_text_with_headers, no_cache_headers};
use crate::error::Result;
use crate::youtube::utils::cache_bust_url;

const CANONICAL_CHANNEL_PATTERN: &str = r#""canonicalBaseUrl":"(?:/+)?@?([\w-]+)""#;

/// Finds the channel that published the video on a page.
///
/// `None` means "no channel-specific preference applies", never a hard error.
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    async fn resolve_channel(&self, page_url: &str) -> Option<String>;
}

/// Resolves channels by refetching the page and reading its canonical channel URL
#[derive(Debug, Clone)]
pub struct HttpChannelResolver {
    client: reqwest::Client,
    pattern: Regex,
}

impl HttpChannelResolver {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout)?,
            pattern: Regex::new(CANONICAL_CHANNEL_PATTERN)?,
        })
    }

    /// Pull the channel handle out of a watch page document
    pub fn extract_channel_handle(&self, html: &str) -> Option<String> {
        self.pattern
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    async fn fetch_page(&self, page_url: &str) -> Result<String> {
        let url = cache_bust_url(page_url, chrono::Utc::now().timestamp_millis());
        download_text_with_headers(&self.client, &url, no_cache_headers()).await
    }
}

#[async_trait]
impl ChannelResolver for HttpChannelResolver {
    async fn resolve_channel(&self, page_url: &str) -> Option<String> {
        let html = match self.fetch_page(page_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!("Channel lookup failed for {}: {}", page_url, e);
                return None;
            }
        };

        let channel = self.extract_channel_handle(&html);
        if channel.is_none() {
            tracing::debug!("No canonical channel found on {}", page_url);
        }
        channel
    }
}

use reqwest::header::{CACHE_CONTROL, EXPIRES, HeaderMap, HeaderValue, PRAGMA, USER_AGENT};
use std::time::Duration;

use crate::error::{QualityLockError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/143.0.0.0 Safari/537.36";

/// Initialize HTTP client with the given request timeout
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .build()?;
    Ok(client)
}

/// Get default headers for requests
fn get_default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers
}

/// Headers asking every cache on the way to hand back a fresh document
pub fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers
}

/// Execute a GET request with error handling
async fn execute_get(
    client: &reqwest::Client,
    url: &str,
    headers: Option<HeaderMap>,
) -> Result<reqwest::Response> {
    let mut request_headers = get_default_headers();
    if let Some(custom) = headers {
        request_headers.extend(custom);
    }

    let response = client
        .get(url)
        .headers(request_headers)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                QualityLockError::RequestTimeout(url.to_string())
            } else {
                QualityLockError::NetworkError(e)
            }
        })?;

    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(QualityLockError::HttpError {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

/// Download text content from URL with custom headers
pub async fn download_text_with_headers(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
) -> Result<String> {
    let response = execute_get(client, url, Some(headers)).await?;
    response.text().await.map_err(QualityLockError::from)
}

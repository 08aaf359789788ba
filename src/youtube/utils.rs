use url::Url;

use crate::error::{QualityLockError, Result};

/// Validate if a string is a valid YouTube video ID (11 characters, alphanumeric + - and _)
pub fn is_valid_video_id(id: &str) -> bool {
    id.len() == 11 && id.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

fn is_youtube_domain(domain: &str) -> bool {
    domain == "youtube.com" || domain.ends_with(".youtube.com")
}

/// Check if URL points at youtube.com (or a subdomain such as www or m)
pub fn is_youtube_url(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.domain().map(is_youtube_domain))
        .unwrap_or(false)
}

/// Parse the `v` parameter of a watch page URL
pub fn parse_watch_id(url: &str) -> Result<String> {
    let parsed =
        Url::parse(url).map_err(|e| QualityLockError::InvalidUrl(format!("{}: {}", url, e)))?;

    if !parsed.domain().is_some_and(is_youtube_domain) {
        return Err(QualityLockError::InvalidUrl(format!(
            "Not a YouTube URL: {}",
            url
        )));
    }

    if parsed.path() != "/watch" {
        return Err(QualityLockError::InvalidUrl(format!(
            "Not a watch page: {}",
            url
        )));
    }

    parsed
        .query_pairs()
        .find(|(k, _)| k == "v")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            QualityLockError::InvalidUrl(format!("Missing video parameter in: {}", url))
        })
}

/// A page whose player is worth enforcing a quality on
pub fn is_watch_page(url: &str) -> bool {
    parse_watch_id(url).is_ok()
}

/// Append a `_=<millis>` query parameter so no cache can serve a stale page
pub fn cache_bust_url(url: &str, now_millis: i64) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}_={}", url, sep, now_millis)
}

/// Construct YouTube watch URL from video ID
pub fn build_watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QualityLockError {
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Request timeout for URL: {0}")]
    RequestTimeout(String),

    #[error("HTTP error {status} for URL: {url}")]
    HttpError { status: u16, url: String },

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("Unknown quality label: {0}")]
    UnknownQuality(String),

    #[error("Player reported no available quality levels")]
    NoAvailableQuality,

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse config: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Cannot locate base directories: {0}")]
    XdgError(#[from] xdg::BaseDirectoriesError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, QualityLockError>;

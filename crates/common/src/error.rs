//! Error types for seoprobe

use thiserror::Error;

/// Result type alias using seoprobe Error
pub type Result<T> = std::result::Result<T, Error>;

/// Transport and configuration level errors.
///
/// These never describe a failed judgment on their own; the inspection layer
/// wraps them into assertion failures so reports still name the step.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Transport error fetching {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("No page has been loaded in this session")]
    NoCurrentPage,
}

impl Error {
    pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::Transport {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Error::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

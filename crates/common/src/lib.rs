//! seoprobe Common Library
//!
//! Shared types for the seoprobe inspection engine: fetched documents,
//! the fetch collaborator, the navigation session and configuration.

pub mod config;
pub mod document;
pub mod error;
pub mod fetch;
pub mod session;

// Re-export commonly used types
pub use config::{HttpConfig, ProbeConfig, SamplingConfig, DEFAULT_CRAWLER};
pub use document::{FetchedDocument, Headers};
pub use error::{Error, Result};
pub use fetch::{Fetcher, HttpFetcher, StaticResponse, StaticSite};
pub use session::{BrowserSession, Probe};

/// seoprobe version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Probe configuration

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Default crawler identity used for robots.txt evaluation
pub const DEFAULT_CRAWLER: &str = "Googlebot";

/// Probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Site under test; relative URLs resolve against it
    pub base_url: String,

    /// Crawler identity for robots.txt evaluation
    pub crawler: String,

    /// HTTP client configuration
    pub http: HttpConfig,

    /// Random sampling configuration
    pub sampling: SamplingConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            crawler: DEFAULT_CRAWLER.to_string(),
            http: HttpConfig::default(),
            sampling: SamplingConfig::default(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Redirects followed before giving up
    pub max_redirects: usize,

    /// Keep cookies between requests of one session
    pub cookies: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("seoprobe/{}", crate::VERSION),
            max_redirects: 10,
            cookies: true,
        }
    }
}

/// Sampling configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seed for reproducible random selection; entropy when unset
    pub seed: Option<u64>,
}

impl ProbeConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}

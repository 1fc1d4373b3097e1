//! Configuration management for cookie-inspector

use std::path::PathBuf;

use crate::error::{CookieError, Result};
use crate::utils::UrlUtils;

/// Output configuration
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    pub file: Option<PathBuf>,
    pub verbose: bool,
    pub silent: bool,
}

/// Main configuration struct
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// URL of the page whose cookies are inspected
    pub url: String,
    /// JSON cookie store backing the host; `None` means the cookie API is unavailable
    pub store_path: Option<PathBuf>,
    /// `document.cookie` style string listed when the cookie API is unavailable
    pub document_cookie: Option<String>,
    pub output: OutputConfig,
}

impl Config {
    /// The active page URL, validated and normalized
    pub fn active_url(&self) -> Result<String> {
        if self.url.trim().is_empty() {
            return Err(CookieError::Config("No page URL configured".to_string()));
        }
        Ok(UrlUtils::validate_url(self.url.trim())?.to_string())
    }
}

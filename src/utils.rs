//! Utility functions and helpers

use crate::error::{CookieError, Result};
use std::path::{Path, PathBuf};
use url::Url;

const LOOPBACK_ORIGIN: &str = "http://localhost/";

/// URL validation and parsing utilities
pub struct UrlUtils;

impl UrlUtils {
    /// Validate and normalize URL
    pub fn validate_url(input: &str) -> Result<Url> {
        // Add http:// if no scheme is provided
        let url_str = if input.contains("://") {
            input.to_string()
        } else {
            format!("http://{}", input)
        };

        Url::parse(&url_str)
            .map_err(|e| CookieError::InvalidUrl(format!("Invalid URL '{}': {}", input, e)))
    }

    /// Extract the lowercase host (name or IP) from a URL
    pub fn extract_host(url: &Url) -> Option<String> {
        url.host_str().map(|h| h.to_ascii_lowercase())
    }

    /// Origin used to query the cookie store for a page URL.
    ///
    /// `localhost` and `127.0.0.1` share one origin so cookies written under
    /// either loopback spelling are listed together.
    pub fn store_origin(input: &str) -> Result<String> {
        let url = Self::validate_url(input)?;
        let host = Self::extract_host(&url)
            .ok_or_else(|| CookieError::InvalidUrl(format!("URL '{}' has no host", input)))?;

        if DomainUtils::is_loopback(&host) {
            return Ok(LOOPBACK_ORIGIN.to_string());
        }
        Ok(format!("{}://{}/", url.scheme(), host))
    }

    /// Target URL for writing or removing a cookie with the given domain and path.
    pub fn cookie_url(domain: &str, path: &str) -> String {
        let path = if path.starts_with('/') { path } else { "/" };
        format!("https://{}{}", DomainUtils::strip_leading_dot(domain), path)
    }
}

/// Cookie domain and path matching
pub struct DomainUtils;

impl DomainUtils {
    /// Drop the leading-dot wildcard marker, if present
    pub fn strip_leading_dot(domain: &str) -> &str {
        domain.strip_prefix('.').unwrap_or(domain)
    }

    pub fn is_loopback(host: &str) -> bool {
        host == "localhost" || host == "127.0.0.1"
    }

    /// True when `host` is the cookie domain itself or one of its subdomains.
    pub fn domain_matches(cookie_domain: &str, host: &str) -> bool {
        let domain = Self::strip_leading_dot(cookie_domain).to_ascii_lowercase();
        let host = host.to_ascii_lowercase();
        if domain.is_empty() {
            return false;
        }
        host == domain || host.ends_with(&format!(".{}", domain))
    }

    /// RFC 6265 path-match of a request path against a cookie path
    pub fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if cookie_path == request_path {
            return true;
        }
        if !request_path.starts_with(cookie_path) {
            return false;
        }
        cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/')
    }
}

/// File system utilities
pub struct FileUtils;

impl FileUtils {
    /// Expand tilde (~) in file paths
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        if let Some(rest) = path.strip_prefix('~') {
            if let Some(home_dir) = dirs::home_dir() {
                Ok(home_dir.join(rest.trim_start_matches('/')))
            } else {
                Err(CookieError::Config(
                    "Cannot determine home directory".to_string(),
                ))
            }
        } else {
            Ok(PathBuf::from(path))
        }
    }

    /// Check if file exists and is readable
    pub fn check_file_readable(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(CookieError::FileNotFound(format!(
                "File not found: {:?}",
                path
            )));
        }

        if !path.is_file() {
            return Err(CookieError::Config(format!("Path is not a file: {:?}", path)));
        }

        std::fs::File::open(path).map_err(|e| {
            CookieError::PermissionDenied(format!("Cannot read file {:?}: {}", path, e))
        })?;

        Ok(())
    }

    /// Cookie transfer files are restricted to `.json`
    pub fn ensure_json_extension(path: &Path) -> Result<()> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(())
        } else {
            Err(CookieError::Validation(format!(
                "Expected a .json file, got {:?}",
                path
            )))
        }
    }
}

//! Output formatting and transient notices

use crate::bulk::BulkResult;
use crate::config::OutputConfig;
use crate::cookie::CookieRecord;
use crate::error::{CookieError, Result};
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

/// How long a notice stays on screen
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
    Warning,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
        };
        f.write_str(label)
    }
}

/// A transient message reporting the outcome of a user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub description: Option<String>,
    pub duration: Duration,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            description: None,
            duration: NOTICE_DURATION,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Failure notice for `action`. The unavailable-host case reads differently
    /// from an empty result.
    pub fn from_error(action: &str, err: &CookieError) -> Self {
        let message = match err {
            CookieError::HostUnavailable => format!("{} failed: cookies cannot be read here", action),
            err if err.is_input_error() => format!("{}: invalid input", action),
            _ => format!("{} failed", action),
        };
        Self::error(message).with_description(err.to_string())
    }

    /// Aggregate counts of a bulk operation, never per-item detail.
    pub fn from_bulk(action: &str, result: &BulkResult) -> Self {
        let message = format!(
            "{}: {} succeeded, {} failed",
            action, result.success_count, result.failure_count
        );
        if result.failure_count == 0 {
            Self::success(message)
        } else {
            Self::warning(message)
        }
    }

    pub fn render(&self) -> String {
        match &self.description {
            Some(description) => format!("[{}] {}: {}", self.level, self.message, description),
            None => format!("[{}] {}", self.level, self.message),
        }
    }
}

/// One tab-separated line per cookie
pub fn format_cookie_list(cookies: &[CookieRecord]) -> String {
    cookies
        .iter()
        .map(|c| {
            let expires = c
                .expiration_date
                .map(|e| format!("{:.0}", e))
                .unwrap_or_else(|| "session".to_string());
            let mut flags = Vec::new();
            if c.secure {
                flags.push("Secure");
            }
            if c.http_only {
                flags.push("HttpOnly");
            }
            if c.host_only {
                flags.push("HostOnly");
            }
            format!(
                "{}={}\t{}\t{}\t{}\tSameSite={}\t{}",
                c.name,
                c.value,
                c.domain,
                c.path,
                expires,
                c.same_site,
                flags.join(",")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Output writer that handles file vs stdout
pub struct OutputWriter {
    config: OutputConfig,
}

impl OutputWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Write content to configured output
    pub fn write(&self, content: &str) -> Result<()> {
        if let Some(file_path) = &self.config.file {
            self.write_to_file(content, file_path)
        } else {
            self.write_to_stdout(content)
        }
    }

    /// Write verbose information (if enabled)
    pub fn write_verbose(&self, message: &str) -> Result<()> {
        if self.config.verbose && !self.config.silent {
            eprintln!("* {}", message);
        }
        Ok(())
    }

    /// Show a notice on stderr unless silenced
    pub fn notice(&self, notice: &Notice) -> Result<()> {
        if !self.config.silent {
            let mut stderr = io::stderr();
            writeln!(stderr, "{}", notice.render())?;
        }
        Ok(())
    }

    fn write_to_file(&self, content: &str, file_path: &Path) -> Result<()> {
        let mut file = File::create(file_path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_to_stdout(&self, content: &str) -> Result<()> {
        let mut stdout = io::stdout();
        stdout.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            stdout.write_all(b"\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;

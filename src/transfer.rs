//! Clipboard and file transfer of exported cookie text
//!
//! Both collaborators move opaque text; parsing belongs to [`crate::codec`].

use crate::error::{CookieError, Result};
use crate::utils::FileUtils;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Asynchronous, fallible clipboard access
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn read_text(&self) -> Result<String>;

    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Clipboard kept in process memory
#[derive(Default)]
pub struct MemoryClipboard {
    text: Mutex<String>,
    denied: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
            denied: false,
        }
    }

    /// A clipboard the user refused access to
    pub fn denied() -> Self {
        Self {
            text: Mutex::new(String::new()),
            denied: true,
        }
    }

    fn check_permission(&self) -> Result<()> {
        if self.denied {
            return Err(CookieError::PermissionDenied(
                "Clipboard access was denied".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn read_text(&self) -> Result<String> {
        self.check_permission()?;
        let text = self
            .text
            .lock()
            .map_err(|_| CookieError::Config("clipboard lock poisoned".to_string()))?;
        Ok(text.clone())
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        self.check_permission()?;
        let mut current = self
            .text
            .lock()
            .map_err(|_| CookieError::Config("clipboard lock poisoned".to_string()))?;
        *current = text.to_string();
        Ok(())
    }
}

/// Terminal stand-in for the clipboard: paste from stdin, copy to stdout.
pub struct StdioClipboard;

#[async_trait]
impl Clipboard for StdioClipboard {
    async fn read_text(&self) -> Result<String> {
        let mut bytes = Vec::new();
        tokio::io::stdin().read_to_end(&mut bytes).await?;
        text_from_bytes(bytes, "standard input")
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        if !text.ends_with('\n') {
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
        Ok(())
    }
}

/// Where exported text goes, or where imported text comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferTarget {
    Clipboard,
    File(PathBuf),
}

pub struct Transfer {
    clipboard: Arc<dyn Clipboard>,
}

impl Transfer {
    pub fn new(clipboard: Arc<dyn Clipboard>) -> Self {
        Self { clipboard }
    }

    pub async fn write(&self, target: &TransferTarget, text: &str) -> Result<()> {
        match target {
            TransferTarget::Clipboard => self.clipboard.write_text(text).await,
            TransferTarget::File(path) => {
                FileUtils::ensure_json_extension(path)?;
                tokio::fs::write(path, text).await?;
                log::info!("Exported cookies to {:?}", path);
                Ok(())
            }
        }
    }

    pub async fn read(&self, source: &TransferTarget) -> Result<String> {
        match source {
            TransferTarget::Clipboard => self.clipboard.read_text().await,
            TransferTarget::File(path) => {
                FileUtils::ensure_json_extension(path)?;
                FileUtils::check_file_readable(path)?;
                let bytes = tokio::fs::read(path).await?;
                text_from_bytes(bytes, &path.display().to_string())
            }
        }
    }
}

/// Content that is not UTF-8 cannot be JSON, so it is a parse failure, not an I/O one.
fn text_from_bytes(bytes: Vec<u8>, source: &str) -> Result<String> {
    String::from_utf8(bytes)
        .map_err(|e| CookieError::Parse(format!("{} is not valid UTF-8 text: {}", source, e)))
}

/// Suggested download name for an export of `host`'s cookies
pub fn export_file_name(host: &str) -> String {
    let safe: String = host
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' { ch } else { '_' })
        .collect();
    format!("cookies-{}.json", safe)
}

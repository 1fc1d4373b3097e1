//! Host platform capabilities
//!
//! The browser's cookie store, tab query and cookie-change event bus are injected
//! into the gateway and notifier as trait objects. [`memory::MemoryCookieHost`]
//! is the in-process implementation used by the CLI and the tests.

use crate::cookie::{CookieRecord, WriteRequest};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub mod memory;

/// Filter for a host `getAll` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieQuery {
    pub url: Option<String>,
    pub domain: Option<String>,
    pub store_id: Option<String>,
}

impl CookieQuery {
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// Details echoed back by the host after a successful remove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedCookie {
    pub url: String,
    pub name: String,
    pub store_id: String,
}

/// Why the host changed a cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCause {
    Explicit,
    Overwrite,
    Expired,
    Evicted,
    ExpiredOverwrite,
}

/// A system-wide cookie mutation, not scoped to any domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookieChange {
    pub cause: ChangeCause,
    pub cookie: CookieRecord,
    pub removed: bool,
}

/// Cookie read/write/delete primitives of the host
///
/// Implementations return `Ok(None)` where the host reports no result object and
/// `Err` for out-of-band failures.
#[async_trait]
pub trait CookieHost: Send + Sync {
    async fn get_all(&self, query: &CookieQuery) -> Result<Vec<CookieRecord>>;

    async fn get(&self, url: &str, name: &str) -> Result<Option<CookieRecord>>;

    async fn set(&self, request: &WriteRequest) -> Result<Option<CookieRecord>>;

    async fn remove(&self, url: &str, name: &str) -> Result<Option<RemovedCookie>>;
}

/// Access to the active tab
#[async_trait]
pub trait TabQuery: Send + Sync {
    /// URL of the active tab in the current window, if any
    async fn active_url(&self) -> Result<Option<String>>;
}

/// Host cookie-change event bus
pub trait CookieEvents: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<CookieChange>;
}

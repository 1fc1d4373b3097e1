//! In-process cookie host
//!
//! Applies the rules a browser cookie store enforces on its own: host-only
//! derivation, session derivation, secure cookies bound to https, domain checks
//! on write and expiry. Every mutation is published on the change bus.

use super::{ChangeCause, CookieChange, CookieEvents, CookieHost, CookieQuery, RemovedCookie, TabQuery};
use crate::codec;
use crate::cookie::{CookieRecord, WriteRequest, DEFAULT_STORE_ID};
use crate::error::{CookieError, Result};
use crate::utils::{DomainUtils, UrlUtils};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use url::Url;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct FailurePlan {
    fail_set: HashSet<String>,
    reject_set: HashSet<String>,
    fail_remove: HashSet<String>,
}

/// Cookie store held in memory, optionally loaded from and saved to a JSON file.
pub struct MemoryCookieHost {
    cookies: Mutex<Vec<CookieRecord>>,
    failures: Mutex<FailurePlan>,
    events: broadcast::Sender<CookieChange>,
}

impl MemoryCookieHost {
    pub fn new() -> Self {
        Self::with_cookies(Vec::new())
    }

    /// Seed the store without publishing change events.
    pub fn with_cookies(cookies: Vec<CookieRecord>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            cookies: Mutex::new(cookies),
            failures: Mutex::new(FailurePlan::default()),
            events,
        }
    }

    /// Load a store file written by [`MemoryCookieHost::save`]. A missing file is an empty store.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Cookie store {:?} does not exist yet, starting empty", path);
            return Ok(Self::new());
        }
        let text = tokio::fs::read_to_string(path).await?;
        let cookies: Vec<CookieRecord> = serde_json::from_str(&text).map_err(|e| {
            CookieError::Parse(format!("Cookie store {:?} is not valid: {}", path, e))
        })?;
        log::debug!("Loaded {} cookies from {:?}", cookies.len(), path);
        Ok(Self::with_cookies(cookies))
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let text = codec::export_to_text(&self.snapshot()?)?;
        tokio::fs::write(path, text).await?;
        Ok(())
    }

    /// Every cookie currently held, across all domains and partitions.
    pub fn snapshot(&self) -> Result<Vec<CookieRecord>> {
        Ok(self.lock_cookies()?.clone())
    }

    /// Make `set` fail with a host error for cookies named `name`.
    pub fn fail_set_for(&self, name: &str) -> Result<()> {
        self.lock_failures()?.fail_set.insert(name.to_string());
        Ok(())
    }

    /// Make `set` report no result object for cookies named `name`.
    pub fn reject_set_for(&self, name: &str) -> Result<()> {
        self.lock_failures()?.reject_set.insert(name.to_string());
        Ok(())
    }

    /// Make `remove` fail with a host error for cookies named `name`.
    pub fn fail_remove_for(&self, name: &str) -> Result<()> {
        self.lock_failures()?.fail_remove.insert(name.to_string());
        Ok(())
    }

    fn lock_cookies(&self) -> Result<MutexGuard<'_, Vec<CookieRecord>>> {
        self.cookies
            .lock()
            .map_err(|_| CookieError::Host("cookie store lock poisoned".to_string()))
    }

    fn lock_failures(&self) -> Result<MutexGuard<'_, FailurePlan>> {
        self.failures
            .lock()
            .map_err(|_| CookieError::Host("failure plan lock poisoned".to_string()))
    }

    fn publish(&self, cause: ChangeCause, cookie: CookieRecord, removed: bool) {
        // No subscribers is the common case outside the background context.
        let _ = self.events.send(CookieChange {
            cause,
            cookie,
            removed,
        });
    }

    /// Drop expired cookies, publishing an `expired` removal for each.
    fn purge_expired(&self, cookies: &mut Vec<CookieRecord>) {
        let now = now_epoch_secs();
        let (expired, live): (Vec<_>, Vec<_>) = cookies
            .drain(..)
            .partition(|c| c.expiration_date.is_some_and(|exp| exp <= now));
        *cookies = live;
        for cookie in expired {
            log::debug!("Cookie '{}' on {} expired", cookie.name, cookie.domain);
            self.publish(ChangeCause::Expired, cookie, true);
        }
    }
}

impl Default for MemoryCookieHost {
    fn default() -> Self {
        Self::new()
    }
}

fn now_epoch_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn parse_target(url: &str) -> Result<(Url, String)> {
    let parsed = Url::parse(url)
        .map_err(|e| CookieError::Host(format!("Invalid url '{}': {}", url, e)))?;
    let host = UrlUtils::extract_host(&parsed)
        .ok_or_else(|| CookieError::Host(format!("Url '{}' has no host", url)))?;
    Ok((parsed, host))
}

fn is_secure_context(url: &Url, host: &str) -> bool {
    url.scheme() == "https" || DomainUtils::is_loopback(host)
}

/// Whether a cookie would be sent to `host` over `url`, ignoring its path.
///
/// Both loopback spellings address the same cookies.
fn visible_from(cookie: &CookieRecord, url: &Url, host: &str) -> bool {
    let cookie_host = DomainUtils::strip_leading_dot(&cookie.domain);
    let domain_ok = if DomainUtils::is_loopback(host) && DomainUtils::is_loopback(cookie_host) {
        true
    } else if cookie.host_only {
        cookie.domain.eq_ignore_ascii_case(host)
    } else {
        DomainUtils::domain_matches(&cookie.domain, host)
    };
    domain_ok && (!cookie.secure || is_secure_context(url, host))
}

/// Index of the cookie `name` addressed by `url`, the most specific one when
/// several share the name.
fn find_addressed(cookies: &[CookieRecord], url: &Url, host: &str, name: &str) -> Option<usize> {
    cookies
        .iter()
        .enumerate()
        .filter(|(_, c)| {
            c.name == name
                && visible_from(c, url, host)
                && DomainUtils::path_matches(&c.path, url.path())
        })
        .max_by_key(|(_, c)| c.specificity(host))
        .map(|(idx, _)| idx)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|ch| ch == ';' || ch == '=' || ch.is_control())
}

#[async_trait]
impl CookieHost for MemoryCookieHost {
    /// Lists every path of the matching origin; only `get` and `remove` path-match.
    async fn get_all(&self, query: &CookieQuery) -> Result<Vec<CookieRecord>> {
        let mut cookies = self.lock_cookies()?;
        self.purge_expired(&mut cookies);

        let target = query.url.as_deref().map(parse_target).transpose()?;
        let matched = cookies
            .iter()
            .filter(|c| match &target {
                Some((url, host)) => visible_from(c, url, host),
                None => true,
            })
            .filter(|c| match &query.domain {
                Some(domain) => {
                    DomainUtils::domain_matches(domain, DomainUtils::strip_leading_dot(&c.domain))
                }
                None => true,
            })
            .filter(|c| match &query.store_id {
                Some(store_id) => &c.store_id == store_id,
                None => true,
            })
            .cloned()
            .collect();
        Ok(matched)
    }

    async fn get(&self, url: &str, name: &str) -> Result<Option<CookieRecord>> {
        let (parsed, host) = parse_target(url)?;
        let mut cookies = self.lock_cookies()?;
        self.purge_expired(&mut cookies);
        Ok(find_addressed(&cookies, &parsed, &host, name).map(|idx| cookies[idx].clone()))
    }

    async fn set(&self, request: &WriteRequest) -> Result<Option<CookieRecord>> {
        {
            let failures = self.lock_failures()?;
            if failures.fail_set.contains(&request.name) {
                return Err(CookieError::Host(format!(
                    "Failed to set cookie '{}'",
                    request.name
                )));
            }
            if failures.reject_set.contains(&request.name) {
                return Ok(None);
            }
        }

        let (url, host) = parse_target(&request.url)?;
        if !is_valid_name(&request.name) {
            return Err(CookieError::Host(format!(
                "Invalid cookie name '{}'",
                request.name
            )));
        }
        if request.secure && !is_secure_context(&url, &host) {
            return Err(CookieError::Host(format!(
                "Secure cookie '{}' cannot be set from {}",
                request.name, request.url
            )));
        }

        let (domain, host_only) = match request.domain.as_deref() {
            Some(domain) => {
                let domain = DomainUtils::strip_leading_dot(domain).to_ascii_lowercase();
                if !DomainUtils::domain_matches(&domain, &host) {
                    return Err(CookieError::Host(format!(
                        "Domain '{}' does not match url {}",
                        domain, request.url
                    )));
                }
                (format!(".{}", domain), false)
            }
            None => (host, true),
        };

        let record = CookieRecord {
            name: request.name.clone(),
            value: request.value.clone(),
            domain,
            path: request.path.clone(),
            expiration_date: request.expiration_date,
            secure: request.secure,
            http_only: request.http_only,
            same_site: request.same_site,
            host_only,
            session: request.expiration_date.is_none(),
            store_id: request
                .store_id
                .clone()
                .unwrap_or_else(|| DEFAULT_STORE_ID.to_string()),
        };

        let mut cookies = self.lock_cookies()?;
        self.purge_expired(&mut cookies);
        let existing = cookies.iter().position(|c| {
            c.name == record.name
                && c.domain == record.domain
                && c.path == record.path
                && c.store_id == record.store_id
        });
        if let Some(idx) = existing {
            let old = cookies.remove(idx);
            self.publish(ChangeCause::Overwrite, old, true);
        }
        cookies.push(record.clone());
        self.publish(ChangeCause::Explicit, record.clone(), false);
        log::debug!("Stored cookie '{}' for {}", record.name, record.domain);

        Ok(Some(record))
    }

    async fn remove(&self, url: &str, name: &str) -> Result<Option<RemovedCookie>> {
        if self.lock_failures()?.fail_remove.contains(name) {
            return Err(CookieError::Host(format!("Failed to remove cookie '{}'", name)));
        }

        let (parsed, host) = parse_target(url)?;
        let mut cookies = self.lock_cookies()?;
        self.purge_expired(&mut cookies);
        let Some(idx) = find_addressed(&cookies, &parsed, &host, name) else {
            return Ok(None);
        };

        let removed = cookies.remove(idx);
        let details = RemovedCookie {
            url: url.to_string(),
            name: removed.name.clone(),
            store_id: removed.store_id.clone(),
        };
        self.publish(ChangeCause::Explicit, removed, true);
        Ok(Some(details))
    }
}

impl CookieEvents for MemoryCookieHost {
    fn subscribe(&self) -> broadcast::Receiver<CookieChange> {
        self.events.subscribe()
    }
}

/// Tab query answering with a fixed, replaceable URL
pub struct StaticTab {
    url: RwLock<Option<String>>,
}

impl StaticTab {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: RwLock::new(url),
        }
    }

    /// Point the active tab at a new URL
    pub fn navigate(&self, url: Option<String>) -> Result<()> {
        let mut current = self
            .url
            .write()
            .map_err(|_| CookieError::Host("tab lock poisoned".to_string()))?;
        *current = url;
        Ok(())
    }
}

#[async_trait]
impl TabQuery for StaticTab {
    async fn active_url(&self) -> Result<Option<String>> {
        let current = self
            .url
            .read()
            .map_err(|_| CookieError::Host("tab lock poisoned".to_string()))?;
        Ok(current.clone())
    }
}

//! Cookie store gateway
//!
//! Uniform async contract over the host cookie primitives. Host-specific result
//! signalling is folded into [`CookieError`]:
//! - `set` with no result object is [`CookieError::WriteRejected`];
//! - `remove` of a missing cookie is `Ok(false)`, so bulk callers can tally it;
//! - a gateway without a host fails every call with [`CookieError::HostUnavailable`].

use crate::cookie::{CookieRecord, WriteRequest};
use crate::error::{CookieError, Result};
use crate::host::{CookieHost, CookieQuery};
use crate::utils::UrlUtils;
use std::sync::Arc;

#[derive(Clone)]
pub struct CookieGateway {
    host: Option<Arc<dyn CookieHost>>,
}

impl CookieGateway {
    pub fn new(host: Arc<dyn CookieHost>) -> Self {
        Self { host: Some(host) }
    }

    /// A gateway for a context where the cookie API cannot be reached.
    pub fn unavailable() -> Self {
        Self { host: None }
    }

    pub fn is_available(&self) -> bool {
        self.host.is_some()
    }

    fn host(&self) -> Result<&Arc<dyn CookieHost>> {
        self.host.as_ref().ok_or(CookieError::HostUnavailable)
    }

    /// All cookies visible from the origin of `url`. No cookies is an empty list.
    pub async fn get_all(&self, url: &str) -> Result<Vec<CookieRecord>> {
        let host = self.host()?;
        let origin = UrlUtils::store_origin(url)?;
        log::debug!("Fetching cookies for {} (origin {})", url, origin);
        host.get_all(&CookieQuery::for_url(origin)).await
    }

    /// The cookie `name` addressed by `url`, if any.
    pub async fn get(&self, url: &str, name: &str) -> Result<Option<CookieRecord>> {
        self.host()?.get(url, name).await
    }

    pub async fn set(&self, request: &WriteRequest) -> Result<bool> {
        let host = self.host()?;
        log::debug!("Setting cookie '{}' at {}", request.name, request.url);
        match host.set(request).await? {
            Some(_) => Ok(true),
            None => Err(CookieError::WriteRejected(format!(
                "Host did not confirm cookie '{}' for {}",
                request.name, request.url
            ))),
        }
    }

    /// Delete by exact `(url, name)`. `Ok(false)` when the host found nothing to remove.
    pub async fn remove(&self, url: &str, name: &str) -> Result<bool> {
        let host = self.host()?;
        log::debug!("Removing cookie '{}' at {}", name, url);
        let removed = host.remove(url, name).await?;
        if removed.is_none() {
            log::debug!("Cookie '{}' not found at {}", name, url);
        }
        Ok(removed.is_some())
    }

    /// Replace the cookie `old_name` with `request`.
    ///
    /// Not atomic: the host has no update primitive, so this removes and then sets.
    /// If the set fails after the remove went through, the old cookie is gone and
    /// the returned [`CookieError::Host`] says so. Nothing is restored.
    pub async fn update(&self, url: &str, old_name: &str, request: &WriteRequest) -> Result<()> {
        let removed = self.remove(url, old_name).await?;

        if let Err(err) = self.set(request).await {
            log::warn!(
                "Update of cookie '{}' at {} failed after remove (removed: {}): {}",
                old_name,
                url,
                removed,
                err
            );
            let detail = if removed {
                format!(
                    "cookie '{}' was removed but '{}' could not be written, the cookie may now be missing: {}",
                    old_name, request.name, err
                )
            } else {
                format!("cookie '{}' could not be written: {}", request.name, err)
            };
            return Err(CookieError::Host(detail));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_gateway_fails_every_call() {
        let gateway = CookieGateway::unavailable();
        assert!(!gateway.is_available());
        let err = gateway
            .get_all("https://example.com/")
            .await
            .expect_err("unavailable");
        assert!(matches!(err, CookieError::HostUnavailable));
        let err = gateway
            .remove("https://example.com/", "a")
            .await
            .expect_err("unavailable");
        assert!(matches!(err, CookieError::HostUnavailable));
    }
}

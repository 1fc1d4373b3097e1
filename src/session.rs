//! Popup-side cookie session
//!
//! Binds the gateway and bulk coordinator to the page in the active tab and keeps
//! the cookie list shown to the user. The list is replaced wholesale after every
//! operation that may have changed cookie state, never patched.

use crate::bulk::{BulkCoordinator, BulkResult, Confirmed};
use crate::codec;
use crate::cookie::{parse_document_cookie, to_write_request, CookieRecord, EditableRecord};
use crate::error::{CookieError, Result};
use crate::gateway::CookieGateway;
use crate::message::Message;
use crate::transfer::{Transfer, TransferTarget};
use crate::utils::UrlUtils;
use std::sync::RwLock;

pub struct CookieSession {
    url: String,
    gateway: CookieGateway,
    bulk: BulkCoordinator,
    fallback: Option<String>,
    cookies: RwLock<Vec<CookieRecord>>,
}

impl CookieSession {
    pub fn new(url: impl Into<String>, gateway: CookieGateway) -> Self {
        Self {
            url: url.into(),
            bulk: BulkCoordinator::new(gateway.clone()),
            gateway,
            fallback: None,
            cookies: RwLock::new(Vec::new()),
        }
    }

    /// List `document_cookie` instead of failing when the cookie API is unavailable.
    pub fn with_fallback(mut self, document_cookie: impl Into<String>) -> Self {
        self.fallback = Some(document_cookie.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The cookie list as of the last refresh
    pub fn cookies(&self) -> Vec<CookieRecord> {
        self.cookies
            .read()
            .map(|cookies| cookies.clone())
            .unwrap_or_default()
    }

    fn replace_cache(&self, cookies: Vec<CookieRecord>) {
        if let Ok(mut cached) = self.cookies.write() {
            *cached = cookies;
        }
    }

    /// Re-read the page's cookies and replace the cached list.
    pub async fn refresh(&self) -> Result<Vec<CookieRecord>> {
        let cookies = match self.gateway.get_all(&self.url).await {
            Ok(cookies) => cookies,
            Err(CookieError::HostUnavailable) if self.fallback.is_some() => {
                log::info!("Cookie API unavailable, listing document cookies instead");
                parse_document_cookie(self.fallback.as_deref().unwrap_or_default())
            }
            Err(err) => return Err(err),
        };
        self.replace_cache(cookies.clone());
        Ok(cookies)
    }

    /// Refresh, then report `outcome`. The cache is refreshed even when the
    /// operation failed part-way.
    async fn refresh_after<T>(&self, outcome: Result<T>) -> Result<T> {
        let refreshed = self.refresh().await;
        let value = outcome?;
        refreshed?;
        Ok(value)
    }

    /// The cached cookie `name` most specific to the page, which is also the one
    /// the host resolves when addressed from it.
    pub fn cached(&self, name: &str) -> Option<CookieRecord> {
        let page_host = UrlUtils::validate_url(&self.url)
            .ok()
            .and_then(|url| UrlUtils::extract_host(&url))
            .unwrap_or_default();
        self.cookies()
            .into_iter()
            .filter(|cookie| cookie.name == name)
            .max_by_key(|cookie| cookie.specificity(&page_host))
    }

    /// URL addressing the cached cookie `name`, or the page URL if it is not cached.
    fn address_of(&self, name: &str) -> String {
        self.cached(name)
            .map(|cookie| cookie.url())
            .unwrap_or_else(|| self.url.clone())
    }

    pub async fn get_cookie(&self, name: &str) -> Result<Option<CookieRecord>> {
        self.gateway.get(&self.address_of(name), name).await
    }

    pub async fn set_cookie(&self, edited: &EditableRecord) -> Result<()> {
        let request = to_write_request(edited, Some(&self.url))?;
        let outcome = self.gateway.set(&request).await.map(|_| ());
        self.refresh_after(outcome).await
    }

    /// Remove-then-set. On a failed write the old cookie may already be gone;
    /// the refreshed list shows what is actually left.
    pub async fn update_cookie(&self, old_name: &str, edited: &EditableRecord) -> Result<()> {
        let request = to_write_request(edited, Some(&self.url))?;
        let address = self.address_of(old_name);
        let outcome = self.gateway.update(&address, old_name, &request).await;
        self.refresh_after(outcome).await
    }

    /// Returns whether the host found a cookie to delete.
    pub async fn delete_cookie(&self, name: &str) -> Result<bool> {
        let address = self.address_of(name);
        let outcome = self.gateway.remove(&address, name).await;
        self.refresh_after(outcome).await
    }

    pub async fn delete_all(&self, confirmed: Confirmed) -> Result<BulkResult> {
        let outcome = self.bulk.delete_all(&self.url, confirmed).await;
        self.refresh_after(outcome).await
    }

    /// Export the cached list. Returns how many cookies were written.
    pub async fn export(&self, transfer: &Transfer, target: &TransferTarget) -> Result<usize> {
        let cookies = self.cookies();
        let text = codec::export_to_text(&cookies)?;
        transfer.write(target, &text).await?;
        Ok(cookies.len())
    }

    pub async fn import(&self, transfer: &Transfer, source: &TransferTarget) -> Result<BulkResult> {
        let text = transfer.read(source).await?;
        self.import_text(&text).await
    }

    /// Import a JSON array of cookies. Each record is written under its own
    /// domain; records without one land on the current page.
    pub async fn import_text(&self, text: &str) -> Result<BulkResult> {
        let records = codec::import_from_text(text)?;
        let outcome = self
            .bulk
            .import_many(&records, |record| match record.domain.as_deref() {
                Some(domain) if !domain.trim().is_empty() => {
                    UrlUtils::cookie_url(domain, record.path.as_deref().unwrap_or("/"))
                }
                _ => self.url.clone(),
            })
            .await;
        self.refresh_after(outcome).await
    }

    /// Apply a background broadcast. Returns whether the cached list changed.
    pub fn apply(&self, message: Message) -> bool {
        match message {
            Message::CookiesChanged { cookies } => {
                self.replace_cache(cookies);
                true
            }
            Message::GetCookies { .. } => false,
        }
    }
}

//! Cookie records and the normalization between host, editor and write shapes.
//!
//! Three shapes flow through the crate:
//! - [`CookieRecord`]: what the host cookie store returns, read-only fields included.
//! - [`EditableRecord`]: the user-editable subset, with read-only fields carried for display.
//! - [`WriteRequest`]: what is sent to the host on a write. It has no `hostOnly` or
//!   `session` field at all; the host derives both.
//!
//! The leading-dot wildcard marker on `domain` is stripped once, in
//! [`to_write_request`], and the stripped form is used both for the payload's
//! `domain` and for the target URL.

use crate::error::{CookieError, Result};
use crate::utils::{DomainUtils, UrlUtils};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store id of the default cookie partition.
pub const DEFAULT_STORE_ID: &str = "0";
pub const DEFAULT_PATH: &str = "/";

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_store_id() -> String {
    DEFAULT_STORE_ID.to_string()
}

/// Cross-site sending policy.
///
/// Deserialization never fails on an unknown string: anything outside the closed
/// set (case-insensitive) becomes [`SameSite::NoRestriction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SameSite {
    #[default]
    NoRestriction,
    Lax,
    Strict,
}

impl SameSite {
    pub fn normalize(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "lax" => SameSite::Lax,
            "strict" => SameSite::Strict,
            _ => SameSite::NoRestriction,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::NoRestriction => "no_restriction",
            SameSite::Lax => "lax",
            SameSite::Strict => "strict",
        }
    }
}

impl From<String> for SameSite {
    fn from(value: String) -> Self {
        SameSite::normalize(&value)
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cookie as reported by the host store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    /// Epoch seconds; `None` for a session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub same_site: SameSite,
    #[serde(default)]
    pub host_only: bool,
    #[serde(default)]
    pub session: bool,
    #[serde(default = "default_store_id")]
    pub store_id: String,
}

impl CookieRecord {
    /// URL addressing this cookie for a remove or a rewrite.
    pub fn url(&self) -> String {
        UrlUtils::cookie_url(&self.domain, &self.path)
    }

    /// Ranking among same-named cookies visible from `host`, most specific highest:
    /// a host-only cookie for exactly `host`, then the longest domain, then the longest path.
    pub fn specificity(&self, host: &str) -> (bool, usize, usize) {
        let domain = DomainUtils::strip_leading_dot(&self.domain);
        (
            self.host_only && domain.eq_ignore_ascii_case(host),
            domain.len(),
            self.path.len(),
        )
    }
}

/// Host-derived fields, shown to the user but never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOnlyFields {
    pub host_only: bool,
    pub session: bool,
    pub store_id: String,
}

/// The user-editable view of a cookie. Also the shape an import record is
/// projected onto, which is why every field has a serde default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
    #[serde(default)]
    pub same_site: SameSite,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(skip)]
    pub read_only: Option<ReadOnlyFields>,
}

impl EditableRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Payload of a host `set` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteRequest {
    pub url: String,
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
}

/// One untyped element of an import payload.
///
/// Shape validation is deferred to [`RawImportRecord::project`] so a malformed
/// element fails on its own without failing the whole import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawImportRecord(pub serde_json::Value);

impl RawImportRecord {
    /// Project onto the settable fields. `hostOnly`, `session` and `storeId` are dropped.
    pub fn project(&self) -> Result<EditableRecord> {
        if !self.0.is_object() {
            return Err(CookieError::Validation(
                "Import record is not a JSON object".to_string(),
            ));
        }
        serde_json::from_value(self.0.clone())
            .map_err(|e| CookieError::Validation(format!("Malformed import record: {}", e)))
    }
}

impl From<serde_json::Value> for RawImportRecord {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Copy a host record into its editable form.
pub fn to_editable(raw: &CookieRecord) -> EditableRecord {
    EditableRecord {
        name: raw.name.clone(),
        value: raw.value.clone(),
        path: Some(raw.path.clone()),
        domain: Some(raw.domain.clone()),
        expiration_date: raw.expiration_date,
        same_site: raw.same_site,
        http_only: raw.http_only,
        secure: raw.secure,
        read_only: Some(ReadOnlyFields {
            host_only: raw.host_only,
            session: raw.session,
            store_id: raw.store_id.clone(),
        }),
    }
}

/// Build the host write payload for an edited record.
///
/// The target URL is `fallback_url` when given, otherwise `https://{domain}{path}`.
pub fn to_write_request(edited: &EditableRecord, fallback_url: Option<&str>) -> Result<WriteRequest> {
    if edited.name.trim().is_empty() {
        return Err(CookieError::Validation(
            "Cookie name must not be empty".to_string(),
        ));
    }
    if edited.value.is_empty() {
        return Err(CookieError::Validation(format!(
            "Cookie '{}' has an empty value",
            edited.name
        )));
    }

    let domain = edited
        .domain
        .as_deref()
        .map(|d| DomainUtils::strip_leading_dot(d.trim()).to_string())
        .filter(|d| !d.is_empty());
    let path = edited
        .path
        .as_deref()
        .filter(|p| p.starts_with('/'))
        .unwrap_or(DEFAULT_PATH)
        .to_string();

    let url = match (fallback_url, &domain) {
        (Some(url), _) => url.to_string(),
        (None, Some(domain)) => UrlUtils::cookie_url(domain, &path),
        (None, None) => {
            return Err(CookieError::Validation(format!(
                "Cookie '{}' has no domain and no target URL",
                edited.name
            )))
        }
    };

    Ok(WriteRequest {
        url,
        name: edited.name.clone(),
        value: edited.value.clone(),
        domain,
        path,
        expiration_date: edited.expiration_date,
        secure: edited.secure,
        http_only: edited.http_only,
        same_site: edited.same_site,
        store_id: edited.read_only.as_ref().map(|r| r.store_id.clone()),
    })
}

/// Parse a `document.cookie` style string into session cookies for `localhost`.
///
/// Used as the data source when the host cookie API is not reachable.
pub fn parse_document_cookie(input: &str) -> Vec<CookieRecord> {
    input
        .split(';')
        .filter_map(|pair| {
            let pair = pair.trim();
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(CookieRecord {
                name: name.to_string(),
                value: percent_decode_str(value.trim()).decode_utf8_lossy().into_owned(),
                domain: "localhost".to_string(),
                path: default_path(),
                expiration_date: None,
                secure: false,
                http_only: false,
                same_site: SameSite::NoRestriction,
                host_only: true,
                session: true,
                store_id: default_store_id(),
            })
        })
        .collect()
}

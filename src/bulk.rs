//! Bulk delete and import
//!
//! Every per-item host call is started before any is awaited, and every item is
//! attempted whatever happened to its siblings. Item failures only show up in the
//! [`BulkResult`] tally (and at `warn` level in the log).

use crate::codec;
use crate::cookie::{to_write_request, EditableRecord, RawImportRecord};
use crate::error::{CookieError, Result};
use crate::gateway::CookieGateway;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

/// Success/failure counts of one bulk operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkResult {
    pub success_count: usize,
    pub failure_count: usize,
}

impl BulkResult {
    pub fn total(&self) -> usize {
        self.success_count + self.failure_count
    }

    fn tally<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        outcomes.into_iter().fold(Self::default(), |mut acc, ok| {
            if ok {
                acc.success_count += 1;
            } else {
                acc.failure_count += 1;
            }
            acc
        })
    }
}

/// Proof that the user acknowledged a destructive bulk operation.
#[derive(Debug)]
pub struct Confirmed(());

impl Confirmed {
    pub fn acknowledge() -> Self {
        Confirmed(())
    }
}

#[derive(Clone)]
pub struct BulkCoordinator {
    gateway: CookieGateway,
}

impl BulkCoordinator {
    pub fn new(gateway: CookieGateway) -> Self {
        Self { gateway }
    }

    /// Remove every cookie visible from `url`. Irreversible.
    ///
    /// Only a failure to list the cookies aborts the operation.
    pub async fn delete_all(&self, url: &str, _confirmed: Confirmed) -> Result<BulkResult> {
        let cookies = self.gateway.get_all(url).await?;
        log::info!("Deleting {} cookies for {}", cookies.len(), url);

        let removals = cookies.iter().map(|cookie| async move {
            let target = cookie.url();
            match self.gateway.remove(&target, &cookie.name).await {
                Ok(true) => true,
                Ok(false) => {
                    log::warn!("Cookie '{}' was already gone at {}", cookie.name, target);
                    false
                }
                Err(err) => {
                    log::warn!("Failed to delete cookie '{}': {}", cookie.name, err);
                    false
                }
            }
        });

        let result = BulkResult::tally(join_all(removals).await);
        log::info!(
            "Deleted {} cookies, {} failed",
            result.success_count,
            result.failure_count
        );
        Ok(result)
    }

    /// Write each record at the URL `resolve_url` picks for it.
    ///
    /// A record that does not project onto the settable fields counts as a
    /// failure without any host call.
    pub async fn import_many<F>(
        &self,
        records: &[RawImportRecord],
        resolve_url: F,
    ) -> Result<BulkResult>
    where
        F: Fn(&EditableRecord) -> String,
    {
        if !self.gateway.is_available() {
            return Err(CookieError::HostUnavailable);
        }

        let writes = records.iter().enumerate().map(|(idx, raw)| {
            let request = raw.project().and_then(|edited| {
                let url = resolve_url(&edited);
                to_write_request(&edited, Some(&url))
            });
            async move {
                let request = match request {
                    Ok(request) => request,
                    Err(err) => {
                        log::warn!("Skipping import record #{}: {}", idx, err);
                        return false;
                    }
                };
                match self.gateway.set(&request).await {
                    Ok(written) => written,
                    Err(err) => {
                        log::warn!("Failed to import cookie '{}': {}", request.name, err);
                        false
                    }
                }
            }
        });

        let result = BulkResult::tally(join_all(writes).await);
        log::info!(
            "Imported {} cookies, {} failed",
            result.success_count,
            result.failure_count
        );
        Ok(result)
    }

    /// Import an already-parsed JSON payload. Anything but an array is rejected
    /// before any record is looked at.
    pub async fn import_value<F>(&self, payload: serde_json::Value, resolve_url: F) -> Result<BulkResult>
    where
        F: Fn(&EditableRecord) -> String,
    {
        let records = codec::records_from_value(payload)?;
        self.import_many(&records, resolve_url).await
    }
}

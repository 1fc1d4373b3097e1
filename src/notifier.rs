//! Change notifier
//!
//! Listens on the host cookie-change bus, keeps only changes relevant to the page
//! in the active tab, and broadcasts that page's full cookie set to the popup.
//!
//! ```text
//! Idle --start--> Subscribed --event--> Filtering --match--> Notifying --> Subscribed
//!                 Subscribed --stop--> Idle
//! ```

use crate::error::Result;
use crate::gateway::CookieGateway;
use crate::host::{CookieChange, TabQuery};
use crate::message::Message;
use crate::utils::{DomainUtils, UrlUtils};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

const OUTBOUND_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifierState {
    Idle,
    Subscribed,
    Filtering,
    Notifying,
}

pub struct ChangeNotifier {
    gateway: CookieGateway,
    tabs: Arc<dyn TabQuery>,
    outbound: broadcast::Sender<Message>,
    state: Mutex<NotifierState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeNotifier {
    pub fn new(gateway: CookieGateway, tabs: Arc<dyn TabQuery>) -> Self {
        let (outbound, _) = broadcast::channel(OUTBOUND_CAPACITY);
        Self {
            gateway,
            tabs,
            outbound,
            state: Mutex::new(NotifierState::Idle),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> NotifierState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(NotifierState::Idle)
    }

    fn set_state(&self, next: NotifierState) {
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    fn is_listening(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.is_some())
            .unwrap_or(false)
    }

    fn resting_state(&self) -> NotifierState {
        if self.is_listening() {
            NotifierState::Subscribed
        } else {
            NotifierState::Idle
        }
    }

    /// Receiver for the popup side. Each message means "refresh now".
    pub fn listen(&self) -> broadcast::Receiver<Message> {
        self.outbound.subscribe()
    }

    /// Start consuming `events` on a background task. Replaces any previous subscription.
    ///
    /// The task keeps the notifier alive until [`ChangeNotifier::stop`] or until the bus closes.
    pub fn start(self: &Arc<Self>, mut events: broadcast::Receiver<CookieChange>) {
        self.stop();

        let notifier = Arc::clone(self);
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(change) => {
                        if let Err(err) = notifier.handle_change(&change).await {
                            log::warn!("Dropping cookie change for '{}': {}", change.cookie.name, err);
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        log::warn!("Missed {} cookie changes, refreshing active page", missed);
                        if let Err(err) = notifier.notify_active().await {
                            log::warn!("Refresh after missed changes failed: {}", err);
                        }
                    }
                    Err(RecvError::Closed) => {
                        log::debug!("Cookie change bus closed");
                        break;
                    }
                }
            }
        });

        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
        self.set_state(NotifierState::Subscribed);
    }

    /// Stop listening. Changes already being handled are abandoned.
    pub fn stop(&self) {
        let handle = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(handle) = handle {
            handle.abort();
        }
        self.set_state(NotifierState::Idle);
    }

    /// Process one change event. Returns whether a refresh was broadcast.
    pub async fn handle_change(&self, change: &CookieChange) -> Result<bool> {
        self.set_state(NotifierState::Filtering);
        let outcome = self.filter_and_notify(change).await;
        self.set_state(self.resting_state());
        outcome
    }

    async fn filter_and_notify(&self, change: &CookieChange) -> Result<bool> {
        // Queried per event, never cached.
        let Some(active_url) = self.tabs.active_url().await? else {
            return Ok(false);
        };
        let Some(active_host) = UrlUtils::validate_url(&active_url)
            .ok()
            .and_then(|url| UrlUtils::extract_host(&url))
        else {
            return Ok(false);
        };

        if !affects_host(&change.cookie.domain, &active_host) {
            log::trace!(
                "Ignoring change to {} while on {}",
                change.cookie.domain,
                active_host
            );
            return Ok(false);
        }

        self.set_state(NotifierState::Notifying);
        self.broadcast_for(&active_url).await?;
        Ok(true)
    }

    async fn notify_active(&self) -> Result<bool> {
        match self.tabs.active_url().await? {
            Some(url) => {
                self.broadcast_for(&url).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn broadcast_for(&self, url: &str) -> Result<()> {
        let cookies = self.gateway.get_all(url).await?;
        log::debug!("Broadcasting {} cookies for {}", cookies.len(), url);
        if self.outbound.send(Message::CookiesChanged { cookies }).is_err() {
            log::debug!("No popup is listening for cookie changes");
        }
        Ok(())
    }
}

/// Whether a change to `cookie_domain` can alter the cookie set of `host`.
pub fn affects_host(cookie_domain: &str, host: &str) -> bool {
    let domain = DomainUtils::strip_leading_dot(cookie_domain);
    if DomainUtils::is_loopback(domain) && DomainUtils::is_loopback(host) {
        return true;
    }
    DomainUtils::domain_matches(domain, host)
}

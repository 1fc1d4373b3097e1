use cookie_inspector::cookie::{to_write_request, CookieRecord, EditableRecord, SameSite};
use cookie_inspector::gateway::CookieGateway;
use cookie_inspector::host::memory::{MemoryCookieHost, StaticTab};
use cookie_inspector::host::{ChangeCause, CookieChange, CookieEvents, CookieHost};
use cookie_inspector::message::Message;
use cookie_inspector::notifier::{ChangeNotifier, NotifierState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;
use tokio::time::timeout;

fn cookie(name: &str, domain: &str) -> CookieRecord {
    CookieRecord {
        name: name.to_string(),
        value: "v".to_string(),
        domain: domain.to_string(),
        path: "/".to_string(),
        expiration_date: None,
        secure: false,
        http_only: false,
        same_site: SameSite::Lax,
        host_only: !domain.starts_with('.'),
        session: true,
        store_id: "0".to_string(),
    }
}

fn change(cookie: CookieRecord) -> CookieChange {
    CookieChange {
        cause: ChangeCause::Explicit,
        cookie,
        removed: false,
    }
}

fn setup(active: Option<&str>) -> (Arc<ChangeNotifier>, Arc<MemoryCookieHost>, Arc<StaticTab>) {
    let host = Arc::new(MemoryCookieHost::with_cookies(vec![
        cookie("shared", ".example.com"),
        cookie("unrelated", "other.org"),
    ]));
    let tab = Arc::new(StaticTab::new(active.map(str::to_string)));
    let dyn_host: Arc<dyn CookieHost> = host.clone();
    let notifier = Arc::new(ChangeNotifier::new(CookieGateway::new(dyn_host), tab.clone()));
    (notifier, host, tab)
}

#[tokio::test]
async fn matching_change_broadcasts_full_cookie_set() {
    let (notifier, _, _) = setup(Some("https://app.example.com/dashboard"));
    let mut popup = notifier.listen();

    let notified = notifier
        .handle_change(&change(cookie("shared", ".example.com")))
        .await
        .expect("handle");
    assert!(notified);

    match popup.try_recv().expect("message") {
        Message::CookiesChanged { cookies } => {
            assert_eq!(cookies.len(), 1);
            assert_eq!(cookies[0].name, "shared");
        }
        other => panic!("unexpected message {other:?}"),
    }
}

#[tokio::test]
async fn unrelated_change_is_ignored() {
    let (notifier, _, _) = setup(Some("https://app.example.com/dashboard"));
    let mut popup = notifier.listen();

    let notified = notifier
        .handle_change(&change(cookie("unrelated", "other.org")))
        .await
        .expect("handle");
    assert!(!notified);
    assert!(matches!(popup.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn no_active_tab_means_no_broadcast() {
    let (notifier, _, _) = setup(None);
    let mut popup = notifier.listen();

    let notified = notifier
        .handle_change(&change(cookie("shared", ".example.com")))
        .await
        .expect("handle");
    assert!(!notified);
    assert!(matches!(popup.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn filter_follows_tab_switches() {
    let (notifier, _, tab) = setup(Some("https://app.example.com/"));
    let event = change(cookie("unrelated", "other.org"));
    assert!(!notifier.handle_change(&event).await.expect("handle"));

    tab.navigate(Some("https://other.org/".to_string()))
        .expect("navigate");
    assert!(notifier.handle_change(&event).await.expect("handle"));
}

#[tokio::test]
async fn removal_events_are_forwarded_too() {
    let (notifier, _, _) = setup(Some("https://example.com/"));
    let mut popup = notifier.listen();
    let mut event = change(cookie("gone", ".example.com"));
    event.removed = true;
    event.cause = ChangeCause::Expired;

    assert!(notifier.handle_change(&event).await.expect("handle"));
    assert!(popup.try_recv().is_ok());
}

#[tokio::test]
async fn started_notifier_reacts_to_host_writes() {
    let (notifier, host, _) = setup(Some("https://app.example.com/dashboard"));
    let mut popup = notifier.listen();
    assert_eq!(notifier.state(), NotifierState::Idle);

    notifier.start(host.subscribe());
    assert_eq!(notifier.state(), NotifierState::Subscribed);

    let gateway = CookieGateway::new(host.clone());
    let edited = EditableRecord {
        domain: Some("example.com".to_string()),
        ..EditableRecord::new("fresh", "1")
    };
    let request = to_write_request(&edited, Some("https://app.example.com/")).expect("request");
    gateway.set(&request).await.expect("set");

    let message = timeout(Duration::from_secs(2), popup.recv())
        .await
        .expect("notified in time")
        .expect("message");
    let Message::CookiesChanged { cookies } = message else {
        panic!("unexpected message");
    };
    assert!(cookies.iter().any(|c| c.name == "fresh"));

    notifier.stop();
    assert_eq!(notifier.state(), NotifierState::Idle);
}

#[tokio::test]
async fn stopped_notifier_stays_quiet() {
    let (notifier, host, _) = setup(Some("https://other.org/"));
    let mut popup = notifier.listen();
    notifier.start(host.subscribe());
    notifier.stop();

    let gateway = CookieGateway::new(host.clone());
    let request = to_write_request(&EditableRecord::new("late", "1"), Some("https://other.org/"))
        .expect("request");
    gateway.set(&request).await.expect("set");

    let outcome = timeout(Duration::from_millis(200), popup.recv()).await;
    assert!(outcome.is_err(), "no message after stop");
}

use super::{format_cookie_list, Notice, NoticeLevel, OutputWriter, NOTICE_DURATION};
use crate::bulk::BulkResult;
use crate::config::OutputConfig;
use crate::cookie::{CookieRecord, SameSite};
use crate::error::CookieError;
use tempfile::tempdir;

#[test]
fn notices_default_to_three_seconds() {
    let notice = Notice::success("Cookie saved");
    assert_eq!(notice.duration, NOTICE_DURATION);
    assert_eq!(notice.duration.as_secs(), 3);
    assert_eq!(notice.render(), "[success] Cookie saved");
}

#[test]
fn error_notice_distinguishes_unavailable_host() {
    let notice = Notice::from_error("List cookies", &CookieError::HostUnavailable);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("cannot be read"));

    let notice = Notice::from_error("Import", &CookieError::Parse("bad".to_string()));
    assert!(notice.message.contains("invalid input"));
    assert_eq!(notice.description.as_deref(), Some("Parse error: bad"));
}

#[test]
fn bulk_notice_reports_counts_only() {
    let clean = Notice::from_bulk(
        "Import",
        &BulkResult {
            success_count: 3,
            failure_count: 0,
        },
    );
    assert_eq!(clean.level, NoticeLevel::Success);
    assert_eq!(clean.message, "Import: 3 succeeded, 0 failed");

    let partial = Notice::from_bulk(
        "Delete all",
        &BulkResult {
            success_count: 1,
            failure_count: 2,
        },
    );
    assert_eq!(partial.level, NoticeLevel::Warning);
}

#[test]
fn render_includes_description() {
    let notice = Notice::warning("Heads up").with_description("details");
    assert_eq!(notice.render(), "[warning] Heads up: details");
}

#[test]
fn output_writer_writes_to_file() {
    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("out.json");
    let writer = OutputWriter::new(OutputConfig {
        file: Some(path.clone()),
        verbose: false,
        silent: false,
    });
    writer.write("[]").expect("write");
    let written = std::fs::read_to_string(path).expect("read");
    assert_eq!(written, "[]");
}

#[test]
fn silent_writer_swallows_notices() {
    let writer = OutputWriter::new(OutputConfig {
        file: None,
        verbose: true,
        silent: true,
    });
    writer.notice(&Notice::info("hidden")).expect("notice");
    writer.write_verbose("hidden").expect("verbose");
}

#[test]
fn cookie_list_shows_one_line_per_cookie() {
    let cookie = CookieRecord {
        name: "theme".to_string(),
        value: "dark".to_string(),
        domain: ".example.com".to_string(),
        path: "/".to_string(),
        expiration_date: Some(1_900_000_000.0),
        secure: true,
        http_only: false,
        same_site: SameSite::Lax,
        host_only: false,
        session: false,
        store_id: "0".to_string(),
    };
    let listing = format_cookie_list(&[cookie.clone(), cookie]);
    let lines: Vec<_> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "theme=dark\t.example.com\t/\t1900000000\tSameSite=lax\tSecure"
    );
    assert_eq!(format_cookie_list(&[]), "");
}

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::Path;
use std::process::Output;
use tempfile::tempdir;

const PAGE: &str = "https://app.example.com/";

fn run(store: &Path, args: &[&str]) -> Output {
    cargo_bin_cmd!("cookie-inspector")
        .env_remove("COOKIE_INSPECTOR_URL")
        .env_remove("COOKIE_INSPECTOR_STORE")
        .arg("--url")
        .arg(PAGE)
        .arg("--store")
        .arg(store)
        .args(args)
        .output()
        .expect("run cookie-inspector")
}

#[test]
fn test_cli_help_succeeds() {
    let output = cargo_bin_cmd!("cookie-inspector")
        .arg("--help")
        .output()
        .expect("run cookie-inspector");
    assert!(output.status.success(), "help should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "help should include usage text");
    assert!(stdout.contains("delete-all"));
}

#[test]
fn test_cli_set_then_list() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("store.json");

    let output = run(&store, &["set", "theme", "dark", "--same-site", "lax"]);
    assert!(output.status.success(), "set should succeed");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[success]"), "stderr: {stderr}");
    assert!(store.exists(), "store should be saved");

    let output = run(&store, &["list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("theme=dark\tapp.example.com\t/"), "stdout: {stdout}");
    assert!(stdout.contains("SameSite=lax"));
}

#[test]
fn test_cli_get_prints_json_record() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("store.json");
    assert!(run(&store, &["set", "lang", "en", "--http-only"]).status.success());

    let output = run(&store, &["get", "lang"]);
    assert!(output.status.success());
    let record: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json record");
    assert_eq!(record["name"], "lang");
    assert_eq!(record["httpOnly"], true);
    assert_eq!(record["hostOnly"], true);
}

#[test]
fn test_cli_update_and_delete() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("store.json");
    assert!(run(&store, &["set", "old", "1"]).status.success());
    assert!(run(&store, &["update", "old", "new", "2"]).status.success());

    let stdout = String::from_utf8_lossy(&run(&store, &["list"]).stdout).to_string();
    assert!(stdout.contains("new=2"));
    assert!(!stdout.contains("old=1"));

    assert!(run(&store, &["delete", "new"]).status.success());
    let stdout = String::from_utf8_lossy(&run(&store, &["list"]).stdout).to_string();
    assert!(stdout.trim().is_empty(), "stdout: {stdout}");
}

#[test]
fn test_cli_update_keeps_cookie_path() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("store.json");
    assert!(run(&store, &["set", "old", "1", "--path", "/app"]).status.success());
    assert!(run(&store, &["update", "old", "new", "2"]).status.success());

    let stdout = String::from_utf8_lossy(&run(&store, &["list"]).stdout).to_string();
    assert!(stdout.contains("new=2\tapp.example.com\t/app"), "stdout: {stdout}");
}

#[test]
fn test_cli_failed_save_keeps_action_error() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("missing-dir").join("store.json");

    let output = run(&store, &["delete-all"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--yes"), "stderr: {stderr}");
}

#[test]
fn test_cli_delete_all_requires_confirmation() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("store.json");
    assert!(run(&store, &["set", "a", "1"]).status.success());
    assert!(run(&store, &["set", "b", "2"]).status.success());

    let output = run(&store, &["delete-all"]);
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&run(&store, &["list"]).stdout).to_string();
    assert_eq!(stdout.lines().count(), 2);

    let output = run(&store, &["delete-all", "--yes"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2 succeeded, 0 failed"), "stderr: {stderr}");
}

#[test]
fn test_cli_export_then_import_into_new_store() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("store.json");
    let export = temp.path().join("cookies.json");
    assert!(run(&store, &["set", "a", "1", "--domain", ".example.com"]).status.success());
    assert!(run(&store, &["set", "b", "2"]).status.success());

    let export_arg = export.to_string_lossy().to_string();
    let output = run(&store, &["export", "-o", &export_arg]);
    assert!(output.status.success());
    assert!(export.exists());

    let fresh = temp.path().join("fresh.json");
    let output = run(&fresh, &["import", &export_arg]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2 succeeded, 0 failed"), "stderr: {stderr}");

    let stdout = String::from_utf8_lossy(&run(&fresh, &["list"]).stdout).to_string();
    assert!(stdout.contains("a=1"));
    assert!(stdout.contains("b=2"));
}

#[test]
fn test_cli_import_rejects_non_array() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("store.json");
    let input = temp.path().join("input.json");
    std::fs::write(&input, "{}").expect("write input");

    let output = run(&store, &["import", &input.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_import_rejects_binary_file() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("store.json");
    let input = temp.path().join("input.json");
    std::fs::write(&input, [0xff, 0xfe, b'[', b']']).expect("write input");

    let output = run(&store, &["import", &input.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(26));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid input"), "stderr: {stderr}");
}

#[test]
fn test_cli_without_store_reports_unavailable_host() {
    let output = cargo_bin_cmd!("cookie-inspector")
        .env_remove("COOKIE_INSPECTOR_STORE")
        .args(["--url", PAGE, "list"])
        .output()
        .expect("run cookie-inspector");
    assert_eq!(output.status.code(), Some(69));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be read"), "stderr: {stderr}");
}

#[test]
fn test_cli_document_cookie_fallback() {
    let output = cargo_bin_cmd!("cookie-inspector")
        .env_remove("COOKIE_INSPECTOR_STORE")
        .args([
            "--url",
            "http://localhost:3000",
            "--document-cookie",
            "theme=dark; id=42",
            "list",
        ])
        .output()
        .expect("run cookie-inspector");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("theme=dark\tlocalhost"));
    assert!(stdout.contains("id=42"));
}

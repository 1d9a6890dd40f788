//! CLI Integration Tests
//!
//! These tests drive the built `bucket` binary against `file://` buckets in
//! temporary directories.
//!
//! Run with:
//! ```bash
//! cargo test --test cli_integration
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::tempdir;
use url::Url;

/// Get the path to the built binary
fn bucket_binary() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("target");
    path.push("debug");
    path.push("bucket");
    path
}

fn file_url(dir: &Path) -> String {
    Url::from_directory_path(dir).unwrap().to_string()
}

/// Run bucket command and return (stdout, stderr, success)
fn run_bucket(args: &[&str], url: &str) -> (String, String, bool) {
    let output = Command::new(bucket_binary())
        .args(["-u", url, "-f", "json"])
        .args(args)
        .output()
        .expect("Failed to execute bucket");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

/// Run bucket with `stdin` piped in
fn run_bucket_with_stdin(args: &[&str], url: &str, stdin: &[u8]) -> (String, bool) {
    let mut child = Command::new(bucket_binary())
        .args(["-u", url, "-f", "json"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn bucket");

    child.stdin.take().unwrap().write_all(stdin).unwrap();
    let output = child.wait_with_output().unwrap();
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.success(),
    )
}

fn parse(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout.trim()).unwrap_or_else(|e| panic!("bad JSON {stdout:?}: {e}"))
}

// ============================================================================
// Listing
// ============================================================================

#[test]
fn test_cli_ls_matches_glob() {
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
    std::fs::write(dir.path().join("x.txt"), b"1").unwrap();
    std::fs::write(dir.path().join("a/y.txt"), b"2").unwrap();
    std::fs::write(dir.path().join("a/b/z.csv"), b"3").unwrap();
    let url = file_url(dir.path());

    let (stdout, _stderr, success) = run_bucket(&["ls", "**/*.txt"], &url);
    assert!(success, "ls should succeed");
    let json = parse(&stdout);
    assert_eq!(json["keys"], serde_json::json!(["a/y.txt", "x.txt"]));

    let (stdout, _stderr, success) = run_bucket(&["ls"], &url);
    assert!(success);
    assert_eq!(parse(&stdout)["keys"].as_array().unwrap().len(), 3);
}

#[test]
fn test_cli_ls_text_format() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("one.txt"), b"1").unwrap();
    let url = file_url(dir.path());

    let output = Command::new(bucket_binary())
        .args(["-u", &url, "-f", "text", "ls", "*"])
        .output()
        .expect("Failed to execute bucket");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "one.txt");
}

// ============================================================================
// Reading and writing
// ============================================================================

#[test]
fn test_cli_put_from_stdin_then_cat() {
    let dir = tempdir().unwrap();
    let url = file_url(dir.path());

    let (stdout, success) =
        run_bucket_with_stdin(&["put", "/notes/./today.txt"], &url, b"hello");
    assert!(success, "put should succeed: {stdout}");
    let json = parse(&stdout);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["path"], "notes/today.txt");
    assert_eq!(json["size"], 5);

    let output = Command::new(bucket_binary())
        .args(["-u", &url, "cat", "notes/today.txt"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout, b"hello");
    assert_eq!(
        std::fs::read(dir.path().join("notes/today.txt")).unwrap(),
        b"hello"
    );
}

#[test]
fn test_cli_put_from_file() {
    let dir = tempdir().unwrap();
    let source = tempdir().unwrap();
    let input = source.path().join("input.bin");
    std::fs::write(&input, b"from a file").unwrap();
    let url = file_url(dir.path());

    let (stdout, _stderr, success) = run_bucket(
        &[
            "put",
            "data.bin",
            "--file",
            input.to_str().unwrap(),
            "--content-type",
            "application/octet-stream",
            "--meta",
            "Owner=alice",
        ],
        &url,
    );
    assert!(success, "put --file should succeed: {stdout}");
    assert_eq!(
        std::fs::read(dir.path().join("data.bin")).unwrap(),
        b"from a file"
    );
}

#[test]
fn test_cli_info_reports_size() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("blob"), b"12345678").unwrap();
    let url = file_url(dir.path());

    let (stdout, _stderr, success) = run_bucket(&["info", "blob"], &url);
    assert!(success);
    let json = parse(&stdout);
    assert_eq!(json["path"], "blob");
    assert_eq!(json["size"], 8);
    assert!(json["modified_at"].is_string());
}

// ============================================================================
// Copy, move and remove
// ============================================================================

#[test]
fn test_cli_cp_mv_rm() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("src.txt"), b"payload").unwrap();
    let url = file_url(dir.path());

    let (_stdout, _stderr, success) = run_bucket(&["cp", "src.txt", "copy.txt"], &url);
    assert!(success, "cp should succeed");
    assert!(dir.path().join("src.txt").exists());
    assert_eq!(
        std::fs::read(dir.path().join("copy.txt")).unwrap(),
        b"payload"
    );

    let (stdout, _stderr, success) = run_bucket(&["mv", "./copy.txt", "moved/here.txt"], &url);
    assert!(success, "mv should succeed");
    let json = parse(&stdout);
    assert_eq!(json["src"], "copy.txt");
    assert_eq!(json["dst"], "moved/here.txt");
    assert!(!dir.path().join("copy.txt").exists());
    assert!(dir.path().join("moved/here.txt").exists());

    let (stdout, _stderr, success) = run_bucket(&["rm", "moved//here.txt"], &url);
    assert!(success, "rm should succeed");
    assert_eq!(parse(&stdout)["path"], "moved/here.txt");
    assert!(!dir.path().join("moved/here.txt").exists());

    let (_stdout, _stderr, success) = run_bucket(&["rm", "moved/here.txt"], &url);
    assert!(success, "rm of a missing blob should still succeed");
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_cli_missing_blob_is_an_error() {
    let dir = tempdir().unwrap();
    let url = file_url(dir.path());

    let (stdout, _stderr, success) = run_bucket(&["info", "nope.txt"], &url);
    assert!(!success, "info on a missing blob should fail");
    let json = parse(&stdout);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("nope.txt"));
}

#[test]
fn test_cli_rejects_traversal() {
    let dir = tempdir().unwrap();
    let url = file_url(dir.path());

    let (stdout, _stderr, success) = run_bucket(&["cat", "../../etc/passwd"], &url);
    assert!(!success);
    assert_eq!(parse(&stdout)["status"], "error");
}

#[test]
fn test_cli_unknown_scheme() {
    let (stdout, _stderr, success) = run_bucket(&["ls"], "nosuch://somewhere");
    assert!(!success);
    let json = parse(&stdout);
    assert_eq!(json["status"], "error");
    assert!(json["message"].as_str().unwrap().contains("nosuch"));
}

#[test]
fn test_cli_url_from_env() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("env.txt"), b"x").unwrap();

    let output = Command::new(bucket_binary())
        .env("BUCKET_URL", file_url(dir.path()))
        .args(["ls"])
        .output()
        .expect("Failed to execute bucket");

    assert!(output.status.success());
    let json = parse(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["keys"], serde_json::json!(["env.txt"]));
}

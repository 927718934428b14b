#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn streamprims() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_streamprims"));
    cmd.arg("--log-level").arg("error");
    cmd
}

fn unique_temp_file(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "streamprims-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ))
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect()
}

#[test]
fn encode_prints_canonical_hex() {
    let output = streamprims()
        .args(["--format", "pretty", "encode", "--tag", "0x04", "--data", "hi"])
        .output()
        .expect("encode should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "04026869");
}

#[test]
fn encode_raw_writes_bytes() {
    let output = streamprims()
        .args(["--format", "raw", "encode", "--tag", "48", "--hex", "02 01 2a"])
        .output()
        .expect("encode should run");

    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0x30, 0x03, 0x02, 0x01, 0x2a]);
}

#[test]
fn encode_json_reports_length() {
    let output = streamprims()
        .args(["--format", "json", "encode", "--tag", "0x0c", "--data", "abc"])
        .output()
        .expect("encode should run");

    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["tag_name"], "UTF8String");
    assert_eq!(lines[0]["len"], 5);
    assert_eq!(lines[0]["hex"], "0c03616263");
}

#[test]
fn inspect_hex_input_outputs_json_records() {
    let output = streamprims()
        .args([
            "--format",
            "json",
            "inspect",
            "--hex",
            "30020102 3080020101 0000",
            "--pipe-capacity",
            "3",
        ])
        .output()
        .expect("inspect should run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let lines = json_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["index"], 0);
    assert_eq!(lines[0]["len"], 4);
    assert_eq!(lines[0]["form"], "constructed");
    assert_eq!(lines[1]["form"], "indefinite");
    assert_eq!(lines[1]["len"], 7);
    assert!(lines[1]["schema_id"]
        .as_str()
        .is_some_and(|id| id.ends_with("element-inspected.schema.json")));
}

#[test]
fn inspect_reads_file_and_stdin() {
    let path = unique_temp_file("inspect");
    let mut bytes = vec![0x04, 0x82, 0x1f, 0x40];
    bytes.extend(std::iter::repeat(0x11).take(8000));
    std::fs::write(&path, &bytes).expect("input file should be writable");

    let output = streamprims()
        .args(["--format", "json", "inspect"])
        .arg(&path)
        .args(["--max-len", "8004", "--pipe-capacity", "512"])
        .output()
        .expect("inspect should run");
    assert!(output.status.success());
    let lines = json_lines(&output);
    assert_eq!(lines[0]["header_len"], 4);
    assert_eq!(lines[0]["contents_len"], 8000);

    let mut child = streamprims()
        .args(["--format", "json", "inspect", "-", "--max-len", "8003"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("inspect should start");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&bytes)
        .expect("stdin should accept input");
    let output = child.wait_with_output().expect("inspect should finish");

    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("too large"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn inspect_rejects_malformed_lengths() {
    for (hex, needle) in [
        ("30810101", "short form"),
        ("3082000101", "zero padding"),
        ("30030102", "truncated"),
    ] {
        let output = streamprims()
            .args(["--format", "json", "inspect", "--hex", hex])
            .output()
            .expect("inspect should run");

        assert_eq!(output.status.code(), Some(60), "input {hex}");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains(needle), "input {hex}: {stderr}");
    }
}

#[test]
fn inspect_count_limits_output() {
    let output = streamprims()
        .args(["--format", "pretty", "inspect", "--hex", "0500 0500 0500", "--count", "1"])
        .output()
        .expect("inspect should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.contains("(NULL, UNIVERSAL)"));
}

#[test]
fn invalid_hex_is_usage_error() {
    let output = streamprims()
        .args(["inspect", "--hex", "zz"])
        .output()
        .expect("inspect should run");
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn missing_input_file_fails() {
    let output = streamprims()
        .args(["inspect"])
        .arg(unique_temp_file("missing"))
        .output()
        .expect("inspect should run");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn version_reports_package_version() {
    let output = streamprims()
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("streamprims {}", env!("CARGO_PKG_VERSION"))
    );
}

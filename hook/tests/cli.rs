//! End-to-end runs of the `couchdb-fti-hook` binary as CouchDB would start it.

use std::io::Write;
use std::net::TcpListener;
use std::process::{Command, Output, Stdio};

const BIN: &str = env!("CARGO_BIN_EXE_couchdb-fti-hook");

fn run_hook(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(BIN)
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn unused_port() -> u16 {
    TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port()
}

#[test]
fn answers_every_line_and_exits_zero_on_eof() {
    let port = unused_port().to_string();
    let input = concat!(
        r#"{"path":["mydb","_fti"],"query":{}}"#,
        "\n",
        r#"{"path":["mydb","_fti","mydoc","myindex"],"query":{"q":"foo"}}"#,
        "\n",
    );
    let output = run_hook(
        &["--remote-host", "127.0.0.1", "--remote-port", &port, "--timeout", "2"],
        input,
    );

    assert!(output.status.success(), "status: {:?}", output.status);
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["code"], 400);
    assert_eq!(lines[1]["code"], 500);
    assert!(!lines[1]["body"].as_str().unwrap().is_empty());
}

#[test]
fn empty_stdin_exits_zero_without_output() {
    let output = run_hook(&[], "");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn unknown_flag_exits_with_usage_error() {
    let output = run_hook(&["--no-such-flag"], "");
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn unusable_url_exits_nonzero() {
    let output = run_hook(&["--url", "not a url"], "");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn logs_go_to_log_file_not_stdout() {
    let dir = std::env::temp_dir().join(format!("fti-hook-log-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let log = dir.join("hook.log");
    let _ = std::fs::remove_file(&log);

    let mut child = Command::new(BIN)
        .args(["--log-file", log.to_str().unwrap()])
        .env("RUST_LOG", "fti_hook=debug")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"path":[],"query":{}}"#)
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let logged = std::fs::read_to_string(&log).unwrap();
    assert!(logged.contains("rejected request"));
    assert!(output.stderr.is_empty());
}

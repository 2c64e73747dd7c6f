// Integration tests for `calllog run` and `calllog check`: exit codes, the
// --json stdout contract and the written call log.
//
// Run with: cargo test -p calllog-cli --test cli_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::{tempdir, TempDir};

fn calllog() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_calllog"));
    for var in [
        "RUST_LOG",
        "CALLLOG_INPUT_DIR",
        "CALLLOG_CONTACTS",
        "CALLLOG_BILLED",
        "CALLLOG_UNBILLED",
        "CALLLOG_OUTPUT",
        "CALLLOG_CLIENT_MARKER",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

const BILLED_PREAMBLE: &str = "Verizon Wireless\nCall Detail Report\nAccount: 1\n\n\n\n\n\n\n\n\n\n\n";

/// Input directory with csv sources and one client export.
fn records_dir() -> TempDir {
    let dir = tempdir().unwrap();
    let p = dir.path();
    fs::write(p.join("contacts.csv"), "Number,Name\n5551234567,Jane Doe\n").unwrap();
    fs::write(
        p.join("billed.csv"),
        format!(
            "{BILLED_PREAMBLE}Date,Time,In/Out number,Duration,Destination\n\
             01/14/2024,9:00 AM,555-123-4567,3,SEATTLE   WA\n\
             Total,,,3,\n"
        ),
    )
    .unwrap();
    fs::write(
        p.join("unbilled.csv"),
        "Unbilled usage\nAccount: 1\n\nDate,Time,Number,Minutes,Description\n\
         01/15/2024,2:00 PM,5559876543,4,Incoming\n",
    )
    .unwrap();
    fs::write(p.join("_Acme.csv"), "01/14/2024,9:00,5551234567,Seattle,Portland,3,\n").unwrap();
    dir
}

fn sources(dir: &Path) -> Vec<String> {
    vec![
        "--input-dir".into(),
        dir.display().to_string(),
        "--contacts".into(),
        "contacts.csv".into(),
        "--billed".into(),
        "billed.csv".into(),
        "--unbilled".into(),
        "unbilled.csv".into(),
    ]
}

fn run_with(dir: &Path, extra: &[&str]) -> Output {
    calllog()
        .arg("run")
        .args(sources(dir))
        .args(extra)
        .output()
        .expect("calllog run")
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_writes_log_and_json_summary() {
    let dir = records_dir();
    let output = run_with(dir.path(), &["--json"]);
    assert!(
        output.status.success(),
        "exit {:?}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary: serde_json::Value = serde_json::from_str(stdout.trim()).expect("valid JSON");
    assert_eq!(summary["log_rows"], 2);
    assert_eq!(summary["billed_rows"], 1);
    assert_eq!(summary["unbilled_rows"], 1);
    assert_eq!(summary["rows_with_client"], 1);

    let log = fs::read_to_string(dir.path().join("call_log.csv")).unwrap();
    assert_eq!(
        log,
        "date,time,number,duration,destination,billed,name,client\n\
         2024-01-15,14:00:00,5559876543,4,Incoming,false,,\n\
         2024-01-14,09:00:00,5551234567,3,SEATTLE WA,true,Jane Doe,Acme\n"
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("call log: 2 calls"), "stderr: {stderr}");
}

#[test]
fn run_writes_summary_file() {
    let dir = records_dir();
    let summary_path = dir.path().join("summary.json");
    let output = run_with(dir.path(), &["--summary-json", summary_path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty(), "no --json, nothing on stdout");

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).unwrap();
    assert_eq!(summary["client_files"], 1);
    assert!(summary["meta"]["engine_version"].is_string());
}

#[test]
fn run_from_config_file() {
    let dir = records_dir();
    fs::write(
        dir.path().join("calllog.toml"),
        "contacts = \"contacts.csv\"\nbilled = \"billed.csv\"\nunbilled = \"\"\noutput = \"out.csv\"\n",
    )
    .unwrap();

    let output = calllog()
        .args(["run", dir.path().join("calllog.toml").to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let log = fs::read_to_string(dir.path().join("out.csv")).unwrap();
    assert_eq!(log.lines().count(), 2);
}

#[test]
fn env_fallbacks() {
    let dir = records_dir();
    let output = calllog()
        .arg("run")
        .env("CALLLOG_INPUT_DIR", dir.path())
        .env("CALLLOG_CONTACTS", "contacts.csv")
        .env("CALLLOG_BILLED", "billed.csv")
        .args(["--no-unbilled", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let summary: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(summary["log_rows"], 1);
    assert!(summary["unbilled_rows"].is_null());
}

// ---------------------------------------------------------------------------
// exit codes
// ---------------------------------------------------------------------------

#[test]
fn no_carrier_source_exits_60() {
    let dir = records_dir();
    let output = calllog()
        .args(["run", "--input-dir", dir.path().to_str().unwrap()])
        .args(["--contacts", "contacts.csv", "--no-billed", "--no-unbilled"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: no carrier source listed"), "stderr: {stderr}");
    assert!(stderr.contains("hint:"));
    assert!(!dir.path().join("call_log.csv").exists());
}

#[test]
fn missing_input_exits_61() {
    let dir = records_dir();
    fs::remove_file(dir.path().join("unbilled.csv")).unwrap();
    let output = run_with(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(61));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unbilled: file not found"));
}

#[test]
fn missing_total_exits_62() {
    let dir = records_dir();
    let billed = fs::read_to_string(dir.path().join("billed.csv")).unwrap();
    fs::write(dir.path().join("billed.csv"), billed.replace("Total,,,3,\n", "")).unwrap();

    let output = run_with(dir.path(), &[]);
    assert_eq!(output.status.code(), Some(62));
    assert!(!dir.path().join("call_log.csv").exists());
}

#[test]
fn bad_config_exits_60() {
    let dir = records_dir();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "contacts = [1, 2]\n").unwrap();
    let output = calllog().args(["run", config.to_str().unwrap()]).output().unwrap();
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn usage_errors_exit_2() {
    let output = calllog().args(["run", "--no-such-flag"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let dir = records_dir();
    let output = run_with(dir.path(), &["--no-billed"]);
    assert_eq!(output.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_lists_client_files_without_writing() {
    let dir = records_dir();
    fs::write(dir.path().join("_Beta.csv"), "").unwrap();

    let output = calllog()
        .arg("check")
        .args(sources(dir.path()))
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    let clients = report["client_files"].as_array().unwrap();
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0]["client"], "Acme");
    assert_eq!(clients[1]["file"], "_Beta.csv");
    assert!(!dir.path().join("call_log.csv").exists());
}

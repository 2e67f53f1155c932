#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn doorlock(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("doorlock").unwrap();
    cmd.current_dir(dir.path()).env_remove("DOORLOCK_CONFIG");
    cmd
}

fn write_config(dir: &TempDir, yaml: &str) -> PathBuf {
    let path = dir.path().join("doorlock.yaml");
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Short, fast motion so device runs finish in well under a second.
const FAST_ACTUATOR: &str = "\
actuator:
  steps: 20
  hold_ms: 50
  max_speed: 2000.0
  acceleration: 20000.0
";

// ---------------------------------------------------------------------------
// doorlock init / config
// ---------------------------------------------------------------------------

#[test]
fn init_writes_default_config() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created"));

    let content = std::fs::read_to_string(dir.path().join("doorlock.yaml")).unwrap();
    assert!(content.contains("sequence:"));
    assert!(content.contains("actuator:"));
}

#[test]
fn init_keeps_existing_file() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "sequence:\n  target: [1, 2, 3]\n");
    doorlock(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists"));

    let content = std::fs::read_to_string(dir.path().join("doorlock.yaml")).unwrap();
    assert!(content.contains("[1, 2, 3]"));
}

#[test]
fn config_validate_defaults_are_clean() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_rejects_out_of_range_target() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "sequence:\n  target: [0, 9, 0]\n");
    doorlock(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_show_json_fills_defaults() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "actuator:\n  steps: 80\n");
    let out = doorlock(&dir)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["actuator"]["steps"], 80);
    assert_eq!(value["link"]["baud_rate"], 9600);
}

#[test]
fn explicit_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .args(["--config", "nope.yaml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.yaml"));
}

// ---------------------------------------------------------------------------
// doorlock match
// ---------------------------------------------------------------------------

#[test]
fn match_correct_sequence_with_gaps() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .args(["match", "none", "0", "none", "1", "none", "0", "none", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("matched"))
        .stdout(predicate::str::contains("Sequence [0, 1, 0, 5] matched."));
}

#[test]
fn match_wrong_symbol_resets() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .args(["match", "0", "1", "0", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mismatched"))
        .stdout(predicate::str::contains("No match"));
}

#[test]
fn match_json_reports_events() {
    let dir = TempDir::new().unwrap();
    let out = doorlock(&dir)
        .args(["--json", "match", "--target", "2,4", "2", "2", "4"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["matched"], true);
    let steps = value["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[1]["event"], "no_change");
    assert_eq!(steps[2]["event"], "matched");
}

#[test]
fn match_rejects_bad_token() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .args(["match", "0", "seven"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("seven"));
}

// ---------------------------------------------------------------------------
// doorlock host --dry-run
// ---------------------------------------------------------------------------

#[test]
fn host_dry_run_unlocks_on_sequence() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .args(["host", "--dry-run"])
        .write_stdin("0 - 1 - 0 - 5\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("sequence matched  -> sent 'on'"))
        .stdout(predicate::str::contains("Door opened: yes"));
}

#[test]
fn host_dry_run_wrong_sequence_stays_locked() {
    let dir = TempDir::new().unwrap();
    let out = doorlock(&dir)
        .args(["--json", "host", "--dry-run"])
        .write_stdin("0\n1\n0\n3\n")
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["summary"]["door_opened"], false);
    assert_eq!(value["summary"]["mismatches"], 1);
}

#[test]
fn host_skips_bad_tokens_and_keeps_running() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .args(["host", "--dry-run"])
        .write_stdin("0 - seven 1 - 9 0 - 5\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("sequence matched  -> sent 'on'"))
        .stderr(predicate::str::contains("seven"));
}

// ---------------------------------------------------------------------------
// doorlock send
// ---------------------------------------------------------------------------

#[test]
fn send_rejects_unknown_command() {
    let dir = TempDir::new().unwrap();
    doorlock(&dir)
        .args(["send", "open"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown command 'open'"));
}

#[test]
fn send_reports_missing_port() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "link:\n  port: /nonexistent/doorlock-tty\n  open_settle_ms: 0\n");
    doorlock(&dir)
        .args(["send", "on"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to send 'on'"))
        .stderr(predicate::str::contains("/nonexistent/doorlock-tty"));
}

// ---------------------------------------------------------------------------
// doorlock device
// ---------------------------------------------------------------------------

#[test]
fn device_on_advances_holds_and_disables() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, FAST_ACTUATOR);
    doorlock(&dir)
        .arg("device")
        .write_stdin("#on\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("Actuator controller ready"))
        .stdout(predicate::str::contains("Motor ON - advancing 20 steps"))
        .stdout(predicate::str::contains("20 steps completed. Holding for 50 ms..."))
        .stdout(predicate::str::contains("Hold complete. Motor OFF - disabled"));
}

#[test]
fn device_off_rewinds_and_disables() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, FAST_ACTUATOR);
    doorlock(&dir)
        .arg("device")
        .write_stdin("OFF\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("Motor OFF - rewinding 20 steps"))
        .stdout(predicate::str::contains("Rewind complete. Motor disabled."));
}

#[test]
fn device_reports_unknown_command() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, FAST_ACTUATOR);
    doorlock(&dir)
        .arg("device")
        .write_stdin("#open\n")
        .timeout(std::time::Duration::from_secs(10))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Unknown command '#open'. Use '#on' or '#off'",
        ));
}

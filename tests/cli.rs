use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use std::io::Write;
use tempfile::NamedTempFile;

const ABC_FRAME: &str = "DD 01 00 03 41 42 43 FF 37 77";

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("antbms"))
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("query").and(contains("decode")));
    cmd().args(["query", "--help"]).assert().success();
}

#[test]
fn decode_valid_frame() {
    cmd()
        .args(["decode", ABC_FRAME])
        .assert()
        .success()
        .stdout(
            contains("Raw response (hex): DD 01 00 03 41 42 43 FF 37 77")
                .and(contains("Checksum verification passed."))
                .and(contains("Command ID: 0x01"))
                .and(contains("Status: 0x00"))
                .and(contains("Data Length: 3"))
                .and(contains("Data (ASCII): ABC")),
        );
}

#[test]
fn checksum_mismatch_still_parses() {
    cmd()
        .args(["decode", "DD 01 00 02 00 FF 00 00 77"])
        .assert()
        .success()
        .stdout(
            contains("Checksum verification FAILED!")
                .and(contains("Data (Hex): 00 FF")),
        );
}

#[test]
fn short_frame_fails() {
    cmd()
        .args(["decode", "DD 77"])
        .assert()
        .failure()
        .stdout(contains("Checksum verification FAILED!"))
        .stderr(contains("Cannot parse packet").and(contains("frame too short")));
}

#[test]
fn bad_marker_fails() {
    cmd()
        .args(["decode", "AA 01 00 03 41 42 43 FF 37 77"])
        .assert()
        .failure()
        .stderr(contains("invalid start marker"));
}

#[test]
fn overrun_length_fails() {
    cmd()
        .args(["decode", "DD 01 00 05 41 42 FF FF 77"])
        .assert()
        .failure()
        .stderr(contains("declared data length 5"));
}

#[test]
fn invalid_hex_fails() {
    cmd()
        .args(["decode", "DD XY"])
        .assert()
        .failure()
        .stderr(contains("Cannot decode hex frame"));
}

#[test]
fn json_output() {
    let output = cmd()
        .args(["--format", "json", "decode", ABC_FRAME])
        .output()
        .expect("run antbms");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["checksum_valid"], true);
    assert_eq!(value["raw"], ABC_FRAME);
    assert_eq!(value["packet"]["command"], 1);
    assert_eq!(value["packet"]["status"], 0);
    assert_eq!(value["packet"]["data_length"], 3);
    assert_eq!(value["packet"]["data"], serde_json::json!([0x41, 0x42, 0x43]));
    assert_eq!(value["packet"]["status_ok"], true);
    assert_eq!(value["packet"]["data_ascii"], "ABC");
    assert_eq!(value["packet"]["data_hex"], "41 42 43");
    assert!(value["error"].is_null());
}

#[test]
fn json_output_reports_framing_error() {
    let output = cmd()
        .args(["-f", "json", "decode", "DD 01 00 05 41 42 FF FF 77"])
        .output()
        .expect("run antbms");
    assert!(!output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert!(value["packet"].is_null());
    assert_eq!(value["checksum_valid"], false);
    assert!(value["error"]
        .as_str()
        .expect("error message")
        .contains("declared data length 5"));
}

#[test]
fn config_file_is_validated() {
    let mut config = NamedTempFile::new().expect("tempfile");
    writeln!(config, "device: /dev/ttyS0\nbaud_rate: 19200").expect("write config");
    cmd()
        .arg("--config")
        .arg(config.path())
        .args(["decode", ABC_FRAME])
        .assert()
        .success();

    let mut broken = NamedTempFile::new().expect("tempfile");
    writeln!(broken, "baudrate: 19200").expect("write config");
    cmd()
        .arg("--config")
        .arg(broken.path())
        .args(["decode", ABC_FRAME])
        .assert()
        .failure()
        .stderr(contains("Cannot parse config file"));
}

#[test]
fn error_status_is_reported() {
    let output = cmd()
        .args(["--format", "json", "decode", "DD 05 80 00 FF 80 77"])
        .output()
        .expect("run antbms");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(value["checksum_valid"], true);
    assert_eq!(value["packet"]["status"], 0x80);
    assert_eq!(value["packet"]["status_ok"], false);
    assert!(String::from_utf8_lossy(&output.stderr).contains("BMS reported status 0x80"));
}

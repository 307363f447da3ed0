// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn write_temp_file(prefix: &str, ext: &str, contents: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("labwired-i2c-tests");
    let _ = std::fs::create_dir_all(&dir);

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = dir.join(format!("{}-{}.{}", prefix, nonce, ext));
    std::fs::write(&path, contents).expect("Failed to write temp file");
    path
}

const MANIFEST: &str = r#"
name: "bench"
devices:
  - id: "eeprom"
    type: "memory"
    address: 0x50
    config:
      capacity: "64KiB"
  - id: "gpio"
    type: "io_expander"
    address: 0x20
    config:
      inputs: [0x12, 0x34]
  - id: "mux"
    type: "mux"
    address: 0x70
"#;

fn run(manifest: &PathBuf, script: &PathBuf, extra: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_labwired-i2c"))
        .arg("run")
        .arg("--manifest")
        .arg(manifest)
        .arg("--script")
        .arg(script)
        .args(extra)
        .output()
        .expect("Failed to run labwired-i2c")
}

#[test]
fn test_run_passing_script_writes_json() {
    let manifest = write_temp_file("manifest", "yaml", MANIFEST);
    let script = write_temp_file(
        "script-pass",
        "yaml",
        r#"
schema_version: "1.0"
steps:
  - target: "eeprom"
    op:
      write: [0x00, 0x10, 0xDE, 0xAD]
  - target: "eeprom"
    op: finish
  - target: "eeprom"
    op:
      write: [0x00, 0x10]
  - target: "eeprom"
    op:
      read: 2
    expect: [0xDE, 0xAD]
  - target: "gpio"
    op:
      write: [0x00]
  - target: "gpio"
    op:
      read: 2
    expect: [0x12, 0x34]
  - target: "mux"
    op:
      write: [0x04]
  - target: "mux"
    op:
      read: 1
    expect: [0x04]
"#,
    );
    let json = write_temp_file("result", "json", "");

    let output = run(&manifest, &script, &["--json", json.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0), "{:?}", output);

    let text = std::fs::read_to_string(&json).unwrap();
    let result: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(result["status"], "pass");
    assert_eq!(result["steps"].as_array().unwrap().len(), 8);
    assert_eq!(result["devices"]["mux"]["control"], 4);
}

#[test]
fn test_run_expectation_mismatch_exit_1() {
    let manifest = write_temp_file("manifest", "yaml", MANIFEST);
    let script = write_temp_file(
        "script-fail",
        "yaml",
        r#"
steps:
  - target: "mux"
    op:
      read: 1
    expect: [0xFF]
"#,
    );

    let output = run(&manifest, &script, &[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_script_unknown_fields_exit_2() {
    let manifest = write_temp_file("manifest", "yaml", MANIFEST);
    let script = write_temp_file(
        "script-unknown",
        "yaml",
        r#"
steps:
  - target: "mux"
    op: finish
    unexpected_field: 123
"#,
    );

    let output = run(&manifest, &script, &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_unknown_target_exit_2() {
    let manifest = write_temp_file("manifest", "yaml", MANIFEST);
    let script = write_temp_file(
        "script-target",
        "yaml",
        r#"
steps:
  - target: "rtc"
    op: reset
"#,
    );

    let output = run(&manifest, &script, &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_duplicate_address_manifest_exit_2() {
    let manifest = write_temp_file(
        "manifest-dup",
        "yaml",
        r#"
name: "clash"
devices:
  - id: "a"
    type: "mux"
    address: 0x70
  - id: "b"
    type: "mux"
    address: 0x70
"#,
    );
    let script = write_temp_file("script-empty", "yaml", "steps: []\n");

    let output = run(&manifest, &script, &[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_inspect_prints_reset_state() {
    let manifest = write_temp_file("manifest", "yaml", MANIFEST);
    let output = Command::new(env!("CARGO_BIN_EXE_labwired-i2c"))
        .args(["inspect", "--manifest", manifest.to_str().unwrap()])
        .output()
        .expect("Failed to run labwired-i2c");
    assert_eq!(output.status.code(), Some(0));

    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["mux"]["control"], 0);
    assert!(snapshot.get("eeprom").is_some());
    assert!(snapshot.get("gpio").is_some());
}

#[test]
fn test_oversized_read_exit_2() {
    let manifest = write_temp_file("manifest", "yaml", MANIFEST);
    let script = write_temp_file(
        "script-huge-read",
        "yaml",
        r#"
steps:
  - target: "eeprom"
    op:
      read: 18446744073709551615
"#,
    );

    let output = run(&manifest, &script, &[]);
    assert_eq!(output.status.code(), Some(2));
}

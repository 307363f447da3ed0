// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_i2c_config::{
    DeviceKind, DeviceManifest, LineLevel, SignalStep, TransactionOp, TransactionScript,
};

#[test]
fn test_manifest_parses_type_aliases() {
    let yaml = r#"
name: "aliases"
devices:
  - id: "rom"
    type: "at24"
    address: 0x50
    config:
      capacity: "128KiB"
  - id: "gpio"
    type: "pca9555"
    address: 0x20
  - id: "switch"
    type: "pca9548"
    address: 0x70
"#;
    let manifest = DeviceManifest::from_yaml(yaml).unwrap();
    assert_eq!(manifest.schema_version, "1.0");
    let kinds: Vec<DeviceKind> = manifest.devices.iter().map(|d| d.r#type).collect();
    assert_eq!(
        kinds,
        vec![DeviceKind::Memory, DeviceKind::IoExpander, DeviceKind::Mux]
    );
    assert_eq!(
        manifest.devices[0].size_option("capacity", 0).unwrap(),
        128 * 1024
    );
    assert!(manifest.devices[1].config.is_empty());
}

#[test]
fn test_manifest_rejects_bad_schema_and_ids() {
    let yaml = r#"
schema_version: "2.0"
name: "future"
"#;
    assert!(DeviceManifest::from_yaml(yaml).is_err());

    let yaml = r#"
name: "dupes"
devices:
  - id: "a"
    type: "mux"
    address: 0x70
  - id: "a"
    type: "mux"
    address: 0x71
"#;
    let err = DeviceManifest::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("Duplicate device id"));

    let yaml = r#"
name: "blank"
devices:
  - id: " "
    type: "mux"
    address: 0x70
"#;
    assert!(DeviceManifest::from_yaml(yaml).is_err());
}

#[test]
fn test_script_parses_every_op() {
    let yaml = r#"
steps:
  - target: "eeprom"
    op:
      write: [0x00, 0x10, 0xAB]
  - target: "eeprom"
    op: finish
  - target: "eeprom"
    op:
      read: 3
    expect: [1, 2, 3]
  - target: "eeprom"
    op: reset
  - target: "eeprom"
    op:
      signal:
        line: "WP"
        level: high
"#;
    let script: TransactionScript = serde_yaml::from_str(yaml).unwrap();
    script.validate().unwrap();

    let ops: Vec<&TransactionOp> = script.steps.iter().map(|s| &s.op).collect();
    assert_eq!(
        ops,
        vec![
            &TransactionOp::Write(vec![0x00, 0x10, 0xAB]),
            &TransactionOp::Finish,
            &TransactionOp::Read(3),
            &TransactionOp::Reset,
            &TransactionOp::Signal(SignalStep {
                line: "WP".to_string(),
                level: LineLevel::High,
            }),
        ]
    );
    assert_eq!(script.steps[2].expect, Some(vec![1, 2, 3]));
}

#[test]
fn test_script_rejects_unknown_fields() {
    let yaml = r#"
steps:
  - target: "mux"
    op: finish
    timeout: 10
"#;
    assert!(serde_yaml::from_str::<TransactionScript>(yaml).is_err());

    let yaml = r#"
steps: []
limits:
  max_steps: 1
"#;
    assert!(serde_yaml::from_str::<TransactionScript>(yaml).is_err());
}

#[test]
fn test_load_script_from_file() {
    let dir = std::env::temp_dir().join("labwired-i2c-config-tests");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("script-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        r#"
steps:
  - target: "mux"
    op:
      write: [1]
    expect: [1]
"#,
    )
    .unwrap();

    let err = labwired_i2c_config::load_transaction_script(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("only valid on read steps"));

    assert!(labwired_i2c_config::load_transaction_script(dir.join("missing.yaml")).is_err());
}

#[test]
fn test_script_rejects_oversized_read() {
    let yaml = r#"
steps:
  - target: "eeprom"
    op:
      read: 18446744073709551615
"#;
    let script: TransactionScript = serde_yaml::from_str(yaml).unwrap();
    let err = script.validate().unwrap_err();
    assert!(err.to_string().contains("byte limit"));

    let yaml = format!(
        "steps:\n  - target: \"eeprom\"\n    op:\n      read: {}\n",
        labwired_i2c_config::MAX_READ_LEN
    );
    let script: TransactionScript = serde_yaml::from_str(&yaml).unwrap();
    assert!(script.validate().is_ok());
}

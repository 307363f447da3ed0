// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_i2c_config::DeviceManifest;
use labwired_i2c_core::devices::{Addressing, ChannelMux, Eeprom, IoExpander};
use labwired_i2c_core::system::builder::build_device_set;
use labwired_i2c_core::{Diagnostic, DigitalLevel, I2cTarget, RecordingSink, TracingSink};
use std::sync::Arc;

const MANIFEST: &str = r#"
name: "sensor-board"
devices:
  - id: "eeprom0"
    type: "memory"
    address: 0x50
    config:
      capacity: "1MiB"
      addressing: "extended"
      select_high: true
      read_boundary: "wrap"
  - id: "gpio"
    type: "io_expander"
    address: 0x20
    config:
      inputs: [0x0F, 0xF0]
  - id: "mux"
    type: "mux"
    address: 0x70
"#;

#[test]
fn test_build_from_manifest() -> anyhow::Result<()> {
    let manifest = DeviceManifest::from_yaml(MANIFEST)?;
    let mut set = build_device_set(&manifest, Arc::new(TracingSink))?;
    assert_eq!(set.len(), 3);

    let eeprom = set
        .get_as_mut::<Eeprom>("eeprom0")
        .expect("eeprom0 is an Eeprom");
    assert_eq!(eeprom.capacity(), 1 << 20);
    assert_eq!(
        eeprom.snapshot()["addressing"],
        serde_json::to_value(Addressing::Extended { select_high: true })?
    );

    let gpio = set.by_address_mut(0x20).expect("expander at 0x20");
    gpio.write(&[0x00]);
    assert_eq!(gpio.read(2), vec![0x0F, 0xF0]);

    let mux = set.get_mut("mux").expect("mux");
    mux.write(&[0x03]);
    assert_eq!(
        set.get_as_mut::<ChannelMux>("mux")
            .expect("mux")
            .control(),
        0x03
    );
    assert!(set.get_as_mut::<IoExpander>("mux").is_none());

    set.reset_all();
    assert_eq!(set.snapshot()["mux"]["control"], 0);
    Ok(())
}

#[test]
fn test_write_protect_via_signal() -> anyhow::Result<()> {
    let manifest = DeviceManifest::from_yaml(MANIFEST)?;
    let sink = Arc::new(RecordingSink::new());
    let mut set = build_device_set(&manifest, sink.clone())?;

    let dev = set.get_mut("eeprom0").expect("eeprom0");
    dev.as_signal_receiver_mut()
        .expect("eeprom accepts signals")
        .on_signal("WP", DigitalLevel::High);
    dev.write(&[0x00, 0x00, 0xAB]);
    dev.finish_transmission();
    dev.write(&[0x00, 0x00]);
    assert_eq!(dev.read(1), vec![0x00]);

    let entries = sink.entries();
    assert!(entries.contains(&(
        "eeprom0".to_string(),
        Diagnostic::WriteProtected {
            address: 0x1_0000,
            count: 1
        }
    )));
    // Two address phases plus the suppressed write.
    assert_eq!(entries.iter().filter(|(s, _)| s == "eeprom0").count(), 3);
    Ok(())
}

#[test]
fn test_mux_has_no_signal_inputs() -> anyhow::Result<()> {
    let manifest = DeviceManifest::from_yaml(MANIFEST)?;
    let mut set = build_device_set(&manifest, Arc::new(TracingSink))?;
    let mux = set.get_mut("mux").expect("mux");
    assert!(mux.as_signal_receiver_mut().is_none());
    Ok(())
}

#[test]
fn test_invalid_options_are_rejected() {
    let yaml = r#"
name: "bad"
devices:
  - id: "eeprom0"
    type: "memory"
    address: 0x50
    config:
      addressing: "sideways"
"#;
    let manifest = DeviceManifest::from_yaml(yaml).unwrap();
    let err = build_device_set(&manifest, Arc::new(TracingSink)).err().unwrap();
    assert!(format!("{:#}", err).contains("sideways"));

    let yaml = r#"
name: "small"
devices:
  - id: "eeprom0"
    type: "memory"
    address: 0x50
    config:
      capacity: 4096
      addressing: "extended"
"#;
    let manifest = DeviceManifest::from_yaml(yaml).unwrap();
    let err = build_device_set(&manifest, Arc::new(TracingSink)).err().unwrap();
    assert!(format!("{:#}", err).contains("extended addressing"));

    let yaml = r#"
name: "pins"
devices:
  - id: "gpio"
    type: "io_expander"
    address: 0x20
    config:
      inputs: [1, 2, 3]
"#;
    let manifest = DeviceManifest::from_yaml(yaml).unwrap();
    assert!(build_device_set(&manifest, Arc::new(TracingSink)).is_err());
}

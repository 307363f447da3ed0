// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::devices::memory::DEFAULT_CAPACITY;
use crate::devices::{Addressing, ChannelMux, Eeprom, IoExpander, MemoryConfig, ReadBoundary};
use crate::diagnostics::{DiagnosticSink, Diagnostics};
use crate::system::DeviceSet;
use crate::I2cTarget;
use anyhow::Context;
use labwired_i2c_config::{DeviceConfig, DeviceKind, DeviceManifest};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn memory_config(cfg: &DeviceConfig) -> anyhow::Result<MemoryConfig> {
    let capacity = cfg.size_option("capacity", DEFAULT_CAPACITY as u64)?;
    let capacity = usize::try_from(capacity)
        .with_context(|| format!("Capacity of '{}' does not fit in memory", cfg.id))?;

    let addressing = match cfg.str_option("addressing", "standard")? {
        "standard" => Addressing::Standard,
        "extended" => Addressing::Extended {
            select_high: cfg.bool_option("select_high", false)?,
        },
        other => return Err(cfg.unsupported("addressing", other).into()),
    };

    let read_boundary = match cfg.str_option("read_boundary", "truncate")? {
        "truncate" => ReadBoundary::Truncate,
        "wrap" => ReadBoundary::Wrap,
        other => return Err(cfg.unsupported("read_boundary", other).into()),
    };

    Ok(MemoryConfig {
        capacity,
        addressing,
        read_boundary,
        write_protected: cfg.bool_option("write_protected", false)?,
    })
}

/// Instantiates one device from its manifest entry.
pub fn build_device(
    cfg: &DeviceConfig,
    sink: Arc<dyn DiagnosticSink>,
) -> anyhow::Result<Box<dyn I2cTarget>> {
    let diagnostics = Diagnostics::new(cfg.id.clone(), sink);
    let dev: Box<dyn I2cTarget> = match cfg.r#type {
        DeviceKind::Memory => Box::new(Eeprom::new(memory_config(cfg)?, diagnostics)?),
        DeviceKind::IoExpander => {
            let dev = IoExpander::new(diagnostics)?;
            if let Some(inputs) = cfg.byte_list_option("inputs")? {
                let [port0, port1] = inputs.as_slice() else {
                    return Err(cfg.unsupported("inputs", &format!("{:?}", inputs)).into());
                };
                dev.set_input_levels(u16::from_le_bytes([*port0, *port1]));
            }
            Box::new(dev)
        }
        DeviceKind::Mux => Box::new(ChannelMux::new(diagnostics)?),
    };
    Ok(dev)
}

pub fn build_device_set(
    manifest: &DeviceManifest,
    sink: Arc<dyn DiagnosticSink>,
) -> anyhow::Result<DeviceSet> {
    let mut set = DeviceSet::new();
    for cfg in &manifest.devices {
        let dev = build_device(cfg, sink.clone())
            .with_context(|| format!("Failed to build device '{}'", cfg.id))?;
        info!(
            "Attached {:?} '{}' at {:#04x}",
            cfg.r#type, cfg.id, cfg.address
        );
        set.add(cfg.id.clone(), cfg.address, dev)?;
    }
    Ok(set)
}

/// Builds a DeviceSet from a manifest path.
pub fn build_device_set_from_path(
    path: &Path,
    sink: Arc<dyn DiagnosticSink>,
) -> anyhow::Result<DeviceSet> {
    info!("Loading device manifest: {:?}", path);
    let manifest = DeviceManifest::from_file(path)?;
    build_device_set(&manifest, sink)
}

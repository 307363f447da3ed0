// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

/// Largest byte count a single read may request. Targets clamp to it too.
pub const MAX_READ_LEN: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    #[serde(alias = "eeprom", alias = "at24")]
    Memory,
    #[serde(alias = "gpio_expander", alias = "pca9555")]
    IoExpander,
    #[serde(alias = "i2c_mux", alias = "pca9548")]
    Mux,
}

/// Errors raised while decoding a device's free-form `config` map.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("option '{key}' of device '{device}' must be {expected}")]
    WrongType {
        device: String,
        key: String,
        expected: &'static str,
    },
    #[error("option '{key}' of device '{device}' has unsupported value '{value}'")]
    UnsupportedValue {
        device: String,
        key: String,
        value: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeviceConfig {
    pub id: String,
    pub r#type: DeviceKind,
    /// 7-bit target address on the bus.
    pub address: u8,
    #[serde(default)]
    pub config: HashMap<String, serde_yaml::Value>,
}

impl DeviceConfig {
    pub fn bool_option(&self, key: &str, default: bool) -> Result<bool, OptionError> {
        match self.config.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.wrong_type(key, "a boolean")),
        }
    }

    pub fn str_option<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str, OptionError> {
        match self.config.get(key) {
            None => Ok(default),
            Some(v) => v.as_str().ok_or_else(|| self.wrong_type(key, "a string")),
        }
    }

    /// Reads a size either as a plain integer or a human-readable string ("64KiB", "1MiB").
    pub fn size_option(&self, key: &str, default: u64) -> Result<u64> {
        match self.config.get(key) {
            None => Ok(default),
            Some(serde_yaml::Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| self.wrong_type(key, "a non-negative size").into()),
            Some(serde_yaml::Value::String(s)) => parse_size(s)
                .with_context(|| format!("Invalid '{}' for device '{}'", key, self.id)),
            Some(_) => Err(self.wrong_type(key, "a size").into()),
        }
    }

    pub fn byte_list_option(&self, key: &str) -> Result<Option<Vec<u8>>, OptionError> {
        let Some(v) = self.config.get(key) else {
            return Ok(None);
        };
        let seq = v
            .as_sequence()
            .ok_or_else(|| self.wrong_type(key, "a list of bytes"))?;
        seq.iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| self.wrong_type(key, "a list of bytes"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    pub fn unsupported(&self, key: &str, value: &str) -> OptionError {
        OptionError::UnsupportedValue {
            device: self.id.clone(),
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> OptionError {
        OptionError::WrongType {
            device: self.id.clone(),
            key: key.to_string(),
            expected,
        }
    }
}

/// The set of target devices attached to one simulated bus.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeviceManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl DeviceManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read device manifest at {:?}", path))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(content).context("Failed to parse Device Manifest YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        let mut ids = HashSet::new();
        let mut addresses = HashSet::new();
        for dev in &self.devices {
            if dev.id.trim().is_empty() {
                anyhow::bail!("Device id cannot be empty");
            }
            if dev.address > 0x7F {
                anyhow::bail!(
                    "Device '{}' address {:#04x} is not a 7-bit address",
                    dev.id,
                    dev.address
                );
            }
            if !ids.insert(dev.id.as_str()) {
                anyhow::bail!("Duplicate device id '{}'", dev.id);
            }
            if !addresses.insert(dev.address) {
                anyhow::bail!(
                    "Device '{}' reuses bus address {:#04x}",
                    dev.id,
                    dev.address
                );
            }
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineLevel {
    High,
    Low,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SignalStep {
    pub line: String,
    pub level: LineLevel,
}

/// A single controller-side operation against one target.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionOp {
    Write(Vec<u8>),
    Read(usize),
    Finish,
    Reset,
    Signal(SignalStep),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScriptStep {
    pub target: String,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub op: TransactionOp,
    /// Expected bytes for a `read` step.
    #[serde(default)]
    pub expect: Option<Vec<u8>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TransactionScript {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub steps: Vec<ScriptStep>,
}

impl TransactionScript {
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        for (i, step) in self.steps.iter().enumerate() {
            if step.expect.is_some() && !matches!(step.op, TransactionOp::Read(_)) {
                anyhow::bail!(
                    "Step {} ('{}'): 'expect' is only valid on read steps",
                    i,
                    step.target
                );
            }
            if let TransactionOp::Read(count) = step.op {
                if count > MAX_READ_LEN {
                    anyhow::bail!(
                        "Step {} ('{}'): read of {} bytes exceeds the {} byte limit",
                        i,
                        step.target,
                        count,
                        MAX_READ_LEN
                    );
                }
            }
        }

        Ok(())
    }
}

/// Load a transaction script from YAML.
pub fn load_transaction_script<P: AsRef<Path>>(path: P) -> Result<TransactionScript> {
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read transaction script at {:?}", path.as_ref()))?;
    let script: TransactionScript =
        serde_yaml::from_str(&contents).context("Failed to parse Transaction Script YAML")?;
    script.validate()?;
    Ok(script)
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let trimmed = size_str.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Ok(n);
    }
    let s: Size = trimmed
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    let value = bytes.value();
    if value < 0.0 || value.fract() != 0.0 {
        anyhow::bail!("Size '{}' is not a whole number of bytes", size_str);
    }
    Ok(value as u64)
}

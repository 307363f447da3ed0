// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::signals::{DigitalLevel, SignalReceiver};
use crate::{ConfigError, ConfigResult, I2cTarget, MAX_READ_LEN};
use std::any::Any;

/// Reference capacity of the modeled part (1 MiB).
pub const DEFAULT_CAPACITY: usize = 1 << 20;

/// Input line driving write protection.
pub const WRITE_PROTECT_LINE: &str = "WP";

/// Number of address bytes at the start of a transaction.
const ADDRESS_BYTES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Addressing {
    /// Two payload bytes give the full address.
    #[default]
    Standard,
    /// Two payload bytes plus bit 16 taken from the device-select wiring.
    Extended { select_high: bool },
}

/// What a read does when it reaches the last byte of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadBoundary {
    /// Stop short and return fewer bytes. The cursor continues from 0.
    #[default]
    Truncate,
    /// Continue from address 0, like writes do.
    Wrap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryConfig {
    pub capacity: usize,
    pub addressing: Addressing,
    pub read_boundary: ReadBoundary,
    pub write_protected: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            addressing: Addressing::Standard,
            read_boundary: ReadBoundary::Truncate,
            write_protected: false,
        }
    }
}

#[derive(serde::Serialize)]
struct MemorySnapshot {
    capacity: usize,
    address: usize,
    addressing: Addressing,
    read_boundary: ReadBoundary,
    write_protected: bool,
    transaction_pending: bool,
}

/// Serial EEPROM with a latched address cursor.
///
/// A transaction starts with a big-endian address; the remaining bytes are
/// stored sequentially, wrapping at the end of the store. The cursor survives
/// STOP, so a read without a new address continues where the last access ended.
/// Contents survive `reset`.
#[derive(Debug)]
pub struct Eeprom {
    data: Vec<u8>,
    address: usize,
    addressing: Addressing,
    read_boundary: ReadBoundary,
    write_protected: bool,
    transaction_pending: bool,
    diagnostics: Diagnostics,
}

impl Eeprom {
    pub fn new(config: MemoryConfig, diagnostics: Diagnostics) -> ConfigResult<Self> {
        let capacity = config.capacity;
        if capacity == 0 {
            return Err(ConfigError::InvalidCapacity { capacity });
        }
        if matches!(config.addressing, Addressing::Extended { .. }) && capacity <= 0x1_0000 {
            return Err(ConfigError::ExtendedAddressingUnsupported { capacity });
        }

        Ok(Self {
            data: vec![0; capacity],
            address: 0,
            addressing: config.addressing,
            read_boundary: config.read_boundary,
            write_protected: config.write_protected,
            transaction_pending: false,
            diagnostics,
        })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Current address cursor.
    pub fn address(&self) -> usize {
        self.address
    }

    pub fn is_transaction_pending(&self) -> bool {
        self.transaction_pending
    }

    pub fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    pub fn set_write_protect(&mut self, protected: bool) {
        self.write_protected = protected;
    }

    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Pre-programs the store, bypassing write protection.
    /// Returns false (and changes nothing) if the range does not fit.
    pub fn load(&mut self, offset: usize, bytes: &[u8]) -> bool {
        match offset.checked_add(bytes.len()) {
            Some(end) if end <= self.data.len() => {
                self.data[offset..end].copy_from_slice(bytes);
                true
            }
            _ => false,
        }
    }

    fn latch_address(&mut self, hi: u8, lo: u8) {
        let base = u16::from_be_bytes([hi, lo]) as usize;
        let address = match self.addressing {
            Addressing::Standard => base,
            Addressing::Extended { select_high } => base | ((select_high as usize) << 16),
        };
        self.address = address % self.data.len();
        self.transaction_pending = true;
        self.diagnostics.report(Diagnostic::AddressLatched {
            address: self.address,
        });
    }

    fn advance(&mut self, count: usize) {
        self.address = (self.address + count % self.data.len()) % self.data.len();
    }

    fn store(&mut self, payload: &[u8]) {
        if self.write_protected {
            self.diagnostics.report(Diagnostic::WriteProtected {
                address: self.address,
                count: payload.len(),
            });
            self.advance(payload.len());
            return;
        }

        for &byte in payload {
            self.data[self.address] = byte;
            self.advance(1);
        }
    }
}

impl I2cTarget for Eeprom {
    fn reset(&mut self) {
        self.address = 0;
        self.transaction_pending = false;
    }

    fn write(&mut self, data: &[u8]) {
        let payload = if self.transaction_pending {
            data
        } else {
            match data {
                [] => {
                    self.diagnostics.report(Diagnostic::EmptyWrite);
                    return;
                }
                [hi, lo, rest @ ..] => {
                    self.latch_address(*hi, *lo);
                    rest
                }
                _ => {
                    self.diagnostics.report(Diagnostic::ShortAddress {
                        expected: ADDRESS_BYTES,
                        received: data.len(),
                    });
                    return;
                }
            }
        };

        if !payload.is_empty() {
            self.store(payload);
        }
    }

    fn read(&mut self, count: usize) -> Vec<u8> {
        match self.read_boundary {
            ReadBoundary::Wrap => {
                let served = count.min(MAX_READ_LEN);
                let mut out = Vec::new();
                for _ in 0..served {
                    out.push(self.data[self.address]);
                    self.advance(1);
                }
                if served < count {
                    self.diagnostics.report(Diagnostic::ReadTruncated {
                        requested: count,
                        served,
                    });
                }
                out
            }
            ReadBoundary::Truncate => {
                let start = self.address;
                let served = count.min(self.data.len() - start);
                let out = self.data[start..start + served].to_vec();
                self.advance(served);
                if served < count {
                    self.diagnostics.report(Diagnostic::ReadTruncated {
                        requested: count,
                        served,
                    });
                }
                out
            }
        }
    }

    fn finish_transmission(&mut self) {
        self.transaction_pending = false;
    }

    fn snapshot(&self) -> serde_json::Value {
        let snap = MemorySnapshot {
            capacity: self.data.len(),
            address: self.address,
            addressing: self.addressing,
            read_boundary: self.read_boundary,
            write_protected: self.write_protected,
            transaction_pending: self.transaction_pending,
        };
        serde_json::to_value(snap).unwrap_or(serde_json::Value::Null)
    }

    fn as_signal_receiver_mut(&mut self) -> Option<&mut dyn SignalReceiver> {
        Some(self)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}

impl SignalReceiver for Eeprom {
    fn on_signal(&mut self, line: &str, level: DigitalLevel) {
        if line == WRITE_PROTECT_LINE {
            self.set_write_protect(level.is_high());
        } else {
            self.diagnostics.report(Diagnostic::UnknownSignal {
                line: line.to_string(),
            });
        }
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod devices;
pub mod diagnostics;
pub mod registers;
pub mod signals;
pub mod system;

use std::any::Any;

pub use diagnostics::{Diagnostic, DiagnosticSink, Diagnostics, RecordingSink, TracingSink};
pub use labwired_i2c_config::MAX_READ_LEN;
pub use signals::{DigitalLevel, SignalReceiver};

/// Construction-time configuration errors. A device that fails with one of
/// these is never built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("register {offset:#x} is defined twice")]
    DuplicateRegister { offset: u64 },
    #[error("register {offset:#x} has unsupported width {width}")]
    UnsupportedWidth { offset: u64, width: u8 },
    #[error("field '{field}' of register {offset:#x} has zero width")]
    ZeroWidthField { offset: u64, field: String },
    #[error("field '{field}' of register {offset:#x} extends past bit {width}")]
    FieldOutOfBounds {
        offset: u64,
        field: String,
        width: u8,
    },
    #[error("field '{field}' of register {offset:#x} overlaps bit {bit}")]
    FieldOverlap { offset: u64, field: String, bit: u8 },
    #[error("register {offset:#x} leaves bit {bit} undeclared")]
    FieldGap { offset: u64, bit: u8 },
    #[error("reset value {value:#x} of field '{field}' in register {offset:#x} does not fit")]
    ResetValueTooWide {
        offset: u64,
        field: String,
        value: u32,
    },
    #[error("invalid memory capacity {capacity}")]
    InvalidCapacity { capacity: usize },
    #[error("extended addressing needs more than 64 KiB of storage, got {capacity}")]
    ExtendedAddressingUnsupported { capacity: usize },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Trait representing a target device on an I2C bus.
///
/// The bus controller serializes all calls to one device and calls
/// `finish_transmission` once per transaction, after that transaction's
/// writes and reads. None of these operations fail: malformed input is
/// reported through the device's diagnostics and otherwise ignored.
pub trait I2cTarget: std::fmt::Debug + Send {
    /// Returns the device to its power-on state. Non-volatile contents survive.
    fn reset(&mut self);
    /// Consumes one write phase of a transaction.
    fn write(&mut self, data: &[u8]);
    /// Produces up to `count` bytes from the current address. Counts above
    /// [`MAX_READ_LEN`] are clamped.
    fn read(&mut self, count: usize) -> Vec<u8>;
    /// STOP observed. Clears transaction-scoped state only.
    fn finish_transmission(&mut self);

    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
    fn as_signal_receiver_mut(&mut self) -> Option<&mut dyn SignalReceiver> {
        None
    }
    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
}

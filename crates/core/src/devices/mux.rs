// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::registers::{Field, FieldAccess, RegisterDef, RegisterFile};
use crate::{ConfigResult, I2cTarget};
use bitflags::bitflags;
use std::any::Any;
use std::sync::Arc;

const CONTROL: u64 = 0x0;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Channels: u8 {
        const CH0 = 1 << 0;
        const CH1 = 1 << 1;
        const CH2 = 1 << 2;
        const CH3 = 1 << 3;
        const CH4 = 1 << 4;
        const CH5 = 1 << 5;
        const CH6 = 1 << 6;
        const CH7 = 1 << 7;
    }
}

/// Called with the enabled channel set after every control register write.
pub type ChannelHook = Arc<dyn Fn(Channels) + Send + Sync>;

/// Eight-channel bus switch (PCA9548 style) with one control register.
pub struct ChannelMux {
    registers: RegisterFile,
    diagnostics: Diagnostics,
}

impl ChannelMux {
    pub fn new(diagnostics: Diagnostics) -> ConfigResult<Self> {
        Self::with_hook(diagnostics, None)
    }

    pub fn with_hook(diagnostics: Diagnostics, hook: Option<ChannelHook>) -> ConfigResult<Self> {
        let mut registers = RegisterFile::new(diagnostics.clone());
        let mut def = RegisterDef::new("Control", 8).fields(
            (0..8).map(|bit| Field::flag(format!("CH{}", bit), bit, FieldAccess::ReadWrite)),
        );
        if let Some(hook) = hook {
            def = def.on_write(Arc::new(move |_old, new| {
                hook(Channels::from_bits_truncate(new as u8));
            }));
        }
        registers.define(CONTROL, def)?;

        Ok(Self {
            registers,
            diagnostics,
        })
    }

    pub fn control(&self) -> u8 {
        self.registers.peek(CONTROL).unwrap_or(0) as u8
    }

    pub fn enabled_channels(&self) -> Channels {
        Channels::from_bits_truncate(self.control())
    }
}

impl std::fmt::Debug for ChannelMux {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelMux")
            .field("source", &self.diagnostics.source())
            .field("control", &self.control())
            .finish()
    }
}

impl I2cTarget for ChannelMux {
    fn reset(&mut self) {
        self.registers.reset();
    }

    fn write(&mut self, data: &[u8]) {
        if data.is_empty() {
            self.diagnostics.report(Diagnostic::EmptyWrite);
            return;
        }
        for &value in data {
            self.registers.write(CONTROL, value as u32);
        }
    }

    /// Always one byte, whatever `count` asks for.
    fn read(&mut self, _count: usize) -> Vec<u8> {
        vec![self.registers.read(CONTROL) as u8]
    }

    fn finish_transmission(&mut self) {}

    fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({ "control": self.control() })
    }

    fn as_any(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use std::sync::Mutex;

    #[test]
    fn test_reset_value() {
        let mut mux = ChannelMux::new(Diagnostics::tracing("mux")).unwrap();
        assert_eq!(mux.read(1), vec![0x00]);
        assert_eq!(mux.read(0), vec![0x00]);
        assert_eq!(mux.enabled_channels(), Channels::empty());
    }

    #[test]
    fn test_last_byte_wins() {
        let mut mux = ChannelMux::new(Diagnostics::tracing("mux")).unwrap();
        mux.write(&[0x01, 0x80, 0x06]);
        assert_eq!(mux.enabled_channels(), Channels::CH1 | Channels::CH2);
        assert_eq!(mux.read(4), vec![0x06]);
        assert_eq!(mux.read(0), vec![0x06]);

        mux.reset();
        assert_eq!(mux.control(), 0x00);
    }

    #[test]
    fn test_empty_write_warns() {
        let sink = Arc::new(RecordingSink::new());
        let mut mux = ChannelMux::new(Diagnostics::new("mux", sink.clone())).unwrap();
        mux.write(&[0x03]);
        mux.write(&[]);
        assert_eq!(mux.control(), 0x03);
        assert_eq!(sink.warnings(), vec![Diagnostic::EmptyWrite]);
    }

    #[test]
    fn test_channel_hook() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let hook: ChannelHook = Arc::new(move |ch| log.lock().unwrap().push(ch));
        let mut mux = ChannelMux::with_hook(Diagnostics::tracing("mux"), Some(hook)).unwrap();
        mux.write(&[0x10, 0x11]);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Channels::CH4, Channels::CH0 | Channels::CH4]
        );
    }
}

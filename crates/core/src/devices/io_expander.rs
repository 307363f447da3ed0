// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::registers::{Field, RegisterDef, RegisterFile};
use crate::signals::{DigitalLevel, SignalReceiver};
use crate::{ConfigResult, I2cTarget, MAX_READ_LEN};
use std::any::Any;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Source of the 16 input pin levels, port 0 in the low byte.
pub type InputProvider = Arc<dyn Fn() -> u16 + Send + Sync>;

/// Notified with the register and its new value after each write to an
/// output, polarity or configuration register.
pub type OutputListener = Arc<dyn Fn(ExpanderRegister, u8) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ExpanderRegister {
    InputPort0 = 0x0,
    InputPort1 = 0x1,
    OutputPort0 = 0x2,
    OutputPort1 = 0x3,
    PolarityInversionPort0 = 0x4,
    PolarityInversionPort1 = 0x5,
    ConfigurationPort0 = 0x6,
    ConfigurationPort1 = 0x7,
}

impl ExpanderRegister {
    pub const ALL: [ExpanderRegister; 8] = [
        ExpanderRegister::InputPort0,
        ExpanderRegister::InputPort1,
        ExpanderRegister::OutputPort0,
        ExpanderRegister::OutputPort1,
        ExpanderRegister::PolarityInversionPort0,
        ExpanderRegister::PolarityInversionPort1,
        ExpanderRegister::ConfigurationPort0,
        ExpanderRegister::ConfigurationPort1,
    ];

    pub fn offset(self) -> u8 {
        self as u8
    }

    pub fn reset_value(self) -> u8 {
        match self {
            ExpanderRegister::OutputPort0
            | ExpanderRegister::OutputPort1
            | ExpanderRegister::ConfigurationPort0
            | ExpanderRegister::ConfigurationPort1 => 0xFF,
            _ => 0x00,
        }
    }

    /// Port index (0 or 1).
    pub fn port(self) -> usize {
        (self as usize) & 1
    }
}

/// Sub-state of the current transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum TransactionState {
    #[default]
    CollectingAddress,
    Processing,
}

/// Next register after an access to `address`: the other half of its pair.
pub fn pair_partner(address: u8) -> u8 {
    address ^ 1
}

/// 16-bit I/O expander (PCA9555 register map).
///
/// Registers come in port 0 / port 1 pairs. After each data byte the address
/// moves to the other register of the pair, so repeated accesses alternate
/// between the two ports instead of walking the map.
pub struct IoExpander {
    registers: RegisterFile,
    address: u8,
    state: TransactionState,
    /// Latched pin levels; `None` when inputs come from an external provider.
    pins: Option<Arc<AtomicU16>>,
    /// Mirror of the two polarity registers as one word, read by the input
    /// port providers. Kept equal to the registers by their write hooks and
    /// by `sync_polarity`.
    polarity: Arc<AtomicU16>,
    diagnostics: Diagnostics,
}

impl IoExpander {
    /// Expander whose inputs are latched from `set_input_levels` and pin signals.
    pub fn new(diagnostics: Diagnostics) -> ConfigResult<Self> {
        let pins = Arc::new(AtomicU16::new(0));
        let latched = pins.clone();
        let inputs: InputProvider = Arc::new(move || latched.load(Ordering::SeqCst));
        Self::build(diagnostics, Some(pins), inputs, None)
    }

    /// Expander whose input pins are read from `inputs` on every access.
    pub fn with_io(
        diagnostics: Diagnostics,
        inputs: InputProvider,
        listener: Option<OutputListener>,
    ) -> ConfigResult<Self> {
        Self::build(diagnostics, None, inputs, listener)
    }

    fn build(
        diagnostics: Diagnostics,
        pins: Option<Arc<AtomicU16>>,
        inputs: InputProvider,
        listener: Option<OutputListener>,
    ) -> ConfigResult<Self> {
        let polarity = Arc::new(AtomicU16::new(0));
        let mut registers = RegisterFile::new(diagnostics.clone());

        for reg in ExpanderRegister::ALL {
            let shift = reg.port() * 8;
            let name = format!("{:?}", reg);
            let def = match reg {
                ExpanderRegister::InputPort0 | ExpanderRegister::InputPort1 => {
                    let inputs = inputs.clone();
                    let polarity = polarity.clone();
                    RegisterDef::new(name, 8).field(
                        Field::read_only("INPUT", 0, 8).with_provider(Box::new(move || {
                            let levels = inputs() ^ polarity.load(Ordering::SeqCst);
                            ((levels >> shift) & 0xFF) as u32
                        })),
                    )
                }
                _ => {
                    let mut def = RegisterDef::new(name, 8).field(
                        Field::read_write("VALUE", 0, 8).with_reset(reg.reset_value() as u32),
                    );
                    let listener = listener.clone();
                    let polarity = polarity.clone();
                    let is_polarity = matches!(
                        reg,
                        ExpanderRegister::PolarityInversionPort0
                            | ExpanderRegister::PolarityInversionPort1
                    );
                    if is_polarity || listener.is_some() {
                        def = def.on_write(Arc::new(move |_old, new| {
                            if is_polarity {
                                let mask = 0xFFu16 << shift;
                                let word = (polarity.load(Ordering::SeqCst) & !mask)
                                    | ((new as u16) << shift);
                                polarity.store(word, Ordering::SeqCst);
                            }
                            if let Some(listener) = &listener {
                                listener(reg, new as u8);
                            }
                        }));
                    }
                    def
                }
            };
            registers.define(reg.offset() as u64, def)?;
        }

        Ok(Self {
            registers,
            address: 0,
            state: TransactionState::CollectingAddress,
            pins,
            polarity,
            diagnostics,
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Current register value without side effects.
    pub fn register(&self, reg: ExpanderRegister) -> u8 {
        self.registers.peek(reg.offset() as u64).unwrap_or(0) as u8
    }

    /// Latches input pin levels (port 0 in the low byte). Expanders built
    /// with an external `InputProvider` ignore this and report it.
    pub fn set_input_levels(&self, levels: u16) {
        match &self.pins {
            Some(pins) => pins.store(levels, Ordering::SeqCst),
            None => self.diagnostics.report(Diagnostic::ExternalInputs {
                line: "inputs".to_string(),
            }),
        }
    }

    /// Levels on all 16 pins as seen from outside. Pins configured as inputs
    /// (configuration bit set) are not driven and read as pulled high.
    pub fn output_levels(&self) -> u16 {
        let word = |lo: ExpanderRegister, hi: ExpanderRegister| {
            u16::from_le_bytes([self.register(lo), self.register(hi)])
        };
        let outputs = word(ExpanderRegister::OutputPort0, ExpanderRegister::OutputPort1);
        let config = word(
            ExpanderRegister::ConfigurationPort0,
            ExpanderRegister::ConfigurationPort1,
        );
        (outputs & !config) | config
    }

    /// Rebuilds the polarity mirror from the polarity registers.
    fn sync_polarity(&self) {
        let word = u16::from_le_bytes([
            self.register(ExpanderRegister::PolarityInversionPort0),
            self.register(ExpanderRegister::PolarityInversionPort1),
        ]);
        self.polarity.store(word, Ordering::SeqCst);
    }

    fn write_register(&mut self, value: u8) {
        self.registers.write(self.address as u64, value as u32);
        self.address = pair_partner(self.address);
    }
}

impl std::fmt::Debug for IoExpander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoExpander")
            .field("source", &self.diagnostics.source())
            .field("address", &self.address)
            .field("state", &self.state)
            .field("registers", &self.registers)
            .finish()
    }
}

/// Parses pin names of the form `IO<port>_<bit>`, e.g. `IO1_3`.
fn parse_pin(line: &str) -> Option<u16> {
    let (port, bit) = line.strip_prefix("IO")?.split_once('_')?;
    let port: u16 = port.parse().ok()?;
    let bit: u16 = bit.parse().ok()?;
    (port < 2 && bit < 8).then_some(port * 8 + bit)
}

impl I2cTarget for IoExpander {
    fn reset(&mut self) {
        self.registers.reset();
        self.sync_polarity();
        self.address = 0;
        self.state = TransactionState::CollectingAddress;
    }

    fn write(&mut self, data: &[u8]) {
        let payload = match self.state {
            TransactionState::Processing => data,
            TransactionState::CollectingAddress => {
                let Some((&address, rest)) = data.split_first() else {
                    self.diagnostics.report(Diagnostic::EmptyWrite);
                    return;
                };
                self.address = address;
                self.state = TransactionState::Processing;
                self.diagnostics.report(Diagnostic::AddressLatched {
                    address: address as usize,
                });
                rest
            }
        };

        for &value in payload {
            self.write_register(value);
        }
    }

    fn read(&mut self, count: usize) -> Vec<u8> {
        let served = count.min(MAX_READ_LEN);
        let mut out = Vec::new();
        for _ in 0..served {
            out.push(self.registers.read(self.address as u64) as u8);
            self.address = pair_partner(self.address);
        }
        if served < count {
            self.diagnostics.report(Diagnostic::ReadTruncated {
                requested: count,
                served,
            });
        }
        out
    }

    fn finish_transmission(&mut self) {
        self.state = TransactionState::CollectingAddress;
    }

    fn snapshot(&self) -> serde_json::Value {
        let registers: serde_json::Map<String, serde_json::Value> = self
            .registers
            .offsets()
            .filter_map(|offset| {
                let name = self.registers.name(offset)?;
                let value = self.registers.peek(offset)?;
                Some((name.to_string(), serde_json::json!(value)))
            })
            .collect();
        serde_json::json!({
            "address": self.address,
            "state": self.state,
            "registers": registers,
        })
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

impl SignalReceiver for IoExpander {
    fn on_signal(&mut self, line: &str, level: DigitalLevel) {
        let Some(pin) = parse_pin(line) else {
            self.diagnostics.report(Diagnostic::UnknownSignal {
                line: line.to_string(),
            });
            return;
        };
        let Some(pins) = &self.pins else {
            self.diagnostics.report(Diagnostic::ExternalInputs {
                line: line.to_string(),
            });
            return;
        };
        let bit = 1u16 << pin;
        let levels = pins.load(Ordering::SeqCst);
        let levels = if level.is_high() {
            levels | bit
        } else {
            levels & !bit
        };
        pins.store(levels, Ordering::SeqCst);
    }
}

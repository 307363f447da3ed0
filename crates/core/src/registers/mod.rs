// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Field-decomposed register files.
//!
//! A [`RegisterFile`] maps offsets to fixed-width registers. Each register is
//! split into [`Field`]s that must tile the whole word with no gaps or
//! overlaps; unused bits are declared with [`Field::reserved`]. The layout is
//! checked once, when the register is defined, so bus accesses never fail.

mod field;

pub use field::{Field, FieldAccess, ValueProvider};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::{ConfigError, ConfigResult};
use field::field_mask;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Called with `(old, new)` register words after every write that reaches the register.
pub type WriteHook = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Layout of one register, handed to [`RegisterFile::define`].
pub struct RegisterDef {
    name: String,
    width: u8,
    fields: Vec<Field>,
    on_write: Option<WriteHook>,
}

impl RegisterDef {
    pub fn new(name: impl Into<String>, width: u8) -> Self {
        Self {
            name: name.into(),
            width,
            fields: Vec::new(),
            on_write: None,
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn on_write(mut self, hook: WriteHook) -> Self {
        self.on_write = Some(hook);
        self
    }
}

struct Register {
    name: String,
    width: u8,
    fields: Vec<Field>,
    on_write: Option<WriteHook>,
}

impl Register {
    fn from_def(offset: u64, def: RegisterDef) -> ConfigResult<Self> {
        let RegisterDef {
            name,
            width,
            mut fields,
            on_write,
        } = def;

        if width == 0 || width > 32 {
            return Err(ConfigError::UnsupportedWidth { offset, width });
        }

        fields.sort_by_key(|f| f.offset());

        let mut next_bit: u16 = 0;
        for f in &fields {
            if f.width() == 0 {
                return Err(ConfigError::ZeroWidthField {
                    offset,
                    field: f.name().to_string(),
                });
            }
            if f.end() > width as u16 {
                return Err(ConfigError::FieldOutOfBounds {
                    offset,
                    field: f.name().to_string(),
                    width,
                });
            }
            if (f.offset() as u16) < next_bit {
                return Err(ConfigError::FieldOverlap {
                    offset,
                    field: f.name().to_string(),
                    bit: f.offset(),
                });
            }
            if (f.offset() as u16) > next_bit {
                return Err(ConfigError::FieldGap {
                    offset,
                    bit: next_bit as u8,
                });
            }
            if f.reset_value() & !f.mask() != 0 {
                return Err(ConfigError::ResetValueTooWide {
                    offset,
                    field: f.name().to_string(),
                    value: f.reset_value(),
                });
            }
            next_bit = f.end();
        }
        if next_bit < width as u16 {
            return Err(ConfigError::FieldGap {
                offset,
                bit: next_bit as u8,
            });
        }

        Ok(Self {
            name,
            width,
            fields,
            on_write,
        })
    }

    fn read(&mut self) -> u32 {
        self.fields
            .iter_mut()
            .fold(0, |word, f| word | ((f.read() & f.mask()) << f.offset()))
    }

    fn peek(&self) -> u32 {
        self.fields
            .iter()
            .fold(0, |word, f| word | ((f.peek() & f.mask()) << f.offset()))
    }

    fn write(&mut self, value: u32) {
        let old = self.peek();
        let value = value & field_mask(self.width);
        for f in &mut self.fields {
            if f.access().is_writable() {
                f.write((value >> f.offset()) & f.mask());
            }
        }
        if let Some(hook) = &self.on_write {
            hook(old, self.peek());
        }
    }

    fn reset(&mut self) {
        for f in &mut self.fields {
            f.reset();
        }
    }

    fn reset_value(&self) -> u32 {
        self.fields
            .iter()
            .fold(0, |word, f| word | (f.reset_value() << f.offset()))
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Register")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("fields", &self.fields)
            .field("on_write", &self.on_write.is_some())
            .finish()
    }
}

/// Offset-indexed table of registers, built once at device construction.
#[derive(Debug)]
pub struct RegisterFile {
    registers: BTreeMap<u64, Register>,
    diagnostics: Diagnostics,
}

impl RegisterFile {
    pub fn new(diagnostics: Diagnostics) -> Self {
        Self {
            registers: BTreeMap::new(),
            diagnostics,
        }
    }

    /// Adds a register at `offset`.
    ///
    /// Fails if `offset` is already defined or the field layout does not tile
    /// the register exactly.
    pub fn define(&mut self, offset: u64, def: RegisterDef) -> ConfigResult<()> {
        if self.registers.contains_key(&offset) {
            return Err(ConfigError::DuplicateRegister { offset });
        }
        let reg = Register::from_def(offset, def)?;
        self.registers.insert(offset, reg);
        Ok(())
    }

    pub fn is_defined(&self, offset: u64) -> bool {
        self.registers.contains_key(&offset)
    }

    pub fn name(&self, offset: u64) -> Option<&str> {
        self.registers.get(&offset).map(|r| r.name.as_str())
    }

    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.registers.keys().copied()
    }

    /// Bus read. Unmapped offsets read as zero.
    pub fn read(&mut self, offset: u64) -> u32 {
        match self.registers.get_mut(&offset) {
            Some(reg) => reg.read(),
            None => {
                self.diagnostics.report(Diagnostic::UnmappedRead { offset });
                0
            }
        }
    }

    /// Current value without read side effects or diagnostics.
    pub fn peek(&self, offset: u64) -> Option<u32> {
        self.registers.get(&offset).map(Register::peek)
    }

    /// Bus write. Read-only and reserved bits are left alone; unmapped offsets are ignored.
    pub fn write(&mut self, offset: u64, value: u32) {
        match self.registers.get_mut(&offset) {
            Some(reg) => reg.write(value),
            None => self
                .diagnostics
                .report(Diagnostic::UnmappedWrite { offset, value }),
        }
    }

    /// Restores every field to its declared reset value.
    pub fn reset(&mut self) {
        for reg in self.registers.values_mut() {
            reg.reset();
        }
    }

    pub fn reset_value(&self, offset: u64) -> Option<u32> {
        self.registers.get(&offset).map(Register::reset_value)
    }

    /// Offset → current value for every readable register.
    pub fn snapshot(&self) -> BTreeMap<u64, u32> {
        self.registers
            .iter()
            .map(|(offset, reg)| (*offset, reg.peek()))
            .collect()
    }
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::fmt;

/// Supplies the live value of a field whose contents live outside the register file.
pub type ValueProvider = Box<dyn Fn() -> u32 + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
    /// Writing 1 clears the bit, writing 0 leaves it.
    WriteOneToClear,
    /// Reads return the value, then clear it.
    ReadToClear,
    Reserved,
}

impl FieldAccess {
    pub fn is_readable(self) -> bool {
        !matches!(self, FieldAccess::WriteOnly | FieldAccess::Reserved)
    }

    pub fn is_writable(self) -> bool {
        !matches!(self, FieldAccess::ReadOnly | FieldAccess::Reserved)
    }
}

enum Backing {
    Stored(u32),
    Provided(ValueProvider),
}

/// A bit range within a register, with its own access mode and reset value.
pub struct Field {
    name: String,
    offset: u8,
    width: u8,
    access: FieldAccess,
    reset: u32,
    backing: Backing,
}

impl Field {
    pub fn new(name: impl Into<String>, offset: u8, width: u8, access: FieldAccess) -> Self {
        Self {
            name: name.into(),
            offset,
            width,
            access,
            reset: 0,
            backing: Backing::Stored(0),
        }
    }

    pub fn read_write(name: impl Into<String>, offset: u8, width: u8) -> Self {
        Self::new(name, offset, width, FieldAccess::ReadWrite)
    }

    pub fn read_only(name: impl Into<String>, offset: u8, width: u8) -> Self {
        Self::new(name, offset, width, FieldAccess::ReadOnly)
    }

    pub fn write_only(name: impl Into<String>, offset: u8, width: u8) -> Self {
        Self::new(name, offset, width, FieldAccess::WriteOnly)
    }

    pub fn reserved(offset: u8, width: u8) -> Self {
        Self::new("RESERVED", offset, width, FieldAccess::Reserved)
    }

    /// Single-bit field.
    pub fn flag(name: impl Into<String>, bit: u8, access: FieldAccess) -> Self {
        Self::new(name, bit, 1, access)
    }

    pub fn with_reset(mut self, reset: u32) -> Self {
        self.reset = reset;
        if let Backing::Stored(_) = self.backing {
            self.backing = Backing::Stored(reset);
        }
        self
    }

    /// Sources the field's value from `provider` instead of owned storage.
    pub fn with_provider(mut self, provider: ValueProvider) -> Self {
        self.backing = Backing::Provided(provider);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> u8 {
        self.offset
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn access(&self) -> FieldAccess {
        self.access
    }

    pub fn reset_value(&self) -> u32 {
        self.reset
    }

    pub(crate) fn mask(&self) -> u32 {
        field_mask(self.width)
    }

    pub(crate) fn end(&self) -> u16 {
        self.offset as u16 + self.width as u16
    }

    fn current(&self) -> u32 {
        match &self.backing {
            Backing::Stored(v) => *v,
            Backing::Provided(provider) => provider() & self.mask(),
        }
    }

    fn store(&mut self, value: u32) {
        if let Backing::Stored(v) = &mut self.backing {
            *v = value;
        }
    }

    /// Unshifted field value as seen by a bus read.
    pub(crate) fn read(&mut self) -> u32 {
        match self.access {
            FieldAccess::WriteOnly | FieldAccess::Reserved => 0,
            FieldAccess::ReadToClear => {
                let value = self.current();
                self.store(0);
                value
            }
            _ => self.current(),
        }
    }

    /// Like `read`, without read side effects.
    pub(crate) fn peek(&self) -> u32 {
        if self.access.is_readable() {
            self.current()
        } else {
            0
        }
    }

    /// Applies unshifted `bits` according to the access mode.
    pub(crate) fn write(&mut self, bits: u32) {
        let bits = bits & self.mask();
        match self.access {
            FieldAccess::ReadOnly | FieldAccess::Reserved => {}
            FieldAccess::WriteOneToClear => {
                let value = self.current() & !bits;
                self.store(value);
            }
            _ => self.store(bits),
        }
    }

    pub(crate) fn reset(&mut self) {
        let reset = self.reset;
        self.store(reset);
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backing = match &self.backing {
            Backing::Stored(v) => format!("stored({:#x})", v),
            Backing::Provided(_) => "provided".to_string(),
        };
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("width", &self.width)
            .field("access", &self.access)
            .field("reset", &self.reset)
            .field("backing", &backing)
            .finish()
    }
}

pub(crate) fn field_mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1u32 << width) - 1
    }
}

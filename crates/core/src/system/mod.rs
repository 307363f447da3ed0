// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod builder;

use crate::I2cTarget;

pub struct DeviceEntry {
    pub id: String,
    pub address: u8,
    pub dev: Box<dyn I2cTarget>,
}

/// The targets attached to one bus, looked up by id or 7-bit address.
#[derive(Default)]
pub struct DeviceSet {
    entries: Vec<DeviceEntry>,
}

impl DeviceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        id: impl Into<String>,
        address: u8,
        dev: Box<dyn I2cTarget>,
    ) -> anyhow::Result<()> {
        let id = id.into();
        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.id == id || e.address == address)
        {
            anyhow::bail!(
                "Device '{}' at {:#04x} conflicts with '{}' at {:#04x}",
                id,
                address,
                existing.id,
                existing.address
            );
        }
        self.entries.push(DeviceEntry { id, address, dev });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.iter()
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut dyn I2cTarget> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e.dev.as_mut() as &mut dyn I2cTarget)
    }

    pub fn by_address_mut(&mut self, address: u8) -> Option<&mut dyn I2cTarget> {
        self.entries
            .iter_mut()
            .find(|e| e.address == address)
            .map(|e| e.dev.as_mut() as &mut dyn I2cTarget)
    }

    /// Typed access to a device, e.g. to drive host-side inputs.
    pub fn get_as_mut<T: I2cTarget + 'static>(&mut self, id: &str) -> Option<&mut T> {
        self.get_mut(id)?.as_any_mut()?.downcast_mut::<T>()
    }

    pub fn reset_all(&mut self) {
        for e in &mut self.entries {
            e.dev.reset();
        }
    }

    pub fn snapshot(&self) -> serde_json::Value {
        self.entries
            .iter()
            .map(|e| (e.id.clone(), e.dev.snapshot()))
            .collect::<serde_json::Map<_, _>>()
            .into()
    }
}

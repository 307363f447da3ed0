// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Represents a digital signal level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigitalLevel {
    #[default]
    Low,
    High,
}

impl DigitalLevel {
    pub fn is_high(self) -> bool {
        self == DigitalLevel::High
    }
}

impl From<bool> for DigitalLevel {
    fn from(b: bool) -> Self {
        if b {
            DigitalLevel::High
        } else {
            DigitalLevel::Low
        }
    }
}

impl From<DigitalLevel> for bool {
    fn from(level: DigitalLevel) -> Self {
        match level {
            DigitalLevel::High => true,
            DigitalLevel::Low => false,
        }
    }
}

impl From<labwired_i2c_config::LineLevel> for DigitalLevel {
    fn from(level: labwired_i2c_config::LineLevel) -> Self {
        match level {
            labwired_i2c_config::LineLevel::High => DigitalLevel::High,
            labwired_i2c_config::LineLevel::Low => DigitalLevel::Low,
        }
    }
}

/// A device that accepts level updates on named input lines.
///
/// Updates are pushed by the host whenever a line changes; devices never poll.
pub trait SignalReceiver {
    fn on_signal(&mut self, line: &str, level: DigitalLevel);
}

// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod io_expander;
pub mod memory;
pub mod mux;

pub use io_expander::{ExpanderRegister, IoExpander, TransactionState};
pub use memory::{Addressing, Eeprom, MemoryConfig, ReadBoundary};
pub use mux::{ChannelMux, Channels};

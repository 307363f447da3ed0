// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Warning,
}

/// Runtime anomalies and notable events reported by target devices.
///
/// None of these ever reach the bus controller as an error; the device absorbs
/// the condition and reports it here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    #[error("read from unmapped register {offset:#x}, returning 0")]
    UnmappedRead { offset: u64 },
    #[error("write of {value:#x} to unmapped register {offset:#x} ignored")]
    UnmappedWrite { offset: u64, value: u32 },
    #[error("address phase needs {expected} bytes, got {received}; write ignored")]
    ShortAddress { expected: usize, received: usize },
    #[error("unexpected write with no data")]
    EmptyWrite,
    #[error("write protection active, {count} byte(s) at {address:#x} not stored")]
    WriteProtected { address: usize, count: usize },
    #[error("read of {requested} byte(s) truncated to {served}")]
    ReadTruncated { requested: usize, served: usize },
    #[error("signal on unknown line '{line}' ignored")]
    UnknownSignal { line: String },
    #[error("inputs come from an external provider, update of '{line}' ignored")]
    ExternalInputs { line: String },
    #[error("address set to {address:#x}")]
    AddressLatched { address: usize },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::AddressLatched { .. } => Severity::Debug,
            _ => Severity::Warning,
        }
    }
}

/// Destination for diagnostics emitted by devices and register files.
pub trait DiagnosticSink: std::fmt::Debug + Send + Sync {
    fn report(&self, source: &str, diagnostic: &Diagnostic);
}

/// Forwards every diagnostic to `tracing` at the diagnostic's severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, source: &str, diagnostic: &Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => tracing::warn!(device = source, "{}", diagnostic),
            Severity::Debug => tracing::debug!(device = source, "{}", diagnostic),
        }
    }
}

/// Keeps diagnostics in memory so they can be inspected later.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(String, Diagnostic)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, Diagnostic)> {
        self.lock().clone()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().iter().map(|(_, d)| d.clone()).collect()
    }

    /// Diagnostics at `Severity::Warning`, in the order they were reported.
    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.lock()
            .iter()
            .filter(|(_, d)| d.severity() == Severity::Warning)
            .map(|(_, d)| d.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, Diagnostic)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, source: &str, diagnostic: &Diagnostic) {
        self.lock().push((source.to_string(), diagnostic.clone()));
    }
}

/// A named handle onto a sink, carried by each device.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    source: String,
    sink: Arc<dyn DiagnosticSink>,
}

impl Diagnostics {
    pub fn new(source: impl Into<String>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            source: source.into(),
            sink,
        }
    }

    /// Diagnostics routed to `tracing`.
    pub fn tracing(source: impl Into<String>) -> Self {
        Self::new(source, Arc::new(TracingSink))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn report(&self, diagnostic: Diagnostic) {
        self.sink.report(&self.source, &diagnostic);
    }
}

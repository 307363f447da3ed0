// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_i2c_config::{TransactionOp, TransactionScript};
use labwired_i2c_core::diagnostics::{
    Diagnostic, DiagnosticSink, RecordingSink, Severity, TracingSink,
};
use labwired_i2c_core::system::DeviceSet;
use labwired_i2c_core::DigitalLevel;
use serde::Serialize;
use tracing::{info, warn};

pub const RESULT_SCHEMA_VERSION: &str = "1.0";

/// Records diagnostics for the report while still logging them.
#[derive(Debug, Default)]
pub struct TranscriptSink {
    recorded: RecordingSink,
}

impl TranscriptSink {
    pub fn entries(&self) -> Vec<(String, Diagnostic)> {
        self.recorded.entries()
    }
}

impl DiagnosticSink for TranscriptSink {
    fn report(&self, source: &str, diagnostic: &Diagnostic) {
        TracingSink.report(source, diagnostic);
        self.recorded.report(source, diagnostic);
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StepRecord {
    pub index: usize,
    pub target: String,
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Vec<u8>>,
    pub passed: bool,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticRecord {
    pub device: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub result_schema_version: String,
    pub status: String,
    pub steps: Vec<StepRecord>,
    pub diagnostics: Vec<DiagnosticRecord>,
    pub devices: serde_json::Value,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.passed)
    }
}

fn describe(op: &TransactionOp) -> String {
    match op {
        TransactionOp::Write(bytes) => format!("write {:02x?}", bytes),
        TransactionOp::Read(count) => format!("read {}", count),
        TransactionOp::Finish => "finish".to_string(),
        TransactionOp::Reset => "reset".to_string(),
        TransactionOp::Signal(s) => format!("signal {}={:?}", s.line, s.level),
    }
}

/// Runs every step of `script` in order. Unknown targets fail the run.
pub fn run_script(
    set: &mut DeviceSet,
    script: &TransactionScript,
    sink: &TranscriptSink,
) -> anyhow::Result<RunReport> {
    let mut steps = Vec::with_capacity(script.steps.len());

    for (index, step) in script.steps.iter().enumerate() {
        let dev = set.get_mut(&step.target).ok_or_else(|| {
            anyhow::anyhow!("Step {}: unknown target '{}'", index, step.target)
        })?;

        let mut data = None;
        match &step.op {
            TransactionOp::Write(bytes) => dev.write(bytes),
            TransactionOp::Read(count) => data = Some(dev.read(*count)),
            TransactionOp::Finish => dev.finish_transmission(),
            TransactionOp::Reset => dev.reset(),
            TransactionOp::Signal(signal) => match dev.as_signal_receiver_mut() {
                Some(rx) => rx.on_signal(&signal.line, DigitalLevel::from(signal.level)),
                None => anyhow::bail!(
                    "Step {}: target '{}' has no signal inputs",
                    index,
                    step.target
                ),
            },
        }

        let passed = match (&step.expect, &data) {
            (Some(expected), Some(actual)) => expected == actual,
            _ => true,
        };

        let op = describe(&step.op);
        match &data {
            Some(bytes) => info!("[{}] {} {} -> {:02x?}", index, step.target, op, bytes),
            None => info!("[{}] {} {}", index, step.target, op),
        }
        if !passed {
            warn!(
                "[{}] {} expected {:02x?}, got {:02x?}",
                index,
                step.target,
                step.expect.as_deref().unwrap_or_default(),
                data.as_deref().unwrap_or_default()
            );
        }

        steps.push(StepRecord {
            index,
            target: step.target.clone(),
            op,
            data,
            expected: step.expect.clone(),
            passed,
        });
    }

    let diagnostics = sink
        .entries()
        .into_iter()
        .map(|(device, d)| DiagnosticRecord {
            device,
            severity: d.severity(),
            message: d.to_string(),
        })
        .collect();

    let mut report = RunReport {
        result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
        status: String::new(),
        steps,
        diagnostics,
        devices: set.snapshot(),
    };
    report.status = if report.passed() { "pass" } else { "fail" }.to_string();
    Ok(report)
}

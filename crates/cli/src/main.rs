// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Parser, Subcommand};
use labwired_i2c_config::load_transaction_script;
use labwired_i2c_core::system::builder::build_device_set_from_path;
use labwired_i2c_core::TracingSink;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

mod runner;

use runner::{run_script, RunReport, TranscriptSink};

const EXIT_PASS: u8 = 0;
const EXIT_ASSERT_FAIL: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "LabWired I2C target runner", long_about = None)]
struct Cli {
    /// Log every diagnostic, including address-phase events
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive the devices of a manifest through a transaction script (YAML).
    Run(RunArgs),

    /// Print the reset-state snapshot of every device in a manifest.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the device manifest (YAML)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Path to the transaction script (YAML)
    #[arg(short, long)]
    script: PathBuf,

    /// Write the run transcript as JSON to this path
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Path to the device manifest (YAML)
    #[arg(short, long)]
    manifest: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Inspect(args) => inspect(args),
    }
}

fn run(args: RunArgs) -> ExitCode {
    let script = match load_transaction_script(&args.script) {
        Ok(script) => script,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let sink = Arc::new(TranscriptSink::default());
    let mut set = match build_device_set_from_path(&args.manifest, sink.clone()) {
        Ok(set) => set,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let report = match run_script(&mut set, &script, &sink) {
        Ok(report) => report,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    if let Some(path) = &args.json {
        if let Err(e) = write_report(path, &report) {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    }

    let failed = report.steps.iter().filter(|s| !s.passed).count();
    info!(
        "{} steps, {} failed, {} diagnostics",
        report.steps.len(),
        failed,
        report.diagnostics.len()
    );

    if report.passed() {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_ASSERT_FAIL)
    }
}

fn inspect(args: InspectArgs) -> ExitCode {
    let set = match build_device_set_from_path(&args.manifest, Arc::new(TracingSink)) {
        Ok(set) => set,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match serde_json::to_string_pretty(&set.snapshot()) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::from(EXIT_PASS)
        }
        Err(e) => {
            error!("Failed to serialize snapshot: {}", e);
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn write_report(path: &Path, report: &RunReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output dir {:?}", parent))?;
    }
    let f = std::fs::File::create(path)
        .with_context(|| format!("Failed to create result file {:?}", path))?;
    serde_json::to_writer_pretty(f, report)
        .with_context(|| format!("Failed to write result file {:?}", path))?;
    Ok(())
}

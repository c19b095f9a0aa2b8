use std::path::PathBuf;

use clap::Parser;

use crate::config::VariantKind;

/// Runs one ElastiSim scheduling variant against the simulator's IPC
/// channel (spec.md §6).
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file. CLI flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Which scheduling variant to run.
    #[arg(long, value_enum)]
    pub variant: Option<VariantKind>,

    /// `ipc://<path>` channel to dial (default `ipc:///tmp/elastisim.ipc`).
    #[arg(long)]
    pub transport_url: Option<String>,

    /// Where to write the CSV event log.
    #[arg(long)]
    pub event_log: Option<PathBuf>,

    /// Block for a keypress before the first tick, to let a debugger attach.
    #[arg(long)]
    pub wait_for_input: bool,

    /// Enable debug-level logging.
    #[arg(long)]
    pub debug: bool,

    /// Replay a file of newline-delimited JSON `{jobs, nodes, system}`
    /// requests instead of dialing the simulator's IPC channel, printing
    /// each reply as a JSON line on stdout. Debug-only: no real socket is
    /// bound.
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

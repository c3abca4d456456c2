//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "torque_logger", version, about = "Torque sensor data logger")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/torque_logger.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for host commands on stdin and log sessions
    ///
    /// Each stdin line is one command: `start [rate=<hz>] [save=<s>]` or `stop`.
    Run {
        /// Default sample rate for `start` without `rate=` (overrides config and settings)
        #[arg(long, value_name = "HZ")]
        rate: Option<u32>,
        /// Default save interval in seconds (overrides config and settings)
        #[arg(long = "save-interval", value_name = "S")]
        save_interval: Option<u32>,
        /// Start a session immediately instead of waiting for `start`
        #[arg(long, action = ArgAction::SetTrue)]
        autostart: bool,
        /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux: SCHED_FIFO priority, CPU pinning and mlockall. This reduces sampling jitter but may require CAP_SYS_NICE, CAP_IPC_LOCK or root."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE", default_value = "current")]
        rt_lock: RtLock,
        /// CPU index to pin the process to when --rt is enabled (default 0)
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
    },
    /// Quick health check: read a few conversions and probe the log directory
    SelfCheck {
        /// Number of conversions to read
        #[arg(long, default_value_t = 8)]
        samples: u32,
    },
    /// Summarise a recorded session log
    Inspect {
        /// Session CSV written by `run`
        file: PathBuf,
        /// Also print every row
        #[arg(long, action = ArgAction::SetTrue)]
        rows: bool,
    },
}

#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Torque logging core (hardware-agnostic).
//!
//! All hardware goes through the `torque_traits` seams: `Adc`, `Storage`,
//! `SessionNamer`, `StatusLine` and `Clock`.
//!
//! ## Pipeline
//!
//! - **Conversion**: raw code → mV (minus zero offset) → N·m (`convert`)
//! - **Calibration**: averaged zero offset at every session start (`calibration`)
//! - **Pacing**: fixed-period sampling without catch-up bursts (`scheduler`)
//! - **Persistence**: CSV rows with periodic close/reopen flushes (`writer`)
//! - **Control**: Idle/Logging state machine and stop handling (`controller`)
//! - **Host**: text commands over a channel, cooperative loop (`command`, `runner`)

pub mod builder;
pub mod calibration;
pub mod command;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod convert;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod scheduler;
pub mod status;
pub mod stop;
pub mod util;
pub mod writer;

pub use builder::SessionControllerBuilder;
pub use calibration::{CalibrationCfg, calibrate_zero};
pub use command::{Command, StartRequest};
pub use config::{SensorCfg, SessionConfig};
pub use controller::{SessionController, SessionState};
pub use convert::UnitConverter;
pub use error::{AbortReason, BuildError, CommandError, LoggerError, ValidationError};
pub use runner::{RunSummary, run};
pub use scheduler::SessionClock;
pub use status::LoggerStatus;
pub use stop::StopFlag;
pub use writer::{LogRecord, LogWriter};

//! Outcome of one control loop iteration.

use crate::error::LoggerError;

#[derive(Debug, Clone, PartialEq)]
pub enum LoggerStatus {
    /// No session active; nothing was sampled.
    Idle,
    /// One sample acquired (or a recoverable failure counted); keep stepping.
    Logging,
    /// A stop request ended the session; file closed, status line low.
    Stopped { rows: u64 },
    /// Too many consecutive failures; session torn down.
    Aborted(LoggerError),
}

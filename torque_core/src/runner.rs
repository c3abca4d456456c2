//! Cooperative control loop tying host commands to the session controller.
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use tracing::{error, info, warn};

use crate::command::Command;
use crate::controller::{SessionController, SessionState};
use crate::error::Result;
use crate::status::LoggerStatus;
use crate::stop::StopFlag;

/// Upper bound on how long an Idle loop blocks waiting for the host.
pub const IDLE_POLL: Duration = Duration::from_millis(50);

/// Totals over one `run`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Sessions that got past calibration and opened a log.
    pub sessions: u32,
    pub rows: u64,
    /// Commands refused (bad parameters, calibration/storage failure, busy).
    pub rejected: u32,
    pub aborted: u32,
}

/// Drive `controller` until `shutdown` is raised or the host hangs up while Idle.
///
/// While Logging the inbox is drained without blocking: `stop` raises the
/// controller's stop flag and any `start` is refused. Shutdown during a
/// session ends that session first.
pub fn run(
    controller: &mut SessionController,
    inbox: &Receiver<Command>,
    shutdown: &StopFlag,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut host_connected = true;
    let session_stop = controller.stop_flag();

    loop {
        match controller.state() {
            SessionState::Idle => {
                if shutdown.is_raised() {
                    info!("shutdown requested");
                    break;
                }
                if !host_connected {
                    info!("host disconnected");
                    break;
                }
                match inbox.recv_timeout(IDLE_POLL) {
                    Ok(cmd) => dispatch(controller, cmd, &mut summary),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => host_connected = false,
                }
            }
            SessionState::Logging => {
                if shutdown.is_raised() {
                    session_stop.raise();
                }
                while host_connected {
                    match inbox.try_recv() {
                        Ok(Command::Stop) => session_stop.raise(),
                        Ok(cmd @ Command::Start(_)) => {
                            warn!(command = %cmd, "already logging, command ignored");
                            summary.rejected += 1;
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => host_connected = false,
                    }
                }
                match controller.step() {
                    LoggerStatus::Idle | LoggerStatus::Logging => {}
                    LoggerStatus::Stopped { rows } => summary.rows += rows,
                    LoggerStatus::Aborted(e) => {
                        error!(error = %e, "session aborted");
                        summary.rows += controller.rows();
                        summary.aborted += 1;
                    }
                }
            }
        }
    }

    Ok(summary)
}

fn dispatch(controller: &mut SessionController, cmd: Command, summary: &mut RunSummary) {
    let is_start = matches!(cmd, Command::Start(_));
    match controller.handle(cmd) {
        Ok(()) if is_start => summary.sessions += 1,
        Ok(()) => {}
        Err(e) => {
            warn!(command = %cmd, error = %e, "command rejected");
            summary.rejected += 1;
        }
    }
}

//! Session state machine: Idle ⇄ Logging.
//!
//! The controller owns every collaborator and is driven from a single loop.
//! `start` runs calibration and opens the log; `step` performs one sampling
//! iteration; the stop flag is the only input that may change asynchronously.
use std::sync::Arc;
use std::time::Duration;

use torque_traits::{Adc, Clock, SessionNamer, StatusLine};
use tracing::{debug, error, info, trace, warn};

use crate::builder::SessionControllerBuilder;
use crate::calibration::{CalibrationCfg, calibrate_zero};
use crate::command::{Command, StartRequest};
use crate::config::{SensorCfg, SessionConfig};
use crate::convert::UnitConverter;
use crate::error::{AbortReason, LoggerError};
use crate::hw_error::map_acquisition_error;
use crate::scheduler::{SessionClock, wait_for_next_slot};
use crate::status::LoggerStatus;
use crate::stop::StopFlag;
use crate::writer::{LogRecord, LogWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Logging,
}

/// Per-session data; exists only while Logging.
#[derive(Debug, Clone)]
pub(crate) struct ActiveSession {
    offset_mv: f32,
    clock: SessionClock,
    consecutive_failures: u32,
    file_name: String,
}

pub struct SessionController {
    pub(crate) adc: Box<dyn Adc>,
    pub(crate) writer: LogWriter,
    pub(crate) namer: Box<dyn SessionNamer>,
    pub(crate) status_line: Box<dyn StatusLine>,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) stop: StopFlag,
    pub(crate) sensor: SensorCfg,
    pub(crate) converter: UnitConverter,
    pub(crate) config: SessionConfig,
    pub(crate) calibration: CalibrationCfg,
    pub(crate) read_timeout: Duration,
    pub(crate) max_consecutive_failures: u32,
    pub(crate) active: Option<ActiveSession>,
    pub(crate) last_offset_mv: Option<f32>,
}

impl core::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state())
            .field("config", &self.config)
            .field("writer", &self.writer)
            .field("active", &self.active)
            .finish()
    }
}

impl SessionController {
    pub fn builder() -> SessionControllerBuilder {
        SessionControllerBuilder::default()
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Logging
        } else {
            SessionState::Idle
        }
    }

    /// Committed session configuration (last accepted start request).
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sensor(&self) -> &SensorCfg {
        &self.sensor
    }

    /// Handle for raising a stop request from another thread or an ISR.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    /// Zero offset of the current session, or of the last one once Idle.
    pub fn offset_mv(&self) -> Option<f32> {
        self.active
            .as_ref()
            .map(|a| a.offset_mv)
            .or(self.last_offset_mv)
    }

    /// Log file of the current (or last) session.
    pub fn file_name(&self) -> Option<&str> {
        self.active
            .as_ref()
            .map(|a| a.file_name.as_str())
            .or_else(|| self.writer.file_name())
    }

    /// Rows written in the current (or last) session.
    pub fn rows(&self) -> u64 {
        self.writer.rows()
    }

    /// Begin a session: validate, calibrate, open the log, go Logging.
    ///
    /// Any error leaves the controller Idle with no file open. A rejected rate
    /// or interval keeps the previous configuration.
    pub fn start(&mut self, req: StartRequest) -> Result<(), LoggerError> {
        if self.active.is_some() {
            return Err(LoggerError::State("a session is already logging".into()));
        }
        let rate = req.rate_hz.unwrap_or(self.config.sample_rate_hz());
        let save = req.save_interval_s.unwrap_or(self.config.save_interval_s());
        let next = self.config.apply(rate, save).inspect_err(|e| {
            warn!(error = %e, "start rejected");
        })?;
        self.config = next;

        // A stop raised while Idle must not end the new session immediately.
        if self.stop.take() {
            debug!("cleared stale stop request");
        }

        info!(
            sample_rate_hz = rate,
            save_interval_s = save,
            samples = self.calibration.samples,
            "calibrating zero offset"
        );
        let offset_mv = calibrate_zero(
            &mut *self.adc,
            &*self.clock,
            &self.converter,
            &self.calibration,
            self.read_timeout,
        )
        .inspect_err(|e| error!(error = %e, "calibration failed"))?;

        let file_name = self.namer.next_name();
        if let Err(e) = self.writer.open_session(&file_name, rate) {
            error!(file = %file_name, error = %e, "cannot open session log");
            if let Err(close_err) = self.writer.close() {
                warn!(file = %file_name, error = %close_err, "closing half-opened session log failed");
            }
            return Err(e);
        }

        self.active = Some(ActiveSession {
            offset_mv,
            clock: SessionClock::start(self.clock.now()),
            consecutive_failures: 0,
            file_name: file_name.clone(),
        });
        self.last_offset_mv = Some(offset_mv);
        if let Err(e) = self.status_line.set_high() {
            warn!(error = %e, "status line set_high failed");
        }
        info!(file = %file_name, offset_mv, sample_rate_hz = rate, "logging started");
        Ok(())
    }

    /// One Logging iteration. Returns `Idle` without side effects when no
    /// session is active.
    pub fn step(&mut self) -> LoggerStatus {
        if self.active.is_none() {
            return LoggerStatus::Idle;
        }
        if self.stop.take() {
            info!("stop requested");
            return match self.teardown() {
                Ok(rows) => LoggerStatus::Stopped { rows },
                Err(e) => LoggerStatus::Aborted(e),
            };
        }

        let Some(active) = self.active.as_mut() else {
            return LoggerStatus::Idle;
        };
        let mut failed = false;

        match self.adc.read(self.read_timeout) {
            Ok(raw) => {
                let voltage_mv = self.converter.to_voltage(raw, active.offset_mv);
                let record = LogRecord {
                    elapsed_ms: active.clock.elapsed_ms(self.clock.now()),
                    voltage_mv,
                    torque_nm: self.converter.to_torque(voltage_mv),
                };
                trace!(raw, voltage_mv, torque_nm = record.torque_nm, "sample");
                if let Err(e) = self.writer.append_record(&record) {
                    warn!(error = %e, "row not written");
                    failed = true;
                }
            }
            Err(e) => {
                let e = map_acquisition_error(&*e);
                warn!(error = %e, "sample skipped");
                failed = true;
            }
        }

        wait_for_next_slot(&*self.clock, &mut active.clock, &self.config);

        if let Err(e) = self
            .writer
            .maybe_flush(&*self.clock, &mut active.clock, &self.config)
        {
            warn!(error = %e, "periodic flush failed");
            failed = true;
        }

        if !failed {
            active.consecutive_failures = 0;
            return LoggerStatus::Logging;
        }
        active.consecutive_failures += 1;
        let count = active.consecutive_failures;
        if count <= self.max_consecutive_failures {
            return LoggerStatus::Logging;
        }
        error!(count, "too many consecutive failures, aborting session");
        if let Err(e) = self.teardown() {
            warn!(error = %e, "log not closed cleanly after abort");
        }
        LoggerStatus::Aborted(LoggerError::Abort(AbortReason::ConsecutiveFailures {
            count,
        }))
    }

    /// End the session now: status line low, close the file, clear any
    /// pending stop request. Returns the number of rows written.
    pub fn stop(&mut self) -> Result<u64, LoggerError> {
        if self.active.is_none() {
            return Err(LoggerError::State("no session is logging".into()));
        }
        self.teardown()
    }

    /// Apply a host command. `Stop` only raises the flag; the session ends
    /// at the top of the next `step`.
    pub fn handle(&mut self, cmd: Command) -> Result<(), LoggerError> {
        match cmd {
            Command::Start(req) => self.start(req),
            Command::Stop => {
                self.stop.raise();
                Ok(())
            }
        }
    }

    /// Leaves Idle even when closing fails.
    fn teardown(&mut self) -> Result<u64, LoggerError> {
        let active = self.active.take();
        if let Err(e) = self.status_line.set_low() {
            warn!(error = %e, "status line set_low failed");
        }
        self.stop.clear();
        let closed = self.writer.close();
        let rows = self.writer.rows();
        if let Some(a) = active {
            info!(file = %a.file_name, rows, "logging stopped");
        }
        closed.map(|()| rows)
    }
}

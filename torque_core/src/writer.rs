//! CSV session log writer with periodic close/reopen durability flushes.
use std::fmt::Write as _;

use torque_traits::{Clock, Storage};
use tracing::{debug, trace};

use crate::config::SessionConfig;
use crate::error::LoggerError;
use crate::hw_error::map_storage_error;
use crate::scheduler::SessionClock;

/// Column header written after the `SPS` line.
pub const COLUMN_HEADER: &str = "microSeconds,mV,NM";

/// One acquired sample as persisted to the log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub elapsed_ms: u64,
    pub voltage_mv: f32,
    pub torque_nm: f32,
}

impl LogRecord {
    /// Append `elapsed_ms,voltage_mv,torque_nm\n` (4 decimals) to `out`.
    pub fn write_csv_row(&self, out: &mut String) {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{},{:.4},{:.4}",
            self.elapsed_ms, self.voltage_mv, self.torque_nm
        );
    }
}

/// Sole writer of the session log file.
pub struct LogWriter {
    storage: Box<dyn Storage>,
    name: Option<String>,
    line: String,
    rows: u64,
    flushes: u64,
}

impl core::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LogWriter")
            .field("name", &self.name)
            .field("rows", &self.rows)
            .field("open", &self.storage.is_open())
            .finish()
    }
}

impl LogWriter {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self {
            storage,
            name: None,
            line: String::with_capacity(48),
            rows: 0,
            flushes: 0,
        }
    }

    /// Create (or truncate) `name` and write the two header lines.
    pub fn open_session(&mut self, name: &str, sample_rate_hz: u32) -> Result<(), LoggerError> {
        self.close()?;
        self.storage
            .create_or_truncate(name)
            .map_err(|e| map_storage_error(&*e))?;
        self.name = Some(name.to_string());
        self.rows = 0;
        self.flushes = 0;
        let header = format!("SPS,{sample_rate_hz}\n{COLUMN_HEADER}\n");
        self.storage
            .write(header.as_bytes())
            .map_err(|e| map_storage_error(&*e))?;
        debug!(file = name, sample_rate_hz, "session log opened");
        Ok(())
    }

    /// Buffer one complete row; durability comes from `maybe_flush`/`close`.
    pub fn append_record(&mut self, record: &LogRecord) -> Result<(), LoggerError> {
        if !self.storage.is_open() {
            self.reopen()?;
        }
        self.line.clear();
        record.write_csv_row(&mut self.line);
        self.storage
            .write(self.line.as_bytes())
            .map_err(|e| map_storage_error(&*e))?;
        self.rows += 1;
        trace!(elapsed_ms = record.elapsed_ms, "row appended");
        Ok(())
    }

    /// Close and reopen the log once `save_interval_us` has passed since the
    /// last flush. Returns whether a flush happened.
    ///
    /// The flush mark moves even when the cycle fails, so a broken medium is
    /// retried once per save interval rather than on every sample.
    pub fn maybe_flush(
        &mut self,
        clock: &dyn Clock,
        session: &mut SessionClock,
        config: &SessionConfig,
    ) -> Result<bool, LoggerError> {
        let now = clock.now();
        let since = u64::try_from(now.saturating_duration_since(session.last_flush()).as_micros())
            .unwrap_or(u64::MAX);
        if since < config.save_interval_us() {
            return Ok(false);
        }
        session.mark_flush(now);
        let close_res = self.storage.close().map_err(|e| map_storage_error(&*e));
        self.reopen()?;
        close_res?;
        self.flushes += 1;
        debug!(rows = self.rows, flushes = self.flushes, "log flushed");
        Ok(true)
    }

    /// Commit and release the log file. No-op when nothing is open.
    pub fn close(&mut self) -> Result<(), LoggerError> {
        if self.storage.is_open() {
            self.storage.close().map_err(|e| map_storage_error(&*e))?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.storage.is_open()
    }

    /// File name of the current (or last) session.
    pub fn file_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rows appended since the session was opened.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    fn reopen(&mut self) -> Result<(), LoggerError> {
        let name = self
            .name
            .as_deref()
            .ok_or_else(|| LoggerError::State("no session log to reopen".into()))?;
        self.storage
            .open_append(name)
            .map_err(|e| map_storage_error(&*e))
    }
}

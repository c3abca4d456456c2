//! Builder for `SessionController`.
//!
//! ADC, storage and namer are required; everything else has a default.
//! `build()` validates the optional settings and returns a typed
//! `BuildError` wrapped in `eyre::Report`.

use std::sync::Arc;
use std::time::Duration;

use torque_traits::{Adc, Clock, MonotonicClock, SessionNamer, StatusLine, Storage};

use crate::calibration::CalibrationCfg;
use crate::config::{SensorCfg, SessionConfig};
use crate::controller::SessionController;
use crate::convert::UnitConverter;
use crate::error::{BuildError, Result};
use crate::mocks::NullStatusLine;
use crate::stop::StopFlag;
use crate::writer::LogWriter;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(20);
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 10;

#[derive(Default)]
pub struct SessionControllerBuilder {
    adc: Option<Box<dyn Adc>>,
    storage: Option<Box<dyn Storage>>,
    namer: Option<Box<dyn SessionNamer>>,
    status_line: Option<Box<dyn StatusLine>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    stop: Option<StopFlag>,
    sensor: Option<SensorCfg>,
    session: Option<(u32, u32)>,
    calibration: Option<CalibrationCfg>,
    read_timeout: Option<Duration>,
    max_consecutive_failures: Option<u32>,
}

impl SessionControllerBuilder {
    pub fn with_adc(mut self, adc: impl Adc + 'static) -> Self {
        self.adc = Some(Box::new(adc));
        self
    }
    pub fn with_storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Some(Box::new(storage));
        self
    }
    pub fn with_namer(mut self, namer: impl SessionNamer + 'static) -> Self {
        self.namer = Some(Box::new(namer));
        self
    }
    pub fn with_status_line(mut self, line: impl StatusLine + 'static) -> Self {
        self.status_line = Some(Box::new(line));
        self
    }
    /// Defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Share an existing stop flag (e.g. one already wired to a GPIO edge).
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = Some(stop);
        self
    }
    pub fn with_sensor(mut self, sensor: SensorCfg) -> Self {
        self.sensor = Some(sensor);
        self
    }
    /// Default rate and save interval used by `start` requests that omit them.
    pub fn with_session(mut self, sample_rate_hz: u32, save_interval_s: u32) -> Self {
        self.session = Some((sample_rate_hz, save_interval_s));
        self
    }
    pub fn with_calibration(mut self, cfg: CalibrationCfg) -> Self {
        self.calibration = Some(cfg);
        self
    }
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
    pub fn with_max_consecutive_failures(mut self, n: u32) -> Self {
        self.max_consecutive_failures = Some(n);
        self
    }

    pub fn build(self) -> Result<SessionController> {
        let adc = self
            .adc
            .ok_or_else(|| eyre::Report::new(BuildError::MissingAdc))?;
        let storage = self
            .storage
            .ok_or_else(|| eyre::Report::new(BuildError::MissingStorage))?;
        let namer = self
            .namer
            .ok_or_else(|| eyre::Report::new(BuildError::MissingNamer))?;

        let sensor = self.sensor.unwrap_or_default();
        if !(sensor.bit_weight_mv.is_finite() && sensor.bit_weight_mv > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "bit_weight_mv must be > 0",
            )));
        }
        let fs = sensor.rated_full_scale_mv();
        if !(fs.is_finite() && fs > 0.0) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "rated full scale (mV/V × excitation) must be > 0",
            )));
        }
        if !sensor.rated_torque_nm.is_finite() || sensor.rated_torque_nm <= 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "rated_torque_nm must be > 0",
            )));
        }

        let mut config = SessionConfig::new(&sensor);
        if let Some((rate, save)) = self.session {
            config = config.apply(rate, save).map_err(|_| {
                eyre::Report::new(BuildError::InvalidConfig(
                    "default sample rate or save interval out of range",
                ))
            })?;
        }

        let calibration = self.calibration.unwrap_or_default();
        if calibration.samples == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "calibration samples must be >= 1",
            )));
        }
        let read_timeout = self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT);
        if read_timeout.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "read timeout must be > 0",
            )));
        }

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        Ok(SessionController {
            adc,
            writer: LogWriter::new(storage),
            namer,
            status_line: self
                .status_line
                .unwrap_or_else(|| Box::new(NullStatusLine)),
            clock,
            stop: self.stop.unwrap_or_default(),
            converter: UnitConverter::new(sensor.bit_weight_mv, fs, sensor.rated_torque_nm),
            sensor,
            config,
            calibration,
            read_timeout,
            max_consecutive_failures: self
                .max_consecutive_failures
                .unwrap_or(DEFAULT_MAX_CONSECUTIVE_FAILURES),
            active: None,
            last_offset_mv: None,
        })
    }
}

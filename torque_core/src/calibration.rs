//! Zero-offset calibration run once at the start of every session.
use std::time::Duration;

use torque_traits::{Adc, Clock};
use tracing::{debug, info};

use crate::convert::UnitConverter;
use crate::error::LoggerError;
use crate::hw_error::map_acquisition_error;

/// Number of zero-load samples and the window they are spread across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationCfg {
    pub samples: u32,
    pub window_us: u64,
}

impl CalibrationCfg {
    /// Time between consecutive calibration samples.
    pub fn spacing_us(&self) -> u64 {
        self.window_us / u64::from(self.samples.max(1))
    }
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            samples: 32,
            window_us: 4_000_000,
        }
    }
}

/// Average `cfg.samples` zero-load readings into a millivolt offset.
///
/// Blocks for the whole window and cannot be interrupted. Any failed read
/// aborts the calibration; the caller must not start logging without an offset.
pub fn calibrate_zero(
    adc: &mut dyn Adc,
    clock: &dyn Clock,
    converter: &UnitConverter,
    cfg: &CalibrationCfg,
    read_timeout: Duration,
) -> Result<f32, LoggerError> {
    if cfg.samples == 0 {
        return Err(LoggerError::Calibration("sample count must be >= 1".into()));
    }
    let spacing = Duration::from_micros(cfg.spacing_us());
    let mut sum = 0.0f64;
    for i in 0..cfg.samples {
        if i > 0 {
            clock.sleep(spacing);
        }
        let raw = adc.read(read_timeout).map_err(|e| {
            let mapped = map_acquisition_error(&*e);
            LoggerError::Calibration(format!("sample {} of {}: {}", i + 1, cfg.samples, mapped))
        })?;
        let mv = converter.to_voltage(raw, 0.0);
        debug!(sample = i, raw, mv, "calibration sample");
        sum += f64::from(mv);
    }
    let offset_mv = (sum / f64::from(cfg.samples)) as f32;
    info!(offset_mv, samples = cfg.samples, "zero offset calibrated");
    Ok(offset_mv)
}

//! `From` implementations bridging `torque_config` types to `torque_core` types.

use std::time::Duration;

use crate::calibration::CalibrationCfg;
use crate::config::SensorCfg;

impl From<&torque_config::Config> for SensorCfg {
    fn from(c: &torque_config::Config) -> Self {
        Self {
            bit_weight_mv: c.acquisition.gain.mv_per_bit(),
            rated_output_mv_per_v: c.sensor.rated_output_mv_per_v,
            excitation_v: c.sensor.excitation_v,
            rated_torque_nm: c.sensor.rated_torque_nm,
        }
    }
}

impl From<&torque_config::CalibrationCfg> for CalibrationCfg {
    fn from(c: &torque_config::CalibrationCfg) -> Self {
        Self {
            samples: c.samples,
            window_us: c.window_ms.saturating_mul(1_000),
        }
    }
}

/// Per-read ADC timeout from `[acquisition] read_timeout_ms`.
pub fn read_timeout(c: &torque_config::Acquisition) -> Duration {
    Duration::from_millis(c.read_timeout_ms)
}

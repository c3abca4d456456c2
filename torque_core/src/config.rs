//! Session configuration: sample rate, save interval and the sensor model.
//!
//! `SessionConfig` keeps its derived periods private; every change goes
//! through `apply`, which builds a complete new value or fails without
//! touching the current one.

use crate::error::ValidationError;
use crate::util::{period_us, secs_to_us};

pub use torque_config::{
    DEFAULT_SAMPLE_RATE_HZ, DEFAULT_SAVE_INTERVAL_S, MAX_SAMPLE_RATE_HZ, MIN_SAMPLE_RATE_HZ,
};

/// Sensor and ADC constants feeding the unit converter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorCfg {
    /// ADC volts-per-code for the configured gain, in mV.
    pub bit_weight_mv: f32,
    /// Sensitivity at rated torque (mV/V).
    pub rated_output_mv_per_v: f32,
    /// Bridge excitation (V).
    pub excitation_v: f32,
    /// Torque at rated output (N·m).
    pub rated_torque_nm: f32,
}

impl SensorCfg {
    /// Bridge output at rated torque: rated output × excitation.
    pub fn rated_full_scale_mv(&self) -> f32 {
        self.rated_output_mv_per_v * self.excitation_v
    }
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            bit_weight_mv: 0.007_812_5, // ADS1115 at ±0.256 V
            rated_output_mv_per_v: 2.0,
            excitation_v: 5.0,
            rated_torque_nm: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    sample_rate_hz: u32,
    save_interval_s: u32,
    sample_interval_us: u64,
    save_interval_us: u64,
    rated_full_scale_mv: f32,
}

impl SessionConfig {
    /// Defaults (100 Hz, 5 s) for the given sensor.
    pub fn new(sensor: &SensorCfg) -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            save_interval_s: DEFAULT_SAVE_INTERVAL_S,
            sample_interval_us: period_us(DEFAULT_SAMPLE_RATE_HZ),
            save_interval_us: secs_to_us(DEFAULT_SAVE_INTERVAL_S),
            rated_full_scale_mv: sensor.rated_full_scale_mv(),
        }
    }

    /// Validate a rate/save-interval pair and derive a new configuration.
    pub fn apply(
        &self,
        sample_rate_hz: u32,
        save_interval_s: u32,
    ) -> Result<SessionConfig, ValidationError> {
        if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&sample_rate_hz) {
            return Err(ValidationError::RateOutOfRange {
                requested: sample_rate_hz,
                min: MIN_SAMPLE_RATE_HZ,
                max: MAX_SAMPLE_RATE_HZ,
            });
        }
        if save_interval_s == 0 {
            return Err(ValidationError::NonPositiveSaveInterval {
                requested: save_interval_s,
            });
        }
        Ok(SessionConfig {
            sample_rate_hz,
            save_interval_s,
            sample_interval_us: period_us(sample_rate_hz),
            save_interval_us: secs_to_us(save_interval_s),
            rated_full_scale_mv: self.rated_full_scale_mv,
        })
    }

    /// In-place variant of `apply`; leaves `self` unchanged on error.
    pub fn update(
        &mut self,
        sample_rate_hz: u32,
        save_interval_s: u32,
    ) -> Result<(), ValidationError> {
        *self = self.apply(sample_rate_hz, save_interval_s)?;
        Ok(())
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }
    pub fn save_interval_s(&self) -> u32 {
        self.save_interval_s
    }
    pub fn sample_interval_us(&self) -> u64 {
        self.sample_interval_us
    }
    pub fn save_interval_us(&self) -> u64 {
        self.save_interval_us
    }
    pub fn rated_full_scale_mv(&self) -> f32 {
        self.rated_full_scale_mv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        let cfg = SessionConfig::new(&SensorCfg::default());
        assert_eq!(cfg.sample_rate_hz(), 100);
        assert_eq!(cfg.sample_interval_us(), 10_000);
        assert_eq!(cfg.save_interval_us(), 5_000_000);
        assert_eq!(cfg.rated_full_scale_mv(), 10.0);
    }

    #[test]
    fn failed_update_keeps_previous_values() {
        let mut cfg = SessionConfig::new(&SensorCfg::default());
        cfg.update(200, 2).unwrap();
        let before = cfg;
        assert!(cfg.update(9, 2).is_err());
        assert!(cfg.update(200, 0).is_err());
        assert_eq!(cfg, before);
        assert_eq!(cfg.sample_interval_us(), 5_000);
    }

    #[test]
    fn rate_is_checked_before_interval() {
        let cfg = SessionConfig::new(&SensorCfg::default());
        assert_eq!(
            cfg.apply(300, 0),
            Err(ValidationError::RateOutOfRange {
                requested: 300,
                min: 10,
                max: 260
            })
        );
    }
}

//! Raw ADC code → millivolts → newton-metres.
//!
//! Both stages are linear and deliberately unclamped: readings beyond the
//! sensor's rated output extrapolate instead of saturating.

/// `raw * bit_weight_mv - offset_mv`.
#[inline]
pub fn to_voltage(raw: i16, bit_weight_mv: f32, offset_mv: f32) -> f32 {
    f32::from(raw) * bit_weight_mv - offset_mv
}

/// Rescale `[-full_scale_mv, +full_scale_mv]` onto `[-rated_torque_nm, +rated_torque_nm]`.
#[inline]
pub fn to_torque(voltage_mv: f32, full_scale_mv: f32, rated_torque_nm: f32) -> f32 {
    voltage_mv / full_scale_mv * rated_torque_nm
}

/// Converter bound to one sensor/ADC setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConverter {
    bit_weight_mv: f32,
    rated_full_scale_mv: f32,
    rated_torque_nm: f32,
}

impl UnitConverter {
    pub fn new(bit_weight_mv: f32, rated_full_scale_mv: f32, rated_torque_nm: f32) -> Self {
        Self {
            bit_weight_mv,
            rated_full_scale_mv,
            rated_torque_nm,
        }
    }

    #[inline]
    pub fn to_voltage(&self, raw: i16, offset_mv: f32) -> f32 {
        to_voltage(raw, self.bit_weight_mv, offset_mv)
    }

    #[inline]
    pub fn to_torque(&self, voltage_mv: f32) -> f32 {
        to_torque(voltage_mv, self.rated_full_scale_mv, self.rated_torque_nm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_voltage_is_zero_torque() {
        assert_eq!(to_torque(0.0, 10.0, 3.0), 0.0);
    }

    #[test]
    fn full_scale_maps_to_rated_torque() {
        assert_eq!(to_torque(10.0, 10.0, 3.0), 3.0);
        assert_eq!(to_torque(-10.0, 10.0, 3.0), -3.0);
    }

    #[test]
    fn beyond_full_scale_extrapolates() {
        assert_eq!(to_torque(20.0, 10.0, 3.0), 6.0);
    }

    #[test]
    fn offset_is_subtracted_after_scaling() {
        // 128 codes at 1/128 mV per code = 1 mV
        assert_eq!(to_voltage(128, 0.007_812_5, 0.25), 0.75);
        assert_eq!(to_voltage(i16::MIN, 0.007_812_5, 0.0), -256.0);
    }
}

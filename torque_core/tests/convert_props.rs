use proptest::prelude::*;
use torque_core::UnitConverter;
use torque_core::convert::{to_torque, to_voltage};

const BW: f32 = 0.007_812_5;

#[test]
fn full_scale_maps_to_rated_torque() {
    let c = UnitConverter::new(BW, 10.0, 3.0);
    assert_eq!(c.to_torque(10.0), 3.0);
    assert_eq!(c.to_torque(-10.0), -3.0);
    assert_eq!(c.to_torque(0.0), 0.0);
    // unclamped beyond full scale
    assert_eq!(c.to_torque(20.0), 6.0);
}

proptest! {
    #[test]
    fn voltage_is_linear_in_raw(raw in any::<i16>(), offset in -200.0f32..200.0) {
        let v = to_voltage(raw, BW, offset);
        let expected = f64::from(raw) * f64::from(BW) - f64::from(offset);
        prop_assert!((f64::from(v) - expected).abs() < 1e-3);
    }

    #[test]
    fn torque_is_odd(v in -300.0f32..300.0) {
        prop_assert_eq!(to_torque(-v, 10.0, 3.0), -to_torque(v, 10.0, 3.0));
    }

    #[test]
    fn torque_is_monotonic(a in -300.0f32..300.0, b in -300.0f32..300.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(to_torque(lo, 10.0, 3.0) <= to_torque(hi, 10.0, 3.0));
    }

    #[test]
    fn offset_shifts_voltage_exactly(raw in any::<i16>()) {
        let c = UnitConverter::new(BW, 10.0, 3.0);
        // bit weight is a power of two, so these are exact in f32
        prop_assert_eq!(c.to_voltage(raw, 1.0), c.to_voltage(raw, 0.0) - 1.0);
    }
}

#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse or validation errors are fine; panics are not.
    if let Ok(cfg) = toml::from_str::<torque_config::Config>(data) {
        let _ = cfg.validate();
    }
    let defaults = torque_config::Settings::new(100, 5);
    let _ = torque_config::parse_settings(data.as_bytes(), defaults);
});

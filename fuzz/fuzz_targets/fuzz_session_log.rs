#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(log) = torque_config::parse_session_log(data) {
        let _ = log.effective_rate_hz();
        let _ = log.torque_range();
    }
});

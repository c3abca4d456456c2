#![no_main]
use libfuzzer_sys::fuzz_target;
use torque_core::Command;

fuzz_target!(|data: &str| {
    if let Ok(cmd) = data.parse::<Command>() {
        // Anything accepted must survive a display/parse cycle unchanged.
        assert_eq!(cmd.to_string().parse::<Command>(), Ok(cmd));
    }
});

//! Human-readable error descriptions, exit codes and structured JSON errors.

use torque_core::error::{BuildError, LoggerError};

/// Failures raised by the CLI itself before the control loop runs.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("log directory {path}: {reason}")]
    StorageDir { path: String, reason: String },
    #[error("self-check failed: {0}")]
    SelfCheck(String),
}

pub const EXIT_GENERIC: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_CALIBRATION: i32 = 3;
pub const EXIT_STORAGE: i32 = 4;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing file, TOML syntax error or an out-of-range value.\nHow to fix: Edit the config file (see etc/torque_logger.toml), then rerun."
            ),
            CliError::StorageDir { path, reason } => format!(
                "What happened: The log directory {path} is not usable ({reason}).\nLikely causes: Storage medium not mounted, read-only, or wrong [storage] dir.\nHow to fix: Mount the medium or point storage.dir at a writable directory."
            ),
            CliError::SelfCheck(msg) => format!(
                "What happened: Self-check failed ({msg}).\nLikely causes: ADC not powered or wired, wrong I2C bus/address.\nHow to fix: Verify [acquisition] i2c_bus/address and the ADS1115 wiring."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingAdc => "What happened: No ADC was provided to the logger.\nLikely causes: The ADS1115 failed to initialize.\nHow to fix: Check I2C wiring and that the i2c-dev interface is enabled.".to_string(),
            BuildError::MissingStorage => "What happened: No log storage was provided.\nLikely causes: Storage initialisation failed.\nHow to fix: Check [storage] in the config.".to_string(),
            BuildError::MissingNamer => "What happened: No session namer was provided.\nHow to fix: This is a wiring bug; please report it.".to_string(),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(le) = err.downcast_ref::<LoggerError>() {
        return match le {
            LoggerError::Calibration(msg) => format!(
                "What happened: Zero calibration failed ({msg}).\nLikely causes: ADC not responding or the conversion timeout is too short.\nHow to fix: Check the ADS1115 wiring and raise acquisition.read_timeout_ms."
            ),
            LoggerError::Storage(msg) => format!(
                "What happened: The session log could not be written ({msg}).\nLikely causes: Storage full, removed or read-only.\nHow to fix: Check the medium and storage.dir, then start a new session."
            ),
            LoggerError::Validation(v) => format!(
                "What happened: {v}.\nHow to fix: Use a sample rate between 10 and 260 Hz and a save interval of at least 1 s."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // Generic fallback
    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable process exit codes: 2 config, 3 calibration, 4 storage, 1 otherwise.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(_) => EXIT_CONFIG,
            CliError::StorageDir { .. } => EXIT_STORAGE,
            CliError::SelfCheck(_) => EXIT_GENERIC,
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return EXIT_CONFIG;
    }
    match err.downcast_ref::<LoggerError>() {
        Some(LoggerError::Calibration(_)) => EXIT_CALIBRATION,
        Some(LoggerError::Storage(_)) => EXIT_STORAGE,
        Some(LoggerError::Validation(_)) => EXIT_CONFIG,
        _ => EXIT_GENERIC,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ce) = err.downcast_ref::<CliError>() {
        return match ce {
            CliError::Config(_) => "Config",
            CliError::StorageDir { .. } => "Storage",
            CliError::SelfCheck(_) => "SelfCheck",
        };
    }
    if err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    match err.downcast_ref::<LoggerError>() {
        Some(LoggerError::Validation(_)) => "Validation",
        Some(LoggerError::Acquisition(_)) => "Acquisition",
        Some(LoggerError::Storage(_)) => "Storage",
        Some(LoggerError::Calibration(_)) => "Calibration",
        Some(LoggerError::State(_)) => "State",
        Some(LoggerError::Command(_)) => "Command",
        Some(LoggerError::Abort(_)) => "Abort",
        None => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    serde_json::json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_map_to_stable_codes() {
        let cal = eyre::Report::new(LoggerError::Calibration("sample 1 of 32".into()));
        assert_eq!(exit_code_for_error(&cal), EXIT_CALIBRATION);
        assert!(humanize(&cal).contains("Zero calibration failed"));

        let cfg = eyre::Report::new(CliError::Config("bad".into()));
        assert_eq!(exit_code_for_error(&cfg), EXIT_CONFIG);

        let st = eyre::Report::new(LoggerError::Storage("disk full".into()));
        assert_eq!(exit_code_for_error(&st), EXIT_STORAGE);

        assert_eq!(exit_code_for_error(&eyre::eyre!("boom")), EXIT_GENERIC);
    }

    #[test]
    fn json_error_has_reason_and_code() {
        let err = eyre::Report::new(LoggerError::Calibration("x".into()));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Calibration");
        assert_eq!(v["exit_code"], 3);
    }
}

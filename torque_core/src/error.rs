use thiserror::Error;

/// Rejected session parameters. The previous configuration stays in effect.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("sample rate {requested} Hz out of range [{min}, {max}]")]
    RateOutOfRange { requested: u32, min: u32, max: u32 },
    #[error("save interval must be > 0 s, got {requested}")]
    NonPositiveSaveInterval { requested: u32 },
}

/// Why a running session was forced back to Idle.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    #[error("{count} consecutive acquisition/storage failures")]
    ConsecutiveFailures { count: u32 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoggerError {
    #[error("invalid start request: {0}")]
    Validation(#[from] ValidationError),
    #[error("acquisition error: {0}")]
    Acquisition(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("calibration failed: {0}")]
    Calibration(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("malformed command: {0}")]
    Command(#[from] CommandError),
    #[error("session aborted: {0}")]
    Abort(AbortReason),
}

/// Host command lines that could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownVerb(String),
    #[error("unknown parameter '{0}'")]
    UnknownKey(String),
    #[error("parameter '{0}' needs a value (key=value)")]
    MissingValue(String),
    #[error("invalid value '{value}' for '{key}'")]
    BadValue { key: String, value: String },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing adc")]
    MissingAdc,
    #[error("missing storage")]
    MissingStorage,
    #[error("missing session namer")]
    MissingNamer,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

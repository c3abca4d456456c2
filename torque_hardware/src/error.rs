use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("adc conversion timeout")]
    Timeout,
    #[error("no log file is open")]
    NotOpen,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;

//! Collaborator traits shared by the logger core and its hardware backends.
//!
//! The core only ever talks to the outside world through these seams, so the
//! same control loop runs against the ADS1115, the simulator or a test double.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error crossing a trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Differential ADC channel pair returning signed raw codes.
pub trait Adc {
    /// Read one conversion, blocking at most `timeout` for the result.
    fn read(&mut self, timeout: std::time::Duration) -> Result<i16, BoxError>;
}

/// Append-only file transport for session logs.
///
/// Implementations hold at most one open file; opening another one closes
/// the previous handle first.
pub trait Storage {
    fn create_or_truncate(&mut self, name: &str) -> Result<(), BoxError>;
    fn open_append(&mut self, name: &str) -> Result<(), BoxError>;
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError>;
    /// Commit buffered bytes to durable storage and release the handle.
    fn close(&mut self) -> Result<(), BoxError>;
    fn is_open(&self) -> bool;
}

/// Produces a file name that is unique per session.
pub trait SessionNamer {
    fn next_name(&mut self) -> String;
}

/// Digital status output held high while a session is logging.
pub trait StatusLine {
    fn set_high(&mut self) -> Result<(), BoxError>;
    fn set_low(&mut self) -> Result<(), BoxError>;
}

impl<T: Adc + ?Sized> Adc for Box<T> {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i16, BoxError> {
        (**self).read(timeout)
    }
}

impl<T: Storage + ?Sized> Storage for Box<T> {
    fn create_or_truncate(&mut self, name: &str) -> Result<(), BoxError> {
        (**self).create_or_truncate(name)
    }
    fn open_append(&mut self, name: &str) -> Result<(), BoxError> {
        (**self).open_append(name)
    }
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).write(bytes)
    }
    fn close(&mut self) -> Result<(), BoxError> {
        (**self).close()
    }
    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

impl<T: StatusLine + ?Sized> StatusLine for Box<T> {
    fn set_high(&mut self) -> Result<(), BoxError> {
        (**self).set_high()
    }
    fn set_low(&mut self) -> Result<(), BoxError> {
        (**self).set_low()
    }
}

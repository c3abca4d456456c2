//! Maps `Box<dyn Error>` from trait boundaries to typed `LoggerError`.
//!
//! The traits in `torque_traits` use `Box<dyn Error + Send + Sync>` so any
//! backend can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `torque_hardware::HwError`.

use crate::error::LoggerError;

/// Map an ADC-side error to `LoggerError::Acquisition`.
pub fn map_acquisition_error(e: &(dyn std::error::Error + 'static)) -> LoggerError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<torque_hardware::error::HwError>() {
            return match hw {
                torque_hardware::error::HwError::Timeout => {
                    LoggerError::Acquisition("conversion timed out".into())
                }
                other => LoggerError::Acquisition(other.to_string()),
            };
        }
    }
    LoggerError::Acquisition(e.to_string())
}

/// Map a storage-side error to `LoggerError::Storage`.
pub fn map_storage_error(e: &(dyn std::error::Error + 'static)) -> LoggerError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<torque_hardware::error::HwError>() {
            return match hw {
                torque_hardware::error::HwError::Io(io) => {
                    LoggerError::Storage(format!("{} ({:?})", io, io.kind()))
                }
                other => LoggerError::Storage(other.to_string()),
            };
        }
    }
    LoggerError::Storage(e.to_string())
}

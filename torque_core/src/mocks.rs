//! Stand-ins for optional collaborators.

use torque_traits::{BoxError, StatusLine};

/// Status line for setups without a GPIO indicator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatusLine;

impl StatusLine for NullStatusLine {
    fn set_high(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn set_low(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use torque_traits::{BoxError, StatusLine};

use crate::error::{HwError, Result};

/// Status output driven high while a session is logging.
pub struct GpioStatusLine {
    pin: OutputPin,
}

impl GpioStatusLine {
    pub fn new(pin: u8) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_output();
        pin.set_low();
        Ok(Self { pin })
    }
}

impl StatusLine for GpioStatusLine {
    fn set_high(&mut self) -> std::result::Result<(), BoxError> {
        self.pin.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> std::result::Result<(), BoxError> {
        self.pin.set_low();
        Ok(())
    }
}

/// Stop input: invokes `on_rising` from the interrupt thread on each rising
/// edge. The interrupt stays armed for as long as this value lives.
pub struct StopInput {
    _pin: InputPin,
}

impl StopInput {
    pub fn watch(pin: u8, on_rising: impl Fn() + Send + 'static) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let mut pin = gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(e.to_string()))?
            .into_input_pulldown();
        pin.set_async_interrupt(Trigger::RisingEdge, move |level: Level| {
            if level == Level::High {
                on_rising();
            }
        })
        .map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(Self { _pin: pin })
    }
}

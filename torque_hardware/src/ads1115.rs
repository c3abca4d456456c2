use std::time::Duration;
use tracing::trace;

use rppal::i2c::I2c;

use crate::error::{HwError, Result};
use crate::util::wait_until_with_timeout;

const REG_CONVERSION: u8 = 0x00;
const REG_CONFIG: u8 = 0x01;

const OS_SINGLE: u16 = 1 << 15;
const MODE_SINGLE_SHOT: u16 = 1 << 8;
const COMP_QUE_DISABLE: u16 = 0b11;

/// ADS1115 in single-shot mode on one differential pair.
pub struct Ads1115 {
    i2c: I2c,
    config: u16, // everything except the OS "start" bit
}

impl Ads1115 {
    /// `mux_bits` and `pga_bits` are raw register fields (see
    /// `torque_config::DiffPair` and `torque_config::Gain`); `data_rate_sps`
    /// must be an ADS1115 rate.
    pub fn new(
        bus: u8,
        address: u16,
        mux_bits: u16,
        pga_bits: u16,
        data_rate_sps: u16,
    ) -> Result<Self> {
        let mut i2c = I2c::with_bus(bus).map_err(|e| HwError::I2c(e.to_string()))?;
        i2c.set_slave_address(address)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        let dr = dr_bits(data_rate_sps)
            .ok_or_else(|| HwError::I2c(format!("unsupported data rate {data_rate_sps} SPS")))?;
        let config = ((mux_bits & 0b011) << 12)
            | (pga_bits << 9)
            | MODE_SINGLE_SHOT
            | (dr << 5)
            | COMP_QUE_DISABLE;
        Ok(Self { i2c, config })
    }

    pub fn read_with_timeout(&mut self, timeout: Duration) -> Result<i16> {
        // Start a single conversion
        let word = self.config | OS_SINGLE;
        let [hi, lo] = word.to_be_bytes();
        self.i2c
            .write(&[REG_CONFIG, hi, lo])
            .map_err(|e| HwError::I2c(e.to_string()))?;

        // OS reads back as 1 once the conversion has finished
        wait_until_with_timeout(
            || {
                let cfg = self.read_register(REG_CONFIG)?;
                Ok(cfg & OS_SINGLE != 0)
            },
            timeout,
            Duration::from_micros(100),
        )?;

        let raw = self.read_register(REG_CONVERSION)? as i16;
        trace!(raw, "ads1115 raw read");
        Ok(raw)
    }

    fn read_register(&mut self, reg: u8) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(&[reg], &mut buf)
            .map_err(|e| HwError::I2c(e.to_string()))?;
        Ok(u16::from_be_bytes(buf))
    }
}

/// DR field value for config register bits [7:5].
fn dr_bits(sps: u16) -> Option<u16> {
    Some(match sps {
        8 => 0,
        16 => 1,
        32 => 2,
        64 => 3,
        128 => 4,
        250 => 5,
        475 => 6,
        860 => 7,
        _ => return None,
    })
}

#[cfg(feature = "hardware")]
pub mod ads1115;
pub mod error;
#[cfg(feature = "hardware")]
pub mod gpio;
pub mod naming;
pub mod storage;
pub mod util;

pub use naming::TimestampNamer;
pub use storage::{FsStorage, NullStorage};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use torque_traits::{Adc, BoxError, StatusLine};

use crate::error::HwError;

/// Simulated differential ADC.
///
/// Produces `base` plus a symmetric triangle wave of the given amplitude and
/// period (in reads), so logs show a recognisable, deterministic load cycle.
#[derive(Debug)]
pub struct SimulatedAdc {
    base: i16,
    amplitude: i16,
    period: u32,
    tick: u32,
    fail: bool,
    reads: Arc<AtomicU64>,
}

impl SimulatedAdc {
    pub fn new(base: i16) -> Self {
        SimulatedAdc {
            base,
            amplitude: 0,
            period: 1,
            tick: 0,
            fail: false,
            reads: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Superimpose a triangle wave peaking at `base + amplitude`.
    pub fn with_wave(mut self, amplitude: i16, period: u32) -> Self {
        self.amplitude = amplitude;
        self.period = period.max(2);
        self
    }

    /// Every read fails, as if the bus were disconnected.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Shared counter of attempted reads.
    pub fn read_counter(&self) -> Arc<AtomicU64> {
        self.reads.clone()
    }

    fn wave(&self) -> i32 {
        if self.amplitude == 0 {
            return 0;
        }
        let half = (self.period / 2).max(1) as i32;
        let phase = (self.tick % self.period) as i32;
        let ramp = if phase <= half { phase } else { 2 * half - phase };
        // ramp in [0, half] -> [-amplitude, +amplitude]
        i32::from(self.amplitude) * (2 * ramp - half) / half
    }
}

impl Adc for SimulatedAdc {
    fn read(&mut self, _timeout: std::time::Duration) -> Result<i16, BoxError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(Box::new(HwError::I2c("simulated bus fault".into())));
        }
        let v = i32::from(self.base) + self.wave();
        self.tick = self.tick.wrapping_add(1);
        let raw = v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        tracing::trace!(raw, "simulated adc read");
        Ok(raw)
    }
}

/// Status line that only remembers its level.
#[derive(Debug, Clone, Default)]
pub struct SimulatedStatusLine {
    high: Arc<AtomicBool>,
}

impl SimulatedStatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for observing the level from elsewhere.
    pub fn level(&self) -> Arc<AtomicBool> {
        self.high.clone()
    }
}

impl StatusLine for SimulatedStatusLine {
    fn set_high(&mut self) -> Result<(), BoxError> {
        self.high.store(true, Ordering::Release);
        tracing::debug!("status line high (simulated)");
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), BoxError> {
        self.high.store(false, Ordering::Release);
        tracing::debug!("status line low (simulated)");
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub struct HardwareAdc {
    ads: ads1115::Ads1115,
}

#[cfg(feature = "hardware")]
impl HardwareAdc {
    pub fn new(
        bus: u8,
        address: u16,
        mux_bits: u16,
        pga_bits: u16,
        data_rate_sps: u16,
    ) -> error::Result<Self> {
        let ads = ads1115::Ads1115::new(bus, address, mux_bits, pga_bits, data_rate_sps)?;
        Ok(HardwareAdc { ads })
    }
}

#[cfg(feature = "hardware")]
impl Adc for HardwareAdc {
    fn read(&mut self, timeout: std::time::Duration) -> Result<i16, BoxError> {
        let mut attempts = 0;
        let max_attempts = 3;
        loop {
            match self.ads.read_with_timeout(timeout) {
                Ok(raw) => return Ok(raw),
                Err(HwError::Timeout) if attempts < max_attempts => {
                    attempts += 1;
                    tracing::warn!(retries = attempts, "adc conversion timeout, retrying");
                }
                Err(e) => {
                    tracing::error!("ADC read error: {}", e);
                    return Err(Box::new(e));
                }
            }
        }
    }
}

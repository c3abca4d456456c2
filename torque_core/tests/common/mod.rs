#![allow(dead_code)]
//! Test doubles shared by the torque_core integration tests.

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use torque_core::{CalibrationCfg, SessionController, StopFlag};
use torque_hardware::{SimulatedAdc, SimulatedStatusLine};
use torque_traits::clock::test_clock::TestClock;
use torque_traits::{Adc, SessionNamer, Storage};

type BoxError = Box<dyn Error + Send + Sync>;

/// Small calibration so tests don't sleep through 32 samples.
pub const FAST_CAL: CalibrationCfg = CalibrationCfg {
    samples: 4,
    window_us: 4_000,
};

#[derive(Debug, Default)]
pub struct MemState {
    /// Bytes committed by `close`.
    pub files: HashMap<String, Vec<u8>>,
    pub open: Option<String>,
    pub pending: Vec<u8>,
    pub ops: Vec<String>,
    pub fail_create: bool,
    pub fail_writes: bool,
    pub fail_close: bool,
}

/// In-memory storage; data becomes visible in `files` only when closed.
#[derive(Debug, Clone, Default)]
pub struct MemStorage(pub Arc<Mutex<MemState>>);

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self, name: &str) -> String {
        let st = self.0.lock().unwrap();
        String::from_utf8(st.files.get(name).cloned().unwrap_or_default()).unwrap()
    }

    pub fn ops(&self) -> Vec<String> {
        self.0.lock().unwrap().ops.clone()
    }

    pub fn count_ops(&self, op: &str) -> usize {
        self.ops().iter().filter(|o| o.starts_with(op)).count()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.0.lock().unwrap().fail_writes = fail;
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.0.lock().unwrap().fail_create = fail;
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.0.lock().unwrap().fail_close = fail;
    }
}

impl Storage for MemStorage {
    fn create_or_truncate(&mut self, name: &str) -> Result<(), BoxError> {
        let mut st = self.0.lock().unwrap();
        st.ops.push(format!("create {name}"));
        if st.fail_create {
            return Err("medium not mounted".into());
        }
        st.files.insert(name.to_string(), Vec::new());
        st.open = Some(name.to_string());
        st.pending.clear();
        Ok(())
    }

    fn open_append(&mut self, name: &str) -> Result<(), BoxError> {
        let mut st = self.0.lock().unwrap();
        st.ops.push(format!("append {name}"));
        st.open = Some(name.to_string());
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        let mut st = self.0.lock().unwrap();
        if st.open.is_none() {
            return Err("write without open file".into());
        }
        if st.fail_writes {
            return Err("write failed".into());
        }
        st.pending.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        let mut st = self.0.lock().unwrap();
        st.ops.push("close".to_string());
        if let Some(name) = st.open.take() {
            let data = std::mem::take(&mut st.pending);
            st.files.entry(name).or_default().extend_from_slice(&data);
        }
        if st.fail_close {
            return Err("sync failed".into());
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.0.lock().unwrap().open.is_some()
    }
}

/// `session-1.csv`, `session-2.csv`, ...
#[derive(Debug, Default)]
pub struct SeqNamer(u32);

impl SessionNamer for SeqNamer {
    fn next_name(&mut self) -> String {
        self.0 += 1;
        format!("session-{}.csv", self.0)
    }
}

/// ADC driven by a closure over the read index (0-based).
pub struct FnAdc<F>(pub F, pub u64);

impl<F: FnMut(u64) -> Option<i16>> Adc for FnAdc<F> {
    fn read(&mut self, _timeout: Duration) -> Result<i16, BoxError> {
        let i = self.1;
        self.1 += 1;
        (self.0)(i).ok_or_else(|| "no conversion".into())
    }
}

/// Raises `flag` once `n` reads have been made.
pub struct StopAfter<A> {
    pub inner: A,
    pub n: u64,
    pub seen: u64,
    pub flag: StopFlag,
}

impl<A: Adc> Adc for StopAfter<A> {
    fn read(&mut self, timeout: Duration) -> Result<i16, BoxError> {
        self.seen += 1;
        if self.seen >= self.n {
            self.flag.raise();
        }
        self.inner.read(timeout)
    }
}

pub struct Rig {
    pub controller: SessionController,
    pub storage: MemStorage,
    pub clock: TestClock,
    pub status: SimulatedStatusLine,
}

/// Controller over `adc` with in-memory storage and a manual clock.
pub fn rig_with(adc: impl Adc + 'static, max_failures: u32) -> Rig {
    let storage = MemStorage::new();
    let clock = TestClock::new();
    let status = SimulatedStatusLine::new();
    let controller = SessionController::builder()
        .with_adc(adc)
        .with_storage(storage.clone())
        .with_namer(SeqNamer::default())
        .with_status_line(status.clone())
        .with_clock(Arc::new(clock.clone()))
        .with_calibration(FAST_CAL)
        .with_max_consecutive_failures(max_failures)
        .build()
        .expect("controller build");
    Rig {
        controller,
        storage,
        clock,
        status,
    }
}

pub fn rig() -> Rig {
    rig_with(SimulatedAdc::new(128).with_wave(64, 20), 10)
}

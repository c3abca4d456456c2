#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas, the key/value settings store and the session-log reader.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The settings store is a headerless `key,value` CSV; unknown keys are
//!   ignored and bad values fall back to defaults with a notice.
//! - `load_session_log` parses the CSV files written by the logger.
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// Lowest accepted sample rate (Hz).
pub const MIN_SAMPLE_RATE_HZ: u32 = 10;
/// Highest accepted sample rate (Hz).
pub const MAX_SAMPLE_RATE_HZ: u32 = 260;
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 100;
pub const DEFAULT_SAVE_INTERVAL_S: u32 = 5;

/// ADS1115 programmable gain. Each step halves the full-scale range.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gain {
    /// ±6.144 V
    TwoThirds,
    /// ±4.096 V
    One,
    /// ±2.048 V
    Two,
    /// ±1.024 V
    Four,
    /// ±0.512 V
    Eight,
    /// ±0.256 V
    #[default]
    Sixteen,
}

impl Gain {
    /// Weight of one LSB in millivolts.
    pub const fn mv_per_bit(self) -> f32 {
        match self {
            Self::TwoThirds => 0.1875,
            Self::One => 0.125,
            Self::Two => 0.0625,
            Self::Four => 0.031_25,
            Self::Eight => 0.015_625,
            Self::Sixteen => 0.007_812_5,
        }
    }

    /// PGA field value for config register bits [11:9].
    pub const fn pga_bits(self) -> u16 {
        match self {
            Self::TwoThirds => 0b000,
            Self::One => 0b001,
            Self::Two => 0b010,
            Self::Four => 0b011,
            Self::Eight => 0b100,
            Self::Sixteen => 0b101,
        }
    }
}

/// Differential input pair routed through the ADS1115 multiplexer.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffPair {
    #[default]
    #[serde(rename = "a0_a1")]
    A0A1,
    #[serde(rename = "a0_a3")]
    A0A3,
    #[serde(rename = "a1_a3")]
    A1A3,
    #[serde(rename = "a2_a3")]
    A2A3,
}

impl DiffPair {
    /// MUX field value for config register bits [14:12].
    pub const fn mux_bits(self) -> u16 {
        match self {
            Self::A0A1 => 0b000,
            Self::A0A3 => 0b001,
            Self::A1A3 => 0b010,
            Self::A2A3 => 0b011,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Acquisition {
    pub i2c_bus: u8,
    /// 7-bit I2C address (0x48..=0x4B depending on the ADDR strap)
    pub address: u16,
    pub gain: Gain,
    pub pair: DiffPair,
    /// ADC conversion rate; must be one of the ADS1115 rates
    pub data_rate_sps: u16,
    /// Max time to wait for a single-shot conversion
    pub read_timeout_ms: u64,
}

impl Default for Acquisition {
    fn default() -> Self {
        Self {
            i2c_bus: 1,
            address: 0x48,
            gain: Gain::Sixteen,
            pair: DiffPair::A0A1,
            data_rate_sps: 860,
            read_timeout_ms: 20,
        }
    }
}

/// Conversion rates supported by the ADS1115 data-rate field.
pub const ADS1115_RATES_SPS: [u16; 8] = [8, 16, 32, 64, 128, 250, 475, 860];

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sensor {
    /// Sensitivity at rated torque (mV per V of excitation)
    pub rated_output_mv_per_v: f32,
    pub excitation_v: f32,
    /// Torque reached at rated output
    pub rated_torque_nm: f32,
}

impl Default for Sensor {
    fn default() -> Self {
        Self {
            rated_output_mv_per_v: 2.0,
            excitation_v: 5.0,
            rated_torque_nm: 3.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
    pub sample_rate_hz: u32,
    pub save_interval_s: u32,
    /// Consecutive failed iterations tolerated before a session is aborted
    pub max_consecutive_failures: u32,
    /// Optional key/value settings store overriding rate and save interval
    pub settings_file: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            save_interval_s: DEFAULT_SAVE_INTERVAL_S,
            max_consecutive_failures: 10,
            settings_file: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Number of zero-load samples averaged at session start
    pub samples: u32,
    /// Total calibration window; samples are evenly spaced across it
    pub window_ms: u64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            samples: 32,
            window_ms: 4_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    /// When false, session logs are discarded (null storage)
    pub enabled: bool,
    pub dir: String,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "logs".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Pins {
    /// Held high while logging
    pub status_out: Option<u8>,
    /// Rising edge requests a stop
    pub stop_in: Option<u8>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub acquisition: Acquisition,
    #[serde(default)]
    pub sensor: Sensor,
    #[serde(default)]
    pub session: Session,
    #[serde(default)]
    pub calibration: CalibrationCfg,
    #[serde(default)]
    pub storage: StorageCfg,
    #[serde(default)]
    pub pins: Pins,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Acquisition
        if !(0x48..=0x4B).contains(&self.acquisition.address) {
            eyre::bail!("acquisition.address must be in 0x48..=0x4B");
        }
        if !ADS1115_RATES_SPS.contains(&self.acquisition.data_rate_sps) {
            eyre::bail!(
                "acquisition.data_rate_sps must be one of {:?}",
                ADS1115_RATES_SPS
            );
        }
        if self.acquisition.read_timeout_ms == 0 {
            eyre::bail!("acquisition.read_timeout_ms must be >= 1");
        }

        // Sensor
        if !(self.sensor.rated_output_mv_per_v.is_finite() && self.sensor.rated_output_mv_per_v > 0.0)
        {
            eyre::bail!("sensor.rated_output_mv_per_v must be > 0");
        }
        if !(self.sensor.excitation_v.is_finite() && self.sensor.excitation_v > 0.0) {
            eyre::bail!("sensor.excitation_v must be > 0");
        }
        if !(self.sensor.rated_torque_nm.is_finite() && self.sensor.rated_torque_nm > 0.0) {
            eyre::bail!("sensor.rated_torque_nm must be > 0");
        }

        // Session
        if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&self.session.sample_rate_hz) {
            eyre::bail!(
                "session.sample_rate_hz must be in [{MIN_SAMPLE_RATE_HZ}, {MAX_SAMPLE_RATE_HZ}]"
            );
        }
        if self.session.save_interval_s == 0 {
            eyre::bail!("session.save_interval_s must be > 0");
        }
        if self.session.max_consecutive_failures == 0 {
            eyre::bail!("session.max_consecutive_failures must be >= 1");
        }

        // Calibration
        if self.calibration.samples == 0 {
            eyre::bail!("calibration.samples must be >= 1");
        }
        if self.calibration.window_ms > 60_000 {
            eyre::bail!("calibration.window_ms is unreasonably large (>60s)");
        }

        // Storage
        if self.storage.enabled && self.storage.dir.trim().is_empty() {
            eyre::bail!("storage.dir must not be empty when storage is enabled");
        }

        // Pins
        if let (Some(a), Some(b)) = (self.pins.status_out, self.pins.stop_in)
            && a == b
        {
            eyre::bail!("pins.status_out and pins.stop_in must differ");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Effective values read from the key/value settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub sample_rate_hz: u32,
    pub save_interval_s: u32,
    /// Human-readable notes about ignored or rejected entries
    pub notices: Vec<String>,
}

impl Settings {
    pub fn new(sample_rate_hz: u32, save_interval_s: u32) -> Self {
        Self {
            sample_rate_hz,
            save_interval_s,
            notices: Vec::new(),
        }
    }
}

/// Parse a headerless `key,value` settings store.
///
/// Recognized keys: `samplerate`, `saveinterval`. Values that do not parse or
/// fall outside their bounds keep the corresponding field of `defaults`.
pub fn parse_settings<R: Read>(rdr: R, defaults: Settings) -> eyre::Result<Settings> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(rdr);

    let mut out = defaults.clone();
    for (idx, rec) in rdr.records().enumerate() {
        let record = rec.map_err(|e| eyre::eyre!("settings line {}: {}", idx + 1, e))?;
        if record.len() < 2 {
            continue;
        }
        let key = record[0].to_ascii_lowercase();
        let value = &record[1];
        match key.as_str() {
            "samplerate" => match value.parse::<u32>() {
                Ok(hz) if (MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&hz) => {
                    out.sample_rate_hz = hz;
                }
                _ => {
                    out.sample_rate_hz = defaults.sample_rate_hz;
                    out.notices.push(format!(
                        "samplerate '{value}' invalid (expected {MIN_SAMPLE_RATE_HZ}..={MAX_SAMPLE_RATE_HZ}); using {}",
                        defaults.sample_rate_hz
                    ));
                }
            },
            "saveinterval" => match value.parse::<u32>() {
                Ok(s) if s > 0 => out.save_interval_s = s,
                _ => {
                    out.save_interval_s = defaults.save_interval_s;
                    out.notices.push(format!(
                        "saveinterval '{value}' invalid (expected a positive integer); using {}",
                        defaults.save_interval_s
                    ));
                }
            },
            _ => {}
        }
    }
    Ok(out)
}

pub fn load_settings(path: &Path, defaults: Settings) -> eyre::Result<Settings> {
    let file =
        std::fs::File::open(path).map_err(|e| eyre::eyre!("open settings {:?}: {}", path, e))?;
    parse_settings(file, defaults)
}

/// One data row of a session log.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct LogRow {
    pub elapsed_ms: u64,
    pub voltage_mv: f32,
    pub torque_nm: f32,
}

/// A parsed session log: the `SPS` header plus every data row.
#[derive(Debug, Clone)]
pub struct SessionLog {
    pub sample_rate_hz: u32,
    pub rows: Vec<LogRow>,
}

impl SessionLog {
    /// Elapsed time of the last row, or 0 for an empty log.
    pub fn duration_ms(&self) -> u64 {
        self.rows.last().map_or(0, |r| r.elapsed_ms)
    }

    /// Observed sample rate from the row timestamps, if at least two rows exist.
    pub fn effective_rate_hz(&self) -> Option<f64> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        let span = last.elapsed_ms.checked_sub(first.elapsed_ms)?;
        if span == 0 {
            return None;
        }
        Some((self.rows.len() - 1) as f64 * 1000.0 / span as f64)
    }

    /// (min, max) torque over all rows.
    pub fn torque_range(&self) -> Option<(f32, f32)> {
        let mut it = self.rows.iter().map(|r| r.torque_nm);
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}

/// Parse a session log produced by the logger.
///
/// Expected layout:
/// SPS,<rate>
/// microSeconds,mV,NM
/// <elapsed_ms>,<mV>,<NM>
pub fn parse_session_log<R: Read>(rdr: R) -> eyre::Result<SessionLog> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr);
    let mut records = rdr.records();

    let sps = records
        .next()
        .ok_or_else(|| eyre::eyre!("session log is empty"))?
        .map_err(|e| eyre::eyre!("read SPS header: {}", e))?;
    if sps.len() != 2 || &sps[0] != "SPS" {
        eyre::bail!(
            "session log must start with 'SPS,<rate>', got: {}",
            sps.iter().collect::<Vec<_>>().join(",")
        );
    }
    let sample_rate_hz = sps[1]
        .trim()
        .parse::<u32>()
        .map_err(|e| eyre::eyre!("invalid SPS value '{}': {}", &sps[1], e))?;

    let columns = records
        .next()
        .ok_or_else(|| eyre::eyre!("session log is missing the column header"))?
        .map_err(|e| eyre::eyre!("read column header: {}", e))?;
    let expected = ["microSeconds", "mV", "NM"];
    let actual: Vec<&str> = columns.iter().collect();
    if actual != expected {
        eyre::bail!(
            "session log must have columns 'microSeconds,mV,NM', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in records.enumerate() {
        let record = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 3, e))?;
        let row: LogRow = record
            .deserialize(None)
            .map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 3, e))?;
        rows.push(row);
    }

    Ok(SessionLog {
        sample_rate_hz,
        rows,
    })
}

pub fn load_session_log(path: &Path) -> eyre::Result<SessionLog> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open session log {:?}: {}", path, e))?;
    parse_session_log(file)
}

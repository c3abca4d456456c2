//! Hardware assembly and the `run` / `self-check` commands.

use std::path::Path;
use std::time::Duration;

use eyre::WrapErr;
use torque_config::{Config, Settings};
use torque_core::conversions::read_timeout;
use torque_core::hw_error::map_acquisition_error;
use torque_core::{
    CalibrationCfg, Command, RunSummary, SensorCfg, SessionController, StartRequest, StopFlag,
    UnitConverter,
};
use torque_hardware::{FsStorage, NullStorage, SimulatedStatusLine, TimestampNamer};
use torque_traits::{Adc, BoxError, StatusLine, Storage};

use crate::cli::RtLock;
use crate::error_fmt::CliError;
use crate::rt::setup_rt_once;

/// Options of the `run` subcommand.
#[derive(Debug, Clone, Copy)]
pub struct RunOpts {
    pub rate: Option<u32>,
    pub save_interval: Option<u32>,
    pub autostart: bool,
    pub rt: bool,
    pub rt_prio: Option<i32>,
    pub rt_lock: RtLock,
    pub rt_cpu: Option<usize>,
}

/// Raises the session stop flag once `limit` conversions have been read.
struct StopAfterReads<A> {
    inner: A,
    reads: u64,
    limit: u64,
    stop: StopFlag,
}

impl<A: Adc> Adc for StopAfterReads<A> {
    fn read(&mut self, timeout: Duration) -> Result<i16, BoxError> {
        self.reads += 1;
        if self.reads == self.limit {
            tracing::info!(reads = self.reads, "test hook: raising stop");
            self.stop.raise();
        }
        self.inner.read(timeout)
    }
}

#[cfg(not(feature = "hardware"))]
fn make_adc(_cfg: &Config, stop: &StopFlag) -> eyre::Result<Box<dyn Adc>> {
    // ±2560 codes = ±20 mV at the default gain: a full ±3 N·m load cycle every 2 s at 100 Hz
    let mut sim = torque_hardware::SimulatedAdc::new(0).with_wave(1280, 200);
    if std::env::var("TORQUE_TEST_SIM_FAIL").is_ok_and(|v| v == "1") {
        sim = sim.failing();
    }
    if let Some(limit) = std::env::var("TORQUE_TEST_SIM_STOP_AFTER")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        return Ok(Box::new(StopAfterReads {
            inner: sim,
            reads: 0,
            limit,
            stop: stop.clone(),
        }));
    }
    tracing::info!("using simulated ADC");
    Ok(Box::new(sim))
}

#[cfg(feature = "hardware")]
fn make_adc(cfg: &Config, _stop: &StopFlag) -> eyre::Result<Box<dyn Adc>> {
    let a = &cfg.acquisition;
    let adc = torque_hardware::HardwareAdc::new(
        a.i2c_bus,
        a.address,
        a.pair.mux_bits(),
        a.gain.pga_bits(),
        a.data_rate_sps,
    )
    .wrap_err_with(|| format!("open ADS1115 on i2c-{} at {:#04x}", a.i2c_bus, a.address))?;
    tracing::info!(bus = a.i2c_bus, address = a.address, gain = ?a.gain, pair = ?a.pair, "ADS1115 ready");
    Ok(Box::new(adc))
}

fn ensure_dir(dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(|e| CliError::StorageDir {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })
}

/// Storage backend plus a namer that avoids names already on that storage.
fn make_storage(cfg: &Config) -> eyre::Result<(Box<dyn Storage>, TimestampNamer)> {
    if !cfg.storage.enabled {
        tracing::warn!("storage disabled; samples will be discarded");
        return Ok((Box::new(NullStorage::new()), TimestampNamer::new()));
    }
    let dir = Path::new(&cfg.storage.dir);
    ensure_dir(dir)?;
    let fs = FsStorage::new(dir).map_err(|e| CliError::StorageDir {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })?;
    let namer = TimestampNamer::in_dir(fs.root());
    Ok((Box::new(fs), namer))
}

fn make_status_line(cfg: &Config) -> Box<dyn StatusLine> {
    #[cfg(feature = "hardware")]
    if let Some(pin) = cfg.pins.status_out {
        match torque_hardware::gpio::GpioStatusLine::new(pin) {
            Ok(line) => return Box::new(line),
            Err(e) => tracing::warn!(pin, error = %e, "status output unavailable"),
        }
    }
    let _ = cfg;
    Box::new(SimulatedStatusLine::new())
}

/// Rate and save interval used by `start` requests that omit them:
/// CLI flag, else settings store, else `[session]`.
pub fn session_defaults(cfg: &Config, opts: &RunOpts) -> (u32, u32) {
    let base = Settings::new(cfg.session.sample_rate_hz, cfg.session.save_interval_s);
    let settings = match cfg.session.settings_file.as_deref() {
        Some(path) => match torque_config::load_settings(Path::new(path), base.clone()) {
            Ok(s) => {
                for notice in &s.notices {
                    tracing::warn!(file = path, "{notice}");
                }
                s
            }
            Err(e) => {
                tracing::warn!(file = path, error = %e, "settings store unreadable, using config values");
                base
            }
        },
        None => base,
    };
    (
        opts.rate.unwrap_or(settings.sample_rate_hz),
        opts.save_interval.unwrap_or(settings.save_interval_s),
    )
}

fn build_controller(cfg: &Config, opts: &RunOpts, stop: &StopFlag) -> eyre::Result<SessionController> {
    let (rate, save) = session_defaults(cfg, opts);
    let (storage, namer) = make_storage(cfg)?;
    SessionController::builder()
        .with_adc(make_adc(cfg, stop)?)
        .with_storage(storage)
        .with_namer(namer)
        .with_status_line(make_status_line(cfg))
        .with_stop_flag(stop.clone())
        .with_sensor(SensorCfg::from(cfg))
        .with_session(rate, save)
        .with_calibration(CalibrationCfg::from(&cfg.calibration))
        .with_read_timeout(read_timeout(&cfg.acquisition))
        .with_max_consecutive_failures(cfg.session.max_consecutive_failures)
        .build()
}

pub fn run_logger(cfg: &Config, opts: RunOpts, json: bool) -> eyre::Result<()> {
    setup_rt_once(opts.rt, opts.rt_prio, opts.rt_lock, opts.rt_cpu);

    let session_stop = StopFlag::new();
    let shutdown = StopFlag::new();
    let mut controller = build_controller(cfg, &opts, &session_stop)?;

    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.raise()).wrap_err("install Ctrl-C handler")?;
    }

    #[cfg(feature = "hardware")]
    let _stop_input = match cfg.pins.stop_in {
        Some(pin) => {
            let flag = session_stop.clone();
            match torque_hardware::gpio::StopInput::watch(pin, move || flag.raise()) {
                Ok(input) => Some(input),
                Err(e) => {
                    tracing::warn!(pin, error = %e, "stop input unavailable");
                    None
                }
            }
        }
        None => None,
    };

    let (tx, rx) = crossbeam_channel::unbounded::<Command>();
    crate::host::spawn_reader(std::io::BufReader::new(std::io::stdin()), tx)
        .wrap_err("spawn host reader")?;

    let mut started = 0;
    if opts.autostart {
        controller
            .start(StartRequest::default())
            .map_err(eyre::Report::new)?;
        started = 1;
    } else {
        tracing::info!(
            sample_rate_hz = controller.config().sample_rate_hz(),
            "idle; waiting for 'start' on stdin"
        );
    }

    let mut summary = torque_core::run(&mut controller, &rx, &shutdown)?;
    summary.sessions += started;
    print_summary(&summary, controller.file_name(), json);
    Ok(())
}

fn print_summary(s: &RunSummary, last_file: Option<&str>, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "sessions": s.sessions,
                "rows": s.rows,
                "rejected": s.rejected,
                "aborted": s.aborted,
                "last_file": last_file,
            })
        );
    } else {
        println!(
            "Logged {} rows in {} session(s); {} command(s) rejected, {} aborted.",
            s.rows, s.sessions, s.rejected, s.aborted
        );
        if let Some(f) = last_file {
            println!("Last log: {f}");
        }
    }
}

pub fn self_check(cfg: &Config, samples: u32, json: bool) -> eyre::Result<()> {
    let mut adc = make_adc(cfg, &StopFlag::new())?;
    let sensor = SensorCfg::from(cfg);
    let converter = UnitConverter::new(
        sensor.bit_weight_mv,
        sensor.rated_full_scale_mv(),
        sensor.rated_torque_nm,
    );
    let timeout = read_timeout(&cfg.acquisition);

    let n = samples.max(1);
    let mut sum = 0.0f64;
    for i in 0..n {
        let raw = adc.read(timeout).map_err(|e| {
            CliError::SelfCheck(format!(
                "read {} of {n}: {}",
                i + 1,
                map_acquisition_error(&*e)
            ))
        })?;
        sum += f64::from(converter.to_voltage(raw, 0.0));
    }
    let mean_mv = sum / f64::from(n);

    let storage = if cfg.storage.enabled {
        let dir = Path::new(&cfg.storage.dir);
        ensure_dir(dir)?;
        let probe = dir.join(".torque_probe");
        std::fs::write(&probe, b"ok")
            .and_then(|()| std::fs::remove_file(&probe))
            .map_err(|e| CliError::StorageDir {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        format!("ok ({})", dir.display())
    } else {
        "disabled".to_string()
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "adc": "ok",
                "samples": n,
                "mean_mv": mean_mv,
                "storage": storage,
            })
        );
    } else {
        println!("ADC: ok ({n} samples, mean {mean_mv:.4} mV)");
        println!("Storage: {storage}");
        println!("OK");
    }
    Ok(())
}

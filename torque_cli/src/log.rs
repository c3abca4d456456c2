//! Tracing setup: console (pretty or JSON) on stderr, optional JSON file.

use std::path::Path;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use crate::cli::FILE_GUARD;

/// `RUST_LOG` wins over `--log-level`, which wins over `[logging] level`.
fn console_filter(cli_level: &str, cfg_level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cli_level.is_empty() {
            cfg_level.unwrap_or("info")
        } else {
            cli_level
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

fn rotation(name: Option<&str>) -> Rotation {
    match name {
        Some("daily") => Rotation::DAILY,
        Some("hourly") => Rotation::HOURLY,
        _ => Rotation::NEVER,
    }
}

pub fn init_tracing(json: bool, cli_level: &str, cfg: &torque_config::Logging) {
    let filter = console_filter(cli_level, cfg.level.as_deref());

    let file_layer = cfg.file.as_deref().map(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map_or_else(|| "torque_logger.log".into(), |n| n.to_string_lossy().into_owned());
        let appender = RollingFileAppender::new(rotation(cfg.rotation.as_deref()), dir, name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(EnvFilter::new("debug"))
    });

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(filter)
            .boxed()
    };

    let _ = Registry::default()
        .with(console)
        .with(file_layer)
        .try_init();
}

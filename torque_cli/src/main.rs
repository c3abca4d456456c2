mod cli;
mod error_fmt;
mod host;
mod inspect;
mod log;
mod logger;
mod rt;

use std::path::Path;

use clap::Parser;
use torque_config::Config;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{CliError, exit_code_for_error, format_error_json, humanize};
use crate::logger::RunOpts;

fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("read {}: {e}", path.display())))?;
    let cfg: Config = toml::from_str(&text).map_err(|e| CliError::Config(e.to_string()))?;
    cfg.validate()
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(cfg)
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    if let Commands::Inspect { file, rows } = &cli.cmd {
        log::init_tracing(cli.json, &cli.log_level, &torque_config::Logging::default());
        return inspect::inspect(file, *rows, cli.json);
    }

    let cfg = load_config(&cli.config)?;
    log::init_tracing(cli.json, &cli.log_level, &cfg.logging);
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run {
            rate,
            save_interval,
            autostart,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => logger::run_logger(
            &cfg,
            RunOpts {
                rate,
                save_interval,
                autostart,
                rt,
                rt_prio,
                rt_lock,
                rt_cpu,
            },
            cli.json,
        ),
        Commands::SelfCheck { samples } => logger::self_check(&cfg, samples, cli.json),
        Commands::Inspect { .. } => Ok(()),
    }
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let json = cli.json;
    let _ = JSON_MODE.set(json);

    if let Err(err) = real_main(cli) {
        tracing::error!(error = %err, "fatal");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}

//! `inspect`: summarise a recorded session log.

use std::path::Path;

use eyre::WrapErr;
use torque_config::load_session_log;

pub fn inspect(path: &Path, print_rows: bool, json: bool) -> eyre::Result<()> {
    let log = load_session_log(path).wrap_err_with(|| format!("inspect {}", path.display()))?;
    let range = log.torque_range();
    let rate = log.effective_rate_hz();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "file": path.display().to_string(),
                "sample_rate_hz": log.sample_rate_hz,
                "rows": log.rows.len(),
                "duration_ms": log.duration_ms(),
                "effective_rate_hz": rate,
                "torque_min_nm": range.map(|r| r.0),
                "torque_max_nm": range.map(|r| r.1),
            })
        );
        return Ok(());
    }

    println!("File: {}", path.display());
    println!("Sample rate: {} Hz", log.sample_rate_hz);
    println!("Rows: {}", log.rows.len());
    println!("Duration: {} ms", log.duration_ms());
    if let Some(r) = rate {
        println!("Effective rate: {r:.1} Hz");
    }
    if let Some((lo, hi)) = range {
        println!("Torque: {lo:.4} .. {hi:.4} N·m");
    }
    if print_rows {
        for row in &log.rows {
            println!("{},{:.4},{:.4}", row.elapsed_ms, row.voltage_mv, row.torque_nm);
        }
    }
    Ok(())
}

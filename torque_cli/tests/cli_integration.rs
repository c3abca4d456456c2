use assert_cmd::Command;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Minimal config for sim mode with a short calibration window
fn write_config(dir: &Path, extra_session: &str) -> PathBuf {
    let logs = dir.join("logs");
    let toml = format!(
        r#"
[session]
sample_rate_hz = 100
save_interval_s = 1
{extra_session}

[calibration]
samples = 2
window_ms = 10

[storage]
dir = '{}'
"#,
        logs.display()
    );
    let path = dir.join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn session_logs(dir: &Path) -> Vec<PathBuf> {
    let mut v: Vec<PathBuf> = fs::read_dir(dir.join("logs"))
        .map(|rd| rd.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default();
    v.retain(|p| p.extension().is_some_and(|e| e == "csv"));
    v.sort();
    v
}

fn bin(cfg: &Path) -> Command {
    let mut cmd = Command::cargo_bin("torque_logger").unwrap();
    cmd.arg("--config").arg(cfg).arg("--log-level").arg("warn");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["run", "--help"], 0, "autostart", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["bogus"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    let assert = bin(&cfg).args(args).assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn host_start_logs_a_session_to_disk() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");

    // 2 calibration reads + 30 samples
    bin(&cfg)
        .arg("run")
        .env("TORQUE_TEST_SIM_STOP_AFTER", "32")
        .write_stdin("start rate=100\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged 30 rows in 1 session(s)"));

    let files = session_logs(dir.path());
    assert_eq!(files.len(), 1, "{files:?}");
    let log = torque_config::load_session_log(&files[0]).unwrap();
    assert_eq!(log.sample_rate_hz, 100);
    assert_eq!(log.rows.len(), 30);
    assert!(log.rows.windows(2).all(|w| w[0].elapsed_ms < w[1].elapsed_ms));
}

#[rstest]
fn line_noise_on_host_link_does_not_end_the_run() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    bin(&cfg)
        .arg("run")
        .env("TORQUE_TEST_SIM_STOP_AFTER", "12")
        .write_stdin(&b"\xff\xfe\nstart rate=100\n"[..])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged 10 rows in 1 session(s)"));
    assert_eq!(session_logs(dir.path()).len(), 1);
}

#[rstest]
fn back_to_back_runs_keep_every_session_file() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    for stop_after in ["42", "7"] {
        bin(&cfg)
            .args(["run", "--autostart"])
            .env("TORQUE_TEST_SIM_STOP_AFTER", stop_after)
            .assert()
            .success();
    }
    let files = session_logs(dir.path());
    assert_eq!(files.len(), 2, "{files:?}");
    let mut rows: Vec<usize> = files
        .iter()
        .map(|f| torque_config::load_session_log(f).unwrap().rows.len())
        .collect();
    rows.sort();
    assert_eq!(rows, vec![5, 40]);
}

#[rstest]
fn autostart_uses_configured_rate_and_reports_json() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");

    let out = bin(&cfg)
        .arg("--json")
        .args(["run", "--autostart", "--rate", "50"])
        .env("TORQUE_TEST_SIM_STOP_AFTER", "12")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let line = stdout.lines().last().unwrap_or_default();
    let v: serde_json::Value = serde_json::from_str(line).expect("summary JSON");
    assert_eq!(v["sessions"], 1);
    assert_eq!(v["rows"], 10);
    assert_eq!(v["aborted"], 0);

    let log = torque_config::load_session_log(&session_logs(dir.path())[0]).unwrap();
    assert_eq!(log.sample_rate_hz, 50);
}

#[rstest]
fn out_of_range_start_is_rejected_without_a_file() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    bin(&cfg)
        .arg("run")
        .write_stdin("start rate=5\nstart rate=300\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 command(s) rejected"));
    assert!(session_logs(dir.path()).is_empty());
}

#[rstest]
fn calibration_failure_exits_with_code_3() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    bin(&cfg)
        .args(["run", "--autostart"])
        .env("TORQUE_TEST_SIM_FAIL", "1")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Zero calibration failed"));
    assert!(session_logs(dir.path()).is_empty());
}

#[rstest]
fn calibration_failure_json_error() {
    let dir = tempdir().unwrap();
    let cfg = write_config(dir.path(), "");
    let out = bin(&cfg)
        .args(["--json", "run", "--autostart"])
        .env("TORQUE_TEST_SIM_FAIL", "1")
        .assert()
        .code(3)
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8_lossy(&out);
    let line = stderr
        .lines()
        .find(|l| l.contains("\"reason\""))
        .unwrap_or_default();
    let v: serde_json::Value = serde_json::from_str(line).expect("error JSON");
    assert_eq!(v["reason"], "Calibration");
    assert_eq!(v["exit_code"], 3);
}

#[rstest]
#[case("sample_rate_hz = 5", "session.sample_rate_hz")]
#[case("max_consecutive_failures = 0", "max_consecutive_failures")]
fn invalid_config_exits_with_code_2(#[case] line: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, format!("[session]\n{line}\n")).unwrap();
    bin(&path)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(needle));
}

#[rstest]
fn missing_config_exits_with_code_2() {
    let dir = tempdir().unwrap();
    bin(&dir.path().join("nope.toml"))
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[rstest]
fn settings_store_supplies_default_rate() {
    let dir = tempdir().unwrap();
    let settings = dir.path().join("settings.csv");
    fs::write(&settings, "samplerate,20\nsaveinterval,abc\n").unwrap();
    let cfg = write_config(
        dir.path(),
        &format!("settings_file = '{}'", settings.display()),
    );
    bin(&cfg)
        .arg("run")
        .env("TORQUE_TEST_SIM_STOP_AFTER", "7")
        .write_stdin("start\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged 5 rows"));
    let log = torque_config::load_session_log(&session_logs(dir.path())[0]).unwrap();
    assert_eq!(log.sample_rate_hz, 20);
}

#[rstest]
fn inspect_summarises_a_log() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("s.csv");
    fs::write(
        &file,
        "SPS,100\nmicroSeconds,mV,NM\n0,0.1000,0.0300\n10,1.0000,0.3000\n20,-2.0000,-0.6000\n",
    )
    .unwrap();
    Command::cargo_bin("torque_logger")
        .unwrap()
        .arg("inspect")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows: 3"))
        .stdout(predicate::str::contains("Effective rate: 100.0 Hz"))
        .stdout(predicate::str::contains("-0.6000 .. 0.3000"));
}

#[rstest]
fn inspect_rejects_foreign_csv() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("x.csv");
    fs::write(&file, "a,b\n1,2\n").unwrap();
    Command::cargo_bin("torque_logger")
        .unwrap()
        .arg("inspect")
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("SPS"));
}

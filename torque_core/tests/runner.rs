mod common;

use std::sync::Arc;

use common::{FAST_CAL, MemStorage, SeqNamer, StopAfter};
use crossbeam_channel::unbounded;
use rstest::rstest;
use torque_core::{
    Command, RunSummary, SessionController, SessionState, StartRequest, StopFlag, run,
};
use torque_hardware::SimulatedAdc;
use torque_traits::clock::test_clock::TestClock;

/// Controller whose ADC raises `flag` after `reads` conversions.
fn controller(reads: u64, flag: Option<StopFlag>) -> (SessionController, MemStorage) {
    let session_stop = StopFlag::new();
    let storage = MemStorage::new();
    let adc = StopAfter {
        inner: SimulatedAdc::new(0),
        n: reads,
        seen: 0,
        flag: flag.unwrap_or_else(|| session_stop.clone()),
    };
    let c = SessionController::builder()
        .with_adc(adc)
        .with_storage(storage.clone())
        .with_namer(SeqNamer::default())
        .with_clock(Arc::new(TestClock::new()))
        .with_stop_flag(session_stop)
        .with_calibration(FAST_CAL)
        .build()
        .expect("build");
    (c, storage)
}

#[rstest]
fn session_runs_until_stop_then_exits_on_hangup() {
    // 4 calibration reads + 20 samples
    let (mut c, storage) = controller(24, None);
    let (tx, rx) = unbounded();
    tx.send(Command::Start(StartRequest::with_rate(100))).unwrap();
    drop(tx);

    let summary = run(&mut c, &rx, &StopFlag::new()).expect("run");
    assert_eq!(
        summary,
        RunSummary {
            sessions: 1,
            rows: 20,
            rejected: 0,
            aborted: 0
        }
    );
    assert_eq!(c.state(), SessionState::Idle);
    assert_eq!(storage.committed("session-1.csv").lines().count(), 22);
}

#[rstest]
fn start_while_logging_is_rejected_and_stop_is_honoured() {
    let (mut c, _storage) = controller(u64::MAX, None);
    let (tx, rx) = unbounded();
    tx.send(Command::Start(StartRequest::with_rate(100))).unwrap();
    tx.send(Command::Start(StartRequest::with_rate(200))).unwrap();
    tx.send(Command::Stop).unwrap();
    drop(tx);

    let summary = run(&mut c, &rx, &StopFlag::new()).unwrap();
    assert_eq!(summary.sessions, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.rows, 0);
    assert_eq!(c.config().sample_rate_hz(), 100);
}

#[rstest]
fn invalid_start_counts_as_rejected() {
    let (mut c, storage) = controller(u64::MAX, None);
    let (tx, rx) = unbounded();
    tx.send(Command::Start(StartRequest::with_rate(5))).unwrap();
    drop(tx);

    let summary = run(&mut c, &rx, &StopFlag::new()).unwrap();
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.sessions, 0);
    assert!(storage.ops().is_empty());
}

#[rstest]
fn shutdown_while_idle_returns_immediately() {
    let (mut c, _storage) = controller(u64::MAX, None);
    let (_tx, rx) = unbounded::<Command>();
    let shutdown = StopFlag::new();
    shutdown.raise();
    assert_eq!(run(&mut c, &rx, &shutdown).unwrap(), RunSummary::default());
}

#[rstest]
fn shutdown_while_logging_stops_the_session_first() {
    let shutdown = StopFlag::new();
    let (mut c, storage) = controller(4 + 10, Some(shutdown.clone()));
    let (tx, rx) = unbounded();
    tx.send(Command::Start(StartRequest::with_rate(100))).unwrap();

    let summary = run(&mut c, &rx, &shutdown).unwrap();
    assert_eq!(summary.sessions, 1);
    assert_eq!(summary.rows, 10);
    assert!(storage.0.lock().unwrap().open.is_none());
    drop(tx);
}

use std::sync::Arc;

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use torque_core::{LogRecord, SessionController, StartRequest, UnitConverter};
use torque_hardware::{NullStorage, SimulatedAdc};
use torque_traits::SessionNamer;
use torque_traits::clock::test_clock::TestClock;

struct BenchNamer;
impl SessionNamer for BenchNamer {
    fn next_name(&mut self) -> String {
        "bench.csv".into()
    }
}

fn bench_convert(c: &mut Criterion) {
    let conv = UnitConverter::new(0.007_812_5, 10.0, 3.0);
    c.bench_function("convert_raw_to_torque", |b| {
        let mut raw: i16 = -32768;
        b.iter(|| {
            raw = raw.wrapping_add(37);
            let mv = conv.to_voltage(black_box(raw), 0.25);
            black_box(conv.to_torque(mv))
        })
    });
}

fn bench_row_format(c: &mut Criterion) {
    let rec = LogRecord {
        elapsed_ms: 123_456,
        voltage_mv: -4.321,
        torque_nm: 1.2963,
    };
    c.bench_function("format_csv_row", |b| {
        let mut s = String::with_capacity(48);
        b.iter(|| {
            s.clear();
            black_box(&rec).write_csv_row(&mut s);
            black_box(s.len())
        })
    });
}

fn bench_step(c: &mut Criterion) {
    c.bench_function("controller_step_1000", |b| {
        b.iter_batched(
            || {
                let mut ctl = SessionController::builder()
                    .with_adc(SimulatedAdc::new(100).with_wave(500, 64))
                    .with_storage(NullStorage::new())
                    .with_namer(BenchNamer)
                    .with_clock(Arc::new(TestClock::new()))
                    .build()
                    .expect("build");
                ctl.start(StartRequest::with_rate(260)).expect("start");
                ctl
            },
            |mut ctl| {
                for _ in 0..1000 {
                    black_box(ctl.step());
                }
                ctl
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_convert, bench_row_format, bench_step);
criterion_main!(benches);

use chrono::NaiveDate;
use torque_hardware::TimestampNamer;
use torque_hardware::naming::file_stem_for;
use tempfile::tempdir;
use torque_traits::SessionNamer;

fn ts(h: u32, m: u32, s: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .expect("valid timestamp")
}

#[test]
fn colons_are_replaced() {
    let stem = file_stem_for(ts(14, 3, 27));
    assert_eq!(stem, "2026-10-19T14_03_27");
    assert!(!stem.contains(':'));
}

#[test]
fn names_are_unique_within_the_same_second() {
    let mut namer = TimestampNamer::new();
    assert_eq!(namer.name_at(ts(9, 0, 0)), "2026-10-19T09_00_00.csv");
    assert_eq!(namer.name_at(ts(9, 0, 0)), "2026-10-19T09_00_00-1.csv");
    assert_eq!(namer.name_at(ts(9, 0, 0)), "2026-10-19T09_00_00-2.csv");
    assert_eq!(namer.name_at(ts(9, 0, 1)), "2026-10-19T09_00_01.csv");
}

#[test]
fn wall_clock_names_end_in_csv() {
    let mut namer = TimestampNamer::new();
    let a = namer.next_name();
    let b = namer.next_name();
    assert!(a.ends_with(".csv") && b.ends_with(".csv"));
    assert_ne!(a, b);
}

#[test]
fn clock_stepping_back_never_repeats_a_name() {
    let mut namer = TimestampNamer::new();
    let a = namer.name_at(ts(9, 0, 0));
    let b = namer.name_at(ts(9, 0, 5));
    let again = namer.name_at(ts(9, 0, 0));
    assert_eq!(a, "2026-10-19T09_00_00.csv");
    assert_eq!(b, "2026-10-19T09_00_05.csv");
    assert_eq!(again, "2026-10-19T09_00_00-1.csv");
}

#[test]
fn namers_sharing_a_directory_skip_existing_files() {
    let dir = tempdir().unwrap();
    let mut first = TimestampNamer::in_dir(dir.path());
    let a = first.name_at(ts(13, 0, 18));
    std::fs::write(dir.path().join(&a), "SPS,100\n").unwrap();

    // A restarted process gets a fresh namer at the same timestamp.
    let mut second = TimestampNamer::in_dir(dir.path());
    let b = second.name_at(ts(13, 0, 18));
    assert_ne!(a, b);
    assert_eq!(b, "2026-10-19T13_00_18-1.csv");
}

#[test]
fn suffix_skips_every_taken_name() {
    let dir = tempdir().unwrap();
    for name in ["2026-10-19T08_00_00.csv", "2026-10-19T08_00_00-1.csv"] {
        std::fs::write(dir.path().join(name), "").unwrap();
    }
    let mut namer = TimestampNamer::in_dir(dir.path());
    assert_eq!(namer.name_at(ts(8, 0, 0)), "2026-10-19T08_00_00-2.csv");
}

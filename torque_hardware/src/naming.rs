//! Timestamp-based session file names.
use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{Local, NaiveDateTime};
use torque_traits::SessionNamer;

/// Name a session file after a wall-clock timestamp: `:` becomes `_` and the
/// name ends in `.csv`, e.g. `2026-10-19T14_03_27.csv`.
pub fn file_stem_for(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S").to_string().replace(':', "_")
}

/// Names sessions after the local real-time clock.
///
/// A name already handed out, or already present in the log directory, gets
/// a `-<n>` suffix. Session files are never reused, even across restarts or
/// when the clock steps back.
#[derive(Debug, Default)]
pub struct TimestampNamer {
    dir: Option<PathBuf>,
    issued: HashSet<String>,
}

impl TimestampNamer {
    /// Namer that only remembers its own names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Namer that also skips files already present under `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            issued: HashSet::new(),
        }
    }

    fn is_free(&self, name: &str) -> bool {
        !self.issued.contains(name) && self.dir.as_ref().is_none_or(|d| !d.join(name).exists())
    }

    /// Produce the name for a session starting at `ts`.
    pub fn name_at(&mut self, ts: NaiveDateTime) -> String {
        let stem = file_stem_for(ts);
        let mut name = format!("{stem}.csv");
        let mut n = 0u32;
        while !self.is_free(&name) {
            n += 1;
            name = format!("{stem}-{n}.csv");
        }
        if n > 0 {
            tracing::debug!(file = %name, "session name taken, using suffix");
        }
        self.issued.insert(name.clone());
        name
    }
}

impl SessionNamer for TimestampNamer {
    fn next_name(&mut self) -> String {
        self.name_at(Local::now().naive_local())
    }
}

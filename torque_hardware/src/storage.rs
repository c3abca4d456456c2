//! Session-log storage transports.
//!
//! `FsStorage` writes through a `BufWriter` so individual rows are not
//! synced; `close()` flushes and fsyncs. `NullStorage` discards everything and
//! is selected at runtime when storage is disabled.
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use torque_traits::{BoxError, Storage};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

const WRITE_BUF_BYTES: usize = 8 * 1024;

/// Files under a single log directory, one open at a time.
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
    file: Option<BufWriter<File>>,
}

impl FsStorage {
    /// Use `root` as the log directory, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, file: None })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(HwError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid log file name {name:?}"),
            )));
        }
        Ok(self.root.join(name))
    }

    fn close_inner(&mut self) -> Result<()> {
        if let Some(mut w) = self.file.take() {
            w.flush()?;
            let f = w.into_inner().map_err(|e| HwError::Io(e.into_error()))?;
            f.sync_all()?;
            debug!("log file closed");
        }
        Ok(())
    }
}

impl Storage for FsStorage {
    fn create_or_truncate(&mut self, name: &str) -> std::result::Result<(), BoxError> {
        self.close_inner()?;
        let path = self.path_for(name)?;
        let f = File::create(&path)?;
        self.file = Some(BufWriter::with_capacity(WRITE_BUF_BYTES, f));
        debug!(path = %path.display(), "log file created");
        Ok(())
    }

    fn open_append(&mut self, name: &str) -> std::result::Result<(), BoxError> {
        self.close_inner()?;
        let path = self.path_for(name)?;
        let f = OpenOptions::new().create(true).append(true).open(&path)?;
        self.file = Some(BufWriter::with_capacity(WRITE_BUF_BYTES, f));
        trace!(path = %path.display(), "log file reopened");
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> std::result::Result<(), BoxError> {
        let w = self.file.as_mut().ok_or(HwError::NotOpen)?;
        w.write_all(bytes).map_err(HwError::Io)?;
        Ok(())
    }

    fn close(&mut self) -> std::result::Result<(), BoxError> {
        Ok(self.close_inner()?)
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for FsStorage {
    fn drop(&mut self) {
        if let Err(e) = self.close_inner() {
            tracing::warn!(error = %e, "closing log file on drop failed");
        }
    }
}

/// Storage that accepts and drops every byte.
#[derive(Debug, Default)]
pub struct NullStorage {
    open: bool,
    discarded: u64,
}

impl NullStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes written and dropped so far.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

impl Storage for NullStorage {
    fn create_or_truncate(&mut self, _name: &str) -> std::result::Result<(), BoxError> {
        self.open = true;
        Ok(())
    }

    fn open_append(&mut self, _name: &str) -> std::result::Result<(), BoxError> {
        self.open = true;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> std::result::Result<(), BoxError> {
        if !self.open {
            return Err(Box::new(HwError::NotOpen));
        }
        self.discarded += bytes.len() as u64;
        Ok(())
    }

    fn close(&mut self) -> std::result::Result<(), BoxError> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

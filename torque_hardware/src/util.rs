use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `ready` until it reports true, or fail with `HwError::Timeout` once
/// `timeout` expires. Sleeps `poll_interval` between polls; errors from the
/// predicate are returned immediately.
pub fn wait_until_with_timeout(
    mut ready: impl FnMut() -> Result<bool>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !ready()? {
        if Instant::now() >= deadline {
            return Err(HwError::Timeout);
        }
        std::thread::sleep(poll_interval);
    }
    Ok(())
}

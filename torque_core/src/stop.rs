//! Stop request shared between interrupt context and the control loop.
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable stop request.
///
/// Raised from a GPIO edge callback, the Ctrl-C handler or a `stop` host
/// command; consumed by the control loop at the top of each iteration.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Safe to call from any thread or signal handler.
    #[inline]
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Consume a pending request, returning whether one was set.
    #[inline]
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

//! Cooperative cancellation.

use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

lazy_static! {
    static ref GLOBAL: CancelToken = CancelToken::new();
}

/// A shared flag asking running integrations to stop.
///
/// Integrators poll the token once per output interval. When they see a
/// request they clear it and stop, so a token can be reused for the next
/// call. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    /// A process-wide token, for hosts that wire an interrupt signal to a
    /// single flag. Every integration polling it is stopped by one request.
    pub fn global() -> &'static CancelToken {
        &GLOBAL
    }

    /// Requests cancellation. Safe to call from any thread.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns whether cancellation was requested, clearing the request.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }

    /// Clears any pending request.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

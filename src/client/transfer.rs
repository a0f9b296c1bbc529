//! Cooperative cancellation for package transfers

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared flag checked between transfer steps. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

/// How a transfer ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed { bytes: u64 },
    Cancelled,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Re-arms the flag before a new transfer
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

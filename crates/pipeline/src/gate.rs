//! Request admission control.
//!
//! At most one pipeline invocation runs at a time; a second caller is
//! turned away synchronously rather than queued. The gate is a two-state
//! machine (idle / processing) backed by an atomic compare-and-swap, and
//! the admission pass releases it on drop so every exit path — success,
//! error, panic unwind — returns the gate to idle.

use std::sync::atomic::{AtomicBool, Ordering};

/// The single-slot admission gate.
#[derive(Debug, Default)]
pub struct RequestGate {
    processing: AtomicBool,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim the processing slot. Returns `None` when another
    /// request is already in flight; the caller must reject, not wait.
    pub fn try_admit(&self) -> Option<GatePass<'_>> {
        self.processing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| GatePass { gate: self })
    }

    /// Whether a request currently holds the gate.
    pub fn is_busy(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }
}

/// Proof of admission. Holding it means the gate is yours; dropping it
/// releases the slot.
#[derive(Debug)]
pub struct GatePass<'a> {
    gate: &'a RequestGate,
}

impl Drop for GatePass<'_> {
    fn drop(&mut self) {
        self.gate.processing.store(false, Ordering::Release);
    }
}

//! Progress reporting and cancellation for long-running computations.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Channel between a long computation and whoever started it.
///
/// Computations call [`report_progress`](Self::report_progress) with the
/// completed fraction and poll [`is_cancelled`](Self::is_cancelled) between
/// batches of work.
pub trait ProgressIndicator: Send + Sync {
    /// Reports the completed fraction in `[0, 1]`.
    fn report_progress(&self, fraction: f32);

    /// Returns `true` once cancellation has been requested.
    fn is_cancelled(&self) -> bool;
}

/// Progress sink that ignores reports and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressIndicator for NoProgress {
    fn report_progress(&self, _fraction: f32) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Lock-free progress shared between a worker and the foreground.
#[derive(Debug, Default)]
pub struct AtomicProgress {
    fraction_bits: AtomicU32,
    cancelled: AtomicBool,
}

impl AtomicProgress {
    /// Creates a progress at zero, not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last reported fraction.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        f32::from_bits(self.fraction_bits.load(Ordering::Acquire))
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Clears progress and the cancellation flag.
    pub fn reset(&self) {
        self.fraction_bits.store(0.0_f32.to_bits(), Ordering::Release);
        self.cancelled.store(false, Ordering::Release);
    }
}

impl ProgressIndicator for AtomicProgress {
    fn report_progress(&self, fraction: f32) {
        let clamped = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
        self.fraction_bits.store(clamped.to_bits(), Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Progress that requests cancellation from inside its first report.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct CancelOnFirstReport {
    reports: std::sync::atomic::AtomicUsize,
    cancelled: AtomicBool,
}

#[cfg(test)]
impl CancelOnFirstReport {
    pub(crate) fn reports(&self) -> usize {
        self.reports.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl ProgressIndicator for CancelOnFirstReport {
    fn report_progress(&self, _fraction: f32) {
        self.reports.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

//! Running slow geometry computations on worker threads.

use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::error::{JobError, Result};
use crate::geometry::Geometry;
use crate::progress::AtomicProgress;
use crate::segmentation::{SdfParams, Segmentation, SegmentationResult};

/// Geometry shared between the foreground and background jobs.
pub type SharedGeometry = Arc<RwLock<Geometry>>;

/// Handle of a computation running on its own thread.
#[derive(Debug)]
pub struct BackgroundJob<T> {
    handle: JoinHandle<Result<T>>,
    progress: Arc<AtomicProgress>,
}

impl<T: Send + 'static> BackgroundJob<T> {
    fn spawn(name: &str, work: impl FnOnce(&AtomicProgress) -> Result<T> + Send + 'static) -> Self {
        let progress = Arc::new(AtomicProgress::new());
        let worker_progress = Arc::clone(&progress);
        debug!(job = name, "spawning background job");
        let handle = thread::spawn(move || work(&worker_progress));
        Self { handle, progress }
    }

    /// Last reported fraction of completed work.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress.fraction()
    }

    /// Progress shared with the worker.
    #[must_use]
    pub fn progress_handle(&self) -> Arc<AtomicProgress> {
        Arc::clone(&self.progress)
    }

    /// Asks the worker to stop at its next checkpoint.
    pub fn cancel(&self) {
        self.progress.cancel();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker and returns its result.
    ///
    /// # Errors
    ///
    /// - The worker's own error, [`JobError::Cancelled`] after [`cancel`](Self::cancel).
    /// - [`JobError::WorkerPanicked`] if the worker thread panicked.
    pub fn join(self) -> Result<T> {
        self.handle.join().map_err(|_| JobError::WorkerPanicked)?
    }
}

/// Computes and stores SDF values while holding the write lock.
///
/// Colors are never touched, so a cancelled job leaves the geometry as it was.
#[must_use]
pub fn spawn_sdf(shared: &SharedGeometry, params: SdfParams) -> BackgroundJob<()> {
    let shared = Arc::clone(shared);
    BackgroundJob::spawn("sdf", move |progress| {
        let mut geometry = shared.write().map_err(|_| JobError::LockPoisoned)?;
        geometry.compute_sdf(&params, progress)
    })
}

/// Segments the geometry, computing SDF values first if they are missing.
///
/// The result is returned rather than applied so the caller decides when to
/// execute its paint command.
#[must_use]
pub fn spawn_segmentation(
    shared: &SharedGeometry,
    params: SdfParams,
    segmentation: Segmentation,
) -> BackgroundJob<SegmentationResult> {
    let shared = Arc::clone(shared);
    BackgroundJob::spawn("segmentation", move |progress| {
        let mut geometry = shared.write().map_err(|_| JobError::LockPoisoned)?;
        if !geometry.has_sdf() {
            geometry.compute_sdf(&params, progress)?;
        }
        segmentation.execute_with_progress(&geometry, progress)
    })
}

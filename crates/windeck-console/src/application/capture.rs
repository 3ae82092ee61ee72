//! The snapshot poll loop.
//!
//! Given a target window id and capture settings, the loop performs one
//! fetch-and-present tick immediately, then repeats on a fixed-period timer.
//! The period and target are captured at loop start; changing either means
//! stopping the loop and starting a new one.
//!
//! # Failure policy
//!
//! A failed tick — network error, non-success status, present failure — is
//! logged at debug level and skipped.  The loop never halts on a miss and
//! never surfaces an error to the operator: transient frame misses are an
//! expected part of monitoring, and the retry is simply the next tick.
//!
//! # Cancellation
//!
//! Cancellation is cooperative.  Every started loop gets its own stop flag;
//! [`CaptureLoop::stop`] sets it and forgets the task.  The task checks the
//! flag at tick entry and again after each fetch completes, so an in-flight
//! fetch is never aborted — its result is discarded once the flag is
//! observed.  Because each run owns a distinct flag, a loop that was replaced
//! by a restart discards its stale results no matter how slow its last fetch
//! was.  Ticks are awaited sequentially inside one task, so two ticks of the
//! same loop can never run concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;
use windeck_core::CaptureSettings;

use crate::application::api::SnapshotSource;

/// Where fetched frames go.
///
/// Implemented by the frame surface in the infrastructure layer and by
/// recording fakes in tests.  Presentation failures are the sink's own
/// concern — the loop has already committed to skipping bad ticks silently.
pub trait FrameSink: Send + Sync + 'static {
    fn present(&self, frame: Vec<u8>);
}

/// Handle to the (at most one) running poll loop of a frame surface.
///
/// Only one loop may be active per surface: [`CaptureLoop::start`] always
/// stops the previous run before spawning the next, so two timers can never
/// target the same surface with different configurations.
pub struct CaptureLoop {
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    stop: Arc<AtomicBool>,
    win_id: i64,
}

impl CaptureLoop {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// `true` while a loop task is scheduled.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The window id the running loop targets, if any.
    pub fn target(&self) -> Option<i64> {
        self.active.as_ref().map(|a| a.win_id)
    }

    /// Stops any previous run and spawns a new loop task for `win_id`.
    ///
    /// `settings` is copied here — later edits to the operator's settings do
    /// not reschedule an already-started timer.
    pub fn start<S, K>(&mut self, source: Arc<S>, sink: Arc<K>, win_id: i64, settings: CaptureSettings)
    where
        S: SnapshotSource,
        K: FrameSink,
    {
        self.stop();

        let stop = Arc::new(AtomicBool::new(false));
        tokio::spawn(run_capture(source, sink, win_id, settings, Arc::clone(&stop)));
        self.active = Some(ActiveCapture { stop, win_id });
    }

    /// Signals the running loop to stop.
    ///
    /// Returns immediately; the task exits at its next flag check.  In-flight
    /// fetches run to completion and their results are discarded.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.stop.store(true, Ordering::Relaxed);
            debug!(win_id = active.win_id, "capture loop stop requested");
        }
    }
}

impl Default for CaptureLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The loop body: immediate first tick, then one tick per period.
async fn run_capture<S, K>(
    source: Arc<S>,
    sink: Arc<K>,
    win_id: i64,
    settings: CaptureSettings,
    stop: Arc<AtomicBool>,
) where
    S: SnapshotSource,
    K: FrameSink,
{
    // The first `tick()` on a fresh interval completes immediately, which
    // gives the operator a frame right away instead of after one period.
    let mut ticker = tokio::time::interval(settings.interval());

    loop {
        ticker.tick().await;
        if stop.load(Ordering::Relaxed) {
            break;
        }

        match source
            .fetch_snapshot(win_id, settings.quality, settings.scale)
            .await
        {
            Ok(Some(frame)) => {
                // The fetch may have straddled a stop/retarget; a stale frame
                // must not reach the surface.
                if stop.load(Ordering::Relaxed) {
                    break;
                }
                sink.present(frame);
            }
            Ok(None) => debug!(win_id, "no frame this tick"),
            Err(e) => debug!(win_id, "tick skipped: {e}"),
        }
    }

    debug!(win_id, "capture loop stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Frame scheduling for layout sessions.
//!
//! The step function never decides when it runs. A [`FrameScheduler`] takes a
//! boxed step closure and calls it once per tick until the closure reports
//! [`FrameControl::Finished`] or the returned [`CancelHandle`] is cancelled.
//!
//! - [`TokioFrameScheduler`] — one step per `tokio::time::interval` tick in a
//!   spawned task (must be called inside a tokio runtime)
//! - [`ImmediateScheduler`] — steps back to back on the calling thread
//!
//! [`start_layout`] wires a [`LayoutSession`] to a scheduler and a
//! [`PositionSink`], and hands back a [`DragHandle`] for out-of-band position
//! overrides applied between steps.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::models::Position;
use super::session::{FrameControl, LayoutSession, PositionSink};

/// One scheduled unit of work, called once per tick.
pub type StepFn = Box<dyn FnMut() -> FrameControl + Send + 'static>;

/// Injected timing primitive.
pub trait FrameScheduler {
    /// Start calling `step` once per tick.
    fn schedule(&self, step: StepFn) -> CancelHandle;
}

// ============================================================================
// Cancellation
// ============================================================================

/// Cooperative stop signal for a scheduled run.
///
/// Cancelling only stops further ticks; the step in flight (if any) always
/// completes, so the node buffer is never left half-updated.
#[derive(Debug)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl CancelHandle {
    fn new(cancelled: Arc<AtomicBool>, task: Option<JoinHandle<()>>) -> Self {
        Self { cancelled, task }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the scheduler has stopped calling the step function.
    pub fn is_done(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Wait until the scheduler stops (finished or cancelled).
    pub async fn join(self) {
        if let Some(task) = self.task {
            if let Err(e) = task.await {
                warn!("Layout task failed: {}", e);
            }
        }
    }
}

// ============================================================================
// Schedulers
// ============================================================================

/// Drives steps from a tokio interval ticker.
#[derive(Debug, Clone, Copy)]
pub struct TokioFrameScheduler {
    period: Duration,
}

impl TokioFrameScheduler {
    /// `period` is clamped to at least 1 ms.
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameScheduler for TokioFrameScheduler {
    fn schedule(&self, mut step: StepFn) -> CancelHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Acquire) {
                    debug!("Layout run cancelled");
                    break;
                }
                if step() == FrameControl::Finished {
                    break;
                }
            }
        });

        CancelHandle::new(cancelled, Some(task))
    }
}

/// Runs every step synchronously inside `schedule`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl FrameScheduler for ImmediateScheduler {
    fn schedule(&self, mut step: StepFn) -> CancelHandle {
        while step() == FrameControl::Continue {}
        CancelHandle::new(Arc::new(AtomicBool::new(false)), None)
    }
}

// ============================================================================
// Layout runs
// ============================================================================

/// Out-of-band position write for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragOverride {
    pub index: usize,
    pub position: Position,
}

/// Sends drag overrides into a running layout.
#[derive(Debug, Clone)]
pub struct DragHandle {
    tx: mpsc::UnboundedSender<DragOverride>,
}

impl DragHandle {
    /// Queue a position override for the next step.
    /// Returns `false` once the run has ended.
    pub fn drag(&self, index: usize, position: Position) -> bool {
        self.tx.send(DragOverride { index, position }).is_ok()
    }
}

/// Handles to a layout started with [`start_layout`].
#[derive(Debug)]
pub struct LayoutRun {
    pub cancel: CancelHandle,
    pub drag: DragHandle,
}

impl LayoutRun {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the run to finish or stop after cancellation.
    pub async fn finished(self) {
        self.cancel.join().await;
    }
}

/// Hand a session to `scheduler`, publishing snapshots into `sink`.
///
/// The session is moved into the step closure; the final positions arrive
/// through the sink as the snapshot with `finished == true`.
pub fn start_layout<S, P>(mut session: LayoutSession, scheduler: &S, mut sink: P) -> LayoutRun
where
    S: FrameScheduler + ?Sized,
    P: PositionSink + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<DragOverride>();

    info!(
        "Starting layout: {} nodes, {} edges, {} frames",
        session.nodes().len(),
        session.edges().len(),
        session.total_frames()
    );

    let cancel = scheduler.schedule(Box::new(move || {
        while let Ok(DragOverride { index, position }) = rx.try_recv() {
            if let Err(e) = session.set_position(index, position) {
                warn!("Ignoring drag override: {}", e);
            }
        }
        session.advance(&mut sink)
    }));

    LayoutRun {
        cancel,
        drag: DragHandle { tx },
    }
}

// ============================================================================
// Tests
// ============================================================================

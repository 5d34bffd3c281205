//! Runtime — background ticking and latest-frame handoff to a renderer.
//!
//! DESIGN
//! ======
//! `spawn_tick_task` drives `WhiteboardSession::tick` on a tokio interval
//! (missed ticks skipped) against a session shared behind one mutex.
//! Flushes land in a `FramePublisher`, a single-slot handoff built on a
//! tokio `watch` channel: each flush replaces the slot, nothing queues.
//!
//! EDGE CASES
//! ==========
//! A slow renderer can miss frames. Each snapshot carries a generation
//! number; a subscriber that sees a gap reports the frame as `Full` since
//! the partial rectangles it skipped are gone.

#[cfg(test)]
#[path = "runtime_test.rs"]
mod tests;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::canvas::{Canvas, DisplayTarget, FlushRegion};
use crate::session::WhiteboardSession;

/// A session shared between the tick task and stroke producers.
pub type SharedSession = Arc<Mutex<WhiteboardSession>>;

#[must_use]
pub fn shared(session: WhiteboardSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

// =============================================================================
// FRAME HANDOFF
// =============================================================================

/// One published flush.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// Increments by one per flush.
    pub generation: u64,
    pub region: FlushRegion,
    pub canvas: Arc<Canvas>,
}

/// Display target that publishes each flush into a single-slot channel.
pub struct FramePublisher {
    tx: watch::Sender<Option<FrameSnapshot>>,
    generation: u64,
}

impl FramePublisher {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx, generation: 0 }
    }

    #[must_use]
    pub fn subscribe(&self) -> FrameSubscriber {
        FrameSubscriber { rx: self.tx.subscribe(), last_seen: 0 }
    }

    /// Flushes published so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for FramePublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTarget for FramePublisher {
    fn upload(&mut self, region: FlushRegion, canvas: &Canvas) {
        self.generation += 1;
        let snapshot = FrameSnapshot { generation: self.generation, region, canvas: Arc::new(canvas.clone()) };
        self.tx.send_modify(|slot| *slot = Some(snapshot));
    }
}

/// Receiving end of a `FramePublisher`.
pub struct FrameSubscriber {
    rx: watch::Receiver<Option<FrameSnapshot>>,
    last_seen: u64,
}

impl FrameSubscriber {
    /// Wait for a frame newer than the last one returned. `None` once the
    /// publisher is gone.
    pub async fn next(&mut self) -> Option<FrameSnapshot> {
        loop {
            if self.rx.changed().await.is_err() {
                return None;
            }
            let latest = self.rx.borrow_and_update().clone();
            if let Some(frame) = latest {
                return Some(self.observe(frame));
            }
        }
    }

    /// The newest frame if one arrived since the last call.
    pub fn try_next(&mut self) -> Option<FrameSnapshot> {
        if !matches!(self.rx.has_changed(), Ok(true)) {
            return None;
        }
        let latest = self.rx.borrow_and_update().clone();
        latest.map(|frame| self.observe(frame))
    }

    fn observe(&mut self, mut frame: FrameSnapshot) -> FrameSnapshot {
        if frame.generation > self.last_seen + 1 {
            frame.region = FlushRegion::Full;
        }
        self.last_seen = frame.generation;
        frame
    }
}

// =============================================================================
// TICK TASK
// =============================================================================

/// Shortest tick period; a zero period is raised to this.
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Tick `session` every `period`, publishing flushes through `publisher`.
/// Runs until the handle is aborted.
pub fn spawn_tick_task(session: SharedSession, mut publisher: FramePublisher, period: Duration) -> JoinHandle<()> {
    let period = period.max(MIN_TICK_PERIOD);
    let period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX);
    info!(period_ms, "whiteboard tick task started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let report = {
                let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
                session.tick(&mut publisher)
            };
            if report.drained > 0 || report.flushed.is_some() {
                debug!(
                    drained = report.drained,
                    remaining = report.remaining,
                    flushed = ?report.flushed,
                    generation = publisher.generation(),
                    "tick"
                );
            }
        }
    })
}

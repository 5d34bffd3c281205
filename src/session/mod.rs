//! Whiteboard session — one replica of the shared canvas.
//!
//! ARCHITECTURE
//! ============
//! A session owns the canvas surface, the erase scheduler, and the action
//! log. Strokes enter through `submit_draw` / `submit_erase` (or `submit`),
//! are rasterized immediately or queued, and are logged under a
//! session-wide sequence number at the moment they touch pixels. `tick`
//! drains one erase batch and flushes to the display when due.
//!
//! LIFECYCLE
//! =========
//! `create` validates the config and allocates the canvas; there is no
//! half-initialized session to send strokes to. `destroy` consumes the
//! session and returns its history. `from_history` builds a late joiner's
//! replica from an exported history.
//!
//! | Module | Role |
//! |--------|------|
//! | [`log`] | Action log, history records, JSON-lines persistence |
//! | [`scheduler`] | Pending erase queue and admission policy |

pub mod log;
pub mod scheduler;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::canvas::{Canvas, CanvasSurface, DisplayTarget, FlushRegion};
use crate::config::{ConfigError, WhiteboardConfig};
use crate::event::{DrawEvent, EraseEvent, Event};
use crate::frame::ErrorCode;

pub use log::{ActionLog, History, LogError, Logged, Record};
pub use scheduler::{Admission, BatchScheduler};

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("history is {found_width}x{found_height} but the session is {width}x{height}")]
    DimensionMismatch { width: u32, height: u32, found_width: u32, found_height: u32 },
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(err) => err.error_code(),
            Self::DimensionMismatch { .. } => "E_HISTORY_DIMENSIONS",
        }
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Queued erases applied this tick.
    pub drained: usize,
    /// Erases still waiting.
    pub remaining: usize,
    /// Region uploaded to the display, if a flush happened.
    pub flushed: Option<FlushRegion>,
}

#[derive(Debug)]
pub struct WhiteboardSession {
    id: Uuid,
    config: WhiteboardConfig,
    surface: CanvasSurface,
    scheduler: BatchScheduler,
    log: ActionLog,
    next_seq: u64,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

impl WhiteboardSession {
    /// Validate `config` and allocate a blank canvas.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the config is invalid.
    pub fn create(config: WhiteboardConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let surface = CanvasSurface::initialize(config.width, config.height, config.background)
            .with_double_buffering(config.double_buffering)
            .with_buckets(config.eraser_buckets)
            .with_partial_ratio(config.partial_flush_ratio);
        let scheduler = BatchScheduler::new(config.large_eraser_threshold, config.max_batch_size, config.queue_capacity);
        let session = Self {
            id: Uuid::new_v4(),
            config,
            surface,
            scheduler,
            log: ActionLog::new(),
            next_seq: 0,
        };
        info!(
            session_id = %session.id,
            width = config.width,
            height = config.height,
            double_buffering = config.double_buffering,
            "whiteboard session created"
        );
        Ok(session)
    }

    /// Rebuild a replica from `history`. Applied strokes are rasterized in
    /// history order; erases the source still had queued go into this
    /// replica's queue, behind nothing, in the same order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the config is invalid or the history was
    /// recorded on a canvas of different dimensions.
    pub fn from_history(config: WhiteboardConfig, history: &History) -> Result<Self, SessionError> {
        if (history.width, history.height) != (config.width, config.height) {
            return Err(SessionError::DimensionMismatch {
                width: config.width,
                height: config.height,
                found_width: history.width,
                found_height: history.height,
            });
        }
        let mut config = config;
        config.background = history.background;
        let mut session = Self::create(config)?;
        for event in history.events() {
            session.apply(event);
        }
        for entry in &history.pending {
            session.enqueue_erase(entry.event);
        }
        info!(
            session_id = %session.id,
            strokes = history.entries.len(),
            pending = history.pending.len(),
            "whiteboard session replayed history"
        );
        Ok(session)
    }

    /// Tear the session down and hand back its history.
    #[must_use]
    pub fn destroy(self) -> History {
        let history = self.history();
        info!(
            session_id = %self.id,
            strokes = history.entries.len(),
            pending = self.scheduler.len(),
            "whiteboard session destroyed"
        );
        history
    }
}

// =============================================================================
// SUBMISSION
// =============================================================================

impl WhiteboardSession {
    /// Rasterize a pen stroke. Draws are never queued.
    pub fn submit_draw(&mut self, event: DrawEvent) -> Admission {
        self.apply_draw(event);
        Admission::Applied
    }

    /// Rasterize an eraser stroke now, or queue it behind larger ones.
    pub fn submit_erase(&mut self, event: EraseEvent) -> Admission {
        if !self.scheduler.should_queue(&event) {
            self.apply_erase(event);
            return Admission::Applied;
        }
        self.enqueue_erase(event)
    }

    fn enqueue_erase(&mut self, event: EraseEvent) -> Admission {
        let overflow = self.scheduler.enqueue(event);
        if overflow.is_empty() {
            return Admission::Queued;
        }
        let drained = overflow.len();
        self.apply_erase_batch(&overflow);
        warn!(
            session_id = %self.id,
            drained,
            capacity = self.scheduler.capacity(),
            "erase queue full; drained oldest batch on admission"
        );
        Admission::Backpressured { drained }
    }

    pub fn submit(&mut self, event: Event) -> Admission {
        match event {
            Event::Draw(draw) => self.submit_draw(draw),
            Event::Erase(erase) => self.submit_erase(erase),
        }
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::Draw(draw) => self.apply_draw(draw),
            Event::Erase(erase) => self.apply_erase(erase),
        }
    }

    fn apply_draw(&mut self, event: DrawEvent) {
        self.surface.apply_draw(&event);
        let seq = self.take_seq();
        self.log.append_draw(seq, event);
    }

    fn apply_erase(&mut self, event: EraseEvent) {
        self.surface.apply_erase(&event);
        let seq = self.take_seq();
        self.log.append_erase(seq, event);
    }

    fn apply_erase_batch(&mut self, batch: &[EraseEvent]) {
        self.surface.apply_erase_batch(batch);
        for event in batch {
            let seq = self.take_seq();
            self.log.append_erase(seq, *event);
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

// =============================================================================
// TICK
// =============================================================================

impl WhiteboardSession {
    /// Drain one erase batch, then flush to `target` if a flush is due at `now`.
    pub fn tick_at(&mut self, now: Instant, target: &mut dyn DisplayTarget) -> TickReport {
        let batch = self.scheduler.drain_batch();
        let drained = batch.len();
        if drained > 0 {
            self.apply_erase_batch(&batch);
        }
        let remaining = self.scheduler.len();
        if remaining > 0 {
            self.surface.mark_pending();
        }
        if drained > 0 {
            debug!(session_id = %self.id, drained, remaining, "erase batch drained");
        }

        let flushed = if self.surface.should_flush_at(now, self.config.update_interval) {
            Some(self.surface.flush_at(now, target))
        } else {
            None
        };
        TickReport { drained, remaining, flushed }
    }

    pub fn tick(&mut self, target: &mut dyn DisplayTarget) -> TickReport {
        self.tick_at(Instant::now(), target)
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl WhiteboardSession {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn config(&self) -> &WhiteboardConfig {
        &self.config
    }

    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        self.surface.canvas()
    }

    #[must_use]
    pub fn surface(&self) -> &CanvasSurface {
        &self.surface
    }

    #[must_use]
    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Erases waiting in the queue.
    #[must_use]
    pub fn pending_erases(&self) -> usize {
        self.scheduler.len()
    }

    /// Applied strokes in order, plus still-queued erases numbered after them.
    #[must_use]
    pub fn history(&self) -> History {
        let mut history = History::new(self.config.width, self.config.height, self.config.background);
        history.entries = self.log.merged().collect();
        let pending = self.scheduler.pending().zip(self.next_seq..);
        history.pending = pending.map(|(event, seq)| Logged { seq, event: *event }).collect();
        history
    }
}

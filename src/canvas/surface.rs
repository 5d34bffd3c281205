//! Canvas surface — the authoritative pixel buffer plus its flush bookkeeping.
//!
//! DESIGN
//! ======
//! Every mutation goes through the rasterizer and widens the dirty region.
//! A flush hands the display target either the clamped dirty rectangle or the
//! whole buffer, then resets the region. Pixels persist across flushes.
//!
//! With double buffering enabled a same-sized shadow buffer exists. Batched
//! erases are rasterized into the shadow and the two buffers are swapped when
//! the batch completes, so a reader never observes a half-applied batch. The
//! shadow is brought up to date lazily: `shadow_stale` records every rectangle
//! written to the live buffer since the last sync and only that rectangle is
//! copied before the next batch.
//!
//! FLUSH TIMING
//! ============
//! `should_flush_at` is true only when a mutation is pending AND at least one
//! update interval has elapsed since the previous flush. The first flush is
//! never delayed.

#[cfg(test)]
#[path = "surface_test.rs"]
mod tests;

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::canvas::dirty::{DirtyRegion, Rect};
use crate::canvas::pattern::{EraserBuckets, PatternCache};
use crate::canvas::pixels::{Canvas, Rgba};
use crate::canvas::raster;
use crate::consts::DEFAULT_PARTIAL_FLUSH_RATIO;
use crate::event::{DrawEvent, EraseEvent};

// =============================================================================
// TYPES
// =============================================================================

/// What a flush uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FlushRegion {
    /// Only this rectangle changed.
    Partial(Rect),
    /// Upload the whole buffer.
    Full,
}

impl FlushRegion {
    /// The region as a rectangle on a `width × height` canvas.
    #[must_use]
    pub fn rect(&self, width: u32, height: u32) -> Rect {
        match self {
            FlushRegion::Partial(rect) => *rect,
            FlushRegion::Full => Rect::full(width, height),
        }
    }
}

/// Receiver of flushed pixels (a texture, a framebuffer, a test recorder).
pub trait DisplayTarget {
    fn upload(&mut self, region: FlushRegion, canvas: &Canvas);
}

/// Owned pixel buffer with dirty tracking and optional double buffering.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    pixels: Canvas,
    shadow: Option<Canvas>,
    shadow_stale: DirtyRegion,
    background: Rgba,
    patterns: PatternCache,
    dirty: DirtyRegion,
    pending: bool,
    last_flush: Option<Instant>,
    partial_ratio: f32,
}

// =============================================================================
// CONSTRUCTION
// =============================================================================

impl CanvasSurface {
    /// Allocate a `width × height` buffer filled with `background`.
    #[must_use]
    pub fn initialize(width: u32, height: u32, background: Rgba) -> Self {
        Self {
            pixels: Canvas::new(width, height, background),
            shadow: None,
            shadow_stale: DirtyRegion::new(),
            background,
            patterns: PatternCache::default(),
            dirty: DirtyRegion::new(),
            pending: false,
            last_flush: None,
            partial_ratio: DEFAULT_PARTIAL_FLUSH_RATIO,
        }
    }

    /// Enable or disable the shadow buffer. Enabling mirrors the current pixels.
    #[must_use]
    pub fn with_double_buffering(mut self, enabled: bool) -> Self {
        self.shadow = enabled.then(|| self.pixels.clone());
        self.shadow_stale.reset();
        self
    }

    #[must_use]
    pub fn with_buckets(mut self, buckets: EraserBuckets) -> Self {
        self.patterns = PatternCache::new(buckets);
        self
    }

    /// Fraction of the canvas area below which a flush is partial.
    #[must_use]
    pub fn with_partial_ratio(mut self, ratio: f32) -> Self {
        self.partial_ratio = ratio;
        self
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl CanvasSurface {
    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.pixels
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    #[must_use]
    pub fn background(&self) -> Rgba {
        self.background
    }

    #[must_use]
    pub fn dirty(&self) -> &DirtyRegion {
        &self.dirty
    }

    #[must_use]
    pub fn is_double_buffered(&self) -> bool {
        self.shadow.is_some()
    }

    /// Whether a mutation is waiting for the next flush.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    #[must_use]
    pub fn buckets(&self) -> EraserBuckets {
        self.patterns.buckets()
    }
}

// =============================================================================
// MUTATION
// =============================================================================

impl CanvasSurface {
    /// Rasterize a pen stroke into the live buffer. Returns stamps applied.
    pub fn apply_draw(&mut self, event: &DrawEvent) -> usize {
        let mut touched = DirtyRegion::new();
        let applied = raster::draw_line(&mut self.pixels, &mut touched, event);
        self.record(&touched);
        applied
    }

    /// Rasterize one eraser stroke into the live buffer. Returns disks applied.
    pub fn apply_erase(&mut self, event: &EraseEvent) -> usize {
        let mut touched = DirtyRegion::new();
        let applied = raster::erase_stroke(&mut self.pixels, &mut touched, &mut self.patterns, event, self.background);
        self.record(&touched);
        applied
    }

    /// Apply a batch of erases as one unit.
    ///
    /// With a shadow buffer the batch is rasterized off to the side and
    /// swapped in at the end. Without one it is applied in place.
    pub fn apply_erase_batch(&mut self, events: &[EraseEvent]) -> usize {
        if events.is_empty() {
            return 0;
        }
        let Some(mut scratch) = self.shadow.take() else {
            return events.iter().map(|event| self.apply_erase(event)).sum();
        };

        if let Some(rect) = self.shadow_stale.clamped(scratch.width(), scratch.height()) {
            let (x0, y0, x1, y1) = unsigned_rect(rect);
            scratch.copy_rect_from(&self.pixels, x0, y0, x1, y1);
        }

        let mut touched = DirtyRegion::new();
        let mut applied = 0;
        for event in events {
            applied += raster::erase_stroke(&mut scratch, &mut touched, &mut self.patterns, event, self.background);
        }

        std::mem::swap(&mut self.pixels, &mut scratch);
        self.shadow = Some(scratch);
        // The old live buffer is now the shadow and misses exactly this batch.
        self.shadow_stale = touched;
        self.dirty.merge(&touched);
        if touched.is_valid() {
            self.pending = true;
        }
        debug!(events = events.len(), applied, "surface: erase batch swapped in");
        applied
    }

    /// Force a flush on the next eligible tick even if no pixel changed.
    pub fn mark_pending(&mut self) {
        self.pending = true;
    }

    fn record(&mut self, touched: &DirtyRegion) {
        if !touched.is_valid() {
            return;
        }
        self.dirty.merge(touched);
        if self.shadow.is_some() {
            self.shadow_stale.merge(touched);
        }
        self.pending = true;
    }
}

fn unsigned_rect(rect: Rect) -> (u32, u32, u32, u32) {
    // Clamped rects are non-negative.
    (
        rect.min_x.unsigned_abs(),
        rect.min_y.unsigned_abs(),
        rect.max_x.unsigned_abs(),
        rect.max_y.unsigned_abs(),
    )
}

// =============================================================================
// FLUSH
// =============================================================================

impl CanvasSurface {
    /// Whether a flush is due at `now` given the minimum `interval`.
    #[must_use]
    pub fn should_flush_at(&self, now: Instant, interval: Duration) -> bool {
        if !self.pending {
            return false;
        }
        match self.last_flush {
            Some(last) => now.saturating_duration_since(last) >= interval,
            None => true,
        }
    }

    /// Region the next flush would upload.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn flush_region(&self) -> FlushRegion {
        let Some(rect) = self.dirty.clamped(self.width(), self.height()) else {
            return FlushRegion::Full;
        };
        let total = self.pixels.area() as f64;
        if (rect.area() as f64) < total * f64::from(self.partial_ratio) {
            FlushRegion::Partial(rect)
        } else {
            FlushRegion::Full
        }
    }

    /// Upload to `target` and reset the dirty region, stamping the flush time.
    pub fn flush_at(&mut self, now: Instant, target: &mut dyn DisplayTarget) -> FlushRegion {
        let region = self.flush_region();
        target.upload(region, &self.pixels);
        self.dirty.reset();
        self.pending = false;
        self.last_flush = Some(now);
        debug!(?region, "surface: flushed");
        region
    }

    /// Upload to `target` now.
    pub fn flush(&mut self, target: &mut dyn DisplayTarget) -> FlushRegion {
        self.flush_at(Instant::now(), target)
    }
}

//! Dirty-region tracking between flushes.
//!
//! DESIGN
//! ======
//! A single half-open bounding box `[min, max)` accumulates every stamp
//! footprint since the last flush. It only grows; `reset` is the only way to
//! shrink it. Consumers always read it through `clamped`, which intersects
//! with the canvas so a blit never addresses pixels outside the buffer.

#[cfg(test)]
#[path = "dirty_test.rs"]
mod tests;

use serde::{Deserialize, Serialize};

/// Half-open axis-aligned rectangle `[min_x, max_x) × [min_y, max_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Rectangle covering the whole `width × height` canvas.
    #[must_use]
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, saturate(width), saturate(height))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        u32::try_from(i64::from(self.max_x) - i64::from(self.min_x)).unwrap_or(0)
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        u32::try_from(i64::from(self.max_y) - i64::from(self.min_y)).unwrap_or(0)
    }

    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    #[must_use]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Smallest rectangle containing both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Intersect with the `width × height` canvas. `None` if nothing remains.
    #[must_use]
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Rect> {
        let clamped = Rect::new(
            self.min_x.max(0),
            self.min_y.max(0),
            self.max_x.min(saturate(width)),
            self.max_y.min(saturate(height)),
        );
        if clamped.is_empty() { None } else { Some(clamped) }
    }
}

fn saturate(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Accumulated bounding box of pixels touched since the last flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyRegion {
    bounds: Option<Rect>,
}

impl DirtyRegion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything has been recorded since the last reset.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.bounds.is_some()
    }

    /// Widen to cover `footprint`. The first footprint initializes the box.
    pub fn include(&mut self, footprint: Rect) {
        if footprint.is_empty() {
            return;
        }
        self.bounds = Some(match self.bounds {
            Some(current) => current.union(&footprint),
            None => footprint,
        });
    }

    /// Merge another tracker into this one.
    pub fn merge(&mut self, other: &DirtyRegion) {
        if let Some(rect) = other.bounds {
            self.include(rect);
        }
    }

    /// Raw accumulated bounds, possibly extending past the canvas.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Bounds intersected with the canvas.
    #[must_use]
    pub fn clamped(&self, width: u32, height: u32) -> Option<Rect> {
        self.bounds.and_then(|rect| rect.clamp_to(width, height))
    }

    /// Invalidate after a flush.
    pub fn reset(&mut self) {
        self.bounds = None;
    }
}

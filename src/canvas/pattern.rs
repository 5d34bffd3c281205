//! Precomputed filled-disk offsets for the eraser.
//!
//! DESIGN
//! ======
//! Eraser diameters are quantized to a small set of buckets (every `step`
//! units from `min` to `max`). Each bucket owns the row-major list of
//! `(dx, dy)` offsets inside a disk of radius `diameter / 2`. All buckets are
//! built up front; a bucket that is somehow missing (e.g. a clamped `min`
//! that is not a multiple of `step`) is built on first use and kept.

#[cfg(test)]
#[path = "pattern_test.rs"]
mod tests;

use std::collections::HashMap;

use crate::consts::{DEFAULT_ERASER_MAX, DEFAULT_ERASER_MIN, DEFAULT_ERASER_STEP};

/// Offset of one pixel from a stamp center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

/// Supported eraser diameters: `min..=max` in steps of `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EraserBuckets {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl Default for EraserBuckets {
    fn default() -> Self {
        Self { min: DEFAULT_ERASER_MIN, max: DEFAULT_ERASER_MAX, step: DEFAULT_ERASER_STEP }
    }
}

impl EraserBuckets {
    /// Map a requested diameter to its bucket.
    ///
    /// Rounds the diameter to an integer, rounds that to the nearest multiple
    /// of `step` (halves away from zero), then clamps into `[min, max]`.
    /// NaN or non-positive input resolves to `min`, `+inf` to `max`.
    /// Monotonic in `diameter`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn resolve(&self, diameter: f32) -> u32 {
        if diameter.is_nan() || diameter <= 0.0 {
            return self.min;
        }
        if diameter.is_infinite() {
            return self.max.max(self.min);
        }
        let step = self.step.max(1);
        let size = diameter.round();
        let nearest = (size / step as f32).round() * step as f32;
        // `as` saturates, so huge diameters land on u32::MAX before the clamp.
        (nearest as u32).clamp(self.min, self.max.max(self.min))
    }

    /// Every precomputed bucket, ascending.
    pub fn sizes(&self) -> impl Iterator<Item = u32> + '_ {
        (self.min..=self.max).step_by(self.step.max(1) as usize)
    }
}

/// A filled disk of offsets for one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskPattern {
    diameter: u32,
    radius: i32,
    offsets: Vec<Offset>,
}

impl DiskPattern {
    /// Build the disk for `diameter`: every offset with `dx² + dy² ≤ r²`,
    /// `r = diameter / 2`, in row-major order.
    #[must_use]
    pub fn build(diameter: u32) -> Self {
        let radius = i32::try_from(diameter / 2).unwrap_or(i32::MAX / 2);
        let r2 = i64::from(radius) * i64::from(radius);
        let mut offsets = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if i64::from(dx) * i64::from(dx) + i64::from(dy) * i64::from(dy) <= r2 {
                    offsets.push(Offset { dx, dy });
                }
            }
        }
        Self { diameter, radius, offsets }
    }

    #[must_use]
    pub fn diameter(&self) -> u32 {
        self.diameter
    }

    #[must_use]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    #[must_use]
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }
}

/// Bucket → disk lookup table.
#[derive(Debug, Clone)]
pub struct PatternCache {
    buckets: EraserBuckets,
    patterns: HashMap<u32, DiskPattern>,
}

impl PatternCache {
    /// Precompute every bucket in `buckets`.
    #[must_use]
    pub fn new(buckets: EraserBuckets) -> Self {
        let patterns = buckets.sizes().map(|size| (size, DiskPattern::build(size))).collect();
        Self { buckets, patterns }
    }

    #[must_use]
    pub fn buckets(&self) -> EraserBuckets {
        self.buckets
    }

    /// Number of buckets currently built.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Disk for the bucket nearest to `diameter`, building it if missing.
    pub fn pattern(&mut self, diameter: f32) -> &DiskPattern {
        let bucket = self.buckets.resolve(diameter);
        self.patterns.entry(bucket).or_insert_with(|| DiskPattern::build(bucket))
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new(EraserBuckets::default())
    }
}

//! Stroke rasterization: stamped, interpolated pen lines and eraser strokes.
//!
//! DESIGN
//! ======
//! Both strokes walk the segment with DDA interpolation: `steps` is the
//! longer axis delta (at least 1) and every `i` in `0..=steps` yields the
//! rounded point `start + i/steps · delta`. Stamps overlap heavily, which is
//! harmless because stamping is a plain overwrite.
//!
//! EDGE CASES
//! ==========
//! - A pen stamp that would cross the canvas edge is dropped whole, never
//!   cropped. A brush near the edge disappears instead of clipping.
//! - Eraser disks are cropped: each offset outside the canvas is skipped.
//! - Large erasers sample every `round(diameter / 8)` points. The end point
//!   is always stamped so a stroke reaches where it was aimed.

#[cfg(test)]
#[path = "raster_test.rs"]
mod tests;

use crate::canvas::dirty::{DirtyRegion, Rect};
use crate::canvas::pattern::{DiskPattern, PatternCache};
use crate::canvas::pixels::{Canvas, Point, Rgba};
use crate::consts::ERASE_STRIDE_DIVISOR;
use crate::event::{DrawEvent, EraseEvent};

// =============================================================================
// INTERPOLATION
// =============================================================================

/// Number of interpolation steps between two points (never zero).
#[must_use]
pub fn step_count(start: Point, end: Point) -> u32 {
    let dx = (i64::from(end.x) - i64::from(start.x)).unsigned_abs();
    let dy = (i64::from(end.y) - i64::from(start.y)).unsigned_abs();
    u32::try_from(dx.max(dy).max(1)).unwrap_or(u32::MAX)
}

/// Rounded point `i` of `steps` along `start → end`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn point_at(start: Point, end: Point, steps: u32, i: u32) -> Point {
    let t = f64::from(i) / f64::from(steps.max(1));
    let lerp = |a: i32, b: i32| {
        let delta = f64::from(b) - f64::from(a);
        // Saturating float → int cast; both endpoints are i32 so t ∈ [0,1] stays in range.
        (f64::from(a) + delta * t).round() as i32
    };
    Point::new(lerp(start.x, end.x), lerp(start.y, end.y))
}

/// Every interpolated point of a segment, `steps + 1` of them.
pub fn interpolate(start: Point, end: Point) -> impl Iterator<Item = Point> {
    let steps = step_count(start, end);
    (0..=steps).map(move |i| point_at(start, end, steps, i))
}

/// Sampling stride for an eraser of `diameter`: `max(1, round(diameter / 8))`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn erase_stride(diameter: f32) -> u32 {
    if !diameter.is_finite() || diameter <= 0.0 {
        return 1;
    }
    ((diameter / ERASE_STRIDE_DIVISOR).round() as u32).max(1)
}

// =============================================================================
// PEN
// =============================================================================

/// Stamp `event` onto `canvas`, widening `dirty` by every applied stamp.
///
/// Returns the number of stamps applied (dropped edge stamps excluded).
pub fn draw_line(canvas: &mut Canvas, dirty: &mut DirtyRegion, event: &DrawEvent) -> usize {
    if event.size <= 0 {
        return 0;
    }
    let mut applied = 0;
    for point in interpolate(event.start, event.end) {
        if let Some(footprint) = stamp_square(canvas, point, event.size, event.color) {
            dirty.include(footprint);
            applied += 1;
        }
    }
    applied
}

/// Fill the `size × size` square at `origin`, or do nothing if any part of it
/// falls outside the canvas.
fn stamp_square(canvas: &mut Canvas, origin: Point, size: i32, color: Rgba) -> Option<Rect> {
    let footprint = Rect::new(origin.x, origin.y, origin.x.checked_add(size)?, origin.y.checked_add(size)?);
    if footprint.clamp_to(canvas.width(), canvas.height()) != Some(footprint) {
        return None;
    }
    // Fully inside the canvas, so every coordinate below is non-negative.
    let stride = canvas.width() as usize;
    let (x0, y0) = (origin.x.unsigned_abs() as usize, origin.y.unsigned_abs() as usize);
    let side = size.unsigned_abs() as usize;
    let pixels = canvas.pixels_mut();
    for row in y0..y0 + side {
        let start = row * stride + x0;
        pixels[start..start + side].fill(color);
    }
    Some(footprint)
}

// =============================================================================
// ERASER
// =============================================================================

/// Stamp background disks along `event`, widening `dirty` by the visible part
/// of every disk.
///
/// Returns the number of disk stamps that touched the canvas.
pub fn erase_stroke(
    canvas: &mut Canvas,
    dirty: &mut DirtyRegion,
    patterns: &mut PatternCache,
    event: &EraseEvent,
    background: Rgba,
) -> usize {
    let pattern = patterns.pattern(event.diameter);
    let steps = step_count(event.start, event.end);
    let stride = erase_stride(event.diameter);

    let mut applied = 0;
    let mut last = None;
    for i in (0..=steps).step_by(stride as usize) {
        last = Some(i);
        let center = point_at(event.start, event.end, steps, i);
        if let Some(visible) = stamp_disk(canvas, pattern, center, background) {
            dirty.include(visible);
            applied += 1;
        }
    }
    if last != Some(steps) {
        if let Some(visible) = stamp_disk(canvas, pattern, event.end, background) {
            dirty.include(visible);
            applied += 1;
        }
    }
    applied
}

/// Stamp one disk centered at `center`. Returns the visible footprint, or
/// `None` when the disk misses the canvas entirely.
fn stamp_disk(canvas: &mut Canvas, pattern: &DiskPattern, center: Point, color: Rgba) -> Option<Rect> {
    let r = pattern.radius();
    let footprint = Rect::new(
        center.x.saturating_sub(r),
        center.y.saturating_sub(r),
        center.x.saturating_add(r).saturating_add(1),
        center.y.saturating_add(r).saturating_add(1),
    );
    let visible = footprint.clamp_to(canvas.width(), canvas.height())?;
    let stride = canvas.width() as usize;
    let pixels = canvas.pixels_mut();

    if visible == footprint {
        // Whole disk inside the canvas: one bounds test for the stamp, none per offset.
        for offset in pattern.offsets() {
            let x = (center.x + offset.dx).unsigned_abs() as usize;
            let y = (center.y + offset.dy).unsigned_abs() as usize;
            pixels[y * stride + x] = color;
        }
    } else {
        for offset in pattern.offsets() {
            let (x, y) = (center.x.saturating_add(offset.dx), center.y.saturating_add(offset.dy));
            if visible.contains(x, y) {
                pixels[y.unsigned_abs() as usize * stride + x.unsigned_abs() as usize] = color;
            }
        }
    }
    Some(visible)
}

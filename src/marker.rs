//! Marker — the producer-side gate that turns pointer samples into strokes.
//!
//! DESIGN
//! ======
//! The engine consumes discrete, already-throttled segments. This module is
//! where the throttling happens. Each pointer sample carries a world
//! position (for distance gates) and a texture coordinate (for the canvas
//! position). While the pointer is pressed:
//!
//! - Pen: a sample within `min_draw_distance` of the previous emission is
//!   skipped. Otherwise a draw from the previous canvas position to this one
//!   is emitted.
//! - Eraser: emissions are rate limited (30/s, or 15/s at high speed) and
//!   distance gated (0.05, or 0.1 at high speed). Speed is re-measured every
//!   50 ms whether or not the pointer is pressed.
//!
//! The first sample of a stroke starts and ends at the same point. Canvas
//! positions are offset by half the brush so the brush is centered on the
//! pointer. Pressing, releasing, and switching tools all reset stroke state.
//!
//! Color and tool mode are pulled from injected sources each sample.

#[cfg(test)]
#[path = "marker_test.rs"]
mod tests;

use std::time::{Duration, Instant};

use crate::canvas::{Point, Rgba};
use crate::consts::{
    DEFAULT_MARKER_ERASER_SIZE, DEFAULT_PEN_SIZE, ERASER_DISTANCE_THRESHOLD, ERASER_FAST_DISTANCE_THRESHOLD,
    ERASER_RATE_FAST, ERASER_RATE_NORMAL, ERASER_SPEED_THRESHOLD, ERASER_VELOCITY_WINDOW_MS, MAX_MARKER_ERASER_SIZE,
    MAX_PEN_SIZE, MIN_DRAW_DISTANCE, MIN_MARKER_ERASER_SIZE, MIN_PEN_SIZE,
};
use crate::event::{DrawEvent, EraseEvent, Event};

// =============================================================================
// CAPABILITIES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    Pen,
    Eraser,
}

/// Supplies the current pen color.
pub trait ColorSource {
    fn color(&self) -> Rgba;
}

/// Supplies the currently selected tool.
pub trait ToolModeSource {
    fn mode(&self) -> ToolMode;
}

impl ColorSource for Rgba {
    fn color(&self) -> Rgba {
        *self
    }
}

impl ToolModeSource for ToolMode {
    fn mode(&self) -> ToolMode {
        *self
    }
}

impl<T: ColorSource + ?Sized> ColorSource for &T {
    fn color(&self) -> Rgba {
        (**self).color()
    }
}

impl<T: ToolModeSource + ?Sized> ToolModeSource for &T {
    fn mode(&self) -> ToolMode {
        (**self).mode()
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// Position in world space, used only for distance and speed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn distance(self, other: Vec3) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// One pointer hit on the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub world: Vec3,
    /// Texture coordinate in `[0, 1]²`.
    pub texcoord: (f32, f32),
}

impl Sample {
    #[must_use]
    pub const fn new(world: Vec3, u: f32, v: f32) -> Self {
        Self { world, texcoord: (u, v) }
    }
}

/// Gate tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerConfig {
    pub pen_size_range: (i32, i32),
    pub eraser_size_range: (i32, i32),
    pub min_draw_distance: f32,
    pub eraser_distance: f32,
    pub eraser_fast_distance: f32,
    pub speed_threshold: f32,
    pub velocity_window: Duration,
    pub rate_normal: u32,
    pub rate_fast: u32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            pen_size_range: (MIN_PEN_SIZE, MAX_PEN_SIZE),
            eraser_size_range: (MIN_MARKER_ERASER_SIZE, MAX_MARKER_ERASER_SIZE),
            min_draw_distance: MIN_DRAW_DISTANCE,
            eraser_distance: ERASER_DISTANCE_THRESHOLD,
            eraser_fast_distance: ERASER_FAST_DISTANCE_THRESHOLD,
            speed_threshold: ERASER_SPEED_THRESHOLD,
            velocity_window: Duration::from_millis(ERASER_VELOCITY_WINDOW_MS),
            rate_normal: ERASER_RATE_NORMAL,
            rate_fast: ERASER_RATE_FAST,
        }
    }
}

#[derive(Debug, Default)]
struct StrokeState {
    last_hit: Option<Point>,
    last_world: Option<Vec3>,
    last_emit: Option<Instant>,
}

// =============================================================================
// GATE
// =============================================================================

pub struct MarkerGate<C, M> {
    config: MarkerConfig,
    canvas: (u32, u32),
    color: C,
    tool: M,
    mode: ToolMode,
    pen_size: i32,
    eraser_size: i32,
    pressed: bool,
    stroke: StrokeState,
    speed_anchor: Option<(Vec3, Instant)>,
    high_speed: bool,
}

impl<C: ColorSource, M: ToolModeSource> MarkerGate<C, M> {
    /// Gate for a `width × height` canvas with default sizes and tuning.
    pub fn new(width: u32, height: u32, color: C, tool: M) -> Self {
        Self::with_config(MarkerConfig::default(), width, height, color, tool)
    }

    pub fn with_config(config: MarkerConfig, width: u32, height: u32, color: C, tool: M) -> Self {
        let mode = tool.mode();
        let mut gate = Self {
            config,
            canvas: (width, height),
            color,
            tool,
            mode,
            pen_size: DEFAULT_PEN_SIZE,
            eraser_size: DEFAULT_MARKER_ERASER_SIZE,
            pressed: false,
            stroke: StrokeState::default(),
            speed_anchor: None,
            high_speed: false,
        };
        gate.set_pen_size(DEFAULT_PEN_SIZE);
        gate.set_eraser_size(DEFAULT_MARKER_ERASER_SIZE);
        gate
    }

    #[must_use]
    pub fn pen_size(&self) -> i32 {
        self.pen_size
    }

    #[must_use]
    pub fn eraser_size(&self) -> i32 {
        self.eraser_size
    }

    #[must_use]
    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    #[must_use]
    pub fn is_high_speed(&self) -> bool {
        self.high_speed
    }

    /// Set the pen size, clamped to the configured range. Returns the stored value.
    pub fn set_pen_size(&mut self, size: i32) -> i32 {
        let (lo, hi) = self.config.pen_size_range;
        self.pen_size = size.clamp(lo, hi.max(lo));
        self.pen_size
    }

    /// Set the eraser size, clamped to the configured range. Returns the stored value.
    pub fn set_eraser_size(&mut self, size: i32) -> i32 {
        let (lo, hi) = self.config.eraser_size_range;
        self.eraser_size = size.clamp(lo, hi.max(lo));
        self.eraser_size
    }

    /// Pointer down: start a new stroke.
    pub fn press(&mut self) {
        self.pressed = true;
        self.stroke = StrokeState::default();
    }

    /// Pointer up: end the stroke.
    pub fn release(&mut self) {
        self.pressed = false;
        self.stroke = StrokeState::default();
    }

    /// The pointer left the board.
    pub fn miss(&mut self) {
        self.stroke = StrokeState::default();
    }

    /// Feed one pointer sample taken at `now`. Returns the stroke to submit, if any.
    pub fn sample_at(&mut self, now: Instant, sample: Sample) -> Option<Event> {
        let mode = self.tool.mode();
        if mode != self.mode {
            self.mode = mode;
            self.stroke = StrokeState::default();
            self.speed_anchor = None;
            self.high_speed = false;
        }
        match self.mode {
            ToolMode::Pen => self.pen_sample(sample),
            ToolMode::Eraser => {
                self.track_speed(now, sample.world);
                self.eraser_sample(now, sample)
            }
        }
    }

    pub fn sample(&mut self, sample: Sample) -> Option<Event> {
        self.sample_at(Instant::now(), sample)
    }

    fn pen_sample(&mut self, sample: Sample) -> Option<Event> {
        if !self.pressed {
            return None;
        }
        let min_distance = self.config.min_draw_distance;
        if self.stroke.last_world.is_some_and(|last| sample.world.distance(last) < min_distance) {
            return None;
        }
        let hit = self.canvas_position(sample, self.pen_size);
        let start = self.stroke.last_hit.unwrap_or(hit);
        self.stroke.last_hit = Some(hit);
        self.stroke.last_world = Some(sample.world);
        Some(DrawEvent::new(start, hit, self.pen_size, self.color.color()).into())
    }

    #[allow(clippy::cast_precision_loss)]
    fn eraser_sample(&mut self, now: Instant, sample: Sample) -> Option<Event> {
        if !self.pressed {
            return None;
        }
        let rate = if self.high_speed { self.config.rate_fast } else { self.config.rate_normal };
        let min_gap = Duration::from_secs_f64(1.0 / f64::from(rate.max(1)));
        if self.stroke.last_emit.is_some_and(|last| now.saturating_duration_since(last) < min_gap) {
            return None;
        }
        let threshold = if self.high_speed { self.config.eraser_fast_distance } else { self.config.eraser_distance };
        if self.stroke.last_world.is_some_and(|last| sample.world.distance(last) < threshold) {
            return None;
        }
        let hit = self.canvas_position(sample, self.eraser_size);
        let start = self.stroke.last_hit.unwrap_or(hit);
        self.stroke.last_hit = Some(hit);
        self.stroke.last_world = Some(sample.world);
        self.stroke.last_emit = Some(now);
        Some(EraseEvent::new(start, hit, self.eraser_size as f32).into())
    }

    fn track_speed(&mut self, now: Instant, world: Vec3) {
        let Some((anchor, at)) = self.speed_anchor else {
            self.speed_anchor = Some((world, now));
            return;
        };
        let elapsed = now.saturating_duration_since(at);
        if elapsed <= self.config.velocity_window {
            return;
        }
        let speed = world.distance(anchor) / elapsed.as_secs_f32();
        self.high_speed = speed > self.config.speed_threshold;
        self.speed_anchor = Some((world, now));
    }

    /// Texture coordinate → canvas pixel, shifted so the brush centers on it.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn canvas_position(&self, sample: Sample, brush: i32) -> Point {
        let half = (brush / 2) as f32;
        let (u, v) = sample.texcoord;
        let x = u * self.canvas.0 as f32 - half;
        let y = v * self.canvas.1 as f32 - half;
        // Truncates toward zero and saturates at the i32 range.
        Point::new(x as i32, y as i32)
    }
}

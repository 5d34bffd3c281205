//! Shared numeric constants for the whiteboard crate.

// ── Canvas ──────────────────────────────────────────────────────

/// Default canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: u32 = 2048;

/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 2048;

// ── Scheduling ──────────────────────────────────────────────────

/// Minimum time between two display flushes, in milliseconds.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 100;

/// Erase diameters strictly above this are queued instead of applied inline.
pub const DEFAULT_LARGE_ERASER_THRESHOLD: f32 = 30.0;

/// Queued erases applied per tick.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// Pending erase queue depth before admission starts force-draining.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8192;

// ── Eraser buckets ──────────────────────────────────────────────

/// Smallest precomputed eraser diameter.
pub const DEFAULT_ERASER_MIN: u32 = 10;

/// Largest precomputed eraser diameter.
pub const DEFAULT_ERASER_MAX: u32 = 50;

/// Spacing between precomputed eraser diameters.
pub const DEFAULT_ERASER_STEP: u32 = 5;

/// Erase strokes sample every `round(diameter / ERASE_STRIDE_DIVISOR)` steps.
pub const ERASE_STRIDE_DIVISOR: f32 = 8.0;

// ── Flush ───────────────────────────────────────────────────────

/// Dirty area below this fraction of the canvas is flushed as a partial blit.
pub const DEFAULT_PARTIAL_FLUSH_RATIO: f32 = 0.5;

// ── Marker (producer side) ──────────────────────────────────────

/// Pen stamp size a new marker starts with.
pub const DEFAULT_PEN_SIZE: i32 = 5;

/// Pen size range accepted from the size control.
pub const MIN_PEN_SIZE: i32 = 5;
pub const MAX_PEN_SIZE: i32 = 50;

/// Eraser diameter a new marker starts with.
pub const DEFAULT_MARKER_ERASER_SIZE: i32 = 50;

/// Eraser diameter range accepted from the size control.
pub const MIN_MARKER_ERASER_SIZE: i32 = 50;
pub const MAX_MARKER_ERASER_SIZE: i32 = 100;

/// Pen samples closer than this (world units) to the last emission are skipped.
pub const MIN_DRAW_DISTANCE: f32 = 0.001;

/// Eraser distance gate in normal and high-speed mode (world units).
pub const ERASER_DISTANCE_THRESHOLD: f32 = 0.05;
pub const ERASER_FAST_DISTANCE_THRESHOLD: f32 = 0.1;

/// Eraser speed (world units per second) above which high-speed mode engages.
pub const ERASER_SPEED_THRESHOLD: f32 = 5.0;

/// Eraser speed is recomputed once this many milliseconds have passed.
pub const ERASER_VELOCITY_WINDOW_MS: u64 = 50;

/// Maximum eraser emissions per second in normal and high-speed mode.
pub const ERASER_RATE_NORMAL: u32 = 30;
pub const ERASER_RATE_FAST: u32 = 15;

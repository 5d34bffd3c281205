//! Whiteboard configuration loaded from `WHITEBOARD_*` environment variables.
//!
//! Every knob falls back to its `consts` default when the variable is missing
//! or unparsable. `validate` rejects combinations the engine cannot run with;
//! `WhiteboardSession::create` calls it before allocating anything.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::time::Duration;

use crate::canvas::{EraserBuckets, Rgba};
use crate::consts::{
    DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH, DEFAULT_ERASER_MAX, DEFAULT_ERASER_MIN, DEFAULT_ERASER_STEP,
    DEFAULT_LARGE_ERASER_THRESHOLD, DEFAULT_MAX_BATCH_SIZE, DEFAULT_PARTIAL_FLUSH_RATIO, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_UPDATE_INTERVAL_MS,
};
use crate::frame::ErrorCode;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("canvas dimensions must be non-zero (got {width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("canvas dimensions {width}x{height} exceed the addressable range")]
    CanvasTooLarge { width: u32, height: u32 },
    #[error("invalid eraser buckets: min {min}, max {max}, step {step}")]
    InvalidBuckets { min: u32, max: u32, step: u32 },
    #[error("max batch size must be at least 1")]
    ZeroBatchSize,
    #[error("queue capacity {capacity} is smaller than batch size {batch}")]
    QueueTooSmall { capacity: usize, batch: usize },
    #[error("update interval must be non-zero")]
    ZeroUpdateInterval,
    #[error("partial flush ratio must be within (0, 1], got {0}")]
    InvalidFlushRatio(f32),
    #[error("large eraser threshold must be finite, got {0}")]
    InvalidThreshold(f32),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyCanvas { .. } | Self::CanvasTooLarge { .. } => "E_CONFIG_CANVAS",
            Self::InvalidBuckets { .. } => "E_CONFIG_BUCKETS",
            Self::ZeroBatchSize | Self::QueueTooSmall { .. } => "E_CONFIG_QUEUE",
            Self::ZeroUpdateInterval | Self::InvalidFlushRatio(_) => "E_CONFIG_FLUSH",
            Self::InvalidThreshold(_) => "E_CONFIG_THRESHOLD",
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Tuning knobs for one whiteboard session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteboardConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Color of a blank canvas and of erased pixels.
    pub background: Rgba,
    /// Minimum time between display flushes.
    pub update_interval: Duration,
    /// Erases with a diameter strictly above this are queued.
    pub large_eraser_threshold: f32,
    /// Queued erases applied per tick.
    pub max_batch_size: usize,
    /// Pending-queue depth at which admission force-drains a batch.
    pub queue_capacity: usize,
    /// Rasterize erase batches into a shadow buffer and swap.
    pub double_buffering: bool,
    /// Supported eraser diameters.
    pub eraser_buckets: EraserBuckets,
    /// Dirty area below this fraction of the canvas flushes partially.
    pub partial_flush_ratio: f32,
}

impl Default for WhiteboardConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            background: Rgba::WHITE,
            update_interval: Duration::from_millis(DEFAULT_UPDATE_INTERVAL_MS),
            large_eraser_threshold: DEFAULT_LARGE_ERASER_THRESHOLD,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            double_buffering: true,
            eraser_buckets: EraserBuckets::default(),
            partial_flush_ratio: DEFAULT_PARTIAL_FLUSH_RATIO,
        }
    }
}

impl WhiteboardConfig {
    /// Load from the environment, falling back to defaults per field.
    #[must_use]
    pub fn from_env() -> Self {
        let update_interval_ms = env_parse("WHITEBOARD_UPDATE_INTERVAL_MS", DEFAULT_UPDATE_INTERVAL_MS);
        Self {
            width: env_parse("WHITEBOARD_WIDTH", DEFAULT_CANVAS_WIDTH),
            height: env_parse("WHITEBOARD_HEIGHT", DEFAULT_CANVAS_HEIGHT),
            background: Rgba::WHITE,
            update_interval: Duration::from_millis(update_interval_ms),
            large_eraser_threshold: env_parse("WHITEBOARD_LARGE_ERASER_THRESHOLD", DEFAULT_LARGE_ERASER_THRESHOLD),
            max_batch_size: env_parse("WHITEBOARD_MAX_BATCH_SIZE", DEFAULT_MAX_BATCH_SIZE),
            queue_capacity: env_parse("WHITEBOARD_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY),
            double_buffering: env_parse("WHITEBOARD_DOUBLE_BUFFERING", true),
            eraser_buckets: EraserBuckets {
                min: env_parse("WHITEBOARD_ERASER_MIN", DEFAULT_ERASER_MIN),
                max: env_parse("WHITEBOARD_ERASER_MAX", DEFAULT_ERASER_MAX),
                step: env_parse("WHITEBOARD_ERASER_STEP", DEFAULT_ERASER_STEP),
            },
            partial_flush_ratio: env_parse("WHITEBOARD_PARTIAL_FLUSH_RATIO", DEFAULT_PARTIAL_FLUSH_RATIO),
        }
    }

    /// Same config with a different canvas size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Reject settings the engine cannot honor.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyCanvas { width: self.width, height: self.height });
        }
        if i32::try_from(self.width).is_err() || i32::try_from(self.height).is_err() {
            return Err(ConfigError::CanvasTooLarge { width: self.width, height: self.height });
        }
        let EraserBuckets { min, max, step } = self.eraser_buckets;
        if min == 0 || step == 0 || min > max {
            return Err(ConfigError::InvalidBuckets { min, max, step });
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.queue_capacity < self.max_batch_size {
            return Err(ConfigError::QueueTooSmall { capacity: self.queue_capacity, batch: self.max_batch_size });
        }
        if self.update_interval.is_zero() {
            return Err(ConfigError::ZeroUpdateInterval);
        }
        if !(self.partial_flush_ratio > 0.0 && self.partial_flush_ratio <= 1.0) {
            return Err(ConfigError::InvalidFlushRatio(self.partial_flush_ratio));
        }
        if !self.large_eraser_threshold.is_finite() {
            return Err(ConfigError::InvalidThreshold(self.large_eraser_threshold));
        }
        Ok(())
    }
}

/// Parse `key` from the environment, or `default` when unset or malformed.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => default,
    }
}

//! Raster canvas: pixel storage, eraser patterns, dirty tracking,
//! rasterization, and the flushable surface.
//!
//! | Module | Role |
//! |--------|------|
//! | [`pixels`] | `Rgba`, `Point`, and the row-major `Canvas` buffer |
//! | [`pattern`] | Eraser diameter buckets and precomputed disk offsets |
//! | [`dirty`] | Half-open `Rect` and the accumulated `DirtyRegion` |
//! | [`raster`] | Pen and eraser stroke rasterization |
//! | [`surface`] | Authoritative buffer, double buffering, and flush |

pub mod dirty;
pub mod pattern;
pub mod pixels;
pub mod raster;
pub mod surface;

pub use dirty::{DirtyRegion, Rect};
pub use pattern::{EraserBuckets, PatternCache};
pub use pixels::{Canvas, Point, Rgba};
pub use surface::{CanvasSurface, DisplayTarget, FlushRegion};

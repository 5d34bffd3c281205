//! Replicated whiteboard canvas engine.
//!
//! Every peer holds a full replica of a shared raster canvas. Pen and eraser
//! strokes travel as frames over an ordered fabric that delivers to every
//! peer including the sender, and each replica rasterizes them through the
//! same code path. Large erasers are batched per tick, touched pixels are
//! tracked as a dirty rectangle, and flushes hand a partial or full region to
//! the display. The action log replays a session onto a fresh canvas for
//! late joiners.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`canvas`] | Pixel buffer, eraser patterns, dirty tracking, rasterizer, surface |
//! | [`event`] | `DrawEvent` / `EraseEvent` |
//! | [`session`] | `WhiteboardSession`, erase scheduler, action log and history |
//! | [`net`] | Frame dispatch table and the loopback fabric |
//! | [`frame`] | Message envelope and `ErrorCode` |
//! | [`marker`] | Producer-side stroke throttling |
//! | [`runtime`] | Tokio tick task and latest-frame handoff |
//! | [`config`] | Environment-driven `WhiteboardConfig` |
//! | [`consts`] | Defaults and tuning constants |

pub mod canvas;
pub mod config;
pub mod consts;
pub mod event;
pub mod frame;
pub mod marker;
pub mod net;
pub mod runtime;
pub mod session;

pub use config::WhiteboardConfig;
pub use session::WhiteboardSession;

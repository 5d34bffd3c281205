//! Dispatcher — routes stroke frames to session handlers.
//!
//! DESIGN
//! ======
//! Handlers live in a `syscall → fn` table filled at construction. Local and
//! remote strokes take the same path: the sender's own frame comes back
//! through the fabric and is dispatched like any peer's. The wire payload is
//! flat:
//!
//! | Syscall | Fields |
//! |---------|--------|
//! | `whiteboard:draw` | `start_x`, `start_y`, `end_x`, `end_y`, `pen_size`, `color` (`#rrggbb[aa]`) |
//! | `whiteboard:erase` | `start_x`, `start_y`, `end_x`, `end_y`, `eraser_size` |
//!
//! ERROR HANDLING
//! ==============
//! A malformed frame is rejected before it touches the canvas and logged at
//! `warn`. Errors stay local to the receiving replica.

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;

use std::collections::HashMap;

use tracing::warn;

use crate::canvas::{Point, Rgba};
use crate::event::{DrawEvent, EraseEvent, Event};
use crate::frame::{Data, ErrorCode, Frame};
use crate::session::{Admission, WhiteboardSession};

pub const SYSCALL_DRAW: &str = "whiteboard:draw";
pub const SYSCALL_ERASE: &str = "whiteboard:erase";

const FIELD_START_X: &str = "start_x";
const FIELD_START_Y: &str = "start_y";
const FIELD_END_X: &str = "end_x";
const FIELD_END_Y: &str = "end_y";
const FIELD_PEN_SIZE: &str = "pen_size";
const FIELD_COLOR: &str = "color";
const FIELD_ERASER_SIZE: &str = "eraser_size";

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: &'static str },
}

impl ErrorCode for DispatchError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
            Self::MissingField(_) => "E_MISSING_FIELD",
            Self::InvalidField { .. } => "E_INVALID_FIELD",
        }
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Wrap a stroke in its request frame.
#[must_use]
pub fn encode(event: &Event) -> Frame {
    match event {
        Event::Draw(draw) => encode_draw(draw),
        Event::Erase(erase) => encode_erase(erase),
    }
}

#[must_use]
pub fn encode_draw(event: &DrawEvent) -> Frame {
    let mut data = segment_data(event.start, event.end);
    data.insert(FIELD_PEN_SIZE.into(), event.size.into());
    data.insert(FIELD_COLOR.into(), event.color.to_hex().into());
    Frame::request(SYSCALL_DRAW, data)
}

#[must_use]
pub fn encode_erase(event: &EraseEvent) -> Frame {
    let mut data = segment_data(event.start, event.end);
    data.insert(FIELD_ERASER_SIZE.into(), f64::from(event.diameter).into());
    Frame::request(SYSCALL_ERASE, data)
}

fn segment_data(start: Point, end: Point) -> Data {
    let mut data = Data::new();
    data.insert(FIELD_START_X.into(), start.x.into());
    data.insert(FIELD_START_Y.into(), start.y.into());
    data.insert(FIELD_END_X.into(), end.x.into());
    data.insert(FIELD_END_Y.into(), end.y.into());
    data
}

// =============================================================================
// DECODING
// =============================================================================

/// Parse a `whiteboard:draw` payload.
///
/// # Errors
///
/// Returns `DispatchError` if a field is missing or out of range.
pub fn decode_draw(frame: &Frame) -> Result<DrawEvent, DispatchError> {
    let (start, end) = segment(frame)?;
    let size = int_field(frame, FIELD_PEN_SIZE)?;
    let raw = frame
        .data
        .get(FIELD_COLOR)
        .ok_or(DispatchError::MissingField(FIELD_COLOR))?
        .as_str()
        .ok_or(DispatchError::InvalidField { field: FIELD_COLOR, reason: "expected a string" })?;
    let color =
        Rgba::parse_hex(raw).ok_or(DispatchError::InvalidField { field: FIELD_COLOR, reason: "expected #rrggbb[aa]" })?;
    Ok(DrawEvent::new(start, end, size, color))
}

/// Parse a `whiteboard:erase` payload.
///
/// # Errors
///
/// Returns `DispatchError` if a field is missing, or the size is not a
/// number that fits in an `f32`.
#[allow(clippy::cast_possible_truncation)]
pub fn decode_erase(frame: &Frame) -> Result<EraseEvent, DispatchError> {
    let (start, end) = segment(frame)?;
    let diameter = frame
        .data
        .get(FIELD_ERASER_SIZE)
        .ok_or(DispatchError::MissingField(FIELD_ERASER_SIZE))?
        .as_f64()
        .ok_or(DispatchError::InvalidField { field: FIELD_ERASER_SIZE, reason: "expected a number" })?;
    if !diameter.is_finite() || diameter.abs() > f64::from(f32::MAX) {
        return Err(DispatchError::InvalidField { field: FIELD_ERASER_SIZE, reason: "out of range" });
    }
    Ok(EraseEvent::new(start, end, diameter as f32))
}

fn segment(frame: &Frame) -> Result<(Point, Point), DispatchError> {
    let start = Point::new(int_field(frame, FIELD_START_X)?, int_field(frame, FIELD_START_Y)?);
    let end = Point::new(int_field(frame, FIELD_END_X)?, int_field(frame, FIELD_END_Y)?);
    Ok((start, end))
}

fn int_field(frame: &Frame, field: &'static str) -> Result<i32, DispatchError> {
    let value = frame.data.get(field).ok_or(DispatchError::MissingField(field))?;
    let wide = value
        .as_i64()
        .ok_or(DispatchError::InvalidField { field, reason: "expected an integer" })?;
    i32::try_from(wide).map_err(|_| DispatchError::InvalidField { field, reason: "out of range" })
}

// =============================================================================
// DISPATCHER
// =============================================================================

/// A syscall handler: decode the frame and apply it to the session.
pub type Handler = fn(&mut WhiteboardSession, &Frame) -> Result<Admission, DispatchError>;

/// Syscall → handler registration table.
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
}

impl Default for Dispatcher {
    /// Table with the draw and erase handlers registered.
    fn default() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(SYSCALL_DRAW, handle_draw);
        dispatcher.register(SYSCALL_ERASE, handle_erase);
        dispatcher
    }
}

impl Dispatcher {
    /// Table with no handlers.
    #[must_use]
    pub fn empty() -> Self {
        Self { handlers: HashMap::new() }
    }

    /// Register `handler` for `syscall`, replacing any previous one.
    pub fn register(&mut self, syscall: &'static str, handler: Handler) {
        self.handlers.insert(syscall, handler);
    }

    #[must_use]
    pub fn handles(&self, syscall: &str) -> bool {
        self.handlers.contains_key(syscall)
    }

    /// Route `frame` to its handler.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::UnknownSyscall` if nothing is registered for
    /// the frame, or the handler's own error.
    pub fn dispatch(&self, session: &mut WhiteboardSession, frame: &Frame) -> Result<Admission, DispatchError> {
        let Some(handler) = self.handlers.get(frame.syscall.as_str()) else {
            return Err(DispatchError::UnknownSyscall(frame.syscall.clone()));
        };
        handler(session, frame)
    }

    /// Dispatch and turn the outcome into a reply frame.
    pub fn handle(&self, session: &mut WhiteboardSession, frame: &Frame) -> Frame {
        match self.dispatch(session, frame) {
            Ok(admission) => {
                let mut data = Data::new();
                if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(admission) {
                    data.extend(map);
                }
                frame.item(data)
            }
            Err(e) => {
                warn!(
                    syscall = %frame.syscall,
                    from = frame.from.as_deref().unwrap_or("unknown"),
                    error = %e,
                    "dispatch rejected frame"
                );
                frame.error_from(&e)
            }
        }
    }
}

fn handle_draw(session: &mut WhiteboardSession, frame: &Frame) -> Result<Admission, DispatchError> {
    Ok(session.submit_draw(decode_draw(frame)?))
}

fn handle_erase(session: &mut WhiteboardSession, frame: &Frame) -> Result<Admission, DispatchError> {
    Ok(session.submit_erase(decode_erase(frame)?))
}

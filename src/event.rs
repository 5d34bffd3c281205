//! Stroke events: the only two ways a peer can change the canvas.

use serde::{Deserialize, Serialize};

use crate::canvas::{Point, Rgba};

/// Stamp a `size × size` square of `color` along `start → end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawEvent {
    pub start: Point,
    pub end: Point,
    pub size: i32,
    pub color: Rgba,
}

impl DrawEvent {
    #[must_use]
    pub fn new(start: Point, end: Point, size: i32, color: Rgba) -> Self {
        Self { start, end, size, color }
    }
}

/// Stamp a background-colored disk of `diameter` along `start → end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EraseEvent {
    pub start: Point,
    pub end: Point,
    pub diameter: f32,
}

impl EraseEvent {
    #[must_use]
    pub fn new(start: Point, end: Point, diameter: f32) -> Self {
        Self { start, end, diameter }
    }
}

/// Either kind of stroke, tagged `DRAW` / `ERASE` when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum Event {
    Draw(DrawEvent),
    Erase(EraseEvent),
}

impl From<DrawEvent> for Event {
    fn from(event: DrawEvent) -> Self {
        Self::Draw(event)
    }
}

impl From<EraseEvent> for Event {
    fn from(event: EraseEvent) -> Self {
        Self::Erase(event)
    }
}

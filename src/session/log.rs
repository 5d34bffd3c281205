//! Action log — the replayable history of every applied stroke.
//!
//! DESIGN
//! ======
//! Draws and erases live in two append-only lists. Each entry carries the
//! session-wide sequence number it was applied under, so merging the lists
//! by `seq` yields exactly the application order. Replaying that merged
//! sequence against a blank canvas through the same rasterizer reproduces
//! the live buffer pixel for pixel.
//!
//! PERSISTENCE
//! ===========
//! A history is JSON lines: one `CANVAS` header (dimensions, background)
//! followed by `DRAW` / `ERASE` records in strictly increasing `seq`.
//! Erases still waiting in the sender's queue come last and carry
//! `"queued":true`; a late joiner queues them instead of applying them.
//!
//! ```text
//! {"kind":"CANVAS","width":2048,"height":2048,"background":{"r":255,...}}
//! {"kind":"DRAW","seq":0,"start":{"x":10,"y":10},...,"size":4,"color":{...}}
//! {"kind":"ERASE","seq":1,"start":{"x":15,"y":10},...,"diameter":50.0}
//! ```

#[cfg(test)]
#[path = "log_test.rs"]
mod tests;

use std::io::{BufRead, Write};
use std::iter::Peekable;
use std::slice;

use serde::{Deserialize, Serialize};

use crate::canvas::{CanvasSurface, Point, Rgba};
use crate::event::{DrawEvent, EraseEvent, Event};
use crate::frame::ErrorCode;

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("history i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed history record on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode history record: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("history does not start with a CANVAS header")]
    MissingHeader,
    #[error("unexpected CANVAS header on line {line}")]
    DuplicateHeader { line: usize },
    #[error("sequence {seq} on line {line} does not follow {previous}")]
    SequenceOutOfOrder { line: usize, seq: u64, previous: u64 },
    #[error("applied record on line {line} follows a queued erase")]
    AppliedAfterQueued { line: usize },
}

impl ErrorCode for LogError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_LOG_IO",
            Self::Json { .. } | Self::Encode(_) => "E_LOG_JSON",
            Self::MissingHeader | Self::DuplicateHeader { .. } => "E_LOG_HEADER",
            Self::SequenceOutOfOrder { .. } | Self::AppliedAfterQueued { .. } => "E_LOG_SEQUENCE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

// =============================================================================
// ACTION LOG
// =============================================================================

/// A stroke and its sequence number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Logged<E> {
    pub seq: u64,
    pub event: E,
}

#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    draws: Vec<Logged<DrawEvent>>,
    erases: Vec<Logged<EraseEvent>>,
}

impl ActionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_draw(&mut self, seq: u64, event: DrawEvent) {
        self.draws.push(Logged { seq, event });
    }

    pub fn append_erase(&mut self, seq: u64, event: EraseEvent) {
        self.erases.push(Logged { seq, event });
    }

    #[must_use]
    pub fn draws(&self) -> &[Logged<DrawEvent>] {
        &self.draws
    }

    #[must_use]
    pub fn erases(&self) -> &[Logged<EraseEvent>] {
        &self.erases
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.draws.len() + self.erases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty() && self.erases.is_empty()
    }

    /// Both lists merged into application order.
    pub fn merged(&self) -> impl Iterator<Item = Logged<Event>> + '_ {
        Merge {
            draws: self.draws.iter().peekable(),
            erases: self.erases.iter().peekable(),
        }
    }

    /// Rasterize every logged stroke onto `surface` in application order.
    /// Returns the number of strokes replayed.
    pub fn replay(&self, surface: &mut CanvasSurface) -> usize {
        let mut count = 0;
        for entry in self.merged() {
            match entry.event {
                Event::Draw(draw) => surface.apply_draw(&draw),
                Event::Erase(erase) => surface.apply_erase(&erase),
            };
            count += 1;
        }
        count
    }
}

struct Merge<'a> {
    draws: Peekable<slice::Iter<'a, Logged<DrawEvent>>>,
    erases: Peekable<slice::Iter<'a, Logged<EraseEvent>>>,
}

impl Iterator for Merge<'_> {
    type Item = Logged<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        let take_draw = match (self.draws.peek(), self.erases.peek()) {
            (Some(draw), Some(erase)) => draw.seq < erase.seq,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => return None,
        };
        if take_draw {
            self.draws.next().map(|d| Logged { seq: d.seq, event: Event::Draw(d.event) })
        } else {
            self.erases.next().map(|e| Logged { seq: e.seq, event: Event::Erase(e.event) })
        }
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// One line of a persisted history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "UPPERCASE")]
pub enum Record {
    Canvas {
        width: u32,
        height: u32,
        background: Rgba,
    },
    Draw {
        seq: u64,
        start: Point,
        end: Point,
        size: i32,
        color: Rgba,
    },
    Erase {
        seq: u64,
        start: Point,
        end: Point,
        diameter: f32,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        queued: bool,
    },
}

impl Record {
    fn from_logged(entry: Logged<Event>) -> Self {
        match entry.event {
            Event::Draw(DrawEvent { start, end, size, color }) => Record::Draw { seq: entry.seq, start, end, size, color },
            Event::Erase(EraseEvent { start, end, diameter }) => {
                Record::Erase { seq: entry.seq, start, end, diameter, queued: false }
            }
        }
    }

    fn queued(entry: Logged<EraseEvent>) -> Self {
        let EraseEvent { start, end, diameter } = entry.event;
        Record::Erase { seq: entry.seq, start, end, diameter, queued: true }
    }
}

/// A self-describing snapshot of a session: canvas shape, applied strokes
/// in order, then the erases still queued when it was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    pub entries: Vec<Logged<Event>>,
    pub pending: Vec<Logged<EraseEvent>>,
}

impl History {
    #[must_use]
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        Self { width, height, background, entries: Vec::new(), pending: Vec::new() }
    }

    /// Applied strokes in application order.
    pub fn events(&self) -> impl Iterator<Item = Event> + '_ {
        self.entries.iter().map(|entry| entry.event)
    }

    /// Write the header and every record, one JSON object per line.
    ///
    /// # Errors
    ///
    /// Returns `LogError::Io` if the writer fails.
    pub fn write_jsonl(&self, mut writer: impl Write) -> Result<(), LogError> {
        let header = Record::Canvas { width: self.width, height: self.height, background: self.background };
        write_record(&mut writer, &header)?;
        for entry in &self.entries {
            write_record(&mut writer, &Record::from_logged(*entry))?;
        }
        for entry in &self.pending {
            write_record(&mut writer, &Record::queued(*entry))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Parse a history written by `write_jsonl`. Blank lines are ignored.
    ///
    /// # Errors
    ///
    /// Returns `LogError` for I/O failures, malformed lines, a missing or
    /// repeated header, sequence numbers that do not strictly increase, or an
    /// applied record after a queued one.
    pub fn read_jsonl(reader: impl BufRead) -> Result<Self, LogError> {
        let mut history: Option<History> = None;
        let mut previous: Option<u64> = None;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record =
                serde_json::from_str(&line).map_err(|source| LogError::Json { line: line_no, source })?;

            let (seq, event, queued) = match (record, history.is_some()) {
                (Record::Canvas { width, height, background }, false) => {
                    history = Some(History::new(width, height, background));
                    continue;
                }
                (Record::Canvas { .. }, true) => return Err(LogError::DuplicateHeader { line: line_no }),
                (_, false) => return Err(LogError::MissingHeader),
                (Record::Draw { seq, start, end, size, color }, true) => {
                    (seq, Event::Draw(DrawEvent::new(start, end, size, color)), false)
                }
                (Record::Erase { seq, start, end, diameter, queued }, true) => {
                    (seq, Event::Erase(EraseEvent::new(start, end, diameter)), queued)
                }
            };

            match previous {
                Some(prev) if seq <= prev => {
                    return Err(LogError::SequenceOutOfOrder { line: line_no, seq, previous: prev });
                }
                _ => previous = Some(seq),
            }
            let Some(history) = history.as_mut() else {
                continue;
            };
            match (event, queued) {
                (Event::Erase(erase), true) => history.pending.push(Logged { seq, event: erase }),
                (_, false) if !history.pending.is_empty() => {
                    return Err(LogError::AppliedAfterQueued { line: line_no });
                }
                (event, _) => history.entries.push(Logged { seq, event }),
            }
        }

        history.ok_or(LogError::MissingHeader)
    }
}

fn write_record(writer: &mut impl Write, record: &Record) -> Result<(), LogError> {
    serde_json::to_writer(&mut *writer, record).map_err(LogError::Encode)?;
    writer.write_all(b"\n")?;
    Ok(())
}

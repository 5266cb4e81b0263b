use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

// ─── Time and pitch units ───────────────────────────────────────────────────

/// Absolute time in milliseconds since the session clock started.
pub type AbsTime = u64;

/// Relative time (a duration or a gap) in milliseconds.
pub type RelTime = u32;

/// MIDI pitch number (60 = C4).
pub type Pitch = i32;

/// Pixel coordinate. Signed so intermediate arithmetic may dip below zero
/// before it is clamped.
pub type Coord = i32;

// ─── Color ──────────────────────────────────────────────────────────────────

/// 16-bit RGB565 color, the native format of small SPI TFT panels.
///
///   rrrr rggg gggb bbbb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u16);

impl Color {
    pub const WHITE: Color = Color(0xFFFF);
    pub const BLACK: Color = Color(0x0000);

    /// Expand to 8 bits per channel (for terminal output and tests).
    pub fn to_rgb888(self) -> (u8, u8, u8) {
        let r = ((self.0 >> 11) & 0x1F) as u8;
        let g = ((self.0 >> 5) & 0x3F) as u8;
        let b = (self.0 & 0x1F) as u8;
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:04X}", self.0)
    }
}

// ─── Note segments ──────────────────────────────────────────────────────────

/// One recognized note (or rest) as stored by the detector's segment history.
///
/// Times are relative: `duration` is how long the note was held, `onset` is
/// the gap between the end of the previous (older) segment and the start of
/// this one. Absolute times are reconstructed by walking newest to oldest
/// from the detector's last known offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSegment {
    #[serde(rename = "p")]
    pub pitch: Pitch,
    #[serde(rename = "d")]
    pub duration: RelTime,
    #[serde(rename = "o", default)]
    pub onset: RelTime,
}

impl NoteSegment {
    pub fn new(pitch: Pitch, duration: RelTime, onset: RelTime) -> Self {
        Self { pitch, duration, onset }
    }
}

impl fmt::Display for NoteSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<4} {:>5}ms (gap {}ms)",
            crate::pitch::note_name(self.pitch),
            self.duration,
            self.onset
        )
    }
}

/// Read-only, newest-first view of a segment history.
///
/// Index 0 is the most recent segment; `None` past the oldest one. The
/// renderer never mutates a source, so implementations only have to
/// guarantee that an exposed segment does not change while a tick runs.
pub trait SegmentSource {
    fn segment_at(&self, index: usize) -> Option<NoteSegment>;
}

impl SegmentSource for [NoteSegment] {
    fn segment_at(&self, index: usize) -> Option<NoteSegment> {
        self.get(index).copied()
    }
}

impl SegmentSource for Vec<NoteSegment> {
    fn segment_at(&self, index: usize) -> Option<NoteSegment> {
        self.get(index).copied()
    }
}

// ─── Inter-thread messages ──────────────────────────────────────────────────

/// What the detection pipeline reports to the host loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorEvent {
    /// A newly recognized segment ending at absolute time `end`.
    Append { segment: NoteSegment, end: AbsTime },
    /// The newest segment was reclassified or grew; replaces the head.
    Revise { segment: NoteSegment, end: AbsTime },
}

// ─── Session clock ──────────────────────────────────────────────────────────

/// Monotonic clock for the rendering session.
#[derive(Clone)]
pub struct SessionClock {
    start: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> AbsTime {
        self.start.elapsed().as_millis() as AbsTime
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

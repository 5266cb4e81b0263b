//! Screen geometry and the time window shown on it.
//!
//! Both are computed once when the display is (re)initialized and never
//! change while a frame is being drawn.

use crate::error::ConfigError;
use crate::types::{AbsTime, Coord, Pitch, RelTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub width: Coord,
    pub height: Coord,
    pub pitch_min: Pitch,
    pub pitch_max: Pitch,
    /// Pixel rows between two adjacent pitches
    pub row_height: Coord,
    /// Unused rows below the lowest pitch, centering the pitch range
    pub bottom_offset: Coord,
    /// Columns left of the first note, reserved for row labels
    pub label_margin: Coord,
}

impl ScreenGeometry {
    pub fn new(
        width: Coord,
        height: Coord,
        (pitch_min, pitch_max): (Pitch, Pitch),
        label_margin: Coord,
    ) -> Result<Self, ConfigError> {
        if pitch_max < pitch_min {
            return Err(ConfigError::EmptyPitchRange {
                min: pitch_min,
                max: pitch_max,
            });
        }
        if width <= label_margin || label_margin < 0 {
            return Err(ConfigError::NarrowScreen {
                width,
                margin: label_margin,
            });
        }
        let rows = pitch_max - pitch_min + 1;
        let row_height = if height > 0 { height / rows } else { 0 };
        if row_height <= 0 {
            return Err(ConfigError::RowsTooDense { height, rows });
        }
        Ok(Self {
            width,
            height,
            pitch_min,
            pitch_max,
            row_height,
            bottom_offset: (height - rows * row_height) / 2,
            label_margin,
        })
    }

    pub fn rows(&self) -> Coord {
        self.pitch_max - self.pitch_min + 1
    }

    /// Columns available for notes, right of the label margin.
    pub fn visible_width(&self) -> Coord {
        self.width - self.label_margin
    }
}

/// Maps wall-clock time onto screen columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// When the roll was last cleared
    pub roll_start: AbsTime,
    /// Time represented by one full screen width
    pub screen_time_span: RelTime,
    /// Time per pixel column, always > 0
    pub pixel_duration: RelTime,
}

impl TimeWindow {
    pub fn new(
        geometry: &ScreenGeometry,
        screen_time_span: RelTime,
        roll_start: AbsTime,
    ) -> Result<Self, ConfigError> {
        if screen_time_span == 0 {
            return Err(ConfigError::ZeroTimeSpan);
        }
        let pixels = geometry.visible_width();
        let pixel_duration = screen_time_span / pixels.max(1) as RelTime;
        if pixel_duration == 0 {
            return Err(ConfigError::ZeroPixelDuration {
                span_ms: screen_time_span,
                pixels,
            });
        }
        Ok(Self {
            roll_start,
            screen_time_span,
            pixel_duration,
        })
    }

    /// How many times the cursor wrapped around since the roll started.
    pub fn wraps(&self, now: AbsTime) -> u64 {
        now.saturating_sub(self.roll_start) / self.screen_time_span as u64
    }

    /// Roll-relative time at the left edge of the current pass.
    pub fn window_start(&self, now: AbsTime) -> AbsTime {
        self.wraps(now) * self.screen_time_span as u64
    }
}

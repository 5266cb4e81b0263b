//! Scroll controller: where the cursor is and which columns a tick repaints.
//!
//! Two regions are repainted per tick. The wipe strip ahead of the cursor
//! erases what the previous pass left there. The correction strip behind the
//! cursor is redrawn because a new note is only recognized after it lasted
//! `min_segment_ms`; until then the detector reports that audio as part of
//! the previous note (or rest).

use crate::config::RollConfig;
use crate::geometry::{ScreenGeometry, TimeWindow};
use crate::mapper::time_to_x;
use crate::types::{AbsTime, Coord, RelTime};

/// Columns `[x, x + width)` repainted over the full screen height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedrawWindow {
    pub x: Coord,
    pub width: Coord,
}

impl RedrawWindow {
    pub fn right(&self) -> Coord {
        self.x + self.width
    }

    pub fn overlaps(&self, other: &RedrawWindow) -> bool {
        self.width > 0 && other.width > 0 && self.x < other.right() && other.x < self.right()
    }
}

/// Everything a tick needs to know before it touches the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub now: AbsTime,
    /// Times the cursor wrapped since the roll was cleared
    pub wraps: u64,
    /// Roll-relative time at the left edge of this pass
    pub window_start: AbsTime,
    pub cursor: Coord,
    pub wipe: RedrawWindow,
    /// Column of the cursor indicator line
    pub cursor_line_x: Coord,
    pub correction: RedrawWindow,
    pub correction_ms: RelTime,
    /// Segments ending at or before this absolute time are not redrawn
    pub cutoff: AbsTime,
}

/// Compute the tick plan for wall-clock time `now`.
pub fn plan_tick(
    geometry: &ScreenGeometry,
    window: &TimeWindow,
    config: &RollConfig,
    now: AbsTime,
) -> TickPlan {
    let wraps = window.wraps(now);
    let window_start = window.window_start(now);
    let cursor = time_to_x(geometry, window, now, window_start);

    let wipe_width = (geometry.width / config.wipe_divisor.max(1))
        .min(geometry.width - cursor)
        .max(0);

    let behind_cursor = (cursor - geometry.label_margin).max(0) as u64 * window.pixel_duration as u64;
    let correction_ms = (config.max_correction_ms() as u64).min(behind_cursor) as RelTime;
    let correction_px = (correction_ms / window.pixel_duration) as Coord;

    TickPlan {
        now,
        wraps,
        window_start,
        cursor,
        wipe: RedrawWindow {
            x: cursor,
            width: wipe_width,
        },
        cursor_line_x: cursor + 1,
        correction: RedrawWindow {
            x: cursor - correction_px,
            width: correction_px,
        },
        correction_ms,
        cutoff: now.saturating_sub(correction_ms as AbsTime),
    }
}

//! Note segments on screen.
//!
//! The detector stores segments with relative times only. `SegmentWalk`
//! reconstructs absolute times by walking the history from the newest
//! segment back, starting at the detector's last known offset; it is a
//! plain iterator, so each tick starts a fresh walk and nothing about the
//! buffer position survives between ticks.

use crate::config::Palette;
use crate::geometry::{ScreenGeometry, TimeWindow};
use crate::mapper::{pitch_to_y, time_to_x};
use crate::surface::RasterSurface;
use crate::types::{AbsTime, Coord, Pitch, SegmentSource};

/// A segment with absolute start and end times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedSegment {
    /// Position in the history, 0 = newest
    pub index: usize,
    pub pitch: Pitch,
    pub onset: AbsTime,
    pub end: AbsTime,
}

/// Newest-to-oldest walk over a segment history.
pub struct SegmentWalk<'a, S: SegmentSource + ?Sized> {
    source: &'a S,
    index: usize,
    offset: AbsTime,
    cutoff: Option<AbsTime>,
}

impl<'a, S: SegmentSource + ?Sized> SegmentWalk<'a, S> {
    /// `last_offset` is the absolute end time of the newest segment.
    pub fn new(source: &'a S, last_offset: AbsTime) -> Self {
        Self {
            source,
            index: 0,
            offset: last_offset,
            cutoff: None,
        }
    }

    /// Stop once a segment ends at or before `cutoff`.
    pub fn until(mut self, cutoff: AbsTime) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
}

impl<S: SegmentSource + ?Sized> Iterator for SegmentWalk<'_, S> {
    type Item = PlacedSegment;

    fn next(&mut self) -> Option<PlacedSegment> {
        if let Some(cutoff) = self.cutoff {
            if self.offset <= cutoff {
                return None;
            }
        }
        let segment = self.source.segment_at(self.index)?;
        let onset = self.offset.saturating_sub(segment.duration as AbsTime);
        let placed = PlacedSegment {
            index: self.index,
            pitch: segment.pitch,
            onset,
            end: self.offset,
        };
        self.index += 1;
        // segment.onset is the gap to the end of the next older segment
        self.offset = onset.saturating_sub(segment.onset as AbsTime);
        Some(placed)
    }
}

/// Screen rectangle of a placed segment: `(x, y, width, height)`.
/// Width is never negative.
pub fn segment_rect(
    geometry: &ScreenGeometry,
    window: &TimeWindow,
    window_start: AbsTime,
    segment: &PlacedSegment,
) -> (Coord, Coord, Coord, Coord) {
    let x_left = time_to_x(geometry, window, segment.onset, window_start);
    let x_right = time_to_x(geometry, window, segment.end, window_start);
    let y_top = pitch_to_y(geometry, segment.pitch) + geometry.row_height / 2;
    (x_left, y_top, (x_right - x_left).max(0), geometry.row_height)
}

/// Draw every segment the walk yields: the sustain in the note color with
/// the first `onset_stripe` columns in the note-start color. The stripe is
/// drawn in full even when the segment is narrower. Returns the number of
/// segments drawn.
pub fn render_visible_segments<R, S>(
    surface: &mut R,
    geometry: &ScreenGeometry,
    window: &TimeWindow,
    palette: &Palette,
    onset_stripe: Coord,
    window_start: AbsTime,
    walk: SegmentWalk<'_, S>,
) -> usize
where
    R: RasterSurface + ?Sized,
    S: SegmentSource + ?Sized,
{
    let mut drawn = 0;
    for segment in walk {
        let (x, y, width, height) = segment_rect(geometry, window, window_start, &segment);
        let stripe = onset_stripe.max(0);

        surface.fill_region(x + stripe, y, (width - stripe).max(0), height, palette.note);
        surface.fill_region(x, y, stripe, height, palette.note_start);
        drawn += 1;
    }
    drawn
}

#[cfg(test)]
pub mod test_helpers {
    use crate::types::{NoteSegment, RelTime, SegmentSource};
    use std::cell::Cell;

    /// Back-to-back segments of equal duration cycling through a few pitches,
    /// newest first.
    pub fn steady_history(n: usize, duration: RelTime) -> Vec<NoteSegment> {
        (0..n)
            .map(|i| NoteSegment::new(48 + (i % 5) as i32 * 3, duration, 0))
            .collect()
    }

    /// Counts how many segments a consumer fetched.
    pub struct CountingSource<'a> {
        pub inner: &'a [NoteSegment],
        pub fetched: Cell<usize>,
    }

    impl<'a> CountingSource<'a> {
        pub fn new(inner: &'a [NoteSegment]) -> Self {
            Self {
                inner,
                fetched: Cell::new(0),
            }
        }
    }

    impl SegmentSource for CountingSource<'_> {
        fn segment_at(&self, index: usize) -> Option<NoteSegment> {
            let seg = self.inner.get(index).copied();
            if seg.is_some() {
                self.fetched.set(self.fetched.get() + 1);
            }
            seg
        }
    }
}

//! Time/pitch → pixel coordinate mapping. Pure, allocation-free.

use crate::geometry::{ScreenGeometry, TimeWindow};
use crate::types::{AbsTime, Coord, Pitch};

/// Column for an absolute event time.
///
/// `window_start` is the roll-relative time at the left edge of the current
/// pass. Events at or before it clamp to the label margin.
pub fn time_to_x(
    geometry: &ScreenGeometry,
    window: &TimeWindow,
    event_time: AbsTime,
    window_start: AbsTime,
) -> Coord {
    let rel = event_time.saturating_sub(window.roll_start);
    let distance = if rel > window_start {
        (rel - window_start) / window.pixel_duration as u64
    } else {
        0
    };
    geometry
        .label_margin
        .saturating_add(distance.min(Coord::MAX as u64) as Coord)
}

/// Row for a pitch; higher pitches are nearer the top.
///
/// Pitches outside the geometry's range are not clamped: the detector's
/// frequency range is what keeps them in range.
pub fn pitch_to_y(geometry: &ScreenGeometry, pitch: Pitch) -> Coord {
    geometry.height - geometry.bottom_offset - (pitch - geometry.pitch_min) * geometry.row_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn setup(roll_start: AbsTime) -> (ScreenGeometry, TimeWindow) {
        let g = ScreenGeometry::new(160, 128, (40, 80), 12).unwrap();
        let w = TimeWindow::new(&g, 2912, roll_start).unwrap();
        (g, w)
    }

    #[test]
    fn test_time_to_x_scenario() {
        let (g, w) = setup(0);
        assert_eq!(time_to_x(&g, &w, 1000, 0), 12 + 1000 / 19);
        assert_eq!(time_to_x(&g, &w, 1000, 0), 64);
        assert_eq!(time_to_x(&g, &w, 700, 0), 48);
    }

    #[test]
    fn test_time_before_window_clamps_to_margin() {
        let (g, w) = setup(10_000);
        assert_eq!(time_to_x(&g, &w, 9_000, 0), 12);
        assert_eq!(time_to_x(&g, &w, 10_000, 0), 12);
        assert_eq!(time_to_x(&g, &w, 10_000 + 2912, 2912), 12);
        assert_eq!(time_to_x(&g, &w, 10_000 + 2912 + 190, 2912), 22);
    }

    proptest! {
        /// Later events never land left of earlier ones, on any geometry.
        #[test]
        fn time_to_x_is_monotonic(
            width in 20i32..400,
            span in 400u32..20_000,
            roll_start in 0u64..1_000_000_000,
            window_start in 0u64..100_000,
            a in 0u64..2_000_000_000,
            b in 0u64..2_000_000_000,
        ) {
            let g = ScreenGeometry::new(width, 128, (40, 80), 12).unwrap();
            let w = TimeWindow::new(&g, span, roll_start).unwrap();
            let (early, late) = (a.min(b), a.max(b));
            let x_early = time_to_x(&g, &w, early, window_start);
            let x_late = time_to_x(&g, &w, late, window_start);
            prop_assert!(x_early <= x_late, "{} -> {}, {} -> {}", early, x_early, late, x_late);
            prop_assert!(x_early >= g.label_margin);
        }
    }

    #[test]
    fn test_pitch_to_y_strictly_decreasing() {
        let (g, _) = setup(0);
        assert_eq!(pitch_to_y(&g, 40), 128 - 2);
        assert_eq!(pitch_to_y(&g, 80), 128 - 2 - 40 * 3);
        for p in 40..80 {
            assert!(pitch_to_y(&g, p + 1) < pitch_to_y(&g, p));
        }
    }
}

use crate::config::RollConfig;
use crate::error::ConfigError;
use crate::geometry::{ScreenGeometry, TimeWindow};
use crate::grid::draw_grid;
use crate::scroll::{plan_tick, RedrawWindow, TickPlan};
use crate::segments::{render_visible_segments, SegmentWalk};
use crate::surface::RasterSurface;
use crate::types::{AbsTime, SegmentSource};
use log::{info, trace};

/// What a tick did, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub plan: TickPlan,
    pub segments_drawn: usize,
}

/// Scrolling piano roll on a raster surface.
///
/// Holds the surface exclusively from `initialize` on. Between ticks the
/// only state is the geometry (fixed until re-initialized) and the time
/// the roll was last cleared.
///
/// # Per tick
///
/// 1. Wipe a strip ahead of the cursor left over from the previous pass.
/// 2. Draw the cursor line one column ahead of the cursor.
/// 3. Erase and re-grid the correction strip behind the cursor.
/// 4. Redraw every segment ending inside the correction strip.
///
/// A tick touches at most a few strips of the screen and the handful of
/// segments that end in the last `min_segment_ms + max_tick_latency_ms`; it
/// does not allocate.
pub struct PianoRoll<S: RasterSurface> {
    surface: S,
    config: RollConfig,
    geometry: ScreenGeometry,
    window: TimeWindow,
}

impl<S: RasterSurface> PianoRoll<S> {
    /// Validate the geometry the surface offers, then clear and draw the grid.
    pub fn initialize(surface: S, config: RollConfig, now: AbsTime) -> Result<Self, ConfigError> {
        let pitch_range = config.pitch_range()?;
        let geometry = ScreenGeometry::new(
            surface.width(),
            surface.height(),
            pitch_range,
            config.label_margin_px,
        )?;
        let window = TimeWindow::new(&geometry, config.screen_time_span_ms, now)?;

        info!(
            "Piano roll {}x{}: pitches {}..={} ({}px/row), {}ms on screen ({}ms/px)",
            geometry.width,
            geometry.height,
            geometry.pitch_min,
            geometry.pitch_max,
            geometry.row_height,
            window.screen_time_span,
            window.pixel_duration,
        );

        let mut roll = Self {
            surface,
            config,
            geometry,
            window,
        };
        roll.clear(now);
        Ok(roll)
    }

    /// Restart the roll at the left margin with an empty grid.
    pub fn clear(&mut self, now: AbsTime) {
        let palette = self.config.palette;
        self.surface.fill_screen(palette.background);
        draw_grid(&mut self.surface, &self.geometry, &palette, 0, self.geometry.width);
        self.window.roll_start = now;
        trace!("Roll cleared at {}ms", now);
    }

    /// Advance the roll to `now`.
    ///
    /// `last_offset` is the absolute end time of the newest segment in
    /// `segments`; older segments are placed relative to it.
    pub fn render_tick<B: SegmentSource + ?Sized>(
        &mut self,
        now: AbsTime,
        last_offset: AbsTime,
        segments: &B,
    ) -> TickReport {
        let plan = plan_tick(&self.geometry, &self.window, &self.config, now);
        let palette = self.config.palette;
        let height = self.geometry.height;

        self.erase(plan.wipe);
        self.surface
            .draw_vline(plan.cursor_line_x, 0, height, palette.cursor);

        self.erase(plan.correction);
        draw_grid(
            &mut self.surface,
            &self.geometry,
            &palette,
            plan.correction.x,
            plan.correction.width,
        );

        let walk = SegmentWalk::new(segments, last_offset).until(plan.cutoff);
        let segments_drawn = render_visible_segments(
            &mut self.surface,
            &self.geometry,
            &self.window,
            &palette,
            self.config.onset_stripe_px,
            plan.window_start,
            walk,
        );

        trace!(
            "tick {}ms: cursor={} wipe={:?} correction={:?} ({}ms) segments={}",
            now,
            plan.cursor,
            plan.wipe,
            plan.correction,
            plan.correction_ms,
            segments_drawn
        );

        TickReport {
            plan,
            segments_drawn,
        }
    }

    fn erase(&mut self, region: RedrawWindow) {
        if region.width > 0 {
            self.surface.fill_region(
                region.x,
                0,
                region.width,
                self.geometry.height,
                self.config.palette.background,
            );
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn geometry(&self) -> &ScreenGeometry {
        &self.geometry
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    pub fn config(&self) -> &RollConfig {
        &self.config
    }

    pub fn roll_start(&self) -> AbsTime {
        self.window.roll_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::pitch_to_y;
    use crate::surface::PixelBuffer;
    use crate::types::NoteSegment;

    fn roll(now: AbsTime) -> PianoRoll<PixelBuffer> {
        PianoRoll::initialize(PixelBuffer::new(160, 128), RollConfig::default(), now).unwrap()
    }

    #[test]
    fn test_initialize_rejects_narrow_surface() {
        let result = PianoRoll::initialize(PixelBuffer::new(10, 128), RollConfig::default(), 0);
        assert!(matches!(result, Err(ConfigError::NarrowScreen { .. })));
    }

    #[test]
    fn test_initialize_rejects_short_time_span() {
        let cfg = RollConfig {
            screen_time_span_ms: 147,
            ..RollConfig::default()
        };
        let result = PianoRoll::initialize(PixelBuffer::new(160, 128), cfg, 0);
        assert!(matches!(result, Err(ConfigError::ZeroPixelDuration { .. })));
    }

    #[test]
    fn test_clear_resets_roll_start() {
        let mut r = roll(100);
        assert_eq!(r.roll_start(), 100);
        r.clear(5_000);
        assert_eq!(r.roll_start(), 5_000);
        let report = r.render_tick(5_000, 5_000, &Vec::<NoteSegment>::new());
        assert_eq!(report.plan.cursor, 12);
    }

    #[test]
    fn test_tick_draws_cursor_and_note() {
        let mut r = roll(0);
        let p = r.config().palette;
        let history = vec![NoteSegment::new(60, 300, 0)];
        let report = r.render_tick(1000, 1000, &history);

        assert_eq!(report.plan.cursor, 64);
        assert_eq!(report.segments_drawn, 1);

        let fb = r.surface();
        assert_eq!(fb.count_in(65, 0, 1, 128, p.cursor), 128);
        let y = pitch_to_y(r.geometry(), 60) + 1;
        assert_eq!(fb.count_in(48, y, 2, 3, p.note_start), 6);
        assert_eq!(fb.count_in(50, y, 14, 3, p.note), 42);
    }

    #[test]
    fn test_old_segments_are_not_revisited() {
        let mut r = roll(0);
        // newest segment ended 500ms ago, far outside the correction strip
        let history = vec![NoteSegment::new(60, 300, 0)];
        let report = r.render_tick(1500, 1000, &history);
        assert_eq!(report.segments_drawn, 0);
    }
}

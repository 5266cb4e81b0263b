use crate::surface::PixelBuffer;
use crate::types::{AbsTime, Color};
use std::fmt::Write as _;
use std::io::{self, Write};

/// Mirrors the roll's pixel buffer onto a truecolor terminal.
///
/// Each character cell shows two pixel rows: the upper half block takes the
/// top pixel as foreground and the bottom pixel as background.
pub struct ConsoleDisplay {
    update_ms: AbsTime,
    last_shown: Option<AbsTime>,
    frame: String,
}

impl ConsoleDisplay {
    pub fn new(update_hz: u32) -> Self {
        let update_ms = if update_hz == 0 { 100 } else { (1000 / update_hz).max(1) as AbsTime };
        Self {
            update_ms,
            last_shown: None,
            frame: String::new(),
        }
    }

    /// Redraw the terminal if at least one update period has passed.
    pub fn maybe_show(&mut self, now: AbsTime, fb: &PixelBuffer) -> io::Result<bool> {
        let due = match self.last_shown {
            Some(t) => now.saturating_sub(t) >= self.update_ms,
            None => true,
        };
        if !due {
            return Ok(false);
        }
        let first = self.last_shown.is_none();
        self.last_shown = Some(now);

        self.frame.clear();
        if first {
            // Clear screen once, afterwards only move the cursor home
            self.frame.push_str("\x1b[2J");
        }
        self.frame.push_str("\x1b[H");
        render_frame(fb, &mut self.frame);

        let mut stdout = io::stdout().lock();
        stdout.write_all(self.frame.as_bytes())?;
        stdout.flush()?;
        Ok(true)
    }
}

/// Append the ANSI rendering of `fb` to `out`.
pub fn render_frame(fb: &PixelBuffer, out: &mut String) {
    use crate::surface::RasterSurface;

    let (w, h) = (fb.width(), fb.height());
    for y in (0..h).step_by(2) {
        let mut prev: Option<(Color, Color)> = None;
        for x in 0..w {
            let top = fb.pixel(x, y).unwrap_or(Color::BLACK);
            let bottom = fb.pixel(x, y + 1).unwrap_or(Color::BLACK);
            if prev != Some((top, bottom)) {
                let (tr, tg, tb) = top.to_rgb888();
                let (br, bg, bb) = bottom.to_rgb888();
                let _ = write!(out, "\x1b[38;2;{};{};{}m\x1b[48;2;{};{};{}m", tr, tg, tb, br, bg, bb);
                prev = Some((top, bottom));
            }
            out.push('▀');
        }
        out.push_str("\x1b[0m\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RasterSurface;

    #[test]
    fn test_two_rows_per_line() {
        let mut fb = PixelBuffer::new(4, 5);
        fb.fill_screen(Color::WHITE);
        let mut out = String::new();
        render_frame(&fb, &mut out);
        assert_eq!(out.lines().count(), 3);
        assert_eq!(out.matches('▀').count(), 12);
    }

    #[test]
    fn test_color_escapes_only_on_change() {
        let mut fb = PixelBuffer::new(6, 2);
        fb.fill_screen(Color::WHITE);
        fb.fill_region(3, 0, 3, 1, Color(0xF800));
        let mut out = String::new();
        render_frame(&fb, &mut out);
        assert_eq!(out.matches("\x1b[38;2;").count(), 2);
        assert!(out.contains("\x1b[38;2;255;0;0m\x1b[48;2;255;255;255m"));
    }

    #[test]
    fn test_update_rate() {
        let mut d = ConsoleDisplay::new(10);
        assert_eq!(d.update_ms, 100);
        d.last_shown = Some(1000);
        let fb = PixelBuffer::new(2, 2);
        assert!(!d.maybe_show(1050, &fb).unwrap());
        assert_eq!(ConsoleDisplay::new(0).update_ms, 100);
    }
}

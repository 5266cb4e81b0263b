//! Raster surface abstraction and an in-memory RGB565 pixel buffer.
//!
//! `RasterSurface` is the capability set the roll draws with; a panel
//! driver implements it on hardware, `PixelBuffer` implements it in memory
//! for the console preview and for tests that assert on exact pixels.

use crate::config::{CHAR_HEIGHT, CHAR_WIDTH};
use crate::types::{Color, Coord};

/// Drawing primitives of a small raster display.
///
/// Zero or negative extents draw nothing. Anything outside the surface is
/// clipped.
pub trait RasterSurface {
    fn width(&self) -> Coord;
    fn height(&self) -> Coord;

    fn fill_region(&mut self, x: Coord, y: Coord, w: Coord, h: Coord, color: Color);

    fn draw_hline(&mut self, x: Coord, y: Coord, len: Coord, color: Color) {
        self.fill_region(x, y, len, 1, color);
    }

    fn draw_vline(&mut self, x: Coord, y: Coord, len: Coord, color: Color) {
        self.fill_region(x, y, 1, len, color);
    }

    /// Draw one character in a `CHAR_WIDTH` x `CHAR_HEIGHT` cell scaled by
    /// `scale`. When `bg == fg` the background is left untouched, so only
    /// the glyph strokes show.
    fn draw_glyph(&mut self, x: Coord, y: Coord, ch: char, fg: Color, bg: Color, scale: u8);

    fn fill_screen(&mut self, color: Color) {
        let (w, h) = (self.width(), self.height());
        self.fill_region(0, 0, w, h, color);
    }
}

// ─── Font ───────────────────────────────────────────────────────────────────

/// 5x7 glyphs, one byte per column, bit 0 at the top.
fn glyph_columns(ch: char) -> Option<[u8; 5]> {
    let cols = match ch {
        '0' => [0x3E, 0x51, 0x49, 0x45, 0x3E],
        '1' => [0x00, 0x42, 0x7F, 0x40, 0x00],
        '2' => [0x42, 0x61, 0x51, 0x49, 0x46],
        '3' => [0x21, 0x41, 0x45, 0x4B, 0x31],
        '4' => [0x18, 0x14, 0x12, 0x7F, 0x10],
        '5' => [0x27, 0x45, 0x45, 0x45, 0x39],
        '6' => [0x3C, 0x4A, 0x49, 0x49, 0x30],
        '7' => [0x01, 0x71, 0x09, 0x05, 0x03],
        '8' => [0x36, 0x49, 0x49, 0x49, 0x36],
        '9' => [0x06, 0x49, 0x49, 0x29, 0x1E],
        'A' => [0x7E, 0x11, 0x11, 0x11, 0x7E],
        'B' => [0x7F, 0x49, 0x49, 0x49, 0x36],
        'C' => [0x3E, 0x41, 0x41, 0x41, 0x22],
        'D' => [0x7F, 0x41, 0x41, 0x22, 0x1C],
        'E' => [0x7F, 0x49, 0x49, 0x49, 0x41],
        'F' => [0x7F, 0x09, 0x09, 0x09, 0x01],
        'G' => [0x3E, 0x41, 0x49, 0x49, 0x7A],
        '#' => [0x14, 0x7F, 0x14, 0x7F, 0x14],
        '?' => [0x02, 0x01, 0x51, 0x09, 0x06],
        ' ' => [0x00; 5],
        _ => return None,
    };
    Some(cols)
}

// ─── In-memory surface ──────────────────────────────────────────────────────

/// Row-major RGB565 frame buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: Coord,
    height: Coord,
    pixels: Vec<Color>,
}

impl PixelBuffer {
    pub fn new(width: Coord, height: Coord) -> Self {
        let (w, h) = (width.max(0), height.max(0));
        Self {
            width: w,
            height: h,
            pixels: vec![Color::BLACK; (w * h) as usize],
        }
    }

    /// Pixel at (x, y), `None` outside the buffer.
    pub fn pixel(&self, x: Coord, y: Coord) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[(y * self.width + x) as usize])
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// One pixel row, `None` outside the buffer.
    pub fn row(&self, y: Coord) -> Option<&[Color]> {
        if y < 0 || y >= self.height {
            return None;
        }
        let start = (y * self.width) as usize;
        Some(&self.pixels[start..start + self.width as usize])
    }

    /// Count pixels of `color` inside a rectangle (clipped).
    pub fn count_in(&self, x: Coord, y: Coord, w: Coord, h: Coord, color: Color) -> usize {
        let mut n = 0;
        for yy in y.max(0)..(y + h).min(self.height) {
            for xx in x.max(0)..(x + w).min(self.width) {
                if self.pixels[(yy * self.width + xx) as usize] == color {
                    n += 1;
                }
            }
        }
        n
    }

    fn put(&mut self, x: Coord, y: Coord, color: Color) {
        if x >= 0 && y >= 0 && x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }
}

impl RasterSurface for PixelBuffer {
    fn width(&self) -> Coord {
        self.width
    }

    fn height(&self) -> Coord {
        self.height
    }

    fn fill_region(&mut self, x: Coord, y: Coord, w: Coord, h: Coord, color: Color) {
        if w <= 0 || h <= 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width);
        let y1 = y.saturating_add(h).min(self.height);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        for yy in y0..y1 {
            let start = (yy * self.width) as usize;
            for px in &mut self.pixels[start + x0 as usize..start + x1 as usize] {
                *px = color;
            }
        }
    }

    fn draw_glyph(&mut self, x: Coord, y: Coord, ch: char, fg: Color, bg: Color, scale: u8) {
        let s = scale.max(1) as Coord;
        let opaque = bg != fg;
        if opaque {
            self.fill_region(x, y, CHAR_WIDTH * s, CHAR_HEIGHT * s, bg);
        }
        let Some(cols) = glyph_columns(ch) else {
            return;
        };
        for (i, bits) in cols.iter().enumerate() {
            for j in 0..7 {
                if bits & (1 << j) == 0 {
                    continue;
                }
                let px = x + i as Coord * s;
                let py = y + j * s;
                if s == 1 {
                    self.put(px, py, fg);
                } else {
                    self.fill_region(px, py, s, s, fg);
                }
            }
        }
    }
}

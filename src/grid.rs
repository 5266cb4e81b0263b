//! Static reference grid: one guide line per pitch row, C and G rows
//! emphasized and labeled in the left margin.

use crate::config::{Palette, CHAR_HEIGHT, CHAR_WIDTH};
use crate::geometry::ScreenGeometry;
use crate::mapper::pitch_to_y;
use crate::pitch::{is_tonic_or_fifth, note_class, note_letter, octave_digit, NOTE_C, NOTE_G};
use crate::surface::RasterSurface;
use crate::types::{Color, Coord, Pitch};

/// Guide line color for a pitch row.
pub fn row_color(palette: &Palette, pitch: Pitch) -> Color {
    match note_class(pitch) {
        NOTE_C => palette.row_c,
        NOTE_G => palette.row_g,
        _ => palette.row_other,
    }
}

/// Draw the guide lines over columns `[x_left, x_left + width)`.
///
/// A repaint starting at column 0 also writes the row labels, and the lines
/// then start right of the label margin. Idempotent.
pub fn draw_grid<S: RasterSurface + ?Sized>(
    surface: &mut S,
    geometry: &ScreenGeometry,
    palette: &Palette,
    x_left: Coord,
    width: Coord,
) {
    let x_right = x_left + width;

    for pitch in geometry.pitch_min..=geometry.pitch_max {
        let color = row_color(palette, pitch);
        let y = pitch_to_y(geometry, pitch);
        let mut x = x_left;

        if x == 0 {
            if is_tonic_or_fifth(pitch) {
                let label_y = y - CHAR_HEIGHT / 2 + 1;
                surface.draw_glyph(0, label_y, note_letter(pitch), color, color, 1);
                surface.draw_glyph(CHAR_WIDTH, label_y, octave_digit(pitch), color, color, 1);
            }
            x = geometry.label_margin;
        }
        surface.draw_hline(x, y, x_right - x, color);
    }
}

//! Renderer configuration: timing constants, detector pitch range, palette.
//!
//! Defaults describe a 160x128 ST7735 panel fed by a detector tuned to
//! E2..G#5. Everything can be overridden from a JSON file; missing fields
//! keep their defaults.

use crate::error::ConfigError;
use crate::pitch::freq_to_pitch;
use crate::types::{Color, Coord, Pitch, RelTime};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Width of one glyph cell on the panel, including spacing.
pub const CHAR_WIDTH: Coord = 6;
/// Height of one glyph cell on the panel.
pub const CHAR_HEIGHT: Coord = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub note_start: Color,
    pub note: Color,
    pub cursor: Color,
    pub row_c: Color,
    pub row_g: Color,
    pub row_other: Color,
    pub background: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            note_start: Color(0xF800), // red
            note: Color(0x0700),       // dark green
            cursor: Color(0x001F),     // blue
            row_c: Color(0x2104),      // dark gray
            row_g: Color(0xC618),      // gray
            row_other: Color(0xF79E),  // light gray
            background: Color::WHITE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollConfig {
    /// Time represented by one full screen width [msec]
    pub screen_time_span_ms: RelTime,
    /// Lowest frequency the detector reports [Hz]
    pub freq_min_hz: f64,
    /// Highest frequency the detector reports [Hz]
    pub freq_max_hz: f64,
    /// A note is only recognized after it persists this long [msec]
    pub min_segment_ms: RelTime,
    /// Worst case time between two ticks of the host loop [msec].
    /// Increase if empty columns show up in the roll.
    pub max_tick_latency_ms: RelTime,
    /// Leading pixels of each note drawn in the onset color
    pub onset_stripe_px: Coord,
    /// The strip wiped ahead of the cursor is 1/`wipe_divisor` of the width
    pub wipe_divisor: Coord,
    /// Columns reserved on the left for row labels
    pub label_margin_px: Coord,
    pub palette: Palette,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            screen_time_span_ms: 2912,
            freq_min_hz: 82.41,
            freq_max_hz: 830.61,
            min_segment_ms: 50,
            max_tick_latency_ms: 60,
            onset_stripe_px: 2,
            wipe_divisor: 20,
            label_margin_px: 2 * CHAR_WIDTH,
            palette: Palette::default(),
        }
    }
}

impl RollConfig {
    /// Load from a JSON file. Unlike a missing calibration, a config file
    /// the user pointed at must exist and parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        let cfg: RollConfig = serde_json::from_str(&data)?;
        info!("Loaded roll config from {:?}", path);
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Roll config saved to {:?}", path);
        Ok(())
    }

    /// Pitch range derived from the detector's frequency range.
    pub fn pitch_range(&self) -> Result<(Pitch, Pitch), ConfigError> {
        let (lo, hi) = (self.freq_min_hz, self.freq_max_hz);
        if !(lo.is_finite() && hi.is_finite() && lo > 0.0 && hi >= lo) {
            return Err(ConfigError::InvalidFrequencyRange {
                min_hz: lo,
                max_hz: hi,
            });
        }
        Ok((freq_to_pitch(lo), freq_to_pitch(hi)))
    }

    /// Redraw behind the cursor must cover the detector's recognition delay
    /// plus one worst-case tick.
    pub fn max_correction_ms(&self) -> RelTime {
        self.min_segment_ms.saturating_add(self.max_tick_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pitch_range() {
        let cfg = RollConfig::default();
        assert_eq!(cfg.pitch_range().unwrap(), (40, 80));
        assert_eq!(cfg.label_margin_px, 12);
        assert_eq!(cfg.max_correction_ms(), 110);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg: RollConfig =
            serde_json::from_str(r#"{"screen_time_span_ms":4000,"palette":{"cursor":63488}}"#)
                .unwrap();
        assert_eq!(cfg.screen_time_span_ms, 4000);
        assert_eq!(cfg.palette.cursor, Color(0xF800));
        assert_eq!(cfg.palette.background, Color::WHITE);
        assert_eq!(cfg.min_segment_ms, 50);
    }

    #[test]
    fn test_rejects_inverted_frequency_range() {
        let cfg = RollConfig {
            freq_min_hz: 900.0,
            freq_max_hz: 100.0,
            ..RollConfig::default()
        };
        assert!(matches!(
            cfg.pitch_range(),
            Err(ConfigError::InvalidFrequencyRange { .. })
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roll.json");
        let cfg = RollConfig {
            min_segment_ms: 80,
            ..RollConfig::default()
        };
        cfg.save(&path).unwrap();
        let loaded = RollConfig::load(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = RollConfig::load(Path::new("/nonexistent/piano_roll.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

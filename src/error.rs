//! Configuration error types

use crate::types::{Coord, Pitch};
use thiserror::Error;

/// Invalid setup detected before the roll starts rendering.
///
/// All of these are fatal: there is no recovery inside the render loop.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Pitch range is empty or inverted
    #[error("Empty pitch range: {min}..={max}")]
    EmptyPitchRange { min: Pitch, max: Pitch },

    /// Frequency range does not describe any pitch
    #[error("Invalid detector frequency range: {min_hz} Hz .. {max_hz} Hz")]
    InvalidFrequencyRange { min_hz: f64, max_hz: f64 },

    /// More pitch rows than screen rows
    #[error("Screen height {height}px cannot fit {rows} pitch rows")]
    RowsTooDense { height: Coord, rows: Coord },

    /// Nothing left to the right of the label margin
    #[error("Screen width {width}px is not wider than the {margin}px label margin")]
    NarrowScreen { width: Coord, margin: Coord },

    /// Time span shorter than one millisecond per pixel
    #[error("Screen time span {span_ms}ms over {pixels}px gives zero ms per pixel")]
    ZeroPixelDuration { span_ms: u32, pixels: Coord },

    /// Screen time span is zero
    #[error("Screen time span must be positive")]
    ZeroTimeSpan,

    /// Failed to read or write a config file
    #[error("Config file I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for this schema
    #[error("Config file parse: {0}")]
    Parse(#[from] serde_json::Error),
}

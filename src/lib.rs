pub mod config;
pub mod console_display;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod mapper;
pub mod pitch;
pub mod renderer;
pub mod scroll;
pub mod segment_buf;
pub mod segment_reader;
pub mod segments;
pub mod simulator;
pub mod surface;
pub mod types;

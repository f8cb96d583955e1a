//! Lissajous library - audio-driven curve visualizer

pub mod audio;
pub mod camera;
pub mod curve;
pub mod error;
pub mod params;
pub mod rendering;
pub mod visualizer;

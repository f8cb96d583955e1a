//! Parameter definitions with units and documented semantics.
//!
//! All tunables live here with:
//! - Units (Hz, radians, pixels, world units)
//! - Documented defaults and meanings
//! - Type safety where possible

mod audio;
mod camera;
mod render;
mod visual;

// Re-export all types
pub use audio::{audio_constants, AnalysisConfig};
pub use camera::CameraConfig;
pub use render::{BlendMode, RenderConfig, RenderMode};
pub use visual::{BandConfig, BandSet, CurveTransform, ZMode};

//! Audio playback and multi-band analysis.
//!
//! A decoded source plays through a per-session signal graph that splits it
//! into frequency bands. Each band feeds a pair of analysis taps the
//! visualizer reads once per frame.

mod analyzer;
mod bands;
mod clock;
mod decode;
mod engine;
mod filter;
pub mod graph;
mod output;
pub mod presets;
mod source;
mod tap;
mod voice;
pub mod wav;

pub use analyzer::{db_to_linear, hann_window, linear_to_db, ChannelAnalyzer, MIN_DECIBELS};
pub use bands::{BandDecomposer, BandTaps, FrequencyBand, StereoTaps};
pub use clock::{HostClock, ManualClock, SystemClock};
pub use decode::{Decoder, SymphoniaDecoder};
pub use engine::{LoadTicket, PlaybackEngine};
pub use filter::{Biquad, BiquadCoeffs, FilterKind, BUTTERWORTH_Q};
pub use graph::{NodeId, NodeKind, SignalGraph};
pub use output::AudioOutput;
pub use presets::{generate_stereo_chord, generate_stereo_tone, Preset, ToneConfig};
pub use source::AudioSource;
pub use tap::AnalysisTap;
pub use voice::{PlaybackVoice, SharedVoice};

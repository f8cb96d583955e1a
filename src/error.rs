//! Error types for decoding, playback and rendering.

use thiserror::Error;

/// Errors that can occur while decoding an audio file.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes were not a recognized or decodable audio format.
    #[error("unsupported or corrupt audio: {0}")]
    Unsupported(#[from] symphonia::core::errors::Error),

    /// Audio file has no default track.
    #[error("audio file has no default track")]
    NoDefaultTrack,

    /// Audio file is missing sample rate information.
    #[error("audio file is missing a sample rate")]
    MissingSampleRate,

    /// Audio file is missing channel information.
    #[error("audio file is missing channel information")]
    MissingChannels,

    /// Decoding succeeded but produced no samples.
    #[error("audio file contains no samples")]
    Empty,
}

/// Errors surfaced by the playback engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Operation not valid in the current transport state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Audio device or stream failure.
    #[error("audio output: {0}")]
    Output(String),

    /// Rejected configuration.
    #[error("invalid config: {0}")]
    Config(String),
}

/// Errors surfaced by the scene renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No usable GPU context, or shader compilation/pipeline creation failed.
    #[error("renderer initialization failed: {0}")]
    Initialization(String),

    #[error(transparent)]
    Surface(#[from] wgpu::SurfaceError),
}

/// Errors raised while encoding WAV files.
#[derive(Debug, Error)]
pub enum WavError {
    #[error(transparent)]
    Encode(#[from] hound::Error),

    #[error("failed to write file: {0}")]
    Io(#[from] std::io::Error),

    /// The fixed 44-byte header only describes mono and stereo.
    #[error("unsupported channel count {0} (only mono and stereo)")]
    UnsupportedChannels(usize),
}

/// Errors raised while wiring a signal graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("unknown node {0}")]
    UnknownNode(usize),

    /// Edges must point from an earlier node to a later one.
    #[error("connection {from} -> {to} would break processing order")]
    BackwardEdge { from: usize, to: usize },

    #[error("node {node} has no port {port}")]
    NoSuchPort { node: usize, port: usize },
}

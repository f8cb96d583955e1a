//! The active playback graph: a source cursor feeding the band graph.

use std::sync::{Arc, Mutex};

use super::graph::SignalGraph;
use super::AudioSource;
use crate::params::audio_constants::BLOCK_SIZE;

/// Voice slot shared between the engine and the audio callback
pub type SharedVoice = Arc<Mutex<Option<PlaybackVoice>>>;

/// One playback session.
///
/// Steps through the source at `source_rate / output_rate` frames per
/// output frame and pushes every block through the band graph.
#[derive(Debug)]
pub struct PlaybackVoice {
    source: Arc<AudioSource>,
    graph: SignalGraph,
    position: f64,
    step: f64,
    block_in: Vec<[f32; 2]>,
    block_out: Vec<[f32; 2]>,
}

impl PlaybackVoice {
    pub fn new(
        source: Arc<AudioSource>,
        graph: SignalGraph,
        offset_secs: f64,
        output_rate_hz: u32,
    ) -> Self {
        let position = offset_secs.max(0.0) * source.sample_rate() as f64;
        let step = source.sample_rate() as f64 / output_rate_hz.max(1) as f64;
        Self {
            source,
            graph,
            position,
            step,
            block_in: Vec::with_capacity(BLOCK_SIZE),
            block_out: vec![[0.0; 2]; BLOCK_SIZE],
        }
    }

    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }

    /// Playback position in seconds
    pub fn position_secs(&self) -> f64 {
        self.position / self.source.sample_rate() as f64
    }

    /// Fill an interleaved output buffer with `channels` channels.
    ///
    /// Mono devices get the average of left and right; channels beyond the
    /// second stay silent. Past the end of the source the graph keeps
    /// running on silence so filters ring out.
    pub fn render(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames_needed = data.len() / channels;
        let mut frame_idx = 0;

        while frame_idx < frames_needed {
            let count = (frames_needed - frame_idx).min(BLOCK_SIZE);

            self.block_in.clear();
            for _ in 0..count {
                self.block_in.push(self.source.stereo_frame_at(self.position));
                self.position += self.step;
            }
            self.graph
                .process(&self.block_in, &mut self.block_out[..count]);

            for (i, [left, right]) in self.block_out[..count].iter().enumerate() {
                let out = &mut data[(frame_idx + i) * channels..(frame_idx + i + 1) * channels];
                if channels == 1 {
                    out[0] = (left + right) * 0.5;
                } else {
                    out[0] = *left;
                    out[1] = *right;
                    out[2..].fill(0.0);
                }
            }

            frame_idx += count;
        }
    }
}

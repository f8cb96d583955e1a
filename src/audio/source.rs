//! Decoded audio held in memory for playback.

use crate::error::DecodeError;

/// Decoded, de-interleaved sample buffer.
///
/// Immutable once built; the playback engine replaces it wholesale on load.
#[derive(Debug, Clone)]
pub struct AudioSource {
    name: String,
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioSource {
    /// Build a source from per-channel buffers.
    ///
    /// Channels are truncated to the shortest one so every frame is complete.
    pub fn new(
        name: impl Into<String>,
        sample_rate: u32,
        mut channels: Vec<Vec<f32>>,
    ) -> Result<Self, DecodeError> {
        if sample_rate == 0 {
            return Err(DecodeError::MissingSampleRate);
        }
        if channels.is_empty() {
            return Err(DecodeError::MissingChannels);
        }

        let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        if frames == 0 {
            return Err(DecodeError::Empty);
        }
        for channel in &mut channels {
            channel.truncate(frames);
        }

        Ok(Self {
            name: name.into(),
            sample_rate,
            channels,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Number of sample frames
    pub fn frames(&self) -> usize {
        self.channels[0].len()
    }

    /// Total duration in seconds
    pub fn duration(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Stereo frame at a fractional frame position (linear interpolation).
    ///
    /// Mono sources feed both sides; positions past the end are silent.
    pub fn stereo_frame_at(&self, position: f64) -> [f32; 2] {
        if position < 0.0 {
            return [0.0; 2];
        }
        let index = position.floor() as usize;
        if index >= self.frames() {
            return [0.0; 2];
        }
        let frac = (position - index as f64) as f32;

        let sample = |channel: &[f32]| {
            let a = channel[index];
            let b = channel.get(index + 1).copied().unwrap_or(a);
            a + (b - a) * frac
        };

        let left = sample(&self.channels[0]);
        let right = self.channels.get(1).map(|c| sample(c)).unwrap_or(left);
        [left, right]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_from_frames() {
        let source = AudioSource::new("tone", 100, vec![vec![0.0; 250], vec![0.0; 250]]).unwrap();
        assert_eq!(source.frames(), 250);
        assert!((source.duration() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_empty_channels() {
        assert!(matches!(
            AudioSource::new("empty", 44_100, vec![vec![], vec![]]),
            Err(DecodeError::Empty)
        ));
        assert!(matches!(
            AudioSource::new("none", 44_100, vec![]),
            Err(DecodeError::MissingChannels)
        ));
    }

    #[test]
    fn test_truncates_to_shortest_channel() {
        let source = AudioSource::new("ragged", 10, vec![vec![0.1; 5], vec![0.2; 3]]).unwrap();
        assert_eq!(source.frames(), 3);
    }

    #[test]
    fn test_mono_duplicates_to_stereo() {
        let source = AudioSource::new("mono", 10, vec![vec![0.5, -0.5]]).unwrap();
        assert_eq!(source.stereo_frame_at(0.0), [0.5, 0.5]);
    }

    #[test]
    fn test_interpolates_between_frames() {
        let source = AudioSource::new("ramp", 10, vec![vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        let [left, right] = source.stereo_frame_at(0.25);
        assert!((left - 0.25).abs() < 1e-6);
        assert!((right - 0.75).abs() < 1e-6);
        assert_eq!(source.stereo_frame_at(2.0), [0.0, 0.0]);
    }
}

//! Demo content: interval and chord presets rendered as stereo sines.
//!
//! Left and right channels carry different pitch ratios so the resulting
//! figure shows the interval's classic Lissajous shape.

use std::f64::consts::TAU;

use super::AudioSource;
use crate::error::DecodeError;

/// Linear fade at each end of a generated tone (seconds)
pub const FADE_SECS: f64 = 0.05;

/// Two-oscillator preset: one pitch ratio per channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub left_ratio: f64,
    pub right_ratio: f64,
}

/// Multi-oscillator preset: a set of ratios summed per channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChordPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub left_ratios: &'static [f64],
    pub right_ratios: &'static [f64],
}

pub const INTERVAL_PRESETS: [IntervalPreset; 6] = [
    IntervalPreset { id: "sine", name: "Pure Sine", description: "440 Hz", left_ratio: 1.0, right_ratio: 1.0 },
    IntervalPreset { id: "octave", name: "Octave", description: "2:1", left_ratio: 1.0, right_ratio: 2.0 },
    IntervalPreset { id: "fifth", name: "Perfect Fifth", description: "3:2", left_ratio: 1.0, right_ratio: 3.0 / 2.0 },
    IntervalPreset { id: "fourth", name: "Perfect Fourth", description: "4:3", left_ratio: 1.0, right_ratio: 4.0 / 3.0 },
    IntervalPreset { id: "third", name: "Major Third", description: "5:4", left_ratio: 1.0, right_ratio: 5.0 / 4.0 },
    IntervalPreset { id: "seventh", name: "Minor Seventh", description: "16:9", left_ratio: 1.0, right_ratio: 16.0 / 9.0 },
];

pub const CHORD_PRESETS: [ChordPreset; 6] = [
    ChordPreset { id: "major", name: "Major Triad", description: "4:5:6", left_ratios: &[1.0], right_ratios: &[5.0 / 4.0, 3.0 / 2.0] },
    ChordPreset { id: "minor", name: "Minor Triad", description: "10:12:15", left_ratios: &[1.0], right_ratios: &[6.0 / 5.0, 3.0 / 2.0] },
    ChordPreset { id: "sus4", name: "Sus4 Chord", description: "3:4:6", left_ratios: &[1.0], right_ratios: &[4.0 / 3.0, 3.0 / 2.0] },
    ChordPreset { id: "power", name: "Power Chord", description: "2:3:4", left_ratios: &[1.0], right_ratios: &[3.0 / 2.0, 2.0] },
    ChordPreset { id: "maj7", name: "Major 7th", description: "8:10:12:15", left_ratios: &[1.0, 3.0 / 2.0], right_ratios: &[5.0 / 4.0, 15.0 / 8.0] },
    ChordPreset { id: "dom7", name: "Dominant 7th", description: "4:5:6:7", left_ratios: &[1.0, 3.0 / 2.0], right_ratios: &[5.0 / 4.0, 7.0 / 4.0] },
];

/// Tone rendering parameters
#[derive(Debug, Clone, Copy)]
pub struct ToneConfig {
    /// Pitch that ratio 1.0 maps to (Hz)
    pub base_frequency_hz: f64,
    pub duration_secs: f64,
    pub sample_rate_hz: u32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            base_frequency_hz: 440.0,
            duration_secs: 15.0,
            sample_rate_hz: 44_100,
        }
    }
}

/// A preset looked up by id, either kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Preset {
    Interval(IntervalPreset),
    Chord(ChordPreset),
}

impl Preset {
    pub fn find(id: &str) -> Option<Self> {
        INTERVAL_PRESETS
            .iter()
            .find(|p| p.id == id)
            .map(|p| Preset::Interval(*p))
            .or_else(|| {
                CHORD_PRESETS
                    .iter()
                    .find(|p| p.id == id)
                    .map(|p| Preset::Chord(*p))
            })
    }

    /// Every preset id, intervals first
    pub fn ids() -> impl Iterator<Item = &'static str> {
        INTERVAL_PRESETS
            .iter()
            .map(|p| p.id)
            .chain(CHORD_PRESETS.iter().map(|p| p.id))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Interval(p) => p.name,
            Preset::Chord(p) => p.name,
        }
    }

    pub fn render(&self, config: &ToneConfig) -> Result<AudioSource, DecodeError> {
        match self {
            Preset::Interval(p) => generate_stereo_tone(p.left_ratio, p.right_ratio, config),
            Preset::Chord(p) => generate_stereo_chord(p.left_ratios, p.right_ratios, config),
        }
    }
}

/// One sine per channel at `base * ratio`
pub fn generate_stereo_tone(
    left_ratio: f64,
    right_ratio: f64,
    config: &ToneConfig,
) -> Result<AudioSource, DecodeError> {
    generate_stereo_chord(&[left_ratio], &[right_ratio], config)
}

/// Summed sines per channel, each at gain `1/n`, with linear fades at both ends
pub fn generate_stereo_chord(
    left_ratios: &[f64],
    right_ratios: &[f64],
    config: &ToneConfig,
) -> Result<AudioSource, DecodeError> {
    let frames = (config.sample_rate_hz as f64 * config.duration_secs).round() as usize;
    let left = render_channel(left_ratios, frames, config);
    let right = render_channel(right_ratios, frames, config);

    AudioSource::new("demo tone", config.sample_rate_hz, vec![left, right])
}

fn render_channel(ratios: &[f64], frames: usize, config: &ToneConfig) -> Vec<f32> {
    let rate = config.sample_rate_hz as f64;
    let gain = if ratios.is_empty() {
        0.0
    } else {
        1.0 / ratios.len() as f64
    };

    (0..frames)
        .map(|i| {
            let t = i as f64 / rate;
            let sum: f64 = ratios
                .iter()
                .map(|ratio| (TAU * config.base_frequency_hz * ratio * t).sin())
                .sum();
            (sum * gain * envelope(t, config.duration_secs)) as f32
        })
        .collect()
}

/// Fade-in over the first `FADE_SECS`, fade-out over the last
fn envelope(t: f64, duration: f64) -> f64 {
    let fade_in = (t / FADE_SECS).min(1.0);
    let fade_out = ((duration - t) / FADE_SECS).min(1.0);
    fade_in.min(fade_out).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_config() -> ToneConfig {
        ToneConfig {
            base_frequency_hz: 100.0,
            duration_secs: 1.0,
            sample_rate_hz: 8_000,
        }
    }

    #[test]
    fn test_preset_lookup() {
        assert!(matches!(Preset::find("fifth"), Some(Preset::Interval(_))));
        assert!(matches!(Preset::find("dom7"), Some(Preset::Chord(_))));
        assert!(Preset::find("nope").is_none());
        assert_eq!(Preset::ids().count(), 12);
    }

    #[test]
    fn test_tone_length_and_fades() {
        let source = generate_stereo_tone(1.0, 2.0, &short_config()).unwrap();
        assert_eq!(source.frames(), 8_000);
        assert_eq!(source.sample_rate(), 8_000);

        let left = source.channel(0).unwrap();
        assert_eq!(left[0], 0.0);
        assert!(left[7_999].abs() < 0.01);
    }

    #[test]
    fn test_chord_gain_stays_in_range() {
        let preset = Preset::find("maj7").unwrap();
        let source = preset.render(&short_config()).unwrap();

        for channel in 0..2 {
            let samples = source.channel(channel).unwrap();
            assert!(samples.iter().all(|s| s.abs() <= 1.0 + 1e-6));
        }
    }

    #[test]
    fn test_envelope_holds_unity_in_middle() {
        assert_eq!(envelope(0.5, 1.0), 1.0);
        assert!((envelope(0.025, 1.0) - 0.5).abs() < 1e-9);
        assert!((envelope(0.975, 1.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_sine_preset_channels_match() {
        let source = Preset::find("sine").unwrap().render(&short_config()).unwrap();
        assert_eq!(source.channel(0), source.channel(1));
    }
}

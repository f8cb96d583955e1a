//! Multi-band decomposition: one stereo source fanned out to per-band taps.

use std::fmt;
use std::str::FromStr;

use super::graph::{NodeKind, SignalGraph};
use super::{AnalysisTap, Biquad, FilterKind};
use crate::error::GraphError;
use crate::params::AnalysisConfig;

/// Frequency region rendered as its own curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrequencyBand {
    Bass,
    Mids,
    Highs,
    /// Unfiltered signal, emphasized by dominant-frequency energy
    Melody,
}

impl FrequencyBand {
    pub const COUNT: usize = 4;

    pub const ALL: [FrequencyBand; Self::COUNT] = [
        FrequencyBand::Bass,
        FrequencyBand::Mids,
        FrequencyBand::Highs,
        FrequencyBand::Melody,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FrequencyBand::Bass => "bass",
            FrequencyBand::Mids => "mids",
            FrequencyBand::Highs => "highs",
            FrequencyBand::Melody => "melody",
        }
    }

    /// Band-limiting filter, or `None` for the unfiltered melody band
    pub fn filter_kind(self, config: &AnalysisConfig) -> Option<FilterKind> {
        match self {
            FrequencyBand::Bass => Some(FilterKind::LowPass {
                cutoff_hz: config.bass_cutoff_hz,
            }),
            FrequencyBand::Mids => Some(FilterKind::BandPass {
                center_hz: config.mids_center_hz,
                q: config.mids_q(),
            }),
            FrequencyBand::Highs => Some(FilterKind::HighPass {
                cutoff_hz: config.highs_cutoff_hz,
            }),
            FrequencyBand::Melody => None,
        }
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FrequencyBand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bass" | "low" => Ok(FrequencyBand::Bass),
            "mids" | "mid" => Ok(FrequencyBand::Mids),
            "highs" | "high" => Ok(FrequencyBand::Highs),
            "melody" | "full" => Ok(FrequencyBand::Melody),
            other => Err(format!("unknown band '{}'", other)),
        }
    }
}

/// Left/right analysis taps of one band
#[derive(Debug, Clone)]
pub struct StereoTaps {
    pub left: AnalysisTap,
    pub right: AnalysisTap,
}

/// Taps for every band of one built graph
#[derive(Debug, Clone, Default)]
pub struct BandTaps {
    bands: [Option<StereoTaps>; FrequencyBand::COUNT],
}

impl BandTaps {
    pub fn get(&self, band: FrequencyBand) -> Option<&StereoTaps> {
        self.bands[band.index()].as_ref()
    }

    pub fn len(&self) -> usize {
        self.bands.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the routing graph for one playback session.
///
/// Source left/right go straight to the destination; each band taps both
/// channels through its own filter instances.
#[derive(Debug, Clone)]
pub struct BandDecomposer {
    config: AnalysisConfig,
    sample_rate_hz: f32,
}

impl BandDecomposer {
    pub fn new(config: AnalysisConfig, sample_rate_hz: u32) -> Self {
        Self {
            config,
            sample_rate_hz: sample_rate_hz as f32,
        }
    }

    /// Rate the filters are designed for (the output device rate)
    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz as u32
    }

    pub fn build(&self) -> Result<(SignalGraph, BandTaps), GraphError> {
        let mut graph = SignalGraph::new();
        let mut taps = BandTaps::default();

        let source = graph.add_node(NodeKind::Source);
        let destination = graph.add_node(NodeKind::Destination);
        graph.connect(source, 0, destination, 0)?;
        graph.connect(source, 1, destination, 1)?;

        for band in FrequencyBand::ALL {
            let kind = band.filter_kind(&self.config);
            let mut channel_taps = Vec::with_capacity(2);

            for channel in 0..2 {
                let mut upstream = (source, channel);
                if let Some(kind) = kind {
                    let filter = graph.add_node(NodeKind::Filter(Biquad::new(
                        kind,
                        self.sample_rate_hz,
                    )));
                    graph.connect(upstream.0, upstream.1, filter, 0)?;
                    upstream = (filter, 0);
                }

                let tap = AnalysisTap::new(self.config.window_size);
                let tap_node = graph.add_node(NodeKind::Tap(tap.clone()));
                graph.connect(upstream.0, upstream.1, tap_node, 0)?;
                channel_taps.push(tap);
            }

            let right = channel_taps.pop();
            let left = channel_taps.pop();
            if let (Some(left), Some(right)) = (left, right) {
                taps.bands[band.index()] = Some(StereoTaps { left, right });
            }
        }

        log::debug!(
            "Built band graph: {} nodes, {} filters, {} taps",
            graph.node_count(),
            graph.filter_count(),
            taps.len() * 2
        );
        Ok((graph, taps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn decomposer() -> BandDecomposer {
        BandDecomposer::new(AnalysisConfig::default(), 48_000)
    }

    #[test]
    fn test_builds_stereo_taps_for_every_band() {
        let (graph, taps) = decomposer().build().unwrap();

        assert_eq!(taps.len(), FrequencyBand::COUNT);
        assert_eq!(graph.taps().count(), 8);
        // Independent filter per channel for bass, mids, highs
        assert_eq!(graph.filter_count(), 6);

        for band in FrequencyBand::ALL {
            let stereo = taps.get(band).unwrap();
            assert!(!stereo.left.same_tap(&stereo.right));
            assert_eq!(stereo.left.window(), 2048);
        }
    }

    #[test]
    fn test_melody_is_unfiltered_and_channels_stay_separate() {
        let (mut graph, taps) = decomposer().build().unwrap();

        let input: Vec<[f32; 2]> = (0..2048).map(|i| [0.5, -0.25 * (i % 2) as f32]).collect();
        let mut output = vec![[0.0; 2]; input.len()];
        graph.process(&input, &mut output);

        let melody = taps.get(FrequencyBand::Melody).unwrap();
        assert!(melody.left.snapshot().iter().all(|s| *s == 0.5));
        assert_eq!(melody.right.snapshot(), input.iter().map(|f| f[1]).collect::<Vec<_>>());

        // Destination hears the untouched source
        assert_eq!(output, input);
    }

    #[test]
    fn test_bass_tap_rejects_treble() {
        let (mut graph, taps) = decomposer().build().unwrap();

        let input: Vec<[f32; 2]> = (0..9_600)
            .map(|i| {
                let s = (2.0 * PI * 8_000.0 * i as f32 / 48_000.0).sin();
                [s, s]
            })
            .collect();
        let mut output = vec![[0.0; 2]; input.len()];
        graph.process(&input, &mut output);

        let bass = taps.get(FrequencyBand::Bass).unwrap();
        let highs = taps.get(FrequencyBand::Highs).unwrap();
        let peak = |v: Vec<f32>| v.iter().fold(0.0f32, |m, s| m.max(s.abs()));

        assert!(peak(bass.left.snapshot()) < 0.02);
        assert!(peak(highs.left.snapshot()) > 0.8);
    }

    #[test]
    fn test_band_names_round_trip() {
        for band in FrequencyBand::ALL {
            assert_eq!(band.name().parse::<FrequencyBand>().unwrap(), band);
        }
        assert!("treble".parse::<FrequencyBand>().is_err());
    }
}

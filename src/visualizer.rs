//! Per-frame assembly: live taps to one curve per enabled band.

use crate::audio::{ChannelAnalyzer, FrequencyBand, PlaybackEngine};
use crate::curve::{emphasize, melody_scales, synthesize, CurveGeometry};
use crate::params::{BandSet, CurveTransform};

/// Reads every enabled band's taps and synthesizes its curve.
///
/// Snapshots are taken fresh on every call and nothing is kept between
/// frames.
#[derive(Debug)]
pub struct Visualizer {
    analyzer: ChannelAnalyzer,
    pub bands: BandSet,
    pub transform: CurveTransform,
}

impl Visualizer {
    /// Analyzer sized to the engine's tap window
    pub fn new(engine: &PlaybackEngine, bands: BandSet, transform: CurveTransform) -> Self {
        Self {
            analyzer: ChannelAnalyzer::new(engine.config().window_size),
            bands,
            transform,
        }
    }

    /// Geometry for this frame, in band order.
    ///
    /// A band whose taps are missing (nothing played yet, or a rebuild in
    /// progress) is skipped for this frame.
    pub fn build_frame(&self, engine: &PlaybackEngine) -> Vec<CurveGeometry> {
        let mut frame = Vec::with_capacity(FrequencyBand::COUNT);

        for (band, config) in self.bands.enabled() {
            let Some(taps) = engine.band_taps(band) else {
                log::debug!("No taps for {} band, skipping", band);
                continue;
            };

            let mut left = self.analyzer.time_domain(&taps.left);
            let mut right = self.analyzer.time_domain(&taps.right);

            if band == FrequencyBand::Melody {
                let left_db = self.analyzer.frequency_domain(&taps.left);
                let right_db = self.analyzer.frequency_domain(&taps.right);
                let (left_scale, right_scale) = melody_scales(&left_db, &right_db);
                emphasize(&mut left, left_scale);
                emphasize(&mut right, right_scale);
            }

            let points = synthesize(&left, &right, config.trail_length, &self.transform);
            frame.push(CurveGeometry::new(band, points, config));
        }

        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::audio::{generate_stereo_tone, ManualClock, SymphoniaDecoder, ToneConfig};
    use crate::curve::POINT_STRIDE;
    use crate::params::AnalysisConfig;

    const RATE: u32 = 8_000;
    const WINDOW: usize = 256;

    fn playing_engine() -> PlaybackEngine {
        let config = AnalysisConfig {
            window_size: WINDOW,
            ..Default::default()
        };
        let mut engine = PlaybackEngine::new(
            config,
            Box::new(ManualClock::new()),
            Arc::new(SymphoniaDecoder),
            RATE,
        )
        .unwrap();

        let tone = ToneConfig {
            base_frequency_hz: 220.0,
            duration_secs: 1.0,
            sample_rate_hz: RATE,
        };
        engine
            .load_source(generate_stereo_tone(1.0, 1.5, &tone).unwrap())
            .unwrap();
        engine.play().unwrap();

        // Fill every tap past the fade-in
        let mut block = vec![0.0; 2 * 1024];
        assert!(engine.render_offline(&mut block, 2));
        engine
    }

    #[test]
    fn test_default_bands_draw_melody_only() {
        let engine = playing_engine();
        let visualizer = Visualizer::new(&engine, BandSet::default(), CurveTransform::default());

        let frame = visualizer.build_frame(&engine);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].band, FrequencyBand::Melody);
        // Trail length is capped by the window
        assert_eq!(frame[0].point_count(), WINDOW);
        assert!(frame[0].points.iter().any(|v| *v != 0.0));
    }

    #[test]
    fn test_all_bands_in_order() {
        let engine = playing_engine();
        let mut bands = BandSet::default();
        bands.enable_only(&FrequencyBand::ALL);
        bands.for_each_mut(|config| config.trail_length = 100);
        let visualizer = Visualizer::new(&engine, bands, CurveTransform::default());

        let frame = visualizer.build_frame(&engine);
        let order: Vec<_> = frame.iter().map(|g| g.band).collect();
        assert_eq!(order, FrequencyBand::ALL.to_vec());
        assert!(frame.iter().all(|g| g.points.len() == 100 * POINT_STRIDE));
    }

    #[test]
    fn test_disabled_bands_produce_nothing() {
        let engine = playing_engine();
        let mut bands = BandSet::default();
        bands.enable_only(&[]);
        let visualizer = Visualizer::new(&engine, bands, CurveTransform::default());

        assert!(visualizer.build_frame(&engine).is_empty());
    }

    #[test]
    fn test_missing_taps_skip_band() {
        let engine = PlaybackEngine::new(
            AnalysisConfig::default(),
            Box::new(ManualClock::new()),
            Arc::new(SymphoniaDecoder),
            RATE,
        )
        .unwrap();
        let visualizer = Visualizer::new(&engine, BandSet::default(), CurveTransform::default());

        assert!(visualizer.build_frame(&engine).is_empty());
    }

    #[test]
    fn test_analyzer_matches_engine_window() {
        let engine = playing_engine();
        let visualizer = Visualizer::new(&engine, BandSet::default(), CurveTransform::default());
        assert_eq!(visualizer.analyzer.window(), WINDOW);
        let taps = engine.band_taps(FrequencyBand::Melody).unwrap();
        assert_eq!(taps.left.window(), visualizer.analyzer.window());
    }

    #[test]
    fn test_band_style_carried_to_geometry() {
        let engine = playing_engine();
        let mut bands = BandSet::default();
        bands.get_mut(FrequencyBand::Melody).point_size = 7.0;
        let visualizer = Visualizer::new(&engine, bands, CurveTransform::default());

        let frame = visualizer.build_frame(&engine);
        assert_eq!(frame[0].point_size, 7.0);
        assert_eq!(frame[0].color, BandSet::default().get(FrequencyBand::Melody).color);
    }
}

//! Time- and frequency-domain snapshots of analysis taps.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::AnalysisTap;

/// Floor for spectrum magnitudes (dB); silence maps here instead of -inf
pub const MIN_DECIBELS: f32 = -160.0;

/// Reads fixed-size windows from taps.
///
/// Every call copies the tap afresh: two reads in one frame may differ
/// because the audio thread keeps writing.
pub struct ChannelAnalyzer {
    window: usize,
    fft: Arc<dyn Fft<f32>>,
    hann: Vec<f32>,
}

impl ChannelAnalyzer {
    pub fn new(window: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(window);
        let hann = (0..window).map(|i| hann_window(i, window)).collect();
        Self { window, fft, hann }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of bins in a frequency snapshot
    pub fn bin_count(&self) -> usize {
        self.window / 2
    }

    /// Latest `window` samples, clamped to [-1, 1]
    pub fn time_domain(&self, tap: &AnalysisTap) -> Vec<f32> {
        let mut samples = vec![0.0; self.window];
        tap.snapshot_into(&mut samples);
        for s in &mut samples {
            *s = s.clamp(-1.0, 1.0);
        }
        samples
    }

    /// Magnitude spectrum of the latest window in dB (`window / 2` bins)
    pub fn frequency_domain(&self, tap: &AnalysisTap) -> Vec<f32> {
        let mut samples = vec![0.0; self.window];
        tap.snapshot_into(&mut samples);
        self.magnitudes_db(&samples)
    }

    /// Hann-windowed magnitude spectrum in dB, normalized by window length
    pub fn magnitudes_db(&self, samples: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = self
            .hann
            .iter()
            .enumerate()
            .map(|(i, w)| Complex::new(samples.get(i).copied().unwrap_or(0.0) * w, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        let scale = 1.0 / self.window as f32;
        buffer[..self.bin_count()]
            .iter()
            .map(|c| linear_to_db(c.norm() * scale))
            .collect()
    }
}

impl std::fmt::Debug for ChannelAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelAnalyzer")
            .field("window", &self.window)
            .finish()
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    if size <= 1 {
        return 1.0;
    }
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

pub fn linear_to_db(magnitude: f32) -> f32 {
    if magnitude <= 0.0 {
        return MIN_DECIBELS;
    }
    (20.0 * magnitude.log10()).max(MIN_DECIBELS)
}

pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_window() {
        let size = 1024;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_time_domain_is_window_sized_and_clamped() {
        let analyzer = ChannelAnalyzer::new(8);
        let tap = AnalysisTap::new(8);
        tap.push_block(&[0.5, 2.0, -3.0]);

        let samples = analyzer.time_domain(&tap);
        assert_eq!(samples.len(), 8);
        assert_eq!(&samples[5..], &[0.5, 1.0, -1.0]);
    }

    #[test]
    fn test_reads_are_fresh() {
        let analyzer = ChannelAnalyzer::new(4);
        let tap = AnalysisTap::new(4);

        let before = analyzer.time_domain(&tap);
        tap.push_block(&[0.25]);
        let after = analyzer.time_domain(&tap);

        assert_ne!(before, after);
    }

    #[test]
    fn test_spectrum_peaks_at_tone_bin() {
        let window = 1024;
        let analyzer = ChannelAnalyzer::new(window);
        let bin = 64;
        let tone: Vec<f32> = (0..window)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / window as f32).sin())
            .collect();

        let spectrum = analyzer.magnitudes_db(&tone);
        assert_eq!(spectrum.len(), window / 2);

        let peak = spectrum
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, bin);
    }

    #[test]
    fn test_silence_hits_floor() {
        let analyzer = ChannelAnalyzer::new(64);
        let spectrum = analyzer.frequency_domain(&AnalysisTap::new(64));
        assert!(spectrum.iter().all(|db| *db == MIN_DECIBELS));
    }

    #[test]
    fn test_db_conversions() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-20.0) - 0.1).abs() < 1e-6);
        assert!((linear_to_db(0.1) + 20.0).abs() < 1e-4);
    }
}

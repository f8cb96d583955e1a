//! Curve synthesis: stereo snapshots to Lissajous point buffers.
//!
//! Left drives X and right drives Y. A non-identity transform pulls the
//! figure toward a reference curve `(sin(rx·t + φ), sin(ry·t))` so the
//! requested ratio shows through while staying audio-reactive.

use std::f32::consts::TAU;

use crate::audio::{db_to_linear, FrequencyBand};
use crate::params::{BandConfig, CurveTransform, RenderMode, ZMode};

/// Components per point in every geometry buffer (z = 0 in 2D)
pub const POINT_STRIDE: usize = 3;

/// Audio share when blending toward the reference curve
const AUDIO_WEIGHT: f32 = 0.7;

/// Audio share in parametric 3D, where the reference shape dominates
const PARAMETRIC_AUDIO_WEIGHT: f32 = 0.4;

/// Melody emphasis: bins above this quantile (in tenths) of the combined
/// spectrum count
const MELODY_QUANTILE_TENTHS: usize = 9;

/// Upper bound on the melody emphasis factor
const MAX_MELODY_SCALE: f32 = 2.0;

/// One band's points for the current frame
#[derive(Debug, Clone, PartialEq)]
pub struct CurveGeometry {
    pub band: FrequencyBand,
    /// Flat `[x, y, z]` triples
    pub points: Vec<f32>,
    pub color: [f32; 4],
    pub point_size: f32,
    pub render_mode: RenderMode,
}

impl CurveGeometry {
    pub fn new(band: FrequencyBand, points: Vec<f32>, config: &BandConfig) -> Self {
        Self {
            band,
            points,
            color: config.color,
            point_size: config.point_size,
            render_mode: config.render_mode,
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len() / POINT_STRIDE
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Map `min(sample_count, left.len(), right.len())` stereo samples to points
pub fn synthesize(
    left: &[f32],
    right: &[f32],
    sample_count: usize,
    transform: &CurveTransform,
) -> Vec<f32> {
    let count = sample_count.min(left.len()).min(right.len());
    let mut points = Vec::with_capacity(count * POINT_STRIDE);
    let blend = !transform.is_identity();
    let n = count as f32;

    for i in 0..count {
        let (raw_x, raw_y) = (left[i], right[i]);
        let t = TAU * i as f32 / n;

        let ref_x = (transform.ratio_x * t + transform.phase).sin();
        let ref_y = (transform.ratio_y * t).sin();

        let (mut x, mut y) = if blend {
            (mix(raw_x, ref_x, AUDIO_WEIGHT), mix(raw_y, ref_y, AUDIO_WEIGHT))
        } else {
            (raw_x, raw_y)
        };

        let z = if transform.enable_3d {
            match transform.z_mode {
                ZMode::Parametric => {
                    x = mix(raw_x, ref_x, PARAMETRIC_AUDIO_WEIGHT);
                    y = mix(raw_y, ref_y, PARAMETRIC_AUDIO_WEIGHT);
                    (transform.ratio_z * t + transform.phase_z).sin() * transform.z_scale
                }
                ZMode::Time => (i as f32 / n - 0.5) * 2.0 * transform.z_scale,
                ZMode::Frequency => (x * x + y * y).sqrt() * transform.z_scale,
                ZMode::Phase => y.atan2(x).sin() * transform.z_scale,
            }
        } else {
            0.0
        };

        points.extend_from_slice(&[x, y, z]);
    }

    points
}

fn mix(audio: f32, reference: f32, audio_weight: f32) -> f32 {
    audio * audio_weight + reference * (1.0 - audio_weight)
}

/// Magnitude at sorted index `floor(len · 0.9)` of both spectra combined
pub fn percentile_threshold(left_db: &[f32], right_db: &[f32]) -> f32 {
    let mut combined: Vec<f32> = left_db.iter().chain(right_db).copied().collect();
    if combined.is_empty() {
        return f32::INFINITY;
    }
    combined.sort_by(|a, b| a.total_cmp(b));

    let index = (combined.len() * MELODY_QUANTILE_TENTHS / 10).min(combined.len() - 1);
    combined[index]
}

/// Per-channel emphasis `min(2, 1 + energy / bins)`.
///
/// Energy is the linear magnitude summed over bins strictly above the
/// combined threshold. This weights loud dominant partials; it is not
/// pitch tracking.
pub fn melody_scales(left_db: &[f32], right_db: &[f32]) -> (f32, f32) {
    let threshold = percentile_threshold(left_db, right_db);
    (
        channel_scale(left_db, threshold),
        channel_scale(right_db, threshold),
    )
}

fn channel_scale(spectrum_db: &[f32], threshold: f32) -> f32 {
    if spectrum_db.is_empty() {
        return 1.0;
    }
    let energy: f32 = spectrum_db
        .iter()
        .filter(|db| **db > threshold)
        .map(|db| db_to_linear(*db))
        .sum();
    (1.0 + energy / spectrum_db.len() as f32).min(MAX_MELODY_SCALE)
}

/// Scale a time-domain snapshot in place
pub fn emphasize(samples: &mut [f32], scale: f32) {
    samples.iter_mut().for_each(|s| *s *= scale);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo(n: usize) -> (Vec<f32>, Vec<f32>) {
        let left = (0..n).map(|i| (i as f32 * 0.37).sin() * 0.8).collect();
        let right = (0..n).map(|i| (i as f32 * 0.21).cos() * 0.6).collect();
        (left, right)
    }

    fn xyz(points: &[f32], i: usize) -> (f32, f32, f32) {
        (points[i * 3], points[i * 3 + 1], points[i * 3 + 2])
    }

    #[test]
    fn test_identity_path_passes_samples_through() {
        let (left, right) = stereo(64);
        let points = synthesize(&left, &right, 64, &CurveTransform::default());

        assert_eq!(points.len(), 64 * POINT_STRIDE);
        for i in 0..64 {
            assert_eq!(xyz(&points, i), (left[i], right[i], 0.0));
        }
    }

    #[test]
    fn test_point_count_limited_by_shortest_input() {
        let (left, right) = stereo(32);
        let points = synthesize(&left, &right[..20], 100, &CurveTransform::default());
        assert_eq!(points.len() / POINT_STRIDE, 20);

        let points = synthesize(&left, &right, 8, &CurveTransform::default());
        assert_eq!(points.len() / POINT_STRIDE, 8);
    }

    #[test]
    fn test_ratio_blends_toward_reference() {
        let left = vec![0.0; 4];
        let right = vec![0.0; 4];
        let transform = CurveTransform {
            ratio_x: 2.0,
            ..Default::default()
        };
        let points = synthesize(&left, &right, 4, &transform);

        // i = 1: t = π/2, refX = sin(π) ≈ 0, refY = sin(π/2) = 1
        let (x, y, z) = xyz(&points, 1);
        assert!(x.abs() < 1e-6);
        assert!((y - 0.3).abs() < 1e-6);
        assert_eq!(z, 0.0);
    }

    #[test]
    fn test_time_mode_ramps_depth() {
        let (left, right) = stereo(4);
        let transform = CurveTransform {
            enable_3d: true,
            z_mode: ZMode::Time,
            z_scale: 2.0,
            ..Default::default()
        };
        let points = synthesize(&left, &right, 4, &transform);

        let depths: Vec<f32> = (0..4).map(|i| xyz(&points, i).2).collect();
        assert_eq!(depths, vec![-2.0, -1.0, 0.0, 1.0]);
        // X/Y untouched under identity ratios
        assert_eq!(xyz(&points, 2).0, left[2]);
    }

    #[test]
    fn test_frequency_mode_uses_magnitude() {
        let transform = CurveTransform {
            enable_3d: true,
            z_mode: ZMode::Frequency,
            ..Default::default()
        };
        let points = synthesize(&[0.3], &[0.4], 1, &transform);
        assert!((xyz(&points, 0).2 - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_phase_mode_uses_stereo_angle() {
        let transform = CurveTransform {
            enable_3d: true,
            z_mode: ZMode::Phase,
            z_scale: 3.0,
            ..Default::default()
        };
        let points = synthesize(&[0.0, 0.5], &[0.5, 0.0], 2, &transform);
        // 90 degrees then 0 degrees
        assert!((xyz(&points, 0).2 - 3.0).abs() < 1e-6);
        assert!(xyz(&points, 1).2.abs() < 1e-6);
    }

    #[test]
    fn test_parametric_mode_favours_reference() {
        let transform = CurveTransform {
            enable_3d: true,
            z_mode: ZMode::Parametric,
            ratio_z: 1.0,
            phase_z: 0.0,
            z_scale: 1.0,
            ..Default::default()
        };
        let points = synthesize(&[1.0; 4], &[1.0; 4], 4, &transform);

        // i = 1: t = π/2, refX = refY = refZ = 1
        let (x, y, z) = xyz(&points, 1);
        assert!((x - 1.0).abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
        assert!((z - 1.0).abs() < 1e-6);

        // i = 0: refX = refY = 0, audio keeps 40%
        let (x, y, z) = xyz(&points, 0);
        assert!((x - 0.4).abs() < 1e-6);
        assert!((y - 0.4).abs() < 1e-6);
        assert!(z.abs() < 1e-6);
    }

    #[test]
    fn test_flat_output_when_3d_disabled() {
        let (left, right) = stereo(16);
        let transform = CurveTransform {
            enable_3d: false,
            z_mode: ZMode::Frequency,
            ratio_x: 3.0,
            ..Default::default()
        };
        let points = synthesize(&left, &right, 16, &transform);
        assert!(points.chunks(3).all(|p| p[2] == 0.0));
    }

    #[test]
    fn test_threshold_at_ninetieth_percentile() {
        let spectrum: Vec<f32> = (0..10).map(|v| v as f32).collect();

        // Combined sorted length 20, index 18 holds the second 9
        assert_eq!(percentile_threshold(&spectrum, &spectrum), 9.0);
        // Nothing strictly above the threshold: no emphasis
        assert_eq!(melody_scales(&spectrum, &spectrum), (1.0, 1.0));
    }

    #[test]
    fn test_melody_scale_rewards_loud_bins() {
        let mut left = vec![-100.0; 10];
        let right = vec![-100.0; 10];
        left[3] = 0.0;

        // Threshold is -100; one 0 dB bin adds 1.0 energy over 10 bins
        let (l, r) = melody_scales(&left, &right);
        assert!((l - 1.1).abs() < 1e-6);
        assert_eq!(r, 1.0);
    }

    #[test]
    fn test_melody_scale_is_capped() {
        let mut left = vec![-100.0; 10];
        left[0] = 40.0;
        let (l, _) = melody_scales(&left, &[-100.0; 10]);
        assert_eq!(l, MAX_MELODY_SCALE);
    }

    #[test]
    fn test_emphasize() {
        let mut samples = vec![0.5, -0.25];
        emphasize(&mut samples, 2.0);
        assert_eq!(samples, vec![1.0, -0.5]);
    }
}

//! Per-band styling and curve transform parameters.

use crate::audio::FrequencyBand;
use crate::params::RenderMode;

/// Per-band rendering parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BandConfig {
    pub enabled: bool,

    /// RGBA, each component in [0, 1]
    pub color: [f32; 4],

    /// Point sprite diameter (pixels, before 3D attenuation)
    pub point_size: f32,

    /// Number of samples turned into points each frame
    /// Clamped to the analysis window size
    pub trail_length: usize,

    pub render_mode: RenderMode,
}

impl BandConfig {
    fn with_color(color: [f32; 4], enabled: bool) -> Self {
        Self {
            enabled,
            color,
            point_size: 3.0,
            trail_length: 2048,
            render_mode: RenderMode::Points,
        }
    }
}

/// Styling for every band, indexed by [`FrequencyBand`]
#[derive(Debug, Clone, PartialEq)]
pub struct BandSet {
    configs: [BandConfig; FrequencyBand::COUNT],
}

impl Default for BandSet {
    fn default() -> Self {
        Self {
            configs: [
                BandConfig::with_color([1.0, 0.35, 0.2, 1.0], false), // Bass: warm red
                BandConfig::with_color([0.3, 1.0, 0.45, 1.0], false), // Mids: green
                BandConfig::with_color([0.75, 0.4, 1.0, 1.0], false), // Highs: violet
                BandConfig::with_color([0.2, 0.8, 1.0, 1.0], true),   // Melody: cyan
            ],
        }
    }
}

impl BandSet {
    pub fn get(&self, band: FrequencyBand) -> &BandConfig {
        &self.configs[band.index()]
    }

    pub fn get_mut(&mut self, band: FrequencyBand) -> &mut BandConfig {
        &mut self.configs[band.index()]
    }

    /// Enable exactly the listed bands
    pub fn enable_only(&mut self, bands: &[FrequencyBand]) {
        for band in FrequencyBand::ALL {
            self.get_mut(band).enabled = bands.contains(&band);
        }
    }

    /// Enabled bands with their configs, in draw order
    pub fn enabled(&self) -> impl Iterator<Item = (FrequencyBand, &BandConfig)> {
        FrequencyBand::ALL
            .into_iter()
            .map(|band| (band, self.get(band)))
            .filter(|(_, config)| config.enabled)
    }

    /// Apply one setting to every band
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut BandConfig)) {
        self.configs.iter_mut().for_each(|config| f(config));
    }
}

/// How the Z coordinate is derived in 3D mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZMode {
    /// Third oscillator `sin(ratio_z·t + phase_z)`, X/Y pulled toward the reference curve
    #[default]
    Parametric,
    /// Linear depth ramp along the buffer (tunnel)
    Time,
    /// Instantaneous stereo magnitude
    Frequency,
    /// Sine of the stereo phase angle
    Phase,
}

/// Shape bias applied on top of the raw stereo signal
#[derive(Debug, Clone, PartialEq)]
pub struct CurveTransform {
    pub ratio_x: f32,
    pub ratio_y: f32,
    pub ratio_z: f32,

    /// Phase offset of the X reference oscillator (radians)
    pub phase: f32,

    /// Phase offset of the Z reference oscillator (radians)
    pub phase_z: f32,

    pub enable_3d: bool,
    pub z_mode: ZMode,
    pub z_scale: f32,
}

impl Default for CurveTransform {
    fn default() -> Self {
        Self {
            ratio_x: 1.0,
            ratio_y: 1.0,
            ratio_z: 1.0,
            phase: 0.0,
            phase_z: 0.0,
            enable_3d: false,
            z_mode: ZMode::Parametric,
            z_scale: 1.0,
        }
    }
}

impl CurveTransform {
    /// True when X/Y pass through untouched (no reference blend)
    pub fn is_identity(&self) -> bool {
        self.ratio_x == 1.0 && self.ratio_y == 1.0 && self.phase == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_band_set_enables_melody_only() {
        let bands = BandSet::default();
        let enabled: Vec<_> = bands.enabled().map(|(band, _)| band).collect();
        assert_eq!(enabled, vec![FrequencyBand::Melody]);
    }

    #[test]
    fn test_enable_only() {
        let mut bands = BandSet::default();
        bands.enable_only(&[FrequencyBand::Bass, FrequencyBand::Highs]);

        assert!(bands.get(FrequencyBand::Bass).enabled);
        assert!(!bands.get(FrequencyBand::Mids).enabled);
        assert!(bands.get(FrequencyBand::Highs).enabled);
        assert!(!bands.get(FrequencyBand::Melody).enabled);
    }

    #[test]
    fn test_identity_transform() {
        let mut transform = CurveTransform::default();
        assert!(transform.is_identity());

        transform.phase = 0.5;
        assert!(!transform.is_identity());
    }
}

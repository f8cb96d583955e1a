//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use lissajous::audio::{FrequencyBand, Preset};
use lissajous::params::{
    AnalysisConfig, BandSet, BlendMode, CurveTransform, RenderConfig, RenderMode, ZMode,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Lissajous")]
#[command(about = "Audio-driven Lissajous curve visualizer", long_about = None)]
pub struct Args {
    /// Audio file to play (wav, mp3, flac, ogg, ...)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Synthesize a demo tone instead of loading a file (e.g. fifth, maj7)
    #[arg(long, value_name = "PRESET", conflicts_with = "file")]
    pub preset: Option<String>,

    /// Write the demo tone to a WAV file and exit
    #[arg(long, value_name = "PATH", requires = "preset")]
    pub export_wav: Option<PathBuf>,

    /// Bands to draw, comma separated: bass, mids, highs, melody
    #[arg(long, value_name = "LIST", default_value = "melody")]
    pub bands: String,

    /// Perspective 3D view with orbit camera
    #[arg(long = "3d")]
    pub enable_3d: bool,

    /// Z derivation in 3D: parametric (default), time, frequency, phase
    #[arg(long, value_name = "MODE", default_value = "parametric")]
    pub z_mode: String,

    /// Depth multiplier in 3D
    #[arg(long, value_name = "SCALE", default_value = "1.0")]
    pub z_scale: f32,

    /// X reference oscillator ratio
    #[arg(long, value_name = "RATIO", default_value = "1.0")]
    pub ratio_x: f32,

    /// Y reference oscillator ratio
    #[arg(long, value_name = "RATIO", default_value = "1.0")]
    pub ratio_y: f32,

    /// Z reference oscillator ratio (parametric mode)
    #[arg(long, value_name = "RATIO", default_value = "1.0")]
    pub ratio_z: f32,

    /// X reference phase (radians)
    #[arg(long, value_name = "RADIANS", default_value = "0.0", allow_hyphen_values = true)]
    pub phase: f32,

    /// Z reference phase (radians)
    #[arg(long, value_name = "RADIANS", default_value = "0.0", allow_hyphen_values = true)]
    pub phase_z: f32,

    /// Blend mode: additive (default), normal
    #[arg(long, value_name = "MODE", default_value = "additive")]
    pub blend: String,

    /// Primitive: points (default), lines
    #[arg(long, value_name = "MODE", default_value = "points")]
    pub render_mode: String,

    /// Point sprite size (pixels)
    #[arg(long, value_name = "PIXELS", default_value = "3.0")]
    pub point_size: f32,

    /// Samples drawn per band each frame
    #[arg(long, value_name = "SAMPLES", default_value = "2048")]
    pub trail_length: usize,

    /// Analysis window (power of two)
    #[arg(long, value_name = "SAMPLES", default_value = "2048")]
    pub window_size: usize,
}

impl Args {
    /// Parse band list; unknown names are skipped with a warning
    pub fn parse_bands(&self) -> Vec<FrequencyBand> {
        let mut bands = Vec::new();
        for name in self.bands.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.parse::<FrequencyBand>() {
                Ok(band) if !bands.contains(&band) => bands.push(band),
                Ok(_) => {}
                Err(_) => log::warn!("Unknown band '{}', ignoring", name),
            }
        }
        if bands.is_empty() {
            log::warn!("No valid bands given, using melody");
            bands.push(FrequencyBand::Melody);
        }
        bands
    }

    /// Parse Z mode from command-line arguments
    pub fn parse_z_mode(&self) -> ZMode {
        match self.z_mode.to_lowercase().as_str() {
            "parametric" => ZMode::Parametric,
            "time" => ZMode::Time,
            "frequency" => ZMode::Frequency,
            "phase" => ZMode::Phase,
            other => {
                log::warn!("Unknown z mode '{}', using parametric", other);
                ZMode::Parametric
            }
        }
    }

    pub fn parse_blend_mode(&self) -> BlendMode {
        match self.blend.to_lowercase().as_str() {
            "additive" => BlendMode::Additive,
            "normal" => BlendMode::Normal,
            other => {
                log::warn!("Unknown blend mode '{}', using additive", other);
                BlendMode::Additive
            }
        }
    }

    pub fn parse_render_mode(&self) -> RenderMode {
        match self.render_mode.to_lowercase().as_str() {
            "points" => RenderMode::Points,
            "lines" => RenderMode::Lines,
            other => {
                log::warn!("Unknown render mode '{}', using points", other);
                RenderMode::Points
            }
        }
    }

    /// Look up the requested demo preset, if any
    pub fn parse_preset(&self) -> Result<Option<Preset>, String> {
        match &self.preset {
            None => Ok(None),
            Some(id) => Preset::find(&id.to_lowercase()).map(Some).ok_or_else(|| {
                let known: Vec<&str> = Preset::ids().collect();
                format!("Unknown preset '{}' (known: {})", id, known.join(", "))
            }),
        }
    }

    pub fn curve_transform(&self) -> CurveTransform {
        CurveTransform {
            ratio_x: self.ratio_x,
            ratio_y: self.ratio_y,
            ratio_z: self.ratio_z,
            phase: self.phase,
            phase_z: self.phase_z,
            enable_3d: self.enable_3d,
            z_mode: self.parse_z_mode(),
            z_scale: self.z_scale,
        }
    }

    pub fn band_set(&self) -> BandSet {
        let mut bands = BandSet::default();
        bands.enable_only(&self.parse_bands());
        let render_mode = self.parse_render_mode();
        bands.for_each_mut(|config| {
            config.point_size = self.point_size;
            config.trail_length = self.trail_length;
            config.render_mode = render_mode;
        });
        bands
    }

    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            window_size: self.window_size,
            ..Default::default()
        }
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            blend_mode: self.parse_blend_mode(),
            enable_3d: self.enable_3d,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["lissajous", "song.mp3"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("song.mp3")));
        assert_eq!(args.parse_bands(), vec![FrequencyBand::Melody]);
        assert_eq!(args.curve_transform(), CurveTransform::default());
        assert_eq!(args.band_set(), BandSet::default());
        assert!(args.analysis_config().validate().is_ok());
    }

    #[test]
    fn test_band_list() {
        let args =
            Args::try_parse_from(["lissajous", "--bands", "bass, highs,bogus,bass"]).unwrap();
        assert_eq!(
            args.parse_bands(),
            vec![FrequencyBand::Bass, FrequencyBand::Highs]
        );
    }

    #[test]
    fn test_3d_transform() {
        let args = Args::try_parse_from([
            "lissajous",
            "--3d",
            "--z-mode",
            "time",
            "--ratio-x",
            "3",
            "--phase",
            "-0.5",
        ])
        .unwrap();
        let transform = args.curve_transform();
        assert!(transform.enable_3d);
        assert_eq!(transform.z_mode, ZMode::Time);
        assert_eq!(transform.ratio_x, 3.0);
        assert_eq!(transform.phase, -0.5);
        assert!(args.render_config().enable_3d);
    }

    #[test]
    fn test_unknown_modes_fall_back() {
        let args = Args::try_parse_from([
            "lissajous",
            "--z-mode",
            "spiral",
            "--blend",
            "screen",
            "--render-mode",
            "lines",
        ])
        .unwrap();
        assert_eq!(args.parse_z_mode(), ZMode::Parametric);
        assert_eq!(args.parse_blend_mode(), BlendMode::Additive);
        assert_eq!(args.parse_render_mode(), RenderMode::Lines);
    }

    #[test]
    fn test_preset_lookup() {
        let args = Args::try_parse_from(["lissajous", "--preset", "Fifth"]).unwrap();
        assert!(matches!(args.parse_preset(), Ok(Some(Preset::Interval(_)))));

        let args = Args::try_parse_from(["lissajous", "--preset", "nope"]).unwrap();
        assert!(args.parse_preset().is_err());
    }

    #[test]
    fn test_export_requires_preset() {
        assert!(Args::try_parse_from(["lissajous", "--export-wav", "out.wav"]).is_err());
        assert!(
            Args::try_parse_from(["lissajous", "--preset", "sine", "--export-wav", "o.wav"])
                .is_ok()
        );
    }
}

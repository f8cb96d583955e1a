//! Audio analysis configuration and band crossover constants.

/// Analysis window and band-splitting configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Samples per analysis snapshot (must be power of 2)
    /// Shared by every tap for the lifetime of an engine
    pub window_size: usize,

    /// Bass low-pass cutoff (Hz)
    pub bass_cutoff_hz: f32,

    /// Mids band-pass center (Hz)
    /// Midpoint of the bass and highs cutoffs
    pub mids_center_hz: f32,

    /// Highs high-pass cutoff (Hz)
    pub highs_cutoff_hz: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_size: 2048,
            bass_cutoff_hz: 250.0,
            mids_center_hz: 2125.0,
            highs_cutoff_hz: 4000.0,
        }
    }
}

impl AnalysisConfig {
    /// Smallest window the analyzer accepts
    pub const MIN_WINDOW_SIZE: usize = 32;

    /// Number of frequency bins in a spectrum snapshot
    pub fn bin_count(&self) -> usize {
        self.window_size / 2
    }

    /// Quality factor for the mids band-pass so its -3 dB edges land
    /// near the bass and highs cutoffs
    pub fn mids_q(&self) -> f32 {
        let bandwidth = self.highs_cutoff_hz - self.bass_cutoff_hz;
        if bandwidth <= 0.0 {
            return std::f32::consts::FRAC_1_SQRT_2;
        }
        self.mids_center_hz / bandwidth
    }

    /// Validate configuration (window must be power of 2, cutoffs ordered)
    pub fn validate(&self) -> Result<(), String> {
        if !self.window_size.is_power_of_two() {
            return Err(format!(
                "Window size must be power of 2, got {}",
                self.window_size
            ));
        }
        if self.window_size < Self::MIN_WINDOW_SIZE {
            return Err(format!(
                "Window size must be at least {}, got {}",
                Self::MIN_WINDOW_SIZE,
                self.window_size
            ));
        }
        if self.bass_cutoff_hz <= 0.0 {
            return Err("Bass cutoff must be > 0".to_string());
        }
        if !(self.bass_cutoff_hz < self.mids_center_hz
            && self.mids_center_hz < self.highs_cutoff_hz)
        {
            return Err(format!(
                "Band frequencies must ascend: bass {} < mids {} < highs {}",
                self.bass_cutoff_hz, self.mids_center_hz, self.highs_cutoff_hz
            ));
        }
        Ok(())
    }
}

/// Audio constants (compile-time, match the output callback)
pub mod audio_constants {
    /// Frames pushed through the band graph per processing block
    /// 128 = 2.9ms @ 44.1kHz
    pub const BLOCK_SIZE: usize = 128;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 1024);
    }

    #[test]
    fn test_rejects_non_power_of_two_window() {
        let config = AnalysisConfig {
            window_size: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unordered_bands() {
        let config = AnalysisConfig {
            mids_center_hz: 100.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mids_q_spans_bass_to_highs() {
        let config = AnalysisConfig::default();
        let q = config.mids_q();
        assert!((q - 2125.0 / 3750.0).abs() < 1e-6);
    }
}

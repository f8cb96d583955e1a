//! Rendering configuration.

/// How overlapping curves combine in the frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Sum contributions (bright overlaps)
    #[default]
    Additive,
    /// Standard alpha compositing
    Normal,
}

/// Primitive used to draw a curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Circular soft-edged point sprites
    #[default]
    Points,
    /// Connected line strip
    Lines,
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Alpha of the per-frame fade toward black
    /// 0.05 = long persistence trails, 1.0 = full clear
    pub clear_alpha: f32,

    /// Global blend mode for all bands
    pub blend_mode: BlendMode,

    /// Perspective camera with depth testing (false = flat orthographic)
    pub enable_3d: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            clear_alpha: 0.05,
            blend_mode: BlendMode::Additive,
            enable_3d: false,
        }
    }
}

impl RenderConfig {
    /// Width over height; a zero-height (minimized) window counts as 1 px
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio() {
        let config = RenderConfig::default();
        assert!((config.aspect_ratio() - 1280.0 / 720.0).abs() < 1e-6);

        let minimized = RenderConfig {
            window_width: 800,
            window_height: 0,
            ..Default::default()
        };
        assert_eq!(minimized.aspect_ratio(), 800.0);
    }
}

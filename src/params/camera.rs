//! Orbit camera defaults, limits and input speeds.

/// Orbit camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Initial orbit distance from target (world units)
    pub distance: f32,

    /// Initial horizontal rotation (radians)
    pub azimuth: f32,

    /// Initial vertical rotation (radians)
    pub elevation: f32,

    /// Initial look-at target
    pub target: [f32; 3],

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane
    pub near: f32,

    /// Far clipping plane
    pub far: f32,

    /// Closest allowed orbit distance
    pub min_distance: f32,

    /// Farthest allowed orbit distance
    pub max_distance: f32,

    /// Margin kept between elevation and the poles (radians)
    pub elevation_epsilon: f32,

    /// Orbit speed (radians per pixel of drag)
    pub rotation_speed: f32,

    /// Pan speed (world units per pixel, multiplied by distance)
    pub pan_speed: f32,

    /// Zoom speed (fraction of distance per 100 wheel units)
    pub zoom_speed: f32,

    /// Discrete rotation/pan step for keys
    pub key_step: f32,

    /// Discrete zoom step for keys
    pub key_zoom_step: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 3.5,
            azimuth: 0.0,
            elevation: 0.0,
            target: [0.0, 0.0, 0.0],
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            min_distance: 0.5,
            max_distance: 20.0,
            elevation_epsilon: 0.01,
            rotation_speed: 0.005,
            pan_speed: 0.002,
            zoom_speed: 0.1,
            key_step: 0.1,
            key_zoom_step: 0.2,
        }
    }
}

impl CameraConfig {
    /// Largest elevation magnitude the camera may reach
    pub fn max_elevation(&self) -> f32 {
        std::f32::consts::FRAC_PI_2 - self.elevation_epsilon
    }
}

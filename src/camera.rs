//! Orbit camera around a target point, driven by mouse and keys.

use glam::{Mat4, Vec3};

use crate::params::CameraConfig;

/// Spherical orbit state read by the renderer each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Distance from target (world units)
    pub distance: f32,
    /// Horizontal rotation (radians)
    pub azimuth: f32,
    /// Vertical rotation (radians)
    pub elevation: f32,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraState {
    fn from_config(config: &CameraConfig) -> Self {
        Self {
            distance: config.distance,
            azimuth: config.azimuth,
            elevation: config.elevation,
            target: Vec3::from_array(config.target),
            fov_degrees: config.fov_degrees,
            near: config.near,
            far: config.far,
        }
    }

    /// Unit vector from target toward the eye
    fn orbit_direction(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        let (sin_el, cos_el) = self.elevation.sin_cos();
        Vec3::new(cos_el * sin_az, sin_el, cos_el * cos_az)
    }

    /// Camera right vector (always horizontal, Y is up)
    fn right(&self) -> Vec3 {
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        Vec3::new(cos_az, 0.0, -sin_az)
    }

    /// Camera up vector (perpendicular to right and view direction)
    fn up(&self) -> Vec3 {
        let forward = -self.orbit_direction();
        self.right().cross(forward)
    }
}

/// Orbit camera with a single mutation entry point.
///
/// Every change goes through [`OrbitCamera::update`], which re-applies the
/// elevation and distance limits before the state becomes visible.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    config: CameraConfig,
    state: CameraState,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let mut camera = Self {
            state: CameraState::from_config(&config),
            config,
        };
        camera.update(|_| {});
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Current snapshot
    pub fn state(&self) -> CameraState {
        self.state
    }

    /// Mutate the state, then clamp it back into range
    pub fn update(&mut self, mutate: impl FnOnce(&mut CameraState)) {
        let mut next = self.state;
        mutate(&mut next);

        let max_elevation = self.config.max_elevation();
        next.elevation = next.elevation.clamp(-max_elevation, max_elevation);
        next.distance = next
            .distance
            .clamp(self.config.min_distance, self.config.max_distance);

        self.state = next;
    }

    /// Back to the configured defaults
    pub fn reset(&mut self) {
        let initial = CameraState::from_config(&self.config);
        self.update(|state| *state = initial);
    }

    pub fn eye_position(&self) -> Vec3 {
        self.state.target + self.state.orbit_direction() * self.state.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye_position(), self.state.target, Vec3::Y)
    }

    /// Perspective in 3D; aspect-corrected orthographic over [-1, 1] in 2D
    pub fn projection(&self, aspect: f32, enable_3d: bool) -> Mat4 {
        if enable_3d {
            Mat4::perspective_rh(
                self.state.fov_degrees.to_radians(),
                aspect,
                self.state.near,
                self.state.far,
            )
        } else {
            ortho(aspect)
        }
    }

    /// Combined transform for the curve shader (2D ignores the orbit)
    pub fn view_proj(&self, aspect: f32, enable_3d: bool) -> Mat4 {
        if enable_3d {
            self.projection(aspect, true) * self.view_matrix()
        } else {
            self.projection(aspect, false)
        }
    }
}

/// Flat projection keeping the unit square undistorted at any aspect
pub fn ortho(aspect: f32) -> Mat4 {
    let aspect = aspect.max(f32::EPSILON);
    if aspect >= 1.0 {
        Mat4::orthographic_rh(-aspect, aspect, -1.0, 1.0, -1.0, 1.0)
    } else {
        Mat4::orthographic_rh(-1.0, 1.0, -1.0 / aspect, 1.0 / aspect, -1.0, 1.0)
    }
}

/// Mouse buttons the controller distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragButton {
    Primary,
    Secondary,
}

/// Discrete camera commands bound to keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKey {
    RotateLeft,
    RotateRight,
    RotateUp,
    RotateDown,
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    ZoomIn,
    ZoomOut,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Orbit,
    Pan,
}

/// Turns pointer and key input into camera updates
#[derive(Debug, Default)]
pub struct CameraController {
    drag: Option<DragMode>,
    last_cursor: Option<(f64, f64)>,
    shift_held: bool,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_shift(&mut self, held: bool) {
        self.shift_held = held;
    }

    /// Primary drags orbit; secondary or shift+primary drags pan
    pub fn button_pressed(&mut self, button: DragButton) {
        self.drag = match (button, self.shift_held) {
            (DragButton::Primary, false) => Some(DragMode::Orbit),
            _ => Some(DragMode::Pan),
        };
    }

    pub fn button_released(&mut self) {
        self.drag = None;
    }

    pub fn cursor_moved(&mut self, camera: &mut OrbitCamera, x: f64, y: f64) {
        let previous = self.last_cursor.replace((x, y));
        let (Some(mode), Some((last_x, last_y))) = (self.drag, previous) else {
            return;
        };
        let dx = (x - last_x) as f32;
        let dy = (y - last_y) as f32;

        let rotation_speed = camera.config().rotation_speed;
        let pan_speed = camera.config().pan_speed;

        match mode {
            DragMode::Orbit => camera.update(|state| {
                state.azimuth -= dx * rotation_speed;
                state.elevation += dy * rotation_speed;
            }),
            DragMode::Pan => camera.update(|state| {
                let scale = pan_speed * state.distance;
                let offset = (state.right() * -dx + state.up() * dy) * scale;
                state.target += offset;
            }),
        }
    }

    /// Positive `delta` (scroll down) zooms out
    pub fn wheel(&mut self, camera: &mut OrbitCamera, delta: f32) {
        let zoom_speed = camera.config().zoom_speed;
        camera.update(|state| {
            state.distance *= 1.0 + delta * zoom_speed * 0.01;
        });
    }

    pub fn key(&mut self, camera: &mut OrbitCamera, key: CameraKey) {
        let step = camera.config().key_step;
        let zoom_step = camera.config().key_zoom_step;

        match key {
            CameraKey::RotateLeft => camera.update(|s| s.azimuth -= step),
            CameraKey::RotateRight => camera.update(|s| s.azimuth += step),
            CameraKey::RotateUp => camera.update(|s| s.elevation += step),
            CameraKey::RotateDown => camera.update(|s| s.elevation -= step),
            CameraKey::MoveForward => camera.update(|s| s.target += horizontal_forward(s) * step),
            CameraKey::MoveBack => camera.update(|s| s.target -= horizontal_forward(s) * step),
            CameraKey::MoveLeft => camera.update(|s| s.target -= s.right() * step),
            CameraKey::MoveRight => camera.update(|s| s.target += s.right() * step),
            CameraKey::ZoomIn => camera.update(|s| s.distance -= zoom_step),
            CameraKey::ZoomOut => camera.update(|s| s.distance += zoom_step),
            CameraKey::Reset => camera.reset(),
        }
    }
}

/// View direction projected onto the ground plane
fn horizontal_forward(state: &CameraState) -> Vec3 {
    let (sin_az, cos_az) = state.azimuth.sin_cos();
    Vec3::new(-sin_az, 0.0, -cos_az)
}

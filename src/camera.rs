use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Field-of-view step and clamp bounds applied by [`Camera::zoom`].
///
/// The bounds keep the projection away from degenerate or inverted
/// frustums; they are configuration rather than constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub step: f32,
    pub min_fov: f32,
    pub max_fov: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            step: 0.05,
            min_fov: 15.0_f32.to_radians(),
            max_fov: 90.0_f32.to_radians(),
        }
    }
}

/// Perspective camera: projection parameters plus view parameters.
///
/// Stateless with respect to models; `compute_mvp` is a pure function of
/// the camera fields and the matrix passed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    fov: f32,
    aspect_ratio: f32,
    near: f32,
    far: f32,
    position: Vec3,
    target: Vec3,
    up: Vec3,
    zoom: ZoomLimits,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov: 45.0_f32.to_radians(),
            aspect_ratio: 4.0 / 3.0,
            near: 0.1,
            far: 100.0,
            position: Vec3::splat(10.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            zoom: ZoomLimits::default(),
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_aspect_ratio(&mut self, value: f32) {
        self.aspect_ratio = value.max(0.01);
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_zoom_limits(&mut self, limits: ZoomLimits) {
        self.zoom = limits;
    }

    /// Steps the field of view in (`true`) or out (`false`), clamped to
    /// the configured limits.
    pub fn zoom(&mut self, zoom_in: bool) {
        let step = if zoom_in { -self.zoom.step } else { self.zoom.step };
        self.fov = (self.fov + step).clamp(self.zoom.min_fov, self.zoom.max_fov);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect_ratio, self.near, self.far)
    }

    /// Combined model-view-projection matrix for one draw call.
    pub fn compute_mvp(&self, model: Mat4) -> Mat4 {
        self.projection_matrix() * self.view_matrix() * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mvp_is_deterministic() {
        let camera = Camera::new();
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(camera.compute_mvp(model), camera.compute_mvp(model));
    }

    #[test]
    fn zoom_in_narrows_the_fov() {
        let mut camera = Camera::new();
        let before = camera.fov();
        camera.zoom(true);
        assert!(camera.fov() < before);
    }

    #[test]
    fn zoom_clamps_at_the_configured_bounds() {
        let mut camera = Camera::new();
        let limits = ZoomLimits::default();
        for _ in 0..1000 {
            camera.zoom(true);
        }
        assert!((camera.fov() - limits.min_fov).abs() < 1e-6);
        for _ in 0..1000 {
            camera.zoom(false);
        }
        assert!((camera.fov() - limits.max_fov).abs() < 1e-6);
    }

    #[test]
    fn mvp_composes_projection_view_model() {
        let camera = Camera::new();
        let model = Mat4::from_rotation_y(0.5);
        let expected = camera.projection_matrix() * camera.view_matrix() * model;
        assert_eq!(camera.compute_mvp(model), expected);
    }

    #[test]
    fn aspect_ratio_never_degenerates() {
        let mut camera = Camera::new();
        camera.set_aspect_ratio(0.0);
        assert!(camera.aspect_ratio() > 0.0);
    }
}

//! Camera and the frustum capability consumed by the underwater stage.

use glam::{Mat4, Vec3};
use ocean_core::{frustum_planes, Plane, Transform};

/// Which eye a matrix or horizon is computed for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Eye {
    #[default]
    Mono,
    Left,
    Right,
}

/// How stereo rendering submits the two eyes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StereoMode {
    /// No stereo.
    #[default]
    Mono,
    /// One pass per eye; the camera's projection is already the current eye's.
    MultiPass,
    /// Both eyes in one pass, each with its own projection.
    SinglePass,
}

impl StereoMode {
    /// True when left and right projections must both be supplied to the shader.
    pub fn uses_dual_projection(self) -> bool {
        matches!(self, StereoMode::SinglePass)
    }
}

/// Read-only access to a camera's frustum.
pub trait FrustumSource {
    /// World-to-camera matrix (shared by both eyes).
    fn view_matrix(&self) -> Mat4;
    /// Projection for the given eye. `Eye::Mono` returns the camera's current projection.
    fn projection_matrix(&self, eye: Eye) -> Mat4;
    /// Far clip distance along the view direction.
    fn far_clip(&self) -> f32;
    fn transform(&self) -> Transform;
    fn stereo_mode(&self) -> StereoMode;

    fn position(&self) -> Vec3 {
        self.transform().position
    }

    fn forward(&self) -> Vec3 {
        self.transform().forward()
    }

    fn right(&self) -> Vec3 {
        self.transform().right()
    }

    fn up(&self) -> Vec3 {
        self.transform().up()
    }

    fn inverse_view_projection(&self, eye: Eye) -> Mat4 {
        (self.projection_matrix(eye) * self.view_matrix()).inverse()
    }

    /// Culling planes for the mono projection.
    fn frustum_planes(&self) -> [Plane; 6] {
        frustum_planes(self.projection_matrix(Eye::Mono) * self.view_matrix())
    }

    /// Map a viewport point (`x`, `y` in `[0, 1]`, `z` = view depth in world units) to world space.
    fn viewport_to_world(&self, viewport: Vec3, eye: Eye) -> Vec3 {
        let ndc = Vec3::new(viewport.x * 2.0 - 1.0, viewport.y * 2.0 - 1.0, 1.0);
        let on_far_plane = self.inverse_view_projection(eye).project_point3(ndc);
        let origin = self.position();
        let ray = on_far_plane - origin;
        let along = ray.dot(self.forward());
        if along.abs() <= f32::EPSILON {
            return on_far_plane;
        }
        origin + ray * (viewport.z / along)
    }
}

/// Perspective camera with optional stereo lens shift.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera transform (position and rotation).
    pub transform: Transform,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Near clipping plane.
    pub near: f32,
    /// Far clipping plane.
    pub far: f32,
    /// Aspect ratio (width / height).
    pub aspect: f32,
    pub stereo_mode: StereoMode,
    /// Horizontal clip-space offset applied per eye (left +, right -).
    pub stereo_lens_shift: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            fov_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            aspect: 16.0 / 9.0,
            stereo_mode: StereoMode::Mono,
            stereo_lens_shift: 0.03,
        }
    }
}

impl Camera {
    /// Create a new camera at the given position.
    pub fn new(position: Vec3) -> Self {
        Self {
            transform: Transform::from_position(position),
            ..Default::default()
        }
    }

    /// Update aspect ratio (call on viewport resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// Set yaw and pitch (in radians) and rebuild rotation, dropping any roll.
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        let max_pitch = std::f32::consts::FRAC_PI_2 - 0.01;
        let pitch = pitch.clamp(-max_pitch, max_pitch);
        self.transform.rotation = glam::Quat::from_rotation_y(yaw) * glam::Quat::from_rotation_x(pitch);
    }

    /// Roll around the view axis, on top of the current yaw/pitch.
    pub fn roll(&mut self, angle: f32) {
        self.transform.rotate_z(angle);
    }

    fn base_projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }
}

impl FrustumSource for Camera {
    fn view_matrix(&self) -> Mat4 {
        self.transform.world_to_local()
    }

    fn projection_matrix(&self, eye: Eye) -> Mat4 {
        let shift = match eye {
            Eye::Mono => return self.base_projection(),
            Eye::Left => self.stereo_lens_shift,
            Eye::Right => -self.stereo_lens_shift,
        };
        // Clip-space x offset scaled by w: an off-axis frustum
        Mat4::from_translation(Vec3::new(shift, 0.0, 0.0)) * self.base_projection()
    }

    fn far_clip(&self) -> f32 {
        self.far
    }

    fn transform(&self) -> Transform {
        self.transform
    }

    fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_center_lands_on_view_axis() {
        let mut cam = Camera::new(Vec3::new(0.0, 10.0, 0.0));
        cam.set_yaw_pitch(0.0, 0.0);
        let p = cam.viewport_to_world(Vec3::new(0.5, 0.5, cam.far), Eye::Mono);
        assert!((p - Vec3::new(0.0, 10.0, -1000.0)).length() < 0.5);
    }

    /// Far-plane corners are at view depth `far`, not at distance `far`.
    #[test]
    fn viewport_corner_respects_view_depth() {
        let mut cam = Camera::new(Vec3::ZERO);
        cam.set_yaw_pitch(0.3, -0.2);
        let p = cam.viewport_to_world(Vec3::new(0.0, 1.0, 50.0), Eye::Mono);
        let depth = (p - cam.position()).dot(cam.forward());
        assert!((depth - 50.0).abs() < 0.05);
    }

    #[test]
    fn eyes_have_distinct_projections() {
        let cam = Camera::default();
        let left = cam.projection_matrix(Eye::Left);
        let right = cam.projection_matrix(Eye::Right);
        assert_ne!(left, right);
        assert_ne!(left, cam.projection_matrix(Eye::Mono));
    }

    #[test]
    fn only_single_pass_uses_dual_projection() {
        assert!(!StereoMode::Mono.uses_dual_projection());
        assert!(!StereoMode::MultiPass.uses_dual_projection());
        assert!(StereoMode::SinglePass.uses_dual_projection());
    }
}

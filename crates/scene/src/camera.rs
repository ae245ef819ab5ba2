use glam::{Mat4, Quat, Vec3};
use roomview_common::Transform;

/// Perspective camera looking from `position` towards `target`.
///
/// The projection matrix is cached: after changing `fov_degrees`, `aspect`,
/// `near` or `far`, call [`PerspectiveCamera::update_projection_matrix`].
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(50.0, 1.0)
    }
}

impl PerspectiveCamera {
    pub fn new(fov_degrees: f32, aspect: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fov_degrees,
            aspect,
            near: 0.1,
            far: 2000.0,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far);
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Camera-to-world rotation.
    pub fn orientation(&self) -> Quat {
        Quat::from_mat4(&self.view_matrix().inverse())
    }

    /// World-space right vector of the view.
    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    /// World-space up vector of the view.
    pub fn view_up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }

    /// Node transform mirroring this camera's placement in the scene.
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.orientation(),
            scale: Vec3::ONE,
        }
    }
}

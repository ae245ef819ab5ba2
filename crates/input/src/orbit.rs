use crate::action::Action;
use glam::Vec3;
use roomview_scene::PerspectiveCamera;
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;

/// Spherical coordinates around a target: `phi` is the polar angle from +Y,
/// `theta` the azimuth around Y measured from +Z.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Spherical {
    radius: f32,
    phi: f32,
    theta: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
            theta: v.x.atan2(v.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let s = self.phi.sin() * self.radius;
        Vec3::new(
            s * self.theta.sin(),
            self.phi.cos() * self.radius,
            s * self.theta.cos(),
        )
    }
}

/// Orbits a camera around a target point with optional damping.
///
/// Input accumulates into pending deltas; [`OrbitControl::update`] applies them.
/// With damping enabled only `damping_factor` of the pending rotation and pan
/// is applied per tick and the remainder decays geometrically, so motion
/// eases out over several frames after input stops.
#[derive(Debug, Clone)]
pub struct OrbitControl {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vec3,
    last_position: Option<Vec3>,
}

impl Default for OrbitControl {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            last_position: None,
        }
    }
}

impl OrbitControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an input action. The camera is read for pan direction and distance.
    pub fn apply(&mut self, action: Action, camera: &PerspectiveCamera) {
        match action {
            Action::Orbit { dx, dy } => {
                self.rotate_left(TAU * dx * self.rotate_speed);
                self.rotate_up(TAU * dy * self.rotate_speed);
            }
            Action::Dolly(steps) => {
                let dolly = 0.95_f32.powf(self.zoom_speed * steps.abs());
                if steps > 0.0 {
                    self.scale *= dolly;
                } else if steps < 0.0 {
                    self.scale /= dolly;
                }
            }
            Action::Pan { dx, dy } => {
                let distance = (camera.position - self.target).length()
                    * (camera.fov_degrees.to_radians() * 0.5).tan();
                self.pan_offset -= camera.right() * (2.0 * dx * distance);
                self.pan_offset += camera.view_up() * (2.0 * dy * distance);
            }
        }
        tracing::trace!(?action, "orbit input");
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Advance one tick and move `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.spherical_delta.theta * step;
        spherical.phi += self.spherical_delta.phi * step;
        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);

        self.target += self.pan_offset * step;

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if self.enable_damping {
            self.spherical_delta.theta *= 1.0 - self.damping_factor;
            self.spherical_delta.phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = self
            .last_position
            .is_none_or(|last| last.distance_squared(camera.position) > EPS);
        self.last_position = Some(camera.position);
        moved
    }
}

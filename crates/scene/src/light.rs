use glam::{Mat4, UVec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Orthographic volume used when rendering a directional light's shadow map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowCamera {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub near: f32,
    pub far: f32,
}

impl ShadowCamera {
    /// Symmetric bounds of `±extent` on every side.
    pub fn symmetric(extent: f32) -> Self {
        Self {
            left: -extent,
            right: extent,
            top: extent,
            bottom: -extent,
            ..Self::default()
        }
    }
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self {
            left: -5.0,
            right: 5.0,
            top: 5.0,
            bottom: -5.0,
            near: 0.5,
            far: 500.0,
        }
    }
}

/// Shadow map parameters. Recorded on the light; no shadow pass consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    pub map_size: UVec2,
    pub bias: f32,
    pub camera: ShadowCamera,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            map_size: UVec2::splat(512),
            bias: 0.0,
            camera: ShadowCamera::default(),
        }
    }
}

/// Light shining from its node position towards `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub target: Vec3,
    pub cast_shadow: bool,
    pub shadow: ShadowConfig,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
            target: Vec3::ZERO,
            cast_shadow: false,
            shadow: ShadowConfig::default(),
        }
    }
}

impl DirectionalLight {
    /// Unit vector pointing from the target towards a light placed at `position`.
    pub fn direction_from(&self, position: Vec3) -> Vec3 {
        (position - self.target).normalize_or_zero()
    }

    /// The 12 edges of the shadow frustum in world space, for a light at `position`.
    pub fn shadow_frustum_lines(&self, position: Vec3) -> Vec<[Vec3; 2]> {
        let cam = &self.shadow.camera;
        let light_to_world = Mat4::look_at_rh(position, self.target, Vec3::Y).inverse();
        let corner = |x: f32, y: f32, z: f32| {
            (light_to_world * Vec4::new(x, y, -z, 1.0)).truncate()
        };
        let near = [
            corner(cam.left, cam.bottom, cam.near),
            corner(cam.right, cam.bottom, cam.near),
            corner(cam.right, cam.top, cam.near),
            corner(cam.left, cam.top, cam.near),
        ];
        let far = [
            corner(cam.left, cam.bottom, cam.far),
            corner(cam.right, cam.bottom, cam.far),
            corner(cam.right, cam.top, cam.far),
            corner(cam.left, cam.top, cam.far),
        ];
        let mut lines = Vec::with_capacity(12);
        for i in 0..4 {
            let j = (i + 1) % 4;
            lines.push([near[i], near[j]]);
            lines.push([far[i], far[j]]);
            lines.push([near[i], far[i]]);
        }
        lines
    }
}

/// Uniform light applied to every lit surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Directional(DirectionalLight),
    Ambient(AmbientLight),
}

use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Handle to geometry stored in a [`crate::Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(pub u64);

/// Indexed triangle list with per-vertex normals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned quad in the XY plane, centered at the origin, facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let w = width * 0.5;
        let h = height * 0.5;
        let n = [0.0, 0.0, 1.0];
        #[rustfmt::skip]
        let positions = vec![
            [-w, -h, 0.0],
            [ w, -h, 0.0],
            [ w,  h, 0.0],
            [-w,  h, 0.0],
        ];
        Self {
            positions,
            normals: vec![n; 4],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Bake `matrix` into the vertex data.
    pub fn transformed(mut self, matrix: Mat4) -> Self {
        let normal_matrix = Mat3::from_mat4(matrix).inverse().transpose();
        for p in &mut self.positions {
            *p = matrix.transform_point3(Vec3::from(*p)).to_array();
        }
        for n in &mut self.normals {
            *n = (normal_matrix * Vec3::from(*n)).normalize_or_zero().to_array();
        }
        self
    }

    pub fn translated(self, offset: Vec3) -> Self {
        self.transformed(Mat4::from_translation(offset))
    }

    pub fn rotated_x(self, angle: f32) -> Self {
        self.transformed(Mat4::from_rotation_x(angle))
    }

    /// Area-weighted vertex normals, used when imported geometry carries none.
    pub fn compute_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.positions.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) = (
                self.positions.get(a),
                self.positions.get(b),
                self.positions.get(c),
            ) else {
                continue;
            };
            let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
            let face = (pb - pa).cross(pc - pa);
            acc[a] += face;
            acc[b] += face;
            acc[c] += face;
        }
        self.normals = acc
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect();
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

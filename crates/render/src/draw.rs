use glam::{Mat4, Vec3};
use roomview_common::EntityId;
use roomview_scene::{Light, Material, MaterialKind, MeshId, NodeKind, Scene, Side, StencilFunc, StencilOp};

/// Fixed-function state a backend needs a distinct pipeline for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub side: Side,
    pub lit: bool,
    pub color_write: bool,
    pub depth_write: bool,
    pub stencil_func: StencilFunc,
    pub stencil_pass: StencilOp,
}

impl PipelineKey {
    pub fn for_material(material: &Material) -> Self {
        let stencil = material.stencil.unwrap_or_else(|| roomview_scene::StencilState {
            func: StencilFunc::Always,
            reference: 0,
            z_pass: StencilOp::Keep,
        });
        Self {
            side: material.side,
            lit: material.kind == MaterialKind::Physical,
            color_write: material.color_write,
            depth_write: material.depth_write,
            stencil_func: stencil.func,
            stencil_pass: stencil.z_pass,
        }
    }
}

/// One mesh draw, flattened out of the scene graph.
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub entity: EntityId,
    pub mesh: MeshId,
    pub model: Mat4,
    pub material: Material,
}

impl DrawItem {
    pub fn key(&self) -> PipelineKey {
        PipelineKey::for_material(&self.material)
    }

    /// Dynamic stencil reference to set before drawing.
    pub fn stencil_reference(&self) -> u32 {
        self.material.stencil.map_or(0, |s| u32::from(s.reference))
    }

    pub fn writes_stencil(&self) -> bool {
        self.material.stencil.is_some_and(|s| s.writes())
    }
}

/// World-space debug line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub start: Vec3,
    pub end: Vec3,
    pub color: [f32; 4],
}

/// Scene lighting reduced to what a forward shader needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Unit vector towards the directional light.
    pub direction: Vec3,
    /// Directional color pre-multiplied by intensity.
    pub directional: Vec3,
    /// Ambient color pre-multiplied by intensity.
    pub ambient: Vec3,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            direction: Vec3::Y,
            directional: Vec3::ZERO,
            ambient: Vec3::ZERO,
        }
    }
}

/// Everything a backend draws for one frame, in submission order.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub items: Vec<DrawItem>,
    pub lines: Vec<LineSegment>,
    pub lighting: Lighting,
}

impl DrawList {
    /// Flatten `scene` into draws.
    ///
    /// Stencil writers come first so every stencil test downstream sees the
    /// final mask; all other draws keep scene traversal order.
    pub fn build(scene: &Scene) -> Self {
        let mut list = Self::default();
        let mut has_directional = false;

        for id in scene.traverse() {
            let (Some(node), Some(world)) = (scene.get(id), scene.world_matrix(id)) else {
                continue;
            };
            match &node.kind {
                NodeKind::Mesh { mesh, material } => list.items.push(DrawItem {
                    entity: id,
                    mesh: *mesh,
                    model: world,
                    material: material.clone(),
                }),
                NodeKind::Helper { lines, color } => {
                    list.lines.extend(lines.iter().map(|[a, b]| LineSegment {
                        start: world.transform_point3(*a),
                        end: world.transform_point3(*b),
                        color: *color,
                    }));
                }
                NodeKind::Light(Light::Directional(light)) => {
                    // Forward shading takes a single sun; extra ones are ignored.
                    if !has_directional {
                        has_directional = true;
                        let position = world.transform_point3(Vec3::ZERO);
                        list.lighting.direction = light.direction_from(position);
                        list.lighting.directional = Vec3::from(light.color) * light.intensity;
                    }
                }
                NodeKind::Light(Light::Ambient(light)) => {
                    list.lighting.ambient += Vec3::from(light.color) * light.intensity;
                }
                NodeKind::Camera | NodeKind::Group => {}
            }
        }

        list.items.sort_by_key(|item| !item.writes_stencil());
        tracing::trace!(
            items = list.items.len(),
            writers = list.stencil_writers(),
            lines = list.lines.len(),
            "draw list built"
        );
        list
    }

    pub fn stencil_writers(&self) -> usize {
        self.items.iter().filter(|i| i.writes_stencil()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.lines.is_empty()
    }
}

use crate::DrawList;
use roomview_scene::{NodeKind, PerspectiveCamera, Scene};
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and a camera, then produces output. It never
/// mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Resize the drawing buffer, in physical pixels.
    fn set_size(&mut self, width: u32, height: u32);

    /// Render one frame.
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Headless renderer producing a text description of each frame.
///
/// Lists the draws in submission order with their stencil state, which is
/// what the see-through effect depends on.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    width: u32,
    height: u32,
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        self.frames += 1;
        let list = DrawList::build(scene);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Frame {} ({}x{}) ===",
            self.frames, self.width, self.height
        );
        let _ = writeln!(out, "Nodes: {}  Draws: {}", scene.len(), list.items.len());
        let p = camera.position;
        let t = camera.target;
        let _ = writeln!(
            out,
            "Camera: eye=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) fov={:.0} aspect={:.3}",
            p.x, p.y, p.z, t.x, t.y, t.z, camera.fov_degrees, camera.aspect
        );
        let l = list.lighting;
        let _ = writeln!(
            out,
            "Lighting: dir=({:.2}, {:.2}, {:.2}) ambient={:.2}",
            l.direction.x, l.direction.y, l.direction.z, l.ambient.x
        );

        for item in &list.items {
            let name = scene
                .get(item.entity)
                .and_then(|n| n.name.as_deref())
                .unwrap_or("-");
            let stencil = match item.material.stencil {
                Some(s) if s.writes() => format!("write {}", s.reference),
                Some(s) => format!("equal {}", s.reference),
                None => "off".to_string(),
            };
            let _ = writeln!(
                out,
                "  {} {:<16} side={:?} stencil={}",
                item.entity, name, item.material.side, stencil
            );
        }

        let helpers = scene
            .nodes()
            .values()
            .filter(|n| matches!(n.kind, NodeKind::Helper { .. }))
            .count();
        if helpers > 0 {
            let _ = writeln!(out, "Helpers: {helpers} ({} lines)", list.lines.len());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomview_scene::{Material, MeshData, Node};

    #[test]
    fn empty_scene() {
        let mut renderer = DebugTextRenderer::new();
        renderer.set_size(800, 600);
        let output = renderer.render(&Scene::new(), &PerspectiveCamera::default());

        assert!(output.contains("Frame 1 (800x600)"));
        assert!(output.contains("Nodes: 0  Draws: 0"));
        assert_eq!(renderer.frames_rendered(), 1);
        assert_eq!(renderer.size(), (800, 600));
    }

    #[test]
    fn lists_stencil_state_in_draw_order() {
        let mut scene = Scene::new();
        let mesh = scene.add_mesh(MeshData::plane(1.0, 1.0));
        scene.add(
            Node::new(NodeKind::Mesh {
                mesh,
                material: Material::default().with_stencil_equal(2),
            })
            .named("roomC"),
        );
        scene.add(
            Node::new(NodeKind::Mesh {
                mesh,
                material: Material::stencil_writer(2),
            })
            .named("stencil_plane_2"),
        );

        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&scene, &PerspectiveCamera::default());
        let writer = output.find("stencil_plane_2").unwrap();
        let reader = output.find("roomC").unwrap();
        assert!(writer < reader);
        assert!(output.contains("stencil=write 2"));
        assert!(output.contains("stencil=equal 2"));
    }
}

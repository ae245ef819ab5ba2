use glam::Vec3;
use roomview_common::EntityId;
use roomview_scene::{NodeKind, Scene};
use std::fmt::Write;

/// Scene inspector for developer tooling.
///
/// Read-only queries against a scene for debugging and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Count the direct scene entries by what they are. Nodes nested inside
    /// sub-scenes are only reflected in `total_nodes`.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let mut summary = SceneSummary {
            total_nodes: scene.len(),
            mesh_assets: scene.meshes().len(),
            ..SceneSummary::default()
        };
        for node in scene.roots().iter().filter_map(|id| scene.get(*id)) {
            match &node.kind {
                NodeKind::Camera => summary.cameras += 1,
                NodeKind::Light(_) => summary.lights += 1,
                NodeKind::Mesh { material, .. } if material.stencil_write_ref().is_some() => {
                    summary.stencil_planes += 1
                }
                NodeKind::Mesh { .. } => summary.meshes += 1,
                NodeKind::Group => summary.sub_scenes += 1,
                NodeKind::Helper { .. } => summary.helpers += 1,
            }
        }
        summary
    }

    pub fn inspect_node(scene: &Scene, id: EntityId) -> Option<NodeInfo> {
        let node = scene.get(id)?;
        let world = scene.world_matrix(id)?;
        Some(NodeInfo {
            id,
            name: node.name.clone(),
            kind: node.kind.label(),
            world_position: world.transform_point3(Vec3::ZERO),
            children: node.children().len(),
        })
    }

    /// Stencil writers and readers among the direct entries, sorted by ref.
    ///
    /// A sub-scene is reported with the ref its first stenciled mesh tests.
    pub fn stencil_table(scene: &Scene) -> Vec<StencilEntry> {
        let mut entries = Vec::new();
        for &id in scene.roots() {
            let Some(node) = scene.get(id) else { continue };
            let name = node.name.clone().unwrap_or_else(|| id.to_string());
            let (role, reference) = match &node.kind {
                NodeKind::Mesh { material, .. } => {
                    if let Some(r) = material.stencil_write_ref() {
                        (StencilRole::Writer, r)
                    } else if let Some(r) = material.stencil_test_ref() {
                        (StencilRole::Reader, r)
                    } else {
                        continue;
                    }
                }
                NodeKind::Group => {
                    let tested = scene
                        .descendants(id)
                        .into_iter()
                        .filter_map(|d| scene.get(d).and_then(|n| n.material()))
                        .find_map(|m| m.stencil_test_ref());
                    match tested {
                        Some(r) => (StencilRole::Reader, r),
                        None => continue,
                    }
                }
                _ => continue,
            };
            entries.push(StencilEntry {
                entity: id,
                name,
                role,
                reference,
            });
        }
        entries.sort_by_key(|e| (e.reference, e.role));
        entries
    }

    /// Refs written by some plane but tested by nothing.
    pub fn unread_refs(scene: &Scene) -> Vec<u8> {
        let table = Self::stencil_table(scene);
        let mut refs: Vec<u8> = table
            .iter()
            .filter(|e| e.role == StencilRole::Writer)
            .map(|e| e.reference)
            .filter(|r| {
                !table
                    .iter()
                    .any(|e| e.role == StencilRole::Reader && e.reference == *r)
            })
            .collect();
        refs.dedup();
        refs
    }

    /// Indented hierarchy, one node per line.
    pub fn tree(scene: &Scene) -> String {
        let mut out = String::new();
        for &root in scene.roots() {
            Self::write_subtree(scene, root, 0, &mut out);
        }
        out
    }

    fn write_subtree(scene: &Scene, id: EntityId, depth: usize, out: &mut String) {
        let Some(node) = scene.get(id) else { return };
        let _ = writeln!(
            out,
            "{:indent$}{} {} {}",
            "",
            id,
            node.kind.label(),
            node.name.as_deref().unwrap_or("-"),
            indent = depth * 2
        );
        for &child in node.children() {
            Self::write_subtree(scene, child, depth + 1, out);
        }
    }
}

/// Direct-entry counts of a scene.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneSummary {
    pub cameras: usize,
    pub lights: usize,
    pub stencil_planes: usize,
    pub sub_scenes: usize,
    pub meshes: usize,
    pub helpers: usize,
    pub total_nodes: usize,
    pub mesh_assets: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: cameras={} lights={} stencil_planes={} sub_scenes={} meshes={} helpers={} nodes={} mesh_assets={}",
            self.cameras,
            self.lights,
            self.stencil_planes,
            self.sub_scenes,
            self.meshes,
            self.helpers,
            self.total_nodes,
            self.mesh_assets,
        )
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: EntityId,
    pub name: Option<String>,
    pub kind: &'static str,
    pub world_position: Vec3,
    pub children: usize,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.world_position;
        write!(
            f,
            "Node {} {} {:?} pos=({:.2}, {:.2}, {:.2}) children={}",
            self.id, self.kind, self.name, p.x, p.y, p.z, self.children
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StencilRole {
    Writer,
    Reader,
}

/// One row of the stencil pairing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StencilEntry {
    pub entity: EntityId,
    pub name: String,
    pub role: StencilRole,
    pub reference: u8,
}

impl std::fmt::Display for StencilEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ref {} {:?} {}", self.reference, self.role, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomview_assets::fixtures;
    use roomview_common::Transform;
    use roomview_render::{DebugTextRenderer, FixedSurface};
    use roomview_scene::{Material, MeshData, Node};
    use roomview_viewer::{SceneComposer, ViewerConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn composed() -> SceneComposer<DebugTextRenderer, FixedSurface> {
        let source = fixtures::room_source(&["frame", "roomA", "roomB", "roomC"]);
        let mut composer = SceneComposer::initialize(
            DebugTextRenderer::new(),
            FixedSurface::new(800, 600),
            Arc::new(source),
            &ViewerConfig::default(),
        )
        .unwrap();
        assert!(composer.wait_for_loads(Duration::from_secs(10)));
        composer
    }

    #[test]
    fn summary_empty_scene() {
        let summary = SceneInspector::summary(&Scene::new());
        assert_eq!(summary, SceneSummary::default());
    }

    #[test]
    fn summary_of_composed_scene() {
        let composer = composed();
        let summary = SceneInspector::summary(composer.scene());
        assert_eq!(summary.cameras, 1);
        assert_eq!(summary.lights, 2);
        assert_eq!(summary.stencil_planes, 4);
        assert_eq!(summary.sub_scenes, 4);
        assert_eq!(summary.meshes, 1);
        assert_eq!(summary.helpers, 0);
        // four planes share a quad, floor, one mesh per room
        assert_eq!(summary.mesh_assets, 6);
        assert!(format!("{summary}").contains("stencil_planes=4"));
    }

    #[test]
    fn stencil_table_pairs_planes_with_rooms() {
        let composer = composed();
        let scene = composer.scene();
        let table = SceneInspector::stencil_table(scene);
        let rows: Vec<_> = table
            .iter()
            .map(|e| (e.reference, e.role, e.name.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                (0, StencilRole::Reader, "floor"),
                (1, StencilRole::Writer, "stencil_plane_1"),
                (1, StencilRole::Reader, "roomA"),
                (2, StencilRole::Writer, "stencil_plane_2"),
                (2, StencilRole::Reader, "roomC"),
                (3, StencilRole::Writer, "stencil_plane_3"),
                (4, StencilRole::Writer, "stencil_plane_4"),
                (4, StencilRole::Reader, "roomB"),
            ]
        );
        assert_eq!(SceneInspector::unread_refs(scene), vec![3]);
    }

    #[test]
    fn inspect_nested_node() {
        let mut scene = Scene::new();
        let group = scene.add(
            Node::new(NodeKind::Group)
                .named("room")
                .with_transform(Transform::from_position(Vec3::new(1.0, 0.0, 0.0))),
        );
        let mesh = scene.add_mesh(MeshData::plane(1.0, 1.0));
        let child = scene
            .add_child(
                group,
                Node::new(NodeKind::Mesh {
                    mesh,
                    material: Material::default(),
                })
                .with_transform(Transform::from_position(Vec3::new(0.0, 2.0, 0.0))),
            )
            .unwrap();

        let info = SceneInspector::inspect_node(&scene, child).unwrap();
        assert_eq!(info.kind, "mesh");
        assert_eq!(info.world_position, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(SceneInspector::inspect_node(&scene, group).unwrap().children, 1);
        assert!(SceneInspector::inspect_node(&scene, EntityId(999)).is_none());
    }

    #[test]
    fn tree_indents_children() {
        let mut scene = Scene::new();
        let group = scene.add(Node::new(NodeKind::Group).named("room"));
        scene
            .add_child(group, Node::new(NodeKind::Group).named("inner"))
            .unwrap();
        let tree = SceneInspector::tree(&scene);
        let lines: Vec<_> = tree.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('#'));
        assert!(lines[1].starts_with("  #"));
        assert!(lines[1].ends_with("inner"));
    }
}

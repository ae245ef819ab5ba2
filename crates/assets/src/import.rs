use crate::{AssetError, AssetId};
use glam::{Quat, Vec3};
use roomview_common::{EntityId, Transform};
use roomview_scene::{Material, MaterialKind, MeshData, Node, NodeKind, Scene, SceneError, Side};

/// One drawable piece of an imported mesh.
#[derive(Debug, Clone)]
pub struct ImportedPrimitive {
    pub mesh: MeshData,
    pub material: Material,
}

/// A node of an imported hierarchy, detached from any scene.
#[derive(Debug, Clone, Default)]
pub struct ImportedNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub primitives: Vec<ImportedPrimitive>,
    pub children: Vec<ImportedNode>,
}

impl ImportedNode {
    fn visit_materials_mut(&mut self, f: &mut impl FnMut(&mut Material)) {
        for primitive in &mut self.primitives {
            f(&mut primitive.material);
        }
        for child in &mut self.children {
            child.visit_materials_mut(f);
        }
    }

    fn count(&self) -> (usize, usize) {
        self.children.iter().fold(
            (1, self.primitives.len()),
            |(nodes, prims), child| {
                let (n, p) = child.count();
                (nodes + n, prims + p)
            },
        )
    }

    fn attach(self, scene: &mut Scene, parent: EntityId) -> Result<(), SceneError> {
        let mut primitives = self.primitives;
        // A node holding a single primitive becomes the mesh itself; otherwise a
        // group carries the transform and each primitive hangs below it.
        let (kind, rest) = if primitives.len() == 1 {
            let p = primitives.remove(0);
            let mesh = scene.add_mesh(p.mesh);
            (
                NodeKind::Mesh {
                    mesh,
                    material: p.material,
                },
                Vec::new(),
            )
        } else {
            (NodeKind::Group, primitives)
        };

        let mut node = Node::new(kind).with_transform(self.transform);
        node.name = self.name;
        let id = scene.add_child(parent, node)?;

        for p in rest {
            let mesh = scene.add_mesh(p.mesh);
            scene.add_child(
                id,
                Node::new(NodeKind::Mesh {
                    mesh,
                    material: p.material,
                }),
            )?;
        }
        for child in self.children {
            child.attach(scene, id)?;
        }
        Ok(())
    }
}

/// A decoded glTF scene, ready to be grafted into a [`Scene`].
#[derive(Debug, Clone)]
pub struct ImportedScene {
    pub id: AssetId,
    pub name: Option<String>,
    pub nodes: Vec<ImportedNode>,
}

impl ImportedScene {
    /// Visit the material of every primitive, at any depth.
    pub fn visit_materials_mut(&mut self, mut f: impl FnMut(&mut Material)) {
        for node in &mut self.nodes {
            node.visit_materials_mut(&mut f);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().map(|n| n.count().0).sum()
    }

    pub fn primitive_count(&self) -> usize {
        self.nodes.iter().map(|n| n.count().1).sum()
    }

    /// Graft the hierarchy into `scene` under a new root group named `name`.
    /// Returns the root group, which is a direct scene entry.
    pub fn attach_to(self, scene: &mut Scene, name: impl Into<String>) -> Result<EntityId, SceneError> {
        let root = scene.add(Node::new(NodeKind::Group).named(name));
        for node in self.nodes {
            node.attach(scene, root)?;
        }
        Ok(root)
    }
}

/// Decode a glTF asset (binary `.glb` or embedded `.gltf`) into an [`ImportedScene`].
///
/// Only triangle primitives are imported. Missing normals are computed;
/// missing indices are synthesized.
pub fn import_gltf(bytes: &[u8]) -> Result<ImportedScene, AssetError> {
    let id = AssetId::of_bytes(bytes);
    let (document, buffers, _images) = gltf::import_slice(bytes)?;
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(AssetError::NoScene)?;

    let nodes = scene
        .nodes()
        .map(|node| import_node(&node, &buffers))
        .collect::<Result<Vec<_>, _>>()?;

    let imported = ImportedScene {
        id,
        name: scene.name().map(str::to_owned),
        nodes,
    };
    tracing::debug!(
        %id,
        nodes = imported.node_count(),
        primitives = imported.primitive_count(),
        "glTF decoded"
    );
    Ok(imported)
}

fn import_node(
    node: &gltf::Node<'_>,
    buffers: &[gltf::buffer::Data],
) -> Result<ImportedNode, AssetError> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let transform = Transform {
        position: Vec3::from(translation),
        rotation: Quat::from_array(rotation),
        scale: Vec3::from(scale),
    };

    let mut primitives = Vec::new();
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                tracing::debug!(mode = ?primitive.mode(), "skipping non-triangle primitive");
                continue;
            }
            let reader =
                primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| d.0.as_slice()));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| AssetError::MissingAttribute {
                    mesh: mesh.name().map(str::to_owned),
                    primitive: primitive.index(),
                    attribute: "POSITION",
                })?
                .collect();
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_default();

            let mut data = MeshData {
                positions,
                normals,
                indices,
            };
            if data.normals.len() != data.positions.len() {
                data.compute_normals();
            }

            primitives.push(ImportedPrimitive {
                mesh: data,
                material: import_material(&primitive.material()),
            });
        }
    }

    let children = node
        .children()
        .map(|child| import_node(&child, buffers))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ImportedNode {
        name: node.name().map(str::to_owned),
        transform,
        primitives,
        children,
    })
}

fn import_material(material: &gltf::Material<'_>) -> Material {
    Material {
        name: material.name().unwrap_or("unnamed").to_owned(),
        kind: MaterialKind::Physical,
        base_color: material.pbr_metallic_roughness().base_color_factor(),
        side: if material.double_sided() {
            Side::Double
        } else {
            Side::Front
        },
        ..Material::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn import_nested_room() {
        let bytes = fixtures::room_glb("roomA");
        let imported = import_gltf(&bytes).unwrap();
        assert_eq!(imported.node_count(), 2);
        assert_eq!(imported.primitive_count(), 1);

        let root = &imported.nodes[0];
        assert_eq!(root.name.as_deref(), Some("roomA"));
        let child = &root.children[0];
        assert_eq!(child.transform.position, Vec3::new(0.0, 1.0, 0.0));

        let prim = &child.primitives[0];
        assert_eq!(prim.mesh.vertex_count(), 3);
        assert_eq!(prim.mesh.indices, vec![0, 1, 2]);
        assert_eq!(prim.mesh.normals.len(), 3);
        assert_eq!(prim.material.side, Side::Double);
        assert_eq!(prim.material.base_color, [0.8, 0.5, 0.2, 1.0]);
    }

    #[test]
    fn garbage_is_a_gltf_error() {
        let err = import_gltf(b"definitely not a glb").unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }

    #[test]
    fn visit_reaches_nested_materials() {
        let mut imported = import_gltf(&fixtures::room_glb("roomB")).unwrap();
        let mut seen = 0;
        imported.visit_materials_mut(|m| {
            m.side = Side::Front;
            seen += 1;
        });
        assert_eq!(seen, 1);
        assert_eq!(imported.nodes[0].children[0].primitives[0].material.side, Side::Front);
    }

    #[test]
    fn attach_adds_one_root_entry() {
        let imported = import_gltf(&fixtures::room_glb("frame")).unwrap();
        let mut scene = Scene::new();
        let root = imported.attach_to(&mut scene, "frame").unwrap();

        assert_eq!(scene.roots(), &[root]);
        // group + gltf root node + mesh node
        assert_eq!(scene.len(), 3);
        let meshes: Vec<_> = scene
            .descendants(root)
            .into_iter()
            .filter(|id| scene.get(*id).and_then(|n| n.material()).is_some())
            .collect();
        assert_eq!(meshes.len(), 1);
        assert_eq!(scene.meshes().len(), 1);

        let p = scene.world_matrix(meshes[0]).unwrap().transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(0.0, 1.0, 0.0));
    }
}

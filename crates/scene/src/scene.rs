use crate::geometry::{MeshData, MeshId};
use crate::light::Light;
use crate::material::Material;
use glam::{Mat4, Vec3};
use roomview_common::{EntityId, Transform};
use std::collections::BTreeMap;

/// What a node is.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Placement of the viewing camera. Projection state lives with the composer.
    Camera,
    Light(Light),
    Mesh { mesh: MeshId, material: Material },
    /// Pure transform node; root of every imported sub-scene.
    Group,
    /// World-space debug lines.
    Helper { lines: Vec<[Vec3; 2]>, color: [f32; 4] },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Light(_) => "light",
            Self::Mesh { .. } => "mesh",
            Self::Group => "group",
            Self::Helper { .. } => "helper",
        }
    }
}

/// A node in the scene arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub transform: Transform,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            kind,
            transform: Transform::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }
}

/// Record of a structural change to the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Added {
        id: EntityId,
        parent: Option<EntityId>,
    },
    TransformUpdated {
        id: EntityId,
    },
}

/// Errors from scene operations.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
}

/// The scene arena.
///
/// Owns every node and every piece of geometry added to it. Nodes are stored
/// in a `BTreeMap` so iteration follows creation order.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<EntityId, Node>,
    roots: Vec<EntityId>,
    meshes: BTreeMap<MeshId, MeshData>,
    next_entity: u64,
    next_mesh: u64,
    events: Vec<SceneEvent>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store geometry and return a shareable handle.
    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshId {
        let id = MeshId(self.next_mesh);
        self.next_mesh += 1;
        self.meshes.insert(id, mesh);
        id
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshData> {
        self.meshes.get(&id)
    }

    pub fn meshes(&self) -> &BTreeMap<MeshId, MeshData> {
        &self.meshes
    }

    /// Add a node as a direct scene entry.
    pub fn add(&mut self, node: Node) -> EntityId {
        let id = self.insert(node, None);
        self.roots.push(id);
        id
    }

    /// Add a node under `parent`.
    pub fn add_child(&mut self, parent: EntityId, node: Node) -> Result<EntityId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::EntityNotFound(parent));
        }
        let id = self.insert(node, Some(parent));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    fn insert(&mut self, mut node: Node, parent: Option<EntityId>) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        node.parent = parent;
        node.children.clear();
        tracing::trace!(%id, kind = node.kind.label(), name = ?node.name, "node added");
        self.nodes.insert(id, node);
        self.events.push(SceneEvent::Added { id, parent });
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Replace a node's local transform and log the change.
    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) => {
                node.transform = transform;
                self.events.push(SceneEvent::TransformUpdated { id });
                true
            }
            None => false,
        }
    }

    /// Direct scene entries, in insertion order.
    pub fn roots(&self) -> &[EntityId] {
        &self.roots
    }

    /// Total number of nodes, nested ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &BTreeMap<EntityId, Node> {
        &self.nodes
    }

    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name.as_deref() == Some(name))
            .map(|(id, _)| *id)
    }

    /// `root` and all of its descendants, depth-first, parents before children.
    pub fn descendants(&self, root: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Every node of the scene in draw traversal order.
    pub fn traverse(&self) -> Vec<EntityId> {
        self.roots
            .iter()
            .flat_map(|root| self.descendants(*root))
            .collect()
    }

    /// Local-to-world matrix, composed through every ancestor.
    pub fn world_matrix(&self, id: EntityId) -> Option<Mat4> {
        let mut node = self.nodes.get(&id)?;
        let mut matrix = node.transform.matrix();
        while let Some(parent) = node.parent {
            node = self.nodes.get(&parent)?;
            matrix = node.transform.matrix() * matrix;
        }
        Some(matrix)
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}

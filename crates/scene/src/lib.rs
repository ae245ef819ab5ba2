//! Scene graph for the room viewer.
//!
//! A scene is a single owning arena of nodes. Parent/child relations are
//! stored as ids, never as references, so the whole graph can be borrowed
//! immutably by a renderer while the composer holds the only mutable handle.
//!
//! # Invariants
//! - Every node belongs to exactly one scene for its whole lifetime.
//! - `roots()` lists direct scene entries in insertion order.
//! - Geometry is stored once and shared by id.

pub mod camera;
pub mod geometry;
pub mod light;
pub mod material;
pub mod scene;

pub use camera::PerspectiveCamera;
pub use geometry::{MeshData, MeshId};
pub use light::{AmbientLight, DirectionalLight, Light, ShadowCamera, ShadowConfig};
pub use material::{Material, MaterialKind, Side, StencilFunc, StencilOp, StencilState};
pub use scene::{Node, NodeKind, Scene, SceneError, SceneEvent};

pub fn crate_info() -> &'static str {
    "roomview-scene v0.1.0"
}

//! Developer tooling: scene inspector and stencil pairing table.
//!
//! # Invariants
//! - Tools only read the scene.

mod inspector;

pub use inspector::{NodeInfo, SceneInspector, SceneSummary, StencilEntry, StencilRole};

pub fn crate_info() -> &'static str {
    "roomview-tools v0.1.0"
}

//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene; they never mutate it.
//! - Stencil writers are drawn before anything that reads the stencil buffer.
//!
//! The GPU backend lives in `roomview-render-wgpu`. [`DebugTextRenderer`]
//! implements the same trait for headless runs and tests.

mod draw;
mod renderer;
mod surface;

pub use draw::{DrawItem, DrawList, Lighting, LineSegment, PipelineKey};
pub use renderer::{DebugTextRenderer, Renderer};
pub use surface::{FixedSurface, RenderSurface};

pub fn crate_info() -> &'static str {
    "roomview-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}

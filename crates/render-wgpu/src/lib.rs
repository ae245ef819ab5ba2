//! wgpu render backend for the room viewer.
//!
//! Draws the stencil-ordered [`roomview_render::DrawList`] into a window
//! surface with a combined depth/stencil attachment.
//!
//! # Invariants
//! - Renderer never mutates the scene.
//! - Depth is cleared to 1 and stencil to 0 at the start of every frame.
//! - The stencil reference is dynamic pass state, set per draw.

mod gpu;
mod shaders;

pub use gpu::{GpuError, WgpuRenderer};

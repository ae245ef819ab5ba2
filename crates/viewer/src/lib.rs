//! The see-through room viewer.
//!
//! [`SceneComposer`] assembles camera, lights, four stencil-writing planes,
//! the room assets and a floor, then exposes `advance` and `resize` to an
//! external frame driver.
//!
//! # Invariants
//! - Each plane writes a distinct ref in `1..=4`; each room reads at most one
//!   of them and no two rooms read the same ref.
//! - The floor only draws where no plane wrote (stencil 0).
//! - Room loads complete in any order; each is integrated on its own.

mod composer;
mod config;

pub use composer::{CAMERA_FOV, CAMERA_POSITION, DAMPING_FACTOR, LoadStatus, SceneComposer};
pub use config::{ConfigError, PLANE_COUNT, RoomSpec, ViewerConfig};

pub fn crate_info() -> &'static str {
    "roomview-viewer v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("viewer"));
    }
}

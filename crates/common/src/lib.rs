//! Shared types for the room viewer workspace.

mod types;

pub use types::{EntityId, Transform};

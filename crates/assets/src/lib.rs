//! Asset pipeline: sources, content-addressed ids, glTF import and background loading.
//!
//! Assets are fetched by relative path from an [`AssetSource`], decoded into an
//! [`ImportedScene`] off the render thread, and handed back through an
//! [`AssetLoader`] channel. Grafting an import into a [`roomview_scene::Scene`]
//! always happens on the thread that owns the scene.
//!
//! # Invariants
//! - Every `AssetLoader::request` produces exactly one `LoadOutcome`.
//! - Decoding never touches a `Scene`.

mod import;
mod loader;
mod source;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use import::{ImportedNode, ImportedPrimitive, ImportedScene, import_gltf};
pub use loader::{AssetLoader, LoadOutcome, LoadTicket};
pub use source::{AssetSource, FsSource, MemorySource};

use sha2::{Digest, Sha256};

/// Content-addressed asset ID computed from the raw asset bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

impl AssetId {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(head))
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("glTF document has no scene")]
    NoScene,
    #[error("mesh {mesh:?} primitive {primitive} has no {attribute} attribute")]
    MissingAttribute {
        mesh: Option<String>,
        primitive: usize,
        attribute: &'static str,
    },
    #[error("loader worker exited without reporting")]
    Disconnected,
}

pub fn crate_info() -> &'static str {
    "roomview-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_bytes_same_id() {
        let a = AssetId::of_bytes(b"frame");
        let b = AssetId::of_bytes(b"frame");
        let c = AssetId::of_bytes(b"roomA");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_displays_as_hex() {
        assert_eq!(AssetId(0xab).to_string(), "00000000000000ab");
    }
}

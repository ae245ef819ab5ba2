use crate::AssetError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolves a relative asset path to its raw bytes.
///
/// Sources are shared with loader worker threads, hence `Send + Sync`.
pub trait AssetSource: Send + Sync {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FsSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.root.join(path);
        match std::fs::read(&full) {
            Ok(bytes) => {
                tracing::debug!(path = %full.display(), bytes = bytes.len(), "asset read");
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(full.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Serves assets from memory. Used by headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_source_reads_relative_to_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/frame.glb"), b"bytes").unwrap();

        let source = FsSource::new(dir.path());
        assert_eq!(source.fetch("./assets/frame.glb").unwrap(), b"bytes");
    }

    #[test]
    fn fs_source_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsSource::new(dir.path());
        let err = source.fetch("./assets/roomA.glb").unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn memory_source_round_trip() {
        let source = MemorySource::new().with("a.glb", vec![1, 2, 3]);
        assert_eq!(source.len(), 1);
        assert_eq!(source.fetch("a.glb").unwrap(), vec![1, 2, 3]);
        assert!(matches!(source.fetch("b.glb"), Err(AssetError::NotFound(_))));
    }
}

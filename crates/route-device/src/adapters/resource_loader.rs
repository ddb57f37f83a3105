//! Resource Loader Adapters
//!
//! Implement the `ResourceLoader` port over a directory tree and over an
//! in-memory map.

use crate::error::ResourceError;
use crate::ports::outbound::ResourceLoader;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `<root>/<namespace>/<filename>` from disk.
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    root: PathBuf,
}

impl FsResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, namespace: &str, filename: &str) -> PathBuf {
        self.root.join(namespace).join(filename)
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load_resource(&self, namespace: &str, filename: &str) -> Result<Vec<u8>, ResourceError> {
        let path = self.resolve(namespace, filename);
        debug!(path = %path.display(), "Loading resource");

        std::fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ResourceError::NotFound {
                namespace: namespace.to_string(),
                filename: filename.to_string(),
            },
            _ => ResourceError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })
    }
}

/// In-memory resources for tests and embedding.
#[derive(Default)]
pub struct InMemoryResourceLoader {
    resources: RwLock<HashMap<(String, String), Vec<u8>>>,
}

impl InMemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_resource(
        self,
        namespace: &str,
        filename: &str,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        self.insert(namespace, filename, contents);
        self
    }

    pub fn insert(&self, namespace: &str, filename: &str, contents: impl Into<Vec<u8>>) {
        self.resources
            .write()
            .insert((namespace.to_string(), filename.to_string()), contents.into());
    }

    pub fn remove(&self, namespace: &str, filename: &str) -> Option<Vec<u8>> {
        self.resources
            .write()
            .remove(&(namespace.to_string(), filename.to_string()))
    }
}

impl ResourceLoader for InMemoryResourceLoader {
    fn load_resource(&self, namespace: &str, filename: &str) -> Result<Vec<u8>, ResourceError> {
        self.resources
            .read()
            .get(&(namespace.to_string(), filename.to_string()))
            .cloned()
            .ok_or_else(|| ResourceError::NotFound {
                namespace: namespace.to_string(),
                filename: filename.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_loader_reads_namespaced_file() {
        let dir = tempfile::tempdir().unwrap();
        let ns_dir = dir.path().join("etc").join("RouteDevice");
        std::fs::create_dir_all(&ns_dir).unwrap();
        std::fs::write(ns_dir.join("routes.toml"), b"[[route]]").unwrap();

        let loader = FsResourceLoader::new(dir.path());
        let bytes = loader
            .load_resource("etc/RouteDevice", "routes.toml")
            .unwrap();
        assert_eq!(bytes, b"[[route]]");
    }

    #[test]
    fn test_fs_loader_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FsResourceLoader::new(dir.path());

        let err = loader.load_resource("etc", "absent.toml").unwrap_err();
        assert_eq!(
            err,
            ResourceError::NotFound {
                namespace: "etc".to_string(),
                filename: "absent.toml".to_string(),
            }
        );
    }

    #[test]
    fn test_in_memory_loader() {
        let loader = InMemoryResourceLoader::new().with_resource("ns", "a.toml", "x = 1");
        assert_eq!(loader.load_resource("ns", "a.toml").unwrap(), b"x = 1");
        assert!(matches!(
            loader.load_resource("ns", "b.toml"),
            Err(ResourceError::NotFound { .. })
        ));

        loader.remove("ns", "a.toml");
        assert!(loader.load_resource("ns", "a.toml").is_err());
    }
}

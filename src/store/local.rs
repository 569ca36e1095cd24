// src/store/local.rs

use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::debug;

use super::{decode_lines, BlobStore};
use crate::error::StoreError;

/// Resources are files below `root`; ids use `/` separators.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, resource: &str) -> PathBuf {
        resource
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

fn io_err(resource: &str, source: io::Error) -> StoreError {
    if source.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound(resource.to_string())
    } else {
        StoreError::Io {
            resource: resource.to_string(),
            source,
        }
    }
}

impl BlobStore for LocalStore {
    fn open_text(&self, resource: &str) -> Result<Vec<String>, StoreError> {
        let path = self.path_of(resource);
        let bytes = fs::read(&path).map_err(|e| io_err(resource, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "read local resource");
        decode_lines(resource, bytes)
    }

    fn put(&self, resource: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        let path = self.path_of(resource);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(resource, e))?;
        }

        // Write to a sibling temp file, then rename over the target.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));
        fs::write(&tmp_path, &bytes).map_err(|e| io_err(resource, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| io_err(resource, e))?;

        debug!(path = %path.display(), bytes = bytes.len(), "wrote local resource");
        Ok(())
    }

    fn describe(&self, resource: &str) -> String {
        self.path_of(resource).display().to_string()
    }
}

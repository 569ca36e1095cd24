// src/store/memory.rs

use std::{cell::RefCell, collections::BTreeMap};

use super::{decode_lines, BlobStore};
use crate::error::StoreError;

/// In-process blob map. Single-threaded by construction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: RefCell<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a text resource.
    pub fn with_text(self, resource: &str, text: &str) -> Self {
        self.insert(resource, text.as_bytes().to_vec());
        self
    }

    pub fn insert(&self, resource: &str, bytes: Vec<u8>) {
        self.blobs.borrow_mut().insert(resource.to_string(), bytes);
    }

    pub fn get(&self, resource: &str) -> Option<Vec<u8>> {
        self.blobs.borrow().get(resource).cloned()
    }

    pub fn resources(&self) -> Vec<String> {
        self.blobs.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.blobs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.borrow().is_empty()
    }
}

impl BlobStore for MemoryStore {
    fn open_text(&self, resource: &str) -> Result<Vec<String>, StoreError> {
        let bytes = self
            .get(resource)
            .ok_or_else(|| StoreError::NotFound(resource.to_string()))?;
        decode_lines(resource, bytes)
    }

    fn put(&self, resource: &str, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.insert(resource, bytes);
        Ok(())
    }

    fn describe(&self, resource: &str) -> String {
        format!("memory://{}", resource)
    }
}

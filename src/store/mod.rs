// src/store/mod.rs

pub mod gcs;
pub mod local;
pub mod memory;

pub use gcs::GcsStore;
pub use local::LocalStore;
pub use memory::MemoryStore;

use arrow::record_batch::RecordBatch;

use crate::error::{EtlError, StoreError};
use crate::output::{encode, TableFormat};

pub const RAW_DIR: &str = "raw";
pub const PROCESSED_DIR: &str = "processed";
pub const CURATED_DIR: &str = "curated";

/// Resource id of a raw export inside the container.
pub fn raw_id(file_name: &str) -> String {
    format!("{}/{}", RAW_DIR, file_name)
}

pub fn processed_id(stem: &str, format: TableFormat) -> String {
    format!("{}/{}.{}", PROCESSED_DIR, stem, format.extension())
}

pub fn curated_id(stem: &str, format: TableFormat) -> String {
    format!("{}/{}.{}", CURATED_DIR, stem, format.extension())
}

/// A named-blob backend: read whole text resources, write whole payloads.
pub trait BlobStore {
    /// Read every line of `resource`, BOM stripped. The underlying handle is
    /// released before this returns, on success or failure.
    fn open_text(&self, resource: &str) -> Result<Vec<String>, StoreError>;

    /// Replace `resource` with `bytes`.
    fn put(&self, resource: &str, bytes: Vec<u8>) -> Result<(), StoreError>;

    /// Encode `batch` as `format` and store it under `resource`.
    fn write_table(
        &self,
        resource: &str,
        batch: &RecordBatch,
        format: TableFormat,
    ) -> Result<(), EtlError> {
        let bytes = encode(batch, format)?;
        self.put(resource, bytes)?;
        Ok(())
    }

    /// Human-readable location, for logs.
    fn describe(&self, resource: &str) -> String {
        resource.to_string()
    }
}

/// UTF-8 decode with an optional leading byte-order mark, split into lines
/// without their terminators. `\n`, `\r\n` and a lone `\r` all end a line.
pub fn decode_lines(resource: &str, bytes: Vec<u8>) -> Result<Vec<String>, StoreError> {
    let text = String::from_utf8(bytes).map_err(|source| StoreError::Encoding {
        resource: resource.to_string(),
        source,
    })?;
    let body = text.strip_prefix('\u{feff}').unwrap_or(&text);
    Ok(split_lines(body))
}

fn split_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(end) => {
                lines.push(rest[..end].to_string());
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
            }
            None => {
                lines.push(rest.to_string());
                break;
            }
        }
    }
    lines
}

// src/error.rs

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use std::io;
use thiserror::Error;

use crate::process::bounds::HeaderNotFound;

/// Failures raised by a [`crate::store::BlobStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource {0} not found")]
    NotFound(String),

    #[error("I/O error on {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: io::Error,
    },

    #[error("resource {resource} is not valid UTF-8: {source}")]
    Encoding {
        resource: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("cloud storage request for {resource} failed: {source}")]
    Cloud {
        resource: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Every fatal condition of a run. Zero-row files and unparsable values are
/// not represented here; they are logged or turned into absent values.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("{resource}: {source}")]
    HeaderNotFound {
        resource: String,
        #[source]
        source: HeaderNotFound,
    },

    #[error("{resource}: column {column} is not a field of the detected header")]
    MissingColumn { resource: String, column: String },

    #[error("{resource}: data row {row}: cannot coerce {column} value {value:?} to an integer")]
    TypeCoercion {
        resource: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{resource}: malformed table: {source}")]
    Csv {
        resource: String,
        #[source]
        source: csv::Error,
    },

    #[error("{label} is empty")]
    EmptyDataset { label: String },

    #[error("{label} has {rows} rows with null key values. Sample:\n{}", .sample.join("\n"))]
    NullKey {
        label: String,
        rows: usize,
        sample: Vec<String>,
    },

    #[error("{label} has {rows} duplicate rows on keys. Top combos:\n{}", render_counts(.top))]
    DuplicateKey {
        label: String,
        rows: usize,
        top: Vec<(String, usize)>,
    },

    #[error("merge is not one-to-one: key {key} repeats in the {side} input")]
    NotOneToOne { side: &'static str, key: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("building output table: {0}")]
    Arrow(#[from] ArrowError),

    #[error("encoding parquet: {0}")]
    Parquet(#[from] ParquetError),
}

fn render_counts(top: &[(String, usize)]) -> String {
    top.iter()
        .map(|(key, count)| format!("{key}  {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub mod config;
pub mod error;
pub mod merge;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod store;
pub mod validate;

pub use error::{EtlError, StoreError};
pub use pipeline::{run, RunConfig, RunSummary};

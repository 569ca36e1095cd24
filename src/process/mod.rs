// src/process/mod.rs

pub mod bounds;
pub mod coerce;
pub mod measure;
pub mod utils;

pub use bounds::{find_table_bounds, HeaderNotFound, TableBounds};
pub use measure::{read_measure, ColumnNames, Measure, MeasureRecord, Sex};

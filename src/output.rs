// src/output.rs

use arrow::{
    array::{ArrayRef, Float64Array, Int64Array, StringArray},
    csv::WriterBuilder,
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::sync::Arc;

use crate::{
    error::EtlError,
    merge::MergedRecord,
    process::{Measure, MeasureRecord, Sex},
};

/// Stem of the curated output.
pub const CURATED_STEM: &str = "df_merged";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Parquet => "parquet",
        }
    }
}

/// `COUNTRY, SEX, YEAR, <ACTIVITY_VAL|OBESITY_VAL>, AGE`
pub fn measure_schema(measure: Measure) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("COUNTRY", DataType::Utf8, true),
        Field::new("SEX", DataType::Utf8, true),
        Field::new("YEAR", DataType::Int64, true),
        Field::new(measure.value_column(), DataType::Float64, true),
        Field::new("AGE", DataType::Int64, true),
    ]))
}

/// `COUNTRY, AGE, SEX, YEAR, ACTIVITY_VAL, OBESITY_VAL`
pub fn merged_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("COUNTRY", DataType::Utf8, true),
        Field::new("AGE", DataType::Int64, true),
        Field::new("SEX", DataType::Utf8, true),
        Field::new("YEAR", DataType::Int64, true),
        Field::new(Measure::Activity.value_column(), DataType::Float64, true),
        Field::new(Measure::Obesity.value_column(), DataType::Float64, true),
    ]))
}

fn sex_column<'a>(values: impl Iterator<Item = &'a Option<Sex>>) -> ArrayRef {
    Arc::new(
        values
            .map(|s| s.as_ref().map(Sex::as_str))
            .collect::<StringArray>(),
    )
}

/// Columnar view of one processed measure. An empty slice gives an empty
/// batch that still carries the five-column schema.
pub fn measure_batch(measure: Measure, records: &[MeasureRecord]) -> Result<RecordBatch, EtlError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(
            records
                .iter()
                .map(|r| r.country.as_deref())
                .collect::<StringArray>(),
        ),
        sex_column(records.iter().map(|r| &r.sex)),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.year))),
        Arc::new(records.iter().map(|r| r.value).collect::<Float64Array>()),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| i64::from(r.age)),
        )),
    ];
    Ok(RecordBatch::try_new(measure_schema(measure), columns)?)
}

pub fn merged_batch(records: &[MergedRecord]) -> Result<RecordBatch, EtlError> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(
            records
                .iter()
                .map(|r| r.country.as_deref())
                .collect::<StringArray>(),
        ),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| i64::from(r.age)),
        )),
        sex_column(records.iter().map(|r| &r.sex)),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.year))),
        Arc::new(
            records
                .iter()
                .map(|r| r.activity_value)
                .collect::<Float64Array>(),
        ),
        Arc::new(
            records
                .iter()
                .map(|r| r.obesity_value)
                .collect::<Float64Array>(),
        ),
    ];
    Ok(RecordBatch::try_new(merged_schema(), columns)?)
}

/// Serialise `batch` into a complete file body.
pub fn encode(batch: &RecordBatch, format: TableFormat) -> Result<Vec<u8>, EtlError> {
    match format {
        TableFormat::Csv => {
            let mut writer = WriterBuilder::new().with_header(true).build(Vec::new());
            writer.write(batch)?;
            Ok(writer.into_inner())
        }
        TableFormat::Parquet => {
            let props = WriterProperties::builder()
                .set_compression(Compression::SNAPPY)
                .build();
            let mut buf = Vec::new();
            let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
            writer.write(batch)?;
            writer.close()?;
            Ok(buf)
        }
    }
}

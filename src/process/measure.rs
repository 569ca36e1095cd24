// src/process/measure.rs

use csv::ReaderBuilder;
use std::fmt;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::EtlError,
    process::{
        bounds::find_table_bounds,
        coerce::{coerce_float, coerce_integer, policy_for, NumericField, Uncoercible},
        utils::{clean_str, non_empty, raw_file_name},
    },
    store::{raw_id, BlobStore},
};

/// The two tracked health statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    Activity,
    Obesity,
}

impl Measure {
    pub const fn label(self) -> &'static str {
        match self {
            Measure::Activity => "activity",
            Measure::Obesity => "obesity",
        }
    }

    /// Name the VALUE column takes in the processed and curated outputs.
    pub const fn value_column(self) -> &'static str {
        match self {
            Measure::Activity => "ACTIVITY_VAL",
            Measure::Obesity => "OBESITY_VAL",
        }
    }

    /// File stem of the processed layer.
    pub const fn processed_stem(self) -> &'static str {
        match self {
            Measure::Activity => "activity_merged",
            Measure::Obesity => "obesity_merged",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sex {
    Male,
    Female,
    /// Any other label, kept verbatim (e.g. `BOTH SEXES`).
    Other(String),
}

impl Sex {
    /// `None` for an empty cell. Labels other than the exact `MALE` and
    /// `FEMALE` are kept as written.
    pub fn from_cell(raw: &str) -> Option<Self> {
        let text = non_empty(raw)?;
        Some(match text.as_str() {
            "MALE" => Sex::Male,
            "FEMALE" => Sex::Female,
            _ => Sex::Other(text),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Sex::Male => "MALE",
            Sex::Female => "FEMALE",
            Sex::Other(s) => s,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a measure table, tagged with the age stratum it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureRecord {
    pub country: Option<String>,
    pub sex: Option<Sex>,
    pub year: i64,
    pub value: Option<f64>,
    pub age: u32,
}

impl fmt::Display for MeasureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "COUNTRY={} SEX={} YEAR={} VALUE={} AGE={}",
            self.country.as_deref().unwrap_or("<null>"),
            self.sex.as_ref().map_or("<null>", Sex::as_str),
            self.year,
            self.value.map_or_else(|| "<null>".to_string(), |v| v.to_string()),
            self.age
        )
    }
}

/// Header names of the four table columns. Together they are the tokens a
/// header line must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    pub country: String,
    pub sex: String,
    pub year: String,
    pub value: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            country: "COUNTRY".into(),
            sex: "SEX".into(),
            year: "YEAR".into(),
            value: "VALUE".into(),
        }
    }
}

impl ColumnNames {
    pub fn required(&self) -> [&str; 4] {
        [
            self.country.as_str(),
            self.sex.as_str(),
            self.year.as_str(),
            self.value.as_str(),
        ]
    }
}

/// Read one measure across `ages`, in order.
///
/// Each age maps to `raw/<prefix> <age>-year-olds.csv`. Files whose table has
/// no data rows are skipped with a warning; a file without a header, or with
/// a YEAR cell that is not a finite number, aborts the read.
#[instrument(level = "info", skip(store, ages, prefix, columns), fields(prefix = %prefix))]
pub fn read_measure(
    store: &dyn BlobStore,
    ages: &[u32],
    prefix: &str,
    columns: &ColumnNames,
) -> Result<Vec<MeasureRecord>, EtlError> {
    let required = columns.required();
    let mut records = Vec::new();

    for &age in ages {
        let file_name = raw_file_name(prefix, age);
        let resource = raw_id(&file_name);

        // Lines are fully buffered; the store has released the handle here.
        let lines = store.open_text(&resource)?;
        debug!(file = %store.describe(&resource), lines = lines.len(), "read raw export");

        let bounds = find_table_bounds(&lines, &required).map_err(|source| {
            EtlError::HeaderNotFound {
                resource: file_name.clone(),
                source,
            }
        })?;
        info!(
            "[{}] header_idx={}, data_rows={}",
            file_name, bounds.header_index, bounds.data_row_count
        );

        if bounds.is_empty() {
            warn!("[{}] No data rows detected; skipping.", file_name);
            continue;
        }

        let parsed = parse_table(&file_name, &lines[bounds.table_range()], columns, age)?;
        records.extend(parsed);
    }

    Ok(records)
}

/// Parse the header line plus data lines into records for `age`.
fn parse_table(
    resource: &str,
    table: &[String],
    columns: &ColumnNames,
    age: u32,
) -> Result<Vec<MeasureRecord>, EtlError> {
    let content = table.join("\n");
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let csv_err = |source: csv::Error| EtlError::Csv {
        resource: resource.to_string(),
        source,
    };

    let headers: Vec<String> = rdr.headers().map_err(csv_err)?.iter().map(clean_str).collect();
    let index_of = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| EtlError::MissingColumn {
                resource: resource.to_string(),
                column: name.to_string(),
            })
    };
    let country_idx = index_of(&columns.country)?;
    let sex_idx = index_of(&columns.sex)?;
    let year_idx = index_of(&columns.year)?;
    let value_idx = index_of(&columns.value)?;

    let year_policy = policy_for(NumericField::Year);
    let value_policy = policy_for(NumericField::Value);

    let mut out = Vec::with_capacity(table.len().saturating_sub(1));
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let cell = |i: usize| record.get(i).unwrap_or("");
        let row = idx + 1;

        let year_text = cell(year_idx);
        let coercion_err = || EtlError::TypeCoercion {
            resource: resource.to_string(),
            row,
            column: columns.year.clone(),
            value: year_text.to_string(),
        };
        let year = coerce_integer(year_text, year_policy)
            .map_err(|Uncoercible(_)| coercion_err())?
            .ok_or_else(coercion_err)?;

        // Lenient: an unparsable value is simply absent.
        let value = coerce_float(cell(value_idx), value_policy).unwrap_or(None);

        out.push(MeasureRecord {
            country: non_empty(cell(country_idx)),
            sex: Sex::from_cell(cell(sex_idx)),
            year,
            value,
            age,
        });
    }

    Ok(out)
}

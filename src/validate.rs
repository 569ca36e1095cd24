// src/validate.rs

use std::{collections::HashMap, fmt, str::FromStr};
use tracing::debug;

use crate::{error::EtlError, process::MeasureRecord};

/// Rows shown for null keys.
pub const NULL_SAMPLE: usize = 5;
/// Key combinations shown for duplicates.
pub const DUPLICATE_TOP: usize = 10;

/// Fields that identify a record across measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyField {
    Country,
    Age,
    Sex,
    Year,
}

impl KeyField {
    /// The join keys of the curated dataset, in column order.
    pub const ALL: [KeyField; 4] = [
        KeyField::Country,
        KeyField::Age,
        KeyField::Sex,
        KeyField::Year,
    ];

    pub const fn column(self) -> &'static str {
        match self {
            KeyField::Country => "COUNTRY",
            KeyField::Age => "AGE",
            KeyField::Sex => "SEX",
            KeyField::Year => "YEAR",
        }
    }
}

impl FromStr for KeyField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyField::ALL
            .into_iter()
            .find(|k| k.column().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown key field {s:?}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyValue {
    Int(i64),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(v) => write!(f, "{v}"),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

/// Values of the selected key fields, in selection order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(pub Vec<KeyValue>);

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Records that expose key field values; `None` means the value is absent.
pub trait Keyed {
    fn key_value(&self, field: KeyField) -> Option<KeyValue>;

    /// The full key, or `None` when any selected field is absent.
    fn key(&self, fields: &[KeyField]) -> Option<RecordKey> {
        fields
            .iter()
            .map(|f| self.key_value(*f))
            .collect::<Option<Vec<_>>>()
            .map(RecordKey)
    }
}

impl Keyed for MeasureRecord {
    fn key_value(&self, field: KeyField) -> Option<KeyValue> {
        match field {
            KeyField::Country => self.country.clone().map(KeyValue::Text),
            KeyField::Age => Some(KeyValue::Int(i64::from(self.age))),
            KeyField::Sex => self
                .sex
                .as_ref()
                .map(|s| KeyValue::Text(s.as_str().to_string())),
            KeyField::Year => Some(KeyValue::Int(self.year)),
        }
    }
}

/// Reject `records` unless it is non-empty and every record has a complete,
/// distinct key over `keys`. `label` names the dataset in the error.
pub fn validate_keys<R>(records: &[R], keys: &[KeyField], label: &str) -> Result<(), EtlError>
where
    R: Keyed + fmt::Display,
{
    if records.is_empty() {
        return Err(EtlError::EmptyDataset {
            label: label.to_string(),
        });
    }

    let mut nulls = 0usize;
    let mut sample = Vec::new();
    let mut counts: HashMap<RecordKey, usize> = HashMap::with_capacity(records.len());
    for record in records {
        match record.key(keys) {
            Some(key) => *counts.entry(key).or_insert(0) += 1,
            None => {
                nulls += 1;
                if sample.len() < NULL_SAMPLE {
                    sample.push(record.to_string());
                }
            }
        }
    }
    if nulls > 0 {
        return Err(EtlError::NullKey {
            label: label.to_string(),
            rows: nulls,
            sample,
        });
    }

    let mut dups: Vec<(RecordKey, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    if !dups.is_empty() {
        let rows = dups.iter().map(|(_, n)| n).sum();
        dups.sort_by(|(ka, na), (kb, nb)| nb.cmp(na).then_with(|| ka.cmp(kb)));
        let top = dups
            .into_iter()
            .take(DUPLICATE_TOP)
            .map(|(k, n)| (k.to_string(), n))
            .collect();
        return Err(EtlError::DuplicateKey {
            label: label.to_string(),
            rows,
            top,
        });
    }

    debug!(label, rows = records.len(), "keys valid");
    Ok(())
}

// src/merge.rs

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::{
    error::EtlError,
    process::{MeasureRecord, Sex},
    validate::{KeyField, Keyed, RecordKey},
};

/// One key present in both measures, with each side's value.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub country: Option<String>,
    pub age: u32,
    pub sex: Option<Sex>,
    pub year: i64,
    pub activity_value: Option<f64>,
    pub obesity_value: Option<f64>,
}

/// One-to-one inner join on `keys`.
///
/// Output follows `left` order. The left value lands in `activity_value` and
/// the right value in `obesity_value`; non-key fields come from the left
/// record. Keys found on one side only are dropped, as are records with an
/// absent key field. Both inputs are expected to be key-unique already; a
/// repeated key is reported instead of being multiplied out.
pub fn merge(
    left: &[MeasureRecord],
    right: &[MeasureRecord],
    keys: &[KeyField],
) -> Result<Vec<MergedRecord>, EtlError> {
    let mut right_index: HashMap<RecordKey, &MeasureRecord> = HashMap::with_capacity(right.len());
    for record in right {
        if let Some(key) = record.key(keys) {
            if right_index.insert(key.clone(), record).is_some() {
                return Err(EtlError::NotOneToOne {
                    side: "right",
                    key: key.to_string(),
                });
            }
        }
    }

    let mut seen_left: HashSet<RecordKey> = HashSet::with_capacity(left.len());
    let mut merged = Vec::with_capacity(left.len().min(right.len()));
    for record in left {
        let Some(key) = record.key(keys) else {
            continue;
        };
        if let Some(other) = right_index.get(&key) {
            merged.push(MergedRecord {
                country: record.country.clone(),
                age: record.age,
                sex: record.sex.clone(),
                year: record.year,
                activity_value: record.value,
                obesity_value: other.value,
            });
        }
        if !seen_left.insert(key.clone()) {
            return Err(EtlError::NotOneToOne {
                side: "left",
                key: key.to_string(),
            });
        }
    }

    debug!(
        left = left.len(),
        right = right.len(),
        merged = merged.len(),
        "inner join complete"
    );
    Ok(merged)
}

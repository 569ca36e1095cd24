// src/pipeline.rs

use arrow::record_batch::RecordBatch;
use tracing::{info, info_span};

use crate::{
    error::EtlError,
    merge::merge,
    output::{encode, measure_batch, merged_batch, TableFormat, CURATED_STEM},
    process::{read_measure, ColumnNames, Measure},
    store::{curated_id, processed_id, BlobStore},
    validate::{validate_keys, KeyField},
};

/// Everything the core needs for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub ages: Vec<u32>,
    pub activity_prefix: String,
    pub obesity_prefix: String,
    pub columns: ColumnNames,
    /// Output formats; CSV is always included.
    pub formats: Vec<TableFormat>,
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ages: vec![11, 13, 15],
            activity_prefix: "Percentages of physically active children among".into(),
            obesity_prefix: "Prevalence of overweight (including obesity) among".into(),
            columns: ColumnNames::default(),
            formats: vec![TableFormat::Csv],
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub activity_rows: usize,
    pub obesity_rows: usize,
    pub merged_rows: usize,
    /// Locations written, in write order. Empty for a dry run.
    pub written: Vec<String>,
}

struct Payload<'a> {
    store: &'a dyn BlobStore,
    resource: String,
    bytes: Vec<u8>,
}

/// Read, validate and merge both measures, then write the processed and
/// curated layers to `store` (and the curated set to `snapshot`, if given).
///
/// Every payload is encoded before the first write, so a failure anywhere
/// leaves both stores untouched.
pub fn run(
    store: &dyn BlobStore,
    snapshot: Option<&dyn BlobStore>,
    config: &RunConfig,
) -> Result<RunSummary, EtlError> {
    let span = info_span!("run", dry_run = config.dry_run);
    let _enter = span.enter();

    let activity = read_measure(store, &config.ages, &config.activity_prefix, &config.columns)?;
    let obesity = read_measure(store, &config.ages, &config.obesity_prefix, &config.columns)?;
    info!(
        "Row counts: activity={}, obesity={}",
        activity.len(),
        obesity.len()
    );

    let keys = KeyField::ALL;
    validate_keys(&activity, &keys, Measure::Activity.label())?;
    validate_keys(&obesity, &keys, Measure::Obesity.label())?;

    let merged = merge(&activity, &obesity, &keys)?;
    let key_names: Vec<&str> = keys.iter().map(|k| k.column()).collect();
    info!("Merged rows={} (inner on {:?})", merged.len(), key_names);

    let mut summary = RunSummary {
        activity_rows: activity.len(),
        obesity_rows: obesity.len(),
        merged_rows: merged.len(),
        written: Vec::new(),
    };

    let tables: [(RecordBatch, Option<Measure>); 3] = [
        (measure_batch(Measure::Activity, &activity)?, Some(Measure::Activity)),
        (measure_batch(Measure::Obesity, &obesity)?, Some(Measure::Obesity)),
        (merged_batch(&merged)?, None),
    ];

    let mut formats = vec![TableFormat::Csv];
    formats.extend(config.formats.iter().copied().filter(|f| *f != TableFormat::Csv));

    // Snapshot first, then processed, then curated.
    let mut payloads: Vec<Payload<'_>> = Vec::new();
    if let Some(snapshot) = snapshot {
        for &format in &formats {
            payloads.push(Payload {
                store: snapshot,
                resource: format!("{}.{}", CURATED_STEM, format.extension()),
                bytes: encode(&tables[2].0, format)?,
            });
        }
    }
    for &format in &formats {
        for (batch, measure) in &tables {
            let resource = match measure {
                Some(m) => processed_id(m.processed_stem(), format),
                None => curated_id(CURATED_STEM, format),
            };
            payloads.push(Payload {
                store,
                resource,
                bytes: encode(batch, format)?,
            });
        }
    }

    if config.dry_run {
        info!("--dry-run: validations complete; skipping writes.");
        return Ok(summary);
    }

    for payload in payloads {
        let location = payload.store.describe(&payload.resource);
        let bytes = payload.bytes.len();
        payload.store.put(&payload.resource, payload.bytes)?;
        info!(location = %location, bytes, "wrote");
        summary.written.push(location);
    }

    Ok(summary)
}

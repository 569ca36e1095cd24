// src/config.rs

use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::{output::TableFormat, pipeline::RunConfig, process::ColumnNames};

/// Build processed & curated activity/obesity datasets from raw WHO exports.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Container holding raw/, processed/ and curated/ (GCS bucket with --gcs)
    #[arg(long, env = "HEALTH_ETL_CONTAINER")]
    pub container: String,

    /// Local directory the container lives in
    #[arg(long, env = "HEALTH_ETL_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Read and write the container as a Google Cloud Storage bucket
    #[arg(long, env = "HEALTH_ETL_GCS")]
    pub gcs: bool,

    /// Ages to process
    #[arg(long, num_args = 1.., default_values_t = [11, 13, 15])]
    pub ages: Vec<u32>,

    #[arg(long, default_value = "Percentages of physically active children among")]
    pub activity_prefix: String,

    #[arg(long, default_value = "Prevalence of overweight (including obesity) among")]
    pub obesity_prefix: String,

    /// Header names of the country, sex, year and value columns
    #[arg(long, value_delimiter = ',', default_value = "COUNTRY,SEX,YEAR,VALUE")]
    pub columns: Vec<String>,

    /// Also write Parquet outputs
    #[arg(long)]
    pub write_parquet: bool,

    /// Run validations; skip writes
    #[arg(long)]
    pub dry_run: bool,

    /// Local directory for a snapshot of the curated dataset
    #[arg(long, env = "HEALTH_ETL_SNAPSHOT_DIR")]
    pub snapshot_dir: Option<PathBuf>,

    /// Verbose logs
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    pub fn run_config(&self) -> Result<RunConfig> {
        if self.ages.is_empty() {
            bail!("at least one age is required");
        }
        let names: Vec<String> = self.columns.iter().map(|c| c.trim().to_string()).collect();
        let [country, sex, year, value] = match <[String; 4]>::try_from(names) {
            Ok(names) => names,
            Err(names) => bail!("--columns needs exactly 4 names, got {}", names.len()),
        };
        if [&country, &sex, &year, &value].iter().any(|c| c.is_empty()) {
            bail!("--columns names must not be empty");
        }

        let mut formats = vec![TableFormat::Csv];
        if self.write_parquet {
            formats.push(TableFormat::Parquet);
        }

        Ok(RunConfig {
            ages: self.ages.clone(),
            activity_prefix: self.activity_prefix.clone(),
            obesity_prefix: self.obesity_prefix.clone(),
            columns: ColumnNames {
                country,
                sex,
                year,
                value,
            },
            formats,
            dry_run: self.dry_run,
        })
    }

    /// Local path of the container.
    pub fn container_dir(&self) -> PathBuf {
        self.root.join(&self.container)
    }
}

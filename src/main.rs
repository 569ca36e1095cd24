use anyhow::{Context, Result};
use clap::Parser;
use health_etl::{
    config::Args,
    pipeline,
    store::{BlobStore, GcsStore, LocalStore},
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) logging, scoped to this run ─────────────────────────────
    let default_filter = if args.debug {
        "debug".to_string()
    } else {
        "info,google_cloud_storage=warn,google_cloud_auth=warn,reqwest=warn,hyper=warn".to_string()
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(true)
        .finish();
    let _log_guard = tracing::subscriber::set_default(subscriber);
    info!("startup");

    // ─── 2) configuration ───────────────────────────────────────────
    let config = args.run_config()?;
    info!(
        container = %args.container,
        ages = ?config.ages,
        dry_run = config.dry_run,
        "configuration"
    );

    // ─── 3) stores ──────────────────────────────────────────────────
    let store: Box<dyn BlobStore> = if args.gcs {
        Box::new(GcsStore::connect(&args.container)?)
    } else {
        let dir = args.container_dir();
        if !dir.is_dir() {
            warn!("container directory {} does not exist", dir.display());
        }
        Box::new(LocalStore::new(dir))
    };
    let snapshot = args.snapshot_dir.clone().map(LocalStore::new);

    // ─── 4) run ─────────────────────────────────────────────────────
    let summary = pipeline::run(
        &*store,
        snapshot.as_ref().map(|s| s as &dyn BlobStore),
        &config,
    )
    .context("health ETL run failed")?;

    info!(
        activity = summary.activity_rows,
        obesity = summary.obesity_rows,
        merged = summary.merged_rows,
        written = summary.written.len(),
        "all done"
    );
    Ok(())
}

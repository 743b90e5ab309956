//! Ontology matcher evaluation
//!
//! Runs the published experiments over OAEI tool outputs found under the data
//! directory, caching every intermediate dataset and result table there.
//!
//! **Usage:**
//! ```bash
//! ome-eval [--data-dir <DIR>] [--config <FILE>] [--seed <N>] [--cv-folds <K>]
//!          [--no-undersample] [--experiment <ID>]... [--export-dir <DIR>]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use ome_common::config::{CliOverrides, EvalSettings};
use ome_common::{Artifact, Json};
use ome_eval::report::CliFormatter;
use ome_eval::{ExperimentId, Pipeline};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Ontology matcher evaluation
#[derive(Parser, Debug)]
#[clap(name = "ome-eval")]
#[clap(about = "Evaluate ontology matching tools as classifier features")]
struct Args {
    /// Data directory with tool outputs, references and caches [env: OME_DATA_DIR]
    #[clap(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// TOML config file (default: ./ome.toml, then the user config dir)
    #[clap(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root seed for sampling, undersampling and model fitting
    #[clap(long)]
    seed: Option<u64>,

    /// Cross-validation folds
    #[clap(long)]
    cv_folds: Option<usize>,

    /// Train on the full class distribution
    #[clap(long)]
    no_undersample: bool,

    /// Experiment to run (repeatable; default: all)
    #[clap(long = "experiment", value_enum, value_name = "ID")]
    experiments: Vec<ExperimentId>,

    /// Also copy each result table into this directory
    #[clap(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let settings = EvalSettings::resolve(&CliOverrides {
        data_dir: args.data_dir.clone(),
        config: args.config.clone(),
        seed: args.seed,
        cv_folds: args.cv_folds,
        no_undersample: args.no_undersample,
    })
    .context("Failed to resolve settings")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .init();

    info!("Data directory: {}", settings.data_dir.display());
    info!(
        "Seed {}, {} folds, undersampling {}",
        settings.seed.value(),
        settings.cv_folds,
        if settings.undersample { "on" } else { "off" }
    );

    let experiments = if args.experiments.is_empty() {
        ExperimentId::ALL.to_vec()
    } else {
        args.experiments.clone()
    };

    let started = Instant::now();
    let pipeline = Pipeline::new(settings);
    let results = pipeline
        .run(&experiments)
        .context("Evaluation pipeline failed")?;

    for (id, table) in &results {
        print!("{}", CliFormatter::format_header(id.name(), table));
        print!("{}", CliFormatter::format_summary(table));

        if let Some(dir) = &args.export_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let path = dir.join(id.result_key());
            Json(table.clone())
                .save(&path)
                .with_context(|| format!("Failed to export {}", path.display()))?;
            println!("\n✓ Results exported to: {}", path.display());
        }
    }

    info!(
        "Completed {} experiments in {:.1}s",
        results.len(),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

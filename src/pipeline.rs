use crate::catalog;
use crate::config::AppConfig;
use crate::data;
use crate::fetch::Fetcher;
use crate::processing;
use crate::types::Diagnostic;
use crate::writer;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug)]
pub struct RunSummary {
    pub datasets: usize,
    pub features: usize,
    pub files: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Catalog -> features -> rows -> CSV files. Only a catalog failure or a
/// filesystem error aborts the run.
pub async fn run(config: &AppConfig) -> Result<RunSummary> {
    config.validate()?;

    let dest = &config.output.dest_dir;
    fs::create_dir_all(dest)
        .with_context(|| format!("Failed to create output directory: {:?}", dest))?;

    let fetcher = Fetcher::new();
    let mut diagnostics = Vec::new();

    // 1. Resolve dataset endpoints
    println!("Obtaining URIs...");
    let catalog_url = &config.source.catalog_url;
    let uris = catalog::resolve_dataset_uris(&fetcher, catalog_url, &config.fetch.catalog)
        .await
        .with_context(|| format!("Failed to resolve catalog {}", catalog_url))?;
    println!("Found {} datasets", uris.len());

    // 2. Fetch features
    println!("Fetching features...");
    let features = data::collect_features(&fetcher, &uris, &config.fetch.dataset)
        .await
        .drain_into(&mut diagnostics);

    // 3. Flatten
    println!("Creating table...");
    let rows = processing::create_table(&features);
    let feature_count = features.len();
    drop(features);

    // 4. Sort, partition and write
    let files = writer::partition_and_write(rows, dest)?.drain_into(&mut diagnostics);

    let summary = RunSummary {
        datasets: uris.len(),
        features: feature_count,
        files,
        diagnostics,
    };
    info!(
        datasets = summary.datasets,
        features = summary.features,
        files = summary.files.len(),
        warnings = summary.diagnostics.len(),
        "extraction finished"
    );

    Ok(summary)
}

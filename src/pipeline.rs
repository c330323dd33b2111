// src/pipeline.rs

use std::future::Future;

use reqwest::Client;
use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::error::{FetchError, PipelineError, Result};
use crate::fetch::{BoundarySource, PopulationSource};
use crate::ingest::Extraction;
use crate::merge::merge;
use crate::model::{BoundaryRecord, PopulationRecord};
use crate::view::Projector;

/// Record counts from one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub population_rows: usize,
    pub skipped_rows: usize,
    pub boundary_records: usize,
    pub enriched_rows: usize,
}

/// The merged table plus how it was built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub table: Vec<PopulationRecord>,
    pub summary: LoadSummary,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// HTTP client shared by both sources.
pub fn build_client(config: &PipelineConfig) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .gzip(true)
        .build()
}

/// Run both loads concurrently and merge once both have succeeded.
/// If either fails the merge never runs and that error is returned.
pub async fn combine<P, B>(population: P, boundaries: B) -> Result<Dataset>
where
    P: Future<Output = Result<Extraction>>,
    B: Future<Output = Result<Vec<BoundaryRecord>, FetchError>>,
{
    let boundaries = async { boundaries.await.map_err(PipelineError::from) };
    let (extraction, boundaries) = tokio::try_join!(population, boundaries)?;

    let table = merge(&extraction.records, Some(boundaries.as_slice()));
    let summary = LoadSummary {
        population_rows: extraction.records.len(),
        skipped_rows: extraction.skipped,
        boundary_records: boundaries.len(),
        enriched_rows: table.iter().filter(|r| r.is_enriched()).count(),
    };
    Ok(Dataset { table, summary })
}

/// Fetch the population CSV and every boundary page, then merge them.
#[instrument(level = "info", skip_all)]
pub async fn load_dataset(client: &Client, config: &PipelineConfig) -> Result<Dataset> {
    let population =
        PopulationSource::new(client.clone(), &config.population_url, config.retry_policy())?;
    let boundaries = BoundarySource::new(client.clone(), &config.boundaries_url, config.page_size)?;

    let dataset = combine(population.load(), boundaries.fetch_all()).await?;
    info!(
        rows = dataset.summary.population_rows,
        skipped = dataset.summary.skipped_rows,
        boundaries = dataset.summary.boundary_records,
        enriched = dataset.summary.enriched_rows,
        "dataset ready"
    );
    Ok(dataset)
}

/// Projector configured from the pipeline config.
pub fn projector(config: &PipelineConfig) -> Projector {
    Projector::new(config.view.clone())
}

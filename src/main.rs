use anyhow::{Context, Result};
use popgeo::{
    config::PipelineConfig,
    pipeline::{build_client, load_dataset, projector},
    view::{self, page_count},
};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,popgeo=debug"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    // ─── 2) config ───────────────────────────────────────────────────
    let config = match env::args().nth(1) {
        Some(path) => PipelineConfig::load(&path)?,
        None => PipelineConfig::from_env()?,
    };
    info!(
        population = %config.population_url,
        boundaries = %config.boundaries_url,
        default_country = %config.view.default_country,
        "config"
    );

    // ─── 3) load + merge ─────────────────────────────────────────────
    let client = build_client(&config).context("building http client")?;
    let dataset = match load_dataset(&client, &config).await {
        Ok(d) => d,
        Err(e) if e.is_data_format() => {
            error!(error = %e, "data format error");
            return Err(e.into());
        }
        Err(e) if e.is_config() => {
            error!(error = %e, "configuration error");
            return Err(e.into());
        }
        Err(e) => {
            error!(error = %e, "retry exhausted");
            return Err(e.into());
        }
    };
    if dataset.is_empty() {
        info!("no population rows; exit");
        return Ok(());
    }

    // ─── 4) views ────────────────────────────────────────────────────
    let projector = projector(&config);
    let series = projector.country_series(&dataset.table, None);
    info!(title = %series.title, points = series.len(), "country series");
    if let (Some(first), Some(last)) = (series.iter().next(), series.iter().last()) {
        info!(from = ?first, to = ?last, "range");
    }

    let countries = view::countries(&dataset.table);
    let years = view::years(&dataset.table);
    info!(countries = countries.len(), years = years.len(), "catalogues");

    if let Some(&latest) = years.iter().rev().find(|&&y| y <= config.view.max_year) {
        let snapshot = projector.year_snapshot(&dataset.table, latest);
        let pages = page_count(snapshot.len(), config.view.page_size);
        let first_page = projector.page(&snapshot, 1);
        info!(title = %snapshot.title, pages, "snapshot");
        for (rank, (name, value)) in first_page.iter().enumerate() {
            info!(rank = rank + 1, country = name, value, "top");
        }
    }

    info!("all done");
    Ok(())
}

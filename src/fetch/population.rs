// src/fetch/population.rs

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use super::retry::RetryPolicy;
use crate::error::{FetchError, PipelineError};
use crate::ingest::records::{extract, Extraction};

/// The CSV population dataset behind a single URL.
#[derive(Debug, Clone)]
pub struct PopulationSource {
    client: Client,
    url: Url,
    retry: RetryPolicy,
}

impl PopulationSource {
    pub fn new(client: Client, url: &str, retry: RetryPolicy) -> Result<Self, FetchError> {
        let url = Url::parse(url).map_err(|source| FetchError::Url {
            url: url.to_string(),
            source,
        })?;
        Ok(Self { client, url, retry })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Download the CSV text, retrying transport failures and empty bodies.
    #[instrument(level = "info", skip(self), fields(url = %self.url))]
    pub async fn fetch_text(&self) -> Result<String, FetchError> {
        self.retry
            .run(self.url.as_str(), move || get_text_core(&self.client, &self.url))
            .await
    }

    /// Download and extract the population records.
    pub async fn load(&self) -> Result<Extraction, PipelineError> {
        let text = self.fetch_text().await?;
        let extraction = extract(&text)?;
        info!(
            rows = extraction.records.len(),
            skipped = extraction.skipped,
            "population loaded"
        );
        Ok(extraction)
    }
}

async fn get_text_core(client: &Client, url: &Url) -> Result<String, FetchError> {
    debug!("Fetching text from {}", url);
    let http = |source| FetchError::Http {
        url: url.to_string(),
        source,
    };
    let text = client
        .get(url.clone())
        .send()
        .await
        .map_err(http)?
        .error_for_status()
        .map_err(http)?
        .text()
        .await
        .map_err(http)?;

    if text.trim().is_empty() {
        return Err(FetchError::EmptyResponse {
            url: url.to_string(),
        });
    }
    Ok(text)
}

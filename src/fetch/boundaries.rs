// src/fetch/boundaries.rs

use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

use super::pages::fetch_all_pages;
use crate::error::FetchError;
use crate::model::{BoundaryPage, BoundaryRecord};

/// Page size the boundaries API is queried with unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// The paginated boundaries JSON API.
#[derive(Debug, Clone)]
pub struct BoundarySource {
    client: Client,
    base: Url,
    page_size: usize,
}

impl BoundarySource {
    pub fn new(client: Client, base_url: &str, page_size: usize) -> Result<Self, FetchError> {
        let base = Url::parse(base_url).map_err(|source| FetchError::Url {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            client,
            base,
            page_size: page_size.max(1),
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// URL for the page at `offset`. Any `limit`/`offset` already on the base
    /// URL is replaced; other query parameters are kept.
    pub fn page_url(&self, offset: usize) -> Url {
        let kept: Vec<(String, String)> = self
            .base
            .query_pairs()
            .filter(|(k, _)| k != "limit" && k != "offset")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = self.base.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("offset", &offset.to_string());
        url
    }

    /// One page, single attempt.
    pub async fn fetch_page(&self, offset: usize) -> Result<BoundaryPage, FetchError> {
        let url = self.page_url(offset);
        debug!(%url, "fetching boundary page");
        let http = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(http)?
            .error_for_status()
            .map_err(http)?
            .text()
            .await
            .map_err(http)?;

        decode_page(&url, &body)
    }

    /// Every boundary record, pages fetched concurrently.
    #[instrument(level = "info", skip(self), fields(base = %self.base))]
    pub async fn fetch_all(&self) -> Result<Vec<BoundaryRecord>, FetchError> {
        let records =
            fetch_all_pages(self.page_size, move |offset| self.fetch_page(offset)).await?;
        info!(records = records.len(), "boundaries loaded");
        Ok(records)
    }
}

fn decode_page(url: &Url, body: &str) -> Result<BoundaryPage, FetchError> {
    serde_json::from_str(body).map_err(|source| FetchError::Decode {
        url: url.to_string(),
        source,
    })
}

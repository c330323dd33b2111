// src/error.rs

use thiserror::Error;

/// Errors raised while turning CSV text into population records.
#[derive(Debug, Error)]
pub enum IngestError {
    /// One or more of the required columns is absent from the header row.
    #[error("missing required columns {missing:?}; found headers {headers:?}")]
    MissingColumns {
        missing: Vec<&'static str>,
        headers: Vec<String>,
    },
}

/// Errors raised by the network-facing half of the pipeline.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The population source answered with an empty or whitespace-only body.
    #[error("empty response from {url}")]
    EmptyResponse { url: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not decode page from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A page of the boundary dataset failed; no partial union is returned.
    #[error("boundary fetch failed at offset {offset}: {source}")]
    Boundary {
        offset: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    /// Whether the transport retry policy should try this request again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EmptyResponse { .. } | Self::Http { .. })
    }
}

/// Umbrella error for a full load.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl PipelineError {
    /// Retries were exhausted or the network failed outright.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Fetch(_)) && !self.is_data_format() && !self.is_config()
    }

    /// A configured URL could not be parsed; nothing was requested.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Fetch(FetchError::Url { .. }))
    }

    /// The data arrived but was not in the expected shape.
    pub fn is_data_format(&self) -> bool {
        match self {
            Self::Ingest(_) => true,
            Self::Fetch(FetchError::Decode { .. }) => true,
            Self::Fetch(FetchError::Boundary { source, .. }) => {
                source.downcast_ref::<serde_json::Error>().is_some()
                    || matches!(
                        source.downcast_ref::<FetchError>(),
                        Some(FetchError::Decode { .. })
                    )
            }
            Self::Fetch(_) => false,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

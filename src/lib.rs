pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod view;

pub use config::PipelineConfig;
pub use error::{FetchError, IngestError, PipelineError};
pub use model::{BoundaryRecord, PopulationRecord};
pub use pipeline::{load_dataset, Dataset, LoadSummary};
pub use view::{paginate, ChartSeries, DisplayMode, Projector};

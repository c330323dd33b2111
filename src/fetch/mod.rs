// src/fetch/mod.rs

pub mod boundaries;
pub mod pages;
pub mod population;
pub mod retry;

pub use boundaries::BoundarySource;
pub use pages::fetch_all_pages;
pub use population::PopulationSource;
pub use retry::RetryPolicy;

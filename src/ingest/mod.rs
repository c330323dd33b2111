// src/ingest/mod.rs

pub mod line;
pub mod records;

pub use line::parse_line;
pub use records::{extract_records, Extraction, REQUIRED_COLUMNS};

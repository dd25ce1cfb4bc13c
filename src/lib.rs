//! ProteusDS Result Processor Library
//!
//! A Rust library for decoding fixed-format ProteusDS simulation output
//! files (cable tensions, rigid-body forces and moments, positional
//! data) and aggregating results across Cases and Realizations.
//!
//! This library provides tools for:
//! - Matching file basenames against the closed set of supported outputs
//! - Decoding connection files with several instrument groups per row
//! - Generating column labels with configurable physical units
//! - Deriving computed columns from restricted arithmetic formulas
//! - Columnwise aggregation (extrema, mean) with cross-file combination
//! - Walking `Case*/Realization*/Results` study trees

pub mod aggregate;
pub mod constants;
pub mod error;
pub mod formula;
pub mod header;
pub mod loader;
pub mod models;
pub mod processor;
pub mod schema;
pub mod table;
pub mod walker;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use aggregate::{AggregationMethod, AggregationResult, Aggregator};
pub use error::{ProteusError, Result};
pub use loader::{ConnectionSelector, LoadOptions};
pub use models::{FileKind, UnitConfig};
pub use table::LabeledTable;

pub mod config;
pub mod error;
pub mod export;
pub mod generator;
pub mod listing;
pub mod metadata;
pub mod ordering;
pub mod picking;
pub mod query;
pub mod stats;

#[cfg(test)]
mod config_tests;
#[cfg(test)]
mod query_tests;

pub use config::*;
pub use error::SelectionError;
pub use export::{ExportReport, MediaSource, TrainingExport};
pub use generator::*;
pub use listing::{describe_training, training_listing};
pub use metadata::*;
pub use ordering::{OrderingConfig, OrderingStrategy, RankedSong, order, order_with_rng};
pub use picking::{PickStrategy, pick, pick_with_rng};

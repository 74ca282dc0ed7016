#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Serde configuration for selectors.
pub mod config;

/// Error types for view selection.
pub mod error;

/// Input normalization for triangulation.
pub mod prepare;

/// View selection algorithms.
pub mod selector;

/// Valid-view statistics of a mask.
pub mod stats;

pub use config::SelectorConfig;
pub use error::SelectionError;
pub use prepare::{points_from_nested, prepare_triangulate_input};
pub use selector::{CameraErrorSelector, PointSelector};
pub use stats::{valid_views_stats, ValidViewsStats};

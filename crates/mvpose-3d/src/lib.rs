#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera model.
pub mod camera;

/// Error types for triangulation.
pub mod error;

/// Small linear algebra helpers backed by faer.
pub mod linalg;

/// Multi-view triangulation algorithms.
pub mod triangulation;

pub use camera::PinholeCamera;
pub use error::TriangulationError;
pub use triangulation::{DltTriangulator, Triangulator, TriangulatorConfig};

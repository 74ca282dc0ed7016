//! # View selection
//!
//! Selectors decide which 2D observations take part in a triangulation by
//! rewriting the validity mask.
//!
//! - [`CameraErrorSelector`] — keeps the views with the smallest mean reprojection error.

mod camera_error;
pub use camera_error::*;

use ndarray::{ArrayD, ArrayViewD};

use crate::error::SelectionError;

/// Trait for algorithms that select points for triangulation.
pub trait PointSelector {
    /// Compute a new selection mask.
    ///
    /// # Arguments
    ///
    /// * `points` - 2D points in shape `[n_view, ..., d]`, `d >= 2`.
    /// * `mask` - Optional validity mask in shape `[n_view, ...]`. Entries equal to 1
    ///   are valid, 0 are ignored, NaN exclude the whole correspondence.
    ///
    /// # Returns
    ///
    /// The selection mask, in the shape of the normalized input mask.
    fn select_mask(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: Option<ArrayViewD<'_, f64>>,
    ) -> Result<ArrayD<f64>, SelectionError>;
}

impl<S: PointSelector + ?Sized> PointSelector for Box<S> {
    fn select_mask(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: Option<ArrayViewD<'_, f64>>,
    ) -> Result<ArrayD<f64>, SelectionError> {
        (**self).select_mask(points, mask)
    }
}

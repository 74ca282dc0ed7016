//! # Triangulation
//!
//! Recovering 3D points from 2D observations in several calibrated views.
//!
//! - [`Triangulator`] — the capability set a camera selector needs: triangulate
//!   under a validity mask and measure the reprojection error.
//! - [`DltTriangulator`] — linear multi-view DLT.
//! - [`TriangulatorConfig`] — serde description used to build a triangulator.
//!
//! Tensors follow one layout throughout:
//!
//! - 2D points: `[n_view, ..., d]` with `d >= 2`, the first two channels are pixels.
//! - mask: `[n_view, ...]`, values in `{0, 1, NaN}`.
//! - 3D points: `[..., 3]`.
//! - reprojection error: `[n_view, ..., 2]`.

mod dlt;
pub use dlt::*;

use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD};
use serde::{Deserialize, Serialize};

use crate::camera::PinholeCamera;
use crate::error::TriangulationError;

/// Trait for multi-view triangulation algorithms.
pub trait Triangulator: Send + Sync {
    /// Number of cameras (views) this triangulator was built for.
    fn camera_number(&self) -> usize;

    /// Triangulate 3D points from multi-view 2D observations.
    ///
    /// # Arguments
    ///
    /// * `points` - 2D points in shape `[n_view, ..., d]`.
    /// * `mask` - Validity mask in shape `[n_view, ...]`. Only entries equal to 1
    ///   take part; a NaN anywhere in a correspondence excludes it entirely.
    ///
    /// # Returns
    ///
    /// 3D points in shape `[..., 3]`. Correspondences that cannot be solved are NaN.
    fn triangulate(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, TriangulationError>;

    /// Project a world point into the given view.
    ///
    /// Returns `None` if the point is not visible to the camera.
    fn project_point(&self, view: usize, point: &[f64; 3]) -> Option<[f64; 2]>;

    /// Compute the signed reprojection error `observed - projected` of every 2D point.
    ///
    /// # Arguments
    ///
    /// * `points2d` - 2D points in shape `[n_view, ..., d]`.
    /// * `points3d` - 3D points in shape `[..., 3]`.
    /// * `mask` - Validity mask in shape `[n_view, ...]`.
    ///
    /// # Returns
    ///
    /// The error in shape `[n_view, ..., 2]`. Entries whose mask is not 1, or
    /// whose 3D point is not finite or not visible, are NaN.
    fn reprojection_error(
        &self,
        points2d: ArrayViewD<'_, f64>,
        points3d: ArrayViewD<'_, f64>,
        mask: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, TriangulationError> {
        let layout = MultiViewLayout::check(&points2d, &mask, self.camera_number())?;

        let mut expected_3d = layout.extra_shape.clone();
        expected_3d.push(3);
        if points3d.shape() != expected_3d.as_slice() {
            return Err(TriangulationError::ShapeMismatch(
                points3d.shape().to_vec(),
                expected_3d,
            ));
        }

        let points2d: Vec<f64> = points2d.iter().copied().collect();
        let points3d: Vec<f64> = points3d.iter().copied().collect();
        let mask: Vec<f64> = mask.iter().copied().collect();

        let mut error = vec![f64::NAN; layout.n_view * layout.n_pair * 2];
        for view in 0..layout.n_view {
            for pair in 0..layout.n_pair {
                if mask[view * layout.n_pair + pair] != 1.0 {
                    continue;
                }
                let p3 = [
                    points3d[pair * 3],
                    points3d[pair * 3 + 1],
                    points3d[pair * 3 + 2],
                ];
                if !p3.iter().all(|x| x.is_finite()) {
                    continue;
                }
                let offset = (view * layout.n_pair + pair) * layout.point_dim;
                let observed = [points2d[offset], points2d[offset + 1]];
                if let Some(projected) = self.project_point(view, &p3) {
                    let out = (view * layout.n_pair + pair) * 2;
                    error[out] = observed[0] - projected[0];
                    error[out + 1] = observed[1] - projected[1];
                }
            }
        }

        let mut out_shape = vec![layout.n_view];
        out_shape.extend_from_slice(&layout.extra_shape);
        out_shape.push(2);
        to_array(out_shape, error)
    }
}

impl<T: Triangulator + ?Sized> Triangulator for Box<T> {
    fn camera_number(&self) -> usize {
        (**self).camera_number()
    }

    fn triangulate(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, TriangulationError> {
        (**self).triangulate(points, mask)
    }

    fn project_point(&self, view: usize, point: &[f64; 3]) -> Option<[f64; 2]> {
        (**self).project_point(view, point)
    }

    fn reprojection_error(
        &self,
        points2d: ArrayViewD<'_, f64>,
        points3d: ArrayViewD<'_, f64>,
        mask: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, TriangulationError> {
        (**self).reprojection_error(points2d, points3d, mask)
    }
}

impl<T: Triangulator + ?Sized> Triangulator for Arc<T> {
    fn camera_number(&self) -> usize {
        (**self).camera_number()
    }

    fn triangulate(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, TriangulationError> {
        (**self).triangulate(points, mask)
    }

    fn project_point(&self, view: usize, point: &[f64; 3]) -> Option<[f64; 2]> {
        (**self).project_point(view, point)
    }

    fn reprojection_error(
        &self,
        points2d: ArrayViewD<'_, f64>,
        points3d: ArrayViewD<'_, f64>,
        mask: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, TriangulationError> {
        (**self).reprojection_error(points2d, points3d, mask)
    }
}

/// Configuration of a triangulator, tagged by `type`.
///
/// ```
/// use mvpose_3d::{Triangulator, TriangulatorConfig};
///
/// let json = r#"{
///     "type": "dlt",
///     "cameras": [{
///         "intrinsic": [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]],
///         "rotation": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
///         "translation": [0.0, 0.0, 0.0]
///     }]
/// }"#;
/// let config: TriangulatorConfig = serde_json::from_str(json).unwrap();
/// let triangulator = config.build().unwrap();
/// assert_eq!(triangulator.camera_number(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriangulatorConfig {
    /// Linear multi-view DLT triangulation.
    Dlt {
        /// One camera per view, in view order.
        cameras: Vec<PinholeCamera>,
        /// Weight each view by the third channel of the 2D points.
        #[serde(default)]
        use_confidence: bool,
    },
}

impl TriangulatorConfig {
    /// Build the configured triangulator.
    pub fn build(&self) -> Result<Box<dyn Triangulator>, TriangulationError> {
        match self {
            TriangulatorConfig::Dlt {
                cameras,
                use_confidence,
            } => {
                let triangulator =
                    DltTriangulator::new(cameras.clone())?.use_confidence(*use_confidence);
                Ok(Box::new(triangulator))
            }
        }
    }
}

/// Validated geometry of a multi-view points tensor and its mask.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MultiViewLayout {
    pub n_view: usize,
    /// Product of the extra axes, i.e. number of correspondences.
    pub n_pair: usize,
    pub point_dim: usize,
    /// Axes between the view axis and the channel axis.
    pub extra_shape: Vec<usize>,
}

impl MultiViewLayout {
    pub(crate) fn check(
        points: &ArrayViewD<'_, f64>,
        mask: &ArrayViewD<'_, f64>,
        camera_number: usize,
    ) -> Result<Self, TriangulationError> {
        let shape = points.shape();
        if shape.len() < 2 {
            return Err(TriangulationError::ShapeMismatch(
                shape.to_vec(),
                vec![camera_number, 2],
            ));
        }
        if shape[0] != camera_number {
            return Err(TriangulationError::CameraNumberMismatch {
                expected: camera_number,
                actual: shape[0],
            });
        }
        let point_dim = shape[shape.len() - 1];
        if point_dim < 2 {
            return Err(TriangulationError::InvalidPointDim {
                required: 2,
                actual: point_dim,
            });
        }
        let mask_shape = &shape[..shape.len() - 1];
        if mask.shape() != mask_shape {
            return Err(TriangulationError::ShapeMismatch(
                mask.shape().to_vec(),
                mask_shape.to_vec(),
            ));
        }

        let extra_shape = shape[1..shape.len() - 1].to_vec();
        Ok(Self {
            n_view: shape[0],
            n_pair: extra_shape.iter().product(),
            point_dim,
            extra_shape,
        })
    }
}

pub(crate) fn to_array(shape: Vec<usize>, data: Vec<f64>) -> Result<ArrayD<f64>, TriangulationError> {
    let len = data.len();
    ArrayD::from_shape_vec(shape.clone(), data)
        .map_err(|_| TriangulationError::ShapeMismatch(shape, vec![len]))
}

use std::cmp::Ordering;

use mvpose_3d::Triangulator;
use ndarray::{ArrayD, ArrayViewD, Axis};

use super::PointSelector;
use crate::config::SelectorConfig;
use crate::error::SelectionError;
use crate::prepare::prepare_triangulate_input;
use crate::stats::valid_views_stats;

/// Select views according to their reprojection error.
///
/// The points are triangulated once with every view under the input mask. The
/// absolute reprojection error is averaged per view, ignoring NaN, and the
/// `target_camera_number` views with the smallest mean error are kept.
///
/// A view without any finite error (NaN mean) ranks behind every other view.
/// Views with equal errors are ordered by index.
pub struct CameraErrorSelector<T = Box<dyn Triangulator>> {
    target_camera_number: usize,
    triangulator: T,
    verbose: bool,
    log_target: String,
}

/// Log target used when none is configured.
pub const DEFAULT_LOG_TARGET: &str = module_path!();

impl<T: Triangulator> CameraErrorSelector<T> {
    /// Creates a new selector.
    ///
    /// # Arguments
    ///
    /// * `target_camera_number` - How many views are kept, must be at least 2.
    /// * `triangulator` - Triangulator used for the reprojection error.
    /// * `verbose` - Log valid-view statistics at info level.
    ///
    /// # Errors
    ///
    /// [`SelectionError::InvalidTargetCameraNumber`] if `target_camera_number < 2`.
    pub fn new(
        target_camera_number: usize,
        triangulator: T,
        verbose: bool,
    ) -> Result<Self, SelectionError> {
        if target_camera_number < 2 {
            log::error!(
                "target_camera_number must be no fewer than 2, got {target_camera_number}"
            );
            return Err(SelectionError::InvalidTargetCameraNumber(
                target_camera_number,
            ));
        }
        Ok(Self {
            target_camera_number,
            triangulator,
            verbose,
            log_target: DEFAULT_LOG_TARGET.to_string(),
        })
    }

    /// Emit the log records of this selector under `target`.
    ///
    /// Default is [`DEFAULT_LOG_TARGET`].
    #[must_use]
    pub fn with_log_target(self, target: impl Into<String>) -> Self {
        Self {
            log_target: target.into(),
            ..self
        }
    }

    /// The log target of this selector.
    pub fn log_target(&self) -> &str {
        &self.log_target
    }

    /// How many views this selector keeps.
    pub fn target_camera_number(&self) -> usize {
        self.target_camera_number
    }

    /// The triangulator used for the reprojection error.
    pub fn triangulator(&self) -> &T {
        &self.triangulator
    }

    /// Select the views to keep.
    ///
    /// # Arguments
    ///
    /// * `points` - 2D points in shape `[n_view, ..., d]`, `d >= 2`.
    /// * `mask` - Optional validity mask in shape `[n_view, ...]`.
    ///
    /// # Returns
    ///
    /// The ascending indices of the kept views, `target_camera_number` of them,
    /// or both views when the input has only two.
    pub fn select_indices(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: Option<ArrayViewD<'_, f64>>,
    ) -> Result<Vec<usize>, SelectionError> {
        let n_view = points.shape().first().copied().unwrap_or(0);
        let (points, mask) = prepare_triangulate_input(n_view, points, mask)?;
        self.select_prepared(&points, &mask)
    }

    fn select_prepared(
        &self,
        points: &ArrayD<f64>,
        mask: &ArrayD<f64>,
    ) -> Result<Vec<usize>, SelectionError> {
        let n_view = mask.shape()[0];
        if n_view < self.target_camera_number {
            return Err(SelectionError::NotEnoughViews {
                n_view,
                target: self.target_camera_number,
            });
        }

        if self.verbose {
            log::info!(
                target: self.log_target(),
                "valid views of the input mask:\n{}",
                valid_views_stats(mask.view())?
            );
        }

        if n_view == 2 {
            log::warn!(
                target: self.log_target(),
                "There's no potential to search a sub-triangulator according to n_view."
            );
            return Ok((0..n_view).collect());
        }

        let points3d = self.triangulator.triangulate(points.view(), mask.view())?;
        let error =
            self.triangulator
                .reprojection_error(points.view(), points3d.view(), mask.view())?;

        // the error must be [n_view, ..., 2] for any triangulator
        let mut expected = mask.shape().to_vec();
        expected.push(2);
        if error.shape() != expected.as_slice() {
            return Err(SelectionError::ShapeMismatch(
                error.shape().to_vec(),
                expected,
            ));
        }

        let mean_errors = mean_view_errors(&error);
        log::debug!(
            target: self.log_target(),
            "mean reprojection error per view: {mean_errors:?}"
        );

        Ok(select_smallest(&mean_errors, self.target_camera_number))
    }

    /// Compute a new mask keeping only the selected views.
    ///
    /// Entries of the kept views are unchanged. Entries of the other views are
    /// set to 0, except NaN entries which stay NaN.
    pub fn select_mask(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: Option<ArrayViewD<'_, f64>>,
    ) -> Result<ArrayD<f64>, SelectionError> {
        let n_view = points.shape().first().copied().unwrap_or(0);
        let (points, mask) = prepare_triangulate_input(n_view, points, mask)?;
        let selected = self.select_prepared(&points, &mask)?;

        let mut selection_mask = mask;
        for (view, mut view_mask) in selection_mask.axis_iter_mut(Axis(0)).enumerate() {
            if selected.contains(&view) {
                continue;
            }
            view_mask.mapv_inplace(|m| if m.is_nan() { m } else { 0.0 });
        }

        if self.verbose {
            log::info!(
                target: self.log_target(),
                "valid views of the selection mask:\n{}",
                valid_views_stats(selection_mask.view())?
            );
        }
        Ok(selection_mask)
    }
}

impl CameraErrorSelector<Box<dyn Triangulator>> {
    /// Build a selector and its triangulator from a config.
    pub fn from_config(config: &SelectorConfig) -> Result<Self, SelectionError> {
        let triangulator = config.triangulator.build()?;
        let selector = Self::new(config.target_camera_number, triangulator, config.verbose)?;
        Ok(match &config.log_target {
            Some(target) => selector.with_log_target(target.as_str()),
            None => selector,
        })
    }
}

impl<T: Triangulator> PointSelector for CameraErrorSelector<T> {
    fn select_mask(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: Option<ArrayViewD<'_, f64>>,
    ) -> Result<ArrayD<f64>, SelectionError> {
        CameraErrorSelector::select_mask(self, points, mask)
    }
}

/// Mean absolute error of every view, ignoring NaN.
///
/// # Arguments
///
/// * `error` - Reprojection error in shape `[n_view, ...]`.
///
/// # Returns
///
/// One value per view, NaN for a view without any finite entry. Empty for a
/// 0-d error.
pub fn mean_view_errors(error: &ArrayD<f64>) -> Vec<f64> {
    if error.ndim() == 0 {
        return Vec::new();
    }
    error
        .axis_iter(Axis(0))
        .map(|view_error| {
            let (sum, count) = view_error
                .iter()
                .filter(|e| !e.is_nan())
                .fold((0.0, 0usize), |(sum, count), e| (sum + e.abs(), count + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect()
}

/// Indices of the `k` smallest errors, in ascending index order.
///
/// Uses a partial selection rather than a full sort. NaN ranks behind every
/// other value, `+inf` included. Ties are broken by the lower index.
pub fn select_smallest(errors: &[f64], k: usize) -> Vec<usize> {
    let cmp = |a: &usize, b: &usize| -> Ordering {
        let (ea, eb) = (errors[*a], errors[*b]);
        ea.is_nan()
            .cmp(&eb.is_nan())
            .then_with(|| ea.total_cmp(&eb))
            .then_with(|| a.cmp(b))
    };

    let mut indices: Vec<usize> = (0..errors.len()).collect();
    if k < indices.len() {
        indices.select_nth_unstable_by(k, cmp);
        indices.truncate(k);
    }
    indices.sort_unstable();
    indices
}

use ndarray::{ArrayD, ArrayViewD, IxDyn};

use crate::error::SelectionError;

/// Validate and normalize the inputs of a triangulation.
///
/// # Arguments
///
/// * `camera_number` - The expected number of views.
/// * `points` - 2D points in shape `[n_view, ..., d]` with `d >= 2`.
/// * `mask` - Optional validity mask in shape `[n_view, ...]` or `[n_view, ..., 1]`.
///   Defaults to all ones.
///
/// # Returns
///
/// A tuple with an owned copy of the points and the mask in shape `[n_view, ...]`.
///
/// # Errors
///
/// If the shapes of the points and the mask are incompatible, or the mask holds
/// values other than 0, 1 and NaN.
///
/// # Example
///
/// ```
/// use mvpose_select::prepare_triangulate_input;
/// use ndarray::{ArrayD, IxDyn};
///
/// let points = ArrayD::<f64>::zeros(IxDyn(&[3, 17, 3]));
/// let mask = ArrayD::<f64>::ones(IxDyn(&[3, 17, 1]));
/// let (points, mask) = prepare_triangulate_input(3, points.view(), Some(mask.view())).unwrap();
/// assert_eq!(points.shape(), &[3, 17, 3]);
/// assert_eq!(mask.shape(), &[3, 17]);
/// ```
pub fn prepare_triangulate_input(
    camera_number: usize,
    points: ArrayViewD<'_, f64>,
    mask: Option<ArrayViewD<'_, f64>>,
) -> Result<(ArrayD<f64>, ArrayD<f64>), SelectionError> {
    let shape = points.shape();
    if shape.len() < 2 {
        return Err(SelectionError::InvalidPointsRank(shape.len()));
    }
    if shape[0] != camera_number {
        return Err(SelectionError::CameraNumberMismatch {
            expected: camera_number,
            actual: shape[0],
        });
    }
    let point_dim = shape[shape.len() - 1];
    if point_dim < 2 {
        return Err(SelectionError::InvalidPointDim(point_dim));
    }

    let mask_shape = shape[..shape.len() - 1].to_vec();
    let mask = match mask {
        None => ArrayD::<f64>::ones(IxDyn(&mask_shape)),
        Some(mask) => normalize_mask(mask, &mask_shape)?,
    };

    if let Some(value) = mask.iter().find(|&&m| !(m.is_nan() || m == 0.0 || m == 1.0)) {
        return Err(SelectionError::InvalidMaskValue(*value));
    }

    Ok((points.to_owned(), mask))
}

fn normalize_mask(
    mask: ArrayViewD<'_, f64>,
    mask_shape: &[usize],
) -> Result<ArrayD<f64>, SelectionError> {
    let given = mask.shape();
    if given == mask_shape {
        return Ok(mask.to_owned());
    }

    // legacy layout with a trailing unit channel
    let squeezable = given.len() == mask_shape.len() + 1
        && given[given.len() - 1] == 1
        && &given[..given.len() - 1] == mask_shape;
    if !squeezable {
        return Err(SelectionError::ShapeMismatch(
            given.to_vec(),
            mask_shape.to_vec(),
        ));
    }

    let data: Vec<f64> = mask.iter().copied().collect();
    ArrayD::from_shape_vec(IxDyn(mask_shape), data)
        .map_err(|_| SelectionError::ShapeMismatch(given.to_vec(), mask_shape.to_vec()))
}

/// Build a `[n_view, n_point, d]` points tensor from nested sequences.
///
/// # Errors
///
/// If the views hold different numbers of points or the points have different lengths.
pub fn points_from_nested(nested: &[Vec<Vec<f64>>]) -> Result<ArrayD<f64>, SelectionError> {
    let n_view = nested.len();
    let n_point = nested.first().map_or(0, |v| v.len());
    let point_dim = nested
        .first()
        .and_then(|v| v.first())
        .map_or(0, |p| p.len());

    let mut data = Vec::with_capacity(n_view * n_point * point_dim);
    for view in nested {
        if view.len() != n_point {
            return Err(SelectionError::ShapeMismatch(
                vec![view.len()],
                vec![n_point],
            ));
        }
        for point in view {
            if point.len() != point_dim {
                return Err(SelectionError::ShapeMismatch(
                    vec![point.len()],
                    vec![point_dim],
                ));
            }
            data.extend_from_slice(point);
        }
    }

    let shape = vec![n_view, n_point, point_dim];
    ArrayD::from_shape_vec(IxDyn(&shape), data)
        .map_err(|_| SelectionError::ShapeMismatch(shape.clone(), shape))
}

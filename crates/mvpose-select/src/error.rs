use mvpose_3d::TriangulationError;
use thiserror::Error;

/// An error type for view selection.
#[derive(Error, Debug)]
pub enum SelectionError {
    /// The selector was configured to keep fewer than two views.
    #[error("target_camera_number must be no fewer than 2, got {0}")]
    InvalidTargetCameraNumber(usize),

    /// The input has fewer views than the selector has to keep.
    #[error("Not enough views: got {n_view}, need at least {target}")]
    NotEnoughViews {
        /// Number of views in the input.
        n_view: usize,
        /// Number of views the selector keeps.
        target: usize,
    },

    /// The number of views does not match the expected camera number.
    #[error("Camera number mismatch: expected {expected}, got {actual}")]
    CameraNumberMismatch {
        /// Expected camera number.
        expected: usize,
        /// Number of views in the input.
        actual: usize,
    },

    /// Points must have a view axis and a channel axis.
    #[error("Points must have at least 2 dimensions, got {0}")]
    InvalidPointsRank(usize),

    /// The channel axis of the points holds fewer than two values.
    #[error("Points must have at least 2 channels in the last axis, got {0}")]
    InvalidPointDim(usize),

    /// Two tensors that must agree in shape do not.
    #[error("Shape mismatch: {0:?} != {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// A mask entry is not 0, 1 or NaN.
    #[error("Mask values must be 0, 1 or NaN, got {0}")]
    InvalidMaskValue(f64),

    /// Triangulation error
    #[error(transparent)]
    Triangulation(#[from] TriangulationError),

    /// Configuration could not be parsed.
    #[error("Invalid selector config: {0}")]
    Config(#[from] serde_json::Error),
}

use thiserror::Error;

/// An error type for triangulation.
#[derive(Error, Debug, PartialEq)]
pub enum TriangulationError {
    /// The number of views in the input does not match the number of cameras.
    #[error("Camera number mismatch: the triangulator has {expected} cameras, got {actual} views")]
    CameraNumberMismatch {
        /// Number of cameras held by the triangulator.
        expected: usize,
        /// Number of views in the input.
        actual: usize,
    },

    /// Two tensors that must agree in shape do not.
    #[error("Shape mismatch: {0:?} != {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// The last axis of a points tensor is too small.
    #[error("Points must have at least {required} channels in the last axis, got {actual}")]
    InvalidPointDim {
        /// Minimum number of channels.
        required: usize,
        /// Number of channels found.
        actual: usize,
    },

    /// A triangulator was configured without cameras.
    #[error("Triangulator requires at least one camera")]
    NoCameras,
}

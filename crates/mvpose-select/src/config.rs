use mvpose_3d::TriangulatorConfig;
use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// Configuration of a [`CameraErrorSelector`](crate::CameraErrorSelector).
///
/// ```
/// use mvpose_select::{CameraErrorSelector, SelectorConfig};
///
/// let json = r#"{
///     "target_camera_number": 2,
///     "verbose": false,
///     "triangulator": {
///         "type": "dlt",
///         "cameras": [
///             {
///                 "intrinsic": [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]],
///                 "rotation": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
///                 "translation": [0.0, 0.0, 0.0]
///             },
///             {
///                 "intrinsic": [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]],
///                 "rotation": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
///                 "translation": [-1.0, 0.0, 0.0]
///             }
///         ]
///     }
/// }"#;
/// let config = SelectorConfig::from_json(json).unwrap();
/// let selector = CameraErrorSelector::from_config(&config).unwrap();
/// assert_eq!(selector.target_camera_number(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// How many views are kept.
    pub target_camera_number: usize,
    /// Triangulator used for the reprojection error.
    pub triangulator: TriangulatorConfig,
    /// Log valid-view statistics. Default is `true`.
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    /// Log target of the selector, see [`CameraErrorSelector::with_log_target`](crate::CameraErrorSelector::with_log_target).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_target: Option<String>,
}

fn default_verbose() -> bool {
    true
}

impl SelectorConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SelectionError> {
        Ok(serde_json::from_str(json)?)
    }
}

use serde::{Deserialize, Serialize};

use crate::linalg;

/// A calibrated pinhole camera.
///
/// The extrinsics map points from the **world** frame to the **camera** frame:
/// `x_cam = R * x_world + t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinholeCamera {
    /// The intrinsic matrix `K` (row-major).
    pub intrinsic: [[f64; 3]; 3],
    /// The world to camera rotation (row-major).
    pub rotation: [[f64; 3]; 3],
    /// The world to camera translation.
    pub translation: [f64; 3],
}

impl PinholeCamera {
    /// Creates a new camera from its intrinsic and extrinsic parameters.
    pub fn new(intrinsic: [[f64; 3]; 3], rotation: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            intrinsic,
            rotation,
            translation,
        }
    }

    /// Creates a camera from focal lengths, principal point and extrinsics.
    pub fn from_focal(
        focal_length: (f64, f64),
        principal_point: (f64, f64),
        rotation: [[f64; 3]; 3],
        translation: [f64; 3],
    ) -> Self {
        let intrinsic = [
            [focal_length.0, 0.0, principal_point.0],
            [0.0, focal_length.1, principal_point.1],
            [0.0, 0.0, 1.0],
        ];
        Self::new(intrinsic, rotation, translation)
    }

    /// Returns the 3x4 projection matrix `K [R | t]`.
    pub fn projection_matrix(&self) -> [[f64; 4]; 3] {
        linalg::projection_matrix(&self.intrinsic, &self.rotation, &self.translation)
    }

    /// Transform a world point into the camera frame.
    pub fn world_to_camera(&self, point: &[f64; 3]) -> [f64; 3] {
        let p = linalg::mat33_mul_vec3(&self.rotation, point);
        [
            p[0] + self.translation[0],
            p[1] + self.translation[1],
            p[2] + self.translation[2],
        ]
    }

    /// Project a world point into pixel coordinates.
    ///
    /// Returns `None` if the point lies on or behind the image plane.
    pub fn project(&self, point: &[f64; 3]) -> Option<[f64; 2]> {
        let pc = self.world_to_camera(point);
        if pc[2] <= 0.0 {
            return None;
        }
        let uvw = linalg::mat33_mul_vec3(&self.intrinsic, &pc);
        Some([uvw[0] / uvw[2], uvw[1] / uvw[2]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EYE: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    #[test]
    fn test_project_principal_point() {
        let cam = PinholeCamera::from_focal((500.0, 500.0), (320.0, 240.0), EYE, [0.0; 3]);
        let uv = cam.project(&[0.0, 0.0, 2.0]).unwrap();
        assert_relative_eq!(uv[0], 320.0);
        assert_relative_eq!(uv[1], 240.0);
    }

    #[test]
    fn test_project_offset() {
        let cam = PinholeCamera::from_focal((500.0, 400.0), (320.0, 240.0), EYE, [0.0, 0.0, 1.0]);
        let uv = cam.project(&[1.0, -1.0, 1.0]).unwrap();
        assert_relative_eq!(uv[0], 320.0 + 250.0);
        assert_relative_eq!(uv[1], 240.0 - 200.0);
    }

    #[test]
    fn test_project_behind_camera() {
        let cam = PinholeCamera::from_focal((500.0, 500.0), (320.0, 240.0), EYE, [0.0; 3]);
        assert!(cam.project(&[0.0, 0.0, -1.0]).is_none());
    }

    #[test]
    fn test_camera_serde() -> Result<(), serde_json::Error> {
        let cam = PinholeCamera::from_focal((500.0, 500.0), (320.0, 240.0), EYE, [0.1, 0.2, 0.3]);
        let json = serde_json::to_string(&cam)?;
        let back: PinholeCamera = serde_json::from_str(&json)?;
        assert_eq!(cam, back);
        Ok(())
    }
}

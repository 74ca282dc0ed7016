use ndarray::{ArrayD, ArrayViewD};

use super::{to_array, MultiViewLayout, Triangulator};
use crate::camera::PinholeCamera;
use crate::error::TriangulationError;
use crate::linalg;

/// Linear multi-view triangulation (DLT).
///
/// Every valid observation `(u, v)` of view `i` with projection matrix `P_i`
/// contributes the two rows `u * P_i[2] - P_i[0]` and `v * P_i[2] - P_i[1]`.
/// Rows are normalized to unit length and accumulated into the 4x4 normal
/// matrix, whose null vector is the homogeneous 3D point.
#[derive(Debug, Clone)]
pub struct DltTriangulator {
    cameras: Vec<PinholeCamera>,
    projections: Vec<[[f64; 4]; 3]>,
    use_confidence: bool,
}

impl DltTriangulator {
    /// Creates a triangulator for the given cameras, one per view.
    pub fn new(cameras: Vec<PinholeCamera>) -> Result<Self, TriangulationError> {
        if cameras.is_empty() {
            return Err(TriangulationError::NoCameras);
        }
        let projections = cameras.iter().map(|c| c.projection_matrix()).collect();
        Ok(Self {
            cameras,
            projections,
            use_confidence: false,
        })
    }

    /// Weight each observation by the third channel of the 2D points.
    ///
    /// Observations with a non-positive or non-finite confidence are skipped.
    /// Has no effect when the points carry only two channels.
    ///
    /// Default is `false`.
    #[must_use]
    pub fn use_confidence(self, use_confidence: bool) -> Self {
        Self {
            use_confidence,
            ..self
        }
    }

    /// The cameras of this triangulator, in view order.
    pub fn cameras(&self) -> &[PinholeCamera] {
        &self.cameras
    }

    /// Triangulate a single correspondence from `(view, [u, v], weight)` observations.
    ///
    /// Returns `None` when fewer than two observations are given or the
    /// solution lies at infinity.
    pub fn triangulate_observations(
        &self,
        observations: impl IntoIterator<Item = (usize, [f64; 2], f64)>,
    ) -> Option<[f64; 3]> {
        let mut normal = [[0.0; 4]; 4];
        let mut count = 0usize;
        for (view, uv, weight) in observations {
            let Some(p) = self.projections.get(view) else {
                continue;
            };
            for (coord, row_idx) in [(uv[0], 0), (uv[1], 1)] {
                let mut row = [0.0; 4];
                for j in 0..4 {
                    row[j] = coord * p[2][j] - p[row_idx][j];
                }
                let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
                if norm <= f64::EPSILON {
                    continue;
                }
                row.iter_mut().for_each(|x| *x /= norm);
                linalg::accumulate_outer4(&mut normal, &row, weight);
            }
            count += 1;
        }
        if count < 2 {
            return None;
        }

        let xh = linalg::null_vector4(&normal);
        if xh[3].abs() < 1e-12 {
            return None;
        }
        let point = [xh[0] / xh[3], xh[1] / xh[3], xh[2] / xh[3]];
        point.iter().all(|x| x.is_finite()).then_some(point)
    }
}

impl Triangulator for DltTriangulator {
    fn camera_number(&self) -> usize {
        self.cameras.len()
    }

    fn triangulate(
        &self,
        points: ArrayViewD<'_, f64>,
        mask: ArrayViewD<'_, f64>,
    ) -> Result<ArrayD<f64>, TriangulationError> {
        let layout = MultiViewLayout::check(&points, &mask, self.camera_number())?;
        let weighted = self.use_confidence && layout.point_dim >= 3;

        let points: Vec<f64> = points.iter().copied().collect();
        let mask: Vec<f64> = mask.iter().copied().collect();

        let mut points3d = vec![f64::NAN; layout.n_pair * 3];
        let mut unsolved = 0usize;
        for pair in 0..layout.n_pair {
            let pair_mask = (0..layout.n_view).map(|view| mask[view * layout.n_pair + pair]);
            if pair_mask.clone().any(f64::is_nan) {
                continue;
            }

            let observations = pair_mask.enumerate().filter_map(|(view, m)| {
                if m != 1.0 {
                    return None;
                }
                let offset = (view * layout.n_pair + pair) * layout.point_dim;
                let uv = [points[offset], points[offset + 1]];
                if !uv.iter().all(|x| x.is_finite()) {
                    return None;
                }
                let weight = if weighted { points[offset + 2] } else { 1.0 };
                (weight.is_finite() && weight > 0.0).then_some((view, uv, weight))
            });

            match self.triangulate_observations(observations) {
                Some(p) => points3d[pair * 3..pair * 3 + 3].copy_from_slice(&p),
                None => unsolved += 1,
            }
        }
        if unsolved > 0 {
            log::debug!(
                "{unsolved} of {} correspondences could not be triangulated",
                layout.n_pair
            );
        }

        let mut out_shape = layout.extra_shape;
        out_shape.push(3);
        to_array(out_shape, points3d)
    }

    fn project_point(&self, view: usize, point: &[f64; 3]) -> Option<[f64; 2]> {
        self.cameras.get(view)?.project(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array3, ArrayD, IxDyn};

    const EYE: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

    fn rig() -> Vec<PinholeCamera> {
        [
            [-1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0],
            [0.0, 1.0, 0.5],
        ]
        .into_iter()
        .map(|t| PinholeCamera::from_focal((800.0, 800.0), (320.0, 240.0), EYE, t))
        .collect()
    }

    fn world_points() -> Vec<[f64; 3]> {
        vec![[0.1, 0.2, 5.0], [-0.3, 0.4, 6.0], [0.5, -0.2, 4.5]]
    }

    fn observe(cameras: &[PinholeCamera], points: &[[f64; 3]]) -> ArrayD<f64> {
        let mut obs = Array3::<f64>::zeros((cameras.len(), points.len(), 3));
        for (v, cam) in cameras.iter().enumerate() {
            for (k, p) in points.iter().enumerate() {
                let uv = cam.project(p).unwrap();
                obs[[v, k, 0]] = uv[0];
                obs[[v, k, 1]] = uv[1];
                obs[[v, k, 2]] = 1.0;
            }
        }
        obs.into_dyn()
    }

    #[test]
    fn test_triangulate_exact() -> Result<(), TriangulationError> {
        let cameras = rig();
        let world = world_points();
        let obs = observe(&cameras, &world);
        let mask = ArrayD::<f64>::ones(IxDyn(&[4, 3]));

        let tri = DltTriangulator::new(cameras)?;
        let points3d = tri.triangulate(obs.view(), mask.view())?;
        assert_eq!(points3d.shape(), &[3, 3]);
        for (k, p) in world.iter().enumerate() {
            for c in 0..3 {
                assert_relative_eq!(points3d[[k, c]], p[c], epsilon = 1e-6);
            }
        }
        Ok(())
    }

    #[test]
    fn test_triangulate_mask_semantics() -> Result<(), TriangulationError> {
        let cameras = rig();
        let world = world_points();
        let mut obs = observe(&cameras, &world);
        // corrupt view 3 of pair 0, then mask it out
        obs[[3, 0, 0]] += 100.0;
        let mut mask = ArrayD::<f64>::ones(IxDyn(&[4, 3]));
        mask[[3, 0]] = 0.0;
        // pair 1 is excluded entirely
        mask[[2, 1]] = f64::NAN;
        // pair 2 keeps a single view
        for v in 1..4 {
            mask[[v, 2]] = 0.0;
        }

        let tri = DltTriangulator::new(cameras)?;
        let points3d = tri.triangulate(obs.view(), mask.view())?;
        for c in 0..3 {
            assert_relative_eq!(points3d[[0, c]], world[0][c], epsilon = 1e-6);
            assert!(points3d[[1, c]].is_nan());
            assert!(points3d[[2, c]].is_nan());
        }
        Ok(())
    }

    #[test]
    fn test_triangulate_confidence_weight() -> Result<(), TriangulationError> {
        let cameras = rig();
        let world = world_points();
        let mut obs = observe(&cameras, &world);
        obs[[0, 1, 0]] += 50.0;
        obs[[0, 1, 2]] = 0.0;
        let mask = ArrayD::<f64>::ones(IxDyn(&[4, 3]));

        let tri = DltTriangulator::new(cameras)?.use_confidence(true);
        let points3d = tri.triangulate(obs.view(), mask.view())?;
        for c in 0..3 {
            assert_relative_eq!(points3d[[1, c]], world[1][c], epsilon = 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_reprojection_error() -> Result<(), TriangulationError> {
        let cameras = rig();
        let world = world_points();
        let mut obs = observe(&cameras, &world);
        let mut mask = ArrayD::<f64>::ones(IxDyn(&[4, 3]));
        mask[[1, 2]] = 0.0;

        let tri = DltTriangulator::new(cameras)?;
        let points3d = tri.triangulate(obs.view(), mask.view())?;
        obs[[2, 0, 0]] += 3.0;
        obs[[2, 0, 1]] -= 4.0;

        let error = tri.reprojection_error(obs.view(), points3d.view(), mask.view())?;
        assert_eq!(error.shape(), &[4, 3, 2]);
        assert_relative_eq!(error[[0, 1, 0]], 0.0, epsilon = 1e-6);
        assert_relative_eq!(error[[2, 0, 0]], 3.0, epsilon = 1e-6);
        assert_relative_eq!(error[[2, 0, 1]], -4.0, epsilon = 1e-6);
        assert!(error[[1, 2, 0]].is_nan());
        assert!(error[[1, 2, 1]].is_nan());
        Ok(())
    }

    #[test]
    fn test_camera_number_mismatch() -> Result<(), TriangulationError> {
        let tri = DltTriangulator::new(rig())?;
        let obs = ArrayD::<f64>::zeros(IxDyn(&[3, 5, 2]));
        let mask = ArrayD::<f64>::ones(IxDyn(&[3, 5]));
        let res = tri.triangulate(obs.view(), mask.view());
        assert_eq!(
            res,
            Err(TriangulationError::CameraNumberMismatch {
                expected: 4,
                actual: 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_mask_shape_mismatch() -> Result<(), TriangulationError> {
        let tri = DltTriangulator::new(rig())?;
        let obs = ArrayD::<f64>::zeros(IxDyn(&[4, 5, 2]));
        let mask = ArrayD::<f64>::ones(IxDyn(&[4, 6]));
        let res = tri.triangulate(obs.view(), mask.view());
        assert_eq!(
            res,
            Err(TriangulationError::ShapeMismatch(vec![4, 6], vec![4, 5]))
        );
        Ok(())
    }

    #[test]
    fn test_no_cameras() {
        assert!(matches!(
            DltTriangulator::new(vec![]),
            Err(TriangulationError::NoCameras)
        ));
    }

    #[test]
    fn test_config_build() -> Result<(), Box<dyn std::error::Error>> {
        let config = crate::TriangulatorConfig::Dlt {
            cameras: rig(),
            use_confidence: true,
        };
        let json = serde_json::to_string(&config)?;
        assert!(json.contains("\"type\":\"dlt\""));
        let back: crate::TriangulatorConfig = serde_json::from_str(&json)?;
        assert_eq!(back, config);
        assert_eq!(back.build()?.camera_number(), 4);
        Ok(())
    }
}

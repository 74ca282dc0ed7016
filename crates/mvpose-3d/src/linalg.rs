/// Multiply a 3x3 matrix by a 3d vector.
///
/// # Arguments
///
/// * `mat` - A row-major 3x3 matrix.
/// * `vec` - A 3d vector.
///
/// # Returns
///
/// The product `mat * vec`.
pub fn mat33_mul_vec3(mat: &[[f64; 3]; 3], vec: &[f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (o, row) in out.iter_mut().zip(mat.iter()) {
        *o = row[0] * vec[0] + row[1] * vec[1] + row[2] * vec[2];
    }
    out
}

/// Compose a 3x4 projection matrix `P = K [R | t]`.
///
/// # Arguments
///
/// * `k` - The camera intrinsic matrix.
/// * `r` - The world to camera rotation.
/// * `t` - The world to camera translation.
pub fn projection_matrix(k: &[[f64; 3]; 3], r: &[[f64; 3]; 3], t: &[f64; 3]) -> [[f64; 4]; 3] {
    let mut rt = [[0.0; 4]; 3];
    for i in 0..3 {
        rt[i] = [r[i][0], r[i][1], r[i][2], t[i]];
    }

    let mut p = [[0.0; 4]; 3];
    for i in 0..3 {
        for j in 0..4 {
            p[i][j] = k[i][0] * rt[0][j] + k[i][1] * rt[1][j] + k[i][2] * rt[2][j];
        }
    }
    p
}

/// Accumulate the outer product `row^T * row` scaled by `weight` into a 4x4 matrix.
pub fn accumulate_outer4(acc: &mut [[f64; 4]; 4], row: &[f64; 4], weight: f64) {
    for i in 0..4 {
        for j in 0..4 {
            acc[i][j] += weight * row[i] * row[j];
        }
    }
}

/// Find the unit vector spanning the (approximate) null space of a 4x4 matrix.
///
/// The vector is the right singular vector associated with the smallest singular value.
///
/// # Arguments
///
/// * `mat` - A row-major 4x4 matrix, typically the normal matrix `A^T A` of a DLT system.
///
/// # Returns
///
/// The homogeneous 4d vector minimizing `||mat * x||` with `||x|| = 1`.
pub fn null_vector4(mat: &[[f64; 4]; 4]) -> [f64; 4] {
    let mat_a = faer::Mat::<f64>::from_fn(4, 4, |i, j| mat[i][j]);

    // singular values are sorted in decreasing order, the last column spans the null space
    let svd = mat_a.svd();
    let v = svd.v().col(3);
    [v[0], v[1], v[2], v[3]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mat33_mul_vec3_identity() {
        let eye = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(mat33_mul_vec3(&eye, &[1.0, -2.0, 3.0]), [1.0, -2.0, 3.0]);
    }

    #[test]
    fn test_projection_matrix() {
        let k = [[2.0, 0.0, 1.0], [0.0, 3.0, 2.0], [0.0, 0.0, 1.0]];
        let r = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let t = [1.0, 2.0, 3.0];
        let p = projection_matrix(&k, &r, &t);
        assert_eq!(p[0], [2.0, 0.0, 1.0, 5.0]);
        assert_eq!(p[1], [0.0, 3.0, 2.0, 12.0]);
        assert_eq!(p[2], [0.0, 0.0, 1.0, 3.0]);
    }

    #[test]
    fn test_null_vector4() {
        // rows orthogonal to (1, 2, 3, 1)
        let rows = [
            [2.0, -1.0, 0.0, 0.0],
            [0.0, 3.0, -2.0, 0.0],
            [1.0, 0.0, 0.0, -1.0],
        ];
        let mut normal = [[0.0; 4]; 4];
        for row in rows.iter() {
            accumulate_outer4(&mut normal, row, 1.0);
        }
        let x = null_vector4(&normal);
        let scale = x[3];
        assert_relative_eq!(x[0] / scale, 1.0, epsilon = 1e-9);
        assert_relative_eq!(x[1] / scale, 2.0, epsilon = 1e-9);
        assert_relative_eq!(x[2] / scale, 3.0, epsilon = 1e-9);
    }
}

//! Homogeneous 2-D point transforms.
//!
//! Points are `[x, y]` pairs promoted to homogeneous `[x, y, 1]` column
//! vectors. The divide by the third homogeneous component makes the helpers
//! valid for perspective matrices as well as the rigid and camera transforms
//! used by the stick model; a vanishing `w` is reported as a typed error
//! rather than propagated as `inf`/`NaN`.

use nalgebra::{Matrix3, Vector3};

use crate::error::{ModelError, Result};

const EPS: f64 = 1e-12;

/// Apply a homogeneous 3x3 transform to a batch of 2-D points.
///
/// Fails with [`ModelError::DegeneratePoint`] naming the first point whose
/// homogeneous `w` is non-finite or within `EPS` of zero.
pub fn apply_transform(m: &Matrix3<f64>, pts: &[[f64; 2]]) -> Result<Vec<[f64; 2]>> {
    let mut out = Vec::with_capacity(pts.len());
    for (index, &p) in pts.iter().enumerate() {
        out.push(divide(m * Vector3::new(p[0], p[1], 1.0), index)?);
    }
    Ok(out)
}

/// Single-point convenience wrapper around [`apply_transform`].
pub fn apply_transform_point(m: &Matrix3<f64>, pt: [f64; 2]) -> Result<[f64; 2]> {
    divide(m * Vector3::new(pt[0], pt[1], 1.0), 0)
}

fn divide(v: Vector3<f64>, index: usize) -> Result<[f64; 2]> {
    let w = v[2];
    if !w.is_finite() || w.abs() <= EPS || !v[0].is_finite() || !v[1].is_finite() {
        return Err(ModelError::DegeneratePoint { index, w });
    }
    Ok([v[0] / w, v[1] / w])
}

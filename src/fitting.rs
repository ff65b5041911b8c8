//! Weighted straight-line fits shared by the transmission fit and the bank
//! merger.
//!
//! Solves the 2×2 normal equations of `y ≈ a + b·x` with `nalgebra`. A fit is
//! reported as `None` when fewer than two points carry weight or the normal
//! matrix is numerically singular (all `x` equal).
use nalgebra::{Matrix2, Vector2};

/// Result of a straight-line fit `y = intercept + slope · x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
    /// Number of points with positive weight.
    pub points: usize,
}

impl LineFit {
    pub fn at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Weighted least-squares line through `(x, y)` with weights `w`.
///
/// Points with non-finite values or non-positive weight are ignored.
pub fn weighted_line_fit(x: &[f64], y: &[f64], w: &[f64]) -> Option<LineFit> {
    let mut normal = Matrix2::<f64>::zeros();
    let mut rhs = Vector2::<f64>::zeros();
    let mut points = 0usize;
    for ((&xi, &yi), &wi) in x.iter().zip(y).zip(w) {
        if !(xi.is_finite() && yi.is_finite() && wi.is_finite()) || wi <= 0.0 {
            continue;
        }
        points += 1;
        normal[(0, 0)] += wi;
        normal[(0, 1)] += wi * xi;
        normal[(1, 1)] += wi * xi * xi;
        rhs[0] += wi * yi;
        rhs[1] += wi * xi * yi;
    }
    normal[(1, 0)] = normal[(0, 1)];
    if points < 2 {
        return None;
    }
    let scale = normal[(0, 0)] * normal[(1, 1)];
    if scale <= 0.0 || normal.determinant().abs() <= 1e-12 * scale {
        return None;
    }
    let solution = normal.lu().solve(&rhs)?;
    Some(LineFit { intercept: solution[0], slope: solution[1], points })
}

//! Can (empty container) subtraction on reduced intensity profiles.
use crate::{
    merge::overlap::{defined, same_grid},
    workspace::{
        errors::{WorkspaceError, WorkspaceResult},
        spectrum::Histogram,
    },
};
use ndarray::Array1;

/// `sample − can` per Q bin with uncertainties added in quadrature.
///
/// A bin undefined in either profile is NaN in the result.
///
/// Errors
/// ------
/// - `WorkspaceError::GridMismatch` when the profiles do not share their
///   bin edges.
pub fn subtract_can(sample: &Histogram, can: &Histogram) -> WorkspaceResult<Histogram> {
    if !same_grid(sample, can) {
        return Err(WorkspaceError::GridMismatch { left: sample.n_bins(), right: can.n_bins() });
    }
    let n = sample.n_bins();
    let mut y = Array1::from_elem(n, f64::NAN);
    let mut e = Array1::from_elem(n, f64::NAN);
    for i in (0..n).filter(|&i| defined(sample, i) && defined(can, i)) {
        y[i] = sample.y[i] - can.y[i];
        e[i] = sample.e[i].hypot(can.e[i]);
    }
    Histogram::new(sample.x.clone(), y, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn can_is_subtracted_where_both_are_defined() {
        let x = array![0.0, 1.0, 2.0, 3.0];
        let sample = Histogram::new(x.clone(), array![5.0, 4.0, 3.0], array![3.0, 1.0, 1.0]).unwrap();
        let can = Histogram::new(x, array![1.0, f64::NAN, 1.0], array![4.0, 1.0, 0.0]).unwrap();

        let out = subtract_can(&sample, &can).unwrap();

        assert_eq!((out.y[0], out.e[0]), (4.0, 5.0));
        assert!(out.y[1].is_nan());
        assert_eq!((out.y[2], out.e[2]), (2.0, 1.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify that profiles on different grids are never subtracted.
    //
    // Given
    // -----
    // - Two three-bin profiles whose edges differ, and two whose bin counts
    //   differ.
    //
    // Expect
    // ------
    // - `GridMismatch` in both cases.
    fn grids_must_match_edge_by_edge() {
        let sample = Histogram::new(array![0.0, 1.0, 2.0, 3.0], array![5.0, 4.0, 3.0], array![1.0, 1.0, 1.0]).unwrap();
        let shifted = Histogram::new(array![0.0, 1.5, 2.0, 3.0], array![1.0, 1.0, 1.0], array![1.0, 1.0, 1.0]).unwrap();
        let shorter = Histogram::new(array![0.0, 1.0, 2.0], array![1.0, 1.0], array![1.0, 1.0]).unwrap();

        assert_eq!(subtract_can(&sample, &shifted), Err(WorkspaceError::GridMismatch { left: 3, right: 3 }));
        assert_eq!(subtract_can(&sample, &shorter), Err(WorkspaceError::GridMismatch { left: 3, right: 2 }));
    }
}

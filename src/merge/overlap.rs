//! Selection of the Q bins used to fit the bank scale and shift.
use crate::{
    merge::errors::{BankMergeResult, MergeError},
    state::options::QRange,
    workspace::spectrum::Histogram,
};

/// Relative tolerance when comparing the edges of the two Q grids.
const GRID_TOLERANCE: f64 = 1e-9;

/// `true` when bin `i` of `h` carries a usable intensity.
pub fn defined(h: &Histogram, i: usize) -> bool {
    !h.masked[i] && h.y[i].is_finite() && h.e[i].is_finite()
}

/// `true` when `a` and `b` have the same bin edges within a relative
/// tolerance.
pub fn same_grid(a: &Histogram, b: &Histogram) -> bool {
    a.x.len() == b.x.len()
        && a.x
            .iter()
            .zip(b.x.iter())
            .all(|(p, q)| (p - q).abs() <= GRID_TOLERANCE * p.abs().max(q.abs()).max(1.0))
}

/// Fail unless `lab` and `hab` share one Q grid.
pub fn check_grids(lab: &Histogram, hab: &Histogram) -> BankMergeResult<()> {
    if same_grid(lab, hab) {
        Ok(())
    } else {
        Err(MergeError::BinningMismatch { lab: lab.n_bins(), hab: hab.n_bins() })
    }
}

/// Indices of the bins defined in both banks whose centre lies in
/// `fit_range` (all bins when `None`).
pub fn overlap_bins(lab: &Histogram, hab: &Histogram, fit_range: Option<QRange>) -> Vec<usize> {
    let centres = lab.centres();
    (0..lab.n_bins())
        .filter(|&i| defined(lab, i) && defined(hab, i))
        .filter(|&i| fit_range.map_or(true, |r| r.contains(centres[i])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn profile(y: Array1<f64>) -> Histogram {
        let n = y.len();
        let x = Array1::from_iter((0..=n).map(|i| i as f64));
        Histogram::new(x, y, Array1::from_elem(n, 0.1)).unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify which bins take part in the fit.
    //
    // Given
    // -----
    // - LAB undefined in bin 0, HAB undefined in bin 3, five bins; a fit
    //   range covering centres 1.5..=3.5.
    //
    // Expect
    // ------
    // - Without a range: bins 1, 2, 4. With the range: bins 1, 2.
    fn overlap_skips_undefined_bins_and_honours_range() {
        let lab = profile(array![f64::NAN, 1.0, 2.0, 3.0, 4.0]);
        let hab = profile(array![1.0, 1.0, 2.0, f64::NAN, 4.0]);

        assert_eq!(overlap_bins(&lab, &hab, None), vec![1, 2, 4]);
        let range = QRange { min: 1.5, max: 3.5 };
        assert_eq!(overlap_bins(&lab, &hab, Some(range)), vec![1, 2]);
    }

    #[test]
    fn grids_must_match() {
        let a = profile(array![1.0, 2.0, 3.0]);
        let b = profile(array![1.0, 2.0]);
        assert!(check_grids(&a, &a.clone()).is_ok());
        assert_eq!(check_grids(&a, &b), Err(MergeError::BinningMismatch { lab: 3, hab: 2 }));
    }
}

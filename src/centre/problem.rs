//! Quadrant residuals exposed as an `argmin` problem.
//!
//! For a candidate centre the detector is reduced four times, once per
//! quadrant, inside an annulus around the candidate. The left/right and
//! top/bottom residuals are the summed squared differences of the
//! normalized profiles over the Q bins where both are defined, divided by
//! the summed squares of both profiles over the same bins. The residual is
//! therefore independent of the intensity scale and lies in `[0, 2]`, so the
//! search tolerance means the same for every measurement.
use crate::{
    centre::errors::CentreError,
    reduction::{
        errors::ReductionResult, pipeline::DetectorReductionCore, slice::SliceRequest,
    },
    services::traits::LoadedRun,
    state::options::{BeamCentre, MaskShape, Quadrant},
    workspace::spectrum::Histogram,
};
use argmin::core::{CostFunction, Error};
use rayon::prelude::*;

/// Source of per-direction residuals for the quadrant search.
///
/// `centre` is `[x, y]` in metres; the result is `[left/right, top/bottom]`.
pub trait QuadrantResiduals {
    fn residuals(&self, centre: &[f64]) -> Result<[f64; 2], Error>;
}

/// Relative squared difference `Σ(a − b)² / Σ(a² + b²)` of two intensity
/// profiles on the same grid, over bins where both are finite.
///
/// Zero when no bin is shared or both profiles vanish there.
pub fn profile_residual(a: &Histogram, b: &Histogram) -> f64 {
    let (diff, total) = a
        .y
        .iter()
        .zip(b.y.iter())
        .filter(|(p, q)| p.is_finite() && q.is_finite())
        .fold((0.0, 0.0), |(diff, total), (p, q)| (diff + (p - q).powi(2), total + p * p + q * q));
    if total > 0.0 {
        diff / total
    } else {
        0.0
    }
}

/// Reduces the four quadrants of one bank around a candidate centre.
#[derive(Clone)]
pub struct QuadrantProblem<'a> {
    core: DetectorReductionCore<'a>,
    run: &'a LoadedRun,
    request: SliceRequest,
    radius_limits: (f64, f64),
}

impl<'a> QuadrantProblem<'a> {
    pub fn new(
        core: DetectorReductionCore<'a>, run: &'a LoadedRun, request: SliceRequest, radius_limits: (f64, f64),
    ) -> Self {
        QuadrantProblem { core, run, request, radius_limits }
    }

    /// Intensity profiles of the four quadrants, in [`Quadrant::ALL`] order.
    pub fn quadrant_profiles(&self, centre: BeamCentre) -> ReductionResult<Vec<Histogram>> {
        let (r_min, r_max) = self.radius_limits;
        Quadrant::ALL
            .par_iter()
            .map(|&quadrant| {
                let shapes = vec![
                    MaskShape::KeepQuadrant(quadrant),
                    MaskShape::Disk { centre: [0.0, 0.0], radius: r_min },
                    MaskShape::OutsideDisk { centre: [0.0, 0.0], radius: r_max },
                ];
                let request = self.request.clone().with_centre(centre).with_shapes(shapes);
                let slice = self.core.reduce_slice(self.run, &request)?;
                Ok(slice.intensity()?)
            })
            .collect()
    }
}

impl QuadrantResiduals for QuadrantProblem<'_> {
    fn residuals(&self, centre: &[f64]) -> Result<[f64; 2], Error> {
        let candidate = BeamCentre { x: centre[0], y: centre[1] };
        let profiles = self.quadrant_profiles(candidate)?;
        let lr = profile_residual(&profiles[0], &profiles[1]);
        let tb = profile_residual(&profiles[2], &profiles[3]);
        for value in [lr, tb] {
            if !value.is_finite() {
                return Err(CentreError::NonFiniteResidual { value }.into());
            }
        }
        Ok([lr, tb])
    }
}

impl CostFunction for QuadrantProblem<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    /// Total residual `left/right + top/bottom`.
    fn cost(&self, centre: &Self::Param) -> Result<Self::Output, Error> {
        let [lr, tb] = self.residuals(centre)?;
        Ok(lr + tb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        reduction::{fixtures, slice::ReductionServices},
        services::{converter::ElasticConverter, masker::DetectorMasker},
        state::{geometry::DetectorKind, options::DataType},
    };
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};

    fn profile(y: Array1<f64>) -> Histogram {
        let n = y.len();
        Histogram::new(Array1::from_iter((0..=n).map(|i| i as f64)), y, Array1::zeros(n)).unwrap()
    }

    #[test]
    fn profile_residual_skips_undefined_bins() {
        let a = profile(array![1.0, f64::NAN, 3.0]);
        let b = profile(array![2.0, 5.0, 1.0]);
        // (1 + 4) / (1 + 4 + 9 + 1)
        assert_relative_eq!(profile_residual(&a, &b), 5.0 / 15.0);
        assert_eq!(profile_residual(&a, &a), 0.0);
        assert_eq!(profile_residual(&profile(array![f64::NAN]), &profile(array![1.0])), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify that the residual does not depend on the intensity scale.
    //
    // Given
    // -----
    // - Two profiles, then both multiplied by 1e6.
    //
    // Expect
    // ------
    // - The same residual, bounded by 2.
    fn profile_residual_is_scale_free() {
        let a = array![10.0, 8.0, 5.0, 1.0];
        let b = array![9.0, 8.5, 4.0, 2.0];
        let small = profile_residual(&profile(a.clone()), &profile(b.clone()));
        let large = profile_residual(&profile(a * 1e6), &profile(b * 1e6));

        assert_relative_eq!(small, large, max_relative = 1e-12);
        assert!(small > 0.0 && small <= 2.0);
    }

    #[test]
    // Purpose
    // -------
    // Verify the residuals of a mirror-symmetric pattern.
    //
    // Given
    // -----
    // - The fixture spot centred at the origin and the candidate (0, 0);
    //   then the candidate (0.01, 0).
    //
    // Expect
    // ------
    // - Both residuals vanish at the true centre; moving in x raises the
    //   left/right residual and the cost equals the sum of both.
    fn residuals_vanish_at_symmetric_centre() {
        let state = fixtures::state();
        let run = fixtures::run(0.0, 0.0);
        let services = ReductionServices { converter: &ElasticConverter, masker: &DetectorMasker };
        let core = DetectorReductionCore::new(&state, services);
        let problem =
            QuadrantProblem::new(core, &run, SliceRequest::new(DetectorKind::Lab, DataType::Sample), (0.0, 0.2));

        let [lr, tb] = problem.residuals(&[0.0, 0.0]).unwrap();
        assert!(lr < 1e-12 && tb < 1e-12);

        let [lr_moved, tb_moved] = problem.residuals(&[0.01, 0.0]).unwrap();
        assert!(lr_moved > 1e-3 && lr_moved <= 2.0);
        assert_relative_eq!(problem.cost(&vec![0.01, 0.0]).unwrap(), lr_moved + tb_moved);
    }
}

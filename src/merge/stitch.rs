//! Combination of two profiles already on a common scale.
use crate::{
    merge::overlap::defined,
    workspace::{errors::WorkspaceResult, spectrum::Histogram},
};
use ndarray::Array1;

/// Combines a LAB profile and a rescaled HAB profile on one Q grid.
///
/// Bins defined in only one bank take that bank's value; bins defined in
/// neither are NaN.
pub trait Stitch: Send + Sync {
    fn stitch(&self, lab: &Histogram, hab: &Histogram) -> WorkspaceResult<Histogram>;
}

/// Inverse-variance weighted mean in the overlap. Bins where either side has
/// zero uncertainty fall back to the plain mean.
#[derive(Debug, Clone, Copy, Default)]
pub struct InverseVarianceStitch;

impl InverseVarianceStitch {
    fn combine(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
        let ((ya, ea), (yb, eb)) = (a, b);
        if ea > 0.0 && eb > 0.0 {
            let (wa, wb) = (ea.powi(-2), eb.powi(-2));
            ((wa * ya + wb * yb) / (wa + wb), (wa + wb).sqrt().recip())
        } else {
            (0.5 * (ya + yb), 0.5 * ea.hypot(eb))
        }
    }
}

impl Stitch for InverseVarianceStitch {
    fn stitch(&self, lab: &Histogram, hab: &Histogram) -> WorkspaceResult<Histogram> {
        let n = lab.n_bins();
        let mut y = Array1::from_elem(n, f64::NAN);
        let mut e = Array1::from_elem(n, f64::NAN);
        for i in 0..n {
            let (yi, ei) = match (defined(lab, i), defined(hab, i)) {
                (true, true) => Self::combine((lab.y[i], lab.e[i]), (hab.y[i], hab.e[i])),
                (true, false) => (lab.y[i], lab.e[i]),
                (false, true) => (hab.y[i], hab.e[i]),
                (false, false) => continue,
            };
            y[i] = yi;
            e[i] = ei;
        }
        Histogram::new(lab.x.clone(), y, e)
    }
}

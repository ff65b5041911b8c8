//! Scale and shift between the banks.
//!
//! Model: in the overlap `I_HAB ≈ scale · I_LAB + intercept` with
//! `shift = intercept / scale`, so that `I_HAB / scale − shift` lies on the
//! LAB scale. Fits are weighted by `1 / (σ_LAB² + σ_HAB²)`, or uniformly when
//! a bin carries no uncertainty.
use crate::{
    fitting::weighted_line_fit,
    merge::errors::{BankMergeResult, MergeError},
    state::options::FitPolicy,
    workspace::spectrum::Histogram,
};

/// Fitted or configured bank relation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleShift {
    pub scale: f64,
    pub shift: f64,
}

fn check_scale(scale: f64) -> BankMergeResult<f64> {
    if scale.is_finite() && scale != 0.0 {
        Ok(scale)
    } else {
        Err(MergeError::InvalidHint { name: "scale", value: scale })
    }
}

fn check_shift(shift: f64) -> BankMergeResult<f64> {
    if shift.is_finite() {
        Ok(shift)
    } else {
        Err(MergeError::InvalidHint { name: "shift", value: shift })
    }
}

fn weight(lab: &Histogram, hab: &Histogram, i: usize) -> f64 {
    let variance = lab.e[i].powi(2) + hab.e[i].powi(2);
    if variance > 0.0 && variance.is_finite() {
        1.0 / variance
    } else {
        1.0
    }
}

/// Overlap columns: LAB, HAB and weights.
struct Overlap {
    l: Vec<f64>,
    h: Vec<f64>,
    w: Vec<f64>,
}

impl Overlap {
    fn collect(lab: &Histogram, hab: &Histogram, bins: &[usize]) -> BankMergeResult<Self> {
        if bins.len() < 2 {
            return Err(MergeError::InsufficientOverlap { found: bins.len() });
        }
        Ok(Overlap {
            l: bins.iter().map(|&i| lab.y[i]).collect(),
            h: bins.iter().map(|&i| hab.y[i]).collect(),
            w: bins.iter().map(|&i| weight(lab, hab, i)).collect(),
        })
    }
}

/// Resolve `policy` over the overlap `bins`.
///
/// Errors
/// ------
/// - `MergeError::InvalidHint` for a zero or non-finite configured scale or a
///   non-finite configured shift.
/// - `MergeError::InsufficientOverlap` when a fitting policy sees fewer than
///   two bins.
/// - `MergeError::DegenerateFit` for singular normal equations or a zero
///   fitted scale.
pub fn fit_scale_shift(
    lab: &Histogram, hab: &Histogram, bins: &[usize], policy: FitPolicy,
) -> BankMergeResult<ScaleShift> {
    let fitted = match policy {
        FitPolicy::NoFit { scale, shift } => ScaleShift { scale: check_scale(scale)?, shift: check_shift(shift)? },
        FitPolicy::Both => {
            let Overlap { l, h, w } = Overlap::collect(lab, hab, bins)?;
            let line = weighted_line_fit(&l, &h, &w)
                .ok_or(MergeError::DegenerateFit { reason: "singular normal equations" })?;
            if line.slope == 0.0 || !line.slope.is_finite() {
                return Err(MergeError::DegenerateFit { reason: "fitted scale is zero" });
            }
            ScaleShift { scale: line.slope, shift: line.intercept / line.slope }
        }
        FitPolicy::ShiftOnly { scale } => {
            let scale = check_scale(scale)?;
            let Overlap { l, h, w } = Overlap::collect(lab, hab, bins)?;
            let w_sum: f64 = w.iter().sum();
            let intercept = l.iter().zip(&h).zip(&w).map(|((li, hi), wi)| wi * (hi - scale * li)).sum::<f64>() / w_sum;
            ScaleShift { scale, shift: intercept / scale }
        }
        FitPolicy::ScaleOnly { shift } => {
            let shift = check_shift(shift)?;
            let Overlap { l, h, w } = Overlap::collect(lab, hab, bins)?;
            let (mut num, mut den) = (0.0, 0.0);
            for ((li, hi), wi) in l.iter().zip(&h).zip(&w) {
                let u = li + shift;
                num += wi * hi * u;
                den += wi * u * u;
            }
            if den <= 0.0 {
                return Err(MergeError::DegenerateFit { reason: "shifted LAB intensity is zero in the overlap" });
            }
            let scale = num / den;
            if scale == 0.0 || !scale.is_finite() {
                return Err(MergeError::DegenerateFit { reason: "fitted scale is zero" });
            }
            ScaleShift { scale, shift }
        }
    };
    Ok(fitted)
}

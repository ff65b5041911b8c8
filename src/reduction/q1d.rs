//! Q1D: azimuthal reduction of wavelength histograms to momentum transfer.
//!
//! Every unmasked `(pixel, λ bin)` contributes its counts to the Q bin of
//! `Q = 4π sin θ / λ` evaluated at the bin centre, and its normalization
//! `pixel[i] · wavelength[b] · wide_angle[i][b]` to the same Q bin. Counts
//! and normalization are kept separate so the intensity can be recomputed
//! downstream.
use crate::{
    reduction::errors::{ReductionError, ReductionResult},
    workspace::{
        errors::WorkspaceError,
        matrix::Workspace,
        spectrum::{locate_bin, Histogram},
        units::XUnit,
    },
};
use ndarray::Array1;
use std::f64::consts::PI;

/// Normalization inputs for [`q1d`].
#[derive(Debug, Clone, Copy)]
pub struct Q1dNorm<'a> {
    /// One factor per spectrum.
    pub pixel: &'a [f64],
    /// Per λ bin, on the same grid as the counts.
    pub wavelength: &'a Histogram,
    /// Optional per-spectrum, per-bin factors.
    pub wide_angle: Option<&'a [Array1<f64>]>,
}

/// Momentum transfer for scattering angle `two_theta` and wavelength `lambda`.
pub fn momentum_transfer(two_theta: f64, lambda: f64) -> f64 {
    4.0 * PI * (0.5 * two_theta).sin() / lambda
}

/// Reduce `counts` (wavelength histograms) to `(counts, norm)` profiles on
/// `q_edges`.
///
/// Errors
/// ------
/// - `ReductionError::WrongUnit` unless `counts` is a wavelength workspace.
/// - `WorkspaceError::GridMismatch` when a spectrum's grid differs from the
///   wavelength adjustment.
pub fn q1d(counts: &Workspace, norm: Q1dNorm<'_>, q_edges: &Array1<f64>) -> ReductionResult<(Workspace, Workspace)> {
    if counts.unit != XUnit::Wavelength {
        return Err(ReductionError::WrongUnit { stage: "Q1D", found: counts.unit });
    }
    let n_q = q_edges.len().saturating_sub(1);
    let edges = q_edges.as_slice().unwrap_or(&[]);
    let mut sum = Array1::<f64>::zeros(n_q);
    let mut sum_e2 = Array1::<f64>::zeros(n_q);
    let mut den = Array1::<f64>::zeros(n_q);
    let mut den_e2 = Array1::<f64>::zeros(n_q);

    let wav = norm.wavelength;
    for (i, spectrum) in counts.spectra.iter().enumerate() {
        if spectrum.masked {
            continue;
        }
        let h = spectrum.as_histogram()?;
        if h.n_bins() != wav.n_bins() {
            return Err(WorkspaceError::GridMismatch { left: h.n_bins(), right: wav.n_bins() }.into());
        }
        let two_theta = spectrum.scattering_angle();
        let pixel = norm.pixel.get(i).copied().unwrap_or(0.0);
        let centres = h.centres();
        for b in 0..h.n_bins() {
            if h.masked[b] || wav.masked[b] {
                continue;
            }
            let Some(k) = locate_bin(edges, momentum_transfer(two_theta, centres[b])) else {
                continue;
            };
            let wide = norm.wide_angle.and_then(|w| w.get(i)).map_or(1.0, |row| row[b]);
            let factor = pixel * wide;
            sum[k] += h.y[b];
            sum_e2[k] += h.e[b] * h.e[b];
            den[k] += factor * wav.y[b];
            den_e2[k] += (factor * wav.e[b]).powi(2);
        }
    }

    let counts_h = Histogram::new(q_edges.clone(), sum, sum_e2.mapv(f64::sqrt))?;
    let norm_h = Histogram::new(q_edges.clone(), den, den_e2.mapv(f64::sqrt))?;
    Ok((
        Workspace::profile(XUnit::MomentumTransfer, counts_h),
        Workspace::profile(XUnit::MomentumTransfer, norm_h),
    ))
}

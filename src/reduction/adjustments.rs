//! Normalization adjustments: pixel, wavelength, and pixel-and-wavelength.
//!
//! The Q1D denominator for pixel `i` and wavelength bin `b` is
//! `pixel[i] · wavelength[b] · wide_angle[i][b]`.
use crate::{
    state::options::CorrectionCurve,
    workspace::{matrix::Workspace, spectrum::Histogram},
};
use ndarray::Array1;
use std::collections::BTreeMap;

/// Per-pixel factor: flood efficiency × solid angle.
pub fn pixel_adjustment(
    ws: &Workspace, solid_angles: &[f64], flood: Option<&BTreeMap<u32, f64>>,
) -> Vec<f64> {
    ws.spectra
        .iter()
        .zip(solid_angles)
        .map(|(s, &omega)| {
            let efficiency = flood.and_then(|f| f.get(&s.detector_id).copied()).unwrap_or(1.0);
            efficiency * omega
        })
        .collect()
}

/// Per-bin factor: prepared monitor × transmission × efficiency curve.
///
/// Uncertainties of the monitor and transmission are combined in relative
/// quadrature; the efficiency curve is exact.
pub fn wavelength_adjustment(
    monitor: &Histogram, transmission: Option<&Histogram>, curve: Option<&CorrectionCurve>,
) -> Histogram {
    let mut out = monitor.clone();
    let centres = monitor.centres();
    for i in 0..out.n_bins() {
        let mut value = monitor.y[i];
        let mut rel = if value != 0.0 { monitor.e[i] / value } else { 0.0 };
        if let Some(t) = transmission {
            let ti = if t.masked[i] { 0.0 } else { t.y[i] };
            value *= ti;
            if ti != 0.0 {
                rel = rel.hypot(t.e[i] / ti);
            }
        }
        if let Some(c) = curve {
            value *= c.at(centres[i]);
        }
        out.y[i] = value;
        out.e[i] = (value * rel).abs();
        if value <= 0.0 {
            out.masked[i] = true;
        }
    }
    out
}

/// Path-length correction factor for a pixel at scattering angle `two_theta`
/// given the straight-through transmission `t0`:
/// `(T0^(A−1) − 1) / ((A − 1) ln T0)` with `A = 1 / cos 2θ`.
///
/// Tends to 1 on the beam axis and for `T0 → 1`.
pub fn wide_angle_factor(t0: f64, two_theta: f64) -> f64 {
    let a_minus_one = 1.0 / two_theta.cos() - 1.0;
    if !(t0 > 0.0) || (t0 - 1.0).abs() < 1e-12 || a_minus_one.abs() < 1e-12 {
        return 1.0;
    }
    let ln_t0 = t0.ln();
    (t0.powf(a_minus_one) - 1.0) / (a_minus_one * ln_t0)
}

/// Pixel-and-wavelength adjustment: one row of factors per spectrum of the
/// scaled sample workspace.
pub fn wide_angle_adjustment(scaled: &Workspace, transmission: &Histogram) -> Vec<Array1<f64>> {
    scaled
        .spectra
        .iter()
        .map(|s| {
            let two_theta = s.scattering_angle();
            transmission.y.mapv(|t0| wide_angle_factor(t0, two_theta))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify the wide-angle factor limits and a hand-computed value.
    //
    // Given
    // -----
    // - 2θ = 0, T0 = 1, and 2θ = 60° with T0 = 0.5 (A = 2).
    //
    // Expect
    // ------
    // - 1 for the limits; (0.5 − 1) / ln 0.5 for the 60° case.
    fn wide_angle_factor_limits_and_value() {
        assert_eq!(wide_angle_factor(0.5, 0.0), 1.0);
        assert_eq!(wide_angle_factor(1.0, 0.3), 1.0);
        let expected = (0.5 - 1.0) / 0.5_f64.ln();
        assert_relative_eq!(wide_angle_factor(0.5, 60f64.to_radians()), expected, epsilon = 1e-9);
    }

    #[test]
    fn wavelength_adjustment_multiplies_factors() {
        let monitor = Histogram::new(array![1.0, 2.0, 3.0], array![100.0, 200.0], array![10.0, 20.0]).unwrap();
        let t = Histogram::new(array![1.0, 2.0, 3.0], array![0.5, 0.5], array![0.0, 0.0]).unwrap();
        let curve = CorrectionCurve::new(vec![1.0, 3.0], vec![2.0, 2.0]).unwrap();

        let out = wavelength_adjustment(&monitor, Some(&t), Some(&curve));

        assert_eq!(out.y, array![100.0, 200.0]);
        assert_relative_eq!(out.e[0], 10.0, epsilon = 1e-12);
    }
}

//! Sample transmission from monitor ratios.
//!
//! `T(λ) = (M_trans / M_inc)_sample / (M_trans / M_inc)_direct`, each monitor
//! prepared by the [`CountsNormalizer`] on the target wavelength grid. The
//! measured ratio can be replaced by a weighted linear or log-linear fit.
use crate::{
    fitting::weighted_line_fit,
    normalization::normalizer::CountsNormalizer,
    reduction::errors::ReductionResult,
    state::{
        options::{TransmissionFit, TransmissionOptions},
        windows::{BackgroundWindow, TofWindow},
    },
    workspace::{matrix::Workspace, spectrum::Histogram},
};
use ndarray::Array1;

/// Monitor windows shared by every monitor preparation.
#[derive(Debug, Clone, Copy)]
pub struct MonitorWindows<'a> {
    pub background: Option<&'a BackgroundWindow>,
    pub prompt_peak: Option<TofWindow>,
}

fn ratio(
    normalizer: &CountsNormalizer<'_>, monitors: &Workspace, opts: &TransmissionOptions,
    windows: MonitorWindows<'_>, edges: &Array1<f64>,
) -> ReductionResult<(Array1<f64>, Array1<f64>)> {
    let prepare = |id| {
        normalizer.monitor_normalization(monitors, id, windows.background, windows.prompt_peak, edges)
    };
    let trans = prepare(opts.transmission_monitor)?;
    let inc = prepare(opts.incident_monitor)?;
    let n = trans.n_bins();
    let mut r = Array1::from_elem(n, f64::NAN);
    let mut e = Array1::from_elem(n, f64::NAN);
    for i in 0..n {
        if inc.y[i] > 0.0 {
            r[i] = trans.y[i] / inc.y[i];
            e[i] = (trans.e[i] / inc.y[i]).hypot(trans.y[i] * inc.e[i] / (inc.y[i] * inc.y[i]));
        }
    }
    Ok((r, e))
}

/// Compute the transmission on `edges`.
///
/// Bins where either ratio is undefined are masked in the unfitted result;
/// a fit fills every bin from the fitted curve.
pub fn calculate_transmission(
    normalizer: &CountsNormalizer<'_>, sample: &Workspace, direct: &Workspace,
    opts: &TransmissionOptions, windows: MonitorWindows<'_>, edges: &Array1<f64>,
) -> ReductionResult<Histogram> {
    let (rs, es) = ratio(normalizer, sample, opts, windows, edges)?;
    let (rd, ed) = ratio(normalizer, direct, opts, windows, edges)?;
    let n = rs.len();
    let mut t = Array1::from_elem(n, 0.0);
    let mut te = Array1::from_elem(n, 0.0);
    let mut masked = vec![true; n];
    for i in 0..n {
        if rs[i].is_finite() && rd[i].is_finite() && rd[i] > 0.0 {
            t[i] = rs[i] / rd[i];
            te[i] = (es[i] / rd[i]).hypot(rs[i] * ed[i] / (rd[i] * rd[i]));
            masked[i] = false;
        }
    }

    let measured = Histogram::with_mask(edges.clone(), t, te, masked)?;
    let fitted = match opts.fit {
        TransmissionFit::None => measured,
        TransmissionFit::Linear => fit_transmission(&measured, false),
        TransmissionFit::Log => fit_transmission(&measured, true),
    };
    tracing::debug!(fit = ?opts.fit, mean = fitted.total() / n.max(1) as f64, "transmission calculated");
    Ok(fitted)
}

/// Replace `measured` by a weighted fit, in `ln T` when `log` is set.
/// Falls back to the measured values when the fit is degenerate.
fn fit_transmission(measured: &Histogram, log: bool) -> Histogram {
    let centres = measured.centres();
    let n = measured.n_bins();
    let mut y = Vec::with_capacity(n);
    let mut w = Vec::with_capacity(n);
    for i in 0..n {
        let (t, e) = (measured.y[i], measured.e[i]);
        let usable = !measured.masked[i] && t.is_finite() && (!log || t > 0.0);
        if !usable {
            y.push(f64::NAN);
            w.push(0.0);
            continue;
        }
        let (value, sigma) = if log { (t.ln(), e / t) } else { (t, e) };
        y.push(value);
        w.push(if sigma > 0.0 { 1.0 / (sigma * sigma) } else { 1.0 });
    }
    let Some(fit) = weighted_line_fit(centres.as_slice().unwrap_or(&[]), &y, &w) else {
        tracing::warn!(log, "transmission fit degenerate; using measured values");
        return measured.clone();
    };
    let values = centres.mapv(|x| if log { fit.at(x).exp() } else { fit.at(x) });
    Histogram {
        x: measured.x.clone(),
        y: values,
        e: Array1::zeros(n),
        masked: vec![false; n],
    }
}

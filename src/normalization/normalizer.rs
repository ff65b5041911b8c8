//! CountsNormalizer — monitor preparation and counts/monitor division.
//!
//! Purpose
//! -------
//! Turn a raw incident-monitor spectrum into a wavelength-binned
//! normalization histogram and divide detector counts by it.
//!
//! Key behaviors
//! -------------
//! - [`CountsNormalizer::monitor_normalization`] runs the fixed step order:
//!   prompt-peak removal, flat background subtraction (both in TOF), unit
//!   conversion through the [`UnitConverter`], then rebinning onto the
//!   requested wavelength edges.
//! - [`CountsNormalizer::normalize`] divides every detector spectrum by the
//!   prepared monitor, bin by bin, propagating uncertainties. Bins with a
//!   non-positive monitor are masked.
//!
//! Invariants & assumptions
//! ------------------------
//! - The monitor workspace is in TOF; counts passed to `normalize` are
//!   wavelength histograms.
//! - Window arithmetic and step order are owned here; unit conversion is
//!   not.
use crate::{
    normalization::{
        corrections::{remove_prompt_peak, subtract_flat_background},
        errors::{NormalizationError, NormalizationResult},
    },
    services::traits::{ConversionMode, UnitConverter},
    state::{
        errors::ConfigError,
        windows::{BackgroundWindow, TofWindow},
    },
    workspace::{
        errors::WorkspaceError,
        matrix::Workspace,
        rebin::rebin_histogram,
        spectrum::{Histogram, SpectrumData},
        units::XUnit,
    },
};
use ndarray::Array1;

/// Normalizes counts against a beam monitor.
///
/// Holds only a reference to the converter; it is cheap to construct per
/// request.
pub struct CountsNormalizer<'a> {
    converter: &'a dyn UnitConverter,
}

impl<'a> CountsNormalizer<'a> {
    pub fn new(converter: &'a dyn UnitConverter) -> Self {
        CountsNormalizer { converter }
    }

    /// Prepare monitor `monitor_id` as a wavelength histogram on `edges`.
    ///
    /// Parameters
    /// ----------
    /// - `monitors`: TOF monitor workspace.
    /// - `monitor_id`: detector id of the monitor to prepare.
    /// - `background`: optional background window (global or per monitor).
    /// - `prompt_peak`: optional contamination window.
    /// - `edges`: target wavelength bin edges.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::MissingMonitor` when `monitor_id` is not present.
    /// - `ConfigError::InvertedWindow` for an inverted window.
    /// - `NormalizationError::UnitMismatch` when `monitors` is not TOF.
    /// - Converter and workspace errors are propagated.
    pub fn monitor_normalization(
        &self, monitors: &Workspace, monitor_id: u32, background: Option<&BackgroundWindow>,
        prompt_peak: Option<TofWindow>, edges: &Array1<f64>,
    ) -> NormalizationResult<Histogram> {
        if monitors.unit != XUnit::TimeOfFlight {
            return Err(NormalizationError::UnitMismatch {
                expected: XUnit::TimeOfFlight,
                found: monitors.unit,
            });
        }
        let spectrum =
            monitors.find(monitor_id).ok_or(ConfigError::MissingMonitor { id: monitor_id })?;
        let mut monitor = match &spectrum.data {
            SpectrumData::Histogram(h) => h.clone(),
            SpectrumData::Events(ev) => ev.histogram(&event_edges(&ev.x))?,
        };

        if let Some(peak) = prompt_peak {
            let peak = TofWindow::new("prompt peak", peak.start, peak.stop)?;
            monitor = remove_prompt_peak(&monitor, peak);
        }
        if let Some(window) = background.and_then(|b| b.for_monitor(monitor_id)) {
            let window = TofWindow::new("background", window.start, window.stop)?;
            monitor = subtract_flat_background(&monitor, window);
        }

        let single = Workspace::new(
            XUnit::TimeOfFlight,
            monitors.l1,
            vec![spectrum.with_data(SpectrumData::Histogram(monitor))],
        );
        let converted = self.converter.convert(&single, XUnit::Wavelength, ConversionMode::Elastic, None)?;
        let prepared = rebin_histogram(converted.histogram(0)?, edges)?;
        tracing::debug!(
            monitor = monitor_id,
            bins = prepared.n_bins(),
            total = prepared.total(),
            "monitor normalization prepared"
        );
        Ok(prepared)
    }

    /// Divide wavelength counts by the prepared incident monitor.
    ///
    /// Each spectrum is divided by the monitor rebinned onto its own edges;
    /// `E = sqrt((Ec/M)² + (C·Em/M²)²)`.
    ///
    /// Errors
    /// ------
    /// - `NormalizationError::UnitMismatch` when `counts` is not wavelength.
    /// - Everything [`monitor_normalization`](Self::monitor_normalization)
    ///   can raise.
    pub fn normalize(
        &self, counts: &Workspace, monitors: &Workspace, background: Option<&BackgroundWindow>,
        prompt_peak: Option<TofWindow>, incident_monitor: u32,
    ) -> NormalizationResult<Workspace> {
        if counts.unit != XUnit::Wavelength {
            return Err(NormalizationError::UnitMismatch {
                expected: XUnit::Wavelength,
                found: counts.unit,
            });
        }
        let mut cache: Vec<(Array1<f64>, Histogram)> = Vec::new();
        let mut spectra = Vec::with_capacity(counts.len());
        for spectrum in &counts.spectra {
            let h = spectrum.as_histogram()?;
            let index = match cache.iter().position(|(edges, _)| edges == &h.x) {
                Some(index) => index,
                None => {
                    let m = self.monitor_normalization(
                        monitors,
                        incident_monitor,
                        background,
                        prompt_peak,
                        &h.x,
                    )?;
                    cache.push((h.x.clone(), m));
                    cache.len() - 1
                }
            };
            spectra.push(spectrum.with_data(SpectrumData::Histogram(divide(h, &cache[index].1)?)));
        }
        Ok(Workspace::new(XUnit::Wavelength, counts.l1, spectra))
    }
}

/// `counts / monitor` on identical grids; non-positive monitor bins are
/// masked.
pub fn divide(counts: &Histogram, monitor: &Histogram) -> NormalizationResult<Histogram> {
    let n = counts.n_bins();
    if monitor.n_bins() != n {
        return Err(WorkspaceError::GridMismatch { left: n, right: monitor.n_bins() }.into());
    }
    let mut y = Array1::<f64>::zeros(n);
    let mut e = Array1::<f64>::zeros(n);
    let mut masked = counts.masked.clone();
    for i in 0..n {
        let m = monitor.y[i];
        if m <= 0.0 || monitor.masked[i] {
            masked[i] = true;
            continue;
        }
        let c = counts.y[i];
        y[i] = c / m;
        e[i] = (counts.e[i] / m).hypot(c * monitor.e[i] / (m * m));
    }
    Ok(Histogram::with_mask(counts.x.clone(), y, e, masked)?)
}

/// 100 linear bins spanning the event TOF values.
pub(crate) fn event_edges(x: &[f64]) -> Array1<f64> {
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo.is_finite() && hi > lo {
        Array1::linspace(lo, hi, 101)
    } else {
        let lo = if lo.is_finite() { lo } else { 0.0 };
        Array1::linspace(lo, lo + 1.0, 101)
    }
}

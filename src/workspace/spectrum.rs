//! Spectra — histogram and event storage for a single detector or monitor.
//!
//! Purpose
//! -------
//! Hold the per-detector data that flows through the reduction pipeline. A
//! spectrum is either a histogram (bin edges, values, uncertainties, per-bin
//! mask flags) or an event list (per-event x value, pulse time, weight and
//! squared error), together with the detector id and its position relative
//! to the sample.
//!
//! Key behaviors
//! -------------
//! - [`Histogram::new`] / [`Histogram::with_mask`] validate the histogram
//!   invariant `len(X) = len(Y) + 1` and strictly ascending edges.
//! - [`EventList::histogram`] collapses events onto a set of bin edges,
//!   summing weights and squared errors.
//! - [`Spectrum::scattering_angle`] and [`Spectrum::l2`] expose the geometry
//!   needed for wavelength and momentum-transfer conversion.
//!
//! Invariants & assumptions
//! ------------------------
//! - Positions are in metres with the sample at the origin and the beam along
//!   `+z`.
//! - A masked bin has `y = 0`, `e = 0` and its flag set; masking never clears
//!   a flag.
//! - Event columns always have equal lengths.
//!
//! Conventions
//! -----------
//! - X values are time-of-flight (µs), wavelength (Å) or momentum transfer
//!   (Å⁻¹) depending on the owning workspace's [`XUnit`](super::XUnit).
//! - Pulse times are seconds since the start of the run.
use crate::workspace::errors::{WorkspaceError, WorkspaceResult};
use ndarray::Array1;

/// Position of a detector pixel or monitor relative to the sample, in metres.
pub type Position = [f64; 3];

/// Histogram data for one spectrum.
///
/// Fields
/// ------
/// - `x`: bin edges, strictly ascending, length `n + 1`.
/// - `y`: per-bin signal, length `n`.
/// - `e`: per-bin one-sigma uncertainty, length `n`.
/// - `masked`: per-bin mask flags, length `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub x: Array1<f64>,
    pub y: Array1<f64>,
    pub e: Array1<f64>,
    pub masked: Vec<bool>,
}

impl Histogram {
    /// Construct a validated histogram with no masked bins.
    ///
    /// Errors
    /// ------
    /// - `WorkspaceError::EdgeCountMismatch` if `x.len() != y.len() + 1`.
    /// - `WorkspaceError::ErrorCountMismatch` if `e.len() != y.len()`.
    /// - `WorkspaceError::NonAscendingEdges` if an edge is non-finite or not
    ///   strictly greater than its predecessor.
    pub fn new(x: Array1<f64>, y: Array1<f64>, e: Array1<f64>) -> WorkspaceResult<Self> {
        let n = y.len();
        Histogram::with_mask(x, y, e, vec![false; n])
    }

    /// Construct a validated histogram with explicit mask flags.
    ///
    /// Masked bins are zeroed on construction so the masked-bin invariant holds
    /// regardless of the values supplied.
    pub fn with_mask(
        x: Array1<f64>, mut y: Array1<f64>, mut e: Array1<f64>, masked: Vec<bool>,
    ) -> WorkspaceResult<Self> {
        if x.len() != y.len() + 1 {
            return Err(WorkspaceError::EdgeCountMismatch { edges: x.len(), values: y.len() });
        }
        if e.len() != y.len() {
            return Err(WorkspaceError::ErrorCountMismatch { values: y.len(), errors: e.len() });
        }
        if masked.len() != y.len() {
            return Err(WorkspaceError::MaskCountMismatch { values: y.len(), flags: masked.len() });
        }
        validate_edges(&x)?;
        for (i, &flag) in masked.iter().enumerate() {
            if flag {
                y[i] = 0.0;
                e[i] = 0.0;
            }
        }
        Ok(Histogram { x, y, e, masked })
    }

    /// Histogram with Poisson uncertainties `e = sqrt(y)`.
    pub fn from_counts(x: Array1<f64>, y: Array1<f64>) -> WorkspaceResult<Self> {
        let e = y.mapv(|v| v.max(0.0).sqrt());
        Histogram::new(x, y, e)
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.y.len()
    }

    /// Bin centres `(x[i] + x[i + 1]) / 2`.
    pub fn centres(&self) -> Array1<f64> {
        Array1::from_iter(self.x.windows(2).into_iter().map(|w| 0.5 * (w[0] + w[1])))
    }

    /// Bin widths `x[i + 1] - x[i]`.
    pub fn widths(&self) -> Array1<f64> {
        Array1::from_iter(self.x.windows(2).into_iter().map(|w| w[1] - w[0]))
    }

    /// Sum of the unmasked bin values.
    pub fn total(&self) -> f64 {
        self.y.iter().zip(self.masked.iter()).filter(|(_, &m)| !m).map(|(&v, _)| v).sum()
    }

    /// Flag bin `i` as masked and zero its value and error.
    pub fn mask_bin(&mut self, i: usize) {
        self.masked[i] = true;
        self.y[i] = 0.0;
        self.e[i] = 0.0;
    }

    /// Indices of bins that overlap the closed interval `[start, stop]` by a
    /// non-zero width.
    pub fn bins_overlapping(&self, start: f64, stop: f64) -> Vec<usize> {
        (0..self.n_bins()).filter(|&i| self.x[i] < stop && self.x[i + 1] > start).collect()
    }

    /// Multiply values and errors by `factor`.
    pub fn scale(&mut self, factor: f64) {
        self.y.mapv_inplace(|v| v * factor);
        self.e.mapv_inplace(|v| v * factor.abs());
    }
}

/// Event storage for one spectrum.
///
/// Fields
/// ------
/// - `x`: per-event x value (TOF in µs before conversion, λ after).
/// - `pulse_time`: seconds since run start, used for time slicing.
/// - `weight`: per-event weight (1.0 for raw events).
/// - `error_sq`: per-event squared uncertainty (1.0 for raw events).
#[derive(Debug, Clone, PartialEq)]
pub struct EventList {
    pub x: Vec<f64>,
    pub pulse_time: Vec<f64>,
    pub weight: Vec<f64>,
    pub error_sq: Vec<f64>,
}

impl EventList {
    /// Raw, unit-weight events.
    pub fn new(x: Vec<f64>, pulse_time: Vec<f64>) -> WorkspaceResult<Self> {
        let n = x.len();
        EventList::weighted(x, pulse_time, vec![1.0; n], vec![1.0; n])
    }

    /// Weighted events with explicit squared errors.
    pub fn weighted(
        x: Vec<f64>, pulse_time: Vec<f64>, weight: Vec<f64>, error_sq: Vec<f64>,
    ) -> WorkspaceResult<Self> {
        let expected = x.len();
        for (column, found) in
            [("pulse_time", pulse_time.len()), ("weight", weight.len()), ("error_sq", error_sq.len())]
        {
            if found != expected {
                return Err(WorkspaceError::EventLengthMismatch { column, expected, found });
            }
        }
        Ok(EventList { x, pulse_time, weight, error_sq })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Keep the events for which `keep(index)` is true.
    pub fn retain_indices(&self, keep: impl Fn(usize) -> bool) -> EventList {
        let idx: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        EventList {
            x: idx.iter().map(|&i| self.x[i]).collect(),
            pulse_time: idx.iter().map(|&i| self.pulse_time[i]).collect(),
            weight: idx.iter().map(|&i| self.weight[i]).collect(),
            error_sq: idx.iter().map(|&i| self.error_sq[i]).collect(),
        }
    }

    /// Collapse the events onto `edges`. Events outside the edges are dropped.
    pub fn histogram(&self, edges: &Array1<f64>) -> WorkspaceResult<Histogram> {
        validate_edges(edges)?;
        let n = edges.len().saturating_sub(1);
        let mut y = Array1::<f64>::zeros(n);
        let mut e2 = Array1::<f64>::zeros(n);
        let edge_slice = edges.as_slice().unwrap_or(&[]);
        for i in 0..self.len() {
            if let Some(bin) = locate_bin(edge_slice, self.x[i]) {
                y[bin] += self.weight[i];
                e2[bin] += self.error_sq[i];
            }
        }
        Histogram::new(edges.clone(), y, e2.mapv(f64::sqrt))
    }
}

/// Storage form of a spectrum.
#[derive(Debug, Clone, PartialEq)]
pub enum SpectrumData {
    Histogram(Histogram),
    Events(EventList),
}

/// One detector pixel or monitor with its data.
///
/// Fields
/// ------
/// - `detector_id`: instrument-wide detector (or monitor) number.
/// - `position`: position relative to the sample, in metres.
/// - `masked`: whole-detector mask flag. A masked detector contributes nothing
///   to the Q1D sums.
/// - `data`: histogram or event storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub detector_id: u32,
    pub position: Position,
    pub masked: bool,
    pub data: SpectrumData,
}

impl Spectrum {
    pub fn histogram(detector_id: u32, position: Position, histogram: Histogram) -> Self {
        Spectrum { detector_id, position, masked: false, data: SpectrumData::Histogram(histogram) }
    }

    pub fn events(detector_id: u32, position: Position, events: EventList) -> Self {
        Spectrum { detector_id, position, masked: false, data: SpectrumData::Events(events) }
    }

    pub fn is_event(&self) -> bool {
        matches!(self.data, SpectrumData::Events(_))
    }

    /// Same detector, id, position and mask flag with new data.
    pub fn with_data(&self, data: SpectrumData) -> Spectrum {
        Spectrum { detector_id: self.detector_id, position: self.position, masked: self.masked, data }
    }

    /// Borrow the histogram, failing for event data.
    pub fn as_histogram(&self) -> WorkspaceResult<&Histogram> {
        match &self.data {
            SpectrumData::Histogram(h) => Ok(h),
            SpectrumData::Events(_) => {
                Err(WorkspaceError::NotHistogram { detector_id: self.detector_id })
            }
        }
    }

    pub fn as_histogram_mut(&mut self) -> WorkspaceResult<&mut Histogram> {
        let detector_id = self.detector_id;
        match &mut self.data {
            SpectrumData::Histogram(h) => Ok(h),
            SpectrumData::Events(_) => Err(WorkspaceError::NotHistogram { detector_id }),
        }
    }

    /// Sample-to-detector distance `L2`.
    pub fn l2(&self) -> f64 {
        let [x, y, z] = self.position;
        (x * x + y * y + z * z).sqrt()
    }

    /// Scattering angle `2θ` between the beam axis and the pixel direction.
    pub fn scattering_angle(&self) -> f64 {
        let [x, y, z] = self.position;
        (x * x + y * y).sqrt().atan2(z)
    }

    /// Sum of all unmasked signal in this spectrum.
    pub fn integrated(&self) -> f64 {
        match &self.data {
            SpectrumData::Histogram(h) => h.total(),
            SpectrumData::Events(ev) => ev.weight.iter().sum(),
        }
    }
}

/// Check that `edges` are finite and strictly ascending.
pub fn validate_edges(edges: &Array1<f64>) -> WorkspaceResult<()> {
    for (i, &value) in edges.iter().enumerate() {
        if !value.is_finite() || (i > 0 && value <= edges[i - 1]) {
            return Err(WorkspaceError::NonAscendingEdges { index: i, value });
        }
    }
    Ok(())
}

/// Index of the bin of `edges` containing `value` (half-open `[lo, hi)`, with
/// the last bin closed on the right).
pub fn locate_bin(edges: &[f64], value: f64) -> Option<usize> {
    let n = edges.len();
    if n < 2 || !value.is_finite() || value < edges[0] || value > edges[n - 1] {
        return None;
    }
    if value == edges[n - 1] {
        return Some(n - 2);
    }
    // partition_point returns the first edge strictly greater than value.
    let upper = edges.partition_point(|&edge| edge <= value);
    Some(upper - 1)
}

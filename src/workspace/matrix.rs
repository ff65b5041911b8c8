//! Workspace — an ordered collection of spectra sharing one X unit.
//!
//! Purpose
//! -------
//! Represent the value that flows between pipeline stages: a list of spectra
//! (histogram or event form), the unit of their X axis and the primary flight
//! path `L1` needed for time-of-flight conversions. Stages take a workspace by
//! reference and return a new one, so no stage observes another stage's
//! temporaries.
//!
//! Key behaviors
//! -------------
//! - Select spectra by predicate (component cropping, monitor extraction).
//! - Collapse event spectra and rebin histogram spectra onto a common grid
//!   ([`Workspace::to_histogram`]).
//! - Build single-spectrum workspaces for reduced 1D profiles
//!   ([`Workspace::profile`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - All spectra share `unit`.
//! - Spectrum order is preserved by every operation.
use crate::workspace::{
    errors::{WorkspaceError, WorkspaceResult},
    rebin::rebin_histogram,
    spectrum::{Histogram, Spectrum, SpectrumData},
    units::XUnit,
};
use ndarray::Array1;

/// Ordered spectra plus unit and primary flight path.
///
/// Fields
/// ------
/// - `unit`: X unit of every spectrum.
/// - `l1`: moderator-to-sample distance in metres.
/// - `spectra`: detector or monitor spectra.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub unit: XUnit,
    pub l1: f64,
    pub spectra: Vec<Spectrum>,
}

impl Workspace {
    pub fn new(unit: XUnit, l1: f64, spectra: Vec<Spectrum>) -> Self {
        Workspace { unit, l1, spectra }
    }

    /// Single-spectrum workspace holding a 1D profile (detector id 0, at the
    /// sample position).
    pub fn profile(unit: XUnit, histogram: Histogram) -> Self {
        Workspace { unit, l1: 0.0, spectra: vec![Spectrum::histogram(0, [0.0; 3], histogram)] }
    }

    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    /// `true` when any spectrum holds events.
    pub fn is_event(&self) -> bool {
        self.spectra.iter().any(Spectrum::is_event)
    }

    pub fn find(&self, detector_id: u32) -> Option<&Spectrum> {
        self.spectra.iter().find(|s| s.detector_id == detector_id)
    }

    /// Copy of the spectra satisfying `keep`, in order.
    pub fn select(&self, keep: impl Fn(&Spectrum) -> bool) -> Workspace {
        Workspace {
            unit: self.unit,
            l1: self.l1,
            spectra: self.spectra.iter().filter(|s| keep(s)).cloned().collect(),
        }
    }

    /// Borrow the histogram of spectrum `index`.
    pub fn histogram(&self, index: usize) -> WorkspaceResult<&Histogram> {
        self.spectra
            .get(index)
            .ok_or(WorkspaceError::SpectrumIndexOutOfRange { index, len: self.spectra.len() })?
            .as_histogram()
    }

    /// Collapse every spectrum onto `edges`: events are histogrammed, histograms
    /// rebinned by fractional overlap.
    pub fn to_histogram(&self, edges: &Array1<f64>) -> WorkspaceResult<Workspace> {
        let spectra = self
            .spectra
            .iter()
            .map(|s| {
                let histogram = match &s.data {
                    SpectrumData::Events(ev) => ev.histogram(edges)?,
                    SpectrumData::Histogram(h) => rebin_histogram(h, edges)?,
                };
                Ok(s.with_data(SpectrumData::Histogram(histogram)))
            })
            .collect::<WorkspaceResult<Vec<_>>>()?;
        Ok(Workspace { unit: self.unit, l1: self.l1, spectra })
    }

    /// Total unmasked signal over all unmasked spectra.
    pub fn integrated(&self) -> f64 {
        self.spectra.iter().filter(|s| !s.masked).map(Spectrum::integrated).sum()
    }
}

//! Request and result types of one slice reduction.
use crate::{
    services::traits::{MaskingService, UnitConverter},
    state::{
        geometry::DetectorKind,
        options::{BeamCentre, DataType, MaskShape},
        windows::{TimeSlice, WavelengthRange},
    },
    workspace::{
        errors::WorkspaceResult,
        matrix::Workspace,
        spectrum::Histogram,
    },
};
use ndarray::Array1;

/// Collaborators used by the pipeline.
#[derive(Clone, Copy)]
pub struct ReductionServices<'a> {
    pub converter: &'a dyn UnitConverter,
    pub masker: &'a dyn MaskingService,
}

/// What to reduce.
///
/// Fields
/// ------
/// - `component`: detector bank.
/// - `data_type`: sample or can, used for labelling.
/// - `time_slice`: pulse-time window for event data.
/// - `centre`: overrides the state's beam centre for this bank (used by the
///   centre finder).
/// - `extra_shapes`: masks added on top of the state's mask (quadrants,
///   annuli).
#[derive(Debug, Clone, PartialEq)]
pub struct SliceRequest {
    pub component: DetectorKind,
    pub data_type: DataType,
    pub time_slice: Option<TimeSlice>,
    pub centre: Option<BeamCentre>,
    pub extra_shapes: Vec<MaskShape>,
}

impl SliceRequest {
    pub fn new(component: DetectorKind, data_type: DataType) -> Self {
        SliceRequest { component, data_type, time_slice: None, centre: None, extra_shapes: Vec::new() }
    }

    pub fn with_time_slice(mut self, slice: Option<TimeSlice>) -> Self {
        self.time_slice = slice;
        self
    }

    pub fn with_centre(mut self, centre: BeamCentre) -> Self {
        self.centre = Some(centre);
        self
    }

    pub fn with_shapes(mut self, shapes: Vec<MaskShape>) -> Self {
        self.extra_shapes = shapes;
        self
    }

    /// Short identifier used in logs and output names, e.g. `LAB_sample`.
    pub fn label(&self) -> String {
        match &self.time_slice {
            Some(t) => format!("{}_{}_{}", self.component, self.data_type, t.label()),
            None => format!("{}_{}", self.component, self.data_type),
        }
    }
}

/// Reduced 1D profile of one `(component, data type, time slice, wavelength
/// range)`.
///
/// `counts` and `norm` are single-spectrum momentum-transfer workspaces on
/// the same Q grid; the intensity is their ratio.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedSlice {
    pub component: DetectorKind,
    pub data_type: DataType,
    pub time_slice: Option<TimeSlice>,
    pub wavelength_range: WavelengthRange,
    pub counts: Workspace,
    pub norm: Workspace,
}

impl ReducedSlice {
    pub fn counts_histogram(&self) -> WorkspaceResult<&Histogram> {
        self.counts.histogram(0)
    }

    pub fn norm_histogram(&self) -> WorkspaceResult<&Histogram> {
        self.norm.histogram(0)
    }

    /// Q bin edges.
    pub fn q_edges(&self) -> WorkspaceResult<&Array1<f64>> {
        Ok(&self.counts_histogram()?.x)
    }

    /// `counts / norm` per Q bin. Bins with non-positive normalization are
    /// NaN.
    pub fn intensity(&self) -> WorkspaceResult<Histogram> {
        let c = self.counts_histogram()?;
        let n = self.norm_histogram()?;
        let mut y = Array1::<f64>::from_elem(c.n_bins(), f64::NAN);
        let mut e = Array1::<f64>::from_elem(c.n_bins(), f64::NAN);
        for i in 0..c.n_bins() {
            if n.y[i] > 0.0 {
                y[i] = c.y[i] / n.y[i];
                e[i] = (c.e[i] / n.y[i]).hypot(c.y[i] * n.e[i] / (n.y[i] * n.y[i]));
            }
        }
        Histogram::new(c.x.clone(), y, e)
    }
}

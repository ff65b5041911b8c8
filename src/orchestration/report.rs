//! Outcome of an orchestrated reduction.
use crate::{
    merge::merger::MergeSummary,
    state::{
        geometry::DetectorKind,
        windows::{TimeSlice, WavelengthRange},
    },
    workspace::matrix::Workspace,
};
use serde::Serialize;

/// A finished output: one bank, or the merged profile when `component` is
/// `None`. `intensity` is a single-spectrum momentum-transfer workspace with
/// the can already subtracted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedOutput {
    pub name: String,
    pub component: Option<DetectorKind>,
    pub time_slice: Option<TimeSlice>,
    pub wavelength_range: WavelengthRange,
    pub intensity: Workspace,
}

/// An output or job that could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceFailure {
    pub name: String,
    pub reason: String,
}

/// Bank relation used for one merged output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeRecord {
    pub name: String,
    #[serde(flatten)]
    pub summary: MergeSummary,
}

/// Partial-success report: everything that succeeded plus one reason per
/// failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReductionReport {
    pub outputs: Vec<ReducedOutput>,
    pub failures: Vec<SliceFailure>,
    pub merges: Vec<MergeRecord>,
}

#[derive(Serialize)]
struct ReportSummary<'a> {
    outputs: Vec<&'a str>,
    failures: &'a [SliceFailure],
    merges: &'a [MergeRecord],
}

impl ReductionReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn output(&self, name: &str) -> Option<&ReducedOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn failure(&self, name: &str) -> Option<&SliceFailure> {
        self.failures.iter().find(|f| f.name == name)
    }

    /// Output names, failures and merge relations as JSON.
    pub fn summary_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&ReportSummary {
            outputs: self.outputs.iter().map(|o| o.name.as_str()).collect(),
            failures: &self.failures,
            merges: &self.merges,
        })
    }
}

//! BankMerger: fit the bank relation and stitch the profiles.
use crate::{
    merge::{
        errors::BankMergeResult,
        fit::{fit_scale_shift, ScaleShift},
        overlap::{check_grids, defined, overlap_bins},
        stitch::{InverseVarianceStitch, Stitch},
    },
    reduction::slice::ReducedSlice,
    state::options::{FitPolicy, MergeOptions, QRange},
    workspace::{matrix::Workspace, spectrum::Histogram, units::XUnit},
};
use serde::Serialize;

/// Merged profile and the relation used to build it.
///
/// - `merged`: single-spectrum momentum-transfer workspace on the shared
///   grid.
/// - `policy`: the policy as requested; `scale` and `shift` are the values
///   actually applied.
/// - `overlap_bins`: bins defined in both banks inside the fit range.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub merged: Workspace,
    pub scale: f64,
    pub shift: f64,
    pub policy: FitPolicy,
    pub overlap_bins: usize,
}

/// Serializable summary of a [`MergeResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MergeSummary {
    pub scale: f64,
    pub shift: f64,
    pub policy: FitPolicy,
    pub overlap_bins: usize,
}

impl MergeResult {
    pub fn summary(&self) -> MergeSummary {
        MergeSummary { scale: self.scale, shift: self.shift, policy: self.policy, overlap_bins: self.overlap_bins }
    }
}

/// Maps `hab` onto the LAB scale: `I / scale − shift`, `σ / |scale|`.
pub fn rescale_hab(hab: &Histogram, relation: ScaleShift) -> BankMergeResult<Histogram> {
    let ScaleShift { scale, shift } = relation;
    let mut y = hab.y.clone();
    let mut e = hab.e.clone();
    for i in 0..hab.n_bins() {
        if defined(hab, i) {
            y[i] = hab.y[i] / scale - shift;
            e[i] = hab.e[i] / scale.abs();
        }
    }
    Ok(Histogram::with_mask(hab.x.clone(), y, e, hab.masked.clone())?)
}

/// Merges LAB and HAB intensity profiles with a configured policy.
pub struct BankMerger<S: Stitch = InverseVarianceStitch> {
    policy: FitPolicy,
    fit_range: Option<QRange>,
    stitcher: S,
}

impl BankMerger<InverseVarianceStitch> {
    pub fn new(policy: FitPolicy, fit_range: Option<QRange>) -> Self {
        BankMerger { policy, fit_range, stitcher: InverseVarianceStitch }
    }

    pub fn from_options(options: &MergeOptions) -> Self {
        BankMerger::new(options.policy, options.fit_range)
    }
}

impl<S: Stitch> BankMerger<S> {
    /// Replace the stitch primitive.
    pub fn with_stitch<T: Stitch>(self, stitcher: T) -> BankMerger<T> {
        BankMerger { policy: self.policy, fit_range: self.fit_range, stitcher }
    }

    /// Merge two intensity profiles on one Q grid.
    ///
    /// Errors
    /// ------
    /// - `MergeError::BinningMismatch` when the grids differ.
    /// - `MergeError::InsufficientOverlap`, `MergeError::DegenerateFit`,
    ///   `MergeError::InvalidHint` from the fit.
    pub fn merge(&self, lab: &Histogram, hab: &Histogram) -> BankMergeResult<MergeResult> {
        check_grids(lab, hab)?;
        let bins = overlap_bins(lab, hab, self.fit_range);
        let relation = fit_scale_shift(lab, hab, &bins, self.policy)?;
        tracing::info!(
            policy = %self.policy,
            scale = relation.scale,
            shift = relation.shift,
            overlap = bins.len(),
            "banks merged"
        );
        let rescaled = rescale_hab(hab, relation)?;
        let merged = self.stitcher.stitch(lab, &rescaled)?;
        Ok(MergeResult {
            merged: Workspace::profile(XUnit::MomentumTransfer, merged),
            scale: relation.scale,
            shift: relation.shift,
            policy: self.policy,
            overlap_bins: bins.len(),
        })
    }

    /// Merge the intensities of two reduced slices.
    pub fn merge_slices(&self, lab: &ReducedSlice, hab: &ReducedSlice) -> BankMergeResult<MergeResult> {
        self.merge(&lab.intensity()?, &hab.intensity()?)
    }
}

/// Merge `lab` and `hab` with `policy`, fitting over `fit_range` when given.
pub fn merge_banks(
    lab: &Histogram, hab: &Histogram, policy: FitPolicy, fit_range: Option<QRange>,
) -> BankMergeResult<MergeResult> {
    BankMerger::new(policy, fit_range).merge(lab, hab)
}

/// [`merge_banks`] on two reduced slices.
pub fn merge_slices(
    lab: &ReducedSlice, hab: &ReducedSlice, policy: FitPolicy, fit_range: Option<QRange>,
) -> BankMergeResult<MergeResult> {
    BankMerger::new(policy, fit_range).merge_slices(lab, hab)
}

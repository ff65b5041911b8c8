//! Binning grids and fractional-overlap rebinning.
//!
//! Purpose
//! -------
//! Build bin-edge grids from `(min, max, step)` descriptions and move
//! histogram data between grids while conserving counts.
//!
//! Key behaviors
//! -------------
//! - [`make_edges`] produces linear (`x_{i+1} = x_i + step`) or logarithmic
//!   (`x_{i+1} = x_i · (1 + step)`) edges; the final bin is truncated at
//!   `max`.
//! - [`rebin_histogram`] distributes every source bin over the target bins in
//!   proportion to the overlapping width. Squared errors are distributed with
//!   the squared fraction. A target bin is flagged as masked when any masked
//!   source bin overlaps it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Source and target edges are strictly ascending.
//! - A generated grid holds at most [`MAX_BINS`] bins.
//! - Counts falling outside the target range are discarded.
use crate::workspace::{
    errors::{WorkspaceError, WorkspaceResult},
    spectrum::{validate_edges, Histogram},
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Spacing rule for generated bin edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepType {
    Linear,
    Logarithmic,
}

/// Upper bound on the number of bins [`make_edges`] will generate.
pub const MAX_BINS: usize = 1_000_000;

/// Generate bin edges spanning `[min, max]`.
///
/// Parameters
/// ----------
/// - `min`, `max`: range limits; `min < max`, and `min > 0` for logarithmic
///   steps.
/// - `step`: bin width (linear) or fractional growth (logarithmic); `> 0`.
/// - `step_type`: [`StepType`].
///
/// Returns
/// -------
/// Strictly ascending edges with first element `min` and last element `max`.
/// A trailing sliver narrower than 1e-9 of a step is merged into the previous
/// bin.
///
/// Errors
/// ------
/// - `WorkspaceError::InvalidBinning` for non-finite limits, `min >= max`,
///   non-positive step, non-positive `min` with logarithmic steps, a step
///   too small to move the current edge, or more than [`MAX_BINS`] bins.
pub fn make_edges(min: f64, max: f64, step: f64, step_type: StepType) -> WorkspaceResult<Array1<f64>> {
    let invalid = |reason| Err(WorkspaceError::InvalidBinning { min, max, step, reason });
    if !min.is_finite() || !max.is_finite() || !step.is_finite() {
        return invalid("limits and step must be finite");
    }
    if min >= max {
        return invalid("min must be strictly below max");
    }
    if step <= 0.0 {
        return invalid("step must be strictly positive");
    }
    if step_type == StepType::Logarithmic && min <= 0.0 {
        return invalid("logarithmic binning requires min > 0");
    }

    let mut edges = vec![min];
    let mut current = min;
    loop {
        let next = match step_type {
            StepType::Linear => current + step,
            StepType::Logarithmic => current * (1.0 + step),
        };
        if next <= current {
            return invalid("step is below the resolution of the edges");
        }
        let width = next - current;
        if next >= max - 1e-9 * width {
            edges.push(max);
            break;
        }
        if edges.len() == MAX_BINS {
            return invalid("grid exceeds the maximum number of bins");
        }
        edges.push(next);
        current = next;
    }
    Ok(Array1::from(edges))
}

/// Rebin `source` onto `edges` by fractional overlap.
///
/// Errors
/// ------
/// - `WorkspaceError::NonAscendingEdges` when `edges` is not a valid grid.
pub fn rebin_histogram(source: &Histogram, edges: &Array1<f64>) -> WorkspaceResult<Histogram> {
    validate_edges(edges)?;
    let n_target = edges.len() - 1;
    let mut y = Array1::<f64>::zeros(n_target);
    let mut e2 = Array1::<f64>::zeros(n_target);
    let mut masked = vec![false; n_target];

    let mut j = 0usize;
    for i in 0..source.n_bins() {
        let (lo, hi) = (source.x[i], source.x[i + 1]);
        let width = hi - lo;
        if width <= 0.0 {
            continue;
        }
        while j < n_target && edges[j + 1] <= lo {
            j += 1;
        }
        let mut k = j;
        while k < n_target && edges[k] < hi {
            let overlap = hi.min(edges[k + 1]) - lo.max(edges[k]);
            if overlap > 0.0 {
                let frac = overlap / width;
                y[k] += source.y[i] * frac;
                e2[k] += (source.e[i] * frac).powi(2);
                masked[k] |= source.masked[i];
            }
            k += 1;
        }
    }
    Histogram::with_mask(edges.clone(), y, e2.mapv(f64::sqrt), masked)
}

//! Centre-of-mass beam-centre estimate.
//!
//! The bank is moved to the current estimate, a central disk is masked and
//! the intensity-weighted centroid of the remaining pixels is added to the
//! estimate. Later passes halve the disk radius and re-centre on the
//! previous estimate.
use crate::{
    centre::{
        errors::{CentreError, SearchResult},
        result::CentreStatus,
        run::SearchOutcome,
    },
    reduction::{pipeline::DetectorReductionCore, slice::SliceRequest, steps},
    services::traits::LoadedRun,
    state::options::{BeamCentre, MaskShape},
    workspace::matrix::Workspace,
};

/// Intensity-weighted centroid of the unmasked spectra of `ws`, or `None`
/// when no positive weight remains.
pub fn weighted_centroid(ws: &Workspace) -> Option<[f64; 2]> {
    let (mut sx, mut sy, mut sw) = (0.0, 0.0, 0.0);
    for spectrum in ws.spectra.iter().filter(|s| !s.masked) {
        let w = spectrum.integrated();
        if w <= 0.0 || !w.is_finite() {
            continue;
        }
        sx += w * spectrum.position[0];
        sy += w * spectrum.position[1];
        sw += w;
    }
    (sw > 0.0).then(|| [sx / sw, sy / sw])
}

/// Run up to `passes` centroid passes from `start`.
///
/// Errors
/// ------
/// - `ReductionError::EmptyComponent` when the bank has no spectra.
/// - `CentreError::NoSignal` when masking leaves no positive intensity.
/// - Masking service errors.
pub fn centre_of_mass(
    core: &DetectorReductionCore<'_>, run: &LoadedRun, request: &SliceRequest,
    start: BeamCentre, radius: f64, passes: u64, tolerance: f64,
) -> SearchResult<SearchOutcome> {
    let component = core.validate(run, request)?;
    let sliced = steps::time_slice(&steps::crop(&run.counts, component)?, request.time_slice);

    let mut estimate = start;
    let mut shift = f64::INFINITY;
    let mut radius = radius;
    let mut done = 0;
    while done < passes {
        let moved = steps::move_to_centre(&sliced, estimate);
        let mut shapes = request.extra_shapes.clone();
        shapes.push(MaskShape::Disk { centre: [0.0, 0.0], radius });
        let masked = core.services().masker.mask(&moved, &core.state().mask.with_shapes(&shapes))?;
        let [dx, dy] = weighted_centroid(&masked).ok_or(CentreError::NoSignal)?;
        estimate = BeamCentre { x: estimate.x + dx, y: estimate.y + dy };
        shift = dx.hypot(dy);
        done += 1;
        tracing::info!(pass = done, x = estimate.x, y = estimate.y, radius, shift, "centre of mass pass");
        if shift < tolerance {
            break;
        }
        radius *= 0.5;
    }
    let status = if shift < tolerance { CentreStatus::Converged } else { CentreStatus::MaxIterationsReached };
    Ok(SearchOutcome { centre: [estimate.x, estimate.y], residual: shift, status, iterations: done })
}

//! Search options for the beam-centre finder.
use crate::{
    centre::errors::{CentreError, SearchResult},
    state::{defaults, geometry::DetectorKind, options::BeamCentre},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which estimator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CentreMethod {
    /// Iterative left/right, top/bottom profile comparison.
    #[default]
    QuadrantResidual,
    /// Closed-form intensity centroid outside a central disk.
    CentreOfMass,
}

/// Coordinates the quadrant search may move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchDirection {
    /// Position 1 only (horizontal).
    X,
    /// Position 2 only (vertical).
    Y,
    #[default]
    Both,
}

impl SearchDirection {
    /// `[moves x, moves y]`.
    pub fn active(&self) -> [bool; 2] {
        match self {
            SearchDirection::X => [true, false],
            SearchDirection::Y => [false, true],
            SearchDirection::Both => [true, true],
        }
    }
}

impl fmt::Display for SearchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SearchDirection::X => "X",
            SearchDirection::Y => "Y",
            SearchDirection::Both => "Both",
        })
    }
}

/// Beam-centre search settings.
///
/// Fields
/// ------
/// - `method`: [`CentreMethod`].
/// - `component`: bank whose centre is searched.
/// - `start`: first candidate; the state's centre for `component` when
///   `None`.
/// - `max_iterations`: iteration budget of the quadrant search; number of
///   passes of the centre-of-mass estimate.
/// - `tolerance`: relative residual (quadrant) or displacement in metres
///   (centre of mass) below which the search stops.
/// - `step`: first displacement of the quadrant search, metres.
/// - `direction`: coordinates the quadrant search may move.
/// - `radius_limits`: `(r_min, r_max)` annulus around the candidate, metres.
///   The centre-of-mass method masks inside `r_min` on the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CentreOptions {
    pub method: CentreMethod,
    pub component: DetectorKind,
    pub start: Option<BeamCentre>,
    pub max_iterations: u64,
    pub tolerance: f64,
    pub step: f64,
    pub direction: SearchDirection,
    pub radius_limits: (f64, f64),
}

impl Default for CentreOptions {
    fn default() -> Self {
        CentreOptions {
            method: CentreMethod::default(),
            component: DetectorKind::Lab,
            start: None,
            max_iterations: defaults::CENTRE_MAX_ITERATIONS,
            tolerance: defaults::CENTRE_TOLERANCE,
            step: defaults::CENTRE_STEP,
            direction: SearchDirection::default(),
            radius_limits: defaults::CENTRE_RADIUS_LIMITS,
        }
    }
}

impl CentreOptions {
    /// Check the numeric settings.
    ///
    /// Errors
    /// ------
    /// - `CentreError::InvalidOption` for a zero iteration budget, a
    ///   non-positive tolerance or step, or an invalid annulus.
    pub fn validate(&self) -> SearchResult<()> {
        let invalid = |name, value, reason| Err(CentreError::InvalidOption { name, value, reason });
        if self.max_iterations == 0 {
            return invalid("max_iterations", 0.0, "must be at least 1");
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return invalid("tolerance", self.tolerance, "must be positive and finite");
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return invalid("step", self.step, "must be positive and finite");
        }
        let (r_min, r_max) = self.radius_limits;
        if !r_min.is_finite() || r_min < 0.0 {
            return invalid("radius_limits.0", r_min, "must be non-negative and finite");
        }
        if !r_max.is_finite() || r_max <= r_min {
            return invalid("radius_limits.1", r_max, "must exceed the inner radius");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate_and_bad_values_are_rejected() {
        assert!(CentreOptions::default().validate().is_ok());

        let zero_iter = CentreOptions { max_iterations: 0, ..Default::default() };
        assert!(matches!(
            zero_iter.validate(),
            Err(CentreError::InvalidOption { name: "max_iterations", .. })
        ));

        let inverted = CentreOptions { radius_limits: (0.2, 0.1), ..Default::default() };
        assert!(matches!(
            inverted.validate(),
            Err(CentreError::InvalidOption { name: "radius_limits.1", .. })
        ));
        assert_eq!(SearchDirection::Y.active(), [false, true]);
    }
}

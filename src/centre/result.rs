//! Outcome of a beam-centre search.
use crate::centre::errors::{CentreError, SearchResult};
use argmin::core::{TerminationReason, TerminationStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the search ended. Neither variant is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CentreStatus {
    Converged,
    /// The budget ran out; the best estimate so far is reported.
    MaxIterationsReached,
}

impl CentreStatus {
    /// Map an `argmin` termination status.
    ///
    /// Errors
    /// ------
    /// - `CentreError::Terminated` for any other reason, including a search
    ///   that never terminated.
    pub fn from_termination(status: &TerminationStatus) -> SearchResult<Self> {
        match status {
            TerminationStatus::Terminated(TerminationReason::SolverConverged) => Ok(CentreStatus::Converged),
            TerminationStatus::Terminated(TerminationReason::MaxItersReached) => {
                Ok(CentreStatus::MaxIterationsReached)
            }
            other => Err(CentreError::Terminated { reason: format!("{other:?}") }),
        }
    }
}

impl fmt::Display for CentreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CentreStatus::Converged => "Converged",
            CentreStatus::MaxIterationsReached => "MaxIterationsReached",
        })
    }
}

/// Estimated beam centre.
///
/// - `x`, `y`: position 1 and 2 in metres.
/// - `residual`: final quadrant residual, or the last displacement of the
///   centre-of-mass method.
/// - `table_id`: identifier of the persisted `(X, Y)` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentreResult {
    pub x: f64,
    pub y: f64,
    pub status: CentreStatus,
    pub iterations: u64,
    pub residual: f64,
    pub table_id: String,
}

impl CentreResult {
    pub fn converged(&self) -> bool {
        self.status == CentreStatus::Converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_reasons_map_to_status() {
        let converged = TerminationStatus::Terminated(TerminationReason::SolverConverged);
        let capped = TerminationStatus::Terminated(TerminationReason::MaxItersReached);
        assert_eq!(CentreStatus::from_termination(&converged), Ok(CentreStatus::Converged));
        assert_eq!(CentreStatus::from_termination(&capped), Ok(CentreStatus::MaxIterationsReached));
        assert!(matches!(
            CentreStatus::from_termination(&TerminationStatus::NotTerminated),
            Err(CentreError::Terminated { .. })
        ));
    }
}

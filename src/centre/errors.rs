//! Errors for the beam-centre search.
//!
//! Search options are validated up front; reduction failures inside a
//! residual evaluation travel through `argmin` and are recovered here so the
//! caller sees the original [`ReductionError`]. Reaching the iteration cap is
//! a status, not an error.
use crate::{reduction::errors::ReductionError, services::errors::UpstreamError};
use argmin::core::{ArgminError, Error as SolverError};
use thiserror::Error;

pub type SearchResult<T> = Result<T, CentreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CentreError {
    // ---- Options ----
    /// A numeric search option is out of range.
    #[error("Invalid centre-search option {name} = {value}: {reason}")]
    InvalidOption { name: &'static str, value: f64, reason: &'static str },

    // ---- Evaluation ----
    #[error(transparent)]
    Reduction(#[from] ReductionError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// A residual evaluated to NaN or infinity.
    #[error("Quadrant residual is not finite: {value}")]
    NonFiniteResidual { value: f64 },

    /// Nothing left to weight after masking (centre of mass).
    #[error("No unmasked intensity left for the centre-of-mass estimate")]
    NoSignal,

    /// The solver finished without any evaluated position.
    #[error("Centre search finished without an estimate")]
    MissingEstimate,

    /// The solver stopped for a reason other than convergence or the
    /// iteration cap.
    #[error("Centre search terminated unexpectedly: {reason}")]
    Terminated { reason: String },

    // ---- Argmin ----
    #[error("Invalid parameter: {text}")]
    InvalidParameter { text: String },
    #[error("Not implemented: {text}")]
    NotImplemented { text: String },
    #[error("Not initialized: {text}")]
    NotInitialized { text: String },
    #[error("Condition violated: {text}")]
    ConditionViolated { text: String },
    #[error("Checkpoint not found: {text}")]
    CheckpointNotFound { text: String },
    #[error("Potential bug: {text}")]
    PotentialBug { text: String },
    #[error("Impossible error: {text}")]
    ImpossibleError { text: String },
    /// Any other `argmin` error.
    #[error("Solver backend error: {text}")]
    BackendError { text: String },
}

impl From<SolverError> for CentreError {
    fn from(original_err: SolverError) -> Self {
        let original_err = match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => {
                return match argmin_err {
                    ArgminError::InvalidParameter { text } => CentreError::InvalidParameter { text },
                    ArgminError::NotImplemented { text } => CentreError::NotImplemented { text },
                    ArgminError::NotInitialized { text } => CentreError::NotInitialized { text },
                    ArgminError::ConditionViolated { text } => CentreError::ConditionViolated { text },
                    ArgminError::CheckpointNotFound { text } => CentreError::CheckpointNotFound { text },
                    ArgminError::PotentialBug { text } => CentreError::PotentialBug { text },
                    ArgminError::ImpossibleError { text } => CentreError::ImpossibleError { text },
                    other => CentreError::BackendError { text: other.to_string() },
                }
            }
            Err(err) => err,
        };
        let original_err = match original_err.downcast::<ReductionError>() {
            Ok(err) => return CentreError::Reduction(err),
            Err(err) => err,
        };
        match original_err.downcast::<CentreError>() {
            Ok(err) => err,
            Err(err) => CentreError::BackendError { text: err.to_string() },
        }
    }
}

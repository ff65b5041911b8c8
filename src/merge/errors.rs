//! Errors for the two-bank merge.
use crate::workspace::errors::WorkspaceError;
use thiserror::Error;

pub type BankMergeResult<T> = Result<T, MergeError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    /// The policy needs a fit but fewer than two bins are defined in both
    /// banks.
    #[error("Bank merge needs at least 2 overlapping Q bins to fit; found {found}")]
    InsufficientOverlap { found: usize },

    /// Singular normal equations or a fitted scale of zero.
    #[error("Bank merge fit is degenerate: {reason}")]
    DegenerateFit { reason: &'static str },

    /// The two profiles are not on the same Q grid.
    #[error("LAB and HAB profiles use different Q grids: {lab} vs {hab} bins")]
    BinningMismatch { lab: usize, hab: usize },

    /// A configured scale or shift cannot be used.
    #[error("Invalid merge {name}: {value}")]
    InvalidHint { name: &'static str, value: f64 },

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

#[cfg(feature = "python-bindings")]
impl From<MergeError> for pyo3::PyErr {
    fn from(err: MergeError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(format!("MergeError: {err}"))
    }
}

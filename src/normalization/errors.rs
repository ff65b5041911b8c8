//! Errors for monitor normalization.
use crate::{
    services::errors::UpstreamError,
    state::errors::ConfigError,
    workspace::{errors::WorkspaceError, units::XUnit},
};
use thiserror::Error;

pub type NormalizationResult<T> = Result<T, NormalizationError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    /// Invalid window or missing incident monitor.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unit conversion delegated to the converter failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// Input workspace is in the wrong unit for this step.
    #[error("Expected a {expected} workspace, found {found}")]
    UnitMismatch { expected: XUnit, found: XUnit },
}

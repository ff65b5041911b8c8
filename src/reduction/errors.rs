//! Errors for the per-bank reduction pipeline.
//!
//! [`ReductionError`] wraps configuration, collaborator and workspace errors
//! and adds the pipeline's own pre-flight validation failures. Any error
//! aborts the whole slice; no partial output is produced.
use crate::{
    normalization::errors::NormalizationError,
    services::errors::UpstreamError,
    state::{errors::ConfigError, geometry::DetectorKind},
    workspace::errors::WorkspaceError,
};
use thiserror::Error;

pub type ReductionResult<T> = Result<T, ReductionError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReductionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    // ---- Pre-flight validation ----
    /// The requested bank is not part of the instrument geometry.
    #[error("Detector component {component} is not defined for this instrument")]
    UnknownComponent { component: DetectorKind },

    /// The requested bank has no spectra in the loaded run.
    #[error("Detector component {component} has no spectra in the loaded run")]
    EmptyComponent { component: DetectorKind },

    /// A transmission correction is configured but its input is missing.
    #[error("Transmission correction configured but the {which} run is missing")]
    MissingTransmissionInput { which: &'static str },

    /// The pipeline needs a histogram where events were supplied.
    #[error("{stage} requires histogram data: {reason}")]
    Unsupported { stage: &'static str, reason: &'static str },

    /// An intermediate was released from the slice arena before use.
    #[error("Intermediate '{stage}' is no longer held by the slice arena")]
    Released { stage: &'static str },

    /// Input workspace is in the wrong unit.
    #[error("{stage}: unexpected unit {found}")]
    WrongUnit { stage: &'static str, found: crate::workspace::units::XUnit },
}

impl From<NormalizationError> for ReductionError {
    fn from(err: NormalizationError) -> Self {
        match err {
            NormalizationError::Config(e) => ReductionError::Config(e),
            NormalizationError::Upstream(e) => ReductionError::Upstream(e),
            NormalizationError::Workspace(e) => ReductionError::Workspace(e),
            NormalizationError::UnitMismatch { found, .. } => {
                ReductionError::WrongUnit { stage: "monitor normalization", found }
            }
        }
    }
}

//! Errors raised by external collaborators (loading, unit conversion,
//! masking, persistence).
//!
//! These are propagated unchanged through the reduction layers and never
//! retried.
use crate::workspace::{errors::WorkspaceError, units::XUnit};
use thiserror::Error;

/// Result alias for collaborator calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Failure reported by a [`DataLoader`](super::DataLoader),
/// [`UnitConverter`](super::UnitConverter), [`MaskingService`](super::MaskingService)
/// or [`PersistenceService`](super::PersistenceService).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    // ---- Units ----
    /// Unit name could not be parsed.
    #[error("Unknown unit '{name}'")]
    UnknownUnit { name: String },

    /// The converter does not implement this combination.
    #[error("Unsupported unit conversion {from} -> {to} in {mode} mode")]
    UnsupportedUnit { from: XUnit, to: XUnit, mode: String },

    /// A spectrum cannot be converted (non-positive flight path, bad energy).
    #[error("Cannot convert detector {detector_id}: {reason}")]
    Conversion { detector_id: u32, reason: &'static str },

    // ---- Masking ----
    #[error("Masking failed: {reason}")]
    Masking { reason: String },

    // ---- Loading ----
    #[error("Run '{run}' not found")]
    RunNotFound { run: String },

    #[error("Failed to load run '{run}': {reason}")]
    Load { run: String, reason: String },

    // ---- Persistence ----
    #[error("Persistence failed: {reason}")]
    Persistence { reason: String },

    // ---- Data ----
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}

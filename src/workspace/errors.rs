//! Errors for workspace construction and histogram arithmetic.
//!
//! [`WorkspaceError`] covers shape invariants of spectra (edge/value/error
//! lengths, ascending bin edges, event-list column lengths) and invalid
//! binning requests. Numeric pipeline failures live in the reduction layer.
use thiserror::Error;

/// Result alias for workspace operations that may produce [`WorkspaceError`].
pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

/// Shape and binning violations for spectra and workspaces.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkspaceError {
    // ---- Histogram shape ----
    /// Histogram form requires `len(X) = len(Y) + 1`.
    #[error("Histogram edge count mismatch: {edges} edges for {values} values (expected values + 1)")]
    EdgeCountMismatch { edges: usize, values: usize },

    /// Uncertainties must have one entry per bin.
    #[error("Histogram error count mismatch: {errors} errors for {values} values")]
    ErrorCountMismatch { values: usize, errors: usize },

    /// Mask flags must have one entry per bin.
    #[error("Histogram mask count mismatch: {flags} flags for {values} values")]
    MaskCountMismatch { values: usize, flags: usize },

    /// Bin edges must be strictly ascending and finite.
    #[error("Bin edges must be finite and strictly ascending; violated at edge {index} ({value})")]
    NonAscendingEdges { index: usize, value: f64 },

    // ---- Event lists ----
    /// All event columns must have the same length.
    #[error("Event list column mismatch: {expected} events but column '{column}' has {found}")]
    EventLengthMismatch { column: &'static str, expected: usize, found: usize },

    // ---- Access ----
    /// Spectrum index outside of the workspace.
    #[error("Spectrum index {index} out of range for workspace with {len} spectra")]
    SpectrumIndexOutOfRange { index: usize, len: usize },

    /// Operation needs histogram data but the spectrum holds events.
    #[error("Spectrum for detector {detector_id} holds events; histogram data required")]
    NotHistogram { detector_id: u32 },

    /// Two histograms combined bin by bin must share a grid.
    #[error("Histogram grids differ: {left} bins vs {right} bins")]
    GridMismatch { left: usize, right: usize },

    // ---- Binning ----
    /// Binning parameters must describe at least one bin.
    #[error("Invalid binning [{min}, {max}] with step {step}: {reason}")]
    InvalidBinning { min: f64, max: f64, step: f64, reason: &'static str },
}

//! Configuration errors for [`ReductionState`](super::ReductionState).
//!
//! Every variant is raised eagerly while the state is being built, before any
//! data is loaded, so a rejected configuration never produces partial output.
use crate::workspace::errors::WorkspaceError;
use thiserror::Error;

/// Result alias for state construction and option builders.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Malformed or inconsistent reduction configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    // ---- Windows and ranges ----
    /// A `(start, stop)` pair whose start is not strictly below its stop.
    #[error("Inverted {name} window: start {start} must be below stop {stop}")]
    InvertedWindow { name: &'static str, start: f64, stop: f64 },

    /// Only one bound of a `(start, stop)` pair was supplied.
    #[error("Half-specified {name} window: both start and stop are required")]
    HalfWindow { name: &'static str },

    /// A bound or parameter must be finite.
    #[error("Non-finite value for {name}: {value}")]
    NonFinite { name: &'static str, value: f64 },

    /// A parameter must be strictly positive.
    #[error("Invalid {name}: {value}, must be strictly positive")]
    NonPositive { name: &'static str, value: f64 },

    /// The global and per-monitor background windows are mutually exclusive.
    #[error("Background window given both globally and per monitor; choose one form")]
    ConflictingBackground,

    /// A wavelength sub-range lies outside the full wavelength range.
    #[error("Wavelength range [{min}, {max}] lies outside the full range [{full_min}, {full_max}]")]
    RangeOutsideFull { min: f64, max: f64, full_min: f64, full_max: f64 },

    // ---- Instrument ----
    /// The incident (or transmission) monitor is not part of the instrument.
    #[error("Monitor {id} is not defined for the instrument")]
    MissingMonitor { id: u32 },

    /// A detector component was configured twice or has an empty id range.
    #[error("Invalid detector component {name}: {reason}")]
    InvalidComponent { name: String, reason: &'static str },

    /// The instrument has no detector components.
    #[error("Instrument geometry defines no detector components")]
    NoComponents,

    // ---- Adjustments ----
    /// A wavelength correction curve needs matching, ascending abscissae.
    #[error("Invalid wavelength correction curve: {reason}")]
    InvalidCorrectionCurve { reason: &'static str },

    /// The wide-angle correction needs a transmission configuration.
    #[error("Wide-angle correction requested without a transmission configuration")]
    WideAngleWithoutTransmission,

    // ---- Binning ----
    /// Binning rejected by the workspace layer.
    #[error("Invalid binning: {0}")]
    Binning(#[from] WorkspaceError),

    // ---- Deserialization ----
    /// JSON configuration could not be parsed.
    #[error("Malformed configuration: {text}")]
    Malformed { text: String },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Malformed { text: err.to_string() }
    }
}

//! state — validated reduction configuration and instrument defaults.
//!
//! Purpose
//! -------
//! Hold the immutable per-run configuration consumed by every stage:
//! instrument geometry, wavelength and Q grids, normalization windows, masks,
//! scaling, adjustments, beam centres, merge policy and run options.
//!
//! Key behaviors
//! -------------
//! - Build a [`ReductionState`] from a raw [`StateConfig`] (or JSON) in one
//!   step, validating eagerly.
//! - Model every "kind" setting as a closed enum (`MaskShape`, `FitPolicy`,
//!   `DetectorKind`, `BackgroundWindow`, `SampleShape`, `TransmissionFit`,
//!   `ReductionMode`).
//! - Provide per-instrument defaults through [`defaults`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Once built, a state is never mutated; stages take `&ReductionState`.
//! - Validation failures are reported as [`ConfigError`] before any data is
//!   loaded.
//!
//! Testing notes
//! -------------
//! - Unit tests cover window validation, background mutual exclusion, mask
//!   geometry, sample volumes, instrument defaults and JSON parsing.

pub mod defaults;
pub mod errors;
pub mod geometry;
pub mod options;
pub mod reduction_state;
pub mod windows;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{ConfigError, ConfigResult};
pub use self::geometry::{DetectorComponent, DetectorKind, InstrumentGeometry, InstrumentId, MonitorSpec};
pub use self::options::{
    AdjustmentOptions, BeamCentre, BeamCentres, CorrectionCurve, DataType, FitPolicy, MaskShape,
    MaskSpec, MergeOptions, NormalizationOptions, QRange, Quadrant, ReductionMode,
    ReductionOptions, SampleShape, ScaleOptions, TransmissionFit, TransmissionOptions,
};
pub use self::reduction_state::{NormalizationConfig, ReductionState, StateConfig, WavelengthConfig};
pub use self::windows::{
    BackgroundWindow, QBinning, TimeSlice, TofWindow, WavelengthBinning, WavelengthRange, WindowBounds,
};

pub mod prelude {
    pub use super::errors::{ConfigError, ConfigResult};
    pub use super::geometry::{DetectorKind, InstrumentId};
    pub use super::options::{DataType, FitPolicy, MaskShape, Quadrant, ReductionMode};
    pub use super::reduction_state::{ReductionState, StateConfig};
}

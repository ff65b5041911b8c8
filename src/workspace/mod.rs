//! workspace — spectra, units, rebinning and scoped intermediates.
//!
//! Purpose
//! -------
//! Provide the value type that flows through every reduction stage. A
//! [`Workspace`] is an ordered list of [`Spectrum`] values sharing one
//! [`XUnit`]; each spectrum holds either histogram or event data plus the
//! detector id and position needed by geometric and unit-conversion steps.
//!
//! Key behaviors
//! -------------
//! - Validate histogram shape invariants on construction
//!   (`len(X) = len(Y) + 1`, strictly ascending edges).
//! - Build bin grids and rebin histograms by fractional overlap
//!   ([`rebin`]).
//! - Own per-request intermediates in a [`SliceArena`] that releases them on
//!   every exit path.
//!
//! Invariants & assumptions
//! ------------------------
//! - Stages never mutate a workspace they did not create; they clone, modify
//!   and return.
//! - Masked bins carry zero value and zero error.
//!
//! Conventions
//! -----------
//! - Positions are metres relative to the sample, beam along `+z`.
//! - Time-of-flight is in µs, wavelength in Å, momentum transfer in Å⁻¹.
//!
//! Testing notes
//! -------------
//! - Unit tests live beside each submodule and cover shape validation, event
//!   histogramming, edge generation and count-conserving rebinning.

pub mod arena;
pub mod errors;
pub mod matrix;
pub mod rebin;
pub mod spectrum;
pub mod units;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::arena::{SliceArena, Slot};
pub use self::errors::{WorkspaceError, WorkspaceResult};
pub use self::matrix::Workspace;
pub use self::rebin::{make_edges, rebin_histogram, StepType};
pub use self::spectrum::{EventList, Histogram, Position, Spectrum, SpectrumData};
pub use self::units::XUnit;

pub mod prelude {
    pub use super::errors::{WorkspaceError, WorkspaceResult};
    pub use super::matrix::Workspace;
    pub use super::spectrum::{EventList, Histogram, Spectrum};
    pub use super::units::XUnit;
}

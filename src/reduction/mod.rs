//! reduction — the per-bank reduction pipeline (DetectorReductionCore).
//!
//! Purpose
//! -------
//! Turn the TOF counts of one detector bank into 1D momentum-transfer
//! profiles: crop, time slice, move, mask, convert to wavelength, scale,
//! build the normalization adjustments, collapse and bin in Q.
//!
//! Key behaviors
//! -------------
//! - [`reduce_slice`] / [`reduce_slice_ranges`] (or a
//!   [`DetectorReductionCore`]) run the whole sequence for a
//!   [`SliceRequest`] and return [`ReducedSlice`] values holding separate
//!   counts and normalization profiles.
//! - [`steps`], [`adjustments`], [`transmission`] and [`q1d`] expose the
//!   individual stages for reuse by the centre finder and for testing.
//!
//! Invariants & assumptions
//! ------------------------
//! - Requests are validated before any numeric step.
//! - Any error aborts the request; intermediates are released on every
//!   exit path and no partial output is returned.
//!
//! Testing notes
//! -------------
//! - `fixtures` builds a small synthetic instrument shared by the unit
//!   tests of this and the downstream modules.

pub mod adjustments;
pub mod errors;
pub mod pipeline;
pub mod q1d;
pub mod slice;
pub mod steps;
pub mod transmission;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::errors::{ReductionError, ReductionResult};
pub use self::pipeline::{reduce_slice, reduce_slice_ranges, DetectorReductionCore};
pub use self::slice::{ReducedSlice, ReductionServices, SliceRequest};

pub mod prelude {
    pub use super::errors::{ReductionError, ReductionResult};
    pub use super::pipeline::{reduce_slice, DetectorReductionCore};
    pub use super::slice::{ReducedSlice, ReductionServices, SliceRequest};
}

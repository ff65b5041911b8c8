//! merge — combine the LAB and HAB profiles (BankMerger).
//!
//! Purpose
//! -------
//! Bring the high-angle bank onto the low-angle bank's scale and stitch
//! both into one profile spanning the union of their Q coverage.
//!
//! Key behaviors
//! -------------
//! - The relation `I_HAB ≈ scale · I_LAB + intercept` (with
//!   `shift = intercept / scale`) is configured or fitted according to
//!   [`FitPolicy`](crate::state::options::FitPolicy): `NoFit`, `Both`,
//!   `ShiftOnly` or `ScaleOnly`.
//! - Fits use the bins defined in both banks, optionally restricted to a Q
//!   interval, weighted by inverse variance.
//! - The rescaled HAB profile `I_HAB / scale − shift` and the LAB profile
//!   are handed to a [`Stitch`] primitive; the default is
//!   [`InverseVarianceStitch`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Both profiles share one Q grid (`MergeError::BinningMismatch`
//!   otherwise).
//! - Fitting policies need at least two overlap bins; `NoFit` needs none.
//! - A bin is defined when it is unmasked with finite value and
//!   uncertainty.
//!
//! Testing notes
//! -------------
//! - Policy tests use an exactly affine pair of ten-bin profiles; one test
//!   merges banks reduced from the synthetic two-bank run.

pub mod errors;
pub mod fit;
pub mod merger;
pub mod overlap;
pub mod stitch;

pub use self::errors::{BankMergeResult, MergeError};
pub use self::fit::ScaleShift;
pub use self::merger::{merge_banks, merge_slices, BankMerger, MergeResult, MergeSummary};
pub use self::stitch::{InverseVarianceStitch, Stitch};

pub mod prelude {
    pub use super::errors::{BankMergeResult, MergeError};
    pub use super::merger::{merge_banks, BankMerger, MergeResult};
}

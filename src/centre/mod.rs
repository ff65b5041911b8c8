//! centre — beam-centre estimation (BeamCentreFinder).
//!
//! Purpose
//! -------
//! Estimate the position of the direct beam on one detector bank and
//! persist it as an `(X, Y)` table.
//!
//! Key behaviors
//! -------------
//! - The quadrant method reduces the bank four times per candidate (left,
//!   right, top, bottom inside an annulus) and compares opposite profiles.
//!   [`QuadrantSearch`] is an `argmin` solver that steps the active
//!   coordinates, reversing and halving a step whenever its residual grows.
//! - The centre-of-mass method iterates an intensity centroid outside a
//!   shrinking central disk.
//! - Running out of iterations is reported through [`CentreStatus`] with
//!   the best estimate so far; it is not an error.
//!
//! Invariants & assumptions
//! ------------------------
//! - Candidates are only reduced through [`DetectorReductionCore`], so the
//!   state's masks, windows and adjustments apply to every profile.
//! - Pixels on a quadrant diagonal belong to no quadrant.
//!
//! Conventions
//! -----------
//! - Positions are metres in the detector plane; `x` is position 1.
//! - `argmin` errors are converted back into [`CentreError`], recovering
//!   reduction errors raised inside the cost function.
//!
//! Testing notes
//! -------------
//! - Solver tests use an analytic bowl; finder tests use the synthetic
//!   spot from `reduction::fixtures` with `radius_limits = (0, 0.2)`, since
//!   the default inner radius covers most of the small test bank.
//!
//! [`DetectorReductionCore`]: crate::reduction::DetectorReductionCore

pub mod errors;
pub mod finder;
pub mod mass;
pub mod options;
pub mod problem;
pub mod result;
pub mod run;
pub mod solver;

pub use self::errors::{CentreError, SearchResult};
pub use self::finder::{find_centre, BeamCentreFinder};
pub use self::options::{CentreMethod, CentreOptions, SearchDirection};
pub use self::result::{CentreResult, CentreStatus};
pub use self::solver::QuadrantSearch;

pub mod prelude {
    pub use super::errors::{CentreError, SearchResult};
    pub use super::finder::{find_centre, BeamCentreFinder};
    pub use super::options::{CentreMethod, CentreOptions, SearchDirection};
    pub use super::result::{CentreResult, CentreStatus};
}

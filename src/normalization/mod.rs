//! normalization — monitor preparation and counts normalization.
//!
//! Purpose
//! -------
//! Normalize scattered counts against the incident-beam monitor. The monitor
//! is cleaned in time-of-flight (prompt peak, then flat background),
//! converted to wavelength through the unit-conversion service and rebinned
//! onto the counts' grid.
//!
//! Key behaviors
//! -------------
//! - [`CountsNormalizer::normalize`]: counts ÷ prepared monitor.
//! - [`CountsNormalizer::monitor_normalization`]: the prepared monitor
//!   alone, reused by the pipeline's wavelength adjustment and by the
//!   transmission calculation.
//! - [`corrections`]: the two TOF corrections as free functions.
//!
//! Invariants & assumptions
//! ------------------------
//! - Prompt-peak removal always precedes background subtraction, and both
//!   precede any rebinning.
//! - Window validity and monitor presence are [`ConfigError`](crate::state::ConfigError)s.
//!
//! Testing notes
//! -------------
//! - Unit tests demonstrate the step-order hazard, background conservation
//!   outside the window and division with masked monitor bins.

pub mod corrections;
pub mod errors;
pub mod normalizer;

pub use self::corrections::{remove_prompt_peak, subtract_flat_background};
pub use self::errors::{NormalizationError, NormalizationResult};
pub use self::normalizer::{divide, CountsNormalizer};

pub mod prelude {
    pub use super::errors::{NormalizationError, NormalizationResult};
    pub use super::normalizer::CountsNormalizer;
}

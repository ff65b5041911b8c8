//! orchestration — full reduction requests (ReductionOrchestrator).
//!
//! Purpose
//! -------
//! Turn the run-level options of a [`ReductionState`] into reduced, can-
//! subtracted and optionally merged profiles, and report what succeeded and
//! what failed.
//!
//! Key behaviors
//! -------------
//! - Sample and can runs are loaded once through the `DataLoader`.
//! - The request expands into `(component, data type, time slice,
//!   wavelength range)` jobs whose output names are allocated before the
//!   jobs run concurrently on the rayon pool.
//! - Per bank the can intensity is subtracted from the sample intensity;
//!   banks are kept, merged or both according to the `ReductionMode`.
//! - With a save prefix every output is written through the
//!   `PersistenceService` as `<prefix>/<name>`.
//!
//! Invariants & assumptions
//! ------------------------
//! - A failed job or output never aborts its siblings; it is recorded as
//!   `{name, reason}` in the [`ReductionReport`] together with every output
//!   that depends on it.
//! - Only load failures abort the request.
//!
//! [`ReductionState`]: crate::state::reduction_state::ReductionState

pub mod errors;
pub mod jobs;
pub mod orchestrator;
pub mod report;
pub mod subtract;

pub use self::errors::{OrchestrationError, OrchestrationResult};
pub use self::orchestrator::{run_reduction, ReductionOrchestrator};
pub use self::report::{MergeRecord, ReducedOutput, ReductionReport, SliceFailure};

pub mod prelude {
    pub use super::errors::{OrchestrationError, OrchestrationResult};
    pub use super::orchestrator::{run_reduction, ReductionOrchestrator};
    pub use super::report::ReductionReport;
}

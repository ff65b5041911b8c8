//! services — contracts for external collaborators plus reference
//! implementations.
//!
//! Purpose
//! -------
//! Isolate everything the numeric core does not own: loading raw runs,
//! converting units, applying masks and persisting results. The core talks
//! only to the traits in [`traits`]; the small implementations here make the
//! crate usable and testable without a facility framework.
//!
//! Key behaviors
//! -------------
//! - [`ElasticConverter`]: elastic TOF ↔ wavelength.
//! - [`DetectorMasker`]: id, shape and time masks with OR semantics.
//! - [`InMemoryLoader`] / [`MemoryStore`]: in-memory loading and
//!   persistence.
//!
//! Conventions
//! -----------
//! - Collaborator failures surface as [`UpstreamError`] and are propagated
//!   unchanged by the reduction layers.

pub mod converter;
pub mod errors;
pub mod masker;
pub mod memory;
pub mod traits;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::converter::{flight_path, ElasticConverter, TOF_TO_WAVELENGTH};
pub use self::errors::{UpstreamError, UpstreamResult};
pub use self::masker::DetectorMasker;
pub use self::memory::{InMemoryLoader, MemoryStore, StoredTable};
pub use self::traits::{
    ConversionMode, DataLoader, LoadedRun, MaskingService, PersistenceService, UnitConverter,
};

pub mod prelude {
    pub use super::errors::{UpstreamError, UpstreamResult};
    pub use super::traits::{
        ConversionMode, DataLoader, LoadedRun, MaskingService, PersistenceService, UnitConverter,
    };
}

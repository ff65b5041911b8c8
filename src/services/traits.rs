//! Collaborator contracts consumed by the reduction core.
//!
//! The core never reads files, parses instrument definitions or writes to
//! disk itself; it calls these traits. All of them are `Send + Sync` so one
//! instance can be shared by the concurrent quadrant and slice reductions.
use crate::{
    services::errors::UpstreamResult,
    state::options::MaskSpec,
    workspace::{matrix::Workspace, units::XUnit},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data of one run as delivered by a [`DataLoader`].
///
/// Fields
/// ------
/// - `counts`: detector spectra (histogram or event) in TOF.
/// - `monitors`: monitor spectra in TOF.
/// - `transmission`: monitors of the transmission run, if measured.
/// - `direct`: monitors of the direct (empty beam) run, if measured.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedRun {
    pub counts: Workspace,
    pub monitors: Workspace,
    pub transmission: Option<Workspace>,
    pub direct: Option<Workspace>,
}

/// Loads raw runs by identifier.
pub trait DataLoader: Send + Sync {
    fn load(&self, run: &str) -> UpstreamResult<LoadedRun>;
}

/// Energy-transfer mode of a unit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConversionMode {
    #[default]
    Elastic,
    Direct,
    Indirect,
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConversionMode::Elastic => "Elastic",
            ConversionMode::Direct => "Direct",
            ConversionMode::Indirect => "Indirect",
        })
    }
}

/// Converts the X axis of a workspace.
///
/// Implementations fail with `UpstreamError::UnsupportedUnit` for
/// combinations they do not implement.
pub trait UnitConverter: Send + Sync {
    fn convert(
        &self, ws: &Workspace, target: XUnit, mode: ConversionMode, fixed_energy: Option<f64>,
    ) -> UpstreamResult<Workspace>;
}

/// Applies a [`MaskSpec`] with OR semantics: anything masked before stays
/// masked.
pub trait MaskingService: Send + Sync {
    fn mask(&self, ws: &Workspace, spec: &MaskSpec) -> UpstreamResult<Workspace>;
}

/// Stores tables and workspaces.
pub trait PersistenceService: Send + Sync {
    /// Save a table and return its identifier.
    fn save_table(&self, columns: &[&str], rows: &[Vec<f64>]) -> UpstreamResult<String>;

    fn save_workspace(&self, ws: &Workspace, path: &str) -> UpstreamResult<()>;
}

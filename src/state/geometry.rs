//! Instrument geometry: detector components and monitors.
//!
//! Purpose
//! -------
//! Describe which detector ids belong to which bank, how large the pixels
//! are, and where the monitors sit on the beam line. Geometry is data handed
//! in by an upstream definition parser; this module only validates it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each [`DetectorKind`] appears at most once and has a non-empty, closed id
//!   range `[first_id, last_id]`.
//! - Component id ranges never overlap.
//! - Monitor `z` positions are signed distances from the sample along the
//!   beam; upstream monitors have `z < 0`.
use crate::state::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruments with known default settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentId {
    Sans2d,
    Loq,
    Larmor,
    Zoom,
    /// Any other instrument; generic defaults apply.
    Generic,
}

/// Detector bank selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetectorKind {
    /// Low-angle (main, rear) bank.
    Lab,
    /// High-angle (front) bank.
    Hab,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DetectorKind::Lab => "LAB",
            DetectorKind::Hab => "HAB",
        })
    }
}

/// One detector bank.
///
/// Fields
/// ------
/// - `kind`: which bank.
/// - `first_id`, `last_id`: inclusive detector-id range.
/// - `pixel_width`, `pixel_height`: pixel size in metres, used for solid
///   angles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorComponent {
    pub kind: DetectorKind,
    pub first_id: u32,
    pub last_id: u32,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl DetectorComponent {
    pub fn contains(&self, detector_id: u32) -> bool {
        (self.first_id..=self.last_id).contains(&detector_id)
    }

    pub fn pixel_area(&self) -> f64 {
        self.pixel_width * self.pixel_height
    }
}

/// A beam monitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorSpec {
    /// Detector id of the monitor spectrum.
    pub id: u32,
    /// Signed position along the beam relative to the sample, in metres.
    pub z: f64,
}

/// Validated instrument geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentGeometry {
    pub instrument: InstrumentId,
    /// Moderator-to-sample distance in metres.
    pub l1: f64,
    pub components: Vec<DetectorComponent>,
    pub monitors: Vec<MonitorSpec>,
}

impl InstrumentGeometry {
    /// Build and validate a geometry.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::NonPositive` for a non-positive `l1` or pixel size.
    /// - `ConfigError::NoComponents` when `components` is empty.
    /// - `ConfigError::InvalidComponent` for duplicated kinds, empty ranges or
    ///   overlapping ranges.
    pub fn new(
        instrument: InstrumentId, l1: f64, components: Vec<DetectorComponent>,
        monitors: Vec<MonitorSpec>,
    ) -> ConfigResult<Self> {
        let geometry = InstrumentGeometry { instrument, l1, components, monitors };
        geometry.validate()?;
        Ok(geometry)
    }

    pub(crate) fn validate(&self) -> ConfigResult<()> {
        if !self.l1.is_finite() || self.l1 <= 0.0 {
            return Err(ConfigError::NonPositive { name: "l1", value: self.l1 });
        }
        if self.components.is_empty() {
            return Err(ConfigError::NoComponents);
        }
        for (i, c) in self.components.iter().enumerate() {
            let name = c.kind.to_string();
            if c.first_id > c.last_id {
                return Err(ConfigError::InvalidComponent { name, reason: "empty id range" });
            }
            for (label, value) in [("pixel_width", c.pixel_width), ("pixel_height", c.pixel_height)] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ConfigError::NonPositive { name: label, value });
                }
            }
            for other in &self.components[..i] {
                if other.kind == c.kind {
                    return Err(ConfigError::InvalidComponent { name, reason: "defined twice" });
                }
                if other.first_id <= c.last_id && c.first_id <= other.last_id {
                    return Err(ConfigError::InvalidComponent {
                        name,
                        reason: "id range overlaps another component",
                    });
                }
            }
        }
        Ok(())
    }

    pub fn component(&self, kind: DetectorKind) -> Option<&DetectorComponent> {
        self.components.iter().find(|c| c.kind == kind)
    }

    pub fn monitor(&self, id: u32) -> Option<&MonitorSpec> {
        self.monitors.iter().find(|m| m.id == id)
    }

    /// Fail with `MissingMonitor` unless `id` is a known monitor.
    pub fn require_monitor(&self, id: u32) -> ConfigResult<&MonitorSpec> {
        self.monitor(id).ok_or(ConfigError::MissingMonitor { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(kind: DetectorKind, first_id: u32, last_id: u32) -> DetectorComponent {
        DetectorComponent { kind, first_id, last_id, pixel_width: 0.005, pixel_height: 0.005 }
    }

    #[test]
    // Purpose
    // -------
    // Verify geometry validation of component id ranges.
    //
    // Given
    // -----
    // - Overlapping LAB/HAB ranges, a duplicated kind, and a valid layout.
    //
    // Expect
    // ------
    // - The first two are rejected with `InvalidComponent`; the valid layout
    //   resolves components and monitors by key.
    fn geometry_rejects_overlapping_and_duplicate_components() {
        let monitors = vec![MonitorSpec { id: 1, z: -5.0 }];
        let overlap = InstrumentGeometry::new(
            InstrumentId::Generic,
            10.0,
            vec![bank(DetectorKind::Lab, 100, 199), bank(DetectorKind::Hab, 150, 250)],
            monitors.clone(),
        );
        let duplicate = InstrumentGeometry::new(
            InstrumentId::Generic,
            10.0,
            vec![bank(DetectorKind::Lab, 100, 199), bank(DetectorKind::Lab, 200, 299)],
            monitors.clone(),
        );
        assert!(matches!(overlap, Err(ConfigError::InvalidComponent { .. })));
        assert!(matches!(duplicate, Err(ConfigError::InvalidComponent { reason: "defined twice", .. })));

        let ok = InstrumentGeometry::new(
            InstrumentId::Generic,
            10.0,
            vec![bank(DetectorKind::Lab, 100, 199), bank(DetectorKind::Hab, 200, 299)],
            monitors,
        )
        .unwrap();
        assert!(ok.component(DetectorKind::Hab).unwrap().contains(250));
        assert!(ok.require_monitor(1).is_ok());
        assert_eq!(ok.require_monitor(2), Err(ConfigError::MissingMonitor { id: 2 }));
    }
}

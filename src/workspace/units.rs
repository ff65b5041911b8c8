//! X-axis units carried by workspaces.
//!
//! [`XUnit`] is metadata only; conversions between units are performed by a
//! [`UnitConverter`](crate::services::UnitConverter) or by the Q1D step of the
//! reduction pipeline.
use crate::services::errors::UpstreamError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Unit of the X axis of every spectrum in a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XUnit {
    /// Time-of-flight in microseconds.
    TimeOfFlight,
    /// Neutron wavelength in ångström.
    Wavelength,
    /// Momentum transfer in inverse ångström.
    MomentumTransfer,
}

impl fmt::Display for XUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            XUnit::TimeOfFlight => "TOF",
            XUnit::Wavelength => "Wavelength",
            XUnit::MomentumTransfer => "MomentumTransfer",
        };
        f.write_str(name)
    }
}

impl FromStr for XUnit {
    type Err = UpstreamError;

    /// Parse a unit name (case-insensitive). Accepts `"tof"`, `"wavelength"`,
    /// `"momentumtransfer"` and the short alias `"q"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tof" | "timeofflight" => Ok(XUnit::TimeOfFlight),
            "wavelength" => Ok(XUnit::Wavelength),
            "momentumtransfer" | "q" => Ok(XUnit::MomentumTransfer),
            _ => Err(UpstreamError::UnknownUnit { name: s.to_string() }),
        }
    }
}

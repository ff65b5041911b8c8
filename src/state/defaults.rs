//! Per-instrument default settings.
//!
//! Lookups keyed on [`InstrumentId`]. Builders call these when a configuration
//! omits a value; nothing here is mutable or global.
use crate::{
    state::{
        geometry::InstrumentId,
        windows::{TofWindow, WavelengthRange},
    },
    workspace::rebin::StepType,
};

/// Default centre-finder annulus `(r_min, r_max)` in metres.
pub const CENTRE_RADIUS_LIMITS: (f64, f64) = (0.06, 0.28);

/// Default iteration budget for the beam-centre search.
pub const CENTRE_MAX_ITERATIONS: u64 = 10;

/// Default residual tolerance for the beam-centre search.
pub const CENTRE_TOLERANCE: f64 = 1.0e-4;

/// Default first step of the quadrant search in metres.
pub const CENTRE_STEP: f64 = 0.01;

/// Incident and transmission monitor ids.
pub fn monitor_ids(instrument: InstrumentId) -> (u32, u32) {
    match instrument {
        InstrumentId::Zoom => (3, 4),
        InstrumentId::Loq => (2, 3),
        InstrumentId::Sans2d | InstrumentId::Larmor | InstrumentId::Generic => (1, 3),
    }
}

/// Full wavelength range in Å.
pub fn wavelength_range(instrument: InstrumentId) -> WavelengthRange {
    let (min, max) = match instrument {
        InstrumentId::Sans2d => (2.0, 14.0),
        InstrumentId::Loq => (2.2, 10.0),
        InstrumentId::Larmor => (0.9, 13.5),
        InstrumentId::Zoom => (1.75, 16.5),
        InstrumentId::Generic => (1.0, 10.0),
    };
    WavelengthRange { min, max }
}

/// Wavelength step and spacing.
pub fn wavelength_step(instrument: InstrumentId) -> (f64, StepType) {
    match instrument {
        InstrumentId::Loq => (0.35, StepType::Linear),
        _ => (0.125, StepType::Linear),
    }
}

/// Flat-background TOF window (µs) applied to all monitors.
pub fn background_window(instrument: InstrumentId) -> Option<TofWindow> {
    let (start, stop) = match instrument {
        InstrumentId::Sans2d => (85_000.0, 98_000.0),
        InstrumentId::Loq => (31_000.0, 39_000.0),
        InstrumentId::Larmor => (80_000.0, 95_000.0),
        InstrumentId::Zoom => (85_000.0, 98_000.0),
        InstrumentId::Generic => return None,
    };
    Some(TofWindow { start, stop })
}

/// Prompt-peak TOF window (µs), for instruments that see one.
pub fn prompt_peak(instrument: InstrumentId) -> Option<TofWindow> {
    match instrument {
        InstrumentId::Loq => Some(TofWindow { start: 19_000.0, stop: 20_500.0 }),
        InstrumentId::Larmor => Some(TofWindow { start: 99_000.0, stop: 100_000.0 }),
        _ => None,
    }
}

//! Intervals and binning descriptions: TOF windows, wavelength ranges, Q
//! binning and time slices.
//!
//! Raw `(start, stop)` pairs arrive as [`WindowBounds`] with optional ends and
//! are promoted to validated [`TofWindow`] values, so half-specified or
//! inverted windows are rejected before any data is touched.
use crate::{
    state::errors::{ConfigError, ConfigResult},
    workspace::rebin::{make_edges, StepType},
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Optional `(start, stop)` pair as written in a configuration file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    #[serde(default)]
    pub start: Option<f64>,
    #[serde(default)]
    pub stop: Option<f64>,
}

/// Validated time-of-flight interval `[start, stop]` in µs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TofWindow {
    pub start: f64,
    pub stop: f64,
}

impl TofWindow {
    /// Validate a fully specified window.
    ///
    /// Errors
    /// ------
    /// - `ConfigError::NonFinite` for NaN or infinite bounds.
    /// - `ConfigError::InvertedWindow` when `start >= stop`.
    pub fn new(name: &'static str, start: f64, stop: f64) -> ConfigResult<Self> {
        for value in [start, stop] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { name, value });
            }
        }
        if start >= stop {
            return Err(ConfigError::InvertedWindow { name, start, stop });
        }
        Ok(TofWindow { start, stop })
    }

    /// Promote optional bounds: both absent gives `None`, one absent is a
    /// `HalfWindow` error.
    pub fn from_bounds(name: &'static str, bounds: WindowBounds) -> ConfigResult<Option<Self>> {
        match (bounds.start, bounds.stop) {
            (None, None) => Ok(None),
            (Some(start), Some(stop)) => TofWindow::new(name, start, stop).map(Some),
            _ => Err(ConfigError::HalfWindow { name }),
        }
    }

    pub fn width(&self) -> f64 {
        self.stop - self.start
    }
}

/// Where the flat monitor background is estimated.
///
/// The two forms are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackgroundWindow {
    /// One window for every monitor.
    Global(TofWindow),
    /// Windows keyed by monitor id; monitors without an entry are left alone.
    PerMonitor(BTreeMap<u32, TofWindow>),
}

impl BackgroundWindow {
    /// Combine the raw global and per-monitor forms.
    ///
    /// Errors
    /// ------
    /// - `HalfWindow` / `InvertedWindow` from any individual window.
    /// - `ConflictingBackground` when both forms are present.
    pub fn from_parts(
        global: WindowBounds, per_monitor: &BTreeMap<u32, WindowBounds>,
    ) -> ConfigResult<Option<Self>> {
        let global = TofWindow::from_bounds("background", global)?;
        let mut map = BTreeMap::new();
        for (&id, &bounds) in per_monitor {
            if let Some(w) = TofWindow::from_bounds("monitor background", bounds)? {
                map.insert(id, w);
            }
        }
        match (global, map.is_empty()) {
            (Some(_), false) => Err(ConfigError::ConflictingBackground),
            (Some(g), true) => Ok(Some(BackgroundWindow::Global(g))),
            (None, false) => Ok(Some(BackgroundWindow::PerMonitor(map))),
            (None, true) => Ok(None),
        }
    }

    /// Window that applies to monitor `id`, if any.
    pub fn for_monitor(&self, id: u32) -> Option<TofWindow> {
        match self {
            BackgroundWindow::Global(w) => Some(*w),
            BackgroundWindow::PerMonitor(map) => map.get(&id).copied(),
        }
    }
}

/// Wavelength interval in Å.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavelengthRange {
    pub min: f64,
    pub max: f64,
}

impl WavelengthRange {
    pub fn new(min: f64, max: f64) -> ConfigResult<Self> {
        let w = TofWindow::new("wavelength", min, max)?;
        if w.start <= 0.0 {
            return Err(ConfigError::NonPositive { name: "wavelength min", value: min });
        }
        Ok(WavelengthRange { min, max })
    }

    /// Output-name fragment such as `"2.0_14.0"`.
    pub fn label(&self) -> String {
        format!("{:.1}_{:.1}", self.min, self.max)
    }
}

/// Wavelength grid: the full range, its step, and the sub-ranges reduced
/// separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavelengthBinning {
    pub full: WavelengthRange,
    pub step: f64,
    pub step_type: StepType,
    /// Additional ranges, each inside `full`. Empty means only `full`.
    #[serde(default)]
    pub ranges: Vec<WavelengthRange>,
}

impl WavelengthBinning {
    pub fn new(
        full: WavelengthRange, step: f64, step_type: StepType, ranges: Vec<WavelengthRange>,
    ) -> ConfigResult<Self> {
        let binning = WavelengthBinning { full, step, step_type, ranges };
        binning.validate()?;
        Ok(binning)
    }

    pub(crate) fn validate(&self) -> ConfigResult<()> {
        WavelengthRange::new(self.full.min, self.full.max)?;
        self.edges(self.full)?;
        for r in &self.ranges {
            WavelengthRange::new(r.min, r.max)?;
            if r.min < self.full.min || r.max > self.full.max {
                return Err(ConfigError::RangeOutsideFull {
                    min: r.min,
                    max: r.max,
                    full_min: self.full.min,
                    full_max: self.full.max,
                });
            }
        }
        Ok(())
    }

    /// Bin edges for `range` using this grid's step.
    pub fn edges(&self, range: WavelengthRange) -> ConfigResult<Array1<f64>> {
        Ok(make_edges(range.min, range.max, self.step, self.step_type)?)
    }

    /// The full range followed by every distinct sub-range.
    pub fn all_ranges(&self) -> Vec<WavelengthRange> {
        let mut out = vec![self.full];
        for r in &self.ranges {
            if !out.contains(r) {
                out.push(*r);
            }
        }
        out
    }
}

/// Momentum-transfer binning for the Q1D step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QBinning {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub step_type: StepType,
}

impl QBinning {
    /// Validate by generating the edges once.
    pub fn new(min: f64, max: f64, step: f64, step_type: StepType) -> ConfigResult<Self> {
        let q = QBinning { min, max, step, step_type };
        q.edges()?;
        Ok(q)
    }

    pub fn edges(&self) -> ConfigResult<Array1<f64>> {
        Ok(make_edges(self.min, self.max, self.step, self.step_type)?)
    }
}

/// Pulse-time slice `[start, stop)` in seconds since run start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSlice {
    pub start: f64,
    pub stop: f64,
}

impl TimeSlice {
    pub fn new(start: f64, stop: f64) -> ConfigResult<Self> {
        TofWindow::new("time slice", start, stop)?;
        Ok(TimeSlice { start, stop })
    }

    pub fn contains(&self, pulse_time: f64) -> bool {
        pulse_time >= self.start && pulse_time < self.stop
    }

    pub fn label(&self) -> String {
        format!("t{:.1}_{:.1}", self.start, self.stop)
    }
}

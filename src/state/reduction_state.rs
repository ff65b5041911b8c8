//! ReductionState — the validated, immutable configuration of one reduction.
//!
//! Purpose
//! -------
//! Collect everything the pipeline reads (geometry, wavelength and Q grids,
//! normalization windows, masks, scaling, adjustments, beam centres, merge
//! policy, run options) into one value that is built and validated once and
//! then passed by shared reference.
//!
//! Key behaviors
//! -------------
//! - [`ReductionState::new`] promotes a raw [`StateConfig`] into validated
//!   option groups, filling omitted values from
//!   [`defaults`](crate::state::defaults).
//! - [`ReductionState::from_json`] deserializes a [`StateConfig`] with
//!   `serde_json` and then runs the same validation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every monitor referenced by normalization or transmission exists in the
//!   geometry.
//! - Wide-angle correction implies a transmission configuration.
//! - Wavelength sub-ranges lie within the full range; Q binning yields at
//!   least one bin.
use crate::{
    state::{
        defaults,
        errors::{ConfigError, ConfigResult},
        geometry::InstrumentGeometry,
        options::{
            AdjustmentOptions, BeamCentres, MaskSpec, MergeOptions, NormalizationOptions,
            ReductionOptions, ScaleOptions,
        },
        windows::{BackgroundWindow, QBinning, TofWindow, WavelengthBinning, WavelengthRange, WindowBounds},
    },
    workspace::rebin::StepType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Raw wavelength settings; omitted fields fall back to instrument defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WavelengthConfig {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub step_type: Option<StepType>,
    #[serde(default)]
    pub ranges: Vec<WavelengthRange>,
}

/// Raw normalization settings with optional window bounds.
///
/// Fields
/// ------
/// - `incident_monitor`: defaults to the instrument's incident monitor.
/// - `background`, `per_monitor_background`: mutually exclusive forms.
/// - `prompt_peak`: optional contamination window.
/// - `use_instrument_windows`: when no window is given, take the
///   instrument's default background and prompt-peak windows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    #[serde(default)]
    pub incident_monitor: Option<u32>,
    #[serde(default)]
    pub background: WindowBounds,
    #[serde(default)]
    pub per_monitor_background: BTreeMap<u32, WindowBounds>,
    #[serde(default)]
    pub prompt_peak: WindowBounds,
    #[serde(default)]
    pub use_instrument_windows: bool,
}

/// Unvalidated configuration as produced by an upstream parser or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    pub geometry: InstrumentGeometry,
    #[serde(default)]
    pub wavelength: WavelengthConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub mask: MaskSpec,
    #[serde(default)]
    pub scale: ScaleOptions,
    #[serde(default)]
    pub adjustment: AdjustmentOptions,
    pub q_binning: QBinning,
    #[serde(default)]
    pub beam_centre: BeamCentres,
    #[serde(default)]
    pub merge: MergeOptions,
    pub reduction: ReductionOptions,
}

/// Validated per-run configuration. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ReductionState {
    pub geometry: InstrumentGeometry,
    pub wavelength: WavelengthBinning,
    pub normalization: NormalizationOptions,
    pub mask: MaskSpec,
    pub scale: ScaleOptions,
    pub adjustment: AdjustmentOptions,
    pub q_binning: QBinning,
    pub beam_centre: BeamCentres,
    pub merge: MergeOptions,
    pub reduction: ReductionOptions,
}

impl ReductionState {
    /// Validate `config` and build the state.
    ///
    /// Errors
    /// ------
    /// - Any [`ConfigError`] raised by the option groups.
    /// - `ConfigError::MissingMonitor` when the incident or transmission
    ///   monitors are not part of the geometry.
    /// - `ConfigError::WideAngleWithoutTransmission`.
    pub fn new(config: StateConfig) -> ConfigResult<Self> {
        let StateConfig {
            geometry,
            wavelength,
            normalization,
            mask,
            scale,
            adjustment,
            q_binning,
            beam_centre,
            merge,
            reduction,
        } = config;
        geometry.validate()?;
        let instrument = geometry.instrument;

        let wavelength = build_wavelength(instrument, wavelength)?;
        let normalization = build_normalization(&geometry, normalization)?;

        mask.validate()?;
        scale.validate()?;
        if let Some(curve) = &adjustment.wavelength_correction {
            curve.validate()?;
        }
        if let Some(t) = &adjustment.transmission {
            geometry.require_monitor(t.incident_monitor)?;
            geometry.require_monitor(t.transmission_monitor)?;
        }
        if adjustment.wide_angle_correction && adjustment.transmission.is_none() {
            return Err(ConfigError::WideAngleWithoutTransmission);
        }
        let q_binning = QBinning::new(q_binning.min, q_binning.max, q_binning.step, q_binning.step_type)?;
        if let Some(r) = merge.fit_range {
            TofWindow::new("merge fit range", r.min, r.max)?;
        }
        for slice in &reduction.time_slices {
            TofWindow::new("time slice", slice.start, slice.stop)?;
        }

        tracing::debug!(
            instrument = ?instrument,
            ranges = wavelength.all_ranges().len(),
            slices = reduction.time_slices.len(),
            "reduction state validated"
        );
        Ok(ReductionState {
            geometry,
            wavelength,
            normalization,
            mask,
            scale,
            adjustment,
            q_binning,
            beam_centre,
            merge,
            reduction,
        })
    }

    /// Deserialize a [`StateConfig`] from JSON, then validate it.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        let config: StateConfig = serde_json::from_str(text)?;
        ReductionState::new(config)
    }
}

fn build_wavelength(
    instrument: crate::state::geometry::InstrumentId, raw: WavelengthConfig,
) -> ConfigResult<WavelengthBinning> {
    let default_range = defaults::wavelength_range(instrument);
    let (default_step, default_type) = defaults::wavelength_step(instrument);
    let min = raw.min.unwrap_or(default_range.min);
    let max = raw.max.unwrap_or(default_range.max);
    let step = raw.step.unwrap_or(default_step);
    if !step.is_finite() || step <= 0.0 {
        return Err(ConfigError::NonPositive { name: "wavelength step", value: step });
    }
    WavelengthBinning::new(
        WavelengthRange::new(min, max)?,
        step,
        raw.step_type.unwrap_or(default_type),
        raw.ranges,
    )
}

fn build_normalization(
    geometry: &InstrumentGeometry, raw: NormalizationConfig,
) -> ConfigResult<NormalizationOptions> {
    let instrument = geometry.instrument;
    let incident_monitor = raw.incident_monitor.unwrap_or(defaults::monitor_ids(instrument).0);
    geometry.require_monitor(incident_monitor)?;
    for &id in raw.per_monitor_background.keys() {
        geometry.require_monitor(id)?;
    }

    let mut background = BackgroundWindow::from_parts(raw.background, &raw.per_monitor_background)?;
    let mut prompt_peak = TofWindow::from_bounds("prompt peak", raw.prompt_peak)?;
    if raw.use_instrument_windows {
        if background.is_none() {
            background = defaults::background_window(instrument).map(BackgroundWindow::Global);
        }
        if prompt_peak.is_none() {
            prompt_peak = defaults::prompt_peak(instrument);
        }
    }
    Ok(NormalizationOptions { incident_monitor, background, prompt_peak })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        geometry::{DetectorComponent, DetectorKind, InstrumentId, MonitorSpec},
        options::{TransmissionFit, TransmissionOptions},
    };

    fn config() -> StateConfig {
        StateConfig {
            geometry: InstrumentGeometry {
                instrument: InstrumentId::Sans2d,
                l1: 10.0,
                components: vec![DetectorComponent {
                    kind: DetectorKind::Lab,
                    first_id: 100,
                    last_id: 499,
                    pixel_width: 0.005,
                    pixel_height: 0.005,
                }],
                monitors: vec![MonitorSpec { id: 1, z: -5.0 }, MonitorSpec { id: 3, z: -1.0 }],
            },
            wavelength: WavelengthConfig::default(),
            normalization: NormalizationConfig::default(),
            mask: MaskSpec::default(),
            scale: ScaleOptions::default(),
            adjustment: AdjustmentOptions::default(),
            q_binning: QBinning { min: 0.001, max: 0.04, step: 0.001, step_type: StepType::Linear },
            beam_centre: BeamCentres::default(),
            merge: MergeOptions::default(),
            reduction: ReductionOptions::new("SANS2D0001"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that omitted settings are filled from instrument defaults.
    //
    // Given
    // -----
    // - A SANS2D config with no wavelength, incident monitor or windows, but
    //   `use_instrument_windows` set.
    //
    // Expect
    // ------
    // - Wavelength 2–14 Å, incident monitor 1, global background window.
    fn new_fills_instrument_defaults() {
        let mut cfg = config();
        cfg.normalization.use_instrument_windows = true;
        let state = ReductionState::new(cfg).unwrap();

        assert_eq!(state.wavelength.full, WavelengthRange { min: 2.0, max: 14.0 });
        assert_eq!(state.normalization.incident_monitor, 1);
        assert!(matches!(state.normalization.background, Some(BackgroundWindow::Global(_))));
        assert_eq!(state.normalization.prompt_peak, None);
    }

    #[test]
    // Purpose
    // -------
    // Verify the cross-group checks run at construction.
    //
    // Given
    // -----
    // - An unknown incident monitor; wide angle without transmission; a
    //   transmission monitor that does not exist; an inverted Q grid.
    //
    // Expect
    // ------
    // - Each is rejected with the matching `ConfigError`.
    fn new_rejects_inconsistent_configuration() {
        let mut missing = config();
        missing.normalization.incident_monitor = Some(9);
        assert_eq!(ReductionState::new(missing), Err(ConfigError::MissingMonitor { id: 9 }));

        let mut wide = config();
        wide.adjustment.wide_angle_correction = true;
        assert_eq!(ReductionState::new(wide), Err(ConfigError::WideAngleWithoutTransmission));

        let mut trans = config();
        trans.adjustment.transmission = Some(TransmissionOptions {
            incident_monitor: 1,
            transmission_monitor: 4,
            fit: TransmissionFit::Log,
        });
        assert_eq!(ReductionState::new(trans), Err(ConfigError::MissingMonitor { id: 4 }));

        let mut q = config();
        q.q_binning.min = 0.5;
        assert!(matches!(ReductionState::new(q), Err(ConfigError::Binning(_))));

        let mut both = config();
        both.normalization.background = WindowBounds { start: Some(1.0), stop: Some(2.0) };
        both.normalization
            .per_monitor_background
            .insert(1, WindowBounds { start: Some(1.0), stop: Some(2.0) });
        assert_eq!(ReductionState::new(both), Err(ConfigError::ConflictingBackground));
    }

    #[test]
    // Purpose
    // -------
    // Verify JSON deserialization followed by validation.
    //
    // Given
    // -----
    // - The test config serialized to JSON, and the same JSON with a
    //   half-specified prompt-peak window.
    //
    // Expect
    // ------
    // - The first round-trips into an equal state; the second fails with
    //   `HalfWindow`.
    fn from_json_validates_after_parsing() {
        let json = serde_json::to_string(&config()).unwrap();
        let state = ReductionState::from_json(&json).unwrap();
        assert_eq!(state, ReductionState::new(config()).unwrap());

        let mut half = config();
        half.normalization.prompt_peak = WindowBounds { start: Some(100.0), stop: None };
        let json = serde_json::to_string(&half).unwrap();
        assert_eq!(
            ReductionState::from_json(&json),
            Err(ConfigError::HalfWindow { name: "prompt peak" })
        );
        assert!(matches!(ReductionState::from_json("{"), Err(ConfigError::Malformed { .. })));
    }
}

//! Per-stage option groups held by [`ReductionState`](super::ReductionState).
//!
//! Purpose
//! -------
//! Replace string-typed "kind" settings with closed enums and keep each
//! stage's knobs in one small struct: normalization, masking, scaling,
//! adjustments, merging and the run-level reduction options.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each group validates its own numeric constraints in `validate`; cross
//!   group checks (monitor existence, wide angle needs transmission) live in
//!   [`ReductionState::new`](super::ReductionState::new).
use crate::state::{
    errors::{ConfigError, ConfigResult},
    geometry::DetectorKind,
    windows::{BackgroundWindow, TimeSlice, TofWindow},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---- Normalization ----------------------------------------------------------

/// Monitor normalization settings.
///
/// Fields
/// ------
/// - `incident_monitor`: detector id of the incident-beam monitor.
/// - `background`: optional flat-background window (global or per monitor).
/// - `prompt_peak`: optional TOF interval contaminated by the source pulse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationOptions {
    pub incident_monitor: u32,
    pub background: Option<BackgroundWindow>,
    pub prompt_peak: Option<TofWindow>,
}

// ---- Masking ------------------------------------------------------------------

/// Detector-plane quadrant around the beam centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    Left,
    Right,
    Top,
    Bottom,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant::Left, Quadrant::Right, Quadrant::Top, Quadrant::Bottom];

    /// `true` when the point `(x, y)` lies strictly inside this quadrant.
    /// Points on either diagonal belong to no quadrant.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            Quadrant::Right => x > y.abs(),
            Quadrant::Left => -x > y.abs(),
            Quadrant::Top => y > x.abs(),
            Quadrant::Bottom => -y > x.abs(),
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quadrant::Left => "Left",
            Quadrant::Right => "Right",
            Quadrant::Top => "Top",
            Quadrant::Bottom => "Bottom",
        })
    }
}

/// Geometric mask in the detector plane. Coordinates are metres in the
/// frame where the beam centre is the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaskShape {
    /// Mask pixels within `radius` of `centre`.
    Disk { centre: [f64; 2], radius: f64 },
    /// Mask pixels farther than `radius` from `centre`.
    OutsideDisk { centre: [f64; 2], radius: f64 },
    /// Mask a strip of full `width` through `origin` at `angle_deg` from +x
    /// (beam-stop arm).
    Line { origin: [f64; 2], angle_deg: f64, width: f64 },
    /// Keep only `Quadrant`; everything else (diagonals included) is masked.
    KeepQuadrant(Quadrant),
}

impl MaskShape {
    /// `true` when the pixel at `(x, y)` is masked by this shape.
    pub fn masks(&self, x: f64, y: f64) -> bool {
        match self {
            MaskShape::Disk { centre, radius } => {
                (x - centre[0]).hypot(y - centre[1]) <= *radius
            }
            MaskShape::OutsideDisk { centre, radius } => {
                (x - centre[0]).hypot(y - centre[1]) > *radius
            }
            MaskShape::Line { origin, angle_deg, width } => {
                let (s, c) = angle_deg.to_radians().sin_cos();
                let distance = ((x - origin[0]) * s - (y - origin[1]) * c).abs();
                distance <= 0.5 * width
            }
            MaskShape::KeepQuadrant(q) => !q.contains(x, y),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        let (name, value) = match self {
            MaskShape::Disk { radius, .. } | MaskShape::OutsideDisk { radius, .. } => {
                ("mask radius", *radius)
            }
            MaskShape::Line { width, .. } => ("mask line width", *width),
            MaskShape::KeepQuadrant(_) => return Ok(()),
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::NonPositive { name, value });
        }
        Ok(())
    }
}

/// Masking rules combined with OR semantics.
///
/// Fields
/// ------
/// - `detector_ids`: whole detectors to mask.
/// - `shapes`: geometric masks applied in the moved frame.
/// - `time_windows`: TOF intervals masked in every spectrum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaskSpec {
    #[serde(default)]
    pub detector_ids: BTreeSet<u32>,
    #[serde(default)]
    pub shapes: Vec<MaskShape>,
    #[serde(default)]
    pub time_windows: Vec<TofWindow>,
}

impl MaskSpec {
    pub fn is_empty(&self) -> bool {
        self.detector_ids.is_empty() && self.shapes.is_empty() && self.time_windows.is_empty()
    }

    /// This spec plus `extra` shapes.
    pub fn with_shapes(&self, extra: &[MaskShape]) -> MaskSpec {
        let mut out = self.clone();
        out.shapes.extend_from_slice(extra);
        out
    }

    pub(crate) fn validate(&self) -> ConfigResult<()> {
        self.shapes.iter().try_for_each(MaskShape::validate)?;
        for w in &self.time_windows {
            TofWindow::new("time mask", w.start, w.stop)?;
        }
        Ok(())
    }
}

// ---- Scaling ------------------------------------------------------------------

/// Sample geometry used for the volume normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleShape {
    /// Cylinder with its axis vertical: `π (w/2)² h`.
    Cylinder,
    /// Flat plate: `w h t`.
    FlatPlate,
    /// Disc with its axis along the beam: `π (w/2)² t`.
    Disc,
}

/// Absolute scale and sample dimensions (cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleOptions {
    pub absolute_scale: f64,
    pub shape: SampleShape,
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
}

impl ScaleOptions {
    pub fn volume(&self) -> f64 {
        let radius = 0.5 * self.width;
        match self.shape {
            SampleShape::Cylinder => std::f64::consts::PI * radius * radius * self.height,
            SampleShape::FlatPlate => self.width * self.height * self.thickness,
            SampleShape::Disc => std::f64::consts::PI * radius * radius * self.thickness,
        }
    }

    /// Multiplier applied to the counts: `absolute_scale / volume`.
    pub fn factor(&self) -> f64 {
        self.absolute_scale / self.volume()
    }

    pub(crate) fn validate(&self) -> ConfigResult<()> {
        for (name, value) in [
            ("absolute scale", self.absolute_scale),
            ("sample width", self.width),
            ("sample height", self.height),
            ("sample thickness", self.thickness),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        Ok(())
    }
}

impl Default for ScaleOptions {
    fn default() -> Self {
        ScaleOptions {
            absolute_scale: 1.0,
            shape: SampleShape::Disc,
            width: 1.0,
            height: 1.0,
            thickness: 1.0,
        }
    }
}

// ---- Adjustments --------------------------------------------------------------

/// Tabulated wavelength-dependent correction, linearly interpolated and held
/// constant beyond its ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionCurve {
    pub wavelength: Vec<f64>,
    pub factor: Vec<f64>,
}

impl CorrectionCurve {
    pub fn new(wavelength: Vec<f64>, factor: Vec<f64>) -> ConfigResult<Self> {
        let curve = CorrectionCurve { wavelength, factor };
        curve.validate()?;
        Ok(curve)
    }

    pub(crate) fn validate(&self) -> ConfigResult<()> {
        if self.wavelength.is_empty() || self.wavelength.len() != self.factor.len() {
            return Err(ConfigError::InvalidCorrectionCurve {
                reason: "wavelength and factor must be non-empty and of equal length",
            });
        }
        if self.wavelength.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ConfigError::InvalidCorrectionCurve {
                reason: "wavelength points must be strictly ascending",
            });
        }
        if self.factor.iter().any(|f| !f.is_finite()) {
            return Err(ConfigError::InvalidCorrectionCurve { reason: "factors must be finite" });
        }
        Ok(())
    }

    /// Interpolated factor at `lambda`.
    pub fn at(&self, lambda: f64) -> f64 {
        let n = self.wavelength.len();
        if lambda <= self.wavelength[0] {
            return self.factor[0];
        }
        if lambda >= self.wavelength[n - 1] {
            return self.factor[n - 1];
        }
        let hi = self.wavelength.partition_point(|&w| w <= lambda);
        let (x0, x1) = (self.wavelength[hi - 1], self.wavelength[hi]);
        let (f0, f1) = (self.factor[hi - 1], self.factor[hi]);
        f0 + (f1 - f0) * (lambda - x0) / (x1 - x0)
    }
}

/// Model fitted to the measured transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransmissionFit {
    /// Use the measured ratio bin by bin.
    #[default]
    None,
    /// `T(λ) = a + bλ`.
    Linear,
    /// `ln T(λ) = a + bλ`.
    Log,
}

/// Transmission calculation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransmissionOptions {
    pub incident_monitor: u32,
    pub transmission_monitor: u32,
    #[serde(default)]
    pub fit: TransmissionFit,
}

/// Inputs for the pixel, wavelength and wide-angle adjustments.
///
/// Fields
/// ------
/// - `flood`: per-detector efficiency; missing entries count as 1.
/// - `wavelength_correction`: detector efficiency curve in λ.
/// - `transmission`: enables the transmission factor (needs transmission
///   and direct runs at load time).
/// - `wide_angle_correction`: enables the pixel-and-wavelength transmission
///   path-length correction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentOptions {
    #[serde(default)]
    pub flood: Option<BTreeMap<u32, f64>>,
    #[serde(default)]
    pub wavelength_correction: Option<CorrectionCurve>,
    #[serde(default)]
    pub transmission: Option<TransmissionOptions>,
    #[serde(default)]
    pub wide_angle_correction: bool,
}

// ---- Merging ------------------------------------------------------------------

/// How the HAB-to-LAB scale and shift are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FitPolicy {
    /// Use the given values verbatim.
    NoFit { scale: f64, shift: f64 },
    /// Fit scale and shift together.
    Both,
    /// Fix the scale, fit the shift.
    ShiftOnly { scale: f64 },
    /// Fix the shift, fit the scale.
    ScaleOnly { shift: f64 },
}

impl fmt::Display for FitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FitPolicy::NoFit { .. } => "NoFit",
            FitPolicy::Both => "Both",
            FitPolicy::ShiftOnly { .. } => "ShiftOnly",
            FitPolicy::ScaleOnly { .. } => "ScaleOnly",
        })
    }
}

/// Q interval (Å⁻¹).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QRange {
    pub min: f64,
    pub max: f64,
}

impl QRange {
    pub fn contains(&self, q: f64) -> bool {
        q >= self.min && q <= self.max
    }
}

/// Bank merge settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeOptions {
    pub policy: FitPolicy,
    /// Restrict the fit to this Q interval.
    #[serde(default)]
    pub fit_range: Option<QRange>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions { policy: FitPolicy::Both, fit_range: None }
    }
}

// ---- Run-level ----------------------------------------------------------------

/// Which banks to reduce and whether to merge them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReductionMode {
    #[default]
    Lab,
    Hab,
    /// Reduce both banks and merge them.
    Merged,
    /// Reduce both banks, keep them, and also merge them.
    All,
}

impl ReductionMode {
    pub fn components(&self) -> Vec<DetectorKind> {
        match self {
            ReductionMode::Lab => vec![DetectorKind::Lab],
            ReductionMode::Hab => vec![DetectorKind::Hab],
            ReductionMode::Merged | ReductionMode::All => vec![DetectorKind::Lab, DetectorKind::Hab],
        }
    }

    pub fn merges(&self) -> bool {
        matches!(self, ReductionMode::Merged | ReductionMode::All)
    }
}

/// Sample or can (empty container) measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    Sample,
    Can,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataType::Sample => "sample",
            DataType::Can => "can",
        })
    }
}

/// Beam centre `(position_1, position_2)` in metres for one bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BeamCentre {
    pub x: f64,
    pub y: f64,
}

/// Beam centre per bank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BeamCentres {
    pub lab: BeamCentre,
    pub hab: BeamCentre,
}

impl BeamCentres {
    pub fn get(&self, kind: DetectorKind) -> BeamCentre {
        match kind {
            DetectorKind::Lab => self.lab,
            DetectorKind::Hab => self.hab,
        }
    }
}

/// Run identifiers, output mode and slicing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReductionOptions {
    pub sample_run: String,
    #[serde(default)]
    pub can_run: Option<String>,
    #[serde(default)]
    pub mode: ReductionMode,
    /// Pulse-time slices; empty means the whole run.
    #[serde(default)]
    pub time_slices: Vec<TimeSlice>,
    /// Produce legacy-compatible mask flags after wavelength conversion.
    #[serde(default)]
    pub compatibility: bool,
    /// Directory prefix for persisted outputs; `None` skips saving.
    #[serde(default)]
    pub save_prefix: Option<String>,
}

impl ReductionOptions {
    pub fn new(sample_run: impl Into<String>) -> Self {
        ReductionOptions {
            sample_run: sample_run.into(),
            can_run: None,
            mode: ReductionMode::default(),
            time_slices: Vec::new(),
            compatibility: false,
            save_prefix: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Verify that quadrant membership is strict, so diagonal pixels belong
    // to no quadrant and the four quadrants are disjoint.
    //
    // Given
    // -----
    // - Points on the axes, on a diagonal, and at the origin.
    //
    // Expect
    // ------
    // - Axis points belong to exactly one quadrant; diagonal and origin
    //   points to none.
    fn quadrants_are_strict_and_disjoint() {
        let count = |x: f64, y: f64| Quadrant::ALL.iter().filter(|q| q.contains(x, y)).count();
        assert!(Quadrant::Right.contains(1.0, 0.2));
        assert!(Quadrant::Top.contains(0.0, 1.0));
        assert_eq!(count(1.0, 0.0), 1);
        assert_eq!(count(1.0, 1.0), 0);
        assert_eq!(count(-2.0, 2.0), 0);
        assert_eq!(count(0.0, 0.0), 0);
    }

    #[test]
    fn mask_shapes_cover_expected_pixels() {
        let disk = MaskShape::Disk { centre: [0.0, 0.0], radius: 0.01 };
        let outside = MaskShape::OutsideDisk { centre: [0.0, 0.0], radius: 0.01 };
        let arm = MaskShape::Line { origin: [0.0, 0.0], angle_deg: 90.0, width: 0.004 };
        assert!(disk.masks(0.005, 0.005));
        assert!(!outside.masks(0.005, 0.005));
        assert!(outside.masks(0.02, 0.0));
        assert!(arm.masks(0.001, 0.5));
        assert!(!arm.masks(0.003, 0.5));
        assert!(MaskShape::KeepQuadrant(Quadrant::Left).masks(1.0, 0.0));
    }

    #[test]
    // Purpose
    // -------
    // Verify volume formulas for each sample shape.
    //
    // Given
    // -----
    // - Width 2, height 3, thickness 0.5.
    //
    // Expect
    // ------
    // - Cylinder 3π, flat plate 3, disc π/2.
    fn sample_volumes() {
        let mut opts = ScaleOptions {
            absolute_scale: 2.0,
            shape: SampleShape::Cylinder,
            width: 2.0,
            height: 3.0,
            thickness: 0.5,
        };
        assert_relative_eq!(opts.volume(), 3.0 * std::f64::consts::PI, epsilon = 1e-12);
        opts.shape = SampleShape::FlatPlate;
        assert_relative_eq!(opts.volume(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(opts.factor(), 2.0 / 3.0, epsilon = 1e-12);
        opts.shape = SampleShape::Disc;
        assert_relative_eq!(opts.volume(), 0.5 * std::f64::consts::PI, epsilon = 1e-12);
    }

    #[test]
    fn correction_curve_interpolates_and_clamps() {
        let curve = CorrectionCurve::new(vec![2.0, 4.0], vec![1.0, 3.0]).unwrap();
        assert_relative_eq!(curve.at(3.0), 2.0);
        assert_relative_eq!(curve.at(1.0), 1.0);
        assert_relative_eq!(curve.at(9.0), 3.0);
        assert!(CorrectionCurve::new(vec![2.0, 2.0], vec![1.0, 1.0]).is_err());
    }
}

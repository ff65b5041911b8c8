//! Integration tests for the reduction pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path: a validated state, runs served by the
//!   in-memory loader, concurrent per-bank reduction, can subtraction, bank
//!   merge and persistence.
//! - Locate the beam centre of the same synthetic instrument.
//!
//! Coverage
//! --------
//! - `orchestration::run_reduction` in `All` mode with a can run.
//! - `merge` with the `Both` policy on reduced, can-subtracted banks.
//! - `centre::find_centre` with both methods.
//!
//! Exclusions
//! ----------
//! - Step-level numerics (normalization windows, transmission, wide-angle
//!   factors); those are covered by unit tests.
//! - Python bindings.
use approx::assert_relative_eq;
use ndarray::Array1;
use sans_reduction::{
    centre::{find_centre, CentreMethod, CentreOptions},
    orchestration::run_reduction,
    reduction::ReductionServices,
    services::{
        converter::ElasticConverter,
        masker::DetectorMasker,
        memory::{InMemoryLoader, MemoryStore},
        traits::LoadedRun,
    },
    state::{
        geometry::{DetectorComponent, DetectorKind, InstrumentGeometry, InstrumentId, MonitorSpec},
        options::{
            AdjustmentOptions, BeamCentres, FitPolicy, MaskSpec, MergeOptions, ReductionMode, ReductionOptions,
            ScaleOptions,
        },
        reduction_state::{NormalizationConfig, ReductionState, StateConfig, WavelengthConfig},
        windows::QBinning,
    },
    workspace::{
        matrix::Workspace,
        rebin::StepType,
        spectrum::{Histogram, Spectrum},
        units::XUnit,
    },
};

const PITCH: f64 = 0.005;
const SIDE: u32 = 16;

const SERVICES: ReductionServices<'static> =
    ReductionServices { converter: &ElasticConverter, masker: &DetectorMasker };

fn bank(kind: DetectorKind, first_id: u32) -> DetectorComponent {
    DetectorComponent { kind, first_id, last_id: first_id + SIDE * SIDE - 1, pixel_width: PITCH, pixel_height: PITCH }
}

fn config(mode: ReductionMode, can: Option<&str>) -> StateConfig {
    let mut reduction = ReductionOptions::new("SAMPLE");
    reduction.mode = mode;
    reduction.can_run = can.map(str::to_string);
    reduction.save_prefix = Some("reduced".to_string());
    StateConfig {
        geometry: InstrumentGeometry {
            instrument: InstrumentId::Sans2d,
            l1: 10.0,
            components: vec![bank(DetectorKind::Lab, 1000), bank(DetectorKind::Hab, 5000)],
            monitors: vec![MonitorSpec { id: 1, z: -5.0 }],
        },
        wavelength: WavelengthConfig {
            min: Some(3.0),
            max: Some(8.0),
            step: Some(0.25),
            step_type: Some(StepType::Linear),
            ranges: Vec::new(),
        },
        normalization: NormalizationConfig::default(),
        mask: MaskSpec::default(),
        scale: ScaleOptions::default(),
        adjustment: AdjustmentOptions::default(),
        q_binning: QBinning { min: 0.001, max: 0.03, step: 0.001, step_type: StepType::Linear },
        beam_centre: BeamCentres::default(),
        merge: MergeOptions { policy: FitPolicy::Both, fit_range: None },
        reduction,
    }
}

/// Ring-shaped scattering centred on the beam: counts per TOF bin.
fn pattern(x: f64, y: f64) -> f64 {
    let r = x.hypot(y);
    20.0 + 500.0 * (-(r - 0.02).powi(2) / (2.0 * 0.01f64.powi(2))).exp()
}

fn monitors() -> Workspace {
    let edges = Array1::from_iter((0..=58).map(|i| 1000.0 + 500.0 * f64::from(i)));
    let h = Histogram::from_counts(edges, Array1::from_elem(58, 2000.0)).unwrap();
    Workspace::new(XUnit::TimeOfFlight, 10.0, vec![Spectrum::histogram(1, [0.0, 0.0, -5.0], h)])
}

/// Both banks see the same pattern at 4 m; HAB is `hab_scale` times
/// brighter, and everything is multiplied by `level`.
fn run(level: f64, hab_scale: f64) -> LoadedRun {
    let tof = Array1::from_iter((0..=20).map(|i| 10_000.0 + 1000.0 * f64::from(i)));
    let offset = 0.5 * f64::from(SIDE - 1);
    let mut spectra = Vec::new();
    for (first_id, scale) in [(1000, 1.0), (5000, hab_scale)] {
        for j in 0..SIDE {
            for i in 0..SIDE {
                let position = [(f64::from(i) - offset) * PITCH, (f64::from(j) - offset) * PITCH, 4.0];
                let counts = level * scale * pattern(position[0], position[1]);
                let h = Histogram::from_counts(tof.clone(), Array1::from_elem(20, counts)).unwrap();
                spectra.push(Spectrum::histogram(first_id + j * SIDE + i, position, h));
            }
        }
    }
    LoadedRun {
        counts: Workspace::new(XUnit::TimeOfFlight, 10.0, spectra),
        monitors: monitors(),
        transmission: None,
        direct: None,
    }
}

#[test]
// Purpose
// -------
// Reduce, subtract, merge and save a two-bank measurement.
//
// Given
// -----
// - A sample run with HAB = 3 × LAB and a can run at half the sample level.
// - `All` mode, `Both` merge policy, save prefix "reduced".
//
// Expect
// ------
// - LAB, HAB and merged outputs with no failures, all saved.
// - The fitted scale is 3 with a negligible shift, and the merged profile
//   follows the can-subtracted LAB profile.
fn full_reduction_with_can_and_merge() {
    let state = ReductionState::new(config(ReductionMode::All, Some("CAN"))).unwrap();
    let mut loader = InMemoryLoader::new();
    loader.insert("SAMPLE", run(1.0, 3.0));
    loader.insert("CAN", run(0.5, 3.0));
    let store = MemoryStore::new();

    let report = run_reduction(&state, &loader, SERVICES, &store).unwrap();

    assert!(report.is_complete(), "{:?}", report.failures);
    assert_eq!(
        store.workspace_paths(),
        vec![
            "reduced/SAMPLE_HAB_3.0_8.0".to_string(),
            "reduced/SAMPLE_LAB_3.0_8.0".to_string(),
            "reduced/SAMPLE_merged_3.0_8.0".to_string(),
        ]
    );
    let merge = &report.merges[0].summary;
    assert_relative_eq!(merge.scale, 3.0, max_relative = 1e-9);

    let lab = report.output("SAMPLE_LAB_3.0_8.0").unwrap().intensity.histogram(0).unwrap();
    let merged = report.output("SAMPLE_merged_3.0_8.0").unwrap().intensity.histogram(0).unwrap();
    let peak = lab.y.iter().copied().filter(|v| v.is_finite()).fold(0.0, f64::max);
    assert!(peak > 0.0);
    assert!(merge.shift.abs() < 1e-9 * peak);
    let mut compared = 0;
    for i in 0..lab.n_bins() {
        if lab.y[i].is_finite() {
            assert_relative_eq!(merged.y[i], lab.y[i], max_relative = 1e-9);
            compared += 1;
        }
    }
    assert!(compared >= 2);
}

#[test]
// Purpose
// -------
// Locate the beam centre of a pattern centred on the origin.
//
// Given
// -----
// - The sample run, start at the origin, annulus (0, 0.2) m.
//
// Expect
// ------
// - The quadrant search converges at the start in one iteration; the
//   centre-of-mass estimate lands on the origin. Both tables are saved.
fn beam_centre_of_symmetric_pattern() {
    let state = ReductionState::new(config(ReductionMode::Lab, None)).unwrap();
    let sample = run(1.0, 3.0);
    let store = MemoryStore::new();

    let quadrant = CentreOptions { radius_limits: (0.0, 0.2), ..Default::default() };
    let result = find_centre(&state, &sample, SERVICES, &store, &quadrant).unwrap();
    assert!(result.converged());
    assert_eq!(result.iterations, 1);
    assert_eq!((result.x, result.y), (0.0, 0.0));

    let mass = CentreOptions { method: CentreMethod::CentreOfMass, radius_limits: (0.01, 0.2), ..Default::default() };
    let result = find_centre(&state, &sample, SERVICES, &store, &mass).unwrap();
    assert!(result.x.abs() < 1e-9 && result.y.abs() < 1e-9);
    assert_eq!(store.table_count(), 2);
}

//! Synthetic instrument and runs shared by unit tests across the crate.
//!
//! A 20×20 LAB bank (ids 1000..=1399, 5 mm pitch, 4 m from the sample),
//! optionally a HAB bank with the same layout (ids 2000..=2399), monitors 1
//! (incident, z = -5 m) and 3 (transmission, z = -1 m), L1 = 10 m. Detector
//! spectra hold a Gaussian spot on a flat floor, flat in TOF over
//! 10000..30000 µs.
use crate::{
    services::traits::LoadedRun,
    state::{
        geometry::{DetectorComponent, DetectorKind, InstrumentGeometry, InstrumentId, MonitorSpec},
        options::{AdjustmentOptions, BeamCentres, MaskSpec, MergeOptions, ReductionOptions, ScaleOptions},
        reduction_state::{NormalizationConfig, ReductionState, StateConfig, WavelengthConfig},
        windows::QBinning,
    },
    workspace::{
        matrix::Workspace,
        rebin::StepType,
        spectrum::{EventList, Histogram, Spectrum},
        units::XUnit,
    },
};
use ndarray::Array1;

pub(crate) const PITCH: f64 = 0.005;
pub(crate) const SIDE: u32 = 20;
pub(crate) const Z: f64 = 4.0;
pub(crate) const LAB_FIRST: u32 = 1000;
pub(crate) const HAB_FIRST: u32 = 2000;

fn component(kind: DetectorKind, first_id: u32) -> DetectorComponent {
    DetectorComponent { kind, first_id, last_id: first_id + SIDE * SIDE - 1, pixel_width: PITCH, pixel_height: PITCH }
}

pub(crate) fn geometry(with_hab: bool) -> InstrumentGeometry {
    let mut components = vec![component(DetectorKind::Lab, LAB_FIRST)];
    if with_hab {
        components.push(component(DetectorKind::Hab, HAB_FIRST));
    }
    InstrumentGeometry {
        instrument: InstrumentId::Sans2d,
        l1: 10.0,
        components,
        monitors: vec![MonitorSpec { id: 1, z: -5.0 }, MonitorSpec { id: 3, z: -1.0 }],
    }
}

pub(crate) fn state_config() -> StateConfig {
    StateConfig {
        geometry: geometry(false),
        wavelength: WavelengthConfig {
            min: Some(3.0),
            max: Some(8.0),
            step: Some(0.5),
            step_type: Some(StepType::Linear),
            ranges: Vec::new(),
        },
        normalization: NormalizationConfig::default(),
        mask: MaskSpec::default(),
        scale: ScaleOptions::default(),
        adjustment: AdjustmentOptions::default(),
        q_binning: QBinning { min: 0.001, max: 0.04, step: 0.001, step_type: StepType::Linear },
        beam_centre: BeamCentres::default(),
        merge: MergeOptions::default(),
        reduction: ReductionOptions::new("SANS2D00001"),
    }
}

pub(crate) fn state() -> ReductionState {
    ReductionState::new(state_config()).expect("fixture state is valid")
}

/// Pixel `(i, j)` position; the grid is symmetric about the origin.
pub(crate) fn pixel_position(i: u32, j: u32) -> [f64; 3] {
    let offset = 0.5 * f64::from(SIDE - 1);
    [(f64::from(i) - offset) * PITCH, (f64::from(j) - offset) * PITCH, Z]
}

/// Counts per TOF bin of a pixel at `(x, y)` for a spot centred at
/// `(cx, cy)`.
pub(crate) fn pattern(x: f64, y: f64, cx: f64, cy: f64) -> f64 {
    let sigma = 0.02;
    let r2 = (x - cx).powi(2) + (y - cy).powi(2);
    10.0 + 1000.0 * (-r2 / (2.0 * sigma * sigma)).exp()
}

fn tof_edges() -> Array1<f64> {
    Array1::from_iter((0..=20).map(|i| 10_000.0 + 1000.0 * f64::from(i)))
}

/// Flat monitors of 1000 counts per 500 µs bin over 1000..30000 µs.
pub(crate) fn monitors() -> Workspace {
    let edges = Array1::from_iter((0..=58).map(|i| 1000.0 + 500.0 * f64::from(i)));
    let flat = |id, z| {
        let h = Histogram::from_counts(edges.clone(), Array1::from_elem(58, 1000.0)).expect("valid monitor");
        Spectrum::histogram(id, [0.0, 0.0, z], h)
    };
    Workspace::new(XUnit::TimeOfFlight, 10.0, vec![flat(1, -5.0), flat(3, -1.0)])
}

fn bank(first_id: u32, scale: f64, cx: f64, cy: f64) -> Vec<Spectrum> {
    let mut spectra = Vec::with_capacity((SIDE * SIDE) as usize);
    for j in 0..SIDE {
        for i in 0..SIDE {
            let position = pixel_position(i, j);
            let level = scale * pattern(position[0], position[1], cx, cy);
            let h = Histogram::from_counts(tof_edges(), Array1::from_elem(20, level)).expect("valid counts");
            spectra.push(Spectrum::histogram(first_id + j * SIDE + i, position, h));
        }
    }
    spectra
}

/// Histogram run with the LAB spot centred at `(cx, cy)`.
pub(crate) fn run(cx: f64, cy: f64) -> LoadedRun {
    LoadedRun {
        counts: Workspace::new(XUnit::TimeOfFlight, 10.0, bank(LAB_FIRST, 1.0, cx, cy)),
        monitors: monitors(),
        transmission: None,
        direct: None,
    }
}

/// Histogram run with both banks; the HAB signal is `hab_scale` times the
/// LAB signal.
pub(crate) fn two_bank_run(hab_scale: f64) -> LoadedRun {
    let mut spectra = bank(LAB_FIRST, 1.0, 0.0, 0.0);
    spectra.extend(bank(HAB_FIRST, hab_scale, 0.0, 0.0));
    LoadedRun { counts: Workspace::new(XUnit::TimeOfFlight, 10.0, spectra), ..run(0.0, 0.0) }
}

/// Event run: one event per TOF bin centre and per unit of the pattern
/// (rounded), with pulse times spread over `[0, 10)` s.
pub(crate) fn event_run(cx: f64, cy: f64) -> LoadedRun {
    let centres: Vec<f64> = (0..20).map(|i| 10_500.0 + 1000.0 * f64::from(i)).collect();
    let mut spectra = Vec::with_capacity((SIDE * SIDE) as usize);
    for j in 0..SIDE {
        for i in 0..SIDE {
            let position = pixel_position(i, j);
            let per_bin = (pattern(position[0], position[1], cx, cy) / 10.0).round() as usize;
            let mut x = Vec::new();
            let mut pulse = Vec::new();
            for &tof in &centres {
                for k in 0..per_bin {
                    x.push(tof);
                    pulse.push((k % 10) as f64 + 0.5);
                }
            }
            let events = EventList::new(x, pulse).expect("equal columns");
            spectra.push(Spectrum::events(LAB_FIRST + j * SIDE + i, position, events));
        }
    }
    LoadedRun {
        counts: Workspace::new(XUnit::TimeOfFlight, 10.0, spectra),
        monitors: monitors(),
        transmission: None,
        direct: None,
    }
}

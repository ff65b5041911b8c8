//! DetectorReductionCore — the per-bank reduction sequence.
//!
//! Purpose
//! -------
//! Reduce one `(component, data type, time slice)` of a loaded run to 1D
//! momentum-transfer profiles, one per configured wavelength range.
//!
//! Key behaviors
//! -------------
//! - A validation pass runs before any numeric step and rejects requests
//!   for unknown or empty components, missing monitors and missing
//!   transmission inputs.
//! - Steps run in a fixed order: crop, time slice, compatibility shadow,
//!   move, mask, convert to wavelength, then per range: restrict, scale,
//!   adjustments, collapse and Q1D.
//! - Pixel and wavelength adjustments are independent and computed with
//!   `rayon::join`; the wide-angle adjustment needs the scaled workspace and
//!   the transmission and runs afterwards.
//! - Every intermediate is owned by a [`SliceArena`] that is released on any
//!   exit path.
//!
//! Invariants & assumptions
//! ------------------------
//! - The loaded run's counts and monitors are in TOF.
//! - The compatibility shadow is only built for event input; for histogram
//!   input it would duplicate the main path.
//! - The core keeps no state between calls: identical inputs give identical
//!   output.
use crate::{
    normalization::normalizer::{event_edges, CountsNormalizer},
    reduction::{
        adjustments::{pixel_adjustment, wavelength_adjustment, wide_angle_adjustment},
        errors::{ReductionError, ReductionResult},
        q1d::{q1d, Q1dNorm},
        slice::{ReducedSlice, ReductionServices, SliceRequest},
        steps,
        transmission::{calculate_transmission, MonitorWindows},
    },
    services::traits::{ConversionMode, LoadedRun},
    state::{
        errors::ConfigError, geometry::DetectorComponent, reduction_state::ReductionState,
        windows::WavelengthRange,
    },
    workspace::{
        arena::{SliceArena, Slot},
        matrix::Workspace,
        spectrum::{Histogram, SpectrumData},
        units::XUnit,
    },
};
use ndarray::Array1;

/// Runs the reduction sequence against one validated state.
#[derive(Clone, Copy)]
pub struct DetectorReductionCore<'a> {
    state: &'a ReductionState,
    services: ReductionServices<'a>,
}

fn held<'s>(arena: &'s SliceArena, slot: Slot, stage: &'static str) -> ReductionResult<&'s Workspace> {
    arena.get(slot).ok_or(ReductionError::Released { stage })
}

impl<'a> DetectorReductionCore<'a> {
    pub fn new(state: &'a ReductionState, services: ReductionServices<'a>) -> Self {
        DetectorReductionCore { state, services }
    }

    pub fn state(&self) -> &'a ReductionState {
        self.state
    }

    pub fn services(&self) -> ReductionServices<'a> {
        self.services
    }

    /// Pre-flight checks; returns the requested component.
    ///
    /// Errors
    /// ------
    /// - `ReductionError::UnknownComponent`, `ReductionError::EmptyComponent`.
    /// - `ConfigError::MissingMonitor` when the run lacks the incident monitor.
    /// - `ReductionError::MissingTransmissionInput` when a transmission
    ///   correction is configured but the transmission or direct run is
    ///   absent.
    pub fn validate(&self, run: &LoadedRun, request: &SliceRequest) -> ReductionResult<&'a DetectorComponent> {
        let component = self
            .state
            .geometry
            .component(request.component)
            .ok_or(ReductionError::UnknownComponent { component: request.component })?;
        if !run.counts.spectra.iter().any(|s| component.contains(s.detector_id)) {
            return Err(ReductionError::EmptyComponent { component: request.component });
        }
        let incident = self.state.normalization.incident_monitor;
        if run.monitors.find(incident).is_none() {
            return Err(ConfigError::MissingMonitor { id: incident }.into());
        }
        if let Some(t) = &self.state.adjustment.transmission {
            for (which, ws) in [("transmission", &run.transmission), ("direct", &run.direct)] {
                let ws = ws.as_ref().ok_or(ReductionError::MissingTransmissionInput { which })?;
                for id in [t.incident_monitor, t.transmission_monitor] {
                    if ws.find(id).is_none() {
                        return Err(ConfigError::MissingMonitor { id }.into());
                    }
                }
            }
        }
        Ok(component)
    }

    /// Reduce the full wavelength range.
    pub fn reduce_slice(&self, run: &LoadedRun, request: &SliceRequest) -> ReductionResult<ReducedSlice> {
        self.reduce_wavelength_range(run, request, self.state.wavelength.full)
    }

    /// Reduce the full range and every configured sub-range, in that order.
    pub fn reduce_ranges(&self, run: &LoadedRun, request: &SliceRequest) -> ReductionResult<Vec<ReducedSlice>> {
        self.reduce(run, request, &self.state.wavelength.all_ranges())
    }

    /// Reduce one wavelength range of `request`.
    pub fn reduce_wavelength_range(
        &self, run: &LoadedRun, request: &SliceRequest, range: WavelengthRange,
    ) -> ReductionResult<ReducedSlice> {
        let mut out = self.reduce(run, request, &[range])?;
        out.pop().ok_or(ReductionError::Released { stage: "Q1D" })
    }

    fn reduce(
        &self, run: &LoadedRun, request: &SliceRequest, ranges: &[WavelengthRange],
    ) -> ReductionResult<Vec<ReducedSlice>> {
        let component = self.validate(run, request)?;
        let state = self.state;
        let label = request.label();
        let mut arena = SliceArena::new(label.clone());

        // 1. Crop.
        let cropped = arena.insert(steps::crop(&run.counts, component)?);
        tracing::debug!(slice = %label, spectra = held(&arena, cropped, "crop")?.len(), "cropped");

        // 2. Time slice.
        let sliced = steps::time_slice(held(&arena, cropped, "crop")?, request.time_slice);
        drop(arena.take(cropped));
        let sliced = arena.insert(sliced);

        // 3. Compatibility shadow.
        let shadow = if state.reduction.compatibility && held(&arena, sliced, "time slice")?.is_event() {
            let edges = self.shadow_edges(&run.monitors)?;
            let shadow = held(&arena, sliced, "time slice")?.to_histogram(&edges)?;
            tracing::debug!(slice = %label, bins = edges.len() - 1, "compatibility shadow created");
            Some(arena.insert(shadow))
        } else {
            None
        };

        // 4. Move.
        let centre = request.centre.unwrap_or_else(|| state.beam_centre.get(request.component));
        let moved = steps::move_to_centre(held(&arena, sliced, "time slice")?, centre);
        drop(arena.take(sliced));
        let moved = arena.insert(moved);
        let monitors = steps::move_to_centre(&run.monitors, centre);
        let shadow = self.advance(&mut arena, shadow, |ws| Ok(steps::move_to_centre(ws, centre)))?;
        tracing::debug!(slice = %label, x = centre.x, y = centre.y, "moved to beam centre");

        // 5. Mask.
        let spec = state.mask.with_shapes(&request.extra_shapes);
        let masked = self.services.masker.mask(held(&arena, moved, "move")?, &spec)?;
        drop(arena.take(moved));
        let masked = arena.insert(masked);
        let shadow = self.advance(&mut arena, shadow, |ws| Ok(self.services.masker.mask(ws, &spec)?))?;
        tracing::debug!(slice = %label, shapes = spec.shapes.len(), "masks applied");

        // 6. Convert to wavelength.
        let to_wavelength =
            |ws: &Workspace| self.services.converter.convert(ws, XUnit::Wavelength, ConversionMode::Elastic, None);
        let converted = to_wavelength(held(&arena, masked, "mask")?)?;
        drop(arena.take(masked));
        let converted = arena.insert(converted);
        let shadow = self.advance(&mut arena, shadow, |ws| Ok(to_wavelength(ws)?))?;

        let q_edges = state.q_binning.edges()?;
        let mut out = Vec::with_capacity(ranges.len());
        for &range in ranges {
            let edges = state.wavelength.edges(range)?;
            let ranged = steps::restrict_to_range(held(&arena, converted, "wavelength conversion")?, range, &edges)?;
            let shadow_ranged = match shadow {
                Some(slot) => Some(steps::restrict_to_range(held(&arena, slot, "compatibility shadow")?, range, &edges)?),
                None => None,
            };
            let (counts, norm) =
                self.reduce_range(run, &monitors, component, ranged, shadow_ranged.as_ref(), &edges, &q_edges)?;
            tracing::debug!(slice = %label, range = %range.label(), "range reduced");
            out.push(ReducedSlice {
                component: request.component,
                data_type: request.data_type,
                time_slice: request.time_slice,
                wavelength_range: range,
                counts,
                norm,
            });
        }
        arena.release();
        Ok(out)
    }

    /// Steps 7 to 10 for one wavelength range.
    #[allow(clippy::too_many_arguments)]
    fn reduce_range(
        &self, run: &LoadedRun, monitors: &Workspace, component: &DetectorComponent, ranged: Workspace,
        shadow: Option<&Workspace>, edges: &Array1<f64>, q_edges: &Array1<f64>,
    ) -> ReductionResult<(Workspace, Workspace)> {
        let state = self.state;

        // 7. Scale and solid angles.
        let scaled = steps::scale(&ranged, state.scale.factor());
        drop(ranged);
        let omega = steps::solid_angles(&scaled, component.pixel_area());

        // 8. Adjustments.
        let flood = state.adjustment.flood.as_ref();
        let (pixel, wavelength) = rayon::join(
            || pixel_adjustment(&scaled, &omega, flood),
            || self.wavelength_inputs(run, monitors, edges),
        );
        let (monitor, transmission) = wavelength?;
        let wav = wavelength_adjustment(&monitor, transmission.as_ref(), state.adjustment.wavelength_correction.as_ref());
        let wide = match (&transmission, state.adjustment.wide_angle_correction) {
            (Some(t), true) => Some(wide_angle_adjustment(&scaled, t)),
            _ => None,
        };

        // 9. Collapse.
        let collapsed = steps::collapse(&scaled, edges, shadow)?;
        drop(scaled);

        // 10. Q1D.
        q1d(&collapsed, Q1dNorm { pixel: &pixel, wavelength: &wav, wide_angle: wide.as_deref() }, q_edges)
    }

    /// Prepared incident monitor and, when configured, the transmission.
    fn wavelength_inputs(
        &self, run: &LoadedRun, monitors: &Workspace, edges: &Array1<f64>,
    ) -> ReductionResult<(Histogram, Option<Histogram>)> {
        let state = self.state;
        let normalizer = CountsNormalizer::new(self.services.converter);
        let windows = MonitorWindows {
            background: state.normalization.background.as_ref(),
            prompt_peak: state.normalization.prompt_peak,
        };
        let monitor = normalizer.monitor_normalization(
            monitors,
            state.normalization.incident_monitor,
            windows.background,
            windows.prompt_peak,
            edges,
        )?;
        let transmission = match (&state.adjustment.transmission, &run.transmission, &run.direct) {
            (Some(opts), Some(sample), Some(direct)) => {
                Some(calculate_transmission(&normalizer, sample, direct, opts, windows, edges)?)
            }
            (Some(_), None, _) => return Err(ReductionError::MissingTransmissionInput { which: "transmission" }),
            (Some(_), _, None) => return Err(ReductionError::MissingTransmissionInput { which: "direct" }),
            (None, _, _) => None,
        };
        Ok((monitor, transmission))
    }

    /// TOF grid of the incident monitor, used to histogram the shadow.
    fn shadow_edges(&self, monitors: &Workspace) -> ReductionResult<Array1<f64>> {
        let id = self.state.normalization.incident_monitor;
        let spectrum = monitors.find(id).ok_or(ConfigError::MissingMonitor { id })?;
        Ok(match &spectrum.data {
            SpectrumData::Histogram(h) => h.x.clone(),
            SpectrumData::Events(ev) => event_edges(&ev.x),
        })
    }

    /// Apply `step` to the shadow, if any, replacing it in the arena.
    fn advance(
        &self, arena: &mut SliceArena, shadow: Option<Slot>,
        step: impl Fn(&Workspace) -> ReductionResult<Workspace>,
    ) -> ReductionResult<Option<Slot>> {
        let Some(slot) = shadow else {
            return Ok(None);
        };
        let next = step(held(arena, slot, "compatibility shadow")?)?;
        drop(arena.take(slot));
        Ok(Some(arena.insert(next)))
    }
}

/// Reduce the full wavelength range of `request`.
pub fn reduce_slice(
    state: &ReductionState, run: &LoadedRun, services: ReductionServices<'_>, request: &SliceRequest,
) -> ReductionResult<ReducedSlice> {
    DetectorReductionCore::new(state, services).reduce_slice(run, request)
}

/// Reduce every configured wavelength range of `request`.
pub fn reduce_slice_ranges(
    state: &ReductionState, run: &LoadedRun, services: ReductionServices<'_>, request: &SliceRequest,
) -> ReductionResult<Vec<ReducedSlice>> {
    DetectorReductionCore::new(state, services).reduce_ranges(run, request)
}

//! Individual pipeline steps.
//!
//! Each step takes a workspace by reference and returns a new one; the
//! sequencing lives in [`pipeline`](super::pipeline).
use crate::{
    reduction::errors::{ReductionError, ReductionResult},
    state::{
        geometry::DetectorComponent,
        options::BeamCentre,
        windows::{TimeSlice, WavelengthRange},
    },
    workspace::{
        matrix::Workspace,
        rebin::rebin_histogram,
        spectrum::{Histogram, SpectrumData},
        units::XUnit,
    },
};
use ndarray::Array1;

/// Step 1: keep the spectra of `component`.
pub fn crop(counts: &Workspace, component: &DetectorComponent) -> ReductionResult<Workspace> {
    let cropped = counts.select(|s| component.contains(s.detector_id));
    if cropped.is_empty() {
        return Err(ReductionError::EmptyComponent { component: component.kind });
    }
    Ok(cropped)
}

/// Step 2: keep events with pulse time in `[start, stop)`. Histogram spectra
/// pass through unchanged.
pub fn time_slice(ws: &Workspace, slice: Option<TimeSlice>) -> Workspace {
    let Some(slice) = slice else {
        return ws.clone();
    };
    let mut out = ws.clone();
    for spectrum in &mut out.spectra {
        if let SpectrumData::Events(ev) = &mut spectrum.data {
            let kept = ev.retain_indices(|i| slice.contains(ev.pulse_time[i]));
            *ev = kept;
        }
    }
    out
}

/// Step 4: shift positions so the beam centre becomes the origin.
pub fn move_to_centre(ws: &Workspace, centre: BeamCentre) -> Workspace {
    let mut out = ws.clone();
    for spectrum in &mut out.spectra {
        spectrum.position[0] -= centre.x;
        spectrum.position[1] -= centre.y;
    }
    out
}

/// Step 6 (per range): restrict a wavelength workspace to `range`.
///
/// Histograms are rebinned onto `edges`; events outside the range are
/// dropped and stay events until the collapse step.
pub fn restrict_to_range(
    ws: &Workspace, range: WavelengthRange, edges: &Array1<f64>,
) -> ReductionResult<Workspace> {
    if ws.unit != XUnit::Wavelength {
        return Err(ReductionError::WrongUnit { stage: "wavelength restriction", found: ws.unit });
    }
    let spectra = ws
        .spectra
        .iter()
        .map(|s| {
            let data = match &s.data {
                SpectrumData::Histogram(h) => SpectrumData::Histogram(rebin_histogram(h, edges)?),
                SpectrumData::Events(ev) => {
                    SpectrumData::Events(ev.retain_indices(|i| ev.x[i] >= range.min && ev.x[i] <= range.max))
                }
            };
            Ok(s.with_data(data))
        })
        .collect::<ReductionResult<Vec<_>>>()?;
    Ok(Workspace::new(ws.unit, ws.l1, spectra))
}

/// Step 7: multiply every value by `factor` (errors by `|factor|`).
pub fn scale(ws: &Workspace, factor: f64) -> Workspace {
    let mut out = ws.clone();
    for spectrum in &mut out.spectra {
        match &mut spectrum.data {
            SpectrumData::Histogram(h) => h.scale(factor),
            SpectrumData::Events(ev) => {
                ev.weight.iter_mut().for_each(|w| *w *= factor);
                ev.error_sq.iter_mut().for_each(|e| *e *= factor * factor);
            }
        }
    }
    out
}

/// Step 7: per-pixel solid angle `Ω ≈ A · z / d³`.
pub fn solid_angles(ws: &Workspace, pixel_area: f64) -> Vec<f64> {
    ws.spectra
        .iter()
        .map(|s| {
            let d = s.l2();
            if d > 0.0 { pixel_area * s.position[2].abs() / (d * d * d) } else { 0.0 }
        })
        .collect()
}

/// Step 9: collapse onto `edges` and, when a compatibility shadow is given,
/// OR its per-bin and per-detector mask flags into the result.
pub fn collapse(
    ws: &Workspace, edges: &Array1<f64>, shadow: Option<&Workspace>,
) -> ReductionResult<Workspace> {
    let mut out = ws.to_histogram(edges)?;
    let Some(shadow) = shadow else {
        return Ok(out);
    };
    for spectrum in &mut out.spectra {
        let Some(twin) = shadow.find(spectrum.detector_id) else {
            continue;
        };
        let flags = twin.as_histogram()?.masked.clone();
        let whole = twin.masked;
        let h: &mut Histogram = spectrum.as_histogram_mut()?;
        if flags.len() != h.n_bins() {
            return Err(ReductionError::Unsupported {
                stage: "compatibility mask copy",
                reason: "shadow grid differs from the reduced grid",
            });
        }
        for (i, flag) in flags.into_iter().enumerate() {
            if flag || whole {
                h.mask_bin(i);
            }
        }
        spectrum.masked |= whole;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::spectrum::{EventList, Spectrum};
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Verify that time slicing keeps events in `[start, stop)` and ignores
    // histogram spectra.
    //
    // Given
    // -----
    // - Events at pulse times 0, 1, 2, 3 and a slice [1, 3).
    //
    // Expect
    // ------
    // - Two events remain; the histogram spectrum is unchanged.
    fn time_slice_is_half_open() {
        let ev = EventList::new(vec![10.0, 20.0, 30.0, 40.0], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let h = Histogram::from_counts(array![0.0, 1.0], array![5.0]).unwrap();
        let ws = Workspace::new(
            XUnit::TimeOfFlight,
            10.0,
            vec![Spectrum::events(1, [0.0, 0.0, 4.0], ev), Spectrum::histogram(2, [0.0, 0.0, 4.0], h)],
        );

        let out = time_slice(&ws, Some(TimeSlice { start: 1.0, stop: 3.0 }));

        match &out.spectra[0].data {
            SpectrumData::Events(ev) => assert_eq!(ev.x, vec![20.0, 30.0]),
            SpectrumData::Histogram(_) => panic!("expected events"),
        }
        assert_eq!(out.spectra[1], ws.spectra[1]);
    }

    #[test]
    fn solid_angle_on_axis() {
        let h = Histogram::from_counts(array![0.0, 1.0], array![1.0]).unwrap();
        let ws = Workspace::new(XUnit::Wavelength, 10.0, vec![Spectrum::histogram(1, [0.0, 0.0, 2.0], h)]);
        assert_relative_eq!(solid_angles(&ws, 1e-4)[0], 1e-4 / 4.0, epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // Verify that the collapse step copies shadow mask flags onto the
    // reduced bins.
    //
    // Given
    // -----
    // - An event spectrum with no masks and a shadow histogram whose second
    //   bin is masked.
    //
    // Expect
    // ------
    // - The collapsed histogram has bin 1 masked and zeroed.
    fn collapse_copies_shadow_mask_flags() {
        let edges = array![1.0, 2.0, 3.0];
        let ev = EventList::new(vec![1.5, 2.5, 2.6], vec![0.0; 3]).unwrap();
        let ws = Workspace::new(XUnit::Wavelength, 10.0, vec![Spectrum::events(7, [0.0, 0.0, 4.0], ev)]);
        let shadow_h =
            Histogram::with_mask(edges.clone(), array![1.0, 2.0], array![1.0, 1.0], vec![false, true]).unwrap();
        let shadow = Workspace::new(XUnit::Wavelength, 10.0, vec![Spectrum::histogram(7, [0.0, 0.0, 4.0], shadow_h)]);

        let plain = collapse(&ws, &edges, None).unwrap();
        let compat = collapse(&ws, &edges, Some(&shadow)).unwrap();

        assert_eq!(plain.histogram(0).unwrap().y, array![1.0, 2.0]);
        let h = compat.histogram(0).unwrap();
        assert_eq!(h.masked, vec![false, true]);
        assert_eq!(h.y, array![1.0, 0.0]);
    }
}

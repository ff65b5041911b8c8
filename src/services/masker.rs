//! Geometric detector masking.
//!
//! [`DetectorMasker`] applies a [`MaskSpec`] to a workspace: listed detector
//! ids and pixels hit by any shape are masked whole, and time windows mask
//! the overlapping TOF bins (or drop the events inside them). Masking is
//! cumulative: existing flags are never cleared.
use crate::{
    services::{
        errors::{UpstreamError, UpstreamResult},
        traits::MaskingService,
    },
    state::options::MaskSpec,
    workspace::{
        matrix::Workspace,
        spectrum::{Spectrum, SpectrumData},
        units::XUnit,
    },
};

/// Reference [`MaskingService`] working on pixel positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectorMasker;

fn mask_whole(spectrum: &mut Spectrum) {
    spectrum.masked = true;
    match &mut spectrum.data {
        SpectrumData::Histogram(h) => (0..h.n_bins()).for_each(|i| h.mask_bin(i)),
        SpectrumData::Events(ev) => *ev = ev.retain_indices(|_| false),
    }
}

impl MaskingService for DetectorMasker {
    fn mask(&self, ws: &Workspace, spec: &MaskSpec) -> UpstreamResult<Workspace> {
        if !spec.time_windows.is_empty() && ws.unit != XUnit::TimeOfFlight {
            return Err(UpstreamError::Masking {
                reason: format!("time masks need a TOF workspace, got {}", ws.unit),
            });
        }
        let mut out = ws.clone();
        let mut whole = 0usize;
        for spectrum in &mut out.spectra {
            let [x, y, _] = spectrum.position;
            let hit = spec.detector_ids.contains(&spectrum.detector_id)
                || spec.shapes.iter().any(|shape| shape.masks(x, y));
            if hit {
                if !spectrum.masked {
                    whole += 1;
                }
                mask_whole(spectrum);
                continue;
            }
            for window in &spec.time_windows {
                match &mut spectrum.data {
                    SpectrumData::Histogram(h) => {
                        for i in h.bins_overlapping(window.start, window.stop) {
                            h.mask_bin(i);
                        }
                    }
                    SpectrumData::Events(ev) => {
                        let kept = ev.retain_indices(|i| ev.x[i] < window.start || ev.x[i] > window.stop);
                        *ev = kept;
                    }
                }
            }
        }
        tracing::debug!(masked = whole, total = out.len(), "detector mask applied");
        Ok(out)
    }
}

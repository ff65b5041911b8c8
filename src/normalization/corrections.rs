//! Monitor corrections in time-of-flight: prompt-peak removal and flat
//! background subtraction.
//!
//! Both functions take a TOF histogram and return a corrected copy. They are
//! order sensitive: the prompt peak must be removed first, otherwise a peak
//! inside the background window inflates the background level and the
//! subtraction wipes out real signal.
use crate::{state::windows::TofWindow, workspace::spectrum::Histogram};

/// Replace the bins overlapping `window` by a linear interpolation of the
/// per-µs level between the nearest untouched neighbours.
///
/// With a neighbour on one side only, that neighbour's level is held flat.
/// With no neighbours the excised bins become zero.
pub fn remove_prompt_peak(monitor: &Histogram, window: TofWindow) -> Histogram {
    let mut out = monitor.clone();
    let excised = monitor.bins_overlapping(window.start, window.stop);
    let (Some(&first), Some(&last)) = (excised.first(), excised.last()) else {
        return out;
    };
    let widths = monitor.widths();
    let centres = monitor.centres();
    let level = |i: usize| (monitor.y[i] / widths[i], monitor.e[i] / widths[i]);

    let left = first.checked_sub(1).map(|i| (centres[i], level(i)));
    let right = (last + 1 < monitor.n_bins()).then(|| (centres[last + 1], level(last + 1)));

    for i in first..=last {
        let (density, sigma) = match (left, right) {
            (Some((x0, (y0, e0))), Some((x1, (y1, e1)))) => {
                let t = (centres[i] - x0) / (x1 - x0);
                (y0 + t * (y1 - y0), e0 + t * (e1 - e0))
            }
            (Some((_, l)), None) | (None, Some((_, l))) => l,
            (None, None) => (0.0, 0.0),
        };
        out.y[i] = density * widths[i];
        out.e[i] = sigma * widths[i];
    }
    out
}

/// Subtract a flat per-µs background estimated inside `window`.
///
/// The level is `Σ y / Σ width` over the bins overlapping the window; every
/// bin loses `level · width` and negative results are clamped to zero. The
/// level's uncertainty is added in quadrature.
pub fn subtract_flat_background(monitor: &Histogram, window: TofWindow) -> Histogram {
    let bins = monitor.bins_overlapping(window.start, window.stop);
    if bins.is_empty() {
        return monitor.clone();
    }
    let widths = monitor.widths();
    let total_width: f64 = bins.iter().map(|&i| widths[i]).sum();
    let level = bins.iter().map(|&i| monitor.y[i]).sum::<f64>() / total_width;
    let level_sigma = bins.iter().map(|&i| monitor.e[i].powi(2)).sum::<f64>().sqrt() / total_width;

    let mut out = monitor.clone();
    for i in 0..out.n_bins() {
        if out.masked[i] {
            continue;
        }
        out.y[i] = (monitor.y[i] - level * widths[i]).max(0.0);
        out.e[i] = monitor.e[i].hypot(level_sigma * widths[i]);
    }
    out
}

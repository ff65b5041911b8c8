//! Expansion of a reduction request into independent jobs.
use crate::{
    reduction::slice::SliceRequest,
    state::{
        options::DataType,
        reduction_state::ReductionState,
        windows::{TimeSlice, WavelengthRange},
    },
};

/// Where an output sits in the request: indices into the configured time
/// slices and wavelength ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputKey {
    pub slice: usize,
    pub range: usize,
}

/// One `(component, data type, time slice, wavelength range)` reduction.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub name: String,
    pub key: OutputKey,
    pub request: SliceRequest,
    pub range: WavelengthRange,
}

/// Name of a final output, e.g. `SANS2D00001_LAB_3.0_8.0` or
/// `SANS2D00001_merged_3.0_8.0_t0.0_5.0`.
pub fn output_name(run: &str, what: &str, range: &WavelengthRange, slice: Option<&TimeSlice>) -> String {
    match slice {
        Some(t) => format!("{run}_{what}_{}_{}", range.label(), t.label()),
        None => format!("{run}_{what}_{}", range.label()),
    }
}

/// Time slices of the request; a single `None` when none are configured.
pub fn time_slices(state: &ReductionState) -> Vec<Option<TimeSlice>> {
    if state.reduction.time_slices.is_empty() {
        vec![None]
    } else {
        state.reduction.time_slices.iter().copied().map(Some).collect()
    }
}

/// All jobs of the request, names allocated up front.
///
/// Order: component, then data type, then time slice, then wavelength range.
pub fn expand_jobs(state: &ReductionState, data_types: &[DataType]) -> Vec<Job> {
    let run = &state.reduction.sample_run;
    let slices = time_slices(state);
    let ranges = state.wavelength.all_ranges();
    let mut jobs = Vec::new();
    for component in state.reduction.mode.components() {
        for &data_type in data_types {
            for (si, slice) in slices.iter().enumerate() {
                for (ri, range) in ranges.iter().enumerate() {
                    let what = format!("{component}_{data_type}");
                    jobs.push(Job {
                        name: output_name(run, &what, range, slice.as_ref()),
                        key: OutputKey { slice: si, range: ri },
                        request: SliceRequest::new(component, data_type).with_time_slice(*slice),
                        range: *range,
                    });
                }
            }
        }
    }
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reduction::fixtures, state::options::ReductionMode};

    #[test]
    // Purpose
    // -------
    // Verify the job grid and its pre-allocated names.
    //
    // Given
    // -----
    // - Merged mode, sample and can, two time slices, one extra wavelength
    //   range.
    //
    // Expect
    // ------
    // - 2 components × 2 data types × 2 slices × 2 ranges = 16 unique names.
    fn jobs_cover_the_full_grid_with_unique_names() {
        let mut config = fixtures::state_config();
        config.geometry = fixtures::geometry(true);
        config.wavelength.ranges = vec![WavelengthRange { min: 3.0, max: 5.0 }];
        config.reduction.mode = ReductionMode::Merged;
        config.reduction.time_slices =
            vec![TimeSlice { start: 0.0, stop: 5.0 }, TimeSlice { start: 5.0, stop: 10.0 }];
        let state = ReductionState::new(config).unwrap();

        let jobs = expand_jobs(&state, &[DataType::Sample, DataType::Can]);

        assert_eq!(jobs.len(), 16);
        let mut names: Vec<&str> = jobs.iter().map(|j| j.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 16);
        assert_eq!(jobs[0].name, "SANS2D00001_LAB_sample_3.0_8.0_t0.0_5.0");
        assert_eq!(jobs[1].key, OutputKey { slice: 0, range: 1 });
    }
}

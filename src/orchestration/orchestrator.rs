//! ReductionOrchestrator: runs every slice of a request and assembles the
//! report.
use crate::{
    merge::merger::BankMerger,
    orchestration::{
        errors::OrchestrationResult,
        jobs::{expand_jobs, output_name, time_slices, Job, OutputKey},
        report::{MergeRecord, ReducedOutput, ReductionReport, SliceFailure},
        subtract::subtract_can,
    },
    reduction::{
        errors::ReductionResult,
        pipeline::DetectorReductionCore,
        slice::{ReducedSlice, ReductionServices},
    },
    services::traits::{DataLoader, LoadedRun, PersistenceService},
    state::{
        geometry::DetectorKind,
        options::{DataType, ReductionMode},
        reduction_state::ReductionState,
    },
    workspace::{errors::WorkspaceResult, matrix::Workspace, spectrum::Histogram, units::XUnit},
};
use rayon::prelude::*;
use std::collections::BTreeMap;

type BankKey = (DetectorKind, OutputKey);

/// Drives a full reduction request against one validated state.
pub struct ReductionOrchestrator<'a> {
    state: &'a ReductionState,
    loader: &'a dyn DataLoader,
    services: ReductionServices<'a>,
    persistence: &'a dyn PersistenceService,
}

impl<'a> ReductionOrchestrator<'a> {
    pub fn new(
        state: &'a ReductionState, loader: &'a dyn DataLoader, services: ReductionServices<'a>,
        persistence: &'a dyn PersistenceService,
    ) -> Self {
        ReductionOrchestrator { state, loader, services, persistence }
    }

    /// Reduce the sample (and can) runs of the request.
    ///
    /// Slices run concurrently and never abort each other; their failures
    /// are collected in the report together with every output that depends
    /// on them.
    ///
    /// Errors
    /// ------
    /// - `OrchestrationError::Upstream` when the sample or can run cannot be
    ///   loaded.
    pub fn run(&self) -> OrchestrationResult<ReductionReport> {
        let options = &self.state.reduction;
        let sample = self.loader.load(&options.sample_run)?;
        let can = options.can_run.as_deref().map(|run| self.loader.load(run)).transpose()?;
        let data_types: &[DataType] =
            if can.is_some() { &[DataType::Sample, DataType::Can] } else { &[DataType::Sample] };

        let jobs = expand_jobs(self.state, data_types);
        tracing::info!(run = %options.sample_run, jobs = jobs.len(), mode = ?options.mode, "reduction started");

        let core = DetectorReductionCore::new(self.state, self.services);
        let results: Vec<ReductionResult<ReducedSlice>> = jobs
            .par_iter()
            .map(|job| {
                let run: &LoadedRun = match job.request.data_type {
                    DataType::Sample => &sample,
                    DataType::Can => can.as_ref().unwrap_or(&sample),
                };
                core.reduce_wavelength_range(run, &job.request, job.range)
            })
            .collect();

        let mut report = ReductionReport::default();
        let mut slices: BTreeMap<(DataType, DetectorKind, OutputKey), &ReducedSlice> = BTreeMap::new();
        for (job, result) in jobs.iter().zip(&results) {
            match result {
                Ok(slice) => {
                    slices.insert((job.request.data_type, job.request.component, job.key), slice);
                }
                Err(err) => fail(&mut report, &job.name, err.to_string()),
            }
        }

        let banks = self.subtract(&jobs, &slices, can.is_some(), &mut report);
        self.assemble(banks, &mut report);

        tracing::info!(
            outputs = report.outputs.len(),
            failures = report.failures.len(),
            merges = report.merges.len(),
            "reduction finished"
        );
        Ok(report)
    }

    /// Can-subtracted intensity per bank and output key.
    fn subtract(
        &self, jobs: &[Job], slices: &BTreeMap<(DataType, DetectorKind, OutputKey), &ReducedSlice>, with_can: bool,
        report: &mut ReductionReport,
    ) -> BTreeMap<BankKey, Histogram> {
        let mut banks = BTreeMap::new();
        for job in jobs.iter().filter(|j| j.request.data_type == DataType::Sample) {
            let component = job.request.component;
            let name = self.bank_name(component, job);
            let Some(sample) = slices.get(&(DataType::Sample, component, job.key)) else {
                fail(report, &name, format!("sample slice {} failed", job.name));
                continue;
            };
            let intensity = if with_can {
                match slices.get(&(DataType::Can, component, job.key)) {
                    Some(can) => can_subtracted(sample, can),
                    None => {
                        fail(report, &name, "can slice failed".to_string());
                        continue;
                    }
                }
            } else {
                sample.intensity()
            };
            match intensity {
                Ok(h) => {
                    banks.insert((component, job.key), h);
                }
                Err(err) => fail(report, &name, err.to_string()),
            }
        }
        banks
    }

    /// Keep, merge and save the bank profiles according to the mode.
    fn assemble(&self, banks: BTreeMap<BankKey, Histogram>, report: &mut ReductionReport) {
        let options = &self.state.reduction;
        let keep_banks = !matches!(options.mode, ReductionMode::Merged);
        let slices = time_slices(self.state);
        let ranges = self.state.wavelength.all_ranges();
        let merger = BankMerger::from_options(&self.state.merge);

        for (si, slice) in slices.iter().enumerate() {
            for (ri, range) in ranges.iter().enumerate() {
                let key = OutputKey { slice: si, range: ri };
                let name_of = |what: &str| output_name(&options.sample_run, what, range, slice.as_ref());
                let output = |name: String, component, intensity: Workspace| ReducedOutput {
                    name,
                    component,
                    time_slice: *slice,
                    wavelength_range: *range,
                    intensity,
                };

                if keep_banks {
                    for component in options.mode.components() {
                        if let Some(h) = banks.get(&(component, key)) {
                            let profile = Workspace::profile(XUnit::MomentumTransfer, h.clone());
                            self.push(report, output(name_of(&component.to_string()), Some(component), profile));
                        }
                    }
                }
                if !options.mode.merges() {
                    continue;
                }
                let name = name_of("merged");
                let (Some(lab), Some(hab)) =
                    (banks.get(&(DetectorKind::Lab, key)), banks.get(&(DetectorKind::Hab, key)))
                else {
                    fail(report, &name, "a bank profile is missing".to_string());
                    continue;
                };
                match merger.merge(lab, hab) {
                    Ok(result) => {
                        report.merges.push(MergeRecord { name: name.clone(), summary: result.summary() });
                        self.push(report, output(name, None, result.merged));
                    }
                    Err(err) => fail(report, &name, err.to_string()),
                }
            }
        }
    }

    /// Record `out`, saving it first when a save prefix is configured.
    fn push(&self, report: &mut ReductionReport, out: ReducedOutput) {
        if let Some(prefix) = &self.state.reduction.save_prefix {
            let path = format!("{prefix}/{}", out.name);
            if let Err(err) = self.persistence.save_workspace(&out.intensity, &path) {
                fail(report, &out.name, err.to_string());
            }
        }
        report.outputs.push(out);
    }

    fn bank_name(&self, component: DetectorKind, job: &Job) -> String {
        let run = &self.state.reduction.sample_run;
        output_name(run, &component.to_string(), &job.range, job.request.time_slice.as_ref())
    }
}

fn can_subtracted(sample: &ReducedSlice, can: &ReducedSlice) -> WorkspaceResult<Histogram> {
    subtract_can(&sample.intensity()?, &can.intensity()?)
}

fn fail(report: &mut ReductionReport, name: &str, reason: String) {
    tracing::warn!(output = name, %reason, "reduction slice failed");
    report.failures.push(SliceFailure { name: name.to_string(), reason });
}

/// Run the request described by `state.reduction`.
pub fn run_reduction(
    state: &ReductionState, loader: &dyn DataLoader, services: ReductionServices<'_>,
    persistence: &dyn PersistenceService,
) -> OrchestrationResult<ReductionReport> {
    ReductionOrchestrator::new(state, loader, services, persistence).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        orchestration::errors::OrchestrationError,
        reduction::fixtures,
        services::{
            converter::ElasticConverter,
            errors::UpstreamError,
            masker::DetectorMasker,
            memory::{InMemoryLoader, MemoryStore},
        },
        state::{
            options::{FitPolicy, MergeOptions},
            reduction_state::StateConfig,
            windows::TimeSlice,
        },
    };
    use approx::assert_relative_eq;

    const SERVICES: ReductionServices<'static> =
        ReductionServices { converter: &ElasticConverter, masker: &DetectorMasker };

    fn run_with(config: StateConfig, loader: &InMemoryLoader, store: &MemoryStore) -> ReductionReport {
        let state = ReductionState::new(config).unwrap();
        run_reduction(&state, loader, SERVICES, store).unwrap()
    }

    fn loader(runs: Vec<(&str, LoadedRun)>) -> InMemoryLoader {
        let mut loader = InMemoryLoader::new();
        for (name, run) in runs {
            loader.insert(name, run);
        }
        loader
    }

    #[test]
    // Purpose
    // -------
    // Verify the single-bank path with persistence.
    //
    // Given
    // -----
    // - LAB mode, no can, save prefix "out".
    //
    // Expect
    // ------
    // - One output named after run, bank and range; it is saved under the
    //   prefix and no failures or merges are reported.
    fn lab_mode_produces_and_saves_one_output() {
        let mut config = fixtures::state_config();
        config.reduction.save_prefix = Some("out".to_string());
        let loader = loader(vec![("SANS2D00001", fixtures::run(0.0, 0.0))]);
        let store = MemoryStore::new();

        let report = run_with(config, &loader, &store);

        assert!(report.is_complete());
        assert_eq!(report.outputs.len(), 1);
        assert!(report.merges.is_empty());
        let out = report.output("SANS2D00001_LAB_3.0_8.0").unwrap();
        assert_eq!(out.component, Some(DetectorKind::Lab));
        assert_eq!(store.workspace_paths(), vec!["out/SANS2D00001_LAB_3.0_8.0".to_string()]);
    }

    #[test]
    // Purpose
    // -------
    // Verify merging in `All` mode.
    //
    // Given
    // -----
    // - A two-bank run with HAB = 2 × LAB and a scale-only merge at zero
    //   shift.
    //
    // Expect
    // ------
    // - Both banks and the merged profile are reported; the merge scale is 2.
    fn all_mode_keeps_banks_and_merges() {
        let mut config = fixtures::state_config();
        config.geometry = fixtures::geometry(true);
        config.reduction.mode = ReductionMode::All;
        config.merge = MergeOptions { policy: FitPolicy::ScaleOnly { shift: 0.0 }, fit_range: None };
        let loader = loader(vec![("SANS2D00001", fixtures::two_bank_run(2.0))]);
        let store = MemoryStore::new();

        let report = run_with(config, &loader, &store);

        assert!(report.is_complete(), "{:?}", report.failures);
        let names: Vec<&str> = report.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["SANS2D00001_LAB_3.0_8.0", "SANS2D00001_HAB_3.0_8.0", "SANS2D00001_merged_3.0_8.0"]);
        assert_eq!(report.merges.len(), 1);
        assert_relative_eq!(report.merges[0].summary.scale, 2.0, epsilon = 1e-9);
        assert!(report.summary_json().unwrap().contains("SANS2D00001_merged_3.0_8.0"));
    }

    #[test]
    // Purpose
    // -------
    // Verify that a failing bank does not abort its siblings.
    //
    // Given
    // -----
    // - `All` mode on an instrument without a HAB bank.
    //
    // Expect
    // ------
    // - The LAB output is produced; the HAB job, HAB output and merged
    //   output are reported as failures.
    fn failed_bank_is_isolated() {
        let mut config = fixtures::state_config();
        config.reduction.mode = ReductionMode::All;
        let loader = loader(vec![("SANS2D00001", fixtures::run(0.0, 0.0))]);
        let store = MemoryStore::new();

        let report = run_with(config, &loader, &store);

        assert_eq!(report.outputs.len(), 1);
        assert!(report.output("SANS2D00001_LAB_3.0_8.0").is_some());
        assert!(report.failure("SANS2D00001_HAB_sample_3.0_8.0").unwrap().reason.contains("HAB"));
        assert!(report.failure("SANS2D00001_HAB_3.0_8.0").is_some());
        assert!(report.failure("SANS2D00001_merged_3.0_8.0").is_some());
    }

    #[test]
    // Purpose
    // -------
    // Verify the can subtraction.
    //
    // Given
    // -----
    // - Identical sample and can runs.
    //
    // Expect
    // ------
    // - Every defined bin of the output is exactly zero.
    fn identical_can_cancels_sample() {
        let mut config = fixtures::state_config();
        config.reduction.can_run = Some("CAN".to_string());
        let loader = loader(vec![("SANS2D00001", fixtures::run(0.0, 0.0)), ("CAN", fixtures::run(0.0, 0.0))]);
        let store = MemoryStore::new();

        let report = run_with(config, &loader, &store);

        assert!(report.is_complete());
        let h = report.outputs[0].intensity.histogram(0).unwrap();
        assert!(h.y.iter().any(|v| v.is_finite()));
        assert!(h.y.iter().filter(|v| v.is_finite()).all(|&v| v == 0.0));
    }

    #[test]
    fn time_slices_get_separate_outputs() {
        let mut config = fixtures::state_config();
        config.reduction.time_slices = vec![TimeSlice { start: 0.0, stop: 5.0 }, TimeSlice { start: 5.0, stop: 10.0 }];
        let loader = loader(vec![("SANS2D00001", fixtures::event_run(0.0, 0.0))]);
        let store = MemoryStore::new();

        let report = run_with(config, &loader, &store);

        assert!(report.is_complete(), "{:?}", report.failures);
        assert!(report.output("SANS2D00001_LAB_3.0_8.0_t0.0_5.0").is_some());
        assert!(report.output("SANS2D00001_LAB_3.0_8.0_t5.0_10.0").is_some());
    }

    #[test]
    fn missing_can_run_aborts() {
        let mut config = fixtures::state_config();
        config.reduction.can_run = Some("CAN".to_string());
        let state = ReductionState::new(config).unwrap();
        let loader = loader(vec![("SANS2D00001", fixtures::run(0.0, 0.0))]);

        let err = run_reduction(&state, &loader, SERVICES, &MemoryStore::new()).unwrap_err();

        assert_eq!(err, OrchestrationError::Upstream(UpstreamError::RunNotFound { run: "CAN".to_string() }));
    }
}

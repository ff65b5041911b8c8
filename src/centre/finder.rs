//! Entry point of the beam-centre search.
use crate::{
    centre::{
        errors::SearchResult,
        mass::centre_of_mass,
        options::{CentreMethod, CentreOptions},
        problem::QuadrantProblem,
        result::CentreResult,
        run::{run_quadrant_search, SearchOutcome},
        solver::QuadrantSearch,
    },
    reduction::{
        pipeline::DetectorReductionCore,
        slice::{ReductionServices, SliceRequest},
    },
    services::traits::{LoadedRun, PersistenceService},
    state::{options::DataType, reduction_state::ReductionState},
};

/// Estimates the beam centre of one bank and persists it as an `(X, Y)`
/// table.
pub struct BeamCentreFinder<'a> {
    core: DetectorReductionCore<'a>,
    persistence: &'a dyn PersistenceService,
    verbose: bool,
}

impl<'a> BeamCentreFinder<'a> {
    pub fn new(
        state: &'a ReductionState, services: ReductionServices<'a>, persistence: &'a dyn PersistenceService,
    ) -> Self {
        BeamCentreFinder { core: DetectorReductionCore::new(state, services), persistence, verbose: false }
    }

    /// Attach the terminal slog observer to the quadrant search (only with
    /// the `obs_slog` feature).
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run the configured estimator on the sample data of `run`.
    ///
    /// Errors
    /// ------
    /// - `CentreError::InvalidOption` from option validation.
    /// - `CentreError::Reduction` from pre-flight validation or any
    ///   reduction of a candidate.
    /// - `CentreError::NoSignal`, `CentreError::NonFiniteResidual` and the
    ///   solver errors.
    /// - `CentreError::Upstream` when the table cannot be saved.
    pub fn find(&self, run: &LoadedRun, options: &CentreOptions) -> SearchResult<CentreResult> {
        options.validate()?;
        let state = self.core.state();
        let start = options.start.unwrap_or_else(|| state.beam_centre.get(options.component));
        let request = SliceRequest::new(options.component, DataType::Sample);
        self.core.validate(run, &request)?;
        tracing::info!(
            component = %options.component,
            method = ?options.method,
            direction = %options.direction,
            x = start.x,
            y = start.y,
            "beam centre search started"
        );

        let outcome: SearchOutcome = match options.method {
            CentreMethod::QuadrantResidual => {
                let problem = QuadrantProblem::new(self.core, run, request, options.radius_limits);
                let solver = QuadrantSearch::new(options.step, options.direction.active(), options.tolerance);
                run_quadrant_search(problem, solver, [start.x, start.y], options.max_iterations, self.verbose)?
            }
            CentreMethod::CentreOfMass => centre_of_mass(
                &self.core,
                run,
                &request,
                start,
                options.radius_limits.0,
                options.max_iterations,
                options.tolerance,
            )?,
        };

        let [x, y] = outcome.centre;
        let table_id = self.persistence.save_table(&["X", "Y"], &[vec![x, y]])?;
        tracing::info!(
            x,
            y,
            status = %outcome.status,
            iterations = outcome.iterations,
            residual = outcome.residual,
            table = %table_id,
            "beam centre search finished"
        );
        Ok(CentreResult {
            x,
            y,
            status: outcome.status,
            iterations: outcome.iterations,
            residual: outcome.residual,
            table_id,
        })
    }
}

/// Find the beam centre of `options.component` in `run`.
pub fn find_centre(
    state: &ReductionState, run: &LoadedRun, services: ReductionServices<'_>, persistence: &dyn PersistenceService,
    options: &CentreOptions,
) -> SearchResult<CentreResult> {
    BeamCentreFinder::new(state, services, persistence).find(run, options)
}

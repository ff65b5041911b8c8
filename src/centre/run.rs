//! Execution helper that runs the quadrant search through `argmin`.
use crate::centre::{
    errors::{CentreError, SearchResult},
    problem::QuadrantResiduals,
    result::CentreStatus,
    solver::QuadrantSearch,
};
use argmin::core::{CostFunction, Executor, State};

/// Best position and bookkeeping of a finished search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub centre: [f64; 2],
    pub residual: f64,
    pub status: CentreStatus,
    pub iterations: u64,
}

/// Run `solver` on `problem` from `start` for at most `max_iters`
/// iterations.
///
/// With the `obs_slog` feature and `verbose` set, the residual at `start`
/// is logged once and a terminal slog observer is attached with
/// `ObserverMode::Always`.
///
/// Errors
/// ------
/// - Residual evaluation failures, recovered from the `argmin` error.
/// - `CentreError::MissingEstimate` if no position was evaluated.
/// - `CentreError::Terminated` for termination reasons other than
///   convergence and the iteration cap.
pub fn run_quadrant_search<O>(
    problem: O, solver: QuadrantSearch, start: [f64; 2], max_iters: u64,
    #[cfg_attr(not(feature = "obs_slog"), allow(unused_variables))] verbose: bool,
) -> SearchResult<SearchOutcome>
where
    O: QuadrantResiduals + CostFunction<Param = Vec<f64>, Output = f64>,
{
    #[cfg(feature = "obs_slog")]
    if verbose {
        log_initial_state(&start, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(start.to_vec()).max_iters(max_iters));
    #[cfg(feature = "obs_slog")]
    if verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let result = optimizer.run()?.state().clone();
    let status = CentreStatus::from_termination(result.get_termination_status())?;
    let best = result.get_best_param().ok_or(CentreError::MissingEstimate)?;
    if best.len() != 2 {
        return Err(CentreError::MissingEstimate);
    }
    Ok(SearchOutcome {
        centre: [best[0], best[1]],
        residual: result.get_best_cost(),
        status,
        iterations: result.get_iter(),
    })
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<O>(start: &[f64; 2], problem: &O) -> SearchResult<()>
where
    O: CostFunction<Param = Vec<f64>, Output = f64>,
{
    let residual = problem.cost(&start.to_vec())?;
    tracing::info!(x = start[0], y = start[1], residual, "centre search start");
    Ok(())
}

//! Direction-restricted step search over quadrant residuals.
//!
//! Each iteration evaluates the residuals at the pending candidate, then
//! moves every active coordinate by its current step. A coordinate whose
//! residual grew since the previous evaluation has its step reversed and
//! halved first. The search converges when the active residual drops below
//! the tolerance or changes by less than the tolerance; otherwise the
//! executor's iteration cap ends it.
use crate::centre::problem::QuadrantResiduals;
use argmin::core::{ArgminError, Error, IterState, Problem, Solver, State, TerminationReason, KV};
use serde::{Deserialize, Serialize};

type SearchState = IterState<Vec<f64>, (), (), (), (), f64>;

/// `argmin` solver for the quadrant beam-centre search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantSearch {
    step: [f64; 2],
    active: [bool; 2],
    tolerance: f64,
    previous: Option<[f64; 2]>,
    pending: Option<Vec<f64>>,
}

impl QuadrantSearch {
    pub fn new(step: f64, active: [bool; 2], tolerance: f64) -> Self {
        QuadrantSearch { step: [step, step], active, tolerance, previous: None, pending: None }
    }

    /// Current per-coordinate steps.
    pub fn steps(&self) -> [f64; 2] {
        self.step
    }

    fn active_sum(&self, residuals: [f64; 2]) -> f64 {
        (0..2).filter(|&d| self.active[d]).map(|d| residuals[d]).sum()
    }
}

impl<O: QuadrantResiduals> Solver<O, SearchState> for QuadrantSearch {
    const NAME: &'static str = "Quadrant step search";

    fn init(&mut self, _problem: &mut Problem<O>, state: SearchState) -> Result<(SearchState, Option<KV>), Error> {
        let start = state
            .get_param()
            .ok_or_else(|| ArgminError::NotInitialized { text: "initial centre required".into() })?;
        if start.len() != 2 {
            return Err(ArgminError::InvalidParameter { text: format!("centre has {} coordinates", start.len()) }.into());
        }
        self.pending = Some(start.clone());
        self.previous = None;
        Ok((state, None))
    }

    fn next_iter(&mut self, problem: &mut Problem<O>, state: SearchState) -> Result<(SearchState, Option<KV>), Error> {
        let candidate = self
            .pending
            .take()
            .ok_or_else(|| ArgminError::PotentialBug { text: "no pending candidate".into() })?;
        let residuals = problem.problem("residual_count", |p| p.residuals(&candidate))?;
        let total = self.active_sum(residuals);
        tracing::info!(
            iteration = state.get_iter() + 1,
            x = candidate[0],
            y = candidate[1],
            left_right = residuals[0],
            top_bottom = residuals[1],
            "centre search step"
        );

        let settled = match self.previous {
            Some(prev) => (self.active_sum(prev) - total).abs() < self.tolerance,
            None => false,
        };
        if total < self.tolerance || settled {
            let state = state.param(candidate).cost(total).terminate_with(TerminationReason::SolverConverged);
            return Ok((state, None));
        }

        if let Some(prev) = self.previous {
            for d in 0..2 {
                if self.active[d] && residuals[d] > prev[d] {
                    self.step[d] = -0.5 * self.step[d];
                }
            }
        }
        self.previous = Some(residuals);
        let mut next = candidate.clone();
        for d in 0..2 {
            if self.active[d] {
                next[d] += self.step[d];
            }
        }
        self.pending = Some(next);
        Ok((state.param(candidate).cost(total), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argmin::core::{Executor, TerminationStatus};

    /// Residuals of a bowl centred at `(cx, cy)`.
    struct Bowl {
        cx: f64,
        cy: f64,
    }

    impl QuadrantResiduals for Bowl {
        fn residuals(&self, c: &[f64]) -> Result<[f64; 2], Error> {
            Ok([(c[0] - self.cx).powi(2), (c[1] - self.cy).powi(2)])
        }
    }

    fn run(bowl: Bowl, solver: QuadrantSearch, max_iters: u64) -> SearchState {
        Executor::new(bowl, solver)
            .configure(|state| state.param(vec![0.0, 0.0]).max_iters(max_iters))
            .run()
            .unwrap()
            .state()
            .clone()
    }

    #[test]
    fn solver_reports_its_name() {
        assert_eq!(<QuadrantSearch as Solver<Bowl, SearchState>>::NAME, "Quadrant step search");
    }

    #[test]
    // Purpose
    // -------
    // Verify the one-iteration exit at a perfect start.
    //
    // Given
    // -----
    // - A bowl centred at the start.
    //
    // Expect
    // ------
    // - Converged after one iteration with zero cost at the start.
    fn converges_immediately_at_true_centre() {
        let state = run(Bowl { cx: 0.0, cy: 0.0 }, QuadrantSearch::new(0.01, [true, true], 1e-8), 10);

        assert_eq!(state.get_iter(), 1);
        assert_eq!(state.get_best_cost(), 0.0);
        assert_eq!(state.get_best_param(), Some(&vec![0.0, 0.0]));
        assert_eq!(
            state.get_termination_status(),
            &TerminationStatus::Terminated(TerminationReason::SolverConverged)
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify the reverse-and-halve rule and the direction restriction.
    //
    // Given
    // -----
    // - A bowl at (0.013, 0.02), search restricted to x, tight tolerance.
    //
    // Expect
    // ------
    // - The iteration cap is reached, y is never moved and the best x is
    //   closer to 0.013 than the start.
    fn moves_only_active_direction_toward_minimum() {
        let state = run(Bowl { cx: 0.013, cy: 0.02 }, QuadrantSearch::new(0.01, [true, false], 1e-12), 6);

        assert_eq!(
            state.get_termination_status(),
            &TerminationStatus::Terminated(TerminationReason::MaxItersReached)
        );
        let best = state.get_best_param().unwrap();
        assert_eq!(best[1], 0.0);
        assert!((best[0] - 0.013).abs() < 0.004);
    }
}

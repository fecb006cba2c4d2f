//! Continuous relaxation oracle.
//!
//! The search engine never solves relaxations itself. It hands each node's
//! relaxation to a [`RelaxationOracle`] and only looks at the returned
//! point, objective value and status.

mod simplex;

pub use simplex::SimplexOracle;

use crate::cuts::LinearCut;
use crate::error::MipResult;
use crate::model::MipProblem;

/// Outcome of a relaxation solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelaxationStatus {
    /// Optimal relaxation point found.
    Optimal,

    /// The relaxation has no feasible point.
    Infeasible,

    /// The relaxation objective is unbounded.
    Unbounded,

    /// The oracle gave up (iteration limit, numerical trouble).
    Failed,
}

/// Result returned by the oracle.
#[derive(Debug, Clone)]
pub struct RelaxationResult {
    /// Solve status.
    pub status: RelaxationStatus,

    /// Relaxation point (meaningful only when optimal).
    pub x: Vec<f64>,

    /// Objective value at `x`, in the problem's own sense.
    pub obj_val: f64,

    /// Iterations used.
    pub iterations: usize,
}

impl RelaxationResult {
    /// A result carrying no point.
    pub fn failed(status: RelaxationStatus, iterations: usize) -> Self {
        Self {
            status,
            x: Vec::new(),
            obj_val: f64::NAN,
            iterations,
        }
    }

    /// Whether the solve produced a usable point.
    pub fn is_success(&self) -> bool {
        self.status == RelaxationStatus::Optimal
    }

    /// Optimal, with a point of length `num_vars` and a finite objective.
    ///
    /// Anything else is treated as an oracle failure by the search.
    pub fn is_usable(&self, num_vars: usize) -> bool {
        self.is_success() && self.x.len() == num_vars && self.obj_val.is_finite()
    }
}

/// One node's relaxation: the root problem with node-local bounds and cuts.
#[derive(Debug, Clone)]
pub struct Relaxation<'a> {
    /// Root problem (objective, rows, integrality).
    pub problem: &'a MipProblem,

    /// Node-local lower bounds.
    pub var_lb: &'a [f64],

    /// Node-local upper bounds.
    pub var_ub: &'a [f64],

    /// Cuts active at the node, each `a^T x <= rhs`.
    pub cuts: Vec<&'a LinearCut>,

    /// Starting point: the problem's initial point clipped into `var_lb`/`var_ub`.
    pub start: &'a [f64],
}

/// Solves continuous relaxations for the search.
///
/// Implementations may carry their own non-linear objective or constraints;
/// the engine only requires that every returned point respects the
/// relaxation's bounds and the problem's linear rows.
pub trait RelaxationOracle {
    /// Reject problems this oracle cannot handle. Called once before search.
    fn check(&self, _prob: &MipProblem) -> MipResult<()> {
        Ok(())
    }

    /// Solve one relaxation. Must not panic on infeasible input.
    fn solve(&mut self, relaxation: &Relaxation<'_>) -> RelaxationResult;
}

impl<O: RelaxationOracle + ?Sized> RelaxationOracle for &mut O {
    fn check(&self, prob: &MipProblem) -> MipResult<()> {
        (**self).check(prob)
    }

    fn solve(&mut self, relaxation: &Relaxation<'_>) -> RelaxationResult {
        (**self).solve(relaxation)
    }
}

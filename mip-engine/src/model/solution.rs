//! MIP solution types.

use super::ObjectiveSense;
use crate::cuts::CutStats;

/// Smallest denominator used in relative gap computations.
pub const GAP_EPS: f64 = 1e-10;

/// Status of the MIP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipStatus {
    /// Optimal solution found (frontier exhausted or gap within tolerance).
    Optimal,

    /// A limit stopped the search; the incumbent is the best solution found.
    Feasible,

    /// Frontier exhausted without finding an integer-feasible point.
    Infeasible,

    /// Node limit reached before any incumbent was found.
    NodeLimitReached,

    /// Time limit reached before any incumbent was found.
    TimeLimitReached,
}

impl MipStatus {
    /// Returns true if a feasible solution was found.
    pub fn has_solution(&self) -> bool {
        matches!(self, MipStatus::Optimal | MipStatus::Feasible)
    }

    /// Returns true if optimality was proven (within the gap tolerance).
    pub fn is_optimal(&self) -> bool {
        matches!(self, MipStatus::Optimal)
    }

    /// Returns true if a resource limit ended the search.
    pub fn hit_limit(&self) -> bool {
        matches!(
            self,
            MipStatus::Feasible | MipStatus::NodeLimitReached | MipStatus::TimeLimitReached
        )
    }
}

/// Complete MIP solution with diagnostics.
#[derive(Debug, Clone)]
pub struct MipSolution {
    /// Solve status.
    pub status: MipStatus,

    /// Primal solution (empty if none was found).
    pub x: Vec<f64>,

    /// Objective value of best solution, in the problem's own sense.
    pub obj_val: f64,

    /// Best remaining dual bound, in the problem's own sense.
    pub bound: f64,

    /// Relative optimality gap: |obj_val - bound| / max(|obj_val|, eps).
    pub gap: f64,

    /// Number of nodes whose relaxation was solved.
    pub nodes_explored: u64,

    /// Nodes pruned because their bound could not beat the incumbent.
    pub nodes_pruned_bound: u64,

    /// Nodes pruned because their relaxation failed or was infeasible.
    pub nodes_pruned_infeasible: u64,

    /// Nodes that were split into children.
    pub nodes_branched: u64,

    /// Deepest node solved.
    pub max_depth: usize,

    /// Cutting plane statistics.
    pub cuts: CutStats,

    /// Relaxations solved while strong branching.
    pub strong_branch_solves: u64,

    /// Total relaxation oracle calls.
    pub oracle_calls: u64,

    /// Total solve time in milliseconds.
    pub solve_time_ms: u64,

    /// Number of times incumbent was updated.
    pub incumbent_updates: u64,

    /// (nodes explored, objective) at every incumbent update, in the problem's sense.
    pub incumbent_trace: Vec<(u64, f64)>,
}

impl Default for MipSolution {
    fn default() -> Self {
        Self {
            status: MipStatus::Infeasible,
            x: Vec::new(),
            obj_val: f64::INFINITY,
            bound: f64::NEG_INFINITY,
            gap: f64::INFINITY,
            nodes_explored: 0,
            nodes_pruned_bound: 0,
            nodes_pruned_infeasible: 0,
            nodes_branched: 0,
            max_depth: 0,
            cuts: CutStats::default(),
            strong_branch_solves: 0,
            oracle_calls: 0,
            solve_time_ms: 0,
            incumbent_updates: 0,
            incumbent_trace: Vec::new(),
        }
    }
}

impl MipSolution {
    /// Compute relative gap.
    pub fn compute_gap(primal: f64, dual: f64) -> f64 {
        if primal.is_infinite() || dual.is_infinite() {
            return f64::INFINITY;
        }
        let denom = primal.abs().max(GAP_EPS);
        (primal - dual).abs() / denom
    }
}

/// Tracks the best known feasible solution (incumbent).
///
/// Objectives are stored in minimization form; `sense` maps them back.
#[derive(Debug, Clone)]
pub struct IncumbentTracker {
    /// Current best solution (if any).
    pub solution: Option<Vec<f64>>,

    /// Objective value of incumbent in minimization form (primal bound).
    /// Initialized to +inf.
    pub obj_val: f64,

    /// Number of times incumbent was updated.
    pub update_count: u64,

    /// Optimization direction of the original problem.
    pub sense: ObjectiveSense,

    /// (node, minimization-form objective) for each update.
    pub trace: Vec<(u64, f64)>,
}

impl Default for IncumbentTracker {
    fn default() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
}

impl IncumbentTracker {
    /// Create a new incumbent tracker.
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            solution: None,
            obj_val: f64::INFINITY,
            update_count: 0,
            sense,
            trace: Vec::new(),
        }
    }

    /// Check if we have an incumbent.
    pub fn has_incumbent(&self) -> bool {
        self.solution.is_some()
    }

    /// Try to update incumbent with a new solution.
    ///
    /// `obj` is in minimization form. Returns true if the incumbent was
    /// strictly improved; the incumbent never regresses.
    pub fn update(&mut self, x: &[f64], obj: f64, node: u64) -> bool {
        if obj < self.obj_val - 1e-9 {
            self.solution = Some(x.to_vec());
            self.obj_val = obj;
            self.update_count += 1;
            self.trace.push((node, obj));
            true
        } else {
            false
        }
    }

    /// Incumbent objective in the problem's own sense.
    pub fn objective(&self) -> f64 {
        self.sense.sign() * self.obj_val
    }

    /// Compute relative gap to a minimization-form dual bound.
    pub fn gap(&self, dual_bound: f64) -> f64 {
        MipSolution::compute_gap(self.obj_val, dual_bound.min(self.obj_val))
    }
}

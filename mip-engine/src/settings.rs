//! Configuration settings for the MIP solver.

use crate::error::{MipError, MipResult};

/// Branching variable selection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchingRule {
    /// Select variable with fractional part closest to 0.5.
    #[default]
    MostFractional,

    /// Use pseudocost estimates from previous branches.
    Pseudocost,

    /// Strong branching: solve both child relaxations for the most
    /// fractional candidates and keep the best worst-case degradation.
    ///
    /// Once more than `node_limit` nodes have been explored the selector
    /// falls back to pseudocost branching.
    StrongBranching {
        /// Number of candidate variables to evaluate.
        candidates: usize,

        /// Only strong branch while at most this many nodes were explored.
        node_limit: u64,
    },
}

/// Node selection strategy for the B&B tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// Always select node with best dual bound.
    #[default]
    BestBound,

    /// Depth-first search: most recently created node first.
    DepthFirst,

    /// Breadth-first search: nodes in the order they were created.
    BreadthFirst,

    /// Select by estimated objective of the best integer solution below the node.
    BestEstimate,
}

/// MIP solver settings.
#[derive(Debug, Clone)]
pub struct MipSettings {
    // === Termination criteria ===
    /// Maximum number of nodes to explore.
    pub max_nodes: u64,

    /// Time limit in milliseconds (None = unlimited).
    pub time_limit_ms: Option<u64>,

    /// Relative optimality gap tolerance.
    /// Stop when |incumbent - bound| / max(|incumbent|, eps) <= gap_tol.
    pub gap_tol: f64,

    /// Absolute slack used when pruning nodes against the incumbent.
    pub gap_abs_tol: f64,

    /// Integer feasibility tolerance.
    /// A variable is considered integer if |x - round(x)| <= int_feas_tol.
    pub int_feas_tol: f64,

    /// Constraint feasibility tolerance for candidate incumbents.
    pub feas_tol: f64,

    // === Search strategy ===
    /// Branching variable selection rule.
    pub branching_rule: BranchingRule,

    /// Node selection strategy.
    pub node_selection: NodeSelection,

    // === Cut settings ===
    /// Maximum separation rounds per node (0 = plain branch-and-bound).
    pub max_cut_rounds: usize,

    /// Maximum cuts to add per separation round.
    pub cuts_per_round: usize,

    /// Minimum violation for a cut to be added.
    pub cut_violation_tol: f64,

    /// Generate Chvátal-Gomory rounding cuts.
    pub gomory_cuts: bool,

    /// Generate mixed-integer rounding cuts.
    pub mir_cuts: bool,

    /// Generate knapsack cover cuts.
    pub cover_cuts: bool,

    // === Relaxation ===
    /// Iteration cap for the built-in simplex oracle.
    pub oracle_max_iter: usize,

    // === Output ===
    /// Print progress information.
    pub verbose: bool,

    /// Log frequency (print every N nodes).
    pub log_freq: u64,
}

impl Default for MipSettings {
    fn default() -> Self {
        Self {
            // Termination
            max_nodes: 10_000,
            time_limit_ms: Some(60_000),
            gap_tol: 1e-4,
            gap_abs_tol: 1e-6,
            int_feas_tol: 1e-6,
            feas_tol: 1e-6,

            // Search
            branching_rule: BranchingRule::default(),
            node_selection: NodeSelection::default(),

            // Cuts
            max_cut_rounds: 0,
            cuts_per_round: 50,
            cut_violation_tol: 1e-6,
            gomory_cuts: true,
            mir_cuts: true,
            cover_cuts: true,

            // Relaxation
            oracle_max_iter: 10_000,

            // Output
            verbose: false,
            log_freq: 100,
        }
    }
}

impl MipSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            log_freq: 1,
            ..Self::default()
        }
    }

    /// Branch-and-cut defaults: five separation rounds, all cut families.
    pub fn branch_and_cut() -> Self {
        Self {
            max_cut_rounds: 5,
            ..Self::default()
        }
    }

    /// Whether any cut family will run.
    pub fn cuts_enabled(&self) -> bool {
        self.max_cut_rounds > 0 && (self.gomory_cuts || self.mir_cuts || self.cover_cuts)
    }

    /// Set time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Remove the time limit.
    pub fn without_time_limit(mut self) -> Self {
        self.time_limit_ms = None;
        self
    }

    /// Set maximum nodes.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set optimality gap tolerance.
    pub fn with_gap_tol(mut self, tol: f64) -> Self {
        self.gap_tol = tol;
        self
    }

    /// Set the node selection strategy.
    pub fn with_node_selection(mut self, selection: NodeSelection) -> Self {
        self.node_selection = selection;
        self
    }

    /// Set the branching rule.
    pub fn with_branching_rule(mut self, rule: BranchingRule) -> Self {
        self.branching_rule = rule;
        self
    }

    /// Set the number of cutting rounds per node.
    pub fn with_cut_rounds(mut self, rounds: usize) -> Self {
        self.max_cut_rounds = rounds;
        self
    }

    /// Toggle individual cut families.
    pub fn with_cut_families(mut self, gomory: bool, mir: bool, cover: bool) -> Self {
        self.gomory_cuts = gomory;
        self.mir_cuts = mir;
        self.cover_cuts = cover;
        self
    }

    /// Reject tolerances the search cannot work with.
    pub fn validate(&self) -> MipResult<()> {
        if !(0.0..0.5).contains(&self.int_feas_tol) {
            return Err(MipError::InvalidProblem(format!(
                "integrality tolerance {} outside [0, 0.5)",
                self.int_feas_tol
            )));
        }
        let tolerances = [
            ("gap_tol", self.gap_tol),
            ("gap_abs_tol", self.gap_abs_tol),
            ("feas_tol", self.feas_tol),
            ("cut_violation_tol", self.cut_violation_tol),
        ];
        for (name, tol) in tolerances {
            if tol.is_nan() || tol < 0.0 {
                return Err(MipError::InvalidProblem(format!("{} must be nonnegative, got {}", name, tol)));
            }
        }
        Ok(())
    }
}

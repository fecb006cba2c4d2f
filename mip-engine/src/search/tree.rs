//! Branch-and-bound tree controller.

use super::{
    BoundChange, BranchDecision, BranchRecord, BranchingSelector, NodeQueue, NodeStatus,
    SearchNode, SearchProgress, TerminationController,
};
use crate::cuts::CutStats;
use crate::model::{IncumbentTracker, MipProblem, MipSolution, MipStatus};
use crate::settings::MipSettings;

/// Branch-and-bound tree controller.
///
/// Owns the node queue, branching selector, incumbent and termination
/// controller. All objective values are in minimization form.
pub struct BranchAndBound {
    /// Node queue.
    queue: NodeQueue,

    /// Branching variable selector.
    branching: BranchingSelector,

    /// Incumbent solution tracker.
    pub incumbent: IncumbentTracker,

    /// Stopping rules and clock.
    termination: TerminationController,

    /// Next node ID to assign.
    next_node_id: u64,

    /// Relaxations solved (excluding strong branching trial solves).
    nodes_explored: u64,

    /// Nodes pruned by bound.
    nodes_pruned_bound: u64,

    /// Nodes pruned by infeasibility or oracle failure.
    nodes_pruned_infeasible: u64,

    /// Nodes split into children.
    nodes_branched: u64,

    /// Deepest node solved.
    max_depth: usize,

    /// Settings.
    settings: MipSettings,
}

impl BranchAndBound {
    /// Create a new B&B controller for `prob`.
    pub fn new(settings: MipSettings, prob: &MipProblem) -> Self {
        Self {
            queue: NodeQueue::new(settings.node_selection),
            branching: BranchingSelector::new(settings.branching_rule, prob),
            incumbent: IncumbentTracker::new(prob.sense),
            termination: TerminationController::new(&settings),
            next_node_id: 1, // 0 reserved for root
            nodes_explored: 0,
            nodes_pruned_bound: 0,
            nodes_pruned_infeasible: 0,
            nodes_branched: 0,
            max_depth: 0,
            settings,
        }
    }

    /// Initialize with the root node.
    pub fn initialize(&mut self, root_bound: f64) {
        let mut root = SearchNode::root();
        root.dual_bound = root_bound;
        root.estimate = root_bound;
        self.queue.push(root);
    }

    /// Get the next node to process.
    pub fn next_node(&mut self) -> Option<SearchNode> {
        self.queue.pop()
    }

    /// Mark a node's relaxation as solved.
    pub fn node_explored(&mut self, depth: usize) {
        self.nodes_explored += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    /// Relaxations solved so far.
    pub fn nodes_explored(&self) -> u64 {
        self.nodes_explored
    }

    /// Record what happened to a processed node.
    pub fn record(&mut self, status: NodeStatus) {
        match status {
            NodeStatus::Pruned => self.nodes_pruned_bound += 1,
            NodeStatus::Infeasible => self.nodes_pruned_infeasible += 1,
            // counted in `branch`
            NodeStatus::Branched | NodeStatus::IntegerFeasible => {}
        }
    }

    /// Whether a node with this dual bound cannot beat the incumbent.
    pub fn is_dominated(&self, dual_bound: f64) -> bool {
        self.incumbent.has_incumbent()
            && dual_bound >= self.incumbent.obj_val - self.settings.gap_abs_tol
    }

    /// Create two children of `parent` and queue them.
    ///
    /// Children whose bound changes empty a domain are dropped and counted
    /// as infeasible. Both children inherit `node_obj` as their bound.
    pub fn branch(
        &mut self,
        parent: &SearchNode,
        node_obj: f64,
        estimate: f64,
        children: [(&[BoundChange], Option<BranchRecord>); 2],
    ) {
        for (changes, record) in children {
            if changes.iter().any(BoundChange::is_infeasible) {
                self.nodes_pruned_infeasible += 1;
                continue;
            }
            let mut child = parent.child(self.next_node_id, changes, record);
            self.next_node_id += 1;
            child.dual_bound = node_obj;
            child.estimate = estimate;
            self.queue.push(child);
        }
        self.nodes_branched += 1;
    }

    /// Select a branching variable; see [`BranchingSelector::select`].
    pub fn select_branching<F>(
        &mut self,
        fractional: &[(usize, f64, f64)],
        node_obj: f64,
        lb: &[f64],
        ub: &[f64],
        trial_solve: F,
    ) -> Option<BranchDecision>
    where
        F: FnMut(&BoundChange) -> Option<f64>,
    {
        self.branching
            .select(fractional, node_obj, lb, ub, self.nodes_explored, trial_solve)
    }

    /// Branching selector (pseudocosts, estimates).
    pub fn branching(&mut self) -> &mut BranchingSelector {
        &mut self.branching
    }

    /// Update incumbent with a new solution.
    ///
    /// Returns true if incumbent was improved.
    pub fn update_incumbent(&mut self, x: &[f64], obj: f64) -> bool {
        let improved = self.incumbent.update(x, obj, self.nodes_explored);

        if improved {
            // Prune nodes dominated by new incumbent
            let pruned = self.queue.prune_by_bound(obj, self.settings.gap_abs_tol);
            self.nodes_pruned_bound += pruned as u64;

            if self.settings.verbose {
                log::info!(
                    "New incumbent: obj={:.6e}, node {}, pruned {} nodes",
                    self.incumbent.objective(),
                    self.nodes_explored,
                    pruned
                );
            }
        }

        improved
    }

    /// Best dual bound: open nodes, capped by the incumbent.
    pub fn best_bound(&self) -> f64 {
        self.queue.best_bound().min(self.incumbent.obj_val)
    }

    /// Get the current optimality gap.
    pub fn gap(&self) -> f64 {
        if self.incumbent.has_incumbent() {
            self.incumbent.gap(self.queue.best_bound())
        } else {
            f64::INFINITY
        }
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.termination.elapsed_ms()
    }

    /// Check termination conditions.
    ///
    /// Returns Some(status) if we should terminate, None otherwise.
    pub fn check_termination(&mut self) -> Option<MipStatus> {
        let progress = SearchProgress {
            frontier_empty: self.queue.is_empty(),
            has_incumbent: self.incumbent.has_incumbent(),
            nodes_explored: self.nodes_explored,
            gap: self.gap(),
        };
        self.termination.check(&progress)
    }

    /// Finalize the solve and return the solution.
    pub fn finalize(&self, status: MipStatus, cuts: CutStats, oracle_calls: u64) -> MipSolution {
        let sign = self.incumbent.sense.sign();
        MipSolution {
            status,
            x: self.incumbent.solution.clone().unwrap_or_default(),
            obj_val: sign * self.incumbent.obj_val,
            bound: sign * self.best_bound(),
            gap: self.gap(),
            nodes_explored: self.nodes_explored,
            nodes_pruned_bound: self.nodes_pruned_bound,
            nodes_pruned_infeasible: self.nodes_pruned_infeasible,
            nodes_branched: self.nodes_branched,
            max_depth: self.max_depth,
            cuts,
            strong_branch_solves: self.branching.strong_solves(),
            oracle_calls,
            solve_time_ms: self.elapsed_ms(),
            incumbent_updates: self.incumbent.update_count,
            incumbent_trace: self
                .incumbent
                .trace
                .iter()
                .map(|&(node, obj)| (node, sign * obj))
                .collect(),
        }
    }

    /// Log progress (if verbose).
    pub fn log_progress(&self) {
        if !self.settings.verbose || self.settings.log_freq == 0 {
            return;
        }

        if self.nodes_explored % self.settings.log_freq != 0 {
            return;
        }

        let sign = self.incumbent.sense.sign();
        log::info!(
            "Nodes: {} ({} open) | Bound: {:.6e} | Incumbent: {:.6e} | Gap: {:.2}% | Time: {:.1}s",
            self.nodes_explored,
            self.queue.len(),
            sign * self.best_bound(),
            sign * self.incumbent.obj_val,
            self.gap() * 100.0,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }
}

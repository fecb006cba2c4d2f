//! Branch-and-bound / branch-and-cut solve loop.

use crate::cuts::{CutPool, CutSeparator, CutStats, SeparatorSettings};
use crate::error::MipResult;
use crate::model::{MipProblem, MipSolution};
use crate::oracle::{Relaxation, RelaxationOracle, RelaxationResult, RelaxationStatus, SimplexOracle};
use crate::search::{
    classify, sos_branch, BoundChange, BranchAndBound, NodeOutcome, NodeStatus, SearchNode,
};
use crate::settings::MipSettings;

/// Solve a MIP with the built-in simplex oracle.
///
/// # Arguments
///
/// * `prob` - Problem data
/// * `settings` - Solver settings
///
/// # Returns
///
/// `MipSolution` with status, incumbent and statistics. Only input errors
/// are returned as `Err`; infeasibility and limits are statuses.
pub fn solve_mip(prob: &MipProblem, settings: &MipSettings) -> MipResult<MipSolution> {
    let mut oracle = SimplexOracle::new(settings.oracle_max_iter);
    solve_mip_with_oracle(prob, settings, &mut oracle)
}

/// Solve a MIP with a caller-supplied relaxation oracle.
pub fn solve_mip_with_oracle<O>(
    prob: &MipProblem,
    settings: &MipSettings,
    oracle: &mut O,
) -> MipResult<MipSolution>
where
    O: RelaxationOracle + ?Sized,
{
    MipSolver::new(prob, settings.clone(), oracle)?.solve()
}

/// Drives the search: pops nodes, solves relaxations, separates cuts,
/// classifies, and branches.
///
/// Objectives are handled in minimization form internally and mapped back
/// to the problem's sense in the returned [`MipSolution`].
pub struct MipSolver<'a, O: RelaxationOracle + ?Sized> {
    prob: &'a MipProblem,
    settings: MipSettings,
    oracle: &'a mut O,
    tree: BranchAndBound,
    pool: CutPool,
    separator: Option<CutSeparator>,
    cut_stats: CutStats,
    start: Vec<f64>,
    oracle_calls: u64,
}

impl<'a, O: RelaxationOracle + ?Sized> MipSolver<'a, O> {
    /// Validate inputs and set up the search.
    pub fn new(prob: &'a MipProblem, settings: MipSettings, oracle: &'a mut O) -> MipResult<Self> {
        prob.validate()?;
        settings.validate()?;
        oracle.check(prob)?;

        let separator = settings
            .cuts_enabled()
            .then(|| CutSeparator::new(prob, SeparatorSettings::from(&settings)));

        Ok(Self {
            prob,
            tree: BranchAndBound::new(settings.clone(), prob),
            settings,
            oracle,
            pool: CutPool::new(),
            separator,
            cut_stats: CutStats::default(),
            start: prob.initial_point(),
            oracle_calls: 0,
        })
    }

    /// Run the search to termination.
    pub fn solve(mut self) -> MipResult<MipSolution> {
        if self.settings.verbose {
            log::info!(
                "MIP: {} vars ({} integer/binary), {} rows, {} SOS sets, cuts {}",
                self.prob.num_vars(),
                self.prob.spec.declared().len(),
                self.prob.num_constraints(),
                self.prob.spec.sos_sets().len(),
                match &self.separator {
                    Some(sep) => format!("on ({} separable rows)", sep.num_rows()),
                    None => "off".to_string(),
                },
            );
        }

        self.tree.initialize(f64::NEG_INFINITY);

        let status = loop {
            if let Some(status) = self.tree.check_termination() {
                break status;
            }
            let Some(node) = self.tree.next_node() else {
                continue;
            };
            let outcome = self.process_node(node);
            self.tree.record(outcome);
            self.tree.log_progress();
        };

        let solution = self
            .tree
            .finalize(status, self.cut_stats.clone(), self.oracle_calls);

        if self.settings.verbose {
            log::info!(
                "MIP finished: {:?} | obj={:.6e} bound={:.6e} gap={:.2e} | nodes={} cuts={} | {:.3}s",
                solution.status,
                solution.obj_val,
                solution.bound,
                solution.gap,
                solution.nodes_explored,
                solution.cuts.total,
                solution.solve_time_ms as f64 / 1000.0,
            );
        }
        Ok(solution)
    }

    fn process_node(&mut self, mut node: SearchNode) -> NodeStatus {
        if self.tree.is_dominated(node.dual_bound) {
            log::debug!("node {}: pruned by inherited bound {:.6e}", node.id, node.dual_bound);
            return NodeStatus::Pruned;
        }

        if node.has_empty_domain(self.prob) {
            log::debug!("node {}: empty domain", node.id);
            return NodeStatus::Infeasible;
        }
        let (lb, ub) = node.local_bounds(self.prob);

        self.tree.node_explored(node.depth);
        let sign = self.prob.sense.sign();
        let mut result = self.solve_relaxation(&lb, &ub, &node.cuts);

        if let (Some(record), true) = (node.branch, result.is_usable(self.prob.num_vars())) {
            self.tree
                .branching()
                .update_pseudocosts(&record, sign * result.obj_val);
        }

        if self.separator.is_some() {
            result = self.cut_rounds(&mut node, &lb, &ub, result);
        }

        let outcome = classify(
            &result,
            self.prob.num_vars(),
            self.prob.sense,
            &self.prob.spec,
            self.tree.incumbent.obj_val,
            &self.settings,
        );

        match outcome {
            NodeOutcome::Infeasible => {
                if result.status == RelaxationStatus::Unbounded {
                    log::warn!("node {}: relaxation unbounded, node discarded", node.id);
                } else {
                    log::debug!("node {}: relaxation {:?}", node.id, result.status);
                }
                NodeStatus::Infeasible
            }
            NodeOutcome::BoundDominated => {
                log::debug!("node {}: pruned by bound {:.6e}", node.id, result.obj_val);
                NodeStatus::Pruned
            }
            NodeOutcome::IntegerFeasible => {
                if self.accept_candidate(&node, &result) {
                    NodeStatus::IntegerFeasible
                } else {
                    NodeStatus::Infeasible
                }
            }
            NodeOutcome::SosViolated(set) => self.branch_sos(&node, set, &result, &lb, &ub),
            NodeOutcome::Fractional(fractional) => {
                self.branch_variable(&node, &fractional, &result, &lb, &ub)
            }
        }
    }

    /// Solve the relaxation under local bounds and the given pool cuts.
    fn solve_relaxation(&mut self, lb: &[f64], ub: &[f64], cut_ids: &[usize]) -> RelaxationResult {
        let start = clamp_into(&self.start, lb, ub);
        let relaxation = Relaxation {
            problem: self.prob,
            var_lb: lb,
            var_ub: ub,
            cuts: self.pool.resolve(cut_ids),
            start: &start,
        };
        self.oracle_calls += 1;
        self.oracle.solve(&relaxation)
    }

    /// Separate and re-solve until no violated cut is found, the point is
    /// integral, or the round limit is hit.
    fn cut_rounds(
        &mut self,
        node: &mut SearchNode,
        lb: &[f64],
        ub: &[f64],
        mut result: RelaxationResult,
    ) -> RelaxationResult {
        let Some(separator) = self.separator.take() else {
            return result;
        };
        let sign = self.prob.sense.sign();
        let n = self.prob.num_vars();

        for round in 0..self.settings.max_cut_rounds {
            if !result.is_usable(n)
                || self
                    .prob
                    .spec
                    .is_integer_feasible(&result.x, self.settings.int_feas_tol)
                || self.tree.is_dominated(sign * result.obj_val)
            {
                break;
            }

            let mut added = 0;
            for cut in separator.separate(self.prob, &result.x) {
                let (id, _) = self.pool.add(cut);
                if node.cuts.contains(&id) {
                    continue;
                }
                if let Some(pooled) = self.pool.get(id) {
                    if pooled.violation(&result.x) > self.settings.cut_violation_tol {
                        self.cut_stats.record(pooled);
                        node.cuts.push(id);
                        added += 1;
                    }
                }
            }
            self.cut_stats.finish_round(added);
            log::debug!(
                "node {}: cut round {} added {} cuts ({} active)",
                node.id,
                round + 1,
                added,
                node.cuts.len()
            );

            if added == 0 {
                break;
            }
            result = self.solve_relaxation(lb, ub, &node.cuts);
        }

        self.separator = Some(separator);
        result
    }

    /// Offer an integer-feasible relaxation point as incumbent.
    ///
    /// Integer components are rounded; the rounded point is used if it still
    /// satisfies the rows, otherwise the raw point. Returns false if neither
    /// is feasible.
    fn accept_candidate(&mut self, node: &SearchNode, result: &RelaxationResult) -> bool {
        let tol = self.settings.feas_tol;
        let x = &result.x;
        let mut rounded = x.clone();
        self.prob.round_integers(&mut rounded);

        let (point, obj) = if self.prob.is_feasible(&rounded, tol) {
            let shift: f64 = self
                .prob
                .objective
                .iter()
                .zip(rounded.iter().zip(x))
                .map(|(c, (r, v))| c * (r - v))
                .sum();
            (rounded, result.obj_val + shift)
        } else if self.prob.is_feasible(x, tol) {
            (x.clone(), result.obj_val)
        } else {
            log::warn!(
                "node {}: oracle point violates constraints by {:.3e}, discarded",
                node.id,
                self.prob.max_violation(x)
            );
            return false;
        };

        let improved = self
            .tree
            .update_incumbent(&point, self.prob.sense.sign() * obj);
        log::debug!(
            "node {}: integer feasible, obj={:.6e}{}",
            node.id,
            obj,
            if improved { " (new incumbent)" } else { "" }
        );
        true
    }

    fn branch_variable(
        &mut self,
        node: &SearchNode,
        fractional: &[(usize, f64, f64)],
        result: &RelaxationResult,
        lb: &[f64],
        ub: &[f64],
    ) -> NodeStatus {
        let sign = self.prob.sense.sign();
        let node_obj = sign * result.obj_val;

        // Strong branching trial solves; counted as oracle calls
        let prob = self.prob;
        let oracle = &mut *self.oracle;
        let cuts = self.pool.resolve(&node.cuts);
        let start = &self.start;
        let mut trial_solves = 0u64;
        let trial_solve = |change: &BoundChange| -> Option<f64> {
            let mut child_lb = lb.to_vec();
            let mut child_ub = ub.to_vec();
            change.apply(&mut child_lb, &mut child_ub);
            let child_start = clamp_into(start, &child_lb, &child_ub);
            trial_solves += 1;
            let r = oracle.solve(&Relaxation {
                problem: prob,
                var_lb: &child_lb,
                var_ub: &child_ub,
                cuts: cuts.clone(),
                start: &child_start,
            });
            r.is_usable(prob.num_vars()).then(|| sign * r.obj_val)
        };

        let decision = self
            .tree
            .select_branching(fractional, node_obj, lb, ub, trial_solve);
        self.oracle_calls += trial_solves;

        let Some(decision) = decision else {
            log::warn!("node {}: no branching candidate among fractional variables", node.id);
            return NodeStatus::Infeasible;
        };

        let estimate = self.tree.branching().estimate(node_obj, fractional);
        let (down, up) = decision.records(node_obj);
        log::debug!(
            "node {}: branch on x{} = {:.6} (score {:.3e})",
            node.id,
            decision.var,
            decision.value,
            decision.score
        );

        self.tree.branch(
            node,
            node_obj,
            estimate,
            [
                (std::slice::from_ref(&decision.down_branch), Some(down)),
                (std::slice::from_ref(&decision.up_branch), Some(up)),
            ],
        );
        NodeStatus::Branched
    }

    fn branch_sos(
        &mut self,
        node: &SearchNode,
        set: usize,
        result: &RelaxationResult,
        lb: &[f64],
        ub: &[f64],
    ) -> NodeStatus {
        let node_obj = self.prob.sense.sign() * result.obj_val;
        let split = self
            .prob
            .spec
            .sos_sets()
            .get(set)
            .and_then(|sos| sos_branch(sos, &result.x, lb, ub, self.settings.feas_tol));

        let Some((left, right)) = split else {
            log::warn!("node {}: SOS set {} cannot be split", node.id, set);
            return NodeStatus::Infeasible;
        };
        log::debug!(
            "node {}: SOS branch on set {} ({} / {} fixed)",
            node.id,
            set,
            left.len(),
            right.len()
        );

        self.tree.branch(
            node,
            node_obj,
            node_obj,
            [(left.as_slice(), None), (right.as_slice(), None)],
        );
        NodeStatus::Branched
    }
}

/// Clip a point into `[lb, ub]`.
fn clamp_into(x: &[f64], lb: &[f64], ub: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(lb.iter().zip(ub))
        .map(|(v, (l, u))| v.max(*l).min(*u))
        .collect()
}

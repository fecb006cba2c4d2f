//! Branching variable selection.

use super::{BoundChange, BranchDirection, BranchRecord};
use crate::model::{MipProblem, SosSet, SosType, FRACTIONALITY_TIE_TOL};
use crate::settings::BranchingRule;

/// A variable branching decision.
#[derive(Debug, Clone)]
pub struct BranchDecision {
    /// Variable to branch on.
    pub var: usize,

    /// Current (fractional) value.
    pub value: f64,

    /// Bound change for "down" branch (x <= floor(value)).
    pub down_branch: BoundChange,

    /// Bound change for "up" branch (x >= ceil(value)).
    pub up_branch: BoundChange,

    /// Score of this decision (for logging/debugging).
    pub score: f64,
}

impl BranchDecision {
    /// Pseudocost records for the (down, up) children.
    pub fn records(&self, parent_obj: f64) -> (BranchRecord, BranchRecord) {
        let f = self.value - self.value.floor();
        (
            BranchRecord {
                var: self.var,
                direction: BranchDirection::Down,
                distance: f,
                parent_obj,
            },
            BranchRecord {
                var: self.var,
                direction: BranchDirection::Up,
                distance: 1.0 - f,
                parent_obj,
            },
        )
    }
}

/// Branching variable selector.
pub struct BranchingSelector {
    /// Branching rule to use.
    rule: BranchingRule,

    /// Pseudocost statistics.
    /// pseudocosts_down[i] = average objective change per unit decrease
    /// pseudocosts_up[i] = average objective change per unit increase
    pseudocosts_down: Vec<f64>,
    pseudocosts_up: Vec<f64>,

    /// Number of observations for each variable (down direction).
    branch_count_down: Vec<u64>,

    /// Number of observations for each variable (up direction).
    branch_count_up: Vec<u64>,

    /// Child relaxations solved by strong branching.
    strong_solves: u64,
}

impl BranchingSelector {
    /// Create a selector with pseudocosts seeded from the objective.
    pub fn new(rule: BranchingRule, prob: &MipProblem) -> Self {
        let n = prob.num_vars();
        let mut selector = Self {
            rule,
            pseudocosts_down: vec![1.0; n],
            pseudocosts_up: vec![1.0; n],
            branch_count_down: vec![0; n],
            branch_count_up: vec![0; n],
            strong_solves: 0,
        };
        selector.init_from_objective(&prob.objective);
        selector
    }

    /// Initialize pseudocosts from objective coefficients.
    pub fn init_from_objective(&mut self, c: &[f64]) {
        for (i, &ci) in c.iter().enumerate() {
            if i < self.pseudocosts_down.len() {
                let init_cost = ci.abs().max(0.1);
                self.pseudocosts_down[i] = init_cost;
                self.pseudocosts_up[i] = init_cost;
            }
        }
    }

    /// Relaxations solved by strong branching so far.
    pub fn strong_solves(&self) -> u64 {
        self.strong_solves
    }

    /// Select a branching variable among `fractional` (var, value, fractionality).
    ///
    /// `trial_solve` solves the child relaxation for a bound change and returns its
    /// objective in minimization form, or `None` if it is infeasible. It is
    /// only called by strong branching. Returns None if `fractional` is empty.
    pub fn select<F>(
        &mut self,
        fractional: &[(usize, f64, f64)],
        parent_obj: f64,
        lb: &[f64],
        ub: &[f64],
        nodes_explored: u64,
        trial_solve: F,
    ) -> Option<BranchDecision>
    where
        F: FnMut(&BoundChange) -> Option<f64>,
    {
        if fractional.is_empty() {
            return None;
        }

        match self.rule {
            BranchingRule::MostFractional => self.select_most_fractional(fractional, lb, ub),
            BranchingRule::Pseudocost => self.select_pseudocost(fractional, lb, ub),
            BranchingRule::StrongBranching {
                candidates,
                node_limit,
            } => {
                if nodes_explored <= node_limit {
                    self.select_strong_branching(
                        fractional,
                        parent_obj,
                        lb,
                        ub,
                        candidates,
                        trial_solve,
                    )
                } else {
                    self.select_pseudocost(fractional, lb, ub)
                }
            }
        }
    }

    /// Select variable closest to 0.5 (most fractional), lowest index on ties.
    fn select_most_fractional(
        &self,
        fractional: &[(usize, f64, f64)],
        lb: &[f64],
        ub: &[f64],
    ) -> Option<BranchDecision> {
        let (var, value, frac) = best_by(fractional.iter().copied())?;
        Some(make_decision(var, value, frac, lb, ub))
    }

    /// Select variable with best pseudocost score.
    fn select_pseudocost(
        &self,
        fractional: &[(usize, f64, f64)],
        lb: &[f64],
        ub: &[f64],
    ) -> Option<BranchDecision> {
        let (var, value, score) = best_by(
            fractional
                .iter()
                .map(|&(v, val, _)| (v, val, self.pseudocost_score(v, val))),
        )?;
        Some(make_decision(var, value, score, lb, ub))
    }

    /// Solve both children of the most fractional candidates and keep the
    /// one whose weaker child degrades the bound most.
    fn select_strong_branching<F>(
        &mut self,
        fractional: &[(usize, f64, f64)],
        parent_obj: f64,
        lb: &[f64],
        ub: &[f64],
        max_candidates: usize,
        mut trial_solve: F,
    ) -> Option<BranchDecision>
    where
        F: FnMut(&BoundChange) -> Option<f64>,
    {
        // Most fractional first; the sort is stable so ties stay by index
        let mut candidates: Vec<_> = fractional.to_vec();
        candidates.sort_by(|(_, _, f1), (_, _, f2)| tie_key(*f2).total_cmp(&tie_key(*f1)));
        candidates.truncate(max_candidates.max(1));

        let mut best: Option<BranchDecision> = None;
        for (var, value, _) in candidates {
            let mut decision = make_decision(var, value, 0.0, lb, ub);
            let (down_rec, up_rec) = decision.records(parent_obj);

            let mut degradation = |change: &BoundChange, rec: &BranchRecord| {
                if change.is_infeasible() {
                    return f64::INFINITY;
                }
                self.strong_solves += 1;
                match trial_solve(change) {
                    Some(obj) => {
                        self.update_pseudocosts(rec, obj);
                        (obj - parent_obj).max(0.0)
                    }
                    None => f64::INFINITY,
                }
            };
            let down = degradation(&decision.down_branch, &down_rec);
            let up = degradation(&decision.up_branch, &up_rec);

            decision.score = down.min(up);
            log::trace!(
                "strong branching x{}: down={:.4e} up={:.4e}",
                var,
                down,
                up
            );
            if best.as_ref().map_or(true, |b| beats(decision.score, b.score)) {
                best = Some(decision);
            }
        }
        best
    }

    /// Compute pseudocost score for a variable.
    fn pseudocost_score(&self, var: usize, value: f64) -> f64 {
        let frac = value - value.floor();
        let down_cost = frac * self.pseudocosts_down[var];
        let up_cost = (1.0 - frac) * self.pseudocosts_up[var];

        (down_cost * up_cost).max(1e-10)
    }

    /// Update pseudocosts once a child created by `record` has been solved.
    ///
    /// `child_obj` is the child's relaxation objective in minimization form.
    pub fn update_pseudocosts(&mut self, record: &BranchRecord, child_obj: f64) {
        let change = child_obj - record.parent_obj;
        if record.distance <= 1e-6 || !change.is_finite() || change < 0.0 {
            return;
        }
        let pc = change / record.distance;
        let var = record.var;

        let (costs, counts) = match record.direction {
            BranchDirection::Down => (&mut self.pseudocosts_down, &mut self.branch_count_down),
            BranchDirection::Up => (&mut self.pseudocosts_up, &mut self.branch_count_up),
        };
        let count = counts[var] as f64;
        costs[var] = (costs[var] * count + pc) / (count + 1.0);
        counts[var] += 1;
    }

    /// Get pseudocost statistics for a variable.
    pub fn get_pseudocosts(&self, var: usize) -> (f64, f64, u64, u64) {
        (
            self.pseudocosts_down[var],
            self.pseudocosts_up[var],
            self.branch_count_down[var],
            self.branch_count_up[var],
        )
    }

    /// Estimated objective of the best integer point below a node.
    pub fn estimate(&self, node_obj: f64, fractional: &[(usize, f64, f64)]) -> f64 {
        node_obj
            + fractional
                .iter()
                .map(|&(var, value, _)| {
                    let f = value - value.floor();
                    (self.pseudocosts_down[var] * f).min(self.pseudocosts_up[var] * (1.0 - f))
                })
                .sum::<f64>()
    }
}

/// Highest score wins; the earliest entry wins ties.
fn best_by(items: impl Iterator<Item = (usize, f64, f64)>) -> Option<(usize, f64, f64)> {
    items.fold(None, |best, item| match best {
        Some(b) if !beats(item.2, b.2) => Some(b),
        _ => Some(item),
    })
}

/// Whether `score` is strictly better than `incumbent` beyond rounding noise.
fn beats(score: f64, incumbent: f64) -> bool {
    if incumbent.is_infinite() {
        return score > incumbent;
    }
    score > incumbent + FRACTIONALITY_TIE_TOL * incumbent.abs().max(1.0)
}

/// Sort key that merges fractionalities differing only by rounding.
fn tie_key(frac: f64) -> f64 {
    (frac / FRACTIONALITY_TIE_TOL).round()
}

/// Create a branch decision for a variable under local bounds.
fn make_decision(var: usize, value: f64, score: f64, lb: &[f64], ub: &[f64]) -> BranchDecision {
    BranchDecision {
        var,
        value,
        down_branch: BoundChange::down_branch(var, lb[var], ub[var], value),
        up_branch: BoundChange::up_branch(var, lb[var], ub[var], value),
        score,
    }
}

/// Split a violated SOS set into two children, each fixing one side to zero.
///
/// The split point is the weighted mean position of the nonzero members,
/// clamped so that the current point is excluded from both children.
/// Returns `None` if the set is not violated at `x`.
pub fn sos_branch(
    set: &SosSet,
    x: &[f64],
    lb: &[f64],
    ub: &[f64],
    tol: f64,
) -> Option<(Vec<BoundChange>, Vec<BoundChange>)> {
    if set.is_satisfied(x, tol) {
        return None;
    }
    let nz = set.nonzero_positions(x, tol);
    let (first, last) = (*nz.first()?, *nz.last()?);

    let weight: f64 = nz.iter().map(|&p| x[set.vars[p]].abs()).sum();
    let mean = nz.iter().map(|&p| p as f64 * x[set.vars[p]].abs()).sum::<f64>() / weight;

    let fix = |keep: &dyn Fn(usize) -> bool| -> Vec<BoundChange> {
        set.vars
            .iter()
            .enumerate()
            .filter(|&(pos, _)| !keep(pos))
            .map(|(_, &v)| BoundChange::fix_zero(v, lb[v], ub[v]))
            .collect()
    };

    match set.kind {
        SosType::Sos1 => {
            // Left keeps positions <= r, right keeps positions > r
            let r = (mean.floor() as usize).clamp(first, last - 1);
            Some((fix(&|p| p <= r), fix(&|p| p > r)))
        }
        SosType::Sos2 => {
            // Left keeps positions <= r, right keeps positions >= r
            let r = (mean.round() as usize).clamp(first + 1, last - 1);
            Some((fix(&|p| p <= r), fix(&|p| p >= r)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintSense, IntegerSpec};

    fn simple_mip() -> MipProblem {
        MipProblem::builder(3)
            .minimize(&[1.0, 1.0, 1.0])
            .constraint(&[1.0, 1.0, 1.0], ConstraintSense::Le, 2.0)
            .spec(IntegerSpec::binaries([0, 1]))
            .build()
            .unwrap()
    }

    fn no_trial_solve(_: &BoundChange) -> Option<f64> {
        panic!("only strong branching solves trial children")
    }

    fn select(
        selector: &mut BranchingSelector,
        prob: &MipProblem,
        x: &[f64],
    ) -> Option<BranchDecision> {
        let frac = prob.spec.fractional_variables(x, 1e-6);
        selector.select(&frac, 0.0, &prob.var_lb, &prob.var_ub, 0, no_trial_solve)
    }

    #[test]
    fn test_most_fractional() {
        let prob = simple_mip();
        let mut selector = BranchingSelector::new(BranchingRule::MostFractional, &prob);

        // x0 and x1 equally fractional: lowest index wins
        let d = select(&mut selector, &prob, &[0.3, 0.7, 1.0]).unwrap();
        assert_eq!(d.var, 0);

        let d = select(&mut selector, &prob, &[0.1, 0.45, 1.0]).unwrap();
        assert_eq!(d.var, 1);
    }

    #[test]
    fn test_integer_feasible() {
        let prob = simple_mip();
        let mut selector = BranchingSelector::new(BranchingRule::MostFractional, &prob);
        assert!(select(&mut selector, &prob, &[1.0, 0.0, 0.3]).is_none());
    }

    #[test]
    fn test_branch_decision() {
        let prob = simple_mip();
        let mut selector = BranchingSelector::new(BranchingRule::MostFractional, &prob);

        let decision = select(&mut selector, &prob, &[0.5, 0.0, 1.0]).unwrap();
        assert_eq!(decision.var, 0);
        assert_eq!(decision.value, 0.5);
        assert_eq!(decision.down_branch.new_ub, 0.0);
        assert_eq!(decision.up_branch.new_lb, 1.0);

        let (down, up) = decision.records(-2.0);
        assert_eq!(down.direction, BranchDirection::Down);
        assert_eq!(up.distance, 0.5);
        assert_eq!(up.parent_obj, -2.0);
    }

    #[test]
    fn test_pseudocost_updates() {
        let prob = simple_mip();
        let mut selector = BranchingSelector::new(BranchingRule::Pseudocost, &prob);
        assert_eq!(selector.get_pseudocosts(0), (1.0, 1.0, 0, 0));

        let record = BranchRecord {
            var: 1,
            direction: BranchDirection::Up,
            distance: 0.5,
            parent_obj: 1.0,
        };
        selector.update_pseudocosts(&record, 11.0);
        assert_eq!(selector.get_pseudocosts(1), (1.0, 20.0, 0, 1));

        // Worse objective in a child never lowers the bound
        selector.update_pseudocosts(&record, 0.0);
        assert_eq!(selector.get_pseudocosts(1).3, 1);

        // x1 now has the larger product score
        let d = select(&mut selector, &prob, &[0.5, 0.5, 0.0]).unwrap();
        assert_eq!(d.var, 1);

        let frac = prob.spec.fractional_variables(&[0.5, 0.5, 0.0], 1e-6);
        assert!((selector.estimate(1.0, &frac) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_strong_branching() {
        let prob = simple_mip();
        let rule = BranchingRule::StrongBranching {
            candidates: 2,
            node_limit: 10,
        };
        let mut selector = BranchingSelector::new(rule, &prob);
        let x = [0.5, 0.5, 0.0];
        let frac = prob.spec.fractional_variables(&x, 1e-6);

        // Branching on x1 moves both children by 3; on x0 only by 1
        let trial_solve = |change: &BoundChange| Some(if change.var == 1 { 3.0 } else { 1.0 });
        let d = selector
            .select(&frac, 0.0, &prob.var_lb, &prob.var_ub, 0, trial_solve)
            .unwrap();
        assert_eq!(d.var, 1);
        assert_eq!(d.score, 3.0);
        assert_eq!(selector.strong_solves(), 4);
        assert_eq!(selector.get_pseudocosts(1), (6.0, 6.0, 1, 1));

        // An infeasible child counts as infinite degradation
        let trial_solve = |change: &BoundChange| (change.var != 0 || change.new_ub > 0.5).then_some(0.5);
        let d = selector
            .select(&frac, 0.0, &prob.var_lb, &prob.var_ub, 0, trial_solve)
            .unwrap();
        assert_eq!(d.var, 0);

        // Past the node limit it falls back to pseudocosts
        let d = selector.select(&frac, 0.0, &prob.var_lb, &prob.var_ub, 11, no_trial_solve);
        assert!(d.is_some());
    }

    #[test]
    fn test_strong_branching_rounding_tie() {
        let prob = simple_mip();
        let rule = BranchingRule::StrongBranching {
            candidates: 1,
            node_limit: 10,
        };
        let mut selector = BranchingSelector::new(rule, &prob);
        let frac = prob.spec.fractional_variables(&[0.3, 0.7, 0.0], 1e-6);

        // 0.3 and 0.7 are equally fractional, so only x0 is tried
        let mut tried = Vec::new();
        let trial_solve = |change: &BoundChange| {
            tried.push(change.var);
            Some(1.0)
        };
        let d = selector
            .select(&frac, 0.0, &prob.var_lb, &prob.var_ub, 0, trial_solve)
            .unwrap();
        assert_eq!(d.var, 0);
        assert_eq!(tried, vec![0, 0]);
    }

    #[test]
    fn test_score_ties_within_rounding() {
        assert!(!beats(0.30000000000000004, 0.3));
        assert!(beats(0.31, 0.3));
        assert!(beats(f64::INFINITY, 1e300));
        assert!(!beats(f64::INFINITY, f64::INFINITY));
        assert_eq!(tie_key(0.3), tie_key(1.0 - 0.7));
    }

    #[test]
    fn test_sos1_branch() {
        let set = SosSet::sos1([0, 1, 2, 3]);
        let lb = vec![0.0; 4];
        let ub = vec![1.0; 4];

        let x = [0.5, 0.0, 0.0, 0.5];
        let (left, right) = sos_branch(&set, &x, &lb, &ub, 1e-9).unwrap();
        let fixed = |changes: &[BoundChange]| changes.iter().map(|c| c.var).collect::<Vec<_>>();

        // Mean position 1.5: left keeps {0, 1}, right keeps {2, 3}
        assert_eq!(fixed(&left), vec![2, 3]);
        assert_eq!(fixed(&right), vec![0, 1]);
        assert!(left.iter().all(|c| c.new_ub == 0.0));

        assert!(sos_branch(&set, &[0.0, 1.0, 0.0, 0.0], &lb, &ub, 1e-9).is_none());
    }

    #[test]
    fn test_sos2_branch() {
        let set = SosSet::sos2([0, 1, 2, 3, 4]);
        let lb = vec![0.0; 5];
        let ub = vec![1.0; 5];

        // Nonzeros at positions 0 and 4 are not adjacent
        let x = [0.5, 0.0, 0.0, 0.0, 0.5];
        let (left, right) = sos_branch(&set, &x, &lb, &ub, 1e-9).unwrap();
        let fixed = |changes: &[BoundChange]| changes.iter().map(|c| c.var).collect::<Vec<_>>();

        // Split at position 2, shared by both children
        assert_eq!(fixed(&left), vec![3, 4]);
        assert_eq!(fixed(&right), vec![0, 1]);
    }
}

//! Search node representation.

use crate::cuts::CutId;
use crate::model::MipProblem;

/// What happened to a node once it was processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Node was pruned (bound >= incumbent).
    Pruned,

    /// Relaxation infeasible, or the oracle failed.
    Infeasible,

    /// Node produced an integer-feasible solution.
    IntegerFeasible,

    /// Node was branched (children created).
    Branched,
}

/// Direction of a variable branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchDirection {
    /// x <= floor(value)
    Down,

    /// x >= ceil(value)
    Up,
}

/// A bound tightening relative to the root problem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundChange {
    /// Variable index.
    pub var: usize,

    /// Lower bound before the change.
    pub old_lb: f64,

    /// Upper bound before the change.
    pub old_ub: f64,

    /// New lower bound.
    pub new_lb: f64,

    /// New upper bound.
    pub new_ub: f64,
}

impl BoundChange {
    /// Create a "down" branch: x <= floor(value).
    pub fn down_branch(var: usize, old_lb: f64, old_ub: f64, value: f64) -> Self {
        Self {
            var,
            old_lb,
            old_ub,
            new_lb: old_lb,
            new_ub: value.floor(),
        }
    }

    /// Create an "up" branch: x >= ceil(value).
    pub fn up_branch(var: usize, old_lb: f64, old_ub: f64, value: f64) -> Self {
        Self {
            var,
            old_lb,
            old_ub,
            new_lb: value.ceil(),
            new_ub: old_ub,
        }
    }

    /// Fix a variable to zero (SOS branching).
    pub fn fix_zero(var: usize, old_lb: f64, old_ub: f64) -> Self {
        Self {
            var,
            old_lb,
            old_ub,
            new_lb: old_lb.max(0.0),
            new_ub: old_ub.min(0.0),
        }
    }

    /// Check if the bound change creates an empty domain.
    pub fn is_infeasible(&self) -> bool {
        self.new_lb > self.new_ub + 1e-9
    }

    /// Intersect the change into local bound vectors.
    pub fn apply(&self, lb: &mut [f64], ub: &mut [f64]) {
        lb[self.var] = lb[self.var].max(self.new_lb);
        ub[self.var] = ub[self.var].min(self.new_ub);
    }
}

/// The variable branch that created a node, kept for pseudocost updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchRecord {
    /// Branching variable.
    pub var: usize,

    /// Which side of the split this node is.
    pub direction: BranchDirection,

    /// Distance the variable was pushed (f or 1 - f).
    pub distance: f64,

    /// Parent relaxation objective (minimization form).
    pub parent_obj: f64,
}

/// A node in the B&B search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Unique node identifier.
    pub id: u64,

    /// Parent node ID (None for root).
    pub parent_id: Option<u64>,

    /// Depth in the tree (0 for root).
    pub depth: usize,

    /// All bound changes from the root to this node.
    pub bound_changes: Vec<BoundChange>,

    /// Dual bound (minimization form), inherited from the parent's relaxation.
    /// Lower bound on optimal objective in this subtree.
    pub dual_bound: f64,

    /// Estimate of best integer solution reachable.
    pub estimate: f64,

    /// Pool ids of cuts active at this node.
    pub cuts: Vec<CutId>,

    /// Branch that created this node (None for root and SOS children).
    pub branch: Option<BranchRecord>,
}

impl SearchNode {
    /// Create the root node.
    pub fn root() -> Self {
        Self {
            id: 0,
            parent_id: None,
            depth: 0,
            bound_changes: Vec::new(),
            dual_bound: f64::NEG_INFINITY,
            estimate: f64::NEG_INFINITY,
            cuts: Vec::new(),
            branch: None,
        }
    }

    /// Create a child carrying this node's changes plus `changes`.
    pub fn child(&self, id: u64, changes: &[BoundChange], branch: Option<BranchRecord>) -> Self {
        let mut bound_changes = self.bound_changes.clone();
        bound_changes.extend_from_slice(changes);
        Self {
            id,
            parent_id: Some(self.id),
            depth: self.depth + 1,
            bound_changes,
            dual_bound: self.dual_bound,
            estimate: self.estimate,
            cuts: self.cuts.clone(),
            branch,
        }
    }

    /// Root bounds with this node's changes applied.
    pub fn local_bounds(&self, prob: &MipProblem) -> (Vec<f64>, Vec<f64>) {
        let mut lb = prob.var_lb.clone();
        let mut ub = prob.var_ub.clone();
        for change in &self.bound_changes {
            change.apply(&mut lb, &mut ub);
        }
        (lb, ub)
    }

    /// Whether any variable's local domain is empty.
    pub fn has_empty_domain(&self, prob: &MipProblem) -> bool {
        let (lb, ub) = self.local_bounds(prob);
        lb.iter().zip(&ub).any(|(l, u)| *l > *u + 1e-9)
    }

    /// Check if this node can be pruned by an incumbent.
    ///
    /// A node can be pruned if its dual bound cannot beat the incumbent
    /// by more than `abs_tol`.
    pub fn can_prune(&self, incumbent_obj: f64, abs_tol: f64) -> bool {
        self.dual_bound >= incumbent_obj - abs_tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintSense, IntegerSpec};

    #[test]
    fn test_root_node() {
        let root = SearchNode::root();
        assert_eq!(root.id, 0);
        assert!(root.parent_id.is_none());
        assert_eq!(root.depth, 0);
        assert!(root.bound_changes.is_empty());
        assert!(root.branch.is_none());
    }

    #[test]
    fn test_child_inherits() {
        let mut root = SearchNode::root();
        root.dual_bound = -3.0;
        root.cuts = vec![4];

        let bc = BoundChange::down_branch(0, 0.0, 1.0, 0.5);
        let child = root.child(1, &[bc], None);
        let grandchild = child.child(2, &[BoundChange::up_branch(1, 0.0, 5.0, 2.5)], None);

        assert_eq!(child.parent_id, Some(0));
        assert_eq!(child.dual_bound, -3.0);
        assert_eq!(child.cuts, vec![4]);
        assert_eq!(grandchild.depth, 2);
        assert_eq!(grandchild.bound_changes.len(), 2);
    }

    #[test]
    fn test_bound_changes() {
        // Down branch on x with value 2.7: x <= 2
        let down = BoundChange::down_branch(0, 0.0, 5.0, 2.7);
        assert_eq!(down.new_lb, 0.0);
        assert_eq!(down.new_ub, 2.0);
        assert!(!down.is_infeasible());

        // Up branch on x with value 2.7: x >= 3
        let up = BoundChange::up_branch(0, 0.0, 5.0, 2.7);
        assert_eq!(up.new_lb, 3.0);
        assert_eq!(up.new_ub, 5.0);
        assert!(!up.is_infeasible());

        // new_ub = 2 < new_lb = 3
        let bad = BoundChange::down_branch(0, 3.0, 5.0, 2.7);
        assert!(bad.is_infeasible());

        assert!(!BoundChange::fix_zero(0, -1.0, 4.0).is_infeasible());
        assert!(BoundChange::fix_zero(0, 1.0, 4.0).is_infeasible());
    }

    #[test]
    fn test_local_bounds() {
        let prob = MipProblem::builder(2)
            .constraint(&[1.0, 1.0], ConstraintSense::Le, 10.0)
            .spec(IntegerSpec::integers([0, 1]))
            .build()
            .unwrap();

        let node = SearchNode::root()
            .child(1, &[BoundChange::up_branch(0, 0.0, f64::INFINITY, 1.5)], None)
            .child(2, &[BoundChange::down_branch(0, 2.0, f64::INFINITY, 4.2)], None);

        let (lb, ub) = node.local_bounds(&prob);
        assert_eq!(lb, vec![2.0, 0.0]);
        assert_eq!(ub, vec![4.0, f64::INFINITY]);
        assert!(!node.has_empty_domain(&prob));

        let empty = node.child(3, &[BoundChange::down_branch(0, 0.0, 4.0, 1.5)], None);
        assert!(empty.has_empty_domain(&prob));
    }

    #[test]
    fn test_pruning() {
        let mut node = SearchNode::root();
        node.dual_bound = 10.0;

        assert!(!node.can_prune(15.0, 1e-6));
        assert!(node.can_prune(10.0, 1e-6));
        assert!(node.can_prune(8.0, 1e-6));
        assert!(node.can_prune(10.0 + 1e-7, 1e-6));
    }
}

//! Node priority queue for B&B tree exploration.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{NodeArena, NodeHandle, SearchNode};
use crate::settings::NodeSelection;

/// Entry in the node queue with priority.
struct QueuedNode {
    handle: NodeHandle,
    priority: f64, // Higher = selected first
    order: u64,    // Breaks ties, higher first
}

impl PartialEq for QueuedNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedNode {}

impl PartialOrd for QueuedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then(self.order.cmp(&other.order))
    }
}

/// Open nodes ordered by the node selection strategy.
///
/// Nodes live in a [`NodeArena`]; the heap only holds handles.
pub struct NodeQueue {
    /// Node selection strategy.
    strategy: NodeSelection,

    /// Storage for queued nodes.
    arena: NodeArena,

    /// Priority queue (max-heap by priority, then order).
    heap: BinaryHeap<QueuedNode>,

    /// Count of nodes added.
    nodes_added: u64,

    /// Count of nodes popped.
    nodes_popped: u64,
}

impl NodeQueue {
    /// Create a new node queue with the given strategy.
    pub fn new(strategy: NodeSelection) -> Self {
        Self {
            strategy,
            arena: NodeArena::new(),
            heap: BinaryHeap::new(),
            nodes_added: 0,
            nodes_popped: 0,
        }
    }

    /// Add a node to the queue.
    pub fn push(&mut self, node: SearchNode) {
        let seq = self.nodes_added;
        let (priority, order) = match self.strategy {
            // Lowest bound first, newest on ties
            NodeSelection::BestBound => (-node.dual_bound, seq),
            NodeSelection::DepthFirst => (0.0, seq),
            NodeSelection::BreadthFirst => (0.0, u64::MAX - seq),
            NodeSelection::BestEstimate => (-node.estimate, seq),
        };
        let handle = self.arena.insert(node);
        self.heap.push(QueuedNode {
            handle,
            priority,
            order,
        });
        self.nodes_added += 1;
    }

    /// Get the next node to process.
    pub fn pop(&mut self) -> Option<SearchNode> {
        while let Some(queued) = self.heap.pop() {
            if let Some(node) = self.arena.take(queued.handle) {
                self.nodes_popped += 1;
                return Some(node);
            }
        }
        None
    }

    /// Best (lowest) dual bound across open nodes; +inf when empty.
    pub fn best_bound(&self) -> f64 {
        self.heap
            .iter()
            .filter_map(|q| self.arena.get(q.handle))
            .map(|n| n.dual_bound)
            .fold(f64::INFINITY, f64::min)
    }

    /// Drop nodes that cannot beat the incumbent by more than `abs_tol`.
    ///
    /// Returns the number of pruned nodes.
    pub fn prune_by_bound(&mut self, incumbent_obj: f64, abs_tol: f64) -> usize {
        let before = self.heap.len();

        let arena = &mut self.arena;
        let remaining: BinaryHeap<QueuedNode> = self
            .heap
            .drain()
            .filter(|q| {
                let prune = match arena.get(q.handle) {
                    Some(node) => node.can_prune(incumbent_obj, abs_tol),
                    None => return false,
                };
                if prune {
                    arena.take(q.handle);
                }
                !prune
            })
            .collect();
        self.heap = remaining;

        before - self.heap.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Get the number of nodes in the queue.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Get the total number of nodes added.
    pub fn total_added(&self) -> u64 {
        self.nodes_added
    }

    /// Get the total number of nodes popped.
    pub fn total_popped(&self) -> u64 {
        self.nodes_popped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u64, bound: f64) -> SearchNode {
        let mut n = SearchNode::root();
        n.id = id;
        n.dual_bound = bound;
        n.estimate = -bound;
        n
    }

    fn drain(queue: &mut NodeQueue) -> Vec<u64> {
        std::iter::from_fn(|| queue.pop()).map(|n| n.id).collect()
    }

    #[test]
    fn test_best_bound_selection() {
        let mut queue = NodeQueue::new(NodeSelection::BestBound);
        queue.push(node(1, 10.0));
        queue.push(node(2, 5.0));
        queue.push(node(3, 15.0));

        assert_eq!(queue.best_bound(), 5.0);

        // Best bound (lowest) should come first
        let first = queue.pop().unwrap();
        assert_eq!(first.id, 2);
        assert_eq!(queue.best_bound(), 10.0);
        assert_eq!(drain(&mut queue), vec![1, 3]);

        assert!(queue.is_empty());
        assert_eq!(queue.best_bound(), f64::INFINITY);
        assert_eq!(queue.total_popped(), 3);
    }

    #[test]
    fn test_depth_and_breadth_first() {
        let mut dfs = NodeQueue::new(NodeSelection::DepthFirst);
        let mut bfs = NodeQueue::new(NodeSelection::BreadthFirst);
        for id in 1..=3 {
            dfs.push(node(id, 0.0));
            bfs.push(node(id, 0.0));
        }

        // Most recent first vs. insertion order
        assert_eq!(drain(&mut dfs), vec![3, 2, 1]);
        assert_eq!(drain(&mut bfs), vec![1, 2, 3]);
    }

    #[test]
    fn test_best_estimate_selection() {
        let mut queue = NodeQueue::new(NodeSelection::BestEstimate);
        // Estimates are -bound here: 1 -> -1, 2 -> -7, 3 -> -4
        queue.push(node(1, 1.0));
        queue.push(node(2, 7.0));
        queue.push(node(3, 4.0));

        assert_eq!(drain(&mut queue), vec![2, 3, 1]);
    }

    #[test]
    fn test_pruning() {
        let mut queue = NodeQueue::new(NodeSelection::DepthFirst);
        for i in 0..5 {
            queue.push(node(i, i as f64 * 10.0)); // 0, 10, 20, 30, 40
        }
        assert_eq!(queue.len(), 5);

        // Prune nodes with bound >= 25
        let pruned = queue.prune_by_bound(25.0, 1e-6);
        assert_eq!(pruned, 2);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.total_added(), 5);

        // Order survives the rebuild
        assert_eq!(drain(&mut queue), vec![2, 1, 0]);
    }
}

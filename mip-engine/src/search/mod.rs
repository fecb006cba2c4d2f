//! Branch-and-bound search tree management.

pub mod analyzer;
mod arena;
mod branching;
mod node;
mod queue;
mod termination;
mod tree;

pub use analyzer::{classify, NodeOutcome};
pub use arena::{NodeArena, NodeHandle};
pub use branching::{sos_branch, BranchDecision, BranchingSelector};
pub use node::{BoundChange, BranchDirection, BranchRecord, NodeStatus, SearchNode};
pub use queue::NodeQueue;
pub use termination::{SearchProgress, SearchState, TerminationController};
pub use tree::BranchAndBound;

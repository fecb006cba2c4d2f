//! Slot storage for open nodes.

use super::SearchNode;

/// Handle to a node stored in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

/// Slot vector with a free list. Slots are reused once a node is taken.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Option<SearchNode>>,
    free: Vec<usize>,
    live: usize,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node.
    pub fn insert(&mut self, node: SearchNode) -> NodeHandle {
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeHandle(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeHandle(self.slots.len() - 1)
            }
        }
    }

    /// Borrow a stored node.
    pub fn get(&self, handle: NodeHandle) -> Option<&SearchNode> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    /// Remove a node, freeing its slot.
    pub fn take(&mut self, handle: NodeHandle) -> Option<SearchNode> {
        let node = self.slots.get_mut(handle.0)?.take()?;
        self.free.push(handle.0);
        self.live -= 1;
        Some(node)
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    /// True if no node is stored.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

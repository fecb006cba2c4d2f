//! Cut pool management for branch-and-cut.
//!
//! Every separated cut is globally valid, so the pool is shared by the whole
//! tree. Nodes refer to cuts by id and children inherit their parent's ids.

use super::LinearCut;

/// Identifier of a cut in the pool.
pub type CutId = usize;

/// Statistics for the cut pool.
#[derive(Debug, Default, Clone)]
pub struct CutPoolStats {
    /// Total cuts stored.
    pub total_added: usize,

    /// Cuts rejected as duplicates of stored cuts.
    pub duplicates: usize,
}

/// Cut pool for managing generated cuts.
///
/// The pool only grows: cuts are never aged out, since node cut lists hold
/// ids into it. Duplicate detection in [`CutPool::add`] scans every stored cut.
// TODO: age out cuts no open node references once the pool is large.
#[derive(Debug, Default)]
pub struct CutPool {
    /// All cuts in the pool, indexed by id.
    cuts: Vec<LinearCut>,

    /// Statistics.
    stats: CutPoolStats,
}

impl CutPool {
    /// Create a new cut pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cut to the pool.
    ///
    /// Returns the cut ID and whether it's a duplicate.
    pub fn add(&mut self, cut: LinearCut) -> (CutId, bool) {
        if let Some(id) = self.cuts.iter().position(|c| Self::is_duplicate(&cut, c)) {
            self.stats.duplicates += 1;
            return (id, true);
        }

        let id = self.cuts.len();
        self.cuts.push(cut);
        self.stats.total_added += 1;
        (id, false)
    }

    /// Check if two cuts are duplicates.
    fn is_duplicate(a: &LinearCut, b: &LinearCut) -> bool {
        // Check dimensions
        if a.coefs.len() != b.coefs.len() {
            return false;
        }

        // Check if cuts are parallel (within tolerance)
        let a_norm = a.norm();
        let b_norm = b.norm();

        if a_norm < 1e-10 || b_norm < 1e-10 {
            return a_norm < 1e-10 && b_norm < 1e-10;
        }

        let dot: f64 = a.coefs.iter().zip(&b.coefs).map(|(ai, bi)| ai * bi).sum();
        let cos_angle = dot / (a_norm * b_norm);

        // Same direction (opposite halfspaces are not duplicates) and same offset
        if cos_angle > 0.9999 {
            let rhs_diff = (a.rhs / a_norm - b.rhs / b_norm).abs();
            return rhs_diff < 1e-8;
        }

        false
    }

    /// Get a cut by ID.
    pub fn get(&self, id: CutId) -> Option<&LinearCut> {
        self.cuts.get(id)
    }

    /// Resolve a list of ids into cut references.
    pub fn resolve(&self, ids: &[CutId]) -> Vec<&LinearCut> {
        ids.iter().filter_map(|&id| self.cuts.get(id)).collect()
    }

    /// Get pool statistics.
    pub fn stats(&self) -> &CutPoolStats {
        &self.stats
    }

    /// Number of cuts in pool.
    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    /// Check if pool is empty.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }
}

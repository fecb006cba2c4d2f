//! Cut separation across all enabled families.

use super::{cover, gomory, mir, CutSource, LinearCut};
use crate::model::{LeRow, MipProblem};
use crate::settings::MipSettings;

/// Separator settings, extracted from [`MipSettings`].
#[derive(Debug, Clone)]
pub struct SeparatorSettings {
    /// Generate Chvátal-Gomory cuts.
    pub gomory: bool,

    /// Generate MIR cuts.
    pub mir: bool,

    /// Generate cover cuts.
    pub cover: bool,

    /// Minimum violation for a cut to be returned.
    pub min_violation: f64,

    /// Maximum cuts returned per call.
    pub max_cuts: usize,
}

impl From<&MipSettings> for SeparatorSettings {
    fn from(s: &MipSettings) -> Self {
        Self {
            gomory: s.gomory_cuts,
            mir: s.mir_cuts,
            cover: s.cover_cuts,
            min_violation: s.cut_violation_tol,
            max_cuts: s.cuts_per_round,
        }
    }
}

/// Cutting plane statistics reported with the solution.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CutStats {
    /// Cuts added to node relaxations.
    pub total: u64,

    /// Separation rounds that added at least one cut.
    pub rounds: u64,

    /// Gomory cuts added.
    pub gomory: u64,

    /// MIR cuts added.
    pub mir: u64,

    /// Cover cuts added.
    pub cover: u64,

    /// Largest number of cuts added in a single round.
    pub max_per_round: u64,
}

impl CutStats {
    /// Record one accepted cut.
    pub fn record(&mut self, cut: &LinearCut) {
        self.total += 1;
        match cut.source {
            CutSource::Gomory { .. } => self.gomory += 1,
            CutSource::Mir { .. } => self.mir += 1,
            CutSource::Cover { .. } => self.cover += 1,
            CutSource::User => {}
        }
    }

    /// Record the end of a round that added `added` cuts.
    pub fn finish_round(&mut self, added: usize) {
        if added > 0 {
            self.rounds += 1;
            self.max_per_round = self.max_per_round.max(added as u64);
        }
    }

    /// Average cuts per productive round.
    pub fn cuts_per_round(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.total as f64 / self.rounds as f64
        }
    }
}

/// Runs the enabled cut families over the problem rows.
///
/// Rows are taken from the root problem with global bounds, so every cut
/// returned is valid for the whole tree.
pub struct CutSeparator {
    rows: Vec<LeRow>,
    settings: SeparatorSettings,
}

impl CutSeparator {
    /// Create a separator for `prob`.
    pub fn new(prob: &MipProblem, settings: SeparatorSettings) -> Self {
        Self {
            rows: prob.le_rows(),
            settings,
        }
    }

    /// Violated cuts for `x`, most efficacious first.
    pub fn separate(&self, prob: &MipProblem, x: &[f64]) -> Vec<LinearCut> {
        let mut cuts = Vec::new();
        for row in &self.rows {
            if self.settings.gomory {
                cuts.extend(gomory::separate(row, prob, x));
            }
            if self.settings.mir {
                cuts.extend(mir::separate(row, prob, x));
            }
            if self.settings.cover {
                cuts.extend(cover::separate(row, prob, x));
            }
        }

        cuts.retain(|c| c.violation(x) > self.settings.min_violation);
        cuts.sort_by(|a, b| b.efficacy(x).total_cmp(&a.efficacy(x)));
        cuts.truncate(self.settings.max_cuts);
        cuts
    }

    /// Number of rows considered.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConstraintSense, IntegerSpec};

    fn settings(gomory: bool, mir: bool, cover: bool) -> SeparatorSettings {
        SeparatorSettings {
            gomory,
            mir,
            cover,
            min_violation: 1e-6,
            max_cuts: 10,
        }
    }

    fn knapsack() -> MipProblem {
        MipProblem::builder(3)
            .maximize(&[1.0, 1.0, 1.0])
            .constraint(&[5.0, 5.0, 5.0], ConstraintSense::Le, 12.0)
            .spec(IntegerSpec::binaries([0, 1, 2]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_families_toggle() {
        let prob = knapsack();
        let x = [1.0, 1.0, 0.4];

        let none = CutSeparator::new(&prob, settings(false, false, false));
        assert!(none.separate(&prob, &x).is_empty());

        let cover_only = CutSeparator::new(&prob, settings(false, false, true));
        let cuts = cover_only.separate(&prob, &x);
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].source, CutSource::Cover { row: 0 });
    }

    #[test]
    fn test_all_cuts_violated_and_sorted() {
        let prob = knapsack();
        let x = [1.0, 1.0, 0.4];
        let sep = CutSeparator::new(&prob, settings(true, true, true));

        let cuts = sep.separate(&prob, &x);
        assert!(!cuts.is_empty());
        for w in cuts.windows(2) {
            assert!(w[0].efficacy(&x) >= w[1].efficacy(&x));
        }
        for cut in &cuts {
            assert!(cut.violation(&x) > 1e-6);
            // the integer optimum (1, 1, 0) survives every cut
            assert!(cut.violation(&[1.0, 1.0, 0.0]) <= 1e-9);
        }
    }

    #[test]
    fn test_stats() {
        let mut stats = CutStats::default();
        let cut = LinearCut::new(vec![1.0], 0.0, CutSource::Cover { row: 0 });
        stats.record(&cut);
        stats.record(&cut);
        stats.finish_round(2);
        stats.finish_round(0);

        assert_eq!(stats.total, 2);
        assert_eq!(stats.cover, 2);
        assert_eq!(stats.rounds, 1);
        assert_eq!(stats.cuts_per_round(), 2.0);
    }
}

//! Termination checks between node expansions.

use std::time::{Duration, Instant};

use crate::model::MipStatus;
use crate::settings::MipSettings;

/// Search state; every terminal state is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Nodes are still being expanded.
    Exploring,

    /// The search stopped with this status.
    Finished(MipStatus),
}

/// Snapshot of the search handed to [`TerminationController::check`].
#[derive(Debug, Clone, Copy)]
pub struct SearchProgress {
    /// No open nodes remain.
    pub frontier_empty: bool,

    /// An incumbent exists.
    pub has_incumbent: bool,

    /// Relaxations solved so far.
    pub nodes_explored: u64,

    /// Relative gap between incumbent and best open bound.
    pub gap: f64,
}

/// Decides when the search stops and with which status.
///
/// A relaxation solve is never interrupted, so the time limit can be
/// overrun by the duration of one oracle call.
#[derive(Debug)]
pub struct TerminationController {
    max_nodes: u64,
    time_limit: Option<Duration>,
    gap_tol: f64,
    start: Instant,
    state: SearchState,
}

impl TerminationController {
    /// Start the clock.
    pub fn new(settings: &MipSettings) -> Self {
        Self {
            max_nodes: settings.max_nodes,
            time_limit: settings.time_limit_ms.map(Duration::from_millis),
            gap_tol: settings.gap_tol,
            start: Instant::now(),
            state: SearchState::Exploring,
        }
    }

    /// Time since the controller was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    /// Current state.
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Terminal status, if the search has stopped.
    pub fn status(&self) -> Option<MipStatus> {
        match self.state {
            SearchState::Exploring => None,
            SearchState::Finished(status) => Some(status),
        }
    }

    /// Check the stopping rules in order: empty frontier, time limit,
    /// node limit, gap. Returns the terminal status once stopped.
    pub fn check(&mut self, progress: &SearchProgress) -> Option<MipStatus> {
        if let SearchState::Finished(status) = self.state {
            return Some(status);
        }
        let status = self.evaluate(progress, self.elapsed())?;
        self.state = SearchState::Finished(status);
        Some(status)
    }

    fn evaluate(&self, p: &SearchProgress, elapsed: Duration) -> Option<MipStatus> {
        if p.frontier_empty {
            return Some(if p.has_incumbent {
                MipStatus::Optimal
            } else {
                MipStatus::Infeasible
            });
        }

        if self.time_limit.is_some_and(|limit| elapsed > limit) {
            return Some(if p.has_incumbent {
                MipStatus::Feasible
            } else {
                MipStatus::TimeLimitReached
            });
        }

        if p.nodes_explored >= self.max_nodes {
            return Some(if p.has_incumbent {
                MipStatus::Feasible
            } else {
                MipStatus::NodeLimitReached
            });
        }

        if p.has_incumbent && p.gap <= self.gap_tol {
            return Some(MipStatus::Optimal);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(frontier_empty: bool, has_incumbent: bool, nodes: u64, gap: f64) -> SearchProgress {
        SearchProgress {
            frontier_empty,
            has_incumbent,
            nodes_explored: nodes,
            gap,
        }
    }

    #[test]
    fn test_frontier_exhausted() {
        let settings = MipSettings::default();
        let ctl = TerminationController::new(&settings);
        let e = Duration::ZERO;

        assert_eq!(ctl.evaluate(&progress(true, true, 5, 0.0), e), Some(MipStatus::Optimal));
        assert_eq!(
            ctl.evaluate(&progress(true, false, 5, f64::INFINITY), e),
            Some(MipStatus::Infeasible)
        );
        assert_eq!(ctl.evaluate(&progress(false, true, 5, 0.5), e), None);
    }

    #[test]
    fn test_limits() {
        let settings = MipSettings::default().with_max_nodes(10).with_time_limit(1.0);
        let ctl = TerminationController::new(&settings);
        let inf = f64::INFINITY;

        // Node limit is inclusive
        assert_eq!(ctl.evaluate(&progress(false, false, 9, inf), Duration::ZERO), None);
        assert_eq!(
            ctl.evaluate(&progress(false, false, 10, inf), Duration::ZERO),
            Some(MipStatus::NodeLimitReached)
        );
        assert_eq!(
            ctl.evaluate(&progress(false, true, 10, 0.5), Duration::ZERO),
            Some(MipStatus::Feasible)
        );

        // Time limit is strict and checked before the node limit
        let at = Duration::from_millis(1000);
        let past = Duration::from_millis(1001);
        assert_eq!(ctl.evaluate(&progress(false, false, 0, inf), at), None);
        assert_eq!(
            ctl.evaluate(&progress(false, false, 10, inf), past),
            Some(MipStatus::TimeLimitReached)
        );
        assert_eq!(
            ctl.evaluate(&progress(false, true, 0, 0.5), past),
            Some(MipStatus::Feasible)
        );
    }

    #[test]
    fn test_gap_closes_search() {
        let settings = MipSettings::default().with_gap_tol(0.01);
        let ctl = TerminationController::new(&settings);

        assert_eq!(
            ctl.evaluate(&progress(false, true, 3, 0.005), Duration::ZERO),
            Some(MipStatus::Optimal)
        );
        assert_eq!(ctl.evaluate(&progress(false, true, 3, 0.02), Duration::ZERO), None);
        // Without an incumbent the gap is meaningless
        assert_eq!(ctl.evaluate(&progress(false, false, 3, 0.0), Duration::ZERO), None);
    }

    #[test]
    fn test_terminal_state_is_final() {
        let settings = MipSettings::default().without_time_limit();
        let mut ctl = TerminationController::new(&settings);
        assert_eq!(ctl.state(), SearchState::Exploring);

        assert_eq!(ctl.check(&progress(true, false, 1, f64::INFINITY)), Some(MipStatus::Infeasible));
        // Later progress cannot resume or change the outcome
        assert_eq!(ctl.check(&progress(false, true, 1, 0.5)), Some(MipStatus::Infeasible));
        assert_eq!(ctl.status(), Some(MipStatus::Infeasible));
    }
}

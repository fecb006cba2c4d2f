//! Search policies agree on the optimum and keep their bookkeeping sound.

use mip_engine::{
    solve_mip, solve_mip_with_oracle, BranchingRule, ConstraintSense, IntegerSpec, MipProblem,
    MipSettings, MipSolution, MipStatus, NodeSelection, ObjectiveSense, Relaxation,
    RelaxationOracle, RelaxationResult, SimplexOracle,
};

const TOL: f64 = 1e-6;

const SELECTIONS: [NodeSelection; 4] = [
    NodeSelection::BestBound,
    NodeSelection::DepthFirst,
    NodeSelection::BreadthFirst,
    NodeSelection::BestEstimate,
];

fn branching_rules() -> [BranchingRule; 3] {
    [
        BranchingRule::MostFractional,
        BranchingRule::Pseudocost,
        BranchingRule::StrongBranching {
            candidates: 3,
            node_limit: 1000,
        },
    ]
}

/// 5-item knapsack with optimum {0, 2, 4} worth 400k.
fn budget_knapsack() -> MipProblem {
    MipProblem::builder(5)
        .maximize(&[180_000.0, 150_000.0, 130_000.0, 170_000.0, 90_000.0])
        .constraint(
            &[220_000.0, 300_000.0, 200_000.0, 340_000.0, 180_000.0],
            ConstraintSense::Le,
            600_000.0,
        )
        .spec(IntegerSpec::binaries(0..5))
        .build()
        .unwrap()
}

/// Mixed problem: two general integers and one bounded continuous variable.
///
/// max 5x0 + 4x1 + 3y
/// s.t. 6x0 + 4x1 + y <= 24
///      x0 + 2x1      <= 6
///      0 <= y <= 2.5
fn mixed_problem() -> MipProblem {
    MipProblem::builder(3)
        .maximize(&[5.0, 4.0, 3.0])
        .constraint(&[6.0, 4.0, 1.0], ConstraintSense::Le, 24.0)
        .constraint(&[1.0, 2.0, 0.0], ConstraintSense::Le, 6.0)
        .bounds(2, 0.0, 2.5)
        .spec(IntegerSpec::integers([0, 1]))
        .build()
        .unwrap()
}

/// Optimum of [`mixed_problem`] by enumerating the integer part.
fn mixed_problem_optimum() -> f64 {
    let mut best = f64::NEG_INFINITY;
    for x0 in 0..=6 {
        for x1 in 0..=3 {
            let (x0, x1) = (x0 as f64, x1 as f64);
            if x0 + 2.0 * x1 > 6.0 {
                continue;
            }
            let room = 24.0 - 6.0 * x0 - 4.0 * x1;
            if room < 0.0 {
                continue;
            }
            let y = room.min(2.5);
            best = best.max(5.0 * x0 + 4.0 * x1 + 3.0 * y);
        }
    }
    best
}

/// Properties every terminated search must satisfy.
fn check_solution(prob: &MipProblem, settings: &MipSettings, sol: &MipSolution) {
    if sol.status.has_solution() {
        assert_eq!(sol.x.len(), prob.num_vars());
        assert!(prob.is_feasible(&sol.x, settings.feas_tol));
        assert!(prob.spec.is_integer_feasible(&sol.x, settings.int_feas_tol));
        assert!(prob.spec.is_sos_feasible(&sol.x, settings.feas_tol));
        assert!((prob.objective_value(&sol.x) - sol.obj_val).abs() <= 1e-6 * sol.obj_val.abs().max(1.0));
    } else {
        assert!(sol.x.is_empty());
    }

    if sol.status == MipStatus::Optimal {
        assert!(sol.gap <= settings.gap_tol, "gap {} > {}", sol.gap, settings.gap_tol);
    }

    // Incumbents only ever improve
    for pair in sol.incumbent_trace.windows(2) {
        let (n0, v0) = pair[0];
        let (n1, v1) = pair[1];
        assert!(n0 <= n1);
        match prob.sense {
            ObjectiveSense::Maximize => assert!(v1 > v0),
            ObjectiveSense::Minimize => assert!(v1 < v0),
        }
    }
    assert_eq!(sol.incumbent_trace.len() as u64, sol.incumbent_updates);
    if let Some(&(_, last)) = sol.incumbent_trace.last() {
        assert_eq!(last, sol.obj_val);
    }

    assert!(sol.nodes_explored <= settings.max_nodes);
    assert!(sol.oracle_calls >= sol.nodes_explored + sol.strong_branch_solves);
}

#[test]
fn test_knapsack_all_policies() {
    let prob = budget_knapsack();

    for selection in SELECTIONS {
        for rule in branching_rules() {
            let settings = MipSettings::default()
                .with_node_selection(selection)
                .with_branching_rule(rule);
            let sol = solve_mip(&prob, &settings).unwrap();

            assert_eq!(sol.status, MipStatus::Optimal, "{:?} / {:?}", selection, rule);
            assert!(
                (sol.obj_val - 400_000.0).abs() < 1e-3,
                "{:?} / {:?}: obj = {}",
                selection,
                rule,
                sol.obj_val
            );
            check_solution(&prob, &settings, &sol);
        }
    }
}

#[test]
fn test_mixed_problem_matches_enumeration() {
    let prob = mixed_problem();
    let expected = mixed_problem_optimum();

    for selection in SELECTIONS {
        for rule in branching_rules() {
            let settings = MipSettings::default()
                .with_node_selection(selection)
                .with_branching_rule(rule)
                .with_gap_tol(0.0);
            let sol = solve_mip(&prob, &settings).unwrap();

            assert_eq!(sol.status, MipStatus::Optimal);
            assert!(
                (sol.obj_val - expected).abs() < TOL,
                "{:?} / {:?}: obj = {}, expected {}",
                selection,
                rule,
                sol.obj_val,
                expected
            );
            check_solution(&prob, &settings, &sol);
        }
    }
}

#[test]
fn test_loose_gap_stops_early() {
    let prob = mixed_problem();
    let settings = MipSettings::default().with_gap_tol(0.5);
    let sol = solve_mip(&prob, &settings).unwrap();

    assert_eq!(sol.status, MipStatus::Optimal);
    assert!(sol.gap <= 0.5);
    // The reported bound never undercuts the true optimum
    assert!(sol.bound >= mixed_problem_optimum() - TOL);
    check_solution(&prob, &settings, &sol);
}

#[test]
fn test_strong_branching_trial_solves() {
    let prob = mixed_problem();
    let settings = MipSettings::default().with_branching_rule(BranchingRule::StrongBranching {
        candidates: 2,
        node_limit: 1000,
    });
    let sol = solve_mip(&prob, &settings).unwrap();

    if sol.nodes_branched > 0 {
        assert!(sol.strong_branch_solves > 0);
    }
    assert_eq!(sol.oracle_calls, sol.nodes_explored + sol.strong_branch_solves);

    // With a zero node limit only the root may run trial solves
    let settings = settings.with_branching_rule(BranchingRule::StrongBranching {
        candidates: 2,
        node_limit: 0,
    });
    let late = solve_mip(&prob, &settings).unwrap();
    assert!(late.strong_branch_solves <= 4);
    assert!((late.obj_val - sol.obj_val).abs() < TOL);
}

/// Delegates to the simplex oracle and counts calls.
struct CountingOracle {
    inner: SimplexOracle,
    calls: u64,
    max_cuts_seen: usize,
}

impl RelaxationOracle for CountingOracle {
    fn solve(&mut self, relaxation: &Relaxation<'_>) -> RelaxationResult {
        self.calls += 1;
        self.max_cuts_seen = self.max_cuts_seen.max(relaxation.cuts.len());
        for (j, &v) in relaxation.start.iter().enumerate() {
            assert!(v >= relaxation.var_lb[j] && v <= relaxation.var_ub[j]);
        }
        self.inner.solve(relaxation)
    }
}

#[test]
fn test_custom_oracle() {
    let prob = budget_knapsack();
    let mut oracle = CountingOracle {
        inner: SimplexOracle::default(),
        calls: 0,
        max_cuts_seen: 0,
    };

    let settings = MipSettings::branch_and_cut();
    let sol = solve_mip_with_oracle(&prob, &settings, &mut oracle).unwrap();

    assert_eq!(sol.status, MipStatus::Optimal);
    assert_eq!(sol.oracle_calls, oracle.calls);
    if sol.cuts.total > 0 {
        assert!(oracle.max_cuts_seen > 0);
    }
}

#[test]
fn test_minimize_with_negative_lower_bounds() {
    // min x0 - 2x1  s.t.  x0 + x1 >= -1.5,  x1 - x0 <= 0.5,  x in [-3, 3]
    let prob = MipProblem::builder(2)
        .minimize(&[1.0, -2.0])
        .constraint(&[1.0, 1.0], ConstraintSense::Ge, -1.5)
        .constraint(&[-1.0, 1.0], ConstraintSense::Le, 0.5)
        .bounds(0, -3.0, 3.0)
        .bounds(1, -3.0, 3.0)
        .spec(IntegerSpec::integers([0, 1]))
        .build()
        .unwrap();

    let mut best = f64::INFINITY;
    for x0 in -3..=3 {
        for x1 in -3..=3 {
            let (x0, x1) = (x0 as f64, x1 as f64);
            if x0 + x1 >= -1.5 && x1 - x0 <= 0.5 {
                best = best.min(x0 - 2.0 * x1);
            }
        }
    }

    let settings = MipSettings::default().with_gap_tol(0.0);
    let sol = solve_mip(&prob, &settings).unwrap();
    assert_eq!(sol.status, MipStatus::Optimal);
    assert!((sol.obj_val - best).abs() < TOL);
    check_solution(&prob, &settings, &sol);
}

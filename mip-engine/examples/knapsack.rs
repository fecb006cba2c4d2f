//! Compare search policies on knapsack and set-cover instances.
//!
//! Run with: cargo run --release -p mip-engine --example knapsack

use mip_engine::{
    solve_mip, BranchingRule, ConstraintSense, IntegerSpec, MipProblem, MipSettings, NodeSelection,
};
use std::time::Instant;

fn main() {
    println!("=== MIP Engine: search policies ===\n");

    for n in [10, 15, 20] {
        let prob = knapsack(n);
        compare(&format!("Knapsack (n={})", n), &prob);
    }

    compare("Set cover (12 elements, 8 sets)", &set_cover(12, 8));
}

/// 0-1 knapsack with deterministic pseudo-random data.
///
/// max  sum_i v[i] * x[i]
/// s.t. sum_i w[i] * x[i] <= capacity
///      x[i] binary
fn knapsack(n: usize) -> MipProblem {
    let values: Vec<f64> = (0..n).map(|i| (i * 7 + 3) as f64 % 20.0 + 5.0).collect();
    let weights: Vec<f64> = (0..n).map(|i| (i * 11 + 5) as f64 % 15.0 + 3.0).collect();
    let capacity = weights.iter().sum::<f64>() * 0.5;

    MipProblem::builder(n)
        .maximize(&values)
        .constraint(&weights, ConstraintSense::Le, capacity)
        .spec(IntegerSpec::binaries(0..n))
        .build()
        .expect("knapsack instance is well formed")
}

/// Weighted set cover: every element covered by at least one chosen set.
fn set_cover(elements: usize, sets: usize) -> MipProblem {
    let costs: Vec<f64> = (0..sets).map(|j| (j * 5 + 2) as f64 % 9.0 + 1.0).collect();
    let mut builder = MipProblem::builder(sets).minimize(&costs);

    for e in 0..elements {
        let row: Vec<(usize, f64)> = (0..sets)
            .filter(|&j| (e + 2 * j) % 3 == 0 || (e * j) % 5 == 1)
            .map(|j| (j, 1.0))
            .collect();
        builder = builder.sparse_constraint(&row, ConstraintSense::Ge, 1.0);
    }

    builder
        .spec(IntegerSpec::binaries(0..sets))
        .build()
        .expect("set cover instance is well formed")
}

fn compare(name: &str, prob: &MipProblem) {
    println!("--- {} ---", name);
    println!("  Vars: {}, Rows: {}", prob.num_vars(), prob.num_constraints());

    let policies = [
        ("best-bound / most-fractional", MipSettings::default()),
        (
            "depth-first / pseudocost",
            MipSettings::default()
                .with_node_selection(NodeSelection::DepthFirst)
                .with_branching_rule(BranchingRule::Pseudocost),
        ),
        (
            "best-estimate / strong",
            MipSettings::default()
                .with_node_selection(NodeSelection::BestEstimate)
                .with_branching_rule(BranchingRule::StrongBranching {
                    candidates: 4,
                    node_limit: 50,
                }),
        ),
        ("best-bound / branch-and-cut", MipSettings::branch_and_cut()),
    ];

    for (label, settings) in policies {
        let start = Instant::now();
        let result = solve_mip(prob, &settings);
        let elapsed = start.elapsed();

        match result {
            Ok(sol) => {
                print!("  {:<30} {:?}", label, sol.status);
                if sol.status.has_solution() {
                    print!(" obj={:.4} gap={:.2}%", sol.obj_val, sol.gap * 100.0);
                }
                println!(
                    " nodes={} cuts={} strong={} time={:.3}s",
                    sol.nodes_explored,
                    sol.cuts.total,
                    sol.strong_branch_solves,
                    elapsed.as_secs_f64()
                );
            }
            Err(e) => println!("  {:<30} error: {}", label, e),
        }
    }
    println!();
}

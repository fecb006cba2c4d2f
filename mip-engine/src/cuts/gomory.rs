//! Chvátal-Gomory rounding cuts.
//!
//! For a row `sum a_j x_j <= b` over integer variables with finite lower
//! bounds, shift to `x' = x - lb >= 0`. For any multiplier `u > 0`,
//!
//! ```text
//! sum floor(u a_j) x'_j <= floor(u (b - a^T lb))
//! ```
//!
//! holds for every integer point, because `floor(u a_j) x'_j <= u a_j x'_j`
//! and the left-hand side is integral.

use super::{CutSource, LinearCut};
use crate::model::{LeRow, MipProblem};

/// Snap applied before flooring so that `a * (1/a)` rounds to 1.
const FLOOR_SNAP: f64 = 1e-9;

/// Candidate cuts from one row. Empty if the row is not a pure integer row.
pub fn separate(row: &LeRow, prob: &MipProblem, x: &[f64]) -> Vec<LinearCut> {
    if row.coefs.is_empty() {
        return Vec::new();
    }

    let mut lbs = Vec::with_capacity(row.coefs.len());
    for &(j, _) in &row.coefs {
        if !prob.spec.is_integral(j) || !prob.var_lb[j].is_finite() {
            return Vec::new();
        }
        lbs.push(prob.var_lb[j].ceil());
    }

    let shifted_rhs = row.rhs
        - row
            .coefs
            .iter()
            .zip(&lbs)
            .map(|(&(_, a), lb)| a * lb)
            .sum::<f64>();

    let mut cuts = Vec::new();
    for u in multipliers(row) {
        let terms: Vec<(usize, f64)> = row
            .coefs
            .iter()
            .map(|&(j, a)| (j, snap_floor(u * a)))
            .collect();
        if terms.iter().all(|&(_, g)| g == 0.0) {
            continue;
        }

        // Undo the shift: sum g (x - lb) <= r  =>  sum g x <= r + sum g lb
        let rhs = snap_floor(u * shifted_rhs)
            + terms
                .iter()
                .zip(&lbs)
                .map(|(&(_, g), lb)| g * lb)
                .sum::<f64>();

        let cut = LinearCut::from_sparse(x.len(), &terms, rhs, CutSource::Gomory { row: row.row });
        if cut.is_valid() && cut.violation(x) > 0.0 {
            cuts.push(cut);
        }
    }
    cuts
}

/// `1` and `1/|a_j|` for each coefficient, deduplicated.
fn multipliers(row: &LeRow) -> Vec<f64> {
    let mut us: Vec<f64> = std::iter::once(1.0)
        .chain(
            row.coefs
                .iter()
                .filter(|(_, a)| a.abs() > 1e-9)
                .map(|(_, a)| 1.0 / a.abs()),
        )
        .collect();
    us.sort_by(|a, b| a.total_cmp(b));
    us.dedup_by(|a, b| (*a - *b).abs() <= 1e-12 * b.abs().max(1.0));
    us
}

fn snap_floor(v: f64) -> f64 {
    (v + FLOOR_SNAP).floor()
}

//! Knapsack cover cuts.
//!
//! For a row over binaries with positive weights `sum w_j x_j <= b`, a set
//! `C` with `sum_{j in C} w_j > b` cannot be all ones, so
//! `sum_{j in C} x_j <= |C| - 1`. Negative coefficients are handled by
//! complementing the variable (`1 - x_j`).

use super::{CutSource, LinearCut};
use crate::model::{LeRow, MipProblem};

const WEIGHT_TOL: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Literal {
    var: usize,
    weight: f64,
    complemented: bool,
    value: f64,
}

/// Binary variable under global bounds.
fn is_binary(prob: &MipProblem, j: usize) -> bool {
    prob.spec.is_integral(j) && prob.var_lb[j] >= 0.0 && prob.var_ub[j] <= 1.0
}

/// Cover cut for one row, or `None` if the row is not a binary knapsack or
/// has no cover.
pub fn separate(row: &LeRow, prob: &MipProblem, x: &[f64]) -> Option<LinearCut> {
    if row.coefs.len() < 2 {
        return None;
    }

    let mut capacity = row.rhs;
    let mut literals = Vec::with_capacity(row.coefs.len());
    for &(j, a) in &row.coefs {
        if !is_binary(prob, j) {
            return None;
        }
        if a > 0.0 {
            literals.push(Literal {
                var: j,
                weight: a,
                complemented: false,
                value: x[j],
            });
        } else {
            capacity -= a;
            literals.push(Literal {
                var: j,
                weight: -a,
                complemented: true,
                value: 1.0 - x[j],
            });
        }
    }

    if capacity < 0.0 {
        return None;
    }
    let total: f64 = literals.iter().map(|l| l.weight).sum();
    if total <= capacity + WEIGHT_TOL {
        return None;
    }

    // Greedy: literals closest to one first, heavier first on ties
    literals.sort_by(|a, b| {
        (1.0 - a.value)
            .total_cmp(&(1.0 - b.value))
            .then(b.weight.total_cmp(&a.weight))
    });
    let mut cover = Vec::new();
    let mut weight = 0.0;
    for lit in literals {
        cover.push(lit);
        weight += lit.weight;
        if weight > capacity + WEIGHT_TOL {
            break;
        }
    }

    // Make the cover minimal, dropping the least useful literals first
    cover.sort_by(|a, b| a.value.total_cmp(&b.value).then(a.weight.total_cmp(&b.weight)));
    let mut i = 0;
    while i < cover.len() {
        if weight - cover[i].weight > capacity + WEIGHT_TOL {
            weight -= cover[i].weight;
            cover.remove(i);
        } else {
            i += 1;
        }
    }

    let mut rhs = cover.len() as f64 - 1.0;
    let terms: Vec<(usize, f64)> = cover
        .iter()
        .map(|lit| {
            if lit.complemented {
                rhs -= 1.0;
                (lit.var, -1.0)
            } else {
                (lit.var, 1.0)
            }
        })
        .collect();

    let cut = LinearCut::from_sparse(x.len(), &terms, rhs, CutSource::Cover { row: row.row });
    cut.is_valid().then_some(cut)
}

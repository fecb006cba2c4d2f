//! Mixed-integer rounding cuts.
//!
//! Given a row `sum a_j x_j + sum c_k y_k <= b` with integer `x >= 0` and
//! continuous `y >= 0` (after shifting by lower bounds) and a divisor
//! `delta > 0`, let `beta = b / delta` and `f = beta - floor(beta)`. Then
//!
//! ```text
//! sum (floor(a_j/delta) + max(0, f_j - f) / (1 - f)) x_j
//!     + 1/(1 - f) * sum_{c_k < 0} (c_k/delta) y_k <= floor(beta)
//! ```
//!
//! is valid, where `f_j` is the fractional part of `a_j / delta`.

use super::{CutSource, LinearCut};
use crate::model::{LeRow, MipProblem};

/// Skip divisors whose scaled right-hand side is this close to an integer.
const MIN_FRACTION: f64 = 0.01;

/// Candidate cuts from one row.
pub fn separate(row: &LeRow, prob: &MipProblem, x: &[f64]) -> Vec<LinearCut> {
    let mut integer_terms = Vec::new();
    let mut continuous_terms = Vec::new();
    let mut shifted_rhs = row.rhs;

    for &(j, a) in &row.coefs {
        let lb = prob.var_lb[j];
        if !lb.is_finite() {
            return Vec::new();
        }
        if prob.spec.is_integral(j) {
            let lb = lb.ceil();
            shifted_rhs -= a * lb;
            integer_terms.push((j, a, lb));
        } else {
            shifted_rhs -= a * lb;
            continuous_terms.push((j, a, lb));
        }
    }

    if integer_terms.is_empty() {
        return Vec::new();
    }

    let mut cuts = Vec::new();
    for delta in divisors(&integer_terms) {
        let beta = shifted_rhs / delta;
        let f = beta - beta.floor();
        if f < MIN_FRACTION || f > 1.0 - MIN_FRACTION {
            continue;
        }

        let mut terms = Vec::with_capacity(row.coefs.len());
        let mut rhs = beta.floor();

        for &(j, a, lb) in &integer_terms {
            let scaled = a / delta;
            let fj = scaled - scaled.floor();
            let g = scaled.floor() + (fj - f).max(0.0) / (1.0 - f);
            if g != 0.0 {
                terms.push((j, g));
                rhs += g * lb;
            }
        }
        for &(k, c, lb) in &continuous_terms {
            if c < 0.0 {
                let h = (c / delta) / (1.0 - f);
                terms.push((k, h));
                rhs += h * lb;
            }
        }

        let cut = LinearCut::from_sparse(x.len(), &terms, rhs, CutSource::Mir { row: row.row });
        if cut.is_valid() && cut.violation(x) > 0.0 {
            cuts.push(cut);
        }
    }
    cuts
}

/// `1` and `|a_j|` for each integer coefficient, deduplicated.
fn divisors(integer_terms: &[(usize, f64, f64)]) -> Vec<f64> {
    let mut ds: Vec<f64> = std::iter::once(1.0)
        .chain(
            integer_terms
                .iter()
                .map(|&(_, a, _)| a.abs())
                .filter(|a| *a > 1e-9),
        )
        .collect();
    ds.sort_by(|a, b| a.total_cmp(b));
    ds.dedup_by(|a, b| (*a - *b).abs() <= 1e-12 * b.abs().max(1.0));
    ds
}

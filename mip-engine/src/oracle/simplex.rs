//! Dense two-phase primal simplex for linear relaxations.
//!
//! Small and dependable rather than fast: a dense tableau, Bland's rule
//! (no cycling), and an iteration cap. The starting point is ignored.

use super::{Relaxation, RelaxationOracle, RelaxationResult, RelaxationStatus};
use crate::error::{MipError, MipResult};
use crate::model::MipProblem;

/// Pivot and reduced-cost tolerance.
const EPS: f64 = 1e-9;

/// Phase-one objective above this means the relaxation is infeasible.
const INFEAS_TOL: f64 = 1e-7;

/// Built-in oracle for linear relaxations.
#[derive(Debug, Clone)]
pub struct SimplexOracle {
    /// Maximum pivots per solve (both phases).
    pub max_iter: usize,
}

impl Default for SimplexOracle {
    fn default() -> Self {
        Self { max_iter: 10_000 }
    }
}

impl SimplexOracle {
    /// Create an oracle with the given pivot cap.
    pub fn new(max_iter: usize) -> Self {
        Self { max_iter }
    }
}

/// How an original variable maps onto nonnegative tableau columns:
/// `x_j = offset + sum coef * x'_col`.
struct VarMap {
    offset: f64,
    terms: Vec<(usize, f64)>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Le,
    Ge,
    Eq,
}

/// Row over structural columns, before slacks are added.
struct StdRow {
    coefs: Vec<f64>,
    kind: RowKind,
    rhs: f64,
}

enum Outcome {
    Optimal,
    Unbounded,
    IterationLimit,
}

struct Tableau {
    /// Constraint rows; the last entry of each is the right-hand side.
    rows: Vec<Vec<f64>>,

    /// Reduced costs; the last entry is minus the objective value.
    costs: Vec<f64>,

    /// Basic column of each row.
    basis: Vec<usize>,

    /// Number of columns (without the right-hand side).
    width: usize,
}

impl Tableau {
    fn rhs(&self, i: usize) -> f64 {
        self.rows[i][self.width]
    }

    /// Reduced costs for `cost`, eliminating the basic columns.
    fn price(&mut self, cost: &[f64]) {
        let mut d = cost.to_vec();
        d.push(0.0);
        for (i, &b) in self.basis.iter().enumerate() {
            let cb = cost[b];
            if cb != 0.0 {
                for (dj, tij) in d.iter_mut().zip(&self.rows[i]) {
                    *dj -= cb * tij;
                }
            }
        }
        self.costs = d;
    }

    fn pivot(&mut self, r: usize, c: usize) {
        let p = self.rows[r][c];
        for v in self.rows[r].iter_mut() {
            *v /= p;
        }
        let pivot_row = self.rows[r].clone();

        for (i, row) in self.rows.iter_mut().enumerate() {
            if i == r {
                continue;
            }
            let f = row[c];
            if f != 0.0 {
                for (v, pv) in row.iter_mut().zip(&pivot_row) {
                    *v -= f * pv;
                }
                if row[self.width].abs() < 1e-12 {
                    row[self.width] = 0.0;
                }
            }
        }

        let f = self.costs[c];
        if f != 0.0 {
            for (v, pv) in self.costs.iter_mut().zip(&pivot_row) {
                *v -= f * pv;
            }
        }
        self.basis[r] = c;
    }

    /// Pivot until optimal; only columns `< allowed` may enter.
    fn iterate(&mut self, allowed: usize, max_iter: usize, iters: &mut usize) -> Outcome {
        loop {
            if *iters >= max_iter {
                return Outcome::IterationLimit;
            }

            // Bland: lowest-index improving column
            let Some(enter) = (0..allowed).find(|&j| self.costs[j] < -EPS) else {
                return Outcome::Optimal;
            };

            let mut leave: Option<(usize, f64)> = None;
            for i in 0..self.rows.len() {
                let a = self.rows[i][enter];
                if a > EPS {
                    let ratio = self.rhs(i) / a;
                    let better = match leave {
                        None => true,
                        Some((l, best)) => {
                            ratio < best - 1e-12
                                || ((ratio - best).abs() <= 1e-12 && self.basis[i] < self.basis[l])
                        }
                    };
                    if better {
                        leave = Some((i, ratio));
                    }
                }
            }

            let Some((r, _)) = leave else {
                return Outcome::Unbounded;
            };
            self.pivot(r, enter);
            *iters += 1;
        }
    }
}

impl SimplexOracle {
    fn solve_lp(&self, relax: &Relaxation<'_>) -> RelaxationResult {
        let prob = relax.problem;
        let n = prob.num_vars();

        // Map variables onto nonnegative columns
        let mut maps = Vec::with_capacity(n);
        let mut bound_rows = Vec::new();
        let mut ncols = 0;
        for j in 0..n {
            let (lb, ub) = (relax.var_lb[j], relax.var_ub[j]);
            if lb > ub + EPS {
                return RelaxationResult::failed(RelaxationStatus::Infeasible, 0);
            }
            let map = if lb.is_finite() {
                if ub.is_finite() {
                    bound_rows.push((ncols, (ub - lb).max(0.0)));
                }
                VarMap {
                    offset: lb,
                    terms: vec![(ncols, 1.0)],
                }
            } else if ub.is_finite() {
                VarMap {
                    offset: ub,
                    terms: vec![(ncols, -1.0)],
                }
            } else {
                ncols += 1;
                VarMap {
                    offset: 0.0,
                    terms: vec![(ncols - 1, 1.0), (ncols, -1.0)],
                }
            };
            ncols += 1;
            maps.push(map);
        }

        // Rows over structural columns
        let mut rows: Vec<StdRow> = Vec::new();
        let mut push_row = |terms: &mut dyn Iterator<Item = (usize, f64)>, kind: RowKind, rhs: f64| {
            let mut coefs = vec![0.0; ncols];
            let mut rhs = rhs;
            for (j, a) in terms {
                rhs -= a * maps[j].offset;
                for &(c, s) in &maps[j].terms {
                    coefs[c] += a * s;
                }
            }
            rows.push(StdRow { coefs, kind, rhs });
        };

        for (i, row) in prob.A.outer_iterator().enumerate() {
            let kind = match prob.row_senses[i] {
                crate::model::ConstraintSense::Le => RowKind::Le,
                crate::model::ConstraintSense::Ge => RowKind::Ge,
                crate::model::ConstraintSense::Eq => RowKind::Eq,
            };
            push_row(&mut row.iter().map(|(j, a)| (j, *a)), kind, prob.rhs[i]);
        }
        for cut in &relax.cuts {
            push_row(
                &mut cut.coefs.iter().copied().enumerate().filter(|(_, a)| *a != 0.0),
                RowKind::Le,
                cut.rhs,
            );
        }
        for &(c, width) in &bound_rows {
            let mut coefs = vec![0.0; ncols];
            coefs[c] = 1.0;
            rows.push(StdRow {
                coefs,
                kind: RowKind::Le,
                rhs: width,
            });
        }

        // Nonnegative right-hand sides
        for row in rows.iter_mut() {
            if row.rhs < 0.0 {
                row.rhs = -row.rhs;
                row.coefs.iter_mut().for_each(|a| *a = -*a);
                row.kind = match row.kind {
                    RowKind::Le => RowKind::Ge,
                    RowKind::Ge => RowKind::Le,
                    RowKind::Eq => RowKind::Eq,
                };
            }
        }

        let m = rows.len();
        let n_slack = rows.iter().filter(|r| r.kind != RowKind::Eq).count();
        let n_art = rows.iter().filter(|r| r.kind != RowKind::Le).count();
        let art_start = ncols + n_slack;
        let width = art_start + n_art;

        let mut tab = Tableau {
            rows: Vec::with_capacity(m),
            costs: Vec::new(),
            basis: Vec::with_capacity(m),
            width,
        };
        let (mut next_slack, mut next_art) = (ncols, art_start);
        for row in &rows {
            let mut t = vec![0.0; width + 1];
            t[..ncols].copy_from_slice(&row.coefs);
            t[width] = row.rhs;
            match row.kind {
                RowKind::Le => {
                    t[next_slack] = 1.0;
                    tab.basis.push(next_slack);
                    next_slack += 1;
                }
                RowKind::Ge => {
                    t[next_slack] = -1.0;
                    next_slack += 1;
                    t[next_art] = 1.0;
                    tab.basis.push(next_art);
                    next_art += 1;
                }
                RowKind::Eq => {
                    t[next_art] = 1.0;
                    tab.basis.push(next_art);
                    next_art += 1;
                }
            }
            tab.rows.push(t);
        }

        let mut iters = 0;

        // Phase 1: minimize the sum of artificials
        if n_art > 0 {
            let mut cost = vec![0.0; width];
            cost[art_start..].iter_mut().for_each(|c| *c = 1.0);
            tab.price(&cost);

            match tab.iterate(width, self.max_iter, &mut iters) {
                Outcome::Optimal => {}
                Outcome::Unbounded | Outcome::IterationLimit => {
                    return RelaxationResult::failed(RelaxationStatus::Failed, iters);
                }
            }

            let infeasibility = -tab.costs[width];
            let scale = rows.iter().map(|r| r.rhs).fold(1.0_f64, f64::max);
            if infeasibility > INFEAS_TOL * scale {
                return RelaxationResult::failed(RelaxationStatus::Infeasible, iters);
            }

            // Drive zero-valued artificials out of the basis
            for i in 0..m {
                if tab.basis[i] >= art_start {
                    if let Some(c) = (0..art_start).find(|&c| tab.rows[i][c].abs() > EPS) {
                        tab.pivot(i, c);
                    }
                }
            }
        }

        // Phase 2: the real objective, artificials locked out
        let c_min = prob.min_objective();
        let mut cost = vec![0.0; width];
        for (j, map) in maps.iter().enumerate() {
            for &(c, s) in &map.terms {
                cost[c] += c_min[j] * s;
            }
        }
        tab.price(&cost);

        match tab.iterate(art_start, self.max_iter, &mut iters) {
            Outcome::Optimal => {}
            Outcome::Unbounded => {
                return RelaxationResult::failed(RelaxationStatus::Unbounded, iters);
            }
            Outcome::IterationLimit => {
                return RelaxationResult::failed(RelaxationStatus::Failed, iters);
            }
        }

        let mut col_vals = vec![0.0; width];
        for (i, &b) in tab.basis.iter().enumerate() {
            col_vals[b] = tab.rhs(i);
        }
        let x: Vec<f64> = maps
            .iter()
            .map(|map| {
                map.offset
                    + map
                        .terms
                        .iter()
                        .map(|&(c, s)| s * col_vals[c])
                        .sum::<f64>()
            })
            .collect();

        RelaxationResult {
            status: RelaxationStatus::Optimal,
            obj_val: prob.objective_value(&x),
            x,
            iterations: iters,
        }
    }
}

impl RelaxationOracle for SimplexOracle {
    fn check(&self, prob: &MipProblem) -> MipResult<()> {
        if self.max_iter == 0 {
            return Err(MipError::OracleError(
                "simplex oracle needs a positive iteration limit".into(),
            ));
        }
        if prob.num_vars() == 0 {
            return Err(MipError::OracleError("nothing to solve".into()));
        }
        Ok(())
    }

    fn solve(&mut self, relaxation: &Relaxation<'_>) -> RelaxationResult {
        let result = self.solve_lp(relaxation);
        log::trace!(
            "simplex: status={:?} obj={:.6e} iters={}",
            result.status,
            result.obj_val,
            result.iterations
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::{CutSource, LinearCut};
    use crate::model::{ConstraintSense, IntegerSpec};

    fn relax<'a>(prob: &'a MipProblem, cuts: Vec<&'a LinearCut>) -> Relaxation<'a> {
        Relaxation {
            problem: prob,
            var_lb: &prob.var_lb,
            var_ub: &prob.var_ub,
            cuts,
            start: &prob.var_lb,
        }
    }

    #[test]
    fn test_fractional_knapsack() {
        // max 3x0 + 2x1 + 4x2 s.t. 2x0 + x1 + 3x2 <= 4, 0 <= x <= 1
        let prob = MipProblem::builder(3)
            .maximize(&[3.0, 2.0, 4.0])
            .constraint(&[2.0, 1.0, 3.0], ConstraintSense::Le, 4.0)
            .spec(IntegerSpec::binaries([0, 1, 2]))
            .build()
            .unwrap();

        let res = SimplexOracle::default().solve(&relax(&prob, vec![]));
        assert!(res.is_success());
        // Ratios 1.5, 2.0, 1.33: take x1, x0, then 1/3 of x2
        assert!((res.obj_val - (2.0 + 3.0 + 4.0 / 3.0)).abs() < 1e-9);
        assert!((res.x[2] - 1.0 / 3.0).abs() < 1e-9);
        assert!(prob.is_feasible(&res.x, 1e-9));
    }

    #[test]
    fn test_ge_and_eq_rows() {
        // min x0 + 2x1 s.t. x0 + x1 >= 3, x0 - x1 = 1
        let prob = MipProblem::builder(2)
            .minimize(&[1.0, 2.0])
            .constraint(&[1.0, 1.0], ConstraintSense::Ge, 3.0)
            .constraint(&[1.0, -1.0], ConstraintSense::Eq, 1.0)
            .build()
            .unwrap();

        let res = SimplexOracle::default().solve(&relax(&prob, vec![]));
        assert!(res.is_success());
        assert!((res.x[0] - 2.0).abs() < 1e-9);
        assert!((res.x[1] - 1.0).abs() < 1e-9);
        assert!((res.obj_val - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible() {
        let prob = MipProblem::builder(2)
            .constraint(&[1.0, 1.0], ConstraintSense::Ge, 2.0)
            .constraint(&[1.0, 1.0], ConstraintSense::Le, 1.0)
            .build()
            .unwrap();

        let res = SimplexOracle::default().solve(&relax(&prob, vec![]));
        assert_eq!(res.status, RelaxationStatus::Infeasible);
        assert!(!res.is_success());
    }

    #[test]
    fn test_unbounded() {
        let prob = MipProblem::builder(1).maximize(&[1.0]).build().unwrap();
        let res = SimplexOracle::default().solve(&relax(&prob, vec![]));
        assert_eq!(res.status, RelaxationStatus::Unbounded);
    }

    #[test]
    fn test_free_and_upper_bounded_vars() {
        // min x0 - x1 with x0 free, x0 >= -2 via a row, x1 <= 5 and no lower bound
        let prob = MipProblem::builder(2)
            .minimize(&[1.0, -1.0])
            .constraint(&[1.0, 0.0], ConstraintSense::Ge, -2.0)
            .bounds(0, f64::NEG_INFINITY, f64::INFINITY)
            .bounds(1, f64::NEG_INFINITY, 5.0)
            .build()
            .unwrap();

        let res = SimplexOracle::default().solve(&relax(&prob, vec![]));
        assert!(res.is_success());
        assert!((res.x[0] + 2.0).abs() < 1e-9);
        assert!((res.x[1] - 5.0).abs() < 1e-9);
        assert!((res.obj_val + 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_cuts_and_local_bounds() {
        let prob = MipProblem::builder(2)
            .maximize(&[1.0, 1.0])
            .constraint(&[2.0, 2.0], ConstraintSense::Le, 3.0)
            .spec(IntegerSpec::integers([0, 1]))
            .build()
            .unwrap();
        let cut = LinearCut::new(vec![1.0, 1.0], 1.0, CutSource::User);

        let res = SimplexOracle::default().solve(&relax(&prob, vec![&cut]));
        assert!((res.obj_val - 1.0).abs() < 1e-9);

        // x0 >= 2 is incompatible with the row
        let lb = [2.0, 0.0];
        let ub = [f64::INFINITY, f64::INFINITY];
        let r = Relaxation {
            problem: &prob,
            var_lb: &lb,
            var_ub: &ub,
            cuts: vec![],
            start: &lb,
        };
        assert_eq!(SimplexOracle::default().solve(&r).status, RelaxationStatus::Infeasible);

        // Crossed bounds are rejected without pivoting
        let lb = [1.0, 0.0];
        let ub = [0.0, 1.0];
        let r = Relaxation {
            problem: &prob,
            var_lb: &lb,
            var_ub: &ub,
            cuts: vec![],
            start: &lb,
        };
        let res = SimplexOracle::default().solve(&r);
        assert_eq!(res.status, RelaxationStatus::Infeasible);
        assert_eq!(res.iterations, 0);
    }
}

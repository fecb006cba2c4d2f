//! MIP problem representation.

use sprs::{CsMat, TriMat};

use super::IntegerSpec;
use crate::error::{MipError, MipResult};

/// Direction of optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    /// Minimize the objective.
    #[default]
    Minimize,

    /// Maximize the objective.
    Maximize,
}

impl ObjectiveSense {
    /// Multiplier mapping an objective value into minimization form.
    pub fn sign(self) -> f64 {
        match self {
            ObjectiveSense::Minimize => 1.0,
            ObjectiveSense::Maximize => -1.0,
        }
    }
}

/// Sense of a linear constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    /// a^T x <= b
    Le,

    /// a^T x >= b
    Ge,

    /// a^T x = b
    Eq,
}

/// A constraint row rewritten as sparse a^T x <= rhs.
#[derive(Debug, Clone)]
pub struct LeRow {
    /// Index of the originating constraint.
    pub row: usize,

    /// Nonzero (column, coefficient) pairs.
    pub coefs: Vec<(usize, f64)>,

    /// Right-hand side.
    pub rhs: f64,
}

/// Mixed-integer linear problem.
///
/// ```text
/// min/max  c^T x
/// s.t.     A_i x (<=|>=|=) b_i
///          lb <= x <= ub
///          x_j integral for j in spec
/// ```
#[derive(Debug, Clone)]
#[allow(non_snake_case)]
pub struct MipProblem {
    /// Objective coefficients.
    pub objective: Vec<f64>,

    /// Optimization direction.
    pub sense: ObjectiveSense,

    /// Constraint matrix (CSR, one row per constraint).
    pub A: CsMat<f64>,

    /// Sense of each row.
    pub row_senses: Vec<ConstraintSense>,

    /// Right-hand side of each row.
    pub rhs: Vec<f64>,

    /// Lower bounds for all variables.
    pub var_lb: Vec<f64>,

    /// Upper bounds for all variables.
    pub var_ub: Vec<f64>,

    /// Optional starting point handed to the oracle at the root.
    pub start: Option<Vec<f64>>,

    /// Integrality declarations.
    pub spec: IntegerSpec,
}

impl MipProblem {
    /// Start building a problem with `num_vars` variables.
    pub fn builder(num_vars: usize) -> ProblemBuilder {
        ProblemBuilder::new(num_vars)
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.objective.len()
    }

    /// Number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.rhs.len()
    }

    /// Validate dimensions and data.
    pub fn validate(&self) -> MipResult<()> {
        let n = self.num_vars();
        if n == 0 {
            return Err(MipError::InvalidProblem("problem has no variables".into()));
        }
        if self.A.cols() != n {
            return Err(MipError::DimensionMismatch {
                what: "constraint matrix columns",
                expected: n,
                found: self.A.cols(),
            });
        }
        if !self.A.is_csr() {
            return Err(MipError::InvalidProblem(
                "constraint matrix must be stored by rows".into(),
            ));
        }
        let m = self.A.rows();
        check_len("right-hand side", m, self.rhs.len())?;
        check_len("row senses", m, self.row_senses.len())?;
        check_len("lower bounds", n, self.var_lb.len())?;
        check_len("upper bounds", n, self.var_ub.len())?;
        if let Some(start) = &self.start {
            check_len("starting point", n, start.len())?;
        }
        if let Some(max) = self.spec.max_index() {
            if max >= n {
                return Err(MipError::DimensionMismatch {
                    what: "integer specification index",
                    expected: n,
                    found: max,
                });
            }
        }

        if self.objective.iter().any(|c| !c.is_finite()) {
            return Err(MipError::InvalidProblem("objective has non-finite entries".into()));
        }
        if self.A.data().iter().any(|a| !a.is_finite()) || self.rhs.iter().any(|b| !b.is_finite())
        {
            return Err(MipError::InvalidProblem("constraints have non-finite entries".into()));
        }
        for j in 0..n {
            if self.var_lb[j].is_nan() || self.var_ub[j].is_nan() {
                return Err(MipError::InvalidProblem(format!("bound of x{} is NaN", j)));
            }
            if self.var_lb[j] > self.var_ub[j] {
                return Err(MipError::InvalidProblem(format!(
                    "x{} has lower bound {} above upper bound {}",
                    j, self.var_lb[j], self.var_ub[j]
                )));
            }
        }
        Ok(())
    }

    /// Objective value c^T x.
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.objective.iter().zip(x).map(|(c, v)| c * v).sum()
    }

    /// Objective coefficients in minimization form.
    pub fn min_objective(&self) -> Vec<f64> {
        let sign = self.sense.sign();
        self.objective.iter().map(|c| sign * c).collect()
    }

    /// Row activity a_i^T x.
    pub fn row_activity(&self, i: usize, x: &[f64]) -> f64 {
        self.A
            .outer_view(i)
            .map(|row| row.iter().map(|(j, a)| a * x[j]).sum())
            .unwrap_or(0.0)
    }

    /// Largest violation of any row or bound (0 if feasible).
    pub fn max_violation(&self, x: &[f64]) -> f64 {
        let mut worst = 0.0_f64;
        for (i, row) in self.A.outer_iterator().enumerate() {
            let act: f64 = row.iter().map(|(j, a)| a * x[j]).sum();
            let viol = match self.row_senses[i] {
                ConstraintSense::Le => act - self.rhs[i],
                ConstraintSense::Ge => self.rhs[i] - act,
                ConstraintSense::Eq => (act - self.rhs[i]).abs(),
            };
            worst = worst.max(viol);
        }
        for j in 0..self.num_vars() {
            worst = worst.max(self.var_lb[j] - x[j]).max(x[j] - self.var_ub[j]);
        }
        worst
    }

    /// Check rows and bounds within tolerance.
    pub fn is_feasible(&self, x: &[f64], tol: f64) -> bool {
        x.len() == self.num_vars() && self.max_violation(x) <= tol
    }

    /// Every row as one (Le/Ge) or two (Eq) `<=` rows.
    pub fn le_rows(&self) -> Vec<LeRow> {
        let mut rows = Vec::with_capacity(self.num_constraints());
        for (i, row) in self.A.outer_iterator().enumerate() {
            let coefs: Vec<(usize, f64)> = row
                .iter()
                .filter(|(_, a)| **a != 0.0)
                .map(|(j, a)| (j, *a))
                .collect();
            let negated = || -> Vec<(usize, f64)> { coefs.iter().map(|&(j, a)| (j, -a)).collect() };
            match self.row_senses[i] {
                ConstraintSense::Le => rows.push(LeRow {
                    row: i,
                    coefs: coefs.clone(),
                    rhs: self.rhs[i],
                }),
                ConstraintSense::Ge => rows.push(LeRow {
                    row: i,
                    coefs: negated(),
                    rhs: -self.rhs[i],
                }),
                ConstraintSense::Eq => {
                    rows.push(LeRow {
                        row: i,
                        coefs: coefs.clone(),
                        rhs: self.rhs[i],
                    });
                    rows.push(LeRow {
                        row: i,
                        coefs: negated(),
                        rhs: -self.rhs[i],
                    });
                }
            }
        }
        rows
    }

    /// Round integer variables to nearest integer.
    pub fn round_integers(&self, x: &mut [f64]) {
        for &i in self.spec.declared() {
            x[i] = x[i].round();
        }
    }

    /// Root starting point: the user's start, or 0 clipped into the bounds.
    pub fn initial_point(&self) -> Vec<f64> {
        match &self.start {
            Some(start) => start.clone(),
            None => (0..self.num_vars())
                .map(|j| 0.0_f64.max(self.var_lb[j]).min(self.var_ub[j]))
                .collect(),
        }
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> MipResult<()> {
    if expected == found {
        Ok(())
    } else {
        Err(MipError::DimensionMismatch {
            what,
            expected,
            found,
        })
    }
}

/// Incremental constructor for [`MipProblem`].
#[derive(Debug)]
pub struct ProblemBuilder {
    num_vars: usize,
    objective: Vec<f64>,
    sense: ObjectiveSense,
    triplets: Vec<(usize, usize, f64)>,
    row_senses: Vec<ConstraintSense>,
    rhs: Vec<f64>,
    var_lb: Vec<f64>,
    var_ub: Vec<f64>,
    start: Option<Vec<f64>>,
    spec: IntegerSpec,
    errors: Vec<MipError>,
}

impl ProblemBuilder {
    /// Create a builder; variables default to `[0, +inf)`.
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            objective: vec![0.0; num_vars],
            sense: ObjectiveSense::Minimize,
            triplets: Vec::new(),
            row_senses: Vec::new(),
            rhs: Vec::new(),
            var_lb: vec![0.0; num_vars],
            var_ub: vec![f64::INFINITY; num_vars],
            start: None,
            spec: IntegerSpec::continuous(),
            errors: Vec::new(),
        }
    }

    /// Minimize c^T x.
    pub fn minimize(mut self, c: &[f64]) -> Self {
        self.set_objective(c, ObjectiveSense::Minimize);
        self
    }

    /// Maximize c^T x.
    pub fn maximize(mut self, c: &[f64]) -> Self {
        self.set_objective(c, ObjectiveSense::Maximize);
        self
    }

    fn set_objective(&mut self, c: &[f64], sense: ObjectiveSense) {
        if c.len() != self.num_vars {
            self.errors.push(MipError::DimensionMismatch {
                what: "objective",
                expected: self.num_vars,
                found: c.len(),
            });
            return;
        }
        self.objective = c.to_vec();
        self.sense = sense;
    }

    /// Add a dense row `coefs^T x (sense) rhs`.
    pub fn constraint(mut self, coefs: &[f64], sense: ConstraintSense, rhs: f64) -> Self {
        if coefs.len() != self.num_vars {
            self.errors.push(MipError::DimensionMismatch {
                what: "constraint row",
                expected: self.num_vars,
                found: coefs.len(),
            });
            return self;
        }
        let sparse: Vec<(usize, f64)> = coefs
            .iter()
            .enumerate()
            .filter(|(_, a)| **a != 0.0)
            .map(|(j, a)| (j, *a))
            .collect();
        self.sparse_constraint(&sparse, sense, rhs)
    }

    /// Add a sparse row given as (column, coefficient) pairs.
    pub fn sparse_constraint(mut self, coefs: &[(usize, f64)], sense: ConstraintSense, rhs: f64) -> Self {
        let row = self.rhs.len();
        for &(j, _) in coefs {
            if j >= self.num_vars {
                self.errors.push(MipError::DimensionMismatch {
                    what: "constraint column",
                    expected: self.num_vars,
                    found: j,
                });
                return self;
            }
        }
        self.triplets.extend(coefs.iter().map(|&(j, a)| (row, j, a)));
        self.row_senses.push(sense);
        self.rhs.push(rhs);
        self
    }

    /// Set bounds of one variable.
    pub fn bounds(mut self, var: usize, lb: f64, ub: f64) -> Self {
        if var >= self.num_vars {
            self.errors.push(MipError::DimensionMismatch {
                what: "bounded variable",
                expected: self.num_vars,
                found: var,
            });
            return self;
        }
        self.var_lb[var] = lb;
        self.var_ub[var] = ub;
        self
    }

    /// Make every variable free.
    pub fn free(mut self) -> Self {
        self.var_lb = vec![f64::NEG_INFINITY; self.num_vars];
        self.var_ub = vec![f64::INFINITY; self.num_vars];
        self
    }

    /// Starting point for the root relaxation.
    pub fn start(mut self, x0: Vec<f64>) -> Self {
        self.start = Some(x0);
        self
    }

    /// Integrality declarations.
    pub fn spec(mut self, spec: IntegerSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Finish and validate.
    pub fn build(self) -> MipResult<MipProblem> {
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }

        let m = self.rhs.len();
        let mut triplets = TriMat::new((m, self.num_vars));
        for &(i, j, a) in &self.triplets {
            triplets.add_triplet(i, j, a);
        }

        let mut var_lb = self.var_lb;
        let mut var_ub = self.var_ub;

        // Binary variables have implicit [0, 1] bounds
        for i in self.spec.binary_vars() {
            if i < var_lb.len() {
                var_lb[i] = var_lb[i].max(0.0);
                var_ub[i] = var_ub[i].min(1.0);
            }
        }

        let prob = MipProblem {
            objective: self.objective,
            sense: self.sense,
            A: triplets.to_csr(),
            row_senses: self.row_senses,
            rhs: self.rhs,
            var_lb,
            var_ub,
            start: self.start,
            spec: self.spec,
        };
        prob.validate()?;
        Ok(prob)
    }
}

//! Linear cut representation.

/// Family that produced a cut (for statistics and debugging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutSource {
    /// Chvátal-Gomory rounding of a constraint row.
    Gomory {
        /// Originating constraint.
        row: usize,
    },

    /// Mixed-integer rounding of a constraint row.
    Mir {
        /// Originating constraint.
        row: usize,
    },

    /// Knapsack cover of a constraint row.
    Cover {
        /// Originating constraint.
        row: usize,
    },

    /// User-provided cut.
    User,
}

/// A linear cut: a^T x <= rhs.
#[derive(Debug, Clone)]
pub struct LinearCut {
    /// Coefficient vector (dense, length n).
    pub coefs: Vec<f64>,

    /// Right-hand side.
    pub rhs: f64,

    /// Source of this cut.
    pub source: CutSource,
}

impl LinearCut {
    /// Create a new cut.
    pub fn new(coefs: Vec<f64>, rhs: f64, source: CutSource) -> Self {
        Self { coefs, rhs, source }
    }

    /// Build a dense cut from sparse (column, coefficient) pairs.
    pub fn from_sparse(n: usize, terms: &[(usize, f64)], rhs: f64, source: CutSource) -> Self {
        let mut coefs = vec![0.0; n];
        for &(j, a) in terms {
            coefs[j] += a;
        }
        Self { coefs, rhs, source }
    }

    /// Left-hand side a^T x.
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.coefs.iter().zip(x.iter()).map(|(a, x)| a * x).sum()
    }

    /// Compute violation: a^T x - rhs (positive means violated).
    pub fn violation(&self, x: &[f64]) -> f64 {
        self.activity(x) - self.rhs
    }

    /// Check if cut is violated by more than tolerance.
    pub fn is_violated(&self, x: &[f64], tol: f64) -> bool {
        self.violation(x) > tol
    }

    /// Euclidean norm of the coefficients.
    pub fn norm(&self) -> f64 {
        self.coefs.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// Violation divided by ||a||_2: distance from `x` to the cut hyperplane.
    pub fn efficacy(&self, x: &[f64]) -> f64 {
        let norm = self.norm();
        if norm < 1e-12 {
            0.0
        } else {
            self.violation(x) / norm
        }
    }

    /// Check if cut has valid coefficients (not all zeros, finite).
    pub fn is_valid(&self) -> bool {
        let has_nonzero = self.coefs.iter().any(|c| c.abs() > 1e-12);
        let all_finite = self.coefs.iter().all(|c| c.is_finite()) && self.rhs.is_finite();
        has_nonzero && all_finite
    }
}

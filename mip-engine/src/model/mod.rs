//! Problem and solution types for MIP solver.

mod problem;
mod solution;
mod spec;

pub use problem::{ConstraintSense, LeRow, MipProblem, ObjectiveSense, ProblemBuilder};
pub use solution::{IncumbentTracker, MipSolution, MipStatus, GAP_EPS};
pub use spec::{IntegerSpec, SosSet, SosType, FRACTIONALITY_TIE_TOL};

//! Branch-and-bound and branch-and-cut for mixed-integer linear programs.
//!
//! This crate searches over integer assignments with a pluggable continuous
//! relaxation oracle. It supports:
//!
//! - **Integer, binary and SOS1/SOS2 declarations** via [`IntegerSpec`]
//! - **Node selection**: best-bound, depth-first, breadth-first, best-estimate
//! - **Branching**: most-fractional, pseudocost, strong branching
//! - **Cutting planes**: Chvátal-Gomory, mixed-integer rounding, knapsack covers
//! - **Termination** on optimality gap, node budget and wall-clock budget
//!
//! # Algorithm
//!
//! Open nodes live in a priority queue. Each popped node's relaxation is
//! handed to a [`RelaxationOracle`]; with branch-and-cut enabled, violated
//! cuts are separated and the relaxation re-solved for a few rounds. The
//! result is then pruned (infeasible or dominated by the incumbent), taken
//! as a new incumbent, or split into two children.
//!
//! # Example
//!
//! ```
//! use mip_engine::{solve_mip, ConstraintSense, IntegerSpec, MipProblem, MipSettings, MipStatus};
//!
//! // max 5x0 + 4x1 + 3x2  s.t.  2x0 + 3x1 + x2 <= 5,  x binary
//! let prob = MipProblem::builder(3)
//!     .maximize(&[5.0, 4.0, 3.0])
//!     .constraint(&[2.0, 3.0, 1.0], ConstraintSense::Le, 5.0)
//!     .spec(IntegerSpec::binaries([0, 1, 2]))
//!     .build()?;
//!
//! let sol = solve_mip(&prob, &MipSettings::default())?;
//! assert_eq!(sol.status, MipStatus::Optimal);
//! assert!((sol.obj_val - 9.0).abs() < 1e-6);
//! # Ok::<(), mip_engine::MipError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod cuts;
pub mod error;
pub mod model;
pub mod oracle;
pub mod search;
pub mod settings;
pub mod solver;

pub use error::{MipError, MipResult};
pub use model::{
    ConstraintSense, IntegerSpec, MipProblem, MipSolution, MipStatus, ObjectiveSense,
    ProblemBuilder, SosSet, SosType,
};
pub use oracle::{Relaxation, RelaxationOracle, RelaxationResult, RelaxationStatus, SimplexOracle};
pub use settings::{BranchingRule, MipSettings, NodeSelection};
pub use solver::{solve_mip, solve_mip_with_oracle, MipSolver};

//! Cutting plane generation for branch-and-cut.
//!
//! This module provides:
//! - Chvátal-Gomory rounding cuts for pure integer rows
//! - Mixed-integer rounding cuts for mixed rows
//! - Cover cuts for binary knapsack rows
//! - A global cut pool with duplicate detection

mod cut;
pub mod cover;
pub mod gomory;
pub mod mir;
mod pool;
mod separator;

pub use cut::{CutSource, LinearCut};
pub use pool::{CutId, CutPool, CutPoolStats};
pub use separator::{CutSeparator, CutStats, SeparatorSettings};

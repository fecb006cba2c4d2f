//! Classification of solved nodes.

use crate::model::{IntegerSpec, ObjectiveSense};
use crate::oracle::RelaxationResult;
use crate::settings::MipSettings;

/// What the search should do with a solved node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    /// The oracle reported infeasibility or failed.
    Infeasible,

    /// The relaxation cannot improve on the incumbent.
    BoundDominated,

    /// Integer- and SOS-feasible: a candidate incumbent.
    IntegerFeasible,

    /// Integer-feasible but violates the SOS set with this index.
    SosViolated(usize),

    /// Fractional declared variables as (var, value, fractionality).
    Fractional(Vec<(usize, f64, f64)>),
}

/// Classify a relaxation result.
///
/// `incumbent` is the incumbent objective in minimization form
/// (+inf when there is none).
pub fn classify(
    result: &RelaxationResult,
    num_vars: usize,
    sense: ObjectiveSense,
    spec: &IntegerSpec,
    incumbent: f64,
    settings: &MipSettings,
) -> NodeOutcome {
    if !result.is_usable(num_vars) {
        return NodeOutcome::Infeasible;
    }

    if sense.sign() * result.obj_val >= incumbent - settings.gap_abs_tol {
        return NodeOutcome::BoundDominated;
    }

    let fractional = spec.fractional_variables(&result.x, settings.int_feas_tol);
    if !fractional.is_empty() {
        return NodeOutcome::Fractional(fractional);
    }

    match spec.first_violated_sos(&result.x, settings.feas_tol) {
        Some(set) => NodeOutcome::SosViolated(set),
        None => NodeOutcome::IntegerFeasible,
    }
}

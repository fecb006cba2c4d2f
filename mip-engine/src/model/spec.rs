//! Integrality declarations.

use std::collections::BTreeSet;

use crate::error::{MipError, MipResult};

/// Fractionalities closer than this are treated as equal.
pub const FRACTIONALITY_TIE_TOL: f64 = 1e-12;

/// Kind of special-ordered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosType {
    /// At most one member may be nonzero.
    Sos1,

    /// At most two members may be nonzero, and they must be adjacent.
    Sos2,
}

/// An ordered group of variables forming an SOS constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosSet {
    /// SOS1 or SOS2.
    pub kind: SosType,

    /// Member variables in set order.
    pub vars: Vec<usize>,
}

impl SosSet {
    /// Create an SOS1 set.
    pub fn sos1(vars: impl IntoIterator<Item = usize>) -> Self {
        Self {
            kind: SosType::Sos1,
            vars: vars.into_iter().collect(),
        }
    }

    /// Create an SOS2 set.
    pub fn sos2(vars: impl IntoIterator<Item = usize>) -> Self {
        Self {
            kind: SosType::Sos2,
            vars: vars.into_iter().collect(),
        }
    }

    /// Positions (within the set) of members with |x| > tol.
    pub fn nonzero_positions(&self, x: &[f64], tol: f64) -> Vec<usize> {
        self.vars
            .iter()
            .enumerate()
            .filter(|(_, &v)| x.get(v).is_some_and(|xv| xv.abs() > tol))
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Check whether `x` satisfies this set.
    pub fn is_satisfied(&self, x: &[f64], tol: f64) -> bool {
        let nz = self.nonzero_positions(x, tol);
        match self.kind {
            SosType::Sos1 => nz.len() <= 1,
            SosType::Sos2 => match nz.as_slice() {
                [] | [_] => true,
                [a, b] => b - a == 1,
                _ => false,
            },
        }
    }
}

/// Declares which variables must take integer or binary values.
///
/// Immutable once built. Integer and binary sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegerSpec {
    integers: BTreeSet<usize>,
    binaries: BTreeSet<usize>,
    sos: Vec<SosSet>,

    /// Union of integers and binaries in ascending order.
    declared: Vec<usize>,
}

impl IntegerSpec {
    /// Build a specification from explicit index sets.
    ///
    /// Fails if an index appears in both the integer and binary sets, or if
    /// an SOS set has fewer than two distinct members.
    pub fn new(
        integers: impl IntoIterator<Item = usize>,
        binaries: impl IntoIterator<Item = usize>,
        sos: Vec<SosSet>,
    ) -> MipResult<Self> {
        let integers: BTreeSet<usize> = integers.into_iter().collect();
        let binaries: BTreeSet<usize> = binaries.into_iter().collect();

        if let Some(&var) = integers.intersection(&binaries).next() {
            return Err(MipError::OverlappingIntegrality { var });
        }

        for set in &sos {
            let distinct: BTreeSet<usize> = set.vars.iter().copied().collect();
            if distinct.len() < 2 || distinct.len() != set.vars.len() {
                return Err(MipError::InvalidProblem(format!(
                    "SOS set {:?} needs at least two distinct members",
                    set.vars
                )));
            }
        }

        let declared = integers.union(&binaries).copied().collect();

        Ok(Self {
            integers,
            binaries,
            sos,
            declared,
        })
    }

    /// All variables continuous.
    pub fn continuous() -> Self {
        Self::default()
    }

    /// General integer variables only.
    pub fn integers(vars: impl IntoIterator<Item = usize>) -> Self {
        let integers: BTreeSet<usize> = vars.into_iter().collect();
        let declared = integers.iter().copied().collect();
        Self {
            integers,
            declared,
            ..Self::default()
        }
    }

    /// Binary variables only.
    pub fn binaries(vars: impl IntoIterator<Item = usize>) -> Self {
        let binaries: BTreeSet<usize> = vars.into_iter().collect();
        let declared = binaries.iter().copied().collect();
        Self {
            binaries,
            declared,
            ..Self::default()
        }
    }

    /// Integer (non-binary) variable indices.
    pub fn integer_vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.integers.iter().copied()
    }

    /// Binary variable indices.
    pub fn binary_vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.binaries.iter().copied()
    }

    /// Every integer or binary index, ascending.
    pub fn declared(&self) -> &[usize] {
        &self.declared
    }

    /// SOS sets.
    pub fn sos_sets(&self) -> &[SosSet] {
        &self.sos
    }

    /// Whether `var` must be integral (integer or binary).
    pub fn is_integral(&self, var: usize) -> bool {
        self.integers.contains(&var) || self.binaries.contains(&var)
    }

    /// Whether `var` is binary.
    pub fn is_binary(&self, var: usize) -> bool {
        self.binaries.contains(&var)
    }

    /// True if nothing is declared integral and there are no SOS sets.
    pub fn is_empty(&self) -> bool {
        self.declared.is_empty() && self.sos.is_empty()
    }

    /// Largest referenced index, if any.
    pub fn max_index(&self) -> Option<usize> {
        let sos_max = self.sos.iter().flat_map(|s| s.vars.iter().copied()).max();
        self.declared.last().copied().max(sos_max)
    }

    /// Distance of a value to its nearest integer.
    pub fn fractionality(val: f64) -> f64 {
        (val - val.round()).abs()
    }

    /// Check if a solution is integer-feasible within tolerance.
    ///
    /// A point too short to hold every declared index is not feasible.
    pub fn is_integer_feasible(&self, x: &[f64], tol: f64) -> bool {
        self.declared
            .iter()
            .all(|&i| x.get(i).is_some_and(|&v| Self::fractionality(v) <= tol))
    }

    /// Get fractional integer variables and their values.
    ///
    /// Returns (var_index, current_value, fractionality) in ascending index order.
    /// Indices past the end of `x` are skipped.
    pub fn fractional_variables(&self, x: &[f64], tol: f64) -> Vec<(usize, f64, f64)> {
        self.declared
            .iter()
            .filter_map(|&i| {
                let v = *x.get(i)?;
                let frac = Self::fractionality(v);
                (frac > tol).then_some((i, v, frac))
            })
            .collect()
    }

    /// Declared index farthest from an integer; ties go to the lowest index.
    pub fn most_fractional_variable(&self, x: &[f64], tol: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, _, frac) in self.fractional_variables(x, tol) {
            match best {
                Some((_, f)) if frac <= f + FRACTIONALITY_TIE_TOL => {}
                _ => best = Some((i, frac)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Check every SOS set.
    pub fn is_sos_feasible(&self, x: &[f64], tol: f64) -> bool {
        self.first_violated_sos(x, tol).is_none()
    }

    /// Index of the first violated SOS set.
    pub fn first_violated_sos(&self, x: &[f64], tol: f64) -> Option<usize> {
        self.sos.iter().position(|s| !s.is_satisfied(x, tol))
    }
}

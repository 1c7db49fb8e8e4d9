use crate::tableau::Tableau;

use thiserror::Error;

/// Failure kinds surfaced by the solver engines.
///
/// Inside branch and bound a node-local failure is swallowed (the node is
/// marked infeasible and the search continues); everywhere else these
/// propagate to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("objective is unbounded")]
    Unbounded,

    #[error("no feasible solution exists")]
    Infeasible,

    #[error("selected pivot element is numerically zero")]
    ZeroPivot,

    #[error("iteration limit of {limit} exceeded")]
    IterationCap { limit: usize },

    #[error("constraint {row} has {found} coefficients, expected {expected}")]
    MalformedModel {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// A failed simplex phase together with the iteration history recorded up
/// to the failure point, starting tableau included.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct SolveFailure {
    pub iterations: Vec<Tableau>,
    pub error: SolveError,
}

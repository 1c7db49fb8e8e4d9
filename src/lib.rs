//! Tableau-based solver core for linear and mixed-integer linear programs.
//!
//! Four engines share one dense tableau representation and one explicit
//! basis encoding: a primal simplex, a dual simplex that repairs negative
//! right-hand sides, a depth-first branch and bound that warm-starts each
//! child from its parent's final tableau, and a Gomory fractional-cut loop.
//! A greedy 0/1 knapsack branch and bound rounds out the set for the
//! single-capacity-constraint special case.
//!
//! Models are built with [`Model`], [`Variable`] and [`Constraint`] and
//! handed to the `solve_*` entry points; every solve returns its full
//! iteration history as a sequence of tableau snapshots.

mod bnb;
mod canon;
mod constraint;
mod cutting;
mod dual;
mod error;
mod knapsack;
mod model;
mod primal;
mod solver;
mod tableau;
mod var;

pub use bnb::{BnbNode, BnbOutcome, BranchAndBound};
pub use canon::{canonicalize, Bound, BoundKind, CanonForm, RowType};
pub use constraint::{Comp, Constraint};
pub use cutting::{CutOutcome, CuttingPlane};
pub use dual::DualSimplex;
pub use error::{SolveError, SolveFailure};
pub use knapsack::{BnbKnapsack, KnapsackNode, KnapsackOutcome, KnapsackStatus};
pub use model::{Model, OptDir};
pub use primal::PrimalSimplex;
pub use solver::{
    solve_branch_and_bound, solve_cutting_plane, solve_dual, solve_knapsack, solve_primal,
    LpOutcome,
};
pub use tableau::{Tableau, TableauIx};
pub use var::{VarType, Variable};

/// Zero comparisons and post-pivot drift snapping.
pub const ZERO_EPS: f64 = 1e-9;
/// Fractionality detection in the cutting-plane loop.
pub const FRAC_EPS: f64 = 1e-7;
/// Integer-feasibility checks in branch and bound.
pub const INT_EPS: f64 = 1e-6;
/// Hard floor under pivot elements.
pub const PIVOT_EPS: f64 = 1e-15;
/// Unit-column detection when reading a basis off a tableau.
pub const BASIS_EPS: f64 = 1e-8;

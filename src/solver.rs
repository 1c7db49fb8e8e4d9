use crate::bnb::{BnbOutcome, BranchAndBound};
use crate::canon::canonicalize;
use crate::cutting::{CutOutcome, CuttingPlane};
use crate::dual::DualSimplex;
use crate::error::{SolveError, SolveFailure};
use crate::knapsack::{BnbKnapsack, KnapsackOutcome};
use crate::model::Model;
use crate::primal::PrimalSimplex;
use crate::tableau::Tableau;

use std::collections::HashMap;

/// Iteration history and extracted optimum of one LP solve.
#[derive(Debug)]
pub struct LpOutcome {
    /// The initial tableau followed by every post-pivot tableau, across the
    /// dual-repair phase (when one ran) and the primal phase.
    pub iterations: Vec<Tableau>,
    pub x: HashMap<String, f64>,
    pub z: f64,
}

//both phases record their starting tableau; keep one copy at the seam
fn chain_iterations(iterations: &mut Vec<Tableau>, more: Vec<Tableau>) {
    if iterations.is_empty() {
        iterations.extend(more);
    } else {
        iterations.extend(more.into_iter().skip(1));
    }
}

/// Solve the LP relaxation of a model: canonicalize, repair any negative
/// right-hand sides with the dual simplex, then optimize with the primal.
/// A failure still carries every tableau recorded before it.
pub fn solve_primal(mdl: &Model) -> Result<LpOutcome, SolveFailure> {
    let canon = match canonicalize(mdl, &[]) {
        Ok(canon) => canon,
        Err(error) => {
            return Err(SolveFailure {
                iterations: Vec::new(),
                error,
            })
        }
    };
    let mut tbl = Tableau::from_canon(&canon);

    let mut iterations: Vec<Tableau> = Vec::new();
    if !tbl.rhs_feasible() {
        match DualSimplex::default().solve(&mut tbl) {
            Ok(iters) => chain_iterations(&mut iterations, iters),
            Err(SolveFailure {
                iterations: partial,
                error,
            }) => {
                chain_iterations(&mut iterations, partial);
                return Err(SolveFailure { iterations, error });
            }
        }
    }
    match PrimalSimplex::default().solve(&mut tbl) {
        Ok(iters) => chain_iterations(&mut iterations, iters),
        Err(SolveFailure {
            iterations: partial,
            error,
        }) => {
            chain_iterations(&mut iterations, partial);
            return Err(SolveFailure { iterations, error });
        }
    }

    let x_user = canon.user_x(&tbl.x_values());
    let x = mdl
        .var_names()
        .into_iter()
        .zip(x_user)
        .collect::<HashMap<String, f64>>();

    Ok(LpOutcome {
        iterations,
        x,
        z: canon.user_z(tbl.z_value()),
    })
}

/// Run the dual simplex on a caller-assembled tableau.
pub fn solve_dual(mut tbl: Tableau) -> Result<Vec<Tableau>, SolveFailure> {
    DualSimplex::default().solve(&mut tbl)
}

pub fn solve_branch_and_bound(mdl: &Model) -> Result<BnbOutcome, SolveError> {
    BranchAndBound::default().solve(mdl)
}

pub fn solve_cutting_plane(mdl: &Model) -> CutOutcome {
    CuttingPlane::default().solve(mdl)
}

pub fn solve_knapsack(mdl: &Model) -> KnapsackOutcome {
    BnbKnapsack::default().solve(mdl)
}

use crate::error::{SolveError, SolveFailure};
use crate::tableau::{Tableau, TableauIx};
use crate::ZERO_EPS;

use log::{debug, trace};

/// Dual simplex: drives every right-hand side nonnegative while the
/// objective row stays on the optimality side.
pub struct DualSimplex {
    max_iterations: usize,
}

impl Default for DualSimplex {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
        }
    }
}

impl DualSimplex {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    fn pivot_ix(&self, tbl: &Tableau) -> Result<Option<TableauIx>, SolveError> {
        let rhs = tbl.rhs_col();

        //leaving row: most negative right-hand side
        let i = match (1..tbl.n_rows())
            .map(|i| (i, tbl.tbl()[[i, rhs]]))
            .filter(|(_i, b)| *b < -ZERO_EPS)
            .min_by(|(_i1, b1), (_i2, b2)| b1.partial_cmp(b2).expect("nan in rhs column"))
            .map(|(i, _b)| i)
        {
            Some(i) => i,
            None => return Ok(None),
        };

        //entering column: minimum dual ratio over negative row entries
        let j = (0..rhs)
            .filter(|&j| tbl.tbl()[[i, j]] < -ZERO_EPS)
            .map(|j| (j, (tbl.tbl()[[0, j]] / tbl.tbl()[[i, j]]).abs()))
            .min_by(|(_j1, r1), (_j2, r2)| r1.partial_cmp(r2).expect("nan in dual ratio"))
            .map(|(j, _r)| j)
            .ok_or(SolveError::Infeasible)?;

        Ok(Some(TableauIx::new(i, j)))
    }

    /// Iterate until the rhs column is nonnegative, recording every tableau
    /// including the start. A failure carries the history recorded up to
    /// the failure point.
    pub fn solve(&self, tbl: &mut Tableau) -> Result<Vec<Tableau>, SolveFailure> {
        let mut iterations = vec![tbl.clone()];

        loop {
            let ix = match self.pivot_ix(tbl) {
                Ok(Some(ix)) => ix,
                Ok(None) => return Ok(iterations),
                Err(error) => return Err(SolveFailure { iterations, error }),
            };
            if iterations.len() > self.max_iterations {
                return Err(SolveFailure {
                    iterations,
                    error: SolveError::IterationCap {
                        limit: self.max_iterations,
                    },
                });
            }
            debug!("dual pivot at row {}, column {}", ix.i(), ix.j());
            if let Err(error) = tbl.pivot(ix) {
                return Err(SolveFailure { iterations, error });
            }
            trace!("{}", tbl);
            iterations.push(tbl.clone());
        }
    }
}

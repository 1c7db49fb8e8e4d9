use crate::error::{SolveError, SolveFailure};
use crate::tableau::{Tableau, TableauIx};
use crate::ZERO_EPS;

use log::{debug, trace};

/// Primal simplex over a right-hand-side feasible tableau.
///
/// Everything runs in the maximize convention: the tableau is optimal once
/// the objective row has no entry below `-ZERO_EPS` outside the rhs column.
pub struct PrimalSimplex {
    max_iterations: usize,
}

impl Default for PrimalSimplex {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
        }
    }
}

impl PrimalSimplex {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    fn pivot_ix(&self, tbl: &Tableau) -> Result<Option<TableauIx>, SolveError> {
        let rhs = tbl.rhs_col();

        //entering column: most negative objective-row entry
        let j = match (0..rhs)
            .map(|j| (j, tbl.tbl()[[0, j]]))
            .filter(|(_j, v)| *v < -ZERO_EPS)
            .min_by(|(_j1, v1), (_j2, v2)| v1.partial_cmp(v2).expect("nan in objective row"))
            .map(|(j, _v)| j)
        {
            Some(j) => j,
            None => return Ok(None),
        };

        //leaving row: minimum ratio over rows with a positive entry
        let i = (1..tbl.n_rows())
            .filter(|&i| tbl.tbl()[[i, j]] > ZERO_EPS)
            .map(|i| (i, tbl.tbl()[[i, rhs]] / tbl.tbl()[[i, j]]))
            .min_by(|(_i1, r1), (_i2, r2)| r1.partial_cmp(r2).expect("nan in ratio test"))
            .map(|(i, _r)| i)
            .ok_or(SolveError::Unbounded)?;

        Ok(Some(TableauIx::new(i, j)))
    }

    /// Iterate to optimality, recording every tableau including the start.
    /// A failure carries the history recorded up to the failure point.
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
            debug!("primal pivot at row {}, column {}", ix.i(), ix.j());
            if let Err(error) = tbl.pivot(ix) {
                return Err(SolveFailure { iterations, error });
            }
            trace!("{}", tbl);
            iterations.push(tbl.clone());
        }
    }
}

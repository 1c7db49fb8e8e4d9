use crate::canon::{canonicalize, Bound, CanonForm};
use crate::dual::DualSimplex;
use crate::error::SolveError;
use crate::model::Model;
use crate::primal::PrimalSimplex;
use crate::tableau::{fmt_cell, Tableau};
use crate::var::VarType;
use crate::{FRAC_EPS, ZERO_EPS};

use log::debug;

/// Result of a Gomory cutting-plane run. On failure the fields still carry
/// everything produced up to the failure point.
pub struct CutOutcome {
    pub x_opt: Vec<f64>,
    pub z_opt: f64,
    pub cuts_added: usize,
    /// Every tableau produced, in execution order across all phases.
    pub tableaus: Vec<Tableau>,
    pub logs: Vec<String>,
    pub failure: Option<SolveError>,
}

/// Gomory fractional-cut loop: optimize the relaxation, derive a cut from a
/// fractional source row, graft it onto the tableau and let the dual
/// simplex lift the violated row, until every integral variable is integer.
pub struct CuttingPlane {
    max_cuts: usize,
    max_iterations: usize,
}

impl Default for CuttingPlane {
    fn default() -> Self {
        Self {
            max_cuts: 200,
            max_iterations: 10_000,
        }
    }
}

/// A usable cut source needs a fractional part clear of both 0 and 1;
/// anything inside `ZERO_EPS` of either would produce a zero cut.
fn viable_rhs(b: f64) -> bool {
    let frac = b - b.floor();
    frac > ZERO_EPS && frac < 1.0_f64 - ZERO_EPS
}

/// Pick the row a cut is derived from: prefer the row where the fractional
/// variable is basic, then any row with an integral basic variable and
/// fractional rhs, then any row with fractional rhs.
pub(crate) fn cut_source_row(tbl: &Tableau, mdl: &Model, frac_var: usize) -> Option<usize> {
    let rhs = tbl.rhs_col();

    if let Some(r) = tbl.basic_vars().iter().position(|&c| c == frac_var) {
        if viable_rhs(tbl.tbl()[[r + 1, rhs]]) {
            return Some(r + 1);
        }
    }

    for (r, &c) in tbl.basic_vars().iter().enumerate() {
        if c < tbl.n_decision()
            && mdl.vars()[c].ty().is_integral()
            && viable_rhs(tbl.tbl()[[r + 1, rhs]])
        {
            return Some(r + 1);
        }
    }

    (1..tbl.n_rows()).find(|&i| viable_rhs(tbl.tbl()[[i, rhs]]))
}

impl CuttingPlane {
    pub fn new(max_cuts: usize, max_iterations: usize) -> Self {
        Self {
            max_cuts,
            max_iterations,
        }
    }

    pub fn solve(&self, mdl: &Model) -> CutOutcome {
        //every integral variable starts with a unit upper bound row; the
        //binary ones get theirs from canonicalization
        let bounds: Vec<Bound> = mdl
            .vars()
            .iter()
            .enumerate()
            .filter(|(_, v)| v.ty() == VarType::Integer)
            .map(|(j, _)| Bound::upper(j, 1.0_f64))
            .collect();

        let canon = match canonicalize(mdl, &bounds) {
            Ok(canon) => canon,
            Err(err) => {
                return CutOutcome {
                    x_opt: Vec::new(),
                    z_opt: 0.0_f64,
                    cuts_added: 0,
                    tableaus: Vec::new(),
                    logs: Vec::new(),
                    failure: Some(err),
                }
            }
        };

        let mut tbl = Tableau::from_canon(&canon);
        let dual = DualSimplex::new(self.max_iterations);
        let primal = PrimalSimplex::new(self.max_iterations);

        let mut tableaus: Vec<Tableau> = Vec::new();
        let mut logs: Vec<String> = Vec::new();
        let mut cuts_added = 0;

        let failure = loop {
            //repair feasibility, then optimize, deduplicating the shared
            //starting snapshot between phases
            if !tbl.rhs_feasible() {
                match dual.solve(&mut tbl) {
                    Ok(iters) => append_iterations(&mut tableaus, iters),
                    Err(failure) => {
                        append_iterations(&mut tableaus, failure.iterations);
                        break Some(failure.error);
                    }
                }
            }
            match primal.solve(&mut tbl) {
                Ok(iters) => append_iterations(&mut tableaus, iters),
                Err(failure) => {
                    append_iterations(&mut tableaus, failure.iterations);
                    break Some(failure.error);
                }
            }

            let x = tbl.x_values();
            let fractional = mdl.vars().iter().enumerate().find(|(j, v)| {
                v.ty().is_integral() && (x[*j] - x[*j].round()).abs() > FRAC_EPS
            });
            let frac_var = match fractional {
                Some((j, _)) => j,
                None => break None,
            };

            let source = match cut_source_row(&tbl, mdl, frac_var) {
                Some(row) => row,
                None => {
                    logs.push("no viable cut source row; stopping".to_string());
                    break None;
                }
            };

            if cuts_added >= self.max_cuts {
                break Some(SolveError::IterationCap {
                    limit: self.max_cuts,
                });
            }

            //assemble the fractional cut: floor(a) - a per column, rhs
            //-frac(b), so the current optimum violates the new row
            let rhs_col = tbl.rhs_col();
            let coeffs: Vec<f64> = (0..rhs_col)
                .map(|j| {
                    let a = tbl.tbl()[[source, j]];
                    a.floor() - a
                })
                .collect();
            let b = tbl.tbl()[[source, rhs_col]];
            let b_frac = b - b.floor();

            cuts_added += 1;
            tbl.grow(&coeffs, format!("G{}", cuts_added), -b_frac);
            //record the grown tableau; the next phase starts from it
            tableaus.push(tbl.clone());

            logs.push(format!(
                "cut {}: source row {}, fractional part {}, z = {}",
                cuts_added,
                source,
                fmt_cell(b_frac),
                fmt_cell(canon.user_z(tbl.z_value()))
            ));
            debug!(
                "gomory cut {} from row {} with fractional part {}",
                cuts_added, source, b_frac
            );
        };

        finish(&canon, &tbl, cuts_added, tableaus, logs, failure)
    }
}

fn append_iterations(tableaus: &mut Vec<Tableau>, iters: Vec<Tableau>) {
    if tableaus.is_empty() {
        tableaus.extend(iters);
    } else {
        tableaus.extend(iters.into_iter().skip(1));
    }
}

fn finish(
    canon: &CanonForm,
    tbl: &Tableau,
    cuts_added: usize,
    tableaus: Vec<Tableau>,
    logs: Vec<String>,
    failure: Option<SolveError>,
) -> CutOutcome {
    CutOutcome {
        x_opt: canon.user_x(&tbl.x_values()),
        z_opt: canon.user_z(tbl.z_value()),
        cuts_added,
        tableaus,
        logs,
        failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Comp, Constraint};
    use crate::model::OptDir;
    use crate::var::Variable;

    use approx::assert_relative_eq;

    use ndarray::array;

    #[test]
    fn solves_binary_ip_to_integrality() {
        //max 2x1 + 3x2 + 3x3 + 5x4 + 2x5 + 4x6
        //s.t. 11x1 + 8x2 + 6x3 + 14x4 + 10x5 + 10x6 <= 40, all binary
        let mut mdl = Model::new(OptDir::Max);
        let profits = [2, 3, 3, 5, 2, 4];
        for (i, p) in profits.iter().enumerate() {
            mdl.add_var(Variable::binary(format!("x{}", i + 1), *p));
        }
        mdl.add_constraint(Constraint::new(
            vec![11.0, 8.0, 6.0, 14.0, 10.0, 10.0],
            Comp::Le,
            40,
        ));

        let outcome = CuttingPlane::default().solve(&mdl);

        assert!(outcome.failure.is_none());
        assert!(outcome.cuts_added >= 1);
        for v in &outcome.x_opt {
            assert!((v - v.round()).abs() < 1e-6);
            assert!(*v > -1e-6 && *v < 1.0 + 1e-6);
        }
        assert_relative_eq!(outcome.z_opt, 15.0, epsilon = 1e-6);

        //the capacity row holds at the integer optimum
        let used: f64 = outcome
            .x_opt
            .iter()
            .zip([11.0, 8.0, 6.0, 14.0, 10.0, 10.0])
            .map(|(x, w)| x * w)
            .sum();
        assert!(used <= 40.0 + 1e-6);
    }

    #[test]
    fn first_cut_starts_violated() {
        //max x1 + x2 with 2x1 + 2x2 <= 3 over binaries: the relaxation is
        //fractional, and the freshly inserted cut row must carry a negative
        //rhs (the previous optimum no longer satisfies it)
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::binary("x1", 1));
        mdl.add_var(Variable::binary("x2", 1));
        mdl.add_constraint(Constraint::new(vec![2.0, 2.0], Comp::Le, 3));

        let canon = canonicalize(&mdl, &[]).unwrap();
        let mut tbl = Tableau::from_canon(&canon);
        PrimalSimplex::default().solve(&mut tbl).unwrap();

        let x = tbl.x_values();
        let frac_var = (0..2)
            .find(|&j| (x[j] - x[j].round()).abs() > FRAC_EPS)
            .unwrap();
        let source = cut_source_row(&tbl, &mdl, frac_var).unwrap();

        let rhs_col = tbl.rhs_col();
        let coeffs: Vec<f64> = (0..rhs_col)
            .map(|j| {
                let a = tbl.tbl()[[source, j]];
                a.floor() - a
            })
            .collect();
        let b = tbl.tbl()[[source, rhs_col]];
        tbl.grow(&coeffs, "G1".to_string(), -(b - b.floor()));

        let last = tbl.n_rows() - 1;
        assert!(tbl.tbl()[[last, tbl.rhs_col()]] < -ZERO_EPS);
    }

    #[test]
    fn small_binary_ip_reaches_the_integer_optimum() {
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::binary("x1", 1));
        mdl.add_var(Variable::binary("x2", 1));
        mdl.add_constraint(Constraint::new(vec![2.0, 2.0], Comp::Le, 3));

        let outcome = CuttingPlane::default().solve(&mdl);

        assert!(outcome.failure.is_none());
        assert_relative_eq!(outcome.z_opt, 1.0, epsilon = 1e-6);
        for v in &outcome.x_opt {
            assert!((v - v.round()).abs() < 1e-6);
        }
    }

    #[test]
    fn minimization_round_trips_through_the_sign_fold() {
        //min -(x1 + x2) over the same region is the previous test negated
        let mut mdl = Model::new(OptDir::Min);
        mdl.add_var(Variable::binary("x1", -1));
        mdl.add_var(Variable::binary("x2", -1));
        mdl.add_constraint(Constraint::new(vec![2.0, 2.0], Comp::Le, 3));

        let outcome = CuttingPlane::default().solve(&mdl);

        assert!(outcome.failure.is_none());
        assert_relative_eq!(outcome.z_opt, -1.0, epsilon = 1e-6);
    }

    #[test]
    fn degenerate_rows_are_skipped_as_cut_sources() {
        //hand-built tableau: row 1 carries a near-integral rhs and must be
        //passed over in favor of the genuinely fractional row 2
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::integer("x1", 1));
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Le, 10));
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Le, 10));

        let tbl = Tableau::new(
            array![
                [0.0, 1.0, 1.0, 0.0],
                [1.0, 1.0, 0.0, 3.000000000001],
                [0.0, 1.0, 1.0, 2.5],
            ],
            vec![0, 2],
            1,
            vec![
                "x1".to_string(),
                "S1".to_string(),
                "S2".to_string(),
                "rhs".to_string(),
            ],
        );

        //x1 is basic in row 1, but its rhs fractional part is ~1e-12
        assert_eq!(cut_source_row(&tbl, &mdl, 0), Some(2));
    }

    #[test]
    fn no_viable_source_row_yields_none() {
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::integer("x1", 1));
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Le, 10));

        let tbl = Tableau::new(
            array![[0.0, 1.0, 2.0], [1.0, 1.0, 3.0]],
            vec![0],
            1,
            vec!["x1".to_string(), "S1".to_string(), "rhs".to_string()],
        );

        assert_eq!(cut_source_row(&tbl, &mdl, 0), None);
    }
}

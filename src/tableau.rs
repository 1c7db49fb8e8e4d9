use crate::canon::CanonForm;
use crate::error::SolveError;
use crate::{BASIS_EPS, PIVOT_EPS, ZERO_EPS};

use ndarray::{s, Array2};

use std::fmt;

use tabled::{builder::Builder, object::Rows, style::Border, Modify, Style};

#[derive(Copy, Clone, Debug, Hash)]
pub struct TableauIx {
    i: usize,
    j: usize,
}

impl TableauIx {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j }
    }

    pub fn i(&self) -> usize {
        self.i
    }

    pub fn j(&self) -> usize {
        self.j
    }
}

/// Dense simplex tableau.
///
/// Row 0 is the objective row; rows 1..=m are constraint rows. Columns are
/// the decision variables, then one slack/surplus per constraint row, then
/// the right-hand side last. `basic_vars[i]` is the column currently basic
/// in constraint row `i + 1` and is kept current by every pivot, so value
/// extraction never re-scans columns for unit patterns.
#[derive(Debug, Clone)]
pub struct Tableau {
    pub(crate) tbl: Array2<f64>,
    pub(crate) basic_vars: Vec<usize>,
    pub(crate) n_decision: usize,
    pub(crate) headers: Vec<String>,
}

impl Tableau {
    //constructor for callers that assembled the matrix themselves
    pub fn new(
        tbl: Array2<f64>,
        basic_vars: Vec<usize>,
        n_decision: usize,
        headers: Vec<String>,
    ) -> Self {
        Self {
            tbl,
            basic_vars,
            n_decision,
            headers,
        }
    }

    pub fn from_canon(canon: &CanonForm) -> Self {
        let m = canon.n_rows();
        let n = canon.n_vars();
        let mut tbl = Array2::<f64>::zeros((m + 1, n + m + 1));

        //objective row holds the negated maximize-sense coefficients
        for (j, c) in canon.obj.iter().enumerate() {
            tbl[[0, j]] = -c;
        }

        //constraint rows, each with its own unit slack column
        for (i, row) in canon.rows.iter().enumerate() {
            for (j, a) in row.iter().enumerate() {
                tbl[[i + 1, j]] = *a;
            }
            tbl[[i + 1, n + i]] = 1.0_f64;
            tbl[[i + 1, n + m]] = canon.rhs[i];
        }

        let basic_vars = (0..m).map(|i| n + i).collect();

        Self {
            tbl,
            basic_vars,
            n_decision: n,
            headers: canon.headers().to_vec(),
        }
    }

    pub fn tbl(&self) -> &Array2<f64> {
        &self.tbl
    }

    pub fn n_rows(&self) -> usize {
        self.tbl.shape()[0]
    }

    pub fn n_cols(&self) -> usize {
        self.tbl.shape()[1]
    }

    pub fn rhs_col(&self) -> usize {
        self.n_cols() - 1
    }

    pub fn n_decision(&self) -> usize {
        self.n_decision
    }

    pub fn basic_vars(&self) -> &[usize] {
        &self.basic_vars
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    //pivot
    pub fn pivot(&mut self, ix: TableauIx) -> Result<(), SolveError> {
        assert!(ix.i() >= 1 && ix.i() < self.n_rows());
        assert!(ix.j() < self.rhs_col());

        let div = self.tbl[[ix.i(), ix.j()]];
        if div.abs() < PIVOT_EPS {
            return Err(SolveError::ZeroPivot);
        }

        //scale pivot row
        for j in 0..self.n_cols() {
            self.tbl[[ix.i(), j]] /= div;
        }

        //eliminate the pivot column from every other row
        for i in 0..self.n_rows() {
            if i == ix.i() {
                continue;
            }
            let ratio = self.tbl[[i, ix.j()]];
            if ratio == 0.0_f64 {
                continue;
            }
            for j in 0..self.n_cols() {
                self.tbl[[i, j]] -= self.tbl[[ix.i(), j]] * ratio;
            }
        }

        //snap accumulated drift
        self.tbl
            .mapv_inplace(|v| if v.abs() < ZERO_EPS { 0.0_f64 } else { v });

        //update basic vars
        self.basic_vars[ix.i() - 1] = ix.j();
        Ok(())
    }

    /// Grow by one row and one column. The new slack column takes the old
    /// rhs position, the rhs moves one column right, and the new bottom row
    /// is `coeffs` over the old non-rhs span with `+1` in the new slack.
    /// The new row starts basic in its own slack.
    pub fn grow(&mut self, coeffs: &[f64], slack_header: String, rhs: f64) {
        let (rows, cols) = (self.n_rows(), self.n_cols());
        assert_eq!(coeffs.len(), cols - 1);

        let mut grown = Array2::<f64>::zeros((rows + 1, cols + 1));
        grown
            .slice_mut(s![..rows, ..cols - 1])
            .assign(&self.tbl.slice(s![.., ..cols - 1]));
        grown
            .slice_mut(s![..rows, cols])
            .assign(&self.tbl.slice(s![.., cols - 1]));

        for (j, a) in coeffs.iter().enumerate() {
            grown[[rows, j]] = *a;
        }
        grown[[rows, cols - 1]] = 1.0_f64;
        grown[[rows, cols]] = rhs;

        self.tbl = grown;
        self.basic_vars.push(cols - 1);
        self.headers.insert(cols - 1, slack_header);
    }

    /// Reduce the freshly grown bottom row against the basis so it is
    /// expressed in nonbasic columns plus its own slack.
    pub fn price_out_last_row(&mut self) {
        let last = self.n_rows() - 1;
        for r in 0..self.basic_vars.len() - 1 {
            let col = self.basic_vars[r];
            let f = self.tbl[[last, col]];
            if f.abs() < ZERO_EPS {
                continue;
            }
            for j in 0..self.n_cols() {
                let v = self.tbl[[r + 1, j]];
                self.tbl[[last, j]] -= f * v;
            }
        }
        self.tbl
            .row_mut(last)
            .mapv_inplace(|v| if v.abs() < ZERO_EPS { 0.0_f64 } else { v });
    }

    /// Decision-variable values; nonbasic columns read 0.
    pub fn x_values(&self) -> Vec<f64> {
        let mut x = vec![0.0_f64; self.n_decision];
        let rhs = self.rhs_col();
        for (r, &col) in self.basic_vars.iter().enumerate() {
            if col < self.n_decision {
                x[col] = self.tbl[[r + 1, rhs]];
            }
        }
        x
    }

    pub fn z_value(&self) -> f64 {
        self.tbl[[0, self.rhs_col()]]
    }

    pub fn rhs_feasible(&self) -> bool {
        let rhs = self.rhs_col();
        (1..self.n_rows()).all(|i| self.tbl[[i, rhs]] >= -ZERO_EPS)
    }

    /// True when the column is a unit vector over the constraint rows.
    pub fn is_unit_column(&self, j: usize) -> bool {
        let mut ones = 0;
        for i in 1..self.n_rows() {
            let v = self.tbl[[i, j]];
            if (v - 1.0_f64).abs() < BASIS_EPS {
                ones += 1;
            } else if v.abs() > BASIS_EPS {
                return false;
            }
        }
        ones == 1
    }
}

/// Cell rendering for emitted tableaus: integer-looking values lose their
/// decimals, everything else keeps two, and `-0.00` reads as `0`.
pub(crate) fn fmt_cell(v: f64) -> String {
    let r = v.round();
    if (v - r).abs() < ZERO_EPS {
        //fold -0 into 0
        let r = if r == 0.0_f64 { 0.0_f64 } else { r };
        format!("{}", r as i64)
    } else {
        let s = format!("{:.2}", v);
        if s == "-0.00" {
            "0".to_string()
        } else {
            s
        }
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = Builder::default();

        let mut header = vec!["Basic".to_string()];
        header.extend(self.headers.iter().cloned());
        builder.add_record(header);

        for i in 0..self.n_rows() {
            let label = if i == 0 {
                "Z".to_string()
            } else {
                self.headers[self.basic_vars[i - 1]].clone()
            };
            let mut record = vec![label];
            record.extend(self.tbl.row(i).iter().map(|&v| fmt_cell(v)));
            builder.add_record(record);
        }

        let mut table = builder.build();
        table
            .with(Style::empty())
            .with(Modify::new(Rows::single(0)).with(Border::default().bottom('\u{2500}')));

        write!(f, "{}", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canon::canonicalize;
    use crate::constraint::{Comp, Constraint};
    use crate::model::{Model, OptDir};
    use crate::var::Variable;

    use approx::assert_relative_eq;

    fn small_tableau() -> Tableau {
        //max 3x1 + 5x2; x1 <= 4; 2x2 <= 12; 3x1 + 2x2 <= 18
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::positive("x1", 3));
        mdl.add_var(Variable::positive("x2", 5));
        mdl.add_constraint(Constraint::new(vec![1.0, 0.0], Comp::Le, 4));
        mdl.add_constraint(Constraint::new(vec![0.0, 2.0], Comp::Le, 12));
        mdl.add_constraint(Constraint::new(vec![3.0, 2.0], Comp::Le, 18));

        Tableau::from_canon(&canonicalize(&mdl, &[]).unwrap())
    }

    #[test]
    fn fresh_build_shape_and_basis() {
        let tbl = small_tableau();
        assert_eq!(tbl.n_rows(), 4);
        assert_eq!(tbl.n_cols(), 6);
        assert_eq!(tbl.basic_vars(), &[2, 3, 4]);
        assert_eq!(tbl.tbl()[[0, 0]], -3.0);
        assert_eq!(tbl.tbl()[[0, 1]], -5.0);
        assert_eq!(tbl.tbl()[[3, 5]], 18.0);
    }

    #[test]
    fn pivot_updates_basis_and_keeps_unit_columns() {
        let mut tbl = small_tableau();
        tbl.pivot(TableauIx::new(2, 1)).unwrap();

        assert_eq!(tbl.basic_vars(), &[2, 1, 4]);
        for &col in tbl.basic_vars() {
            assert!(tbl.is_unit_column(col));
        }
        assert_relative_eq!(tbl.x_values()[1], 6.0);
    }

    #[test]
    fn zero_pivot_is_rejected() {
        let mut tbl = small_tableau();
        //column 1 has a zero entry in row 1
        assert_eq!(
            tbl.pivot(TableauIx::new(1, 1)),
            Err(SolveError::ZeroPivot)
        );
    }

    #[test]
    fn grow_inserts_slack_before_rhs() {
        let mut tbl = small_tableau();
        let old_rhs: Vec<f64> = (0..tbl.n_rows())
            .map(|i| tbl.tbl()[[i, tbl.rhs_col()]])
            .collect();

        let coeffs = vec![1.0, 0.0, 0.0, 0.0, 0.0];
        tbl.grow(&coeffs, "S4".to_string(), 2.0);

        assert_eq!(tbl.n_rows(), 5);
        assert_eq!(tbl.n_cols(), 7);
        //old rhs values moved one column right
        for (i, b) in old_rhs.iter().enumerate() {
            assert_eq!(tbl.tbl()[[i, 6]], *b);
        }
        //inserted slack column is zero in the old rows, one in the new
        for i in 0..4 {
            assert_eq!(tbl.tbl()[[i, 5]], 0.0);
        }
        assert_eq!(tbl.tbl()[[4, 5]], 1.0);
        assert_eq!(tbl.tbl()[[4, 6]], 2.0);
        assert_eq!(tbl.basic_vars(), &[2, 3, 4, 5]);
        assert_eq!(tbl.headers()[5], "S4");
        assert_eq!(tbl.headers()[6], "rhs");
    }

    #[test]
    fn price_out_clears_basic_columns_in_new_row() {
        let mut tbl = small_tableau();
        //bring x2 into the basis, then bound it
        tbl.pivot(TableauIx::new(2, 1)).unwrap();

        let mut coeffs = vec![0.0; 5];
        coeffs[1] = 1.0;
        tbl.grow(&coeffs, "S4".to_string(), 5.0);
        tbl.price_out_last_row();

        let last = tbl.n_rows() - 1;
        for r in 0..tbl.basic_vars().len() - 1 {
            let col = tbl.basic_vars()[r];
            assert_relative_eq!(tbl.tbl()[[last, col]], 0.0);
        }
        //x2 sits at 6, bounding it at 5 leaves the new row short by one
        assert_relative_eq!(tbl.tbl()[[last, tbl.rhs_col()]], -1.0);
    }

    #[test]
    fn cell_format_rules() {
        assert_eq!(fmt_cell(3.0), "3");
        assert_eq!(fmt_cell(-2.0000000001), "-2");
        assert_eq!(fmt_cell(0.5), "0.50");
        assert_eq!(fmt_cell(-0.0), "0");
        assert_eq!(fmt_cell(-1.0e-12), "0");
        assert_eq!(fmt_cell(2.345), "2.35");
        assert_eq!(fmt_cell(-0.004), "0");
    }

    #[test]
    fn display_labels_rows_by_basis() {
        let tbl = small_tableau();
        let rendered = tbl.to_string();
        assert!(rendered.contains("Basic"));
        assert!(rendered.contains("S1"));
        assert!(rendered.contains("rhs"));
        assert!(rendered.contains("Z"));
    }
}

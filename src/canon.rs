use crate::constraint::Comp;
use crate::error::SolveError;
use crate::model::{Model, OptDir};
use crate::var::VarType;

/// Side of a branching bound on one variable.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BoundKind {
    Upper,
    Lower,
}

/// A branching bound `x_var <= value` (upper) or `x_var >= value` (lower),
/// accumulated along a branch-and-bound path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bound {
    pub var: usize,
    pub kind: BoundKind,
    pub value: f64,
}

impl Bound {
    pub fn upper(var: usize, value: f64) -> Self {
        Self {
            var,
            kind: BoundKind::Upper,
            value,
        }
    }

    pub fn lower(var: usize, value: f64) -> Self {
        Self {
            var,
            kind: BoundKind::Lower,
            value,
        }
    }
}

/// Header tag for a canonical row: `S` for rows that entered as `<=`, `E`
/// for rows that were negated from `>=`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowType {
    S,
    E,
}

/// A model normalized to all-`<=` rows in the maximize sense.
///
/// `obj` already carries the `Min` fold (coefficients negated) and the
/// substitution `x = -x'` for nonpositive continuous variables, so every
/// engine downstream optimizes one convention. `user_x`/`user_z` undo both
/// at extraction time.
#[derive(Clone, Debug)]
pub struct CanonForm {
    pub(crate) obj: Vec<f64>,
    pub(crate) rows: Vec<Vec<f64>>,
    pub(crate) rhs: Vec<f64>,
    pub(crate) row_types: Vec<RowType>,
    pub(crate) headers: Vec<String>,
    pub(crate) flipped_obj: bool,
    pub(crate) negated: Vec<bool>,
    pub(crate) n_vars: usize,
}

pub fn canonicalize(mdl: &Model, bounds: &[Bound]) -> Result<CanonForm, SolveError> {
    mdl.validate()?;
    let n = mdl.n_vars();

    let mut flipped_obj = false;
    let mut obj = mdl.obj_coeffs();
    if mdl.opt_dir() == OptDir::Min {
        obj.iter_mut().for_each(|c| *c = -*c);
        flipped_obj = true;
    }

    //substitute x = -x' for nonpositive continuous variables
    let negated: Vec<bool> = mdl
        .vars()
        .iter()
        .map(|v| v.ty() == VarType::Negative)
        .collect();
    for (c, neg) in obj.iter_mut().zip(&negated) {
        if *neg {
            *c = -*c;
        }
    }

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut rhs: Vec<f64> = Vec::new();
    let mut row_types: Vec<RowType> = Vec::new();

    for con in mdl.constraints() {
        let mut coeffs = con.coeffs().to_vec();
        for (a, neg) in coeffs.iter_mut().zip(&negated) {
            if *neg {
                *a = -*a;
            }
        }
        match con.comp() {
            Comp::Le => {
                rows.push(coeffs);
                rhs.push(con.rhs());
                row_types.push(RowType::S);
            }
            Comp::Ge => {
                rows.push(coeffs.iter().map(|a| -a).collect());
                rhs.push(-con.rhs());
                row_types.push(RowType::E);
            }
            Comp::Eq => {
                //an equality emits both directions
                rows.push(coeffs.clone());
                rhs.push(con.rhs());
                row_types.push(RowType::S);
                rows.push(coeffs.iter().map(|a| -a).collect());
                rhs.push(-con.rhs());
                row_types.push(RowType::E);
            }
        }
    }

    //binary variables get their unit upper bound as an explicit row
    for (j, var) in mdl.vars().iter().enumerate() {
        if var.ty() == VarType::Binary {
            let mut coeffs = vec![0.0_f64; n];
            coeffs[j] = 1.0_f64;
            rows.push(coeffs);
            rhs.push(1.0_f64);
            row_types.push(RowType::S);
        }
    }

    //branching bound rows, root-to-leaf order
    for bound in bounds {
        let mut coeffs = vec![0.0_f64; n];
        match bound.kind {
            BoundKind::Upper => {
                coeffs[bound.var] = 1.0_f64;
                rows.push(coeffs);
                rhs.push(bound.value);
                row_types.push(RowType::S);
            }
            BoundKind::Lower => {
                coeffs[bound.var] = -1.0_f64;
                rows.push(coeffs);
                rhs.push(-bound.value);
                row_types.push(RowType::E);
            }
        }
    }

    //decision columns, one slack or surplus per row, then rhs
    let mut headers = mdl.var_names();
    for (i, ty) in row_types.iter().enumerate() {
        headers.push(match ty {
            RowType::S => format!("S{}", i + 1),
            RowType::E => format!("E{}", i + 1),
        });
    }
    headers.push("rhs".to_string());

    Ok(CanonForm {
        obj,
        rows,
        rhs,
        row_types,
        headers,
        flipped_obj,
        negated,
        n_vars: n,
    })
}

impl CanonForm {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    pub fn row_types(&self) -> &[RowType] {
        &self.row_types
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Map a canonical-space solution back to user space.
    pub fn user_x(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(&self.negated)
            .map(|(v, neg)| if *neg { -v } else { *v })
            .collect()
    }

    /// Map a canonical-space objective value back to the user's sense.
    pub fn user_z(&self, z: f64) -> f64 {
        if self.flipped_obj {
            -z
        } else {
            z
        }
    }
}

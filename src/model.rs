use tabular::{Row, Table};

use std::fmt;

use crate::constraint::Constraint;
use crate::error::SolveError;
use crate::var::Variable;
use crate::ZERO_EPS;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OptDir {
    Max,
    Min,
}

impl fmt::Display for OptDir {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptDir::Max => write!(f, "Max"),
            OptDir::Min => write!(f, "Min"),
        }
    }
}

/// Algebraic LP/MILP model: objective sense, an ordered variable list and
/// dense constraint rows. Column order everywhere downstream is the order
/// variables were added here. The model is immutable once handed to a
/// solver; canonicalization works on a normalized copy.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub(crate) opt_dir: OptDir,
    pub(crate) vars: Vec<Variable>,
    pub(crate) constraints: Vec<Constraint>,
}

impl Model {
    pub fn new(opt_dir: OptDir) -> Self {
        Self {
            opt_dir,
            vars: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn set_opt_dir(&mut self, opt_dir: OptDir) {
        self.opt_dir = opt_dir;
    }

    /// Add a variable, returning its column index.
    pub fn add_var(&mut self, var: Variable) -> usize {
        self.vars.push(var);
        self.vars.len() - 1
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn opt_dir(&self) -> OptDir {
        self.opt_dir
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn n_vars(&self) -> usize {
        self.vars.len()
    }

    pub fn var_names(&self) -> Vec<String> {
        self.vars.iter().map(|v| v.name().to_string()).collect()
    }

    pub fn obj_coeffs(&self) -> Vec<f64> {
        self.vars.iter().map(|v| v.obj_coeff()).collect()
    }

    /// Every constraint row must carry one coefficient per variable.
    pub fn validate(&self) -> Result<(), SolveError> {
        for (i, con) in self.constraints.iter().enumerate() {
            if con.coeffs().len() != self.vars.len() {
                return Err(SolveError::MalformedModel {
                    row: i,
                    expected: self.vars.len(),
                    found: con.coeffs().len(),
                });
            }
        }
        Ok(())
    }
}

fn trim_num(v: f64) -> String {
    if (v - v.round()).abs() < ZERO_EPS {
        format!("{}", v.round() as i64)
    } else {
        format!("{}", v)
    }
}

fn expr_string(coeffs: &[f64], vars: &[Variable]) -> String {
    let mult = "\u{00D7}";
    let mut s = String::new();
    for (var, coeff) in vars.iter().zip(coeffs) {
        if coeff.abs() < ZERO_EPS {
            continue;
        }
        if s.is_empty() {
            if *coeff < 0.0_f64 {
                s.push('-');
            }
        } else if *coeff < 0.0_f64 {
            s.push_str(" - ");
        } else {
            s.push_str(" + ");
        }
        s.push_str(&format!("{}{}{}", trim_num(coeff.abs()), mult, var.name()));
    }
    if s.is_empty() {
        s.push('0');
    }
    s
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut table = Table::new("{:<} {:^} {:<}");

        table.add_row(Row::from_cells(vec![
            self.opt_dir.to_string(),
            ":".to_string(),
            expr_string(&self.obj_coeffs(), &self.vars),
        ]));
        table.add_row(Row::from_cells(vec![
            "Subject to".to_string(),
            ":".to_string(),
            "".to_string(),
        ]));
        for con in &self.constraints {
            table.add_row(Row::from_cells(vec![
                "".to_string(),
                "".to_string(),
                format!(
                    "{} {} {}",
                    expr_string(con.coeffs(), &self.vars),
                    con.comp(),
                    trim_num(con.rhs())
                ),
            ]));
        }

        write!(f, "{}", table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Comp;

    fn two_var_model() -> Model {
        let mut mdl = Model::new(OptDir::Max);
        mdl.add_var(Variable::positive("x1", 50));
        mdl.add_var(Variable::positive("x2", 100));
        mdl.add_constraint(Constraint::new(vec![7.0, 2.0], Comp::Ge, 28));
        mdl
    }

    #[test]
    fn validate_accepts_matching_row_lengths() {
        assert!(two_var_model().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_rows() {
        let mut mdl = two_var_model();
        mdl.add_constraint(Constraint::new(vec![1.0], Comp::Le, 4));

        assert_eq!(
            mdl.validate(),
            Err(SolveError::MalformedModel {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn display_renders_objective_and_constraints() {
        let rendered = two_var_model().to_string();
        assert!(rendered.contains("Max"));
        assert!(rendered.contains("50\u{00D7}x1 + 100\u{00D7}x2"));
        assert!(rendered.contains("\u{2265} 28"));
    }

    #[test]
    fn expr_string_handles_negatives_and_zeros() {
        let vars = vec![
            Variable::positive("a", 0),
            Variable::positive("b", 0),
            Variable::positive("c", 0),
        ];
        let s = expr_string(&[1.0, 0.0, -2.5], &vars);
        assert_eq!(s, "1\u{00D7}a - 2.5\u{00D7}c");
    }
}

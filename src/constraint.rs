use num::ToPrimitive;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
    Le, // <=
    Ge, // >=
    Eq, // ==
}

impl fmt::Display for Comp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Comp::Le => write!(f, "\u{2264}"),
            Comp::Eq => write!(f, "="),
            Comp::Ge => write!(f, "\u{2265}"),
        }
    }
}

/// One linear constraint over the model's variables, by position: the i-th
/// coefficient belongs to the i-th variable added to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub(crate) coeffs: Vec<f64>,
    pub(crate) comp: Comp,
    pub(crate) rhs: f64,
}

impl Constraint {
    pub fn new<T: ToPrimitive>(coeffs: Vec<f64>, comp: Comp, rhs: T) -> Self {
        Self {
            coeffs,
            comp,
            rhs: rhs.to_f64().unwrap(),
        }
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    pub fn comp(&self) -> Comp {
        self.comp
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (j, coeff) in self.coeffs.iter().enumerate() {
            if j > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", coeff)?;
        }
        write!(f, " {} {}", self.comp, self.rhs)
    }
}

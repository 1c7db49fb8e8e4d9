use num::ToPrimitive;

use std::fmt;

/// Sign and integrality class of a decision variable.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VarType {
    /// Continuous, x >= 0.
    Positive,
    /// Continuous, x <= 0.
    Negative,
    /// Integer, x >= 0.
    Integer,
    /// Binary, x in {0, 1}.
    Binary,
}

impl Default for VarType {
    fn default() -> Self {
        VarType::Positive
    }
}

impl VarType {
    pub fn is_integral(&self) -> bool {
        matches!(self, VarType::Integer | VarType::Binary)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Variable {
    ty: VarType,
    obj_coeff: f64,
    name: String,
}

impl Variable {
    pub fn new(ty: VarType) -> Self {
        Self {
            ty,
            obj_coeff: 0.0_f64,
            name: String::from(""),
        }
    }

    pub fn with_name<T: ToString>(mut self, name: T) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_obj_coeff<T: ToPrimitive>(mut self, coeff: T) -> Self {
        self.obj_coeff = coeff.to_f64().unwrap();
        self
    }

    pub fn positive<T: ToString, U: ToPrimitive>(name: T, obj_coeff: U) -> Self {
        Self::new(VarType::Positive)
            .with_name(name)
            .with_obj_coeff(obj_coeff)
    }

    pub fn negative<T: ToString, U: ToPrimitive>(name: T, obj_coeff: U) -> Self {
        Self::new(VarType::Negative)
            .with_name(name)
            .with_obj_coeff(obj_coeff)
    }

    pub fn integer<T: ToString, U: ToPrimitive>(name: T, obj_coeff: U) -> Self {
        Self::new(VarType::Integer)
            .with_name(name)
            .with_obj_coeff(obj_coeff)
    }

    pub fn binary<T: ToString, U: ToPrimitive>(name: T, obj_coeff: U) -> Self {
        Self::new(VarType::Binary)
            .with_name(name)
            .with_obj_coeff(obj_coeff)
    }

    pub fn ty(&self) -> VarType {
        self.ty
    }

    pub fn obj_coeff(&self) -> f64 {
        self.obj_coeff
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

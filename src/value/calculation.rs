//! `Value::Calculation`: the `calc()`/`min()`/`max()`/`clamp()` family, kept
//! unevaluated because their arguments may contain CSS custom properties or
//! other values the evaluator cannot reduce to a plain number.

use std::fmt;

use super::number::SassNumber;
use super::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum CalcArg {
    Number(SassNumber),
    String(String),
    Calculation(Box<SassCalculation>),
    Operation(Box<CalcArg>, CalcOp, Box<CalcArg>),
    Interpolation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcOp {
    Plus,
    Minus,
    Mul,
    Div,
}

impl fmt::Display for CalcOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CalcOp::Plus => "+",
            CalcOp::Minus => "-",
            CalcOp::Mul => "*",
            CalcOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SassCalculation {
    pub name: String,
    pub arguments: Vec<CalcArg>,
}

impl SassCalculation {
    pub fn calc(arg: CalcArg) -> Self {
        SassCalculation {
            name: "calc".to_string(),
            arguments: vec![arg],
        }
    }

    pub fn new(name: impl Into<String>, arguments: Vec<CalcArg>) -> Self {
        SassCalculation {
            name: name.into(),
            arguments,
        }
    }
}

impl fmt::Display for CalcArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcArg::Number(n) => write!(f, "{}", n),
            CalcArg::String(s) => write!(f, "{}", s),
            CalcArg::Calculation(c) => write!(f, "{}", c),
            CalcArg::Operation(l, op, r) => write!(f, "({} {} {})", l, op, r),
            CalcArg::Interpolation(s) => write!(f, "{}", s),
        }
    }
}

impl fmt::Display for SassCalculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

impl From<SassCalculation> for Value {
    fn from(calc: SassCalculation) -> Self {
        Value::Calculation(Box::new(calc))
    }
}

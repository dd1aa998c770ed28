use std::f64::consts::{E, PI};
use std::fmt;

use crate::error::{GradError, GradResult};
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn value(self) -> f64 {
        match self {
            Self::Pi => PI,
            Self::E => E,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Exp,
    Abs,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "sqrt" => Some(Self::Sqrt),
            "exp" => Some(Self::Exp),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Sqrt => "sqrt",
            Self::Exp => "exp",
            Self::Abs => "abs",
        }
    }

    fn apply(self, arg: f64) -> GradResult<f64> {
        match self {
            Self::Sin => Ok(arg.sin()),
            Self::Cos => Ok(arg.cos()),
            Self::Tan => Ok(arg.tan()),
            Self::Sqrt if arg < 0.0 => Err(GradError::Domain(format!(
                "square root of a negative number ({arg})"
            ))),
            Self::Sqrt => Ok(arg.sqrt()),
            Self::Exp => Ok(arg.exp()),
            Self::Abs => Ok(arg.abs()),
        }
    }
}

/// Parsed learner expression over the variables `x` and `y`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(Variable),
    Const(Constant),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Function,
        arg: Box<Expr>,
    },
}

impl Expr {
    /// Evaluate at `point`. Any undefined or non-finite intermediate result
    /// is reported as a domain error instead of flowing on as NaN.
    pub fn eval(&self, point: Point) -> GradResult<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Var(Variable::X) => point.x,
            Self::Var(Variable::Y) => point.y,
            Self::Const(c) => c.value(),
            Self::Neg(inner) => -inner.eval(point)?,
            Self::Binary { op, lhs, rhs } => {
                let a = lhs.eval(point)?;
                let b = rhs.eval(point)?;
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div if b == 0.0 => {
                        return Err(GradError::Domain("division by zero".into()))
                    }
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow if a == 0.0 && b < 0.0 => {
                        return Err(GradError::Domain(
                            "zero raised to a negative power".into(),
                        ))
                    }
                    BinaryOp::Pow if a < 0.0 && b.fract() != 0.0 => {
                        return Err(GradError::Domain(format!(
                            "negative base {a} raised to non-integer power {b}"
                        )))
                    }
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Self::Call { func, arg } => func.apply(arg.eval(point)?)?,
        };

        if value.is_finite() {
            Ok(value)
        } else {
            Err(GradError::Domain(format!("'{self}' is not a finite number")))
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Var(Variable::X) => write!(f, "x"),
            Self::Var(Variable::Y) => write!(f, "y"),
            Self::Const(Constant::Pi) => write!(f, "pi"),
            Self::Const(Constant::E) => write!(f, "e"),
            Self::Neg(inner) => write!(f, "-({inner})"),
            Self::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Self::Call { func, arg } => write!(f, "{}({arg})", func.name()),
        }
    }
}

use std::cmp::Ordering;
use std::fmt;

use crate::ast::{format_real, BinaryOperator, Expression, Literal, UnaryOperator};

/// Statically known numeric value of a range bound or step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Real(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Real(r) => r,
        }
    }

    pub fn is_negative(self) -> bool {
        self.as_f64() < 0.0
    }

    /// Magnitude; `None` when `i64::MIN` cannot be negated.
    pub fn abs(self) -> Option<Number> {
        match self {
            Number::Int(n) => n.checked_abs().map(Number::Int),
            Number::Real(r) => Some(Number::Real(r.abs())),
        }
    }

    fn negate(self) -> Option<Number> {
        match self {
            Number::Int(n) => n.checked_neg().map(Number::Int),
            Number::Real(r) => Some(Number::Real(-r)),
        }
    }

    fn arithmetic(self, operator: BinaryOperator, other: Number) -> Option<Number> {
        match (operator, self, other) {
            (BinaryOperator::Divide, _, _) => {
                let divisor = other.as_f64();
                if divisor == 0.0 {
                    return None;
                }
                Some(Number::Real(self.as_f64() / divisor))
            }
            (BinaryOperator::Add, Number::Int(a), Number::Int(b)) => a.checked_add(b).map(Number::Int),
            (BinaryOperator::Subtract, Number::Int(a), Number::Int(b)) => {
                a.checked_sub(b).map(Number::Int)
            }
            (BinaryOperator::Multiply, Number::Int(a), Number::Int(b)) => {
                a.checked_mul(b).map(Number::Int)
            }
            (BinaryOperator::Add, a, b) => Some(Number::Real(a.as_f64() + b.as_f64())),
            (BinaryOperator::Subtract, a, b) => Some(Number::Real(a.as_f64() - b.as_f64())),
            (BinaryOperator::Multiply, a, b) => Some(Number::Real(a.as_f64() * b.as_f64())),
            _ => None,
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{}", n),
            Number::Real(r) => write!(f, "{}", format_real(*r)),
        }
    }
}

/// Evaluate literals, negated literals and `+ - * /` over foldable operands.
/// Anything else, a zero divisor, or integer overflow yields `None`.
pub fn fold(expr: &Expression) -> Option<Number> {
    match expr {
        Expression::Literal(Literal::Integer(n)) => Some(Number::Int(*n)),
        Expression::Literal(Literal::Real(r)) => Some(Number::Real(*r)),
        Expression::UnaryOp {
            operator: UnaryOperator::Negate,
            operand,
        } => match operand.as_ref() {
            Expression::Literal(Literal::Integer(n)) => Number::Int(*n).negate(),
            Expression::Literal(Literal::Real(r)) => Number::Real(*r).negate(),
            _ => None,
        },
        Expression::BinaryOp {
            left,
            operator,
            right,
        } => {
            let left = fold(left)?;
            let right = fold(right)?;
            left.arithmetic(*operator, right)
        }
        _ => None,
    }
}

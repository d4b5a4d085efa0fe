//! Constant folding over [`ConstValue`].
//!
//! Integer arithmetic is checked: overflow and division by zero are errors, never wrapping. Float arithmetic
//! follows IEEE 754. Mixing an integer with a float promotes to float. Bitwise operators and shifts require two
//! integers. Comparisons and `&&` / `||` produce `Int(1)` or `Int(0)`.

use std::num::{ParseFloatError, ParseIntError};

use crate::frontend::ast::{BinaryOp, Span, UnaryOp};
use crate::frontend::diagnostics::{Diagnostic, errors};
use crate::frontend::symbols::ConstValue;

/// Classification of a checked expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum Value {
    /// A compile-time constant with its folded value.
    Const(ConstValue),
    /// Valid, but only known at run time (mutable entities, parameters).
    Runtime,
    /// Depends on an entity that has not settled yet.
    Pending,
    /// Already reported as an error.
    Error,
}

impl Value {
    /// Merge the classifications of several operands; `None` when all of them are constant.
    ///
    /// An error dominates a pending dependency, which dominates a run-time value.
    pub(super) fn join(values: &[Value]) -> Option<Value> {
        [Value::Error, Value::Pending, Value::Runtime]
            .into_iter()
            .find(|wanted| values.contains(wanted))
    }
}

/// Parse integer literal text as scanned: `_` separators and `0b` / `0o` / `0x` prefixes are accepted.
pub fn parse_int_literal(text: &str) -> Result<i64, ParseIntError> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    let (radix, body) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ => (10, digits.as_str()),
    };
    i64::from_str_radix(body, radix)
}

pub(super) fn parse_float_literal(text: &str) -> Result<f64, ParseFloatError> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    digits.parse()
}

fn bool_value(b: bool) -> ConstValue {
    ConstValue::Int(i64::from(b))
}

fn as_f64(value: ConstValue) -> f64 {
    match value {
        ConstValue::Int(v) => v as f64,
        ConstValue::Float(v) => v,
        ConstValue::Function => f64::NAN,
    }
}

pub(super) fn fold_unary(op: UnaryOp, operand: ConstValue, span: Span) -> Result<ConstValue, Diagnostic> {
    match (op, operand) {
        (_, ConstValue::Function) => Err(errors::function_operand(span)),
        (UnaryOp::Plus, value) => Ok(value),
        (UnaryOp::Neg, ConstValue::Int(v)) => v
            .checked_neg()
            .map(ConstValue::Int)
            .ok_or_else(|| errors::constant_overflow("-", span)),
        (UnaryOp::Neg, ConstValue::Float(v)) => Ok(ConstValue::Float(-v)),
    }
}

pub(super) fn fold_binary(op: BinaryOp, lhs: ConstValue, rhs: ConstValue, span: Span) -> Result<ConstValue, Diagnostic> {
    if lhs == ConstValue::Function || rhs == ConstValue::Function {
        return Err(errors::function_operand(span));
    }

    match op {
        BinaryOp::Or => Ok(bool_value(lhs.is_truthy() || rhs.is_truthy())),
        BinaryOp::And => Ok(bool_value(lhs.is_truthy() && rhs.is_truthy())),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            Ok(bool_value(compare(op, lhs, rhs)))
        }
        BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::BitAnd | BinaryOp::Shl | BinaryOp::Shr => match (lhs, rhs) {
            (ConstValue::Int(a), ConstValue::Int(b)) => int_arith(op, a, b, span),
            _ => Err(errors::integer_operands_required(op.as_str(), span)),
        },
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => match (lhs, rhs) {
            (ConstValue::Int(a), ConstValue::Int(b)) => int_arith(op, a, b, span),
            _ => Ok(ConstValue::Float(float_arith(op, as_f64(lhs), as_f64(rhs)))),
        },
    }
}

fn compare(op: BinaryOp, lhs: ConstValue, rhs: ConstValue) -> bool {
    if let (ConstValue::Int(a), ConstValue::Int(b)) = (lhs, rhs) {
        return match op {
            BinaryOp::Eq => a == b,
            BinaryOp::NotEq => a != b,
            BinaryOp::Lt => a < b,
            BinaryOp::LtEq => a <= b,
            BinaryOp::Gt => a > b,
            _ => a >= b,
        };
    }
    let (a, b) = (as_f64(lhs), as_f64(rhs));
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::LtEq => a <= b,
        BinaryOp::Gt => a > b,
        _ => a >= b,
    }
}

fn int_arith(op: BinaryOp, a: i64, b: i64, span: Span) -> Result<ConstValue, Diagnostic> {
    let result = match op {
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(errors::division_by_zero(span)),
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        BinaryOp::BitOr => Some(a | b),
        BinaryOp::BitXor => Some(a ^ b),
        BinaryOp::BitAnd => Some(a & b),
        BinaryOp::Shl => u32::try_from(b).ok().and_then(|s| a.checked_shl(s)),
        BinaryOp::Shr => u32::try_from(b).ok().and_then(|s| a.checked_shr(s)),
        _ => None,
    };
    result
        .map(ConstValue::Int)
        .ok_or_else(|| errors::constant_overflow(op.as_str(), span))
}

fn float_arith(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }
}

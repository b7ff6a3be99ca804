//! Loose ordering between values of any two types
//!
//! Rules, first match wins:
//! 1. string vs string: numeric when both are numeric strings, else bytewise
//! 2. string vs null: by emptiness (see `string_null`)
//! 3. bool or null on either side: compare `to_bool()` (false < true)
//! 4. array vs array: by element count
//! 5. array vs anything else: diagnosed, with a fixed per-operator answer
//! 6. everything else: `to_float()` of both sides
//!
//! For array vs non-array every operator answers as if the array were the
//! larger operand, whichever side it is on.

use crate::value::Value;
use mixed_core::diagnostics::DiagnosticKind;
use mixed_core::runtime_warning;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Op {
    fn symbol(self) -> &'static str {
        match self {
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
        }
    }

    fn holds(self, ordering: Ordering) -> bool {
        match self {
            Op::Lt => ordering == Ordering::Less,
            Op::Le => ordering != Ordering::Greater,
            Op::Gt => ordering == Ordering::Greater,
            Op::Ge => ordering != Ordering::Less,
        }
    }

    /// IEEE comparison: NaN compares false every way
    fn holds_f64(self, a: f64, b: f64) -> bool {
        match self {
            Op::Lt => a < b,
            Op::Le => a <= b,
            Op::Gt => a > b,
            Op::Ge => a >= b,
        }
    }
}

/// `s op null` when `string_left`, else `null op s`
fn string_null(op: Op, s_empty: bool, string_left: bool) -> bool {
    match (op, string_left) {
        (Op::Lt, true) => false,
        (Op::Le, true) => s_empty,
        (Op::Gt, true) => !s_empty,
        (Op::Ge, true) => true,
        (Op::Lt, false) => !s_empty,
        (Op::Le, false) => true,
        (Op::Gt, false) => false,
        (Op::Ge, false) => s_empty,
    }
}

fn array_bias(op: Op, lhs: &Value, rhs: &Value) -> bool {
    runtime_warning!(
        DiagnosticKind::UnsupportedOperand,
        "Unsupported operand types for operator {} ({} and {})",
        op.symbol(),
        lhs.type_name(),
        rhs.type_name()
    );
    match op {
        Op::Lt => !lhs.is_array(),
        Op::Le => rhs.is_array(),
        Op::Gt => !rhs.is_array(),
        Op::Ge => lhs.is_array(),
    }
}

fn compare(op: Op, lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::String(a), Value::String(b)) => op.holds(a.compare_loose(b)),
        (Value::String(s), Value::Null) => string_null(op, s.is_empty(), true),
        (Value::Null, Value::String(s)) => string_null(op, s.is_empty(), false),
        (Value::Bool(_) | Value::Null, _) | (_, Value::Bool(_) | Value::Null) => {
            op.holds(lhs.to_bool().cmp(&rhs.to_bool()))
        }
        (Value::Array(a), Value::Array(b)) => op.holds(a.len().cmp(&b.len())),
        (Value::Array(_), _) | (_, Value::Array(_)) => array_bias(op, lhs, rhs),
        _ => op.holds_f64(lhs.to_float(), rhs.to_float()),
    }
}

pub fn lt(lhs: &Value, rhs: &Value) -> bool {
    compare(Op::Lt, lhs, rhs)
}

pub fn le(lhs: &Value, rhs: &Value) -> bool {
    compare(Op::Le, lhs, rhs)
}

pub fn gt(lhs: &Value, rhs: &Value) -> bool {
    compare(Op::Gt, lhs, rhs)
}

pub fn ge(lhs: &Value, rhs: &Value) -> bool {
    compare(Op::Ge, lhs, rhs)
}

impl Value {
    pub fn loose_lt(&self, other: &Value) -> bool {
        lt(self, other)
    }

    pub fn loose_le(&self, other: &Value) -> bool {
        le(self, other)
    }

    pub fn loose_gt(&self, other: &Value) -> bool {
        gt(self, other)
    }

    pub fn loose_ge(&self, other: &Value) -> bool {
        ge(self, other)
    }
}

//! Expression Layer (spec.md §3.4, §4.2, component 2): lazy arithmetic/bitwise/math-function
//! trees evaluated against a scan context.
//!
//! Expressions never fault on their own: division by zero and non-finite results are
//! produced as ordinary IEEE-754 `inf`/`nan` values. Detecting and reacting to those
//! (spec.md §4.3.4's `fault.division_error`/`fault.math_operation_error`) is the
//! `Calc` instruction's job, one layer up, so `Expr::evaluate` is a total function over any
//! well-formed tree.

use ladder_types::{TagReader, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unknown tag {0:?} referenced in expression")]
    UnknownTag(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Pos,
    Abs,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Log,
    Log10,
    Radians,
    Degrees,
}

/// 16-bit fixed-width shift/rotate operators (spec.md §3.4): `lsh`/`rsh` shift, `lro`/`rro`
/// rotate, all within a 16-bit word regardless of the operand's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftRotateOp {
    Lsh,
    Rsh,
    Lro,
    Rro,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Tag(Arc<str>),
    Literal(Literal),
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    UnOp(UnOp, Box<Expr>),
    MathFn(MathFn, Box<Expr>),
    ShiftRotate(ShiftRotateOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn tag(name: impl Into<Arc<str>>) -> Expr {
        Expr::Tag(name.into())
    }

    pub fn int(v: i64) -> Expr {
        Expr::Literal(Literal::Int(v))
    }

    pub fn float(v: f64) -> Expr {
        Expr::Literal(Literal::Float(v))
    }

    pub fn add(self, other: Expr) -> Expr {
        Expr::BinOp(BinOp::Add, Box::new(self), Box::new(other))
    }

    pub fn sub(self, other: Expr) -> Expr {
        Expr::BinOp(BinOp::Sub, Box::new(self), Box::new(other))
    }

    /// Evaluate to a `Value::Real` (or `Value::Bool`/`Value::Char` for the rare leaf that is
    /// a bare boolean/text literal). Numeric nodes always widen through `f64`.
    pub fn evaluate(&self, ctx: &dyn TagReader) -> Result<Value, ExprError> {
        match self {
            Expr::Tag(name) => ctx
                .read_value(name)
                .ok_or_else(|| ExprError::UnknownTag(name.to_string())),
            Expr::Literal(Literal::Int(i)) => Ok(Value::Real(*i as f32)),
            Expr::Literal(Literal::Float(f)) => Ok(Value::Real(*f as f32)),
            Expr::Literal(Literal::Bool(b)) => Ok(Value::Bool(*b)),
            Expr::Literal(Literal::Str(_)) => Ok(Value::Char(None)),
            Expr::BinOp(op, lhs, rhs) => {
                let l = numeric(lhs.evaluate(ctx)?);
                let r = numeric(rhs.evaluate(ctx)?);
                Ok(Value::Real(apply_binop(*op, l, r) as f32))
            }
            Expr::UnOp(op, inner) => {
                let v = numeric(inner.evaluate(ctx)?);
                Ok(Value::Real(apply_unop(*op, v) as f32))
            }
            Expr::MathFn(f, inner) => {
                let v = numeric(inner.evaluate(ctx)?);
                Ok(Value::Real(apply_mathfn(*f, v) as f32))
            }
            Expr::ShiftRotate(op, inner, amount) => {
                let v = numeric(inner.evaluate(ctx)?) as i64 as u16;
                let n = (numeric(amount.evaluate(ctx)?) as i64).rem_euclid(16) as u32;
                Ok(Value::Real(apply_shift_rotate(*op, v, n) as f32))
            }
        }
    }
}

fn numeric(v: Value) -> f64 {
    v.as_f64().unwrap_or(f64::NAN)
}

fn apply_binop(op: BinOp, l: f64, r: f64) -> f64 {
    match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mul => l * r,
        BinOp::Div => l / r,
        BinOp::FloorDiv => (l / r).floor(),
        BinOp::Mod => l % r,
        BinOp::Pow => l.powf(r),
        BinOp::BitAnd => ((l as i64) & (r as i64)) as f64,
        BinOp::BitOr => ((l as i64) | (r as i64)) as f64,
        BinOp::BitXor => ((l as i64) ^ (r as i64)) as f64,
        BinOp::Shl => ((l as i64) << (r as i64 & 63)) as f64,
        BinOp::Shr => ((l as i64) >> (r as i64 & 63)) as f64,
    }
}

fn apply_unop(op: UnOp, v: f64) -> f64 {
    match op {
        UnOp::Neg => -v,
        UnOp::Pos => v,
        UnOp::Abs => v.abs(),
        UnOp::BitNot => !(v as i64) as f64,
    }
}

fn apply_mathfn(f: MathFn, v: f64) -> f64 {
    match f {
        MathFn::Sqrt => v.sqrt(),
        MathFn::Sin => v.sin(),
        MathFn::Cos => v.cos(),
        MathFn::Tan => v.tan(),
        MathFn::Asin => v.asin(),
        MathFn::Acos => v.acos(),
        MathFn::Atan => v.atan(),
        MathFn::Log => v.ln(),
        MathFn::Log10 => v.log10(),
        MathFn::Radians => v.to_radians(),
        MathFn::Degrees => v.to_degrees(),
    }
}

fn apply_shift_rotate(op: ShiftRotateOp, v: u16, n: u32) -> u16 {
    match op {
        ShiftRotateOp::Lsh => v.checked_shl(n).unwrap_or(0),
        ShiftRotateOp::Rsh => v.checked_shr(n).unwrap_or(0),
        ShiftRotateOp::Lro => v.rotate_left(n),
        ShiftRotateOp::Rro => v.rotate_right(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapReader(HashMap<String, Value>);
    impl TagReader for MapReader {
        fn read_value(&self, tag_name: &str) -> Option<Value> {
            self.0.get(tag_name).copied()
        }
    }

    fn reader(pairs: &[(&str, Value)]) -> MapReader {
        MapReader(pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }

    #[test]
    fn arithmetic_evaluates_lazily_against_context() {
        let r = reader(&[("A", Value::Int(3)), ("B", Value::Int(4))]);
        let expr = Expr::tag("A").add(Expr::tag("B"));
        assert_eq!(expr.evaluate(&r).unwrap(), Value::Real(7.0));
    }

    #[test]
    fn division_by_zero_is_not_an_error_it_is_infinite() {
        let r = reader(&[]);
        let expr = Expr::int(1).add(Expr::int(0)).sub(Expr::int(0));
        let div = Expr::BinOp(BinOp::Div, Box::new(expr), Box::new(Expr::int(0)));
        let v = div.evaluate(&r).unwrap();
        match v {
            Value::Real(f) => assert!(f.is_infinite()),
            _ => panic!("expected real"),
        }
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let r = reader(&[]);
        assert_eq!(
            Expr::tag("Missing").evaluate(&r),
            Err(ExprError::UnknownTag("Missing".to_string()))
        );
    }

    #[test]
    fn sixteen_bit_rotate_wraps_within_word() {
        let r = reader(&[]);
        let expr = Expr::ShiftRotate(
            ShiftRotateOp::Lro,
            Box::new(Expr::int(0x8000)),
            Box::new(Expr::int(1)),
        );
        assert_eq!(expr.evaluate(&r).unwrap(), Value::Real(1.0));
    }
}

//! `Copy` / `Calc` (spec.md §4.3.4). `Copy` clamps ("saturating") narrowing stores into
//! INT/DINT, wraps (`& 0xFFFF`) for WORD, truthy-casts for BOOL, widens for REAL, and stores
//! a single octet for CHAR. `Calc` evaluates an expression and stores using **modular
//! wrap**, not saturation -- the opposite overflow policy from `Copy` (spec.md §8
//! property 6).

use crate::core::{InstrError, InstrOperand};
use crate::target::Target;
use ladder_cond::Operand;
use ladder_context::ScanContext;
use ladder_expr::Expr;
use ladder_types::sys_names::{FAULT_DIVISION_ERROR, FAULT_MATH_OPERATION_ERROR, FAULT_OUT_OF_RANGE};
use ladder_types::{saturating_i16, saturating_i32, wrap_i16, wrap_i32, wrap_word, TagType, Value};

/// `Copy(source, dest)` (spec.md §4.3.4). `source` resolves once per execution; the
/// converted value is written to every tag in `dest`.
pub struct Copy {
    source: Operand,
    dest: Target,
}

impl Copy {
    pub fn new(source: Operand, dest: Target) -> Self {
        Copy { source, dest }
    }
}

impl crate::core::Instruction for Copy {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let raw = self.source.evaluate(ctx)?;
        let dest_ty = self.dest.ty(ctx).unwrap_or(TagType::Int);
        let (value, out_of_range) = copy_convert_flagged(raw, dest_ty);
        self.dest.write_value(ctx, value)?;
        if out_of_range {
            ctx.set_tag_internal(FAULT_OUT_OF_RANGE, Value::Bool(true));
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Operand("source".into(), self.source.clone()),
            InstrOperand::Target("dest".into(), self.dest.clone()),
        ]
    }
}

/// Like `ladder_types::copy_convert`, but also reports whether saturation actually changed
/// the stored value (spec.md §8 scenario 4: `fault.out_of_range` fires only when the clamp
/// bites).
fn copy_convert_flagged(source: Value, dest_ty: TagType) -> (Value, bool) {
    match dest_ty {
        TagType::Bool => (Value::Bool(source.truthy()), false),
        TagType::Real => (
            Value::Real(source.as_f64().unwrap_or(0.0) as f32),
            false,
        ),
        TagType::Int => {
            let raw = source.as_f64().unwrap_or(0.0);
            let clamped = saturating_i16(raw);
            (Value::Int(clamped), clamped as f64 != raw.trunc())
        }
        TagType::Dint => {
            let raw = source.as_f64().unwrap_or(0.0);
            let clamped = saturating_i32(raw);
            (Value::Dint(clamped), clamped as f64 != raw.trunc())
        }
        TagType::Word => {
            let raw = source.as_f64().unwrap_or(0.0) as i64;
            let wrapped = wrap_word(raw);
            (Value::Word(wrapped), wrapped as i64 != raw)
        }
        TagType::Char => match source {
            Value::Char(c) => (Value::Char(c), false),
            other => (Value::Char(other.as_f64().map(|f| f as u8)), false),
        },
    }
}

/// Decimal vs. hex wrap width for `Calc` (spec.md §4.3.4: "separate `decimal` and `hex`
/// modes control signed/unsigned wrap width").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcMode {
    Decimal,
    Hex,
}

/// `Calc(expr, dest, mode)` (spec.md §4.3.4). Divide-by-zero or a non-finite result leaves
/// `dest` unchanged and sets a fault flag instead of storing; otherwise the numeric result
/// is stored with modular wrap at the destination's width.
pub struct Calc {
    expr: Expr,
    dest: Target,
    mode: CalcMode,
}

impl Calc {
    pub fn new(expr: Expr, dest: Target, mode: CalcMode) -> Self {
        Calc { expr, dest, mode }
    }
}

impl crate::core::Instruction for Calc {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let raw = self.expr.evaluate(ctx)?;
        let numeric = raw.as_f64().unwrap_or(f64::NAN);

        if numeric.is_infinite() {
            // Distinguish "came from a division by zero" from other non-finite results by
            // re-checking: the expression layer never raises on its own (see ladder-expr),
            // so both ±inf and NaN reach here; infinities are division results, NaN is a
            // genuine math-domain error (e.g. `sqrt(-1)`, `asin(2)`).
            ctx.set_tag_internal(FAULT_DIVISION_ERROR, Value::Bool(true));
            return Ok(());
        }
        if numeric.is_nan() {
            ctx.set_tag_internal(FAULT_MATH_OPERATION_ERROR, Value::Bool(true));
            return Ok(());
        }

        let dest_ty = self.dest.ty(ctx).unwrap_or(TagType::Int);
        let (value, out_of_range) = self.wrap_store(numeric, dest_ty);
        self.dest.write_value(ctx, value)?;
        if out_of_range {
            ctx.set_tag_internal(FAULT_OUT_OF_RANGE, Value::Bool(true));
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Expr("expr".into(), self.expr.clone()),
            InstrOperand::Target("dest".into(), self.dest.clone()),
        ]
    }
}

impl Calc {
    fn wrap_store(&self, numeric: f64, dest_ty: TagType) -> (Value, bool) {
        let int_raw = numeric.round() as i64;
        match dest_ty {
            TagType::Bool => (Value::Bool(numeric != 0.0), false),
            TagType::Real => (Value::Real(numeric as f32), false),
            TagType::Word => {
                let wrapped = wrap_word(int_raw);
                (Value::Word(wrapped), wrapped as i64 != int_raw)
            }
            TagType::Int => {
                let wrapped = wrap_i16(int_raw);
                let out_of_range = match self.mode {
                    // Decimal: the 16-bit width is signed (-32768..=32767).
                    CalcMode::Decimal => int_raw < i16::MIN as i64 || int_raw > i16::MAX as i64,
                    // Hex: the same 16 bits are unsigned (0..=0xFFFF).
                    CalcMode::Hex => int_raw < 0 || int_raw > 0xFFFF,
                };
                (Value::Int(wrapped), out_of_range)
            }
            TagType::Dint => {
                let wrapped = wrap_i32(int_raw);
                let out_of_range = match self.mode {
                    CalcMode::Decimal => int_raw < i32::MIN as i64 || int_raw > i32::MAX as i64,
                    CalcMode::Hex => int_raw < 0 || int_raw > 0xFFFF_FFFF,
                };
                (Value::Dint(wrapped), out_of_range)
            }
            TagType::Char => (Value::Char(Some(int_raw as u8)), false),
        }
    }
}

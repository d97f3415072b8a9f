use ladder_context::{MemoryValue, ScanContext};
use ladder_expr::{Expr, ExprError};
use ladder_types::{BlockError, IndirectRef, TagReader, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum OperandError {
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error("unknown tag {0:?}")]
    UnknownTag(String),
}

/// Anything a `Compare` condition (or a `Calc` instruction) can read one value from:
/// a tag, a literal, an indirect block reference, or a full expression (spec.md §3.5).
#[derive(Debug, Clone)]
pub enum Operand {
    Tag(Arc<str>),
    Literal(Value),
    Indirect(IndirectRef),
    Expr(Expr),
}

impl Operand {
    pub fn tag(name: impl Into<Arc<str>>) -> Operand {
        Operand::Tag(name.into())
    }

    pub fn evaluate(&self, ctx: &ScanContext<'_>) -> Result<Value, OperandError> {
        match self {
            Operand::Tag(name) => ctx
                .read_value(name)
                .ok_or_else(|| OperandError::UnknownTag(name.to_string())),
            Operand::Literal(v) => Ok(*v),
            Operand::Indirect(ind) => {
                let tag = ind.resolve(ctx as &dyn TagReader)?;
                ctx.read_value(tag.name())
                    .ok_or_else(|| OperandError::UnknownTag(tag.name().to_string()))
            }
            Operand::Expr(expr) => Ok(expr.evaluate(ctx)?),
        }
    }
}

/// Convenience used by edge conditions to thread the `_prev:<tag>` memory key.
pub(crate) fn prev_key(tag_name: &str) -> String {
    format!("_prev:{tag_name}")
}

pub(crate) fn read_prev(ctx: &ScanContext<'_>, tag_name: &str) -> bool {
    ctx.get_memory(&prev_key(tag_name), MemoryValue::Bool(false))
        .as_bool()
        .unwrap_or(false)
}

pub(crate) fn write_prev(ctx: &mut ScanContext<'_>, tag_name: &str, current: bool) {
    ctx.set_memory(&prev_key(tag_name), MemoryValue::Bool(current));
}

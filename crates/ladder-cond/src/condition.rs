use crate::operand::{read_prev, write_prev, Operand, OperandError};
use ladder_context::ScanContext;
use ladder_types::TagReader;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConditionError {
    #[error(transparent)]
    Operand(#[from] OperandError),
    #[error("unknown tag {0:?}")]
    UnknownTag(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn matches(self, ord: Option<std::cmp::Ordering>) -> bool {
        use std::cmp::Ordering::*;
        match (self, ord) {
            (CompareOp::Eq, Some(Equal)) => true,
            (CompareOp::Ne, Some(o)) => o != Equal,
            (CompareOp::Ne, None) => true,
            (CompareOp::Lt, Some(Less)) => true,
            (CompareOp::Le, Some(Less | Equal)) => true,
            (CompareOp::Gt, Some(Greater)) => true,
            (CompareOp::Ge, Some(Greater | Equal)) => true,
            // Mismatched/incomparable types compare false rather than faulting (spec.md §4.2),
            // except `Ne`, for which "not equal" is true precisely when they are not `Equal`.
            _ => false,
        }
    }
}

/// Boolean predicates evaluated against a Scan Context (spec.md §3.5, §4.2).
#[derive(Debug, Clone)]
pub enum Condition {
    Direct(Arc<str>),
    Negated(Arc<str>),
    IntTruthy(Arc<str>),
    RisingEdge(Arc<str>),
    FallingEdge(Arc<str>),
    Compare(CompareOp, Operand, Operand),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn direct(tag: impl Into<Arc<str>>) -> Condition {
        Condition::Direct(tag.into())
    }

    pub fn negated(tag: impl Into<Arc<str>>) -> Condition {
        Condition::Negated(tag.into())
    }

    /// Evaluate this condition against the scan. Edge conditions also update the
    /// `_prev:<tag>` memory key they depend on (spec.md §9: "Edge detection ... is
    /// tag-free state stored in the snapshot's memory map").
    pub fn evaluate(&self, ctx: &mut ScanContext<'_>) -> Result<bool, ConditionError> {
        match self {
            Condition::Direct(tag) => Ok(read_truthy(ctx, tag)?),
            Condition::Negated(tag) => Ok(!read_truthy(ctx, tag)?),
            Condition::IntTruthy(tag) => Ok(read_truthy(ctx, tag)?),
            Condition::RisingEdge(tag) => {
                let current = read_truthy(ctx, tag)?;
                let prev = read_prev(ctx, tag);
                write_prev(ctx, tag, current);
                Ok(current && !prev)
            }
            Condition::FallingEdge(tag) => {
                let current = read_truthy(ctx, tag)?;
                let prev = read_prev(ctx, tag);
                write_prev(ctx, tag, current);
                Ok(!current && prev)
            }
            Condition::Compare(op, lhs, rhs) => {
                let l = lhs.evaluate(ctx)?;
                let r = rhs.evaluate(ctx)?;
                Ok(op.matches(l.compare(&r)))
            }
            Condition::All(conds) => {
                for c in conds {
                    if !c.evaluate(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any(conds) => {
                for c in conds {
                    if c.evaluate(ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

fn read_truthy(ctx: &ScanContext<'_>, tag: &str) -> Result<bool, ConditionError> {
    ctx.read_value(tag)
        .map(|v| v.truthy())
        .ok_or_else(|| ConditionError::UnknownTag(tag.to_string()))
}

use ladder_cond::{Condition, ConditionError, Operand, OperandError};
use ladder_context::{ContextError, MemoryValue, ScanContext};
use ladder_expr::{Expr, ExprError};
use ladder_types::{BlockError, BlockRange, IndirectBlockRange};
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;

/// A stable key identifying one instruction's position in the program source, used for
/// one-shot latches, shift-register clock memory, and drum step memory (spec.md §4.3,
/// §4.3.7, §4.3.8, §9). Programs assign these at build time (e.g. `"rung3.item1"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation(Arc<str>);

impl SourceLocation {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        SourceLocation(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InstrError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error(transparent)]
    Operand(#[from] OperandError),
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error(transparent)]
    Block(#[from] BlockError),
    #[error("size mismatch: {0}")]
    SizeMismatch(String),
    #[error("missing declared output {0:?} from function call")]
    MissingOutput(String),
    #[error("function call declared outputs but returned none")]
    NoOutputsReturned,
    #[error("callback is async/unembeddable and cannot be used as an instruction body")]
    InvalidCallback,
    #[error("unknown subroutine {0:?}")]
    UnknownSubroutine(String),
}

/// One addressable operand an instruction exposes to the Validation Walker (spec.md §4.7,
/// component 10). `label` is the arg-path fragment the walker appends after the
/// instruction type name (e.g. `"source"`, `"dest"`, `"inputs.x"`); `Cow` because most
/// instructions have a fixed set of static labels but a few (the function-call escape
/// hatches) synthesize one per declared input/output key. Facts are owned copies, not
/// references: the walker runs off-line against a whole `Program`, not per-scan, so the
/// clone cost here is irrelevant next to keeping `Instruction::execute` allocation-free.
#[derive(Debug, Clone)]
pub enum InstrOperand {
    Tag(Cow<'static, str>, Arc<str>),
    Target(Cow<'static, str>, crate::target::Target),
    Operand(Cow<'static, str>, Operand),
    Expr(Cow<'static, str>, Expr),
    BlockRange(Cow<'static, str>, BlockRange),
    IndirectBlockRange(Cow<'static, str>, IndirectBlockRange),
    Condition(Cow<'static, str>, Condition),
}

/// Every instruction in the Instruction Layer implements this (spec.md §4.3, component 4,
/// §9 "Instruction polymorphism"). `execute` is called once per scan, in source order, for
/// every instruction in the program: rung-gated instructions are expected to no-op (or
/// drive a documented disabled-path default) when `enabled` is false; always-execute
/// instructions run unconditionally and branch on `enabled` themselves.
pub trait Instruction {
    /// True for "always-execute" instructions (spec.md §4.3): the rung evaluator still
    /// calls `execute` every scan even when the rung is not powered, passing `enabled`.
    fn always_execute(&self) -> bool {
        false
    }

    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError>;

    /// The instruction kind name the Validation Walker records in a fact's
    /// `instruction type name` field (spec.md §4.7). Derived from the concrete type's own
    /// name by default, so every `Instruction` impl gets a correct answer for free; no
    /// implementor needs to (or should) override this.
    fn type_name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    /// This instruction's addressable operands, for the Validation Walker to fold into
    /// `OperandFact`s (spec.md §4.7). The default is empty, which the walker renders as a
    /// bare instruction fact with no operand-level detail -- correct for instructions with
    /// nothing portability-sensitive to say (e.g. `Return`), and a deliberate simplification
    /// for instructions this crate has not yet wired up (see DESIGN.md).
    fn describe(&self) -> Vec<InstrOperand> {
        Vec::new()
    }
}

fn oneshot_key(loc: &SourceLocation) -> String {
    format!("_oneshot:{loc}")
}

/// Shared one-shot gating (spec.md §4.3, §9): fires exactly once per rising rung-power
/// edge, keyed by source location so rungs stay pure functions without a singleton latch
/// table. Returns whether the instruction body should run this scan.
pub fn oneshot_gate(ctx: &mut ScanContext<'_>, loc: &SourceLocation, enabled: bool) -> bool {
    let key = oneshot_key(loc);
    if !enabled {
        ctx.set_memory(&key, MemoryValue::Bool(false));
        return false;
    }
    let already_fired = ctx
        .get_memory(&key, MemoryValue::Bool(false))
        .as_bool()
        .unwrap_or(false);
    if already_fired {
        false
    } else {
        ctx.set_memory(&key, MemoryValue::Bool(true));
        true
    }
}

/// Clears a one-shot latch outright (used when a disabled path must force re-arming
/// without evaluating `oneshot_gate`, e.g. `ForLoop` clearing its inner keys — spec.md
/// §4.3.10).
pub fn oneshot_clear(ctx: &mut ScanContext<'_>, loc: &SourceLocation) {
    ctx.set_memory(&oneshot_key(loc), MemoryValue::Bool(false));
}

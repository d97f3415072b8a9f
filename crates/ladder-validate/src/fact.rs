use std::sync::Arc;

/// Which rung list an `OperandFact` was found in (spec.md §4.7): the top-level program, or
/// one of its subroutines by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Main,
    Subroutine(Arc<str>),
}

/// The shape of value an `OperandFact` describes (spec.md §4.7). Dialect/portability
/// checks key off this rather than re-deriving it from `type_label`, since several Rust
/// types (e.g. `Operand::Indirect` vs `Operand::Expr`) collapse to the same textual label
/// family but need different handling downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Tag,
    IndirectRef,
    IndirectExprRef,
    Expression,
    BlockRange,
    IndirectBlockRange,
    Condition,
    Literal,
    Unknown,
}

/// Where one `OperandFact` sits in the program tree (spec.md §4.7). `branch_path` records
/// the items-list index of every nested `Branch`/`ForLoop` walked through to reach this
/// location, in declaration order, so two facts at the same rung and instruction index but
/// under different branches never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLocation {
    pub scope: Scope,
    pub rung_index: usize,
    pub branch_path: Vec<usize>,
    pub instruction_index: Option<usize>,
    pub instruction_type: Option<&'static str>,
    pub arg_path: String,
}

/// One addressable operand the walker found, with enough metadata for a portability
/// checker to judge it without re-walking the program itself (spec.md §4.7).
#[derive(Debug, Clone)]
pub struct OperandFact {
    pub location: ProgramLocation,
    pub value_kind: ValueKind,
    pub type_label: String,
    pub summary: String,
    pub pointer_name: Option<String>,
    pub expr_type: Option<String>,
}

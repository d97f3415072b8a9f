//! Rung & Branch (spec.md §3.6, §4.4, component 5): a rung carries an ordered list of
//! conditions, an ordered list of execution items, a source location, and a unique rung id.
//! A branch is a nested rung with its own local conditions, ANDed against the parent's
//! power.

use crate::forloop::ForLoop;
use ladder_cond::{Condition, ConditionError};
use ladder_context::ScanContext;
use ladder_instr::Instruction;
use std::sync::Arc;

/// Whether a rung list (top-level program rungs, or a subroutine's) should keep iterating
/// or has hit a `Return` (spec.md §4.3.9). `Return` only unwinds the rung list it was
/// textually found in -- `ExecutionItem::Call` does not propagate its callee's `Return`
/// any further than the call itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Return,
}

/// One item inside a rung or branch body (spec.md §3.6, §4.3.9, §4.3.10): a leaf
/// instruction, a nested branch, a subroutine call by name, a `Return`, or a `ForLoop`.
pub enum ExecutionItem {
    Instruction(Box<dyn Instruction>),
    Branch(Branch),
    Call(Arc<str>),
    Return,
    ForLoop(ForLoop),
}

impl ExecutionItem {
    pub fn instruction(instr: impl Instruction + 'static) -> Self {
        ExecutionItem::Instruction(Box::new(instr))
    }

    pub fn branch(branch: Branch) -> Self {
        ExecutionItem::Branch(branch)
    }

    pub fn call(name: impl Into<Arc<str>>) -> Self {
        ExecutionItem::Call(name.into())
    }

    pub(crate) fn contains_for_loop(&self) -> bool {
        match self {
            ExecutionItem::ForLoop(_) => true,
            ExecutionItem::Branch(b) => b.items.iter().any(ExecutionItem::contains_for_loop),
            _ => false,
        }
    }

    pub(crate) fn contains_call(&self) -> bool {
        match self {
            ExecutionItem::Call(_) => true,
            ExecutionItem::Branch(b) => b.items.iter().any(ExecutionItem::contains_call),
            ExecutionItem::ForLoop(f) => f.body().iter().any(ExecutionItem::contains_call),
            _ => false,
        }
    }
}

/// A nested sub-rung with its own local conditions, ANDed against the parent's power
/// (spec.md §3.6, glossary "Branch").
pub struct Branch {
    conditions: Vec<Condition>,
    items: Vec<ExecutionItem>,
}

impl Branch {
    pub fn new(conditions: Vec<Condition>, items: Vec<ExecutionItem>) -> Self {
        Branch { conditions, items }
    }

    pub fn items(&self) -> &[ExecutionItem] {
        &self.items
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Combined power of an ordered condition list: `All` semantics -- every condition must
/// hold, short-circuiting on the first false one (spec.md §4.2, §4.4 step 1).
pub(crate) fn combined_power(
    conditions: &[Condition],
    ctx: &mut ScanContext<'_>,
) -> Result<bool, ConditionError> {
    for cond in conditions {
        if !cond.evaluate(ctx)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// One rung: an ordered condition list, an ordered execution-item list, a source location,
/// and a unique id (spec.md §3.6).
pub struct Rung {
    id: u64,
    conditions: Vec<Condition>,
    items: Vec<ExecutionItem>,
    source_location: Arc<str>,
}

impl Rung {
    pub fn new(
        id: u64,
        conditions: Vec<Condition>,
        items: Vec<ExecutionItem>,
        source_location: impl Into<Arc<str>>,
    ) -> Self {
        Rung {
            id,
            conditions,
            items,
            source_location: source_location.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source_location(&self) -> &str {
        &self.source_location
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn items(&self) -> &[ExecutionItem] {
        &self.items
    }

    pub(crate) fn contains_call(&self) -> bool {
        self.items.iter().any(ExecutionItem::contains_call)
    }
}

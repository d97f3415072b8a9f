//! Program (spec.md §3.6, component 5): owns a top-level ordered rung list, a
//! name -> subroutine mapping (unique keys), and a strict/permissive build-time DSL guard.
//! `Program::run_scan` is the pure `f(state) -> state'` scan function's rung-evaluation
//! half: it drives every rung/branch/instruction in source order over one `ScanContext`,
//! which the caller (the runner) commits once afterward.

use crate::error::ProgramError;
use crate::forloop::ForLoop;
use crate::rung::{combined_power, ExecutionItem, Flow, Rung};
use crate::subroutine::Subroutine;
use ladder_context::ScanContext;
use ladder_instr::InstrError;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Program {
    rungs: Vec<Rung>,
    subroutines: BTreeMap<Arc<str>, Subroutine>,
    strict: bool,
}

impl Program {
    /// Builds a program, rejecting duplicate subroutine names and any subroutine whose
    /// rungs contain a `Call` (spec.md §3.6: "subroutines may not recursively call other
    /// subroutines"). `strict` is the build-time DSL guard from spec.md §6.1; this crate
    /// has no host-control-flow surface to police (there is no `if`/`elif` escape hatch in
    /// Rust's `Condition`/`ExecutionItem` types the way there is in a dynamic DSL), so it is
    /// carried purely as a flag callers can consult -- see DESIGN.md.
    pub fn build(
        rungs: Vec<Rung>,
        subroutines: Vec<Subroutine>,
        strict: bool,
    ) -> Result<Self, ProgramError> {
        let mut map = BTreeMap::new();
        for sub in subroutines {
            if sub.rungs().iter().any(Rung::contains_call) {
                return Err(ProgramError::NestedSubroutineCall(sub.name().to_string()));
            }
            let name: Arc<str> = Arc::from(sub.name());
            if map.insert(name.clone(), sub).is_some() {
                return Err(ProgramError::DuplicateSubroutine(name.to_string()));
            }
        }
        Ok(Program {
            rungs,
            subroutines: map,
            strict,
        })
    }

    pub fn rungs(&self) -> &[Rung] {
        &self.rungs
    }

    pub fn subroutines(&self) -> &BTreeMap<Arc<str>, Subroutine> {
        &self.subroutines
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Evaluates every top-level rung, in source order, against `ctx` (spec.md §4.4). The
    /// caller is responsible for injecting `_dt` into `ctx`'s memory beforehand (spec.md §9)
    /// and for calling `ctx.commit(dt)` afterward -- this method never commits.
    pub fn run_scan(&self, ctx: &mut ScanContext<'_>) -> Result<(), InstrError> {
        execute_rung_list(&self.rungs, ctx, self)?;
        Ok(())
    }

    /// Used by the debug stepping model (`scan_steps`/`scan_steps_debug`, spec.md §4.6) to
    /// evaluate one top-level rung at a time against a shared context.
    pub fn run_one_rung(&self, rung: &Rung, ctx: &mut ScanContext<'_>) -> Result<(), InstrError> {
        let power = combined_power(rung.conditions(), ctx)?;
        execute_items(rung.items(), ctx, power, self)?;
        Ok(())
    }

    /// Like `run_one_rung`, but also returns the evaluated rung power, for `scan_steps_debug`'s
    /// per-rung trace capture (spec.md §4.6). Evaluates conditions exactly once, the same as
    /// `run_one_rung`, so edge/one-shot memory is not double-touched.
    pub fn run_one_rung_traced(&self, rung: &Rung, ctx: &mut ScanContext<'_>) -> Result<bool, InstrError> {
        let power = combined_power(rung.conditions(), ctx)?;
        execute_items(rung.items(), ctx, power, self)?;
        Ok(power)
    }
}

/// Executes a rung list (top-level or subroutine) in source order, stopping early on a
/// `Return` encountered anywhere inside it (spec.md §4.3.9). The returned `Flow` is not
/// propagated past the list it belongs to: `ExecutionItem::Call` discards it.
pub(crate) fn execute_rung_list(
    rungs: &[Rung],
    ctx: &mut ScanContext<'_>,
    program: &Program,
) -> Result<Flow, InstrError> {
    for rung in rungs {
        let power = combined_power(rung.conditions(), ctx)?;
        if execute_items(rung.items(), ctx, power, program)? == Flow::Return {
            return Ok(Flow::Return);
        }
    }
    Ok(Flow::Continue)
}

pub(crate) fn execute_items(
    items: &[ExecutionItem],
    ctx: &mut ScanContext<'_>,
    power: bool,
    program: &Program,
) -> Result<Flow, InstrError> {
    for item in items {
        match item {
            ExecutionItem::Instruction(instr) => {
                instr.execute(ctx, power)?;
            }
            ExecutionItem::Branch(branch) => {
                let local = combined_power(branch_conditions(branch), ctx)?;
                let branch_power = power && local;
                if execute_items(branch.items(), ctx, branch_power, program)? == Flow::Return {
                    return Ok(Flow::Return);
                }
            }
            ExecutionItem::Call(name) => {
                if power {
                    let sub = program
                        .subroutines
                        .get(name.as_ref())
                        .ok_or_else(|| InstrError::UnknownSubroutine(name.to_string()))?;
                    execute_rung_list(sub.rungs(), ctx, program)?;
                }
            }
            ExecutionItem::Return => {
                if power {
                    return Ok(Flow::Return);
                }
            }
            ExecutionItem::ForLoop(for_loop) => {
                run_for_loop(for_loop, ctx, power, program)?;
            }
        }
    }
    Ok(Flow::Continue)
}

fn run_for_loop(
    for_loop: &ForLoop,
    ctx: &mut ScanContext<'_>,
    power: bool,
    program: &Program,
) -> Result<(), InstrError> {
    for_loop.execute(ctx, power, |body, ctx, enabled| {
        execute_items(body, ctx, enabled, program)
    })
}

fn branch_conditions(branch: &crate::rung::Branch) -> &[ladder_cond::Condition] {
    branch.conditions()
}

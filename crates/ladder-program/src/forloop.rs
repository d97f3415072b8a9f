//! `ForLoop(count_source, body)` (spec.md §4.3.10): `iterations = max(0, int(count))`, runs
//! synchronously within the scan. When disabled, the body executes once with
//! `enabled=false` so inner reset/one-shot semantics fire. Nested loops are rejected at
//! build time.

use crate::error::ProgramError;
use crate::rung::{Flow, ExecutionItem};
use ladder_cond::Operand;
use ladder_context::ScanContext;
use ladder_instr::InstrError;

pub struct ForLoop {
    count: Operand,
    body: Vec<ExecutionItem>,
}

impl ForLoop {
    /// Rejects a body that itself contains a `ForLoop`, anywhere including inside nested
    /// branches (spec.md §4.3.10: "Nested loops are forbidden and must be rejected at
    /// build time").
    pub fn new(count: Operand, body: Vec<ExecutionItem>) -> Result<Self, ProgramError> {
        if body.iter().any(ExecutionItem::contains_for_loop) {
            return Err(ProgramError::NestedForLoop);
        }
        Ok(ForLoop { count, body })
    }

    pub fn body(&self) -> &[ExecutionItem] {
        &self.body
    }

    pub fn count(&self) -> &Operand {
        &self.count
    }

    /// Runs `crate::program::execute_items` over the body once when disabled (enabled
    /// passed through as `false`, matching the disabled-path contract shared with every
    /// other rung-gated construct), or `iterations` times when enabled.
    pub(crate) fn execute(
        &self,
        ctx: &mut ScanContext<'_>,
        enabled: bool,
        exec_items: impl Fn(&[ExecutionItem], &mut ScanContext<'_>, bool) -> Result<Flow, InstrError>,
    ) -> Result<(), InstrError> {
        if !enabled {
            exec_items(&self.body, ctx, false)?;
            return Ok(());
        }
        let count = self.count.evaluate(ctx)?;
        let iterations = count.as_f64().map(|f| f.max(0.0) as u64).unwrap_or(0);
        for _ in 0..iterations {
            // A `Return` reached inside a loop body ends only this loop's remaining
            // iterations, not the enclosing rung list (spec.md §4.3.10 is silent on the
            // interaction; this is the documented decision -- see DESIGN.md).
            if exec_items(&self.body, ctx, true)? == Flow::Return {
                break;
            }
        }
        Ok(())
    }
}

//! Function-call escape hatches (spec.md §4.3.11): `RunFunction` (rung-gated) and
//! `RunEnabledFunction` (always-execute, scan-to-scan state machines such as in-flight I/O).
//! Both resolve declared inputs to values, invoke a user-supplied callback, and assign
//! declared outputs back using `Copy`'s conversion rules.

use crate::core::{oneshot_clear, oneshot_gate, Instruction, InstrError, InstrOperand, SourceLocation};
use crate::target::Target;
use ladder_cond::Operand;
use ladder_context::ScanContext;
use ladder_types::{copy_convert, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type FunctionOutputs = BTreeMap<String, Value>;

/// A callback bound to `RunFunction`. `embeddable` stands in for "not async, and whose
/// source is embeddable when deployed to a code-generated target" (spec.md §4.3.11) --
/// the only part of that contract this crate can check without a source inspector is
/// whatever the caller declares.
pub trait GatedFunction: Send + Sync {
    fn call(&self, inputs: &BTreeMap<String, Value>) -> Option<FunctionOutputs>;

    fn embeddable(&self) -> bool {
        true
    }
}

/// A callback bound to `RunEnabledFunction`: receives the current rung-power on every scan,
/// enabled or not, so it can run a `enabled -> pending -> done/error` state machine
/// (spec.md §4.3.11, §9 "Async ladder work").
pub trait EnabledFunction: Send + Sync {
    fn call(&self, enabled: bool, inputs: &BTreeMap<String, Value>) -> Option<FunctionOutputs>;

    fn embeddable(&self) -> bool {
        true
    }
}

fn assign_outputs(
    ctx: &mut ScanContext<'_>,
    outputs: &BTreeMap<String, Target>,
    result: Option<FunctionOutputs>,
) -> Result<(), InstrError> {
    match result {
        Some(map) => {
            for (key, target) in outputs {
                let value = map
                    .get(key)
                    .ok_or_else(|| InstrError::MissingOutput(key.clone()))?;
                let dest_ty = target.ty(ctx).unwrap_or(value.ty());
                let converted = copy_convert(*value, dest_ty).unwrap_or(*value);
                target.write_value(ctx, converted)?;
            }
            Ok(())
        }
        None => {
            if outputs.is_empty() {
                Ok(())
            } else {
                Err(InstrError::NoOutputsReturned)
            }
        }
    }
}

/// `RunFunction(fn, ins, outs, oneshot)` (spec.md §4.3.11): rung-gated.
pub struct RunFunction {
    func: Arc<dyn GatedFunction>,
    inputs: BTreeMap<String, Operand>,
    outputs: BTreeMap<String, Target>,
    oneshot: bool,
    loc: SourceLocation,
}

impl RunFunction {
    pub fn new(
        func: Arc<dyn GatedFunction>,
        inputs: BTreeMap<String, Operand>,
        outputs: BTreeMap<String, Target>,
        loc: SourceLocation,
    ) -> Result<Self, InstrError> {
        if !func.embeddable() {
            return Err(InstrError::InvalidCallback);
        }
        Ok(RunFunction {
            func,
            inputs,
            outputs,
            oneshot: false,
            loc,
        })
    }

    pub fn oneshot(mut self, oneshot: bool) -> Self {
        self.oneshot = oneshot;
        self
    }
}

impl Instruction for RunFunction {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            if self.oneshot {
                oneshot_clear(ctx, &self.loc);
            }
            return Ok(());
        }
        let fire = if self.oneshot {
            oneshot_gate(ctx, &self.loc, true)
        } else {
            true
        };
        if !fire {
            return Ok(());
        }
        let mut kwargs = BTreeMap::new();
        for (key, operand) in &self.inputs {
            kwargs.insert(key.clone(), operand.evaluate(ctx)?);
        }
        let result = self.func.call(&kwargs);
        assign_outputs(ctx, &self.outputs, result)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        describe_io(&self.inputs, &self.outputs)
    }
}

fn describe_io(
    inputs: &BTreeMap<String, Operand>,
    outputs: &BTreeMap<String, Target>,
) -> Vec<InstrOperand> {
    let mut facts = Vec::with_capacity(inputs.len() + outputs.len());
    for (key, operand) in inputs {
        facts.push(InstrOperand::Operand(format!("inputs.{key}").into(), operand.clone()));
    }
    for (key, target) in outputs {
        facts.push(InstrOperand::Target(format!("outputs.{key}").into(), target.clone()));
    }
    facts
}

/// `RunEnabledFunction(fn, ins, outs)` (spec.md §4.3.11): always-execute, invoked every
/// scan with the current rung-power so the callback can keep scan-to-scan state.
pub struct RunEnabledFunction {
    func: Arc<dyn EnabledFunction>,
    inputs: BTreeMap<String, Operand>,
    outputs: BTreeMap<String, Target>,
}

impl RunEnabledFunction {
    pub fn new(
        func: Arc<dyn EnabledFunction>,
        inputs: BTreeMap<String, Operand>,
        outputs: BTreeMap<String, Target>,
    ) -> Result<Self, InstrError> {
        if !func.embeddable() {
            return Err(InstrError::InvalidCallback);
        }
        Ok(RunEnabledFunction {
            func,
            inputs,
            outputs,
        })
    }
}

impl Instruction for RunEnabledFunction {
    fn always_execute(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let mut kwargs = BTreeMap::new();
        for (key, operand) in &self.inputs {
            kwargs.insert(key.clone(), operand.evaluate(ctx)?);
        }
        let result = self.func.call(enabled, &kwargs);
        assign_outputs(ctx, &self.outputs, result)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        describe_io(&self.inputs, &self.outputs)
    }
}

/// Convenience wrapper so a plain closure can be used as a `GatedFunction` without a new
/// named type per callback.
pub struct FunctionCall<F>(pub F)
where
    F: Fn(&BTreeMap<String, Value>) -> Option<FunctionOutputs> + Send + Sync;

impl<F> GatedFunction for FunctionCall<F>
where
    F: Fn(&BTreeMap<String, Value>) -> Option<FunctionOutputs> + Send + Sync,
{
    fn call(&self, inputs: &BTreeMap<String, Value>) -> Option<FunctionOutputs> {
        (self.0)(inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_context::{NoRestrictions, SystemState};
    use ladder_types::Value;

    fn state() -> SystemState {
        let mut tags = std::collections::BTreeMap::new();
        tags.insert("Out".to_string(), Value::Int(0));
        SystemState::initial(tags)
    }

    #[test]
    fn run_function_assigns_declared_outputs() {
        let func = Arc::new(FunctionCall(|ins: &BTreeMap<String, Value>| {
            let x = ins.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0);
            let mut out = FunctionOutputs::new();
            out.insert("y".to_string(), Value::Int((x as i16) * 2));
            Some(out)
        }));
        let mut inputs = BTreeMap::new();
        inputs.insert("x".to_string(), Operand::Literal(Value::Int(4)));
        let mut outputs = BTreeMap::new();
        outputs.insert("y".to_string(), Target::tag("Out"));
        let instr =
            RunFunction::new(func, inputs, outputs, SourceLocation::new("r1.i0")).unwrap();

        let s0 = state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        instr.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("Out", Value::Int(0)), Value::Int(8));
    }

    #[test]
    fn run_function_errors_on_missing_declared_output() {
        let func = Arc::new(FunctionCall(|_: &BTreeMap<String, Value>| {
            Some(FunctionOutputs::new())
        }));
        let mut outputs = BTreeMap::new();
        outputs.insert("y".to_string(), Target::tag("Out"));
        let instr = RunFunction::new(func, BTreeMap::new(), outputs, SourceLocation::new("r1.i1"))
            .unwrap();
        let s0 = state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        assert!(matches!(
            instr.execute(&mut ctx, true),
            Err(InstrError::MissingOutput(_))
        ));
    }

    #[test]
    fn run_function_errors_when_outputs_declared_but_nothing_returned() {
        let func = Arc::new(FunctionCall(|_: &BTreeMap<String, Value>| None));
        let mut outputs = BTreeMap::new();
        outputs.insert("y".to_string(), Target::tag("Out"));
        let instr = RunFunction::new(func, BTreeMap::new(), outputs, SourceLocation::new("r1.i2"))
            .unwrap();
        let s0 = state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        assert!(matches!(
            instr.execute(&mut ctx, true),
            Err(InstrError::NoOutputsReturned)
        ));
    }

    struct NotEmbeddable;
    impl GatedFunction for NotEmbeddable {
        fn call(&self, _: &BTreeMap<String, Value>) -> Option<FunctionOutputs> {
            None
        }
        fn embeddable(&self) -> bool {
            false
        }
    }

    #[test]
    fn non_embeddable_callback_is_rejected_at_construction() {
        let result = RunFunction::new(
            Arc::new(NotEmbeddable),
            BTreeMap::new(),
            BTreeMap::new(),
            SourceLocation::new("r1.i3"),
        );
        assert!(matches!(result, Err(InstrError::InvalidCallback)));
    }
}

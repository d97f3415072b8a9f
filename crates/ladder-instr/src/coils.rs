//! Coils (spec.md §4.3.1): `Out`, `Latch`, `Reset`. All three are rung-gated; `Out` is the
//! only one with a documented disabled-path default (drive the target to its type default),
//! matching §4.4's rung-evaluation step 4 ("rung-gated `Out` coils drive their targets to
//! the type default" on rung-false).

use crate::core::{oneshot_clear, oneshot_gate, InstrError, InstrOperand, Instruction, SourceLocation};
use crate::target::Target;
use ladder_context::ScanContext;
use ladder_types::{TagType, Value};

fn on_value(ty: TagType) -> Value {
    match ty {
        TagType::Bool => Value::Bool(true),
        TagType::Int => Value::Int(1),
        TagType::Dint => Value::Dint(1),
        TagType::Real => Value::Real(1.0),
        TagType::Word => Value::Word(1),
        TagType::Char => ty.default_value(),
    }
}

/// `Out(target)`: enabled -> target := true (or propagated across a block range); disabled
/// -> target := false. When both rung-gated and one-shot, disabled also clears the one-shot
/// latch (spec.md §4.3.1).
pub struct Out {
    target: Target,
    oneshot: bool,
    loc: SourceLocation,
}

impl Out {
    pub fn new(target: Target, loc: SourceLocation) -> Self {
        Out {
            target,
            oneshot: false,
            loc,
        }
    }

    pub fn oneshot(mut self, oneshot: bool) -> Self {
        self.oneshot = oneshot;
        self
    }
}

impl Instruction for Out {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            self.target.write_each(ctx, TagType::default_value)?;
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
        if fire {
            self.target.write_each(ctx, on_value)?;
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![InstrOperand::Target("target".into(), self.target.clone())]
    }
}

/// `Latch(target)`: enabled -> true, disabled -> no-op (spec.md §4.3.1).
pub struct Latch {
    target: Target,
}

impl Latch {
    pub fn new(target: Target) -> Self {
        Latch { target }
    }
}

impl Instruction for Latch {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if enabled {
            self.target.write_each(ctx, on_value)?;
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![InstrOperand::Target("target".into(), self.target.clone())]
    }
}

/// `Reset(target)`: enabled -> type-default (false for BOOL, 0 for INT, etc.), disabled ->
/// no-op (spec.md §4.3.1).
pub struct Reset {
    target: Target,
}

impl Reset {
    pub fn new(target: Target) -> Self {
        Reset { target }
    }
}

impl Instruction for Reset {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if enabled {
            self.target.write_each(ctx, TagType::default_value)?;
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![InstrOperand::Target("target".into(), self.target.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_context::{NoRestrictions, SystemState};
    use std::collections::BTreeMap;

    fn state() -> SystemState {
        let mut tags = BTreeMap::new();
        tags.insert("Light".to_string(), Value::Bool(false));
        SystemState::initial(tags)
    }

    #[test]
    fn out_drives_default_on_rung_false() {
        let s0 = state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        ctx.set_tag("Light", Value::Bool(true)).unwrap();
        let out = Out::new(Target::tag("Light"), SourceLocation::new("r1.i0"));
        out.execute(&mut ctx, false).unwrap();
        assert_eq!(ctx.get_tag("Light", Value::Bool(true)), Value::Bool(false));
    }

    #[test]
    fn out_drives_true_when_enabled() {
        let s0 = state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        let out = Out::new(Target::tag("Light"), SourceLocation::new("r1.i0"));
        out.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("Light", Value::Bool(false)), Value::Bool(true));
    }

    #[test]
    fn out_oneshot_fires_once_then_disabled_path_clears_latch() {
        let s0 = state();
        let loc = SourceLocation::new("r1.i0");

        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        let out = Out::new(Target::tag("Light"), loc.clone()).oneshot(true);
        out.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("Light", Value::Bool(false)), Value::Bool(true));
        let s1 = ctx.commit(0.0);

        // still enabled on scan 2: one-shot already fired, target is not re-driven true,
        // but it is also not driven back to default (no disabled path ran).
        let mut ctx = ScanContext::new(&s1, &NoRestrictions);
        out.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("Light", Value::Bool(false)), Value::Bool(true));
    }

    #[test]
    fn latch_is_a_noop_when_disabled() {
        let s0 = state();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        let l = Latch::new(Target::tag("Light"));
        l.execute(&mut ctx, false).unwrap();
        assert_eq!(ctx.get_tag("Light", Value::Bool(false)), Value::Bool(false));
    }
}

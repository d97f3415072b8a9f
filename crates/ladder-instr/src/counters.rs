//! Counters (spec.md §4.3.3). Accumulator is DINT with saturating clamp to the full
//! `i32` range.

use crate::core::InstrError;
use ladder_context::ScanContext;
use ladder_types::{saturating_i32, Value};
use std::sync::Arc;

fn read_acc(ctx: &ScanContext<'_>, acc_tag: &str) -> i32 {
    match ctx.get_tag(acc_tag, Value::Dint(0)) {
        Value::Dint(i) => i,
        other => other.as_f64().unwrap_or(0.0) as i32,
    }
}

/// `CountUp`: reset first (clears acc, done); if enabled, `delta += 1`; if the down
/// condition is also true, `delta -= 1`; apply, clamp, `done = acc >= preset`
/// (spec.md §4.3.3).
pub struct CountUp {
    done: Arc<str>,
    acc: Arc<str>,
    preset: i32,
}

impl CountUp {
    pub fn new(done: impl Into<Arc<str>>, acc: impl Into<Arc<str>>, preset: i32) -> Self {
        CountUp {
            done: done.into(),
            acc: acc.into(),
            preset,
        }
    }

    pub fn done(&self) -> &Arc<str> {
        &self.done
    }

    pub fn acc(&self) -> &Arc<str> {
        &self.acc
    }

    pub fn execute(
        &self,
        ctx: &mut ScanContext<'_>,
        reset: bool,
        enabled: bool,
        down: bool,
    ) -> Result<(), InstrError> {
        if reset {
            ctx.set_tag(&self.acc, Value::Dint(0))?;
            ctx.set_tag(&self.done, Value::Bool(false))?;
            return Ok(());
        }
        let mut acc = read_acc(ctx, &self.acc) as i64;
        if enabled {
            acc += 1;
        }
        if down {
            acc -= 1;
        }
        let acc = saturating_i32(acc as f64);
        ctx.set_tag(&self.acc, Value::Dint(acc))?;
        ctx.set_tag(&self.done, Value::Bool(acc >= self.preset))?;
        Ok(())
    }
}

/// `CountDown`: reset first; if enabled, `acc -= 1`; clamp; `done = acc <= -preset`
/// (spec.md §4.3.3).
pub struct CountDown {
    done: Arc<str>,
    acc: Arc<str>,
    preset: i32,
}

impl CountDown {
    pub fn new(done: impl Into<Arc<str>>, acc: impl Into<Arc<str>>, preset: i32) -> Self {
        CountDown {
            done: done.into(),
            acc: acc.into(),
            preset,
        }
    }

    pub fn done(&self) -> &Arc<str> {
        &self.done
    }

    pub fn acc(&self) -> &Arc<str> {
        &self.acc
    }

    pub fn execute(&self, ctx: &mut ScanContext<'_>, reset: bool, enabled: bool) -> Result<(), InstrError> {
        if reset {
            ctx.set_tag(&self.acc, Value::Dint(0))?;
            ctx.set_tag(&self.done, Value::Bool(false))?;
            return Ok(());
        }
        let mut acc = read_acc(ctx, &self.acc) as i64;
        if enabled {
            acc -= 1;
        }
        let acc = saturating_i32(acc as f64);
        ctx.set_tag(&self.acc, Value::Dint(acc))?;
        ctx.set_tag(&self.done, Value::Bool(acc <= -self.preset))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_context::{NoRestrictions, SystemState};
    use std::collections::BTreeMap;

    fn state() -> SystemState {
        let mut tags = BTreeMap::new();
        tags.insert("CDone".to_string(), Value::Bool(false));
        tags.insert("CAcc".to_string(), Value::Dint(0));
        SystemState::initial(tags)
    }

    #[test]
    fn count_up_reaches_preset_on_four_rising_pulses() {
        // spec.md §8 scenario 3: preset=3, 4 enable pulses, reset=false => CAcc==4, CDone==true.
        let mut s = state();
        let counter = CountUp::new("CDone", "CAcc", 3);
        for _ in 0..4 {
            let mut ctx = ScanContext::new(&s, &NoRestrictions);
            counter.execute(&mut ctx, false, true, false).unwrap();
            s = ctx.commit(0.0);
        }
        assert_eq!(s.tag("CAcc"), Some(Value::Dint(4)));
        assert_eq!(s.tag("CDone"), Some(Value::Bool(true)));
    }

    #[test]
    fn reset_takes_precedence_and_clears_acc() {
        let mut s = state();
        let counter = CountUp::new("CDone", "CAcc", 3);
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        counter.execute(&mut ctx, false, true, false).unwrap();
        s = ctx.commit(0.0);

        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        counter.execute(&mut ctx, true, true, false).unwrap();
        s = ctx.commit(0.0);
        assert_eq!(s.tag("CAcc"), Some(Value::Dint(0)));
        assert_eq!(s.tag("CDone"), Some(Value::Bool(false)));
    }

    #[test]
    fn count_down_done_reflects_negative_preset() {
        let mut s = state();
        let counter = CountDown::new("CDone", "CAcc", 2);
        for _ in 0..2 {
            let mut ctx = ScanContext::new(&s, &NoRestrictions);
            counter.execute(&mut ctx, false, true).unwrap();
            s = ctx.commit(0.0);
        }
        assert_eq!(s.tag("CAcc"), Some(Value::Dint(-2)));
        assert_eq!(s.tag("CDone"), Some(Value::Bool(true)));
    }

    #[test]
    fn acc_clamps_to_dint_range_without_wrap() {
        let mut tags = BTreeMap::new();
        tags.insert("CDone".to_string(), Value::Bool(false));
        tags.insert("CAcc".to_string(), Value::Dint(i32::MAX));
        let mut s = SystemState::initial(tags);
        let counter = CountUp::new("CDone", "CAcc", 1);
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        counter.execute(&mut ctx, false, true, false).unwrap();
        s = ctx.commit(0.0);
        assert_eq!(s.tag("CAcc"), Some(Value::Dint(i32::MAX)));
    }
}

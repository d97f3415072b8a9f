//! Timers (spec.md §4.3.2). State lives in three places: the destination done-bit tag, the
//! accumulator tag (INT counting in the timer's base unit), and memory key `_frac:<acc>`
//! (fractional remainder, float). All accumulators saturate at 32767; no wrap.

use crate::core::InstrError;
use ladder_context::{MemoryValue, ScanContext};
use ladder_types::Value;
use std::sync::Arc;

/// Timer base units (spec.md §4.3.2): all conversions route through `unit_scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Ms,
    S,
    M,
    H,
    D,
}

impl TimeUnit {
    /// Converts a `dt` in seconds to this unit's fractional count (spec.md §4.3.2).
    pub fn unit_scale(self, dt_seconds: f64) -> f64 {
        match self {
            TimeUnit::Ms => dt_seconds * 1000.0,
            TimeUnit::S => dt_seconds,
            TimeUnit::M => dt_seconds / 60.0,
            TimeUnit::H => dt_seconds / 3600.0,
            TimeUnit::D => dt_seconds / 86400.0,
        }
    }
}

fn frac_key(acc_tag: &str) -> String {
    format!("_frac:{acc_tag}")
}

/// Accumulates `unit_scale(dt) + carried fraction` into `acc`, saturating at 32767,
/// returning `(new_acc, new_frac)`. Shared by `OnDelay` and `OffDelay`'s accumulating path.
fn accumulate(ctx: &ScanContext<'_>, acc_tag: &str, acc: i16, dt_units: f64) -> (i16, f64) {
    let frac = ctx
        .get_memory(&frac_key(acc_tag), MemoryValue::Float(0.0))
        .as_float()
        .unwrap_or(0.0);
    let total = acc as f64 + dt_units + frac;
    let whole = total.floor();
    let new_frac = total - whole;
    let new_acc = whole.clamp(0.0, 32767.0) as i16;
    (new_acc, new_frac)
}

fn read_acc(ctx: &ScanContext<'_>, acc_tag: &str) -> i16 {
    match ctx.get_tag(acc_tag, Value::Int(0)) {
        Value::Int(i) => i,
        other => other.as_f64().unwrap_or(0.0) as i16,
    }
}

/// On-Delay timer (`TON`/`RTON`, spec.md §4.3.2). `retentive = true` makes this an `RTON`:
/// an explicit `reset` condition holds values until it becomes true, which clears
/// acc/done/frac; without a reset condition (`retentive = false`, plain `TON`) the accumulator
/// and done bit reset on every disabled scan instead.
pub struct OnDelayTimer {
    done: Arc<str>,
    acc: Arc<str>,
    preset: i16,
    unit: TimeUnit,
    retentive: bool,
}

impl OnDelayTimer {
    pub fn new(done: impl Into<Arc<str>>, acc: impl Into<Arc<str>>, preset: i16, unit: TimeUnit) -> Self {
        OnDelayTimer {
            done: done.into(),
            acc: acc.into(),
            preset,
            unit,
            retentive: false,
        }
    }

    /// Declares an explicit reset condition, making this an `RTON` (spec.md §4.3.2).
    pub fn retentive(mut self, retentive: bool) -> Self {
        self.retentive = retentive;
        self
    }

    pub fn done(&self) -> &Arc<str> {
        &self.done
    }

    pub fn acc(&self) -> &Arc<str> {
        &self.acc
    }

    /// `reset` is the separately-evaluated reset condition for `RTON`; callers pass `false`
    /// for a plain `TON` (it has no reset input).
    pub fn execute(
        &self,
        ctx: &mut ScanContext<'_>,
        dt: f64,
        enabled: bool,
        reset: bool,
    ) -> Result<(), InstrError> {
        if self.retentive && reset {
            ctx.set_tag(&self.acc, Value::Int(0))?;
            ctx.set_tag(&self.done, Value::Bool(false))?;
            ctx.set_memory(&frac_key(&self.acc), MemoryValue::Float(0.0));
            return Ok(());
        }
        if !enabled {
            if !self.retentive {
                ctx.set_tag(&self.acc, Value::Int(0))?;
                ctx.set_tag(&self.done, Value::Bool(false))?;
                ctx.set_memory(&frac_key(&self.acc), MemoryValue::Float(0.0));
            }
            return Ok(());
        }
        let acc = read_acc(ctx, &self.acc);
        let (new_acc, new_frac) = accumulate(ctx, &self.acc, acc, self.unit.unit_scale(dt));
        ctx.set_tag(&self.acc, Value::Int(new_acc))?;
        ctx.set_memory(&frac_key(&self.acc), MemoryValue::Float(new_frac));
        ctx.set_tag(&self.done, Value::Bool(new_acc >= self.preset))?;
        Ok(())
    }
}

/// Off-Delay timer (`TOF`, spec.md §4.3.2): while enabled the done bit is held true and the
/// accumulator held at zero; once disabled, the accumulator counts up and `done` stays true
/// until the accumulator reaches the preset.
pub struct OffDelayTimer {
    done: Arc<str>,
    acc: Arc<str>,
    preset: i16,
    unit: TimeUnit,
}

impl OffDelayTimer {
    pub fn new(done: impl Into<Arc<str>>, acc: impl Into<Arc<str>>, preset: i16, unit: TimeUnit) -> Self {
        OffDelayTimer {
            done: done.into(),
            acc: acc.into(),
            preset,
            unit,
        }
    }

    pub fn done(&self) -> &Arc<str> {
        &self.done
    }

    pub fn acc(&self) -> &Arc<str> {
        &self.acc
    }

    pub fn execute(&self, ctx: &mut ScanContext<'_>, dt: f64, enabled: bool) -> Result<(), InstrError> {
        if enabled {
            ctx.set_memory(&frac_key(&self.acc), MemoryValue::Float(0.0));
            ctx.set_tag(&self.done, Value::Bool(true))?;
            ctx.set_tag(&self.acc, Value::Int(0))?;
            return Ok(());
        }
        let acc = read_acc(ctx, &self.acc);
        let (new_acc, new_frac) = accumulate(ctx, &self.acc, acc, self.unit.unit_scale(dt));
        ctx.set_tag(&self.acc, Value::Int(new_acc))?;
        ctx.set_memory(&frac_key(&self.acc), MemoryValue::Float(new_frac));
        ctx.set_tag(&self.done, Value::Bool(new_acc < self.preset))?;
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
        tags.insert("Done".to_string(), Value::Bool(false));
        tags.insert("Acc".to_string(), Value::Int(0));
        SystemState::initial(tags)
    }

    #[test]
    fn on_delay_reaches_done_after_preset_seconds() {
        // spec.md §8 scenario 2: preset=5s, dt=0.5s, 10 cycles => Acc==5, Done==true.
        let mut s = state();
        let timer = OnDelayTimer::new("Done", "Acc", 5, TimeUnit::S);
        for _ in 0..10 {
            let mut ctx = ScanContext::new(&s, &NoRestrictions);
            timer.execute(&mut ctx, 0.5, true, false).unwrap();
            s = ctx.commit(0.5);
        }
        assert_eq!(s.tag("Acc"), Some(Value::Int(5)));
        assert_eq!(s.tag("Done"), Some(Value::Bool(true)));
    }

    #[test]
    fn plain_ton_resets_on_disable() {
        let mut s = state();
        let timer = OnDelayTimer::new("Done", "Acc", 5, TimeUnit::S);
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        timer.execute(&mut ctx, 1.0, true, false).unwrap();
        s = ctx.commit(1.0);
        assert_eq!(s.tag("Acc"), Some(Value::Int(1)));

        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        timer.execute(&mut ctx, 1.0, false, false).unwrap();
        s = ctx.commit(1.0);
        assert_eq!(s.tag("Acc"), Some(Value::Int(0)));
        assert_eq!(s.tag("Done"), Some(Value::Bool(false)));
    }

    #[test]
    fn rton_holds_until_explicit_reset() {
        let mut s = state();
        let timer = OnDelayTimer::new("Done", "Acc", 5, TimeUnit::S).retentive(true);
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        timer.execute(&mut ctx, 2.0, true, false).unwrap();
        s = ctx.commit(2.0);
        assert_eq!(s.tag("Acc"), Some(Value::Int(2)));

        // disabled, no reset: RTON holds its accumulated value.
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        timer.execute(&mut ctx, 2.0, false, false).unwrap();
        s = ctx.commit(2.0);
        assert_eq!(s.tag("Acc"), Some(Value::Int(2)));

        // reset clears it.
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        timer.execute(&mut ctx, 2.0, false, true).unwrap();
        s = ctx.commit(2.0);
        assert_eq!(s.tag("Acc"), Some(Value::Int(0)));
    }

    #[test]
    fn timer_accumulator_saturates_at_32767_without_wrapping() {
        let mut tags = BTreeMap::new();
        tags.insert("Done".to_string(), Value::Bool(false));
        tags.insert("Acc".to_string(), Value::Int(32766));
        let mut s = SystemState::initial(tags);
        let timer = OnDelayTimer::new("Done", "Acc", 1, TimeUnit::S);
        for _ in 0..5 {
            let mut ctx = ScanContext::new(&s, &NoRestrictions);
            timer.execute(&mut ctx, 1.0, true, false).unwrap();
            s = ctx.commit(1.0);
        }
        assert_eq!(s.tag("Acc"), Some(Value::Int(32767)));
    }

    #[test]
    fn off_delay_holds_done_true_while_enabled_then_counts_down() {
        let mut s = state();
        let timer = OffDelayTimer::new("Done", "Acc", 2, TimeUnit::S);
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        timer.execute(&mut ctx, 1.0, true).unwrap();
        s = ctx.commit(1.0);
        assert_eq!(s.tag("Done"), Some(Value::Bool(true)));
        assert_eq!(s.tag("Acc"), Some(Value::Int(0)));

        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        timer.execute(&mut ctx, 1.0, false).unwrap();
        s = ctx.commit(1.0);
        assert_eq!(s.tag("Acc"), Some(Value::Int(1)));
        assert_eq!(s.tag("Done"), Some(Value::Bool(true)));

        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        timer.execute(&mut ctx, 1.0, false).unwrap();
        s = ctx.commit(1.0);
        assert_eq!(s.tag("Acc"), Some(Value::Int(2)));
        assert_eq!(s.tag("Done"), Some(Value::Bool(false)));
    }
}

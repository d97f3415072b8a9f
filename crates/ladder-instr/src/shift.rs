//! Shift register (spec.md §4.3.7). Always executes. On a rising edge of the clock
//! condition, shifts the bit range one position in address order and inserts the rung-power
//! bit at the first position; a level-sensitive reset clears the range and wins over
//! shifting when both are active in the same scan.

use crate::core::InstrError;
use ladder_context::{MemoryValue, ScanContext};
use ladder_types::{BlockRange, Value};

fn prev_clock_key(loc: &str) -> String {
    format!("_shift_prev_clock:{loc}")
}

/// `ShiftRegister(bits, clock, reset)` (spec.md §4.3.7). `loc` keys the stored previous
/// clock state so multiple shift registers in one program don't collide.
pub struct ShiftRegister {
    bits: BlockRange,
    loc: String,
}

impl ShiftRegister {
    pub fn new(bits: BlockRange, loc: impl Into<String>) -> Self {
        ShiftRegister {
            bits,
            loc: loc.into(),
        }
    }

    pub fn bits(&self) -> &BlockRange {
        &self.bits
    }

    /// `rung_power` seeds the bit inserted at the first position on a shift; `clock` and
    /// `reset` are separately-evaluated conditions (spec.md §4.3.7). This instruction is
    /// always-execute, so the caller passes `rung_power` explicitly rather than via the
    /// `enabled` flag `Instruction::execute` would otherwise receive.
    pub fn execute(
        &self,
        ctx: &mut ScanContext<'_>,
        rung_power: bool,
        clock: bool,
        reset: bool,
    ) -> Result<(), InstrError> {
        if reset {
            for tag in self.bits.tags() {
                ctx.set_tag(tag.name(), Value::Bool(false))?;
            }
            ctx.set_memory(&prev_clock_key(&self.loc), MemoryValue::Bool(clock));
            return Ok(());
        }

        let prev_clock = ctx
            .get_memory(&prev_clock_key(&self.loc), MemoryValue::Bool(false))
            .as_bool()
            .unwrap_or(false);
        ctx.set_memory(&prev_clock_key(&self.loc), MemoryValue::Bool(clock));

        if !(clock && !prev_clock) {
            return Ok(());
        }

        let tags = self.bits.tags();
        let mut values: Vec<bool> = tags
            .iter()
            .map(|t| ctx.get_tag(t.name(), t.default()).truthy())
            .collect();
        if values.is_empty() {
            return Ok(());
        }
        for i in (1..values.len()).rev() {
            values[i] = values[i - 1];
        }
        values[0] = rung_power;
        for (tag, v) in tags.iter().zip(values.into_iter()) {
            ctx.set_tag(tag.name(), Value::Bool(v))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_context::{NoRestrictions, SystemState};
    use ladder_types::{Block, TagType};
    use std::collections::BTreeMap;

    fn initial() -> (SystemState, BlockRange) {
        let bits = Block::new("SR", TagType::Bool, 1, 4).select_all();
        let mut tags = BTreeMap::new();
        for t in bits.tags() {
            tags.insert(t.name().to_string(), Value::Bool(false));
        }
        (SystemState::initial(tags), bits)
    }

    #[test]
    fn rising_clock_shifts_and_inserts_rung_power() {
        let (s0, bits) = initial();
        let sr = ShiftRegister::new(bits.clone(), "loc1");
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        sr.execute(&mut ctx, true, true, false).unwrap();
        let s1 = ctx.commit(0.0);
        assert_eq!(s1.tag("SR1"), Some(Value::Bool(true)));
        assert_eq!(s1.tag("SR2"), Some(Value::Bool(false)));

        // clock falls, then rises again: second shift.
        let mut ctx = ScanContext::new(&s1, &NoRestrictions);
        sr.execute(&mut ctx, false, false, false).unwrap();
        let s2 = ctx.commit(0.0);

        let mut ctx = ScanContext::new(&s2, &NoRestrictions);
        sr.execute(&mut ctx, true, true, false).unwrap();
        let s3 = ctx.commit(0.0);
        assert_eq!(s3.tag("SR1"), Some(Value::Bool(true)));
        assert_eq!(s3.tag("SR2"), Some(Value::Bool(true)));
    }

    #[test]
    fn reset_wins_over_simultaneous_rising_clock() {
        let (s0, bits) = initial();
        let sr = ShiftRegister::new(bits, "loc1");
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        sr.execute(&mut ctx, true, true, true).unwrap();
        let s1 = ctx.commit(0.0);
        for t in s1.tags() {
            if t.0.starts_with("SR") {
                assert_eq!(*t.1, Value::Bool(false));
            }
        }
    }
}

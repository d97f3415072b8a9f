//! Drum sequencers (spec.md §4.3.8): a fixed-precedence multi-step sequencer over N steps x
//! M outputs. Per scan, precedence order is: (i) auto-progression from main enable,
//! (ii) level reset, (iii) edge jump, (iv) edge jog. Outputs for the current step are
//! written every scan; the completion flag sets on sequence completion and clears only on
//! reset.

use crate::core::InstrError;
use ladder_context::{MemoryValue, ScanContext};
use ladder_types::Value;
use std::sync::Arc;

/// One step's output pattern (one bool per output column) and, for `TimeDrum`, its preset
/// in the timer's base unit.
#[derive(Debug, Clone)]
pub struct DrumStep {
    pub outputs: Vec<bool>,
    pub preset: i32,
}

fn step_key(loc: &str) -> String {
    format!("_drum_step:{loc}")
}
fn frac_key(loc: &str) -> String {
    format!("_drum_frac:{loc}")
}
fn prev_jump_key(loc: &str) -> String {
    format!("_drum_prev_jump:{loc}")
}
fn prev_event_key(loc: &str) -> String {
    format!("_drum_prev_event:{loc}")
}
fn prev_jog_key(loc: &str) -> String {
    format!("_drum_prev_jog:{loc}")
}

struct DrumCommon {
    steps: Vec<DrumStep>,
    outputs: Vec<Arc<str>>,
    completion: Arc<str>,
    loc: String,
}

impl DrumCommon {
    fn completion(&self) -> &Arc<str> {
        &self.completion
    }

    fn read_current_step(&self, ctx: &ScanContext<'_>) -> usize {
        let raw = ctx
            .get_memory(&step_key(&self.loc), MemoryValue::Int(1))
            .as_int()
            .unwrap_or(1);
        if raw < 1 || raw as usize > self.steps.len() {
            1
        } else {
            raw as usize
        }
    }

    fn write_step_index(&self, ctx: &mut ScanContext<'_>, step: usize) {
        ctx.set_memory(&step_key(&self.loc), MemoryValue::Int(step as i64));
    }

    fn write_outputs(&self, ctx: &mut ScanContext<'_>, step: usize) -> Result<(), InstrError> {
        let pattern = &self.steps[step - 1].outputs;
        for (tag, on) in self.outputs.iter().zip(pattern.iter()) {
            ctx.set_tag(tag, Value::Bool(*on))?;
        }
        Ok(())
    }

    fn write_completion(&self, ctx: &mut ScanContext<'_>, done: bool) -> Result<(), InstrError> {
        ctx.set_tag(&self.completion, Value::Bool(done))?;
        Ok(())
    }

    /// Level reset + edge jump + edge jog, in that precedence order, with the resulting
    /// step clamped to `[1, len]`. Returns `Some(next_step)` if any of these fired.
    fn apply_reset_jump_jog(
        &self,
        ctx: &mut ScanContext<'_>,
        current: usize,
        reset: bool,
        jump_target: Option<usize>,
        jog: bool,
    ) -> Option<usize> {
        if reset {
            return Some(1);
        }
        let prev_jump = ctx
            .get_memory(&prev_jump_key(&self.loc), MemoryValue::Bool(false))
            .as_bool()
            .unwrap_or(false);
        let jump_edge = jump_target.is_some() && !prev_jump;
        ctx.set_memory(
            &prev_jump_key(&self.loc),
            MemoryValue::Bool(jump_target.is_some()),
        );
        if jump_edge {
            if let Some(target) = jump_target {
                if target >= 1 && target <= self.steps.len() {
                    return Some(target);
                }
                // Invalid jump target: ignored, step unchanged (spec.md §8 boundary behavior).
                return None;
            }
        }

        let prev_jog = ctx
            .get_memory(&prev_jog_key(&self.loc), MemoryValue::Bool(false))
            .as_bool()
            .unwrap_or(false);
        let jog_edge = jog && !prev_jog;
        ctx.set_memory(&prev_jog_key(&self.loc), MemoryValue::Bool(jog));
        if jog_edge {
            let next = if current >= self.steps.len() { 1 } else { current + 1 };
            return Some(next);
        }
        None
    }
}

/// `event_drum`: advance on rising edge of the current step's event input (N, M <= 16).
pub struct EventDrum {
    common: DrumCommon,
}

impl EventDrum {
    pub fn new(
        steps: Vec<DrumStep>,
        outputs: Vec<impl Into<Arc<str>>>,
        completion: impl Into<Arc<str>>,
        loc: impl Into<String>,
    ) -> Self {
        EventDrum {
            common: DrumCommon {
                steps,
                outputs: outputs.into_iter().map(Into::into).collect(),
                completion: completion.into(),
                loc: loc.into(),
            },
        }
    }

    pub fn completion(&self) -> &Arc<str> {
        self.common.completion()
    }

    /// `enable` is the main auto-progression gate; `event` is the current step's rising-edge
    /// event input; `reset`/`jump_target`/`jog` follow spec.md §4.3.8's precedence.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &self,
        ctx: &mut ScanContext<'_>,
        enable: bool,
        event: bool,
        reset: bool,
        jump_target: Option<usize>,
        jog: bool,
    ) -> Result<(), InstrError> {
        let mut step = self.common.read_current_step(ctx);

        if let Some(next) = self.common.apply_reset_jump_jog(ctx, step, reset, jump_target, jog) {
            step = next;
        } else if enable {
            let prev_event = ctx
                .get_memory(&prev_event_key(&self.common.loc), MemoryValue::Bool(false))
                .as_bool()
                .unwrap_or(false);
            let event_edge = event && !prev_event;
            ctx.set_memory(&prev_event_key(&self.common.loc), MemoryValue::Bool(event));
            if event_edge && step < self.common.steps.len() {
                step += 1;
            }
        }

        self.common.write_step_index(ctx, step);
        self.common.write_outputs(ctx, step)?;
        let completion = if reset {
            false
        } else {
            let already = ctx
                .committed()
                .tag(self.common.completion.as_ref())
                .map(|v| v.truthy())
                .unwrap_or(false);
            already || step == self.common.steps.len()
        };
        self.common.write_completion(ctx, completion)?;
        Ok(())
    }
}

/// `time_drum`: accumulate `dt` through the current step's preset; transition when met,
/// keeping fractional carry the same way timers do (spec.md §4.3.2, §4.3.8).
pub struct TimeDrum {
    common: DrumCommon,
}

impl TimeDrum {
    pub fn new(
        steps: Vec<DrumStep>,
        outputs: Vec<impl Into<Arc<str>>>,
        completion: impl Into<Arc<str>>,
        loc: impl Into<String>,
    ) -> Self {
        TimeDrum {
            common: DrumCommon {
                steps,
                outputs: outputs.into_iter().map(Into::into).collect(),
                completion: completion.into(),
                loc: loc.into(),
            },
        }
    }

    pub fn completion(&self) -> &Arc<str> {
        self.common.completion()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &self,
        ctx: &mut ScanContext<'_>,
        enable: bool,
        dt_units: f64,
        reset: bool,
        jump_target: Option<usize>,
        jog: bool,
    ) -> Result<(), InstrError> {
        let mut step = self.common.read_current_step(ctx);

        if let Some(next) = self.common.apply_reset_jump_jog(ctx, step, reset, jump_target, jog) {
            step = next;
            ctx.set_memory(&frac_key(&self.common.loc), MemoryValue::Float(0.0));
        } else if enable {
            let frac = ctx
                .get_memory(&frac_key(&self.common.loc), MemoryValue::Float(0.0))
                .as_float()
                .unwrap_or(0.0);
            let preset = self.common.steps[step - 1].preset as f64;
            let total = frac + dt_units;
            if total >= preset && step < self.common.steps.len() {
                step += 1;
                ctx.set_memory(&frac_key(&self.common.loc), MemoryValue::Float(total - preset));
            } else if total >= preset {
                // Last step reached preset: hold at preset, no further carry past completion.
                ctx.set_memory(&frac_key(&self.common.loc), MemoryValue::Float(preset));
            } else {
                ctx.set_memory(&frac_key(&self.common.loc), MemoryValue::Float(total));
            }
        }

        self.common.write_step_index(ctx, step);
        self.common.write_outputs(ctx, step)?;

        let completion = if reset {
            false
        } else {
            let frac = ctx
                .get_memory(&frac_key(&self.common.loc), MemoryValue::Float(0.0))
                .as_float()
                .unwrap_or(0.0);
            let at_last = step == self.common.steps.len();
            let preset = self.common.steps[step - 1].preset as f64;
            let already = ctx
                .committed()
                .tag(self.common.completion.as_ref())
                .map(|v| v.truthy())
                .unwrap_or(false);
            already || (at_last && frac >= preset)
        };
        self.common.write_completion(ctx, completion)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_context::{NoRestrictions, SystemState};
    use std::collections::BTreeMap;

    fn steps() -> Vec<DrumStep> {
        vec![
            DrumStep { outputs: vec![true, false], preset: 2 },
            DrumStep { outputs: vec![false, true], preset: 3 },
        ]
    }

    fn state() -> SystemState {
        let mut tags = BTreeMap::new();
        tags.insert("O1".to_string(), Value::Bool(false));
        tags.insert("O2".to_string(), Value::Bool(false));
        tags.insert("Done".to_string(), Value::Bool(false));
        SystemState::initial(tags)
    }

    #[test]
    fn event_drum_advances_on_rising_edge() {
        let mut s = state();
        let drum = EventDrum::new(steps(), vec!["O1", "O2"], "Done", "d1");
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        drum.execute(&mut ctx, true, false, false, None, false).unwrap();
        s = ctx.commit(0.0);
        assert_eq!(s.tag("O1"), Some(Value::Bool(true)));

        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        drum.execute(&mut ctx, true, true, false, None, false).unwrap();
        s = ctx.commit(0.0);
        assert_eq!(s.tag("O1"), Some(Value::Bool(false)));
        assert_eq!(s.tag("O2"), Some(Value::Bool(true)));
        assert_eq!(s.tag("Done"), Some(Value::Bool(true)));
    }

    #[test]
    fn completion_clears_only_on_reset() {
        let mut s = state();
        let drum = EventDrum::new(steps(), vec!["O1", "O2"], "Done", "d2");
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        drum.execute(&mut ctx, true, true, false, None, false).unwrap();
        s = ctx.commit(0.0);
        assert_eq!(s.tag("Done"), Some(Value::Bool(true)));

        // another scan without event/reset: completion holds.
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        drum.execute(&mut ctx, true, false, false, None, false).unwrap();
        s = ctx.commit(0.0);
        assert_eq!(s.tag("Done"), Some(Value::Bool(true)));

        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        drum.execute(&mut ctx, true, false, true, None, false).unwrap();
        s = ctx.commit(0.0);
        assert_eq!(s.tag("Done"), Some(Value::Bool(false)));
    }

    #[test]
    fn invalid_jump_target_is_ignored() {
        let s = state();
        let drum = EventDrum::new(steps(), vec!["O1", "O2"], "Done", "d3");
        let mut ctx = ScanContext::new(&s, &NoRestrictions);
        drum.execute(&mut ctx, true, false, false, Some(99), false).unwrap();
        let s1 = ctx.commit(0.0);
        assert_eq!(s1.tag("O1"), Some(Value::Bool(true)));
        assert_eq!(s1.tag("O2"), Some(Value::Bool(false)));
    }

    #[test]
    fn time_drum_advances_when_preset_reached() {
        let mut s = state();
        let drum = TimeDrum::new(steps(), vec!["O1", "O2"], "Done", "d4");
        for _ in 0..2 {
            let mut ctx = ScanContext::new(&s, &NoRestrictions);
            drum.execute(&mut ctx, true, 1.0, false, None, false).unwrap();
            s = ctx.commit(1.0);
        }
        assert_eq!(s.tag("O2"), Some(Value::Bool(true)));
    }
}

//! Adapts the stateful instructions from `ladder-instr` whose `execute` needs more than a
//! single `enabled` flag (timers need `dt`, counters need `reset`/`down`, shift registers
//! and drums need clock/reset/jump/jog conditions) into plain `Instruction` impls that the
//! rung evaluator can dispatch uniformly. `dt` is read from `_dt` in scan memory, matching
//! spec.md §9's "`dt` is injected into memory before rung evaluation so that timer
//! instructions can remain pure with respect to the snapshot."

use ladder_cond::{Condition, Operand};
use ladder_context::{MemoryValue, ScanContext};
use ladder_instr::{
    CountDown, CountUp, EventDrum, Instruction, InstrError, InstrOperand, OffDelayTimer,
    OnDelayTimer, ShiftRegister, TimeDrum, TimeUnit,
};

fn read_dt(ctx: &ScanContext<'_>) -> f64 {
    ctx.get_memory("_dt", MemoryValue::Float(0.0))
        .as_float()
        .unwrap_or(0.0)
}

/// `OnDelayTimer` plus the explicit reset condition that makes it an `RTON` (spec.md
/// §4.3.2). Pass `None` for a plain `TON`, which has no reset input.
pub struct OnDelay {
    timer: OnDelayTimer,
    reset: Option<Condition>,
}

impl OnDelay {
    pub fn new(timer: OnDelayTimer, reset: Option<Condition>) -> Self {
        OnDelay { timer, reset }
    }
}

impl Instruction for OnDelay {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let reset = match &self.reset {
            Some(cond) => cond.evaluate(ctx)?,
            None => false,
        };
        let dt = read_dt(ctx);
        self.timer.execute(ctx, dt, enabled, reset)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        let mut facts = vec![
            InstrOperand::Tag("done".into(), self.timer.done().clone()),
            InstrOperand::Tag("acc".into(), self.timer.acc().clone()),
        ];
        if let Some(reset) = &self.reset {
            facts.push(InstrOperand::Condition("reset".into(), reset.clone()));
        }
        facts
    }
}

pub struct OffDelay {
    timer: OffDelayTimer,
}

impl OffDelay {
    pub fn new(timer: OffDelayTimer) -> Self {
        OffDelay { timer }
    }
}

impl Instruction for OffDelay {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let dt = read_dt(ctx);
        self.timer.execute(ctx, dt, enabled)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Tag("done".into(), self.timer.done().clone()),
            InstrOperand::Tag("acc".into(), self.timer.acc().clone()),
        ]
    }
}

/// `CountUp` plus its separately-evaluated reset and down conditions (spec.md §4.3.3).
pub struct CountUpGated {
    counter: CountUp,
    reset: Condition,
    down: Condition,
}

impl CountUpGated {
    pub fn new(counter: CountUp, reset: Condition, down: Condition) -> Self {
        CountUpGated {
            counter,
            reset,
            down,
        }
    }
}

impl Instruction for CountUpGated {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let reset = self.reset.evaluate(ctx)?;
        let down = self.down.evaluate(ctx)?;
        self.counter.execute(ctx, reset, enabled, down)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Tag("done".into(), self.counter.done().clone()),
            InstrOperand::Tag("acc".into(), self.counter.acc().clone()),
            InstrOperand::Condition("reset".into(), self.reset.clone()),
            InstrOperand::Condition("down".into(), self.down.clone()),
        ]
    }
}

pub struct CountDownGated {
    counter: CountDown,
    reset: Condition,
}

impl CountDownGated {
    pub fn new(counter: CountDown, reset: Condition) -> Self {
        CountDownGated { counter, reset }
    }
}

impl Instruction for CountDownGated {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let reset = self.reset.evaluate(ctx)?;
        self.counter.execute(ctx, reset, enabled)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Tag("done".into(), self.counter.done().clone()),
            InstrOperand::Tag("acc".into(), self.counter.acc().clone()),
            InstrOperand::Condition("reset".into(), self.reset.clone()),
        ]
    }
}

/// Always-execute shift register with its clock/reset conditions (spec.md §4.3.7). The
/// `enabled` flag the rung evaluator passes in carries the rung-power bit that gets shifted
/// in at position one.
pub struct ShiftRegisterGated {
    register: ShiftRegister,
    clock: Condition,
    reset: Condition,
}

impl ShiftRegisterGated {
    pub fn new(register: ShiftRegister, clock: Condition, reset: Condition) -> Self {
        ShiftRegisterGated {
            register,
            clock,
            reset,
        }
    }
}

impl Instruction for ShiftRegisterGated {
    fn always_execute(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let clock = self.clock.evaluate(ctx)?;
        let reset = self.reset.evaluate(ctx)?;
        self.register.execute(ctx, enabled, clock, reset)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::BlockRange("bits".into(), self.register.bits().clone()),
            InstrOperand::Condition("clock".into(), self.clock.clone()),
            InstrOperand::Condition("reset".into(), self.reset.clone()),
        ]
    }
}

/// An edge-jump target: active when `enable` is true, resolving its numeric target from
/// `target` (spec.md §4.3.8).
pub struct JumpInput {
    pub enable: Condition,
    pub target: Operand,
}

fn resolve_jump(ctx: &mut ScanContext<'_>, jump: &Option<JumpInput>) -> Result<Option<usize>, InstrError> {
    match jump {
        None => Ok(None),
        Some(j) => {
            if j.enable.evaluate(ctx)? {
                let value = j.target.evaluate(ctx)?;
                Ok(value.as_f64().map(|f| f.max(0.0) as usize))
            } else {
                Ok(None)
            }
        }
    }
}

/// Always-execute `event_drum` with its event/reset/jump/jog conditions (spec.md §4.3.8).
pub struct EventDrumGated {
    drum: EventDrum,
    event: Condition,
    reset: Condition,
    jump: Option<JumpInput>,
    jog: Condition,
}

impl EventDrumGated {
    pub fn new(
        drum: EventDrum,
        event: Condition,
        reset: Condition,
        jump: Option<JumpInput>,
        jog: Condition,
    ) -> Self {
        EventDrumGated {
            drum,
            event,
            reset,
            jump,
            jog,
        }
    }
}

impl Instruction for EventDrumGated {
    fn always_execute(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let event = self.event.evaluate(ctx)?;
        let reset = self.reset.evaluate(ctx)?;
        let jog = self.jog.evaluate(ctx)?;
        let jump_target = resolve_jump(ctx, &self.jump)?;
        self.drum.execute(ctx, enabled, event, reset, jump_target, jog)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        describe_drum_gating(
            self.drum.completion(),
            Some(&self.event),
            &self.reset,
            &self.jump,
            &self.jog,
        )
    }
}

/// Always-execute `time_drum` with its reset/jump/jog conditions and its own timer unit
/// (spec.md §4.3.2, §4.3.8).
pub struct TimeDrumGated {
    drum: TimeDrum,
    unit: TimeUnit,
    reset: Condition,
    jump: Option<JumpInput>,
    jog: Condition,
}

impl TimeDrumGated {
    pub fn new(
        drum: TimeDrum,
        unit: TimeUnit,
        reset: Condition,
        jump: Option<JumpInput>,
        jog: Condition,
    ) -> Self {
        TimeDrumGated {
            drum,
            unit,
            reset,
            jump,
            jog,
        }
    }
}

impl Instruction for TimeDrumGated {
    fn always_execute(&self) -> bool {
        true
    }

    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        let reset = self.reset.evaluate(ctx)?;
        let jog = self.jog.evaluate(ctx)?;
        let jump_target = resolve_jump(ctx, &self.jump)?;
        let dt_units = self.unit.unit_scale(read_dt(ctx));
        self.drum.execute(ctx, enabled, dt_units, reset, jump_target, jog)
    }

    fn describe(&self) -> Vec<InstrOperand> {
        describe_drum_gating(self.drum.completion(), None, &self.reset, &self.jump, &self.jog)
    }
}

fn describe_drum_gating(
    completion: &std::sync::Arc<str>,
    event: Option<&Condition>,
    reset: &Condition,
    jump: &Option<JumpInput>,
    jog: &Condition,
) -> Vec<InstrOperand> {
    let mut facts = vec![InstrOperand::Tag("completion".into(), completion.clone())];
    if let Some(event) = event {
        facts.push(InstrOperand::Condition("event".into(), event.clone()));
    }
    facts.push(InstrOperand::Condition("reset".into(), reset.clone()));
    if let Some(j) = jump {
        facts.push(InstrOperand::Condition("jump.enable".into(), j.enable.clone()));
        facts.push(InstrOperand::Operand("jump.target".into(), j.target.clone()));
    }
    facts.push(InstrOperand::Condition("jog".into(), jog.clone()));
    facts
}

//! Debug stepping (spec.md §4.6: `scan_steps`/`scan_steps_debug`): yields at every top-level
//! rung boundary instead of running a whole scan atomically. A native generator would make
//! `ScanStepper` self-referential (it would need to hold a `ScanContext` borrowing the
//! `Runner` across `.next()` calls while also handing out `&mut Runner` in between); instead
//! it carries the queued writes as owned maps and re-wraps them in a fresh `ScanContext` for
//! each rung, exactly the pattern `ScanContext::resume`/`into_pending` exist for.

use crate::runner::Runner;
use crate::error::RunnerError;
use ladder_context::{MemoryValue, SystemState};
use ladder_history::RungTraceEvent;
use ladder_types::Value;
use std::collections::BTreeMap;

/// One step of a debug-stepped scan (spec.md §4.6).
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// A top-level rung finished evaluating. `power` is `Some` only under
    /// `scan_steps_debug` (spec.md §4.6: rung-trace retention is opt-in).
    Rung { rung_id: u64, power: Option<bool> },
    /// The scan committed; no more steps remain until `Runner::scan_steps[_debug]` is
    /// called again.
    Committed(SystemState),
}

/// Drives one scan rung-by-rung. Borrows the `Runner` mutably for its whole lifetime, like
/// an iterator over a `&mut Vec` -- the caller cannot touch the runner again until the
/// stepper is dropped or has yielded its final `Committed` outcome.
pub struct ScanStepper<'a> {
    runner: &'a mut Runner,
    committed: SystemState,
    dt: f64,
    pending_tags: BTreeMap<String, Value>,
    pending_memory: BTreeMap<String, MemoryValue>,
    rung_index: usize,
    trace: bool,
    trace_events: Vec<(u64, RungTraceEvent)>,
    done: bool,
}

impl<'a> ScanStepper<'a> {
    pub(crate) fn new(runner: &'a mut Runner, trace: bool) -> Self {
        let (committed, dt, pending_tags, pending_memory) = runner.begin_scan();
        ScanStepper {
            runner,
            committed,
            dt,
            pending_tags,
            pending_memory,
            rung_index: 0,
            trace,
            trace_events: Vec::new(),
            done: false,
        }
    }

    /// Evaluates the next top-level rung, or commits the scan once every rung has run.
    /// Returns `None` once the scan has already committed -- call
    /// `Runner::scan_steps[_debug]` again to start the next one.
    pub fn advance(&mut self) -> Result<Option<StepOutcome>, RunnerError> {
        if self.done {
            return Ok(None);
        }

        if self.rung_index >= self.runner.rung_count() {
            let state = self.runner.finish_scan(
                &self.committed,
                self.dt,
                std::mem::take(&mut self.pending_tags),
                std::mem::take(&mut self.pending_memory),
                std::mem::take(&mut self.trace_events),
            );
            self.runner.finish_breakpoints(&state);
            self.done = true;
            return Ok(Some(StepOutcome::Committed(state)));
        }

        let (pending_tags, pending_memory, event) = self.runner.run_one_rung_by_index(
            &self.committed,
            std::mem::take(&mut self.pending_tags),
            std::mem::take(&mut self.pending_memory),
            self.rung_index,
            self.trace,
        )?;
        self.pending_tags = pending_tags;
        self.pending_memory = pending_memory;

        let rung_id = self.runner.program().rungs()[self.rung_index].id();
        if let Some(ev) = event {
            self.trace_events.push((self.committed.scan_id(), ev));
        }
        self.rung_index += 1;

        Ok(Some(StepOutcome::Rung {
            rung_id,
            power: event_power(event),
        }))
    }

    /// Drives every remaining rung and the final commit, returning the committed snapshot
    /// (equivalent to `Runner::step`, but usable mid-stepping).
    pub fn finish(mut self) -> Result<SystemState, RunnerError> {
        loop {
            match self.advance()? {
                Some(StepOutcome::Committed(state)) => return Ok(state),
                Some(StepOutcome::Rung { .. }) => continue,
                None => unreachable!("finish called after the scan already committed"),
            }
        }
    }
}

fn event_power(event: Option<RungTraceEvent>) -> Option<bool> {
    event.map(|e| e.power)
}

impl Runner {
    /// Steps through the next scan one top-level rung at a time, without retaining
    /// per-rung trace data (spec.md §4.6 `scan_steps`).
    pub fn scan_steps(&mut self) -> ScanStepper<'_> {
        ScanStepper::new(self, false)
    }

    /// Like `scan_steps`, but each rung's evaluated power is retained for `inspect`
    /// (spec.md §4.6 `scan_steps_debug`).
    pub fn scan_steps_debug(&mut self) -> ScanStepper<'_> {
        ScanStepper::new(self, true)
    }
}

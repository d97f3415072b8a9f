//! Runner / Engine (spec.md §4.5, §5, §6.2, component 7): drives the scan cycle, owns mode
//! lifecycle (Run/Stop/Reboot), time mode, patch queue, forces, monitors, breakpoints, and
//! emits snapshots into the history.

use crate::error::RunnerError;
use crate::policy::{is_read_only_system_tag, RunnerWritePolicy};
use crate::tag_table::TagTable;
use crate::time::{Clock, TimeMode, WallClock};
use ladder_context::{ContextError, MemoryValue, ScanContext, SystemState};
use ladder_history::{
    BreakpointHandle, BreakpointRegistry, History, HistoryError, MonitorHandle, MonitorRegistry,
    RungTraceEvent, TraceLog, WhenBuilder,
};
use ladder_program::Program;
use ladder_sys::{
    is_fatal_latched, SystemPointRuntime, RTC_APPLY_COMMAND, RTC_NEW_EPOCH_SECONDS, SYS_STOP_COMMAND,
};
use ladder_types::{Tag, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunMode {
    Run,
    Stop,
}

/// Drives one program's scan cycle (spec.md §4.5, component 7). A fresh `Runner` starts in
/// `Stop`, so the very first `step`/`run*` call performs the Stop->Run reset -- this makes
/// "cold boot" and "Stop->Run after an explicit `stop()`" the same code path (spec.md §8
/// property 2 holds from scan zero onward).
///
/// `program` is kept behind an `Arc` even though only one `Runner` ever drives it: `fork_from`
/// (spec.md §4.6) clones a running session at an earlier point in its history, and `Program`
/// has no reason to duplicate a whole rung tree for that.
pub struct Runner {
    program: Arc<Program>,
    tags: TagTable,
    state: SystemState,
    history: History,
    history_limit: Option<usize>,
    monitors: MonitorRegistry,
    breakpoints: BreakpointRegistry,
    trace: TraceLog,
    pub(crate) mode: RunMode,
    battery_present: bool,
    clock: Clock,
    wall_clock: WallClock,
    sys_points: SystemPointRuntime,
    patches: BTreeMap<String, Value>,
    forces: BTreeMap<String, Value>,
}

impl Runner {
    pub fn new(
        program: Program,
        tags: impl IntoIterator<Item = Tag>,
        time_mode: TimeMode,
        wall_clock: WallClock,
        history_limit: Option<usize>,
    ) -> Self {
        let tags = TagTable::new(tags);
        let initial_tags: BTreeMap<String, Value> =
            tags.iter().map(|t| (t.name().to_string(), t.default())).collect();
        let state = SystemState::initial(initial_tags);
        let history = History::new(history_limit, state.clone());
        Runner {
            program: Arc::new(program),
            tags,
            state,
            history,
            history_limit,
            monitors: MonitorRegistry::new(),
            breakpoints: BreakpointRegistry::new(),
            trace: TraceLog::new(),
            mode: RunMode::Stop,
            battery_present: true,
            clock: Clock::new(time_mode, wall_clock),
            wall_clock,
            sys_points: SystemPointRuntime::new(wall_clock),
            patches: BTreeMap::new(),
            forces: BTreeMap::new(),
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn current_state(&self) -> &SystemState {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn set_time_mode(&mut self, mode: TimeMode) {
        self.clock.set_mode(mode);
    }

    pub fn time_mode(&self) -> TimeMode {
        self.clock.mode()
    }

    pub fn is_running(&self) -> bool {
        self.mode == RunMode::Run
    }

    // ---- Mode lifecycle (spec.md §4.5) ----------------------------------------------

    /// `stop()`: preserves all tag values; the mode-command tag (`sys.stop_command`) takes
    /// effect at the next scan boundary via the same path (spec.md §5).
    pub fn stop(&mut self) {
        self.mode = RunMode::Stop;
    }

    pub fn set_battery_present(&mut self, present: bool) {
        self.battery_present = present;
    }

    pub fn battery_present(&self) -> bool {
        self.battery_present
    }

    /// `reboot()` (power-cycle simulation, spec.md §4.5): scope identical to Stop->Run, but
    /// tag reset is governed by `battery_present` rather than per-tag retentiveness.
    pub fn reboot(&mut self) {
        let preserve_all = self.battery_present;
        self.reset_for_transition(|tag, current| if preserve_all { current } else { tag.default() });
        self.mode = RunMode::Run;
    }

    /// Stop->Run reset (spec.md §4.5): retentive tags preserve, non-retentive tags reset to
    /// default; scan clock, history, patches, forces, and debug-trace caches are all
    /// cleared. Time mode and monitor/breakpoint registrations survive untouched.
    fn transition_stop_to_run(&mut self) {
        self.reset_for_transition(|tag, current| if tag.is_retentive() { current } else { tag.default() });
        self.mode = RunMode::Run;
    }

    fn reset_for_transition(&mut self, pick: impl Fn(&Tag, Value) -> Value) {
        let mut tags = BTreeMap::new();
        for tag in self.tags.iter() {
            let current = self.state.tag(tag.name()).unwrap_or_else(|| tag.default());
            tags.insert(tag.name().to_string(), pick(tag, current));
        }
        let seed = SystemState::with_reset_clock(tags);
        self.history = History::new(self.history_limit, seed.clone());
        self.state = seed;
        self.patches.clear();
        self.forces.clear();
        self.trace.clear();
        self.clock.resync();
    }

    fn ensure_running(&mut self) {
        if self.mode == RunMode::Stop {
            self.transition_stop_to_run();
        }
    }

    // ---- Patches & forces (spec.md §6.2) ---------------------------------------------

    /// One-shot external write applied at the next scan start; rejects read-only system
    /// tags synchronously (spec.md §4.1, §7 `ReadOnlySystemTag`).
    pub fn patch(&mut self, writes: BTreeMap<String, Value>) -> Result<(), ContextError> {
        for name in writes.keys() {
            if is_read_only_system_tag(name) {
                return Err(ContextError::ReadOnlySystemTag(name.clone()));
            }
        }
        self.patches.extend(writes);
        Ok(())
    }

    /// Replaces the entire force set; forces are a privileged debug/simulation override and
    /// bypass the system-point write policy (spec.md §6.2: "persistent override applied
    /// pre- and post-logic").
    pub fn force(&mut self, writes: BTreeMap<String, Value>) {
        self.forces = writes;
    }

    pub fn add_force(&mut self, tag: impl Into<String>, value: Value) {
        self.forces.insert(tag.into(), value);
    }

    pub fn remove_force(&mut self, tag: &str) {
        self.forces.remove(tag);
    }

    pub fn clear_forces(&mut self) {
        self.forces.clear();
    }

    // ---- History & debug surface (spec.md §4.6, §6.2) --------------------------------

    pub fn monitor(
        &mut self,
        tag: impl Into<String>,
        callback: impl FnMut(Value, Option<Value>) + 'static,
    ) -> MonitorHandle {
        self.monitors.register(tag, callback)
    }

    pub fn remove_monitor(&mut self, handle: MonitorHandle) {
        self.monitors.remove(handle);
    }

    pub fn when(&mut self, predicate: impl Fn(&SystemState) -> bool + 'static) -> WhenBuilder<'_> {
        self.breakpoints.when(predicate)
    }

    pub fn remove_breakpoint(&mut self, handle: BreakpointHandle) {
        self.breakpoints.remove(handle);
    }

    pub fn seek(&mut self, scan_id: u64) -> Result<(), HistoryError> {
        self.history.seek(scan_id)
    }

    pub fn rewind(&mut self, seconds: f64) {
        self.history.rewind(seconds);
    }

    pub fn diff(a: &SystemState, b: &SystemState) -> BTreeMap<String, (Option<Value>, Option<Value>)> {
        History::diff(a, b)
    }

    /// `Inspect(rung_id, scan_id)` (spec.md §4.6): only populated for scans stepped through
    /// `scan_steps_debug`.
    pub fn inspect(&self, rung_id: u64, scan_id: u64) -> Option<RungTraceEvent> {
        self.trace.inspect(rung_id, scan_id)
    }

    /// Builds a new, independent `Runner` seeded from a historical snapshot (spec.md §4.6
    /// `Fork`): same program, tag declarations, time mode, and battery setting, but clean
    /// debug/force/pending state and a fresh history containing only that seed snapshot.
    pub fn fork_from(&self, scan_id: u64) -> Result<Runner, HistoryError> {
        let seed = self.history.fork_seed(scan_id)?;
        let history = History::new(self.history_limit, seed.clone());
        Ok(Runner {
            program: self.program.clone(),
            tags: self.tags.clone(),
            state: seed,
            history,
            history_limit: self.history_limit,
            monitors: MonitorRegistry::new(),
            breakpoints: BreakpointRegistry::new(),
            trace: TraceLog::new(),
            mode: RunMode::Run,
            battery_present: self.battery_present,
            clock: Clock::new(self.clock.mode(), self.wall_clock),
            wall_clock: self.wall_clock,
            sys_points: SystemPointRuntime::new(self.wall_clock),
            patches: BTreeMap::new(),
            forces: BTreeMap::new(),
        })
    }

    // ---- Scan execution (spec.md §4.4, §4.5, §5) --------------------------------------

    pub fn step(&mut self) -> Result<SystemState, RunnerError> {
        let (state, _paused) = self.step_internal()?;
        Ok(state)
    }

    /// Bulk execution of `cycles` scans; stops early (without running the remaining
    /// cycles) the first time a `pause` breakpoint matches a committed snapshot
    /// (spec.md §6.2, §8 property 11).
    pub fn run(&mut self, cycles: u64) -> Result<SystemState, RunnerError> {
        let mut last = self.state.clone();
        for _ in 0..cycles {
            let (state, paused) = self.step_internal()?;
            last = state;
            if paused {
                break;
            }
        }
        Ok(last)
    }

    /// Bulk execution until the committed `timestamp` has advanced by at least `seconds`
    /// relative to the state at entry, or a pause breakpoint fires first.
    pub fn run_for(&mut self, seconds: f64) -> Result<SystemState, RunnerError> {
        self.ensure_running();
        let start = self.state.timestamp();
        let mut last = self.state.clone();
        while last.timestamp() - start < seconds {
            let (state, paused) = self.step_internal()?;
            last = state;
            if paused {
                break;
            }
        }
        Ok(last)
    }

    /// Returns on the first snapshot where `predicate` is true, or the first pause
    /// breakpoint match, whichever comes first (spec.md §8 property 11).
    pub fn run_until(
        &mut self,
        predicate: impl Fn(&SystemState) -> bool,
    ) -> Result<SystemState, RunnerError> {
        loop {
            let (state, paused) = self.step_internal()?;
            if predicate(&state) || paused {
                return Ok(state);
            }
        }
    }

    /// One full scan: builds a fresh `ScanContext` over the currently committed state,
    /// drives system-point derivation, patches, forces, and the program's rungs, then
    /// commits exactly once (spec.md §4.1: "no partial commit"). Returns the new snapshot
    /// plus whether a `pause` breakpoint matched it.
    fn step_internal(&mut self) -> Result<(SystemState, bool), RunnerError> {
        let (previous, dt, pending_tags, pending_memory) = self.begin_scan();
        let policy = RunnerWritePolicy;
        let mut ctx = ScanContext::resume(&previous, &policy, pending_tags, pending_memory);
        self.program.run_scan(&mut ctx)?;
        let (pending_tags, pending_memory) = ctx.into_pending();
        let new_state = self.finish_scan(&previous, dt, pending_tags, pending_memory, Vec::new());
        let paused = self.breakpoints.dispatch(&new_state, &mut self.history);
        Ok((new_state, paused))
    }

    /// Prepares a scan up to (but not including) rung evaluation: auto-restarts from Stop,
    /// advances the clock, derives system points, applies queued patches, applies the
    /// pre-logic force pass, and processes the RTC-apply command -- all the work that has
    /// to happen exactly once regardless of whether the caller drives the rest of the scan
    /// through `step`/`run*` or rung-by-rung through a `ScanStepper` (spec.md §4.5, §4.6).
    pub(crate) fn begin_scan(
        &mut self,
    ) -> (SystemState, f64, BTreeMap<String, Value>, BTreeMap<String, MemoryValue>) {
        self.ensure_running();
        let dt = self.clock.next_dt();
        let previous = self.state.clone();
        let policy = RunnerWritePolicy;
        let mut ctx = ScanContext::new(&previous, &policy);

        self.sys_points.on_scan_start(&mut ctx, true, self.battery_present);
        ctx.set_memory("_dt", MemoryValue::Float(dt));

        apply_writes_internal(&mut ctx, &self.patches);
        self.patches.clear();
        apply_writes_internal(&mut ctx, &self.forces);

        process_rtc_command(&self.sys_points, &mut ctx);

        let (pending_tags, pending_memory) = ctx.into_pending();
        (previous, dt, pending_tags, pending_memory)
    }

    /// Completes a scan given the program's queued writes: applies the post-logic force
    /// pass, commits, checks the stop-command tag and latched-fatal faults, and dispatches
    /// history/monitors (spec.md §4.5, §5). Breakpoint dispatch is the caller's
    /// responsibility since it needs `&mut self.history` alongside `&self.breakpoints`.
    pub(crate) fn finish_scan(
        &mut self,
        previous: &SystemState,
        dt: f64,
        pending_tags: BTreeMap<String, Value>,
        pending_memory: BTreeMap<String, MemoryValue>,
        trace_events: Vec<(u64, RungTraceEvent)>,
    ) -> SystemState {
        let policy = RunnerWritePolicy;
        let mut ctx = ScanContext::resume(previous, &policy, pending_tags, pending_memory);
        apply_writes_internal(&mut ctx, &self.forces);
        let new_state = ctx.commit(dt);

        if new_state.tag(SYS_STOP_COMMAND).map(|v| v.truthy()).unwrap_or(false) {
            self.mode = RunMode::Stop;
        }
        if is_fatal_latched(&new_state) {
            self.mode = RunMode::Stop;
        }

        for (scan_id, event) in trace_events {
            self.trace.record(scan_id, event);
        }

        self.history.push(new_state.clone());
        self.monitors.dispatch(previous, &new_state);
        self.state = new_state.clone();
        new_state
    }

    pub(crate) fn rung_count(&self) -> usize {
        self.program.rungs().len()
    }

    pub(crate) fn run_one_rung_by_index(
        &self,
        committed: &SystemState,
        pending_tags: BTreeMap<String, Value>,
        pending_memory: BTreeMap<String, MemoryValue>,
        rung_index: usize,
        trace: bool,
    ) -> Result<
        (BTreeMap<String, Value>, BTreeMap<String, MemoryValue>, Option<RungTraceEvent>),
        RunnerError,
    > {
        let policy = RunnerWritePolicy;
        let mut ctx = ScanContext::resume(committed, &policy, pending_tags, pending_memory);
        let rung = &self.program.rungs()[rung_index];
        let event = if trace {
            let power = self.program.run_one_rung_traced(rung, &mut ctx)?;
            Some(RungTraceEvent { rung_id: rung.id(), power })
        } else {
            self.program.run_one_rung(rung, &mut ctx)?;
            None
        };
        let (pending_tags, pending_memory) = ctx.into_pending();
        Ok((pending_tags, pending_memory, event))
    }

    pub(crate) fn finish_breakpoints(&mut self, state: &SystemState) -> bool {
        self.breakpoints.dispatch(state, &mut self.history)
    }
}

fn apply_writes_internal(ctx: &mut ScanContext<'_>, writes: &BTreeMap<String, Value>) {
    for (name, value) in writes {
        ctx.set_tag_internal(name, *value);
    }
}

/// Applies an "apply date/time" request (spec.md §4.5, §6.2): on the rising edge of
/// `rtc.apply_command`, treats `rtc.new_epoch_seconds` as an absolute target. Tracks the
/// edge with its own memory key rather than `ladder_cond::Condition::RisingEdge` because
/// that command tag may never have been declared in the program's tag table -- unlike rung
/// logic's conditions, this check must never fault on a missing tag.
fn process_rtc_command(sys_points: &SystemPointRuntime, ctx: &mut ScanContext<'_>) {
    const PREV_KEY: &str = "_prev:rtc.apply_command";
    let current = ctx.get_tag(RTC_APPLY_COMMAND, Value::Bool(false)).truthy();
    let previous = ctx
        .get_memory(PREV_KEY, MemoryValue::Bool(false))
        .as_bool()
        .unwrap_or(false);
    ctx.set_memory(PREV_KEY, MemoryValue::Bool(current));
    if current && !previous {
        let target = ctx
            .get_tag(RTC_NEW_EPOCH_SECONDS, Value::Real(0.0))
            .as_f64()
            .unwrap_or(f64::NAN);
        sys_points.apply_rtc_date_time(ctx, target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_cond::Condition;
    use ladder_instr::{Out, SourceLocation, Target};
    use ladder_program::{ExecutionItem, Rung};
    use ladder_types::{bool_tag, TagType};

    fn fixed_clock() -> f64 {
        0.0
    }

    fn button_light_runner() -> Runner {
        let rung = Rung::new(
            0,
            vec![Condition::direct("Button")],
            vec![ExecutionItem::instruction(Out::new(
                Target::tag("Light"),
                SourceLocation::new("r0.i0"),
            ))],
            "rung0",
        );
        let program = Program::build(vec![rung], vec![], true).unwrap();
        let tags = vec![bool_tag("Button"), bool_tag("Light")];
        Runner::new(program, tags, TimeMode::FixedStep { dt: 0.1 }, fixed_clock, None)
    }

    #[test]
    fn scenario_one_patch_then_step_drives_output() {
        let mut runner = button_light_runner();
        runner
            .patch(BTreeMap::from([("Button".to_string(), Value::Bool(true))]))
            .unwrap();
        let s1 = runner.step().unwrap();
        assert_eq!(s1.tag("Light"), Some(Value::Bool(true)));
    }

    #[test]
    fn patch_rejects_read_only_system_tag() {
        let mut runner = button_light_runner();
        let err = runner
            .patch(BTreeMap::from([("sys.running".to_string(), Value::Bool(true))]))
            .unwrap_err();
        assert_eq!(err, ContextError::ReadOnlySystemTag("sys.running".to_string()));
    }

    #[test]
    fn retentive_tag_survives_stop_and_auto_restart() {
        let rung = Rung::new(0, vec![], vec![], "r0");
        let program = Program::build(vec![rung], vec![], true).unwrap();
        let tags = vec![Tag::new("Counter", TagType::Int).retentive(true), bool_tag("Other")];
        let mut runner = Runner::new(program, tags, TimeMode::FixedStep { dt: 1.0 }, fixed_clock, None);
        runner
            .patch(BTreeMap::from([("Counter".to_string(), Value::Int(7))]))
            .unwrap();
        runner.step().unwrap();
        runner.stop();
        let s = runner.step().unwrap();
        assert_eq!(s.tag("Counter"), Some(Value::Int(7)));
        assert_eq!(s.scan_id(), 0);
    }

    #[test]
    fn non_retentive_tag_resets_on_stop_restart() {
        let mut runner = button_light_runner();
        runner
            .patch(BTreeMap::from([("Button".to_string(), Value::Bool(true))]))
            .unwrap();
        runner.step().unwrap();
        runner.stop();
        let s = runner.step().unwrap();
        assert_eq!(s.tag("Button"), Some(Value::Bool(false)));
    }

    #[test]
    fn reboot_with_battery_preserves_all_tags() {
        let mut runner = button_light_runner();
        runner
            .patch(BTreeMap::from([("Button".to_string(), Value::Bool(true))]))
            .unwrap();
        runner.step().unwrap();
        runner.set_battery_present(true);
        runner.reboot();
        assert_eq!(runner.current_state().tag("Button"), Some(Value::Bool(true)));
        assert_eq!(runner.current_state().scan_id(), 0);
    }

    #[test]
    fn reboot_without_battery_resets_all_tags() {
        let mut runner = button_light_runner();
        runner
            .patch(BTreeMap::from([("Button".to_string(), Value::Bool(true))]))
            .unwrap();
        runner.step().unwrap();
        runner.set_battery_present(false);
        runner.reboot();
        assert_eq!(runner.current_state().tag("Button"), Some(Value::Bool(false)));
    }

    #[test]
    fn run_until_stops_on_predicate() {
        let mut runner = button_light_runner();
        runner
            .patch(BTreeMap::from([("Button".to_string(), Value::Bool(true))]))
            .unwrap();
        let s = runner.run_until(|s| s.scan_id() >= 3).unwrap();
        assert_eq!(s.scan_id(), 3);
    }

    #[test]
    fn stop_command_tag_halts_and_next_step_auto_restarts() {
        let mut runner = button_light_runner();
        runner
            .patch(BTreeMap::from([(SYS_STOP_COMMAND.to_string(), Value::Bool(true))]))
            .unwrap();
        let s1 = runner.step().unwrap();
        assert_eq!(s1.scan_id(), 1);
        let s2 = runner.step().unwrap();
        assert_eq!(s2.scan_id(), 0);
    }

    #[test]
    fn rtc_apply_command_rising_edge_sets_offset() {
        let rung = Rung::new(0, vec![], vec![], "r0");
        let program = Program::build(vec![rung], vec![], true).unwrap();
        let tags = vec![
            bool_tag(RTC_APPLY_COMMAND),
            Tag::new(RTC_NEW_EPOCH_SECONDS, TagType::Real),
        ];
        let mut runner = Runner::new(program, tags, TimeMode::FixedStep { dt: 1.0 }, fixed_clock, None);
        runner
            .patch(BTreeMap::from([
                (RTC_APPLY_COMMAND.to_string(), Value::Bool(true)),
                (RTC_NEW_EPOCH_SECONDS.to_string(), Value::Real(5_000.0)),
            ]))
            .unwrap();
        runner.step().unwrap();
        assert_eq!(
            runner.current_state().memory("_sys.rtc.offset"),
            Some(&MemoryValue::Float(5_000.0))
        );
    }

    #[test]
    fn fork_from_shares_program_with_independent_state() {
        let mut runner = button_light_runner();
        runner
            .patch(BTreeMap::from([("Button".to_string(), Value::Bool(true))]))
            .unwrap();
        runner.step().unwrap();
        runner.step().unwrap();
        let forked = runner.fork_from(1).unwrap();
        assert_eq!(forked.current_state().scan_id(), 1);
        assert_eq!(runner.current_state().scan_id(), 2);
    }
}

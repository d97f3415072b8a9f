use crate::store::History;
use ladder_context::SystemState;

enum Action {
    Pause,
    Snapshot(String),
}

struct BreakpointEntry {
    id: u64,
    predicate: Box<dyn Fn(&SystemState) -> bool>,
    action: Action,
}

/// Handle to a `pause`/`snapshot` breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointHandle(u64);

/// Predicate breakpoints: `when(predicate).pause()` halts `run`/`run_for`/`run_until` at the
/// first post-commit snapshot where `predicate` holds; `when(predicate).snapshot(label)`
/// labels that snapshot instead, deduped per scan (spec.md §4.6).
#[derive(Default)]
pub struct BreakpointRegistry {
    entries: Vec<BreakpointEntry>,
    next_id: u64,
}

/// Builder returned by `when`; pick exactly one of `pause`/`snapshot` to register it.
pub struct WhenBuilder<'a> {
    registry: &'a mut BreakpointRegistry,
    predicate: Box<dyn Fn(&SystemState) -> bool>,
}

impl BreakpointRegistry {
    pub fn new() -> Self {
        BreakpointRegistry::default()
    }

    pub fn when(&mut self, predicate: impl Fn(&SystemState) -> bool + 'static) -> WhenBuilder<'_> {
        WhenBuilder {
            registry: self,
            predicate: Box::new(predicate),
        }
    }

    pub fn remove(&mut self, handle: BreakpointHandle) {
        self.entries.retain(|e| e.id != handle.0);
    }

    /// Evaluates every registered predicate against `state`, labeling `history` for any
    /// matching `snapshot` breakpoint and reporting whether any `pause` breakpoint matched.
    pub fn dispatch(&self, state: &SystemState, history: &mut History) -> bool {
        let mut should_pause = false;
        for entry in &self.entries {
            if (entry.predicate)(state) {
                match &entry.action {
                    Action::Pause => should_pause = true,
                    Action::Snapshot(label) => history.label(state.scan_id(), label),
                }
            }
        }
        should_pause
    }
}

impl<'a> WhenBuilder<'a> {
    pub fn pause(self) -> BreakpointHandle {
        self.register(Action::Pause)
    }

    pub fn snapshot(self, label: impl Into<String>) -> BreakpointHandle {
        self.register(Action::Snapshot(label.into()))
    }

    fn register(self, action: Action) -> BreakpointHandle {
        let id = self.registry.next_id;
        self.registry.next_id += 1;
        self.registry.entries.push(BreakpointEntry {
            id,
            predicate: self.predicate,
            action,
        });
        BreakpointHandle(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_types::Value;
    use std::collections::BTreeMap;

    #[test]
    fn pause_breakpoint_matches_predicate() {
        let mut tags = BTreeMap::new();
        tags.insert("Done".to_string(), Value::Bool(true));
        let state = SystemState::initial(tags);
        let mut registry = BreakpointRegistry::new();
        registry
            .when(|s| s.tag("Done") == Some(Value::Bool(true)))
            .pause();
        let mut history = History::new(None, state.clone());
        assert!(registry.dispatch(&state, &mut history));
    }

    #[test]
    fn snapshot_breakpoint_labels_history_and_does_not_pause() {
        let state = SystemState::initial(BTreeMap::new());
        let mut history = History::new(None, state.clone());
        let mut registry = BreakpointRegistry::new();
        registry.when(|_| true).snapshot("hit");
        let paused = registry.dispatch(&state, &mut history);
        assert!(!paused);
        assert!(history.find("hit").is_some());
    }

    #[test]
    fn removed_breakpoint_no_longer_dispatches() {
        let state = SystemState::initial(BTreeMap::new());
        let mut history = History::new(None, state.clone());
        let mut registry = BreakpointRegistry::new();
        let handle = registry.when(|_| true).pause();
        registry.remove(handle);
        assert!(!registry.dispatch(&state, &mut history));
    }
}

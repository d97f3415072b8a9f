use ladder_context::SystemState;
use ladder_types::Value;

type MonitorCallback = Box<dyn FnMut(Value, Option<Value>)>;

struct MonitorEntry {
    id: u64,
    tag: String,
    callback: MonitorCallback,
    enabled: bool,
}

/// Registered `monitor(tag, callback)` hooks, fired in registration order after each commit
/// iff the tag's value changed (spec.md §4.6).
#[derive(Default)]
pub struct MonitorRegistry {
    entries: Vec<MonitorEntry>,
    next_id: u64,
}

/// A handle to a registered monitor; dropping it does not remove the monitor, call
/// `remove` explicitly (spec.md §4.6: "returns a handle with `id`, `remove`, `enable`,
/// `disable`").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorHandle(u64);

impl MonitorHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl MonitorRegistry {
    pub fn new() -> Self {
        MonitorRegistry::default()
    }

    pub fn register(
        &mut self,
        tag: impl Into<String>,
        callback: impl FnMut(Value, Option<Value>) + 'static,
    ) -> MonitorHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(MonitorEntry {
            id,
            tag: tag.into(),
            callback: Box::new(callback),
            enabled: true,
        });
        MonitorHandle(id)
    }

    pub fn remove(&mut self, handle: MonitorHandle) {
        self.entries.retain(|e| e.id != handle.0);
    }

    pub fn enable(&mut self, handle: MonitorHandle) {
        self.set_enabled(handle, true);
    }

    pub fn disable(&mut self, handle: MonitorHandle) {
        self.set_enabled(handle, false);
    }

    fn set_enabled(&mut self, handle: MonitorHandle, enabled: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == handle.0) {
            entry.enabled = enabled;
        }
    }

    /// Fires every enabled monitor whose tag changed between `previous` and `current`, in
    /// registration order (spec.md §5: "Monitor and breakpoint callbacks fire after commit,
    /// in registration order").
    pub fn dispatch(&mut self, previous: &SystemState, current: &SystemState) {
        for entry in self.entries.iter_mut().filter(|e| e.enabled) {
            let new_value = match current.tag(&entry.tag) {
                Some(v) => v,
                None => continue,
            };
            let old_value = previous.tag(&entry.tag);
            if old_value != Some(new_value) {
                (entry.callback)(new_value, old_value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_context::{NoRestrictions, ScanContext};
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    #[test]
    fn monitor_fires_only_on_change_and_receives_old_new() {
        let mut tags = BTreeMap::new();
        tags.insert("A".to_string(), Value::Int(1));
        let s0 = SystemState::initial(tags);

        let observed = Rc::new(RefCell::new(Vec::new()));
        let observed_clone = observed.clone();
        let mut registry = MonitorRegistry::new();
        registry.register("A", move |new, old| {
            observed_clone.borrow_mut().push((new, old));
        });

        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        ctx.set_tag("A", Value::Int(1)).unwrap();
        let s1 = ctx.commit(1.0);
        registry.dispatch(&s0, &s1);
        assert!(observed.borrow().is_empty());

        let mut ctx = ScanContext::new(&s1, &NoRestrictions);
        ctx.set_tag("A", Value::Int(2)).unwrap();
        let s2 = ctx.commit(1.0);
        registry.dispatch(&s1, &s2);
        assert_eq!(*observed.borrow(), vec![(Value::Int(2), Some(Value::Int(1)))]);
    }

    #[test]
    fn disabled_monitor_does_not_fire() {
        let s0 = SystemState::initial(BTreeMap::new());
        let mut registry = MonitorRegistry::new();
        let fired = Rc::new(RefCell::new(false));
        let fired_clone = fired.clone();
        let handle = registry.register("X", move |_, _| *fired_clone.borrow_mut() = true);
        registry.disable(handle);

        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        ctx.set_tag("X", Value::Bool(true)).unwrap();
        let s1 = ctx.commit(1.0);
        registry.dispatch(&s0, &s1);
        assert!(!*fired.borrow());
    }
}

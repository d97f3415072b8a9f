use crate::state::{MemoryValue, SystemState};
use ladder_types::{TagReader, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("write rejected: {0} is a read-only system tag")]
    ReadOnlySystemTag(String),
}

/// Supplies the read-only-tag policy to a `ScanContext` without this crate needing to know
/// what a "system point" is (spec.md §4.1: "reserved system tags rejected"). The runner,
/// which owns the system points namespace, implements this.
pub trait WritePolicy {
    fn is_read_only(&self, tag_name: &str) -> bool;
}

/// No tag is read-only; used by tests and standalone programs with no system namespace.
pub struct NoRestrictions;
impl WritePolicy for NoRestrictions {
    fn is_read_only(&self, _tag_name: &str) -> bool {
        false
    }
}

/// A per-scan transactional write buffer over a committed `SystemState` (spec.md §4.1,
/// component 6). Reads see pending writes from earlier in the same scan before falling
/// back to the committed snapshot; nothing is visible externally until `commit`.
pub struct ScanContext<'a> {
    committed: &'a SystemState,
    policy: &'a dyn WritePolicy,
    pending_tags: BTreeMap<String, Value>,
    pending_memory: BTreeMap<String, MemoryValue>,
}

impl<'a> ScanContext<'a> {
    pub fn new(committed: &'a SystemState, policy: &'a dyn WritePolicy) -> Self {
        ScanContext {
            committed,
            policy,
            pending_tags: BTreeMap::new(),
            pending_memory: BTreeMap::new(),
        }
    }

    /// Resumes a scan with writes already queued by an earlier, separately-scoped
    /// `ScanContext` over the same `committed` snapshot. Used by the debug stepping model
    /// (`scan_steps`/`scan_steps_debug`, spec.md §4.6), which yields at rung boundaries: a
    /// borrowed `ScanContext` cannot itself be held across those yield points (it would make
    /// the stepper self-referential), so the stepper keeps the pending writes as owned maps
    /// between steps and re-wraps them in a fresh `ScanContext` for each rung.
    pub fn resume(
        committed: &'a SystemState,
        policy: &'a dyn WritePolicy,
        pending_tags: BTreeMap<String, Value>,
        pending_memory: BTreeMap<String, MemoryValue>,
    ) -> Self {
        ScanContext {
            committed,
            policy,
            pending_tags,
            pending_memory,
        }
    }

    /// The inverse of `resume`: hands back the queued writes without committing, so the
    /// debug stepper can carry them into the next rung's `ScanContext`.
    pub fn into_pending(self) -> (BTreeMap<String, Value>, BTreeMap<String, MemoryValue>) {
        (self.pending_tags, self.pending_memory)
    }

    pub fn committed(&self) -> &SystemState {
        self.committed
    }

    /// Returns the pending-write value if any, else the committed value, else `default`
    /// (spec.md §4.1). Never mutates state.
    pub fn get_tag(&self, name: &str, default: Value) -> Value {
        self.pending_tags
            .get(name)
            .copied()
            .or_else(|| self.committed.tag(name))
            .unwrap_or(default)
    }

    /// Queues a write visible to subsequent `get_tag` within the same scan. Rejects
    /// writes to tags the policy marks read-only.
    pub fn set_tag(&mut self, name: &str, value: Value) -> Result<(), ContextError> {
        if self.policy.is_read_only(name) {
            return Err(ContextError::ReadOnlySystemTag(name.to_string()));
        }
        self.pending_tags.insert(name.to_string(), value);
        Ok(())
    }

    /// Atomic batch write with the same semantics as repeated `set_tag`, insertion order
    /// preserved (spec.md §4.1). On the first read-only rejection, nothing from this batch
    /// is applied.
    pub fn set_tags<I>(&mut self, writes: I) -> Result<(), ContextError>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let writes: Vec<(String, Value)> = writes.into_iter().collect();
        for (name, _) in &writes {
            if self.policy.is_read_only(name) {
                return Err(ContextError::ReadOnlySystemTag(name.clone()));
            }
        }
        for (name, value) in writes {
            self.pending_tags.insert(name, value);
        }
        Ok(())
    }

    /// Internal bypass used by the runtime itself to update otherwise read-only system
    /// tags (spec.md §4.1: `_set_tag_internal`).
    pub fn set_tag_internal(&mut self, name: &str, value: Value) {
        self.pending_tags.insert(name.to_string(), value);
    }

    pub fn get_memory(&self, key: &str, default: MemoryValue) -> MemoryValue {
        self.pending_memory
            .get(key)
            .cloned()
            .or_else(|| self.committed.memory(key).cloned())
            .unwrap_or(default)
    }

    pub fn set_memory(&mut self, key: &str, value: MemoryValue) {
        self.pending_memory.insert(key.to_string(), value);
    }

    /// Produce a new `SystemState` with `scan_id += 1`, `timestamp += dt`, and all queued
    /// writes applied in a single atomic publication (spec.md §4.1). The pre-scan snapshot
    /// (`committed`) is untouched; this consumes `self` so a half-committed context cannot
    /// be reused.
    pub fn commit(self, dt: f64) -> SystemState {
        let mut tags = self.committed.tags().clone();
        for (name, value) in self.pending_tags {
            tags.insert(name, value);
        }
        let mut memory = self.committed.memory_map().clone();
        for (key, value) in self.pending_memory {
            memory.insert(key, value);
        }
        self.committed.advance(dt, tags, memory)
    }
}

impl TagReader for ScanContext<'_> {
    fn read_value(&self, tag_name: &str) -> Option<Value> {
        self.pending_tags
            .get(tag_name)
            .copied()
            .or_else(|| self.committed.tag(tag_name))
    }
}

impl TagReader for SystemState {
    fn read_value(&self, tag_name: &str) -> Option<Value> {
        self.tag(tag_name)
    }
}

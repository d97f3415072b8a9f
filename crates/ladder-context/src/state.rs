use ladder_types::Value;
use std::collections::BTreeMap;

/// Engine-private memory values (spec.md §3.3): `_dt`, `_prev:<tag>`, `_frac:<acc>`,
/// `_oneshot:<loc>`, `_sys.rtc.offset`, edge/clock/shift/drum bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MemoryValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MemoryValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MemoryValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            MemoryValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// An immutable snapshot of the whole controller at one `scan_id` (spec.md §3.3).
///
/// Snapshots are never mutated after construction; the scan evaluator produces a new
/// snapshot that shares nothing mutable with the one it was built from (spec.md §8
/// property 1, §9 "Immutable snapshots").
#[derive(Debug, Clone, PartialEq)]
pub struct SystemState {
    scan_id: u64,
    timestamp: f64,
    tags: BTreeMap<String, Value>,
    memory: BTreeMap<String, MemoryValue>,
}

impl SystemState {
    pub fn initial(tags: BTreeMap<String, Value>) -> Self {
        SystemState {
            scan_id: 0,
            timestamp: 0.0,
            tags,
            memory: BTreeMap::new(),
        }
    }

    pub fn scan_id(&self) -> u64 {
        self.scan_id
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn tag(&self, name: &str) -> Option<Value> {
        self.tags.get(name).copied()
    }

    pub fn tags(&self) -> &BTreeMap<String, Value> {
        &self.tags
    }

    pub fn memory(&self, key: &str) -> Option<&MemoryValue> {
        self.memory.get(key)
    }

    pub fn memory_map(&self) -> &BTreeMap<String, MemoryValue> {
        &self.memory
    }

    /// Build the next snapshot. Only the Scan Context (same crate) and the runner's
    /// mode-transition logic construct these directly; the scan evaluator never mutates
    /// `self`.
    pub(crate) fn advance(
        &self,
        dt: f64,
        tags: BTreeMap<String, Value>,
        memory: BTreeMap<String, MemoryValue>,
    ) -> SystemState {
        SystemState {
            scan_id: self.scan_id + 1,
            timestamp: self.timestamp + dt,
            tags,
            memory,
        }
    }

    /// Used by the runner for Stop/Reboot transitions, which reset `scan_id`/`timestamp`
    /// rather than advancing them (spec.md §4.5).
    pub fn with_reset_clock(tags: BTreeMap<String, Value>) -> SystemState {
        SystemState {
            scan_id: 0,
            timestamp: 0.0,
            tags,
            memory: BTreeMap::new(),
        }
    }
}

use crate::error::HistoryError;
use ladder_context::SystemState;
use ladder_types::Value;
use std::collections::{BTreeMap, VecDeque};

/// Ordered ring buffer of committed snapshots keyed by `scan_id` (spec.md §4.6, component 9).
/// Eviction is FIFO once `history_limit` is reached; `None` means unbounded.
///
/// The playhead is independent of the execution tip: until `seek`/`rewind` is called it
/// tracks the tip automatically (this is the resolution to an ambiguity `spec.md` leaves
/// open -- see DESIGN.md), and once moved it stays wherever the caller left it even as new
/// scans are appended.
pub struct History {
    limit: Option<usize>,
    entries: VecDeque<SystemState>,
    playhead: Option<u64>,
    labels: BTreeMap<String, Vec<u64>>,
}

impl History {
    pub fn new(limit: Option<usize>, seed: SystemState) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(seed);
        History {
            limit,
            entries,
            playhead: None,
            labels: BTreeMap::new(),
        }
    }

    /// Appends a newly committed snapshot at the tip, evicting the oldest entry (and
    /// pruning any labels that named it) once `limit` is exceeded.
    pub fn push(&mut self, state: SystemState) {
        self.entries.push_back(state);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                if let Some(evicted) = self.entries.pop_front() {
                    self.prune_labels_for(evicted.scan_id());
                }
            }
        }
    }

    fn prune_labels_for(&mut self, scan_id: u64) {
        for ids in self.labels.values_mut() {
            ids.retain(|id| *id != scan_id);
        }
        self.labels.retain(|_, ids| !ids.is_empty());
    }

    fn oldest_scan_id(&self) -> Option<u64> {
        self.entries.front().map(SystemState::scan_id)
    }

    fn index_of(&self, scan_id: u64) -> Option<usize> {
        let oldest = self.oldest_scan_id()?;
        if scan_id < oldest {
            return None;
        }
        let idx = (scan_id - oldest) as usize;
        if idx < self.entries.len() && self.entries[idx].scan_id() == scan_id {
            Some(idx)
        } else {
            None
        }
    }

    pub fn latest(&self) -> &SystemState {
        self.entries.back().expect("history always has a seed")
    }

    pub fn at(&self, scan_id: u64) -> Result<&SystemState, HistoryError> {
        self.index_of(scan_id)
            .map(|idx| &self.entries[idx])
            .ok_or(HistoryError::ScanNotFound(scan_id))
    }

    pub fn range(&self, from_scan_id: u64, to_scan_id: u64) -> Vec<&SystemState> {
        self.entries
            .iter()
            .filter(|s| s.scan_id() >= from_scan_id && s.scan_id() <= to_scan_id)
            .collect()
    }

    /// The snapshot at the current playhead (the tip, until `seek`/`rewind` moves it).
    pub fn current(&self) -> &SystemState {
        match self.playhead {
            Some(scan_id) => self.at(scan_id).unwrap_or_else(|_| self.latest()),
            None => self.latest(),
        }
    }

    pub fn seek(&mut self, scan_id: u64) -> Result<(), HistoryError> {
        self.index_of(scan_id).ok_or(HistoryError::ScanNotFound(scan_id))?;
        self.playhead = Some(scan_id);
        Ok(())
    }

    /// Moves the playhead to the newest retained snapshot whose `timestamp` is at least
    /// `seconds` behind the current playhead's timestamp (spec.md §4.6).
    pub fn rewind(&mut self, seconds: f64) {
        let target_timestamp = self.current().timestamp() - seconds;
        let found = self
            .entries
            .iter()
            .rev()
            .find(|s| s.timestamp() <= target_timestamp)
            .or_else(|| self.entries.front())
            .map(SystemState::scan_id);
        if let Some(scan_id) = found {
            self.playhead = Some(scan_id);
        }
    }

    /// `name -> (old, new)` for tags whose values differ between `a` and `b`; a tag present
    /// in only one snapshot compares against `None` (spec.md §4.6). Keys sorted for
    /// determinism (both inputs already key off a `BTreeMap`, so iteration order follows).
    pub fn diff(a: &SystemState, b: &SystemState) -> BTreeMap<String, (Option<Value>, Option<Value>)> {
        let mut out = BTreeMap::new();
        for (name, value) in a.tags() {
            if b.tag(name).as_ref() != Some(value) {
                out.insert(name.clone(), (Some(*value), b.tag(name)));
            }
        }
        for (name, value) in b.tags() {
            if !a.tags().contains_key(name) {
                out.insert(name.clone(), (None, Some(*value)));
            }
        }
        out
    }

    /// A fresh history containing only `scan_id`'s snapshot, for `Runner::fork_from`
    /// (spec.md §4.6: "clean debug/force/pending state and a fresh history").
    pub fn fork_seed(&self, scan_id: u64) -> Result<SystemState, HistoryError> {
        self.at(scan_id).cloned()
    }

    /// Tags `scan_id` with `label`, deduped per scan (spec.md §4.6). No-op if the scan has
    /// been evicted.
    pub fn label(&mut self, scan_id: u64, label: &str) {
        if self.index_of(scan_id).is_none() {
            return;
        }
        let ids = self.labels.entry(label.to_string()).or_default();
        if !ids.contains(&scan_id) {
            ids.push(scan_id);
        }
    }

    pub fn find(&self, label: &str) -> Option<&SystemState> {
        self.labels
            .get(label)
            .and_then(|ids| ids.last())
            .and_then(|id| self.at(*id).ok())
    }

    pub fn find_all(&self, label: &str) -> Vec<&SystemState> {
        self.labels
            .get(label)
            .map(|ids| ids.iter().filter_map(|id| self.at(*id).ok()).collect())
            .unwrap_or_default()
    }
}

use std::collections::BTreeMap;

/// One rung's evaluated power during a debug-stepped scan (spec.md §4.6: "retained
/// rung-trace data").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RungTraceEvent {
    pub rung_id: u64,
    pub power: bool,
}

/// Per-scan rung-trace retention for `Inspect`. Only populated by the debug stepping path
/// (`scan_steps_debug`, spec.md §4.6): `step`/`run`/`run_for`/`run_until` never record here.
#[derive(Default)]
pub struct TraceLog {
    by_scan: BTreeMap<u64, Vec<RungTraceEvent>>,
}

impl TraceLog {
    pub fn new() -> Self {
        TraceLog::default()
    }

    pub fn record(&mut self, scan_id: u64, event: RungTraceEvent) {
        self.by_scan.entry(scan_id).or_default().push(event);
    }

    /// Retained trace for `rung_id` within `scan_id`, if that scan was stepped through the
    /// debug path and the rung evaluated (spec.md §4.6: `Inspect(rung_id, scan_id?)`).
    pub fn inspect(&self, rung_id: u64, scan_id: u64) -> Option<RungTraceEvent> {
        self.by_scan
            .get(&scan_id)
            .and_then(|events| events.iter().find(|e| e.rung_id == rung_id))
            .copied()
    }

    pub fn scan_events(&self, scan_id: u64) -> &[RungTraceEvent] {
        self.by_scan.get(&scan_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.by_scan.clear();
    }
}

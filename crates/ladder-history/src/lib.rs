//! History & Debug Engine (spec.md §4.6, component 9): a bounded, append-only snapshot
//! store with an independent inspection playhead, diff/fork, monitor and predicate-
//! breakpoint dispatch, snapshot labeling, and rung-trace retention for a debug adapter.

mod breakpoint;
mod error;
mod monitor;
mod store;
mod trace;

pub use breakpoint::{BreakpointHandle, BreakpointRegistry, WhenBuilder};
pub use error::HistoryError;
pub use monitor::{MonitorHandle, MonitorRegistry};
pub use store::History;
pub use trace::{RungTraceEvent, TraceLog};

use ladder_context::ContextError;
use ladder_history::HistoryError;
use ladder_instr::InstrError;
use thiserror::Error;

/// Aggregates the lower-layer failures a scan (or an inspection call) can surface, via
/// `#[from]` rather than `anyhow` (`ladder-cli` is the crate that reaches for `anyhow`, at
/// the binary boundary -- see DESIGN.md).
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Instr(#[from] InstrError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    History(#[from] HistoryError),
}

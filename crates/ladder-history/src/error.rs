use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("scan {0} is not in history (evicted or never committed)")]
    ScanNotFound(u64),
}

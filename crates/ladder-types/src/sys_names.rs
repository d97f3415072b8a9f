//! Well-known system-point tag names shared across crates that otherwise have no reason
//! to depend on each other: the Instruction Layer sets these on fault, and the System
//! Points Runtime (spec.md §4.5, §7) owns their per-scan clear policy. Kept here, in the
//! lowest shared layer, rather than in either crate, so neither has to depend on the other
//! just to agree on a string.

/// Set by `Calc` on division by zero (spec.md §4.3.4, §7). Auto-cleared at scan start.
pub const FAULT_DIVISION_ERROR: &str = "fault.division_error";

/// Set by `Calc` when the expression result is non-finite for reasons other than division
/// by zero (spec.md §4.3.4, §7). Latched/fatal: also triggers `Stop` and is not auto-cleared.
pub const FAULT_MATH_OPERATION_ERROR: &str = "fault.math_operation_error";

/// Set by `Copy` (saturating clamp changed the value) and `Calc` (modular wrap changed the
/// value), and by `PackText` when `allow_whitespace` trimmed the input (spec.md §4.3.4,
/// §4.3.5, §8 scenarios 4-5). Auto-cleared at scan start.
pub const FAULT_OUT_OF_RANGE: &str = "fault.out_of_range";

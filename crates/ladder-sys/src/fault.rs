use ladder_context::ScanContext;
use ladder_types::sys_names::{FAULT_DIVISION_ERROR, FAULT_MATH_OPERATION_ERROR, FAULT_OUT_OF_RANGE};
use ladder_types::{TagReader, Value};

/// Two more fault points beyond the three the Instruction Layer already sets directly
/// (spec.md §4.5, §7): `fault.rtc_apply_error` (set by a failed RTC apply command) and the
/// PLC-error pair, which reflect runtime state rather than being derived from instruction
/// faults.
pub const FAULT_RTC_APPLY_ERROR: &str = "fault.rtc_apply_error";
pub const FAULT_PLC_ERROR: &str = "fault.plc_error";
pub const FAULT_ERROR_CODE: &str = "fault.error_code";

/// Per-scan-start clear policy for a fault flag (spec.md §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Cleared in `on_scan_start`, before patch application or logic evaluation -- the
    /// resolution to spec.md §9's open question: visible to every rung in the scan that set
    /// it, cleared only at the next scan's start.
    TransientAutoClear,
    /// Never auto-cleared; observing it set also forces the runner to `Stop`.
    LatchedFatal,
    /// Reflects external/runtime state; `on_scan_start` does not touch it.
    StateReflecting,
}

/// Every fault point this runtime knows the clear policy for, paired with that policy.
pub const FAULT_POLICIES: &[(&str, FaultPolicy)] = &[
    (FAULT_DIVISION_ERROR, FaultPolicy::TransientAutoClear),
    (FAULT_MATH_OPERATION_ERROR, FaultPolicy::LatchedFatal),
    (FAULT_OUT_OF_RANGE, FaultPolicy::TransientAutoClear),
    (FAULT_RTC_APPLY_ERROR, FaultPolicy::TransientAutoClear),
    (FAULT_PLC_ERROR, FaultPolicy::StateReflecting),
    (FAULT_ERROR_CODE, FaultPolicy::StateReflecting),
];

/// Clears every `TransientAutoClear` fault flag. Must run before patches are applied or any
/// rung is evaluated (spec.md §4.5, §9).
pub fn clear_transient_faults(ctx: &mut ScanContext<'_>) {
    for (name, policy) in FAULT_POLICIES {
        if *policy == FaultPolicy::TransientAutoClear {
            ctx.set_tag_internal(name, Value::Bool(false));
        }
    }
}

/// True once `fault.math_operation_error` has latched, which the runner treats as a forced
/// `Stop` (spec.md §4.5, §7).
pub fn is_fatal_latched(reader: &dyn TagReader) -> bool {
    reader
        .read_value(FAULT_MATH_OPERATION_ERROR)
        .map(|v| v.truthy())
        .unwrap_or(false)
}

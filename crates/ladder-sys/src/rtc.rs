use crate::fault::FAULT_RTC_APPLY_ERROR;
use ladder_context::{MemoryValue, ScanContext};
use ladder_types::Value;

/// Engine-private memory key holding the RTC's `timedelta` offset (spec.md §3.3, §4.5).
const RTC_OFFSET_KEY: &str = "_sys.rtc.offset";

/// Command bit: rung logic (or a `patch`) sets this, and the runner applies
/// `rtc.new_epoch_seconds` as an absolute target on the rising edge (spec.md §4.5: "apply
/// date/time are command bits"). Unlike the clock/fault namespace this pair is writable --
/// it is how a program *requests* the apply, not a derived read-only point.
pub const RTC_APPLY_COMMAND: &str = "rtc.apply_command";
/// Staging register holding the absolute target epoch-seconds for the next
/// `rtc.apply_command` rising edge.
pub const RTC_NEW_EPOCH_SECONDS: &str = "rtc.new_epoch_seconds";

/// Reads the controller's current RTC time: `wall_clock_seconds + offset` (spec.md §4.5).
/// `wall_clock_seconds` is supplied by the caller so the runner can drive it from either
/// the real wall clock or a test-controlled one.
pub fn now(ctx: &ScanContext<'_>, wall_clock_seconds: f64) -> f64 {
    let offset = ctx
        .get_memory(RTC_OFFSET_KEY, MemoryValue::Float(0.0))
        .as_float()
        .unwrap_or(0.0);
    wall_clock_seconds + offset
}

/// Applies an "apply date/time" command: `new_*` staging registers are treated as an
/// **absolute** target, not a delta (spec.md §4.5). Rejects non-finite targets, setting
/// `fault.rtc_apply_error` (transient, auto-cleared at the next scan start) and leaving the
/// existing offset untouched.
pub fn apply_date_time(ctx: &mut ScanContext<'_>, target_epoch_seconds: f64, wall_clock_seconds: f64) {
    if !target_epoch_seconds.is_finite() {
        ctx.set_tag_internal(FAULT_RTC_APPLY_ERROR, Value::Bool(true));
        return;
    }
    let offset = target_epoch_seconds - wall_clock_seconds;
    ctx.set_memory(RTC_OFFSET_KEY, MemoryValue::Float(offset));
}

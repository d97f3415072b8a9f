use crate::clock::CLOCKS;
use crate::fault::clear_transient_faults;
use crate::firmware::{FirmwareIdentity, FIRMWARE_IDENTITY, FIRMWARE_PRESENT};
use crate::mode::{SYS_BATTERY_PRESENT, SYS_RUNNING};
use crate::rtc;
use ladder_context::ScanContext;
use ladder_types::Value;

/// Drives the vendor-neutral `sys`/`fault`/`rtc` namespace (spec.md §4.5, component 8).
/// `ladder-runner` calls `on_scan_start` once per scan, before patches are applied or any
/// rung is evaluated, so fault flags set during a scan stay visible to every rung in that
/// scan and clocks reflect the snapshot's `timestamp` at scan entry.
pub struct SystemPointRuntime {
    wall_clock_seconds: fn() -> f64,
}

impl SystemPointRuntime {
    /// `wall_clock_seconds` supplies the time source RTC offsets are measured against; a
    /// test harness can substitute a deterministic clock here instead of the real one.
    pub fn new(wall_clock_seconds: fn() -> f64) -> Self {
        SystemPointRuntime { wall_clock_seconds }
    }

    pub fn on_scan_start(&self, ctx: &mut ScanContext<'_>, running: bool, battery_present: bool) {
        clear_transient_faults(ctx);
        let timestamp = ctx.committed().timestamp();
        for clock in CLOCKS {
            ctx.set_tag_internal(clock.tag_name, Value::Bool(clock.value_at(timestamp)));
        }
        ctx.set_tag_internal(SYS_RUNNING, Value::Bool(running));
        ctx.set_tag_internal(SYS_BATTERY_PRESENT, Value::Bool(battery_present));
        ctx.set_tag_internal(FIRMWARE_PRESENT, Value::Bool(true));
    }

    pub fn rtc_now(&self, ctx: &ScanContext<'_>) -> f64 {
        rtc::now(ctx, (self.wall_clock_seconds)())
    }

    pub fn apply_rtc_date_time(&self, ctx: &mut ScanContext<'_>, target_epoch_seconds: f64) {
        rtc::apply_date_time(ctx, target_epoch_seconds, (self.wall_clock_seconds)());
    }

    /// Static firmware identity for embedders (a debug adapter's UI, a deployed target's
    /// boot banner) -- not representable as a tag value (spec.md §3.1 has no string type).
    pub fn firmware(&self) -> FirmwareIdentity {
        FIRMWARE_IDENTITY
    }
}

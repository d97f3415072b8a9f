/// Mode-bit tag names in the `sys` namespace, reflecting runner lifecycle state (spec.md
/// §4.5) so rung logic can read them like any other system point.
pub const SYS_RUNNING: &str = "sys.running";
pub const SYS_BATTERY_PRESENT: &str = "sys.battery_present";

/// Command bit: unlike `sys.running`/`sys.battery_present`, which only reflect runner state,
/// this one is writable -- rung logic (or an external `patch`) sets it to request a `Stop`,
/// checked at scan end (spec.md §4.5: "via `stop()` or mode-command tag", §5: "also via
/// tag-level stop command, checked at scan end").
pub const SYS_STOP_COMMAND: &str = "sys.stop_command";

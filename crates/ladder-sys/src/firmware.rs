/// Static firmware identity published into the `firmware` namespace every scan (spec.md
/// §4.5: "vendor-neutral namespace of derived and persisted system tags ... firmware
/// identity"). Values are fixed for a given build; nothing here is instruction-settable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareIdentity {
    pub vendor: &'static str,
    pub model: &'static str,
    pub version: &'static str,
}

pub const FIRMWARE_IDENTITY: FirmwareIdentity = FirmwareIdentity {
    vendor: "scanrt",
    model: "scanrt-sim",
    version: env!("CARGO_PKG_VERSION"),
};

/// A `CHAR` tag holds a single octet (spec.md §3.1), so the multi-character vendor/model/
/// version strings above have no tag representation to publish into a scan -- `Tag`'s value
/// space just does not have a string type. Rung logic that needs to branch on firmware
/// identity reads this marker bit instead; the actual strings are reached through
/// `SystemPointRuntime::firmware()` on the Rust side (e.g. for a debug adapter's UI, or a
/// deployed target's boot banner).
pub const FIRMWARE_PRESENT: &str = "firmware.present";

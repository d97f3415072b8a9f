//! System Points Runtime (spec.md §4.5, component 8): a vendor-neutral namespace of
//! derived and persisted system tags -- scan clocks, RTC, fault flags, firmware identity,
//! and mode bits -- populated deterministically once per scan by `ladder-runner`.

mod clock;
mod fault;
mod firmware;
mod mode;
mod points;
mod rtc;

pub use clock::{ScanClock, CLOCKS};
pub use fault::{
    clear_transient_faults, is_fatal_latched, FaultPolicy, FAULT_ERROR_CODE, FAULT_PLC_ERROR,
    FAULT_POLICIES, FAULT_RTC_APPLY_ERROR,
};
pub use firmware::{FirmwareIdentity, FIRMWARE_IDENTITY, FIRMWARE_PRESENT};
pub use mode::{SYS_BATTERY_PRESENT, SYS_RUNNING, SYS_STOP_COMMAND};
pub use points::SystemPointRuntime;
pub use rtc::{apply_date_time, now, RTC_APPLY_COMMAND, RTC_NEW_EPOCH_SECONDS};

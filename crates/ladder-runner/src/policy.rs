//! Write policy for the system-point namespace (spec.md §4.1, §4.5): almost every `sys.*`,
//! `fault.*`, `firmware.*`, and `rtc.*` tag is a derived, read-only point the runner itself
//! populates via `ScanContext::set_tag_internal`. A small, explicitly-named set of command
//! bits/staging registers is the exception -- rung logic and `patch` are allowed to write
//! those to *request* a transition (stop, RTC apply) that the runner carries out.
//!
//! Kept as a zero-sized, `'static` value rather than a borrow of `Runner` itself: a
//! `ScanContext` built with `&RunnerWritePolicy` has no lifetime tie to the `Runner` that
//! builds it, so `step` is free to mutate other `Runner` fields (patches, forces, history)
//! while the context is still open (spec.md §4.1's `WritePolicy` trait exists precisely so
//! this crate does not have to know what a "system point" is).

use ladder_context::WritePolicy;
use ladder_sys::{RTC_APPLY_COMMAND, RTC_NEW_EPOCH_SECONDS, SYS_STOP_COMMAND};

const WRITABLE_COMMANDS: &[&str] = &[SYS_STOP_COMMAND, RTC_APPLY_COMMAND, RTC_NEW_EPOCH_SECONDS];

const RESERVED_PREFIXES: &[&str] = &["sys.", "fault.", "firmware.", "rtc."];

pub fn is_read_only_system_tag(name: &str) -> bool {
    if WRITABLE_COMMANDS.contains(&name) {
        return false;
    }
    RESERVED_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

pub struct RunnerWritePolicy;

impl WritePolicy for RunnerWritePolicy {
    fn is_read_only(&self, tag_name: &str) -> bool {
        is_read_only_system_tag(tag_name)
    }
}

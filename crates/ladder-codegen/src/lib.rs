//! Generated-code ordering plan (spec.md §6.4, supplemented by SPEC_FULL.md §2): a pure
//! function over a built `Program` that assigns a stable, input-order-independent sequence
//! to its subroutines, rungs, and referenced tags, for a downstream code generator to emit
//! declarations against. This crate does not emit target source code, hardware memory
//! layouts, or build-file scaffolding -- those are genuinely out of scope (spec.md §1); it
//! only decides the order generated declarations would appear in.

mod plan;

pub use plan::{plan, CodegenPlan, RungScope, RungSlot};

//! Instruction Layer (spec.md §4.3, component 4): effectful operations -- coils, timers,
//! counters, transfers, packing, search, shift, drums, and the function-call escape
//! hatches. Subroutine call/return, for-loops, and the rung/branch evaluation protocol that
//! drives these in source order live one layer up, in `ladder-program`, since they need the
//! program's subroutine map and execution-item list rather than a single instruction's
//! inputs.

mod block_ops;
mod coils;
mod copy_calc;
mod core;
mod counters;
mod drum;
mod run_function;
mod search;
mod shift;
mod target;
mod timers;

pub use block_ops::{
    BlockCopy, BlockOpError, Fill, PackBits, PackText, PackWords, RangeSource, UnpackToBits,
    UnpackToWords,
};
pub use coils::{Latch, Out, Reset};
pub use copy_calc::{Calc, CalcMode, Copy};
pub use core::{oneshot_clear, oneshot_gate, InstrError, InstrOperand, Instruction, SourceLocation};
pub use counters::{CountDown, CountUp};
pub use drum::{DrumStep, EventDrum, TimeDrum};
pub use run_function::{FunctionCall, FunctionOutputs, RunEnabledFunction, RunFunction};
pub use search::Search;
pub use shift::ShiftRegister;
pub use target::Target;
pub use timers::{OffDelayTimer, OnDelayTimer, TimeUnit};

//! Value & Type Layer (spec.md §3.1–§3.2, §4.1 component 1): tag identity, type
//! classification, default/retentive metadata, and block (array) addressing.

mod block;
mod conv;
pub mod sys_names;
mod tag;
mod value;

pub use block::{Block, BlockError, BlockRange, IndirectBlockRange, IndirectRef, NameFormatter, TagReader};
pub use conv::{
    copy_convert, saturating_i16, saturating_i32, saturating_timer_acc, wrap_i16, wrap_i32,
    wrap_word,
};
pub use tag::{bool_tag, char_tag, dint_tag, int_tag, real_tag, word_tag, Tag, TagKind};
pub use value::{TagType, Value};

//! Dialect layer (spec.md §3.7, §6.3, §6.5): the logical surface of everything spec.md
//! names as a hardware-specific "external collaborator" -- the `TagMap` binding structure,
//! nickname-file validation rules, and the communication instruction contract -- without
//! the hardware bank catalogs, CSV file I/O, or wire protocol implementations that are
//! genuinely out of scope (spec.md §1).

mod comm;
mod nickname;
mod register;
mod tagmap;

pub use comm::{
    CommInstruction, CommPoll, CommRequest, CommStatus, CommTransport, Endpoint, FunctionCode,
};
pub use nickname::{
    accumulator_name, base_from_paired_name, done_bit_name, is_valid_nickname, validate_nickname,
    NicknameError, MAX_NICKNAME_LEN,
};
pub use register::RegisterValue;
pub use tagmap::{SlotOverride, TagMap, TagMapEntry, TagMapError};

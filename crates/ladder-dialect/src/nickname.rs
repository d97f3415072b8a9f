//! Logical surface of the CSV nickname-file round trip (spec.md §6.5): name-length,
//! forbidden-character, and reserved-word validation, plus the documented done-bit/
//! accumulator bank naming convention for paired timer/counter nicknames. No CSV file I/O
//! lives here -- only the validation rules a round-trip layer would need to enforce before
//! writing a name out.

use ladder_types::sys_names::{FAULT_DIVISION_ERROR, FAULT_MATH_OPERATION_ERROR, FAULT_OUT_OF_RANGE};
use thiserror::Error;

pub const MAX_NICKNAME_LEN: usize = 32;

/// Characters a nickname may never contain, beyond the leading-underscore reservation
/// (spec.md §3.3: "any key starting with `_` is engine-private").
const FORBIDDEN_CHARS: &[char] = &[
    ' ', '\t', '\n', ',', '"', '\'', '[', ']', '(', ')', '{', '}', ':', ';', '=',
];

/// Words a nickname may never equal, case-insensitively: the engine's own system-point
/// namespace roots (spec.md §4.5) plus the fault-point names the instruction layer writes
/// to directly, so a user-authored nickname can never shadow one.
const RESERVED_WORDS: &[&str] = &[
    "sys",
    "fault",
    "rtc",
    "firmware",
    FAULT_DIVISION_ERROR,
    FAULT_MATH_OPERATION_ERROR,
    FAULT_OUT_OF_RANGE,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NicknameError {
    #[error("nickname {0:?} is empty")]
    Empty(String),
    #[error("nickname {0:?} exceeds the maximum length of {MAX_NICKNAME_LEN}")]
    TooLong(String),
    #[error("nickname {0:?} begins with '_', which is reserved for engine-private keys")]
    LeadingUnderscore(String),
    #[error("nickname {0:?} contains a forbidden character")]
    ForbiddenChar(String),
    #[error("nickname {0:?} is a reserved word")]
    ReservedWord(String),
}

/// Validates one logical name against spec.md §6.5's documented constraints. Returns every
/// violation found, not just the first, so a caller building a whole symbol file can report
/// all of them in one pass.
pub fn validate_nickname(name: &str) -> Vec<NicknameError> {
    let mut errors = Vec::new();
    if name.is_empty() {
        errors.push(NicknameError::Empty(name.to_string()));
        return errors;
    }
    if name.len() > MAX_NICKNAME_LEN {
        errors.push(NicknameError::TooLong(name.to_string()));
    }
    if name.starts_with('_') {
        errors.push(NicknameError::LeadingUnderscore(name.to_string()));
    }
    if name.chars().any(|c| FORBIDDEN_CHARS.contains(&c)) {
        errors.push(NicknameError::ForbiddenChar(name.to_string()));
    }
    if RESERVED_WORDS.iter().any(|w| w.eq_ignore_ascii_case(name)) {
        errors.push(NicknameError::ReservedWord(name.to_string()));
    }
    errors
}

pub fn is_valid_nickname(name: &str) -> bool {
    validate_nickname(name).is_empty()
}

/// The documented naming convention associating a timer/counter's done-bit nickname with
/// its accumulator nickname (spec.md §6.5): `<base>.done` / `<base>.acc`. Round-trip layers
/// use this to recover the pairing from a flat nickname list without a separate schema.
pub fn done_bit_name(base: &str) -> String {
    format!("{base}.done")
}

pub fn accumulator_name(base: &str) -> String {
    format!("{base}.acc")
}

/// Recovers `base` from a done-bit or accumulator nickname produced by the convention
/// above, or `None` if `name` does not follow it.
pub fn base_from_paired_name(name: &str) -> Option<&str> {
    name.strip_suffix(".done").or_else(|| name.strip_suffix(".acc"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_name() {
        assert_eq!(
            validate_nickname(""),
            vec![NicknameError::Empty(String::new())]
        );
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "a".repeat(MAX_NICKNAME_LEN + 1);
        assert!(validate_nickname(&name).contains(&NicknameError::TooLong(name.clone())));
    }

    #[test]
    fn rejects_leading_underscore() {
        assert!(validate_nickname("_hidden")
            .contains(&NicknameError::LeadingUnderscore("_hidden".to_string())));
    }

    #[test]
    fn rejects_forbidden_characters() {
        assert!(validate_nickname("Motor Start")
            .contains(&NicknameError::ForbiddenChar("Motor Start".to_string())));
    }

    #[test]
    fn rejects_reserved_words_case_insensitively() {
        assert!(validate_nickname("SYS").contains(&NicknameError::ReservedWord("SYS".to_string())));
        assert!(validate_nickname("fault.out_of_range")
            .contains(&NicknameError::ReservedWord("fault.out_of_range".to_string())));
    }

    #[test]
    fn accepts_a_plain_valid_name() {
        assert!(is_valid_nickname("MotorStart"));
    }

    #[test]
    fn paired_naming_convention_round_trips() {
        assert_eq!(done_bit_name("Timer1"), "Timer1.done");
        assert_eq!(accumulator_name("Timer1"), "Timer1.acc");
        assert_eq!(base_from_paired_name("Timer1.done"), Some("Timer1"));
        assert_eq!(base_from_paired_name("Timer1.acc"), Some("Timer1"));
        assert_eq!(base_from_paired_name("Timer1"), None);
    }
}

//! Numeric conversion rules shared by `Copy`/`Calc`/pack-unpack instructions
//! (spec.md §4.3.4, §4.3.5, §8 property 6). Two distinct policies exist and must never be
//! conflated: `Copy` **saturates** narrowing numeric stores; `Calc` **wraps** modularly.

use crate::value::{TagType, Value};

/// Clamp `raw` into `i16` range (`Copy` narrowing into INT — spec.md §4.3.4, §8 property 6).
pub fn saturating_i16(raw: f64) -> i16 {
    if raw.is_nan() {
        0
    } else if raw >= i16::MAX as f64 {
        i16::MAX
    } else if raw <= i16::MIN as f64 {
        i16::MIN
    } else {
        raw as i16
    }
}

/// Clamp `raw` into `i32` range (`Copy` narrowing into DINT, and counter/timer accumulator
/// saturation — spec.md §4.3.2, §4.3.3).
pub fn saturating_i32(raw: f64) -> i32 {
    if raw.is_nan() {
        0
    } else if raw >= i32::MAX as f64 {
        i32::MAX
    } else if raw <= i32::MIN as f64 {
        i32::MIN
    } else {
        raw as i32
    }
}

/// Clamp an already-integral accumulator to the documented timer ceiling (spec.md §4.3.2:
/// "all accumulators saturate (clamp to 32767); no wrap").
pub fn saturating_timer_acc(raw: i32) -> i16 {
    raw.clamp(0, 32767) as i16
}

/// Modular wrap into `i16` (`Calc` store — spec.md §4.3.4, §8 property 6). Two's-complement
/// truncation, matching documented Click-style math-overflow semantics.
pub fn wrap_i16(raw: i64) -> i16 {
    raw as i16
}

/// Modular wrap into `i32` (`Calc` store for DINT destinations).
pub fn wrap_i32(raw: i64) -> i32 {
    raw as i32
}

/// `WORD` stores always mask `& 0xFFFF` regardless of source instruction (spec.md §8
/// property 6).
pub fn wrap_word(raw: i64) -> u16 {
    (raw & 0xFFFF) as u16
}

/// `Copy`-family conversion into a destination type (spec.md §4.3.4): saturating narrow for
/// INT/DINT, masking wrap for WORD, truthiness for BOOL, widen for REAL. CHAR destinations
/// are not numeric and are handled by the instruction layer directly.
pub fn copy_convert(source: Value, dest_ty: TagType) -> Option<Value> {
    match dest_ty {
        TagType::Bool => Some(Value::Bool(source.truthy())),
        TagType::Real => source.as_f64().map(|f| Value::Real(f as f32)),
        TagType::Int => source.as_f64().map(|f| Value::Int(saturating_i16(f))),
        TagType::Dint => source.as_f64().map(|f| Value::Dint(saturating_i32(f))),
        TagType::Word => source.as_f64().map(|f| Value::Word(wrap_word(f as i64))),
        TagType::Char => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_saturates_into_int() {
        // scenario 4 in spec.md §8: DS1 = 32767; Copy(40000, DS1) => clamp to 32767.
        assert_eq!(saturating_i16(40000.0), i16::MAX);
    }

    #[test]
    fn calc_wraps_into_int() {
        // scenario 5 in spec.md §8: DS1 = 32767; Calc(DS1 + 1) => -32768 (wrap).
        assert_eq!(wrap_i16(32768), -32768);
    }

    #[test]
    fn word_always_masks() {
        assert_eq!(wrap_word(-1), 0xFFFF);
        assert_eq!(wrap_word(0x1_0001), 1);
    }
}

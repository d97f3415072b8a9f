//! Value conversions for the communication instruction contract (spec.md §6.3): "coils ->
//! bool; registers -> unsigned 16-bit words."

use ladder_types::{TagType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterValue {
    Coil(bool),
    Word(u16),
}

impl RegisterValue {
    pub fn to_value(self, dest_ty: TagType) -> Value {
        match (self, dest_ty) {
            (RegisterValue::Coil(b), _) => Value::Bool(b),
            (RegisterValue::Word(w), TagType::Bool) => Value::Bool(w != 0),
            (RegisterValue::Word(w), TagType::Int) => Value::Int(w as i16),
            (RegisterValue::Word(w), TagType::Dint) => Value::Dint(w as i32),
            (RegisterValue::Word(w), TagType::Real) => Value::Real(w as f32),
            (RegisterValue::Word(w), TagType::Word) => Value::Word(w),
            (RegisterValue::Word(w), TagType::Char) => Value::Char(Some((w & 0xFF) as u8)),
        }
    }

    pub fn from_value(value: Value) -> RegisterValue {
        match value {
            Value::Bool(b) => RegisterValue::Coil(b),
            Value::Int(i) => RegisterValue::Word(i as u16),
            Value::Dint(i) => RegisterValue::Word((i & 0xFFFF) as u16),
            Value::Real(r) => RegisterValue::Word(r as i64 as u16),
            Value::Word(w) => RegisterValue::Word(w),
            Value::Char(Some(c)) => RegisterValue::Word(c as u16),
            Value::Char(None) => RegisterValue::Word(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coil_register_converts_to_bool_regardless_of_destination() {
        assert_eq!(RegisterValue::Coil(true).to_value(TagType::Word), Value::Bool(true));
    }

    #[test]
    fn word_register_widens_per_destination_type() {
        assert_eq!(RegisterValue::Word(5).to_value(TagType::Int), Value::Int(5));
        assert_eq!(RegisterValue::Word(5).to_value(TagType::Real), Value::Real(5.0));
    }

    #[test]
    fn from_value_masks_dint_into_a_word() {
        assert_eq!(RegisterValue::from_value(Value::Dint(0x1_0001)), RegisterValue::Word(1));
    }
}

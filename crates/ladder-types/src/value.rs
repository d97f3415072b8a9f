use std::fmt;

/// The five primitive tag types plus `CHAR`, matching `spec.md` §3.1's type set exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagType {
    Bool,
    Int,
    Dint,
    Real,
    Word,
    Char,
}

impl TagType {
    /// Per-type default value used when a `Tag` does not declare an explicit default.
    pub fn default_value(self) -> Value {
        match self {
            TagType::Bool => Value::Bool(false),
            TagType::Int => Value::Int(0),
            TagType::Dint => Value::Dint(0),
            TagType::Real => Value::Real(0.0),
            TagType::Word => Value::Word(0),
            TagType::Char => Value::Char(None),
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TagType::Bool => "BOOL",
            TagType::Int => "INT",
            TagType::Dint => "DINT",
            TagType::Real => "REAL",
            TagType::Word => "WORD",
            TagType::Char => "CHAR",
        };
        f.write_str(s)
    }
}

/// A runtime value. `Char(None)` represents the empty CHAR value permitted by `spec.md` §3.1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i16),
    Dint(i32),
    Real(f32),
    Word(u16),
    Char(Option<u8>),
}

impl Value {
    pub fn ty(&self) -> TagType {
        match self {
            Value::Bool(_) => TagType::Bool,
            Value::Int(_) => TagType::Int,
            Value::Dint(_) => TagType::Dint,
            Value::Real(_) => TagType::Real,
            Value::Word(_) => TagType::Word,
            Value::Char(_) => TagType::Char,
        }
    }

    /// Boolean-truthy evaluation used by `Condition::Direct`/`IntTruthy` (spec.md §3.5, §4.2):
    /// an integer (or any numeric) tag in a boolean position is `value != 0`.
    pub fn truthy(&self) -> bool {
        match *self {
            Value::Bool(b) => b,
            Value::Int(i) => i != 0,
            Value::Dint(i) => i != 0,
            Value::Real(r) => r != 0.0,
            Value::Word(w) => w != 0,
            Value::Char(c) => c.is_some(),
        }
    }

    /// Widen to `f64` for expression arithmetic and cross-type comparison (spec.md §3.4, §4.2).
    /// `CHAR` has no numeric reading and returns `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(i as f64),
            Value::Dint(i) => Some(i as f64),
            Value::Real(r) => Some(r as f64),
            Value::Word(w) => Some(w as f64),
            Value::Char(_) => None,
        }
    }

    /// Partial comparison per spec.md §4.2: "mismatched types compare false rather than
    /// faulting." Numeric types compare by widened value; `BOOL` compares to `BOOL` only
    /// (truthiness is not implied here — that is `Condition`'s job); `CHAR` compares to `CHAR`.
    pub fn compare(&self, other: &Value) -> Option<std::cmp::Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Dint(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Word(w) => write!(f, "{w}"),
            Value::Char(Some(c)) => write!(f, "{}", *c as char),
            Value::Char(None) => write!(f, ""),
        }
    }
}

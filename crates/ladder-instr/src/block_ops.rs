//! Block operations (spec.md §4.3.5): element-wise copy/fill over `BlockRange`s, and the
//! bit/word packing family used to reinterpret a run of BOOL/CHAR tags as one wider numeric
//! value and back.

use crate::core::{InstrError, InstrOperand};
use ladder_cond::Operand;
use ladder_context::ScanContext;
use ladder_types::sys_names::FAULT_OUT_OF_RANGE;
use ladder_types::{copy_convert, BlockRange, IndirectBlockRange, TagType, TagReader, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BlockOpError {
    #[error("block copy length mismatch: source has {source}, dest has {dest}")]
    LengthMismatch { source: usize, dest: usize },
    #[error("pack/unpack width overflow: {0} bits exceeds destination width")]
    WidthOverflow(usize),
}

impl From<BlockOpError> for InstrError {
    fn from(e: BlockOpError) -> Self {
        InstrError::SizeMismatch(e.to_string())
    }
}

/// A block-range operand that is either already resolved, or an `IndirectBlockRange`
/// resolved fresh on every execution (spec.md §3.2: "resolves its start/end from tag
/// values at evaluation time").
pub enum RangeSource {
    Static(BlockRange),
    Indirect(IndirectBlockRange),
}

impl RangeSource {
    fn resolve(&self, ctx: &dyn TagReader) -> Result<BlockRange, InstrError> {
        match self {
            RangeSource::Static(r) => Ok(r.clone()),
            RangeSource::Indirect(r) => Ok(r.resolve(ctx)?),
        }
    }
}

impl From<BlockRange> for RangeSource {
    fn from(r: BlockRange) -> Self {
        RangeSource::Static(r)
    }
}

impl From<IndirectBlockRange> for RangeSource {
    fn from(r: IndirectBlockRange) -> Self {
        RangeSource::Indirect(r)
    }
}

impl RangeSource {
    fn describe(&self, label: &'static str) -> InstrOperand {
        match self {
            RangeSource::Static(r) => InstrOperand::BlockRange(label.into(), r.clone()),
            RangeSource::Indirect(r) => InstrOperand::IndirectBlockRange(label.into(), r.clone()),
        }
    }
}

/// `BlockCopy(source_range, dest_range)` (spec.md §4.3.5): lengths must match (checked at
/// every execution, since an indirect range's length can change scan to scan); each element
/// is converted per `Copy`'s destination-type conversion rules.
pub struct BlockCopy {
    source: RangeSource,
    dest: RangeSource,
}

impl BlockCopy {
    pub fn new(source: impl Into<RangeSource>, dest: impl Into<RangeSource>) -> Self {
        BlockCopy {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

impl crate::core::Instruction for BlockCopy {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let source = self.source.resolve(ctx)?;
        let dest = self.dest.resolve(ctx)?;
        if source.len() != dest.len() {
            return Err(BlockOpError::LengthMismatch {
                source: source.len(),
                dest: dest.len(),
            }
            .into());
        }
        for (src, dst) in source.tags().iter().zip(dest.tags().iter()) {
            let raw = ctx.get_tag(src.name(), src.default());
            let value = copy_convert(raw, dst.ty()).unwrap_or_else(|| dst.default());
            ctx.set_tag(dst.name(), value)?;
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![self.source.describe("source"), self.dest.describe("dest")]
    }
}

/// `Fill(value, dest_range)` (spec.md §4.3.5): resolve `value` once, write the converted
/// value to every element of `dest`.
pub struct Fill {
    value: Operand,
    dest: RangeSource,
}

impl Fill {
    pub fn new(value: Operand, dest: impl Into<RangeSource>) -> Self {
        Fill {
            value,
            dest: dest.into(),
        }
    }
}

impl crate::core::Instruction for Fill {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let raw = self.value.evaluate(ctx)?;
        let dest = self.dest.resolve(ctx)?;
        for dst in dest.tags() {
            let converted = copy_convert(raw, dst.ty()).unwrap_or_else(|| dst.default());
            ctx.set_tag(dst.name(), converted)?;
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Operand("value".into(), self.value.clone()),
            self.dest.describe("dest"),
        ]
    }
}

fn bool_bits(ctx: &ScanContext<'_>, bits: &BlockRange) -> u32 {
    let mut acc: u32 = 0;
    for (i, tag) in bits.tags().iter().enumerate() {
        if ctx.get_tag(tag.name(), tag.default()).truthy() {
            acc |= 1 << i;
        }
    }
    acc
}

fn max_width(ty: TagType) -> usize {
    match ty {
        TagType::Dint | TagType::Real => 32,
        _ => 16,
    }
}

/// `PackBits(bit_block, dest)` (spec.md §4.3.5): LSB <- first tag; width limited to 16 bits
/// for INT/WORD destinations, 32 for DINT/REAL; REAL stores via IEEE-754 bit
/// reinterpretation.
pub struct PackBits {
    bits: BlockRange,
    dest: String,
    dest_ty: TagType,
}

impl PackBits {
    pub fn new(bits: BlockRange, dest: impl Into<String>, dest_ty: TagType) -> Result<Self, BlockOpError> {
        if !matches!(dest_ty, TagType::Int | TagType::Word | TagType::Dint | TagType::Real) {
            return Err(BlockOpError::WidthOverflow(bits.len()));
        }
        let width = max_width(dest_ty);
        if bits.len() > width {
            return Err(BlockOpError::WidthOverflow(bits.len()));
        }
        Ok(PackBits {
            bits,
            dest: dest.into(),
            dest_ty,
        })
    }
}

impl crate::core::Instruction for PackBits {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let bits = bool_bits(ctx, &self.bits);
        let value = match self.dest_ty {
            TagType::Int => Value::Int(bits as u16 as i16),
            TagType::Word => Value::Word(bits as u16),
            TagType::Dint => Value::Dint(bits as i32),
            TagType::Real => Value::Real(f32::from_bits(bits)),
            _ => unreachable!("validated at construction"),
        };
        ctx.set_tag(&self.dest, value)?;
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::BlockRange("bits".into(), self.bits.clone()),
            InstrOperand::Tag("dest".into(), Arc::from(self.dest.as_str())),
        ]
    }
}

/// `PackWords(two-word block, dest)` (spec.md §4.3.5): low-word-first
/// (`(hi << 16) | (lo & 0xFFFF)`); `dest` must be DINT or REAL.
pub struct PackWords {
    words: [String; 2],
    dest: String,
    dest_ty: TagType,
}

impl PackWords {
    pub fn new(lo: impl Into<String>, hi: impl Into<String>, dest: impl Into<String>, dest_ty: TagType) -> Result<Self, BlockOpError> {
        if !matches!(dest_ty, TagType::Dint | TagType::Real) {
            return Err(BlockOpError::WidthOverflow(32));
        }
        Ok(PackWords {
            words: [lo.into(), hi.into()],
            dest: dest.into(),
            dest_ty,
        })
    }
}

impl crate::core::Instruction for PackWords {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let lo = as_u16(ctx.get_tag(&self.words[0], Value::Word(0)));
        let hi = as_u16(ctx.get_tag(&self.words[1], Value::Word(0)));
        let combined: u32 = ((hi as u32) << 16) | (lo as u32 & 0xFFFF);
        let value = match self.dest_ty {
            TagType::Dint => Value::Dint(combined as i32),
            TagType::Real => Value::Real(f32::from_bits(combined)),
            _ => unreachable!("validated at construction"),
        };
        ctx.set_tag(&self.dest, value)?;
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Tag("lo".into(), Arc::from(self.words[0].as_str())),
            InstrOperand::Tag("hi".into(), Arc::from(self.words[1].as_str())),
            InstrOperand::Tag("dest".into(), Arc::from(self.dest.as_str())),
        ]
    }
}

fn as_u16(v: Value) -> u16 {
    match v {
        Value::Word(w) => w,
        Value::Int(i) => i as u16,
        other => other.as_f64().unwrap_or(0.0) as i64 as u16,
    }
}

/// `UnpackToBits(source, bit_block)`: inverse of `PackBits` (spec.md §4.3.5).
pub struct UnpackToBits {
    source: String,
    bits: BlockRange,
}

impl UnpackToBits {
    pub fn new(source: impl Into<String>, bits: BlockRange) -> Self {
        UnpackToBits {
            source: source.into(),
            bits,
        }
    }
}

impl crate::core::Instruction for UnpackToBits {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let raw = raw_bits(ctx.get_tag(&self.source, Value::Dint(0)));
        for (i, tag) in self.bits.tags().iter().enumerate() {
            let bit = (raw >> i) & 1 != 0;
            ctx.set_tag(tag.name(), Value::Bool(bit))?;
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Tag("source".into(), Arc::from(self.source.as_str())),
            InstrOperand::BlockRange("bits".into(), self.bits.clone()),
        ]
    }
}

fn raw_bits(v: Value) -> u32 {
    match v {
        Value::Int(i) => i as u16 as u32,
        Value::Word(w) => w as u32,
        Value::Dint(i) => i as u32,
        Value::Real(r) => r.to_bits(),
        other => other.as_f64().unwrap_or(0.0) as i64 as u32,
    }
}

/// `UnpackToWords(source, lo, hi)`: inverse of `PackWords` (spec.md §4.3.5).
pub struct UnpackToWords {
    source: String,
    words: [String; 2],
}

impl UnpackToWords {
    pub fn new(source: impl Into<String>, lo: impl Into<String>, hi: impl Into<String>) -> Self {
        UnpackToWords {
            source: source.into(),
            words: [lo.into(), hi.into()],
        }
    }
}

impl crate::core::Instruction for UnpackToWords {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let raw = raw_bits(ctx.get_tag(&self.source, Value::Dint(0)));
        ctx.set_tag(&self.words[0], Value::Word((raw & 0xFFFF) as u16))?;
        ctx.set_tag(&self.words[1], Value::Word((raw >> 16) as u16))?;
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Tag("source".into(), Arc::from(self.source.as_str())),
            InstrOperand::Tag("lo".into(), Arc::from(self.words[0].as_str())),
            InstrOperand::Tag("hi".into(), Arc::from(self.words[1].as_str())),
        ]
    }
}

/// `PackText(char_range, numeric_dest)` (spec.md §4.3.5): parses the concatenated text of a
/// CHAR range per the destination type (signed decimal for INT/DINT, hex for WORD, float
/// for REAL). `allow_whitespace` trims the edges and flags `fault.out_of_range` if trimming
/// occurred; invalid input sets the fault and performs no partial write.
pub struct PackText {
    chars: BlockRange,
    dest: String,
    dest_ty: TagType,
    allow_whitespace: bool,
}

impl PackText {
    pub fn new(chars: BlockRange, dest: impl Into<String>, dest_ty: TagType, allow_whitespace: bool) -> Self {
        PackText {
            chars,
            dest: dest.into(),
            dest_ty,
            allow_whitespace,
        }
    }
}

impl crate::core::Instruction for PackText {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            return Ok(());
        }
        let mut text = String::new();
        for tag in self.chars.tags() {
            if let Value::Char(Some(c)) = ctx.get_tag(tag.name(), tag.default()) {
                text.push(c as char);
            }
        }
        let trimmed = text.trim();
        let trimming_occurred = self.allow_whitespace && trimmed != text;
        let parse_input = if self.allow_whitespace { trimmed } else { text.as_str() };

        let parsed = match self.dest_ty {
            TagType::Int => parse_input.parse::<i16>().ok().map(Value::Int),
            TagType::Dint => parse_input.parse::<i32>().ok().map(Value::Dint),
            TagType::Word => u16::from_str_radix(parse_input.trim_start_matches("0x"), 16)
                .ok()
                .map(Value::Word),
            TagType::Real => parse_input.parse::<f32>().ok().map(Value::Real),
            _ => None,
        };

        match parsed {
            Some(value) => {
                ctx.set_tag(&self.dest, value)?;
                if trimming_occurred {
                    ctx.set_tag_internal(FAULT_OUT_OF_RANGE, Value::Bool(true));
                }
            }
            None => {
                ctx.set_tag_internal(FAULT_OUT_OF_RANGE, Value::Bool(true));
            }
        }
        Ok(())
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::BlockRange("chars".into(), self.chars.clone()),
            InstrOperand::Tag("dest".into(), Arc::from(self.dest.as_str())),
        ]
    }
}

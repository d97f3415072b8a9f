use crate::tag::Tag;
use crate::value::{TagType, Value};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("address out of range")]
    AddressOutOfRange,
    #[error("block range requires start <= end")]
    InvalidRange,
    #[error("block index not in sparse-allowed set")]
    NotSparseAllowed,
}

/// Minimal read capability needed to resolve indirect references and indirect ranges
/// (spec.md §3.2) without this crate depending on the Scan Context crate. `ladder-context`
/// implements this for its `ScanContext`.
pub trait TagReader {
    fn read_value(&self, tag_name: &str) -> Option<Value>;
}

/// Per-block tag-name formatter (spec.md §3.2: "Name3", "X001"). Stored as a function
/// pointer/closure so callers can supply arbitrary external naming conventions.
#[derive(Clone)]
pub struct NameFormatter(Arc<dyn Fn(&str, u32) -> String + Send + Sync>);

impl NameFormatter {
    pub fn new(f: impl Fn(&str, u32) -> String + Send + Sync + 'static) -> Self {
        NameFormatter(Arc::new(f))
    }

    /// `Name3`, `Name4`, ... — base name concatenated with the decimal index.
    pub fn decimal_suffix() -> Self {
        NameFormatter::new(|base, idx| format!("{base}{idx}"))
    }

    /// `X001`, `X002`, ... — base name concatenated with a zero-padded index.
    pub fn zero_padded(width: usize) -> Self {
        NameFormatter::new(move |base, idx| format!("{base}{idx:0width$}"))
    }

    pub fn format(&self, base: &str, index: u32) -> String {
        (self.0)(base, index)
    }
}

impl std::fmt::Debug for NameFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NameFormatter(..)")
    }
}

/// An indexed collection of tags of one type, 1-based, with an optional sparse-segment set
/// restricting valid indices (spec.md §3.2).
#[derive(Debug, Clone)]
pub struct Block {
    base_name: Arc<str>,
    ty: TagType,
    start: u32,
    end: u32,
    retentive: bool,
    sparse: Option<BTreeSet<u32>>,
    formatter: NameFormatter,
}

impl Block {
    pub fn new(base_name: impl Into<Arc<str>>, ty: TagType, start: u32, end: u32) -> Self {
        assert!(start >= 1, "block indices are 1-based");
        assert!(start <= end, "block requires start <= end");
        Block {
            base_name: base_name.into(),
            ty,
            start,
            end,
            retentive: false,
            sparse: None,
            formatter: NameFormatter::decimal_suffix(),
        }
    }

    pub fn retentive(mut self, retentive: bool) -> Self {
        self.retentive = retentive;
        self
    }

    pub fn sparse(mut self, allowed: impl IntoIterator<Item = u32>) -> Self {
        self.sparse = Some(allowed.into_iter().collect());
        self
    }

    pub fn formatter(mut self, formatter: NameFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn ty(&self) -> TagType {
        self.ty
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn contains(&self, index: u32) -> bool {
        if index < self.start || index > self.end {
            return false;
        }
        match &self.sparse {
            Some(allowed) => allowed.contains(&index),
            None => true,
        }
    }

    /// Materialize the logical `Tag` for one index, deterministically named.
    pub fn tag_at(&self, index: u32) -> Result<Tag, BlockError> {
        if index < self.start || index > self.end {
            return Err(BlockError::AddressOutOfRange);
        }
        if let Some(allowed) = &self.sparse {
            if !allowed.contains(&index) {
                return Err(BlockError::NotSparseAllowed);
            }
        }
        let name = self.formatter.format(&self.base_name, index);
        Ok(Tag::new(name, self.ty).retentive(self.retentive))
    }

    /// `select(a, b)` (inclusive) — spec.md §3.2.
    pub fn select(&self, a: u32, b: u32) -> Result<BlockRange, BlockError> {
        if a > b {
            return Err(BlockError::InvalidRange);
        }
        let mut tags = Vec::with_capacity((b - a + 1) as usize);
        for idx in a..=b {
            tags.push(self.tag_at(idx)?);
        }
        Ok(BlockRange { tags })
    }

    pub fn select_all(&self) -> BlockRange {
        self.select(self.start, self.end)
            .expect("block's own start..=end is always valid")
    }
}

/// An ordered, finite sequence of tags produced by `Block::select` (spec.md §3.2).
#[derive(Debug, Clone, Default)]
pub struct BlockRange {
    tags: Vec<Tag>,
}

impl BlockRange {
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A block-slice whose start/end are resolved from tag values at evaluation time
/// (spec.md §3.2). Resolution still enforces `start <= end`.
#[derive(Debug, Clone)]
pub struct IndirectBlockRange {
    block: Block,
    start_tag: Arc<str>,
    end_tag: Arc<str>,
}

impl IndirectBlockRange {
    pub fn new(block: Block, start_tag: impl Into<Arc<str>>, end_tag: impl Into<Arc<str>>) -> Self {
        IndirectBlockRange {
            block,
            start_tag: start_tag.into(),
            end_tag: end_tag.into(),
        }
    }

    pub fn resolve(&self, reader: &dyn TagReader) -> Result<BlockRange, BlockError> {
        let start = resolve_index(reader, &self.start_tag)?;
        let end = resolve_index(reader, &self.end_tag)?;
        if start > end {
            return Err(BlockError::InvalidRange);
        }
        self.block.select(start, end)
    }
}

/// `Block[pointer]` — resolves its index from a pointer tag's current value at evaluation
/// time; raises `AddressOutOfRange` when the resolved index is invalid (spec.md §3.2).
#[derive(Debug, Clone)]
pub struct IndirectRef {
    block: Block,
    pointer_tag: Arc<str>,
}

impl IndirectRef {
    pub fn new(block: Block, pointer_tag: impl Into<Arc<str>>) -> Self {
        IndirectRef {
            block,
            pointer_tag: pointer_tag.into(),
        }
    }

    pub fn pointer_tag(&self) -> &str {
        &self.pointer_tag
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn resolve(&self, reader: &dyn TagReader) -> Result<Tag, BlockError> {
        let index = resolve_index(reader, &self.pointer_tag)?;
        self.block.tag_at(index)
    }
}

fn resolve_index(reader: &dyn TagReader, pointer_tag: &str) -> Result<u32, BlockError> {
    let value = reader
        .read_value(pointer_tag)
        .ok_or(BlockError::AddressOutOfRange)?;
    let raw = value.as_f64().ok_or(BlockError::AddressOutOfRange)?;
    if raw < 0.0 || raw > u32::MAX as f64 {
        return Err(BlockError::AddressOutOfRange);
    }
    Ok(raw as u32)
}

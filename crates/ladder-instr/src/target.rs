//! A coil/copy/calc/fill destination: one tag, or a block range over which the same write
//! is propagated element-wise (spec.md §4.3.1: "propagate to a block range").

use crate::core::InstrError;
use ladder_context::ScanContext;
use ladder_types::{BlockRange, TagReader, TagType, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Target {
    Tag(Arc<str>),
    Block(BlockRange),
}

impl Target {
    pub fn tag(name: impl Into<Arc<str>>) -> Self {
        Target::Tag(name.into())
    }

    pub fn block(range: BlockRange) -> Self {
        Target::Block(range)
    }

    /// The declared type of the target, used to compute per-type defaults. All tags in a
    /// block target share one type (spec.md §3.2), so the first element is representative.
    pub fn ty(&self, ctx: &ScanContext<'_>) -> Option<TagType> {
        match self {
            Target::Tag(name) => ctx.read_value(name).map(|v| v.ty()),
            Target::Block(range) => range.tags().first().map(|t| t.ty()),
        }
    }

    fn names<'a>(&'a self) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self {
            Target::Tag(name) => Box::new(std::iter::once(name.as_ref())),
            Target::Block(range) => Box::new(range.tags().iter().map(|t| t.name())),
        }
    }

    /// Writes `f(type_default)` to every tag in the target, resolving each tag's own type
    /// default independently (so a heterogeneous-looking target still gets type-correct
    /// values -- in practice all tags in one `Target` share a type per spec.md §3.2).
    pub fn write_each(
        &self,
        ctx: &mut ScanContext<'_>,
        f: impl Fn(TagType) -> Value,
    ) -> Result<(), InstrError> {
        let names: Vec<String> = self.names().map(|s| s.to_string()).collect();
        for name in names {
            let ty = ctx.read_value(&name).map(|v| v.ty()).unwrap_or(TagType::Bool);
            ctx.set_tag(&name, f(ty))?;
        }
        Ok(())
    }

    /// Writes one already-converted `value` to every tag in the target.
    pub fn write_value(&self, ctx: &mut ScanContext<'_>, value: Value) -> Result<(), InstrError> {
        let names: Vec<String> = self.names().map(|s| s.to_string()).collect();
        for name in names {
            ctx.set_tag(&name, value)?;
        }
        Ok(())
    }
}

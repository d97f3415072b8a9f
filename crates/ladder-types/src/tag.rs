use crate::value::{TagType, Value};
use std::sync::Arc;

/// Whether a tag is a plain logical tag or one of the hardware-facing variants from
/// spec.md §3.1. `immediate` mirrors the "logical request to bypass the scan-boundary I/O
/// phase" capability; this crate only models the request flag, not the I/O phase itself
/// (that lives with whatever external collaborator owns physical I/O).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Standalone,
    Input { immediate: bool },
    Output { immediate: bool },
}

impl TagKind {
    pub fn is_immediate(self) -> bool {
        matches!(
            self,
            TagKind::Input { immediate: true } | TagKind::Output { immediate: true }
        )
    }
}

/// A named, immutable, typed handle (spec.md §3.1). `Tag` carries no value; values live in
/// snapshots. Two tags with the same `name` are the same tag, so `Tag` is cheap to clone
/// (an `Arc<str>` name) and compares by name.
#[derive(Debug, Clone)]
pub struct Tag {
    name: Arc<str>,
    ty: TagType,
    default: Value,
    retentive: bool,
    kind: TagKind,
}

impl Tag {
    pub fn new(name: impl Into<Arc<str>>, ty: TagType) -> Self {
        Tag {
            name: name.into(),
            ty,
            default: ty.default_value(),
            retentive: false,
            kind: TagKind::Standalone,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        assert_eq!(
            default.ty(),
            self.ty,
            "default value type must match tag type"
        );
        self.default = default;
        self
    }

    pub fn retentive(mut self, retentive: bool) -> Self {
        self.retentive = retentive;
        self
    }

    pub fn kind(mut self, kind: TagKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> TagType {
        self.ty
    }

    pub fn default(&self) -> Value {
        self.default
    }

    pub fn is_retentive(&self) -> bool {
        self.retentive
    }

    pub fn tag_kind(&self) -> TagKind {
        self.kind
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Tag {}

impl std::hash::Hash for Tag {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Tag factory functions named after the IEC types, matching spec.md §6.1's authoring
/// surface (`Bool`, `Int`, `Dint`, `Real`, `Word`, `Char`).
pub fn bool_tag(name: impl Into<Arc<str>>) -> Tag {
    Tag::new(name, TagType::Bool)
}
pub fn int_tag(name: impl Into<Arc<str>>) -> Tag {
    Tag::new(name, TagType::Int)
}
pub fn dint_tag(name: impl Into<Arc<str>>) -> Tag {
    Tag::new(name, TagType::Dint)
}
pub fn real_tag(name: impl Into<Arc<str>>) -> Tag {
    Tag::new(name, TagType::Real)
}
pub fn word_tag(name: impl Into<Arc<str>>) -> Tag {
    Tag::new(name, TagType::Word)
}
pub fn char_tag(name: impl Into<Arc<str>>) -> Tag {
    Tag::new(name, TagType::Char)
}

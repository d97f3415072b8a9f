//! Logical-to-hardware binding (spec.md §3.7, §6.5): standalone `Tag <-> Tag` and
//! block-slice `Block <-> BlockRange` entries, with per-slot metadata overrides (name,
//! default, retentive) that never mutate the logical `Tag`/`Block` they describe.
//!
//! This is the in-memory surface only. Hardware memory-bank catalogs, slot/module models,
//! and the CSV nickname-file round trip are genuinely out of scope (spec.md §1); what is
//! specified -- the binding structure and its failure modes -- is built out here.

use ladder_types::{BlockRange, Tag, TagType, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagMapError {
    #[error("type mismatch: logical {logical:?} is {logical_ty}, hardware {hardware:?} is {hardware_ty}")]
    TypeMismatch {
        logical: String,
        logical_ty: TagType,
        hardware: String,
        hardware_ty: TagType,
    },
    #[error("size mismatch: logical range has {logical_len} tags, hardware range has {hardware_len}")]
    SizeMismatch {
        logical_len: usize,
        hardware_len: usize,
    },
    #[error("hardware window overlap: {0:?} is bound by more than one entry")]
    OverlappingWindow(String),
    #[error("logical name collision after override: {0:?}")]
    NameCollision(String),
}

/// Per-slot metadata overrides (spec.md §3.7): each field, when `Some`, replaces the
/// logical tag's own metadata for purposes of this mapping only -- the logical `Tag` itself
/// is never touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotOverride {
    pub name: Option<String>,
    pub default: Option<Value>,
    pub retentive: Option<bool>,
}

impl SlotOverride {
    pub fn none() -> Self {
        SlotOverride::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_retentive(mut self, retentive: bool) -> Self {
        self.retentive = Some(retentive);
        self
    }
}

/// One binding entry (spec.md §3.7).
#[derive(Debug, Clone)]
pub enum TagMapEntry {
    Standalone {
        logical: Tag,
        hardware: Tag,
        slot: SlotOverride,
    },
    BlockSlice {
        logical: BlockRange,
        hardware: BlockRange,
        slot: SlotOverride,
    },
}

impl TagMapEntry {
    pub fn standalone(logical: Tag, hardware: Tag) -> Self {
        TagMapEntry::Standalone {
            logical,
            hardware,
            slot: SlotOverride::none(),
        }
    }

    pub fn standalone_with(logical: Tag, hardware: Tag, slot: SlotOverride) -> Self {
        TagMapEntry::Standalone {
            logical,
            hardware,
            slot,
        }
    }

    pub fn block_slice(logical: BlockRange, hardware: BlockRange) -> Self {
        TagMapEntry::BlockSlice {
            logical,
            hardware,
            slot: SlotOverride::none(),
        }
    }

    pub fn block_slice_with(logical: BlockRange, hardware: BlockRange, slot: SlotOverride) -> Self {
        TagMapEntry::BlockSlice {
            logical,
            hardware,
            slot,
        }
    }

    fn effective_logical_name(&self) -> String {
        match self {
            TagMapEntry::Standalone { logical, slot, .. } => {
                slot.name.clone().unwrap_or_else(|| logical.name().to_string())
            }
            TagMapEntry::BlockSlice { logical, slot, .. } => slot.name.clone().unwrap_or_else(|| {
                logical
                    .tags()
                    .first()
                    .map(|t| t.name().to_string())
                    .unwrap_or_default()
            }),
        }
    }

    fn hardware_names(&self) -> Vec<String> {
        match self {
            TagMapEntry::Standalone { hardware, .. } => vec![hardware.name().to_string()],
            TagMapEntry::BlockSlice { hardware, .. } => {
                hardware.tags().iter().map(|t| t.name().to_string()).collect()
            }
        }
    }

    fn validate_shape(&self) -> Result<(), TagMapError> {
        match self {
            TagMapEntry::Standalone { logical, hardware, .. } => {
                if logical.ty() != hardware.ty() {
                    return Err(TagMapError::TypeMismatch {
                        logical: logical.name().to_string(),
                        logical_ty: logical.ty(),
                        hardware: hardware.name().to_string(),
                        hardware_ty: hardware.ty(),
                    });
                }
                Ok(())
            }
            TagMapEntry::BlockSlice { logical, hardware, .. } => {
                if logical.len() != hardware.len() {
                    return Err(TagMapError::SizeMismatch {
                        logical_len: logical.len(),
                        hardware_len: hardware.len(),
                    });
                }
                for (l, h) in logical.tags().iter().zip(hardware.tags().iter()) {
                    if l.ty() != h.ty() {
                        return Err(TagMapError::TypeMismatch {
                            logical: l.name().to_string(),
                            logical_ty: l.ty(),
                            hardware: h.name().to_string(),
                            hardware_ty: h.ty(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// The effective `Tag` this entry exposes logically, with overrides applied (spec.md
    /// §3.7: "without mutating the logical Tag"). Only meaningful for `Standalone` entries;
    /// block slices expose one effective tag per element via `effective_block_tags`.
    pub fn effective_tag(&self) -> Option<Tag> {
        match self {
            TagMapEntry::Standalone { logical, slot, .. } => Some(apply_slot(logical, slot, None)),
            TagMapEntry::BlockSlice { .. } => None,
        }
    }

    pub fn effective_block_tags(&self) -> Option<Vec<Tag>> {
        match self {
            TagMapEntry::BlockSlice { logical, slot, .. } => Some(
                logical
                    .tags()
                    .iter()
                    .enumerate()
                    .map(|(i, t)| apply_slot(t, slot, Some(i)))
                    .collect(),
            ),
            TagMapEntry::Standalone { .. } => None,
        }
    }
}

fn apply_slot(tag: &Tag, slot: &SlotOverride, index: Option<usize>) -> Tag {
    let name = match (&slot.name, index) {
        (Some(base), Some(i)) => format!("{base}{i}"),
        (Some(base), None) => base.clone(),
        (None, _) => tag.name().to_string(),
    };
    let mut effective = Tag::new(name, tag.ty());
    if let Some(default) = slot.default {
        effective = effective.with_default(default);
    } else {
        effective = effective.with_default(tag.default());
    }
    effective = effective.retentive(slot.retentive.unwrap_or_else(|| tag.is_retentive()));
    effective
}

/// A validated logical-to-hardware binding (spec.md §3.7, component: dialect layer).
#[derive(Debug, Clone)]
pub struct TagMap {
    entries: Vec<TagMapEntry>,
}

impl TagMap {
    /// Validates `entries` against every failure mode spec.md §3.7 names: type mismatch,
    /// size mismatch, overlapping hardware windows, and logical-name collisions after
    /// override. Returns the first violation found, in entry order.
    pub fn build(entries: Vec<TagMapEntry>) -> Result<TagMap, TagMapError> {
        for entry in &entries {
            entry.validate_shape()?;
        }

        let mut seen_hardware = std::collections::HashSet::new();
        for entry in &entries {
            for name in entry.hardware_names() {
                if !seen_hardware.insert(name.clone()) {
                    return Err(TagMapError::OverlappingWindow(name));
                }
            }
        }

        let mut seen_logical = std::collections::HashSet::new();
        for entry in &entries {
            let name = entry.effective_logical_name();
            if !seen_logical.insert(name.clone()) {
                return Err(TagMapError::NameCollision(name));
            }
        }

        Ok(TagMap { entries })
    }

    pub fn entries(&self) -> &[TagMapEntry] {
        &self.entries
    }

    /// Resolves a logical tag name to its hardware tag name, if this map binds it
    /// standalone (spec.md §3.7).
    pub fn hardware_for(&self, logical_name: &str) -> Option<&str> {
        self.entries.iter().find_map(|e| match e {
            TagMapEntry::Standalone { logical, hardware, .. } if logical.name() == logical_name => {
                Some(hardware.name())
            }
            _ => None,
        })
    }
}

//! The tag declarations a `Runner` needs to compute retentive/non-retentive resets on
//! mode transitions (spec.md §4.5): `ladder-program`'s `Program` only knows tag *names*
//! (strings referenced by conditions/instructions), not their declared type, default, or
//! retentive flag, so the runner is handed the full `Tag` set separately at construction.

use ladder_types::Tag;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct TagTable {
    tags: BTreeMap<String, Tag>,
}

impl TagTable {
    pub fn new(tags: impl IntoIterator<Item = Tag>) -> Self {
        TagTable {
            tags: tags.into_iter().map(|t| (t.name().to_string(), t)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.tags.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.values()
    }
}

use crate::rung::Rung;
use std::sync::Arc;

/// A named ordered list of rungs (spec.md §3.6). Subroutines may be called from top-level
/// rungs but may not recursively call other subroutines -- nesting depth is exactly 1.
pub struct Subroutine {
    name: Arc<str>,
    rungs: Vec<Rung>,
}

impl Subroutine {
    pub fn new(name: impl Into<Arc<str>>, rungs: Vec<Rung>) -> Self {
        Subroutine {
            name: name.into(),
            rungs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rungs(&self) -> &[Rung] {
        &self.rungs
    }
}

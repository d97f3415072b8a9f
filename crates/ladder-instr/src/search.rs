//! Search (spec.md §4.3.6): scan a block range for the first (or next, when `continuous`)
//! element matching a comparison against an RHS operand, or slide a text window over CHAR
//! tags for `=`/`!=`.

use crate::core::{oneshot_gate, InstrError, InstrOperand, SourceLocation};
use ladder_cond::{CompareOp, Operand};
use ladder_context::ScanContext;
use ladder_types::{BlockRange, Value};
use std::sync::Arc;

/// `Search(comparison, rhs, window, result, found, continuous, oneshot)` (spec.md §4.3.6).
pub struct Search {
    op: CompareOp,
    rhs: Operand,
    window: BlockRange,
    result: Arc<str>,
    found: Arc<str>,
    continuous: bool,
    oneshot: bool,
    loc: SourceLocation,
}

impl Search {
    pub fn new(
        op: CompareOp,
        rhs: Operand,
        window: BlockRange,
        result: impl Into<Arc<str>>,
        found: impl Into<Arc<str>>,
        loc: SourceLocation,
    ) -> Self {
        Search {
            op,
            rhs,
            window,
            result: result.into(),
            found: found.into(),
            continuous: false,
            oneshot: false,
            loc,
        }
    }

    pub fn continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    pub fn oneshot(mut self, oneshot: bool) -> Self {
        self.oneshot = oneshot;
        self
    }

    fn is_text_search(&self) -> bool {
        matches!(self.op, CompareOp::Eq | CompareOp::Ne)
            && self.window.tags().first().map(|t| t.ty()) == Some(ladder_types::TagType::Char)
    }
}

impl crate::core::Instruction for Search {
    fn execute(&self, ctx: &mut ScanContext<'_>, enabled: bool) -> Result<(), InstrError> {
        if !enabled {
            // Rung-false preserves previous outputs (spec.md §4.3.6).
            return Ok(());
        }
        let run = if self.oneshot {
            oneshot_gate(ctx, &self.loc, true)
        } else {
            true
        };
        if !run {
            return Ok(());
        }

        if self.is_text_search() {
            self.execute_text(ctx)
        } else {
            self.execute_numeric(ctx)
        }
    }

    fn describe(&self) -> Vec<InstrOperand> {
        vec![
            InstrOperand::Operand("rhs".into(), self.rhs.clone()),
            InstrOperand::BlockRange("window".into(), self.window.clone()),
            InstrOperand::Tag("result".into(), self.result.clone()),
            InstrOperand::Tag("found".into(), self.found.clone()),
        ]
    }
}

impl Search {
    /// `result` holds the 1-based address of the last match (spec.md §3.2), so a previous
    /// match at 0-based index `p - 1` resumes scanning at 0-based index `p` -- i.e. resume
    /// at `prev` itself, not `prev + 1`.
    fn start_index(&self, ctx: &ScanContext<'_>) -> usize {
        if !self.continuous {
            return 0;
        }
        let prev = match ctx.get_tag(&self.result, Value::Dint(-1)) {
            Value::Dint(i) => i,
            Value::Int(i) => i as i32,
            _ => -1,
        };
        if prev == -1 {
            // Exhausted: no rescan (spec.md §4.3.6).
            return usize::MAX;
        }
        if prev == 0 {
            // `result == 0` restarts (spec.md §4.3.6).
            0
        } else {
            (prev as usize).min(self.window.len())
        }
    }

    fn execute_numeric(&self, ctx: &mut ScanContext<'_>) -> Result<(), InstrError> {
        let start = self.start_index(ctx);
        let rhs = self.rhs.evaluate(ctx)?;
        let mut found_at = None;
        if start < self.window.len() {
            for (i, tag) in self.window.tags().iter().enumerate().skip(start) {
                let lhs = ctx.get_tag(tag.name(), tag.default());
                if self.op.matches_values(lhs, rhs) {
                    found_at = Some(i);
                    break;
                }
            }
        }
        self.write_result(ctx, found_at)
    }

    fn execute_text(&self, ctx: &mut ScanContext<'_>) -> Result<(), InstrError> {
        let rhs = self.rhs.evaluate(ctx)?;
        let needle = match rhs {
            Value::Char(Some(c)) => (c as char).to_string(),
            _ => return self.write_result(ctx, None),
        };
        if needle.is_empty() || self.window.is_empty() {
            return self.write_result(ctx, None);
        }
        let start = self.start_index(ctx);
        let len = needle.len();
        if self.window.len() < len || start > self.window.len() - len {
            return self.write_result(ctx, None);
        }
        let mut found_at = None;
        for i in start..=(self.window.len() - len) {
            let window_text: String = self.window.tags()[i..i + len]
                .iter()
                .map(|t| match ctx.get_tag(t.name(), t.default()) {
                    Value::Char(Some(c)) => c as char,
                    _ => '\0',
                })
                .collect();
            let matches = window_text == needle;
            let is_match = matches!(self.op, CompareOp::Eq) == matches;
            if is_match {
                found_at = Some(i);
                break;
            }
        }
        self.write_result(ctx, found_at)
    }

    fn write_result(&self, ctx: &mut ScanContext<'_>, found_at: Option<usize>) -> Result<(), InstrError> {
        match found_at {
            Some(i) => {
                // 1-based address (spec.md §3.2): `result == 0` is the continuous-search
                // restart sentinel (spec.md §4.3.6), so a match at 0-based index 0 must not
                // be written as 0 -- it would be read back as "restart" and never advance.
                ctx.set_tag(&self.result, Value::Dint(i as i32 + 1))?;
                ctx.set_tag(&self.found, Value::Bool(true))?;
            }
            None => {
                ctx.set_tag(&self.result, Value::Dint(-1))?;
                ctx.set_tag(&self.found, Value::Bool(false))?;
            }
        }
        Ok(())
    }
}

trait MatchesValues {
    fn matches_values(self, lhs: Value, rhs: Value) -> bool;
}

impl MatchesValues for CompareOp {
    fn matches_values(self, lhs: Value, rhs: Value) -> bool {
        let ord = lhs.compare(&rhs);
        use std::cmp::Ordering::*;
        match (self, ord) {
            (CompareOp::Eq, Some(Equal)) => true,
            (CompareOp::Ne, Some(o)) => o != Equal,
            (CompareOp::Ne, None) => true,
            (CompareOp::Lt, Some(Less)) => true,
            (CompareOp::Le, Some(Less | Equal)) => true,
            (CompareOp::Gt, Some(Greater)) => true,
            (CompareOp::Ge, Some(Greater | Equal)) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Instruction;
    use ladder_context::{NoRestrictions, SystemState};
    use ladder_types::Block;
    use std::collections::BTreeMap;

    #[test]
    fn numeric_search_finds_first_match() {
        let block = Block::new("DS", ladder_types::TagType::Int, 1, 5).select_all();
        let mut tags = BTreeMap::new();
        for (i, t) in block.tags().iter().enumerate() {
            tags.insert(t.name().to_string(), Value::Int(i as i16));
        }
        tags.insert("Result".to_string(), Value::Dint(-1));
        tags.insert("Found".to_string(), Value::Bool(false));
        let s0 = SystemState::initial(tags);
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        let search = Search::new(
            CompareOp::Eq,
            Operand::Literal(Value::Int(3)),
            block,
            "Result",
            "Found",
            SourceLocation::new("r1.i0"),
        );
        search.execute(&mut ctx, true).unwrap();
        // 1-based address (spec.md §3.2): the match is at 0-based index 3, so `Result`
        // holds 4.
        assert_eq!(ctx.get_tag("Result", Value::Dint(-1)), Value::Dint(4));
        assert_eq!(ctx.get_tag("Found", Value::Bool(false)), Value::Bool(true));
    }

    #[test]
    fn miss_writes_minus_one_and_not_found() {
        let block = Block::new("DS", ladder_types::TagType::Int, 1, 5).select_all();
        let mut tags = BTreeMap::new();
        for t in block.tags() {
            tags.insert(t.name().to_string(), Value::Int(0));
        }
        tags.insert("Result".to_string(), Value::Dint(-1));
        tags.insert("Found".to_string(), Value::Bool(false));
        let s0 = SystemState::initial(tags);
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        let search = Search::new(
            CompareOp::Eq,
            Operand::Literal(Value::Int(99)),
            block,
            "Result",
            "Found",
            SourceLocation::new("r1.i0"),
        );
        search.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("Result", Value::Dint(0)), Value::Dint(-1));
        assert_eq!(ctx.get_tag("Found", Value::Bool(true)), Value::Bool(false));
    }

    #[test]
    fn continuous_resumes_after_last_result() {
        let block = Block::new("DS", ladder_types::TagType::Int, 1, 5).select_all();
        let mut tags = BTreeMap::new();
        for t in block.tags() {
            tags.insert(t.name().to_string(), Value::Int(7));
        }
        // Previous match was at 1-based address 2 (0-based index 1); the next scan resumes
        // at 0-based index 2.
        tags.insert("Result".to_string(), Value::Dint(2));
        tags.insert("Found".to_string(), Value::Bool(true));
        let s0 = SystemState::initial(tags);
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        let search = Search::new(
            CompareOp::Eq,
            Operand::Literal(Value::Int(7)),
            block,
            "Result",
            "Found",
            SourceLocation::new("r1.i0"),
        )
        .continuous(true);
        search.execute(&mut ctx, true).unwrap();
        assert_eq!(ctx.get_tag("Result", Value::Dint(0)), Value::Dint(3));
    }

    #[test]
    fn continuous_search_matching_first_element_still_advances_next_scan() {
        // Regression: a continuous search matching 0-based index 0 must write the 1-based
        // address (1), not 0 -- `result == 0` is the restart sentinel (spec.md §4.3.6), so
        // writing 0 here would make the next scan "restart" at index 0 forever instead of
        // resuming past it.
        let block = Block::new("DS", ladder_types::TagType::Int, 1, 3).select_all();
        let mut tags = BTreeMap::new();
        tags.insert("DS1".to_string(), Value::Int(9));
        tags.insert("DS2".to_string(), Value::Int(0));
        tags.insert("DS3".to_string(), Value::Int(9));
        // `Result == 0` requests a restart from the beginning of the window.
        tags.insert("Result".to_string(), Value::Dint(0));
        tags.insert("Found".to_string(), Value::Bool(false));
        let s0 = SystemState::initial(tags);
        let search = Search::new(
            CompareOp::Eq,
            Operand::Literal(Value::Int(9)),
            block,
            "Result",
            "Found",
            SourceLocation::new("r1.i0"),
        )
        .continuous(true);

        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        search.execute(&mut ctx, true).unwrap();
        let s1 = ctx.commit(0.0);
        assert_eq!(s1.tag("Result"), Some(Value::Dint(1)));

        // Second scan must resume past index 0, not restart at it.
        let mut ctx = ScanContext::new(&s1, &NoRestrictions);
        search.execute(&mut ctx, true).unwrap();
        let s2 = ctx.commit(0.0);
        assert_eq!(s2.tag("Result"), Some(Value::Dint(3)));
    }
}

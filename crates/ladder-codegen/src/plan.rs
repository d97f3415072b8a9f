use ladder_program::Program;
use ladder_validate::{walk, Scope, ValueKind};
use std::sync::Arc;

/// Which rung list a `RungSlot` belongs to (spec.md §6.4): mirrors `ladder_validate::Scope`
/// rather than reusing it directly, since the ordering plan is a standalone artifact a code
/// generator consumes without depending on the validation walker's own types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RungScope {
    Main,
    Subroutine(Arc<str>),
}

/// One rung's place in the generated ordering (spec.md §6.4): main rungs in source order,
/// then each subroutine (sorted by name) in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RungSlot {
    pub scope: RungScope,
    pub rung_id: u64,
    pub source_location: String,
}

/// The deterministic ordering plan for one built `Program` (spec.md §6.4): stable
/// subroutine, rung, and tag-slot ordering for a downstream code generator to emit
/// declarations against. Two programs that are structurally identical but built from
/// differently-ordered subroutine lists produce byte-for-byte identical plans; this crate
/// never emits target source code itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenPlan {
    pub subroutine_order: Vec<Arc<str>>,
    pub rung_order: Vec<RungSlot>,
    pub tag_slot_order: Vec<String>,
}

/// Builds the ordering plan for `program` (spec.md §6.4). Pure and read-only: it never
/// mutates `program` and never executes a scan.
pub fn plan(program: &Program) -> CodegenPlan {
    let subroutine_order: Vec<Arc<str>> = program.subroutines().keys().cloned().collect();

    let mut rung_order = Vec::new();
    for rung in program.rungs() {
        rung_order.push(RungSlot {
            scope: RungScope::Main,
            rung_id: rung.id(),
            source_location: rung.source_location().to_string(),
        });
    }
    for (name, sub) in program.subroutines() {
        for rung in sub.rungs() {
            rung_order.push(RungSlot {
                scope: RungScope::Subroutine(name.clone()),
                rung_id: rung.id(),
                source_location: rung.source_location().to_string(),
            });
        }
    }

    let mut tag_slot_order: Vec<String> = walk(program)
        .iter()
        .filter(|fact| fact.value_kind == ValueKind::Tag)
        .filter_map(|fact| {
            fact.summary
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .map(|s| s.to_string())
        })
        .collect();
    tag_slot_order.sort();
    tag_slot_order.dedup();

    CodegenPlan {
        subroutine_order,
        rung_order,
        tag_slot_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_cond::Condition;
    use ladder_instr::{Out, SourceLocation, Target};
    use ladder_program::{ExecutionItem, Rung, Subroutine};

    fn sample_rung(id: u64, tag: &str, out: &str, loc: &str) -> Rung {
        Rung::new(
            id,
            vec![Condition::direct(tag)],
            vec![ExecutionItem::instruction(Out::new(
                Target::tag(out),
                SourceLocation::new(loc),
            ))],
            loc,
        )
    }

    #[test]
    fn subroutine_order_is_sorted_by_name_regardless_of_build_order() {
        let main = vec![sample_rung(0, "Button", "Light", "r0")];
        let subs_forward = vec![
            Subroutine::new("Alpha", vec![sample_rung(0, "A", "AOut", "a.r0")]),
            Subroutine::new("Bravo", vec![sample_rung(0, "B", "BOut", "b.r0")]),
        ];
        let subs_reversed = vec![
            Subroutine::new("Bravo", vec![sample_rung(0, "B", "BOut", "b.r0")]),
            Subroutine::new("Alpha", vec![sample_rung(0, "A", "AOut", "a.r0")]),
        ];

        let forward = Program::build(main.clone(), subs_forward, true).unwrap();
        let reversed = Program::build(main, subs_reversed, true).unwrap();

        assert_eq!(plan(&forward), plan(&reversed));
        assert_eq!(
            plan(&forward).subroutine_order,
            vec![Arc::from("Alpha"), Arc::from("Bravo")]
        );
    }

    #[test]
    fn tag_slot_order_is_sorted_and_deduped_regardless_of_reference_order() {
        let main_one_order = vec![
            sample_rung(0, "Zeta", "Out1", "r0"),
            sample_rung(1, "Alpha", "Zeta", "r1"),
        ];
        let main_other_order = vec![
            sample_rung(1, "Alpha", "Zeta", "r1"),
            sample_rung(0, "Zeta", "Out1", "r0"),
        ];

        let program_one = Program::build(main_one_order, vec![], true).unwrap();
        let program_other = Program::build(main_other_order, vec![], true).unwrap();

        assert_eq!(
            plan(&program_one).tag_slot_order,
            vec!["Alpha".to_string(), "Zeta".to_string()]
        );
        assert_eq!(
            plan(&program_one).tag_slot_order,
            plan(&program_other).tag_slot_order
        );
    }

    #[test]
    fn rung_order_follows_declared_scan_order_not_alphabetical() {
        let main = vec![sample_rung(0, "B", "Y", "second"), sample_rung(1, "A", "X", "first")];
        let program = Program::build(main, vec![], true).unwrap();
        let locations: Vec<&str> = plan(&program)
            .rung_order
            .iter()
            .map(|slot| slot.source_location.as_str())
            .collect();
        assert_eq!(locations, vec!["second", "first"]);
    }
}

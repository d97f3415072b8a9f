//! Validation Walker (spec.md §4.7, component 10): a read-only traversal over a built
//! `Program` that surfaces every operand it touches as a flat, deterministically ordered
//! list of facts, for a portability/dialect checker to judge independently of execution.
//! This crate never evaluates a program and never mutates one; it only reads the tree
//! `ladder-program` already built.

mod fact;
mod walker;

pub use fact::{OperandFact, ProgramLocation, Scope, ValueKind};
pub use walker::walk;

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_cond::{CompareOp, Condition, Operand};
    use ladder_instr::{Out, SourceLocation, Target};
    use ladder_program::{Branch, ExecutionItem, Program, Rung, Subroutine};

    #[test]
    fn walks_main_rungs_before_subroutines_sorted_by_name() {
        let rung = Rung::new(
            0,
            vec![Condition::direct("Button")],
            vec![ExecutionItem::instruction(Out::new(
                Target::tag("Light"),
                SourceLocation::new("r0.i0"),
            ))],
            "rung0",
        );
        let sub_b = Subroutine::new(
            "Bravo",
            vec![Rung::new(0, vec![Condition::direct("X")], vec![], "b.r0")],
        );
        let sub_a = Subroutine::new(
            "Alpha",
            vec![Rung::new(0, vec![Condition::direct("Y")], vec![], "a.r0")],
        );
        let program = Program::build(vec![rung], vec![sub_b, sub_a], true).unwrap();

        let facts = walk(&program);
        assert_eq!(facts[0].location.scope, Scope::Main);
        assert_eq!(facts[0].summary, "\"Button\"");

        let sub_scopes: Vec<_> = facts
            .iter()
            .filter_map(|f| match &f.location.scope {
                Scope::Subroutine(name) => Some(name.to_string()),
                Scope::Main => None,
            })
            .collect();
        let first_alpha = sub_scopes.iter().position(|n| n == "Alpha").unwrap();
        let first_bravo = sub_scopes.iter().position(|n| n == "Bravo").unwrap();
        assert!(first_alpha < first_bravo);
    }

    #[test]
    fn conditions_come_before_instructions_within_a_rung() {
        let rung = Rung::new(
            0,
            vec![Condition::direct("Button")],
            vec![ExecutionItem::instruction(Out::new(
                Target::tag("Light"),
                SourceLocation::new("r0.i0"),
            ))],
            "rung0",
        );
        let program = Program::build(vec![rung], vec![], true).unwrap();
        let facts = walk(&program);
        assert_eq!(facts[0].location.arg_path, "condition[0]");
        assert_eq!(facts[1].location.arg_path, "instruction[0].target");
        assert_eq!(facts[1].location.instruction_type, Some("Out"));
        assert_eq!(facts[1].value_kind, ValueKind::Tag);
    }

    #[test]
    fn nested_branch_records_declaration_order_in_branch_path() {
        let inner = Branch::new(vec![Condition::direct("Inner")], vec![]);
        let outer = Branch::new(
            vec![Condition::direct("Outer")],
            vec![ExecutionItem::branch(inner)],
        );
        let rung = Rung::new(0, vec![], vec![ExecutionItem::branch(outer)], "rung0");
        let program = Program::build(vec![rung], vec![], true).unwrap();
        let facts = walk(&program);

        let outer_cond = facts.iter().find(|f| f.summary == "\"Outer\"").unwrap();
        assert_eq!(outer_cond.location.branch_path, vec![0]);
        let inner_cond = facts.iter().find(|f| f.summary == "\"Inner\"").unwrap();
        assert_eq!(inner_cond.location.branch_path, vec![0, 0]);
    }

    #[test]
    fn compare_condition_walks_both_operands() {
        let cond = Condition::Compare(CompareOp::Gt, Operand::tag("A"), Operand::tag("B"));
        let rung = Rung::new(0, vec![cond], vec![], "rung0");
        let program = Program::build(vec![rung], vec![], true).unwrap();
        let facts = walk(&program);

        assert!(facts.iter().any(|f| f.location.arg_path == "condition[0].left"));
        assert!(facts.iter().any(|f| f.location.arg_path == "condition[0].right"));
    }

    #[test]
    fn return_item_emits_no_fact() {
        let rung = Rung::new(0, vec![], vec![ExecutionItem::Return], "rung0");
        let program = Program::build(vec![rung], vec![], true).unwrap();
        assert!(walk(&program).is_empty());
    }

    struct NoOpInstruction;
    impl ladder_instr::Instruction for NoOpInstruction {
        fn execute(
            &self,
            _ctx: &mut ladder_context::ScanContext<'_>,
            _enabled: bool,
        ) -> Result<(), ladder_instr::InstrError> {
            Ok(())
        }
    }

    #[test]
    fn instruction_with_no_describe_override_still_emits_a_bare_fact() {
        let rung = Rung::new(
            0,
            vec![],
            vec![ExecutionItem::instruction(NoOpInstruction)],
            "rung0",
        );
        let program = Program::build(vec![rung], vec![], true).unwrap();
        let facts = walk(&program);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].value_kind, ValueKind::Unknown);
        assert_eq!(facts[0].location.arg_path, "instruction[0]");
    }
}

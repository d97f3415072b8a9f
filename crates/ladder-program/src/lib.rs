//! Rung & Program Layer (spec.md §3.6, §4.4, component 5): composition of conditions,
//! instructions, nested parallel branches, and subroutines; captures source location;
//! drives the per-scan evaluation graph (spec.md §4.4's rung evaluation protocol).

mod error;
mod forloop;
mod program;
mod rung;
mod subroutine;
mod wrappers;

pub use error::ProgramError;
pub use forloop::ForLoop;
pub use program::Program;
pub use rung::{Branch, ExecutionItem, Flow, Rung};
pub use subroutine::Subroutine;
pub use wrappers::{
    CountDownGated, CountUpGated, EventDrumGated, JumpInput, OffDelay, OnDelay,
    ShiftRegisterGated, TimeDrumGated,
};

#[cfg(test)]
mod tests {
    use super::*;
    use ladder_cond::Condition;
    use ladder_context::{NoRestrictions, ScanContext, SystemState};
    use ladder_instr::{Out, SourceLocation, Target};
    use ladder_types::Value;
    use std::collections::BTreeMap;

    fn state(pairs: &[(&str, Value)]) -> SystemState {
        let mut tags = BTreeMap::new();
        for (k, v) in pairs {
            tags.insert(k.to_string(), *v);
        }
        SystemState::initial(tags)
    }

    #[test]
    fn end_to_end_scenario_one_button_lights_output() {
        // spec.md §8 scenario 1: Button(false), Light(false); Rung(Button): out(Light).
        let s0 = state(&[("Button", Value::Bool(false)), ("Light", Value::Bool(false))]);
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

        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        ctx.set_tag("Button", Value::Bool(true)).unwrap();
        program.run_scan(&mut ctx).unwrap();
        let s1 = ctx.commit(0.1);
        assert_eq!(s1.tag("Light"), Some(Value::Bool(true)));
    }

    #[test]
    fn branch_power_ands_with_parent() {
        let s0 = state(&[
            ("A", Value::Bool(true)),
            ("B", Value::Bool(false)),
            ("Light", Value::Bool(false)),
        ]);
        let branch = Branch::new(
            vec![Condition::direct("B")],
            vec![ExecutionItem::instruction(Out::new(
                Target::tag("Light"),
                SourceLocation::new("r0.b0.i0"),
            ))],
        );
        let rung = Rung::new(
            0,
            vec![Condition::direct("A")],
            vec![ExecutionItem::branch(branch)],
            "rung0",
        );
        let program = Program::build(vec![rung], vec![], true).unwrap();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        program.run_scan(&mut ctx).unwrap();
        let s1 = ctx.commit(0.0);
        assert_eq!(s1.tag("Light"), Some(Value::Bool(false)));
    }

    #[test]
    fn call_executes_subroutine_rungs_and_return_stops_it_only() {
        let s0 = state(&[("Light", Value::Bool(false)), ("Other", Value::Bool(false))]);
        let sub_rungs = vec![
            Rung::new(0, vec![], vec![ExecutionItem::Return], "sub.r0"),
            Rung::new(
                1,
                vec![],
                vec![ExecutionItem::instruction(Out::new(
                    Target::tag("Other"),
                    SourceLocation::new("sub.r1.i0"),
                ))],
                "sub.r1",
            ),
        ];
        let sub = Subroutine::new("Sub1", sub_rungs);
        let call_rung = Rung::new(0, vec![], vec![ExecutionItem::call("Sub1")], "main.r0");
        let after_call_rung = Rung::new(
            1,
            vec![],
            vec![ExecutionItem::instruction(Out::new(
                Target::tag("Light"),
                SourceLocation::new("main.r1.i0"),
            ))],
            "main.r1",
        );
        let program =
            Program::build(vec![call_rung, after_call_rung], vec![sub], true).unwrap();
        let mut ctx = ScanContext::new(&s0, &NoRestrictions);
        program.run_scan(&mut ctx).unwrap();
        let s1 = ctx.commit(0.0);
        // `Return` inside Sub1 stops Sub1's own rung list (Other stays false), but the
        // caller's rung list keeps going past the `Call` (Light still gets driven).
        assert_eq!(s1.tag("Other"), Some(Value::Bool(false)));
        assert_eq!(s1.tag("Light"), Some(Value::Bool(true)));
    }

    #[test]
    fn subroutine_calling_another_subroutine_is_rejected_at_build_time() {
        let sub = Subroutine::new(
            "Nested",
            vec![Rung::new(0, vec![], vec![ExecutionItem::call("Other")], "n.r0")],
        );
        let result = Program::build(vec![], vec![sub], true);
        assert!(matches!(
            result,
            Err(ProgramError::NestedSubroutineCall(_))
        ));
    }
}

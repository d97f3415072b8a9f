use ladder_cond::Condition;
use ladder_codegen::plan;
use ladder_instr::{Out, SourceLocation, Target};
use ladder_program::{ExecutionItem, Program, Rung, Subroutine};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

fn named_subroutine(name: &str) -> Subroutine {
    let rung = Rung::new(
        0,
        vec![Condition::direct(format!("{name}In"))],
        vec![ExecutionItem::instruction(Out::new(
            Target::tag(format!("{name}Out")),
            SourceLocation::new(format!("{name}.r0")),
        ))],
        format!("{name}.r0"),
    );
    Subroutine::new(name, vec![rung])
}

/// spec.md §6.4's ordering plan must not depend on the order subroutines are declared in,
/// matching how the teacher's snapshot determinism tests shuffle device/MMU input order and
/// assert the serialized output is unaffected (aero-snapshot's `tests/determinism.rs`).
#[test]
fn shuffling_subroutine_declaration_order_does_not_change_the_plan() {
    let main = vec![Rung::new(
        0,
        vec![Condition::direct("Button")],
        vec![ExecutionItem::instruction(Out::new(
            Target::tag("Light"),
            SourceLocation::new("main.r0"),
        ))],
        "main.r0",
    )];

    let names = ["Alpha", "Bravo", "Charlie", "Delta", "Echo"];
    let baseline_subs: Vec<Subroutine> = names.iter().map(|n| named_subroutine(n)).collect();
    let baseline = Program::build(main.clone(), baseline_subs, true).unwrap();
    let baseline_plan = plan(&baseline);

    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..8 {
        let mut shuffled_names = names;
        shuffled_names.shuffle(&mut rng);
        let shuffled_subs: Vec<Subroutine> = shuffled_names.iter().map(|n| named_subroutine(n)).collect();
        let program = Program::build(main.clone(), shuffled_subs, true).unwrap();
        assert_eq!(plan(&program), baseline_plan);
    }
}

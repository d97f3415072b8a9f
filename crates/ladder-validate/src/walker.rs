//! Validation Walker (spec.md §4.7, component 10): a pure, read-only traversal of a built
//! `Program` that folds every reachable operand into a flat, deterministically ordered
//! `Vec<OperandFact>` for a downstream portability/dialect checker to judge. The walker
//! never raises: nodes it cannot classify become `ValueKind::Unknown` facts rather than
//! errors, so one unfamiliar construct never aborts a whole-program report.
//!
//! Traversal order is fixed (spec.md §4.7): main rungs in list order, then subroutines
//! sorted by name, each rung's own conditions before its instructions, and nested branches
//! in declaration order.

use crate::fact::{OperandFact, ProgramLocation, Scope, ValueKind};
use ladder_cond::{Condition, Operand};
use ladder_expr::Expr;
use ladder_instr::{Instruction, InstrOperand, Target};
use ladder_program::{ExecutionItem, Program, Rung};
use std::collections::HashSet;

/// Walks every rung, subroutine, condition, and instruction operand in `program` and
/// returns the resulting facts in the order spec.md §4.7 defines.
pub fn walk(program: &Program) -> Vec<OperandFact> {
    let mut walker = Walker {
        facts: Vec::new(),
        seen: HashSet::new(),
    };
    walker.walk_rungs(&Scope::Main, program.rungs());
    for (name, sub) in program.subroutines() {
        walker.walk_rungs(&Scope::Subroutine(name.clone()), sub.rungs());
    }
    walker.facts
}

struct Walker {
    facts: Vec<OperandFact>,
    /// Guards condition traversal against cycles (spec.md §4.7): keyed by a condition
    /// node's address plus the arg-path it was reached through, since `Condition::All`/
    /// `Any` nest `Vec<Condition>` arbitrarily deep. Owned trees built by this workspace
    /// can't actually cycle, but the walker must not assume that of every caller.
    seen: HashSet<(usize, String)>,
}

impl Walker {
    fn walk_rungs(&mut self, scope: &Scope, rungs: &[Rung]) {
        for (rung_index, rung) in rungs.iter().enumerate() {
            self.walk_conditions(scope, rung_index, &[], rung.conditions());
            self.walk_items(scope, rung_index, &[], rung.items());
        }
    }

    fn loc(
        &self,
        scope: &Scope,
        rung_index: usize,
        branch_path: &[usize],
        instruction_index: Option<usize>,
        instruction_type: Option<&'static str>,
        arg_path: String,
    ) -> ProgramLocation {
        ProgramLocation {
            scope: scope.clone(),
            rung_index,
            branch_path: branch_path.to_vec(),
            instruction_index,
            instruction_type,
            arg_path,
        }
    }

    fn push(
        &mut self,
        scope: &Scope,
        rung_index: usize,
        branch_path: &[usize],
        instruction_index: Option<usize>,
        instruction_type: Option<&'static str>,
        arg_path: String,
        value_kind: ValueKind,
        type_label: String,
        summary: String,
        pointer_name: Option<String>,
        expr_type: Option<String>,
    ) {
        self.facts.push(OperandFact {
            location: self.loc(scope, rung_index, branch_path, instruction_index, instruction_type, arg_path),
            value_kind,
            type_label,
            summary,
            pointer_name,
            expr_type,
        });
    }

    fn walk_conditions(&mut self, scope: &Scope, rung_index: usize, branch_path: &[usize], conditions: &[Condition]) {
        for (i, cond) in conditions.iter().enumerate() {
            self.walk_condition(scope, rung_index, branch_path, cond, format!("condition[{i}]"));
        }
    }

    fn walk_condition(&mut self, scope: &Scope, rung_index: usize, branch_path: &[usize], cond: &Condition, path: String) {
        let key = (cond as *const Condition as usize, path.clone());
        if !self.seen.insert(key) {
            self.push(
                scope,
                rung_index,
                branch_path,
                None,
                None,
                path,
                ValueKind::Unknown,
                "cycle".to_string(),
                "condition already visited at this path; stopped to avoid an infinite walk".to_string(),
                None,
                None,
            );
            return;
        }
        match cond {
            Condition::Direct(tag)
            | Condition::Negated(tag)
            | Condition::IntTruthy(tag)
            | Condition::RisingEdge(tag)
            | Condition::FallingEdge(tag) => {
                self.push(
                    scope,
                    rung_index,
                    branch_path,
                    None,
                    None,
                    path,
                    ValueKind::Tag,
                    "Tag".to_string(),
                    format!("{tag:?}"),
                    None,
                    None,
                );
            }
            Condition::Compare(op, lhs, rhs) => {
                self.push(
                    scope,
                    rung_index,
                    branch_path,
                    None,
                    None,
                    path.clone(),
                    ValueKind::Condition,
                    format!("Compare({op:?})"),
                    format!("{op:?}"),
                    None,
                    None,
                );
                self.walk_operand(scope, rung_index, branch_path, lhs, format!("{path}.left"));
                self.walk_operand(scope, rung_index, branch_path, rhs, format!("{path}.right"));
            }
            Condition::All(conds) | Condition::Any(conds) => {
                for (i, c) in conds.iter().enumerate() {
                    self.walk_condition(scope, rung_index, branch_path, c, format!("{path}.conditions[{i}]"));
                }
            }
        }
    }

    fn walk_operand(&mut self, scope: &Scope, rung_index: usize, branch_path: &[usize], operand: &Operand, path: String) {
        let (value_kind, type_label, summary, pointer_name, expr_type) = operand_fields(operand);
        self.push(
            scope,
            rung_index,
            branch_path,
            None,
            None,
            path,
            value_kind,
            type_label,
            summary,
            pointer_name,
            expr_type,
        );
    }

    fn walk_items(&mut self, scope: &Scope, rung_index: usize, branch_path: &[usize], items: &[ExecutionItem]) {
        for (i, item) in items.iter().enumerate() {
            match item {
                ExecutionItem::Instruction(instr) => {
                    self.walk_instruction(scope, rung_index, branch_path, i, instr.as_ref());
                }
                ExecutionItem::Branch(branch) => {
                    let mut nested = branch_path.to_vec();
                    nested.push(i);
                    self.walk_conditions(scope, rung_index, &nested, branch.conditions());
                    self.walk_items(scope, rung_index, &nested, branch.items());
                }
                ExecutionItem::Call(name) => {
                    self.push(
                        scope,
                        rung_index,
                        branch_path,
                        Some(i),
                        Some("Call"),
                        format!("instruction[{i}]"),
                        ValueKind::Unknown,
                        "Call".to_string(),
                        name.to_string(),
                        None,
                        None,
                    );
                }
                ExecutionItem::Return => {}
                ExecutionItem::ForLoop(for_loop) => {
                    self.walk_operand(
                        scope,
                        rung_index,
                        branch_path,
                        for_loop.count(),
                        format!("instruction[{i}].count"),
                    );
                    let mut nested = branch_path.to_vec();
                    nested.push(i);
                    self.walk_items(scope, rung_index, &nested, for_loop.body());
                }
            }
        }
    }

    fn walk_instruction(
        &mut self,
        scope: &Scope,
        rung_index: usize,
        branch_path: &[usize],
        instruction_index: usize,
        instr: &dyn Instruction,
    ) {
        let type_name = instr.type_name();
        let operands = instr.describe();
        if operands.is_empty() {
            self.push(
                scope,
                rung_index,
                branch_path,
                Some(instruction_index),
                Some(type_name),
                format!("instruction[{instruction_index}]"),
                ValueKind::Unknown,
                type_name.to_string(),
                type_name.to_string(),
                None,
                None,
            );
            return;
        }
        for operand in operands {
            self.push_instr_operand(scope, rung_index, branch_path, instruction_index, type_name, operand);
        }
    }

    fn push_instr_operand(
        &mut self,
        scope: &Scope,
        rung_index: usize,
        branch_path: &[usize],
        instruction_index: usize,
        type_name: &'static str,
        operand: InstrOperand,
    ) {
        let (label, value_kind, type_label, summary, pointer_name, expr_type) = match operand {
            InstrOperand::Tag(label, tag) => (label, ValueKind::Tag, "Tag".to_string(), format!("{tag:?}"), None, None),
            InstrOperand::Target(label, target) => {
                let (vk, tl, sm) = match &target {
                    Target::Tag(tag) => (ValueKind::Tag, "Tag".to_string(), format!("{tag:?}")),
                    Target::Block(range) => (ValueKind::BlockRange, "BlockRange".to_string(), format!("{range:?}")),
                };
                (label, vk, tl, sm, None, None)
            }
            InstrOperand::Operand(label, op) => {
                let (vk, tl, sm, pn, et) = operand_fields(&op);
                (label, vk, tl, sm, pn, et)
            }
            InstrOperand::Expr(label, expr) => (
                label,
                ValueKind::Expression,
                "Expr".to_string(),
                format!("{expr:?}"),
                None,
                Some(expr_type_label(&expr)),
            ),
            InstrOperand::BlockRange(label, range) => {
                (label, ValueKind::BlockRange, "BlockRange".to_string(), format!("{range:?}"), None, None)
            }
            InstrOperand::IndirectBlockRange(label, range) => (
                label,
                ValueKind::IndirectBlockRange,
                "IndirectBlockRange".to_string(),
                format!("{range:?}"),
                None,
                None,
            ),
            InstrOperand::Condition(label, cond) => {
                (label, ValueKind::Condition, "Condition".to_string(), format!("{cond:?}"), None, None)
            }
        };
        let arg_path = format!("instruction[{instruction_index}].{label}");
        self.push(
            scope,
            rung_index,
            branch_path,
            Some(instruction_index),
            Some(type_name),
            arg_path,
            value_kind,
            type_label,
            summary,
            pointer_name,
            expr_type,
        );
    }
}

fn operand_fields(operand: &Operand) -> (ValueKind, String, String, Option<String>, Option<String>) {
    match operand {
        Operand::Tag(name) => (ValueKind::Tag, "Tag".to_string(), format!("{name:?}"), None, None),
        Operand::Literal(v) => (ValueKind::Literal, format!("{:?}", v.ty()), format!("{v:?}"), None, None),
        Operand::Indirect(ind) => (
            ValueKind::IndirectRef,
            "IndirectRef".to_string(),
            format!("{ind:?}"),
            Some(ind.pointer_tag().to_string()),
            None,
        ),
        Operand::Expr(expr) => (
            ValueKind::Expression,
            "Expr".to_string(),
            format!("{expr:?}"),
            None,
            Some(expr_type_label(expr)),
        ),
    }
}

/// A short, deterministic label for an expression tree's root constructor (spec.md §4.7's
/// `expr_type` metadata). Not a full pretty-printer: just enough for a portability checker
/// to group expressions by shape without re-parsing `summary`.
fn expr_type_label(expr: &Expr) -> String {
    match expr {
        Expr::Tag(_) => "Tag".to_string(),
        Expr::Literal(_) => "Literal".to_string(),
        Expr::BinOp(op, _, _) => format!("BinOp::{op:?}"),
        Expr::UnOp(op, _) => format!("UnOp::{op:?}"),
        Expr::MathFn(f, _) => format!("MathFn::{f:?}"),
        Expr::ShiftRotate(op, _, _) => format!("ShiftRotate::{op:?}"),
    }
}

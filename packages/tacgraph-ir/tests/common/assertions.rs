//! Domain assertions over lowered IR

use super::fixtures::Program;
use std::collections::BTreeSet;
use tacgraph_ir::shared::utils::opcode_set;
use tacgraph_ir::{lower_source, IrInstruction, Opcode};

pub fn lower_program(program: &Program) -> Vec<IrInstruction> {
    lower_source(program.language, program.source)
        .unwrap_or_else(|e| panic!("{} {}: {}", program.language.name(), program.name, e))
}

pub fn plain(ir: &[IrInstruction]) -> Vec<String> {
    ir.iter().map(IrInstruction::display_plain).collect()
}

pub fn unsupported(ir: &[IrInstruction]) -> Vec<String> {
    plain(ir)
        .into_iter()
        .filter(|l| l.contains("unsupported:"))
        .collect()
}

/// No `SYMBOLIC "unsupported:..."` anywhere in the lowering
pub fn assert_fully_supported(program: &Program, ir: &[IrInstruction]) {
    let bad = unsupported(ir);
    assert!(
        bad.is_empty(),
        "{} {}: unsupported constructs {:#?}\nfull IR:\n{}",
        program.language.name(),
        program.name,
        bad,
        plain(ir).join("\n")
    );
}

pub fn assert_has_opcodes(program: &Program, ir: &[IrInstruction], expected: &[Opcode]) {
    let present = opcode_set(ir);
    let missing: Vec<&Opcode> = expected.iter().filter(|o| !present.contains(o)).collect();
    assert!(
        missing.is_empty(),
        "{} {}: missing opcodes {:?}\nfull IR:\n{}",
        program.language.name(),
        program.name,
        missing,
        plain(ir).join("\n")
    );
}

/// Some BINOP applies the language's modulo operator
pub fn assert_has_modulo(program: &Program, ir: &[IrInstruction]) {
    let found = ir
        .iter()
        .any(|i| i.opcode == Opcode::Binop && matches!(i.first_literal(), Some("%") | Some("mod")));
    assert!(
        found,
        "{} {}: no modulo BINOP\nfull IR:\n{}",
        program.language.name(),
        program.name,
        plain(ir).join("\n")
    );
}

pub fn assert_starts_with_entry(program: &Program, ir: &[IrInstruction]) {
    assert!(
        ir.first().is_some_and(|i| i.is_label() && i.label_name() == Some("entry")),
        "{} {}: first instruction is {:?}",
        program.language.name(),
        program.name,
        ir.first().map(IrInstruction::display_plain)
    );
}

/// Opcodes present in every lowering
pub fn opcode_intersection(lowerings: &[Vec<IrInstruction>]) -> BTreeSet<Opcode> {
    let mut sets = lowerings.iter().map(|ir| opcode_set(ir));
    let Some(first) = sets.next() else {
        return BTreeSet::new();
    };
    sets.fold(first, |acc, s| acc.intersection(&s).copied().collect())
}

pub fn median(values: &mut [usize]) -> usize {
    values.sort_unstable();
    values[values.len() / 2]
}

//! One algorithm, fifteen languages: the lowerings agree on the essentials

mod common;

use common::*;
use tacgraph_ir::features::flow_graph::build_full_cfg;
use tacgraph_ir::shared::function_name_of_label;
use tacgraph_ir::{FunctionRegistry, IrInstruction, Opcode};

fn lowerings(suite: &[Program]) -> Vec<Vec<IrInstruction>> {
    suite.iter().map(lower_program).collect()
}

/// `bubbleSort`, `BubbleSort` and `bubble_sort` all name the same function
fn normalized(name: &str) -> String {
    name.chars().filter(|c| *c != '_').flat_map(char::to_lowercase).collect()
}

fn defined_functions(ir: &[IrInstruction]) -> Vec<&str> {
    ir.iter()
        .filter(|i| i.is_label())
        .filter_map(|i| i.label_name())
        .filter_map(function_name_of_label)
        .collect()
}

fn assert_intersection_contains(suite: &[Program], expected: &[Opcode]) {
    let common_ops = opcode_intersection(&lowerings(suite));
    for op in expected {
        assert!(
            common_ops.contains(op),
            "{}: {:?} missing from intersection {:?}",
            suite[0].name,
            op,
            common_ops
        );
    }
}

#[test]
fn test_opcode_intersection_keeps_algorithm_core() {
    assert_intersection_contains(
        &GCD,
        &[
            Opcode::Label,
            Opcode::Const,
            Opcode::LoadVar,
            Opcode::StoreVar,
            Opcode::Binop,
            Opcode::BranchIf,
            Opcode::Branch,
            Opcode::Return,
        ],
    );
    assert_intersection_contains(
        &BUBBLE_SORT,
        &[Opcode::Label, Opcode::Binop, Opcode::BranchIf, Opcode::Branch, Opcode::StoreIndex],
    );
    assert_intersection_contains(
        &FIBONACCI,
        &[Opcode::Binop, Opcode::BranchIf, Opcode::CallFunction, Opcode::Return],
    );
    assert_intersection_contains(
        &IS_PRIME,
        &[Opcode::Binop, Opcode::BranchIf, Opcode::Branch, Opcode::Return],
    );
}

#[test]
fn test_no_language_exceeds_five_times_median() {
    for suite in all_suites() {
        let lowered = lowerings(suite);
        let mut counts: Vec<usize> = lowered.iter().map(Vec::len).collect();
        let median = median(&mut counts);
        for (program, ir) in suite.iter().zip(&lowered) {
            assert!(
                ir.len() <= median * 5,
                "{} {}: {} instructions vs median {}",
                program.language.name(),
                program.name,
                ir.len(),
                median
            );
        }
    }
}

#[test]
fn test_gcd_defines_one_function_everywhere() {
    for (program, ir) in GCD.iter().zip(lowerings(&GCD)) {
        let functions = defined_functions(&ir);
        assert!(
            functions.iter().any(|f| f.eq_ignore_ascii_case("gcd")),
            "{}: functions {:?}",
            program.language.name(),
            functions
        );
    }
}

#[test]
fn test_named_algorithms_define_their_function_everywhere() {
    for suite in [&BUBBLE_SORT, &FIBONACCI, &IS_PRIME] {
        let wanted = normalized(suite[0].name);
        for (program, ir) in suite.iter().zip(lowerings(suite)) {
            let functions = defined_functions(&ir);
            assert!(
                functions.iter().any(|f| normalized(f) == wanted),
                "{} {}: functions {:?}",
                program.language.name(),
                program.name,
                functions
            );
        }
    }
}

#[test]
fn test_registry_sees_parameters_in_every_language() {
    for suite in [&GCD, &BUBBLE_SORT, &IS_PRIME] {
        let wanted = normalized(suite[0].name);
        for (program, ir) in suite.iter().zip(lowerings(suite)) {
            let registry = FunctionRegistry::build(&ir, &build_full_cfg(&ir));
            let params = registry
                .func_params
                .iter()
                .find(|(label, _)| {
                    function_name_of_label(label).is_some_and(|f| normalized(f) == wanted)
                })
                .map(|(_, params)| params.clone());
            assert!(
                params.as_ref().is_some_and(|p| !p.is_empty()),
                "{} {}: params {:?} in {:?}",
                program.language.name(),
                program.name,
                params,
                registry.func_params
            );
        }
    }
}

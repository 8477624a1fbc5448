//! Property-based tests for the IR utilities, the CFG builder and data flow
//!
//! Invariants that should hold for ALL inputs:
//! - merging lowered fragments never collides registers or labels
//! - every non-label instruction lands in exactly one block
//! - branch blocks carry exactly one true and one false edge
//! - def-use chains only point at stores of the same variable

mod common;

use common::*;
use once_cell::sync::Lazy;
use proptest::prelude::*;
use tacgraph_ir::config::DataFlowConfig;
use tacgraph_ir::features::data_flow::analyze;
use tacgraph_ir::features::flow_graph::{build_cfg, build_full_cfg};
use tacgraph_ir::shared::utils::{merge_fragments, validate};
use tacgraph_ir::{lower_source, CfgEdgeKind, IrInstruction, LanguageId, Opcode};

static LOWERED: Lazy<Vec<Vec<IrInstruction>>> =
    Lazy::new(|| all_programs().map(lower_program).collect());

// ============================================================================
// Random structured Python programs
// ============================================================================

#[derive(Debug, Clone)]
enum Stmt {
    Assign(u8, u8, u8),
    If(u8, Vec<Stmt>, Vec<Stmt>),
    While(u8, Vec<Stmt>),
}

fn stmt_strategy() -> impl Strategy<Value = Stmt> {
    let leaf = (0u8..4, 0u8..4, 0u8..100).prop_map(|(t, s, k)| Stmt::Assign(t, s, k));
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            (
                0u8..4,
                prop::collection::vec(inner.clone(), 1..4),
                prop::collection::vec(inner.clone(), 0..3)
            )
                .prop_map(|(v, then, alt)| Stmt::If(v, then, alt)),
            (0u8..4, prop::collection::vec(inner, 1..4)).prop_map(|(v, body)| Stmt::While(v, body)),
        ]
    })
}

fn render(stmts: &[Stmt], indent: usize, out: &mut String) {
    let pad = "    ".repeat(indent);
    for stmt in stmts {
        match stmt {
            Stmt::Assign(t, s, k) => out.push_str(&format!("{}v{} = v{} + {}\n", pad, t, s, k)),
            Stmt::If(v, then, alt) => {
                out.push_str(&format!("{}if v{} > 10:\n", pad, v));
                render(then, indent + 1, out);
                if !alt.is_empty() {
                    out.push_str(&format!("{}else:\n", pad));
                    render(alt, indent + 1, out);
                }
            }
            Stmt::While(v, body) => {
                out.push_str(&format!("{}while v{} < 50:\n", pad, v));
                render(body, indent + 1, out);
            }
        }
    }
}

fn program_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(stmt_strategy(), 1..6).prop_map(|stmts| {
        let mut out = String::new();
        render(&stmts, 0, &mut out);
        out
    })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_merged_fragments_stay_well_formed(
        picks in prop::collection::vec(0usize..45, 1..5),
    ) {
        let fragments: Vec<Vec<IrInstruction>> =
            picks.iter().map(|&i| LOWERED[i % LOWERED.len()].clone()).collect();
        let merged = merge_fragments(&fragments);

        prop_assert_eq!(merged.len(), fragments.iter().map(Vec::len).sum::<usize>());
        let entries = merged
            .iter()
            .filter(|i| i.is_label() && i.label_name() == Some("entry"))
            .count();
        prop_assert_eq!(entries, 1);
        let violations = validate(&merged);
        prop_assert!(violations.is_empty(), "{:#?}", violations);
    }

    #[test]
    fn prop_random_python_lowers_cleanly(source in program_strategy()) {
        let ir = lower_source(LanguageId::Python, &source).unwrap();
        prop_assert!(unsupported(&ir).is_empty(), "{}\n{:#?}", source, unsupported(&ir));
        let violations = validate(&ir);
        prop_assert!(violations.is_empty(), "{}\n{:#?}", source, violations);
    }

    #[test]
    fn prop_blocks_partition_the_stream(source in program_strategy()) {
        let ir = lower_source(LanguageId::Python, &source).unwrap();
        let cfg = build_full_cfg(&ir);

        let in_blocks: usize = cfg.blocks().iter().map(|b| b.instructions.len()).sum();
        let non_labels = ir.iter().filter(|i| !i.is_label()).count();
        prop_assert_eq!(in_blocks, non_labels);

        for block in cfg.blocks() {
            for (idx, inst) in block.index_range().zip(&block.instructions) {
                prop_assert_eq!(&ir[idx], inst);
            }
            for edge in &block.edges {
                prop_assert!(cfg.contains(&edge.target));
            }
            let kinds: Vec<CfgEdgeKind> = block
                .edges
                .iter()
                .map(|e| e.kind)
                .filter(|k| k.is_control())
                .collect();
            if block.ends_with(Opcode::BranchIf) {
                prop_assert_eq!(kinds, vec![CfgEdgeKind::True, CfgEdgeKind::False]);
            } else if block.is_exit() {
                prop_assert!(kinds.is_empty());
            }
        }

        let pruned = build_cfg(&ir);
        prop_assert!(pruned.labels().all(|l| cfg.contains(l)));
        prop_assert_eq!(&pruned.entry, &cfg.entry);
    }

    #[test]
    fn prop_def_use_chains_point_at_matching_stores(source in program_strategy()) {
        let ir = lower_source(LanguageId::Python, &source).unwrap();
        let result = analyze(&ir, &DataFlowConfig::default());
        prop_assert!(result.reaching.converged);
        for chain in &result.chains {
            prop_assert_eq!(ir[chain.use_index].opcode, Opcode::LoadVar);
            for &def in &chain.def_indices {
                prop_assert_eq!(ir[def].opcode, Opcode::StoreVar);
                prop_assert_eq!(ir[def].first_literal(), Some(chain.variable.as_str()));
            }
        }
    }
}

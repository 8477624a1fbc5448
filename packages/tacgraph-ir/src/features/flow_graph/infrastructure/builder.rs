//! CFG construction
//!
//! Algorithm:
//! 1. Partition: every LABEL opens a block; instructions up to the next
//!    LABEL belong to it
//! 2. Edges: BRANCH_IF -> true/false, BRANCH -> unconditional, RETURN/THROW
//!    -> none, anything else falls through to the next block in stream order;
//!    CALL_FUNCTION of a function defined in the unit adds a call edge
//! 3. Prune: BFS over control edges from `entry` and every `func_*` block

use crate::config::CfgConfig;
use crate::features::flow_graph::domain::{BasicBlock, Cfg, CfgEdge, CfgEdgeKind};
use crate::shared::constants::ENTRY_LABEL;
use crate::shared::models::{function_name_of_label, IrInstruction, Opcode};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use rustc_hash::{FxHashMap, FxHashSet};

pub struct CfgBuilder {
    config: CfgConfig,
}

impl CfgBuilder {
    pub fn new(config: CfgConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, instructions: &[IrInstruction]) -> Cfg {
        let mut cfg = partition(instructions);
        derive_edges(&mut cfg);
        if self.config.prune_unreachable {
            let before = cfg.len();
            let reachable = reachable_labels(&cfg);
            cfg.retain(|b| reachable.contains(&b.label));
            if cfg.len() < before {
                tracing::debug!("pruned {} unreachable blocks", before - cfg.len());
            }
        }
        tracing::debug!(
            "built CFG: {} instructions, {} blocks, {} edges",
            instructions.len(),
            cfg.len(),
            cfg.edge_count()
        );
        cfg
    }
}

impl Default for CfgBuilder {
    fn default() -> Self {
        Self::new(CfgConfig::default())
    }
}

/// Build with the default configuration (pruning on)
pub fn build_cfg(instructions: &[IrInstruction]) -> Cfg {
    CfgBuilder::default().build(instructions)
}

/// Build keeping every block, reachable or not
pub fn build_full_cfg(instructions: &[IrInstruction]) -> Cfg {
    let mut cfg = partition(instructions);
    derive_edges(&mut cfg);
    cfg
}

fn partition(instructions: &[IrInstruction]) -> Cfg {
    let entry = instructions
        .first()
        .and_then(|i| if i.is_label() { i.label_name() } else { None })
        .unwrap_or(ENTRY_LABEL);
    let mut cfg = Cfg::new(entry);
    let mut current: Option<BasicBlock> = None;

    for (idx, inst) in instructions.iter().enumerate() {
        if inst.is_label() {
            if let Some(done) = current.take() {
                push_block(&mut cfg, done);
            }
            let name = inst.label_name().unwrap_or_default();
            current = Some(BasicBlock::new(name, idx + 1));
            continue;
        }
        current
            .get_or_insert_with(|| BasicBlock::new(ENTRY_LABEL, idx))
            .instructions
            .push(inst.clone());
    }
    if let Some(done) = current {
        push_block(&mut cfg, done);
    }
    cfg
}

fn push_block(cfg: &mut Cfg, mut block: BasicBlock) {
    if cfg.contains(&block.label) {
        let renamed = format!("{}#{}", block.label, block.first_index);
        tracing::warn!("duplicate label '{}' renamed to '{}'", block.label, renamed);
        block.label = renamed;
    }
    cfg.push(block);
}

fn derive_edges(cfg: &mut Cfg) {
    let functions = function_entries(cfg);
    let labels: Vec<String> = cfg.labels().map(str::to_string).collect();

    for (i, label) in labels.iter().enumerate() {
        let Some(block) = cfg.block(label) else {
            continue;
        };
        let mut edges = Vec::new();
        match block.last() {
            Some(last) if last.opcode == Opcode::BranchIf => {
                if let Some(targets) = last.branch_targets() {
                    edges.push(CfgEdge::new(&targets.on_true, CfgEdgeKind::True));
                    edges.push(CfgEdge::new(&targets.on_false, CfgEdgeKind::False));
                }
            }
            Some(last) if last.opcode == Opcode::Branch => {
                if let Some(target) = last.label_name() {
                    edges.push(CfgEdge::new(target, CfgEdgeKind::Unconditional));
                }
            }
            Some(last) if matches!(last.opcode, Opcode::Return | Opcode::Throw) => {}
            _ => {
                if let Some(next) = labels.get(i + 1) {
                    edges.push(CfgEdge::new(next, CfgEdgeKind::Fallthrough));
                }
            }
        }

        let mut called: FxHashSet<&str> = FxHashSet::default();
        for inst in &block.instructions {
            if inst.opcode != Opcode::CallFunction {
                continue;
            }
            if let Some(target) = inst.first_literal().and_then(|n| functions.get(n)) {
                if called.insert(target.as_str()) {
                    edges.push(CfgEdge::new(target, CfgEdgeKind::Call));
                }
            }
        }

        edges.retain(|e| {
            let known = cfg.contains(&e.target);
            if !known {
                tracing::debug!("edge {} -> {} targets an unknown label", label, e.target);
            }
            known
        });
        if let Some(block) = cfg.block_mut(label) {
            block.edges = edges;
        }
    }
}

/// Function name -> label of its first `func_<name>_N` block
fn function_entries(cfg: &Cfg) -> FxHashMap<String, String> {
    let mut map = FxHashMap::default();
    for label in cfg.labels() {
        if let Some(name) = function_name_of_label(label) {
            map.entry(name.to_string()).or_insert_with(|| label.to_string());
        }
    }
    map
}

/// Labels reachable over control edges from `entry` and every function entry
pub fn reachable_labels(cfg: &Cfg) -> FxHashSet<String> {
    let mut graph: DiGraph<(), CfgEdgeKind> = DiGraph::with_capacity(cfg.len(), cfg.edge_count());
    let nodes: Vec<NodeIndex> = cfg.blocks().iter().map(|_| graph.add_node(())).collect();
    for (i, block) in cfg.blocks().iter().enumerate() {
        for edge in block.edges.iter().filter(|e| e.kind.is_control()) {
            if let Some(j) = cfg.position(&edge.target) {
                graph.add_edge(nodes[i], nodes[j], edge.kind);
            }
        }
    }

    let roots = cfg.blocks().iter().enumerate().filter(|(_, b)| {
        b.label == cfg.entry || function_name_of_label(&b.label).is_some()
    });
    let mut seen = vec![false; cfg.len()];
    for (i, _) in roots {
        if seen[i] {
            continue;
        }
        let mut bfs = Bfs::new(&graph, nodes[i]);
        while let Some(nx) = bfs.next(&graph) {
            seen[nx.index()] = true;
        }
    }

    cfg.blocks()
        .iter()
        .zip(seen)
        .filter(|(_, reached)| *reached)
        .map(|(b, _)| b.label.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{BranchTargets, Operand, Register};

    fn label(name: &str) -> IrInstruction {
        IrInstruction::label(name)
    }

    fn ret(reg: u32) -> IrInstruction {
        IrInstruction::new(Opcode::Return).with_operands(vec![Register(reg).into()])
    }

    fn konst(reg: u32, text: &str) -> IrInstruction {
        IrInstruction::new(Opcode::Const)
            .with_result(Register(reg))
            .with_operands(vec![Operand::lit(text)])
    }

    #[test]
    fn test_branch_then_return() {
        let ir = vec![label("a"), IrInstruction::branch("b"), label("b"), ret(0)];
        let cfg = build_cfg(&ir);
        assert_eq!(cfg.labels().collect::<Vec<_>>(), vec!["a", "b"]);
        let a = cfg.block("a").unwrap();
        assert_eq!(a.edges, vec![CfgEdge::new("b", CfgEdgeKind::Unconditional)]);
        assert!(cfg.block("b").unwrap().edges.is_empty());
        assert_eq!(cfg.entry, "a");
    }

    #[test]
    fn test_dead_block_after_return_is_pruned() {
        let ir = vec![label("entry"), konst(0, "1"), ret(0), label("dead"), konst(1, "2")];
        assert!(!build_cfg(&ir).contains("dead"));
        assert!(build_full_cfg(&ir).contains("dead"));
    }

    #[test]
    fn test_conditional_and_fallthrough_edges() {
        let ir = vec![
            label("entry"),
            konst(0, "True"),
            IrInstruction::branch_if(Register(0), BranchTargets::new("t", "f")),
            label("t"),
            konst(1, "1"),
            label("f"),
            ret(1),
        ];
        let cfg = build_cfg(&ir);
        let entry = cfg.block("entry").unwrap();
        assert_eq!(
            entry.edges,
            vec![CfgEdge::new("t", CfgEdgeKind::True), CfgEdge::new("f", CfgEdgeKind::False)]
        );
        assert_eq!(
            cfg.block("t").unwrap().edges,
            vec![CfgEdge::new("f", CfgEdgeKind::Fallthrough)]
        );
        assert_eq!(cfg.block("t").unwrap().first_index, 4);
    }

    #[test]
    fn test_uncalled_function_is_kept_and_called_one_gets_call_edge() {
        let ir = vec![
            label("entry"),
            IrInstruction::branch("end_f_1"),
            label("func_f_0"),
            ret(0),
            label("end_f_1"),
            IrInstruction::new(Opcode::CallFunction)
                .with_result(Register(1))
                .with_operands(vec![Operand::lit("f")]),
            IrInstruction::branch("end_g_3"),
            label("func_g_2"),
            ret(2),
            label("end_g_3"),
        ];
        let cfg = build_cfg(&ir);
        assert!(cfg.contains("func_g_2"));
        let caller = cfg.block("end_f_1").unwrap();
        assert!(caller.edges.contains(&CfgEdge::new("func_f_0", CfgEdgeKind::Call)));
        assert!(cfg.predecessors("func_f_0").is_empty());
    }

    #[test]
    fn test_instructions_before_first_label_form_entry() {
        let ir = vec![konst(0, "1"), ret(0)];
        let cfg = build_cfg(&ir);
        assert_eq!(cfg.labels().collect::<Vec<_>>(), vec!["entry"]);
        assert_eq!(cfg.block("entry").unwrap().instructions.len(), 2);
    }

    #[test]
    fn test_empty_stream() {
        let cfg = build_cfg(&[]);
        assert!(cfg.is_empty());
        assert_eq!(cfg.entry, "entry");
    }
}

//! Reaching definitions over basic blocks
//!
//! Forward may-analysis. A definition is the stream index of a STORE_VAR.
//!
//! ```text
//! IN[b]  = U OUT[p]  for p in control predecessors of b
//! OUT[b] = GEN[b] U (IN[b] - KILL[b])
//! ```
//!
//! Solved with a FIFO worklist; a block is re-queued only when its OUT
//! changes. The pass stops after `max_iterations` block visits even if it
//! has not reached a fixed point.

use super::defs_uses::defined_variable;
use crate::features::flow_graph::domain::Cfg;
use rustc_hash::FxHashMap;
use std::collections::{BTreeSet, VecDeque};

pub type DefSet = BTreeSet<usize>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachingDefinitions {
    /// Definitions live on entry to each block, keyed by block label
    pub block_in: FxHashMap<String, DefSet>,
    pub block_out: FxHashMap<String, DefSet>,
    /// Definition index -> variable it writes
    pub def_variable: FxHashMap<usize, String>,
    /// Worklist pops performed
    pub iterations: usize,
    pub converged: bool,
}

struct BlockSummary {
    gen: DefSet,
    kill: DefSet,
}

impl ReachingDefinitions {
    pub fn compute(cfg: &Cfg, max_iterations: usize) -> Self {
        let blocks = cfg.blocks();

        let mut def_variable = FxHashMap::default();
        let mut defs_by_var: FxHashMap<&str, DefSet> = FxHashMap::default();
        for block in blocks {
            for (index, inst) in block.index_range().zip(&block.instructions) {
                if let Some(var) = defined_variable(inst) {
                    def_variable.insert(index, var.to_string());
                    defs_by_var.entry(var).or_default().insert(index);
                }
            }
        }

        let summaries: Vec<BlockSummary> = blocks
            .iter()
            .map(|block| {
                let mut last_def: FxHashMap<&str, usize> = FxHashMap::default();
                for (index, inst) in block.index_range().zip(&block.instructions) {
                    if let Some(var) = defined_variable(inst) {
                        last_def.insert(var, index);
                    }
                }
                let gen: DefSet = last_def.values().copied().collect();
                let kill: DefSet = last_def
                    .keys()
                    .flat_map(|var| defs_by_var[var].iter().copied())
                    .filter(|idx| !gen.contains(idx))
                    .collect();
                BlockSummary { gen, kill }
            })
            .collect();

        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); blocks.len()];
        let mut succs: Vec<Vec<usize>> = vec![Vec::new(); blocks.len()];
        for (from, block) in blocks.iter().enumerate() {
            for target in block.successors() {
                if let Some(to) = cfg.position(target) {
                    preds[to].push(from);
                    succs[from].push(to);
                }
            }
        }

        let mut ins: Vec<DefSet> = vec![DefSet::new(); blocks.len()];
        let mut outs: Vec<DefSet> = summaries.iter().map(|s| s.gen.clone()).collect();
        let mut queued = vec![true; blocks.len()];
        let mut worklist: VecDeque<usize> = (0..blocks.len()).collect();
        let mut iterations = 0;
        let mut converged = true;

        while let Some(b) = worklist.pop_front() {
            if iterations >= max_iterations {
                converged = false;
                break;
            }
            iterations += 1;
            queued[b] = false;

            let mut input = DefSet::new();
            for &p in &preds[b] {
                input.extend(outs[p].iter().copied());
            }
            let mut output = summaries[b].gen.clone();
            output.extend(input.difference(&summaries[b].kill).copied());
            ins[b] = input;

            if output != outs[b] {
                outs[b] = output;
                for &s in &succs[b] {
                    if !queued[s] {
                        queued[s] = true;
                        worklist.push_back(s);
                    }
                }
            }
        }

        if !converged {
            tracing::warn!(
                "reaching definitions did not converge within {} iterations ({} blocks)",
                max_iterations,
                blocks.len()
            );
        }

        let label = |i: usize| blocks[i].label.clone();
        Self {
            block_in: ins.into_iter().enumerate().map(|(i, s)| (label(i), s)).collect(),
            block_out: outs.into_iter().enumerate().map(|(i, s)| (label(i), s)).collect(),
            def_variable,
            iterations,
            converged,
        }
    }

    pub fn reaching_in(&self, label: &str) -> Option<&DefSet> {
        self.block_in.get(label)
    }

    pub fn reaching_out(&self, label: &str) -> Option<&DefSet> {
        self.block_out.get(label)
    }

    /// Definitions of `variable` live on entry to `label`
    pub fn reaching_defs_of(&self, label: &str, variable: &str) -> Vec<usize> {
        self.reaching_in(label)
            .map(|set| {
                set.iter()
                    .copied()
                    .filter(|idx| self.variable_of(*idx) == Some(variable))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn variable_of(&self, def_index: usize) -> Option<&str> {
        self.def_variable.get(&def_index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::build_full_cfg;
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;
    use crate::shared::models::IrInstruction;

    fn store_indices(ir: &[IrInstruction], var: &str) -> Vec<usize> {
        ir.iter()
            .enumerate()
            .filter(|(_, i)| defined_variable(i) == Some(var))
            .map(|(idx, _)| idx)
            .collect()
    }

    #[test]
    fn test_both_branches_reach_join() {
        let ir = lower_with_language(
            LanguageId::Python,
            "if c:\n    x = 1\nelse:\n    x = 2\nprint(x)\n",
        );
        let cfg = build_full_cfg(&ir);
        let rd = ReachingDefinitions::compute(&cfg, 1000);
        assert!(rd.converged);

        let join = cfg
            .blocks()
            .iter()
            .rev()
            .find(|b| b.label.starts_with("if_end"))
            .expect("join block");
        assert_eq!(rd.reaching_defs_of(&join.label, "x"), store_indices(&ir, "x"));
    }

    #[test]
    fn test_redefinition_kills() {
        let ir = lower_with_language(LanguageId::Python, "x = 1\nx = 2\nwhile x:\n    x = 3\n");
        let cfg = build_full_cfg(&ir);
        let rd = ReachingDefinitions::compute(&cfg, 1000);
        let stores = store_indices(&ir, "x");
        assert_eq!(stores.len(), 3);

        let entry_out = rd.reaching_out("entry").expect("entry block");
        assert!(!entry_out.contains(&stores[0]));
        assert!(entry_out.contains(&stores[1]));

        let cond = cfg
            .blocks()
            .iter()
            .find(|b| b.label.starts_with("while_cond"))
            .expect("loop header");
        assert_eq!(rd.reaching_defs_of(&cond.label, "x"), vec![stores[1], stores[2]]);
    }

    #[test]
    fn test_iteration_bound() {
        let ir = lower_with_language(LanguageId::Python, "i = 0\nwhile i < 3:\n    i = i + 1\n");
        let cfg = build_full_cfg(&ir);
        let rd = ReachingDefinitions::compute(&cfg, 1);
        assert!(!rd.converged);
        assert_eq!(rd.iterations, 1);
    }
}

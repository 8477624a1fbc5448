//! Def-use chains from reaching definitions

use super::defs_uses::{defined_variable, used_variable};
use super::reaching::ReachingDefinitions;
use crate::features::data_flow::domain::DefUseChain;
use crate::features::flow_graph::domain::Cfg;

/// One chain per LOAD_VAR, ordered by use index
///
/// Each block is replayed from its IN set: a STORE_VAR replaces every live
/// definition of its variable, a LOAD_VAR records whatever is live for it.
pub fn def_use_chains(cfg: &Cfg, reaching: &ReachingDefinitions) -> Vec<DefUseChain> {
    let mut chains = Vec::new();
    for block in cfg.blocks() {
        let mut live = reaching.reaching_in(&block.label).cloned().unwrap_or_default();
        for (index, inst) in block.index_range().zip(&block.instructions) {
            if let Some(var) = used_variable(inst) {
                chains.push(DefUseChain {
                    variable: var.to_string(),
                    use_index: index,
                    def_indices: live
                        .iter()
                        .copied()
                        .filter(|d| reaching.variable_of(*d) == Some(var))
                        .collect(),
                });
            } else if let Some(var) = defined_variable(inst) {
                live.retain(|d| reaching.variable_of(*d) != Some(var));
                live.insert(index);
            }
        }
    }
    chains.sort_by_key(|c| c.use_index);
    chains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::build_full_cfg;
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;

    fn chains_for(lang: LanguageId, src: &str) -> Vec<DefUseChain> {
        let ir = lower_with_language(lang, src);
        let cfg = build_full_cfg(&ir);
        let rd = ReachingDefinitions::compute(&cfg, 1000);
        def_use_chains(&cfg, &rd)
    }

    #[test]
    fn test_straight_line_use_sees_latest_def() {
        let chains = chains_for(LanguageId::Python, "x = 1\nx = 2\ny = x\n");
        let x_use: Vec<&DefUseChain> = chains.iter().filter(|c| c.variable == "x").collect();
        assert_eq!(x_use.len(), 1);
        assert_eq!(x_use[0].def_indices.len(), 1);
    }

    #[test]
    fn test_loop_use_sees_both_defs() {
        let chains = chains_for(LanguageId::Python, "i = 0\nwhile i < 3:\n    i = i + 1\n");
        let first = chains.iter().find(|c| c.variable == "i").expect("use of i");
        assert_eq!(first.def_indices.len(), 2);
    }

    #[test]
    fn test_free_variable() {
        let chains = chains_for(LanguageId::Python, "print(y)\n");
        assert!(chains.iter().any(|c| c.variable == "y" && c.is_free()));
    }
}

//! Data-flow passes
//!
//! ```text
//! defs_uses   STORE_VAR / LOAD_VAR sites
//! reaching    GEN/KILL worklist over the CFG
//! def_use     LOAD_VAR -> reaching STORE_VARs
//! dependency  variable -> variables its stored value was computed from
//! ```

pub mod def_use;
pub mod defs_uses;
pub mod dependency;
pub mod reaching;

pub use def_use::def_use_chains;
pub use defs_uses::{defined_variable, defs_and_uses, used_variable, DefsUses};
pub use dependency::DependencyGraph;
pub use reaching::ReachingDefinitions;

use crate::config::DataFlowConfig;
use crate::features::data_flow::domain::DefUseChain;
use crate::features::flow_graph::build_full_cfg;
use crate::shared::models::IrInstruction;

/// Everything the data-flow passes produce for one unit
#[derive(Debug, Clone)]
pub struct DataFlowResult {
    pub defs_uses: DefsUses,
    pub reaching: ReachingDefinitions,
    pub chains: Vec<DefUseChain>,
    pub dependencies: DependencyGraph,
}

/// Run every pass over an unpruned CFG of `instructions`
pub fn analyze(instructions: &[IrInstruction], config: &DataFlowConfig) -> DataFlowResult {
    let cfg = build_full_cfg(instructions);
    let reaching = ReachingDefinitions::compute(&cfg, config.max_iterations);
    let chains = def_use_chains(&cfg, &reaching);
    let result = DataFlowResult {
        defs_uses: defs_and_uses(instructions),
        chains,
        dependencies: DependencyGraph::build(instructions),
        reaching,
    };
    tracing::debug!(
        "data flow: {} defs, {} uses, {} chains, {} dependency edges",
        result.defs_uses.defs.len(),
        result.defs_uses.uses.len(),
        result.chains.len(),
        result.dependencies.edge_count()
    );
    result
}

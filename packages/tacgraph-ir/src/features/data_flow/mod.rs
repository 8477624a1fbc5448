//! Data-flow analysis over the flat IR
//!
//! Named variables only: STORE_VAR defines, LOAD_VAR uses. Registers are
//! single-assignment, so they need no analysis of their own; they are
//! traced back to the variables they were loaded from.

pub mod domain;
pub mod infrastructure;

pub use domain::{DefUseChain, VarSite};
pub use infrastructure::{
    analyze, def_use_chains, defs_and_uses, DataFlowResult, DependencyGraph, ReachingDefinitions,
};

//! Feature modules
//!
//! Each feature keeps its contracts in `ports/`, pure data in `domain/` and
//! the working code in `infrastructure/`.

pub mod data_flow;
pub mod flow_graph;
pub mod lowering;
pub mod parsing;

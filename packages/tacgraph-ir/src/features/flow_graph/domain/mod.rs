pub mod cfg;

pub use cfg::{BasicBlock, Cfg, CfgEdge, CfgEdgeKind};

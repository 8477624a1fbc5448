//! Flow graph feature: flat IR -> basic blocks -> rendered diagram
//!
//! Depends only on the IR model, so it accepts instruction streams from any
//! `Frontend`.

pub mod domain;
pub mod infrastructure;

pub use domain::{BasicBlock, Cfg, CfgEdge, CfgEdgeKind};
pub use infrastructure::{
    build_cfg, build_full_cfg, extract_class, extract_function, render_mermaid, render_text,
    CfgBuilder, FunctionRegistry, MermaidRenderer,
};

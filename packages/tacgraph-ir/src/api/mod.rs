//! Language-agnostic facade
//!
//! String in, IR / CFG / diagram out. Every entry point has a
//! `_with_config` twin taking a [`PipelineConfig`]; the plain form uses the
//! balanced preset.
//!
//! [`PipelineConfig`]: crate::config::PipelineConfig

pub mod batch;
pub mod flow;
pub mod lower;

pub use batch::{lower_batch, lower_batch_with_config};
pub use flow::{
    build_cfg_from_source, build_cfg_from_source_with_config, dump_cfg, dump_cfg_with_config,
    dump_mermaid, dump_mermaid_with_config,
};
pub use lower::{
    analyze_source, analyze_source_with_config, dump_ir, dump_ir_json, dump_ir_json_with_config,
    dump_ir_with_config, language_from_name, lower_source, lower_source_with_config,
};

/*
 * tacgraph-ir - multi-language three-address-code lowering
 *
 * Feature-first layout:
 * - shared/      : IR model, constants, IR utilities
 * - features/    : parsing -> lowering -> flow_graph -> data_flow
 * - config/      : presets and YAML pipeline configuration
 * - api/         : string-in / string-out facade
 *
 * Every language lowers into the same flat instruction stream; everything
 * downstream of lowering is language-agnostic.
 */

#![allow(clippy::too_many_arguments)] // Lowering routines mirror grammar shapes
#![allow(clippy::module_inception)] // Module naming intentional

/// IR model and utilities
pub mod shared;

/// Parsing, lowering, CFG and data-flow features
pub mod features;

/// Pipeline configuration (presets + YAML)
pub mod config;

/// Language-agnostic facade
pub mod api;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use api::{
    analyze_source, build_cfg_from_source, dump_cfg, dump_ir, dump_ir_json, dump_mermaid,
    lower_batch, lower_source,
};
pub use config::{PipelineConfig, Preset};
pub use features::flow_graph::{BasicBlock, Cfg, CfgEdge, CfgEdgeKind, FunctionRegistry};
pub use features::lowering::{DeterministicFrontend, Frontend, LanguageProfile};
pub use features::parsing::LanguageId;
pub use shared::models::{
    ErrorKind, IrInstruction, LabelRef, Opcode, Operand, Register, Result, SourceLocation,
    TacError,
};

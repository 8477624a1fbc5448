//! Source -> IR entry points

use crate::config::PipelineConfig;
use crate::features::data_flow::{analyze, DataFlowResult};
use crate::features::lowering::{DeterministicFrontend, Frontend};
use crate::features::parsing::LanguageId;
use crate::shared::models::{IrInstruction, Result, TacError};

/// Resolve a language by name or alias (`py`, `ts`, `c#`, ...)
pub fn language_from_name(name: &str) -> Result<LanguageId> {
    LanguageId::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = LanguageId::ALL.iter().map(|l| l.name()).collect();
        TacError::not_found(format!(
            "unknown language '{}' (supported: {})",
            name,
            known.join(", ")
        ))
    })
}

pub fn lower_source(language: LanguageId, source: &str) -> Result<Vec<IrInstruction>> {
    lower_source_with_config(language, source, &PipelineConfig::default())
}

pub fn lower_source_with_config(
    language: LanguageId,
    source: &str,
    config: &PipelineConfig,
) -> Result<Vec<IrInstruction>> {
    config.validate()?;
    DeterministicFrontend::with_config(language, config.lowering.clone())
        .lower(None, source.as_bytes())
}

/// One instruction per line, with source locations
pub fn dump_ir(language: LanguageId, source: &str) -> Result<String> {
    dump_ir_with_config(language, source, &PipelineConfig::default())
}

pub fn dump_ir_with_config(
    language: LanguageId,
    source: &str,
    config: &PipelineConfig,
) -> Result<String> {
    let instructions = lower_source_with_config(language, source, config)?;
    let mut out = String::with_capacity(instructions.len() * 24);
    for inst in &instructions {
        out.push_str(&inst.to_string());
        out.push('\n');
    }
    Ok(out)
}

/// Pretty-printed JSON array of instructions
pub fn dump_ir_json(language: LanguageId, source: &str) -> Result<String> {
    dump_ir_json_with_config(language, source, &PipelineConfig::default())
}

pub fn dump_ir_json_with_config(
    language: LanguageId,
    source: &str,
    config: &PipelineConfig,
) -> Result<String> {
    let instructions = lower_source_with_config(language, source, config)?;
    Ok(serde_json::to_string_pretty(&instructions)?)
}

/// Lower, then run reaching definitions, def-use chains and the
/// dependency graph over the whole unit
pub fn analyze_source(language: LanguageId, source: &str) -> Result<DataFlowResult> {
    analyze_source_with_config(language, source, &PipelineConfig::default())
}

pub fn analyze_source_with_config(
    language: LanguageId,
    source: &str,
    config: &PipelineConfig,
) -> Result<DataFlowResult> {
    let instructions = lower_source_with_config(language, source, config)?;
    Ok(analyze(&instructions, &config.data_flow))
}

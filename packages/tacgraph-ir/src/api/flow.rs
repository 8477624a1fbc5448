//! Source -> CFG / rendered diagram entry points

use super::lower::lower_source_with_config;
use crate::config::PipelineConfig;
use crate::features::flow_graph::{extract_function, render_text, Cfg, CfgBuilder, MermaidRenderer};
use crate::features::parsing::LanguageId;
use crate::shared::models::Result;

/// CFG of the whole unit, or of one function when `function` names it
///
/// An unknown function name is `ErrorKind::NotFound`, listing the
/// functions the unit does define.
pub fn build_cfg_from_source(
    language: LanguageId,
    source: &str,
    function: Option<&str>,
) -> Result<Cfg> {
    build_cfg_from_source_with_config(language, source, function, &PipelineConfig::default())
}

pub fn build_cfg_from_source_with_config(
    language: LanguageId,
    source: &str,
    function: Option<&str>,
    config: &PipelineConfig,
) -> Result<Cfg> {
    let instructions = lower_source_with_config(language, source, config)?;
    let builder = CfgBuilder::new(config.cfg.clone());
    match function {
        Some(name) => Ok(builder.build(&extract_function(&instructions, name)?)),
        None => Ok(builder.build(&instructions)),
    }
}

/// Textual block listing with edges
pub fn dump_cfg(language: LanguageId, source: &str, function: Option<&str>) -> Result<String> {
    dump_cfg_with_config(language, source, function, &PipelineConfig::default())
}

pub fn dump_cfg_with_config(
    language: LanguageId,
    source: &str,
    function: Option<&str>,
    config: &PipelineConfig,
) -> Result<String> {
    let cfg = build_cfg_from_source_with_config(language, source, function, config)?;
    Ok(render_text(&cfg))
}

pub fn dump_mermaid(language: LanguageId, source: &str, function: Option<&str>) -> Result<String> {
    dump_mermaid_with_config(language, source, function, &PipelineConfig::default())
}

pub fn dump_mermaid_with_config(
    language: LanguageId,
    source: &str,
    function: Option<&str>,
    config: &PipelineConfig,
) -> Result<String> {
    let cfg = build_cfg_from_source_with_config(language, source, function, config)?;
    Ok(MermaidRenderer::new(config.cfg.clone()).render(&cfg))
}

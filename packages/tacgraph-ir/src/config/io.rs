//! Configuration I/O (YAML schema)
//!
//! Defines the YAML schema types. Loading and saving live on
//! `PipelineConfig`.

use super::stage_configs::{BatchConfig, CfgConfig, DataFlowConfig, LoweringConfig};
use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1); optional only so a missing field
    /// can be reported precisely
    #[serde(default)]
    pub version: Option<u32>,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lowering: Option<LoweringConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfg: Option<CfgConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_flow: Option<DataFlowConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchConfig>,
}

//! Top-level pipeline configuration

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides};
use super::preset::Preset;
use super::stage_configs::{BatchConfig, CfgConfig, DataFlowConfig, LoweringConfig};
use std::path::Path;

/// Supported YAML schema versions
const SUPPORTED_VERSIONS: [u32; 1] = [1];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub preset: Preset,
    pub lowering: LoweringConfig,
    pub cfg: CfgConfig,
    pub data_flow: DataFlowConfig,
    pub batch: BatchConfig,
}

impl PipelineConfig {
    /// Complete configuration for a preset
    pub fn preset(preset: Preset) -> Self {
        Self {
            preset,
            lowering: LoweringConfig::from_preset(preset),
            cfg: CfgConfig::from_preset(preset),
            data_flow: DataFlowConfig::from_preset(preset),
            batch: BatchConfig::default(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.lowering.validate()?;
        self.cfg.validate()?;
        self.data_flow.validate()?;
        self.batch.validate()?;
        Ok(())
    }

    /// Load from a YAML file (v1 schema)
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        let version = export.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;

        let mut config = Self::preset(preset);
        if let Some(overrides) = export.overrides {
            if let Some(lowering) = overrides.lowering {
                config.lowering = lowering;
            }
            if let Some(cfg) = overrides.cfg {
                config.cfg = cfg;
            }
            if let Some(data_flow) = overrides.data_flow {
                config.data_flow = data_flow;
            }
            if let Some(batch) = overrides.batch {
                config.batch = batch;
            }
        }

        config.validate()?;
        tracing::debug!("Loaded pipeline config (preset={})", config.preset);
        Ok(config)
    }

    /// Serialize to YAML; every stage is written as an explicit override
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: Some(SUPPORTED_VERSIONS[0]),
            preset: self.preset.as_str().to_string(),
            overrides: Some(ConfigOverrides {
                lowering: Some(self.lowering.clone()),
                cfg: Some(self.cfg.clone()),
                data_flow: Some(self.data_flow.clone()),
                batch: Some(self.batch.clone()),
            }),
        };
        Ok(serde_yaml::to_string(&export)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::preset(Preset::Balanced)
    }
}

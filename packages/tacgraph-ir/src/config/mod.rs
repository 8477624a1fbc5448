//! Pipeline configuration
//!
//! Presets (fast / balanced / thorough / custom) give complete defaults;
//! a versioned YAML file may override individual stages.

pub mod error;
pub mod io;
pub mod pipeline_config;
pub mod preset;
pub mod stage_configs;

pub use error::{ConfigError, ConfigResult};
pub use pipeline_config::PipelineConfig;
pub use preset::Preset;
pub use stage_configs::{BatchConfig, CfgConfig, DataFlowConfig, LoweringConfig};

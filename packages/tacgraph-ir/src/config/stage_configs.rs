//! Per-stage configuration (lowering, CFG rendering, data flow, batching)

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

// ═══════════════════════════════════════════════════════════════════════════
// Lowering
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoweringConfig {
    /// Expression nesting beyond this depth lowers to a placeholder (16..=100000)
    pub max_depth: usize,

    /// Log every unsupported node kind at warn level (otherwise debug)
    #[serde(default = "default_true")]
    pub log_unsupported: bool,
}

impl LoweringConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                max_depth: 256,
                log_unsupported: false,
            },
            Preset::Balanced | Preset::Custom => Self {
                max_depth: 512,
                log_unsupported: true,
            },
            Preset::Thorough => Self {
                max_depth: 2048,
                log_unsupported: true,
            },
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_depth < 16 || self.max_depth > 100_000 {
            return Err(ConfigError::range_with_hint(
                "max_depth",
                self.max_depth,
                16,
                100_000,
                "Real programs nest deeper than 16 levels",
            ));
        }
        Ok(())
    }
}

impl Default for LoweringConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CFG rendering
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CfgConfig {
    /// Blocks with more instruction lines than this are collapsed
    pub collapse_threshold: usize,

    /// Leading lines kept when a block is collapsed
    pub collapse_keep: usize,

    /// Maximum characters of a rendered instruction line
    pub summary_max_chars: usize,

    /// Draw dashed call edges to function entry blocks
    pub show_call_edges: bool,

    /// Drop blocks unreachable from entry / function entries
    pub prune_unreachable: bool,
}

impl CfgConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                collapse_threshold: 4,
                collapse_keep: 2,
                summary_max_chars: 40,
                show_call_edges: false,
                prune_unreachable: true,
            },
            Preset::Balanced | Preset::Custom => Self {
                collapse_threshold: 6,
                collapse_keep: 4,
                summary_max_chars: 60,
                show_call_edges: true,
                prune_unreachable: true,
            },
            Preset::Thorough => Self {
                collapse_threshold: 24,
                collapse_keep: 20,
                summary_max_chars: 120,
                show_call_edges: true,
                prune_unreachable: true,
            },
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.collapse_threshold == 0 {
            return Err(ConfigError::range_with_hint(
                "collapse_threshold",
                self.collapse_threshold,
                1,
                usize::MAX,
                "A block needs at least one visible line",
            ));
        }
        if self.collapse_keep == 0 || self.collapse_keep >= self.collapse_threshold {
            return Err(ConfigError::range_with_hint(
                "collapse_keep",
                self.collapse_keep,
                1,
                self.collapse_threshold.saturating_sub(1),
                "Keep fewer lines than the collapse threshold",
            ));
        }
        if self.summary_max_chars < 8 {
            return Err(ConfigError::range_with_hint(
                "summary_max_chars",
                self.summary_max_chars,
                8,
                usize::MAX,
                "Lines shorter than 8 characters are unreadable",
            ));
        }
        Ok(())
    }
}

impl Default for CfgConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Data flow
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataFlowConfig {
    /// Worklist iteration bound for reaching definitions (1..=100000)
    pub max_iterations: usize,
}

impl DataFlowConfig {
    pub fn from_preset(preset: Preset) -> Self {
        match preset {
            Preset::Fast => Self {
                max_iterations: 100,
            },
            Preset::Balanced | Preset::Custom => Self {
                max_iterations: 1000,
            },
            Preset::Thorough => Self {
                max_iterations: 10_000,
            },
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_iterations == 0 || self.max_iterations > 100_000 {
            return Err(ConfigError::range_with_hint(
                "max_iterations",
                self.max_iterations,
                1,
                100_000,
                "The worklist needs at least one pass",
            ));
        }
        Ok(())
    }
}

impl Default for DataFlowConfig {
    fn default() -> Self {
        Self::from_preset(Preset::Balanced)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Batch lowering
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker threads; `None` uses every core
    #[serde(default)]
    pub threads: Option<usize>,
}

impl BatchConfig {
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.threads == Some(0) {
            return Err(ConfigError::Validation(
                "threads must be at least 1 or omitted".to_string(),
            ));
        }
        Ok(())
    }
}

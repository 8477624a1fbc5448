//! Grammar-backed frontend
//!
//! Stateless between calls: every `lower` builds a fresh `LoweringContext`,
//! so one frontend can serve any number of threads.

use super::context::LoweringContext;
use crate::config::LoweringConfig;
use crate::features::lowering::ports::{Frontend, LanguageProfile};
use crate::features::parsing::infrastructure::TreeSitterParser;
use crate::features::parsing::plugins::registry;
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{IrInstruction, Result};
use tree_sitter::Tree;

pub struct DeterministicFrontend {
    profile: &'static dyn LanguageProfile,
    config: LoweringConfig,
}

impl DeterministicFrontend {
    pub fn new(language: LanguageId) -> Self {
        Self::with_config(language, LoweringConfig::default())
    }

    pub fn with_config(language: LanguageId, config: LoweringConfig) -> Self {
        Self {
            profile: registry::profile_for(language),
            config,
        }
    }

    pub fn language(&self) -> LanguageId {
        self.profile.language()
    }

    fn lower_tree(&self, tree: &Tree, source: &[u8]) -> Vec<IrInstruction> {
        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(
                "[{}] lowering a tree with syntax errors",
                self.language().name()
            );
        }
        let mut ctx = LoweringContext::new(self.profile, source, self.config.clone());
        ctx.lower_root(root);
        let instructions = ctx.finish();
        tracing::debug!(
            "[{}] lowered {} bytes into {} instructions",
            self.language().name(),
            source.len(),
            instructions.len()
        );
        instructions
    }
}

impl Frontend for DeterministicFrontend {
    fn lower(&self, tree: Option<&Tree>, source: &[u8]) -> Result<Vec<IrInstruction>> {
        match tree {
            Some(tree) => Ok(self.lower_tree(tree, source)),
            None => {
                let tree = TreeSitterParser::new(self.language()).parse(source)?;
                Ok(self.lower_tree(&tree, source))
            }
        }
    }
}

//! Frontend Port
//!
//! The one contract shared by every IR producer: deterministic grammar
//! frontends here, and any externally hosted producer that wants to feed
//! the CFG builder.

use crate::shared::models::{IrInstruction, Result};
use tree_sitter::Tree;

pub trait Frontend: Send + Sync {
    /// Lower a unit of source to IR.
    ///
    /// When `tree` is `None` the frontend parses `source` itself. The
    /// returned stream always starts with `LABEL entry`.
    fn lower(&self, tree: Option<&Tree>, source: &[u8]) -> Result<Vec<IrInstruction>>;
}

//! Data-flow domain model

use crate::shared::models::SourceLocation;
use serde::{Deserialize, Serialize};

/// One definition or use of a named variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VarSite {
    /// Index into the instruction stream
    pub index: usize,
    pub variable: String,
    pub location: SourceLocation,
}

/// A LOAD_VAR and the STORE_VARs that may reach it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefUseChain {
    pub variable: String,
    pub use_index: usize,
    /// Stream indices of reaching definitions, ascending
    pub def_indices: Vec<usize>,
}

impl DefUseChain {
    /// No definition reaches: a global, a builtin, or a read before any write
    pub fn is_free(&self) -> bool {
        self.def_indices.is_empty()
    }
}

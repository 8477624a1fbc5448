//! Naming conventions shared by the lowering engine and the CFG builder
//!
//! The label prefixes are load-bearing: the CFG renderer groups blocks into
//! subgraphs purely by matching them.

/// Label of the first instruction of every lowered unit
pub const ENTRY_LABEL: &str = "entry";

/// `func_<name>_<n>` opens a function body
pub const FUNC_LABEL_PREFIX: &str = "func_";

/// `end_<name>_<n>` closes a function body
pub const END_LABEL_PREFIX: &str = "end_";

/// `class_<name>_<n>` opens a class body
pub const CLASS_LABEL_PREFIX: &str = "class_";

/// `end_class_<name>_<n>` closes a class body
pub const END_CLASS_LABEL_PREFIX: &str = "end_class_";

/// `SYMBOLIC "param:<name>"` marks a function parameter
pub const PARAM_PREFIX: &str = "param:";

/// `SYMBOLIC "unsupported:<kind>"` stands in for an unmodelled construct
pub const UNSUPPORTED_PREFIX: &str = "unsupported:";

/// Synthetic variable names used by desugarings
pub const FOR_INDEX_VAR: &str = "__for_idx";
pub const TERNARY_VAR: &str = "__ternary";
pub const MATCH_RESULT_VAR: &str = "__match_result";
pub const BLOCK_RESULT_VAR: &str = "__block_result";
pub const COMPREHENSION_VAR: &str = "__comp";

/// Name constructors are bound under, whatever the source spelling
pub const CONSTRUCTOR_NAME: &str = "__init__";

//! Lowering ports (traits the engine and its callers depend on)

pub mod frontend;
pub mod profile;

pub use frontend::Frontend;
pub use profile::{ExprHandler, FieldNames, LanguageProfile, Literals, NodeKinds, StmtHandler};

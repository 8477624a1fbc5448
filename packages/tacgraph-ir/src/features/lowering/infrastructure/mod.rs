//! Lowering engine
//!
//! `context` holds per-call state, `dispatch` walks the tree through the
//! profile's tables, and the remaining modules are the shared routines that
//! profiles reference from their tables or call from their own handlers.

pub mod assignments;
pub mod collections;
pub mod context;
pub mod control_flow;
pub mod definitions;
mod dispatch;
pub mod expressions;
pub mod frontend;
pub mod profile_table;

pub use context::LoweringContext;
pub use control_flow::CaseStyle;
pub use frontend::DeterministicFrontend;
pub use profile_table::{TableProfile, TableProfileBuilder};

#[cfg(test)]
pub(crate) fn lower_with_language(
    language: crate::features::parsing::ports::LanguageId,
    source: &str,
) -> Vec<crate::shared::models::IrInstruction> {
    use crate::features::lowering::ports::Frontend;
    DeterministicFrontend::new(language)
        .lower(None, source.as_bytes())
        .expect("lowering")
}

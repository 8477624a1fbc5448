//! Lowering feature: parse tree -> flattened TAC
//!
//! ```text
//! ports           LanguageProfile / Frontend contracts
//! domain          SyntaxNode extension trait, loop / try shapes
//! infrastructure  LoweringContext, dispatch driver, shared routines
//! ```

pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use infrastructure::{DeterministicFrontend, LoweringContext, TableProfile};
pub use ports::{Frontend, LanguageProfile};

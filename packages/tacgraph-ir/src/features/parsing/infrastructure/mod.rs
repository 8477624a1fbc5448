//! Parsing infrastructure

pub mod parser;

pub use parser::{SyntaxIssue, TreeSitterParser};

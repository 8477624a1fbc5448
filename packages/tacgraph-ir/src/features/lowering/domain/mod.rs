//! Lowering domain types

pub mod syntax;

pub use syntax::SyntaxNode;

/// Jump targets of the innermost enclosing loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopTargets {
    /// Where `continue` goes (condition or update label)
    pub continue_label: String,
    /// Where `break` goes
    pub end_label: String,
}

impl LoopTargets {
    pub fn new(continue_label: impl Into<String>, end_label: impl Into<String>) -> Self {
        Self {
            continue_label: continue_label.into(),
            end_label: end_label.into(),
        }
    }
}

/// One catch arm handed to the shared try/catch routine
#[derive(Debug, Clone, Copy)]
pub struct CatchClause<'t> {
    /// Name the caught exception is bound to, if any
    pub variable: Option<tree_sitter::Node<'t>>,
    /// Exception type expression, if any
    pub exception_type: Option<tree_sitter::Node<'t>>,
    pub body: Option<tree_sitter::Node<'t>>,
}

/// Pieces of a try statement, gathered by each language's extractor
#[derive(Debug, Clone, Default)]
pub struct TryParts<'t> {
    pub body: Option<tree_sitter::Node<'t>>,
    pub catches: Vec<CatchClause<'t>>,
    pub else_body: Option<tree_sitter::Node<'t>>,
    pub finally_body: Option<tree_sitter::Node<'t>>,
}

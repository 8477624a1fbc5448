//! Tree-sitter parser implementation
//!
//! This is where the grammar crates are bound to a `tree_sitter::Parser`.

use tree_sitter::{Parser as TSParser, Tree};

use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{Result, SourceLocation, TacError};

/// Tree-sitter based parser for one language
pub struct TreeSitterParser {
    language: LanguageId,
}

/// Location and kind of an ERROR / MISSING node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxIssue {
    pub kind: String,
    pub location: SourceLocation,
}

impl TreeSitterParser {
    pub fn new(language: LanguageId) -> Self {
        Self { language }
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn parse(&self, source: &[u8]) -> Result<Tree> {
        let mut parser = TSParser::new();
        parser
            .set_language(&self.language.tree_sitter_language())
            .map_err(|e| TacError::parse(format!("Failed to set language {}: {}", self.language, e)))?;

        parser
            .parse(source, None)
            .ok_or_else(|| TacError::parse(format!("Failed to parse {} source", self.language)))
    }

    /// ERROR / MISSING nodes of a parsed tree, in document order
    pub fn syntax_issues(tree: &Tree) -> Vec<SyntaxIssue> {
        let mut issues = Vec::new();
        let mut cursor = tree.walk();
        let mut visited_children = false;
        loop {
            let node = cursor.node();
            if !visited_children && (node.is_error() || node.is_missing()) {
                let start = node.start_position();
                let end = node.end_position();
                issues.push(SyntaxIssue {
                    kind: node.kind().to_string(),
                    location: SourceLocation::new(
                        start.row as u32 + 1,
                        start.column as u32,
                        end.row as u32 + 1,
                        end.column as u32,
                    ),
                });
            }
            if !visited_children && cursor.goto_first_child() {
                continue;
            }
            if cursor.goto_next_sibling() {
                visited_children = false;
                continue;
            }
            if !cursor.goto_parent() {
                break;
            }
            visited_children = true;
        }
        issues
    }
}

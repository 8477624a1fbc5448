//! Parse-tree node contract consumed by the lowering engine
//!
//! Handlers never scan `tree_sitter::Node` ad hoc; they go through this
//! small extension interface (named-children iteration, field lookup, text,
//! location), so each structural extraction stays a short pure function.

use crate::shared::models::SourceLocation;
use std::borrow::Cow;
use tree_sitter::Node;

pub trait SyntaxNode<'t>: Copy {
    /// Child stored under a grammar field
    fn field(&self, name: &str) -> Option<Node<'t>>;

    /// All children stored under a (repeated) grammar field
    fn field_all(&self, name: &str) -> Vec<Node<'t>>;

    /// Every child, named or anonymous
    fn kids(&self) -> Vec<Node<'t>>;

    /// Named children only
    fn named_kids(&self) -> Vec<Node<'t>>;

    /// First named child of the given kind
    fn first_of_kind(&self, kind: &str) -> Option<Node<'t>>;

    /// First named child whose kind is not in `skip`
    fn first_named_except(&self, skip: &[&str]) -> Option<Node<'t>>;

    /// Whether any child (named or anonymous) has the given kind
    fn has_child_kind(&self, kind: &str) -> bool;

    fn location(&self) -> SourceLocation;

    fn text_in<'s>(&self, source: &'s [u8]) -> Cow<'s, str>;
}

impl<'t> SyntaxNode<'t> for Node<'t> {
    fn field(&self, name: &str) -> Option<Node<'t>> {
        self.child_by_field_name(name)
    }

    fn field_all(&self, name: &str) -> Vec<Node<'t>> {
        let mut cursor = self.walk();
        self.children_by_field_name(name, &mut cursor).collect()
    }

    fn kids(&self) -> Vec<Node<'t>> {
        let mut cursor = self.walk();
        self.children(&mut cursor).collect()
    }

    fn named_kids(&self) -> Vec<Node<'t>> {
        let mut cursor = self.walk();
        self.named_children(&mut cursor).collect()
    }

    fn first_of_kind(&self, kind: &str) -> Option<Node<'t>> {
        self.named_kids().into_iter().find(|c| c.kind() == kind)
    }

    fn first_named_except(&self, skip: &[&str]) -> Option<Node<'t>> {
        self.named_kids()
            .into_iter()
            .find(|c| !skip.contains(&c.kind()))
    }

    fn has_child_kind(&self, kind: &str) -> bool {
        self.kids().iter().any(|c| c.kind() == kind)
    }

    fn location(&self) -> SourceLocation {
        let start = self.start_position();
        let end = self.end_position();
        SourceLocation::new(
            start.row as u32 + 1,
            start.column as u32,
            end.row as u32 + 1,
            end.column as u32,
        )
    }

    fn text_in<'s>(&self, source: &'s [u8]) -> Cow<'s, str> {
        let end = self.end_byte().min(source.len());
        let start = self.start_byte().min(end);
        String::from_utf8_lossy(&source[start..end])
    }
}

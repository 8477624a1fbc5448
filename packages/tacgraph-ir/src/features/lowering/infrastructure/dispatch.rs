//! Recursive-descent driver over the two dispatch tables
//!
//! Statement lookup falls back to expression lowering, which falls back to
//! a `SYMBOLIC "unsupported:<kind>"` placeholder. Lowering a recognised
//! tree therefore never fails.

use super::context::LoweringContext;
use crate::features::lowering::domain::SyntaxNode;
use crate::shared::constants::ENTRY_LABEL;
use crate::shared::models::Register;
use tree_sitter::Node;

impl<'a> LoweringContext<'a> {
    /// Entry point for one unit: `LABEL entry`, then the root as a block
    pub fn lower_root(&mut self, root: Node<'_>) {
        self.emit_label(ENTRY_LABEL);
        self.lower_block(root);
    }

    /// Lower every named child of a statement container
    pub fn lower_block(&mut self, node: Node<'_>) {
        for child in node.named_kids() {
            self.lower_stmt(child);
        }
    }

    /// Lower a body that is either a statement container or one statement
    pub fn lower_body(&mut self, node: Option<Node<'_>>) {
        let Some(node) = node else {
            return;
        };
        if self.profile().is_block(node.kind()) {
            self.lower_block(node);
        } else {
            self.lower_stmt(node);
        }
    }

    pub fn lower_stmt(&mut self, node: Node<'_>) {
        let kind = node.kind();
        if self.profile().is_skipped(kind) {
            return;
        }
        if let Some(handler) = self.profile().statement_handler(kind) {
            handler(self, node);
            return;
        }
        self.lower_expr(node);
    }

    pub fn lower_expr(&mut self, node: Node<'_>) -> Register {
        let kind = node.kind();
        if self.depth >= self.config().max_depth {
            tracing::warn!(
                "[{}] nesting deeper than {} at {}",
                self.profile().language().name(),
                self.config().max_depth,
                node.location()
            );
            return self.symbolic("unsupported:depth_limit", node.location());
        }
        match self.profile().expression_handler(kind) {
            Some(handler) => {
                self.depth += 1;
                let reg = handler(self, node);
                self.depth -= 1;
                reg
            }
            None => self.unsupported(kind, node.location()),
        }
    }

    /// Lower an optional expression; a missing node yields the none literal
    pub fn lower_opt_expr(&mut self, node: Option<Node<'_>>) -> Register {
        match node {
            Some(node) => self.lower_expr(node),
            None => self.const_none(),
        }
    }

    /// Lower the named children of `node` that are not comments or noise
    pub fn lower_named_children_as_stmts(&mut self, node: Node<'_>, skip: &[&str]) {
        for child in node.named_kids() {
            if !skip.contains(&child.kind()) {
                self.lower_stmt(child);
            }
        }
    }

    /// Named children that are neither comments nor noise
    pub fn significant_children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        node.named_kids()
            .into_iter()
            .filter(|c| !self.profile().is_skipped(c.kind()))
            .collect()
    }
}

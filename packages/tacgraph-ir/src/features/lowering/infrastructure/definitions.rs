//! Function, parameter and class definitions
//!
//! A definition is skipped over by a leading BRANCH, bracketed by
//! `func_<name>_<n>` / `end_<name>_<n>` (or the `class_` pair) and then bound
//! to its name as a `<function:name@label>` / `<class:name@label>` constant.

use super::context::LoweringContext;
use crate::features::lowering::domain::SyntaxNode;
use crate::shared::constants::{CLASS_LABEL_PREFIX, END_CLASS_LABEL_PREFIX, END_LABEL_PREFIX, FUNC_LABEL_PREFIX};
use crate::shared::models::{param_marker, DefinitionRef, Opcode, Operand, Register, SourceLocation};
use tree_sitter::Node;

const PARAM_PUNCTUATION: &[&str] = &["(", ")", ",", ":", "->", "|", "[", "]"];

/// Function definition with the profile's name / parameters / body fields
pub fn function_def(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let fields = ctx.fields();
    let name = node
        .field(fields.func_name)
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let params = node.field(fields.func_params);
    let body = node.field(fields.func_body);
    ctx.lower_function_parts(&name, params, body, node);
}

/// Class definition with the profile's name / body fields
pub fn class_def(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let fields = ctx.fields();
    let name = node
        .field(fields.class_name)
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let body = node.field(fields.class_body);
    ctx.emit_class(&name, node, |ctx| ctx.lower_body(body));
}

/// Anonymous function / lambda / closure; the value is its function reference
pub fn anonymous_function(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let fields = ctx.fields();
    let params = node.field(fields.func_params).or_else(|| node.field("parameter"));
    let body = node.field(fields.func_body);
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        ctx.lower_params(params);
        ctx.lower_function_body(body);
    })
}

impl<'a> LoweringContext<'a> {
    /// `__anon_<n>` keyed on the label counter
    pub fn anonymous_name(&self) -> String {
        format!("__anon_{}", self.peek_label_counter())
    }

    /// Full named definition: bracket, parameters, body, name binding
    pub fn lower_function_parts(
        &mut self,
        name: &str,
        params: Option<Node<'_>>,
        body: Option<Node<'_>>,
        node: Node<'_>,
    ) {
        let func_ref = self.emit_function(name, node, |ctx| {
            ctx.lower_params(params);
            ctx.lower_function_body(body);
        });
        self.store_var(name, func_ref, node.location());
    }

    /// Emit the bracketed body and return the register holding its reference
    ///
    /// The caller decides whether to bind it to a name.
    pub fn emit_function<F>(&mut self, name: &str, node: Node<'_>, body: F) -> Register
    where
        F: FnOnce(&mut Self),
    {
        let func_label = self.fresh_label(&format!("{}{}", FUNC_LABEL_PREFIX, name));
        let end_label = self.fresh_label(&format!("{}{}", END_LABEL_PREFIX, name));
        self.emit(
            crate::shared::models::IrInstruction::branch(&end_label).with_location(node.location()),
        );
        self.emit_label(&func_label);

        let outer_labels = self.swap_user_labels(Default::default());
        body(self);
        self.swap_user_labels(outer_labels);

        let default = self.literals().default_return;
        let ret = self.const_value(default, SourceLocation::UNKNOWN);
        self.emit_effect(Opcode::Return, vec![ret.into()], SourceLocation::UNKNOWN);
        self.emit_label(&end_label);

        self.emit_value(
            Opcode::Const,
            vec![Operand::Definition(DefinitionRef::function(name, &func_label))],
            node.location(),
        )
    }

    /// Class bracket with no implicit return, bound to its name
    pub fn emit_class<F>(&mut self, name: &str, node: Node<'_>, body: F) -> Register
    where
        F: FnOnce(&mut Self),
    {
        let class_label = self.fresh_label(&format!("{}{}", CLASS_LABEL_PREFIX, name));
        let end_label = self.fresh_label(&format!("{}{}", END_CLASS_LABEL_PREFIX, name));
        self.emit(
            crate::shared::models::IrInstruction::branch(&end_label).with_location(node.location()),
        );
        self.emit_label(&class_label);

        body(self);

        self.emit_label(&end_label);
        let class_ref = self.emit_value(
            Opcode::Const,
            vec![Operand::Definition(DefinitionRef::class(name, &class_label))],
            node.location(),
        );
        self.store_var(name, class_ref, node.location());
        class_ref
    }

    /// Block bodies are lowered child by child; an expression body returns its value
    pub fn lower_function_body(&mut self, body: Option<Node<'_>>) {
        let Some(body) = body else {
            return;
        };
        if self.profile().is_block(body.kind()) || self.profile().statement_handler(body.kind()).is_some() {
            self.lower_body(Some(body));
        } else {
            let value = self.lower_expr(body);
            self.emit_effect(Opcode::Return, vec![value.into()], body.location());
        }
    }

    pub fn lower_params(&mut self, params: Option<Node<'_>>) {
        let Some(params) = params else {
            return;
        };
        if self.profile().is_identifier(params.kind()) {
            self.lower_param(params);
            return;
        }
        for child in params.kids() {
            self.lower_param(child);
        }
    }

    /// One parameter node: `SYMBOLIC param:<name>` then `STORE_VAR <name>`
    pub fn lower_param(&mut self, child: Node<'_>) {
        if PARAM_PUNCTUATION.contains(&child.kind()) || self.profile().is_skipped(child.kind()) {
            return;
        }
        if let Some(name) = self.extract_param_name(child) {
            self.emit_param(&name, child.location());
        }
    }

    /// The parameter encoding pair
    pub fn emit_param(&mut self, name: &str, location: SourceLocation) {
        let reg = self.symbolic(param_marker(name), location);
        self.store_var(name, reg, location);
    }

    /// Name of a parameter: the node itself, a `name` / `pattern` field, or
    /// the first identifier child
    pub fn extract_param_name(&self, child: Node<'_>) -> Option<String> {
        if self.profile().is_identifier(child.kind()) {
            return Some(self.text(child));
        }
        for field in ["name", "pattern"] {
            if let Some(named) = child.field(field) {
                if self.profile().is_identifier(named.kind()) || named.named_child_count() == 0 {
                    return Some(self.text(named));
                }
                if let Some(inner) = self.extract_param_name(named) {
                    return Some(inner);
                }
            }
        }
        child
            .named_kids()
            .into_iter()
            .find(|c| self.profile().is_identifier(c.kind()))
            .map(|c| self.text(c))
    }
}

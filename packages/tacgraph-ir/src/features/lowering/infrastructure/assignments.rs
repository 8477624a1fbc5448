//! Assignment and store-target resolution
//!
//! Every profile funnels writes through `lower_store_target`, which branches
//! on target shape only.

use super::context::LoweringContext;
use crate::features::lowering::domain::SyntaxNode;
use crate::shared::models::{Opcode, Register, SourceLocation};
use tree_sitter::Node;

const PAREN_KINDS: &[&str] = &["parenthesized_expression", "parenthesized_pattern"];

/// Prefix forms that denote `*ptr` when their operator is `*`
const DEREF_KINDS: &[&str] = &["pointer_expression", "unary_expression"];

/// Field name a dereference store writes through
pub const DEREF_FIELD: &str = "*";

/// `left = right` as a statement
pub fn assignment(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    assignment_expr(ctx, node);
}

/// `left = right` as an expression; the value is the stored register
pub fn assignment_expr(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let fields = ctx.fields();
    match (node.field(fields.assign_left), node.field(fields.assign_right)) {
        (Some(left), Some(right)) => {
            let value = ctx.lower_expr(right);
            ctx.lower_store_target(left, value, node);
            value
        }
        (Some(left), None) => {
            // Annotated declaration without a value
            let none = ctx.const_none();
            ctx.lower_store_target(left, none, node);
            none
        }
        _ => {
            ctx.malformed("assignment without a target", node);
            ctx.const_none()
        }
    }
}

/// `left op= right` as a statement
pub fn augmented_assignment(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    augmented_assignment_expr(ctx, node);
}

/// `left op= right`: the operator text with its `=` stripped becomes the BINOP
pub fn augmented_assignment_expr(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let fields = ctx.fields();
    let (Some(left), Some(right)) = (node.field(fields.assign_left), node.field(fields.assign_right))
    else {
        ctx.malformed("augmented assignment without both sides", node);
        return ctx.const_none();
    };
    let op_text = match node.field("operator") {
        Some(op) => ctx.text(op),
        None => node
            .kids()
            .into_iter()
            .find(|c| !c.is_named() && c.start_byte() >= left.end_byte() && c.end_byte() <= right.start_byte())
            .map(|c| ctx.text(c))
            .unwrap_or_else(|| "=".to_string()),
    };
    let op = binary_op_of_compound(&op_text);
    let current = ctx.lower_expr(left);
    let rhs = ctx.lower_expr(right);
    let result = ctx.binop(op, current, rhs, node.location());
    ctx.lower_store_target(left, result, node);
    result
}

/// `+=` -> `+`, `//=` -> `//`, `<<=` -> `<<`
pub fn binary_op_of_compound(op: &str) -> &str {
    let trimmed = op.trim();
    trimmed.strip_suffix('=').unwrap_or(trimmed)
}

impl<'a> LoweringContext<'a> {
    /// Store `value` into whatever `target` denotes
    pub fn lower_store_target(&mut self, target: Node<'_>, value: Register, parent: Node<'_>) {
        let kind = target.kind();
        let loc = parent.location();
        let profile = self.profile();

        if profile.is_identifier(kind) {
            let name = self.text(target);
            self.store_var(name, value, loc);
        } else if profile.is_member(kind) {
            match self.member_parts(target) {
                Some((obj, member)) => {
                    let obj_reg = self.lower_expr(obj);
                    let name = self.text(member);
                    self.emit_effect(
                        Opcode::StoreField,
                        vec![obj_reg.into(), name.into(), value.into()],
                        loc,
                    );
                }
                None => {
                    self.malformed("member store target without parts", target);
                    let name = self.text(target);
                    self.store_var(name, value, loc);
                }
            }
        } else if profile.is_subscript(kind) {
            match self.subscript_parts(target) {
                Some((obj, index)) => {
                    let obj_reg = self.lower_expr(obj);
                    let idx_reg = self.lower_expr(index);
                    self.emit_effect(
                        Opcode::StoreIndex,
                        vec![obj_reg.into(), idx_reg.into(), value.into()],
                        loc,
                    );
                }
                None => {
                    self.malformed("subscript store target without parts", target);
                    let name = self.text(target);
                    self.store_var(name, value, loc);
                }
            }
        } else if profile.is_pattern(kind) {
            self.destructure(target, value, parent);
        } else if let Some(pointer) = self.deref_operand(target) {
            let ptr_reg = self.lower_expr(pointer);
            self.emit_effect(
                Opcode::StoreField,
                vec![ptr_reg.into(), DEREF_FIELD.into(), value.into()],
                loc,
            );
        } else if PAREN_KINDS.contains(&kind) {
            match self.significant_children(target).into_iter().next() {
                Some(inner) => self.lower_store_target(inner, value, parent),
                None => {
                    let name = self.text(target);
                    self.store_var(name, value, loc);
                }
            }
        } else {
            let name = self.text(target);
            self.store_var(name, value, loc);
        }
    }

    /// The pointer operand of a `*ptr` target
    fn deref_operand<'t>(&self, target: Node<'t>) -> Option<Node<'t>> {
        if !DEREF_KINDS.contains(&target.kind()) {
            return None;
        }
        let op = target.kids().into_iter().next().filter(|c| !c.is_named())?;
        if self.text(op) != "*" {
            return None;
        }
        target
            .field("argument")
            .or_else(|| self.significant_children(target).into_iter().next())
    }

    /// `a, b = value`: bind each element through a synthetic index constant
    pub fn destructure(&mut self, pattern: Node<'_>, value: Register, parent: Node<'_>) {
        for (i, element) in self.significant_children(pattern).into_iter().enumerate() {
            let idx = self.const_value(i.to_string(), SourceLocation::UNKNOWN);
            let item = self.emit_value(
                Opcode::LoadIndex,
                vec![value.into(), idx.into()],
                element.location(),
            );
            self.lower_store_target(element, item, parent);
        }
    }

    /// Pairwise `a, b = x, y`: every right-hand value is lowered before any store
    pub fn lower_parallel_assign(&mut self, targets: &[Node<'_>], values: &[Node<'_>], node: Node<'_>) {
        if targets.len() > 1 && values.len() == 1 {
            let value = self.lower_expr(values[0]);
            for (i, target) in targets.iter().enumerate() {
                let idx = self.const_value(i.to_string(), SourceLocation::UNKNOWN);
                let item = self.emit_value(
                    Opcode::LoadIndex,
                    vec![value.into(), idx.into()],
                    target.location(),
                );
                self.lower_store_target(*target, item, node);
            }
            return;
        }
        let regs: Vec<Register> = values.iter().map(|v| self.lower_expr(*v)).collect();
        for (i, target) in targets.iter().enumerate() {
            let value = match regs.get(i) {
                Some(r) => *r,
                None => self.const_none(),
            };
            self.lower_store_target(*target, value, node);
        }
    }

    /// Declare `name` with an optional initializer; no initializer stores none
    pub fn lower_declaration(&mut self, name: Node<'_>, value: Option<Node<'_>>, node: Node<'_>) {
        let reg = match value {
            Some(v) => self.lower_expr(v),
            None => self.const_none(),
        };
        self.lower_store_target(name, reg, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;

    fn dump(lang: LanguageId, src: &str) -> Vec<String> {
        lower_with_language(lang, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    #[test]
    fn test_compound_operator_text() {
        assert_eq!(binary_op_of_compound("+="), "+");
        assert_eq!(binary_op_of_compound("//="), "//");
        assert_eq!(binary_op_of_compound(" <<= "), "<<");
    }

    #[test]
    fn test_field_and_index_stores() {
        let ir = dump(LanguageId::Python, "self.x = 1\na[0] = 2\n");
        assert!(ir.iter().any(|l| l.starts_with("store_field %") && l.contains(" x ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_index ")), "{:#?}", ir);
    }

    #[test]
    fn test_tuple_destructuring() {
        let ir = dump(LanguageId::Python, "a, b = pair\n");
        let loads = ir.iter().filter(|l| l.contains("load_index")).count();
        assert_eq!(loads, 2, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var a ")));
        assert!(ir.iter().any(|l| l.starts_with("store_var b ")));
    }

    #[test]
    fn test_augmented_assignment() {
        let ir = dump(LanguageId::Python, "total += n\n");
        assert_eq!(
            ir,
            vec![
                "entry:",
                "%0 = load_var total",
                "%1 = load_var n",
                "%2 = binop + %0 %1",
                "store_var total %2",
            ]
        );
    }
}

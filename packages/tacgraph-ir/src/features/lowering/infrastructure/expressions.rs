//! Shared expression routines
//!
//! Free functions here match `ExprHandler` so profiles can put them straight
//! into their tables; the `impl LoweringContext` block holds the
//! parameterised variants profiles call from their own handlers.

use super::context::LoweringContext;
use crate::features::lowering::domain::SyntaxNode;
use crate::shared::constants::TERNARY_VAR;
use crate::shared::models::{Opcode, Operand, Register, SourceLocation};
use tree_sitter::Node;

const PARENS: &[&str] = &["(", ")"];

// ═══════════════════════════════════════════════════════════════════════════
// Leaves
// ═══════════════════════════════════════════════════════════════════════════

/// Literal token text as-is
pub fn const_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let text = ctx.text(node);
    ctx.const_value(text, node.location())
}

pub fn identifier(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let name = ctx.text(node);
    ctx.load_var(name, node.location())
}

pub fn canonical_true(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let lit = ctx.literals().true_lit;
    ctx.const_value(lit, node.location())
}

pub fn canonical_false(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let lit = ctx.literals().false_lit;
    ctx.const_value(lit, node.location())
}

pub fn canonical_none(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let lit = ctx.literals().none;
    ctx.const_value(lit, node.location())
}

/// `true`/`false` token whose text decides the literal
pub fn canonical_bool(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    if ctx.text(node).trim().eq_ignore_ascii_case("true") {
        canonical_true(ctx, node)
    } else {
        canonical_false(ctx, node)
    }
}

/// `( inner )`
pub fn paren(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match ctx.significant_children(node).into_iter().next() {
        Some(inner) => ctx.lower_expr(inner),
        None => const_literal(ctx, node),
    }
}

/// Wrapper node whose value is its first significant child
/// (casts, `await`-free unwraps, type assertions that carry no behaviour)
pub fn unwrap_first(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    paren(ctx, node)
}

/// Wrapper node whose value is its last significant child
pub fn unwrap_last(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match ctx.significant_children(node).into_iter().last() {
        Some(inner) => ctx.lower_expr(inner),
        None => const_literal(ctx, node),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Operators
// ═══════════════════════════════════════════════════════════════════════════

/// `lhs op rhs`: fields `left`/`operator`/`right`, else positional
pub fn binop(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (lhs, op, rhs) = match (node.field("left"), node.field("right")) {
        (Some(l), Some(r)) => {
            let op = node
                .field("operator")
                .map(|o| ctx.text(o))
                .or_else(|| operator_between(ctx, node, l, r));
            (l, op, r)
        }
        _ => {
            let kids: Vec<Node<'_>> = node
                .kids()
                .into_iter()
                .filter(|c| !PARENS.contains(&c.kind()) && !ctx.profile().is_skipped(c.kind()))
                .collect();
            if kids.len() < 3 {
                ctx.malformed("binary expression with fewer than 3 children", node);
                return const_literal(ctx, node);
            }
            let op = Some(ctx.text(kids[1]));
            (kids[0], op, kids[kids.len() - 1])
        }
    };
    let op = op.unwrap_or_else(|| "?".to_string());
    let lhs_reg = ctx.lower_expr(lhs);
    let rhs_reg = ctx.lower_expr(rhs);
    ctx.binop(op.trim(), lhs_reg, rhs_reg, node.location())
}

/// Text of the anonymous token(s) between two operand nodes
pub fn operator_between(
    ctx: &LoweringContext<'_>,
    node: Node<'_>,
    lhs: Node<'_>,
    rhs: Node<'_>,
) -> Option<String> {
    let pieces: Vec<String> = node
        .kids()
        .into_iter()
        .filter(|c| c.start_byte() >= lhs.end_byte() && c.end_byte() <= rhs.start_byte())
        .map(|c| ctx.text(c))
        .collect();
    if pieces.is_empty() {
        None
    } else {
        Some(pieces.join(" "))
    }
}

/// `op operand`: fields `operator`/`argument`|`operand`, else positional
pub fn unop(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operand = node.field("argument").or_else(|| node.field("operand"));
    let op_node = node.field("operator");
    let (op, operand) = match (op_node, operand) {
        (Some(o), Some(a)) => (ctx.text(o), a),
        (None, Some(a)) => {
            let op = node
                .kids()
                .into_iter()
                .find(|c| c.id() != a.id() && !c.is_named())
                .map(|c| ctx.text(c))
                .unwrap_or_else(|| "?".to_string());
            (op, a)
        }
        _ => {
            let kids: Vec<Node<'_>> = node
                .kids()
                .into_iter()
                .filter(|c| !PARENS.contains(&c.kind()))
                .collect();
            if kids.len() < 2 {
                ctx.malformed("unary expression with fewer than 2 children", node);
                return const_literal(ctx, node);
            }
            (ctx.text(kids[0]), kids[1])
        }
    };
    let operand_reg = ctx.lower_expr(operand);
    ctx.emit_value(
        Opcode::Unop,
        vec![op.trim().into(), operand_reg.into()],
        node.location(),
    )
}

/// `i++` / `--i`: load, add or subtract one, store back; value is the new one
pub fn update_expr(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let Some(operand) = node
        .field("argument")
        .or_else(|| ctx.significant_children(node).into_iter().next())
    else {
        return const_literal(ctx, node);
    };
    let op = if ctx.text(node).contains("++") { "+" } else { "-" };
    ctx.lower_step(operand, op, node)
}

// ═══════════════════════════════════════════════════════════════════════════
// Calls, fields, subscripts
// ═══════════════════════════════════════════════════════════════════════════

/// Call with the profile's callee / argument fields
pub fn call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let fields = ctx.fields();
    let callee = node.field(fields.call_function);
    let args = node.field(fields.call_arguments);
    ctx.lower_call_parts(callee, args, node)
}

/// `obj.member` load
pub fn member_load(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match ctx.member_parts(node) {
        Some((obj, member)) => {
            let obj_reg = ctx.lower_expr(obj);
            let name = ctx.text(member);
            ctx.emit_value(
                Opcode::LoadField,
                vec![obj_reg.into(), name.into()],
                node.location(),
            )
        }
        None => {
            ctx.malformed("member access without object or member", node);
            const_literal(ctx, node)
        }
    }
}

/// `obj[index]` load
pub fn subscript_load(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match ctx.subscript_parts(node) {
        Some((obj, index)) => {
            let obj_reg = ctx.lower_expr(obj);
            let idx_reg = ctx.lower_expr(index);
            ctx.emit_value(
                Opcode::LoadIndex,
                vec![obj_reg.into(), idx_reg.into()],
                node.location(),
            )
        }
        None => {
            ctx.malformed("subscript without object or index", node);
            const_literal(ctx, node)
        }
    }
}

/// `cond ? a : b` with fields `condition`/`consequence`/`alternative`
pub fn ternary(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let cond = node.field("condition");
    let then = node.field("consequence");
    let otherwise = node.field("alternative");
    match (cond, then, otherwise) {
        (Some(c), Some(t), Some(o)) => ctx.lower_ternary_parts(c, t, o, node),
        _ => {
            let kids = ctx.significant_children(node);
            if kids.len() < 3 {
                ctx.malformed("conditional expression with fewer than 3 operands", node);
                return const_literal(ctx, node);
            }
            ctx.lower_ternary_parts(kids[0], kids[1], kids[2], node)
        }
    }
}

/// Construct with no runtime effect worth modelling, kept visible by kind
pub fn symbolic_node(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    ctx.symbolic(node.kind(), node.location())
}

impl<'a> LoweringContext<'a> {
    /// Lower call arguments left to right, unwrapping argument wrapper nodes
    pub fn call_args(&mut self, args: Option<Node<'_>>) -> Vec<Register> {
        let Some(args) = args else {
            return Vec::new();
        };
        let mut regs = Vec::new();
        for child in self.significant_children(args) {
            if self.profile().kinds().argument_wrappers.contains(&child.kind()) {
                if let Some(inner) = self.significant_children(child).into_iter().last() {
                    regs.push(self.lower_expr(inner));
                }
            } else {
                regs.push(self.lower_expr(child));
            }
        }
        regs
    }

    /// Classify the callee: member access -> CALL_METHOD, plain name ->
    /// CALL_FUNCTION, anything else -> CALL_UNKNOWN over a lowered target
    pub fn lower_call_parts(
        &mut self,
        callee: Option<Node<'_>>,
        args: Option<Node<'_>>,
        node: Node<'_>,
    ) -> Register {
        let loc = node.location();
        let Some(callee) = callee else {
            let target = self.symbolic("unknown_call_target", loc);
            let arg_regs = self.call_args(args);
            return self.call_unknown(target, arg_regs, loc);
        };

        if self.profile().is_member(callee.kind()) {
            if let Some((obj, member)) = self.member_parts(callee) {
                let obj_reg = self.lower_expr(obj);
                let method = self.text(member);
                let arg_regs = self.call_args(args);
                return self.call_method(obj_reg, &method, arg_regs, loc);
            }
        }

        if self.profile().is_identifier(callee.kind()) {
            let name = self.text(callee);
            let arg_regs = self.call_args(args);
            return self.call_function(&name, arg_regs, loc);
        }

        let target = self.lower_expr(callee);
        let arg_regs = self.call_args(args);
        self.call_unknown(target, arg_regs, loc)
    }

    pub fn call_unknown(&mut self, target: Register, args: Vec<Register>, loc: SourceLocation) -> Register {
        let mut operands: Vec<Operand> = vec![target.into()];
        operands.extend(args.into_iter().map(Operand::from));
        self.emit_value(Opcode::CallUnknown, operands, loc)
    }

    /// `(object, member)` of a member-access node, by field or position
    pub fn member_parts<'t>(&self, node: Node<'t>) -> Option<(Node<'t>, Node<'t>)> {
        let fields = self.fields();
        let kids = self.significant_children(node);
        let obj = node
            .field(fields.attr_object)
            .or_else(|| kids.first().copied())?;
        let member = node.field(fields.attr_member).or_else(|| {
            if kids.len() > 1 {
                kids.last().copied()
            } else {
                None
            }
        })?;
        Some((obj, member))
    }

    /// `(object, index)` of a subscript node, by field or position
    pub fn subscript_parts<'t>(&self, node: Node<'t>) -> Option<(Node<'t>, Node<'t>)> {
        let fields = self.fields();
        let kids = self.significant_children(node);
        let obj = node
            .field(fields.subscript_value)
            .or_else(|| kids.first().copied())?;
        let index = node.field(fields.subscript_index).or_else(|| {
            if kids.len() > 1 {
                kids.get(1).copied()
            } else {
                None
            }
        })?;
        Some((obj, index))
    }

    /// Conditional value through a named slot; the join block reloads it
    pub fn lower_ternary_parts(
        &mut self,
        cond: Node<'_>,
        then: Node<'_>,
        otherwise: Node<'_>,
        node: Node<'_>,
    ) -> Register {
        let slot = format!("{}_{}", TERNARY_VAR, self.peek_label_counter());
        let cond_reg = self.lower_expr(cond);
        let true_label = self.fresh_label("ternary_true");
        let false_label = self.fresh_label("ternary_false");
        let end_label = self.fresh_label("ternary_end");
        self.emit_branch_if(cond_reg, &true_label, &false_label, node.location());

        self.emit_label(&true_label);
        let then_reg = self.lower_expr(then);
        self.store_var(&slot, then_reg, SourceLocation::UNKNOWN);
        self.emit_branch(&end_label);

        self.emit_label(&false_label);
        let else_reg = self.lower_expr(otherwise);
        self.store_var(&slot, else_reg, SourceLocation::UNKNOWN);
        self.emit_branch(&end_label);

        self.emit_label(&end_label);
        self.load_var(slot, node.location())
    }

    /// `target = target op 1`, value is the new register
    pub fn lower_step(&mut self, target: Node<'_>, op: &str, node: Node<'_>) -> Register {
        let current = self.lower_expr(target);
        let one = self.const_value("1", SourceLocation::UNKNOWN);
        let next = self.binop(op, current, one, node.location());
        self.lower_store_target(target, next, node);
        next
    }

    /// Interpolated string pieces folded into left-nested `+` BINOPs
    pub fn lower_concat(&mut self, parts: Vec<Register>, node: Node<'_>) -> Register {
        let loc = node.location();
        let mut parts = parts.into_iter();
        let Some(first) = parts.next() else {
            return const_literal(self, node);
        };
        parts.fold(first, |acc, part| self.binop("+", acc, part, loc))
    }

    /// Call a well-known runtime helper by name over lowered operands
    pub fn lower_intrinsic(&mut self, name: &str, operands: &[Node<'_>], node: Node<'_>) -> Register {
        let regs: Vec<Register> = operands.iter().map(|o| self.lower_expr(*o)).collect();
        self.call_function(name, regs, node.location())
    }
}

#[cfg(test)]
mod tests {
    use crate::features::parsing::ports::LanguageId;
    use crate::features::lowering::infrastructure::lower_with_language;

    fn dump(lang: LanguageId, src: &str) -> Vec<String> {
        lower_with_language(lang, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    #[test]
    fn test_binop_uses_operator_text() {
        let ir = dump(LanguageId::Python, "x = a % 3\n");
        assert!(ir.contains(&"%2 = binop % %0 %1".to_string()), "{:#?}", ir);
    }

    #[test]
    fn test_method_call_classification() {
        let ir = dump(LanguageId::Python, "obj.run(1)\n");
        assert!(ir.iter().any(|l| l.contains("call_method %0 run %1")), "{:#?}", ir);
    }

    #[test]
    fn test_plain_and_unknown_calls() {
        let ir = dump(LanguageId::Python, "f(2)\n(g())(3)\n");
        assert!(ir.iter().any(|l| l.contains("call_function f %0")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_unknown")), "{:#?}", ir);
    }

    #[test]
    fn test_ternary_round_trips_through_slot() {
        let ir = dump(LanguageId::JavaScript, "let v = c ? 1 : 2;\n");
        assert!(ir.iter().any(|l| l.starts_with("store_var __ternary_0")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("load_var __ternary_0")), "{:#?}", ir);
    }

    #[test]
    fn test_update_expression_stores_back() {
        let ir = dump(LanguageId::C, "int main() { i++; return 0; }\n");
        assert!(ir.iter().any(|l| l.contains("binop + ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var i ")), "{:#?}", ir);
    }
}

//! Structured control flow
//!
//! Every loop construct pushes its (continue, end) pair before lowering the
//! body and pops it afterwards. Iterator-style loops share one index-loop
//! skeleton; the index lives in a named slot and is reloaded on every use,
//! never bumped in its register.

use super::context::LoweringContext;
use crate::features::lowering::domain::{SyntaxNode, TryParts};
use crate::shared::constants::{BLOCK_RESULT_VAR, FOR_INDEX_VAR, MATCH_RESULT_VAR};
use crate::shared::models::{Opcode, Register, SourceLocation};
use tree_sitter::Node;

const ELSE_IF_KINDS: &[&str] = &[
    "elif_clause",
    "else_if_clause",
    "elsif",
    "elseif_clause",
    "elseif_statement",
    "else_if",
];
const ELSE_KINDS: &[&str] = &["else_clause", "else", "else_statement"];
const IF_KINDS: &[&str] = &["if_statement", "if_expression", "if"];
const EMPTY_CLAUSE_KINDS: &[&str] = &["empty_statement", ";"];

/// How a case chain treats `break` and the end of an arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStyle {
    /// `switch`: arms end at the chain's end, `break` leaves the chain
    Switch,
    /// C `switch`: an arm without `break` runs into the next arm's body
    FallthroughSwitch,
    /// `match` / `when` / `case`: no `break` target of its own
    Match,
}

// ═══════════════════════════════════════════════════════════════════════════
// Table entries
// ═══════════════════════════════════════════════════════════════════════════

/// if / elif / else with the profile's condition / consequence / alternative fields
pub fn if_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let fields = ctx.fields();
    let cond = node.field(fields.if_condition);
    let then = node.field(fields.if_consequence);
    let alternatives = node.field_all(fields.if_alternative);
    ctx.lower_if_parts(cond, then, &alternatives, node);
}

pub fn while_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let fields = ctx.fields();
    let cond = node.field(fields.while_condition);
    let body = node.field(fields.while_body);
    ctx.lower_while_parts(cond, body, node);
}

/// `do body while (cond)`: body first, condition at the bottom
pub fn do_while_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.field("body");
    let cond = node.field("condition");
    ctx.lower_do_while_parts(body, cond, false, node);
}

/// C-style `for (init; cond; update) body`
///
/// Empty clauses may surface as `empty_statement` / `;` nodes and a
/// condition may arrive wrapped in its `expression_statement`.
pub fn c_for_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let present = |n: &Node<'_>| !EMPTY_CLAUSE_KINDS.contains(&n.kind());
    let init = node
        .field("initializer")
        .or_else(|| node.field("init"))
        .filter(present);
    let cond = node.field("condition").filter(present).map(|c| {
        if c.kind() == "expression_statement" {
            c.named_kids().into_iter().next().unwrap_or(c)
        } else {
            c
        }
    });
    let update = node
        .field("update")
        .or_else(|| node.field("increment"))
        .filter(present);
    let body = node.field("body");
    ctx.lower_c_for_parts(init, cond, update, body, node);
}

/// `for <left> in <right>: body` (fields left / right / body)
pub fn for_in_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let target = node.field("left").or_else(|| node.field("pattern"));
    let iterable = node.field("right").or_else(|| node.field("value"));
    let body = node.field("body");
    let (Some(target), Some(iterable)) = (target, iterable) else {
        ctx.malformed("for-in without target or iterable", node);
        return;
    };
    let iter_reg = ctx.lower_expr(iterable);
    ctx.lower_index_loop(iter_reg, node, |ctx, elem, _| {
        ctx.lower_store_target(target, elem, node);
    }, |ctx| ctx.lower_body(body));
}

pub fn break_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    match ctx.current_break_target().map(str::to_string) {
        Some(target) => ctx.emit_branch(&target),
        None => {
            tracing::warn!("break outside loop at {}", node.location());
            ctx.symbolic("unsupported:break_outside_loop", node.location());
        }
    }
}

pub fn continue_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    match ctx.current_continue_target().map(str::to_string) {
        Some(target) => ctx.emit_branch(&target),
        None => {
            tracing::warn!("continue outside loop at {}", node.location());
            ctx.symbolic("unsupported:continue_outside_loop", node.location());
        }
    }
}

/// `return [value]`; no value returns the profile's default
pub fn return_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let value = ctx.significant_children(node).into_iter().next();
    ctx.lower_return(value, node);
}

/// `throw value` / `raise value`
pub fn throw_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let value = ctx.significant_children(node).into_iter().next();
    let reg = match value {
        Some(v) => ctx.lower_expr(v),
        None => {
            let default = ctx.literals().default_return;
            ctx.const_value(default, SourceLocation::UNKNOWN)
        }
    };
    ctx.emit_effect(Opcode::Throw, vec![reg.into()], node.location());
}

/// Lower a wrapper's statements in order (`expression_statement`, bare blocks)
pub fn statement_list(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for child in ctx.significant_children(node) {
        ctx.lower_stmt(child);
    }
}

/// Statement with no runtime effect (imports, package clauses, type aliases)
pub fn ignore(_ctx: &mut LoweringContext<'_>, _node: Node<'_>) {}

impl<'a> LoweringContext<'a> {
    pub fn lower_return(&mut self, value: Option<Node<'_>>, node: Node<'_>) {
        let reg = match value {
            Some(v) => self.lower_expr(v),
            None => {
                let default = self.literals().default_return;
                self.const_value(default, SourceLocation::UNKNOWN)
            }
        };
        self.emit_effect(Opcode::Return, vec![reg.into()], node.location());
    }

    /// Three labels, condition routed by BRANCH_IF; the end label is always emitted
    pub fn lower_if_parts(
        &mut self,
        cond: Option<Node<'_>>,
        then: Option<Node<'_>>,
        alternatives: &[Node<'_>],
        node: Node<'_>,
    ) {
        let cond_reg = match cond {
            Some(c) => self.lower_expr(c),
            None => {
                self.malformed("if without condition", node);
                self.const_none()
            }
        };
        let true_label = self.fresh_label("if_true");
        let false_label = self.fresh_label("if_false");
        let end_label = self.fresh_label("if_end");

        let has_alt = !alternatives.is_empty();
        let on_false = if has_alt { &false_label } else { &end_label };
        self.emit_branch_if(cond_reg, &true_label, on_false, node.location());

        self.emit_label(&true_label);
        self.lower_body(then);
        self.emit_branch(&end_label);

        if let Some((first, rest)) = alternatives.split_first() {
            self.emit_label(&false_label);
            self.lower_alternative(*first, rest);
            self.emit_branch(&end_label);
        }

        self.emit_label(&end_label);
    }

    /// elif chains recurse as nested ifs; later siblings become their alternatives
    fn lower_alternative<'t>(&mut self, alt: Node<'t>, rest: &[Node<'t>]) {
        let kind = alt.kind();
        let fields = self.fields();
        if ELSE_IF_KINDS.contains(&kind) {
            let cond = alt.field(fields.if_condition);
            let then = alt.field(fields.if_consequence);
            let mut nested = alt.field_all(fields.if_alternative);
            nested.extend_from_slice(rest);
            self.lower_if_parts(cond, then, &nested, alt);
        } else if ELSE_KINDS.contains(&kind) {
            match alt.field("body") {
                Some(body) => self.lower_body(Some(body)),
                None => {
                    for child in self.significant_children(alt) {
                        if IF_KINDS.contains(&child.kind()) || !self.profile().is_block(child.kind()) {
                            self.lower_stmt(child);
                        } else {
                            self.lower_block(child);
                        }
                    }
                }
            }
        } else {
            self.lower_body(Some(alt));
        }
    }

    /// Condition re-evaluated at the top of every iteration
    pub fn lower_while_parts(&mut self, cond: Option<Node<'_>>, body: Option<Node<'_>>, node: Node<'_>) {
        self.lower_while_with(node, false, |ctx| ctx.lower_opt_cond(cond), |ctx| ctx.lower_body(body));
    }

    /// While skeleton over arbitrary condition / body emitters; `negate` turns it into `until`
    pub fn lower_while_with<C, B>(&mut self, node: Node<'_>, negate: bool, cond: C, body: B)
    where
        C: FnOnce(&mut Self) -> Register,
        B: FnOnce(&mut Self),
    {
        let cond_label = self.fresh_label("while_cond");
        let body_label = self.fresh_label("while_body");
        let end_label = self.fresh_label("while_end");

        self.emit_label(&cond_label);
        let cond_reg = cond(self);
        if negate {
            self.emit_branch_if(cond_reg, &end_label, &body_label, node.location());
        } else {
            self.emit_branch_if(cond_reg, &body_label, &end_label, node.location());
        }

        self.emit_label(&body_label);
        self.push_loop(&cond_label, &end_label);
        body(self);
        self.pop_loop();
        self.emit_branch(&cond_label);

        self.emit_label(&end_label);
    }

    /// Body first, then the condition; `until` loops exit when it holds
    pub fn lower_do_while_parts(
        &mut self,
        body: Option<Node<'_>>,
        cond: Option<Node<'_>>,
        until: bool,
        node: Node<'_>,
    ) {
        let body_label = self.fresh_label("do_body");
        let cond_label = self.fresh_label("do_cond");
        let end_label = self.fresh_label("do_end");

        self.emit_label(&body_label);
        self.push_loop(&cond_label, &end_label);
        self.lower_body(body);
        self.pop_loop();

        self.emit_label(&cond_label);
        let cond_reg = self.lower_opt_cond(cond);
        if until {
            self.emit_branch_if(cond_reg, &end_label, &body_label, node.location());
        } else {
            self.emit_branch_if(cond_reg, &body_label, &end_label, node.location());
        }
        self.emit_label(&end_label);
    }

    /// Initializer once; update right before branching back; no condition loops forever
    pub fn lower_c_for_parts(
        &mut self,
        init: Option<Node<'_>>,
        cond: Option<Node<'_>>,
        update: Option<Node<'_>>,
        body: Option<Node<'_>>,
        node: Node<'_>,
    ) {
        if let Some(init) = init {
            self.lower_stmt(init);
        }
        let cond_label = self.fresh_label("for_cond");
        let body_label = self.fresh_label("for_body");
        let update_label = update.map(|_| self.fresh_label("for_update"));
        let end_label = self.fresh_label("for_end");

        self.emit_label(&cond_label);
        match cond {
            Some(c) => {
                let cond_reg = self.lower_expr(c);
                self.emit_branch_if(cond_reg, &body_label, &end_label, node.location());
            }
            None => self.emit_branch(&body_label),
        }

        self.emit_label(&body_label);
        let continue_label = update_label.clone().unwrap_or_else(|| cond_label.clone());
        self.push_loop(&continue_label, &end_label);
        self.lower_body(body);
        self.pop_loop();

        if let (Some(update), Some(update_label)) = (update, update_label) {
            self.emit_label(&update_label);
            self.lower_stmt(update);
        }
        self.emit_branch(&cond_label);

        self.emit_label(&end_label);
    }

    /// Index loop over an already lowered iterable:
    ///
    /// ```text
    /// STORE_VAR __for_idx_N 0 ; len = CALL_FUNCTION len iter
    /// for_cond:   i = LOAD_VAR __for_idx_N ; BRANCH_IF i < len
    /// for_body:   elem = LOAD_INDEX iter i ; bind ; body
    /// for_update: LOAD_VAR, +1, STORE_VAR __for_idx_N ; BRANCH for_cond
    /// for_end:
    /// ```
    pub fn lower_index_loop<Bind, Body>(&mut self, iterable: Register, node: Node<'_>, bind: Bind, body: Body)
    where
        Bind: FnOnce(&mut Self, Register, Register),
        Body: FnOnce(&mut Self),
    {
        let loc = node.location();
        let index_var = format!("{}_{}", FOR_INDEX_VAR, self.peek_label_counter());
        let zero = self.const_value("0", SourceLocation::UNKNOWN);
        self.store_var(&index_var, zero, SourceLocation::UNKNOWN);
        let len = self.call_function("len", vec![iterable], loc);

        let cond_label = self.fresh_label("for_cond");
        let body_label = self.fresh_label("for_body");
        let update_label = self.fresh_label("for_update");
        let end_label = self.fresh_label("for_end");

        self.emit_label(&cond_label);
        let idx = self.load_var(&index_var, SourceLocation::UNKNOWN);
        let in_range = self.binop("<", idx, len, loc);
        self.emit_branch_if(in_range, &body_label, &end_label, loc);

        self.emit_label(&body_label);
        let elem = self.emit_value(Opcode::LoadIndex, vec![iterable.into(), idx.into()], loc);
        bind(self, elem, idx);
        self.push_loop(&update_label, &end_label);
        body(self);
        self.pop_loop();

        self.emit_label(&update_label);
        self.bump_slot(&index_var, "+");
        self.emit_branch(&cond_label);

        self.emit_label(&end_label);
    }

    /// Numeric range loop `var = start ..(inclusive|exclusive) stop step`
    ///
    /// `descending` flips both the comparison and the step sign.
    pub fn lower_range_loop<Body>(
        &mut self,
        var: &str,
        start: Register,
        stop: Register,
        inclusive: bool,
        descending: bool,
        node: Node<'_>,
        body: Body,
    ) where
        Body: FnOnce(&mut Self),
    {
        let loc = node.location();
        self.store_var(var, start, loc);

        let cond_label = self.fresh_label("for_cond");
        let body_label = self.fresh_label("for_body");
        let update_label = self.fresh_label("for_update");
        let end_label = self.fresh_label("for_end");

        let cmp = match (descending, inclusive) {
            (false, true) => "<=",
            (false, false) => "<",
            (true, true) => ">=",
            (true, false) => ">",
        };
        self.emit_label(&cond_label);
        let current = self.load_var(var, SourceLocation::UNKNOWN);
        let in_range = self.binop(cmp, current, stop, loc);
        self.emit_branch_if(in_range, &body_label, &end_label, loc);

        self.emit_label(&body_label);
        self.push_loop(&update_label, &end_label);
        body(self);
        self.pop_loop();

        self.emit_label(&update_label);
        self.bump_slot(var, if descending { "-" } else { "+" });
        self.emit_branch(&cond_label);

        self.emit_label(&end_label);
    }

    /// `slot = slot op 1` through the variable, not the register
    pub fn bump_slot(&mut self, slot: &str, op: &str) {
        let current = self.load_var(slot, SourceLocation::UNKNOWN);
        let one = self.const_value("1", SourceLocation::UNKNOWN);
        let next = self.binop(op, current, one, SourceLocation::UNKNOWN);
        self.store_var(slot, next, SourceLocation::UNKNOWN);
    }

    fn lower_opt_cond(&mut self, cond: Option<Node<'_>>) -> Register {
        match cond {
            Some(c) => self.lower_expr(c),
            None => {
                let lit = self.literals().true_lit;
                self.const_value(lit, SourceLocation::UNKNOWN)
            }
        }
    }

    /// Equality chain over `subject`; each arm tests its values in order
    ///
    /// An arm with no values is the default and matches unconditionally.
    pub fn lower_case_chain<'t>(
        &mut self,
        subject: Register,
        arms: &[(Vec<Node<'t>>, Vec<Node<'t>>)],
        style: CaseStyle,
        node: Node<'_>,
    ) {
        self.lower_case_chain_with(subject, arms, style, node, |ctx, subject, values| {
            ctx.lower_equality_any(subject, values, node)
        });
    }

    /// Case chain whose arm test is supplied by the caller (type switches,
    /// `is` checks); `matches` is only called for arms with values
    pub fn lower_case_chain_with<'t, M>(
        &mut self,
        subject: Register,
        arms: &[(Vec<Node<'t>>, Vec<Node<'t>>)],
        style: CaseStyle,
        node: Node<'_>,
        mut matches: M,
    ) where
        M: FnMut(&mut Self, Register, &[Node<'t>]) -> Register,
    {
        let fallthrough = style == CaseStyle::FallthroughSwitch;
        let breakable = style != CaseStyle::Match;
        let end_label = self.fresh_label("switch_end");
        if breakable {
            self.push_break_target(&end_label);
        }
        let mut body_labels: Vec<String> = Vec::with_capacity(arms.len());
        for _ in arms {
            body_labels.push(self.fresh_label("case_body"));
        }

        for (i, (values, body)) in arms.iter().enumerate() {
            let body_label = &body_labels[i];
            let next_label = self.fresh_label("case_next");
            if values.is_empty() {
                self.emit_branch(body_label);
            } else {
                let matched = matches(self, subject, values);
                self.emit_branch_if(matched, body_label, &next_label, node.location());
            }

            self.emit_label(body_label);
            for stmt in body {
                self.lower_stmt(*stmt);
            }
            match body_labels.get(i + 1) {
                Some(next_body) if fallthrough => self.emit_branch(next_body),
                _ => self.emit_branch(&end_label),
            }
            self.emit_label(&next_label);
        }
        self.emit_branch(&end_label);
        if breakable {
            self.pop_break_target();
        }
        self.emit_label(&end_label);
    }

    /// Value-producing match with equality tests and expression arms
    pub fn lower_match_value<'t>(
        &mut self,
        subject: Register,
        arms: &[(Vec<Node<'t>>, Node<'t>)],
        node: Node<'_>,
    ) -> Register {
        self.lower_match_value_with(
            subject,
            arms,
            node,
            |ctx, subject, values| ctx.lower_equality_any(subject, values, node),
            |ctx, value| ctx.lower_expr(value),
        )
    }

    /// Value-producing match: every arm stores into one `__match_result_<n>`
    /// slot and the join label reloads it
    ///
    /// The slot starts out as the none literal. An arm without values is a
    /// wildcard and is entered unconditionally.
    pub fn lower_match_value_with<'t, M, V>(
        &mut self,
        subject: Register,
        arms: &[(Vec<Node<'t>>, Node<'t>)],
        node: Node<'_>,
        mut matches: M,
        mut value: V,
    ) -> Register
    where
        M: FnMut(&mut Self, Register, &[Node<'t>]) -> Register,
        V: FnMut(&mut Self, Node<'t>) -> Register,
    {
        let slot = format!("{}_{}", MATCH_RESULT_VAR, self.peek_label_counter());
        let loc = node.location();
        let none = self.const_none();
        self.store_var(&slot, none, SourceLocation::UNKNOWN);
        let end_label = self.fresh_label("match_end");

        for (values, result) in arms {
            let arm_label = self.fresh_label("match_arm");
            let next_label = self.fresh_label("match_next");
            if values.is_empty() {
                self.emit_branch(&arm_label);
            } else {
                let matched = matches(self, subject, values);
                self.emit_branch_if(matched, &arm_label, &next_label, loc);
            }
            self.emit_label(&arm_label);
            let reg = value(self, *result);
            self.store_var(&slot, reg, SourceLocation::UNKNOWN);
            self.emit_branch(&end_label);
            self.emit_label(&next_label);
        }
        self.emit_branch(&end_label);
        self.emit_label(&end_label);
        self.load_var(slot, loc)
    }

    /// Value-producing `if`: both arms store into one `__block_result_<n>` slot
    ///
    /// A missing alternative yields the none literal.
    pub fn lower_if_value<'t, V>(
        &mut self,
        cond: Node<'t>,
        then: Node<'t>,
        otherwise: Option<Node<'t>>,
        node: Node<'_>,
        mut value: V,
    ) -> Register
    where
        V: FnMut(&mut Self, Node<'t>) -> Register,
    {
        let slot = format!("{}_{}", BLOCK_RESULT_VAR, self.peek_label_counter());
        let loc = node.location();
        let cond_reg = self.lower_expr(cond);
        let true_label = self.fresh_label("if_true");
        let false_label = self.fresh_label("if_false");
        let end_label = self.fresh_label("if_end");
        self.emit_branch_if(cond_reg, &true_label, &false_label, loc);

        self.emit_label(&true_label);
        let reg = value(self, then);
        self.store_var(&slot, reg, SourceLocation::UNKNOWN);
        self.emit_branch(&end_label);

        self.emit_label(&false_label);
        let reg = match otherwise {
            Some(alt) => value(self, alt),
            None => self.const_none(),
        };
        self.store_var(&slot, reg, SourceLocation::UNKNOWN);
        self.emit_branch(&end_label);

        self.emit_label(&end_label);
        self.load_var(slot, loc)
    }

    /// `subject == v0 || subject == v1 || ...`
    pub fn lower_equality_any(&mut self, subject: Register, values: &[Node<'_>], node: Node<'_>) -> Register {
        let mut acc: Option<Register> = None;
        for value in values {
            let v = self.lower_expr(*value);
            let eq = self.binop("==", subject, v, node.location());
            acc = Some(match acc {
                Some(prev) => self.binop("||", prev, eq, node.location()),
                None => eq,
            });
        }
        match acc {
            Some(r) => r,
            None => {
                let lit = self.literals().true_lit;
                self.const_value(lit, SourceLocation::UNKNOWN)
            }
        }
    }

    /// One label per clause, every path threaded into the exit funnel
    ///
    /// The funnel is the finally label when there is one, else the end label.
    pub fn lower_try(&mut self, parts: &TryParts<'_>, node: Node<'_>) {
        let body_label = self.fresh_label("try_body");
        let catch_labels: Vec<String> = (0..parts.catches.len())
            .map(|i| self.fresh_label(&format!("catch_{}", i)))
            .collect();
        let else_label = parts.else_body.map(|_| self.fresh_label("try_else"));
        let finally_label = parts.finally_body.map(|_| self.fresh_label("try_finally"));
        let end_label = self.fresh_label("try_end");
        let exit = finally_label.clone().unwrap_or_else(|| end_label.clone());

        self.emit_label(&body_label);
        self.lower_body(parts.body);
        self.emit_branch(else_label.as_deref().unwrap_or(&exit));

        for (clause, label) in parts.catches.iter().zip(&catch_labels) {
            self.emit_label(label);
            let type_name = clause
                .exception_type
                .map(|t| self.text(t))
                .unwrap_or_else(|| "Exception".to_string());
            let caught = self.symbolic(format!("caught_exception:{}", type_name), node.location());
            if let Some(var) = clause.variable {
                self.lower_store_target(var, caught, node);
            }
            self.lower_body(clause.body);
            self.emit_branch(&exit);
        }

        if let (Some(label), Some(body)) = (&else_label, parts.else_body) {
            self.emit_label(label);
            self.lower_body(Some(body));
            self.emit_branch(&exit);
        }

        if let (Some(label), Some(body)) = (&finally_label, parts.finally_body) {
            self.emit_label(label);
            self.lower_body(Some(body));
            self.emit_branch(&end_label);
        }

        self.emit_label(&end_label);
    }
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;

    fn dump(lang: LanguageId, src: &str) -> Vec<String> {
        lower_with_language(lang, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    #[test]
    fn test_if_without_else_still_emits_end() {
        let ir = dump(LanguageId::Python, "if x:\n    y = 1\n");
        assert!(ir.contains(&"branch_if %0 if_true_0,if_end_2".to_string()), "{:#?}", ir);
        assert_eq!(ir.last().map(String::as_str), Some("if_end_2:"));
    }

    #[test]
    fn test_elif_nests() {
        let src = "if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n";
        let ir = dump(LanguageId::Python, src);
        let branch_ifs = ir.iter().filter(|l| l.starts_with("branch_if")).count();
        assert_eq!(branch_ifs, 2, "{:#?}", ir);
        assert!(ir.contains(&"if_false_1:".to_string()));
        assert!(ir.contains(&"if_false_4:".to_string()));
    }

    #[test]
    fn test_while_reevaluates_condition() {
        let ir = dump(LanguageId::Python, "while n > 0:\n    n = n - 1\n");
        assert_eq!(ir[1], "while_cond_0:");
        assert!(ir.contains(&"branch while_cond_0".to_string()));
    }

    #[test]
    fn test_for_in_index_round_trip() {
        let ir = dump(LanguageId::Python, "for x in xs:\n    print(x)\n");
        assert!(ir.iter().any(|l| l.starts_with("store_var __for_idx_0 ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function len")));
        let reloads = ir.iter().filter(|l| l.ends_with("load_var __for_idx_0")).count();
        assert_eq!(reloads, 2, "{:#?}", ir);
    }

    #[test]
    fn test_break_outside_loop_is_symbolic() {
        let ir = dump(LanguageId::Python, "break\n");
        assert!(ir.contains(&"%0 = symbolic unsupported:break_outside_loop".to_string()));
    }

    #[test]
    fn test_try_funnels_into_finally() {
        let src = "try:\n    f()\nexcept ValueError as e:\n    g()\nelse:\n    h()\nfinally:\n    k()\n";
        let ir = dump(LanguageId::Python, src);
        assert!(ir.contains(&"try_finally_3:".to_string()), "{:#?}", ir);
        let into_finally = ir.iter().filter(|l| *l == "branch try_finally_3").count();
        assert_eq!(into_finally, 2, "{:#?}", ir);
        assert!(ir.contains(&"branch try_else_2".to_string()));
        assert!(ir.iter().any(|l| l.contains("caught_exception:ValueError")));
        assert!(ir.iter().any(|l| l.starts_with("store_var e ")));
    }
}

//! Kotlin profile
//!
//! The Kotlin grammar exposes almost no field names: operands, bodies and
//! suffixes are found by kind and by position relative to keyword tokens.
//! Member access and indexing are suffix nodes (`navigation_suffix`,
//! `indexing_suffix`) hanging off the receiver, so this profile carries its
//! own call, load and store-target routines instead of the table-driven ones.

use crate::features::lowering::domain::{CatchClause, SyntaxNode, TryParts};
use crate::features::lowering::infrastructure::{control_flow, expressions, LoweringContext, TableProfile};
use crate::features::lowering::ports::{Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::constants::CONSTRUCTOR_NAME;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

const BODY_KINDS: &[&str] = &["control_structure_body", "statements"];

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Kotlin)
        .literals(Literals::new("true", "false", "null", "Unit"))
        .kinds(NodeKinds {
            comments: vec!["comment", "line_comment", "multiline_comment"],
            noise: vec![
                "\n",
                ";",
                "package_header",
                "import_list",
                "import_header",
                "file_annotation",
                "shebang_line",
                "annotation",
                "modifiers",
                "label",
                "type_parameters",
                "type_constraints",
                "getter",
                "setter",
            ],
            blocks: vec!["source_file", "statements", "control_structure_body"],
            identifiers: vec!["simple_identifier", "this_expression", "super_expression", "type_identifier"],
            members: vec![],
            subscripts: vec![],
            patterns: vec![],
            argument_wrappers: vec!["value_argument"],
        })
        // Expressions
        .exprs(
            &["simple_identifier", "this_expression", "super_expression", "type_identifier"],
            expressions::identifier,
        )
        .exprs(
            &[
                "integer_literal",
                "long_literal",
                "real_literal",
                "hex_literal",
                "bin_literal",
                "unsigned_literal",
                "character_literal",
                "callable_reference",
            ],
            expressions::const_literal,
        )
        .expr("string_literal", string_literal)
        .expr("boolean_literal", expressions::canonical_bool)
        .exprs(&["null", "null_literal"], expressions::canonical_none)
        .exprs(
            &[
                "additive_expression",
                "multiplicative_expression",
                "comparison_expression",
                "equality_expression",
                "conjunction_expression",
                "disjunction_expression",
            ],
            expressions::binop,
        )
        .expr("prefix_expression", prefix_expression)
        .expr("postfix_expression", postfix_expression)
        .expr("parenthesized_expression", expressions::paren)
        .expr("call_expression", call_expression)
        .expr("navigation_expression", navigation_expression)
        .expr("indexing_expression", indexing_expression)
        .expr("directly_assignable_expression", directly_assignable_expression)
        .expr("if_expression", if_expression)
        .expr("when_expression", when_expression)
        .expr("collection_literal", collection_literal)
        .expr("lambda_literal", lambda_literal)
        .expr("annotated_lambda", expressions::unwrap_last)
        .expr("anonymous_function", anonymous_function)
        .expr("object_literal", object_literal)
        .expr("range_expression", range_expression)
        .expr("infix_expression", infix_expression)
        .expr("elvis_expression", elvis_expression)
        .expr("check_expression", check_expression)
        .expr("as_expression", as_expression)
        .expr("spread_expression", expressions::unwrap_first)
        .exprs(&["statements", "control_structure_body"], body_value)
        .exprs(
            &[
                "assignment",
                "property_declaration",
                "while_statement",
                "for_statement",
                "do_while_statement",
                "jump_expression",
                "try_expression",
                "function_declaration",
                "class_declaration",
                "object_declaration",
            ],
            as_unit,
        )
        // Statements
        .stmts(&["statements", "control_structure_body"], control_flow::statement_list)
        .stmt("property_declaration", property_declaration)
        .stmt("assignment", assignment)
        .stmt("if_expression", if_statement)
        .stmt("while_statement", while_statement)
        .stmt("do_while_statement", do_while_statement)
        .stmt("for_statement", for_statement)
        .stmt("jump_expression", jump_expression)
        .stmt("try_expression", try_expression)
        .stmt("function_declaration", function_declaration)
        .stmt("class_declaration", class_declaration)
        .stmt("object_declaration", object_declaration)
        .stmt("companion_object", companion_object)
        .stmt("anonymous_initializer", statements_of)
        .stmt("secondary_constructor", secondary_constructor)
        .stmt("type_alias", control_flow::ignore)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Shared helpers
// ═══════════════════════════════════════════════════════════════════════════

/// First significant named child following the anonymous `token`
fn named_after<'t>(ctx: &LoweringContext<'_>, node: Node<'t>, token: &str) -> Option<Node<'t>> {
    let mut seen = false;
    for child in node.kids() {
        if seen && child.is_named() && !ctx.profile().is_skipped(child.kind()) {
            return Some(child);
        }
        if !child.is_named() && ctx.text(child) == token {
            seen = true;
        }
    }
    None
}

fn has_token(ctx: &LoweringContext<'_>, node: Node<'_>, token: &str) -> bool {
    node.kids()
        .into_iter()
        .any(|c| !c.is_named() && ctx.text(c) == token)
}

/// `val`/`var` on a class parameter, bare or wrapped in `binding_pattern_kind`
fn declares_property(ctx: &LoweringContext<'_>, param: Node<'_>) -> bool {
    let is_binding = |n: Node<'_>| matches!(ctx.text(n).trim(), "val" | "var");
    param
        .kids()
        .into_iter()
        .any(|c| (!c.is_named() || c.kind() == "binding_pattern_kind") && is_binding(c))
}

fn first_identifier(ctx: &LoweringContext<'_>, node: Node<'_>) -> Option<String> {
    node.first_of_kind("simple_identifier").map(|n| ctx.text(n))
}

/// Statements of a body, with the `control_structure_body` / `statements`
/// wrappers flattened away
fn flatten_statements<'t>(ctx: &LoweringContext<'_>, node: Node<'t>) -> Vec<Node<'t>> {
    if !BODY_KINDS.contains(&node.kind()) {
        return vec![node];
    }
    ctx.significant_children(node)
        .into_iter()
        .flat_map(|c| flatten_statements(ctx, c))
        .collect()
}

/// Value of a body: all statements in order, the last one as an expression
fn body_value(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let stmts = flatten_statements(ctx, node);
    let Some((last, init)) = stmts.split_last() else {
        return ctx.const_none();
    };
    for stmt in init {
        ctx.lower_stmt(*stmt);
    }
    ctx.lower_expr(*last)
}

/// Statement-only construct reached in value position: lower it, yield none
fn as_unit(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    ctx.lower_stmt(node);
    ctx.const_none()
}

/// `init { .. }` and other wrappers whose statements run in place
fn statements_of(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(stmts) = node.first_of_kind("statements") {
        ctx.lower_block(stmts);
    }
}

/// One SYMBOLIC/STORE pair per `parameter` / `class_parameter`
fn lower_kotlin_params(ctx: &mut LoweringContext<'_>, params: Option<Node<'_>>) {
    let Some(params) = params else {
        return;
    };
    for param in params.named_kids() {
        if !matches!(param.kind(), "parameter" | "class_parameter") {
            continue;
        }
        if let Some(name) = first_identifier(ctx, param) {
            ctx.emit_param(&name, param.location());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Access and calls
// ═══════════════════════════════════════════════════════════════════════════

/// `(receiver, member)` of `a.b` / `a?.b`
fn navigation_parts<'t>(ctx: &LoweringContext<'_>, node: Node<'t>) -> Option<(Node<'t>, String)> {
    let receiver = ctx.significant_children(node).into_iter().next()?;
    let suffix = node.first_of_kind("navigation_suffix")?;
    let member = match suffix.named_kids().into_iter().last() {
        Some(name) => ctx.text(name),
        None => ctx.text(suffix).trim_start_matches(['?', '.', ':']).to_string(),
    };
    Some((receiver, member))
}

/// Index expression inside an `indexing_suffix`
fn index_of<'t>(ctx: &LoweringContext<'_>, node: Node<'t>) -> Option<Node<'t>> {
    node.first_of_kind("indexing_suffix")
        .and_then(|s| ctx.significant_children(s).into_iter().next())
}

fn navigation_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let Some((receiver, member)) = navigation_parts(ctx, node) else {
        ctx.malformed("navigation without receiver or member", node);
        return expressions::const_literal(ctx, node);
    };
    let obj = ctx.lower_expr(receiver);
    ctx.emit_value(Opcode::LoadField, vec![obj.into(), member.into()], node.location())
}

fn indexing_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let Some(receiver) = ctx.significant_children(node).into_iter().next() else {
        return expressions::const_literal(ctx, node);
    };
    let obj = ctx.lower_expr(receiver);
    let Some(index) = index_of(ctx, node) else {
        return obj;
    };
    let idx = ctx.lower_expr(index);
    ctx.emit_value(Opcode::LoadIndex, vec![obj.into(), idx.into()], node.location())
}

/// Current value of an assignment target (`x`, `a.b`, `a[i]`)
fn directly_assignable_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    if node.first_of_kind("indexing_suffix").is_some() {
        return indexing_expression(ctx, node);
    }
    if node.first_of_kind("navigation_suffix").is_some() {
        return navigation_expression(ctx, node);
    }
    expressions::paren(ctx, node)
}

/// Callee plus `call_suffix`; a trailing lambda is the last argument
fn call_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let loc = node.location();
    let Some(callee) = ctx.significant_children(node).into_iter().next() else {
        return expressions::const_literal(ctx, node);
    };
    let suffix = node.first_of_kind("call_suffix");

    if callee.kind() == "navigation_expression" {
        if let Some((receiver, method)) = navigation_parts(ctx, callee) {
            let obj = ctx.lower_expr(receiver);
            let args = call_suffix_args(ctx, suffix);
            return ctx.call_method(obj, &method, args, loc);
        }
    }
    if callee.kind() == "simple_identifier" {
        let name = ctx.text(callee);
        let args = call_suffix_args(ctx, suffix);
        return ctx.call_function(&name, args, loc);
    }
    let target = ctx.lower_expr(callee);
    let args = call_suffix_args(ctx, suffix);
    ctx.call_unknown(target, args, loc)
}

fn call_suffix_args(ctx: &mut LoweringContext<'_>, suffix: Option<Node<'_>>) -> Vec<Register> {
    let Some(suffix) = suffix else {
        return Vec::new();
    };
    let mut args = ctx.call_args(suffix.first_of_kind("value_arguments"));
    if let Some(lambda) = suffix.first_of_kind("annotated_lambda") {
        args.push(ctx.lower_expr(lambda));
    }
    args
}

// ═══════════════════════════════════════════════════════════════════════════
// Operators
// ═══════════════════════════════════════════════════════════════════════════

/// `"Hi $name, ${a + b}"` folds into `+` BINOPs; plain strings stay constants
fn string_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let interpolated = node
        .named_kids()
        .iter()
        .any(|c| matches!(c.kind(), "interpolated_identifier" | "interpolated_expression"));
    if !interpolated {
        return expressions::const_literal(ctx, node);
    }
    let mut parts = Vec::new();
    for child in node.named_kids() {
        match child.kind() {
            "string_content" | "escape_sequence" => {
                let text = ctx.text(child);
                parts.push(ctx.const_value(text, child.location()));
            }
            "interpolated_identifier" => {
                let name = ctx.text(child).trim_start_matches('$').to_string();
                parts.push(ctx.load_var(name, child.location()));
            }
            "interpolated_expression" => {
                let inner = ctx.significant_children(child).into_iter().next();
                parts.push(match inner {
                    Some(inner) => ctx.lower_expr(inner),
                    None => expressions::const_literal(ctx, child),
                });
            }
            _ => {}
        }
    }
    ctx.lower_concat(parts, node)
}

/// `++x` / `--x` step the target; `-x` / `!x` are UNOPs
fn prefix_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let text = ctx.text(node);
    if text.starts_with("++") || text.starts_with("--") {
        return expressions::update_expr(ctx, node);
    }
    let has_operator = node.kids().iter().any(|c| !c.is_named());
    if has_operator {
        expressions::unop(ctx, node)
    } else {
        expressions::unwrap_last(ctx, node)
    }
}

/// `x++` / `x--` step the target; `x!!` is a UNOP `!!`
fn postfix_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let text = ctx.text(node);
    if text.ends_with("++") || text.ends_with("--") {
        return expressions::update_expr(ctx, node);
    }
    if text.ends_with("!!") {
        let operand = ctx.significant_children(node).into_iter().next();
        let inner = ctx.lower_opt_expr(operand);
        return ctx.emit_value(Opcode::Unop, vec!["!!".into(), inner.into()], node.location());
    }
    expressions::unwrap_first(ctx, node)
}

/// `a ?: b`
fn elvis_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let kids = ctx.significant_children(node);
    let (Some(lhs), Some(rhs)) = (kids.first().copied(), kids.last().copied()) else {
        return expressions::const_literal(ctx, node);
    };
    let l = ctx.lower_expr(lhs);
    let r = ctx.lower_expr(rhs);
    ctx.binop("?:", l, r, node.location())
}

/// `a to b`, `0 until n`: a call of the infix function
fn infix_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let kids = ctx.significant_children(node);
    if kids.len() < 3 {
        ctx.malformed("infix call with fewer than 3 parts", node);
        return expressions::const_literal(ctx, node);
    }
    let name = ctx.text(kids[1]);
    let operands = [kids[0], kids[2]];
    ctx.lower_intrinsic(&name, &operands, node)
}

/// `a..b`
fn range_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let bounds = ctx.significant_children(node);
    ctx.lower_intrinsic("range", &bounds, node)
}

/// `x is T` / `x !is T` -> `CALL_FUNCTION is x "T"`, negated by UNOP `!`
fn check_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let kids = ctx.significant_children(node);
    let (Some(value), Some(ty)) = (kids.first().copied(), kids.last().copied()) else {
        return expressions::const_literal(ctx, node);
    };
    let negated = has_token(ctx, node, "!is") || has_token(ctx, node, "!in");
    let in_check = has_token(ctx, node, "in") || has_token(ctx, node, "!in");
    let subject = ctx.lower_expr(value);
    let result = if in_check {
        let range = ctx.lower_expr(ty);
        ctx.call_function("in", vec![subject, range], node.location())
    } else {
        let type_name = ctx.text(ty);
        let type_reg = ctx.const_value(type_name, SourceLocation::UNKNOWN);
        ctx.call_function("is", vec![subject, type_reg], node.location())
    };
    if negated {
        return ctx.emit_value(Opcode::Unop, vec!["!".into(), result.into()], node.location());
    }
    result
}

/// `x as T` / `x as? T`
fn as_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let kids = ctx.significant_children(node);
    let (Some(value), Some(ty)) = (kids.first().copied(), kids.last().copied()) else {
        return expressions::const_literal(ctx, node);
    };
    let subject = ctx.lower_expr(value);
    let type_name = ctx.text(ty);
    let type_reg = ctx.const_value(type_name, SourceLocation::UNKNOWN);
    ctx.call_function("as", vec![subject, type_reg], node.location())
}

fn collection_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("list", &elements, node)
}

// ═══════════════════════════════════════════════════════════════════════════
// Branching
// ═══════════════════════════════════════════════════════════════════════════

/// `(condition, consequence, alternative)`, by field where the grammar has
/// them and by position otherwise
fn if_parts<'t>(
    ctx: &LoweringContext<'_>,
    node: Node<'t>,
) -> (Option<Node<'t>>, Option<Node<'t>>, Option<Node<'t>>) {
    let cond = node
        .field("condition")
        .or_else(|| ctx.significant_children(node).into_iter().next());
    let bodies: Vec<Node<'t>> = node
        .named_kids()
        .into_iter()
        .filter(|c| c.kind() == "control_structure_body")
        .collect();
    let then = node.field("consequence").or_else(|| bodies.first().copied());
    let otherwise = node.field("alternative").or_else(|| bodies.get(1).copied());
    (cond, then, otherwise)
}

fn if_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let (cond, then, otherwise) = if_parts(ctx, node);
    let alternatives: Vec<Node<'_>> = otherwise.into_iter().collect();
    ctx.lower_if_parts(cond, then, &alternatives, node);
}

/// `if` in value position: each branch's last statement is its value
fn if_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (cond, then, otherwise) = if_parts(ctx, node);
    let (Some(cond), Some(then)) = (cond, then) else {
        ctx.malformed("if expression without condition or consequence", node);
        return ctx.const_none();
    };
    ctx.lower_if_value(cond, then, otherwise, node, body_value)
}

/// `when (x) { 1, 2 -> a; in r -> b; is T -> c; else -> d }`
///
/// Without a subject every condition is a boolean of its own.
fn when_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let subject_node = node.first_of_kind("when_subject");
    let has_subject = subject_node.is_some();
    let subject = match subject_node {
        Some(s) => when_subject(ctx, s),
        None => {
            let lit = ctx.literals().true_lit;
            ctx.const_value(lit, SourceLocation::UNKNOWN)
        }
    };
    let arms: Vec<(Vec<Node<'_>>, Node<'_>)> = node
        .named_kids()
        .into_iter()
        .filter(|e| e.kind() == "when_entry")
        .filter_map(|entry| {
            let conditions: Vec<Node<'_>> = entry
                .named_kids()
                .into_iter()
                .filter(|c| c.kind() == "when_condition")
                .collect();
            let body = entry.first_of_kind("control_structure_body").or_else(|| {
                entry
                    .named_kids()
                    .into_iter()
                    .find(|c| c.kind() != "when_condition" && !ctx.profile().is_skipped(c.kind()))
            })?;
            Some((conditions, body))
        })
        .collect();
    ctx.lower_match_value_with(
        subject,
        &arms,
        node,
        |ctx, subject, conditions| {
            let mut acc: Option<Register> = None;
            for condition in conditions {
                let test = when_condition(ctx, subject, has_subject, *condition);
                acc = Some(match acc {
                    Some(prev) => ctx.binop("||", prev, test, node.location()),
                    None => test,
                });
            }
            match acc {
                Some(reg) => reg,
                None => {
                    let lit = ctx.literals().true_lit;
                    ctx.const_value(lit, SourceLocation::UNKNOWN)
                }
            }
        },
        body_value,
    )
}

/// `(x)` or `(val r = f())`; the binding form also stores the name
fn when_subject(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let value = named_after(ctx, node, "=").or_else(|| {
        ctx.significant_children(node)
            .into_iter()
            .find(|c| c.kind() != "variable_declaration")
    });
    let reg = ctx.lower_opt_expr(value);
    if let Some(name) = node
        .first_of_kind("variable_declaration")
        .and_then(|d| first_identifier(ctx, d))
    {
        ctx.store_var(&name, reg, node.location());
    }
    reg
}

fn when_condition(
    ctx: &mut LoweringContext<'_>,
    subject: Register,
    has_subject: bool,
    condition: Node<'_>,
) -> Register {
    let loc = condition.location();
    let Some(inner) = ctx.significant_children(condition).into_iter().next() else {
        return expressions::const_literal(ctx, condition);
    };
    if !has_subject {
        return ctx.lower_expr(inner);
    }
    let negated = ctx.text(inner).trim_start().starts_with('!');
    let test = match inner.kind() {
        "range_test" => {
            let range = ctx.significant_children(inner).into_iter().last();
            let range = ctx.lower_opt_expr(range);
            ctx.call_function("in", vec![subject, range], loc)
        }
        "type_test" => {
            let type_name = ctx
                .significant_children(inner)
                .into_iter()
                .last()
                .map(|t| ctx.text(t))
                .unwrap_or_default();
            let type_reg = ctx.const_value(type_name, SourceLocation::UNKNOWN);
            ctx.call_function("is", vec![subject, type_reg], loc)
        }
        _ => {
            let value = ctx.lower_expr(inner);
            return ctx.binop("==", subject, value, loc);
        }
    };
    if negated {
        return ctx.emit_value(Opcode::Unop, vec!["!".into(), test.into()], loc);
    }
    test
}

// ═══════════════════════════════════════════════════════════════════════════
// Loops and jumps
// ═══════════════════════════════════════════════════════════════════════════

fn while_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let cond = ctx
        .significant_children(node)
        .into_iter()
        .find(|c| c.kind() != "control_structure_body");
    let body = node.first_of_kind("control_structure_body");
    ctx.lower_while_parts(cond, body, node);
}

fn do_while_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.first_of_kind("control_structure_body");
    let cond = ctx
        .significant_children(node)
        .into_iter()
        .find(|c| c.kind() != "control_structure_body");
    ctx.lower_do_while_parts(body, cond, false, node);
}

/// `for (x in xs)` / `for ((k, v) in map)` over the shared index loop
fn for_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let binding = node.named_kids().into_iter().find(|c| {
        matches!(
            c.kind(),
            "variable_declaration" | "multi_variable_declaration" | "simple_identifier"
        )
    });
    let iterable = named_after(ctx, node, "in").filter(|c| c.kind() != "control_structure_body");
    let body = node.first_of_kind("control_structure_body");
    let Some(iterable) = iterable else {
        ctx.malformed("for without iterable", node);
        return;
    };
    let iter_reg = ctx.lower_expr(iterable);
    ctx.lower_index_loop(
        iter_reg,
        node,
        |ctx, elem, _| {
            if let Some(binding) = binding {
                bind_variables(ctx, binding, elem, node);
            }
        },
        |ctx| ctx.lower_body(body),
    );
}

/// Bind one declaration, or LOAD_INDEX each slot of a multi-declaration
fn bind_variables(ctx: &mut LoweringContext<'_>, binding: Node<'_>, value: Register, node: Node<'_>) {
    match binding.kind() {
        "multi_variable_declaration" => {
            let decls: Vec<Node<'_>> = binding
                .named_kids()
                .into_iter()
                .filter(|c| c.kind() == "variable_declaration")
                .collect();
            for (i, decl) in decls.into_iter().enumerate() {
                let Some(name) = first_identifier(ctx, decl) else {
                    continue;
                };
                let idx = ctx.const_value(i.to_string(), SourceLocation::UNKNOWN);
                let elem = ctx.emit_value(Opcode::LoadIndex, vec![value.into(), idx.into()], decl.location());
                ctx.store_var(&name, elem, node.location());
            }
        }
        "simple_identifier" => {
            let name = ctx.text(binding);
            ctx.store_var(&name, value, node.location());
        }
        _ => {
            if let Some(name) = first_identifier(ctx, binding) {
                ctx.store_var(&name, value, node.location());
            }
        }
    }
}

/// `return [v]`, `throw e`, `break`, `continue` (labels ignored)
fn jump_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let text = ctx.text(node);
    if text.starts_with("return") {
        let value = ctx.significant_children(node).into_iter().next();
        ctx.lower_return(value, node);
    } else if text.starts_with("throw") {
        control_flow::throw_statement(ctx, node);
    } else if text.starts_with("break") {
        control_flow::break_statement(ctx, node);
    } else if text.starts_with("continue") {
        control_flow::continue_statement(ctx, node);
    } else {
        tracing::warn!("unrecognised jump expression at {}", node.location());
        ctx.symbolic("unsupported:jump_expression", node.location());
    }
}

/// `try { } catch (e: T) { } finally { }`
fn try_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut parts = TryParts {
        body: node.first_of_kind("statements"),
        ..TryParts::default()
    };
    for child in node.named_kids() {
        match child.kind() {
            "catch_block" => parts.catches.push(CatchClause {
                variable: child.first_of_kind("simple_identifier"),
                exception_type: child.first_of_kind("user_type"),
                body: child.first_of_kind("statements"),
            }),
            "finally_block" => parts.finally_body = child.first_of_kind("statements"),
            _ => {}
        }
    }
    ctx.lower_try(&parts, node);
}

// ═══════════════════════════════════════════════════════════════════════════
// Declarations
// ═══════════════════════════════════════════════════════════════════════════

/// `val x: T = v`, `var (a, b) = pair`, `val y by lazy { .. }`
fn property_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let value = named_after(ctx, node, "=").or_else(|| {
        node.first_of_kind("property_delegate")
            .and_then(|d| ctx.significant_children(d).into_iter().next())
    });
    let reg = ctx.lower_opt_expr(value);
    if let Some(multi) = node.first_of_kind("multi_variable_declaration") {
        bind_variables(ctx, multi, reg, node);
        return;
    }
    match node.first_of_kind("variable_declaration") {
        Some(decl) => bind_variables(ctx, decl, reg, node),
        None => ctx.malformed("property without a variable", node),
    }
}

/// `target = v` / `target op= v`
fn assignment(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let kids = ctx.significant_children(node);
    let (Some(target), Some(value)) = (kids.first().copied(), kids.last().copied()) else {
        ctx.malformed("assignment without target or value", node);
        return;
    };
    let op = node
        .kids()
        .into_iter()
        .find(|c| !c.is_named() && ctx.text(*c).ends_with('='))
        .map(|c| ctx.text(c))
        .unwrap_or_else(|| "=".to_string());
    let reg = if op == "=" {
        ctx.lower_expr(value)
    } else {
        let current = ctx.lower_expr(target);
        let rhs = ctx.lower_expr(value);
        ctx.binop(op.trim_end_matches('='), current, rhs, node.location())
    };
    store_target(ctx, target, reg, node);
}

/// STORE_VAR / STORE_FIELD / STORE_INDEX through a (suffixed) target
fn store_target(ctx: &mut LoweringContext<'_>, target: Node<'_>, value: Register, node: Node<'_>) {
    let loc = node.location();
    if let Some(index) = index_of(ctx, target) {
        let receiver = ctx.significant_children(target).into_iter().next();
        let obj = ctx.lower_opt_expr(receiver);
        let idx = ctx.lower_expr(index);
        ctx.emit_effect(Opcode::StoreIndex, vec![obj.into(), idx.into(), value.into()], loc);
        return;
    }
    if let Some((receiver, member)) = navigation_parts(ctx, target) {
        let obj = ctx.lower_expr(receiver);
        ctx.store_field(obj, &member, value, loc);
        return;
    }
    match target.kind() {
        "directly_assignable_expression"
        | "navigation_expression"
        | "parenthesized_directly_assignable_expression" => {
            match ctx.significant_children(target).into_iter().next() {
                Some(inner) => store_target(ctx, inner, value, node),
                None => {
                    let name = ctx.text(target);
                    ctx.store_var(name, value, loc);
                }
            }
        }
        _ => ctx.lower_store_target(target, value, node),
    }
}

/// `fun name(params): T { .. }` or `= expr`
fn function_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = first_identifier(ctx, node).unwrap_or_else(|| ctx.anonymous_name());
    let params = node.first_of_kind("function_value_parameters");
    let body = node.first_of_kind("function_body");
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        lower_kotlin_params(ctx, params);
        lower_function_body(ctx, body);
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// Block bodies run their statements; `= expr` bodies return the value
fn lower_function_body(ctx: &mut LoweringContext<'_>, body: Option<Node<'_>>) {
    let Some(body) = body else {
        return;
    };
    if has_token(ctx, body, "=") {
        if let Some(expr) = ctx.significant_children(body).into_iter().next() {
            let reg = ctx.lower_expr(expr);
            ctx.emit_effect(Opcode::Return, vec![reg.into()], body.location());
        }
        return;
    }
    statements_of(ctx, body);
}

fn anonymous_function(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let params = node.first_of_kind("function_value_parameters");
    let body = node.first_of_kind("function_body");
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        lower_kotlin_params(ctx, params);
        lower_function_body(ctx, body);
    })
}

/// `{ a, b -> stmts }`: the last statement's value is returned
fn lambda_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let params = node.first_of_kind("lambda_parameters");
    let body = node.first_of_kind("statements");
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        if let Some(params) = params {
            for decl in params.named_kids() {
                if let Some(param) = first_identifier(ctx, decl).or_else(|| {
                    (decl.kind() == "simple_identifier").then(|| ctx.text(decl))
                }) {
                    ctx.emit_param(&param, decl.location());
                }
            }
        }
        if let Some(body) = body {
            let value = body_value(ctx, body);
            ctx.emit_effect(Opcode::Return, vec![value.into()], body.location());
        }
    })
}

/// Class bracket; `val`/`var` constructor parameters become fields set by
/// the primary constructor; enum entries map to ordinals
fn class_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .first_of_kind("type_identifier")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    if let Some(body) = node.first_of_kind("enum_class_body") {
        let entries: Vec<String> = body
            .named_kids()
            .into_iter()
            .filter(|c| c.kind() == "enum_entry")
            .filter_map(|c| first_identifier(ctx, c))
            .collect();
        ctx.lower_ordinal_object("enum", &name, &entries, node);
        for member in body.named_kids() {
            if member.kind() != "enum_entry" {
                ctx.lower_stmt(member);
            }
        }
        return;
    }
    let primary = node.first_of_kind("primary_constructor");
    let body = node.first_of_kind("class_body");
    ctx.emit_class(&name, node, |ctx| {
        if let Some(primary) = primary {
            primary_constructor(ctx, primary);
        }
        if let Some(body) = body {
            ctx.lower_block(body);
        }
    });
}

/// `class P(val x: Int, y: Int)`: every parameter binds, `val`/`var` ones
/// are also stored onto `this`
fn primary_constructor(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let func_ref = ctx.emit_function(CONSTRUCTOR_NAME, node, |ctx| {
        let params: Vec<Node<'_>> = node
            .named_kids()
            .into_iter()
            .filter(|c| c.kind() == "class_parameter")
            .collect();
        for param in params {
            let Some(name) = first_identifier(ctx, param) else {
                continue;
            };
            ctx.emit_param(&name, param.location());
            if declares_property(ctx, param) {
                let this = ctx.load_var("this", SourceLocation::UNKNOWN);
                let value = ctx.load_var(name.clone(), SourceLocation::UNKNOWN);
                ctx.store_field(this, &name, value, param.location());
            }
        }
    });
    ctx.store_var(CONSTRUCTOR_NAME, func_ref, node.location());
}

/// `constructor(params) : this(..) { .. }`
fn secondary_constructor(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let params = node.first_of_kind("function_value_parameters");
    let body = node.first_of_kind("statements");
    let func_ref = ctx.emit_function(CONSTRUCTOR_NAME, node, |ctx| {
        lower_kotlin_params(ctx, params);
        if let Some(body) = body {
            ctx.lower_block(body);
        }
    });
    ctx.store_var(CONSTRUCTOR_NAME, func_ref, node.location());
}

/// `object Name { .. }`: the class bracket, then its single instance
fn object_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .first_of_kind("type_identifier")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let body = node.first_of_kind("class_body");
    ctx.emit_class(&name, node, |ctx| {
        if let Some(body) = body {
            ctx.lower_block(body);
        }
    });
    let instance = ctx.new_object(&name, node.location());
    ctx.store_var(&name, instance, node.location());
}

/// Companion members run in the enclosing class scope
fn companion_object(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(body) = node.first_of_kind("class_body") {
        ctx.lower_block(body);
    }
}

/// `object : T { .. }` as an expression: anonymous bracket plus NEW_OBJECT
fn object_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .first_of_kind("delegation_specifier")
        .map(|d| ctx.text(d))
        .unwrap_or_else(|| "object".to_string());
    let name = ctx.anonymous_name();
    let body = node.first_of_kind("class_body");
    ctx.emit_class(&name, node, |ctx| {
        if let Some(body) = body {
            ctx.lower_block(body);
        }
    });
    ctx.new_object(&type_name, node.location())
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;
    use pretty_assertions::assert_eq;

    fn dump(src: &str) -> Vec<String> {
        lower_with_language(LanguageId::Kotlin, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    fn assert_supported(ir: &[String]) {
        let bad: Vec<&String> = ir.iter().filter(|l| l.contains("unsupported:")).collect();
        assert!(bad.is_empty(), "unsupported constructs: {:#?}", bad);
    }

    #[test]
    fn test_expression_body_function() {
        let ir = dump("fun add(a: Int, b: Int): Int = a + b\n");
        assert_supported(&ir);
        assert_eq!(
            ir,
            vec![
                "entry:",
                "branch end_add_1",
                "func_add_0:",
                "%0 = symbolic param:a",
                "store_var a %0",
                "%1 = symbolic param:b",
                "store_var b %1",
                "%2 = load_var a",
                "%3 = load_var b",
                "%4 = binop + %2 %3",
                "return %4",
                "%5 = const Unit",
                "return %5",
                "end_add_1:",
                "%6 = const <function:add@func_add_0>",
                "store_var add %6",
            ]
        );
    }

    #[test]
    fn test_properties_and_string_template() {
        let ir = dump("val name = \"x\"\nval s = \"Hi $name!\"\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var name ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.ends_with("load_var name")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop + ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var s ")), "{:#?}", ir);
    }

    #[test]
    fn test_when_with_subject() {
        let src = "fun f(x: Int) = when (x) {\n    1, 2 -> \"a\"\n    in 3..5 -> \"b\"\n    else -> \"c\"\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop == ")).count(), 2, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function in ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("load_var __match_result_")), "{:#?}", ir);
    }

    #[test]
    fn test_for_loop_with_if_else() {
        let src = "fun f(xs: List<Int>) {\n    for (i in xs) {\n        if (i > 2) println(i) else continue\n    }\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function len")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var i ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function println")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("branch for_update_")), "{:#?}", ir);
    }

    #[test]
    fn test_constructor_stores_only_declared_properties() {
        let ir = dump("class P(val x: Int, var y: Int, z: Int)\n");
        assert_supported(&ir);
        let stores: Vec<&String> = ir.iter().filter(|l| l.starts_with("store_field ")).collect();
        assert_eq!(stores.len(), 2, "{:#?}", ir);
        assert!(stores[0].contains(" x "), "{:#?}", stores);
        assert!(stores[1].contains(" y "), "{:#?}", stores);
        assert!(ir.iter().any(|l| l.starts_with("store_var z ")), "{:#?}", ir);
    }

    #[test]
    fn test_class_with_primary_constructor() {
        let ir = dump("class P(val x: Int) {\n    fun get() = x\n}\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("class_P_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func___init___")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_field") && l.contains(" x ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func_get_")), "{:#?}", ir);
    }

    #[test]
    fn test_trailing_lambda_method_call() {
        let ir = dump("val ys = xs.map { it * 2 }\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_method ") && l.contains(" map")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func___anon_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop * ")), "{:#?}", ir);
    }

    #[test]
    fn test_try_catch_finally() {
        let ir = dump("fun f() {\n    try {\n        a()\n    } catch (e: Exception) {\n        b()\n    } finally {\n        c()\n    }\n}\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("caught_exception:Exception")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var e ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("try_finally_")), "{:#?}", ir);
    }

    #[test]
    fn test_enum_and_object() {
        let ir = dump("enum class Color { RED, GREEN }\nobject Registry {\n    val items = 0\n}\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("new_object enum:Color")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("class_Registry_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.ends_with("new_object Registry")), "{:#?}", ir);
    }

    #[test]
    fn test_elvis_not_null_and_stores() {
        let src = "fun f(o: Obj, a: Array<Int>, s: String?) {\n    val n = s ?: \"d\"\n    val m = s!!\n    a[0] = 2\n    o.f = 3\n    var x = 1\n    x += 1\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("binop ?: ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("unop !! ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_index ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_field ") && l.contains(" f ")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var x ")).count(), 2, "{:#?}", ir);
    }
}

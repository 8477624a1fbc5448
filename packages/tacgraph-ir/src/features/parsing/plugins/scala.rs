//! Scala profile
//!
//! Every Scala body is an expression: a block evaluates to its last
//! statement, `if` / `match` / `try` produce values and a `def` returns what
//! its body evaluates to. `case` clause bodies are a run of sibling `body`
//! fields rather than one node, so match arms and catch handlers are keyed on
//! the clause itself.

use crate::features::lowering::domain::{CatchClause, SyntaxNode, TryParts};
use crate::features::lowering::infrastructure::{
    assignments, control_flow, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::constants::{COMPREHENSION_VAR, CONSTRUCTOR_NAME};
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

/// Block children that never carry the block's value
const NON_VALUE_KINDS: &[&str] = &[
    "val_definition",
    "var_definition",
    "val_declaration",
    "var_declaration",
    "function_definition",
    "function_declaration",
    "class_definition",
    "object_definition",
    "trait_definition",
    "enum_definition",
    "type_definition",
    "import_declaration",
    "package_clause",
    "while_expression",
    "do_while_expression",
];

const BLOCK_KINDS: &[&str] = &["block", "indented_block", "template_body"];

const LITERAL_PATTERN_KINDS: &[&str] = &[
    "integer_literal",
    "floating_point_literal",
    "string",
    "character_literal",
    "boolean_literal",
    "null_literal",
    "stable_identifier",
];

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Scala)
        .literals(Literals::new("true", "false", "null", "()"))
        .fields(FieldNames {
            attr_object: "value",
            attr_member: "field",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["comment", "block_comment"],
            noise: vec![
                "\n",
                ";",
                "annotation",
                "modifiers",
                "access_modifier",
                "type_parameters",
                "package_clause",
                "import_declaration",
                "export_declaration",
            ],
            blocks: vec!["block", "indented_block", "template_body", "compilation_unit"],
            identifiers: vec!["identifier", "operator_identifier", "this", "super", "stable_identifier"],
            members: vec!["field_expression"],
            subscripts: vec![],
            patterns: vec!["tuple_pattern"],
            argument_wrappers: vec![],
        })
        // Expressions
        .exprs(
            &["identifier", "operator_identifier", "this", "super", "stable_identifier"],
            expressions::identifier,
        )
        .exprs(
            &[
                "integer_literal",
                "floating_point_literal",
                "string",
                "character_literal",
                "symbol_literal",
            ],
            expressions::const_literal,
        )
        .expr("boolean_literal", expressions::canonical_bool)
        .expr("null_literal", expressions::canonical_none)
        .expr("unit", unit_value)
        .expr("wildcard", expressions::symbolic_node)
        .expr("infix_expression", expressions::binop)
        .expr("prefix_expression", expressions::unop)
        .expr("postfix_expression", postfix_expression)
        .expr("parenthesized_expression", expressions::paren)
        .exprs(&["ascription_expression", "generic_function"], expressions::unwrap_first)
        .expr("call_expression", call_expression)
        .expr("field_expression", expressions::member_load)
        .expr("assignment_expression", assignment)
        .expr("tuple_expression", tuple_expression)
        .expr("interpolated_string_expression", interpolated_string)
        .expr("instance_expression", instance_expression)
        .expr("lambda_expression", lambda_expression)
        .exprs(&["block", "indented_block"], block_expression)
        .expr("if_expression", if_expression)
        .expr("match_expression", match_expression)
        .expr("try_expression", try_expression)
        .expr("for_expression", for_expression)
        .exprs(
            &["return_expression", "throw_expression", "while_expression", "do_while_expression"],
            as_unit,
        )
        // Statements
        .stmts(&["val_definition", "var_definition"], value_definition)
        .stmts(&["val_declaration", "var_declaration"], value_declaration)
        .stmt("function_definition", function_definition)
        .stmts(&["function_declaration", "type_definition"], control_flow::ignore)
        .stmts(&["class_definition", "trait_definition"], class_definition)
        .stmt("object_definition", object_definition)
        .stmt("enum_definition", enum_definition)
        .stmt("if_expression", control_flow::if_statement)
        .stmt("while_expression", control_flow::while_statement)
        .stmt("do_while_expression", do_while_expression)
        .stmt("for_expression", for_statement)
        .stmt("try_expression", try_statement)
        .stmt("return_expression", return_expression)
        .stmt("throw_expression", control_flow::throw_statement)
        .stmt("case_clause", case_clause_body)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Blocks and values
// ═══════════════════════════════════════════════════════════════════════════

/// Lower a run of statements; the value is the last one, if it has one
fn sequence_value(ctx: &mut LoweringContext<'_>, stmts: &[Node<'_>]) -> Option<Register> {
    let (last, init) = stmts.split_last()?;
    for stmt in init {
        ctx.lower_stmt(*stmt);
    }
    if NON_VALUE_KINDS.contains(&last.kind()) {
        ctx.lower_stmt(*last);
        return None;
    }
    Some(ctx.lower_expr(*last))
}

fn block_value(ctx: &mut LoweringContext<'_>, block: Node<'_>) -> Option<Register> {
    let kids = ctx.significant_children(block);
    sequence_value(ctx, &kids)
}

fn block_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match block_value(ctx, node) {
        Some(reg) => reg,
        None => ctx.const_none(),
    }
}

/// Value of a branch, arm or body: blocks by their last statement
fn value_of(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    if BLOCK_KINDS.contains(&node.kind()) {
        return block_expression(ctx, node);
    }
    if node.kind() == "case_clause" {
        let body = clause_body(ctx, node);
        return match sequence_value(ctx, &body) {
            Some(reg) => reg,
            None => ctx.const_none(),
        };
    }
    ctx.lower_expr(node)
}

/// `def` and lambda bodies: an explicit RETURN of the body's value
fn lower_tail_return(ctx: &mut LoweringContext<'_>, body: Option<Node<'_>>) {
    let Some(body) = body else {
        return;
    };
    let value = if BLOCK_KINDS.contains(&body.kind()) {
        block_value(ctx, body)
    } else if NON_VALUE_KINDS.contains(&body.kind()) {
        ctx.lower_stmt(body);
        None
    } else {
        Some(ctx.lower_expr(body))
    };
    if let Some(reg) = value {
        ctx.emit_effect(Opcode::Return, vec![reg.into()], body.location());
    }
}

/// Statement-only constructs used as a value: the statement, then none
fn as_unit(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    ctx.lower_stmt(node);
    ctx.const_none()
}

fn unit_value(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let default = ctx.literals().default_return;
    ctx.const_value(default, node.location())
}

/// The statements of a `case` clause, for catch handlers
fn case_clause_body(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for stmt in clause_body(ctx, node) {
        ctx.lower_stmt(stmt);
    }
}

/// Statements under a clause's `body` field; `;` separators share the field
fn clause_body<'t>(ctx: &LoweringContext<'_>, clause: Node<'t>) -> Vec<Node<'t>> {
    clause
        .field_all("body")
        .into_iter()
        .filter(|n| n.is_named() && !ctx.profile().is_skipped(n.kind()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `f(a)`, `obj.m(a)` and trailing-block arguments `xs.map { x => .. }`
fn call_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let callee = node.field("function");
    let args = node.field("arguments");
    let trailing = node.field("body");
    let block_args = args.filter(|a| a.kind() != "arguments");
    if trailing.is_none() && block_args.is_none() {
        return ctx.lower_call_parts(callee, args, node);
    }

    let loc = node.location();
    let mut regs = match args {
        Some(a) if a.kind() == "arguments" => ctx.call_args(Some(a)),
        _ => Vec::new(),
    };
    for block in block_args.into_iter().chain(trailing) {
        regs.push(block_argument(ctx, block));
    }
    let Some(callee) = callee else {
        let target = ctx.symbolic("unknown_call_target", loc);
        return ctx.call_unknown(target, regs, loc);
    };
    if callee.kind() == "field_expression" {
        if let Some((obj, member)) = ctx.member_parts(callee) {
            let obj_reg = ctx.lower_expr(obj);
            let method = ctx.text(member);
            return ctx.call_method(obj_reg, &method, regs, loc);
        }
    }
    if ctx.profile().is_identifier(callee.kind()) {
        let name = ctx.text(callee);
        return ctx.call_function(&name, regs, loc);
    }
    let target = ctx.lower_expr(callee);
    ctx.call_unknown(target, regs, loc)
}

/// `a(i) = v` is `a.update(i, v)`: an indexed store; other targets go the usual way
fn assignment(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (Some(left), Some(right)) = (node.field("left"), node.field("right")) else {
        return assignments::assignment_expr(ctx, node);
    };
    let indices = match (left.kind(), left.field("arguments")) {
        ("call_expression", Some(args)) if args.kind() == "arguments" => ctx.significant_children(args),
        _ => Vec::new(),
    };
    let (Some(object), [index]) = (left.field("function"), indices.as_slice()) else {
        return assignments::assignment_expr(ctx, node);
    };
    let value = ctx.lower_expr(right);
    let obj = ctx.lower_expr(object);
    let idx = ctx.lower_expr(*index);
    ctx.emit_effect(Opcode::StoreIndex, vec![obj.into(), idx.into(), value.into()], node.location());
    value
}

/// `{ x => .. }` passes the lambda; `{ case .. }` is a partial function
fn block_argument(ctx: &mut LoweringContext<'_>, block: Node<'_>) -> Register {
    if block.kind() == "case_block" {
        return partial_function(ctx, block);
    }
    value_of(ctx, block)
}

/// `{ case p => v; .. }` as a one-parameter function matching on its argument
fn partial_function(ctx: &mut LoweringContext<'_>, block: Node<'_>) -> Register {
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, block, |ctx| {
        ctx.emit_param("x$1", block.location());
        let subject = ctx.load_var("x$1", block.location());
        let result = lower_case_arms(ctx, subject, block, block);
        ctx.emit_effect(Opcode::Return, vec![result.into()], block.location());
    })
}

/// `x!` style postfix operators become a method call without arguments
fn postfix_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let kids = ctx.significant_children(node);
    let (Some(receiver), Some(op)) = (kids.first(), kids.last()) else {
        ctx.malformed("postfix expression without operand", node);
        return expressions::const_literal(ctx, node);
    };
    let obj = ctx.lower_expr(*receiver);
    let method = ctx.text(*op);
    ctx.call_method(obj, &method, Vec::new(), node.location())
}

fn tuple_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("tuple", &elements, node)
}

/// `s"hello $name, ${a + b}"`: literal runs and interpolations joined by `+`
fn interpolated_string(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let Some(string) = node
        .field("interpolated_string")
        .or_else(|| node.first_of_kind("interpolated_string"))
    else {
        return expressions::const_literal(ctx, node);
    };
    let text = ctx.text(string);
    let base = string.start_byte();
    let quote = if text.starts_with("\"\"\"") { 3 } else { 1 };
    let close = text.len().saturating_sub(quote).max(quote);

    let mut parts = Vec::new();
    let mut cursor = quote;
    for child in string.named_kids() {
        if child.kind() != "interpolation" {
            continue;
        }
        let start = child.start_byte() - base;
        if start > cursor {
            let piece = &text[cursor..start];
            parts.push(ctx.const_value(format!("\"{}\"", piece), SourceLocation::UNKNOWN));
        }
        let inner = ctx.significant_children(child).into_iter().next();
        parts.push(match inner {
            Some(inner) => value_of(ctx, inner),
            None => expressions::const_literal(ctx, child),
        });
        cursor = child.end_byte() - base;
    }
    if close > cursor {
        let piece = &text[cursor..close];
        parts.push(ctx.const_value(format!("\"{}\"", piece), SourceLocation::UNKNOWN));
    }
    if parts.is_empty() {
        return expressions::const_literal(ctx, string);
    }
    ctx.lower_concat(parts, node)
}

/// `new T(args)`: a call of the type name; an anonymous body is lowered inline
fn instance_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let kids = ctx.significant_children(node);
    let type_name = kids
        .iter()
        .find(|c| matches!(c.kind(), "type_identifier" | "generic_type" | "stable_type_identifier"))
        .map(|t| {
            let text = ctx.text(*t);
            text.split('[').next().unwrap_or_default().trim().to_string()
        })
        .unwrap_or_else(|| "Object".to_string());
    let args = kids.iter().copied().find(|c| c.kind() == "arguments");
    let regs = ctx.call_args(args);
    let instance = ctx.call_function(&type_name, regs, node.location());
    if let Some(body) = kids.iter().copied().find(|c| c.kind() == "template_body") {
        ctx.lower_block(body);
    }
    instance
}

/// `x => body`, `(a, b) => body`, `_ + 1` style lambdas
fn lambda_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let params = node.field("parameters");
    let body = node
        .field("body")
        .or_else(|| ctx.significant_children(node).into_iter().last())
        .filter(|b| Some(b.id()) != params.map(|p| p.id()));
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        lower_scala_params(ctx, params);
        lower_tail_return(ctx, body);
    })
}

/// `x`, `(a, b)` binding lists and regular `parameters` clauses
fn lower_scala_params(ctx: &mut LoweringContext<'_>, params: Option<Node<'_>>) {
    let Some(params) = params else {
        return;
    };
    if params.kind() == "identifier" {
        ctx.lower_param(params);
        return;
    }
    for child in ctx.significant_children(params) {
        match child.kind() {
            "binding" | "parameter" | "class_parameter" | "identifier" => ctx.lower_param(child),
            "bindings" | "parameters" | "class_parameters" => lower_scala_params(ctx, Some(child)),
            _ => {}
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Branching
// ═══════════════════════════════════════════════════════════════════════════

fn if_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (Some(cond), Some(then)) = (node.field("condition"), node.field("consequence")) else {
        ctx.malformed("if expression without condition or consequence", node);
        return ctx.const_none();
    };
    let otherwise = node.field("alternative");
    ctx.lower_if_value(cond, then, otherwise, node, value_of)
}

/// `v match { case p if g => .. }` through one result slot
fn match_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let subject = ctx.lower_opt_expr(node.field("value"));
    match node.field("body") {
        Some(body) => lower_case_arms(ctx, subject, body, node),
        None => {
            ctx.malformed("match without case block", node);
            ctx.const_none()
        }
    }
}

/// The clauses of a case block as match arms; an unguarded `_` is the wildcard
fn lower_case_arms(ctx: &mut LoweringContext<'_>, subject: Register, block: Node<'_>, node: Node<'_>) -> Register {
    let arms: Vec<(Vec<Node<'_>>, Node<'_>)> = block
        .named_kids()
        .into_iter()
        .filter(|c| c.kind() == "case_clause")
        .map(|clause| {
            let wildcard = clause_guard(clause).is_none()
                && clause.field("pattern").is_some_and(|p| p.kind() == "wildcard");
            let values = if wildcard { Vec::new() } else { vec![clause] };
            (values, clause)
        })
        .collect();
    ctx.lower_match_value_with(
        subject,
        &arms,
        node,
        |ctx, subject, clauses| {
            let mut acc: Option<Register> = None;
            for clause in clauses {
                let test = case_test(ctx, subject, *clause);
                acc = Some(match acc {
                    Some(prev) => ctx.binop("||", prev, test, clause.location()),
                    None => test,
                });
            }
            match acc {
                Some(reg) => reg,
                None => true_value(ctx),
            }
        },
        value_of,
    )
}

/// Pattern test of one clause, AND-ed with its guard
fn case_test(ctx: &mut LoweringContext<'_>, subject: Register, clause: Node<'_>) -> Register {
    let matched = match clause.field("pattern") {
        Some(pattern) => pattern_test(ctx, subject, pattern),
        None => true_value(ctx),
    };
    let guard = clause_guard(clause)
        .and_then(|g| g.field("condition").or_else(|| ctx.significant_children(g).into_iter().next()));
    match guard {
        Some(cond) => {
            let cond_reg = ctx.lower_expr(cond);
            ctx.binop("&&", matched, cond_reg, clause.location())
        }
        None => matched,
    }
}

fn clause_guard<'t>(clause: Node<'t>) -> Option<Node<'t>> {
    clause.field("guard").or_else(|| clause.first_of_kind("guard"))
}

/// Sub-patterns of `Rect(w, h)`, with or without the `pattern` field
fn case_class_parts<'t>(pattern: Node<'t>) -> Vec<Node<'t>> {
    let parts = pattern.field_all("pattern");
    if !parts.is_empty() {
        return parts;
    }
    let type_id = pattern.field("type").map(|t| t.id());
    pattern
        .named_kids()
        .into_iter()
        .filter(|c| Some(c.id()) != type_id)
        .collect()
}

/// Test `subject` against a pattern, binding the names it introduces
fn pattern_test(ctx: &mut LoweringContext<'_>, subject: Register, pattern: Node<'_>) -> Register {
    let loc = pattern.location();
    match pattern.kind() {
        "wildcard" => true_value(ctx),
        "identifier" if is_binding_name(&ctx.text(pattern)) => {
            let name = ctx.text(pattern);
            ctx.store_var(&name, subject, loc);
            true_value(ctx)
        }
        "typed_pattern" => {
            let type_name = pattern
                .field("type")
                .map(|t| ctx.text(t))
                .unwrap_or_else(|| "Any".to_string());
            let tag = ctx.const_value(type_name, SourceLocation::UNKNOWN);
            let matched = ctx.call_function("is", vec![subject, tag], loc);
            if let Some(inner) = pattern.field("pattern") {
                if inner.kind() == "identifier" {
                    let name = ctx.text(inner);
                    ctx.store_var(&name, subject, loc);
                }
            }
            matched
        }
        "case_class_pattern" => {
            let type_name = pattern
                .field("type")
                .map(|t| ctx.text(t))
                .unwrap_or_else(|| ctx.text(pattern));
            let tag = ctx.const_value(type_name, SourceLocation::UNKNOWN);
            let matched = ctx.call_function("is", vec![subject, tag], loc);
            bind_positional(ctx, subject, &case_class_parts(pattern));
            matched
        }
        "tuple_pattern" => {
            let text = ctx.text(pattern);
            let shape = ctx.const_value(text, SourceLocation::UNKNOWN);
            let parts = ctx.significant_children(pattern);
            bind_positional(ctx, subject, &parts);
            ctx.call_function("matches", vec![subject, shape], loc)
        }
        "alternative_pattern" => {
            let alternatives = ctx.significant_children(pattern);
            let mut acc: Option<Register> = None;
            for alt in alternatives {
                let test = pattern_test(ctx, subject, alt);
                acc = Some(match acc {
                    Some(prev) => ctx.binop("||", prev, test, loc),
                    None => test,
                });
            }
            match acc {
                Some(reg) => reg,
                None => true_value(ctx),
            }
        }
        "capture_pattern" => {
            if let Some(name) = pattern.field("name") {
                let name = ctx.text(name);
                ctx.store_var(&name, subject, loc);
            }
            match pattern.field("pattern") {
                Some(inner) => pattern_test(ctx, subject, inner),
                None => true_value(ctx),
            }
        }
        kind if kind == "identifier" || LITERAL_PATTERN_KINDS.contains(&kind) => {
            let value = ctx.lower_expr(pattern);
            ctx.binop("==", subject, value, loc)
        }
        _ => {
            let text = ctx.text(pattern);
            let shape = ctx.const_value(text, SourceLocation::UNKNOWN);
            ctx.call_function("matches", vec![subject, shape], loc)
        }
    }
}

/// Bind the identifiers among positional sub-patterns through LOAD_INDEX
fn bind_positional(ctx: &mut LoweringContext<'_>, subject: Register, parts: &[Node<'_>]) {
    for (i, part) in parts.iter().enumerate() {
        let name = match part.kind() {
            "identifier" => Some(*part),
            "typed_pattern" | "capture_pattern" => part
                .field("pattern")
                .filter(|p| p.kind() == "identifier")
                .or_else(|| part.field("name")),
            _ => None,
        };
        let Some(name) = name.filter(|n| is_binding_name(&ctx.text(*n))) else {
            continue;
        };
        let idx = ctx.const_value(i.to_string(), SourceLocation::UNKNOWN);
        let elem = ctx.emit_value(Opcode::LoadIndex, vec![subject.into(), idx.into()], part.location());
        let name = ctx.text(name);
        ctx.store_var(&name, elem, part.location());
    }
}

/// Lowercase identifiers in pattern position bind; `None`, `Nil` compare
fn is_binding_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_lowercase()) && !name.starts_with('`')
}

fn true_value(ctx: &mut LoweringContext<'_>) -> Register {
    let lit = ctx.literals().true_lit;
    ctx.const_value(lit, SourceLocation::UNKNOWN)
}

// ═══════════════════════════════════════════════════════════════════════════
// Loops and jumps
// ═══════════════════════════════════════════════════════════════════════════

fn do_while_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    ctx.lower_do_while_parts(node.field("body"), node.field("condition"), false, node);
}

fn return_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let value = ctx.significant_children(node).into_iter().next();
    ctx.lower_return(value, node);
}

/// One generator of a `for`: `pat <- xs` loops, `pat = v` binds, guards filter
struct Enumerator<'t> {
    pattern: Option<Node<'t>>,
    source: Option<Node<'t>>,
    generator: bool,
    guards: Vec<Node<'t>>,
}

fn enumerators_of<'t>(ctx: &LoweringContext<'_>, node: Node<'t>) -> Vec<Enumerator<'t>> {
    // the `enumerators` field also covers the surrounding parens or braces
    let Some(list) = node
        .first_of_kind("enumerators")
        .or_else(|| node.field("enumerators").filter(|n| n.kind() == "enumerators"))
    else {
        ctx.malformed("for without an enumerator list", node);
        return Vec::new();
    };
    let mut out: Vec<Enumerator<'t>> = Vec::new();
    for child in ctx.significant_children(list) {
        match child.kind() {
            "enumerator" => {
                let kids = ctx.significant_children(child);
                let (guards, rest): (Vec<Node<'t>>, Vec<Node<'t>>) =
                    kids.into_iter().partition(|k| k.kind() == "guard");
                let generator = child
                    .kids()
                    .into_iter()
                    .any(|k| !k.is_named() && ctx.text(k) == "<-");
                out.push(Enumerator {
                    pattern: rest.first().copied(),
                    source: rest.get(1).copied(),
                    generator,
                    guards,
                });
            }
            "guard" => match out.last_mut() {
                Some(last) => last.guards.push(child),
                None => out.push(Enumerator {
                    pattern: None,
                    source: None,
                    generator: false,
                    guards: vec![child],
                }),
            },
            _ => {}
        }
    }
    if !out.iter().any(|e| e.generator) {
        ctx.malformed("for without a generator", node);
    }
    out
}

/// The `for` body: the last named child that is not the enumerator list
fn for_body<'t>(ctx: &LoweringContext<'_>, node: Node<'t>) -> Option<Node<'t>> {
    node.field("body").or_else(|| {
        ctx.significant_children(node)
            .into_iter()
            .last()
            .filter(|b| b.kind() != "enumerators")
    })
}

fn is_yield(ctx: &LoweringContext<'_>, node: Node<'_>) -> bool {
    node.kids().into_iter().any(|k| !k.is_named() && ctx.text(k) == "yield")
}

/// `for (x <- xs; if p) body`
fn for_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if is_yield(ctx, node) {
        for_expression(ctx, node);
        return;
    }
    let enumerators = enumerators_of(ctx, node);
    let body = for_body(ctx, node);
    lower_generators(ctx, &enumerators, node, &mut |ctx| ctx.lower_body(body));
}

/// `for (..) yield v` collects into a list; a plain `for` evaluates to unit
fn for_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let enumerators = enumerators_of(ctx, node);
    let body = for_body(ctx, node);
    if !is_yield(ctx, node) {
        lower_generators(ctx, &enumerators, node, &mut |ctx| ctx.lower_body(body));
        return ctx.const_none();
    }

    let slot = format!("{}_{}", COMPREHENSION_VAR, ctx.peek_label_counter());
    let size = ctx.const_value("0", SourceLocation::UNKNOWN);
    let result = ctx.emit_value(Opcode::NewArray, vec!["list".into(), size.into()], node.location());
    let zero = ctx.const_value("0", SourceLocation::UNKNOWN);
    ctx.store_var(&slot, zero, SourceLocation::UNKNOWN);
    lower_generators(ctx, &enumerators, node, &mut |ctx| {
        let value = match body {
            Some(b) => value_of(ctx, b),
            None => ctx.const_none(),
        };
        let idx = ctx.load_var(&slot, SourceLocation::UNKNOWN);
        ctx.emit_effect(Opcode::StoreIndex, vec![result.into(), idx.into(), value.into()], node.location());
        ctx.bump_slot(&slot, "+");
    });
    result
}

/// One nesting level per generator; guards skip the rest of the iteration
fn lower_generators(
    ctx: &mut LoweringContext<'_>,
    enumerators: &[Enumerator<'_>],
    node: Node<'_>,
    innermost: &mut dyn FnMut(&mut LoweringContext<'_>),
) {
    let Some((first, rest)) = enumerators.split_first() else {
        innermost(ctx);
        return;
    };
    let pattern = first.pattern;
    match (first.generator, first.source) {
        (true, Some(source)) => {
            let iter = ctx.lower_expr(source);
            ctx.lower_index_loop(
                iter,
                node,
                |ctx, elem, _| {
                    if let Some(pattern) = pattern {
                        bind_enumerator(ctx, pattern, elem, node);
                    }
                },
                |ctx| lower_guarded(ctx, &first.guards, rest, node, innermost),
            );
        }
        (false, Some(source)) => {
            let value = ctx.lower_expr(source);
            if let Some(pattern) = pattern {
                bind_enumerator(ctx, pattern, value, node);
            }
            lower_guarded(ctx, &first.guards, rest, node, innermost);
        }
        _ => lower_guarded(ctx, &first.guards, rest, node, innermost),
    }
}

fn lower_guarded(
    ctx: &mut LoweringContext<'_>,
    guards: &[Node<'_>],
    rest: &[Enumerator<'_>],
    node: Node<'_>,
    innermost: &mut dyn FnMut(&mut LoweringContext<'_>),
) {
    let skip = lower_guards(ctx, guards);
    lower_generators(ctx, rest, node, innermost);
    if let Some(skip) = skip {
        ctx.emit_branch(&skip);
        ctx.emit_label(&skip);
    }
}

fn bind_enumerator(ctx: &mut LoweringContext<'_>, pattern: Node<'_>, value: Register, node: Node<'_>) {
    match pattern.kind() {
        "typed_pattern" | "capture_pattern" => match pattern.field("pattern").or_else(|| pattern.field("name")) {
            Some(inner) => bind_enumerator(ctx, inner, value, node),
            None => ctx.lower_store_target(pattern, value, node),
        },
        "wildcard" => {}
        _ => ctx.lower_store_target(pattern, value, node),
    }
}

/// AND of every guard condition; returns the label a failed test jumps to
fn lower_guards(ctx: &mut LoweringContext<'_>, guards: &[Node<'_>]) -> Option<String> {
    let mut cond: Option<Register> = None;
    for guard in guards {
        let Some(expr) = guard
            .field("condition")
            .or_else(|| ctx.significant_children(*guard).into_iter().next())
        else {
            continue;
        };
        let reg = ctx.lower_expr(expr);
        cond = Some(match cond {
            Some(prev) => ctx.binop("&&", prev, reg, expr.location()),
            None => reg,
        });
    }
    let cond = cond?;
    let pass_label = ctx.fresh_label("for_guard");
    let skip_label = ctx.fresh_label("for_skip");
    ctx.emit_branch_if(cond, &pass_label, &skip_label, SourceLocation::UNKNOWN);
    ctx.emit_label(&pass_label);
    Some(skip_label)
}

// ═══════════════════════════════════════════════════════════════════════════
// Exceptions
// ═══════════════════════════════════════════════════════════════════════════

/// `try body catch { case e: T => .. } finally cleanup`
fn try_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut parts = TryParts {
        body: node.field("body"),
        ..TryParts::default()
    };
    for child in node.named_kids() {
        match child.kind() {
            "catch_clause" => {
                let clauses = match child.first_of_kind("case_block") {
                    Some(block) => block.named_kids(),
                    None => child.named_kids(),
                };
                for clause in clauses.into_iter().filter(|c| c.kind() == "case_clause") {
                    parts.catches.push(catch_case(clause));
                }
            }
            "finally_clause" => parts.finally_body = child.named_kids().into_iter().next(),
            _ => {}
        }
    }
    ctx.lower_try(&parts, node);
}

fn try_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    try_statement(ctx, node);
    ctx.const_none()
}

/// `case e: IOException =>` binds `e`; `case _ =>` catches anything
fn catch_case(clause: Node<'_>) -> CatchClause<'_> {
    let pattern = clause.field("pattern");
    let (variable, exception_type) = match pattern {
        Some(p) if p.kind() == "typed_pattern" => (
            p.field("pattern").filter(|v| v.kind() == "identifier"),
            p.field("type"),
        ),
        Some(p) if p.kind() == "identifier" => (Some(p), None),
        _ => (None, None),
    };
    CatchClause {
        variable,
        exception_type,
        body: Some(clause),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Definitions
// ═══════════════════════════════════════════════════════════════════════════

/// `val p = v` / `var p: T = v`
fn value_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(pattern) = node.field("pattern") else {
        ctx.malformed("value definition without pattern", node);
        return;
    };
    let value = node.field("value");
    match pattern.kind() {
        "typed_pattern" => match pattern.field("pattern") {
            Some(inner) => ctx.lower_declaration(inner, value, node),
            None => ctx.lower_declaration(pattern, value, node),
        },
        "case_class_pattern" => {
            let reg = ctx.lower_opt_expr(value);
            bind_positional(ctx, reg, &case_class_parts(pattern));
        }
        _ => ctx.lower_declaration(pattern, value, node),
    }
}

/// Abstract `val x: T` declares the name as none
fn value_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(name) = node.field("name") {
        ctx.lower_declaration(name, None, node);
    }
}

/// `def f(a: A)(b: B): R = body`; every parameter clause contributes
fn function_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = match node.field("name") {
        Some(n) => ctx.text(n),
        None => ctx.anonymous_name(),
    };
    let params = node.field_all("parameters");
    let body = node.field("body");
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        for clause in params {
            lower_scala_params(ctx, Some(clause));
        }
        lower_tail_return(ctx, body);
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// `class P(val x: Int) { .. }` / `trait T { .. }`
///
/// Constructor parameters become an `__init__` method; `val` / `var`
/// parameters are stored as fields on `this`.
fn class_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = match node.field("name") {
        Some(n) => ctx.text(n),
        None => ctx.anonymous_name(),
    };
    let ctor_params = node.field_all("class_parameters");
    let body = node.field("body");
    ctx.emit_class(&name, node, |ctx| {
        if !ctor_params.is_empty() {
            lower_primary_constructor(ctx, &ctor_params, node);
        }
        if let Some(body) = body {
            ctx.lower_block(body);
        }
    });
}

fn lower_primary_constructor(ctx: &mut LoweringContext<'_>, clauses: &[Node<'_>], node: Node<'_>) {
    let func_ref = ctx.emit_function(CONSTRUCTOR_NAME, node, |ctx| {
        for clause in clauses {
            for param in ctx.significant_children(*clause) {
                if param.kind() != "class_parameter" {
                    continue;
                }
                let Some(name) = ctx.extract_param_name(param) else {
                    continue;
                };
                ctx.emit_param(&name, param.location());
                let is_field = param
                    .kids()
                    .into_iter()
                    .any(|k| !k.is_named() && matches!(ctx.text(k).as_str(), "val" | "var"));
                if is_field {
                    let this = ctx.load_var("this", SourceLocation::UNKNOWN);
                    let value = ctx.load_var(&name, SourceLocation::UNKNOWN);
                    ctx.store_field(this, &name, value, param.location());
                }
            }
        }
    });
    ctx.store_var(CONSTRUCTOR_NAME, func_ref, node.location());
}

/// `object O { .. }`: the class, then its single instance bound to the name
fn object_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = match node.field("name") {
        Some(n) => ctx.text(n),
        None => ctx.anonymous_name(),
    };
    let body = node.field("body");
    ctx.emit_class(&name, node, |ctx| {
        if let Some(body) = body {
            ctx.lower_block(body);
        }
    });
    let instance = ctx.new_object(&name, node.location());
    ctx.store_var(&name, instance, node.location());
}

/// `enum Color { case Red, Green }` as an ordinal object
fn enum_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let mut members = Vec::new();
    if let Some(body) = node.field("body") {
        collect_enum_cases(ctx, body, &mut members);
    }
    let object = ctx.lower_ordinal_object(&format!("enum:{}", name), &name, &members, node);
    ctx.store_var(&name, object, node.location());
}

fn collect_enum_cases(ctx: &LoweringContext<'_>, node: Node<'_>, out: &mut Vec<String>) {
    for child in node.named_kids() {
        match child.kind() {
            "simple_enum_case" | "full_enum_case" => {
                if let Some(name) = child.field("name") {
                    out.push(ctx.text(name));
                }
            }
            "enum_case_definitions" => collect_enum_cases(ctx, child, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;
    use pretty_assertions::assert_eq;

    fn dump(src: &str) -> Vec<String> {
        lower_with_language(LanguageId::Scala, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    fn assert_supported(ir: &[String]) {
        let bad: Vec<&String> = ir.iter().filter(|l| l.contains("unsupported:")).collect();
        assert!(bad.is_empty(), "unsupported constructs: {:#?}", bad);
    }

    #[test]
    fn test_expression_body_is_returned() {
        let ir = dump("def add(a: Int, b: Int): Int = a + b\n");
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
                "%5 = const ()",
                "return %5",
                "end_add_1:",
                "%6 = const <function:add@func_add_0>",
                "store_var add %6",
            ]
        );
    }

    #[test]
    fn test_block_body_returns_last_expression() {
        let ir = dump("def f(x: Int): Int = {\n  val y = x * 2\n  y + 1\n}\n");
        assert_supported(&ir);
        assert!(ir.contains(&"store_var y %3".to_string()), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("return ")).count(), 2, "{:#?}", ir);
    }

    #[test]
    fn test_if_in_value_position() {
        let ir = dump("val m = if (a > b) a else b\n");
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var __block_result_")).count(), 2, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var m ")), "{:#?}", ir);
    }

    #[test]
    fn test_match_with_guard_and_wildcard() {
        let src = "val r = x match {\n  case 1 => \"one\"\n  case n if n > 10 => \"big\"\n  case _ => \"other\"\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("binop == ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop && ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var n ")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var __match_result_")).count(), 4, "{:#?}", ir);
    }

    #[test]
    fn test_typed_and_case_class_patterns() {
        let src = "def f(s: Shape) = s match {\n  case c: Circle => c.r\n  case Rect(w, h) => w * h\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.contains("call_function is ")).count(), 2, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var c ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var w ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var h ")), "{:#?}", ir);
    }

    #[test]
    fn test_for_with_guard() {
        let ir = dump("for (x <- xs if x > 0) {\n  println(x)\n}\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function len")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var x ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("for_skip_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function println")), "{:#?}", ir);
    }

    #[test]
    fn test_for_yield_collects() {
        let ir = dump("val ys = for (x <- xs) yield x * 2\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("new_array list")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_index ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var ys ")), "{:#?}", ir);
    }

    #[test]
    fn test_class_object_and_new() {
        let src = "class Point(val x: Int, y: Int) {\n  def norm(): Int = x\n}\nobject Main {\n  val p = new Point(1, 2)\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("class_Point_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func___init___")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_field ")).count(), 1, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func_norm_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function Point ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("new_object Main")), "{:#?}", ir);
    }

    #[test]
    fn test_lambda_and_interpolation() {
        let ir = dump("val f = (x: Int) => x + 1\nval s = s\"n=$n\"\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("func___anon_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.ends_with("= load_var x")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.ends_with("= load_var n")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var s ")), "{:#?}", ir);
    }

    #[test]
    fn test_try_catch_finally() {
        let src = "try {\n  risky()\n} catch {\n  case e: Exception => handle(e)\n} finally {\n  cleanup()\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("caught_exception:Exception")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var e ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("try_finally_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function cleanup")), "{:#?}", ir);
    }

    #[test]
    fn test_parenthesised_for_keeps_its_loop() {
        let ir = dump("for (x <- xs) { println(x) }\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function len")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("= load_index ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("branch_if ")), "{:#?}", ir);
        let bind = ir.iter().position(|l| l.starts_with("store_var x ")).expect("x bound");
        let call = ir.iter().position(|l| l.contains("call_function println")).expect("body");
        assert!(bind < call, "{:#?}", ir);
    }

    #[test]
    fn test_braced_for_yield_loops() {
        let ir = dump("val ys = for {\n  x <- xs\n} yield x + 1\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function len")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_index ")), "{:#?}", ir);
    }

    #[test]
    fn test_semicolon_separated_case_clauses() {
        let ir = dump("def f(x: Int): Int = x match { case 1 => 2; case _ => 3 }\n");
        assert_supported(&ir);
        assert_eq!(
            ir.iter().filter(|l| l.starts_with("store_var __match_result_")).count(),
            3,
            "{:#?}",
            ir
        );
        assert!(ir.iter().any(|l| l.ends_with("= const 2")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.ends_with("= const 3")), "{:#?}", ir);
    }

    #[test]
    fn test_apply_assignment_stores_by_index() {
        let ir = dump("def f(a: Array[Int], j: Int): Unit = {\n  a(j) = a(j + 1)\n  m.k = 1\n}\n");
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_index ")).count(), 1, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_field ")), "{:#?}", ir);
        assert!(!ir.iter().any(|l| l.starts_with("store_var a(")), "{:#?}", ir);
    }
}

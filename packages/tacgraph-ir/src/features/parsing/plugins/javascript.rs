//! JavaScript profile
//!
//! Covers declarations with object / array destructuring, `for..in` (over
//! `keys(obj)`) and `for..of`, C-style `switch` with fallthrough, object
//! literals, template strings and `new`.

use crate::features::lowering::domain::{CatchClause, SyntaxNode, TryParts};
use crate::features::lowering::infrastructure::control_flow::CaseStyle;
use crate::features::lowering::infrastructure::{
    assignments, control_flow, definitions, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

pub(super) const LITERALS: Literals = Literals::new("true", "false", "undefined", "undefined");

pub(super) fn fields() -> FieldNames {
    FieldNames {
        attr_member: "property",
        subscript_value: "object",
        subscript_index: "index",
        ..FieldNames::default()
    }
}

pub(super) fn kinds() -> NodeKinds {
    NodeKinds {
        comments: vec!["comment", "html_comment"],
        noise: vec!["\n", ";", "empty_statement"],
        blocks: vec!["statement_block", "program", "class_body"],
        identifiers: vec![
            "identifier",
            "property_identifier",
            "shorthand_property_identifier",
            "private_property_identifier",
        ],
        members: vec!["member_expression"],
        subscripts: vec!["subscript_expression"],
        patterns: vec!["array_pattern"],
        argument_wrappers: vec![],
    }
}

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::JavaScript)
        .literals(LITERALS)
        .fields(fields())
        .kinds(kinds())
        // Expressions
        .exprs(
            &[
                "identifier",
                "property_identifier",
                "shorthand_property_identifier",
                "private_property_identifier",
                "this",
                "super",
            ],
            expressions::identifier,
        )
        .exprs(&["number", "string", "regex", "true", "false", "null"], expressions::const_literal)
        .expr("undefined", expressions::canonical_none)
        .expr("template_string", template_string)
        .expr("template_substitution", expressions::unwrap_first)
        .expr("binary_expression", expressions::binop)
        .expr("unary_expression", expressions::unop)
        .expr("update_expression", expressions::update_expr)
        .expr("call_expression", expressions::call)
        .expr("new_expression", new_expression)
        .expr("member_expression", expressions::member_load)
        .expr("subscript_expression", expressions::subscript_load)
        .expr("parenthesized_expression", expressions::paren)
        .expr("array", array_literal)
        .expr("object", object_literal)
        .expr("assignment_expression", assignment_expression)
        .expr("augmented_assignment_expression", assignments::augmented_assignment_expr)
        .expr("arrow_function", definitions::anonymous_function)
        .exprs(&["function_expression", "function", "generator_function"], function_expression)
        .expr("class", class_expression)
        .expr("ternary_expression", expressions::ternary)
        .expr("await_expression", await_expression)
        .expr("yield_expression", yield_expression)
        .expr("sequence_expression", sequence_expression)
        .expr("spread_element", expressions::unwrap_first)
        // Statements
        .stmt("expression_statement", control_flow::statement_list)
        .stmts(&["lexical_declaration", "variable_declaration"], variable_declaration)
        .stmt("return_statement", control_flow::return_statement)
        .stmt("if_statement", control_flow::if_statement)
        .stmt("while_statement", control_flow::while_statement)
        .stmt("do_statement", control_flow::do_while_statement)
        .stmt("for_statement", control_flow::c_for_statement)
        .stmt("for_in_statement", for_in_statement)
        .stmts(
            &["function_declaration", "generator_function_declaration", "method_definition"],
            definitions::function_def,
        )
        .stmt("class_declaration", definitions::class_def)
        .stmt("field_definition", field_definition)
        .stmt("class_static_block", class_static_block)
        .stmt("throw_statement", control_flow::throw_statement)
        .stmt("statement_block", control_flow::statement_list)
        .stmt("break_statement", control_flow::break_statement)
        .stmt("continue_statement", control_flow::continue_statement)
        .stmt("try_statement", try_statement)
        .stmt("switch_statement", switch_statement)
        .stmt("labeled_statement", labeled_statement)
        .stmt("export_statement", export_statement)
        .stmts(&["import_statement", "debugger_statement"], control_flow::ignore)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `` `a${b}c` `` -> `"a" + b + "c"`; without substitutions the literal text
pub(super) fn template_string(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    if !node.has_child_kind("template_substitution") {
        return expressions::const_literal(ctx, node);
    }
    let mut acc: Option<Register> = None;
    for part in node.kids() {
        let reg = match part.kind() {
            "`" => continue,
            "template_substitution" => ctx.lower_expr(part),
            _ => {
                let text = ctx.text(part);
                ctx.const_value(text, part.location())
            }
        };
        acc = Some(match acc {
            Some(prev) => ctx.binop("+", prev, reg, node.location()),
            None => reg,
        });
    }
    match acc {
        Some(reg) => reg,
        None => expressions::const_literal(ctx, node),
    }
}

/// `new C(args)` -> `NEW_OBJECT C` + `CALL_METHOD obj constructor args`
pub(super) fn new_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let class_name = node
        .field("constructor")
        .map(|c| ctx.text(c))
        .unwrap_or_else(|| "Object".to_string());
    let object = ctx.new_object(&class_name, node.location());
    let args = ctx.call_args(node.field("arguments"));
    ctx.call_method(object, "constructor", args, node.location());
    object
}

fn array_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("array", &elements, node)
}

/// `{ k: v, short, [computed]: v, ...rest, m() {} }`
pub(super) fn object_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let object = ctx.new_object("object", node.location());
    for entry in ctx.significant_children(node) {
        match entry.kind() {
            "pair" => {
                let (Some(key), Some(value)) = (entry.field("key"), entry.field("value")) else {
                    ctx.malformed("object pair without key or value", entry);
                    continue;
                };
                let key_reg = object_key(ctx, key);
                let value_reg = ctx.lower_expr(value);
                store_entry(ctx, object, key_reg, value_reg, entry);
            }
            "shorthand_property_identifier" => {
                let key_reg = expressions::const_literal(ctx, entry);
                let value_reg = expressions::identifier(ctx, entry);
                store_entry(ctx, object, key_reg, value_reg, entry);
            }
            "method_definition" => {
                let Some(key) = entry.field("name") else {
                    continue;
                };
                let name = ctx.text(key);
                let params = entry.field("parameters");
                let body = entry.field("body");
                let func = ctx.emit_function(&name, entry, |ctx| {
                    ctx.lower_params(params);
                    ctx.lower_function_body(body);
                });
                let key_reg = ctx.const_value(name, key.location());
                store_entry(ctx, object, key_reg, func, entry);
            }
            "spread_element" => {
                let value = expressions::unwrap_first(ctx, entry);
                ctx.call_function("spread", vec![object, value], entry.location());
            }
            _ => {
                ctx.lower_expr(entry);
            }
        }
    }
    object
}

fn object_key(ctx: &mut LoweringContext<'_>, key: Node<'_>) -> Register {
    if key.kind() == "computed_property_name" {
        expressions::unwrap_first(ctx, key)
    } else {
        expressions::const_literal(ctx, key)
    }
}

fn store_entry(ctx: &mut LoweringContext<'_>, object: Register, key: Register, value: Register, node: Node<'_>) {
    ctx.emit_effect(
        Opcode::StoreIndex,
        vec![object.into(), key.into(), value.into()],
        node.location(),
    );
}

/// `left = right`, with object patterns on the left
pub(super) fn assignment_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (Some(left), Some(right)) = (node.field("left"), node.field("right")) else {
        return assignments::assignment_expr(ctx, node);
    };
    let value = ctx.lower_expr(right);
    bind_pattern(ctx, left, value, node);
    value
}

/// Named or anonymous `function` expression; the name is not bound outside
pub(super) fn function_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let params = node.field("parameters");
    let body = node.field("body");
    ctx.emit_function(&name, node, |ctx| {
        ctx.lower_params(params);
        ctx.lower_function_body(body);
    })
}

fn class_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let body = node.field("body");
    ctx.emit_class(&name, node, |ctx| ctx.lower_body(body))
}

fn await_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let inner = ctx.significant_children(node);
    ctx.lower_intrinsic("await", &inner, node)
}

fn yield_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let inner = ctx.significant_children(node);
    ctx.lower_intrinsic("yield", &inner, node)
}

/// `a, b, c`: every operand in order, the value is the last one
fn sequence_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let mut last = None;
    for part in ctx.significant_children(node) {
        last = Some(ctx.lower_expr(part));
    }
    match last {
        Some(reg) => reg,
        None => expressions::const_literal(ctx, node),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════════════════════════════════════

/// Store through identifiers, members, array patterns and object patterns
pub(super) fn bind_pattern(ctx: &mut LoweringContext<'_>, target: Node<'_>, value: Register, parent: Node<'_>) {
    match target.kind() {
        "object_pattern" => destructure_object(ctx, target, value, parent),
        "array_pattern" => {
            for (i, element) in ctx.significant_children(target).into_iter().enumerate() {
                let idx = ctx.const_value(i.to_string(), SourceLocation::UNKNOWN);
                let item = ctx.emit_value(
                    Opcode::LoadIndex,
                    vec![value.into(), idx.into()],
                    element.location(),
                );
                bind_pattern(ctx, element, item, parent);
            }
        }
        "assignment_pattern" | "object_assignment_pattern" => match target.field("left") {
            Some(left) => bind_pattern(ctx, left, value, parent),
            None => ctx.lower_store_target(target, value, parent),
        },
        "rest_pattern" => match target.named_kids().into_iter().next() {
            Some(inner) => bind_pattern(ctx, inner, value, parent),
            None => ctx.lower_store_target(target, value, parent),
        },
        _ => ctx.lower_store_target(target, value, parent),
    }
}

/// `{ a, b: local, c = 1 } = value` -> one `LOAD_FIELD` per property
fn destructure_object(ctx: &mut LoweringContext<'_>, pattern: Node<'_>, value: Register, parent: Node<'_>) {
    for entry in ctx.significant_children(pattern) {
        match entry.kind() {
            "shorthand_property_identifier_pattern" => {
                let name = ctx.text(entry);
                let field = load_field(ctx, value, &name, entry);
                ctx.store_var(name, field, parent.location());
            }
            "pair_pattern" => {
                let (Some(key), Some(local)) = (entry.field("key"), entry.field("value")) else {
                    continue;
                };
                let name = ctx.text(key);
                let field = load_field(ctx, value, &name, entry);
                bind_pattern(ctx, local, field, parent);
            }
            "object_assignment_pattern" => {
                let Some(left) = entry.field("left") else {
                    continue;
                };
                let name = ctx.text(left);
                let field = load_field(ctx, value, &name, entry);
                bind_pattern(ctx, left, field, parent);
            }
            _ => {}
        }
    }
}

fn load_field(ctx: &mut LoweringContext<'_>, object: Register, name: &str, node: Node<'_>) -> Register {
    ctx.emit_value(Opcode::LoadField, vec![object.into(), name.into()], node.location())
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// `let a = 1, {b} = o;`
pub(super) fn variable_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for declarator in node.named_kids() {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator.field("name") else {
            ctx.malformed("declarator without a name", declarator);
            continue;
        };
        let value = ctx.lower_opt_expr(declarator.field("value"));
        bind_pattern(ctx, name, value, declarator);
    }
}

/// `for (x of xs)` iterates values; `for (k in obj)` iterates `keys(obj)`
pub(super) fn for_in_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let (Some(target), Some(iterable)) = (node.field("left"), node.field("right")) else {
        ctx.malformed("for-in without target or iterable", node);
        return;
    };
    let body = node.field("body");
    let is_of = match node.field("operator") {
        Some(op) => ctx.text(op) == "of",
        None => node.has_child_kind("of"),
    };
    let mut iter_reg = ctx.lower_expr(iterable);
    if !is_of {
        iter_reg = ctx.call_function("keys", vec![iter_reg], node.location());
    }
    ctx.lower_index_loop(
        iter_reg,
        node,
        |ctx, elem, _| bind_pattern(ctx, target, elem, node),
        |ctx| ctx.lower_body(body),
    );
}

/// Class property `x = 1;` binds the name in the class body
pub(super) fn field_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node
        .field("property")
        .or_else(|| node.field("name"))
        .or_else(|| node.first_of_kind("property_identifier"))
    else {
        return;
    };
    let text = ctx.text(name);
    let value = ctx.lower_opt_expr(node.field("value"));
    ctx.store_var(text, value, node.location());
}

fn class_static_block(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    match node.field("body") {
        Some(body) => ctx.lower_body(Some(body)),
        None => ctx.lower_named_children_as_stmts(node, &[]),
    }
}

/// `try {} catch (e) {} finally {}`
pub(super) fn try_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut parts = TryParts {
        body: node.field("body"),
        ..TryParts::default()
    };
    if let Some(handler) = node.field("handler") {
        parts.catches.push(CatchClause {
            variable: handler.field("parameter"),
            exception_type: None,
            body: handler.field("body"),
        });
    }
    parts.finally_body = node.field("finalizer").and_then(|f| f.field("body"));
    ctx.lower_try(&parts, node);
}

/// `switch (v) { case a: ... default: ... }`; arms without `break` fall through
pub(super) fn switch_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let subject = ctx.lower_opt_expr(node.field("value"));
    let cases = node
        .field("body")
        .map(|b| b.named_kids())
        .unwrap_or_default();
    let mut arms = Vec::with_capacity(cases.len());
    for case in cases {
        match case.kind() {
            "switch_case" => {
                let value = case.field("value");
                let body: Vec<Node<'_>> = case
                    .named_kids()
                    .into_iter()
                    .filter(|c| Some(c.id()) != value.map(|v| v.id()))
                    .collect();
                arms.push((value.into_iter().collect(), body));
            }
            "switch_default" => arms.push((Vec::new(), case.named_kids())),
            _ => {}
        }
    }
    ctx.lower_case_chain(subject, &arms, CaseStyle::FallthroughSwitch, node);
}

/// `name: stmt` -> a fresh label in front of the statement
fn labeled_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("label")
        .map(|l| ctx.text(l))
        .unwrap_or_else(|| "label".to_string());
    let label = ctx.fresh_label(&name);
    ctx.emit_label(&label);
    ctx.lower_body(node.field("body"));
}

/// `export <declaration>` lowers the declaration; export lists are names only
pub(super) fn export_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    ctx.lower_named_children_as_stmts(node, &["export_clause", "string"]);
}

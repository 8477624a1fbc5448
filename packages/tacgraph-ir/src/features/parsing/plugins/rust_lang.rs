//! Rust profile
//!
//! Rust is expression-oriented: blocks, `if` and `match` all produce values.
//! A block's value is its trailing expression; function and closure bodies
//! return it explicitly. `if` and `match` in value position go through a
//! result slot, in statement position through the plain branch skeletons.

use crate::features::lowering::domain::SyntaxNode;
use crate::features::lowering::infrastructure::{
    assignments, control_flow, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

/// Block children that never carry the block's value
const NON_VALUE_KINDS: &[&str] = &[
    "let_declaration",
    "function_item",
    "function_signature_item",
    "struct_item",
    "enum_item",
    "impl_item",
    "trait_item",
    "const_item",
    "static_item",
    "type_item",
    "mod_item",
    "for_expression",
    "while_expression",
    "loop_expression",
];

/// Token kinds of a macro's argument tree that read as plain operands
const MACRO_OPERAND_KINDS: &[&str] = &[
    "identifier",
    "integer_literal",
    "float_literal",
    "string_literal",
    "raw_string_literal",
    "char_literal",
    "boolean_literal",
];

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Rust)
        .literals(Literals::new("true", "false", "()", "()"))
        .fields(FieldNames {
            attr_object: "value",
            attr_member: "field",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["line_comment", "block_comment"],
            noise: vec![
                "\n",
                ";",
                "attribute_item",
                "inner_attribute_item",
                "use_declaration",
                "extern_crate_declaration",
                "macro_definition",
                "mutable_specifier",
                "visibility_modifier",
                "empty_statement",
            ],
            blocks: vec!["block", "source_file", "declaration_list"],
            identifiers: vec!["identifier", "self", "scoped_identifier", "generic_function", "crate", "super"],
            members: vec!["field_expression"],
            subscripts: vec!["index_expression"],
            patterns: vec!["tuple_pattern"],
            argument_wrappers: vec![],
        })
        // Expressions
        .exprs(
            &["identifier", "self", "scoped_identifier", "generic_function", "crate", "super", "metavariable"],
            expressions::identifier,
        )
        .exprs(
            &[
                "integer_literal",
                "float_literal",
                "string_literal",
                "raw_string_literal",
                "char_literal",
                "negative_literal",
            ],
            expressions::const_literal,
        )
        .expr("boolean_literal", expressions::canonical_bool)
        .expr("unit_expression", expressions::canonical_none)
        .expr("binary_expression", expressions::binop)
        .expr("unary_expression", unary_expression)
        .expr("reference_expression", reference_expression)
        .expr("parenthesized_expression", expressions::paren)
        .expr("call_expression", expressions::call)
        .expr("field_expression", expressions::member_load)
        .expr("index_expression", expressions::subscript_load)
        .expr("assignment_expression", assignments::assignment_expr)
        .expr("compound_assignment_expr", assignments::augmented_assignment_expr)
        .expr("type_cast_expression", type_cast_expression)
        .expr("try_expression", try_expression)
        .expr("await_expression", await_expression)
        .expr("range_expression", range_expression)
        .expr("array_expression", array_expression)
        .expr("tuple_expression", tuple_expression)
        .expr("struct_expression", struct_expression)
        .expr("macro_invocation", macro_invocation)
        .expr("closure_expression", closure_expression)
        .expr("block", block_expression)
        .exprs(&["unsafe_block", "async_block", "const_block"], wrapped_block)
        .expr("if_expression", if_expression)
        .expr("match_expression", match_expression)
        .expr("let_condition", let_condition)
        .expr("let_chain", let_chain)
        .exprs(
            &["return_expression", "break_expression", "continue_expression", "loop_expression"],
            jump_expression,
        )
        .expr("yield_expression", yield_expression)
        // Statements
        .stmt("expression_statement", control_flow::statement_list)
        .stmt("let_declaration", let_declaration)
        .stmt("if_expression", control_flow::if_statement)
        .stmt("while_expression", control_flow::while_statement)
        .stmt("for_expression", control_flow::for_in_statement)
        .stmt("loop_expression", loop_expression)
        .stmt("return_expression", control_flow::return_statement)
        .stmt("break_expression", control_flow::break_statement)
        .stmt("continue_expression", control_flow::continue_statement)
        .stmt("function_item", function_item)
        .stmt("function_signature_item", control_flow::ignore)
        .stmt("struct_item", struct_item)
        .stmt("enum_item", enum_item)
        .stmt("impl_item", impl_item)
        .stmt("trait_item", trait_item)
        .stmts(&["const_item", "static_item"], const_item)
        .stmt("type_item", type_item)
        .stmt("mod_item", mod_item)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Blocks as values
// ═══════════════════════════════════════════════════════════════════════════

/// Lower a block's statements; the value is its trailing expression, if any
fn block_value(ctx: &mut LoweringContext<'_>, block: Node<'_>) -> Option<Register> {
    let kids = ctx.significant_children(block);
    let (last, init) = kids.split_last()?;
    for stmt in init {
        ctx.lower_stmt(*stmt);
    }
    match tail_expression(ctx, *last) {
        Some(expr) => Some(ctx.lower_expr(expr)),
        None => {
            ctx.lower_stmt(*last);
            None
        }
    }
}

/// The expression a block evaluates to when `node` is its last child
///
/// Block-like expressions (`if`, `match`) without a trailing `;` still parse
/// inside an `expression_statement`.
fn tail_expression<'t>(ctx: &LoweringContext<'_>, node: Node<'t>) -> Option<Node<'t>> {
    if NON_VALUE_KINDS.contains(&node.kind()) {
        return None;
    }
    if node.kind() != "expression_statement" {
        return Some(node);
    }
    if ctx.text(node).trim_end().ends_with(';') {
        return None;
    }
    ctx.significant_children(node)
        .into_iter()
        .next()
        .filter(|inner| !NON_VALUE_KINDS.contains(&inner.kind()))
}

/// Value of an arm or branch: blocks by their tail, anything else directly
fn value_of(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    if node.kind() == "block" {
        return block_expression(ctx, node);
    }
    ctx.lower_expr(node)
}

fn block_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match block_value(ctx, node) {
        Some(reg) => reg,
        None => ctx.const_none(),
    }
}

/// `unsafe { .. }` / `async { .. }` / `const { .. }`
fn wrapped_block(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.first_of_kind("block") {
        Some(block) => block_expression(ctx, block),
        None => ctx.const_none(),
    }
}

/// Function and closure bodies: an explicit RETURN of the tail value
fn lower_tail_return(ctx: &mut LoweringContext<'_>, body: Option<Node<'_>>) {
    let Some(body) = body else {
        return;
    };
    let value = if body.kind() == "block" {
        block_value(ctx, body)
    } else {
        Some(ctx.lower_expr(body))
    };
    if let Some(reg) = value {
        ctx.emit_effect(Opcode::Return, vec![reg.into()], body.location());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Control flow in value position
// ═══════════════════════════════════════════════════════════════════════════

fn if_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (Some(cond), Some(then)) = (node.field("condition"), node.field("consequence")) else {
        ctx.malformed("if expression without condition or consequence", node);
        return ctx.const_none();
    };
    let otherwise = node
        .field("alternative")
        .and_then(|alt| ctx.significant_children(alt).into_iter().next());
    ctx.lower_if_value(cond, then, otherwise, node, value_of)
}

/// `match v { pat => value, .. }`; a bare `_` arm is the wildcard
fn match_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let subject = ctx.lower_opt_expr(node.field("value"));
    let arms: Vec<(Vec<Node<'_>>, Node<'_>)> = node
        .field("body")
        .map(|body| body.named_kids())
        .unwrap_or_default()
        .into_iter()
        .filter(|arm| arm.kind() == "match_arm")
        .filter_map(|arm| {
            let pattern = arm.field("pattern")?;
            let value = arm.field("value")?;
            let wildcard = pattern.field("condition").is_none() && ctx.text(pattern).trim() == "_";
            let values = if wildcard { Vec::new() } else { vec![pattern] };
            Some((values, value))
        })
        .collect();
    ctx.lower_match_value_with(
        subject,
        &arms,
        node,
        |ctx, subject, patterns| {
            let tests: Vec<Register> = patterns.iter().map(|p| match_arm_test(ctx, subject, *p)).collect();
            fold_or(ctx, tests, node)
        },
        value_of,
    )
}

/// `return` / `break` / `continue` / `loop` used as a value: the jump, then ()
fn jump_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.kind() {
        "return_expression" => control_flow::return_statement(ctx, node),
        "break_expression" => control_flow::break_statement(ctx, node),
        "continue_expression" => control_flow::continue_statement(ctx, node),
        _ => loop_expression(ctx, node),
    }
    ctx.const_none()
}

/// `loop { .. }`: a while-skeleton over the true literal
fn loop_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.field("body");
    ctx.lower_while_with(
        node,
        false,
        |ctx| {
            let lit = ctx.literals().true_lit;
            ctx.const_value(lit, SourceLocation::UNKNOWN)
        },
        |ctx| ctx.lower_body(body),
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════════════════════════════════════

/// One `match_pattern`: its `|` alternatives OR-ed, then AND-ed with the guard
fn match_arm_test(ctx: &mut LoweringContext<'_>, subject: Register, pattern: Node<'_>) -> Register {
    let guard = pattern.field("condition");
    let guard_id = guard.map(|g| g.id());
    let mut alternatives = Vec::new();
    for child in ctx.significant_children(pattern) {
        if Some(child.id()) != guard_id {
            collect_alternatives(child, &mut alternatives);
        }
    }
    let tests: Vec<Register> = alternatives
        .into_iter()
        .map(|alt| pattern_test(ctx, subject, alt))
        .collect();
    let matched = fold_or(ctx, tests, pattern);
    match guard {
        Some(guard) => {
            let guard_reg = ctx.lower_expr(guard);
            ctx.binop("&&", matched, guard_reg, pattern.location())
        }
        None => matched,
    }
}

fn collect_alternatives<'t>(node: Node<'t>, out: &mut Vec<Node<'t>>) {
    if node.kind() == "or_pattern" {
        for child in node.named_kids() {
            collect_alternatives(child, out);
        }
    } else {
        out.push(node);
    }
}

fn fold_or(ctx: &mut LoweringContext<'_>, tests: Vec<Register>, node: Node<'_>) -> Register {
    let mut tests = tests.into_iter();
    let Some(first) = tests.next() else {
        let lit = ctx.literals().true_lit;
        return ctx.const_value(lit, SourceLocation::UNKNOWN);
    };
    tests.fold(first, |acc, test| ctx.binop("||", acc, test, node.location()))
}

/// Test `subject` against one pattern, binding the names it introduces
fn pattern_test(ctx: &mut LoweringContext<'_>, subject: Register, pattern: Node<'_>) -> Register {
    let loc = pattern.location();
    match pattern.kind() {
        "_" => true_value(ctx),
        "identifier" if is_binding_name(&ctx.text(pattern)) => {
            let name = ctx.text(pattern);
            ctx.store_var(&name, subject, loc);
            true_value(ctx)
        }
        "ref_pattern" | "mut_pattern" => match pattern.named_kids().into_iter().last() {
            Some(inner) => pattern_test(ctx, subject, inner),
            None => true_value(ctx),
        },
        "tuple_struct_pattern" | "struct_pattern" => {
            let type_name = pattern
                .field("type")
                .map(|t| ctx.text(t))
                .unwrap_or_else(|| ctx.text(pattern));
            let tag = ctx.const_value(type_name, SourceLocation::UNKNOWN);
            let matched = ctx.call_function("is_variant", vec![subject, tag], loc);
            bind_pattern(ctx, subject, pattern);
            matched
        }
        "range_pattern" => {
            let mut operands = vec![subject];
            for bound in pattern.named_kids() {
                operands.push(ctx.lower_expr(bound));
            }
            ctx.call_function("in_range", operands, loc)
        }
        "captured_pattern" => {
            let kids = pattern.named_kids();
            if let Some(name) = kids.first() {
                let name = ctx.text(*name);
                ctx.store_var(&name, subject, loc);
            }
            match kids.get(1) {
                Some(inner) => pattern_test(ctx, subject, *inner),
                None => true_value(ctx),
            }
        }
        "identifier" | "scoped_identifier" | "integer_literal" | "float_literal" | "string_literal"
        | "raw_string_literal" | "char_literal" | "negative_literal" | "boolean_literal" => {
            let value = ctx.lower_expr(pattern);
            ctx.binop("==", subject, value, loc)
        }
        _ => {
            let text = ctx.text(pattern);
            let shape = ctx.const_value(text, SourceLocation::UNKNOWN);
            bind_pattern(ctx, subject, pattern);
            ctx.call_function("matches", vec![subject, shape], loc)
        }
    }
}

/// Destructure `subject` into the names a pattern binds
///
/// Positional sub-patterns read LOAD_INDEX, struct fields LOAD_FIELD.
fn bind_pattern(ctx: &mut LoweringContext<'_>, subject: Register, pattern: Node<'_>) {
    let loc = pattern.location();
    match pattern.kind() {
        "identifier" if is_binding_name(&ctx.text(pattern)) => {
            let name = ctx.text(pattern);
            ctx.store_var(&name, subject, loc);
        }
        "ref_pattern" | "mut_pattern" => {
            if let Some(inner) = pattern.named_kids().into_iter().last() {
                bind_pattern(ctx, subject, inner);
            }
        }
        "tuple_struct_pattern" | "tuple_pattern" | "slice_pattern" => {
            let type_id = pattern.field("type").map(|t| t.id());
            let parts: Vec<Node<'_>> = pattern
                .named_kids()
                .into_iter()
                .filter(|c| Some(c.id()) != type_id)
                .collect();
            for (i, part) in parts.into_iter().enumerate() {
                if !binds_anything(part) {
                    continue;
                }
                let idx = ctx.const_value(i.to_string(), SourceLocation::UNKNOWN);
                let elem = ctx.emit_value(Opcode::LoadIndex, vec![subject.into(), idx.into()], loc);
                bind_pattern(ctx, elem, part);
            }
        }
        "struct_pattern" => {
            for field in pattern.named_kids() {
                if field.kind() != "field_pattern" {
                    continue;
                }
                let Some(name) = field.field("name").or_else(|| field.named_kids().into_iter().next()) else {
                    continue;
                };
                let field_name = ctx.text(name);
                let value = ctx.emit_value(
                    Opcode::LoadField,
                    vec![subject.into(), field_name.clone().into()],
                    loc,
                );
                match field.field("pattern") {
                    Some(inner) => bind_pattern(ctx, value, inner),
                    None => ctx.store_var(&field_name, value, loc),
                }
            }
        }
        _ => {}
    }
}

fn binds_anything(pattern: Node<'_>) -> bool {
    match pattern.kind() {
        "identifier" => true,
        "_" | "integer_literal" | "string_literal" | "char_literal" | "scoped_identifier" => false,
        _ => pattern.named_child_count() > 0,
    }
}

/// Lowercase identifiers in pattern position bind; `None`, `MAX` compare
fn is_binding_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_lowercase() || c == '_') && name != "_"
}

fn true_value(ctx: &mut LoweringContext<'_>) -> Register {
    let lit = ctx.literals().true_lit;
    ctx.const_value(lit, SourceLocation::UNKNOWN)
}

/// `let Some(x) = opt` inside `if let` / `while let`
fn let_condition(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let subject = ctx.lower_opt_expr(node.field("value"));
    match node.field("pattern") {
        Some(pattern) => pattern_test(ctx, subject, pattern),
        None => true_value(ctx),
    }
}

/// `let Some(a) = x && a > 0`
fn let_chain(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let mut acc: Option<Register> = None;
    for part in ctx.significant_children(node) {
        let reg = ctx.lower_expr(part);
        acc = Some(match acc {
            Some(prev) => ctx.binop("&&", prev, reg, node.location()),
            None => reg,
        });
    }
    match acc {
        Some(reg) => reg,
        None => true_value(ctx),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Operators and constructors
// ═══════════════════════════════════════════════════════════════════════════

/// `*x` reads the pointee as field `*`; `-x` and `!x` are UNOPs
fn unary_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let op = node
        .kids()
        .into_iter()
        .find(|c| !c.is_named())
        .map(|c| ctx.text(c))
        .unwrap_or_default();
    if op != "*" {
        return expressions::unop(ctx, node);
    }
    let operand = node.named_kids().into_iter().next();
    let inner = ctx.lower_opt_expr(operand);
    ctx.emit_value(
        Opcode::LoadField,
        vec![inner.into(), assignments::DEREF_FIELD.into()],
        node.location(),
    )
}

/// `&x` / `&mut x`
fn reference_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operand = node
        .field("value")
        .or_else(|| ctx.significant_children(node).into_iter().last());
    let inner = ctx.lower_opt_expr(operand);
    ctx.emit_value(Opcode::Unop, vec!["&".into(), inner.into()], node.location())
}

/// `x as T`: the value only
fn type_cast_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_first(ctx, node),
    }
}

/// `expr?`
fn try_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operands = ctx.significant_children(node);
    ctx.lower_intrinsic("try_unwrap", &operands, node)
}

/// `expr.await`
fn await_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operands: Vec<Node<'_>> = ctx.significant_children(node).into_iter().take(1).collect();
    ctx.lower_intrinsic("await", &operands, node)
}

fn yield_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operands = ctx.significant_children(node);
    ctx.lower_intrinsic("yield", &operands, node)
}

/// `a..b` / `a..=b` / `..b`
fn range_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let bounds = ctx.significant_children(node);
    let name = if ctx.text(node).contains("..=") { "range_inclusive" } else { "range" };
    ctx.lower_intrinsic(name, &bounds, node)
}

/// `[a, b]`; `[v; n]` allocates `n` slots filled with `v`
fn array_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    if let Some(length) = node.field("length") {
        let value = ctx.lower_opt_expr(node.named_kids().into_iter().find(|c| c.id() != length.id()));
        let size = ctx.lower_expr(length);
        return ctx.call_function("repeat", vec![value, size], node.location());
    }
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("array", &elements, node)
}

fn tuple_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("tuple", &elements, node)
}

/// `P { x: 1, y }`: NEW_OBJECT of the type plus one STORE_FIELD per field
///
/// `..base` copies from the base through `copy_fields` before the explicit
/// fields land.
fn struct_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "struct".to_string());
    let object = ctx.new_object(&type_name, node.location());
    let Some(body) = node.field("body") else {
        return object;
    };
    for init in body.named_kids() {
        match init.kind() {
            "field_initializer" => {
                let (Some(field), Some(value)) = (init.field("field"), init.field("value")) else {
                    continue;
                };
                let name = ctx.text(field);
                let reg = ctx.lower_expr(value);
                ctx.store_field(object, &name, reg, init.location());
            }
            "shorthand_field_initializer" => {
                let name = ctx.text(init);
                let reg = ctx.load_var(name.clone(), init.location());
                ctx.store_field(object, &name, reg, init.location());
            }
            "base_field_initializer" => {
                if let Some(base) = init.named_kids().into_iter().next() {
                    let base_reg = ctx.lower_expr(base);
                    ctx.call_function("copy_fields", vec![object, base_reg], init.location());
                }
            }
            _ => {}
        }
    }
    object
}

/// `name!(..)` as a call of `name!`; `vec![..]` builds an array
///
/// Only the top-level identifier and literal tokens of the argument tree are
/// lowered as operands.
fn macro_invocation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let name = node
        .field("macro")
        .map(|m| ctx.text(m))
        .unwrap_or_else(|| "macro".to_string());
    let operands: Vec<Node<'_>> = node
        .first_of_kind("token_tree")
        .map(|tree| tree.named_kids())
        .unwrap_or_default()
        .into_iter()
        .filter(|t| MACRO_OPERAND_KINDS.contains(&t.kind()))
        .collect();
    if name == "vec" {
        return ctx.lower_array_of("vec", &operands, node);
    }
    ctx.lower_intrinsic(&format!("{}!", name), &operands, node)
}

/// `|a, b| body` / `move || { .. }`
fn closure_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let params = node.field("parameters");
    let body = node.field("body");
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        ctx.lower_params(params);
        lower_tail_return(ctx, body);
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements and items
// ═══════════════════════════════════════════════════════════════════════════

/// `let [mut] pat [: T] [= value];`
fn let_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(pattern) = node.field("pattern") else {
        ctx.malformed("let without pattern", node);
        return;
    };
    let value = node.field("value");
    match pattern.kind() {
        "struct_pattern" | "tuple_struct_pattern" | "ref_pattern" | "mut_pattern" | "slice_pattern" => {
            let reg = ctx.lower_opt_expr(value);
            bind_pattern(ctx, reg, pattern);
        }
        _ => ctx.lower_declaration(pattern, value, node),
    }
}

/// `fn name(params) -> T { body }`; the trailing expression is returned
fn function_item(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = match node.field("name") {
        Some(n) => ctx.text(n),
        None => ctx.anonymous_name(),
    };
    let params = node.field("parameters");
    let body = node.field("body");
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        ctx.lower_params(params);
        lower_tail_return(ctx, body);
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// `struct P { x: T }` as a class whose fields default to none
fn struct_item(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let body = node.field("body");
    ctx.emit_class(&name, node, |ctx| {
        let Some(body) = body else {
            return;
        };
        for field in body.named_kids() {
            if field.kind() != "field_declaration" {
                continue;
            }
            let Some(field_name) = field.field("name").map(|n| ctx.text(n)) else {
                continue;
            };
            let none = ctx.const_none();
            let this = ctx.load_var("self", SourceLocation::UNKNOWN);
            ctx.store_field(this, &field_name, none, field.location());
        }
    });
}

/// `enum E { A, B(T), C { .. } }`: variants map to their ordinals
fn enum_item(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let variants: Vec<String> = node
        .field("body")
        .map(|b| b.named_kids())
        .unwrap_or_default()
        .into_iter()
        .filter(|v| v.kind() == "enum_variant")
        .filter_map(|v| v.field("name").map(|n| ctx.text(n)))
        .collect();
    ctx.lower_ordinal_object("enum", &name, &variants, node);
}

/// `impl [Trait for] Type { .. }`: a class bracket named after the type
fn impl_item(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(ty) = node.field("type") else {
        ctx.malformed("impl without type", node);
        return;
    };
    let name = match ty.field("type") {
        Some(base) => ctx.text(base),
        None => ctx.text(ty),
    };
    let body = node.field("body");
    ctx.emit_class(&name, node, |ctx| ctx.lower_body(body));
}

fn trait_item(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = match node.field("name") {
        Some(n) => ctx.text(n),
        None => ctx.anonymous_name(),
    };
    let body = node.field("body");
    ctx.emit_class(&name, node, |ctx| ctx.lower_body(body));
}

/// `const N: T = v;` / `static S: T = v;`
fn const_item(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name") else {
        return;
    };
    ctx.lower_declaration(name, node.field("value"), node);
}

/// `type Alias = T;` binds the aliased type's text
fn type_item(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let (Some(name), Some(ty)) = (node.field("name"), node.field("type")) else {
        return;
    };
    let name = ctx.text(name);
    let text = ctx.text(ty);
    let reg = ctx.const_value(text, node.location());
    ctx.store_var(&name, reg, node.location());
}

/// Inline `mod m { .. }`; `mod m;` has nothing to lower
fn mod_item(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.field("body");
    ctx.lower_body(body);
}

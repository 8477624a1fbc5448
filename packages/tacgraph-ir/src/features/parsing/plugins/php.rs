//! PHP profile
//!
//! Variables keep their `$` sigil in every LOAD_VAR / STORE_VAR. Arrays are
//! NEW_ARRAY when every element is positional and NEW_OBJECT as soon as one
//! element carries a `=>` key.

use crate::features::lowering::domain::{CatchClause, SyntaxNode, TryParts};
use crate::features::lowering::infrastructure::control_flow::CaseStyle;
use crate::features::lowering::infrastructure::{
    assignments, control_flow, definitions, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::constants::CONSTRUCTOR_NAME;
use crate::shared::models::{Opcode, Register};
use once_cell::sync::Lazy;
use tree_sitter::Node;

const THIS: &str = "$this";
const STRING_PIECES: &[&str] = &["string_content", "string_value", "escape_sequence", "text"];

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Php)
        .literals(Literals::new("true", "false", "null", "null"))
        .fields(FieldNames {
            if_consequence: "body",
            attr_member: "name",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["comment"],
            noise: vec![
                "\n",
                ";",
                "php_tag",
                "php_end_tag",
                "text_interpolation",
                "text",
                "empty_statement",
                "visibility_modifier",
                "static_modifier",
                "abstract_modifier",
                "final_modifier",
                "readonly_modifier",
                "attribute_list",
                "declare_statement",
            ],
            blocks: vec![
                "program",
                "compound_statement",
                "declaration_list",
                "colon_block",
                "enum_declaration_list",
            ],
            identifiers: vec!["variable_name", "name", "qualified_name"],
            members: vec!["member_access_expression", "nullsafe_member_access_expression"],
            subscripts: vec!["subscript_expression"],
            patterns: vec!["list_literal"],
            argument_wrappers: vec!["argument"],
        })
        // Expressions
        .exprs(&["variable_name", "name", "qualified_name", "dynamic_variable_name"], expressions::identifier)
        .exprs(&["integer", "float", "string", "heredoc", "nowdoc"], expressions::const_literal)
        .expr("encapsed_string", encapsed_string)
        .expr("boolean", expressions::canonical_bool)
        .expr("null", expressions::canonical_none)
        .expr("binary_expression", expressions::binop)
        .expr("unary_op_expression", expressions::unop)
        .expr("update_expression", expressions::update_expr)
        .expr("parenthesized_expression", expressions::paren)
        .expr("error_suppression_expression", expressions::unwrap_first)
        .expr("function_call_expression", expressions::call)
        .exprs(&["member_call_expression", "nullsafe_member_call_expression"], member_call)
        .exprs(
            &["member_access_expression", "nullsafe_member_access_expression"],
            expressions::member_load,
        )
        .expr("subscript_expression", expressions::subscript_load)
        .expr("scoped_call_expression", scoped_call)
        .exprs(
            &["class_constant_access_expression", "scoped_property_access_expression"],
            scoped_access,
        )
        .expr("object_creation_expression", object_creation)
        .expr("array_creation_expression", array_creation)
        .exprs(&["assignment_expression", "reference_assignment_expression"], assignments::assignment_expr)
        .expr("augmented_assignment_expression", assignments::augmented_assignment_expr)
        .expr("conditional_expression", conditional_expression)
        .expr("cast_expression", cast_expression)
        .expr("match_expression", match_expression)
        .exprs(
            &["arrow_function", "anonymous_function", "anonymous_function_creation_expression"],
            definitions::anonymous_function,
        )
        .expr("throw_expression", throw_expression)
        .expr("sequence_expression", sequence_expression)
        .exprs(
            &[
                "yield_expression",
                "print_intrinsic",
                "clone_expression",
                "include_expression",
                "include_once_expression",
                "require_expression",
                "require_once_expression",
            ],
            keyword_call,
        )
        // Statements
        .stmts(&["expression_statement", "compound_statement", "colon_block"], control_flow::statement_list)
        .stmt("echo_statement", echo_statement)
        .stmt("return_statement", control_flow::return_statement)
        .stmt("if_statement", control_flow::if_statement)
        .stmt("while_statement", control_flow::while_statement)
        .stmt("do_statement", control_flow::do_while_statement)
        .stmt("for_statement", for_statement)
        .stmt("foreach_statement", foreach_statement)
        .stmt("switch_statement", switch_statement)
        .stmt("function_definition", definitions::function_def)
        .stmt("method_declaration", method_declaration)
        .stmts(
            &["class_declaration", "interface_declaration", "trait_declaration", "enum_declaration"],
            definitions::class_def,
        )
        .stmt("property_declaration", property_declaration)
        .stmt("const_declaration", const_declaration)
        .stmt("enum_case", enum_case)
        .stmt("use_declaration", use_declaration)
        .stmt("namespace_definition", namespace_definition)
        .stmts(&["namespace_use_declaration", "global_declaration"], control_flow::ignore)
        .stmt("function_static_declaration", static_declaration)
        .stmt("unset_statement", unset_statement)
        .stmt("exit_statement", exit_statement)
        .stmt("try_statement", try_statement)
        .stmt("break_statement", control_flow::break_statement)
        .stmt("continue_statement", control_flow::continue_statement)
        .stmt("named_label_statement", named_label)
        .stmt("goto_statement", goto_statement)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `"x = $x"`: literal pieces and embedded expressions joined with `+`
fn encapsed_string(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let pieces = ctx.significant_children(node);
    if pieces.iter().all(|p| STRING_PIECES.contains(&p.kind())) {
        return expressions::const_literal(ctx, node);
    }
    let parts: Vec<Register> = pieces
        .into_iter()
        .map(|piece| {
            if STRING_PIECES.contains(&piece.kind()) {
                expressions::const_literal(ctx, piece)
            } else {
                ctx.lower_expr(piece)
            }
        })
        .collect();
    ctx.lower_concat(parts, node)
}

/// `$obj->name(args)` / `$obj?->name(args)`
fn member_call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let receiver = ctx.lower_opt_expr(node.field("object"));
    let method = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "unknown".to_string());
    let args = ctx.call_args(node.field("arguments"));
    ctx.call_method(receiver, &method, args, node.location())
}

/// `Foo::bar(args)` -> CALL_METHOD on the class
fn scoped_call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let scope = ctx.lower_opt_expr(node.field("scope"));
    let method = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "unknown".to_string());
    let args = ctx.call_args(node.field("arguments"));
    ctx.call_method(scope, &method, args, node.location())
}

/// `Foo::BAR` / `Foo::$bar` -> LOAD_FIELD on the class
fn scoped_access(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let parts = ctx.significant_children(node);
    let scope = node.field("scope").or_else(|| parts.first().copied());
    let name = node.field("name").or_else(|| parts.get(1).copied());
    let (Some(scope), Some(name)) = (scope, name) else {
        ctx.malformed("scoped access without scope and name", node);
        return expressions::const_literal(ctx, node);
    };
    let scope_reg = ctx.lower_expr(scope);
    let member = ctx.text(name);
    ctx.emit_value(Opcode::LoadField, vec![scope_reg.into(), member.into()], node.location())
}

/// `new Foo(args)` -> a call to the class by name
fn object_creation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .named_kids()
        .into_iter()
        .find(|c| matches!(c.kind(), "name" | "qualified_name"))
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "Object".to_string());
    let args = ctx.call_args(node.first_of_kind("arguments"));
    ctx.call_function(&type_name, args, node.location())
}

/// `[1, 2]` / `array('k' => 'v', 3)`
fn array_creation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements: Vec<Node<'_>> = node
        .named_kids()
        .into_iter()
        .filter(|c| c.kind() == "array_element_initializer")
        .collect();
    let associative = elements.iter().any(|e| e.has_child_kind("=>"));
    if !associative {
        let values: Vec<Node<'_>> = elements
            .iter()
            .filter_map(|e| ctx.significant_children(*e).into_iter().last())
            .collect();
        return ctx.lower_array_of("array", &values, node);
    }
    let object = ctx.new_object("array", node.location());
    for (i, element) in elements.into_iter().enumerate() {
        let parts = ctx.significant_children(element);
        match parts.as_slice() {
            [key, value] => {
                let key_reg = ctx.lower_expr(*key);
                let value_reg = ctx.lower_expr(*value);
                ctx.emit_effect(
                    Opcode::StoreIndex,
                    vec![object.into(), key_reg.into(), value_reg.into()],
                    element.location(),
                );
            }
            [value] => {
                let value_reg = ctx.lower_expr(*value);
                ctx.store_at(object, i, value_reg);
            }
            _ => ctx.malformed("array element with unexpected shape", element),
        }
    }
    object
}

/// `c ? a : b`; the short `c ?: b` reuses the condition as its value
fn conditional_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (Some(cond), Some(otherwise)) = (node.field("condition"), node.field("alternative")) else {
        return expressions::ternary(ctx, node);
    };
    let then = node.field("body").unwrap_or(cond);
    ctx.lower_ternary_parts(cond, then, otherwise, node)
}

/// `(int) $x`: the value only
fn cast_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_last(ctx, node),
    }
}

/// `match ($x) { 1, 2 => 'a', default => 'b' }` with strict `===` tests
fn match_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let subject = ctx.lower_opt_expr(node.field("condition"));
    let mut arms = Vec::new();
    for arm in node.field("body").map(|b| b.named_kids()).unwrap_or_default() {
        let Some(result) = arm.field("return_expression") else {
            continue;
        };
        match arm.kind() {
            "match_conditional_expression" => {
                let values = arm
                    .field("conditional_expressions")
                    .map(|c| ctx.significant_children(c))
                    .unwrap_or_default();
                arms.push((values, result));
            }
            "match_default_expression" => arms.push((Vec::new(), result)),
            _ => {}
        }
    }
    ctx.lower_match_value_with(
        subject,
        &arms,
        node,
        |ctx, subject, values| {
            let mut acc: Option<Register> = None;
            for value in values {
                let v = ctx.lower_expr(*value);
                let eq = ctx.binop("===", subject, v, value.location());
                acc = Some(match acc {
                    Some(prev) => ctx.binop("||", prev, eq, node.location()),
                    None => eq,
                });
            }
            acc.unwrap_or(subject)
        },
        |ctx, value| ctx.lower_expr(value),
    )
}

/// `throw` in expression position; its value is the none literal
fn throw_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    control_flow::throw_statement(ctx, node);
    ctx.const_none()
}

/// `a, b`: every part in order, the value is the last one
fn sequence_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let mut last = None;
    for part in ctx.significant_children(node) {
        last = Some(ctx.lower_expr(part));
    }
    match last {
        Some(reg) => reg,
        None => ctx.const_none(),
    }
}

/// `yield $v`, `print $v`, `clone $o`, `require 'f.php'` as calls named after the keyword
fn keyword_call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let name = node
        .kids()
        .into_iter()
        .find(|c| !c.is_named())
        .map(|c| ctx.text(c).to_lowercase())
        .unwrap_or_else(|| node.kind().trim_end_matches("_expression").to_string());
    let operands = ctx.significant_children(node);
    ctx.lower_intrinsic(&name, &operands, node)
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// `echo a, b;` -> `CALL_FUNCTION echo a b`
fn echo_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let operands: Vec<Node<'_>> = ctx
        .significant_children(node)
        .into_iter()
        .flat_map(|c| {
            if c.kind() == "sequence_expression" {
                c.named_kids()
            } else {
                vec![c]
            }
        })
        .collect();
    ctx.lower_intrinsic("echo", &operands, node);
}

/// `exit;` / `exit(1);`
fn exit_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let operands = ctx.significant_children(node);
    ctx.lower_intrinsic("exit", &operands, node);
}

/// `for (init; cond; update)`: clauses are split on the `;` tokens between
/// the parentheses, each clause may hold a comma sequence
fn for_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut clauses: [Vec<Node<'_>>; 3] = Default::default();
    let mut slot = 0;
    let mut inside = false;
    let mut body = node.field("body");
    for child in node.kids() {
        match child.kind() {
            "(" if !inside => inside = true,
            ")" if inside => inside = false,
            ";" if inside => slot = (slot + 1).min(2),
            _ if inside && child.is_named() && !ctx.profile().is_skipped(child.kind()) => {
                clauses[slot].push(child)
            }
            _ if !inside && child.is_named() && body.is_none() && slot == 2 => body = Some(child),
            _ => {}
        }
    }
    let [init, cond, update] = clauses;

    for part in init.iter().flat_map(|c| sequence_parts(*c)) {
        ctx.lower_expr(part);
    }
    let cond_label = ctx.fresh_label("for_cond");
    let body_label = ctx.fresh_label("for_body");
    let update_label = ctx.fresh_label("for_update");
    let end_label = ctx.fresh_label("for_end");

    ctx.emit_label(&cond_label);
    let conds: Vec<Node<'_>> = cond.iter().flat_map(|c| sequence_parts(*c)).collect();
    let mut cond_reg = None;
    for part in conds {
        cond_reg = Some(ctx.lower_expr(part));
    }
    match cond_reg {
        Some(reg) => ctx.emit_branch_if(reg, &body_label, &end_label, node.location()),
        None => ctx.emit_branch(&body_label),
    }

    ctx.emit_label(&body_label);
    ctx.push_loop(&update_label, &end_label);
    ctx.lower_body(body);
    ctx.pop_loop();

    ctx.emit_label(&update_label);
    for part in update.iter().flat_map(|c| sequence_parts(*c)) {
        ctx.lower_expr(part);
    }
    ctx.emit_branch(&cond_label);
    ctx.emit_label(&end_label);
}

fn sequence_parts(node: Node<'_>) -> Vec<Node<'_>> {
    if node.kind() == "sequence_expression" {
        node.named_kids()
            .into_iter()
            .flat_map(sequence_parts)
            .collect()
    } else {
        vec![node]
    }
}

/// `foreach ($xs as $v)` / `foreach ($xs as $k => $v)`
fn foreach_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.field("body");
    let parts: Vec<Node<'_>> = ctx
        .significant_children(node)
        .into_iter()
        .filter(|c| Some(c.id()) != body.map(|b| b.id()))
        .collect();
    let (Some(iterable), Some(binding)) = (parts.first().copied(), parts.get(1).copied()) else {
        ctx.malformed("foreach without iterable or binding", node);
        return;
    };
    let (key, value) = if binding.kind() == "pair" {
        let kv = ctx.significant_children(binding);
        (kv.first().copied(), kv.get(1).copied())
    } else {
        (None, Some(binding))
    };
    let value = value.map(unwrap_by_ref);
    let iter_reg = ctx.lower_expr(iterable);
    ctx.lower_index_loop(
        iter_reg,
        node,
        |ctx, elem, idx| {
            if let Some(key) = key {
                ctx.lower_store_target(key, idx, node);
            }
            if let Some(value) = value {
                ctx.lower_store_target(value, elem, node);
            }
        },
        |ctx| ctx.lower_body(body),
    );
}

/// `&$v` binds like `$v`
fn unwrap_by_ref(node: Node<'_>) -> Node<'_> {
    if node.kind() == "by_ref" {
        node.named_kids().into_iter().next().unwrap_or(node)
    } else {
        node
    }
}

/// C-like `switch`: arms without `break` fall into the next one
fn switch_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let subject = ctx.lower_opt_expr(node.field("condition"));
    let mut arms = Vec::new();
    for case in node.field("body").map(|b| b.named_kids()).unwrap_or_default() {
        match case.kind() {
            "case_statement" => {
                let value = case.field("value");
                let body = ctx
                    .significant_children(case)
                    .into_iter()
                    .filter(|c| Some(c.id()) != value.map(|v| v.id()))
                    .collect();
                arms.push((value.into_iter().collect(), body));
            }
            "default_statement" => arms.push((Vec::new(), ctx.significant_children(case))),
            _ => {}
        }
    }
    ctx.lower_case_chain(subject, &arms, CaseStyle::FallthroughSwitch, node);
}

/// Methods; `__construct` is bound under the shared constructor name
fn method_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let name = if name.eq_ignore_ascii_case("__construct") {
        CONSTRUCTOR_NAME.to_string()
    } else {
        name
    };
    ctx.lower_function_parts(&name, node.field("parameters"), node.field("body"), node);
}

/// `public $x = 1;` -> `STORE_FIELD $this $x 1`; no default stores null
fn property_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for element in node.named_kids() {
        if element.kind() != "property_element" {
            continue;
        }
        let Some(name) = element
            .field("name")
            .or_else(|| element.first_of_kind("variable_name"))
        else {
            continue;
        };
        let default = element.field("default_value").or_else(|| {
            element
                .first_of_kind("property_initializer")
                .and_then(|init| init.named_kids().into_iter().next())
        });
        let value = ctx.lower_opt_expr(default);
        let this = ctx.load_var(THIS, element.location());
        let field = ctx.text(name);
        ctx.store_field(this, &field, value, element.location());
    }
}

/// `const A = 1, B = 2;`
fn const_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for element in node.named_kids() {
        if element.kind() != "const_element" {
            continue;
        }
        let parts = ctx.significant_children(element);
        let Some(name) = parts.first().copied() else {
            continue;
        };
        ctx.lower_declaration(name, parts.get(1).copied(), element);
    }
}

/// `case Hearts = 'H';` inside an enum: a field of the enum, defaulting to its name
fn enum_case(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let value = match node.field("value") {
        Some(v) => ctx.lower_expr(v),
        None => ctx.const_value(name.clone(), node.location()),
    };
    let owner = ctx.load_var("self", node.location());
    ctx.store_field(owner, &name, value, node.location());
}

/// `use SomeTrait;` inside a class
fn use_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for name in ctx.significant_children(node) {
        let text = ctx.text(name);
        ctx.symbolic(format!("use_trait:{}", text), node.location());
    }
}

fn namespace_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.field("body").or_else(|| node.first_of_kind("compound_statement"));
    ctx.lower_body(body);
}

/// `static $n = 0;`
fn static_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for decl in node.named_kids() {
        if decl.kind() != "static_variable_declaration" {
            continue;
        }
        if let Some(name) = decl.field("name") {
            ctx.lower_declaration(name, decl.field("value"), decl);
        }
    }
}

fn unset_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let operands = ctx.significant_children(node);
    ctx.lower_intrinsic("unset", &operands, node);
}

/// `try { } catch (A | B $e) { } finally { }`
fn try_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut parts = TryParts {
        body: node.field("body"),
        ..TryParts::default()
    };
    for clause in node.named_kids() {
        match clause.kind() {
            "catch_clause" => {
                let exception_type = clause.field("type").or_else(|| {
                    clause
                        .named_kids()
                        .into_iter()
                        .find(|c| matches!(c.kind(), "type_list" | "named_type" | "name" | "qualified_name"))
                });
                parts.catches.push(CatchClause {
                    variable: clause.field("name").or_else(|| clause.first_of_kind("variable_name")),
                    exception_type,
                    body: clause.field("body").or_else(|| clause.first_of_kind("compound_statement")),
                });
            }
            "finally_clause" => {
                parts.finally_body = clause
                    .field("body")
                    .or_else(|| clause.first_of_kind("compound_statement"));
            }
            _ => {}
        }
    }
    ctx.lower_try(&parts, node);
}

/// `name:`
fn named_label(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.first_of_kind("name").map(|n| ctx.text(n)) else {
        ctx.malformed("label without name", node);
        return;
    };
    let label = ctx.user_label(&name);
    ctx.emit_label(&label);
}

fn goto_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.first_of_kind("name").map(|n| ctx.text(n)) else {
        ctx.malformed("goto without label", node);
        return;
    };
    let label = ctx.user_label(&name);
    ctx.emit_branch(&label);
}

//! C# profile

use crate::features::lowering::domain::{CatchClause, SyntaxNode, TryParts};
use crate::features::lowering::infrastructure::control_flow::CaseStyle;
use crate::features::lowering::infrastructure::{
    assignments, control_flow, definitions, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::constants::CONSTRUCTOR_NAME;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

const LABEL_KINDS: &[&str] = &[
    "case_switch_label",
    "case_pattern_switch_label",
    "default_switch_label",
];

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::CSharp)
        .literals(Literals::new("true", "false", "null", "null"))
        .fields(FieldNames {
            attr_object: "expression",
            attr_member: "name",
            subscript_value: "expression",
            subscript_index: "subscript",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["comment"],
            noise: vec![
                "\n",
                ";",
                "using_directive",
                "extern_alias_directive",
                "modifier",
                "attribute_list",
                "empty_statement",
                "type_parameter_list",
                "type_parameter_constraints_clause",
            ],
            blocks: vec!["block", "compilation_unit", "declaration_list"],
            identifiers: vec!["identifier", "generic_name", "implicit_parameter"],
            members: vec!["member_access_expression"],
            subscripts: vec!["element_access_expression"],
            patterns: vec!["tuple_pattern"],
            argument_wrappers: vec!["argument"],
        })
        // Expressions
        .exprs(
            &[
                "identifier",
                "implicit_parameter",
                "this",
                "this_expression",
                "base_expression",
                "predefined_type",
                "generic_name",
                "qualified_name",
            ],
            expressions::identifier,
        )
        .exprs(
            &[
                "integer_literal",
                "real_literal",
                "string_literal",
                "verbatim_string_literal",
                "raw_string_literal",
                "character_literal",
            ],
            expressions::const_literal,
        )
        .expr("boolean_literal", expressions::canonical_bool)
        .expr("null_literal", expressions::canonical_none)
        .expr("interpolated_string_expression", interpolated_string)
        .expr("binary_expression", expressions::binop)
        .expr("prefix_unary_expression", prefix_unary)
        .expr("postfix_unary_expression", postfix_unary)
        .expr("parenthesized_expression", expressions::paren)
        .expr("invocation_expression", expressions::call)
        .expr("member_access_expression", expressions::member_load)
        .expr("element_access_expression", expressions::subscript_load)
        .exprs(&["bracketed_argument_list", "argument"], expressions::unwrap_last)
        .expr("assignment_expression", assignment_expression)
        .expr("object_creation_expression", object_creation)
        .expr("implicit_object_creation_expression", implicit_object_creation)
        .exprs(
            &[
                "array_creation_expression",
                "implicit_array_creation_expression",
                "stackalloc_expression",
                "initializer_expression",
            ],
            array_creation,
        )
        .expr("cast_expression", cast_expression)
        .expr("conditional_expression", expressions::ternary)
        .exprs(&["lambda_expression", "anonymous_method_expression"], definitions::anonymous_function)
        .expr("await_expression", await_expression)
        .expr("typeof_expression", typeof_expression)
        .exprs(&["is_expression", "is_pattern_expression"], is_check)
        .expr("as_expression", as_expression)
        .expr("switch_expression", switch_expression)
        .expr("conditional_access_expression", conditional_access)
        .expr("tuple_expression", tuple_expression)
        .expr("default_expression", expressions::canonical_none)
        .exprs(
            &["checked_expression", "constant_pattern", "ref_expression", "range_expression"],
            expressions::unwrap_first,
        )
        .expr("declaration_pattern", declaration_pattern)
        .expr("throw_expression", throw_expression)
        .expr("query_expression", query_expression)
        .exprs(
            &["from_clause", "where_clause", "select_clause", "order_by_clause", "let_clause"],
            expressions::unwrap_last,
        )
        // Statements
        .stmts(&["expression_statement", "global_statement", "block"], control_flow::statement_list)
        .stmts(
            &["local_declaration_statement", "field_declaration", "event_field_declaration"],
            declaration_statement,
        )
        .stmt("variable_declaration", variable_declaration)
        .stmt("return_statement", control_flow::return_statement)
        .stmt("if_statement", control_flow::if_statement)
        .stmt("while_statement", control_flow::while_statement)
        .stmt("do_statement", control_flow::do_while_statement)
        .stmt("for_statement", control_flow::c_for_statement)
        .stmt("foreach_statement", foreach_statement)
        .stmt("switch_statement", switch_statement)
        .stmt("try_statement", try_statement)
        .stmt("throw_statement", control_flow::throw_statement)
        .stmt("break_statement", control_flow::break_statement)
        .stmt("continue_statement", control_flow::continue_statement)
        .stmts(&["method_declaration", "local_function_statement"], definitions::function_def)
        .stmt("constructor_declaration", constructor_declaration)
        .stmt("property_declaration", property_declaration)
        .stmts(
            &["class_declaration", "struct_declaration", "record_declaration"],
            definitions::class_def,
        )
        .stmt("interface_declaration", interface_declaration)
        .stmt("enum_declaration", enum_declaration)
        .stmt("delegate_declaration", delegate_declaration)
        .stmts(&["namespace_declaration", "file_scoped_namespace_declaration"], namespace_declaration)
        .stmts(&["using_statement", "lock_statement", "fixed_statement"], guarded_statement)
        .stmts(&["checked_statement", "unsafe_statement"], inner_block)
        .stmt("yield_statement", yield_statement)
        .stmt("labeled_statement", labeled_statement)
        .stmt("goto_statement", goto_statement)
        .stmts(&["event_declaration", "operator_declaration", "destructor_declaration"], control_flow::ignore)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `$"x={x}"`: text pieces and interpolations joined by `+`
fn interpolated_string(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let interpolations: Vec<Node<'_>> = node
        .named_kids()
        .into_iter()
        .filter(|c| matches!(c.kind(), "string_content" | "interpolation"))
        .collect();
    if !interpolations.iter().any(|c| c.kind() == "interpolation") {
        return expressions::const_literal(ctx, node);
    }
    let parts: Vec<Register> = interpolations
        .into_iter()
        .map(|piece| {
            if piece.kind() == "string_content" {
                return expressions::const_literal(ctx, piece);
            }
            match piece
                .named_kids()
                .into_iter()
                .find(|k| !k.kind().starts_with("interpolation_"))
            {
                Some(inner) => ctx.lower_expr(inner),
                None => ctx.const_none(),
            }
        })
        .collect();
    ctx.lower_concat(parts, node)
}

/// `++i` / `--i` store back; `!x`, `-x` are plain UNOPs
fn prefix_unary(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let text = ctx.text(node);
    if text.starts_with("++") || text.starts_with("--") {
        expressions::update_expr(ctx, node)
    } else {
        expressions::unop(ctx, node)
    }
}

/// `i++` stores back; `x!` (null-forgiving) is the operand itself
fn postfix_unary(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let text = ctx.text(node);
    if text.ends_with("++") || text.ends_with("--") {
        expressions::update_expr(ctx, node)
    } else {
        expressions::unwrap_first(ctx, node)
    }
}

/// `=` stores, `op=` (including `??=`) reads, combines and stores
fn assignment_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let op = node
        .field("operator")
        .or_else(|| node.first_of_kind("assignment_operator"))
        .map(|o| ctx.text(o));
    match op.as_deref() {
        Some("=") | None => assignments::assignment_expr(ctx, node),
        Some(_) => assignments::augmented_assignment_expr(ctx, node),
    }
}

/// `new T(args) { X = 1, ... }` -> a call to the class by name, then the
/// initializer's member assignments
fn object_creation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .field("type")
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "object".to_string());
    let args = ctx.call_args(node.field("arguments"));
    let object = ctx.call_function(&type_name, args, node.location());
    if let Some(init) = node.field("initializer").or_else(|| node.first_of_kind("initializer_expression")) {
        lower_object_initializer(ctx, object, init);
    }
    object
}

/// `new() { ... }` / `new(args)` with the type left to inference
fn implicit_object_creation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let object = ctx.new_object("object", node.location());
    let args = node.first_of_kind("argument_list");
    if args.is_some() {
        let arg_regs = ctx.call_args(args);
        ctx.call_method(object, CONSTRUCTOR_NAME, arg_regs, node.location());
    }
    if let Some(init) = node.first_of_kind("initializer_expression") {
        lower_object_initializer(ctx, object, init);
    }
    object
}

/// `X = v` entries become STORE_FIELD; bare entries are collection adds by position
fn lower_object_initializer(ctx: &mut LoweringContext<'_>, object: Register, init: Node<'_>) {
    for (index, entry) in ctx.significant_children(init).into_iter().enumerate() {
        let member = (entry.kind() == "assignment_expression")
            .then(|| entry.field("left").zip(entry.field("right")))
            .flatten();
        match member {
            Some((name, value)) => {
                let reg = ctx.lower_expr(value);
                let field = ctx.text(name);
                ctx.store_field(object, &field, reg, entry.location());
            }
            None => {
                let reg = ctx.lower_expr(entry);
                ctx.store_at(object, index, reg);
            }
        }
    }
}

/// `new[] {1, 2}` / `{1, 2}` fill the array; `new int[n]` only sizes it
fn array_creation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let initializer = if node.kind() == "initializer_expression" {
        Some(node)
    } else {
        node.field("initializer").or_else(|| node.first_of_kind("initializer_expression"))
    };
    if let Some(init) = initializer {
        let elements = ctx.significant_children(init);
        return ctx.lower_array_of("array", &elements, node);
    }
    let size = match node
        .named_kids()
        .into_iter()
        .find(|c| c.kind() == "array_type")
        .and_then(|t| t.field("rank"))
        .and_then(|rank| rank.named_kids().into_iter().next())
    {
        Some(dim) => ctx.lower_expr(dim),
        None => ctx.const_value("0", SourceLocation::UNKNOWN),
    };
    ctx.emit_value(Opcode::NewArray, vec!["array".into(), size.into()], node.location())
}

/// `(T) value`: the value only
fn cast_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_last(ctx, node),
    }
}

fn await_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operands = ctx.significant_children(node);
    ctx.lower_intrinsic("await", &operands, node)
}

/// `typeof(T)` -> `CALL_FUNCTION typeof "T"`
fn typeof_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .field("type")
        .or_else(|| node.named_kids().into_iter().next())
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "object".to_string());
    let type_reg = ctx.const_value(type_name, SourceLocation::UNKNOWN);
    ctx.call_function("typeof", vec![type_reg], node.location())
}

/// `x is T` / `x is > 0` -> `CALL_FUNCTION is_check x "pattern"`
fn is_check(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let parts = ctx.significant_children(node);
    let Some(operand) = node
        .field("left")
        .or_else(|| node.field("expression"))
        .or_else(|| parts.first().copied())
    else {
        return expressions::const_literal(ctx, node);
    };
    let object = ctx.lower_expr(operand);
    let pattern = node
        .field("right")
        .or_else(|| node.field("pattern"))
        .or_else(|| parts.get(1).copied());
    let pattern_text = pattern.map(|p| ctx.text(p)).unwrap_or_else(|| "object".to_string());
    let pattern_reg = ctx.const_value(pattern_text, SourceLocation::UNKNOWN);
    let checked = ctx.call_function("is_check", vec![object, pattern_reg], node.location());
    // `x is T name` binds the operand
    if let Some(binding) = pattern
        .filter(|p| p.kind() == "declaration_pattern")
        .and_then(|p| p.field("name"))
    {
        ctx.lower_store_target(binding, object, node);
    }
    checked
}

/// `x as T`: the operand only
fn as_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("left") {
        Some(left) => ctx.lower_expr(left),
        None => expressions::unwrap_first(ctx, node),
    }
}

/// `T name` inside a pattern: the bound name
fn declaration_pattern(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("name") {
        Some(name) => ctx.lower_expr(name),
        None => expressions::symbolic_node(ctx, node),
    }
}

/// `k switch { 1 => "a", _ => "b" }`
fn switch_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let kids = ctx.significant_children(node);
    let Some(subject_node) = kids.iter().copied().find(|k| k.kind() != "switch_expression_arm") else {
        ctx.malformed("switch expression without a subject", node);
        return ctx.const_none();
    };
    let subject = ctx.lower_expr(subject_node);
    let mut arms = Vec::new();
    for arm in kids.into_iter().filter(|k| k.kind() == "switch_expression_arm") {
        let parts: Vec<Node<'_>> = ctx
            .significant_children(arm)
            .into_iter()
            .filter(|p| p.kind() != "when_clause")
            .collect();
        let (Some(pattern), Some(value)) = (parts.first().copied(), parts.last().copied()) else {
            continue;
        };
        if parts.len() < 2 {
            continue;
        }
        let is_discard = pattern.kind() == "discard" || ctx.text(pattern) == "_";
        let values = if is_discard { Vec::new() } else { vec![pattern] };
        arms.push((values, value));
    }
    ctx.lower_match_value(subject, &arms, node)
}

/// `a?.B` / `a?[i]`
fn conditional_access(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let kids = ctx.significant_children(node);
    let (Some(target), Some(binding)) = (kids.first().copied(), kids.last().copied()) else {
        return expressions::symbolic_node(ctx, node);
    };
    let object = ctx.lower_expr(target);
    match binding.kind() {
        "member_binding_expression" => {
            let member = binding
                .field("name")
                .or_else(|| binding.named_kids().into_iter().last())
                .map(|n| ctx.text(n))
                .unwrap_or_else(|| "unknown".to_string());
            ctx.emit_value(Opcode::LoadField, vec![object.into(), member.into()], node.location())
        }
        "element_binding_expression" => {
            let index = match binding.named_kids().into_iter().next() {
                Some(args) => ctx.lower_expr(args),
                None => ctx.const_none(),
            };
            ctx.emit_value(Opcode::LoadIndex, vec![object.into(), index.into()], node.location())
        }
        _ => object,
    }
}

/// `(a, b)` as a tuple array
fn tuple_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("tuple", &elements, node)
}

/// `throw` in expression position; its value is the none literal
fn throw_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    control_flow::throw_statement(ctx, node);
    ctx.const_none()
}

/// LINQ: every clause's operand in source order, folded into one `query` call
fn query_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let clauses: Vec<Node<'_>> = ctx
        .significant_children(node)
        .into_iter()
        .flat_map(|c| if c.kind() == "query_body" { c.named_kids() } else { vec![c] })
        .collect();
    ctx.lower_intrinsic("query", &clauses, node)
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// Locals and fields wrap one `variable_declaration`
fn declaration_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for child in node.named_kids() {
        if child.kind() == "variable_declaration" {
            variable_declaration(ctx, child);
        }
    }
}

/// `int a = 1, b;`: an absent initializer stores none
fn variable_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for declarator in node.named_kids() {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        let Some(name) = declarator
            .field("name")
            .or_else(|| declarator.first_of_kind("identifier"))
            .or_else(|| declarator.first_of_kind("tuple_pattern"))
        else {
            ctx.malformed("declarator without a name", declarator);
            continue;
        };
        ctx.lower_declaration(name, declarator_value(declarator), declarator);
    }
}

/// The expression after `=` in a declarator, if any
fn declarator_value<'t>(declarator: Node<'t>) -> Option<Node<'t>> {
    if let Some(value) = declarator.field("value") {
        return Some(value);
    }
    let kids = declarator.kids();
    let eq = kids.iter().position(|k| k.kind() == "=")?;
    kids.into_iter()
        .skip(eq + 1)
        .find(|k| k.is_named())
        .map(|k| {
            if k.kind() == "equals_value_clause" {
                k.named_kids().into_iter().next().unwrap_or(k)
            } else {
                k
            }
        })
}

/// `foreach (var x in xs)` over the index-loop skeleton
fn foreach_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let (Some(target), Some(iterable)) = (node.field("left"), node.field("right")) else {
        ctx.malformed("foreach without variable or iterable", node);
        return;
    };
    let body = node.field("body");
    let iter_reg = ctx.lower_expr(iterable);
    ctx.lower_index_loop(
        iter_reg,
        node,
        |ctx, elem, _| ctx.lower_store_target(target, elem, node),
        |ctx| ctx.lower_body(body),
    );
}

/// Sections never fall through; `default:` is the unconditional arm
fn switch_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let subject_node = node
        .field("value")
        .or_else(|| node.first_of_kind("tuple_expression"))
        .or_else(|| {
            ctx.significant_children(node)
                .into_iter()
                .find(|c| c.kind() != "switch_body")
        });
    let subject = ctx.lower_opt_expr(subject_node);
    let sections = node
        .field("body")
        .or_else(|| node.first_of_kind("switch_body"))
        .map(|b| b.named_kids())
        .unwrap_or_default();
    let mut arms = Vec::with_capacity(sections.len());
    for section in sections {
        if section.kind() != "switch_section" {
            continue;
        }
        let (values, body, is_default) = split_switch_section(ctx, section);
        arms.push((if is_default { Vec::new() } else { values }, body));
    }
    ctx.lower_case_chain(subject, &arms, CaseStyle::Switch, node);
}

/// `(case values, body statements, has default)` of one section
///
/// Labels are either wrapper nodes or bare `case`/`default` tokens
/// followed by their values up to the `:`.
fn split_switch_section<'t>(ctx: &LoweringContext<'_>, section: Node<'t>) -> (Vec<Node<'t>>, Vec<Node<'t>>, bool) {
    let mut values = Vec::new();
    let mut body = Vec::new();
    let mut is_default = false;
    let mut in_label = false;
    for kid in section.kids() {
        match kid.kind() {
            "case" => in_label = true,
            "default" => {
                is_default = true;
                in_label = true;
            }
            ":" => in_label = false,
            "default_switch_label" => is_default = true,
            "case_switch_label" | "case_pattern_switch_label" => {
                values.extend(
                    ctx.significant_children(kid)
                        .into_iter()
                        .filter(|v| v.kind() != "when_clause")
                        .map(unwrap_constant_pattern),
                );
            }
            "when_clause" => {}
            _ if !kid.is_named() || ctx.profile().is_skipped(kid.kind()) => {}
            _ if in_label => values.push(unwrap_constant_pattern(kid)),
            _ if LABEL_KINDS.contains(&kid.kind()) => {}
            _ => body.push(kid),
        }
    }
    (values, body, is_default)
}

fn unwrap_constant_pattern(node: Node<'_>) -> Node<'_> {
    if node.kind() == "constant_pattern" {
        node.named_kids().into_iter().next().unwrap_or(node)
    } else {
        node
    }
}

/// `try { } catch (IOException e) when (...) { } finally { }`
fn try_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut parts = TryParts {
        body: node.field("body"),
        ..TryParts::default()
    };
    for child in node.named_kids() {
        match child.kind() {
            "catch_clause" => {
                let declaration = child.first_of_kind("catch_declaration");
                parts.catches.push(CatchClause {
                    variable: declaration.and_then(|d| d.field("name")),
                    exception_type: declaration.and_then(|d| d.field("type")),
                    body: child.field("body").or_else(|| child.first_of_kind("block")),
                });
            }
            "finally_clause" => {
                parts.finally_body = child.first_of_kind("block");
            }
            _ => {}
        }
    }
    ctx.lower_try(&parts, node);
}

/// Constructors are bound under the shared constructor name
fn constructor_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let params = node.field("parameters");
    let body = node.field("body");
    ctx.lower_function_parts(CONSTRUCTOR_NAME, params, body, node);
}

/// `public int X { get; set; } = 5;` -> STORE_FIELD on `this`
fn property_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        ctx.malformed("property without a name", node);
        return;
    };
    let value = match node.field("value") {
        Some(v) => ctx.lower_expr(v),
        None => ctx.const_none(),
    };
    let this = ctx.load_var("this", SourceLocation::UNKNOWN);
    ctx.store_field(this, &name, value, node.location());
}

fn interface_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let members: Vec<String> = node
        .field("body")
        .map(|b| b.named_kids())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|m| m.field("name").map(|n| ctx.text(n)))
        .collect();
    ctx.lower_ordinal_object("interface", &name, &members, node);
}

fn enum_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let members: Vec<String> = node
        .field("body")
        .map(|b| b.named_kids())
        .unwrap_or_default()
        .into_iter()
        .filter(|m| m.kind() == "enum_member_declaration")
        .filter_map(|m| {
            m.field("name")
                .or_else(|| m.first_of_kind("identifier"))
                .map(|n| ctx.text(n))
        })
        .collect();
    ctx.lower_ordinal_object("enum", &name, &members, node);
}

/// `delegate int Op(int a);` declares a body-less function
fn delegate_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    ctx.lower_function_parts(&name, node.field("parameters"), None, node);
}

fn namespace_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    match node.field("body") {
        Some(body) => ctx.lower_block(body),
        None => ctx.lower_named_children_as_stmts(node, &["identifier", "qualified_name"]),
    }
}

/// `using (var r = Open()) { }`, `lock (o) { }`, `fixed (...) { }`:
/// the guard first, then the body
fn guarded_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.field("body");
    for child in ctx.significant_children(node) {
        if Some(child.id()) == body.map(|b| b.id()) {
            continue;
        }
        match child.kind() {
            "variable_declaration" => variable_declaration(ctx, child),
            "block" => {}
            _ => {
                ctx.lower_expr(child);
            }
        }
    }
    ctx.lower_body(body.or_else(|| node.first_of_kind("block")));
}

fn inner_block(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    ctx.lower_body(node.first_of_kind("block"));
}

/// `yield return x;` / `yield break;`
fn yield_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if node.has_child_kind("break") {
        ctx.call_function("yield_break", Vec::new(), node.location());
        return;
    }
    let operands = ctx.significant_children(node);
    ctx.lower_intrinsic("yield", &operands, node);
}

fn labeled_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let kids = ctx.significant_children(node);
    let Some((name, rest)) = kids.split_first() else {
        return;
    };
    let name_text = ctx.text(*name);
    let label = ctx.user_label(&name_text);
    ctx.emit_label(&label);
    for stmt in rest {
        ctx.lower_stmt(*stmt);
    }
}

/// `goto name;`; `goto case`/`goto default` have no label to target
fn goto_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if node.has_child_kind("case") || node.has_child_kind("default") {
        let target = ctx.current_break_target().map(str::to_string);
        match target {
            Some(end) => ctx.emit_branch(&end),
            None => {
                ctx.symbolic("goto_case", node.location());
            }
        }
        return;
    }
    let Some(name) = node.first_of_kind("identifier").map(|l| ctx.text(l)) else {
        ctx.malformed("goto without label", node);
        return;
    };
    let label = ctx.user_label(&name);
    ctx.emit_branch(&label);
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;

    fn dump(src: &str) -> Vec<String> {
        lower_with_language(LanguageId::CSharp, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    fn assert_supported(ir: &[String]) {
        let bad: Vec<&String> = ir.iter().filter(|l| l.contains("unsupported:")).collect();
        assert!(bad.is_empty(), "unsupported constructs: {:#?}", bad);
    }

    #[test]
    fn test_top_level_statements() {
        let ir = dump("int x = 1;\nx += 2;\n");
        assert_supported(&ir);
        assert_eq!(ir[1], "%0 = const 1");
        assert_eq!(ir[2], "store_var x %0");
        assert!(ir.iter().any(|l| l.contains("binop + ")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var x ")).count(), 2);
    }

    #[test]
    fn test_class_with_constructor_and_method() {
        let src = "class A {\n  int f;\n  A(int v) { f = v; }\n  int Get() { return f; }\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("class_A_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func___init___")));
        assert!(ir.iter().any(|l| l.starts_with("func_Get_")));
        assert!(ir.contains(&"%0 = const null".to_string()));
        assert!(ir.iter().any(|l| l.contains("symbolic param:v")));
    }

    #[test]
    fn test_foreach_calls_method() {
        let src = "class A { void F(int[] xs) { foreach (var x in xs) { Console.WriteLine(x); } } }\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function len")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var x ")));
        assert!(ir.iter().any(|l| l.contains("call_method") && l.contains("WriteLine")));
    }

    #[test]
    fn test_switch_sections_do_not_fall_through() {
        let src = "class A { void F(int k) { switch (k) { case 1: case 2: y = 1; break; default: y = 0; break; } } }\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop == ")).count(), 2, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("switch_end_")));
    }

    #[test]
    fn test_switch_expression_value() {
        let src = "class A { string F(int k) { return k switch { 1 => \"a\", _ => \"b\" }; } }\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop == ")).count(), 1, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("load_var __match_result_")));
    }

    #[test]
    fn test_interpolated_string_concatenates() {
        let ir = dump("var s = $\"x={x}\";\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("binop + ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var s ")));
    }

    #[test]
    fn test_try_catch_finally() {
        let src = "class A { void F() { try { G(); } catch (IOException e) { H(); } finally { K(); } } }\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("caught_exception:IOException")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var e ")));
        assert!(ir.iter().any(|l| l.starts_with("try_finally_")));
    }

    #[test]
    fn test_lambda_becomes_function() {
        let ir = dump("Func<int, int> f = x => x * 2;\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("func___anon_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop * ")));
        assert!(ir.iter().any(|l| l.starts_with("store_var f ")));
    }

    #[test]
    fn test_object_initializer_stores_fields() {
        let ir = dump("var p = new P { X = 1 };\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function P")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_field") && l.contains(" X ")));
    }

    #[test]
    fn test_enum_ordinals() {
        let ir = dump("enum Color { Red, Green }\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("new_object enum:Color")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var Color ")));
    }
}

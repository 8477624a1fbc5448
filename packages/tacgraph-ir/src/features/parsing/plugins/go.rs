//! Go profile
//!
//! Statements carry expression lists on both sides, so assignment and
//! return work pairwise. `func main()` is lowered inline on the top-level
//! path; type declarations only leave a typed marker behind.

use crate::features::lowering::domain::SyntaxNode;
use crate::features::lowering::infrastructure::control_flow::CaseStyle;
use crate::features::lowering::infrastructure::{
    assignments, collections, control_flow, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

const ENTRY_FUNCTION: &str = "main";

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Go)
        .literals(Literals::new("true", "false", "nil", "nil"))
        .fields(FieldNames {
            attr_object: "operand",
            attr_member: "field",
            subscript_value: "operand",
            subscript_index: "index",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["comment"],
            noise: vec!["\n", ";", "package_clause", "import_declaration", "empty_statement"],
            blocks: vec!["block", "statement_list", "source_file"],
            identifiers: vec!["identifier", "field_identifier", "type_identifier"],
            members: vec!["selector_expression"],
            subscripts: vec!["index_expression"],
            patterns: vec![],
            argument_wrappers: vec![],
        })
        // Expressions
        .exprs(&["identifier", "field_identifier", "type_identifier"], expressions::identifier)
        .exprs(
            &[
                "int_literal",
                "float_literal",
                "imaginary_literal",
                "rune_literal",
                "interpreted_string_literal",
                "raw_string_literal",
                "iota",
                "slice_type",
                "array_type",
                "map_type",
                "channel_type",
                "pointer_type",
                "qualified_type",
                "generic_type",
                "function_type",
                "interface_type",
                "struct_type",
            ],
            expressions::const_literal,
        )
        .expr("true", expressions::canonical_true)
        .expr("false", expressions::canonical_false)
        .expr("nil", expressions::canonical_none)
        .expr("binary_expression", expressions::binop)
        .expr("unary_expression", expressions::unop)
        .expr("parenthesized_expression", expressions::paren)
        .expr("call_expression", expressions::call)
        .expr("selector_expression", expressions::member_load)
        .expr("index_expression", expressions::subscript_load)
        .expr("slice_expression", slice_expression)
        .expr("type_assertion_expression", type_assertion)
        .expr("type_conversion_expression", type_conversion)
        .expr("composite_literal", composite_literal)
        .expr("literal_value", literal_value)
        .expr("literal_element", expressions::unwrap_first)
        .expr("func_literal", func_literal)
        .expr("expression_list", collections::tuple_literal)
        .expr("variadic_argument", expressions::unwrap_first)
        // Statements
        .stmts(&["expression_statement", "statement_list"], control_flow::statement_list)
        .stmt("block", control_flow::statement_list)
        .stmt("short_var_declaration", short_var_declaration)
        .stmt("assignment_statement", assignment_statement)
        .stmt("inc_statement", inc_statement)
        .stmt("dec_statement", dec_statement)
        .stmt("var_declaration", var_declaration)
        .stmt("const_declaration", var_declaration)
        .stmt("type_declaration", type_declaration)
        .stmt("return_statement", return_statement)
        .stmt("if_statement", if_statement)
        .stmt("for_statement", for_statement)
        .stmt("expression_switch_statement", expression_switch)
        .stmt("type_switch_statement", type_switch)
        .stmt("select_statement", select_statement)
        .stmt("function_declaration", function_declaration)
        .stmt("method_declaration", method_declaration)
        .stmt("break_statement", control_flow::break_statement)
        .stmt("continue_statement", control_flow::continue_statement)
        .stmts(&["defer_statement", "go_statement"], deferred_call)
        .stmt("send_statement", send_statement)
        .stmt("receive_statement", receive_statement)
        .stmt("labeled_statement", labeled_statement)
        .stmt("goto_statement", goto_statement)
        .stmt("fallthrough_statement", control_flow::ignore)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `a[lo:hi]` -> `CALL_FUNCTION slice a lo hi`; a missing bound is 0 / nil
fn slice_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operand = ctx.lower_opt_expr(node.field("operand"));
    let start = match node.field("start") {
        Some(s) => ctx.lower_expr(s),
        None => ctx.const_value("0", SourceLocation::UNKNOWN),
    };
    let end = ctx.lower_opt_expr(node.field("end"));
    ctx.call_function("slice", vec![operand, start, end], node.location())
}

/// `x.(T)` -> `CALL_FUNCTION type_assert x T`
fn type_assertion(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operand = ctx.lower_opt_expr(node.field("operand"));
    let type_name = node
        .field("type")
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "interface{}".to_string());
    let type_reg = ctx.const_value(type_name, SourceLocation::UNKNOWN);
    ctx.call_function("type_assert", vec![operand, type_reg], node.location())
}

/// `T(x)` -> a call to the type by name
fn type_conversion(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .field("type")
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "convert".to_string());
    let operand = ctx.lower_opt_expr(node.field("operand"));
    ctx.call_function(&type_name, vec![operand], node.location())
}

/// `Point{X: 1}`, `[]int{1, 2}`, `map[string]int{"a": 1}`
///
/// Slices and arrays become NEW_ARRAY, maps store by key, anything else is
/// a struct whose keyed elements are fields.
fn composite_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_node = node.field("type");
    let type_name = type_node
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "Object".to_string());
    let elements = node
        .field("body")
        .or_else(|| node.first_of_kind("literal_value"))
        .map(|body| ctx.significant_children(body))
        .unwrap_or_default();

    let type_kind = type_node.map(|t| t.kind()).unwrap_or("");
    if matches!(type_kind, "slice_type" | "array_type" | "implicit_length_array_type") {
        let values: Vec<Node<'_>> = elements.iter().map(|e| element_value(*e)).collect();
        return ctx.lower_array_of(&type_name, &values, node);
    }

    let object = ctx.new_object(&type_name, node.location());
    for (i, element) in elements.into_iter().enumerate() {
        if element.kind() != "keyed_element" {
            let value = ctx.lower_expr(element_value(element));
            ctx.store_at(object, i, value);
            continue;
        }
        let parts = element.named_kids();
        let (Some(key), Some(value)) = (parts.first(), parts.get(1)) else {
            ctx.malformed("keyed element without key and value", element);
            continue;
        };
        let key = element_value(*key);
        if type_kind == "map_type" {
            let key_reg = ctx.lower_expr(key);
            let value_reg = ctx.lower_expr(element_value(*value));
            ctx.emit_effect(
                Opcode::StoreIndex,
                vec![object.into(), key_reg.into(), value_reg.into()],
                element.location(),
            );
        } else {
            let field = ctx.text(key);
            let value_reg = ctx.lower_expr(element_value(*value));
            ctx.store_field(object, &field, value_reg, element.location());
        }
    }
    object
}

/// Nested `{1, 2}` inside a composite literal
fn literal_value(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let values: Vec<Node<'_>> = ctx
        .significant_children(node)
        .into_iter()
        .map(element_value)
        .collect();
    ctx.lower_array_of("list", &values, node)
}

/// `literal_element` wraps the expression it holds
fn element_value(node: Node<'_>) -> Node<'_> {
    if node.kind() == "literal_element" {
        node.named_kids().into_iter().next().unwrap_or(node)
    } else {
        node
    }
}

/// `func(a int) int { ... }`
fn func_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let params = node.field("parameters");
    let body = node.field("body");
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        lower_go_params(ctx, params);
        ctx.lower_body(body);
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Declarations and assignments
// ═══════════════════════════════════════════════════════════════════════════

/// Children of an `expression_list`, or the node itself
fn list_items<'t>(ctx: &LoweringContext<'_>, node: Option<Node<'t>>) -> Vec<Node<'t>> {
    match node {
        Some(n) if n.kind() == "expression_list" => ctx.significant_children(n),
        Some(n) => vec![n],
        None => Vec::new(),
    }
}

/// `a, b := x, y`
fn short_var_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let targets = list_items(ctx, node.field("left"));
    let values = list_items(ctx, node.field("right"));
    ctx.lower_parallel_assign(&targets, &values, node);
}

/// `a, b = x, y` or `a op= x`
fn assignment_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let targets = list_items(ctx, node.field("left"));
    let values = list_items(ctx, node.field("right"));
    let op = node
        .field("operator")
        .map(|o| ctx.text(o))
        .unwrap_or_else(|| "=".to_string());
    if op.trim() == "=" {
        ctx.lower_parallel_assign(&targets, &values, node);
        return;
    }
    let op = assignments::binary_op_of_compound(&op).to_string();
    for (target, value) in targets.iter().zip(&values) {
        let current = ctx.lower_expr(*target);
        let rhs = ctx.lower_expr(*value);
        let result = ctx.binop(&op, current, rhs, node.location());
        ctx.lower_store_target(*target, result, node);
    }
}

fn inc_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(target) = ctx.significant_children(node).into_iter().next() {
        ctx.lower_step(target, "+", node);
    }
}

fn dec_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(target) = ctx.significant_children(node).into_iter().next() {
        ctx.lower_step(target, "-", node);
    }
}

/// `var a, b = 1, 2` / `var x int` / `const ( ... )`; names without a
/// value store nil
fn var_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for child in node.named_kids() {
        match child.kind() {
            "var_spec" | "const_spec" => lower_spec(ctx, child),
            "var_spec_list" | "const_spec_list" => {
                for spec in child.named_kids() {
                    if matches!(spec.kind(), "var_spec" | "const_spec") {
                        lower_spec(ctx, spec);
                    }
                }
            }
            _ => {}
        }
    }
}

fn lower_spec(ctx: &mut LoweringContext<'_>, spec: Node<'_>) {
    let names = spec.field_all("name");
    let values = list_items(ctx, spec.field("value"));
    ctx.lower_parallel_assign(&names, &values, spec);
}

/// `type Point struct {...}` -> `SYMBOLIC struct:Point`, other types `type:Name`
fn type_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for spec in node.named_kids() {
        if !matches!(spec.kind(), "type_spec" | "type_alias") {
            continue;
        }
        let Some(name) = spec.field("name").map(|n| ctx.text(n)) else {
            continue;
        };
        let is_struct = spec.field("type").is_some_and(|t| t.kind() == "struct_type");
        let hint = if is_struct {
            format!("struct:{}", name)
        } else {
            format!("type:{}", name)
        };
        let marker = ctx.symbolic(hint, spec.location());
        ctx.store_var(&name, marker, spec.location());
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Control flow
// ═══════════════════════════════════════════════════════════════════════════

/// `return a, b`: every value is lowered first, then returned in order
fn return_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let list = ctx.significant_children(node).into_iter().next();
    let values = list_items(ctx, list);
    match values.as_slice() {
        [] => ctx.lower_return(None, node),
        [single] => ctx.lower_return(Some(*single), node),
        _ => {
            let regs: Vec<Register> = values.iter().map(|v| ctx.lower_expr(*v)).collect();
            for reg in regs {
                ctx.emit_effect(Opcode::Return, vec![reg.into()], node.location());
            }
        }
    }
}

/// `if init; cond { } else { }`
fn if_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(init) = node.field("initializer") {
        ctx.lower_stmt(init);
    }
    control_flow::if_statement(ctx, node);
}

/// C-style clause, `range` clause, bare condition or infinite loop
fn for_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.field("body");
    if let Some(clause) = node.first_of_kind("for_clause") {
        let init = clause.field("initializer");
        let cond = clause.field("condition");
        let update = clause.field("update");
        ctx.lower_c_for_parts(init, cond, update, body, node);
    } else if let Some(clause) = node.first_of_kind("range_clause") {
        range_loop(ctx, clause, body, node);
    } else {
        let cond = node
            .named_kids()
            .into_iter()
            .find(|c| Some(c.id()) != body.map(|b| b.id()) && !ctx.profile().is_skipped(c.kind()));
        ctx.lower_c_for_parts(None, cond, None, body, node);
    }
}

/// `for i, v := range xs`: the first name takes the index, the second the element
fn range_loop(ctx: &mut LoweringContext<'_>, clause: Node<'_>, body: Option<Node<'_>>, node: Node<'_>) {
    let targets = list_items(ctx, clause.field("left"));
    let iter_reg = ctx.lower_opt_expr(clause.field("right"));
    ctx.lower_index_loop(
        iter_reg,
        node,
        |ctx, elem, idx| {
            if let Some(key) = targets.first() {
                ctx.lower_store_target(*key, idx, node);
            }
            if let Some(value) = targets.get(1) {
                ctx.lower_store_target(*value, elem, node);
            }
        },
        |ctx| ctx.lower_body(body),
    );
}

/// Case arms of a switch body: `(values, statements)`, default without values
fn switch_arms<'t>(node: Node<'t>, case_kind: &str, value_field: &str) -> Vec<(Vec<Node<'t>>, Vec<Node<'t>>)> {
    let mut arms = Vec::new();
    for case in node.named_kids() {
        if case.kind() == case_kind {
            let values: Vec<Node<'t>> = case
                .field_all(value_field)
                .into_iter()
                .flat_map(|v| {
                    if v.kind() == "expression_list" {
                        v.named_kids()
                    } else {
                        vec![v]
                    }
                })
                .collect();
            let value_ids: Vec<usize> = case.field_all(value_field).iter().map(|v| v.id()).collect();
            let body = case
                .named_kids()
                .into_iter()
                .filter(|c| !value_ids.contains(&c.id()))
                .collect();
            arms.push((values, body));
        } else if case.kind() == "default_case" {
            arms.push((Vec::new(), case.named_kids()));
        }
    }
    arms
}

/// `switch init; v { case a, b: ... default: ... }`; no value switches on `true`
fn expression_switch(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(init) = node.field("initializer") {
        ctx.lower_stmt(init);
    }
    let subject = match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => {
            let lit = ctx.literals().true_lit;
            ctx.const_value(lit, node.location())
        }
    };
    let arms = switch_arms(node, "expression_case", "value");
    ctx.lower_case_chain(subject, &arms, CaseStyle::Switch, node);
}

/// `switch v := x.(type) { case int: ... }` -> `CALL_FUNCTION type_check x T` per type
fn type_switch(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(init) = node.field("initializer") {
        ctx.lower_stmt(init);
    }
    let subject = ctx.lower_opt_expr(node.field("value"));
    for alias in list_items(ctx, node.field("alias")) {
        ctx.lower_store_target(alias, subject, node);
    }
    let arms = switch_arms(node, "type_case", "type");
    ctx.lower_case_chain_with(subject, &arms, CaseStyle::Switch, node, |ctx, subject, types| {
        let mut acc: Option<Register> = None;
        for ty in types {
            let name = ctx.text(*ty);
            let type_reg = ctx.const_value(name, SourceLocation::UNKNOWN);
            let check = ctx.call_function("type_check", vec![subject, type_reg], ty.location());
            acc = Some(match acc {
                Some(prev) => ctx.binop("||", prev, check, node.location()),
                None => check,
            });
        }
        match acc {
            Some(reg) => reg,
            None => ctx.const_value("true", SourceLocation::UNKNOWN),
        }
    });
}

/// `select { case v := <-ch: ... }`: which case is ready is unknown, so each
/// arm is guarded by a `select_ready` marker
fn select_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut arms = Vec::new();
    for case in node.named_kids() {
        match case.kind() {
            "communication_case" => {
                let communication: Vec<Node<'_>> = case.field("communication").into_iter().collect();
                arms.push((communication, ctx.significant_children(case)));
            }
            "default_case" => arms.push((Vec::new(), ctx.significant_children(case))),
            _ => {}
        }
    }
    let none = ctx.const_none();
    ctx.lower_case_chain_with(none, &arms, CaseStyle::Switch, node, |ctx, _, _| {
        ctx.symbolic("select_ready", node.location())
    });
}

/// `func name(params) { body }`; `main` is inlined
fn function_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let params = node.field("parameters");
    let body = node.field("body");
    if name == ENTRY_FUNCTION {
        ctx.lower_body(body);
        return;
    }
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        lower_go_params(ctx, params);
        ctx.lower_body(body);
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// `func (r *T) name(params) { body }`: the receiver is the first parameter
fn method_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let receiver = node.field("receiver");
    let params = node.field("parameters");
    let body = node.field("body");
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        lower_go_params(ctx, receiver);
        lower_go_params(ctx, params);
        ctx.lower_body(body);
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// `(a, b int, rest ...string)`: every name of a declaration is a parameter
fn lower_go_params(ctx: &mut LoweringContext<'_>, params: Option<Node<'_>>) {
    let Some(params) = params else {
        return;
    };
    for decl in params.named_kids() {
        match decl.kind() {
            "parameter_declaration" | "variadic_parameter_declaration" => {
                for name in decl.field_all("name") {
                    let text = ctx.text(name);
                    ctx.emit_param(&text, name.location());
                }
            }
            "identifier" => {
                let text = ctx.text(decl);
                ctx.emit_param(&text, decl.location());
            }
            _ => {}
        }
    }
}

/// `defer f()` / `go f()` -> the call, then `CALL_FUNCTION defer|go <result>`
fn deferred_call(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(call) = ctx.significant_children(node).into_iter().next() else {
        return;
    };
    let call_reg = ctx.lower_expr(call);
    let keyword = if node.kind() == "go_statement" { "go" } else { "defer" };
    ctx.call_function(keyword, vec![call_reg], node.location());
}

/// `ch <- v`
fn send_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let channel = ctx.lower_opt_expr(node.field("channel"));
    let value = ctx.lower_opt_expr(node.field("value"));
    ctx.call_function("chan_send", vec![channel, value], node.location());
}

/// `v, ok := <-ch` inside a select case
fn receive_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let source = node.field("right").map(|r| {
        if r.kind() == "unary_expression" {
            r.field("operand").unwrap_or(r)
        } else {
            r
        }
    });
    let channel = ctx.lower_opt_expr(source);
    let received = ctx.call_function("chan_recv", vec![channel], node.location());
    for target in list_items(ctx, node.field("left")) {
        ctx.lower_store_target(target, received, node);
    }
}

/// `name: stmt`
fn labeled_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("label")
        .or_else(|| node.first_of_kind("label_name"))
        .map(|l| ctx.text(l))
        .unwrap_or_else(|| "label".to_string());
    let label = ctx.user_label(&name);
    ctx.emit_label(&label);
    ctx.lower_named_children_as_stmts(node, &["label_name"]);
}

fn goto_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.first_of_kind("label_name").map(|l| ctx.text(l)) else {
        ctx.malformed("goto without label", node);
        return;
    };
    let label = ctx.user_label(&name);
    ctx.emit_branch(&label);
}

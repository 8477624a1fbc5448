//! Java profile

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

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Java)
        .literals(Literals::new("true", "false", "null", "null"))
        .fields(FieldNames {
            attr_member: "field",
            subscript_value: "array",
            subscript_index: "index",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["comment", "line_comment", "block_comment"],
            noise: vec!["\n", ";", "modifiers", "marker_annotation", "annotation"],
            blocks: vec!["block", "program", "class_body", "constructor_body"],
            identifiers: vec!["identifier"],
            members: vec!["field_access"],
            subscripts: vec!["array_access"],
            patterns: vec![],
            argument_wrappers: vec![],
        })
        // Expressions
        .exprs(&["identifier", "this", "super", "type_identifier"], expressions::identifier)
        .exprs(
            &[
                "decimal_integer_literal",
                "hex_integer_literal",
                "octal_integer_literal",
                "binary_integer_literal",
                "decimal_floating_point_literal",
                "hex_floating_point_literal",
                "string_literal",
                "text_block",
                "character_literal",
                "true",
                "false",
                "null_literal",
                "class_literal",
            ],
            expressions::const_literal,
        )
        .expr("binary_expression", expressions::binop)
        .expr("unary_expression", expressions::unop)
        .expr("update_expression", expressions::update_expr)
        .expr("parenthesized_expression", expressions::paren)
        .expr("method_invocation", method_invocation)
        .expr("object_creation_expression", object_creation)
        .expr("field_access", expressions::member_load)
        .expr("array_access", expressions::subscript_load)
        .exprs(&["array_creation_expression", "array_initializer"], array_creation)
        .expr("assignment_expression", assignment_expression)
        .expr("cast_expression", cast_expression)
        .expr("instanceof_expression", instanceof_expression)
        .expr("ternary_expression", expressions::ternary)
        .expr("lambda_expression", definitions::anonymous_function)
        .expr("method_reference", method_reference)
        // Statements
        .stmt("expression_statement", control_flow::statement_list)
        .stmts(&["local_variable_declaration", "field_declaration"], variable_declaration)
        .stmt("return_statement", control_flow::return_statement)
        .stmt("if_statement", control_flow::if_statement)
        .stmt("while_statement", control_flow::while_statement)
        .stmt("do_statement", control_flow::do_while_statement)
        .stmt("for_statement", control_flow::c_for_statement)
        .stmt("enhanced_for_statement", enhanced_for)
        .stmt("method_declaration", definitions::function_def)
        .stmt("constructor_declaration", constructor_declaration)
        .stmts(&["class_declaration", "record_declaration"], definitions::class_def)
        .stmt("interface_declaration", interface_declaration)
        .stmt("enum_declaration", enum_declaration)
        .stmt("throw_statement", control_flow::throw_statement)
        .stmts(&["block", "static_initializer"], control_flow::statement_list)
        .stmt("break_statement", control_flow::break_statement)
        .stmt("continue_statement", control_flow::continue_statement)
        .stmt("switch_expression", switch_statement)
        .stmts(&["try_statement", "try_with_resources_statement"], try_statement)
        .stmt("labeled_statement", labeled_statement)
        .stmts(&["import_declaration", "package_declaration"], control_flow::ignore)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `obj.name(args)` -> CALL_METHOD, bare `name(args)` -> CALL_FUNCTION
fn method_invocation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "unknown".to_string());
    let args = node.field("arguments");
    match node.field("object") {
        Some(object) => {
            let receiver = ctx.lower_expr(object);
            let arg_regs = ctx.call_args(args);
            ctx.call_method(receiver, &name, arg_regs, node.location())
        }
        None => {
            let arg_regs = ctx.call_args(args);
            ctx.call_function(&name, arg_regs, node.location())
        }
    }
}

/// `new T(args)` -> a call to the class by name
fn object_creation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .field("type")
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "Object".to_string());
    let args = ctx.call_args(node.field("arguments"));
    ctx.call_function(&type_name, args, node.location())
}

/// `new int[]{1, 2}` / `{1, 2}` fill the array; `new int[n]` only sizes it
fn array_creation(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let initializer = if node.kind() == "array_initializer" {
        Some(node)
    } else {
        node.field("value").or_else(|| node.first_of_kind("array_initializer"))
    };
    if let Some(init) = initializer {
        let elements = ctx.significant_children(init);
        return ctx.lower_array_of("array", &elements, node);
    }
    let size = match node
        .first_of_kind("dimensions_expr")
        .and_then(|d| d.named_kids().into_iter().next())
    {
        Some(dim) => ctx.lower_expr(dim),
        None => ctx.const_value("0", SourceLocation::UNKNOWN),
    };
    ctx.emit_value(Opcode::NewArray, vec!["array".into(), size.into()], node.location())
}

/// `=` stores, `op=` reads, combines and stores
fn assignment_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let op = node.field("operator").map(|o| ctx.text(o));
    match op.as_deref() {
        Some("=") | None => assignments::assignment_expr(ctx, node),
        Some(_) => assignments::augmented_assignment_expr(ctx, node),
    }
}

/// `(T) value`: the value only
fn cast_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_last(ctx, node),
    }
}

/// `x instanceof T` -> `CALL_FUNCTION instanceof x "T"`
fn instanceof_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let parts = ctx.significant_children(node);
    let Some(operand) = node.field("left").or_else(|| parts.first().copied()) else {
        return expressions::const_literal(ctx, node);
    };
    let object = ctx.lower_expr(operand);
    let type_name = node
        .field("right")
        .or_else(|| parts.get(1).copied())
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "Object".to_string());
    let type_reg = ctx.const_value(type_name, SourceLocation::UNKNOWN);
    ctx.call_function("instanceof", vec![object, type_reg], node.location())
}

/// `Type::method` / `obj::method` as a field read of the method
fn method_reference(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let parts = ctx.significant_children(node);
    let Some(target) = parts.first().copied() else {
        return expressions::const_literal(ctx, node);
    };
    let object = ctx.lower_expr(target);
    let method = match parts.get(1) {
        Some(name) => ctx.text(*name),
        None => "new".to_string(),
    };
    ctx.emit_value(Opcode::LoadField, vec![object.into(), method.into()], node.location())
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// `int a = 1, b;` (locals and fields alike)
fn variable_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for declarator in node.field_all("declarator") {
        let Some(name) = declarator.field("name") else {
            ctx.malformed("declarator without a name", declarator);
            continue;
        };
        ctx.lower_declaration(name, declarator.field("value"), declarator);
    }
}

/// `for (T x : xs)` over the index-loop skeleton
fn enhanced_for(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let (Some(name), Some(iterable)) = (node.field("name"), node.field("value")) else {
        ctx.malformed("enhanced for without variable or iterable", node);
        return;
    };
    let body = node.field("body");
    let iter_reg = ctx.lower_expr(iterable);
    ctx.lower_index_loop(
        iter_reg,
        node,
        |ctx, elem, _| ctx.lower_store_target(name, elem, node),
        |ctx| ctx.lower_body(body),
    );
}

/// Constructors are bound under the shared constructor name
fn constructor_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let params = node.field("parameters");
    let body = node.field("body");
    ctx.lower_function_parts(CONSTRUCTOR_NAME, params, body, node);
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
        .filter(|m| !ctx.profile().is_skipped(m.kind()))
        .map(|m| match m.field("name") {
            Some(n) => ctx.text(n),
            None => {
                let text = ctx.text(m);
                text.chars().take(40).collect()
            }
        })
        .collect();
    ctx.lower_ordinal_object("interface", &name, &members, node);
}

/// Enum constants become ordinals; a body with methods is lowered too
fn enum_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let body = node.field("body");
    let members: Vec<String> = body
        .map(|b| b.named_kids())
        .unwrap_or_default()
        .into_iter()
        .filter(|c| c.kind() == "enum_constant")
        .map(|c| c.field("name").map(|n| ctx.text(n)).unwrap_or_else(|| ctx.text(c)))
        .collect();
    ctx.lower_ordinal_object("enum", &name, &members, node);
    if let Some(decls) = body.and_then(|b| b.first_of_kind("enum_body_declarations")) {
        ctx.lower_block(decls);
    }
}

/// Classic groups (`case 1: case 2: ...`) fall through; arrow rules do not
fn switch_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let subject = ctx.lower_opt_expr(node.field("condition"));
    let entries = node
        .field("body")
        .map(|b| b.named_kids())
        .unwrap_or_default();
    let mut arms = Vec::with_capacity(entries.len());
    let mut arrow_rules = false;
    for entry in entries {
        if !matches!(entry.kind(), "switch_block_statement_group" | "switch_rule") {
            continue;
        }
        arrow_rules |= entry.kind() == "switch_rule";
        let kids = entry.named_kids();
        let mut values = Vec::new();
        let mut is_default = false;
        for label in kids.iter().filter(|k| k.kind() == "switch_label") {
            let label_values = label.named_kids();
            if label_values.is_empty() {
                is_default = true;
            }
            values.extend(label_values);
        }
        if is_default {
            values.clear();
        }
        let body: Vec<Node<'_>> = kids
            .into_iter()
            .filter(|k| k.kind() != "switch_label" && !ctx.profile().is_skipped(k.kind()))
            .collect();
        arms.push((values, body));
    }
    let style = if arrow_rules {
        CaseStyle::Switch
    } else {
        CaseStyle::FallthroughSwitch
    };
    ctx.lower_case_chain(subject, &arms, style, node);
}

/// `try (R r = open()) { } catch (IOException | E e) { } finally { }`
fn try_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(resources) = node.field("resources") {
        for resource in resources.named_kids() {
            match (resource.field("name"), resource.field("value")) {
                (Some(name), value) => ctx.lower_declaration(name, value, resource),
                (None, _) => {
                    ctx.lower_expr(resource);
                }
            }
        }
    }
    let mut parts = TryParts {
        body: node.field("body"),
        ..TryParts::default()
    };
    for child in node.named_kids() {
        match child.kind() {
            "catch_clause" => {
                let param = child.first_of_kind("catch_formal_parameter");
                let variable = param.and_then(|p| p.field("name"));
                let exception_type = param.and_then(|p| {
                    p.named_kids()
                        .into_iter()
                        .find(|c| Some(c.id()) != variable.map(|v| v.id()) && c.kind() != "modifiers")
                });
                parts.catches.push(CatchClause {
                    variable,
                    exception_type,
                    body: child.field("body"),
                });
            }
            "finally_clause" => {
                parts.finally_body = child.field("body").or_else(|| child.first_of_kind("block"));
            }
            _ => {}
        }
    }
    ctx.lower_try(&parts, node);
}

fn labeled_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for child in ctx.significant_children(node) {
        if child.kind() != "identifier" {
            ctx.lower_stmt(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;

    fn dump(src: &str) -> Vec<String> {
        lower_with_language(LanguageId::Java, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    fn assert_supported(ir: &[String]) {
        let bad: Vec<&String> = ir.iter().filter(|l| l.contains("unsupported:")).collect();
        assert!(bad.is_empty(), "unsupported constructs: {:#?}", bad);
    }

    #[test]
    fn test_class_with_static_method() {
        let src = "class M {\n  static int fact(int n) {\n    if (n <= 1) { return 1; }\n    return n * fact(n - 1);\n  }\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("class_M_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func_fact_")));
        assert!(ir.contains(&"%0 = symbolic param:n".to_string()));
        assert!(ir.iter().any(|l| l.contains("call_function fact ")));
        assert!(ir.iter().any(|l| l.starts_with("store_var fact ")));
    }

    #[test]
    fn test_compound_assignment() {
        let ir = dump("class A { void f() { int s = 0; s += 2; } }\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("binop + ")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var s ")).count(), 2);
    }

    #[test]
    fn test_enhanced_for() {
        let ir = dump("class A { void f(int[] xs) { for (int x : xs) { t = t + x; } } }\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function len")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var x ")));
    }

    #[test]
    fn test_switch_groups_fall_through() {
        let src = "class A { void f(int k) { switch (k) { case 1: case 2: y = 1; break; default: y = 0; } } }\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop == ")).count(), 2, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("switch_end_")));
    }

    #[test]
    fn test_try_catch_type() {
        let src = "class A { void f() { try { g(); } catch (IOException e) { h(); } finally { k(); } } }\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("caught_exception:IOException")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var e ")));
    }

    #[test]
    fn test_arrays_and_objects() {
        let src = "class A { void f() { int[] a = {3, 4}; int[] b = new int[5]; P p = new P(1); a[0] = b[1]; } }\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("new_array array")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function P ")));
        assert!(ir.iter().any(|l| l.contains("load_index")));
        assert!(ir.iter().filter(|l| l.starts_with("store_index")).count() >= 3);
    }

    #[test]
    fn test_constructor_and_fields() {
        let src = "class P {\n  int x;\n  P(int x) { this.x = x; }\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.contains(&"%0 = const null".to_string()), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func___init___")));
        assert!(ir.iter().any(|l| l.starts_with("store_field") && l.contains(" x ")));
    }
}

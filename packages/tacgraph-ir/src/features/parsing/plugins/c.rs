//! C profile
//!
//! Declarators nest (`*name`, `name[4]`, `(*fp)(int)`), so names are dug out
//! through the `declarator` field chain. The C++ profile extends this table
//! and reuses the declarator helpers below.

use crate::features::lowering::domain::SyntaxNode;
use crate::features::lowering::infrastructure::control_flow::CaseStyle;
use crate::features::lowering::infrastructure::{
    assignments, control_flow, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

/// Preprocessor lines with no runtime meaning
const PREPROC_NOISE: &[&str] = &["preproc_include", "preproc_call", "preproc_directive"];

fn build() -> TableProfile {
    let mut noise = vec!["\n", ";", "storage_class_specifier", "type_qualifier", "attribute_specifier"];
    noise.extend_from_slice(PREPROC_NOISE);
    TableProfile::builder(LanguageId::C)
        .literals(Literals::new("true", "false", "NULL", "0"))
        .fields(FieldNames {
            attr_object: "argument",
            attr_member: "field",
            subscript_value: "argument",
            subscript_index: "index",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["comment"],
            noise,
            blocks: vec!["compound_statement", "translation_unit"],
            identifiers: vec!["identifier"],
            members: vec!["field_expression"],
            subscripts: vec!["subscript_expression"],
            patterns: vec![],
            argument_wrappers: vec![],
        })
        // Expressions
        .exprs(
            &["identifier", "type_identifier", "field_identifier", "primitive_type"],
            expressions::identifier,
        )
        .exprs(
            &[
                "number_literal",
                "string_literal",
                "char_literal",
                "concatenated_string",
                "system_lib_string",
                "preproc_arg",
            ],
            expressions::const_literal,
        )
        .expr("true", expressions::canonical_true)
        .expr("false", expressions::canonical_false)
        .expr("null", expressions::canonical_none)
        .expr("binary_expression", expressions::binop)
        .expr("unary_expression", expressions::unop)
        .expr("update_expression", expressions::update_expr)
        .expr("parenthesized_expression", expressions::paren)
        .expr("call_expression", expressions::call)
        .expr("field_expression", expressions::member_load)
        .expr("subscript_expression", expressions::subscript_load)
        .expr("assignment_expression", assignment_expression)
        .expr("cast_expression", cast_expression)
        .expr("pointer_expression", pointer_expression)
        .expr("sizeof_expression", sizeof_expression)
        .expr("conditional_expression", expressions::ternary)
        .expr("comma_expression", comma_expression)
        .expr("compound_literal_expression", compound_literal)
        .expr("initializer_list", initializer_list)
        .expr("initializer_pair", initializer_pair)
        // Statements
        .stmt("expression_statement", control_flow::statement_list)
        .stmt("compound_statement", control_flow::statement_list)
        .stmt("declaration", declaration)
        .stmt("return_statement", control_flow::return_statement)
        .stmt("if_statement", control_flow::if_statement)
        .stmt("while_statement", control_flow::while_statement)
        .stmt("do_statement", control_flow::do_while_statement)
        .stmt("for_statement", control_flow::c_for_statement)
        .stmt("switch_statement", switch_statement)
        .stmt("break_statement", control_flow::break_statement)
        .stmt("continue_statement", control_flow::continue_statement)
        .stmt("goto_statement", goto_statement)
        .stmt("labeled_statement", labeled_statement)
        .stmt("function_definition", function_definition)
        .stmts(&["struct_specifier", "union_specifier"], struct_specifier)
        .stmt("enum_specifier", enum_specifier)
        .stmt("type_definition", type_definition)
        .stmt("preproc_def", preproc_def)
        .stmt("preproc_function_def", preproc_function_def)
        .stmts(&["preproc_if", "preproc_ifdef", "preproc_else", "preproc_elif"], preproc_conditional)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Declarators
// ═══════════════════════════════════════════════════════════════════════════

/// Variable name under any declarator nesting
pub(super) fn declarator_name(ctx: &LoweringContext<'_>, node: Node<'_>) -> String {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "qualified_identifier"
        | "destructor_name" | "operator_name" => return ctx.text(node),
        _ => {}
    }
    if let Some(inner) = node.field("declarator") {
        return declarator_name(ctx, inner);
    }
    match node
        .named_kids()
        .into_iter()
        .find(|c| matches!(c.kind(), "identifier" | "field_identifier"))
    {
        Some(id) => ctx.text(id),
        None => ctx.text(node),
    }
}

/// The `function_declarator` inside pointer / reference wrappers
pub(super) fn find_function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "function_declarator" {
        return Some(node);
    }
    node.named_kids().into_iter().find_map(find_function_declarator)
}

/// One SYMBOLIC/STORE pair per named parameter; `void` and `...` bind nothing
pub(super) fn lower_c_params(ctx: &mut LoweringContext<'_>, params: Option<Node<'_>>) {
    let Some(params) = params else {
        return;
    };
    for param in params.named_kids() {
        match param.kind() {
            "parameter_declaration" | "optional_parameter_declaration" => {
                if let Some(decl) = param.field("declarator") {
                    let name = declarator_name(ctx, decl);
                    ctx.emit_param(&name, param.location());
                }
            }
            "identifier" => {
                let name = ctx.text(param);
                ctx.emit_param(&name, param.location());
            }
            _ => {}
        }
    }
}

/// `T name(params) { body }`
pub(super) fn function_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let declarator = node.field("declarator");
    let func_decl = declarator.and_then(find_function_declarator);
    let name = match (func_decl.and_then(|f| f.field("declarator")), declarator) {
        (Some(inner), _) => declarator_name(ctx, inner),
        (None, Some(decl)) => declarator_name(ctx, decl),
        (None, None) => ctx.anonymous_name(),
    };
    let params = func_decl.and_then(|f| f.field("parameters"));
    let body = node.field("body");
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        lower_c_params(ctx, params);
        ctx.lower_body(body);
    });
    ctx.store_var(&name, func_ref, node.location());
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `=` stores; `op=` reads, combines and stores back through the same target
fn assignment_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let op = node.field("operator").map(|o| ctx.text(o));
    match op.as_deref() {
        Some("=") | None => assignments::assignment_expr(ctx, node),
        Some(_) => assignments::augmented_assignment_expr(ctx, node),
    }
}

/// `(T) value`: the value only
pub(super) fn cast_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_last(ctx, node),
    }
}

/// `*p` reads the pointee as field `*`; `&x` is a UNOP
fn pointer_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let op = node
        .kids()
        .into_iter()
        .find(|c| !c.is_named())
        .map(|c| ctx.text(c))
        .unwrap_or_else(|| "*".to_string());
    let operand = node
        .field("argument")
        .or_else(|| node.named_kids().into_iter().next());
    let inner = ctx.lower_opt_expr(operand);
    if op == "&" {
        return ctx.emit_value(Opcode::Unop, vec!["&".into(), inner.into()], node.location());
    }
    ctx.emit_value(
        Opcode::LoadField,
        vec![inner.into(), assignments::DEREF_FIELD.into()],
        node.location(),
    )
}

/// `sizeof(T)` passes the type text, `sizeof x` the lowered operand
pub(super) fn sizeof_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let arg = match node.field("type").or_else(|| node.first_of_kind("type_descriptor")) {
        Some(t) => {
            let text = ctx.text(t);
            ctx.const_value(text, SourceLocation::UNKNOWN)
        }
        None => {
            let operand = node.field("value").or_else(|| node.named_kids().into_iter().next());
            ctx.lower_opt_expr(operand)
        }
    };
    ctx.call_function("sizeof", vec![arg], node.location())
}

/// `a, b`: both evaluated, the value is the right one
pub(super) fn comma_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let mut last = None;
    for part in ctx.significant_children(node) {
        last = Some(ctx.lower_expr(part));
    }
    match last {
        Some(reg) => reg,
        None => ctx.const_none(),
    }
}

/// `(struct P){1, 2}` -> NEW_OBJECT of the type, filled like an initializer
fn compound_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .field("type")
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "compound".to_string());
    let object = ctx.new_object(&type_name, node.location());
    if let Some(init) = node.field("value").or_else(|| node.first_of_kind("initializer_list")) {
        fill_initializer(ctx, object, init);
    }
    object
}

/// `{a, b}` -> NEW_ARRAY; designated `{.x = 1}` -> NEW_OBJECT with fields
fn initializer_list(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    if elements.iter().any(|e| e.kind() == "initializer_pair") {
        let object = ctx.new_object("struct", node.location());
        fill_initializer(ctx, object, node);
        return object;
    }
    ctx.lower_array_of("array", &elements, node)
}

/// Positional entries by index, `.field = v` by name, `[i] = v` by key
fn fill_initializer(ctx: &mut LoweringContext<'_>, object: Register, init: Node<'_>) {
    for (i, element) in ctx.significant_children(init).into_iter().enumerate() {
        if element.kind() != "initializer_pair" {
            let value = ctx.lower_expr(element);
            ctx.store_at(object, i, value);
            continue;
        }
        let designator = element.field("designator").or_else(|| element.named_kids().into_iter().next());
        let value = ctx.lower_opt_expr(element.field("value"));
        match designator {
            Some(d) if d.kind() == "subscript_designator" => {
                let key = match d.named_kids().into_iter().next() {
                    Some(k) => ctx.lower_expr(k),
                    None => ctx.const_value(i.to_string(), SourceLocation::UNKNOWN),
                };
                ctx.emit_effect(
                    Opcode::StoreIndex,
                    vec![object.into(), key.into(), value.into()],
                    element.location(),
                );
            }
            Some(d) => {
                let name = ctx.text(d);
                ctx.store_field(object, name.trim_start_matches('.'), value, element.location());
            }
            None => ctx.store_at(object, i, value),
        }
    }
}

/// A designated pair outside an initializer list: its value
fn initializer_pair(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_last(ctx, node),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// `int a = 1, *b, c[3];`; function prototypes declare nothing
pub(super) fn declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    if let Some(ty) = node.field("type") {
        if matches!(ty.kind(), "struct_specifier" | "union_specifier" | "enum_specifier" | "class_specifier")
            && ty.field("body").is_some()
        {
            ctx.lower_stmt(ty);
        }
    }
    for declarator in node.field_all("declarator") {
        match declarator.kind() {
            "init_declarator" => {
                let name = declarator
                    .field("declarator")
                    .map(|d| declarator_name(ctx, d))
                    .unwrap_or_else(|| ctx.anonymous_name());
                let value = match declarator.field("value") {
                    // `P p(1, 2);` constructs through the declared type
                    Some(args) if args.kind() == "argument_list" => {
                        let type_name = node
                            .field("type")
                            .map(|t| ctx.text(t))
                            .unwrap_or_else(|| "object".to_string());
                        let arg_regs = ctx.call_args(Some(args));
                        ctx.call_function(&type_name, arg_regs, declarator.location())
                    }
                    Some(v) => ctx.lower_expr(v),
                    None => ctx.const_none(),
                };
                ctx.store_var(name, value, declarator.location());
            }
            "function_declarator" => {}
            _ => {
                let name = declarator_name(ctx, declarator);
                let none = ctx.const_none();
                ctx.store_var(name, none, declarator.location());
            }
        }
    }
}

/// `case` bodies fall through until a `break`
pub(super) fn switch_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let subject = ctx.lower_opt_expr(node.field("condition"));
    let cases = node
        .field("body")
        .map(|b| b.named_kids())
        .unwrap_or_default();
    let mut arms = Vec::with_capacity(cases.len());
    for case in cases {
        if case.kind() != "case_statement" {
            continue;
        }
        let value = case.field("value");
        let body: Vec<Node<'_>> = case
            .named_kids()
            .into_iter()
            .filter(|c| Some(c.id()) != value.map(|v| v.id()) && !ctx.profile().is_skipped(c.kind()))
            .collect();
        arms.push((value.into_iter().collect::<Vec<_>>(), body));
    }
    ctx.lower_case_chain(subject, &arms, CaseStyle::FallthroughSwitch, node);
}

pub(super) fn goto_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node
        .field("label")
        .or_else(|| node.first_of_kind("statement_identifier"))
        .map(|l| ctx.text(l))
    else {
        ctx.malformed("goto without label", node);
        return;
    };
    let label = ctx.user_label(&name);
    ctx.emit_branch(&label);
}

pub(super) fn labeled_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("label")
        .or_else(|| node.first_of_kind("statement_identifier"))
        .map(|l| ctx.text(l))
        .unwrap_or_else(|| "label".to_string());
    let label = ctx.user_label(&name);
    ctx.emit_label(&label);
    ctx.lower_named_children_as_stmts(node, &["statement_identifier"]);
}

/// `struct P { int x; int *y; };` as a class whose fields default to none
fn struct_specifier(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(body) = node.field("body") else {
        return;
    };
    let name = match node.field("name") {
        Some(n) => ctx.text(n),
        None => ctx.anonymous_name(),
    };
    ctx.emit_class(&name, node, |ctx| {
        for member in body.named_kids() {
            match member.kind() {
                "field_declaration" => lower_struct_field(ctx, member),
                kind if ctx.profile().is_skipped(kind) => {}
                _ => ctx.lower_stmt(member),
            }
        }
    });
}

/// STORE_FIELD on `this` for every declarator of a member line
pub(super) fn lower_struct_field(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for declarator in node.field_all("declarator") {
        if declarator.kind() == "function_declarator" {
            continue;
        }
        let name = declarator_name(ctx, declarator);
        let value = match node.field("default_value") {
            Some(v) => ctx.lower_expr(v),
            None => ctx.const_none(),
        };
        let this = ctx.load_var("this", SourceLocation::UNKNOWN);
        ctx.store_field(this, &name, value, node.location());
    }
}

/// `enum E { A, B = 5 }`: explicit values are lowered, the rest count up
/// from the last explicit one
pub(super) fn enum_specifier(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(body) = node.field("body") else {
        return;
    };
    let name = match node.field("name") {
        Some(n) => ctx.text(n),
        None => ctx.anonymous_name(),
    };
    let object = ctx.new_object(&format!("enum:{}", name), node.location());
    let mut next_ordinal: Option<i64> = Some(0);
    for enumerator in body.named_kids() {
        if enumerator.kind() != "enumerator" {
            continue;
        }
        let Some(member) = enumerator.field("name").map(|n| ctx.text(n)) else {
            continue;
        };
        let value = match enumerator.field("value") {
            Some(v) => {
                next_ordinal = ctx.text(v).trim().parse::<i64>().ok().map(|n| n + 1);
                ctx.lower_expr(v)
            }
            None => {
                let ordinal = next_ordinal.unwrap_or(0);
                next_ordinal = Some(ordinal + 1);
                ctx.const_value(ordinal.to_string(), SourceLocation::UNKNOWN)
            }
        };
        ctx.store_field(object, &member, value, enumerator.location());
    }
    ctx.store_var(&name, object, node.location());
}

/// `typedef T Alias;` binds the alias to the type's text
pub(super) fn type_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let ty = node.field("type");
    if let Some(t) = ty.filter(|t| t.field("body").is_some()) {
        ctx.lower_stmt(t);
    }
    let type_text = ty.map(|t| {
        let text = ctx.text(t);
        match t.field("name") {
            Some(n) if t.field("body").is_some() => ctx.text(n),
            _ => text,
        }
    });
    for declarator in node.field_all("declarator") {
        let alias = declarator_name(ctx, declarator);
        let value = ctx.const_value(
            type_text.clone().unwrap_or_else(|| "unknown_type".to_string()),
            node.location(),
        );
        ctx.store_var(alias, value, node.location());
    }
}

/// `#define N 10` binds `N`; a bare `#define FLAG` binds none
pub(super) fn preproc_def(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let value = match node.field("value") {
        Some(v) => {
            let text = ctx.text(v).trim().to_string();
            ctx.const_value(text, node.location())
        }
        None => ctx.const_none(),
    };
    ctx.store_var(name, value, node.location());
}

/// `#define MAX(a, b) (...)` as a function returning the macro text
pub(super) fn preproc_function_def(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "__macro".to_string());
    let params = node.field("parameters");
    let value = node.field("value");
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        lower_c_params(ctx, params);
        if let Some(v) = value {
            let reg = expressions::const_literal(ctx, v);
            ctx.emit_effect(Opcode::Return, vec![reg.into()], v.location());
        }
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// `#if` / `#ifdef` arms: every branch's code is lowered in order
pub(super) fn preproc_conditional(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let skip: Vec<usize> = ["name", "condition"]
        .iter()
        .filter_map(|f| node.field(f))
        .map(|n| n.id())
        .collect();
    for child in node.named_kids() {
        if !skip.contains(&child.id()) {
            ctx.lower_stmt(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;
    use pretty_assertions::assert_eq;

    fn dump(src: &str) -> Vec<String> {
        lower_with_language(LanguageId::C, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    fn assert_supported(ir: &[String]) {
        let bad: Vec<&String> = ir.iter().filter(|l| l.contains("unsupported:")).collect();
        assert!(bad.is_empty(), "unsupported constructs: {:#?}", bad);
    }

    #[test]
    fn test_function_with_pointer_param() {
        let ir = dump("int get(int *p) {\n  return *p;\n}\n");
        assert_supported(&ir);
        assert_eq!(
            ir,
            vec![
                "entry:",
                "branch end_get_1",
                "func_get_0:",
                "%0 = symbolic param:p",
                "store_var p %0",
                "%1 = load_var p",
                "%2 = load_field %1 *",
                "return %2",
                "%3 = const 0",
                "return %3",
                "end_get_1:",
                "%4 = const <function:get@func_get_0>",
                "store_var get %4",
            ]
        );
    }

    #[test]
    fn test_declaration_without_initializer_stores_none() {
        let ir = dump("int a = 1, b;\n");
        assert_supported(&ir);
        assert_eq!(
            ir,
            vec!["entry:", "%0 = const 1", "store_var a %0", "%1 = const NULL", "store_var b %1"]
        );
    }

    #[test]
    fn test_deref_store_writes_through_pointer() {
        let ir = dump("void f(int *p) { *p = 3; }\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("store_field") && l.contains(" * ")), "{:#?}", ir);
        assert!(!ir.iter().any(|l| l.starts_with("store_var *p")));
    }

    #[test]
    fn test_switch_falls_through() {
        let src = "void f(int k) { switch (k) { case 1: a(); case 2: b(); break; default: c(); } }\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop == ")).count(), 2, "{:#?}", ir);
        let first_body = ir.iter().position(|l| l.contains("call_function a")).unwrap_or(0);
        assert!(ir[first_body + 1].starts_with("branch case_body_"), "{:#?}", ir);
    }

    #[test]
    fn test_struct_and_enum() {
        let ir = dump("struct P { int x; int y; };\nenum Color { RED, GREEN = 5, BLUE };\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("class_P_")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_field")).count(), 5);
        assert!(ir.iter().any(|l| l.contains("new_object enum:Color")));
        assert!(ir.iter().any(|l| l.ends_with("= const 6")), "{:#?}", ir);
    }

    #[test]
    fn test_for_loop_and_goto() {
        let src = "void f() {\n  for (int i = 0; i < 3; i++) { s += i; }\nagain:\n  goto again;\n}\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("for_cond_")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("for_update_")));
        assert!(ir.iter().any(|l| l.starts_with("label_again_") && l.ends_with(':')));
        assert!(ir.iter().any(|l| l.starts_with("branch label_again_")));
    }

    #[test]
    fn test_initializers_and_sizeof() {
        let src = "int a[] = {1, 2};\nstruct P p = {.x = 1};\nint n = sizeof(int);\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("new_array array")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_field") && l.contains(" x ")));
        assert!(ir.iter().any(|l| l.contains("call_function sizeof")));
    }

    #[test]
    fn test_macros() {
        let ir = dump("#define N 10\n#define SQ(x) ((x) * (x))\n");
        assert_supported(&ir);
        assert!(ir.contains(&"%0 = const 10".to_string()), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("func_SQ_")));
        assert!(ir.contains(&"store_var N %0".to_string()));
    }
}

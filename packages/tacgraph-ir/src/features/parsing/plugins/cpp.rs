//! C++ profile
//!
//! Extends the C tables with classes, namespaces, templates, `new`/`delete`,
//! lambdas, range-for and exceptions.

use super::c;
use crate::features::lowering::domain::{CatchClause, SyntaxNode, TryParts};
use crate::features::lowering::infrastructure::{control_flow, expressions, LoweringContext, TableProfile};
use crate::features::lowering::ports::Literals;
use crate::features::parsing::ports::LanguageId;
use crate::shared::constants::CONSTRUCTOR_NAME;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

fn build() -> TableProfile {
    c::PROFILE
        .extend(LanguageId::Cpp)
        .literals(Literals::new("true", "false", "nullptr", "0"))
        .map_kinds(|kinds| {
            kinds.blocks.push("declaration_list");
            kinds.identifiers.extend(["qualified_identifier", "template_function", "this"]);
            kinds.noise.extend([
                "access_specifier",
                "using_declaration",
                "alias_declaration",
                "static_assert_declaration",
                "friend_declaration",
                "namespace_alias_definition",
                "virtual_specifier",
            ]);
        })
        .exprs(
            &["qualified_identifier", "template_function", "scoped_identifier", "this", "auto"],
            expressions::identifier,
        )
        .expr("nullptr", expressions::canonical_none)
        .exprs(&["user_defined_literal", "raw_string_literal"], expressions::const_literal)
        .expr("condition_clause", condition_clause)
        .expr("subscript_argument_list", subscript_arguments)
        .expr("new_expression", new_expression)
        .expr("delete_expression", delete_expression)
        .expr("lambda_expression", lambda_expression)
        .expr("throw_expression", throw_expression)
        .exprs(
            &[
                "static_cast_expression",
                "dynamic_cast_expression",
                "reinterpret_cast_expression",
                "const_cast_expression",
            ],
            c::cast_expression,
        )
        .stmt("function_definition", function_definition)
        .stmts(&["class_specifier", "struct_specifier", "union_specifier"], class_specifier)
        .stmt("namespace_definition", namespace_definition)
        .stmt("template_declaration", template_declaration)
        .stmt("for_range_loop", range_for)
        .stmt("try_statement", try_statement)
        .stmt("throw_statement", control_flow::throw_statement)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `[j + 1]` of `a[j + 1]`: the index itself, for loads and store targets alike
fn subscript_arguments(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let indices = ctx.significant_children(node);
    if indices.len() != 1 {
        ctx.malformed("subscript with other than one index", node);
    }
    ctx.lower_opt_expr(indices.first().copied())
}

/// `if (auto x = f(); x > 0)`: the initializer runs first, the value decides
fn condition_clause(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    if let Some(init) = node.field("initializer") {
        ctx.lower_stmt(init);
    }
    match node.field("value") {
        Some(value) if value.kind() == "declaration" => {
            c::declaration(ctx, value);
            let name = value
                .field("declarator")
                .map(|d| c::declarator_name(ctx, d))
                .unwrap_or_else(|| ctx.text(value));
            ctx.load_var(name, node.location())
        }
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_last(ctx, node),
    }
}

/// `new T(args)` -> a call to the type by name
fn new_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let type_name = node
        .field("type")
        .map(|t| ctx.text(t))
        .unwrap_or_else(|| "object".to_string());
    let args = ctx.call_args(node.field("arguments"));
    ctx.call_function(&type_name, args, node.location())
}

/// `delete p` / `delete[] p` -> `CALL_FUNCTION delete p`
fn delete_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operands = ctx.significant_children(node);
    ctx.lower_intrinsic("delete", &operands, node)
}

/// `[captures](params) { body }` / `[](int x) { return x; }`
fn lambda_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let params = node.field("declarator").and_then(|d| d.field("parameters"));
    let body = node.field("body");
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        c::lower_c_params(ctx, params);
        ctx.lower_function_body(body);
    })
}

/// `throw` in expression position; the value is the none literal
fn throw_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    control_flow::throw_statement(ctx, node);
    ctx.const_none()
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// Free functions, methods and constructors
///
/// A method named after its enclosing class is its constructor; the member
/// initializer list stores onto `this` before the body runs.
fn function_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let declarator = node.field("declarator");
    let func_decl = declarator.and_then(c::find_function_declarator);
    let mut name = match (func_decl.and_then(|f| f.field("declarator")), declarator) {
        (Some(inner), _) => c::declarator_name(ctx, inner),
        (None, Some(decl)) => c::declarator_name(ctx, decl),
        (None, None) => ctx.anonymous_name(),
    };
    if enclosing_class_name(ctx, node).as_deref() == Some(name.as_str()) {
        name = CONSTRUCTOR_NAME.to_string();
    }
    let params = func_decl.and_then(|f| f.field("parameters"));
    let initializers = node.first_of_kind("field_initializer_list");
    let body = node.field("body");
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        c::lower_c_params(ctx, params);
        if let Some(list) = initializers {
            lower_field_initializers(ctx, list);
        }
        ctx.lower_body(body);
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// Name of the class whose body directly holds `node`
fn enclosing_class_name(ctx: &LoweringContext<'_>, node: Node<'_>) -> Option<String> {
    let body = node.parent().filter(|p| p.kind() == "field_declaration_list")?;
    let class = body
        .parent()
        .filter(|p| matches!(p.kind(), "class_specifier" | "struct_specifier"))?;
    class.field("name").map(|n| ctx.text(n))
}

/// `: x(a), y{b}` -> STORE_FIELD on `this` per member
fn lower_field_initializers(ctx: &mut LoweringContext<'_>, list: Node<'_>) {
    let this = ctx.load_var("this", list.location());
    for init in list.named_kids() {
        if init.kind() != "field_initializer" {
            continue;
        }
        let Some(field) = init
            .named_kids()
            .into_iter()
            .find(|c| matches!(c.kind(), "field_identifier" | "identifier" | "qualified_identifier"))
        else {
            continue;
        };
        let field_name = ctx.text(field);
        let value = init
            .named_kids()
            .into_iter()
            .find(|c| matches!(c.kind(), "argument_list" | "initializer_list"))
            .and_then(|args| ctx.significant_children(args).into_iter().next());
        let value_reg = ctx.lower_opt_expr(value);
        ctx.store_field(this, &field_name, value_reg, init.location());
    }
}

/// `class P : Base { public: int x; P(int v) : x(v) {} int get(); };`
fn class_specifier(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
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
                "field_declaration" => {
                    let declares_method = member
                        .field_all("declarator")
                        .iter()
                        .all(|d| d.kind() == "function_declarator");
                    if !declares_method {
                        c::lower_struct_field(ctx, member);
                    }
                }
                // Constructor prototypes
                "declaration"
                    if member
                        .field_all("declarator")
                        .iter()
                        .all(|d| d.kind() == "function_declarator") => {}
                kind if ctx.profile().is_skipped(kind) => {}
                _ => ctx.lower_stmt(member),
            }
        }
    });
}

fn namespace_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    ctx.lower_body(node.field("body"));
}

/// `template <typename T> decl`: the declaration itself
fn template_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let inner = node
        .named_kids()
        .into_iter()
        .filter(|c| !matches!(c.kind(), "template_parameter_list" | "requires_clause"))
        .last();
    match inner {
        Some(decl) => ctx.lower_stmt(decl),
        None => {
            ctx.symbolic("template", node.location());
        }
    }
}

/// `for (auto x : xs)` / `for (auto [k, v] : m)` over the index-loop skeleton
fn range_for(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(iterable) = node.field("right") else {
        ctx.malformed("range-for without a range", node);
        return;
    };
    let declarator = node.field("declarator");
    let body = node.field("body");
    let iter_reg = ctx.lower_expr(iterable);
    ctx.lower_index_loop(
        iter_reg,
        node,
        |ctx, elem, _| match declarator {
            Some(d) if d.kind() == "structured_binding_declarator" => {
                for (i, part) in d.named_kids().into_iter().enumerate() {
                    let idx = ctx.const_value(i.to_string(), SourceLocation::UNKNOWN);
                    let item = ctx.emit_value(Opcode::LoadIndex, vec![elem.into(), idx.into()], part.location());
                    let part_name = c::declarator_name(ctx, part);
                    ctx.store_var(part_name, item, part.location());
                }
            }
            Some(d) => {
                let var = c::declarator_name(ctx, d);
                ctx.store_var(var, elem, node.location());
            }
            None => {}
        },
        |ctx| ctx.lower_body(body),
    );
}

/// `try { } catch (const E& e) { } catch (...) { }`
fn try_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut parts = TryParts {
        body: node.field("body"),
        ..TryParts::default()
    };
    for clause in node.named_kids() {
        if clause.kind() != "catch_clause" {
            continue;
        }
        let param = clause
            .field("parameters")
            .and_then(|p| p.first_of_kind("parameter_declaration"))
            .or_else(|| clause.first_of_kind("catch_declarator"));
        let variable = param.and_then(|p| p.field("declarator")).map(|d| innermost_identifier(d));
        let exception_type = param.and_then(|p| p.field("type"));
        parts.catches.push(CatchClause {
            variable,
            exception_type,
            body: clause.field("body"),
        });
    }
    ctx.lower_try(&parts, node);
}

/// The identifier under reference / pointer declarators
fn innermost_identifier(node: Node<'_>) -> Node<'_> {
    if node.kind() == "identifier" {
        return node;
    }
    node.field("declarator")
        .or_else(|| node.named_kids().into_iter().find(|c| c.kind() != "type_qualifier"))
        .map(innermost_identifier)
        .unwrap_or(node)
}

//! TypeScript profile
//!
//! Extends the JavaScript tables. Type-only syntax (annotations, aliases,
//! `as` / `satisfies` / `!`) lowers to the underlying value; interfaces and
//! enums become objects keyed by member name.

use super::javascript;
use crate::features::lowering::domain::SyntaxNode;
use crate::features::lowering::infrastructure::{
    control_flow, definitions, expressions, LoweringContext, TableProfile,
};
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::Register;
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

fn build() -> TableProfile {
    javascript::PROFILE
        .extend(LanguageId::TypeScript)
        .map_kinds(|kinds| {
            kinds.identifiers.push("type_identifier");
            kinds.noise.push("type_annotation");
        })
        .expr("type_identifier", expressions::identifier)
        .expr("predefined_type", expressions::const_literal)
        .exprs(
            &["as_expression", "satisfies_expression", "non_null_expression", "type_assertion"],
            type_erased,
        )
        .stmt("interface_declaration", interface_declaration)
        .stmt("enum_declaration", enum_declaration)
        .stmt("abstract_class_declaration", definitions::class_def)
        .stmt("public_field_definition", javascript::field_definition)
        .stmt("abstract_method_signature", abstract_method)
        .stmts(&["internal_module", "module"], namespace)
        .stmts(
            &[
                "type_alias_declaration",
                "ambient_declaration",
                "import_alias",
                "method_signature",
                "index_signature",
                "property_signature",
                "function_signature",
            ],
            control_flow::ignore,
        )
        .build()
}

/// `x as T`, `x satisfies T`, `x!`, `<T>x`: the value operand only
fn type_erased(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operand = node
        .named_kids()
        .into_iter()
        .find(|c| {
            !matches!(
                c.kind(),
                "type_annotation" | "type_arguments" | "predefined_type" | "type_identifier"
            )
        })
        .or_else(|| node.named_kids().into_iter().next());
    match operand {
        Some(inner) => ctx.lower_expr(inner),
        None => expressions::const_literal(ctx, node),
    }
}

/// `interface I { a: T; b(): U }` -> `NEW_OBJECT interface:I` keyed by member
fn interface_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let members: Vec<String> = node
        .field("body")
        .map(|body| body.named_kids())
        .unwrap_or_default()
        .into_iter()
        .map(|member| {
            member
                .field("name")
                .map(|n| ctx.text(n))
                .unwrap_or_else(|| leading_name(&ctx.text(member), ':'))
        })
        .collect();
    ctx.lower_ordinal_object("interface", &name, &members, node);
}

/// `enum Color { Red, Green = 2 }` -> `NEW_OBJECT enum:Color` with ordinals
fn enum_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let members: Vec<String> = node
        .field("body")
        .map(|body| body.named_kids())
        .unwrap_or_default()
        .into_iter()
        .map(|member| leading_name(&ctx.text(member), '='))
        .collect();
    ctx.lower_ordinal_object("enum", &name, &members, node);
}

fn leading_name(text: &str, stop: char) -> String {
    text.split(stop).next().unwrap_or(text).trim().to_string()
}

/// `abstract speak(): string;` -> an empty function stub
fn abstract_method(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "__abstract".to_string());
    ctx.lower_function_parts(&name, None, None, node);
}

/// `namespace N { ... }`: the body's statements in place
fn namespace(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    ctx.lower_body(node.field("body"));
}

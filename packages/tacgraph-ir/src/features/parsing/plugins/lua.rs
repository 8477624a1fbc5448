//! Lua profile

use crate::features::lowering::domain::SyntaxNode;
use crate::features::lowering::infrastructure::{control_flow, expressions, LoweringContext, TableProfile};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{Opcode, Operand, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

/// Iterator factories a generic `for` looks through
const ITERATOR_FACTORIES: &[&str] = &["pairs", "ipairs"];

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Lua)
        .literals(Literals::new("true", "false", "nil", "nil"))
        .fields(FieldNames {
            call_function: "name",
            attr_object: "table",
            attr_member: "field",
            subscript_value: "table",
            subscript_index: "field",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["comment"],
            noise: vec!["\n", ";", "hash_bang_line", "empty_statement", "attribute"],
            blocks: vec!["chunk", "block"],
            identifiers: vec!["identifier"],
            members: vec!["dot_index_expression"],
            subscripts: vec!["bracket_index_expression"],
            patterns: vec![],
            argument_wrappers: vec![],
        })
        // Expressions
        .expr("identifier", expressions::identifier)
        .exprs(&["number", "string"], expressions::const_literal)
        .expr("true", expressions::canonical_true)
        .expr("false", expressions::canonical_false)
        .expr("nil", expressions::canonical_none)
        .expr("vararg_expression", expressions::symbolic_node)
        .expr("binary_expression", expressions::binop)
        .expr("unary_expression", expressions::unop)
        .expr("parenthesized_expression", expressions::paren)
        .expr("function_call", function_call)
        .expr("dot_index_expression", expressions::member_load)
        .expr("bracket_index_expression", expressions::subscript_load)
        .expr("table_constructor", table_constructor)
        .expr("function_definition", function_definition)
        .expr("expression_list", expressions::unwrap_first)
        // Statements
        .stmt("variable_declaration", variable_declaration)
        .stmt("assignment_statement", assignment_statement)
        .stmt("function_declaration", function_declaration)
        .stmt("if_statement", control_flow::if_statement)
        .stmt("while_statement", control_flow::while_statement)
        .stmt("repeat_statement", repeat_statement)
        .stmt("for_statement", for_statement)
        .stmt("return_statement", return_statement)
        .stmt("break_statement", control_flow::break_statement)
        .stmt("do_statement", do_statement)
        .stmt("goto_statement", goto_statement)
        .stmt("label_statement", label_statement)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `f(a)`, `t.f(a)`, `obj:m(a)`, `f"str"`, `f{table}`
fn function_call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let callee = node.field("name");
    let args = node.field("arguments");
    let Some(method) = callee.filter(|c| c.kind() == "method_index_expression") else {
        return lower_call(ctx, callee, args, node);
    };
    let (Some(table), Some(name)) = (method.field("table"), method.field("method")) else {
        ctx.malformed("method call without receiver or name", method);
        return lower_call(ctx, None, args, node);
    };
    let receiver = ctx.lower_expr(table);
    let method_name = ctx.text(name);
    let regs = call_arguments(ctx, args);
    ctx.call_method(receiver, &method_name, regs, node.location())
}

fn lower_call(
    ctx: &mut LoweringContext<'_>,
    callee: Option<Node<'_>>,
    args: Option<Node<'_>>,
    node: Node<'_>,
) -> Register {
    if args.is_some_and(|a| a.kind() == "arguments") {
        return ctx.lower_call_parts(callee, args, node);
    }
    // `f"s"` / `f{..}`: the string or table is the single argument
    let regs = call_arguments(ctx, args);
    let loc = node.location();
    match callee {
        Some(c) if c.kind() == "identifier" => {
            let name = ctx.text(c);
            ctx.call_function(&name, regs, loc)
        }
        Some(c) if c.kind() == "dot_index_expression" => match ctx.member_parts(c) {
            Some((obj, member)) => {
                let obj_reg = ctx.lower_expr(obj);
                let name = ctx.text(member);
                ctx.call_method(obj_reg, &name, regs, loc)
            }
            None => {
                let target = ctx.lower_expr(c);
                ctx.call_unknown(target, regs, loc)
            }
        },
        Some(c) => {
            let target = ctx.lower_expr(c);
            ctx.call_unknown(target, regs, loc)
        }
        None => {
            let target = ctx.symbolic("unknown_call_target", loc);
            ctx.call_unknown(target, regs, loc)
        }
    }
}

fn call_arguments(ctx: &mut LoweringContext<'_>, args: Option<Node<'_>>) -> Vec<Register> {
    match args {
        Some(a) if a.kind() == "arguments" => ctx.call_args(Some(a)),
        Some(a) => vec![ctx.lower_expr(a)],
        None => Vec::new(),
    }
}

/// `{1, 2, x = 3, ["k"] = 4}`
///
/// Positional entries are stored at 1-based indices, `name = v` entries as
/// fields and `[expr] = v` entries at the lowered key.
fn table_constructor(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let table = ctx.new_object("table", node.location());
    let mut position = 1usize;
    for entry in node.named_kids() {
        if entry.kind() != "field" {
            continue;
        }
        let Some(value) = entry.field("value") else {
            continue;
        };
        let loc = entry.location();
        match entry.field("name") {
            Some(key) if is_bracketed_key(ctx, entry) => {
                let key_reg = ctx.lower_expr(key);
                let value_reg = ctx.lower_expr(value);
                ctx.emit_effect(
                    Opcode::StoreIndex,
                    vec![table.into(), key_reg.into(), value_reg.into()],
                    loc,
                );
            }
            Some(key) => {
                let name = ctx.text(key);
                let value_reg = ctx.lower_expr(value);
                ctx.store_field(table, &name, value_reg, loc);
            }
            None => {
                let idx = ctx.const_value(position.to_string(), SourceLocation::UNKNOWN);
                let value_reg = ctx.lower_expr(value);
                ctx.emit_effect(
                    Opcode::StoreIndex,
                    vec![table.into(), idx.into(), value_reg.into()],
                    loc,
                );
                position += 1;
            }
        }
    }
    table
}

fn is_bracketed_key(ctx: &LoweringContext<'_>, entry: Node<'_>) -> bool {
    entry
        .kids()
        .into_iter()
        .next()
        .is_some_and(|first| !first.is_named() && ctx.text(first) == "[")
}

/// `function(a, b) .. end`
fn function_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let params = node.field("parameters");
    let body = node.field("body");
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        ctx.lower_params(params);
        ctx.lower_body(body);
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Assignment
// ═══════════════════════════════════════════════════════════════════════════

/// `local a, b = x, y` / `local a`
fn variable_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for child in ctx.significant_children(node) {
        match child.kind() {
            "assignment_statement" => assignment_statement(ctx, child),
            "variable_list" => {
                for name in child.named_kids() {
                    if name.kind() == "identifier" {
                        ctx.lower_declaration(name, None, node);
                    }
                }
            }
            _ => {}
        }
    }
}

/// `a, b = x, y`: every value is lowered before any store
///
/// Missing values are nil, except that a trailing call spreads its results
/// over the remaining targets.
fn assignment_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let targets: Vec<Node<'_>> = node
        .first_of_kind("variable_list")
        .map(|list| list.named_kids())
        .unwrap_or_default()
        .into_iter()
        .filter(|t| t.kind() != "attribute")
        .collect();
    let values: Vec<Node<'_>> = node
        .first_of_kind("expression_list")
        .map(|list| list.named_kids())
        .unwrap_or_default();
    if targets.is_empty() {
        ctx.malformed("assignment without targets", node);
        return;
    }

    let regs: Vec<Register> = values.iter().map(|v| ctx.lower_expr(*v)).collect();
    let spread = values.last().filter(|v| v.kind() == "function_call").and(regs.last().copied());
    for (i, target) in targets.iter().enumerate() {
        let value = match (regs.get(i), spread) {
            (Some(reg), _) => *reg,
            (None, Some(results)) => {
                let offset = i + 1 - regs.len();
                let idx = ctx.const_value(offset.to_string(), SourceLocation::UNKNOWN);
                ctx.emit_value(Opcode::LoadIndex, vec![results.into(), idx.into()], target.location())
            }
            (None, None) => ctx.const_none(),
        };
        ctx.lower_store_target(*target, value, node);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Functions
// ═══════════════════════════════════════════════════════════════════════════

/// `function f()`, `local function f()`, `function M.f()`, `function Obj:m()`
///
/// Methods receive an implicit leading `self` parameter.
fn function_declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let params = node.field("parameters");
    let body = node.field("body");
    let Some(name_node) = node.field("name") else {
        ctx.malformed("function declaration without name", node);
        return;
    };

    match name_node.kind() {
        "method_index_expression" => {
            let (Some(table), Some(method)) = (name_node.field("table"), name_node.field("method")) else {
                ctx.malformed("method declaration without receiver or name", name_node);
                return;
            };
            let name = ctx.text(method);
            let func_ref = ctx.emit_function(&name, node, |ctx| {
                ctx.emit_param("self", name_node.location());
                ctx.lower_params(params);
                ctx.lower_body(body);
            });
            let receiver = ctx.lower_expr(table);
            ctx.store_field(receiver, &name, func_ref, node.location());
        }
        "dot_index_expression" => {
            let name = name_node
                .field("field")
                .map(|f| ctx.text(f))
                .unwrap_or_else(|| ctx.text(name_node));
            let func_ref = ctx.emit_function(&name, node, |ctx| {
                ctx.lower_params(params);
                ctx.lower_body(body);
            });
            ctx.lower_store_target(name_node, func_ref, node);
        }
        _ => {
            let name = ctx.text(name_node);
            ctx.lower_function_parts(&name, params, body, node);
        }
    }
}

/// `return` / `return x` / `return a, b` (a tuple)
fn return_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let values: Vec<Node<'_>> = match node.first_of_kind("expression_list") {
        Some(list) => ctx.significant_children(list),
        None => ctx.significant_children(node),
    };
    match values.as_slice() {
        [] => ctx.lower_return(None, node),
        [single] => ctx.lower_return(Some(*single), node),
        many => {
            let tuple = ctx.lower_array_of("tuple", many, node);
            ctx.emit_effect(Opcode::Return, vec![Operand::from(tuple)], node.location());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Control flow
// ═══════════════════════════════════════════════════════════════════════════

/// `repeat .. until cond`: the body runs first and the loop exits once cond holds
fn repeat_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    ctx.lower_do_while_parts(node.field("body"), node.field("condition"), true, node);
}

fn do_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    match node.field("body") {
        Some(body) => ctx.lower_body(Some(body)),
        None => ctx.lower_named_children_as_stmts(node, &[]),
    }
}

fn goto_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(name) = node.first_of_kind("identifier").map(|n| ctx.text(n)) else {
        ctx.malformed("goto without label", node);
        return;
    };
    let label = ctx.user_label(&name);
    ctx.emit_branch(&label);
}

/// `::name::`
fn label_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .first_of_kind("identifier")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.text(node).trim_matches(':').trim().to_string());
    let label = ctx.user_label(&name);
    ctx.emit_label(&label);
}

fn for_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body = node.field("body");
    let clause = node
        .field("clause")
        .or_else(|| node.first_of_kind("for_numeric_clause"))
        .or_else(|| node.first_of_kind("for_generic_clause"));
    match clause {
        Some(c) if c.kind() == "for_numeric_clause" => numeric_for(ctx, c, body, node),
        Some(c) if c.kind() == "for_generic_clause" => generic_for(ctx, c, body, node),
        _ => {
            ctx.malformed("for without clause", node);
            ctx.lower_body(body);
        }
    }
}

/// `for i = start, stop [, step]`
///
/// Without a step the loop counts up by one. A step written as a negative
/// literal counts down and compares with `>=`; any other step adds itself
/// and compares with `<=`.
fn numeric_for(ctx: &mut LoweringContext<'_>, clause: Node<'_>, body: Option<Node<'_>>, node: Node<'_>) {
    let var = clause
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "__for_var".to_string());
    let start = ctx.lower_opt_expr(clause.field("start"));
    let stop = ctx.lower_opt_expr(clause.field("end"));
    let Some(step_node) = clause.field("step") else {
        ctx.lower_range_loop(&var, start, stop, true, false, node, |ctx| ctx.lower_body(body));
        return;
    };
    let descending = ctx.text(step_node).trim_start().starts_with('-');
    let step = ctx.lower_expr(step_node);
    let loc = node.location();
    ctx.store_var(&var, start, loc);

    let cond_label = ctx.fresh_label("for_cond");
    let body_label = ctx.fresh_label("for_body");
    let update_label = ctx.fresh_label("for_update");
    let end_label = ctx.fresh_label("for_end");

    ctx.emit_label(&cond_label);
    let current = ctx.load_var(&var, SourceLocation::UNKNOWN);
    let in_range = ctx.binop(if descending { ">=" } else { "<=" }, current, stop, loc);
    ctx.emit_branch_if(in_range, &body_label, &end_label, loc);

    ctx.emit_label(&body_label);
    ctx.push_loop(&update_label, &end_label);
    ctx.lower_body(body);
    ctx.pop_loop();

    ctx.emit_label(&update_label);
    let current = ctx.load_var(&var, SourceLocation::UNKNOWN);
    let next = ctx.binop("+", current, step, SourceLocation::UNKNOWN);
    ctx.store_var(&var, next, SourceLocation::UNKNOWN);
    ctx.emit_branch(&cond_label);

    ctx.emit_label(&end_label);
}

/// `for k, v in pairs(t)` / `for _, x in ipairs(xs)` / `for x in iter`
///
/// Iterates the table by index: with two names the first gets the index
/// and the second the element, with one name it gets the element.
fn generic_for(ctx: &mut LoweringContext<'_>, clause: Node<'_>, body: Option<Node<'_>>, node: Node<'_>) {
    let names: Vec<Node<'_>> = clause
        .first_of_kind("variable_list")
        .map(|list| list.named_kids())
        .unwrap_or_default()
        .into_iter()
        .filter(|n| n.kind() == "identifier")
        .collect();
    let source = clause
        .first_of_kind("expression_list")
        .and_then(|list| ctx.significant_children(list).into_iter().next());
    let Some(source) = source else {
        ctx.malformed("generic for without iterator expression", clause);
        ctx.lower_body(body);
        return;
    };
    let iterable = match iterated_table(ctx, source) {
        Some(table) => ctx.lower_expr(table),
        None => ctx.lower_expr(source),
    };
    ctx.lower_index_loop(
        iterable,
        node,
        |ctx, elem, idx| match names.as_slice() {
            [] => {}
            [only] => ctx.lower_store_target(*only, elem, node),
            [key, value, ..] => {
                ctx.lower_store_target(*key, idx, node);
                ctx.lower_store_target(*value, elem, node);
            }
        },
        |ctx| ctx.lower_body(body),
    );
}

/// The table inside `pairs(t)` / `ipairs(t)`
fn iterated_table<'t>(ctx: &LoweringContext<'_>, source: Node<'t>) -> Option<Node<'t>> {
    if source.kind() != "function_call" {
        return None;
    }
    let callee = source.field("name")?;
    if !ITERATOR_FACTORIES.contains(&ctx.text(callee).as_str()) {
        return None;
    }
    let args = ctx.significant_children(source.field("arguments")?);
    match args.as_slice() {
        [table] => Some(*table),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;
    use pretty_assertions::assert_eq;

    fn dump(src: &str) -> Vec<String> {
        lower_with_language(LanguageId::Lua, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    fn assert_supported(ir: &[String]) {
        let bad: Vec<&String> = ir.iter().filter(|l| l.contains("unsupported:")).collect();
        assert!(bad.is_empty(), "unsupported constructs: {:#?}", bad);
    }

    #[test]
    fn test_function_declaration() {
        let ir = dump("function add(a, b)\n  return a + b\nend\n");
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
                "%5 = const nil",
                "return %5",
                "end_add_1:",
                "%6 = const <function:add@func_add_0>",
                "store_var add %6",
            ]
        );
    }

    #[test]
    fn test_multiple_assignment_pairs_index_wise() {
        let ir = dump("a, b = 1, 2\n");
        assert_eq!(
            ir,
            vec!["entry:", "%0 = const 1", "%1 = const 2", "store_var a %0", "store_var b %1"]
        );
    }

    #[test]
    fn test_missing_values_are_nil_or_spread() {
        let ir = dump("local x, y = 1\nlocal p, q = f()\n");
        assert_supported(&ir);
        assert!(ir.contains(&"store_var x %0".to_string()), "{:#?}", ir);
        assert!(ir.contains(&"%1 = const nil".to_string()), "{:#?}", ir);
        assert!(ir.contains(&"store_var y %1".to_string()), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("= load_index %2 ")), "{:#?}", ir);
        assert!(ir.contains(&"store_var p %2".to_string()), "{:#?}", ir);
    }

    #[test]
    fn test_table_constructor_keyed_and_positional() {
        let ir = dump("local t = {10, 20, x = 3, [\"k\"] = 4}\n");
        assert_supported(&ir);
        assert!(ir.contains(&"%0 = new_object table".to_string()), "{:#?}", ir);
        assert!(ir.contains(&"%1 = const 1".to_string()), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_index %0 ")).count(), 3, "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_field %0 x ")).count(), 1, "{:#?}", ir);
    }

    #[test]
    fn test_numeric_for_direction() {
        let up = dump("for i = 1, 10 do\n  print(i)\nend\n");
        assert_supported(&up);
        assert!(up.iter().any(|l| l.contains("binop <= ")), "{:#?}", up);

        let down = dump("for i = 10, 1, -1 do\n  print(i)\nend\n");
        assert_supported(&down);
        assert!(down.iter().any(|l| l.contains("binop >= ")), "{:#?}", down);
        assert!(!down.iter().any(|l| l.contains("binop <= ")), "{:#?}", down);
    }

    #[test]
    fn test_generic_for_binds_index_and_value() {
        let ir = dump("for k, v in pairs(t) do\n  print(k, v)\nend\n");
        assert_supported(&ir);
        assert!(ir.contains(&"%0 = load_var t".to_string()), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function len %0")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var k ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var v ")), "{:#?}", ir);
    }

    #[test]
    fn test_method_declaration_and_call() {
        let src = "function Account:deposit(v)\n  self.balance = self.balance + v\nend\nacct:deposit(5)\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.ends_with("= symbolic param:self")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_field ") && l.contains(" balance ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_field ") && l.contains(" deposit ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_method ") && l.contains(" deposit ")), "{:#?}", ir);
    }

    #[test]
    fn test_if_elseif_else() {
        let src = "if x > 0 then\n  y = 1\nelseif x < 0 then\n  y = -1\nelse\n  y = 0\nend\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("branch_if ")).count(), 2, "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var y ")).count(), 3, "{:#?}", ir);
    }

    #[test]
    fn test_repeat_until_and_goto() {
        let ir = dump("repeat\n  n = n - 1\nuntil n == 0\ngoto done\n::done::\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("branch_if ") && l.ends_with(",do_body_0")), "{:#?}", ir);
        assert!(ir.contains(&"branch label_done_3".to_string()), "{:#?}", ir);
        assert!(ir.contains(&"label_done_3:".to_string()), "{:#?}", ir);
    }

    #[test]
    fn test_multiple_return_values() {
        let ir = dump("function f()\n  return 1, 2\nend\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("new_array tuple")), "{:#?}", ir);
    }
}

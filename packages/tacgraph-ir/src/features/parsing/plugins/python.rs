//! Python profile
//!
//! Beyond the shared routines: chained comparisons, comprehensions,
//! `with` bracketing, decorators, `match`, and try/except/else/finally.

use crate::features::lowering::domain::{CatchClause, SyntaxNode, TryParts};
use crate::features::lowering::infrastructure::control_flow::CaseStyle;
use crate::features::lowering::infrastructure::expressions::operator_between;
use crate::features::lowering::infrastructure::{
    assignments, collections, control_flow, definitions, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::constants::COMPREHENSION_VAR;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Python)
        .literals(Literals::PYTHON_STYLE)
        .kinds(NodeKinds {
            comments: vec!["comment"],
            noise: vec!["newline", "\n", "line_continuation"],
            blocks: vec!["block", "module"],
            identifiers: vec!["identifier"],
            members: vec!["attribute"],
            subscripts: vec!["subscript"],
            patterns: vec!["pattern_list", "tuple_pattern", "list_pattern"],
            argument_wrappers: vec![],
        })
        // Expressions
        .expr("identifier", expressions::identifier)
        .exprs(
            &["integer", "float", "string", "concatenated_string", "true", "false", "none", "ellipsis"],
            expressions::const_literal,
        )
        .exprs(&["binary_operator", "boolean_operator"], expressions::binop)
        .expr("comparison_operator", comparison)
        .exprs(&["unary_operator", "not_operator"], expressions::unop)
        .expr("call", expressions::call)
        .expr("attribute", expressions::member_load)
        .expr("subscript", expressions::subscript_load)
        .expr("parenthesized_expression", expressions::paren)
        .exprs(&["list_splat", "dictionary_splat", "parenthesized_list_splat"], expressions::unwrap_first)
        .expr("keyword_argument", keyword_argument)
        .expr("list", collections::list_literal)
        .exprs(&["tuple", "expression_list", "pattern_list"], collections::tuple_literal)
        .expr("set", collections::set_literal)
        .expr("dictionary", collections::dict_literal)
        .expr("conditional_expression", conditional_expression)
        .exprs(
            &["list_comprehension", "set_comprehension", "generator_expression"],
            sequence_comprehension,
        )
        .expr("dictionary_comprehension", dict_comprehension)
        .expr("lambda", definitions::anonymous_function)
        .expr("named_expression", named_expression)
        .expr("await", await_expr)
        .expr("yield", yield_expr)
        .expr("slice", slice)
        .expr("dotted_name", expressions::identifier)
        // Statements
        .stmt("expression_statement", control_flow::statement_list)
        .stmt("assignment", assignments::assignment)
        .stmt("augmented_assignment", assignments::augmented_assignment)
        .stmt("return_statement", control_flow::return_statement)
        .stmt("if_statement", control_flow::if_statement)
        .stmt("while_statement", control_flow::while_statement)
        .stmt("for_statement", control_flow::for_in_statement)
        .stmt("function_definition", definitions::function_def)
        .stmt("class_definition", definitions::class_def)
        .stmt("raise_statement", control_flow::throw_statement)
        .stmt("try_statement", try_statement)
        .stmt("break_statement", control_flow::break_statement)
        .stmt("continue_statement", control_flow::continue_statement)
        .stmt("with_statement", with_statement)
        .stmt("decorated_definition", decorated_definition)
        .stmt("match_statement", match_statement)
        .stmt("assert_statement", assert_statement)
        .stmt("delete_statement", delete_statement)
        .stmts(
            &[
                "pass_statement",
                "import_statement",
                "import_from_statement",
                "future_import_statement",
                "global_statement",
                "nonlocal_statement",
                "type_alias_statement",
            ],
            control_flow::ignore,
        )
        .build()
}

/// `a < b < c` -> `(a < b) and (b < c)`; multi-token operators (`not in`,
/// `is not`) keep their words
fn comparison(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let operands = ctx.significant_children(node);
    if operands.len() < 2 {
        ctx.malformed("comparison with fewer than 2 operands", node);
        return expressions::const_literal(ctx, node);
    }
    let mut prev = ctx.lower_expr(operands[0]);
    let mut acc: Option<Register> = None;
    for pair in operands.windows(2) {
        let op = operator_between(ctx, node, pair[0], pair[1]).unwrap_or_else(|| "==".to_string());
        let next = ctx.lower_expr(pair[1]);
        let cmp = ctx.binop(&op, prev, next, node.location());
        acc = Some(match acc {
            Some(a) => ctx.binop("and", a, cmp, node.location()),
            None => cmp,
        });
        prev = next;
    }
    acc.unwrap_or(prev)
}

/// `f(key=value)`: only the value is passed
fn keyword_argument(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_last(ctx, node),
    }
}

/// `a if cond else b`
fn conditional_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let parts = ctx.significant_children(node);
    if parts.len() < 3 {
        ctx.malformed("conditional expression with fewer than 3 operands", node);
        return expressions::const_literal(ctx, node);
    }
    ctx.lower_ternary_parts(parts[1], parts[0], parts[2], node)
}

/// `(name := value)`
fn named_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (Some(name), Some(value)) = (node.field("name"), node.field("value")) else {
        return expressions::unwrap_last(ctx, node);
    };
    let reg = ctx.lower_expr(value);
    ctx.lower_store_target(name, reg, node);
    reg
}

fn await_expr(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let inner = ctx.significant_children(node);
    ctx.lower_intrinsic("await", &inner, node)
}

fn yield_expr(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let inner = ctx.significant_children(node);
    ctx.lower_intrinsic("yield", &inner, node)
}

/// `a[lo:hi:step]` index operand
fn slice(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let parts = ctx.significant_children(node);
    ctx.lower_intrinsic("slice", &parts, node)
}

// ═══════════════════════════════════════════════════════════════════════════
// Comprehensions
// ═══════════════════════════════════════════════════════════════════════════

/// What the innermost comprehension level stores
#[derive(Clone, Copy)]
enum CompSink<'t> {
    /// Append `body` at the running index slot
    Sequence { result: Register, body: Node<'t>, slot: &'t str },
    /// `result[key] = value`
    Mapping { result: Register, key: Node<'t>, value: Node<'t> },
}

/// `[body for x in xs if cond]`: nested index loops writing into a fresh array
fn sequence_comprehension(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let tag = match node.kind() {
        "set_comprehension" => "set",
        "generator_expression" => "generator",
        _ => "list",
    };
    let Some(body) = node.field("body").or_else(|| ctx.significant_children(node).into_iter().next()) else {
        return expressions::const_literal(ctx, node);
    };
    let (clauses, filters) = comprehension_clauses(node);

    let slot = format!("{}_{}", COMPREHENSION_VAR, ctx.peek_label_counter());
    let size = ctx.const_value("0", SourceLocation::UNKNOWN);
    let result = ctx.emit_value(Opcode::NewArray, vec![tag.into(), size.into()], node.location());
    let zero = ctx.const_value("0", SourceLocation::UNKNOWN);
    ctx.store_var(&slot, zero, SourceLocation::UNKNOWN);

    comprehension_level(ctx, &clauses, &filters, CompSink::Sequence { result, body, slot: &slot }, node);
    result
}

/// `{k: v for x in xs if cond}`
fn dict_comprehension(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let pair = node
        .field("body")
        .or_else(|| node.first_of_kind("pair"));
    let (Some(key), Some(value)) = (pair.and_then(|p| p.field("key")), pair.and_then(|p| p.field("value"))) else {
        ctx.malformed("dict comprehension without key/value pair", node);
        return expressions::const_literal(ctx, node);
    };
    let (clauses, filters) = comprehension_clauses(node);
    let result = ctx.new_object("dict", node.location());
    comprehension_level(ctx, &clauses, &filters, CompSink::Mapping { result, key, value }, node);
    result
}

fn comprehension_clauses<'t>(node: Node<'t>) -> (Vec<Node<'t>>, Vec<Node<'t>>) {
    let kids = node.named_kids();
    let clauses = kids.iter().copied().filter(|c| c.kind() == "for_in_clause").collect();
    let filters = kids.iter().copied().filter(|c| c.kind() == "if_clause").collect();
    (clauses, filters)
}

/// One `for` clause per nesting level; filters apply at the innermost one
fn comprehension_level(
    ctx: &mut LoweringContext<'_>,
    clauses: &[Node<'_>],
    filters: &[Node<'_>],
    sink: CompSink<'_>,
    node: Node<'_>,
) {
    let Some((clause, rest)) = clauses.split_first() else {
        comprehension_store(ctx, filters, sink);
        return;
    };
    let kids = clause.named_kids();
    let target = clause.field("left").or_else(|| kids.first().copied());
    let iterable = clause.field("right").or_else(|| kids.get(1).copied());
    let (Some(target), Some(iterable)) = (target, iterable) else {
        ctx.malformed("for_in_clause without target or iterable", *clause);
        return;
    };
    let iter_reg = ctx.lower_expr(iterable);
    ctx.lower_index_loop(
        iter_reg,
        *clause,
        |ctx, elem, _| ctx.lower_store_target(target, elem, node),
        |ctx| comprehension_level(ctx, rest, filters, sink, node),
    );
}

fn comprehension_store(ctx: &mut LoweringContext<'_>, filters: &[Node<'_>], sink: CompSink<'_>) {
    let skip_label = if filters.is_empty() {
        None
    } else {
        let mut cond: Option<Register> = None;
        for filter in filters {
            let Some(expr) = filter.named_kids().into_iter().next() else {
                continue;
            };
            let reg = ctx.lower_expr(expr);
            cond = Some(match cond {
                Some(prev) => ctx.binop("and", prev, reg, expr.location()),
                None => reg,
            });
        }
        cond.map(|cond| {
            let store_label = ctx.fresh_label("comp_store");
            let skip_label = ctx.fresh_label("comp_skip");
            ctx.emit_branch_if(cond, &store_label, &skip_label, SourceLocation::UNKNOWN);
            ctx.emit_label(&store_label);
            skip_label
        })
    };

    match sink {
        CompSink::Sequence { result, body, slot } => {
            let value = ctx.lower_expr(body);
            let idx = ctx.load_var(slot, SourceLocation::UNKNOWN);
            ctx.emit_effect(
                Opcode::StoreIndex,
                vec![result.into(), idx.into(), value.into()],
                body.location(),
            );
            ctx.bump_slot(slot, "+");
        }
        CompSink::Mapping { result, key, value } => {
            let key_reg = ctx.lower_expr(key);
            let value_reg = ctx.lower_expr(value);
            ctx.emit_effect(
                Opcode::StoreIndex,
                vec![result.into(), key_reg.into(), value_reg.into()],
                value.location(),
            );
        }
    }

    if let Some(skip_label) = skip_label {
        ctx.emit_branch(&skip_label);
        ctx.emit_label(&skip_label);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// `try` / `except T as e` / `else` / `finally`
fn try_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut parts = TryParts {
        body: node.field("body"),
        ..TryParts::default()
    };
    for child in node.named_kids() {
        match child.kind() {
            "except_clause" | "except_group_clause" => parts.catches.push(except_clause(child)),
            "else_clause" => parts.else_body = child.field("body").or_else(|| child.first_of_kind("block")),
            "finally_clause" => parts.finally_body = child.first_of_kind("block"),
            _ => {}
        }
    }
    ctx.lower_try(&parts, node);
}

fn except_clause(clause: Node<'_>) -> CatchClause<'_> {
    let mut catch = CatchClause {
        variable: None,
        exception_type: None,
        body: clause.first_of_kind("block"),
    };
    for sub in clause.named_kids() {
        match sub.kind() {
            "block" | "comment" => {}
            "as_pattern" => {
                let parts = sub.named_kids();
                catch.exception_type = parts.first().copied();
                catch.variable = sub.field("alias").or_else(|| parts.last().copied()).map(unwrap_as_target);
            }
            _ if catch.exception_type.is_none() => catch.exception_type = Some(sub),
            _ => {}
        }
    }
    catch
}

/// `as_pattern_target` wraps the bound name
fn unwrap_as_target(node: Node<'_>) -> Node<'_> {
    if node.kind() == "as_pattern_target" {
        node.named_kids().into_iter().next().unwrap_or(node)
    } else {
        node
    }
}

/// `with a as x, b:` -> `__enter__` in order, body, `__exit__` in reverse
fn with_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let items: Vec<Node<'_>> = node
        .first_of_kind("with_clause")
        .map(|clause| {
            clause
                .named_kids()
                .into_iter()
                .filter(|c| c.kind() == "with_item")
                .collect()
        })
        .unwrap_or_default();

    let mut managers: Vec<Register> = Vec::with_capacity(items.len());
    for item in items {
        let Some(value) = item.field("value").or_else(|| item.named_kids().into_iter().next()) else {
            continue;
        };
        let (expr, target) = if value.kind() == "as_pattern" {
            let parts = value.named_kids();
            let target = value.field("alias").or_else(|| parts.last().copied()).map(unwrap_as_target);
            (parts.first().copied().unwrap_or(value), target)
        } else {
            (value, None)
        };
        let manager = ctx.lower_expr(expr);
        let entered = ctx.call_method(manager, "__enter__", vec![], item.location());
        if let Some(target) = target {
            ctx.lower_store_target(target, entered, item);
        }
        managers.push(manager);
    }

    ctx.lower_body(node.field("body"));

    for manager in managers.into_iter().rev() {
        ctx.call_method(manager, "__exit__", vec![], node.location());
    }
}

/// `@d1 @d2 def f` -> define `f`, then `f = d2(f)`, `f = d1(f)`
fn decorated_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(definition) = node.field("definition").or_else(|| {
        node.named_kids()
            .into_iter()
            .find(|c| matches!(c.kind(), "function_definition" | "class_definition"))
    }) else {
        ctx.malformed("decorated definition without a definition", node);
        return;
    };
    ctx.lower_stmt(definition);

    let Some(name) = definition.field("name").map(|n| ctx.text(n)) else {
        return;
    };
    let decorators: Vec<Node<'_>> = node
        .named_kids()
        .into_iter()
        .filter(|c| c.kind() == "decorator")
        .collect();
    for decorator in decorators.into_iter().rev() {
        let Some(expr) = decorator.named_kids().into_iter().next() else {
            continue;
        };
        let func = ctx.load_var(&name, decorator.location());
        let wrapped = if ctx.profile().is_identifier(expr.kind()) {
            let dec_name = ctx.text(expr);
            ctx.call_function(&dec_name, vec![func], decorator.location())
        } else {
            let target = ctx.lower_expr(expr);
            ctx.call_unknown(target, vec![func], decorator.location())
        };
        ctx.store_var(&name, wrapped, decorator.location());
    }
}

/// `match subject:` as an equality chain; `case _` matches unconditionally
fn match_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(subject_node) = node.field("subject") else {
        ctx.malformed("match without subject", node);
        return;
    };
    let subject = ctx.lower_expr(subject_node);
    let clauses: Vec<Node<'_>> = match node.field("body") {
        Some(body) => body.named_kids(),
        None => node.named_kids(),
    }
    .into_iter()
    .filter(|c| c.kind() == "case_clause")
    .collect();

    let mut arms = Vec::with_capacity(clauses.len());
    for clause in clauses {
        let patterns: Vec<Node<'_>> = clause
            .named_kids()
            .into_iter()
            .filter(|c| c.kind() == "case_pattern")
            .collect();
        let wildcard = patterns.iter().any(|p| ctx.text(*p).trim() == "_");
        let values = if wildcard {
            Vec::new()
        } else {
            patterns
                .iter()
                .filter_map(|p| p.named_kids().into_iter().next())
                .collect()
        };
        let body = clause
            .field("consequence")
            .or_else(|| clause.first_of_kind("block"))
            .map(|b| b.named_kids())
            .unwrap_or_default();
        arms.push((values, body));
    }
    ctx.lower_case_chain(subject, &arms, CaseStyle::Match, node);
}

fn assert_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let parts = ctx.significant_children(node);
    ctx.lower_intrinsic("assert", &parts, node);
}

fn delete_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let parts = ctx.significant_children(node);
    ctx.lower_intrinsic("del", &parts, node);
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;
    use crate::shared::models::{IrInstruction, Opcode};

    fn lower(src: &str) -> Vec<IrInstruction> {
        lower_with_language(LanguageId::Python, src)
    }

    fn dump(src: &str) -> Vec<String> {
        lower(src).iter().map(|i| i.display_plain()).collect()
    }

    fn unsupported(ir: &[IrInstruction]) -> Vec<String> {
        ir.iter()
            .map(|i| i.display_plain())
            .filter(|l| l.contains("unsupported:"))
            .collect()
    }

    #[test]
    fn test_chained_comparison() {
        let ir = dump("ok = 0 < x <= 9\n");
        assert!(ir.iter().any(|l| l.contains("binop < ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop <= ")));
        assert!(ir.iter().any(|l| l.contains("binop and ")));
    }

    #[test]
    fn test_not_in_keeps_both_words() {
        let ir = dump("found = k not in seen\n");
        assert!(ir.iter().any(|l| l.contains("binop not in ")), "{:#?}", ir);
    }

    #[test]
    fn test_list_comprehension_with_filter() {
        let ir = lower("evens = [n * 2 for n in xs if n % 2 == 0]\n");
        assert!(unsupported(&ir).is_empty(), "{:#?}", unsupported(&ir));
        let plain: Vec<String> = ir.iter().map(|i| i.display_plain()).collect();
        assert!(plain.iter().any(|l| l.contains("new_array list")));
        assert!(plain.iter().any(|l| l.starts_with("branch_if") && l.contains("comp_store_")));
        assert!(plain.iter().any(|l| l.starts_with("store_index")));
        assert!(plain.iter().any(|l| l.starts_with("store_var __comp_0 ")));
    }

    #[test]
    fn test_dict_comprehension() {
        let ir = lower("sq = {k: k * k for k in ks}\n");
        assert!(unsupported(&ir).is_empty(), "{:#?}", unsupported(&ir));
        assert!(ir.iter().any(|i| i.opcode == Opcode::NewObject));
    }

    #[test]
    fn test_with_exits_in_reverse_order() {
        let ir = dump("with open(a) as f, lock:\n    f.read()\n");
        let enters: Vec<usize> = ir
            .iter()
            .enumerate()
            .filter(|(_, l)| l.contains("__enter__"))
            .map(|(i, _)| i)
            .collect();
        let exits: Vec<&String> = ir.iter().filter(|l| l.contains("__exit__")).collect();
        assert_eq!(enters.len(), 2, "{:#?}", ir);
        assert_eq!(exits.len(), 2);
        assert!(ir.iter().any(|l| l.starts_with("store_var f ")));
        // the `lock` manager was lowered second, so it exits first
        let lock_reg = ir
            .iter()
            .find(|l| l.ends_with("load_var lock"))
            .and_then(|l| l.split(' ').next())
            .unwrap()
            .to_string();
        assert!(exits[0].contains(&format!("call_method {} __exit__", lock_reg)));
    }

    #[test]
    fn test_decorators_apply_innermost_first() {
        let ir = dump("@outer\n@inner\ndef f():\n    pass\n");
        let calls: Vec<&String> = ir.iter().filter(|l| l.contains("call_function")).collect();
        assert_eq!(calls.len(), 2, "{:#?}", ir);
        assert!(calls[0].contains("call_function inner"));
        assert!(calls[1].contains("call_function outer"));
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var f ")).count(), 3);
    }

    #[test]
    fn test_match_wildcard_short_circuits() {
        let src = "match cmd:\n    case 1:\n        x = 'one'\n    case _:\n        x = 'other'\n";
        let ir = lower(src);
        assert!(unsupported(&ir).is_empty(), "{:#?}", unsupported(&ir));
        let plain: Vec<String> = ir.iter().map(|i| i.display_plain()).collect();
        assert!(plain.iter().any(|l| l.contains("binop == ")));
        assert_eq!(plain.iter().filter(|l| l.starts_with("branch_if")).count(), 1);
    }

    #[test]
    fn test_typed_and_default_params() {
        let ir = dump("def f(a: int, b=2, *rest, **kw):\n    return a\n");
        assert_eq!(ir[3], "%0 = symbolic param:a");
        for name in ["a", "b", "rest", "kw"] {
            let prefix = format!("store_var {} ", name);
            assert!(ir.iter().any(|l| l.starts_with(&prefix)), "{} missing: {:#?}", name, ir);
        }
    }
}

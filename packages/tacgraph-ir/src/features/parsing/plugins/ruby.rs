//! Ruby profile
//!
//! Attribute access and method calls share the `call` node (receiver /
//! method fields). `unless` / `until` reuse the if / while skeletons with
//! their branches swapped, blocks and lambdas become anonymous functions
//! passed as the trailing call argument, and `begin` / `rescue` /
//! `ensure` goes through the shared try routine.

use crate::features::lowering::domain::{CatchClause, SyntaxNode, TryParts};
use crate::features::lowering::infrastructure::control_flow::CaseStyle;
use crate::features::lowering::infrastructure::{
    assignments, control_flow, expressions, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{FieldNames, Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{Opcode, Register};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

fn build() -> TableProfile {
    TableProfile::builder(LanguageId::Ruby)
        .literals(Literals::new("true", "false", "nil", "nil"))
        .fields(FieldNames {
            call_function: "method",
            attr_object: "receiver",
            attr_member: "method",
            subscript_value: "object",
            subscript_index: "index",
            ..FieldNames::default()
        })
        .kinds(NodeKinds {
            comments: vec!["comment"],
            noise: vec!["\n", ";", "empty_statement"],
            blocks: vec![
                "program",
                "body_statement",
                "then",
                "do",
                "else",
                "ensure",
                "begin",
                "block_body",
            ],
            identifiers: vec![
                "identifier",
                "instance_variable",
                "class_variable",
                "global_variable",
                "constant",
            ],
            members: vec!["call"],
            subscripts: vec!["element_reference"],
            patterns: vec!["left_assignment_list", "destructured_left_assignment"],
            argument_wrappers: vec![],
        })
        // Expressions
        .exprs(
            &[
                "identifier",
                "instance_variable",
                "class_variable",
                "global_variable",
                "constant",
                "self",
            ],
            expressions::identifier,
        )
        .exprs(
            &[
                "integer",
                "float",
                "rational",
                "complex",
                "character",
                "simple_symbol",
                "hash_key_symbol",
                "delimited_symbol",
                "bare_string",
                "bare_symbol",
                "regex",
                "heredoc_beginning",
            ],
            expressions::const_literal,
        )
        .exprs(&["string", "heredoc_body", "subshell"], string)
        .expr("true", expressions::canonical_true)
        .expr("false", expressions::canonical_false)
        .expr("nil", expressions::canonical_none)
        .expr("binary", expressions::binop)
        .expr("unary", expressions::unop)
        .expr("conditional", expressions::ternary)
        .exprs(&["parenthesized_expression", "parenthesized_statements", "pattern"], expressions::paren)
        .expr("call", call)
        .expr("element_reference", expressions::subscript_load)
        .expr("scope_resolution", scope_resolution)
        .expr("argument_list", argument_list)
        .exprs(&["array", "string_array", "symbol_array"], array)
        .expr("hash", hash)
        .expr("pair", pair_value)
        .exprs(&["splat_argument", "hash_splat_argument", "block_argument"], splat)
        .expr("range", range)
        .expr("lambda", lambda)
        .exprs(&["block", "do_block"], block)
        .expr("super", super_call)
        .expr("yield", yield_call)
        .expr("assignment", assignment)
        .expr("operator_assignment", assignments::augmented_assignment_expr)
        // Statements
        .stmt("assignment", assignment_stmt)
        .stmt("operator_assignment", assignments::augmented_assignment)
        .stmts(&["return", "return_statement"], control_flow::return_statement)
        .stmt("if", control_flow::if_statement)
        .stmt("unless", unless)
        .stmt("if_modifier", if_modifier)
        .stmt("unless_modifier", unless_modifier)
        .stmt("while", control_flow::while_statement)
        .stmt("until", until)
        .stmts(&["while_modifier", "until_modifier"], loop_modifier)
        .stmt("for", for_loop)
        .stmt("case", case)
        .stmt("case_match", case)
        .stmt("method", method)
        .stmt("singleton_method", method)
        .stmts(&["class", "module"], class)
        .stmt("singleton_class", singleton_class)
        .stmt("begin", begin)
        .stmt("rescue_modifier", rescue_modifier)
        .stmt("break", control_flow::break_statement)
        .stmt("next", control_flow::continue_statement)
        .stmts(&["rescue", "else", "ensure", "alias", "undef"], control_flow::ignore)
        .stmts(&["begin_block", "end_block"], control_flow::statement_list)
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `"a #{b} c"` -> `"a " + b + " c"`; a plain string stays one constant
fn string(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    if !node.has_child_kind("interpolation") {
        return expressions::const_literal(ctx, node);
    }
    let mut parts = Vec::new();
    for piece in node.named_kids() {
        match piece.kind() {
            "interpolation" => {
                if let Some(inner) = ctx.significant_children(piece).into_iter().next() {
                    parts.push(ctx.lower_expr(inner));
                }
            }
            "heredoc_end" => {}
            _ => {
                let text = ctx.text(piece);
                parts.push(ctx.const_value(text, piece.location()));
            }
        }
    }
    ctx.lower_concat(parts, node)
}

/// `recv.m(args) { block }` -> CALL_METHOD, `m(args)` -> CALL_FUNCTION;
/// an attached block is passed as the last argument
fn call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let loc = node.location();
    let receiver = node.field("receiver").map(|r| ctx.lower_expr(r));
    let mut args = ctx.call_args(node.field("arguments"));
    if let Some(attached) = node.field("block") {
        args.push(block(ctx, attached));
    }
    match (receiver, node.field("method")) {
        (Some(recv), Some(method)) => {
            let name = ctx.text(method);
            ctx.call_method(recv, &name, args, loc)
        }
        (None, Some(method)) => {
            let name = ctx.text(method);
            ctx.call_function(&name, args, loc)
        }
        // `callable.(args)`
        (Some(recv), None) => ctx.call_unknown(recv, args, loc),
        (None, None) => {
            let target = ctx.symbolic("unknown_call_target", loc);
            ctx.call_unknown(target, args, loc)
        }
    }
}

/// `Outer::Inner` -> LOAD_FIELD; `::Top` -> the bare name
fn scope_resolution(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let Some(name) = node.field("name") else {
        return expressions::const_literal(ctx, node);
    };
    let member = ctx.text(name);
    match node.field("scope") {
        Some(scope) => {
            let scope_reg = ctx.lower_expr(scope);
            ctx.emit_value(Opcode::LoadField, vec![scope_reg.into(), member.into()], node.location())
        }
        None => ctx.load_var(member, node.location()),
    }
}

/// Argument list in value position (`return a`, `return a, b`)
fn argument_list(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let values = ctx.significant_children(node);
    match values.as_slice() {
        [] => {
            let default = ctx.literals().default_return;
            ctx.const_value(default, node.location())
        }
        [single] => ctx.lower_expr(*single),
        _ => ctx.lower_array_of("array", &values, node),
    }
}

fn array(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("array", &elements, node)
}

/// `{a: 1, "b" => 2}`
fn hash(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let pairs: Vec<(Node<'_>, Node<'_>)> = node
        .named_kids()
        .into_iter()
        .filter(|c| c.kind() == "pair")
        .filter_map(|c| Some((c.field("key")?, c.field("value")?)))
        .collect();
    ctx.lower_keyed_object("hash", &pairs, node)
}

/// Keyword argument `f(key: value)`: only the value is passed
fn pair_value(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => expressions::unwrap_last(ctx, node),
    }
}

/// `*xs`, `**opts`, `&blk`
fn splat(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let inner = ctx.significant_children(node);
    if inner.is_empty() {
        return expressions::symbolic_node(ctx, node);
    }
    ctx.lower_intrinsic("spread", &inner, node)
}

/// `a..b` / `a...b` -> `CALL_FUNCTION range a b`; an open end is nil
fn range(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let start = node.field("begin");
    let stop = node.field("end");
    let (start, stop) = match (start, stop) {
        (None, None) => {
            let kids = ctx.significant_children(node);
            (kids.first().copied(), kids.get(1).copied())
        }
        other => other,
    };
    let start_reg = ctx.lower_opt_expr(start);
    let stop_reg = ctx.lower_opt_expr(stop);
    ctx.call_function("range", vec![start_reg, stop_reg], node.location())
}

/// `->(x) { body }`
fn lambda(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let block_node = node.field("body");
    let params = node
        .field("parameters")
        .or_else(|| block_node.and_then(block_params));
    let body = block_node.and_then(block_body);
    closure(ctx, params, body, node)
}

/// `{ |x| ... }` / `do |x| ... end`
fn block(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    closure(ctx, block_params(node), block_body(node), node)
}

fn block_params(node: Node<'_>) -> Option<Node<'_>> {
    node.field("parameters")
        .or_else(|| node.first_of_kind("block_parameters"))
}

fn block_body(node: Node<'_>) -> Option<Node<'_>> {
    node.field("body")
        .or_else(|| node.first_of_kind("block_body"))
        .or_else(|| node.first_of_kind("body_statement"))
}

fn closure(
    ctx: &mut LoweringContext<'_>,
    params: Option<Node<'_>>,
    body: Option<Node<'_>>,
    node: Node<'_>,
) -> Register {
    let name = ctx.anonymous_name();
    ctx.emit_function(&name, node, |ctx| {
        ctx.lower_params(params);
        lower_method_body(ctx, body, node);
    })
}

/// `super` / `super(args)`
fn super_call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let args = ctx.call_args(node.first_of_kind("argument_list"));
    ctx.call_function("super", args, node.location())
}

/// `yield` / `yield a, b`
fn yield_call(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let args = ctx.call_args(node.first_of_kind("argument_list"));
    ctx.call_function("yield", args, node.location())
}

/// `a = v`, `a, b = b, a`, `a, b = pair`
fn assignment(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let (Some(left), Some(right)) = (node.field("left"), node.field("right")) else {
        return assignments::assignment_expr(ctx, node);
    };
    if right.kind() != "right_assignment_list" {
        return assignments::assignment_expr(ctx, node);
    }
    let targets = if left.kind() == "left_assignment_list" {
        ctx.significant_children(left)
    } else {
        vec![left]
    };
    let values = ctx.significant_children(right);
    ctx.lower_parallel_assign(&targets, &values, node);
    match targets.first() {
        Some(first) => ctx.lower_expr(*first),
        None => ctx.const_none(),
    }
}

fn assignment_stmt(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let is_parallel = node
        .field("right")
        .is_some_and(|r| r.kind() == "right_assignment_list");
    if is_parallel {
        let left = node.field("left");
        let targets = match left {
            Some(l) if l.kind() == "left_assignment_list" => ctx.significant_children(l),
            Some(l) => vec![l],
            None => Vec::new(),
        };
        let values = node
            .field("right")
            .map(|r| ctx.significant_children(r))
            .unwrap_or_default();
        ctx.lower_parallel_assign(&targets, &values, node);
    } else {
        assignments::assignment(ctx, node);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// `unless c ... else ... end`: the else body runs when `c` holds
fn unless(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let cond = node.field("condition");
    let then = node.field("consequence");
    let otherwise = node.field("alternative");
    let alternatives: Vec<Node<'_>> = then.into_iter().collect();
    ctx.lower_if_parts(cond, otherwise, &alternatives, node);
}

/// `stmt if cond`
fn if_modifier(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    ctx.lower_if_parts(node.field("condition"), node.field("body"), &[], node);
}

/// `stmt unless cond`
fn unless_modifier(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let body: Vec<Node<'_>> = node.field("body").into_iter().collect();
    ctx.lower_if_parts(node.field("condition"), None, &body, node);
}

/// `until c ... end`
fn until(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let cond = node.field("condition");
    let body = node.field("body");
    ctx.lower_while_with(node, true, |ctx| ctx.lower_opt_expr(cond), |ctx| ctx.lower_body(body));
}

/// `stmt while c` / `stmt until c`; a `begin ... end` body runs once first
fn loop_modifier(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let until = node.kind() == "until_modifier";
    let cond = node.field("condition");
    let body = node.field("body");
    if body.is_some_and(|b| b.kind() == "begin") {
        ctx.lower_do_while_parts(body, cond, until, node);
    } else {
        ctx.lower_while_with(node, until, |ctx| ctx.lower_opt_expr(cond), |ctx| ctx.lower_body(body));
    }
}

/// `for x in xs do ... end`
fn for_loop(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let pattern = node.field("pattern");
    let iterable = node.field("value").map(|v| {
        if v.kind() == "in" {
            v.named_kids().into_iter().next().unwrap_or(v)
        } else {
            v
        }
    });
    let (Some(pattern), Some(iterable)) = (pattern, iterable) else {
        ctx.malformed("for without pattern or iterable", node);
        return;
    };
    let body = node.field("body");
    let iter_reg = ctx.lower_expr(iterable);
    ctx.lower_index_loop(
        iter_reg,
        node,
        |ctx, elem, _| ctx.lower_store_target(pattern, elem, node),
        |ctx| ctx.lower_body(body),
    );
}

/// `case v when a, b ... else ... end` (and `case v in pat`)
///
/// A subject-less `case` tests each `when` value against `true`.
fn case(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let subject = match node.field("value") {
        Some(value) => ctx.lower_expr(value),
        None => {
            let lit = ctx.literals().true_lit;
            ctx.const_value(lit, node.location())
        }
    };
    let mut arms: Vec<(Vec<Node<'_>>, Vec<Node<'_>>)> = Vec::new();
    for child in node.named_kids() {
        match child.kind() {
            "when" | "in_clause" => {
                let values = child.field_all("pattern");
                let body = child
                    .field("body")
                    .map(|b| ctx.significant_children(b))
                    .unwrap_or_default();
                arms.push((values, body));
            }
            "else" => arms.push((Vec::new(), ctx.significant_children(child))),
            _ => {}
        }
    }
    ctx.lower_case_chain(subject, &arms, CaseStyle::Match, node);
}

/// `def name(params) ... end`, `def self.name`, endless `def name = expr`
fn method(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let params = node.field("parameters");
    let body = node.field("body");
    let func_ref = ctx.emit_function(&name, node, |ctx| {
        ctx.lower_params(params);
        lower_method_body(ctx, body, node);
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// `body_statement` may carry rescue / else / ensure clauses
fn lower_method_body(ctx: &mut LoweringContext<'_>, body: Option<Node<'_>>, node: Node<'_>) {
    match body {
        Some(b) if b.kind() == "body_statement" => lower_rescuable(ctx, b, node),
        other => ctx.lower_function_body(other),
    }
}

/// `class C < Base ... end` / `module M ... end`
fn class(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = node
        .field("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| ctx.anonymous_name());
    let body = node.field("body");
    ctx.emit_class(&name, node, |ctx| {
        if let Some(body) = body {
            lower_rescuable(ctx, body, node);
        }
    });
}

/// `class << self ... end`: the body's definitions in place
fn singleton_class(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    ctx.lower_body(node.field("body"));
}

fn begin(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    lower_rescuable(ctx, node, node);
}

/// Lower `container`'s statements, routed through try/catch when it has
/// rescue or ensure clauses
fn lower_rescuable(ctx: &mut LoweringContext<'_>, container: Node<'_>, node: Node<'_>) {
    let mut parts = TryParts {
        body: Some(container),
        ..TryParts::default()
    };
    for child in container.named_kids() {
        match child.kind() {
            "rescue" => parts.catches.push(rescue_clause(child)),
            "else" => parts.else_body = Some(child),
            "ensure" => parts.finally_body = Some(child),
            _ => {}
        }
    }
    if parts.catches.is_empty() && parts.finally_body.is_none() {
        ctx.lower_block(container);
    } else {
        ctx.lower_try(&parts, node);
    }
}

/// `rescue ArgumentError, TypeError => e`
fn rescue_clause(clause: Node<'_>) -> CatchClause<'_> {
    let variable = clause
        .field("variable")
        .or_else(|| clause.first_of_kind("exception_variable"))
        .map(|v| v.named_kids().into_iter().next().unwrap_or(v));
    CatchClause {
        variable,
        exception_type: clause
            .field("exceptions")
            .or_else(|| clause.first_of_kind("exceptions")),
        body: clause.field("body").or_else(|| clause.first_of_kind("then")),
    }
}

/// `expr rescue fallback`
fn rescue_modifier(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let parts = TryParts {
        body: node.field("body"),
        catches: vec![CatchClause {
            variable: None,
            exception_type: None,
            body: node.field("handler"),
        }],
        ..TryParts::default()
    };
    ctx.lower_try(&parts, node);
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;

    fn dump(src: &str) -> Vec<String> {
        lower_with_language(LanguageId::Ruby, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    fn assert_supported(ir: &[String]) {
        let bad: Vec<&String> = ir.iter().filter(|l| l.contains("unsupported:")).collect();
        assert!(bad.is_empty(), "unsupported constructs: {:#?}", bad);
    }

    #[test]
    fn test_method_definition() {
        let ir = dump("def add(a, b)\n  a + b\nend\n");
        assert_supported(&ir);
        assert!(ir.contains(&"%0 = symbolic param:a".to_string()), "{:#?}", ir);
        assert!(ir.contains(&"%1 = symbolic param:b".to_string()));
        assert!(ir.contains(&"func_add_0:".to_string()));
        assert!(ir.iter().any(|l| l.ends_with("= const nil")));
        assert!(ir.iter().any(|l| l.contains("<function:add@func_add_0>")));
        assert!(ir.last().is_some_and(|l| l.starts_with("store_var add ")));
    }

    #[test]
    fn test_calls_with_and_without_receiver() {
        let ir = dump("puts 1\nobj.run(2)\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function puts")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_method") && l.contains(" run ")), "{:#?}", ir);
    }

    #[test]
    fn test_unless_swaps_branches() {
        let ir = dump("unless ok\n  fix\nend\n");
        assert_supported(&ir);
        // The body sits on the false edge; the true edge goes straight to the end
        assert!(ir.iter().any(|l| l.starts_with("branch_if ") && l.ends_with("if_true_0,if_false_1")), "{:#?}", ir);
        let true_at = ir.iter().position(|l| l == "if_true_0:").unwrap();
        assert_eq!(ir[true_at + 1], "branch if_end_2");
    }

    #[test]
    fn test_until_exits_when_condition_holds() {
        let ir = dump("until done\n  step\nend\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("branch_if ") && l.ends_with("while_end_2,while_body_1")), "{:#?}", ir);
    }

    #[test]
    fn test_modifiers() {
        let ir = dump("x = 1 if y\nz = 2 unless w\n");
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("branch_if")).count(), 2, "{:#?}", ir);
    }

    #[test]
    fn test_for_in_range() {
        let ir = dump("for i in 1..3 do\n  puts i\nend\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("call_function range")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function len")));
        assert!(ir.iter().any(|l| l.starts_with("store_var i ")));
    }

    #[test]
    fn test_case_when_else() {
        let src = "case x\nwhen 1, 2\n  a\nwhen 3\n  b\nelse\n  c\nend\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop ==")).count(), 3, "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop ||")).count(), 1);
        assert_eq!(ir.last().map(String::as_str), Some("switch_end_0:"));
    }

    #[test]
    fn test_begin_rescue_ensure() {
        let src = "begin\n  risky\nrescue ArgumentError => e\n  handle(e)\nensure\n  cleanup()\nend\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("caught_exception:ArgumentError")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var e ")));
        assert!(ir.iter().any(|l| l.starts_with("try_finally_")));
        assert!(ir.iter().any(|l| l.contains("call_function cleanup")));
    }

    #[test]
    fn test_block_becomes_trailing_argument() {
        let ir = dump("items.each do |item|\n  puts item\nend\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("symbolic param:item")), "{:#?}", ir);
        let call = ir.iter().find(|l| l.contains("call_method")).unwrap();
        assert!(call.contains(" each %"), "{}", call);
    }

    #[test]
    fn test_string_interpolation() {
        let ir = dump("msg = \"hi #{name}!\"\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("load_var name")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop +")).count(), 2, "{:#?}", ir);
    }

    #[test]
    fn test_class_with_instance_variables() {
        let src = "class Point\n  def initialize(x)\n    @x = x\n  end\nend\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.contains(&"class_Point_0:".to_string()), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var @x ")));
        assert!(ir.last().is_some_and(|l| l.starts_with("store_var Point ")));
    }

    #[test]
    fn test_hash_and_parallel_assignment() {
        let ir = dump("h = {a: 1, \"b\" => 2}\na, b = b, a\n");
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.ends_with("new_object hash")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_index")).count(), 2);
        // Both values are read before either name is written
        let first_store = ir.iter().position(|l| l.starts_with("store_var a ")).unwrap();
        let second_load = ir.iter().position(|l| l.ends_with("load_var a")).unwrap();
        assert!(second_load < first_store, "{:#?}", ir);
    }
}

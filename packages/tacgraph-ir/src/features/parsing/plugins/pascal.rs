//! Pascal profile
//!
//! The Pascal grammar surfaces every keyword and operator as its own named
//! node (`kBegin`, `kAdd`, `kDownto`, ...) and exposes few fields, so
//! operands are picked positionally from the named children that are not
//! keywords, and operators go through an explicit keyword table.

use crate::features::lowering::domain::SyntaxNode;
use crate::features::lowering::infrastructure::{
    control_flow, expressions, CaseStyle, LoweringContext, TableProfile,
};
use crate::features::lowering::ports::{Literals, NodeKinds};
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::{Opcode, Register, SourceLocation};
use once_cell::sync::Lazy;
use tree_sitter::Node;

pub static PROFILE: Lazy<TableProfile> = Lazy::new(build);

/// Operator keyword node -> IR operator
const OPERATORS: &[(&str, &str)] = &[
    ("kAdd", "+"),
    ("kSub", "-"),
    ("kMul", "*"),
    ("kFdiv", "/"),
    ("kDiv", "div"),
    ("kMod", "mod"),
    ("kEq", "=="),
    ("kNeq", "!="),
    ("kLt", "<"),
    ("kLte", "<="),
    ("kGt", ">"),
    ("kGte", ">="),
    ("kAnd", "and"),
    ("kOr", "or"),
    ("kXor", "xor"),
    ("kNot", "not"),
    ("kShl", "shl"),
    ("kShr", "shr"),
    ("kIn", "in"),
    ("kIs", "is"),
    ("kAs", "as"),
];

/// Structural keywords and punctuation that carry no operand
const KEYWORD_NOISE: &[&str] = &[
    "kProgram",
    "kUnit",
    "kUses",
    "kInterface",
    "kImplementation",
    "kBegin",
    "kEnd",
    "kEndDot",
    "kVar",
    "kConst",
    "kType",
    "kDo",
    "kThen",
    "kElse",
    "kOf",
    "kTo",
    "kDownto",
    "kAssign",
    "kSemicolon",
    "kColon",
    "kComma",
    "kDot",
    "kLParen",
    "kRParen",
    "kLBrack",
    "kRBrack",
    "kRange",
    "kIf",
    "kWhile",
    "kFor",
    "kRepeat",
    "kUntil",
    "kCase",
    "kFunction",
    "kProcedure",
    ";",
    ":",
    ",",
    ".",
    "(",
    ")",
    "\n",
];

fn build() -> TableProfile {
    let mut noise = KEYWORD_NOISE.to_vec();
    noise.extend(["moduleName", "declUses", "declTypes", "declLabels", "declProcForward"]);
    TableProfile::builder(LanguageId::Pascal)
        .literals(Literals::new("true", "false", "nil", "nil"))
        .kinds(NodeKinds {
            comments: vec!["comment", "pp"],
            noise,
            blocks: vec!["root", "program", "block", "statements"],
            identifiers: vec!["identifier"],
            members: vec!["exprDot"],
            subscripts: vec!["exprSubscript"],
            patterns: vec![],
            argument_wrappers: vec![],
        })
        // Expressions
        .expr("identifier", expressions::identifier)
        .exprs(&["literalNumber", "literalString", "literalChar"], expressions::const_literal)
        .expr("kTrue", expressions::canonical_true)
        .expr("kFalse", expressions::canonical_false)
        .expr("kNil", expressions::canonical_none)
        .expr("exprBinary", binary_expression)
        .expr("exprUnary", unary_expression)
        .expr("exprParens", expressions::paren)
        .expr("exprCall", call_expression)
        .expr("exprDot", expressions::member_load)
        .expr("exprSubscript", expressions::subscript_load)
        .expr("exprArgs", expressions::unwrap_first)
        .expr("exprBrackets", set_literal)
        .expr("range", range_expression)
        // Statements
        .stmts(
            &["program", "unit", "interface", "implementation", "block", "statement", "statements"],
            control_flow::statement_list,
        )
        .stmt("identifier", identifier_statement)
        .stmt("exprCall", call_statement)
        .stmt("assignment", assignment)
        .stmts(&["declVars", "declConsts"], declarations)
        .stmts(&["declVar", "declConst"], declaration)
        .stmts(&["if", "ifElse"], if_statement)
        .stmt("while", while_statement)
        .stmt("repeat", repeat_statement)
        .stmt("for", for_statement)
        .stmt("case", case_statement)
        .stmt("defProc", procedure_definition)
        .stmt("declProc", control_flow::ignore)
        .build()
}

fn is_keyword(kind: &str) -> bool {
    let mut chars = kind.chars();
    chars.next() == Some('k') && chars.next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Named children that are neither keywords nor comments
fn operands<'t>(ctx: &LoweringContext<'_>, node: Node<'t>) -> Vec<Node<'t>> {
    ctx.significant_children(node)
        .into_iter()
        .filter(|c| !is_keyword(c.kind()) || matches!(c.kind(), "kTrue" | "kFalse" | "kNil"))
        .collect()
}

fn has_keyword(node: Node<'_>, keyword: &str) -> bool {
    node.kids().into_iter().any(|c| c.kind() == keyword)
}

fn operator_of(node: Node<'_>) -> Option<&'static str> {
    node.kids().into_iter().find_map(|c| {
        OPERATORS
            .iter()
            .find(|(kind, _)| *kind == c.kind())
            .map(|(_, op)| *op)
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════════

/// `lhs <op keyword> rhs`
fn binary_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let parts = operands(ctx, node);
    let (Some(lhs), Some(rhs)) = (parts.first().copied(), parts.last().copied()) else {
        ctx.malformed("binary expression without operands", node);
        return expressions::const_literal(ctx, node);
    };
    let op = match operator_of(node) {
        Some(op) => op.to_string(),
        None => node
            .kids()
            .into_iter()
            .find(|c| c.id() != lhs.id() && c.id() != rhs.id() && !c.is_extra())
            .map(|c| ctx.text(c).to_lowercase())
            .unwrap_or_else(|| "?".to_string()),
    };
    let lhs_reg = ctx.lower_expr(lhs);
    let rhs_reg = ctx.lower_expr(rhs);
    ctx.binop(&op, lhs_reg, rhs_reg, node.location())
}

/// `not x`, `-x`
fn unary_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let Some(operand) = operands(ctx, node).into_iter().last() else {
        ctx.malformed("unary expression without operand", node);
        return expressions::const_literal(ctx, node);
    };
    let op = operator_of(node).unwrap_or("?");
    let reg = ctx.lower_expr(operand);
    ctx.emit_value(Opcode::Unop, vec![op.into(), reg.into()], node.location())
}

/// `Name(args)` / `obj.Method(args)`
fn call_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let callee = node
        .field("entity")
        .or_else(|| operands(ctx, node).into_iter().find(|c| c.kind() != "exprArgs"));
    let args = node.first_of_kind("exprArgs");
    ctx.lower_call_parts(callee, args, node)
}

/// `[1, 2, 5..9]`
fn set_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = operands(ctx, node);
    ctx.lower_array_of("set", &elements, node)
}

/// `lo..hi` outside a case label
fn range_expression(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let bounds = operands(ctx, node);
    ctx.lower_intrinsic("range", &bounds, node)
}

// ═══════════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════════

/// A bare name as a statement: `Break`, `Continue`, `Exit` or a call without parentheses
fn identifier_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let name = ctx.text(node);
    match name.to_ascii_lowercase().as_str() {
        "break" => control_flow::break_statement(ctx, node),
        "continue" => control_flow::continue_statement(ctx, node),
        "exit" => ctx.lower_return(None, node),
        _ => {
            ctx.call_function(&name, Vec::new(), node.location());
        }
    }
}

/// `Exit(value)` returns; any other call is evaluated for its effect
fn call_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let callee = operands(ctx, node).into_iter().find(|c| c.kind() == "identifier");
    let is_exit = callee.is_some_and(|c| ctx.text(c).eq_ignore_ascii_case("exit"));
    if !is_exit {
        call_expression(ctx, node);
        return;
    }
    let value = node
        .first_of_kind("exprArgs")
        .and_then(|args| operands(ctx, args).into_iter().next());
    ctx.lower_return(value, node);
}

/// `target := value`
fn assignment(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let parts = operands(ctx, node);
    let (Some(target), Some(value)) = (parts.first().copied(), parts.last().copied()) else {
        ctx.malformed("assignment without target or value", node);
        return;
    };
    if parts.len() < 2 {
        ctx.malformed("assignment without value", node);
        return;
    }
    let reg = ctx.lower_expr(value);
    ctx.lower_store_target(target, reg, node);
}

fn declarations(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    for child in ctx.significant_children(node) {
        if matches!(child.kind(), "declVar" | "declConst") {
            declaration(ctx, child);
        }
    }
}

/// `a, b: Integer` / `x: Integer = 5` / `Max = 10`
///
/// The names are the identifiers before the type or `=`; each is declared
/// with the default value, or nil.
fn declaration(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut names = Vec::new();
    for child in node.kids() {
        match child.kind() {
            "identifier" => names.push(child),
            "," | "kComma" => {}
            _ if child.is_extra() => {}
            _ => break,
        }
    }
    let value = node
        .field("defaultValue")
        .or_else(|| node.first_of_kind("defaultValue"))
        .and_then(|d| {
            if d.kind() == "defaultValue" {
                operands(ctx, d).into_iter().next()
            } else {
                Some(d)
            }
        });
    for name in names {
        ctx.lower_declaration(name, value, node);
    }
}

/// `if c then s` / `if c then s else t`
fn if_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let parts = operands(ctx, node);
    if parts.len() < 2 {
        ctx.malformed("if without condition or branch", node);
        return;
    }
    let alternatives: Vec<Node<'_>> = parts.get(2).copied().into_iter().collect();
    ctx.lower_if_parts(Some(parts[0]), Some(parts[1]), &alternatives, node);
}

fn while_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let parts = operands(ctx, node);
    ctx.lower_while_parts(parts.first().copied(), parts.get(1).copied(), node);
}

/// `repeat s1; s2 until cond`: the body is a run of statements, the
/// condition the last operand
fn repeat_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let parts = operands(ctx, node);
    let Some((cond, body)) = parts.split_last() else {
        ctx.malformed("repeat without condition", node);
        return;
    };
    let body_label = ctx.fresh_label("do_body");
    let cond_label = ctx.fresh_label("do_cond");
    let end_label = ctx.fresh_label("do_end");

    ctx.emit_label(&body_label);
    ctx.push_loop(&cond_label, &end_label);
    for stmt in body {
        ctx.lower_stmt(*stmt);
    }
    ctx.pop_loop();

    ctx.emit_label(&cond_label);
    let cond_reg = ctx.lower_expr(*cond);
    ctx.emit_branch_if(cond_reg, &end_label, &body_label, node.location());
    ctx.emit_label(&end_label);
}

/// `for i := a to b do s` / `for i := b downto a do s` / `for x in xs do s`
///
/// `downto` flips the comparison to `>=` and the step to `-`.
fn for_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let mut parts = operands(ctx, node);
    if let Some(first) = parts.first().copied().filter(|p| p.kind() == "assignment") {
        let mut inner = operands(ctx, first);
        inner.truncate(2);
        parts.splice(0..1, inner);
    }
    let Some(body) = parts.last().copied() else {
        ctx.malformed("for without body", node);
        return;
    };

    if has_keyword(node, "kIn") && parts.len() >= 3 {
        let target = parts[0];
        let iterable = ctx.lower_expr(parts[1]);
        ctx.lower_index_loop(
            iterable,
            node,
            |ctx, elem, _| ctx.lower_store_target(target, elem, node),
            |ctx| ctx.lower_body(Some(body)),
        );
        return;
    }
    if parts.len() < 4 {
        ctx.malformed("for without variable or bounds", node);
        ctx.lower_body(Some(body));
        return;
    }
    let var = ctx.text(parts[0]);
    let start = ctx.lower_expr(parts[1]);
    let stop = ctx.lower_expr(parts[2]);
    let descending = has_keyword(node, "kDownto");
    ctx.lower_range_loop(&var, start, stop, true, descending, node, |ctx| {
        ctx.lower_body(Some(body))
    });
}

/// `case x of 1: a; 2, 3: b; 5..9: c; else d end` as an OR-chain of tests
fn case_statement(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let Some(selector) = operands(ctx, node)
        .into_iter()
        .find(|c| !matches!(c.kind(), "caseCase" | "caseElse"))
    else {
        ctx.malformed("case without selector", node);
        return;
    };
    let subject = ctx.lower_expr(selector);

    let mut arms: Vec<(Vec<Node<'_>>, Vec<Node<'_>>)> = Vec::new();
    let mut in_else = false;
    let mut else_body = Vec::new();
    for child in node.kids() {
        match child.kind() {
            "caseCase" => arms.push(case_arm(ctx, child)),
            "caseElse" => else_body.extend(operands(ctx, child)),
            "kElse" => in_else = true,
            "kEnd" => in_else = false,
            kind if in_else && child.is_named() && !ctx.profile().is_skipped(kind) => {
                else_body.push(child)
            }
            _ => {}
        }
    }
    if !else_body.is_empty() {
        arms.push((Vec::new(), else_body));
    }

    ctx.lower_case_chain_with(subject, &arms, CaseStyle::Match, node, |ctx, subject, labels| {
        let mut acc: Option<Register> = None;
        for label in labels {
            let test = label_test(ctx, subject, *label);
            acc = Some(match acc {
                Some(prev) => ctx.binop("||", prev, test, label.location()),
                None => test,
            });
        }
        match acc {
            Some(reg) => reg,
            None => {
                let lit = ctx.literals().true_lit;
                ctx.const_value(lit, SourceLocation::UNKNOWN)
            }
        }
    });
}

/// Labels of one `caseCase` and the statement after its colon
fn case_arm<'t>(ctx: &LoweringContext<'_>, arm: Node<'t>) -> (Vec<Node<'t>>, Vec<Node<'t>>) {
    let parts = operands(ctx, arm);
    let Some((body, labels)) = parts.split_last() else {
        return (Vec::new(), Vec::new());
    };
    let mut values = Vec::new();
    for label in labels {
        if label.kind() == "caseLabel" {
            values.extend(operands(ctx, *label));
        } else {
            values.push(*label);
        }
    }
    (values, vec![*body])
}

/// `subject == v`, or `lo <= subject <= hi` for a range label
fn label_test(ctx: &mut LoweringContext<'_>, subject: Register, label: Node<'_>) -> Register {
    let loc = label.location();
    if label.kind() == "range" {
        let bounds = operands(ctx, label);
        if let [lo, hi] = bounds.as_slice() {
            let lo_reg = ctx.lower_expr(*lo);
            let hi_reg = ctx.lower_expr(*hi);
            let above = ctx.binop(">=", subject, lo_reg, loc);
            let below = ctx.binop("<=", subject, hi_reg, loc);
            return ctx.binop("&&", above, below, loc);
        }
    }
    let value = ctx.lower_expr(label);
    ctx.binop("==", subject, value, loc)
}

// ═══════════════════════════════════════════════════════════════════════════
// Routines
// ═══════════════════════════════════════════════════════════════════════════

/// `procedure P(a: T); begin .. end;` / `function F(a, b: T): R; .. begin .. end;`
///
/// Local declarations are lowered inside the body. A function returns
/// whichever of `Result` or its own name the body assigns.
fn procedure_definition(ctx: &mut LoweringContext<'_>, node: Node<'_>) {
    let header = node.first_of_kind("declProc").unwrap_or(node);
    let name_node = operands(ctx, header)
        .into_iter()
        .find(|c| matches!(c.kind(), "identifier" | "genericDot" | "exprDot"));
    let name = match name_node {
        Some(n) => ctx.text(n),
        None => ctx.anonymous_name(),
    };
    let params = header.first_of_kind("declArgs");
    let locals: Vec<Node<'_>> = operands(ctx, node)
        .into_iter()
        .filter(|c| matches!(c.kind(), "declVars" | "declConsts" | "defProc"))
        .collect();
    let body = node.first_of_kind("block");
    let result = if has_keyword(header, "kFunction") {
        body.and_then(|b| result_variable(ctx, b, &name))
    } else {
        None
    };

    let func_ref = ctx.emit_function(&name, node, |ctx| {
        if let Some(params) = params {
            lower_params(ctx, params);
        }
        for local in locals {
            ctx.lower_stmt(local);
        }
        if let Some(body) = body {
            ctx.lower_stmt(body);
        }
        if let Some(result) = result {
            let value = ctx.load_var(result, SourceLocation::UNKNOWN);
            ctx.emit_effect(Opcode::Return, vec![value.into()], SourceLocation::UNKNOWN);
        }
    });
    ctx.store_var(&name, func_ref, node.location());
}

/// `declArgs` -> `declArg` -> `[var|const] a, b: T`
fn lower_params(ctx: &mut LoweringContext<'_>, params: Node<'_>) {
    for arg in params.named_kids() {
        match arg.kind() {
            "declArg" => {
                for child in arg.kids() {
                    match child.kind() {
                        "identifier" => {
                            let name = ctx.text(child);
                            ctx.emit_param(&name, child.location());
                        }
                        "kColon" | ":" => break,
                        _ => {}
                    }
                }
            }
            "identifier" => {
                let name = ctx.text(arg);
                ctx.emit_param(&name, arg.location());
            }
            _ => {}
        }
    }
}

/// The name a function body assigns its result to, if any
fn result_variable(ctx: &LoweringContext<'_>, body: Node<'_>, name: &str) -> Option<String> {
    let mut stack = vec![body];
    while let Some(node) = stack.pop() {
        if node.kind() == "assignment" {
            if let Some(target) = operands(ctx, node).first() {
                let text = ctx.text(*target);
                if text.eq_ignore_ascii_case("result") || text.eq_ignore_ascii_case(name) {
                    return Some(text);
                }
            }
            continue;
        }
        if node.kind() == "defProc" {
            continue;
        }
        stack.extend(node.named_kids().into_iter().rev());
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;
    use pretty_assertions::assert_eq;

    fn dump(src: &str) -> Vec<String> {
        lower_with_language(LanguageId::Pascal, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    fn assert_supported(ir: &[String]) {
        let bad: Vec<&String> = ir.iter().filter(|l| l.contains("unsupported:")).collect();
        assert!(bad.is_empty(), "unsupported constructs: {:#?}", bad);
    }

    #[test]
    fn test_declaration_and_assignment() {
        let ir = dump("program P;\nvar x: Integer;\nbegin\n  x := 1 + 2 * 3;\nend.\n");
        assert_supported(&ir);
        assert_eq!(ir.first().map(String::as_str), Some("entry:"));
        assert!(ir.contains(&"%0 = const nil".to_string()), "{:#?}", ir);
        assert!(ir.contains(&"store_var x %0".to_string()), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop * ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop + ")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var x ")).count(), 2, "{:#?}", ir);
        assert!(!ir.iter().any(|l| l.starts_with("store_var Integer")), "{:#?}", ir);
    }

    #[test]
    fn test_operator_keywords_are_mapped() {
        let src = "program P;\nbegin\n  if (a <> b) and (a >= 0) then\n    c := a div 2\n  else\n    c := a mod 2;\nend.\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.contains("binop != ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop >= ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop and ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop div ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop mod ")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("branch_if ")).count(), 1, "{:#?}", ir);
    }

    #[test]
    fn test_for_to_and_downto() {
        let up = dump("program P;\nbegin\n  for i := 1 to 10 do\n    s := s + i;\nend.\n");
        assert_supported(&up);
        assert!(up.iter().any(|l| l.contains("binop <= ")), "{:#?}", up);
        assert!(up.iter().any(|l| l.starts_with("store_var i ")), "{:#?}", up);

        let down = dump("program P;\nbegin\n  for i := 10 downto 1 do\n    s := s + i;\nend.\n");
        assert_supported(&down);
        assert!(down.iter().any(|l| l.contains("binop >= ")), "{:#?}", down);
        assert!(down.iter().any(|l| l.contains("binop - ")), "{:#?}", down);
    }

    #[test]
    fn test_case_is_an_or_chain() {
        let src = "program P;\nbegin\n  case x of\n    1: y := 1;\n    2, 3: y := 2;\n  else\n    y := 0;\n  end;\nend.\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert_eq!(ir.iter().filter(|l| l.contains("binop == ")).count(), 3, "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("binop || ")), "{:#?}", ir);
        assert_eq!(ir.iter().filter(|l| l.starts_with("store_var y ")).count(), 3, "{:#?}", ir);
    }

    #[test]
    fn test_function_returns_result() {
        let src = "program P;\nfunction Add(a, b: Integer): Integer;\nbegin\n  Result := a + b;\nend;\nbegin\n  WriteLn(Add(1, 2));\nend.\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.ends_with("= symbolic param:a")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.ends_with("= symbolic param:b")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("store_var Result ")), "{:#?}", ir);
        let load = ir.iter().position(|l| l.ends_with("= load_var Result")).expect("result reload");
        assert!(ir[load + 1].starts_with("return "), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function Add ")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.contains("call_function WriteLn ")), "{:#?}", ir);
    }

    #[test]
    fn test_repeat_until_and_while() {
        let src = "program P;\nbegin\n  repeat\n    n := n - 1\n  until n = 0;\n  while n < 5 do\n    n := n + 1;\nend.\n";
        let ir = dump(src);
        assert_supported(&ir);
        assert!(ir.iter().any(|l| l.starts_with("branch_if ") && l.ends_with(",do_body_0")), "{:#?}", ir);
        assert!(ir.iter().any(|l| l.starts_with("while_cond_")), "{:#?}", ir);
    }
}

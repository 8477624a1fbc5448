//! Mermaid flowchart rendering
//!
//! ```text
//! flowchart TD
//!     entry(["entry<br/>%0 = const 1<br/>branch end_f_1"])
//!     subgraph sg_func_f_0["f"]
//!         func_f_0(["func_f_0<br/>return %1"])
//!     end
//!     entry --> end_f_1
//!     style entry fill:#e8f5e9,stroke:#2e7d32
//! ```
//!
//! Function and class bodies are grouped purely by label prefix
//! (`func_<name>_*` .. `end_<name>_*`, `class_<name>_*` .. `end_class_<name>_*`);
//! the counters on the two ends need not match.

use crate::config::CfgConfig;
use crate::features::flow_graph::domain::{BasicBlock, Cfg, CfgEdgeKind};
use crate::shared::constants::{END_CLASS_LABEL_PREFIX, END_LABEL_PREFIX};
use crate::shared::models::{class_name_of_label, function_name_of_label, strip_counter, Opcode};
use std::fmt::Write;

const INDENT: &str = "    ";
const ENTRY_STYLE: &str = "fill:#e8f5e9,stroke:#2e7d32";
const EXIT_STYLE: &str = "fill:#fdecea,stroke:#c62828";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Function,
    Class,
}

/// Block or nested subgraph, in render order
#[derive(Debug)]
enum Item {
    Block(usize),
    Group {
        kind: GroupKind,
        name: String,
        opener: String,
        items: Vec<Item>,
    },
}

pub struct MermaidRenderer {
    config: CfgConfig,
}

impl MermaidRenderer {
    pub fn new(config: CfgConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, cfg: &Cfg) -> String {
        let mut out = String::from("flowchart TD\n");
        for item in group_blocks(cfg) {
            self.render_item(cfg, &item, 1, &mut out);
        }

        for block in cfg.blocks() {
            let from = node_id(&block.label);
            for edge in &block.edges {
                if !cfg.contains(&edge.target) {
                    continue;
                }
                let to = node_id(&edge.target);
                let arrow = match edge.kind {
                    CfgEdgeKind::Fallthrough | CfgEdgeKind::Unconditional => "-->".to_string(),
                    CfgEdgeKind::True => "-->|T|".to_string(),
                    CfgEdgeKind::False => "-->|F|".to_string(),
                    CfgEdgeKind::Call if self.config.show_call_edges => "-.->|call|".to_string(),
                    CfgEdgeKind::Call => continue,
                };
                let _ = writeln!(out, "{}{} {} {}", INDENT, from, arrow, to);
            }
        }

        for block in cfg.blocks() {
            let style = if block.label == cfg.entry {
                ENTRY_STYLE
            } else if block.is_exit() {
                EXIT_STYLE
            } else {
                continue;
            };
            let _ = writeln!(out, "{}style {} {}", INDENT, node_id(&block.label), style);
        }
        out
    }

    fn render_item(&self, cfg: &Cfg, item: &Item, depth: usize, out: &mut String) {
        let pad = INDENT.repeat(depth);
        match item {
            Item::Block(i) => {
                let block = &cfg.blocks()[*i];
                let _ = writeln!(out, "{}{}", pad, self.node(cfg, block));
            }
            Item::Group {
                kind,
                name,
                opener,
                items,
            } => {
                let title = match kind {
                    GroupKind::Function => escape(name),
                    GroupKind::Class => format!("class {}", escape(name)),
                };
                let _ = writeln!(out, "{}subgraph sg_{}[\"{}\"]", pad, node_id(opener), title);
                for inner in items {
                    self.render_item(cfg, inner, depth + 1, out);
                }
                let _ = writeln!(out, "{}end", pad);
            }
        }
    }

    fn node(&self, cfg: &Cfg, block: &BasicBlock) -> String {
        let text = self.block_text(block);
        let id = node_id(&block.label);
        if block.label == cfg.entry || block.ends_with(Opcode::Return) {
            format!("{}([\"{}\"])", id, text)
        } else if block.ends_with(Opcode::BranchIf) {
            format!("{}{{\"{}\"}}", id, text)
        } else {
            format!("{}[\"{}\"]", id, text)
        }
    }

    /// Label heading plus the (possibly collapsed) instruction lines
    fn block_text(&self, block: &BasicBlock) -> String {
        let lines: Vec<String> = block
            .instructions
            .iter()
            .map(|i| truncate(&i.display_plain(), self.config.summary_max_chars))
            .collect();
        let mut shown: Vec<String> = Vec::with_capacity(self.config.collapse_keep + 3);
        shown.push(escape(&block.label));
        if lines.len() > self.config.collapse_threshold {
            let keep = self.config.collapse_keep;
            shown.extend(lines[..keep].iter().map(|l| escape(l)));
            shown.push(format!("... ({} more)", lines.len() - keep - 1));
            if let Some(last) = lines.last() {
                shown.push(escape(last));
            }
        } else {
            shown.extend(lines.iter().map(|l| escape(l)));
        }
        shown.join("<br/>")
    }
}

impl Default for MermaidRenderer {
    fn default() -> Self {
        Self::new(CfgConfig::default())
    }
}

/// Render with the default configuration
pub fn render_mermaid(cfg: &Cfg) -> String {
    MermaidRenderer::default().render(cfg)
}

/// Escape the characters that break a quoted Mermaid label
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("#quot;"),
            '<' => out.push_str("#lt;"),
            '>' => out.push_str("#gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Mermaid node id for a label: anything outside `[A-Za-z0-9_]` becomes `_`
pub fn node_id(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn truncate(line: &str, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max_chars.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

/// Name closed by an `end_<name>_N` / `end_class_<name>_N` label
fn closer_of(label: &str) -> Option<(GroupKind, &str)> {
    if let Some(rest) = label.strip_prefix(END_CLASS_LABEL_PREFIX) {
        return strip_counter(rest).map(|n| (GroupKind::Class, n));
    }
    let rest = label.strip_prefix(END_LABEL_PREFIX)?;
    strip_counter(rest).map(|n| (GroupKind::Function, n))
}

fn opener_of(label: &str) -> Option<(GroupKind, &str)> {
    if let Some(name) = function_name_of_label(label) {
        return Some((GroupKind::Function, name));
    }
    class_name_of_label(label).map(|n| (GroupKind::Class, n))
}

/// An open subgraph: kind, name, opener label, items so far
type OpenGroup = (GroupKind, String, String, Vec<Item>);

fn push(stack: &mut [OpenGroup], top: &mut Vec<Item>, item: Item) {
    match stack.last_mut() {
        Some(open) => open.3.push(item),
        None => top.push(item),
    }
}

/// Close open groups until only `depth` remain
fn close_above(stack: &mut Vec<OpenGroup>, top: &mut Vec<Item>, depth: usize) {
    while stack.len() > depth {
        let Some((kind, name, opener, items)) = stack.pop() else {
            break;
        };
        let group = Item::Group {
            kind,
            name,
            opener,
            items,
        };
        push(stack, top, group);
    }
}

/// Nest blocks into function / class subgraphs by label prefix
fn group_blocks(cfg: &Cfg) -> Vec<Item> {
    let mut stack: Vec<OpenGroup> = Vec::new();
    let mut top: Vec<Item> = Vec::new();


    for (i, block) in cfg.blocks().iter().enumerate() {
        if let Some((kind, name)) = opener_of(&block.label) {
            stack.push((kind, name.to_string(), block.label.clone(), vec![Item::Block(i)]));
            continue;
        }
        let closes = closer_of(&block.label).and_then(|(kind, name)| {
            stack.iter().rposition(|(k, n, _, _)| *k == kind && n == name)
        });
        match closes {
            Some(depth) => {
                close_above(&mut stack, &mut top, depth + 1);
                push(&mut stack, &mut top, Item::Block(i));
                close_above(&mut stack, &mut top, depth);
            }
            None => push(&mut stack, &mut top, Item::Block(i)),
        }
    }
    close_above(&mut stack, &mut top, 0);
    top
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::infrastructure::builder::{build_cfg, build_full_cfg};
    use crate::shared::models::{BranchTargets, IrInstruction, Operand, Register};
    use pretty_assertions::assert_eq;

    fn konst(reg: u32, text: &str) -> IrInstruction {
        IrInstruction::new(Opcode::Const)
            .with_result(Register(reg))
            .with_operands(vec![Operand::lit(text)])
    }

    fn ret(reg: u32) -> IrInstruction {
        IrInstruction::new(Opcode::Return).with_operands(vec![Register(reg).into()])
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"say "<hi>""#), "say #quot;#lt;hi#gt;#quot;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_full_render() {
        let ir = vec![
            IrInstruction::label("entry"),
            IrInstruction::branch("end_f_1"),
            IrInstruction::label("func_f_0"),
            konst(0, "1"),
            ret(0),
            IrInstruction::label("end_f_1"),
            konst(1, "2"),
        ];
        let text = render_mermaid(&build_cfg(&ir));
        let expected = "\
flowchart TD
    entry([\"entry<br/>branch end_f_1\"])
    subgraph sg_func_f_0[\"f\"]
        func_f_0([\"func_f_0<br/>%0 = const 1<br/>return %0\"])
        end_f_1[\"end_f_1<br/>%1 = const 2\"]
    end
    entry --> end_f_1
    style entry fill:#e8f5e9,stroke:#2e7d32
    style func_f_0 fill:#fdecea,stroke:#c62828
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_mismatched_counters_still_group() {
        let ir = vec![
            IrInstruction::label("entry"),
            IrInstruction::branch("end_foo_7"),
            IrInstruction::label("func_foo_0"),
            ret(0),
            IrInstruction::label("end_foo_7"),
        ];
        let text = render_mermaid(&build_cfg(&ir));
        assert!(text.contains("subgraph sg_func_foo_0[\"foo\"]"), "{}", text);
        let open = text.find("subgraph").unwrap();
        let close = text[open..].find("\n    end\n").unwrap() + open;
        assert!(text[open..close].contains("end_foo_7[\"end_foo_7\"]"), "{}", text);
    }

    #[test]
    fn test_diamond_and_labels() {
        let ir = vec![
            IrInstruction::label("entry"),
            konst(0, "True"),
            IrInstruction::branch("check"),
            IrInstruction::label("check"),
            IrInstruction::branch_if(Register(0), BranchTargets::new("yes", "no")),
            IrInstruction::label("yes"),
            ret(0),
            IrInstruction::label("no"),
            ret(0),
        ];
        let text = render_mermaid(&build_cfg(&ir));
        assert!(text.contains("    check{\"check<br/>branch_if %0 yes,no\"}"), "{}", text);
        assert!(text.contains("    check -->|T| yes"), "{}", text);
        assert!(text.contains("    check -->|F| no"), "{}", text);
    }

    #[test]
    fn test_long_block_is_collapsed() {
        let mut ir = vec![IrInstruction::label("entry")];
        for r in 0..9 {
            ir.push(konst(r, &r.to_string()));
        }
        ir.push(ret(8));
        let text = render_mermaid(&build_cfg(&ir));
        let expected = "entry([\"entry<br/>%0 = const 0<br/>%1 = const 1<br/>%2 = const 2\
<br/>%3 = const 3<br/>... (5 more)<br/>return %8\"])";
        assert!(text.contains(expected), "{}", text);
    }

    #[test]
    fn test_class_with_method_nests() {
        let ir = vec![
            IrInstruction::label("entry"),
            IrInstruction::branch("end_class_A_1"),
            IrInstruction::label("class_A_0"),
            IrInstruction::branch("end_m_3"),
            IrInstruction::label("func_m_2"),
            ret(0),
            IrInstruction::label("end_m_3"),
            IrInstruction::label("end_class_A_1"),
        ];
        // Class bodies are not roots, so render the unpruned graph
        let text = render_mermaid(&build_full_cfg(&ir));
        let class_at = text.find("subgraph sg_class_A_0[\"class A\"]").expect(&text);
        let func_at = text.find("        subgraph sg_func_m_2[\"m\"]").expect(&text);
        assert!(class_at < func_at);
    }
}

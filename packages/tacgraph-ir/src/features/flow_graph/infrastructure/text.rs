//! Plain-text block listing, for diffing and terminals

use crate::features::flow_graph::domain::Cfg;
use std::fmt::Write;

/// ```text
/// entry:
///     %0 = const 1
///     branch_if %0 if_true_0,if_end_1
///     -> if_true_0 [true]
///     -> if_end_1 [false]
/// ```
pub fn render_text(cfg: &Cfg) -> String {
    let mut out = String::new();
    for block in cfg.blocks() {
        let _ = writeln!(out, "{}:", block.label);
        for inst in &block.instructions {
            let _ = writeln!(out, "    {}", inst.display_plain());
        }
        for edge in &block.edges {
            let _ = writeln!(out, "    -> {} [{}]", edge.target, edge.kind);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::infrastructure::builder::build_cfg;
    use crate::shared::models::IrInstruction;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_listing() {
        let ir = vec![
            IrInstruction::label("a"),
            IrInstruction::branch("b"),
            IrInstruction::label("b"),
        ];
        assert_eq!(
            render_text(&build_cfg(&ir)),
            "a:\n    branch b\n    -> b [unconditional]\nb:\n"
        );
    }
}

//! Register / label renumbering and fragment merging
//!
//! Lowered units each number registers from `%0` and labels from counter 0,
//! so two units cannot be concatenated as-is. Renumbering shifts registers
//! by an offset and relabels:
//! - a label ending in a numeric counter (`if_true_3`, `func_foo_0`) keeps
//!   its stem and gets `counter + label_offset`, which preserves the
//!   `func_<name>_<n>` grouping convention
//! - a label without a counter (`entry`) gets `label_suffix` appended
//!
//! BRANCH_IF keeps its two-target shape; only the names change.

use crate::shared::models::{DefinitionRef, IrInstruction, LabelRef, Operand};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrRenumberer {
    pub register_offset: u32,
    pub label_offset: u32,
    pub label_suffix: String,
}

/// Renumbered stream plus the first free register / label counter after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenumberOutcome {
    pub instructions: Vec<IrInstruction>,
    pub next_register: u32,
    pub next_label: u32,
}

impl IrRenumberer {
    pub fn new(register_offset: u32, label_offset: u32, label_suffix: impl Into<String>) -> Self {
        Self {
            register_offset,
            label_offset,
            label_suffix: label_suffix.into(),
        }
    }

    pub fn rename_label(&self, label: &str) -> String {
        match split_counter(label) {
            Some((stem, counter)) => format!("{}_{}", stem, counter + self.label_offset),
            None => format!("{}{}", label, self.label_suffix),
        }
    }

    pub fn apply(&self, instructions: &[IrInstruction]) -> RenumberOutcome {
        let mut max_register: Option<u32> = None;
        let mut max_counter: Option<u32> = None;
        let mut note_label = |label: &str| {
            if let Some((_, counter)) = split_counter(label) {
                max_counter = Some(max_counter.map_or(counter, |m| m.max(counter)));
            }
        };

        let mut out = Vec::with_capacity(instructions.len());
        for inst in instructions {
            let mut renamed = inst.clone();
            if let Some(reg) = inst.result_reg {
                max_register = Some(max_register.map_or(reg.0, |m| m.max(reg.0)));
                renamed.result_reg = Some(reg.offset(self.register_offset));
            }
            renamed.operands = inst
                .operands
                .iter()
                .map(|op| match op {
                    Operand::Register(r) => {
                        max_register = Some(max_register.map_or(r.0, |m| m.max(r.0)));
                        Operand::Register(r.offset(self.register_offset))
                    }
                    Operand::Definition(d) => {
                        note_label(&d.label);
                        Operand::Definition(DefinitionRef {
                            kind: d.kind,
                            name: d.name.clone(),
                            label: self.rename_label(&d.label),
                        })
                    }
                    Operand::Literal(_) => op.clone(),
                })
                .collect();
            renamed.label = inst.label.as_ref().map(|label| match label {
                LabelRef::Name(name) => {
                    note_label(name);
                    LabelRef::Name(self.rename_label(name))
                }
                LabelRef::Branch(targets) => {
                    note_label(&targets.on_true);
                    note_label(&targets.on_false);
                    let mut targets = targets.clone();
                    targets.on_true = self.rename_label(&targets.on_true);
                    targets.on_false = self.rename_label(&targets.on_false);
                    LabelRef::Branch(targets)
                }
            });
            out.push(renamed);
        }

        RenumberOutcome {
            instructions: out,
            next_register: self.register_offset + max_register.map_or(0, |m| m + 1),
            next_label: self.label_offset + max_counter.map_or(0, |m| m + 1),
        }
    }
}

/// Concatenate independently lowered fragments without register or label
/// collisions. The first fragment is unchanged; later fragments are shifted
/// past everything before them and their counter-less labels get `_frag<k>`.
pub fn merge_fragments(fragments: &[Vec<IrInstruction>]) -> Vec<IrInstruction> {
    let mut merged = Vec::with_capacity(fragments.iter().map(Vec::len).sum());
    let mut next_register = 0;
    let mut next_label = 0;
    for (k, fragment) in fragments.iter().enumerate() {
        let suffix = if k == 0 { String::new() } else { format!("_frag{}", k) };
        let outcome = IrRenumberer::new(next_register, next_label, suffix).apply(fragment);
        next_register = outcome.next_register;
        next_label = outcome.next_label;
        merged.extend(outcome.instructions);
    }
    tracing::debug!(
        "merged {} fragments into {} instructions ({} registers)",
        fragments.len(),
        merged.len(),
        next_register
    );
    merged
}

/// `stem_<digits>` -> `(stem, n)`
fn split_counter(label: &str) -> Option<(&str, u32)> {
    let (stem, counter) = label.rsplit_once('_')?;
    if stem.is_empty() || counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    counter.parse().ok().map(|n| (stem, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{BranchTargets, Opcode, Register};
    use pretty_assertions::assert_eq;

    fn fragment() -> Vec<IrInstruction> {
        vec![
            IrInstruction::label("entry"),
            IrInstruction::new(Opcode::Const)
                .with_result(Register(0))
                .with_operands(vec![Operand::lit("1")]),
            IrInstruction::branch_if(Register(0), BranchTargets::new("if_true_0", "if_end_1")),
            IrInstruction::label("if_true_0"),
            IrInstruction::new(Opcode::Const)
                .with_result(Register(1))
                .with_operands(vec![DefinitionRef::function("f", "func_f_2").into()]),
            IrInstruction::label("if_end_1"),
        ]
    }

    #[test]
    fn test_rename_label() {
        let r = IrRenumberer::new(0, 10, "_x");
        assert_eq!(r.rename_label("if_true_0"), "if_true_10");
        assert_eq!(r.rename_label("func_my_fn_3"), "func_my_fn_13");
        assert_eq!(r.rename_label("entry"), "entry_x");
    }

    #[test]
    fn test_apply_shifts_everything() {
        let out = IrRenumberer::new(5, 3, "_b").apply(&fragment());
        let text: Vec<String> = out.instructions.iter().map(|i| i.display_plain()).collect();
        assert_eq!(
            text,
            vec![
                "entry_b:",
                "%5 = const 1",
                "branch_if %5 if_true_3,if_end_4",
                "if_true_3:",
                "%6 = const <function:f@func_f_5>",
                "if_end_4:",
            ]
        );
        assert_eq!(out.next_register, 7);
        assert_eq!(out.next_label, 6);
    }

    #[test]
    fn test_identity_renumbering() {
        let out = IrRenumberer::default().apply(&fragment());
        assert_eq!(out.instructions, fragment());
        assert_eq!(out.next_register, 2);
    }

    #[test]
    fn test_merge_has_one_entry() {
        let merged = merge_fragments(&[fragment(), fragment()]);
        let labels: Vec<&str> = merged
            .iter()
            .filter(|i| i.is_label())
            .filter_map(|i| i.label_name())
            .collect();
        assert_eq!(
            labels,
            vec!["entry", "if_true_0", "if_end_1", "entry_frag1", "if_true_3", "if_end_4"]
        );
        assert_eq!(merged[7].result_reg, Some(Register(2)));
    }
}

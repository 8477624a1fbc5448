//! Structural checks over a lowered instruction stream

use crate::shared::constants::ENTRY_LABEL;
use crate::shared::models::{IrInstruction, LabelRef, Opcode};
use rustc_hash::FxHashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// First instruction is not `LABEL entry`
    MissingEntry,
    ProducerWithoutResult,
    ConsumerWithResult,
    /// Result registers not handed out as 0, 1, 2, ...
    RegisterOutOfOrder,
    /// Operand register never produced earlier in the stream
    UndefinedRegister,
    /// BRANCH / BRANCH_IF / LABEL with a missing or misshapen label slot
    MalformedLabel,
    /// Branch target that no LABEL defines
    UnknownLabel,
    DuplicateLabel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrViolation {
    pub index: usize,
    pub kind: ViolationKind,
    pub message: String,
}

impl fmt::Display for IrViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {:?}: {}", self.index, self.kind, self.message)
    }
}

/// Every invariant violation, in stream order; empty for a well-formed unit
pub fn validate(instructions: &[IrInstruction]) -> Vec<IrViolation> {
    let mut violations = Vec::new();
    let mut report = |index: usize, kind: ViolationKind, message: String| {
        violations.push(IrViolation {
            index,
            kind,
            message,
        });
    };

    if instructions.first().and_then(|i| i.label_name()) != Some(ENTRY_LABEL)
        || instructions.first().is_some_and(|i| !i.is_label())
    {
        report(0, ViolationKind::MissingEntry, "stream must start with LABEL entry".into());
    }

    let mut defined_labels: FxHashSet<&str> = FxHashSet::default();
    for (idx, inst) in instructions.iter().enumerate() {
        if let (true, Some(name)) = (inst.is_label(), inst.label_name()) {
            if !defined_labels.insert(name) {
                report(idx, ViolationKind::DuplicateLabel, format!("label '{}' defined twice", name));
            }
        }
    }

    let mut next_register = 0u32;
    let mut produced = FxHashSet::default();
    for (idx, inst) in instructions.iter().enumerate() {
        let text = inst.display_plain();
        for reg in inst.used_registers() {
            if !produced.contains(&reg) {
                report(idx, ViolationKind::UndefinedRegister, format!("{} used in '{}'", reg, text));
            }
        }

        match (inst.opcode.is_producer(), inst.result_reg) {
            (true, None) => {
                report(idx, ViolationKind::ProducerWithoutResult, text.clone());
            }
            (false, Some(_)) => {
                report(idx, ViolationKind::ConsumerWithResult, text.clone());
            }
            (true, Some(reg)) => {
                if reg.0 != next_register {
                    report(
                        idx,
                        ViolationKind::RegisterOutOfOrder,
                        format!("expected %{} in '{}'", next_register, text),
                    );
                }
                next_register = next_register.max(reg.0 + 1);
                produced.insert(reg);
            }
            (false, None) => {}
        }

        let targets: Vec<&str> = match (inst.opcode, &inst.label) {
            (Opcode::Label, Some(LabelRef::Name(name))) if !name.is_empty() => Vec::new(),
            (Opcode::Branch, Some(LabelRef::Name(name))) if !name.is_empty() => vec![name.as_str()],
            (Opcode::BranchIf, Some(LabelRef::Branch(t)))
                if !t.on_true.is_empty() && !t.on_false.is_empty() =>
            {
                vec![t.on_true.as_str(), t.on_false.as_str()]
            }
            (Opcode::Label | Opcode::Branch | Opcode::BranchIf, _) => {
                report(idx, ViolationKind::MalformedLabel, text.clone());
                Vec::new()
            }
            (_, Some(_)) => {
                report(idx, ViolationKind::MalformedLabel, format!("unexpected label on '{}'", text));
                Vec::new()
            }
            (_, None) => Vec::new(),
        };
        for target in targets {
            if !defined_labels.contains(target) {
                report(idx, ViolationKind::UnknownLabel, format!("'{}' in '{}'", target, text));
            }
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{BranchTargets, Operand, Register};

    fn konst(reg: u32) -> IrInstruction {
        IrInstruction::new(Opcode::Const)
            .with_result(Register(reg))
            .with_operands(vec![Operand::lit("1")])
    }

    fn kinds(ir: &[IrInstruction]) -> Vec<ViolationKind> {
        validate(ir).into_iter().map(|v| v.kind).collect()
    }

    #[test]
    fn test_well_formed() {
        let ir = vec![
            IrInstruction::label("entry"),
            konst(0),
            IrInstruction::branch_if(Register(0), BranchTargets::new("a", "b")),
            IrInstruction::label("a"),
            IrInstruction::label("b"),
        ];
        assert!(validate(&ir).is_empty(), "{:?}", validate(&ir));
    }

    #[test]
    fn test_missing_entry_and_gap() {
        let ir = vec![konst(0), konst(2)];
        assert_eq!(
            kinds(&ir),
            vec![ViolationKind::MissingEntry, ViolationKind::RegisterOutOfOrder]
        );
    }

    #[test]
    fn test_unknown_target_and_undefined_register() {
        let ir = vec![
            IrInstruction::label("entry"),
            IrInstruction::branch_if(Register(4), BranchTargets::new("x", "y")),
        ];
        assert_eq!(
            kinds(&ir),
            vec![
                ViolationKind::UndefinedRegister,
                ViolationKind::UnknownLabel,
                ViolationKind::UnknownLabel
            ]
        );
    }

    #[test]
    fn test_shape_violations() {
        let ir = vec![
            IrInstruction::label("entry"),
            IrInstruction::new(Opcode::Const),
            IrInstruction::new(Opcode::Return).with_result(Register(0)),
            IrInstruction::label("entry"),
        ];
        assert_eq!(
            kinds(&ir),
            vec![
                ViolationKind::DuplicateLabel,
                ViolationKind::ProducerWithoutResult,
                ViolationKind::ConsumerWithResult
            ]
        );
    }
}

//! Opcode histograms

use crate::shared::models::{IrInstruction, Opcode};
use std::collections::{BTreeMap, BTreeSet};

/// Instruction count per opcode, in opcode order
pub fn count_opcodes(instructions: &[IrInstruction]) -> BTreeMap<Opcode, usize> {
    let mut counts = BTreeMap::new();
    for inst in instructions {
        *counts.entry(inst.opcode).or_insert(0) += 1;
    }
    counts
}

/// Distinct opcodes present
pub fn opcode_set(instructions: &[IrInstruction]) -> BTreeSet<Opcode> {
    instructions.iter().map(|i| i.opcode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Operand, Register};

    #[test]
    fn test_count_opcodes() {
        let ir = vec![
            IrInstruction::label("entry"),
            IrInstruction::new(Opcode::Const)
                .with_result(Register(0))
                .with_operands(vec![Operand::lit("1")]),
            IrInstruction::new(Opcode::Const)
                .with_result(Register(1))
                .with_operands(vec![Operand::lit("2")]),
        ];
        let counts = count_opcodes(&ir);
        assert_eq!(counts.get(&Opcode::Const), Some(&2));
        assert_eq!(counts.get(&Opcode::Label), Some(&1));
        assert_eq!(counts.len(), 2);
        assert_eq!(opcode_set(&ir).len(), 2);
    }
}

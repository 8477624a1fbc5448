//! IR utilities: statistics, renumbering / merging, invariant checks

pub mod opcode_stats;
pub mod renumber;
pub mod validate;

pub use opcode_stats::{count_opcodes, opcode_set};
pub use renumber::{merge_fragments, IrRenumberer, RenumberOutcome};
pub use validate::{validate, IrViolation, ViolationKind};

//! Shared models

mod error;
pub mod ir;
mod span;

pub use error::{ErrorKind, Result, TacError};
pub use ir::{
    class_name_of_label, function_name_of_label, param_marker, param_name, strip_counter,
    BranchTargets, DefinitionKind, DefinitionRef, IrInstruction, LabelRef, Opcode, Operand,
    Register,
};
pub use span::SourceLocation;

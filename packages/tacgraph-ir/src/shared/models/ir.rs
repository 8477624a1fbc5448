//! Flattened three-address-code IR
//!
//! One instruction shape for every source language:
//! `[%r =] OPCODE operands... [label]`.
//!
//! Invariants upheld by every producer of IR in this crate:
//! - producer opcodes always carry a `result_reg`, consumers never do
//! - registers are handed out in strictly increasing order from `%0`
//!   within one lowering call and are never reassigned; a value that
//!   changes across loop iterations lives in a named slot
//!   (STORE_VAR / LOAD_VAR), never in a register
//! - the first instruction of a lowered unit is `LABEL entry`

use super::span::SourceLocation;
use crate::shared::constants::{CLASS_LABEL_PREFIX, FUNC_LABEL_PREFIX, PARAM_PREFIX};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════════
// Opcode
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    // Value producers
    Const,
    LoadVar,
    LoadField,
    LoadIndex,
    NewObject,
    NewArray,
    Binop,
    Unop,
    CallFunction,
    CallMethod,
    CallUnknown,
    Symbolic,
    // Consumers / control flow
    StoreVar,
    StoreField,
    StoreIndex,
    BranchIf,
    Branch,
    Return,
    Throw,
    // Pseudo-instruction
    Label,
}

impl Opcode {
    pub const ALL: [Opcode; 20] = [
        Opcode::Const,
        Opcode::LoadVar,
        Opcode::LoadField,
        Opcode::LoadIndex,
        Opcode::NewObject,
        Opcode::NewArray,
        Opcode::Binop,
        Opcode::Unop,
        Opcode::CallFunction,
        Opcode::CallMethod,
        Opcode::CallUnknown,
        Opcode::Symbolic,
        Opcode::StoreVar,
        Opcode::StoreField,
        Opcode::StoreIndex,
        Opcode::BranchIf,
        Opcode::Branch,
        Opcode::Return,
        Opcode::Throw,
        Opcode::Label,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Const => "CONST",
            Opcode::LoadVar => "LOAD_VAR",
            Opcode::LoadField => "LOAD_FIELD",
            Opcode::LoadIndex => "LOAD_INDEX",
            Opcode::NewObject => "NEW_OBJECT",
            Opcode::NewArray => "NEW_ARRAY",
            Opcode::Binop => "BINOP",
            Opcode::Unop => "UNOP",
            Opcode::CallFunction => "CALL_FUNCTION",
            Opcode::CallMethod => "CALL_METHOD",
            Opcode::CallUnknown => "CALL_UNKNOWN",
            Opcode::Symbolic => "SYMBOLIC",
            Opcode::StoreVar => "STORE_VAR",
            Opcode::StoreField => "STORE_FIELD",
            Opcode::StoreIndex => "STORE_INDEX",
            Opcode::BranchIf => "BRANCH_IF",
            Opcode::Branch => "BRANCH",
            Opcode::Return => "RETURN",
            Opcode::Throw => "THROW",
            Opcode::Label => "LABEL",
        }
    }

    /// Lower-case mnemonic used in the textual instruction form
    pub fn mnemonic(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    /// Opcodes that write a fresh register
    pub fn is_producer(&self) -> bool {
        matches!(
            self,
            Opcode::Const
                | Opcode::LoadVar
                | Opcode::LoadField
                | Opcode::LoadIndex
                | Opcode::NewObject
                | Opcode::NewArray
                | Opcode::Binop
                | Opcode::Unop
                | Opcode::CallFunction
                | Opcode::CallMethod
                | Opcode::CallUnknown
                | Opcode::Symbolic
        )
    }

    /// Opcodes that end a basic block
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Opcode::Branch | Opcode::BranchIf | Opcode::Return | Opcode::Throw
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Opcode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == upper)
            .ok_or_else(|| format!("Unknown opcode '{}'", s))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Registers and operands
// ═══════════════════════════════════════════════════════════════════════════

/// Single-assignment value slot, printed as `%N`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Register(pub u32);

impl Register {
    pub fn index(&self) -> u32 {
        self.0
    }

    /// Parse the `%N` textual form
    pub fn parse(text: &str) -> Option<Register> {
        text.strip_prefix('%')?.parse().ok().map(Register)
    }

    pub fn offset(&self, by: u32) -> Register {
        Register(self.0 + by)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Function,
    Class,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Function => "function",
            DefinitionKind::Class => "class",
        }
    }
}

/// Value of a defined function or class: `<function:name@label>`.
///
/// The label points at the body's opening LABEL, which is how later stages
/// resolve a call to something defined earlier in the same unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionRef {
    pub kind: DefinitionKind,
    pub name: String,
    pub label: String,
}

static FUNC_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<function:([\w$.]+)@(\w+)>$").expect("valid regex"));
static CLASS_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<class:([\w$.]+)@(\w+)>$").expect("valid regex"));

impl DefinitionRef {
    pub fn function(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: DefinitionKind::Function,
            name: name.into(),
            label: label.into(),
        }
    }

    pub fn class(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: DefinitionKind::Class,
            name: name.into(),
            label: label.into(),
        }
    }

    /// Parse `<function:name@label>` / `<class:name@label>`
    pub fn parse(text: &str) -> Option<Self> {
        if let Some(caps) = FUNC_REF_RE.captures(text) {
            return Some(Self::function(&caps[1], &caps[2]));
        }
        CLASS_REF_RE
            .captures(text)
            .map(|caps| Self::class(&caps[1], &caps[2]))
    }
}

impl fmt::Display for DefinitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}@{}>", self.kind.as_str(), self.name, self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Operand {
    Register(Register),
    Literal(String),
    Definition(DefinitionRef),
}

impl Operand {
    pub fn lit(text: impl Into<String>) -> Self {
        Operand::Literal(text.into())
    }

    pub fn as_register(&self) -> Option<Register> {
        match self {
            Operand::Register(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Operand::Literal(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Register> for Operand {
    fn from(r: Register) -> Self {
        Operand::Register(r)
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Literal(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Literal(s)
    }
}

impl From<DefinitionRef> for Operand {
    fn from(d: DefinitionRef) -> Self {
        Operand::Definition(d)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r),
            Operand::Literal(s) => f.write_str(s),
            Operand::Definition(d) => write!(f, "{}", d),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Labels and branch targets
// ═══════════════════════════════════════════════════════════════════════════

/// The two successors of a BRANCH_IF; serialised as `"on_true,on_false"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchTargets {
    pub on_true: String,
    pub on_false: String,
}

impl BranchTargets {
    pub fn new(on_true: impl Into<String>, on_false: impl Into<String>) -> Self {
        Self {
            on_true: on_true.into(),
            on_false: on_false.into(),
        }
    }

    /// Parse the comma-joined compatibility form. Requires exactly one comma
    /// and two non-empty names.
    pub fn parse(text: &str) -> Option<Self> {
        let (t, f) = text.split_once(',')?;
        let (t, f) = (t.trim(), f.trim());
        if t.is_empty() || f.is_empty() || f.contains(',') {
            return None;
        }
        Some(Self::new(t, f))
    }
}

impl fmt::Display for BranchTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.on_true, self.on_false)
    }
}

/// Label slot of an instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelRef {
    /// LABEL name or BRANCH target
    Name(String),
    /// BRANCH_IF targets
    Branch(BranchTargets),
}

impl fmt::Display for LabelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelRef::Name(name) => f.write_str(name),
            LabelRef::Branch(targets) => write!(f, "{}", targets),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Instruction
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrInstruction {
    pub opcode: Opcode,
    pub result_reg: Option<Register>,
    pub operands: Vec<Operand>,
    pub label: Option<LabelRef>,
    #[serde(default, skip_serializing_if = "SourceLocation::is_unknown")]
    pub location: SourceLocation,
}

impl IrInstruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            result_reg: None,
            operands: Vec::new(),
            label: None,
            location: SourceLocation::UNKNOWN,
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        let mut inst = Self::new(Opcode::Label);
        inst.label = Some(LabelRef::Name(name.into()));
        inst
    }

    pub fn branch(target: impl Into<String>) -> Self {
        let mut inst = Self::new(Opcode::Branch);
        inst.label = Some(LabelRef::Name(target.into()));
        inst
    }

    pub fn branch_if(condition: Register, targets: BranchTargets) -> Self {
        let mut inst = Self::new(Opcode::BranchIf);
        inst.operands.push(Operand::Register(condition));
        inst.label = Some(LabelRef::Branch(targets));
        inst
    }

    pub fn with_result(mut self, reg: Register) -> Self {
        self.result_reg = Some(reg);
        self
    }

    pub fn with_operands(mut self, operands: Vec<Operand>) -> Self {
        self.operands = operands;
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = location;
        self
    }

    pub fn is_label(&self) -> bool {
        self.opcode == Opcode::Label
    }

    /// Name carried by a LABEL or BRANCH
    pub fn label_name(&self) -> Option<&str> {
        match &self.label {
            Some(LabelRef::Name(name)) => Some(name),
            _ => None,
        }
    }

    pub fn branch_targets(&self) -> Option<&BranchTargets> {
        match &self.label {
            Some(LabelRef::Branch(targets)) => Some(targets),
            _ => None,
        }
    }

    /// Registers read by this instruction, in operand order
    pub fn used_registers(&self) -> impl Iterator<Item = Register> + '_ {
        self.operands.iter().filter_map(Operand::as_register)
    }

    /// First operand as a literal string (variable name, operator, callee)
    pub fn first_literal(&self) -> Option<&str> {
        self.operands.first().and_then(Operand::as_literal)
    }

    /// Textual form without the trailing source location
    pub fn display_plain(&self) -> String {
        if self.is_label() {
            return format!("{}:", self.label.as_ref().map(|l| l.to_string()).unwrap_or_default());
        }
        let mut parts: Vec<String> = Vec::with_capacity(self.operands.len() + 3);
        if let Some(reg) = self.result_reg {
            parts.push(format!("{} =", reg));
        }
        parts.push(self.opcode.mnemonic());
        parts.extend(self.operands.iter().map(|op| op.to_string()));
        if let Some(label) = &self.label {
            parts.push(label.to_string());
        }
        parts.join(" ")
    }
}

impl fmt::Display for IrInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_plain())?;
        if !self.is_label() && !self.location.is_unknown() {
            write!(f, "  # {}", self.location)?;
        }
        Ok(())
    }
}

/// `param:<name>` marker text
pub fn param_marker(name: &str) -> String {
    format!("{}{}", PARAM_PREFIX, name)
}

/// Parameter name encoded by a `SYMBOLIC "param:<name>"` instruction
pub fn param_name(inst: &IrInstruction) -> Option<&str> {
    if inst.opcode != Opcode::Symbolic {
        return None;
    }
    inst.first_literal()?.strip_prefix(PARAM_PREFIX)
}

/// Function name encoded in a `func_<name>_<n>` label
pub fn function_name_of_label(label: &str) -> Option<&str> {
    strip_counter(label.strip_prefix(FUNC_LABEL_PREFIX)?)
}

/// Class name encoded in a `class_<name>_<n>` label
pub fn class_name_of_label(label: &str) -> Option<&str> {
    strip_counter(label.strip_prefix(CLASS_LABEL_PREFIX)?)
}

/// `name_12` -> `name`; `None` unless a numeric counter suffix is present
pub fn strip_counter(text: &str) -> Option<&str> {
    let (name, counter) = text.rsplit_once('_')?;
    if name.is_empty() || counter.is_empty() || !counter.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_roundtrip_names() {
        for op in Opcode::ALL {
            assert_eq!(op.as_str().parse::<Opcode>().unwrap(), op);
            assert_eq!(op.mnemonic().parse::<Opcode>().unwrap(), op);
        }
        assert!("JUMP".parse::<Opcode>().is_err());
    }

    #[test]
    fn test_producer_consumer_split() {
        let producers = Opcode::ALL.iter().filter(|op| op.is_producer()).count();
        assert_eq!(producers, 12);
        assert!(!Opcode::Label.is_producer());
        assert!(Opcode::Throw.is_terminator());
        assert!(!Opcode::StoreVar.is_terminator());
    }

    #[test]
    fn test_register_parse() {
        assert_eq!(Register::parse("%17"), Some(Register(17)));
        assert_eq!(Register::parse("17"), None);
        assert_eq!(Register::parse("%x"), None);
        assert_eq!(Register(3).to_string(), "%3");
    }

    #[test]
    fn test_definition_ref_roundtrip() {
        let func = DefinitionRef::function("fib", "func_fib_0");
        assert_eq!(func.to_string(), "<function:fib@func_fib_0>");
        assert_eq!(DefinitionRef::parse(&func.to_string()), Some(func));

        let class = DefinitionRef::parse("<class:Point@class_Point_2>").unwrap();
        assert_eq!(class.kind, DefinitionKind::Class);
        assert_eq!(class.name, "Point");
        assert_eq!(class.label, "class_Point_2");

        assert!(DefinitionRef::parse("<method:x@y>").is_none());
    }

    #[test]
    fn test_branch_targets_parse() {
        let t = BranchTargets::parse("if_true_0,if_false_1").unwrap();
        assert_eq!(t.on_true, "if_true_0");
        assert_eq!(t.on_false, "if_false_1");
        assert_eq!(t.to_string(), "if_true_0,if_false_1");
        assert!(BranchTargets::parse("a").is_none());
        assert!(BranchTargets::parse("a,").is_none());
        assert!(BranchTargets::parse("a,b,c").is_none());
    }

    #[test]
    fn test_instruction_text() {
        let c = IrInstruction::new(Opcode::Const)
            .with_result(Register(0))
            .with_operands(vec!["5".into()]);
        assert_eq!(c.to_string(), "%0 = const 5");

        let store = IrInstruction::new(Opcode::StoreVar)
            .with_operands(vec!["x".into(), Register(0).into()])
            .with_location(SourceLocation::new(2, 0, 2, 5));
        assert_eq!(store.to_string(), "store_var x %0  # 2:0-2:5");
        assert_eq!(store.display_plain(), "store_var x %0");

        let br = IrInstruction::branch_if(Register(1), BranchTargets::new("a", "b"));
        assert_eq!(br.to_string(), "branch_if %1 a,b");

        assert_eq!(IrInstruction::label("entry").to_string(), "entry:");
        assert_eq!(IrInstruction::branch("end_f_1").to_string(), "branch end_f_1");
    }

    #[test]
    fn test_label_name_helpers() {
        assert_eq!(function_name_of_label("func_foo_0"), Some("foo"));
        assert_eq!(function_name_of_label("func_my_func_12"), Some("my_func"));
        assert_eq!(class_name_of_label("class_Dog_3"), Some("Dog"));
        assert_eq!(function_name_of_label("if_true_0"), None);
        assert_eq!(strip_counter("foo"), None);
    }

    #[test]
    fn test_param_marker() {
        let inst = IrInstruction::new(Opcode::Symbolic)
            .with_result(Register(0))
            .with_operands(vec![param_marker("n").into()]);
        assert_eq!(param_name(&inst), Some("n"));
    }
}

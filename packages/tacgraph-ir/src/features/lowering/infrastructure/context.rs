//! Per-call lowering state
//!
//! A `LoweringContext` owns everything one lowering call mutates: register
//! and label counters, the output buffer, and the loop / break-target
//! stacks. It is created fresh for every unit and threaded by `&mut`
//! through every handler, so independent units can be lowered in parallel.

use crate::config::LoweringConfig;
use crate::features::lowering::domain::{LoopTargets, SyntaxNode};
use crate::features::lowering::ports::{FieldNames, LanguageProfile, Literals};
use crate::shared::constants::UNSUPPORTED_PREFIX;
use crate::shared::models::{
    BranchTargets, IrInstruction, Opcode, Operand, Register, SourceLocation,
};
use rustc_hash::FxHashMap;
use tree_sitter::Node;

pub struct LoweringContext<'a> {
    profile: &'a dyn LanguageProfile,
    source: &'a [u8],
    config: LoweringConfig,
    next_register: u32,
    next_label: u32,
    instructions: Vec<IrInstruction>,
    loops: Vec<LoopTargets>,
    break_targets: Vec<String>,
    /// Source-level `goto` labels of the function being lowered
    user_labels: FxHashMap<String, String>,
    pub(crate) depth: usize,
}

impl<'a> LoweringContext<'a> {
    pub fn new(profile: &'a dyn LanguageProfile, source: &'a [u8], config: LoweringConfig) -> Self {
        Self {
            profile,
            source,
            config,
            next_register: 0,
            next_label: 0,
            instructions: Vec::new(),
            loops: Vec::new(),
            break_targets: Vec::new(),
            user_labels: FxHashMap::default(),
            depth: 0,
        }
    }

    /// Hand back the finished instruction stream
    pub fn finish(self) -> Vec<IrInstruction> {
        self.instructions
    }

    pub fn instructions(&self) -> &[IrInstruction] {
        &self.instructions
    }

    pub fn profile(&self) -> &'a dyn LanguageProfile {
        self.profile
    }

    pub fn literals(&self) -> Literals {
        *self.profile.literals()
    }

    pub fn fields(&self) -> FieldNames {
        *self.profile.fields()
    }

    pub fn config(&self) -> &LoweringConfig {
        &self.config
    }

    /// Number of registers allocated so far
    pub fn register_count(&self) -> u32 {
        self.next_register
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Source access
    // ═══════════════════════════════════════════════════════════════════════

    pub fn text(&self, node: Node<'_>) -> String {
        node.text_in(self.source).into_owned()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Emission
    // ═══════════════════════════════════════════════════════════════════════

    /// Registers are only ever allocated together with their producer
    fn fresh_reg(&mut self) -> Register {
        let reg = Register(self.next_register);
        self.next_register += 1;
        reg
    }

    /// `<prefix>_<n>` with a unit-wide counter
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("{}_{}", prefix, self.next_label);
        self.next_label += 1;
        label
    }

    /// IR label for a source label; a `goto` and its target agree
    /// whichever is lowered first
    pub fn user_label(&mut self, name: &str) -> String {
        if let Some(label) = self.user_labels.get(name) {
            return label.clone();
        }
        let label = self.fresh_label(&format!("label_{}", name));
        self.user_labels.insert(name.to_string(), label.clone());
        label
    }

    /// Source labels are function-scoped
    pub(crate) fn swap_user_labels(&mut self, labels: FxHashMap<String, String>) -> FxHashMap<String, String> {
        std::mem::replace(&mut self.user_labels, labels)
    }

    /// Counter value the next `fresh_label` call will use
    pub fn peek_label_counter(&self) -> u32 {
        self.next_label
    }

    pub fn emit(&mut self, inst: IrInstruction) {
        self.instructions.push(inst);
    }

    /// Emit a producer instruction into a fresh register
    pub fn emit_value(
        &mut self,
        opcode: Opcode,
        operands: Vec<Operand>,
        location: SourceLocation,
    ) -> Register {
        debug_assert!(opcode.is_producer(), "{} does not produce a value", opcode);
        let reg = self.fresh_reg();
        self.instructions.push(
            IrInstruction::new(opcode)
                .with_result(reg)
                .with_operands(operands)
                .with_location(location),
        );
        reg
    }

    /// Emit a consumer instruction
    pub fn emit_effect(&mut self, opcode: Opcode, operands: Vec<Operand>, location: SourceLocation) {
        debug_assert!(!opcode.is_producer(), "{} produces a value", opcode);
        self.instructions.push(
            IrInstruction::new(opcode)
                .with_operands(operands)
                .with_location(location),
        );
    }

    pub fn emit_label(&mut self, name: &str) {
        self.instructions.push(IrInstruction::label(name));
    }

    pub fn emit_branch(&mut self, target: &str) {
        self.instructions.push(IrInstruction::branch(target));
    }

    pub fn emit_branch_if(
        &mut self,
        condition: Register,
        on_true: &str,
        on_false: &str,
        location: SourceLocation,
    ) {
        self.instructions.push(
            IrInstruction::branch_if(condition, BranchTargets::new(on_true, on_false))
                .with_location(location),
        );
    }

    pub fn const_value(&mut self, text: impl Into<String>, location: SourceLocation) -> Register {
        self.emit_value(Opcode::Const, vec![Operand::lit(text)], location)
    }

    pub fn const_none(&mut self) -> Register {
        let none = self.literals().none;
        self.const_value(none, SourceLocation::UNKNOWN)
    }

    pub fn load_var(&mut self, name: impl Into<String>, location: SourceLocation) -> Register {
        self.emit_value(Opcode::LoadVar, vec![Operand::lit(name)], location)
    }

    pub fn store_var(&mut self, name: impl Into<String>, value: Register, location: SourceLocation) {
        self.emit_effect(
            Opcode::StoreVar,
            vec![Operand::lit(name), value.into()],
            location,
        );
    }

    pub fn binop(&mut self, op: &str, lhs: Register, rhs: Register, location: SourceLocation) -> Register {
        self.emit_value(
            Opcode::Binop,
            vec![op.into(), lhs.into(), rhs.into()],
            location,
        )
    }

    pub fn call_function(
        &mut self,
        name: &str,
        args: Vec<Register>,
        location: SourceLocation,
    ) -> Register {
        let mut operands: Vec<Operand> = Vec::with_capacity(args.len() + 1);
        operands.push(name.into());
        operands.extend(args.into_iter().map(Operand::from));
        self.emit_value(Opcode::CallFunction, operands, location)
    }

    pub fn call_method(
        &mut self,
        receiver: Register,
        method: &str,
        args: Vec<Register>,
        location: SourceLocation,
    ) -> Register {
        let mut operands: Vec<Operand> = Vec::with_capacity(args.len() + 2);
        operands.push(receiver.into());
        operands.push(method.into());
        operands.extend(args.into_iter().map(Operand::from));
        self.emit_value(Opcode::CallMethod, operands, location)
    }

    pub fn symbolic(&mut self, hint: impl Into<String>, location: SourceLocation) -> Register {
        self.emit_value(Opcode::Symbolic, vec![Operand::lit(hint)], location)
    }

    /// Placeholder for a construct the profile does not model
    pub fn unsupported(&mut self, kind: &str, location: SourceLocation) -> Register {
        if self.config.log_unsupported {
            tracing::warn!(
                "[{}] unsupported node '{}' at {}",
                self.profile.language().name(),
                kind,
                location
            );
        } else {
            tracing::debug!("[{}] unsupported node '{}'", self.profile.language().name(), kind);
        }
        self.symbolic(format!("{}{}", UNSUPPORTED_PREFIX, kind), location)
    }

    /// Malformed tree shape inside a supported construct
    pub fn malformed(&self, what: &str, node: Node<'_>) {
        tracing::warn!(
            "[{}] {} at {} ({} named children)",
            self.profile.language().name(),
            what,
            node.location(),
            node.named_child_count()
        );
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Loop / break-target stacks
    // ═══════════════════════════════════════════════════════════════════════

    /// Enter a loop: it is both a continue and a break target
    pub fn push_loop(&mut self, continue_label: &str, end_label: &str) {
        self.loops.push(LoopTargets::new(continue_label, end_label));
        self.break_targets.push(end_label.to_string());
    }

    pub fn pop_loop(&mut self) {
        self.loops.pop();
        self.break_targets.pop();
    }

    /// Enter a break-only construct (switch / case)
    pub fn push_break_target(&mut self, end_label: &str) {
        self.break_targets.push(end_label.to_string());
    }

    pub fn pop_break_target(&mut self) {
        self.break_targets.pop();
    }

    pub fn current_break_target(&self) -> Option<&str> {
        self.break_targets.last().map(String::as_str)
    }

    pub fn current_continue_target(&self) -> Option<&str> {
        self.loops.last().map(|l| l.continue_label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::plugins::registry;
    use crate::features::parsing::ports::LanguageId;

    fn context() -> LoweringContext<'static> {
        LoweringContext::new(
            registry::profile_for(LanguageId::Python),
            b"",
            LoweringConfig::default(),
        )
    }

    #[test]
    fn test_registers_allocated_in_order() {
        let mut ctx = context();
        let a = ctx.const_value("1", SourceLocation::UNKNOWN);
        let b = ctx.const_value("2", SourceLocation::UNKNOWN);
        let c = ctx.binop("+", a, b, SourceLocation::UNKNOWN);
        assert_eq!((a, b, c), (Register(0), Register(1), Register(2)));
        assert_eq!(ctx.register_count(), 3);
        assert_eq!(ctx.instructions()[2].to_string(), "%2 = binop + %0 %1");
    }

    #[test]
    fn test_labels_share_one_counter() {
        let mut ctx = context();
        assert_eq!(ctx.fresh_label("if_true"), "if_true_0");
        assert_eq!(ctx.fresh_label("if_end"), "if_end_1");
        assert_eq!(ctx.peek_label_counter(), 2);
    }

    #[test]
    fn test_user_labels_resolve_once() {
        let mut ctx = context();
        let forward = ctx.user_label("retry");
        ctx.fresh_label("if_true");
        assert_eq!(ctx.user_label("retry"), forward);
        assert_eq!(forward, "label_retry_0");
    }

    #[test]
    fn test_switch_is_break_target_only() {
        let mut ctx = context();
        ctx.push_loop("while_cond_0", "while_end_2");
        ctx.push_break_target("switch_end_3");
        assert_eq!(ctx.current_break_target(), Some("switch_end_3"));
        assert_eq!(ctx.current_continue_target(), Some("while_cond_0"));
        ctx.pop_break_target();
        assert_eq!(ctx.current_break_target(), Some("while_end_2"));
        ctx.pop_loop();
        assert_eq!(ctx.current_break_target(), None);
        assert_eq!(ctx.current_continue_target(), None);
    }

    #[test]
    fn test_unsupported_placeholder() {
        let mut ctx = context();
        let reg = ctx.unsupported("walrus", SourceLocation::UNKNOWN);
        assert_eq!(reg, Register(0));
        assert_eq!(ctx.instructions()[0].to_string(), "%0 = symbolic unsupported:walrus");
    }
}

//! Function and class catalogue of a lowered unit
//!
//! Three lookups a consumer of the IR needs before it can follow a call:
//!
//! | Map | Key | Value |
//! |-----|-----|-------|
//! | `func_params` | `func_<name>_<n>` block label | parameter names, in order |
//! | `classes` | class name | `class_<name>_<n>` body label |
//! | `class_methods` | class name | method name -> function label |
//!
//! A parameter is only recognised as the `SYMBOLIC "param:<x>"` +
//! `STORE_VAR x <reg>` pair; a lone marker does not count.

use crate::features::flow_graph::domain::{BasicBlock, Cfg};
use crate::shared::constants::{
    CLASS_LABEL_PREFIX, END_CLASS_LABEL_PREFIX, END_LABEL_PREFIX, FUNC_LABEL_PREFIX,
};
use crate::shared::models::{param_name, DefinitionKind, IrInstruction, Opcode, Operand};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionRegistry {
    pub func_params: BTreeMap<String, Vec<String>>,
    pub classes: BTreeMap<String, String>,
    pub class_methods: BTreeMap<String, BTreeMap<String, String>>,
}

impl FunctionRegistry {
    /// Scan the function entry blocks of `cfg` for parameters and the
    /// instruction stream for class and method definitions
    pub fn build(instructions: &[IrInstruction], cfg: &Cfg) -> Self {
        let func_params = cfg
            .blocks()
            .iter()
            .filter(|b| b.label.starts_with(FUNC_LABEL_PREFIX))
            .map(|b| (b.label.clone(), block_params(b)))
            .collect();
        let (classes, class_methods) = scan_classes(instructions);
        let registry = Self {
            func_params,
            classes,
            class_methods,
        };
        tracing::debug!(
            "registry: {} functions, {} classes",
            registry.func_params.len(),
            registry.classes.len()
        );
        registry
    }

    pub fn params_of(&self, func_label: &str) -> Option<&[String]> {
        self.func_params.get(func_label).map(Vec::as_slice)
    }

    pub fn class_label(&self, class: &str) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }

    /// Function label of `class.method`
    pub fn method_label(&self, class: &str, method: &str) -> Option<&str> {
        self.class_methods
            .get(class)?
            .get(method)
            .map(String::as_str)
    }

    pub fn function_count(&self) -> usize {
        self.func_params.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

fn block_params(block: &BasicBlock) -> Vec<String> {
    block
        .instructions
        .windows(2)
        .filter_map(|pair| {
            let name = param_name(&pair[0])?;
            let store = &pair[1];
            let binds = store.opcode == Opcode::StoreVar
                && store.first_literal() == Some(name)
                && pair[0].result_reg.is_some()
                && store.operands.get(1).and_then(Operand::as_register) == pair[0].result_reg;
            binds.then(|| name.to_string())
        })
        .collect()
}

type ClassMaps = (BTreeMap<String, String>, BTreeMap<String, BTreeMap<String, String>>);

/// Classes come from `CONST <class:..>`; a method is a `CONST <function:..>`
/// directly in a class body, not inside one of its methods
fn scan_classes(instructions: &[IrInstruction]) -> ClassMaps {
    let mut classes = BTreeMap::new();
    for inst in instructions.iter().filter(|i| i.opcode == Opcode::Const) {
        if let Some(Operand::Definition(d)) = inst.operands.first() {
            if d.kind == DefinitionKind::Class {
                classes.insert(d.name.clone(), d.label.clone());
            }
        }
    }

    let mut class_methods: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
    // (class name, function depth at the class label)
    let mut open: Vec<(String, usize)> = Vec::new();
    let mut depth = 0usize;
    for inst in instructions {
        if let (true, Some(label)) = (inst.is_label(), inst.label_name()) {
            if label.starts_with(END_CLASS_LABEL_PREFIX) {
                open.pop();
            } else if label.starts_with(CLASS_LABEL_PREFIX) {
                if let Some((name, _)) = classes.iter().find(|(_, l)| l.as_str() == label) {
                    class_methods.entry(name.clone()).or_default();
                    open.push((name.clone(), depth));
                }
            } else if label.starts_with(FUNC_LABEL_PREFIX) {
                depth += 1;
            } else if label.starts_with(END_LABEL_PREFIX) {
                depth = depth.saturating_sub(1);
            }
            continue;
        }
        let Some((class, class_depth)) = open.last() else {
            continue;
        };
        if inst.opcode != Opcode::Const || depth != *class_depth {
            continue;
        }
        if let Some(Operand::Definition(d)) = inst.operands.first() {
            if d.kind == DefinitionKind::Function {
                class_methods
                    .entry(class.clone())
                    .or_default()
                    .insert(d.name.clone(), d.label.clone());
            }
        }
    }
    (classes, class_methods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::infrastructure::builder::build_full_cfg;
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;
    use crate::shared::models::{param_marker, DefinitionRef, Register};
    use pretty_assertions::assert_eq;

    fn param(reg: u32, name: &str) -> [IrInstruction; 2] {
        [
            IrInstruction::new(Opcode::Symbolic)
                .with_result(Register(reg))
                .with_operands(vec![Operand::lit(param_marker(name))]),
            IrInstruction::new(Opcode::StoreVar)
                .with_operands(vec![Operand::lit(name), Register(reg).into()]),
        ]
    }

    fn define(reg: u32, def: DefinitionRef) -> IrInstruction {
        IrInstruction::new(Opcode::Const)
            .with_result(Register(reg))
            .with_operands(vec![def.into()])
    }

    fn registry_of(ir: &[IrInstruction]) -> FunctionRegistry {
        FunctionRegistry::build(ir, &build_full_cfg(ir))
    }

    #[test]
    fn test_params_need_the_store() {
        let [p0, s0] = param(0, "a");
        let [p1, _] = param(1, "b");
        let ir = vec![
            IrInstruction::label("entry"),
            IrInstruction::branch("end_f_1"),
            IrInstruction::label("func_f_0"),
            p0,
            s0,
            p1,
            IrInstruction::new(Opcode::Return).with_operands(vec![Register(1).into()]),
            IrInstruction::label("end_f_1"),
        ];
        let registry = registry_of(&ir);
        assert_eq!(registry.params_of("func_f_0"), Some(&["a".to_string()][..]));
        assert_eq!(registry.function_count(), 1);
    }

    #[test]
    fn test_nested_closure_is_not_a_method() {
        let ir = vec![
            IrInstruction::label("entry"),
            IrInstruction::branch("end_class_K_1"),
            IrInstruction::label("class_K_0"),
            IrInstruction::branch("end_m_3"),
            IrInstruction::label("func_m_2"),
            IrInstruction::branch("end_inner_5"),
            IrInstruction::label("func_inner_4"),
            IrInstruction::label("end_inner_5"),
            define(0, DefinitionRef::function("inner", "func_inner_4")),
            IrInstruction::label("end_m_3"),
            define(1, DefinitionRef::function("m", "func_m_2")),
            IrInstruction::label("end_class_K_1"),
            define(2, DefinitionRef::class("K", "class_K_0")),
        ];
        let registry = registry_of(&ir);
        assert_eq!(registry.class_label("K"), Some("class_K_0"));
        assert_eq!(registry.method_label("K", "m"), Some("func_m_2"));
        assert_eq!(registry.method_label("K", "inner"), None);
        assert_eq!(registry.class_count(), 1);
    }

    #[test]
    fn test_python_class_and_function() {
        let src = "class K:\n    def m(self, a):\n        return a\n\ndef f(x, y):\n    return x\n";
        let ir = lower_with_language(LanguageId::Python, src);
        let registry = registry_of(&ir);

        let method = registry.method_label("K", "m").expect("method m");
        assert_eq!(
            registry.params_of(method),
            Some(&["self".to_string(), "a".to_string()][..])
        );
        let f_label = registry
            .func_params
            .keys()
            .find(|l| l.starts_with("func_f_"))
            .expect("function f");
        assert_eq!(registry.params_of(f_label), Some(&["x".to_string(), "y".to_string()][..]));
        assert!(registry.class_label("K").is_some_and(|l| l.starts_with("class_K_")));
        assert_eq!(registry.method_label("K", "f"), None);
    }
}

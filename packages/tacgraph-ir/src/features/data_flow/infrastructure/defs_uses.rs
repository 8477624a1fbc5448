//! Variable definition and use sites

use crate::features::data_flow::domain::VarSite;
use crate::shared::models::{IrInstruction, Opcode};

/// Variable written by a STORE_VAR
pub fn defined_variable(inst: &IrInstruction) -> Option<&str> {
    match inst.opcode {
        Opcode::StoreVar => inst.first_literal(),
        _ => None,
    }
}

/// Variable read by a LOAD_VAR
pub fn used_variable(inst: &IrInstruction) -> Option<&str> {
    match inst.opcode {
        Opcode::LoadVar => inst.first_literal(),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefsUses {
    pub defs: Vec<VarSite>,
    pub uses: Vec<VarSite>,
}

impl DefsUses {
    pub fn defs_of<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a VarSite> + 'a {
        self.defs.iter().filter(move |s| s.variable == variable)
    }

    pub fn uses_of<'a>(&'a self, variable: &'a str) -> impl Iterator<Item = &'a VarSite> + 'a {
        self.uses.iter().filter(move |s| s.variable == variable)
    }
}

pub fn defs_and_uses(instructions: &[IrInstruction]) -> DefsUses {
    let mut out = DefsUses::default();
    for (index, inst) in instructions.iter().enumerate() {
        let site = |variable: &str| VarSite {
            index,
            variable: variable.to_string(),
            location: inst.location,
        };
        if let Some(var) = defined_variable(inst) {
            out.defs.push(site(var));
        } else if let Some(var) = used_variable(inst) {
            out.uses.push(site(var));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;

    #[test]
    fn test_sites_from_python() {
        let ir = lower_with_language(LanguageId::Python, "x = 1\ny = x + x\n");
        let sites = defs_and_uses(&ir);
        let defs: Vec<&str> = sites.defs.iter().map(|s| s.variable.as_str()).collect();
        assert_eq!(defs, vec!["x", "y"]);
        assert_eq!(sites.uses_of("x").count(), 2);
        assert_eq!(sites.defs_of("y").count(), 1);
    }
}

//! String-keyed dispatch tables behind the `LanguageProfile` port
//!
//! Every grammar is one `TableProfile` built once at startup. A profile that
//! extends another (TypeScript over JavaScript, C++ over C) starts from a
//! copy of the parent's tables and overrides entries.

use crate::features::lowering::ports::{
    ExprHandler, FieldNames, LanguageProfile, Literals, NodeKinds, StmtHandler,
};
use crate::features::parsing::ports::LanguageId;
use rustc_hash::FxHashMap;

#[derive(Clone)]
pub struct TableProfile {
    language: LanguageId,
    literals: Literals,
    fields: FieldNames,
    kinds: NodeKinds,
    statements: FxHashMap<&'static str, StmtHandler>,
    expressions: FxHashMap<&'static str, ExprHandler>,
}

impl TableProfile {
    pub fn builder(language: LanguageId) -> TableProfileBuilder {
        TableProfileBuilder {
            profile: TableProfile {
                language,
                literals: Literals::PYTHON_STYLE,
                fields: FieldNames::default(),
                kinds: NodeKinds::default(),
                statements: FxHashMap::default(),
                expressions: FxHashMap::default(),
            },
        }
    }

    /// Start a new profile from a copy of this one's tables
    pub fn extend(&self, language: LanguageId) -> TableProfileBuilder {
        let mut profile = self.clone();
        profile.language = language;
        TableProfileBuilder { profile }
    }

    /// Node kinds with a statement handler, sorted
    pub fn statement_kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.statements.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Node kinds with an expression handler, sorted
    pub fn expression_kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.expressions.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

impl std::fmt::Debug for TableProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableProfile")
            .field("language", &self.language)
            .field("statements", &self.statements.len())
            .field("expressions", &self.expressions.len())
            .finish()
    }
}

impl LanguageProfile for TableProfile {
    fn language(&self) -> LanguageId {
        self.language
    }

    fn literals(&self) -> &Literals {
        &self.literals
    }

    fn fields(&self) -> &FieldNames {
        &self.fields
    }

    fn kinds(&self) -> &NodeKinds {
        &self.kinds
    }

    fn statement_handler(&self, kind: &str) -> Option<StmtHandler> {
        self.statements.get(kind).copied()
    }

    fn expression_handler(&self, kind: &str) -> Option<ExprHandler> {
        self.expressions.get(kind).copied()
    }
}

pub struct TableProfileBuilder {
    profile: TableProfile,
}

impl TableProfileBuilder {
    pub fn literals(mut self, literals: Literals) -> Self {
        self.profile.literals = literals;
        self
    }

    pub fn fields(mut self, fields: FieldNames) -> Self {
        self.profile.fields = fields;
        self
    }

    pub fn kinds(mut self, kinds: NodeKinds) -> Self {
        self.profile.kinds = kinds;
        self
    }

    /// Adjust the inherited kind sets in place
    pub fn map_kinds(mut self, f: impl FnOnce(&mut NodeKinds)) -> Self {
        f(&mut self.profile.kinds);
        self
    }

    pub fn stmt(mut self, kind: &'static str, handler: StmtHandler) -> Self {
        self.profile.statements.insert(kind, handler);
        self
    }

    pub fn stmts(mut self, kinds: &[&'static str], handler: StmtHandler) -> Self {
        for kind in kinds {
            self.profile.statements.insert(*kind, handler);
        }
        self
    }

    pub fn expr(mut self, kind: &'static str, handler: ExprHandler) -> Self {
        self.profile.expressions.insert(kind, handler);
        self
    }

    pub fn exprs(mut self, kinds: &[&'static str], handler: ExprHandler) -> Self {
        for kind in kinds {
            self.profile.expressions.insert(*kind, handler);
        }
        self
    }

    /// Drop an inherited statement entry
    pub fn without_stmt(mut self, kind: &str) -> Self {
        self.profile.statements.remove(kind);
        self
    }

    pub fn build(self) -> TableProfile {
        self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lowering::infrastructure::{control_flow, expressions};

    #[test]
    fn test_extend_copies_and_overrides() {
        let base = TableProfile::builder(LanguageId::JavaScript)
            .expr("identifier", expressions::identifier)
            .stmt("break_statement", control_flow::break_statement)
            .build();
        let derived = base
            .extend(LanguageId::TypeScript)
            .expr("as_expression", expressions::unwrap_first)
            .without_stmt("break_statement")
            .build();

        assert_eq!(derived.language(), LanguageId::TypeScript);
        assert!(derived.expression_handler("identifier").is_some());
        assert!(derived.expression_handler("as_expression").is_some());
        assert!(derived.statement_handler("break_statement").is_none());
        assert!(base.statement_handler("break_statement").is_some());
        assert_eq!(derived.expression_kinds(), vec!["as_expression", "identifier"]);
    }
}

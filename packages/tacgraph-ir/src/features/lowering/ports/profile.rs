//! Language Profile Port
//!
//! Defines the contract every language plugs into the shared lowering
//! engine: literal tokens, grammar field names, node-kind classification
//! sets, and the two dispatch tables.

use crate::features::lowering::infrastructure::LoweringContext;
use crate::features::parsing::ports::LanguageId;
use crate::shared::models::Register;
use tree_sitter::Node;

/// Statement handler: lowers a node for its effects
pub type StmtHandler = fn(&mut LoweringContext<'_>, Node<'_>);

/// Expression handler: lowers a node and returns the register holding its value
pub type ExprHandler = fn(&mut LoweringContext<'_>, Node<'_>) -> Register;

/// Literal tokens a language uses for its canonical constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literals {
    pub true_lit: &'static str,
    pub false_lit: &'static str,
    pub none: &'static str,
    /// Value returned by a function that falls off its end
    pub default_return: &'static str,
}

impl Literals {
    pub const PYTHON_STYLE: Literals = Literals {
        true_lit: "True",
        false_lit: "False",
        none: "None",
        default_return: "None",
    };

    pub const fn new(
        true_lit: &'static str,
        false_lit: &'static str,
        none: &'static str,
        default_return: &'static str,
    ) -> Self {
        Self {
            true_lit,
            false_lit,
            none,
            default_return,
        }
    }
}

/// Grammar field names used by the shared routines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNames {
    pub func_name: &'static str,
    pub func_params: &'static str,
    pub func_body: &'static str,
    pub if_condition: &'static str,
    pub if_consequence: &'static str,
    pub if_alternative: &'static str,
    pub while_condition: &'static str,
    pub while_body: &'static str,
    pub call_function: &'static str,
    pub call_arguments: &'static str,
    pub class_name: &'static str,
    pub class_body: &'static str,
    pub attr_object: &'static str,
    pub attr_member: &'static str,
    pub subscript_value: &'static str,
    pub subscript_index: &'static str,
    pub assign_left: &'static str,
    pub assign_right: &'static str,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            func_name: "name",
            func_params: "parameters",
            func_body: "body",
            if_condition: "condition",
            if_consequence: "consequence",
            if_alternative: "alternative",
            while_condition: "condition",
            while_body: "body",
            call_function: "function",
            call_arguments: "arguments",
            class_name: "name",
            class_body: "body",
            attr_object: "object",
            attr_member: "attribute",
            subscript_value: "value",
            subscript_index: "subscript",
            assign_left: "left",
            assign_right: "right",
        }
    }
}

/// Node-kind classification sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeKinds {
    /// Skipped silently wherever a statement is expected
    pub comments: Vec<&'static str>,
    /// Formatting / keyword noise, also skipped
    pub noise: Vec<&'static str>,
    /// Statement-list containers: a body of this kind is lowered child by child
    pub blocks: Vec<&'static str>,
    /// Plain names: callee -> CALL_FUNCTION, store target -> STORE_VAR
    pub identifiers: Vec<&'static str>,
    /// Attribute / member access: callee -> CALL_METHOD, target -> STORE_FIELD
    pub members: Vec<&'static str>,
    /// Subscript access: target -> STORE_INDEX
    pub subscripts: Vec<&'static str>,
    /// Tuple / list patterns destructured element-wise on store
    pub patterns: Vec<&'static str>,
    /// Wrapper nodes around a single call argument
    pub argument_wrappers: Vec<&'static str>,
}

impl Default for NodeKinds {
    fn default() -> Self {
        Self {
            comments: vec!["comment"],
            noise: vec!["newline", "\n", ";"],
            blocks: vec!["block"],
            identifiers: vec!["identifier"],
            members: vec!["attribute"],
            subscripts: vec!["subscript"],
            patterns: vec![],
            argument_wrappers: vec!["argument", "value_argument"],
        }
    }
}

/// Per-grammar configuration plugged into the lowering engine
pub trait LanguageProfile: Send + Sync {
    fn language(&self) -> LanguageId;

    fn literals(&self) -> &Literals;

    fn fields(&self) -> &FieldNames;

    fn kinds(&self) -> &NodeKinds;

    fn statement_handler(&self, kind: &str) -> Option<StmtHandler>;

    fn expression_handler(&self, kind: &str) -> Option<ExprHandler>;

    /// Comments and noise never reach the fallback
    fn is_skipped(&self, kind: &str) -> bool {
        let kinds = self.kinds();
        kinds.comments.contains(&kind) || kinds.noise.contains(&kind)
    }

    fn is_block(&self, kind: &str) -> bool {
        self.kinds().blocks.contains(&kind)
    }

    fn is_identifier(&self, kind: &str) -> bool {
        self.kinds().identifiers.contains(&kind)
    }

    fn is_member(&self, kind: &str) -> bool {
        self.kinds().members.contains(&kind)
    }

    fn is_subscript(&self, kind: &str) -> bool {
        self.kinds().subscripts.contains(&kind)
    }

    fn is_pattern(&self, kind: &str) -> bool {
        self.kinds().patterns.contains(&kind)
    }
}

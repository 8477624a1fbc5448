//! Array / object literals

use super::context::LoweringContext;
use crate::features::lowering::domain::SyntaxNode;
use crate::features::lowering::infrastructure::expressions::const_literal;
use crate::shared::models::{Opcode, Register, SourceLocation};
use tree_sitter::Node;

/// `[a, b, c]`
pub fn list_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("list", &elements, node)
}

/// `(a, b)`
pub fn tuple_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("tuple", &elements, node)
}

/// `{a, b}`
pub fn set_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let elements = ctx.significant_children(node);
    ctx.lower_array_of("set", &elements, node)
}

/// `{k: v, ...}` over `pair` children with key / value fields
pub fn dict_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    let pairs: Vec<(Node<'_>, Node<'_>)> = ctx
        .significant_children(node)
        .into_iter()
        .filter_map(|c| match (c.field("key"), c.field("value")) {
            (Some(k), Some(v)) => Some((k, v)),
            _ => None,
        })
        .collect();
    ctx.lower_keyed_object("dict", &pairs, node)
}

/// Literal whose structure is not worth modelling: the token text itself
pub fn opaque_literal(ctx: &mut LoweringContext<'_>, node: Node<'_>) -> Register {
    const_literal(ctx, node)
}

impl<'a> LoweringContext<'a> {
    /// `NEW_ARRAY tag size`, then `STORE_INDEX arr i elem` per element
    pub fn lower_array_of(&mut self, tag: &str, elements: &[Node<'_>], node: Node<'_>) -> Register {
        let size = self.const_value(elements.len().to_string(), SourceLocation::UNKNOWN);
        let array = self.emit_value(
            Opcode::NewArray,
            vec![tag.into(), size.into()],
            node.location(),
        );
        for (i, element) in elements.iter().enumerate() {
            let value = self.lower_expr(*element);
            self.store_at(array, i, value);
        }
        array
    }

    /// `STORE_INDEX container <i> value` with a synthetic index constant
    pub fn store_at(&mut self, container: Register, index: usize, value: Register) {
        let idx = self.const_value(index.to_string(), SourceLocation::UNKNOWN);
        self.emit_effect(
            Opcode::StoreIndex,
            vec![container.into(), idx.into(), value.into()],
            SourceLocation::UNKNOWN,
        );
    }

    /// `NEW_OBJECT tag`, then `STORE_INDEX obj key value` per pair
    pub fn lower_keyed_object(&mut self, tag: &str, pairs: &[(Node<'_>, Node<'_>)], node: Node<'_>) -> Register {
        let object = self.new_object(tag, node.location());
        for (key, value) in pairs {
            let key_reg = self.lower_expr(*key);
            let value_reg = self.lower_expr(*value);
            self.emit_effect(
                Opcode::StoreIndex,
                vec![object.into(), key_reg.into(), value_reg.into()],
                SourceLocation::UNKNOWN,
            );
        }
        object
    }

    pub fn new_object(&mut self, tag: &str, location: SourceLocation) -> Register {
        self.emit_value(Opcode::NewObject, vec![tag.into()], location)
    }

    /// Type-level declaration (interface, enum) as `NEW_OBJECT tag` mapping
    /// each member name to its ordinal, bound to `name`
    pub fn lower_ordinal_object(&mut self, tag: &str, name: &str, members: &[String], node: Node<'_>) -> Register {
        let object = self.new_object(&format!("{}:{}", tag, name), node.location());
        for (i, member) in members.iter().enumerate() {
            let key = self.const_value(member.clone(), SourceLocation::UNKNOWN);
            let ordinal = self.const_value(i.to_string(), SourceLocation::UNKNOWN);
            self.emit_effect(
                Opcode::StoreIndex,
                vec![object.into(), key.into(), ordinal.into()],
                SourceLocation::UNKNOWN,
            );
        }
        self.store_var(name, object, node.location());
        object
    }

    /// `STORE_FIELD obj name value`
    pub fn store_field(&mut self, object: Register, name: &str, value: Register, location: SourceLocation) {
        self.emit_effect(
            Opcode::StoreField,
            vec![object.into(), name.into(), value.into()],
            location,
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::features::lowering::infrastructure::lower_with_language;
    use crate::features::parsing::ports::LanguageId;

    fn dump(lang: LanguageId, src: &str) -> Vec<String> {
        lower_with_language(lang, src)
            .iter()
            .map(|i| i.display_plain())
            .collect()
    }

    #[test]
    fn test_list_literal_size_first() {
        let ir = dump(LanguageId::Python, "xs = [7, 8]\n");
        assert_eq!(
            &ir[1..4],
            &["%0 = const 2", "%1 = new_array list %0", "%2 = const 7"]
        );
        assert!(ir.contains(&"store_index %1 %3 %2".to_string()), "{:#?}", ir);
    }

    #[test]
    fn test_dict_literal_pairs() {
        let ir = dump(LanguageId::Python, "d = {'a': 1}\n");
        assert!(ir.contains(&"%0 = new_object dict".to_string()), "{:#?}", ir);
        assert!(ir.contains(&"store_index %0 %1 %2".to_string()));
    }
}

//! Literal-discriminant index for unions
//!
//! Members that carry required literal-typed properties (`{ kind: "a", .. }`)
//! are bucketed by property key and literal value, so the parser only tries
//! the members an input can actually match.

use crate::ast::{Ast, AstKind, Direction, LiteralValue};
use indexmap::IndexMap;
use schemata_value::PropertyKey;
use tracing::trace;

/// Buckets of one discriminant key
#[derive(Debug, Clone)]
pub struct DiscriminantKey {
    /// Member indices keyed by the literal's string form
    pub buckets: IndexMap<String, Vec<usize>>,
    /// Union of every literal seen for the key, used as the expected type
    /// when an input carries an unknown value
    pub literals: Ast,
}

/// Index over the members of one union in one direction
#[derive(Debug, Clone, Default)]
pub struct DiscriminantIndex {
    pub keys: IndexMap<PropertyKey, DiscriminantKey>,
    /// Members without literal properties, always tried
    pub otherwise: Vec<usize>,
}

impl DiscriminantIndex {
    pub fn build(members: &[Ast], direction: Direction) -> Self {
        let mut index = DiscriminantIndex::default();
        for (i, member) in members.iter().enumerate() {
            let tags = literals_of(member, direction);
            if tags.is_empty() {
                index.otherwise.push(i);
                continue;
            }
            let last = tags.len() - 1;
            for (j, (key, literal, value)) in tags.into_iter().enumerate() {
                let hash = value.hash_key();
                let entry = index.keys.entry(key).or_insert_with(|| DiscriminantKey {
                    buckets: IndexMap::new(),
                    literals: Ast::union(Vec::new()),
                });
                let taken = entry.buckets.contains_key(&hash);
                if taken && j < last {
                    continue;
                }
                entry.buckets.entry(hash).or_default().push(i);
                entry.literals = Ast::union(vec![entry.literals.clone(), literal]);
                if !taken {
                    break;
                }
            }
        }
        trace!(
            keys = index.keys.len(),
            otherwise = index.otherwise.len(),
            "built discriminant index"
        );
        index
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

fn literals_of(ast: &Ast, direction: Direction) -> Vec<(PropertyKey, Ast, LiteralValue)> {
    match ast.kind() {
        AstKind::TypeLiteral(literal) => literal
            .property_signatures()
            .iter()
            .filter(|ps| !ps.optional)
            .filter_map(|ps| {
                let ty = match direction {
                    Direction::Decode => ps.ty.from_side(),
                    Direction::Encode => ps.ty.to_side(),
                };
                match ty.kind() {
                    AstKind::Literal(value) => {
                        let value = value.clone();
                        Some((ps.name.clone(), ty, value))
                    }
                    _ => None,
                }
            })
            .collect(),
        AstKind::Refinement(refinement) => literals_of(&refinement.from, direction),
        AstKind::Transform(transform) => match direction {
            Direction::Decode => literals_of(&transform.from, direction),
            Direction::Encode => literals_of(&transform.to, direction),
        },
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Keyword, PropertySignature, TypeLiteral};

    fn tagged(fields: &[(&str, Ast)]) -> Ast {
        let props = fields
            .iter()
            .map(|(name, ty)| PropertySignature::new(*name, ty.clone(), false))
            .collect();
        Ast::new(AstKind::TypeLiteral(TypeLiteral::new(props, vec![]).unwrap()))
    }

    #[test]
    fn test_members_bucketed_by_literal() {
        let members = vec![
            tagged(&[("kind", Ast::literal("a"))]),
            tagged(&[("kind", Ast::literal("b"))]),
            tagged(&[("value", Ast::keyword(Keyword::String))]),
        ];
        let index = DiscriminantIndex::build(&members, Direction::Decode);
        let kind = &index.keys[&PropertyKey::from("kind")];
        assert_eq!(kind.buckets["a"], vec![0]);
        assert_eq!(kind.buckets["b"], vec![1]);
        assert!(kind.literals.is_union());
        assert_eq!(index.otherwise, vec![2]);
    }

    #[test]
    fn test_shared_literal_moves_to_next_key() {
        let members = vec![
            tagged(&[("a", Ast::literal("x")), ("b", Ast::literal(1))]),
            tagged(&[("a", Ast::literal("x")), ("b", Ast::literal(2))]),
        ];
        let index = DiscriminantIndex::build(&members, Direction::Decode);
        assert_eq!(index.keys[&PropertyKey::from("a")].buckets["x"], vec![0]);
        assert_eq!(index.keys[&PropertyKey::from("b")].buckets["2"], vec![1]);
    }

    #[test]
    fn test_single_key_duplicates_share_bucket() {
        let members = vec![
            tagged(&[("a", Ast::literal("x"))]),
            tagged(&[("a", Ast::literal("x"))]),
        ];
        let index = DiscriminantIndex::build(&members, Direction::Decode);
        assert_eq!(index.keys[&PropertyKey::from("a")].buckets["x"], vec![0, 1]);
    }

    #[test]
    fn test_optional_properties_are_not_discriminants() {
        let props = vec![PropertySignature::new("kind", Ast::literal("a"), true)];
        let member = Ast::new(AstKind::TypeLiteral(TypeLiteral::new(props, vec![]).unwrap()));
        let index = DiscriminantIndex::build(&[member], Direction::Decode);
        assert!(index.is_empty());
        assert_eq!(index.otherwise, vec![0]);
    }
}

//! Schema constructors
//!
//! Functions here only ever produce well-formed trees: structural mistakes
//! (duplicate keys, bad index signature parameters, misplaced tuple
//! elements) surface as [`Error`] at construction time.

use crate::ast::{
    Ast, AstKind, Declaration, DeclarationContext, Element, EnumMember, EnumValue,
    IndexSignature, Keyword, LiteralValue, PropertySignature, TemplateLiteral, TemplateSpan,
    Transform, Tuple, TypeLiteral,
};
use crate::error::{ParseError, ParseResult};
use crate::{Error, Result};
use schemata_value::{PropertyKey, Symbol, Value};
use std::sync::{Arc, LazyLock};

macro_rules! primitive {
    ($name:ident, $cell:ident, $kind:expr, $id:literal) => {
        static $cell: LazyLock<Ast> = LazyLock::new(|| $kind.with_identifier($id));

        #[doc = concat!("The `", $id, "` schema")]
        pub fn $name() -> Ast {
            $cell.clone()
        }
    };
}

primitive!(string, STRING, Ast::keyword(Keyword::String), "string");
primitive!(number, NUMBER, Ast::keyword(Keyword::Number), "number");
primitive!(boolean, BOOLEAN, Ast::keyword(Keyword::Boolean), "boolean");
primitive!(bigint_from_self, BIGINT, Ast::keyword(Keyword::BigInt), "bigint");
primitive!(symbol_from_self, SYMBOL, Ast::keyword(Keyword::Symbol), "symbol");
primitive!(undefined, UNDEFINED, Ast::keyword(Keyword::Undefined), "undefined");
primitive!(void, VOID, Ast::keyword(Keyword::Void), "void");
primitive!(unknown, UNKNOWN, Ast::keyword(Keyword::Unknown), "unknown");
primitive!(any, ANY, Ast::keyword(Keyword::Any), "any");
primitive!(never, NEVER, Ast::keyword(Keyword::Never), "never");
primitive!(object, OBJECT, Ast::keyword(Keyword::Object), "object");
primitive!(null, NULL, Ast::literal(LiteralValue::Null), "null");

pub fn literal(value: impl Into<LiteralValue>) -> Ast {
    Ast::literal(value)
}

/// Union of literals; no values yields `never`
pub fn literals<L: Into<LiteralValue>>(values: impl IntoIterator<Item = L>) -> Ast {
    Ast::union(values.into_iter().map(Ast::literal).collect())
}

pub fn unique_symbol(symbol: Symbol) -> Ast {
    Ast::new(AstKind::UniqueSymbol(symbol))
}

/// Enum from `(name, value)` pairs
pub fn enums<N: Into<String>>(members: impl IntoIterator<Item = (N, EnumValue)>) -> Ast {
    Ast::new(AstKind::Enums(
        members
            .into_iter()
            .map(|(name, value)| EnumMember {
                name: name.into(),
                value,
            })
            .collect(),
    ))
}

/// Template literal from parts.
///
/// Each part is the string or number keyword, a literal, or a union of
/// literals. Unions expand into one template per combination; templates
/// without placeholders collapse to string literals.
pub fn template_literal(parts: &[Ast]) -> Result<Ast> {
    let mut states: Vec<(String, Vec<TemplateSpan>)> = vec![(String::new(), Vec::new())];
    for part in parts {
        let alternatives = match part.kind() {
            AstKind::Union(union) => union.members().to_vec(),
            _ => vec![part.clone()],
        };
        let mut next = Vec::with_capacity(states.len() * alternatives.len());
        for (head, spans) in &states {
            for alternative in &alternatives {
                let mut head = head.clone();
                let mut spans = spans.clone();
                match alternative.kind() {
                    AstKind::Literal(value) => {
                        let text = value.hash_key();
                        match spans.last_mut() {
                            Some(span) => span.literal.push_str(&text),
                            None => head.push_str(&text),
                        }
                    }
                    AstKind::Keyword(keyword @ (Keyword::String | Keyword::Number)) => {
                        spans.push(TemplateSpan {
                            ty: Ast::keyword(*keyword),
                            literal: String::new(),
                        });
                    }
                    _ => {
                        return Err(Error::InvalidTemplateLiteral(format!(
                            "unsupported template literal part {}",
                            alternative.tag()
                        )));
                    }
                }
                next.push((head, spans));
            }
        }
        states = next;
    }
    let members = states
        .into_iter()
        .map(|(head, spans)| {
            if spans.is_empty() {
                Ok(Ast::literal(head))
            } else {
                Ok(Ast::new(AstKind::TemplateLiteral(TemplateLiteral::new(
                    head, spans,
                )?)))
            }
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Ast::union(members))
}

pub fn array(item: Ast) -> Ast {
    Ast::new(AstKind::Tuple(Tuple::new(Vec::new(), vec![item])))
}

pub fn non_empty_array(item: Ast) -> Ast {
    Ast::new(AstKind::Tuple(Tuple::new(
        vec![Element {
            ty: item.clone(),
            optional: false,
        }],
        vec![item],
    )))
}

/// Tuple of required elements
pub fn tuple_of(elements: impl IntoIterator<Item = Ast>) -> Ast {
    Ast::new(AstKind::Tuple(Tuple::new(
        elements
            .into_iter()
            .map(|ty| Element {
                ty,
                optional: false,
            })
            .collect(),
        Vec::new(),
    )))
}

/// Builder for tuples with optional, rest and post-rest elements
#[derive(Debug, Clone, Default)]
pub struct TupleBuilder {
    elements: Vec<Element>,
    rest: Vec<Ast>,
    error: Option<String>,
}

impl TupleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail(&mut self, message: &str) {
        if self.error.is_none() {
            self.error = Some(message.to_string());
        }
    }

    /// Required element; after a rest element it becomes a post-rest element
    #[must_use]
    pub fn element(mut self, ty: Ast) -> Self {
        if self.rest.is_empty() {
            if self.elements.last().is_some_and(|e| e.optional) {
                self.fail("a required element cannot follow an optional element");
            } else {
                self.elements.push(Element {
                    ty,
                    optional: false,
                });
            }
        } else {
            self.rest.push(ty);
        }
        self
    }

    #[must_use]
    pub fn optional_element(mut self, ty: Ast) -> Self {
        if self.rest.is_empty() {
            self.elements.push(Element { ty, optional: true });
        } else {
            self.fail("an optional element cannot follow a rest element");
        }
        self
    }

    #[must_use]
    pub fn rest(mut self, ty: Ast) -> Self {
        if self.rest.is_empty() {
            self.rest.push(ty);
        } else {
            self.fail("a rest element cannot follow another rest element");
        }
        self
    }

    pub fn build(self) -> Result<Ast> {
        match self.error {
            Some(message) => Err(Error::InvalidTuple(message)),
            None => Ok(Ast::new(AstKind::Tuple(Tuple::new(
                self.elements,
                self.rest,
            )))),
        }
    }
}

/// Builder for struct schemas
#[derive(Debug, Clone, Default)]
pub struct StructBuilder {
    properties: Vec<PropertySignature>,
    index_signatures: Vec<(Ast, Ast)>,
}

impl StructBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<PropertyKey>, ty: Ast) -> Self {
        self.properties.push(PropertySignature::new(name, ty, false));
        self
    }

    #[must_use]
    pub fn optional_field(mut self, name: impl Into<PropertyKey>, ty: Ast) -> Self {
        self.properties.push(PropertySignature::new(name, ty, true));
        self
    }

    #[must_use]
    pub fn signature(mut self, signature: PropertySignature) -> Self {
        self.properties.push(signature);
        self
    }

    #[must_use]
    pub fn index_signature(mut self, parameter: Ast, ty: Ast) -> Self {
        self.index_signatures.push((parameter, ty));
        self
    }

    pub fn build(self) -> Result<Ast> {
        let index_signatures = self
            .index_signatures
            .into_iter()
            .map(|(parameter, ty)| IndexSignature::new(parameter, ty))
            .collect::<Result<Vec<_>>>()?;
        let literal = TypeLiteral::new(self.properties, index_signatures)?;
        Ok(Ast::new(AstKind::TypeLiteral(literal)))
    }
}

/// Struct of required fields
pub fn struct_of<K: Into<PropertyKey>>(fields: impl IntoIterator<Item = (K, Ast)>) -> Result<Ast> {
    fields
        .into_iter()
        .fold(StructBuilder::new(), |builder, (name, ty)| {
            builder.field(name, ty)
        })
        .build()
}

/// Record keyed by `key`.
///
/// Parameter keys (string, symbol, template literal, refinements of those)
/// produce an index signature; literal keys and unions of literal keys
/// produce required properties.
pub fn record(key: Ast, value: Ast) -> Result<Ast> {
    let keys = match key.kind() {
        AstKind::Union(union) => union.members().to_vec(),
        _ => vec![key.clone()],
    };
    let mut builder = StructBuilder::new();
    for key in keys {
        builder = match key.kind() {
            AstKind::Literal(literal @ (LiteralValue::String(_) | LiteralValue::Number(_))) => {
                builder.field(literal.hash_key(), value.clone())
            }
            AstKind::UniqueSymbol(symbol) => builder.field(symbol.clone(), value.clone()),
            _ if key.is_parameter() => builder.index_signature(key.clone(), value.clone()),
            _ => return Err(Error::InvalidIndexSignature(key.tag().to_string())),
        };
    }
    builder.build()
}

/// Make every property (and tuple element) optional
pub fn partial(ast: Ast) -> Result<Ast> {
    match ast.kind() {
        AstKind::TypeLiteral(literal) => {
            let properties = literal
                .property_signatures()
                .iter()
                .map(|ps| PropertySignature {
                    optional: true,
                    ..ps.clone()
                })
                .collect();
            let index_signatures = literal
                .index_signatures()
                .iter()
                .map(|is| IndexSignature {
                    parameter: is.parameter.clone(),
                    ty: Ast::union(vec![is.ty.clone(), undefined()]),
                })
                .collect();
            Ok(Ast::new(AstKind::TypeLiteral(TypeLiteral::new(
                properties,
                index_signatures,
            )?)))
        }
        AstKind::Tuple(tuple) => {
            let elements = tuple
                .elements
                .iter()
                .map(|e| Element {
                    ty: e.ty.clone(),
                    optional: true,
                })
                .collect();
            let rest = if tuple.has_rest() {
                let mut members = tuple.rest.clone();
                members.push(undefined());
                vec![Ast::union(members)]
            } else {
                Vec::new()
            };
            Ok(Ast::new(AstKind::Tuple(Tuple::new(elements, rest))))
        }
        AstKind::Union(union) => Ok(Ast::union(
            union
                .members()
                .iter()
                .cloned()
                .map(partial)
                .collect::<Result<Vec<_>>>()?,
        )),
        _ => Err(Error::Unsupported(format!("partial of {}", ast.tag()))),
    }
}

fn type_literal_of(ast: &Ast, operation: &str) -> Result<TypeLiteral> {
    match ast.kind() {
        AstKind::TypeLiteral(literal) => Ok(literal.clone()),
        _ => Err(Error::Unsupported(format!("{operation} of {}", ast.tag()))),
    }
}

/// Keep only the listed properties
pub fn pick<K: Into<PropertyKey>>(ast: Ast, keys: impl IntoIterator<Item = K>) -> Result<Ast> {
    let literal = type_literal_of(&ast, "pick")?;
    let keys: Vec<PropertyKey> = keys.into_iter().map(Into::into).collect();
    let properties = keys
        .iter()
        .filter_map(|key| literal.property(key).cloned())
        .collect();
    Ok(Ast::new(AstKind::TypeLiteral(TypeLiteral::new(
        properties,
        Vec::new(),
    )?)))
}

/// Drop the listed properties
pub fn omit<K: Into<PropertyKey>>(ast: Ast, keys: impl IntoIterator<Item = K>) -> Result<Ast> {
    let literal = type_literal_of(&ast, "omit")?;
    let keys: Vec<PropertyKey> = keys.into_iter().map(Into::into).collect();
    let properties = literal
        .property_signatures()
        .iter()
        .filter(|ps| !keys.contains(&ps.name))
        .cloned()
        .collect();
    Ok(Ast::new(AstKind::TypeLiteral(TypeLiteral::new(
        properties,
        literal.index_signatures().to_vec(),
    )?)))
}

/// Merge the properties of two structs.
///
/// Unions distribute over their members; a transformation is extended on
/// both sides and keeps its functions.
pub fn extend(left: Ast, right: Ast) -> Result<Ast> {
    match (left.kind(), right.kind()) {
        (AstKind::TypeLiteral(a), AstKind::TypeLiteral(b)) => {
            let mut properties = a.property_signatures().to_vec();
            properties.extend(b.property_signatures().iter().cloned());
            let mut index_signatures = a.index_signatures().to_vec();
            index_signatures.extend(b.index_signatures().iter().cloned());
            Ok(Ast::new(AstKind::TypeLiteral(TypeLiteral::new(
                properties,
                index_signatures,
            )?)))
        }
        (AstKind::Union(union), _) => Ok(Ast::union(
            union
                .members()
                .iter()
                .map(|member| extend(member.clone(), right.clone()))
                .collect::<Result<Vec<_>>>()?,
        )),
        (_, AstKind::Union(union)) => Ok(Ast::union(
            union
                .members()
                .iter()
                .map(|member| extend(left.clone(), member.clone()))
                .collect::<Result<Vec<_>>>()?,
        )),
        (AstKind::Transform(transform), AstKind::TypeLiteral(_)) => {
            Ok(Ast::new(AstKind::Transform(Transform {
                from: extend(transform.from.clone(), right.clone())?,
                to: extend(transform.to.clone(), right.clone())?,
                ..transform.clone()
            })))
        }
        _ => Err(Error::Unsupported(format!(
            "extend of {} with {}",
            left.tag(),
            right.tag()
        ))),
    }
}

pub fn union(members: impl IntoIterator<Item = Ast>) -> Ast {
    Ast::union(members.into_iter().collect())
}

/// `ast` or `null`
pub fn nullable(ast: Ast) -> Ast {
    Ast::union(vec![ast, null()])
}

/// Recursive schema: `f` runs once, on first use
pub fn lazy(f: impl Fn() -> Ast + Send + Sync + 'static) -> Ast {
    Ast::lazy(f)
}

/// Schema for a type the interpreter knows nothing about
pub fn declare<D, E>(type_parameters: Vec<Ast>, decode: D, encode: E) -> Ast
where
    D: Fn(&Value, &[Ast], &dyn DeclarationContext) -> ParseResult<Value> + Send + Sync + 'static,
    E: Fn(&Value, &[Ast], &dyn DeclarationContext) -> ParseResult<Value> + Send + Sync + 'static,
{
    Ast::new(AstKind::Declaration(Declaration {
        type_parameters,
        decode: Arc::new(decode),
        encode: Arc::new(encode),
    }))
}

fn check_date(input: &Value, _: &[Ast], ctx: &dyn DeclarationContext) -> ParseResult<Value> {
    match input {
        Value::Date(_) => Ok(input.clone()),
        _ => Err(ParseError::type_error(ctx.ast(), input).into()),
    }
}

static DATE: LazyLock<Ast> =
    LazyLock::new(|| declare(Vec::new(), check_date, check_date).with_identifier("Date"));

/// Date values
pub fn date() -> Ast {
    DATE.clone()
}

static UNKNOWN_RECORD: LazyLock<Ast> = LazyLock::new(|| {
    let signature = IndexSignature {
        parameter: string(),
        ty: unknown(),
    };
    Ast::new(AstKind::TypeLiteral(TypeLiteral::indexed(vec![signature])))
        .with_identifier("{ readonly [x: string]: unknown }")
});

/// Any object, keyed by strings
pub fn unknown_record() -> Ast {
    UNKNOWN_RECORD.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_shared_and_named() {
        assert!(string().ptr_eq(&string()));
        assert_eq!(string().annotations().identifier(), Some("string"));
        assert!(null().is_literal());
        assert!(void().is_keyword(Keyword::Void));
        assert!(never().is_keyword(Keyword::Never));
    }

    #[test]
    fn test_unknown_record() {
        let ast = unknown_record();
        assert!(ast.ptr_eq(&unknown_record()));
        assert_eq!(
            ast.annotations().identifier(),
            Some("{ readonly [x: string]: unknown }")
        );
        let AstKind::TypeLiteral(literal) = ast.kind() else {
            panic!("expected type literal");
        };
        assert!(literal.property_signatures().is_empty());
        assert_eq!(literal.index_signatures().len(), 1);
        assert!(literal.index_signatures()[0].ty.is_keyword(Keyword::Unknown));
    }

    #[test]
    fn test_literals() {
        assert!(literals(Vec::<&str>::new()).is_keyword(Keyword::Never));
        assert!(literals(["a"]).is_literal());
        assert!(literals(["a", "b"]).is_union());
    }

    #[test]
    fn test_template_literal_expands_unions() {
        let ast = template_literal(&[literals(["a", "b"]), literal("c")]).unwrap();
        let AstKind::Union(union) = ast.kind() else {
            panic!("expected union");
        };
        assert_eq!(union.members().len(), 2);
        assert!(!ast.is_parameter());

        let ast = template_literal(&[string(), literal("-"), string()]).unwrap();
        assert!(ast.is_template_literal());
        assert!(ast.is_parameter());

        assert!(template_literal(&[boolean()]).is_err());
    }

    #[test]
    fn test_tuple_builder_order_rules() {
        assert!(TupleBuilder::new().element(string()).rest(number()).element(boolean()).build().is_ok());
        assert!(matches!(
            TupleBuilder::new().rest(number()).optional_element(string()).build(),
            Err(Error::InvalidTuple(_))
        ));
        assert!(TupleBuilder::new().rest(number()).rest(number()).build().is_err());
        assert!(TupleBuilder::new().optional_element(number()).element(number()).build().is_err());
    }

    #[test]
    fn test_record_keys() {
        let ast = record(string(), number()).unwrap();
        let AstKind::TypeLiteral(literal) = ast.kind() else {
            panic!("expected type literal");
        };
        assert_eq!(literal.index_signatures().len(), 1);

        let ast = record(literals(["a", "b"]), number()).unwrap();
        let AstKind::TypeLiteral(literal) = ast.kind() else {
            panic!("expected type literal");
        };
        assert_eq!(literal.property_signatures().len(), 2);

        assert!(record(number(), number()).is_err());
    }

    #[test]
    fn test_struct_rejects_duplicates() {
        let result = StructBuilder::new().field("a", string()).field("a", number()).build();
        assert!(matches!(result, Err(Error::DuplicatePropertySignature(_))));
    }

    #[test]
    fn test_pick_omit_partial() {
        let ast = struct_of([("a", string()), ("b", number()), ("c", boolean())]).unwrap();
        let picked = pick(ast.clone(), ["a", "c"]).unwrap();
        let AstKind::TypeLiteral(literal) = picked.kind() else {
            panic!("expected type literal");
        };
        assert_eq!(literal.property_signatures().len(), 2);

        let omitted = omit(ast.clone(), ["a"]).unwrap();
        let AstKind::TypeLiteral(literal) = omitted.kind() else {
            panic!("expected type literal");
        };
        assert!(literal.property(&"a".into()).is_none());

        let partial = partial(ast).unwrap();
        let AstKind::TypeLiteral(literal) = partial.kind() else {
            panic!("expected type literal");
        };
        assert!(literal.property_signatures().iter().all(|ps| ps.optional));
        assert!(pick(string(), ["a"]).is_err());
    }

    #[test]
    fn test_extend() {
        let a = struct_of([("a", string())]).unwrap();
        let b = struct_of([("b", number())]).unwrap();
        let ab = extend(a.clone(), b).unwrap();
        let AstKind::TypeLiteral(literal) = ab.kind() else {
            panic!("expected type literal");
        };
        assert_eq!(literal.property_signatures().len(), 2);
        assert!(extend(a.clone(), a).is_err());
    }

    #[test]
    fn test_date_is_declaration() {
        assert!(date().is_declaration());
        assert_eq!(date().annotations().identifier(), Some("Date"));
    }
}

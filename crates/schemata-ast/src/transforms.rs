//! Transformations
//!
//! A transformation pairs an input schema with an output schema and a
//! function for each direction. Decoding runs `from`, the decode function,
//! then `to`; encoding runs the same chain backwards.

use crate::ast::{Ast, AstKind, LiteralValue, Transform, TransformFn};
use crate::error::{ParseError, ParseResult};
use crate::options::ParseOptions;
use crate::refinements::trimmed;
use crate::schema::{array, bigint_from_self, date, extend, number, string, struct_of};
use crate::Result;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use schemata_value::{PropertyKey, Value, format_number};
use std::future::Future;

/// Infallible transformation
pub fn transform(
    from: Ast,
    to: Ast,
    decode: impl Fn(&Value) -> Value + Send + Sync + 'static,
    encode: impl Fn(&Value) -> Value + Send + Sync + 'static,
) -> Ast {
    Ast::transform(
        from,
        to,
        TransformFn::sync(move |value, _, _| Ok(decode(value))),
        TransformFn::sync(move |value, _, _| Ok(encode(value))),
    )
}

/// Fallible transformation; the functions receive the transformation node
/// to build their failures against
pub fn transform_or_fail(
    from: Ast,
    to: Ast,
    decode: impl Fn(&Value, &ParseOptions, &Ast) -> ParseResult<Value> + Send + Sync + 'static,
    encode: impl Fn(&Value, &ParseOptions, &Ast) -> ParseResult<Value> + Send + Sync + 'static,
) -> Ast {
    Ast::transform(from, to, TransformFn::sync(decode), TransformFn::sync(encode))
}

/// Transformation with asynchronous functions; only the async entry points
/// can run it
pub fn transform_async<D, DF, E, EF>(from: Ast, to: Ast, decode: D, encode: E) -> Ast
where
    D: Fn(Value, ParseOptions, Ast) -> DF + Send + Sync + 'static,
    DF: Future<Output = ParseResult<Value>> + Send + 'static,
    E: Fn(Value, ParseOptions, Ast) -> EF + Send + Sync + 'static,
    EF: Future<Output = ParseResult<Value>> + Send + 'static,
{
    Ast::transform(
        from,
        to,
        TransformFn::from_async(decode),
        TransformFn::from_async(encode),
    )
}

/// Skip the post-validation of a transformation's output; other schemas are
/// returned unchanged
pub fn non_strict(ast: Ast) -> Ast {
    match ast.kind() {
        AstKind::Transform(transform) => Ast::with_annotations(
            AstKind::Transform(Transform {
                strict: false,
                ..transform.clone()
            }),
            ast.annotations().clone(),
        ),
        _ => ast,
    }
}

/// Chain two schemas: decode with `ab`, then decode the result with `bc`
pub fn compose(ab: Ast, bc: Ast) -> Ast {
    Ast::transform(ab, bc, TransformFn::identity(), TransformFn::identity())
}

fn parse_number(s: &str) -> Option<f64> {
    match s {
        "NaN" => return Some(f64::NAN),
        "Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    let trimmed = s.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Numbers encoded as strings; `NaN`, `Infinity` and `-Infinity` are
/// accepted verbatim
pub fn number_from_string(from: Ast) -> Ast {
    transform_or_fail(
        from,
        number(),
        |value, _, ast| match value.as_str().and_then(parse_number) {
            Some(n) => Ok(Value::Number(n)),
            None => Err(ParseError::type_error(ast, value).into()),
        },
        |value, _, ast| match value {
            Value::Number(n) => Ok(Value::String(format_number(*n))),
            _ => Err(ParseError::type_error(ast, value).into()),
        },
    )
}

/// Strip surrounding whitespace while decoding
pub fn trim(from: Ast) -> Ast {
    transform(
        from,
        trimmed(string()),
        |value| match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other.clone(),
        },
        Value::clone,
    )
}

/// Split a string into parts; encoding joins them back
pub fn split(from: Ast, separator: &str) -> Ast {
    let decode_separator = separator.to_string();
    let encode_separator = separator.to_string();
    transform(
        from,
        array(string()),
        move |value| match value {
            Value::String(s) => {
                Value::array(s.split(decode_separator.as_str()).map(Value::from))
            }
            other => other.clone(),
        },
        move |value| match value {
            Value::Array(items) => Value::String(
                items
                    .iter()
                    .map(Value::to_display_string)
                    .collect::<Vec<_>>()
                    .join(encode_separator.as_str()),
            ),
            other => other.clone(),
        },
    )
}

pub fn bigint_from_string(from: Ast) -> Ast {
    transform_or_fail(
        from,
        bigint_from_self(),
        |value, _, ast| match value.as_str().map(|s| s.trim().parse::<i128>()) {
            Some(Ok(n)) => Ok(Value::BigInt(n)),
            _ => Err(ParseError::type_error(ast, value).into()),
        },
        |value, _, ast| match value {
            Value::BigInt(n) => Ok(Value::String(n.to_string())),
            _ => Err(ParseError::type_error(ast, value).into()),
        },
    )
}

/// RFC 3339 strings to dates
pub fn date_from_string(from: Ast) -> Ast {
    transform_or_fail(
        from,
        date(),
        |value, _, ast| match value.as_str().map(DateTime::<FixedOffset>::parse_from_rfc3339) {
            Some(Ok(date)) => Ok(Value::Date(date.with_timezone(&Utc))),
            _ => Err(ParseError::type_error(ast, value).into()),
        },
        |value, _, ast| match value {
            Value::Date(date) => Ok(Value::String(
                date.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            _ => Err(ParseError::type_error(ast, value).into()),
        },
    )
}

/// Add a constant property while decoding and remove it while encoding.
///
/// Useful to tag the members of a union that carry no discriminant of
/// their own.
pub fn attach_property_signature(
    schema: Ast,
    key: impl Into<PropertyKey>,
    value: impl Into<LiteralValue>,
) -> Result<Ast> {
    let key = key.into();
    let literal = value.into();
    let to = extend(
        schema.to_side(),
        struct_of([(key.clone(), Ast::literal(literal.clone()))])?,
    )?;
    let remove = key.clone();
    Ok(transform_or_fail(
        schema,
        to,
        move |input, _, ast| match input {
            Value::Object(members) => {
                let mut members = members.clone();
                members.insert(key.clone(), literal.to_value());
                Ok(Value::Object(members))
            }
            _ => Err(ParseError::type_error(ast, input).into()),
        },
        move |input, _, ast| match input {
            Value::Object(members) => {
                let mut members = members.clone();
                members.shift_remove(&remove);
                Ok(Value::Object(members))
            }
            _ => Err(ParseError::type_error(ast, input).into()),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1"), Some(1.0));
        assert_eq!(parse_number(" 1.5 "), Some(1.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("-Infinity"), Some(f64::NEG_INFINITY));
        assert!(parse_number("NaN").is_some_and(f64::is_nan));
        assert_eq!(parse_number("a"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("nan"), None);
    }

    #[test]
    fn test_number_from_string_sides() {
        let ast = number_from_string(string());
        assert!(ast.is_transform());
        assert!(ast.from_side().ptr_eq(&string()));
        assert!(ast.to_side().ptr_eq(&number()));
    }

    #[test]
    fn test_non_strict() {
        let ast = non_strict(number_from_string(string()));
        let AstKind::Transform(transform) = ast.kind() else {
            panic!("expected transform");
        };
        assert!(!transform.strict);
        assert!(non_strict(string()).ptr_eq(&string()));
    }

    #[test]
    fn test_attach_property_signature_target() {
        let circle = struct_of([("radius", number())]).unwrap();
        let ast = attach_property_signature(circle, "kind", "circle").unwrap();
        let AstKind::TypeLiteral(literal) = ast.to_side().kind().clone() else {
            panic!("expected type literal");
        };
        let kind = literal.property(&"kind".into()).unwrap();
        assert!(kind.ty.is_literal());
        assert!(!kind.optional);
    }

    #[test]
    fn test_compose_sides() {
        let ast = compose(number_from_string(string()), int_schema());
        assert!(ast.from_side().ptr_eq(&string()));
        assert!(ast.to_side().is_refinement());
    }

    fn int_schema() -> Ast {
        crate::refinements::int(number())
    }
}

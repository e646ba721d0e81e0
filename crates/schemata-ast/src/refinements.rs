//! Refinements
//!
//! Each refinement wraps its source schema in a `Refinement` node and
//! describes itself with a description annotation, which becomes the
//! expected label in error messages (`Expected an integer, actual 1.5`).

use crate::annotations::{Annotation, AnnotationId};
use crate::ast::Ast;
use crate::error::ParseError;
use crate::options::ParseOptions;
use crate::Result;
use regex::Regex;
use schemata_value::{Value, format_number};

/// Narrow `from` by a predicate; a rejected value fails with a generic
/// type error against the refinement
pub fn filter(from: Ast, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Ast {
    Ast::refinement(from, move |value, _, ast| {
        if predicate(value) {
            None
        } else {
            Some(ParseError::type_error(ast, value))
        }
    })
}

/// Narrow `from` by a check that builds its own failure
pub fn filter_with(
    from: Ast,
    check: impl Fn(&Value, &ParseOptions, &Ast) -> Option<ParseError> + Send + Sync + 'static,
) -> Ast {
    Ast::refinement(from, check)
}

fn quoted(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""))
}

fn string_check(
    from: Ast,
    description: String,
    predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
) -> Ast {
    filter(from, move |value| value.as_str().is_some_and(&predicate)).with_description(description)
}

fn number_check(
    from: Ast,
    description: String,
    predicate: impl Fn(f64) -> bool + Send + Sync + 'static,
) -> Ast {
    filter(from, move |value| value.as_f64().is_some_and(&predicate)).with_description(description)
}

// Lengths count UTF-16 code units.
fn char_len(s: &str) -> usize {
    s.encode_utf16().count()
}

pub fn min_length(from: Ast, min: usize) -> Ast {
    string_check(
        from,
        format!("a string at least {min} character(s) long"),
        move |s| char_len(s) >= min,
    )
}

pub fn max_length(from: Ast, max: usize) -> Ast {
    string_check(
        from,
        format!("a string at most {max} character(s) long"),
        move |s| char_len(s) <= max,
    )
}

pub fn length(from: Ast, length: usize) -> Ast {
    let description = if length == 1 {
        "a character".to_string()
    } else {
        format!("a string {length} character(s) long")
    };
    string_check(from, description, move |s| char_len(s) == length)
}

/// Strings matching a regular expression
pub fn pattern(from: Ast, pattern: &str) -> Result<Ast> {
    let regex = Regex::new(pattern)?;
    Ok(string_check(
        from,
        format!("a string matching the pattern {pattern}"),
        move |s| regex.is_match(s),
    ))
}

pub fn starts_with(from: Ast, prefix: &str) -> Ast {
    let owned = prefix.to_string();
    string_check(
        from,
        format!("a string starting with {}", quoted(prefix)),
        move |s| s.starts_with(owned.as_str()),
    )
}

pub fn ends_with(from: Ast, suffix: &str) -> Ast {
    let owned = suffix.to_string();
    string_check(
        from,
        format!("a string ending with {}", quoted(suffix)),
        move |s| s.ends_with(owned.as_str()),
    )
}

pub fn includes(from: Ast, needle: &str) -> Ast {
    let owned = needle.to_string();
    string_check(
        from,
        format!("a string including {}", quoted(needle)),
        move |s| s.contains(owned.as_str()),
    )
}

pub fn trimmed(from: Ast) -> Ast {
    string_check(
        from,
        "a string with no leading or trailing whitespace".to_string(),
        |s| s.trim() == s,
    )
}

pub fn greater_than(from: Ast, min: f64) -> Ast {
    number_check(
        from,
        format!("a number greater than {}", format_number(min)),
        move |n| n > min,
    )
}

pub fn greater_than_or_equal_to(from: Ast, min: f64) -> Ast {
    number_check(
        from,
        format!("a number greater than or equal to {}", format_number(min)),
        move |n| n >= min,
    )
}

pub fn less_than(from: Ast, max: f64) -> Ast {
    number_check(
        from,
        format!("a number less than {}", format_number(max)),
        move |n| n < max,
    )
}

pub fn less_than_or_equal_to(from: Ast, max: f64) -> Ast {
    number_check(
        from,
        format!("a number less than or equal to {}", format_number(max)),
        move |n| n <= max,
    )
}

pub fn int(from: Ast) -> Ast {
    number_check(from, "an integer".to_string(), |n| {
        n.is_finite() && n.fract() == 0.0
    })
}

pub fn finite(from: Ast) -> Ast {
    number_check(from, "a finite number".to_string(), f64::is_finite)
}

pub fn non_nan(from: Ast) -> Ast {
    number_check(from, "a number NaN excluded".to_string(), |n| !n.is_nan())
}

pub fn min_items(from: Ast, min: usize) -> Ast {
    filter(from, move |value| {
        value.as_array().is_some_and(|items| items.len() >= min)
    })
    .with_description(format!("an array of at least {min} items"))
}

pub fn max_items(from: Ast, max: usize) -> Ast {
    filter(from, move |value| {
        value.as_array().is_some_and(|items| items.len() <= max)
    })
    .with_description(format!("an array of at most {max} items"))
}

/// Tag a schema with a nominal brand; brands accumulate
pub fn brand(from: Ast, name: &str) -> Ast {
    let mut brands: Vec<Value> = from
        .annotations()
        .brands()
        .into_iter()
        .map(Value::from)
        .collect();
    brands.push(Value::from(name));
    from.with_annotation(AnnotationId::Brand, Annotation::Values(brands))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AstKind;
    use crate::schema::{array, number, string};

    fn check(ast: &Ast, value: &Value) -> Option<ParseError> {
        let AstKind::Refinement(refinement) = ast.kind() else {
            panic!("expected refinement");
        };
        (refinement.filter)(value, &ParseOptions::default(), ast)
    }

    #[test]
    fn test_length_descriptions() {
        assert_eq!(
            min_length(string(), 2).annotations().description(),
            Some("a string at least 2 character(s) long")
        );
        assert_eq!(length(string(), 1).annotations().description(), Some("a character"));
        assert_eq!(
            length(string(), 3).annotations().description(),
            Some("a string 3 character(s) long")
        );
    }

    #[test]
    fn test_string_checks() {
        let ast = min_length(string(), 2);
        assert!(check(&ast, &Value::from("ab")).is_none());
        assert!(check(&ast, &Value::from("a")).is_some());

        let ast = length(string(), 1);
        assert!(check(&ast, &Value::from("é")).is_none());

        let ast = starts_with(string(), "a");
        assert_eq!(ast.annotations().description(), Some("a string starting with \"a\""));
        assert!(check(&ast, &Value::from("abc")).is_none());

        let ast = pattern(string(), "^[0-9]+$").unwrap();
        assert!(check(&ast, &Value::from("123")).is_none());
        assert!(check(&ast, &Value::from("12a")).is_some());
        assert!(pattern(string(), "(").is_err());
    }

    #[test]
    fn test_number_checks() {
        let ast = int(number());
        assert!(check(&ast, &Value::from(1)).is_none());
        assert!(check(&ast, &Value::from(1.5)).is_some());
        assert!(check(&ast, &Value::Number(f64::INFINITY)).is_some());

        let ast = greater_than(number(), 0.0);
        assert_eq!(ast.annotations().description(), Some("a number greater than 0"));
        assert!(check(&ast, &Value::from(0)).is_some());
    }

    #[test]
    fn test_failure_points_at_refinement() {
        let ast = int(number());
        let Some(ParseError::Type { expected, .. }) = check(&ast, &Value::from(1.5)) else {
            panic!("expected type error");
        };
        assert!(expected.ptr_eq(&ast));
    }

    #[test]
    fn test_items() {
        let ast = min_items(array(number()), 1);
        assert!(check(&ast, &Value::array([])).is_some());
        assert!(check(&ast, &Value::array([Value::from(1)])).is_none());
    }

    #[test]
    fn test_brands_accumulate() {
        let ast = brand(brand(int(number()), "Int"), "Positive");
        assert_eq!(ast.annotations().brands(), vec!["Int".to_string(), "Positive".to_string()]);
        assert!(ast.is_refinement());
    }
}

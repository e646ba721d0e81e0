//! Structured parse errors
//!
//! Errors are plain data built by the interpreter during one decode/encode
//! call. Wrapper variants (`Index`, `Key`, `UnionMember`) carry the position
//! of their children; the remaining variants are leaves.

use crate::ast::Ast;
use schemata_value::{PropertyKey, Value};

/// One node of an error tree
#[derive(Debug, Clone)]
pub enum ParseError {
    /// Value does not match the expected schema
    Type {
        expected: Ast,
        actual: Value,
        message: Option<String>,
    },

    /// Parsing is not allowed here (e.g. a synchronous call reached an
    /// asynchronous transformation)
    Forbidden,

    /// Required element or property is absent
    Missing,

    /// Element or property is not allowed by the schema
    Unexpected { actual: Value },

    /// Errors of the element at `index`
    Index { index: usize, errors: ParseFailure },

    /// Errors of the property `key`
    Key { key: PropertyKey, errors: ParseFailure },

    /// Errors of one attempted union member
    UnionMember { errors: ParseFailure },
}

impl ParseError {
    /// Type mismatch against `expected`
    pub fn type_error(expected: &Ast, actual: &Value) -> Self {
        ParseError::Type {
            expected: expected.clone(),
            actual: actual.clone(),
            message: None,
        }
    }

    /// Type mismatch with a custom message
    pub fn type_with_message(expected: &Ast, actual: &Value, message: impl Into<String>) -> Self {
        ParseError::Type {
            expected: expected.clone(),
            actual: actual.clone(),
            message: Some(message.into()),
        }
    }

    pub fn missing() -> Self {
        ParseError::Missing
    }

    pub fn forbidden() -> Self {
        ParseError::Forbidden
    }

    pub fn unexpected(actual: &Value) -> Self {
        ParseError::Unexpected {
            actual: actual.clone(),
        }
    }

    pub fn index(index: usize, errors: ParseFailure) -> Self {
        ParseError::Index { index, errors }
    }

    pub fn key(key: impl Into<PropertyKey>, errors: ParseFailure) -> Self {
        ParseError::Key {
            key: key.into(),
            errors,
        }
    }

    pub fn union_member(errors: ParseFailure) -> Self {
        ParseError::UnionMember { errors }
    }

    /// Check if this error wraps child errors
    pub fn is_wrapper(&self) -> bool {
        matches!(
            self,
            ParseError::Index { .. } | ParseError::Key { .. } | ParseError::UnionMember { .. }
        )
    }

    /// Child errors of a wrapper, empty for leaves
    pub fn children(&self) -> &[ParseError] {
        match self {
            ParseError::Index { errors, .. }
            | ParseError::Key { errors, .. }
            | ParseError::UnionMember { errors } => errors.errors(),
            _ => &[],
        }
    }
}

/// Non-empty list of parse errors
#[derive(Debug, Clone)]
pub struct ParseFailure {
    errors: Vec<ParseError>,
}

/// Result of a decode/encode step
pub type ParseResult<T> = std::result::Result<T, ParseFailure>;

impl ParseFailure {
    /// Build a failure from a list of errors; `None` if the list is empty
    pub fn new(errors: Vec<ParseError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Failure made of a single error
    pub fn single(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn first(&self) -> &ParseError {
        &self.errors[0]
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ParseError> {
        self.errors.iter()
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// Number of leaf errors in the whole tree
    pub fn leaf_count(&self) -> usize {
        fn count(error: &ParseError) -> usize {
            if error.is_wrapper() {
                error.children().iter().map(count).sum()
            } else {
                1
            }
        }
        self.errors.iter().map(count).sum()
    }
}

impl From<ParseError> for ParseFailure {
    fn from(error: ParseError) -> Self {
        Self::single(error)
    }
}

impl<'a> IntoIterator for &'a ParseFailure {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_failure_is_rejected() {
        assert!(ParseFailure::new(Vec::new()).is_none());
        let failure = ParseFailure::new(vec![ParseError::missing()]).unwrap();
        assert_eq!(failure.len(), 1);
        assert!(matches!(failure.first(), ParseError::Missing));
    }

    #[test]
    fn test_leaf_count() {
        let failure = ParseFailure::new(vec![
            ParseError::key("a", ParseError::missing().into()),
            ParseError::index(
                0,
                ParseFailure::new(vec![
                    ParseError::unexpected(&Value::Null),
                    ParseError::union_member(ParseError::forbidden().into()),
                ])
                .unwrap(),
            ),
        ])
        .unwrap();
        assert_eq!(failure.leaf_count(), 3);
        assert_eq!(failure.first().children().len(), 1);
        assert!(!ParseError::missing().is_wrapper());
    }
}

#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # schemata-parse
//!
//! Decode/encode interpreter, tree formatter and issue reporter.
//!
//! ## Example Usage
//!
//! ```rust
//! use schemata_ast::schema::{number, string, struct_of};
//! use schemata_ast::ParseOptions;
//! use schemata_parse::{decode, format_errors};
//! use schemata_value::Value;
//!
//! let person = struct_of([("name", string()), ("age", number())]).unwrap();
//! let input = Value::object([("name", Value::from("Ada")), ("age", Value::from(36))]);
//! assert!(decode(&person, &input, ParseOptions::default()).is_ok());
//!
//! let failure = decode(&person, &Value::object([("name", Value::from(1))]), ParseOptions::default())
//!     .unwrap_err();
//! assert_eq!(
//!     format_errors(&failure),
//!     "error(s) found\n└─ [\"name\"]\n   └─ Expected string, actual 1"
//! );
//! ```

pub mod formatter;
pub mod parser;
pub mod reporter;

pub use formatter::{format_actual, format_errors, format_expected};
pub use parser::{Execution, Parser};
pub use reporter::{Issue, IssueKind, ParseReporter, PathSegment, ReportFormat};

use schemata_ast::{Ast, Direction, ParseFailure, ParseOptions, ParseResult};
use schemata_value::Value;
use thiserror::Error;
use tracing::debug;

/// Errors returned by the raising entry points
#[derive(Error, Debug)]
pub enum Error {
    /// Decoding or encoding failed; the message is the formatted error tree
    #[error("{message}")]
    Parse {
        message: String,
        failure: ParseFailure,
    },
}

impl Error {
    pub fn failure(&self) -> &ParseFailure {
        match self {
            Error::Parse { failure, .. } => failure,
        }
    }
}

impl From<ParseFailure> for Error {
    fn from(failure: ParseFailure) -> Self {
        Error::Parse {
            message: format_errors(&failure),
            failure,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn run_sync(ast: &Ast, input: &Value, options: ParseOptions, direction: Direction) -> ParseResult<Value> {
    let result = Parser::new(Execution::Sync, options).run_sync(ast, input, direction);
    if let Err(failure) = &result {
        debug!(
            "{:?} against {} failed with {} error(s)",
            direction,
            ast.tag(),
            failure.leaf_count()
        );
    }
    result
}

async fn run_async(
    ast: &Ast,
    input: &Value,
    options: ParseOptions,
    direction: Direction,
) -> ParseResult<Value> {
    let parser = Parser::new(Execution::Async, options);
    let result = parser.run(ast, input, direction).await;
    if let Err(failure) = &result {
        debug!(
            "{:?} against {} failed with {} error(s)",
            direction,
            ast.tag(),
            failure.leaf_count()
        );
    }
    result
}

/// Decode `input` synchronously; asynchronous transformations fail with
/// `Forbidden`
pub fn decode(ast: &Ast, input: &Value, options: ParseOptions) -> ParseResult<Value> {
    run_sync(ast, input, options, Direction::Decode)
}

/// Encode `value` synchronously
pub fn encode(ast: &Ast, value: &Value, options: ParseOptions) -> ParseResult<Value> {
    run_sync(ast, value, options, Direction::Encode)
}

/// Decode, turning failures into an error whose message is the formatted tree
pub fn decode_or_error(ast: &Ast, input: &Value, options: ParseOptions) -> Result<Value> {
    Ok(decode(ast, input, options)?)
}

/// Encode, turning failures into an error whose message is the formatted tree
pub fn encode_or_error(ast: &Ast, value: &Value, options: ParseOptions) -> Result<Value> {
    Ok(encode(ast, value, options)?)
}

/// Decode `input`, awaiting asynchronous transformations
pub async fn decode_async(ast: &Ast, input: &Value, options: ParseOptions) -> ParseResult<Value> {
    run_async(ast, input, options, Direction::Decode).await
}

/// Encode `value`, awaiting asynchronous transformations
pub async fn encode_async(ast: &Ast, value: &Value, options: ParseOptions) -> ParseResult<Value> {
    run_async(ast, value, options, Direction::Encode).await
}

/// Check a domain value against the output side of `ast`
pub fn validate(ast: &Ast, value: &Value, options: ParseOptions) -> ParseResult<Value> {
    decode(&ast.to_side(), value, options)
}

/// Type guard on the output side of `ast`
pub fn is(ast: &Ast, value: &Value) -> bool {
    Parser::new(Execution::Sync, ParseOptions::default())
        .run_sync(&ast.to_side(), value, Direction::Decode)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemata_ast::schema::{number, string};
    use schemata_ast::transforms::number_from_string;

    #[test]
    fn test_error_message_is_tree() {
        let err = decode_or_error(&string(), &Value::from(1), ParseOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "error(s) found\n└─ Expected string, actual 1");
        assert_eq!(err.failure().len(), 1);
    }

    #[test]
    fn test_validate_uses_output_side() {
        let ast = number_from_string(string());
        assert!(validate(&ast, &Value::from(1), ParseOptions::default()).is_ok());
        assert!(validate(&ast, &Value::from("1"), ParseOptions::default()).is_err());
        assert!(is(&ast, &Value::from(1)));
        assert!(!is(&ast, &Value::from("1")));
        assert!(is(&number(), &Value::from(2)));
    }
}

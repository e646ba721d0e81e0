#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! # schemata-ast
//!
//! Schema model for the schemata workspace.
//!
//! This crate provides:
//! - the immutable schema AST ([`Ast`]) and its annotations
//! - the structured parse error model consumed by the interpreter and formatter
//! - parse options
//! - combinators that build well-formed schemas (`schema`, `refinements`, `transforms`)
//! - input/output side projections and the union discriminant index
//! - a YAML/JSON schema document loader backed by a concurrent registry

pub mod annotations;
pub mod ast;
pub mod discriminant;
pub mod error;
pub mod loader;
pub mod options;
pub mod refinements;
pub mod registry;
pub mod schema;
mod side;
pub mod transforms;

pub use annotations::{Annotation, AnnotationId, Annotations, MessageFn};
pub use ast::{
    Ast, AstKind, BoxFuture, DeclarationContext, Direction, Element, EnumMember, EnumValue,
    IndexSignature, Keyword, LiteralValue, PropertySignature, TemplateLiteral, TemplateSpan,
    TransformFn, Tuple, TypeLiteral,
};
pub use discriminant::DiscriminantIndex;
pub use error::{ParseError, ParseFailure, ParseResult};
pub use loader::SchemaLoader;
pub use options::{ErrorsMode, OnExcessProperty, ParseOptions};
pub use registry::SchemaRegistry;

use thiserror::Error;

/// Errors that can occur while building or loading schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Duplicate property signature: {0}")]
    DuplicatePropertySignature(String),

    #[error("Invalid index signature parameter: {0}")]
    InvalidIndexSignature(String),

    #[error("Invalid tuple: {0}")]
    InvalidTuple(String),

    #[error("Invalid template literal: {0}")]
    InvalidTemplateLiteral(String),

    #[error("Unsupported schema: {0}")]
    Unsupported(String),

    #[error("Schema not found: {0}")]
    NotFound(String),

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # schemata-value
//!
//! Dynamic value model consumed and produced by schemata parsers.
//!
//! Schemas are checked against untrusted input whose shape is unknown until
//! runtime, so the interpreter works over a closed set of dynamic values:
//! primitives, symbols, dates, arrays, and insertion-ordered objects keyed
//! by [`PropertyKey`].

/// JSON conversion and `JSON.stringify`-style rendering.
pub mod json;
/// Property keys used by objects and error paths.
pub mod key;
/// Identity-compared symbols and the global symbol registry.
pub mod symbol;
/// Core dynamic value type.
pub mod value;

pub use key::PropertyKey;
pub use symbol::Symbol;
pub use value::{Object, Value, format_number};

use thiserror::Error;

/// Errors that can occur when converting or rendering values
#[derive(Error, Debug)]
pub enum Error {
    #[error("Conversion error in {context}: {message}")]
    Conversion { context: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a conversion error with conversion context.
    pub fn conversion(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            context: context.into(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for value operations.
pub type Result<T> = std::result::Result<T, Error>;

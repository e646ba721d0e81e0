//! Annotation map attached to every AST node
//!
//! The parser only reads identifier, title, description, and message
//! annotations. Everything else (hooks, examples, brands, custom keys) rides
//! along untouched so that it survives re-annotation of a node.

use schemata_value::{Symbol, Value};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Produces a custom failure message from the actual value; `None` falls
/// back to the default message.
pub type MessageFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Annotation keys
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationId {
    Identifier,
    Title,
    Description,
    Message,
    Documentation,
    Examples,
    Brand,
    ArbitraryHook,
    PrettyHook,
    Custom(Symbol),
}

/// Annotation values
#[derive(Clone)]
pub enum Annotation {
    /// Plain text (identifier, title, description, documentation)
    Text(String),

    /// Message override
    Message(MessageFn),

    /// Value list (examples, brands)
    Values(Vec<Value>),

    /// Anything else, including hook registrations
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Annotation::Message(_) => f.write_str("Message(<fn>)"),
            Annotation::Values(values) => f.debug_tuple("Values").field(values).finish(),
            Annotation::Opaque(_) => f.write_str("Opaque(<any>)"),
        }
    }
}

/// Annotations of a single node
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    entries: HashMap<AnnotationId, Annotation>,
}

impl Annotations {
    /// Create an empty annotation map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an annotation, replacing any previous value for the same key
    #[must_use]
    pub fn with(mut self, id: AnnotationId, annotation: Annotation) -> Self {
        self.entries.insert(id, annotation);
        self
    }

    /// Set an annotation in place
    pub fn insert(&mut self, id: AnnotationId, annotation: Annotation) {
        self.entries.insert(id, annotation);
    }

    /// Get an annotation by key
    pub fn get(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.entries.get(id)
    }

    /// Merge `other` on top of these annotations
    #[must_use]
    pub fn merge(mut self, other: &Annotations) -> Self {
        for (id, annotation) in &other.entries {
            self.entries.insert(id.clone(), annotation.clone());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn text(&self, id: &AnnotationId) -> Option<&str> {
        match self.entries.get(id) {
            Some(Annotation::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        self.text(&AnnotationId::Identifier)
    }

    pub fn title(&self) -> Option<&str> {
        self.text(&AnnotationId::Title)
    }

    pub fn description(&self) -> Option<&str> {
        self.text(&AnnotationId::Description)
    }

    pub fn documentation(&self) -> Option<&str> {
        self.text(&AnnotationId::Documentation)
    }

    /// Message override, if any
    pub fn message(&self) -> Option<&MessageFn> {
        match self.entries.get(&AnnotationId::Message) {
            Some(Annotation::Message(message)) => Some(message),
            _ => None,
        }
    }

    /// Brand names carried by the node
    pub fn brands(&self) -> Vec<String> {
        match self.entries.get(&AnnotationId::Brand) {
            Some(Annotation::Values(values)) => values
                .iter()
                .filter_map(|v| v.as_str().map(ToString::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Label used in error messages: identifier, then title, then description
    pub fn expected_label(&self) -> Option<&str> {
        self.identifier()
            .or_else(|| self.title())
            .or_else(|| self.description())
    }
}

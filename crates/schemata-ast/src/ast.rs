//! Schema abstract syntax tree
//!
//! An [`Ast`] is a shared handle to an immutable node. Nodes are built once by
//! the constructors in [`crate::schema`] and then only read by the parser,
//! so a single tree can serve any number of concurrent decode/encode calls.

use crate::annotations::{Annotation, AnnotationId, Annotations, MessageFn};
use crate::discriminant::DiscriminantIndex;
use crate::error::{ParseError, ParseResult};
use crate::options::ParseOptions;
use crate::{Error, Result};
use regex::Regex;
use schemata_value::{PropertyKey, Symbol, Value, format_number};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use tracing::trace;

/// Boxed future returned by asynchronous transformations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Refinement predicate: `None` accepts, `Some` is the reported failure
pub type FilterFn = Arc<dyn Fn(&Value, &ParseOptions, &Ast) -> Option<ParseError> + Send + Sync>;

/// Synchronous transformation step
pub type SyncTransformFn =
    Arc<dyn Fn(&Value, &ParseOptions, &Ast) -> ParseResult<Value> + Send + Sync>;

/// Asynchronous transformation step
pub type AsyncTransformFn = Arc<
    dyn Fn(Value, ParseOptions, Ast) -> BoxFuture<'static, ParseResult<Value>> + Send + Sync,
>;

/// Declaration hook: receives the input and the node's type parameters
pub type DeclarationFn =
    Arc<dyn Fn(&Value, &[Ast], &dyn DeclarationContext) -> ParseResult<Value> + Send + Sync>;

/// Deferred schema definition
pub type LazyThunk = Arc<dyn Fn() -> Ast + Send + Sync>;

/// Which way a schema is being walked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Input shape to domain shape
    Decode,
    /// Domain shape back to input shape
    Encode,
}

/// Parser services available to declaration hooks
pub trait DeclarationContext {
    /// Options of the running call
    fn options(&self) -> &ParseOptions;

    /// Direction of the running call
    fn direction(&self) -> Direction;

    /// The declaration node being parsed
    fn ast(&self) -> &Ast;

    /// Parse `input` against `ast` in the current direction
    fn parse(&self, ast: &Ast, input: &Value) -> ParseResult<Value>;
}

/// A transformation step, synchronous or asynchronous
#[derive(Clone)]
pub enum TransformFn {
    Sync(SyncTransformFn),
    Async(AsyncTransformFn),
}

impl TransformFn {
    /// Wrap a synchronous fallible function
    pub fn sync(
        f: impl Fn(&Value, &ParseOptions, &Ast) -> ParseResult<Value> + Send + Sync + 'static,
    ) -> Self {
        TransformFn::Sync(Arc::new(f))
    }

    /// Wrap an asynchronous fallible function
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ParseOptions, Ast) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ParseResult<Value>> + Send + 'static,
    {
        TransformFn::Async(Arc::new(move |value, options, ast| Box::pin(f(value, options, ast))))
    }

    /// Pass values through unchanged
    pub fn identity() -> Self {
        Self::sync(|value, _, _| Ok(value.clone()))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, TransformFn::Async(_))
    }
}

/// Primitive keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Undefined,
    Void,
    Never,
    Unknown,
    Any,
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
    Object,
}

impl Keyword {
    /// Tag name of the keyword node
    pub fn tag(self) -> &'static str {
        match self {
            Keyword::Undefined => "UndefinedKeyword",
            Keyword::Void => "VoidKeyword",
            Keyword::Never => "NeverKeyword",
            Keyword::Unknown => "UnknownKeyword",
            Keyword::Any => "AnyKeyword",
            Keyword::String => "StringKeyword",
            Keyword::Number => "NumberKeyword",
            Keyword::Boolean => "BooleanKeyword",
            Keyword::BigInt => "BigIntKeyword",
            Keyword::Symbol => "SymbolKeyword",
            Keyword::Object => "ObjectKeyword",
        }
    }

    /// Check if the keyword accepts a value
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Keyword::Undefined | Keyword::Void => value.is_undefined(),
            Keyword::Never => false,
            Keyword::Unknown | Keyword::Any => true,
            Keyword::String => matches!(value, Value::String(_)),
            Keyword::Number => matches!(value, Value::Number(_)),
            Keyword::Boolean => matches!(value, Value::Boolean(_)),
            Keyword::BigInt => matches!(value, Value::BigInt(_)),
            Keyword::Symbol => matches!(value, Value::Symbol(_)),
            Keyword::Object => value.is_object_like(),
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Number(f64),
    Boolean(bool),
    BigInt(i128),
    Null,
}

impl LiteralValue {
    /// Strict equality against a value
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (LiteralValue::String(a), Value::String(b)) => a == b,
            (LiteralValue::Number(a), Value::Number(b)) => a == b,
            (LiteralValue::Boolean(a), Value::Boolean(b)) => a == b,
            (LiteralValue::BigInt(a), Value::BigInt(b)) => a == b,
            (LiteralValue::Null, Value::Null) => true,
            _ => false,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            LiteralValue::String(s) => Value::String(s.clone()),
            LiteralValue::Number(n) => Value::Number(*n),
            LiteralValue::Boolean(b) => Value::Boolean(*b),
            LiteralValue::BigInt(i) => Value::BigInt(*i),
            LiteralValue::Null => Value::Null,
        }
    }

    /// String coercion of the literal, used to bucket union members
    pub fn hash_key(&self) -> String {
        match self {
            LiteralValue::String(s) => s.clone(),
            LiteralValue::Number(n) => format_number(*n),
            LiteralValue::Boolean(b) => b.to_string(),
            LiteralValue::BigInt(i) => i.to_string(),
            LiteralValue::Null => "null".to_string(),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        LiteralValue::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        LiteralValue::String(value)
    }
}

impl From<f64> for LiteralValue {
    fn from(value: f64) -> Self {
        LiteralValue::Number(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        LiteralValue::Number(f64::from(value))
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        LiteralValue::Boolean(value)
    }
}

/// Value of an enum member
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    String(String),
    Number(f64),
}

impl EnumValue {
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (EnumValue::String(a), Value::String(b)) => a == b,
            (EnumValue::Number(a), Value::Number(b)) => a == b,
            _ => false,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            EnumValue::String(s) => Value::String(s.clone()),
            EnumValue::Number(n) => Value::Number(*n),
        }
    }
}

/// Named enum member
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: EnumValue,
}

const NUMBER_PATTERN: &str = r"[+-]?\d*\.?\d+(?:[Ee][+-]?\d+)?";

/// Placeholder followed by literal text
#[derive(Debug, Clone)]
pub struct TemplateSpan {
    /// String or number keyword
    pub ty: Ast,
    pub literal: String,
}

impl TemplateSpan {
    pub fn is_number(&self) -> bool {
        matches!(self.ty.kind(), AstKind::Keyword(Keyword::Number))
    }
}

/// Template literal pattern such as `a${string}b${number}`
#[derive(Debug, Clone)]
pub struct TemplateLiteral {
    head: String,
    spans: Vec<TemplateSpan>,
    regex: Regex,
}

impl TemplateLiteral {
    /// Build a template literal.
    ///
    /// # Errors
    ///
    /// Returns an error if a span type is not the string or number keyword.
    pub fn new(head: impl Into<String>, spans: Vec<TemplateSpan>) -> Result<Self> {
        let head = head.into();
        let mut pattern = format!("^{}", regex::escape(&head));
        for span in &spans {
            match span.ty.kind() {
                AstKind::Keyword(Keyword::String) => pattern.push_str(".*"),
                AstKind::Keyword(Keyword::Number) => pattern.push_str(NUMBER_PATTERN),
                _ => {
                    return Err(Error::InvalidTemplateLiteral(format!(
                        "unsupported span type {}",
                        span.ty.tag()
                    )));
                }
            }
            pattern.push_str(&regex::escape(&span.literal));
        }
        pattern.push('$');
        let regex = Regex::new(&pattern)?;
        Ok(Self { head, spans, regex })
    }

    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn spans(&self) -> &[TemplateSpan] {
        &self.spans
    }

    /// Check if a string matches the template
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

/// Positional element of a tuple
#[derive(Debug, Clone)]
pub struct Element {
    pub ty: Ast,
    pub optional: bool,
}

/// Tuple or array schema
#[derive(Debug, Clone)]
pub struct Tuple {
    /// Leading positional elements
    pub elements: Vec<Element>,
    /// Rest element followed by required post-rest elements; empty if closed
    pub rest: Vec<Ast>,
}

impl Tuple {
    pub fn new(elements: Vec<Element>, rest: Vec<Ast>) -> Self {
        Self { elements, rest }
    }

    /// Minimum input length
    pub fn required_len(&self) -> usize {
        self.elements.iter().filter(|e| !e.optional).count() + self.rest.len().saturating_sub(1)
    }

    pub fn has_rest(&self) -> bool {
        !self.rest.is_empty()
    }
}

/// Declared property
#[derive(Debug, Clone)]
pub struct PropertySignature {
    pub name: PropertyKey,
    pub ty: Ast,
    pub optional: bool,
    pub annotations: Annotations,
}

impl PropertySignature {
    pub fn new(name: impl Into<PropertyKey>, ty: Ast, optional: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            optional,
            annotations: Annotations::new(),
        }
    }
}

/// Index signature `[parameter]: ty`
#[derive(Debug, Clone)]
pub struct IndexSignature {
    pub parameter: Ast,
    pub ty: Ast,
}

impl IndexSignature {
    /// Build an index signature.
    ///
    /// # Errors
    ///
    /// Returns an error if `parameter` is not a string, symbol, template
    /// literal, or a refinement of one of those.
    pub fn new(parameter: Ast, ty: Ast) -> Result<Self> {
        if !parameter.is_parameter() {
            return Err(Error::InvalidIndexSignature(parameter.tag().to_string()));
        }
        Ok(Self { parameter, ty })
    }
}

/// Struct and record schema
#[derive(Debug, Clone)]
pub struct TypeLiteral {
    property_signatures: Vec<PropertySignature>,
    index_signatures: Vec<IndexSignature>,
}

impl TypeLiteral {
    /// Type literal without properties; index signatures alone never collide
    pub(crate) fn indexed(index_signatures: Vec<IndexSignature>) -> Self {
        Self {
            property_signatures: Vec::new(),
            index_signatures,
        }
    }

    /// Build a type literal.
    ///
    /// # Errors
    ///
    /// Returns an error if two property signatures share a key.
    pub fn new(
        property_signatures: Vec<PropertySignature>,
        index_signatures: Vec<IndexSignature>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for ps in &property_signatures {
            if !seen.insert(&ps.name) {
                return Err(Error::DuplicatePropertySignature(ps.name.to_string()));
            }
        }
        Ok(Self {
            property_signatures,
            index_signatures,
        })
    }

    pub fn property_signatures(&self) -> &[PropertySignature] {
        &self.property_signatures
    }

    pub fn index_signatures(&self) -> &[IndexSignature] {
        &self.index_signatures
    }

    pub fn property(&self, name: &PropertyKey) -> Option<&PropertySignature> {
        self.property_signatures.iter().find(|ps| &ps.name == name)
    }

    /// Check if the type literal declares nothing (accepts any non-nullish value)
    pub fn is_empty(&self) -> bool {
        self.property_signatures.is_empty() && self.index_signatures.is_empty()
    }
}

/// Union of members tried in declaration order
#[derive(Debug, Clone)]
pub struct Union {
    members: Vec<Ast>,
    decode_index: Arc<OnceLock<DiscriminantIndex>>,
    encode_index: Arc<OnceLock<DiscriminantIndex>>,
}

impl Union {
    fn new(members: Vec<Ast>) -> Self {
        Self {
            members,
            decode_index: Arc::new(OnceLock::new()),
            encode_index: Arc::new(OnceLock::new()),
        }
    }

    pub fn members(&self) -> &[Ast] {
        &self.members
    }

    /// Literal-discriminant index of the members for a direction
    pub fn discriminants(&self, direction: Direction) -> &DiscriminantIndex {
        let cell = match direction {
            Direction::Decode => &self.decode_index,
            Direction::Encode => &self.encode_index,
        };
        cell.get_or_init(|| DiscriminantIndex::build(&self.members, direction))
    }
}

/// Memoized deferred schema
#[derive(Clone)]
pub struct Lazy {
    thunk: LazyThunk,
    resolved: Arc<OnceLock<Ast>>,
}

impl Lazy {
    pub fn new(thunk: LazyThunk) -> Self {
        Self {
            thunk,
            resolved: Arc::new(OnceLock::new()),
        }
    }

    /// Resolve the schema; the thunk runs at most once, even under
    /// concurrent first access
    pub fn resolve(&self) -> &Ast {
        self.resolved.get_or_init(|| {
            trace!("resolving lazy schema");
            (self.thunk)()
        })
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }
}

impl fmt::Debug for Lazy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Narrowing of `from` by a predicate
#[derive(Clone)]
pub struct Refinement {
    pub from: Ast,
    pub filter: FilterFn,
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement").field("from", &self.from).finish()
    }
}

/// Bidirectional conversion between two schemas
#[derive(Clone)]
pub struct Transform {
    pub from: Ast,
    pub to: Ast,
    pub decode: TransformFn,
    pub encode: TransformFn,
    /// Validate function output against the target side
    pub strict: bool,
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("strict", &self.strict)
            .finish()
    }
}

/// Externally defined type with custom parse hooks
#[derive(Clone)]
pub struct Declaration {
    pub type_parameters: Vec<Ast>,
    pub decode: DeclarationFn,
    pub encode: DeclarationFn,
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("type_parameters", &self.type_parameters)
            .finish()
    }
}

/// Node variants
#[derive(Debug, Clone)]
pub enum AstKind {
    Keyword(Keyword),
    Literal(LiteralValue),
    UniqueSymbol(Symbol),
    Enums(Vec<EnumMember>),
    TemplateLiteral(TemplateLiteral),
    Tuple(Tuple),
    TypeLiteral(TypeLiteral),
    Union(Union),
    Lazy(Lazy),
    Refinement(Refinement),
    Transform(Transform),
    Declaration(Declaration),
}

/// Side of a schema selected by a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    From,
    To,
}

pub struct AstNode {
    kind: AstKind,
    annotations: Annotations,
    // `None` once computed means the projection is the node itself.
    from_side: OnceLock<Option<Ast>>,
    to_side: OnceLock<Option<Ast>>,
}

/// Shared handle to an immutable schema node
#[derive(Clone)]
pub struct Ast(Arc<AstNode>);

impl Ast {
    pub fn new(kind: AstKind) -> Self {
        Self::with_annotations(kind, Annotations::new())
    }

    pub fn with_annotations(kind: AstKind, annotations: Annotations) -> Self {
        Ast(Arc::new(AstNode {
            kind,
            annotations,
            from_side: OnceLock::new(),
            to_side: OnceLock::new(),
        }))
    }

    pub fn keyword(keyword: Keyword) -> Self {
        Self::new(AstKind::Keyword(keyword))
    }

    pub fn literal(literal: impl Into<LiteralValue>) -> Self {
        Self::new(AstKind::Literal(literal.into()))
    }

    /// Union of `members`: nested unions are flattened, `never` members and
    /// repeated nodes dropped; no members yields `never`, one member yields
    /// that member.
    pub fn union(members: Vec<Ast>) -> Self {
        let mut flat: Vec<Ast> = Vec::with_capacity(members.len());
        let mut stack: Vec<Ast> = members.into_iter().rev().collect();
        while let Some(member) = stack.pop() {
            match member.kind() {
                AstKind::Union(union) if member.annotations().is_empty() => {
                    stack.extend(union.members().iter().rev().cloned());
                }
                AstKind::Keyword(Keyword::Never) => {}
                _ => {
                    if !flat.iter().any(|m| m.ptr_eq(&member)) {
                        flat.push(member);
                    }
                }
            }
        }
        match flat.len() {
            0 => Self::keyword(Keyword::Never),
            1 => flat.remove(0),
            _ => Self::new(AstKind::Union(Union::new(flat))),
        }
    }

    pub fn lazy(thunk: impl Fn() -> Ast + Send + Sync + 'static) -> Self {
        Self::new(AstKind::Lazy(Lazy::new(Arc::new(thunk))))
    }

    pub fn refinement(
        from: Ast,
        filter: impl Fn(&Value, &ParseOptions, &Ast) -> Option<ParseError> + Send + Sync + 'static,
    ) -> Self {
        Self::new(AstKind::Refinement(Refinement {
            from,
            filter: Arc::new(filter),
        }))
    }

    pub fn transform(from: Ast, to: Ast, decode: TransformFn, encode: TransformFn) -> Self {
        Self::new(AstKind::Transform(Transform {
            from,
            to,
            decode,
            encode,
            strict: true,
        }))
    }

    pub fn kind(&self) -> &AstKind {
        &self.0.kind
    }

    pub fn annotations(&self) -> &Annotations {
        &self.0.annotations
    }

    /// Tag name of the node variant
    pub fn tag(&self) -> &'static str {
        match self.kind() {
            AstKind::Keyword(keyword) => keyword.tag(),
            AstKind::Literal(_) => "Literal",
            AstKind::UniqueSymbol(_) => "UniqueSymbol",
            AstKind::Enums(_) => "Enums",
            AstKind::TemplateLiteral(_) => "TemplateLiteral",
            AstKind::Tuple(_) => "Tuple",
            AstKind::TypeLiteral(_) => "TypeLiteral",
            AstKind::Union(_) => "Union",
            AstKind::Lazy(_) => "Lazy",
            AstKind::Refinement(_) => "Refinement",
            AstKind::Transform(_) => "Transform",
            AstKind::Declaration(_) => "Declaration",
        }
    }

    /// Check if both handles point at the same node
    pub fn ptr_eq(&self, other: &Ast) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Copy of this node with one more annotation
    #[must_use]
    pub fn with_annotation(&self, id: AnnotationId, annotation: Annotation) -> Ast {
        Ast::with_annotations(
            self.kind().clone(),
            self.annotations().clone().with(id, annotation),
        )
    }

    /// Copy of this node with all of `annotations` merged on top
    #[must_use]
    pub fn annotate_all(&self, annotations: &Annotations) -> Ast {
        Ast::with_annotations(
            self.kind().clone(),
            self.annotations().clone().merge(annotations),
        )
    }

    #[must_use]
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Ast {
        self.with_annotation(AnnotationId::Identifier, Annotation::Text(identifier.into()))
    }

    #[must_use]
    pub fn with_title(&self, title: impl Into<String>) -> Ast {
        self.with_annotation(AnnotationId::Title, Annotation::Text(title.into()))
    }

    #[must_use]
    pub fn with_description(&self, description: impl Into<String>) -> Ast {
        self.with_annotation(
            AnnotationId::Description,
            Annotation::Text(description.into()),
        )
    }

    /// Override the failure message of this node
    #[must_use]
    pub fn with_message(
        &self,
        message: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Ast {
        let message: MessageFn = Arc::new(message);
        self.with_annotation(AnnotationId::Message, Annotation::Message(message))
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.kind(), AstKind::Keyword(k) if *k == keyword)
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind(), AstKind::Literal(_))
    }

    pub fn is_union(&self) -> bool {
        matches!(self.kind(), AstKind::Union(_))
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.kind(), AstKind::Lazy(_))
    }

    pub fn is_refinement(&self) -> bool {
        matches!(self.kind(), AstKind::Refinement(_))
    }

    pub fn is_transform(&self) -> bool {
        matches!(self.kind(), AstKind::Transform(_))
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self.kind(), AstKind::Declaration(_))
    }

    pub fn is_template_literal(&self) -> bool {
        matches!(self.kind(), AstKind::TemplateLiteral(_))
    }

    /// Check if the node may be used as an index signature parameter
    pub fn is_parameter(&self) -> bool {
        match self.kind() {
            AstKind::Keyword(Keyword::String | Keyword::Symbol) | AstKind::TemplateLiteral(_) => {
                true
            }
            AstKind::Refinement(refinement) => refinement.from.is_parameter(),
            _ => false,
        }
    }

    pub(crate) fn projection_cell(&self, side: Side) -> &OnceLock<Option<Ast>> {
        match side {
            Side::From => &self.0.from_side,
            Side::To => &self.0.to_side,
        }
    }
}

impl fmt::Debug for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.annotations().expected_label() {
            Some(label) => write!(f, "{}({label})", self.tag()),
            None => match self.kind() {
                AstKind::Literal(literal) => write!(f, "Literal({literal:?})"),
                _ => f.write_str(self.tag()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn string() -> Ast {
        Ast::keyword(Keyword::String)
    }

    #[test]
    fn test_union_collapses_trivial_cases() {
        assert!(Ast::union(vec![]).is_keyword(Keyword::Never));
        let s = string();
        assert!(Ast::union(vec![s.clone()]).ptr_eq(&s));
        let never = Ast::keyword(Keyword::Never);
        assert!(Ast::union(vec![never, s.clone()]).ptr_eq(&s));
    }

    #[test]
    fn test_union_flattens_nested_members() {
        let a = Ast::literal("a");
        let b = Ast::literal("b");
        let c = Ast::literal("c");
        let inner = Ast::union(vec![a.clone(), b.clone()]);
        let outer = Ast::union(vec![inner, c.clone(), a.clone()]);
        let AstKind::Union(union) = outer.kind() else {
            panic!("expected union");
        };
        assert_eq!(union.members().len(), 3);
        assert!(union.members()[0].ptr_eq(&a));
        assert!(union.members()[2].ptr_eq(&c));
    }

    #[test]
    fn test_duplicate_property_signature() {
        let result = TypeLiteral::new(
            vec![
                PropertySignature::new("a", string(), false),
                PropertySignature::new("a", string(), true),
            ],
            vec![],
        );
        assert!(matches!(result, Err(Error::DuplicatePropertySignature(_))));
    }

    #[test]
    fn test_index_signature_parameter() {
        assert!(IndexSignature::new(string(), string()).is_ok());
        assert!(IndexSignature::new(Ast::keyword(Keyword::Number), string()).is_err());
        let refined = Ast::refinement(string(), |_, _, _| None);
        assert!(refined.is_parameter());
    }

    #[test]
    fn test_lazy_thunk_runs_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let ast = Ast::lazy(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ast::keyword(Keyword::String)
        });
        let AstKind::Lazy(lazy) = ast.kind() else {
            panic!("expected lazy");
        };
        assert!(!lazy.is_resolved());
        lazy.resolve();
        lazy.resolve();
        // annotated copies share the resolution cell
        let annotated = ast.with_identifier("S");
        let AstKind::Lazy(copy) = annotated.kind() else {
            panic!("expected lazy");
        };
        assert!(copy.is_resolved());
        copy.resolve();
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_template_literal_matching() {
        let template = TemplateLiteral::new(
            "a",
            vec![
                TemplateSpan {
                    ty: Ast::keyword(Keyword::Number),
                    literal: ".".to_string(),
                },
                TemplateSpan {
                    ty: string(),
                    literal: String::new(),
                },
            ],
        )
        .unwrap();
        assert!(template.is_match("a1.x"));
        assert!(template.is_match("a-1.5e3."));
        assert!(!template.is_match("ab."));
        assert!(!template.is_match("b1."));
    }

    #[test]
    fn test_template_literal_rejects_other_spans() {
        let result = TemplateLiteral::new(
            "",
            vec![TemplateSpan {
                ty: Ast::keyword(Keyword::Boolean),
                literal: String::new(),
            }],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_literal_matching() {
        assert!(LiteralValue::from(1).matches(&Value::from(1)));
        assert!(!LiteralValue::from("1").matches(&Value::from(1)));
        assert!(LiteralValue::Null.matches(&Value::Null));
        assert!(!LiteralValue::Number(f64::NAN).matches(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_tuple_required_len() {
        let tuple = Tuple::new(
            vec![
                Element { ty: string(), optional: false },
                Element { ty: string(), optional: true },
            ],
            vec![string(), string(), string()],
        );
        assert_eq!(tuple.required_len(), 3);
    }

    #[test]
    fn test_keyword_acceptance() {
        assert!(Keyword::Object.accepts(&Value::array([])));
        assert!(!Keyword::Object.accepts(&Value::Null));
        assert!(Keyword::Void.accepts(&Value::Undefined));
        assert!(!Keyword::Never.accepts(&Value::Undefined));
        assert!(Keyword::Unknown.accepts(&Value::Null));
    }
}

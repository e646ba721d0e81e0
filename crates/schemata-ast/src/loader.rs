//! Schema document loader
//!
//! Schema documents are YAML or JSON files with named `definitions` and an
//! optional `root`. Every node is tagged by `type`:
//!
//! ```yaml
//! definitions:
//!   Category:
//!     type: struct
//!     properties:
//!       name: { type: string, minLength: 1 }
//!       subcategories: { type: array, items: { type: ref, name: Category } }
//! root:
//!   type: ref
//!   name: Category
//! ```
//!
//! `ref` nodes compile to lazy schemas resolved through the registry, so
//! definitions may refer to themselves and to each other. A cycle must pass
//! through a struct, tuple, array or record; documents whose definitions
//! alias each other directly (or through unions and nullables) are rejected.

use crate::annotations::{Annotation, AnnotationId};
use crate::ast::{Ast, EnumValue, LiteralValue};
use crate::registry::SchemaRegistry;
use crate::schema::{
    self, StructBuilder, TupleBuilder, any, array, bigint_from_self, boolean, date, enums, never,
    null, nullable, number, object, string, symbol_from_self, undefined, unknown, void,
};
use crate::{refinements, transforms};
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace};

/// A parsed schema document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub definitions: IndexMap<String, SchemaNode>,
    #[serde(default)]
    pub root: Option<SchemaNode>,
}

/// One node of a schema document
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(flatten)]
    pub meta: NodeMeta,
}

/// Node shapes, tagged by `type`
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    String,
    Number,
    Boolean,
    #[serde(rename = "bigint")]
    BigInt,
    Symbol,
    Undefined,
    Void,
    Null,
    Unknown,
    Any,
    Never,
    Object,
    Date,
    Literal {
        value: serde_json::Value,
    },
    Literals {
        values: Vec<serde_json::Value>,
    },
    Enums {
        members: IndexMap<String, serde_json::Value>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    Tuple {
        #[serde(default)]
        elements: Vec<SchemaNode>,
        #[serde(default)]
        rest: Option<Box<SchemaNode>>,
        #[serde(default, rename = "postRest")]
        post_rest: Vec<SchemaNode>,
    },
    Struct {
        #[serde(default)]
        properties: IndexMap<String, SchemaNode>,
        #[serde(default, rename = "indexSignatures")]
        index_signatures: Vec<IndexSignatureNode>,
    },
    Record {
        key: Box<SchemaNode>,
        value: Box<SchemaNode>,
    },
    Union {
        members: Vec<SchemaNode>,
    },
    Nullable {
        schema: Box<SchemaNode>,
    },
    Ref {
        name: String,
    },
    Template {
        parts: Vec<SchemaNode>,
    },
    #[serde(rename = "NumberFromString")]
    NumberFromString,
    #[serde(rename = "BigIntFromString")]
    BigIntFromString,
    #[serde(rename = "DateFromString")]
    DateFromString,
    #[serde(rename = "Trim")]
    Trim,
}

/// `[key]: value` entry of a struct node
#[derive(Debug, Clone, Deserialize)]
pub struct IndexSignatureNode {
    pub key: SchemaNode,
    pub value: SchemaNode,
}

/// Annotations and checks shared by every node
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeMeta {
    pub identifier: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Replaces the default failure message of the node
    pub message: Option<String>,
    /// Struct properties and tuple elements only
    pub optional: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub length: Option<usize>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub int: bool,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
    pub brand: Option<String>,
}

struct Compiler<'a> {
    registry: &'a Arc<SchemaRegistry>,
    local: HashSet<&'a str>,
}

impl Compiler<'_> {
    fn compile(&self, node: &SchemaNode) -> Result<Ast> {
        let base = self.compile_kind(&node.kind)?;
        let checked = apply_checks(base, &node.meta)?;
        Ok(apply_annotations(checked, &node.meta))
    }

    fn compile_all(&self, nodes: &[SchemaNode]) -> Result<Vec<Ast>> {
        nodes.iter().map(|node| self.compile(node)).collect()
    }

    fn compile_kind(&self, kind: &NodeKind) -> Result<Ast> {
        let ast = match kind {
            NodeKind::String => string(),
            NodeKind::Number => number(),
            NodeKind::Boolean => boolean(),
            NodeKind::BigInt => bigint_from_self(),
            NodeKind::Symbol => symbol_from_self(),
            NodeKind::Undefined => undefined(),
            NodeKind::Void => void(),
            NodeKind::Null => null(),
            NodeKind::Unknown => unknown(),
            NodeKind::Any => any(),
            NodeKind::Never => never(),
            NodeKind::Object => object(),
            NodeKind::Date => date(),
            NodeKind::Literal { value } => Ast::literal(literal_value(value)?),
            NodeKind::Literals { values } => Ast::union(
                values
                    .iter()
                    .map(|v| literal_value(v).map(Ast::literal))
                    .collect::<Result<Vec<_>>>()?,
            ),
            NodeKind::Enums { members } => enums(
                members
                    .iter()
                    .map(|(name, value)| Ok((name.as_str(), enum_value(name, value)?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            NodeKind::Array { items } => array(self.compile(items)?),
            NodeKind::Tuple {
                elements,
                rest,
                post_rest,
            } => {
                let mut builder = TupleBuilder::new();
                for element in elements {
                    let ty = self.compile(element)?;
                    builder = if element.meta.optional {
                        builder.optional_element(ty)
                    } else {
                        builder.element(ty)
                    };
                }
                if let Some(rest) = rest {
                    builder = builder.rest(self.compile(rest)?);
                    for element in post_rest {
                        builder = builder.element(self.compile(element)?);
                    }
                } else if !post_rest.is_empty() {
                    return Err(Error::InvalidFormat(
                        "postRest elements require a rest element".to_string(),
                    ));
                }
                builder.build()?
            }
            NodeKind::Struct {
                properties,
                index_signatures,
            } => {
                let mut builder = StructBuilder::new();
                for (name, node) in properties {
                    let ty = self.compile(node)?;
                    builder = if node.meta.optional {
                        builder.optional_field(name.as_str(), ty)
                    } else {
                        builder.field(name.as_str(), ty)
                    };
                }
                for signature in index_signatures {
                    builder = builder.index_signature(
                        self.compile(&signature.key)?,
                        self.compile(&signature.value)?,
                    );
                }
                builder.build()?
            }
            NodeKind::Record { key, value } => {
                schema::record(self.compile(key)?, self.compile(value)?)?
            }
            NodeKind::Union { members } => Ast::union(self.compile_all(members)?),
            NodeKind::Nullable { schema } => nullable(self.compile(schema)?),
            NodeKind::Ref { name } => self.reference(name)?,
            NodeKind::Template { parts } => schema::template_literal(&self.compile_all(parts)?)?,
            NodeKind::NumberFromString => transforms::number_from_string(string()),
            NodeKind::BigIntFromString => transforms::bigint_from_string(string()),
            NodeKind::DateFromString => transforms::date_from_string(string()),
            NodeKind::Trim => transforms::trim(string()),
        };
        Ok(ast)
    }

    fn reference(&self, name: &str) -> Result<Ast> {
        if !self.local.contains(name) && !self.registry.contains(name) {
            return Err(Error::NotFound(format!(
                "reference to unknown definition `{name}`"
            )));
        }
        let registry: Weak<SchemaRegistry> = Arc::downgrade(self.registry);
        let target = name.to_string();
        let ast = Ast::lazy(move || {
            match registry.upgrade().and_then(|registry| registry.get(&target)) {
                Some(ast) => ast,
                None => {
                    debug!("Definition {} is no longer registered", target);
                    never()
                }
            }
        });
        Ok(ast.with_identifier(name))
    }
}

/// Names a node refers to without descending into a struct, tuple, array
/// or record first
fn unguarded_refs<'a>(node: &'a SchemaNode, out: &mut Vec<&'a str>) {
    match &node.kind {
        NodeKind::Ref { name } => out.push(name),
        NodeKind::Union { members } => {
            for member in members {
                unguarded_refs(member, out);
            }
        }
        NodeKind::Nullable { schema } => unguarded_refs(schema, out),
        _ => {}
    }
}

/// Rejects definitions that resolve to themselves before reaching any
/// input-consuming node
fn check_alias_cycles(document: &SchemaDocument) -> Result<()> {
    let edges: HashMap<&str, Vec<&str>> = document
        .definitions
        .iter()
        .map(|(name, node)| {
            let mut refs = Vec::new();
            unguarded_refs(node, &mut refs);
            (name.as_str(), refs)
        })
        .collect();
    let mut done = HashSet::new();
    for name in document.definitions.keys() {
        visit_aliases(name, &edges, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}

fn visit_aliases<'a>(
    name: &'a str,
    edges: &HashMap<&'a str, Vec<&'a str>>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Result<()> {
    if done.contains(name) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|seen| *seen == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name);
        return Err(Error::InvalidFormat(format!(
            "definitions refer to each other without a struct, tuple, array or record in between: {}",
            cycle.join(" -> ")
        )));
    }
    let Some(targets) = edges.get(name) else {
        return Ok(());
    };
    path.push(name);
    for target in targets {
        visit_aliases(*target, edges, path, done)?;
    }
    path.pop();
    done.insert(name);
    Ok(())
}

fn literal_value(value: &serde_json::Value) -> Result<LiteralValue> {
    match value {
        serde_json::Value::String(s) => Ok(LiteralValue::String(s.clone())),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(LiteralValue::Number)
            .ok_or_else(|| Error::InvalidFormat(format!("unsupported literal number {n}"))),
        serde_json::Value::Bool(b) => Ok(LiteralValue::Boolean(*b)),
        serde_json::Value::Null => Ok(LiteralValue::Null),
        other => Err(Error::InvalidFormat(format!(
            "literal must be a string, number, boolean or null, got {other}"
        ))),
    }
}

fn enum_value(name: &str, value: &serde_json::Value) -> Result<EnumValue> {
    match value {
        serde_json::Value::String(s) => Ok(EnumValue::String(s.clone())),
        serde_json::Value::Number(n) => n.as_f64().map(EnumValue::Number).ok_or_else(|| {
            Error::InvalidFormat(format!("enum member {name} has an unsupported number"))
        }),
        _ => Err(Error::InvalidFormat(format!(
            "enum member {name} must be a string or a number"
        ))),
    }
}

fn apply_checks(mut ast: Ast, meta: &NodeMeta) -> Result<Ast> {
    if let Some(min) = meta.min_length {
        ast = refinements::min_length(ast, min);
    }
    if let Some(max) = meta.max_length {
        ast = refinements::max_length(ast, max);
    }
    if let Some(length) = meta.length {
        ast = refinements::length(ast, length);
    }
    if let Some(pattern) = &meta.pattern {
        ast = refinements::pattern(ast, pattern)?;
    }
    if let Some(min) = meta.minimum {
        ast = refinements::greater_than_or_equal_to(ast, min);
    }
    if let Some(max) = meta.maximum {
        ast = refinements::less_than_or_equal_to(ast, max);
    }
    if meta.int {
        ast = refinements::int(ast);
    }
    if let Some(min) = meta.min_items {
        ast = refinements::min_items(ast, min);
    }
    if let Some(max) = meta.max_items {
        ast = refinements::max_items(ast, max);
    }
    if let Some(brand) = &meta.brand {
        ast = refinements::brand(ast, brand);
    }
    Ok(ast)
}

fn apply_annotations(mut ast: Ast, meta: &NodeMeta) -> Ast {
    if let Some(identifier) = &meta.identifier {
        ast = ast.with_identifier(identifier.as_str());
    }
    if let Some(title) = &meta.title {
        ast = ast.with_title(title.as_str());
    }
    if let Some(description) = &meta.description {
        ast = ast.with_description(description.as_str());
    }
    if let Some(message) = &meta.message {
        let message = message.clone();
        ast = ast.with_annotation(
            AnnotationId::Message,
            Annotation::Message(Arc::new(move |_| Some(message.clone()))),
        );
    }
    ast
}

/// Loads schema documents and registers their definitions
pub struct SchemaLoader {
    registry: Arc<SchemaRegistry>,
    schema_paths: Vec<PathBuf>,
}

impl SchemaLoader {
    /// Create a new schema loader with the given search paths
    pub fn new(schema_paths: Vec<PathBuf>) -> Self {
        Self {
            registry: Arc::new(SchemaRegistry::new()),
            schema_paths,
        }
    }

    /// Create a new schema loader with a pre-configured registry
    pub fn with_registry(registry: Arc<SchemaRegistry>, schema_paths: Vec<PathBuf>) -> Self {
        Self {
            registry,
            schema_paths,
        }
    }

    /// Load a schema by name.
    ///
    /// Checks the registry first, then looks for `<name>.yaml`, `<name>.yml`
    /// or `<name>.json` in the search paths. The document's root is
    /// returned if it has one, otherwise its definition called `name`.
    pub fn load(&self, name: &str) -> Result<Ast> {
        if let Some(cached) = self.registry.get(name) {
            debug!("Cache hit for schema: {}", name);
            return Ok(cached);
        }
        trace!("Cache miss for schema: {}", name);

        let path = self.find(name).ok_or_else(|| {
            Error::NotFound(format!(
                "Schema {} not found in search paths: {:?}",
                name, self.schema_paths
            ))
        })?;
        let root = self.load_from_file(&path)?;
        let schema = root
            .or_else(|| self.registry.get(name))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "{} has no root and no definition {name}",
                    path.display()
                ))
            })?;
        self.registry.register(name, schema.clone());
        Ok(schema)
    }

    fn find(&self, name: &str) -> Option<PathBuf> {
        self.schema_paths.iter().find_map(|dir| {
            ["yaml", "yml", "json"].iter().find_map(|extension| {
                let path = dir.join(format!("{name}.{extension}"));
                path.exists().then_some(path)
            })
        })
    }

    /// Load a schema document from a file; YAML for `.yaml`/`.yml`,
    /// JSON otherwise
    pub fn load_from_file(&self, path: &Path) -> Result<Option<Ast>> {
        trace!("Loading schema from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(&content)
        } else {
            self.load_from_json(&content)
        }
    }

    /// Load a schema document from a JSON string
    pub fn load_from_json(&self, json: &str) -> Result<Option<Ast>> {
        let document: SchemaDocument = serde_json::from_str(json)
            .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
        self.load_document(&document)
    }

    /// Load a schema document from a YAML string
    pub fn load_from_yaml(&self, yaml: &str) -> Result<Option<Ast>> {
        let document: SchemaDocument = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        self.load_document(&document)
    }

    /// Compile a document, register its definitions and return its root.
    ///
    /// Nothing is registered if any node fails to compile.
    pub fn load_document(&self, document: &SchemaDocument) -> Result<Option<Ast>> {
        check_alias_cycles(document)?;
        let compiler = Compiler {
            registry: &self.registry,
            local: document.definitions.keys().map(String::as_str).collect(),
        };
        let definitions = document
            .definitions
            .iter()
            .map(|(name, node)| Ok((name.clone(), compiler.compile(node)?)))
            .collect::<Result<Vec<_>>>()?;
        let root = document
            .root
            .as_ref()
            .map(|node| compiler.compile(node))
            .transpose()?;

        for (name, ast) in definitions {
            self.registry.register(name, ast);
        }
        info!(
            "Loaded schema document with {} definition(s)",
            document.definitions.len()
        );
        Ok(root)
    }

    /// Add a search path for schema files
    pub fn add_path(&mut self, path: PathBuf) {
        self.schema_paths.push(path);
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }
}

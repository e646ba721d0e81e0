//! Tree formatter
//!
//! Renders a parse failure as a box-drawn tree:
//!
//! ```text
//! error(s) found
//! └─ ["a"]["b"]["c"]
//!    ├─ [0]["d"]
//!    │  └─ Expected string, actual null
//!    └─ [1]["d"]
//!       └─ Expected string, actual 1
//! ```
//!
//! Chains of single-child `Index`/`Key` wrappers collapse into one line.

use schemata_ast::ast::TemplateLiteral;
use schemata_ast::{Ast, AstKind, ParseError, ParseFailure};
use schemata_value::Value;

/// Intermediate labelled tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub value: String,
    pub forest: Vec<Tree>,
}

impl Tree {
    pub fn new(value: impl Into<String>, forest: Vec<Tree>) -> Self {
        Self {
            value: value.into(),
            forest,
        }
    }

    pub fn leaf(value: impl Into<String>) -> Self {
        Self::new(value, Vec::new())
    }

    /// Render with box-drawing characters
    pub fn draw(&self) -> String {
        let mut out = self.value.clone();
        draw_forest(&mut out, "\n", &self.forest);
        out
    }
}

fn draw_forest(out: &mut String, indentation: &str, forest: &[Tree]) {
    let len = forest.len();
    for (i, tree) in forest.iter().enumerate() {
        let is_last = i + 1 == len;
        out.push_str(indentation);
        out.push_str(if is_last { "└─ " } else { "├─ " });
        out.push_str(&tree.value);
        let continuation = if len > 1 && !is_last { "│  " } else { "   " };
        draw_forest(out, &format!("{indentation}{continuation}"), &tree.forest);
    }
}

/// Format a failure as a tree rooted at `error(s) found`
pub fn format_errors(failure: &ParseFailure) -> String {
    to_tree(failure).draw()
}

/// Build the intermediate tree without drawing it
pub fn to_tree(failure: &ParseFailure) -> Tree {
    Tree::new("error(s) found", failure.iter().map(go).collect())
}

fn go(error: &ParseError) -> Tree {
    match error {
        ParseError::Type {
            expected,
            actual,
            message,
        } => Tree::leaf(type_message(expected, actual, message.as_deref())),
        ParseError::Forbidden => Tree::leaf("is forbidden"),
        ParseError::Missing => Tree::leaf("is missing"),
        ParseError::Unexpected { .. } => Tree::leaf("is unexpected"),
        ParseError::Index { index, errors } => wrap(format!("[{index}]"), errors),
        ParseError::Key { key, errors } => {
            wrap(format!("[{}]", format_actual(&key.to_value())), errors)
        }
        ParseError::UnionMember { errors } => {
            Tree::new("union member", errors.iter().map(go).collect())
        }
    }
}

fn wrap(label: String, errors: &ParseFailure) -> Tree {
    let mut forest: Vec<Tree> = errors.iter().map(go).collect();
    let collapsible = forest.len() == 1
        && !forest[0].forest.is_empty()
        && !matches!(errors.first(), ParseError::UnionMember { .. });
    if collapsible {
        let child = forest.remove(0);
        Tree::new(label + &child.value, child.forest)
    } else {
        Tree::new(label, forest)
    }
}

/// Message of a `Type` error: the message annotation of the expected schema,
/// then the error's own message, then the default wording
pub fn type_message(expected: &Ast, actual: &Value, message: Option<&str>) -> String {
    expected
        .annotations()
        .message()
        .and_then(|annotation| annotation(actual))
        .or_else(|| message.map(ToString::to_string))
        .unwrap_or_else(|| {
            format!(
                "Expected {}, actual {}",
                format_expected(expected),
                format_actual(actual)
            )
        })
}

/// Human label for a schema
pub fn format_expected(ast: &Ast) -> String {
    if let AstKind::Union(union) = ast.kind() {
        return union
            .members()
            .iter()
            .map(format_expected)
            .collect::<Vec<_>>()
            .join(" or ");
    }
    if let Some(label) = ast.annotations().expected_label() {
        return label.to_string();
    }
    match ast.kind() {
        AstKind::Keyword(keyword) => keyword.tag().to_string(),
        AstKind::Literal(literal) => format_actual(&literal.to_value()),
        AstKind::UniqueSymbol(symbol) => format_actual(&Value::Symbol(symbol.clone())),
        AstKind::TemplateLiteral(template) => format_template_literal(template),
        AstKind::Tuple(_) => "<anonymous tuple or array schema>".to_string(),
        AstKind::TypeLiteral(_) => "<anonymous type literal schema>".to_string(),
        AstKind::Enums(members) => members
            .iter()
            .map(|member| format_actual(&member.value.to_value()))
            .collect::<Vec<_>>()
            .join(" | "),
        AstKind::Lazy(_) => "<anonymous lazy schema>".to_string(),
        AstKind::Declaration(_) => "<anonymous declaration schema>".to_string(),
        AstKind::Refinement(_) => "<anonymous refinement schema>".to_string(),
        AstKind::Transform(transform) => format!(
            "{} <-> {}",
            format_expected(&transform.from),
            format_expected(&transform.to)
        ),
        AstKind::Union(_) => String::new(),
    }
}

fn format_template_literal(template: &TemplateLiteral) -> String {
    let mut out = template.head().to_string();
    for span in template.spans() {
        out.push_str(if span.is_number() {
            "${number}"
        } else {
            "${string}"
        });
        out.push_str(&span.literal);
    }
    out
}

/// Render an actual value; never fails
pub fn format_actual(actual: &Value) -> String {
    match actual {
        Value::Undefined | Value::Null | Value::Number(_) | Value::Symbol(_) | Value::Date(_) => {
            actual.to_display_string()
        }
        Value::BigInt(n) => format!("{n}n"),
        _ => actual
            .to_json_string()
            .unwrap_or_else(|_| actual.to_display_string()),
    }
}

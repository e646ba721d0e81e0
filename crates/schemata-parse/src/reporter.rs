//! Issue reporter
//!
//! Flattens an error tree into one issue per leaf, each carrying the path
//! of keys and indices that leads to it. Union members contribute their
//! issues at the path of the union itself.

use crate::formatter::{format_errors, type_message};
use schemata_ast::{ParseError, ParseFailure};
use schemata_value::PropertyKey;
use std::fmt;

/// One step of an issue path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Index(usize),
    Key(PropertyKey),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(index) => write!(f, "{index}"),
            PathSegment::Key(key) => write!(f, "{key}"),
        }
    }
}

/// Kind of leaf error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Type,
    Forbidden,
    Missing,
    Unexpected,
}

/// A single leaf error with its location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Keys and indices from the root to the failing member
    pub path: Vec<PathSegment>,
    /// Kind of failure
    pub kind: IssueKind,
    /// Human-readable message
    pub message: String,
}

impl Issue {
    /// Path rendered as `/a/0`; empty at the root
    pub fn path_string(&self) -> String {
        self.path.iter().map(|segment| format!("/{segment}")).collect()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} {}", self.path_string(), self.message)
        }
    }
}

/// Output layout for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Box-drawn error tree
    #[default]
    Tree,
    /// One issue per line
    Flat,
}

/// Reports parse failures
pub struct ParseReporter {
    format: ReportFormat,
}

impl ParseReporter {
    /// Create a new reporter using the tree layout
    pub fn new() -> Self {
        Self {
            format: ReportFormat::Tree,
        }
    }

    /// Set the output layout
    #[must_use]
    pub fn with_format(mut self, format: ReportFormat) -> Self {
        self.format = format;
        self
    }

    /// Flatten a failure into issues, in error order
    pub fn issues(&self, failure: &ParseFailure) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut path = Vec::new();
        for error in failure {
            collect(error, &mut path, &mut issues);
        }
        issues
    }

    /// Render a failure in the configured layout
    pub fn report(&self, failure: &ParseFailure) -> String {
        match self.format {
            ReportFormat::Tree => format_errors(failure),
            ReportFormat::Flat => self
                .issues(failure)
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Issues joined on one line, separated by `, `
    pub fn summary(&self, failure: &ParseFailure) -> String {
        self.issues(failure)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for ParseReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn leaf(path: &[PathSegment], kind: IssueKind, message: impl Into<String>) -> Issue {
    Issue {
        path: path.to_vec(),
        kind,
        message: message.into(),
    }
}

fn collect(error: &ParseError, path: &mut Vec<PathSegment>, issues: &mut Vec<Issue>) {
    match error {
        ParseError::Type {
            expected,
            actual,
            message,
        } => issues.push(leaf(
            path,
            IssueKind::Type,
            type_message(expected, actual, message.as_deref()),
        )),
        ParseError::Forbidden => issues.push(leaf(path, IssueKind::Forbidden, "is forbidden")),
        ParseError::Missing => issues.push(leaf(path, IssueKind::Missing, "is missing")),
        ParseError::Unexpected { .. } => {
            issues.push(leaf(path, IssueKind::Unexpected, "is unexpected"));
        }
        ParseError::Index { index, errors } => {
            path.push(PathSegment::Index(*index));
            for child in errors {
                collect(child, path, issues);
            }
            path.pop();
        }
        ParseError::Key { key, errors } => {
            path.push(PathSegment::Key(key.clone()));
            for child in errors {
                collect(child, path, issues);
            }
            path.pop();
        }
        ParseError::UnionMember { errors } => {
            for child in errors {
                collect(child, path, issues);
            }
        }
    }
}

//! Parse options
//!
//! Options are set once by the caller and govern every level of a single
//! decode/encode call.

use serde::{Deserialize, Serialize};

/// Fail-fast or collect-all error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorsMode {
    /// Stop at the first failing member
    #[default]
    First,
    /// Visit every member and report all failures
    All,
}

/// What to do with object members the schema does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnExcessProperty {
    /// Drop them from the output
    #[default]
    Ignore,
    /// Report them as unexpected
    Error,
    /// Copy them to the output unchanged
    Preserve,
}

/// Options for decode/encode calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Error collection mode
    pub errors: ErrorsMode,
    /// Excess property policy
    pub on_excess_property: OnExcessProperty,
    /// Treat absent required properties as missing without trying `undefined`
    pub exact: bool,
}

impl ParseOptions {
    /// Default options with collect-all error reporting
    #[must_use]
    pub fn all_errors() -> Self {
        Self {
            errors: ErrorsMode::All,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: ErrorsMode) -> Self {
        self.errors = errors;
        self
    }

    #[must_use]
    pub fn with_on_excess_property(mut self, policy: OnExcessProperty) -> Self {
        self.on_excess_property = policy;
        self
    }

    #[must_use]
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    /// Check if every sibling failure should be collected
    pub fn collect_all(&self) -> bool {
        self.errors == ErrorsMode::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.errors, ErrorsMode::First);
        assert_eq!(options.on_excess_property, OnExcessProperty::Ignore);
        assert!(!options.exact);
        assert!(!options.collect_all());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let options: ParseOptions = serde_json::from_str(r#"{"onExcessProperty":"error"}"#).unwrap();
        assert_eq!(options.on_excess_property, OnExcessProperty::Error);
        assert_eq!(options.errors, ErrorsMode::First);

        let options: ParseOptions = serde_yaml::from_str("errors: all\nexact: true\n").unwrap();
        assert!(options.collect_all());
        assert!(options.exact);
    }

    #[test]
    fn test_builders() {
        let options = ParseOptions::all_errors()
            .with_on_excess_property(OnExcessProperty::Preserve)
            .with_exact(true);
        assert!(options.collect_all());
        assert_eq!(options.on_excess_property, OnExcessProperty::Preserve);
        assert!(options.exact);
    }
}

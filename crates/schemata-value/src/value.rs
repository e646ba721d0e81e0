//! Dynamic values handed to and produced by schemata parsers

use crate::key::PropertyKey;
use crate::symbol::Symbol;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;

/// Insertion-ordered object members
pub type Object = IndexMap<PropertyKey, Value>;

/// Values that can be parsed against a schema
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Undefined,

    /// Null value
    Null,

    /// Boolean value
    Boolean(bool),

    /// Floating point number
    Number(f64),

    /// Arbitrary size integer
    BigInt(i128),

    /// String value
    String(String),

    /// Symbol value
    Symbol(Symbol),

    /// Point in time
    Date(DateTime<Utc>),

    /// Ordered list of values
    Array(Vec<Value>),

    /// Keyed members in insertion order
    Object(Object),
}

impl Value {
    /// Create an object value from key/value pairs
    pub fn object<K, I>(members: I) -> Self
    where
        K: Into<PropertyKey>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Create an array value
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(items.into_iter().collect())
    }

    /// Name of the value's runtime type
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Date(_) => "date",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null or undefined
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Check if value is a keyed record (arrays excluded)
    pub fn is_record(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Check if value is a non-primitive (object, array, or date)
    pub fn is_object_like(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_) | Value::Date(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }

    /// Look up an object member
    pub fn get(&self, key: &PropertyKey) -> Option<&Value> {
        self.as_object().and_then(|members| members.get(key))
    }

    /// Check if an object has an own member with this key
    pub fn has_key(&self, key: &PropertyKey) -> bool {
        self.as_object()
            .is_some_and(|members| members.contains_key(key))
    }

    /// String coercion, the way `String(value)` renders in JavaScript.
    ///
    /// Objects render as `[object Object]`, arrays as their comma-joined
    /// elements with nullish elements left empty.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::BigInt(i) => i.to_string(),
            Value::String(s) => s.clone(),
            Value::Symbol(s) => s.to_string(),
            Value::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_display_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }
}

/// Format a number the way JavaScript does
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return n.to_string();
    }
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => exp,
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Symbol> for Value {
    fn from(value: Symbol) -> Self {
        Value::Symbol(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::Undefined.to_display_string(), "undefined");
        assert_eq!(Value::BigInt(12).to_display_string(), "12");
        assert_eq!(
            Value::object([("a", Value::Null)]).to_display_string(),
            "[object Object]"
        );
        assert_eq!(
            Value::array([Value::from(1), Value::Null, Value::from("x")]).to_display_string(),
            "1,,x"
        );
    }

    #[test]
    fn test_object_lookup_preserves_order() {
        let value = Value::object([("b", Value::from(1)), ("a", Value::from(2))]);
        let keys: Vec<String> = value
            .as_object()
            .unwrap()
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert!(value.has_key(&"a".into()));
        assert_eq!(value.get(&"a".into()), Some(&Value::from(2)));
    }

    #[test]
    fn test_type_predicates() {
        assert!(Value::Null.is_nullish());
        assert!(Value::Undefined.is_nullish());
        assert!(!Value::array([]).is_record());
        assert!(Value::array([]).is_object_like());
        assert_eq!(Value::BigInt(1).type_name(), "bigint");
    }
}

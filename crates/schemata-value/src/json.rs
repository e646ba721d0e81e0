//! JSON conversion
//!
//! Rendering follows `JSON.stringify`: undefined and symbol members are
//! dropped from objects and become `null` inside arrays, symbol keys are
//! skipped, dates become ISO-8601 strings, and a bigint anywhere in the
//! tree makes serialization fail.

use crate::key::PropertyKey;
use crate::value::Value;
use crate::{Error, Result};
use chrono::SecondsFormat;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Largest integer a double represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

struct JsonView<'a>(&'a Value);

impl Serialize for JsonView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Value::Undefined | Value::Symbol(_) | Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serialize_number(*n, serializer),
            Value::BigInt(_) => Err(S::Error::custom("BigInt value can't be serialized in JSON")),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&JsonView(item))?;
                }
                seq.end()
            }
            Value::Object(members) => {
                let mut map = serializer.serialize_map(None)?;
                for (key, value) in members {
                    let PropertyKey::String(name) = key else {
                        continue;
                    };
                    if matches!(value, Value::Undefined | Value::Symbol(_)) {
                        continue;
                    }
                    map.serialize_entry(name, &JsonView(value))?;
                }
                map.end()
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn serialize_number<S: Serializer>(n: f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if !n.is_finite() {
        serializer.serialize_unit()
    } else if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(n as i64)
    } else {
        serializer.serialize_f64(n)
    }
}

fn ensure_representable(value: &Value) -> Result<()> {
    match value {
        Value::Undefined | Value::Symbol(_) => Err(Error::conversion(
            "json",
            format!("{} has no JSON representation", value.type_name()),
        )),
        _ => Ok(()),
    }
}

impl Value {
    /// Render the value as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the value (or anything nested in it) is a bigint,
    /// or if the top-level value is `undefined` or a symbol.
    pub fn to_json_string(&self) -> Result<String> {
        ensure_representable(self)?;
        Ok(serde_json::to_string(&JsonView(self))?)
    }

    /// Render the value as indented JSON.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Value::to_json_string`].
    pub fn to_json_string_pretty(&self) -> Result<String> {
        ensure_representable(self)?;
        Ok(serde_json::to_string_pretty(&JsonView(self))?)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(members) => Value::Object(
                members
                    .into_iter()
                    .map(|(k, v)| (PropertyKey::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl TryFrom<&Value> for serde_json::Value {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        ensure_representable(value)?;
        Ok(serde_json::to_value(JsonView(value))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn test_stringify_primitives() {
        assert_eq!(Value::from("a").to_json_string().unwrap(), "\"a\"");
        assert_eq!(Value::from(1).to_json_string().unwrap(), "1");
        assert_eq!(Value::from(1.5).to_json_string().unwrap(), "1.5");
        assert_eq!(Value::Number(f64::NAN).to_json_string().unwrap(), "null");
        assert_eq!(Value::Null.to_json_string().unwrap(), "null");
    }

    #[test]
    fn test_stringify_drops_undefined_members() {
        let value = Value::object([
            ("a", Value::from(1)),
            ("b", Value::Undefined),
            ("c", Value::Symbol(Symbol::new("c"))),
        ]);
        assert_eq!(value.to_json_string().unwrap(), r#"{"a":1}"#);

        let items = Value::array([Value::Undefined, Value::from(true)]);
        assert_eq!(items.to_json_string().unwrap(), "[null,true]");
    }

    #[test]
    fn test_stringify_skips_symbol_keys() {
        let mut members = crate::Object::new();
        members.insert(PropertyKey::Symbol(Symbol::new("k")), Value::from(1));
        members.insert("a".into(), Value::from(2));
        assert_eq!(Value::Object(members).to_json_string().unwrap(), r#"{"a":2}"#);
    }

    #[test]
    fn test_stringify_date() {
        let date = Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            Value::Date(date).to_json_string().unwrap(),
            "\"2020-01-02T03:04:05.000Z\""
        );
    }

    #[test]
    fn test_stringify_nested_bigint_fails() {
        let value = Value::object([("a", Value::BigInt(1))]);
        assert!(value.to_json_string().is_err());
        assert!(Value::Undefined.to_json_string().is_err());
    }

    #[test]
    fn test_from_json_preserves_key_order() {
        let value = Value::from(json!({"z": 1, "a": [true, null, "x"]}));
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![PropertyKey::from("z"), PropertyKey::from("a")]);
        assert_eq!(
            value.get(&"a".into()),
            Some(&Value::array([Value::from(true), Value::Null, Value::from("x")]))
        );
    }

    #[test]
    fn test_json_round_trip() {
        let original = json!({"name": "x", "tags": ["a", "b"], "n": 2});
        let value = Value::from(original.clone());
        let back = serde_json::Value::try_from(&value).unwrap();
        assert_eq!(back, original);
    }
}

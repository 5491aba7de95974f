//! Tolerant command-payload decoder.
//!
//! Remote clients send the `value` of a command in one of three shapes:
//!
//! - a structured object: `{"direction": "in", "intensity": 1.5}`
//! - a legacy formatted string: `"{direction=in, intensity=1.5}"`
//!   (older clients stringify their key/value maps)
//! - a bare scalar: `-15.0` (rotate sends just the degrees)
//!
//! [`Payload::decode`] flattens all three into one field map.  This module
//! is the only place in the system that understands the legacy string
//! format; everything downstream works with the normalized fields.

use std::collections::BTreeMap;

use serde_json::Value;

/// A decoded payload field.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Normalized command payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: BTreeMap<String, Field>,
    /// Set when the payload was a bare scalar rather than a map.
    bare: Option<f64>,
}

impl Payload {
    /// Decodes any supported payload shape.  Unsupported shapes (arrays,
    /// nested objects inside the legacy string form) decode to an empty
    /// payload; the caller then falls back to per-command defaults.
    pub fn decode(value: &Value) -> Payload {
        match value {
            Value::Object(map) => {
                let mut fields = BTreeMap::new();
                for (key, val) in map {
                    match val {
                        Value::String(s) => {
                            fields.insert(key.clone(), Field::Str(s.clone()));
                        }
                        Value::Number(n) => {
                            if let Some(f) = n.as_f64() {
                                fields.insert(key.clone(), Field::Num(f));
                            }
                        }
                        Value::Bool(b) => {
                            fields.insert(key.clone(), Field::Bool(*b));
                        }
                        // Nested structures are not part of any command
                        // payload; skip rather than fail the whole message.
                        _ => {}
                    }
                }
                Payload { fields, bare: None }
            }
            Value::String(s) => Self::decode_legacy(s),
            Value::Number(n) => Payload {
                fields: BTreeMap::new(),
                bare: n.as_f64(),
            },
            _ => Payload::default(),
        }
    }

    /// Parses the legacy `"{k=v, k2=v2}"` string format.
    ///
    /// Values that look numeric are stored as numbers so that
    /// `"{intensity=1.5}"` and `{"intensity": 1.5}` decode identically.
    fn decode_legacy(raw: &str) -> Payload {
        let inner = raw.trim().trim_start_matches('{').trim_end_matches('}');
        let mut fields = BTreeMap::new();
        for pair in inner.split(',') {
            let Some((key, val)) = pair.split_once('=') else {
                if !pair.trim().is_empty() {
                    tracing::trace!(pair = pair.trim(), "skipping malformed legacy payload pair");
                }
                continue;
            };
            let key = key.trim();
            let val = val.trim();
            if key.is_empty() || val.is_empty() {
                continue;
            }
            let field = if let Ok(n) = val.parse::<f64>() {
                Field::Num(n)
            } else if let Ok(b) = val.parse::<bool>() {
                Field::Bool(b)
            } else {
                Field::Str(val.to_string())
            };
            fields.insert(key.to_string(), field);
        }
        Payload { fields, bare: None }
    }

    /// String field accessor.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        match self.fields.get(key) {
            Some(Field::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric field accessor; tolerates numbers sent as strings.
    pub fn num_field(&self, key: &str) -> Option<f64> {
        match self.fields.get(key) {
            Some(Field::Num(n)) => Some(*n),
            Some(Field::Str(s)) => s.parse().ok(),
            _ => None,
        }
    }

    /// The payload when it was a bare scalar (e.g. rotate degrees).
    pub fn bare_number(&self) -> Option<f64> {
        self.bare
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.bare.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_structured_object() {
        // Arrange
        let value = json!({"direction": "in", "intensity": 1.5, "fast": true});

        // Act
        let payload = Payload::decode(&value);

        // Assert
        assert_eq!(payload.str_field("direction"), Some("in"));
        assert_eq!(payload.num_field("intensity"), Some(1.5));
    }

    #[test]
    fn test_decode_legacy_string_matches_structured() {
        let legacy = Payload::decode(&json!("{direction=in, intensity=1.5}"));
        let structured = Payload::decode(&json!({"direction": "in", "intensity": 1.5}));
        assert_eq!(legacy, structured);
    }

    #[test]
    fn test_decode_bare_number() {
        let payload = Payload::decode(&json!(-15.0));
        assert_eq!(payload.bare_number(), Some(-15.0));
        assert_eq!(payload.str_field("direction"), None);
    }

    #[test]
    fn test_decode_legacy_skips_malformed_pairs() {
        let payload = Payload::decode(&json!("{direction=in, garbage, =empty}"));
        assert_eq!(payload.str_field("direction"), Some("in"));
        // Only the well-formed pair survives.
        assert_eq!(payload.num_field("garbage"), None);
    }

    #[test]
    fn test_num_field_tolerates_string_numbers() {
        let payload = Payload::decode(&json!({"delta": "5"}));
        assert_eq!(payload.num_field("delta"), Some(5.0));
    }

    #[test]
    fn test_decode_unsupported_shapes_yield_empty() {
        assert!(Payload::decode(&json!([1, 2, 3])).is_empty());
        assert!(Payload::decode(&Value::Null).is_empty());
    }
}

//! Defensive parsing of numeric wire fields.
//!
//! The controller sends monetary amounts and rates either as JSON numbers
//! or as decimal strings (`"16.6667"`). [`NumericField`] keeps the raw
//! value so a bad field can be logged verbatim, and only yields a number
//! when the value is a finite decimal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A numeric field as received on the wire.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericField(serde_json::Value);

impl NumericField {
    /// The parsed value, or `None` when the field is not a finite number.
    pub fn value(&self) -> Option<f64> {
        let parsed = match &self.0 {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        parsed.filter(|v| v.is_finite())
    }

    /// The raw wire value, for diagnostics.
    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<f64> for NumericField {
    fn from(value: f64) -> Self {
        Self(serde_json::json!(value))
    }
}

impl From<&str> for NumericField {
    fn from(value: &str) -> Self {
        Self(serde_json::Value::String(value.to_string()))
    }
}

impl fmt::Debug for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NumericField({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> NumericField {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(parse(r#""300""#).value(), Some(300.0));
        assert_eq!(parse(r#"" 16.6667 ""#).value(), Some(16.6667));
    }

    #[test]
    fn parses_json_numbers() {
        assert_eq!(parse("1000").value(), Some(1000.0));
        assert_eq!(parse("2.5").value(), Some(2.5));
    }

    #[test]
    fn rejects_non_numeric_values() {
        assert_eq!(parse(r#""abc""#).value(), None);
        assert_eq!(parse(r#""""#).value(), None);
        assert_eq!(parse("true").value(), None);
        assert_eq!(parse("null").value(), None);
        assert_eq!(parse(r#"{"v":1}"#).value(), None);
    }

    #[test]
    fn rejects_non_finite_strings() {
        assert_eq!(parse(r#""NaN""#).value(), None);
        assert_eq!(parse(r#""inf""#).value(), None);
    }

    #[test]
    fn keeps_raw_value_for_diagnostics() {
        let field = parse(r#""12x""#);
        assert_eq!(field.raw(), &serde_json::json!("12x"));
    }
}

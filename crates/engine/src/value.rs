//! Cell value coercion.
//!
//! Cells arrive from the backend as loosely typed JSON scalars (usually the
//! formatted display string). [`coerce`] turns the cell text into the typed
//! scalar that ends up in the generated config:
//!
//! 1. base-10 integers become [`TypedValue::Integer`],
//! 2. otherwise commas are rewritten to periods and the text is tried as a
//!    float ([`TypedValue::Float`]),
//! 3. anything else is kept as [`TypedValue::Text`] - with the comma rewrite
//!    still applied, so `"a,b"` becomes `"a.b"`.

use serde_json::Value;

/// A coerced cell value
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Whole number
    Integer(i64),
    /// Finite floating-point number
    Float(f64),
    /// Anything that is not numeric
    Text(String),
}

impl From<TypedValue> for Value {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::Integer(n) => Self::from(n),
            // coerce() only produces finite floats, so from_f64 cannot fail there
            TypedValue::Float(f) => {
                serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number)
            }
            TypedValue::Text(s) => Self::String(s),
        }
    }
}

/// Coerce raw cell text into a typed value. Never fails.
#[must_use]
pub fn coerce(raw: &str) -> TypedValue {
    if let Ok(n) = raw.trim().parse::<i64>() {
        return TypedValue::Integer(n);
    }

    let normalized = raw.replace(',', ".");
    if let Some(f) = parse_invariant_float(normalized.trim()) {
        return TypedValue::Float(f);
    }

    TypedValue::Text(normalized)
}

/// Parse a float written with `.` as decimal separator.
///
/// Only finite values count: `inf`/`NaN` spellings stay text since they have
/// no JSON representation.
fn parse_invariant_float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Render a raw cell as the text the parsers work on.
///
/// Strings are used verbatim, `null` becomes the empty string, and any other
/// scalar uses its JSON rendering.
#[must_use]
pub fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce("42"), TypedValue::Integer(42));
        assert_eq!(coerce("-7"), TypedValue::Integer(-7));
        assert_eq!(coerce("+3"), TypedValue::Integer(3));
        assert_eq!(coerce(" 12 "), TypedValue::Integer(12));
    }

    #[test]
    fn test_coerce_comma_decimal() {
        let expected: f64 = "3.14".parse().unwrap();
        assert_eq!(coerce("3,14"), TypedValue::Float(expected));
        assert_eq!(coerce("1,5"), TypedValue::Float(1.5));
    }

    #[test]
    fn test_coerce_period_decimal_and_exponent() {
        assert_eq!(coerce("0.5"), TypedValue::Float(0.5));
        assert_eq!(coerce("1e3"), TypedValue::Float(1000.0));
        assert_eq!(coerce("-2.25"), TypedValue::Float(-2.25));
    }

    #[test]
    fn test_coerce_integer_beyond_i64_is_float() {
        assert_eq!(
            coerce("99999999999999999999"),
            TypedValue::Float(1e20)
        );
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce("hello"), TypedValue::Text("hello".to_string()));
        assert_eq!(coerce(""), TypedValue::Text(String::new()));
    }

    #[test]
    fn test_coerce_text_keeps_comma_rewrite() {
        assert_eq!(coerce("a,b"), TypedValue::Text("a.b".to_string()));
        assert_eq!(
            coerce("Goblin, Orc"),
            TypedValue::Text("Goblin. Orc".to_string())
        );
    }

    #[test]
    fn test_coerce_non_finite_is_text() {
        assert_eq!(coerce("NaN"), TypedValue::Text("NaN".to_string()));
        assert_eq!(coerce("inf"), TypedValue::Text("inf".to_string()));
        assert_eq!(
            coerce("Infinity"),
            TypedValue::Text("Infinity".to_string())
        );
    }

    #[test]
    fn test_typed_value_into_json() {
        assert_eq!(Value::from(TypedValue::Integer(10)), json!(10));
        assert_eq!(Value::from(TypedValue::Float(2.5)), json!(2.5));
        assert_eq!(
            Value::from(TypedValue::Text("x".to_string())),
            json!("x")
        );
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("abc")), "abc");
        assert_eq!(cell_text(&json!(12)), "12");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&Value::Null), "");
    }
}

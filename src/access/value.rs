use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Kinds of values a record field can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Boolean,
    Int,
    Float,
    String,
    List,
}

impl DataType {
    /// Position of this kind in the cross-kind total order used by MIN/MAX
    fn rank(&self) -> u8 {
        match self {
            DataType::Boolean => 1,
            DataType::Int | DataType::Float => 2,
            DataType::String => 3,
            DataType::List => 4,
        }
    }
}

/// Values held by record fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::String(_) => Some(DataType::String),
            Value::List(_) => Some(DataType::List),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used when a condition result decides whether a row matches.
    /// Null, false, zero and empty strings/lists are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Numeric view of the value, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Coerce the value into a number for SUM/AVG.
    ///
    /// Numbers are returned as-is, booleans count as 0/1, and strings are
    /// parsed as an integer first and then as a float. Everything else
    /// (including null) yields `None`.
    pub fn to_number(&self) -> Option<Value> {
        match self {
            Value::Int(_) | Value::Float(_) => Some(self.clone()),
            Value::Boolean(b) => Some(Value::Int(i64::from(*b))),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<i64>() {
                    Some(Value::Int(n))
                } else {
                    s.parse::<f64>().ok().map(Value::Float)
                }
            }
            Value::Null | Value::List(_) => None,
        }
    }

    /// Compare two values of compatible kinds.
    ///
    /// Integers and floats compare numerically. Returns `None` when the kinds
    /// cannot be ordered against each other (or a float is NaN).
    pub fn partial_compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.partial_compare(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// Equality as seen by conditions: numbers compare numerically and
    /// values of unrelated kinds are simply unequal.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loosely_equals(y))
            }
            _ => self.partial_compare(other) == Some(Ordering::Equal),
        }
    }

    /// Total order across all kinds: null < boolean < number < string < list.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        let rank = |v: &Value| v.data_type().map(|t| t.rank()).unwrap_or(0);
        match rank(self).cmp(&rank(other)) {
            Ordering::Equal => self.partial_compare(other).unwrap_or(Ordering::Equal),
            ord => ord,
        }
    }

    /// Convert into a JSON value, used for canonical keys
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            // Nested objects are kept as their JSON text
            obj @ serde_json::Value::Object(_) => Value::String(obj.to_string()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into_iter().map(Value::String).collect())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            // Debug keeps the trailing ".0" on whole floats
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());

        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Float(0.5).is_truthy());
        assert!(Value::from("x").is_truthy());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Int(3).to_number(), Some(Value::Int(3)));
        assert_eq!(Value::from(" 42 ").to_number(), Some(Value::Int(42)));
        assert_eq!(Value::from("2.5").to_number(), Some(Value::Float(2.5)));
        assert_eq!(Value::Boolean(true).to_number(), Some(Value::Int(1)));
        assert_eq!(Value::from("abc").to_number(), None);
        assert_eq!(Value::Null.to_number(), None);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(
            Value::Int(2).partial_compare(&Value::Float(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::from("a").partial_compare(&Value::Int(1)), None);
        assert!(Value::Int(1).loosely_equals(&Value::Float(1.0)));
        assert!(!Value::Int(1).loosely_equals(&Value::from("1")));
        assert!(Value::Null.loosely_equals(&Value::Null));
    }

    #[test]
    fn test_total_order_across_kinds() {
        let mut values = vec![
            Value::from("b"),
            Value::Int(3),
            Value::Null,
            Value::Boolean(true),
            Value::Float(1.5),
        ];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Boolean(true),
                Value::Float(1.5),
                Value::Int(3),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_json_conversion() {
        assert_eq!(Value::from(json!(7)), Value::Int(7));
        assert_eq!(Value::from(json!(7.25)), Value::Float(7.25));
        assert_eq!(
            Value::from(json!(["a", 1])),
            Value::List(vec![Value::from("a"), Value::Int(1)])
        );
        assert_eq!(
            Value::from(json!({"k": 1})),
            Value::String(r#"{"k":1}"#.to_string())
        );
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(300.0).to_string(), "300.0");
        assert_eq!(Value::Int(300).to_string(), "300");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(
            Value::from(vec!["a".to_string(), "b".to_string()]).to_string(),
            "[a, b]"
        );
    }
}

use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::Serialize;

/// A value produced or consumed by the expression language.
///
/// Values are immutable once built. Equality is structural: two values are
/// equal when they have the same kind and equal contents, so `1 == "1"` is
/// simply `false`.
///
/// # Examples
///
/// ```
/// use rule_dsl::Value;
/// use std::collections::BTreeMap;
///
/// // Scalar values
/// let null = Value::Null;
/// let boolean = Value::Boolean(true);
/// let number = Value::Number(42.0);
/// let string = Value::from("hello");
///
/// // Collections
/// let list = Value::List(vec![Value::Number(1.0), Value::Number(2.0)]);
///
/// let mut fields = BTreeMap::new();
/// fields.insert("region".to_string(), Value::from("EU"));
/// let record = Value::Record(fields);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value (`null`)
    Null,

    /// `true` or `false`
    Boolean(bool),

    /// Double-precision number; integers are numbers with no fractional part
    Number(f64),

    /// UTF-8 string
    String(String),

    /// Ordered sequence of values
    List(Vec<Value>),

    /// Named fields, kept in key order
    Record(BTreeMap<String, Value>),
}

/// The kind of a [`Value`], used in type errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    List,
    Record,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Record => "record",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Record(_) => ValueKind::Record,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer, only when the number is whole and fits in an `i64`
    pub fn as_integer(&self) -> Option<i64> {
        // 2^63; `i64::MAX as f64` rounds up to this value
        const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
        match self {
            Value::Number(n) if n.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(n) => {
                Some(*n as i64)
            }
            _ => None,
        }
    }
}

/// Ordering is only defined between values of the same kind.
///
/// Numbers compare numerically, strings lexicographically, booleans with
/// `false < true`, lists element by element and records by their sorted
/// `(key, value)` pairs. `null` equals only itself.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            (Value::List(a), Value::List(b)) => a.partial_cmp(b),
            (Value::Record(a), Value::Record(b)) => a.iter().partial_cmp(b.iter()),
            _ => None,
        }
    }
}

/// Shortest decimal form, never in exponent notation (`3`, `0.25`, `1000000`).
pub(crate) fn format_number(n: f64) -> String {
    n.to_string()
}

pub(crate) fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", quote_string(s)),
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
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::Record(fields)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Record(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Number(n) => match Value::Number(n).as_integer() {
                Some(i) => serde_json::Value::Number(i.into()),
                None => serde_json::Number::from_f64(n)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
            },
            Value::String(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Record(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self.clone()).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mismatched_kinds_are_unequal_and_unordered() {
        assert_ne!(Value::Number(1.0), Value::from("1"));
        assert_eq!(Value::Number(1.0).partial_cmp(&Value::from("1")), None);
    }

    #[test]
    fn lists_order_element_wise() {
        let a = Value::from(vec![Value::from(1i64), Value::from(2i64)]);
        let b = Value::from(vec![Value::from(1i64), Value::from(3i64)]);
        assert!(a < b);
    }

    #[test]
    fn json_round_trip_keeps_integers_whole() {
        let json = json!({"amount": 1500, "ratio": 0.25, "tags": ["a"], "user": null});
        let value = Value::from(json.clone());
        assert_eq!(serde_json::Value::from(value), json);
    }

    #[test]
    fn huge_whole_numbers_stay_floats() {
        for n in [1e20, -1e20] {
            assert_eq!(Value::Number(n).as_integer(), None);
            assert_eq!(serde_json::to_value(Value::Number(n)).unwrap(), json!(n));
        }
        assert_eq!(Value::Number(-9_223_372_036_854_775_808.0).as_integer(), Some(i64::MIN));
        assert_eq!(
            serde_json::to_string(&Value::Number(1e20)).unwrap(),
            serde_json::to_string(&1e20_f64).unwrap()
        );
    }

    #[test]
    fn display_is_readable() {
        let value = Value::from(json!({"name": "Ann", "scores": [1, 2.5]}));
        assert_eq!(value.to_string(), r#"{name: "Ann", scores: [1, 2.5]}"#);
    }
}

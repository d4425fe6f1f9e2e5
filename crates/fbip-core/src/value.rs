//! Schema-less parameter values
//!
//! Action parameters and context maps are free-form on the wire. `Value` is
//! the closed, recursive shape they may take: null, bool, integer, float,
//! text, list or string-keyed map. Integers and floats stay distinct so a
//! value decodes to exactly what was encoded.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};

/// String-keyed map of values
pub type ValueMap = BTreeMap<String, Value>;

/// JSON-like value
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integers widen, floats truncate toward zero
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Any numeric value as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Non-finite floats at any depth become 0.0
    pub fn into_finite(self) -> Value {
        match self {
            Value::Float(f) if !f.is_finite() => Value::Float(0.0),
            Value::List(items) => Value::List(items.into_iter().map(Value::into_finite).collect()),
            Value::Map(map) => Value::Map(finite_map(map)),
            other => other,
        }
    }

    /// Structural equality with float tolerance
    pub fn approx_eq(&self, other: &Value, eps: f64) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => (a - b).abs() <= eps,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.approx_eq(y, eps))
            }
            (Value::Map(a), Value::Map(b)) => maps_approx_eq(a, b, eps),
            _ => self == other,
        }
    }
}

/// `Value::into_finite` over every entry of a map
pub fn finite_map(map: ValueMap) -> ValueMap {
    map.into_iter().map(|(k, v)| (k, v.into_finite())).collect()
}

/// Map equality with float tolerance
pub fn maps_approx_eq(a: &ValueMap, b: &ValueMap, eps: f64) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|((ka, va), (kb, vb))| ka == kb && va.approx_eq(vb, eps))
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("null, bool, number, string, list or string-keyed map")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, b: bool) -> Result<Value, E> {
        Ok(Value::Bool(b))
    }

    fn visit_i64<E: de::Error>(self, i: i64) -> Result<Value, E> {
        Ok(Value::Int(i))
    }

    fn visit_u64<E: de::Error>(self, u: u64) -> Result<Value, E> {
        Ok(match i64::try_from(u) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Float(u as f64),
        })
    }

    fn visit_f64<E: de::Error>(self, f: f64) -> Result<Value, E> {
        Ok(Value::Float(f))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<Value, E> {
        Ok(Value::Text(s.to_string()))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<Value, E> {
        Ok(Value::Text(s))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = ValueMap::new();
        while let Some((key, value)) = access.next_entry::<String, Value>()? {
            map.insert(key, value);
        }
        Ok(Value::Map(map))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        let mut inner = ValueMap::new();
        inner.insert("gate_type".into(), "hadamard".into());
        inner.insert("depth".into(), Value::Int(3));

        let mut map = ValueMap::new();
        map.insert("nested".into(), Value::Map(inner));
        map.insert("weights".into(), vec![0.25f64, 0.75].into());
        map.insert("flag".into(), true.into());
        map.insert("nothing".into(), Value::Null);
        Value::Map(map)
    }

    #[test]
    fn test_json_roundtrip_keeps_int_float_distinction() {
        let value = sample();
        let text = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);

        let back: Value = serde_json::from_str("[1, 1.0]").unwrap();
        assert_eq!(back, Value::List(vec![Value::Int(1), Value::Float(1.0)]));
    }

    #[test]
    fn test_from_json_value() {
        let json = serde_json::json!({"depth": 3, "ratio": 0.5, "tags": ["a", "b"]});
        let value = Value::from(json);
        let map = value.as_map().unwrap();
        assert_eq!(map["depth"], Value::Int(3));
        assert_eq!(map["ratio"].as_f64(), Some(0.5));
        assert_eq!(map["tags"].as_list().map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_into_finite_reaches_nested_floats() {
        let mut inner = ValueMap::new();
        inner.insert("gain".into(), Value::Float(f64::INFINITY));
        inner.insert("depth".into(), Value::Int(3));
        let value = Value::List(vec![
            Value::Float(f64::NAN),
            Value::Float(0.5),
            Value::Map(inner),
        ])
        .into_finite();

        let items = value.as_list().unwrap();
        assert_eq!(items[0], Value::Float(0.0));
        assert_eq!(items[1], Value::Float(0.5));
        let inner = items[2].as_map().unwrap();
        assert_eq!(inner["gain"], Value::Float(0.0));
        assert_eq!(inner["depth"], Value::Int(3));
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::Int(7).as_f64(), Some(7.0));
        assert_eq!(Value::Float(7.9).as_i64(), Some(7));
        assert_eq!(Value::Float(f64::NAN).as_i64(), None);
        assert_eq!(Value::Text("7".into()).as_i64(), None);
    }

    #[test]
    fn test_approx_eq() {
        let a = Value::List(vec![Value::Float(0.1), Value::Int(2)]);
        let b = Value::List(vec![Value::Float(0.1 + 1e-9), Value::Int(2)]);
        assert!(a.approx_eq(&b, 1e-6));
        assert!(!a.approx_eq(&Value::List(vec![Value::Float(0.1)]), 1e-6));
    }
}

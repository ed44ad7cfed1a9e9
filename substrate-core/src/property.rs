//! The backend's value model: primitive scalars, primitive arrays, and
//! fixed-length float vectors. Nothing nested.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::errors::CodecError;
use crate::graph::RecordKind;

/// One stored property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    BoolArray(Vec<bool>),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    TextArray(Vec<String>),
    /// Native vector type, used for similarity search.
    Vector(Vec<f32>),
}

impl PropertyValue {
    pub fn type_label(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Text(_) => "text",
            PropertyValue::BoolArray(_) => "bool array",
            PropertyValue::IntArray(_) => "int array",
            PropertyValue::FloatArray(_) => "float array",
            PropertyValue::TextArray(_) => "text array",
            PropertyValue::Vector(_) => "vector",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Text array. An empty array of any element type reads as empty.
    pub fn as_text_array(&self) -> Option<Vec<String>> {
        match self {
            PropertyValue::TextArray(v) => Some(v.clone()),
            other if other.is_empty_array() => Some(Vec::new()),
            _ => None,
        }
    }

    /// Float array; integer arrays widen.
    pub fn as_float_array(&self) -> Option<Vec<f64>> {
        match self {
            PropertyValue::FloatArray(v) => Some(v.clone()),
            PropertyValue::IntArray(v) => Some(v.iter().map(|i| *i as f64).collect()),
            PropertyValue::Vector(v) => Some(v.iter().map(|f| *f as f64).collect()),
            other if other.is_empty_array() => Some(Vec::new()),
            _ => None,
        }
    }

    /// Vector; float arrays narrow, since JSON cannot tell them apart.
    pub fn as_vector(&self) -> Option<Vec<f32>> {
        match self {
            PropertyValue::Vector(v) => Some(v.clone()),
            PropertyValue::FloatArray(v) => Some(v.iter().map(|f| *f as f32).collect()),
            PropertyValue::IntArray(v) => Some(v.iter().map(|i| *i as f32).collect()),
            other if other.is_empty_array() => Some(Vec::new()),
            _ => None,
        }
    }

    fn is_empty_array(&self) -> bool {
        match self {
            PropertyValue::BoolArray(v) => v.is_empty(),
            PropertyValue::IntArray(v) => v.is_empty(),
            PropertyValue::FloatArray(v) => v.is_empty(),
            PropertyValue::TextArray(v) => v.is_empty(),
            PropertyValue::Vector(v) => v.is_empty(),
            _ => false,
        }
    }

    /// Check a single value against the backend's rules.
    pub fn validate(&self, field: &str) -> Result<(), CodecError> {
        let finite = match self {
            PropertyValue::Float(f) => f.is_finite(),
            PropertyValue::FloatArray(v) => v.iter().all(|f| f.is_finite()),
            PropertyValue::Vector(v) => v.iter().all(|f| f.is_finite()),
            _ => true,
        };
        if finite {
            Ok(())
        } else {
            Err(CodecError::NonFiniteFloat {
                field: field.to_string(),
            })
        }
    }

    /// Convert one JSON value, rejecting anything nested.
    pub fn from_json(field: &str, value: &Value) -> Result<Self, CodecError> {
        match value {
            Value::Null => Ok(PropertyValue::Null),
            Value::Bool(b) => Ok(PropertyValue::Bool(*b)),
            Value::Number(n) => Ok(number_value(n)),
            Value::String(s) => Ok(PropertyValue::Text(s.clone())),
            Value::Object(_) => Err(CodecError::NestedObject {
                field: field.to_string(),
            }),
            Value::Array(items) => array_value(field, items),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Null => Value::Null,
            PropertyValue::Bool(b) => Value::Bool(*b),
            PropertyValue::Int(i) => Value::from(*i),
            PropertyValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            PropertyValue::Text(s) => Value::String(s.clone()),
            PropertyValue::BoolArray(v) => Value::from(v.clone()),
            PropertyValue::IntArray(v) => Value::from(v.clone()),
            PropertyValue::FloatArray(v) => Value::Array(
                v.iter()
                    .map(|f| Number::from_f64(*f).map_or(Value::Null, Value::Number))
                    .collect(),
            ),
            PropertyValue::TextArray(v) => Value::from(v.clone()),
            PropertyValue::Vector(v) => Value::Array(
                v.iter()
                    .map(|f| Number::from_f64(*f as f64).map_or(Value::Null, Value::Number))
                    .collect(),
            ),
        }
    }

    /// Ordering for predicates: numbers with numbers, text with text.
    fn compare(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Text(a), PropertyValue::Text(b)) => Some(a.cmp(b)),
            (PropertyValue::Bool(a), PropertyValue::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

fn number_value(n: &Number) -> PropertyValue {
    match n.as_i64() {
        Some(i) if !n.is_f64() => PropertyValue::Int(i),
        _ => PropertyValue::Float(n.as_f64().unwrap_or(0.0)),
    }
}

fn array_value(field: &str, items: &[Value]) -> Result<PropertyValue, CodecError> {
    if items.iter().any(|v| v.is_object() || v.is_array()) {
        return Err(CodecError::ArrayOfObjects {
            field: field.to_string(),
        });
    }
    if items.is_empty() {
        return Ok(PropertyValue::TextArray(Vec::new()));
    }
    if let Some(v) = items.iter().map(Value::as_bool).collect::<Option<Vec<_>>>() {
        return Ok(PropertyValue::BoolArray(v));
    }
    if let Some(v) = items.iter().map(Value::as_str).collect::<Option<Vec<_>>>() {
        return Ok(PropertyValue::TextArray(
            v.into_iter().map(str::to_string).collect(),
        ));
    }
    let numbers: Option<Vec<&Number>> = items
        .iter()
        .map(|v| match v {
            Value::Number(n) => Some(n),
            _ => None,
        })
        .collect();
    match numbers {
        Some(ns) if ns.iter().all(|n| n.is_i64()) => Ok(PropertyValue::IntArray(
            ns.iter().filter_map(|n| n.as_i64()).collect(),
        )),
        Some(ns) => Ok(PropertyValue::FloatArray(
            ns.iter().filter_map(|n| n.as_f64()).collect(),
        )),
        None => Err(CodecError::HeterogeneousArray {
            field: field.to_string(),
        }),
    }
}

/// A flat property set ready for the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyMap(BTreeMap<String, PropertyValue>);

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<PropertyValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyValue)> {
        self.0.iter()
    }

    /// Check every value against the backend's rules.
    pub fn validate(&self) -> Result<(), CodecError> {
        for (key, value) in &self.0 {
            value.validate(key)?;
        }
        Ok(())
    }

    /// Build from an untrusted JSON object. Nested objects and arrays of
    /// objects are rejected here, before anything reaches a backend.
    pub fn from_json(map: &Map<String, Value>) -> Result<Self, CodecError> {
        let mut out = Self::new();
        for (key, value) in map {
            out.insert(key.clone(), PropertyValue::from_json(key, value)?);
        }
        Ok(out)
    }

    pub fn to_json(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl FromIterator<(String, PropertyValue)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Filter over primitive properties.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    All,
    Eq(String, PropertyValue),
    Ne(String, PropertyValue),
    Lt(String, PropertyValue),
    Le(String, PropertyValue),
    Gt(String, PropertyValue),
    Ge(String, PropertyValue),
    IsNull(String),
    NotNull(String),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: PropertyValue) -> Self {
        Predicate::Eq(field.into(), value)
    }

    pub fn gt(field: impl Into<String>, value: PropertyValue) -> Self {
        Predicate::Gt(field.into(), value)
    }

    pub fn lt(field: impl Into<String>, value: PropertyValue) -> Self {
        Predicate::Lt(field.into(), value)
    }

    pub fn matches(&self, props: &PropertyMap) -> bool {
        let cmp = |field: &str, value: &PropertyValue| {
            props.get(field).and_then(|v| v.compare(value))
        };
        match self {
            Predicate::All => true,
            Predicate::Eq(f, v) => props
                .get(f)
                .is_some_and(|p| p == v || cmp(f, v) == Some(Ordering::Equal)),
            Predicate::Ne(f, v) => !Predicate::Eq(f.clone(), v.clone()).matches(props),
            Predicate::Lt(f, v) => cmp(f, v) == Some(Ordering::Less),
            Predicate::Le(f, v) => matches!(cmp(f, v), Some(Ordering::Less | Ordering::Equal)),
            Predicate::Gt(f, v) => cmp(f, v) == Some(Ordering::Greater),
            Predicate::Ge(f, v) => matches!(cmp(f, v), Some(Ordering::Greater | Ordering::Equal)),
            Predicate::IsNull(f) => props.get(f).map_or(true, PropertyValue::is_null),
            Predicate::NotNull(f) => props.get(f).is_some_and(|v| !v.is_null()),
            Predicate::And(ps) => ps.iter().all(|p| p.matches(props)),
            Predicate::Or(ps) => ps.iter().any(|p| p.matches(props)),
        }
    }
}

/// An encoded record as the backend sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub kind: RecordKind,
    pub id: String,
    pub vid: String,
    pub type_name: String,
    /// False once `expired_at` is set.
    pub current: bool,
    /// Link endpoints, kept as columns for relationship queries.
    pub source: Option<String>,
    pub target: Option<String>,
    pub properties: PropertyMap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_object_is_rejected() {
        let map = json!({"name": "x", "meta": {"a": 1}});
        let err = PropertyMap::from_json(map.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, CodecError::NestedObject { ref field } if field == "meta"));
    }

    #[test]
    fn array_of_objects_is_rejected() {
        let map = json!({"items": [1, {"a": 1}]});
        let err = PropertyMap::from_json(map.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, CodecError::ArrayOfObjects { .. }));
    }

    #[test]
    fn primitive_arrays_keep_their_element_type() {
        let map = json!({"ints": [1, 2], "floats": [1.5, 2.0], "tags": ["a"]});
        let props = PropertyMap::from_json(map.as_object().unwrap()).unwrap();
        assert_eq!(props.get("ints"), Some(&PropertyValue::IntArray(vec![1, 2])));
        assert_eq!(
            props.get("floats"),
            Some(&PropertyValue::FloatArray(vec![1.5, 2.0]))
        );
        assert_eq!(
            props.get("tags"),
            Some(&PropertyValue::TextArray(vec!["a".to_string()]))
        );
    }

    #[test]
    fn predicates_compare_numbers_across_int_and_float() {
        let mut props = PropertyMap::new();
        props.insert("energy", PropertyValue::Float(2.5));
        props.insert("valid_to", PropertyValue::Null);
        assert!(Predicate::gt("energy", PropertyValue::Int(2)).matches(&props));
        assert!(!Predicate::lt("energy", PropertyValue::Float(1.0)).matches(&props));
        assert!(Predicate::IsNull("valid_to".into()).matches(&props));
        assert!(Predicate::IsNull("missing".into()).matches(&props));
    }
}

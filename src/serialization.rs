use crate::ast::{RawMap, RawValue};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// The generic, serializable shape of a resolved descriptor hash.
/// Objects keep document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Array(Vec<Value>),
    Object(Object),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object(Vec<(String, Value)>);

impl Object {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Object {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

pub(crate) fn to_value(raw: &RawValue) -> Value {
    match raw {
        RawValue::String(s) => Value::String(s.clone()),
        RawValue::Number(n) => Value::Number(*n),
        RawValue::Boolean(b) => Value::Boolean(*b),
        RawValue::Null => Value::Null,
        RawValue::Sequence(items) => Value::Array(items.iter().map(to_value).collect()),
        RawValue::Mapping(map) => Value::Object(mapping_to_object(map)),
    }
}

pub(crate) fn mapping_to_object(map: &RawMap) -> Object {
    Object(
        map.iter()
            .map(|(key, value)| (key.to_string(), to_value(value)))
            .collect(),
    )
}

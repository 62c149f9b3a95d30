use crate::error::DocumentError;

/// A value in a raw descriptor document, before reference resolution.
///
/// Mappings keep insertion order so that descriptor iteration and
/// serialized output follow the source document.
#[derive(Debug, PartialEq, Clone)]
pub enum RawValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Mapping(RawMap),
    Sequence(Vec<RawValue>),
}

impl RawValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&RawMap> {
        match self {
            RawValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[RawValue]> {
        match self {
            RawValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// True for the values the lint rules treat as "no value": null,
    /// `false` and the empty string. Empty collections count as present.
    pub fn is_empty_value(&self) -> bool {
        matches!(self, RawValue::Null | RawValue::Boolean(false))
            || matches!(self, RawValue::String(s) if s.is_empty())
    }

    /// Renders a scalar for diagnostic context; collections render as
    /// a shape name.
    pub fn render(&self) -> String {
        match self {
            RawValue::String(s) => s.clone(),
            RawValue::Number(n) => n.to_string(),
            RawValue::Boolean(b) => b.to_string(),
            RawValue::Null => "null".to_string(),
            RawValue::Mapping(_) => "hash".to_string(),
            RawValue::Sequence(_) => "list".to_string(),
        }
    }
}

impl From<&serde_yaml::Value> for RawValue {
    fn from(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => RawValue::Null,
            serde_yaml::Value::Bool(b) => RawValue::Boolean(*b),
            serde_yaml::Value::Number(n) => RawValue::Number(n.as_f64().unwrap_or_default()),
            serde_yaml::Value::String(s) => RawValue::String(s.clone()),
            serde_yaml::Value::Sequence(items) => {
                RawValue::Sequence(items.iter().map(RawValue::from).collect())
            }
            serde_yaml::Value::Mapping(mapping) => {
                let mut map = RawMap::new();
                for (key, value) in mapping {
                    // Non-string scalar keys are stringified; anything else is dropped.
                    let key = match key {
                        serde_yaml::Value::String(s) => s.clone(),
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        _ => continue,
                    };
                    map.insert(key, RawValue::from(value));
                }
                RawValue::Mapping(map)
            }
            serde_yaml::Value::Tagged(tagged) => RawValue::from(&tagged.value),
        }
    }
}

impl From<&serde_json::Value> for RawValue {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Boolean(*b),
            serde_json::Value::Number(n) => RawValue::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => RawValue::String(s.clone()),
            serde_json::Value::Array(items) => {
                RawValue::Sequence(items.iter().map(RawValue::from).collect())
            }
            serde_json::Value::Object(object) => {
                let mut map = RawMap::new();
                for (key, value) in object {
                    map.insert(key.clone(), RawValue::from(value));
                }
                RawValue::Mapping(map)
            }
        }
    }
}

/// An ordered string-keyed mapping.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct RawMap {
    entries: Vec<(String, RawValue)>,
}

impl RawMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RawValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Convenience accessor for string-valued keys.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(RawValue::as_str)
    }

    pub fn get_mapping(&self, key: &str) -> Option<&RawMap> {
        self.get(key).and_then(RawValue::as_mapping)
    }

    /// Inserts a value, replacing any existing entry in place so the
    /// key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        let key = key.into();
        if let Some(existing) = self.get_mut(&key) {
            *existing = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges `other` into `self`.
    ///
    /// Conflict policy: colliding mapping values are merged recursively;
    /// any other collision (scalar or sequence) is overwritten by
    /// `other`'s value. Sequences are never merged element-wise. Keys
    /// only present in `other` are appended in `other`'s order.
    pub fn deep_merge(&mut self, other: &RawMap) {
        for (key, value) in other.iter() {
            match (self.get_mut(key), value) {
                (Some(RawValue::Mapping(existing)), RawValue::Mapping(incoming)) => {
                    existing.deep_merge(incoming);
                }
                (Some(existing), _) => *existing = value.clone(),
                (None, _) => self.entries.push((key.to_string(), value.clone())),
            }
        }
    }
}

impl FromIterator<(String, RawValue)> for RawMap {
    fn from_iter<T: IntoIterator<Item = (String, RawValue)>>(iter: T) -> Self {
        let mut map = RawMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// A parsed descriptor document: its raw mapping tree plus the name
/// used to qualify local reference keys.
#[derive(Debug, Clone)]
pub struct DescriptorDocument {
    pub name: String,
    pub root: RawMap,
}

impl DescriptorDocument {
    pub fn new(name: impl Into<String>, root: RawMap) -> Self {
        DescriptorDocument {
            name: name.into(),
            root,
        }
    }

    /// Parses a YAML descriptor document. The document name defaults to
    /// the root `id`.
    pub fn from_yaml_str(source: &str) -> Result<Self, DocumentError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(source).map_err(DocumentError::InvalidYaml)?;
        Self::from_raw(RawValue::from(&value))
    }

    /// Parses a JSON descriptor document. The document name defaults to
    /// the root `id`.
    pub fn from_json_str(source: &str) -> Result<Self, DocumentError> {
        let value: serde_json::Value =
            serde_json::from_str(source).map_err(DocumentError::InvalidJson)?;
        Self::from_raw(RawValue::from(&value))
    }

    fn from_raw(value: RawValue) -> Result<Self, DocumentError> {
        match value {
            RawValue::Mapping(root) => {
                let name = root.get_str("id").unwrap_or_default().to_string();
                Ok(DescriptorDocument { name, root })
            }
            _ => Err(DocumentError::RootNotMapping),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(value: &str) -> RawValue {
        RawValue::String(value.to_string())
    }

    #[test]
    fn deep_merge_overwrites_colliding_scalars() {
        let mut base: RawMap = [
            ("doc".to_string(), string("original")),
            ("type".to_string(), string("semantic")),
        ]
        .into_iter()
        .collect();
        let incoming: RawMap = [("doc".to_string(), string("merged"))].into_iter().collect();

        base.deep_merge(&incoming);

        assert_eq!(base.get_str("doc"), Some("merged"));
        assert_eq!(base.get_str("type"), Some("semantic"));
    }

    #[test]
    fn deep_merge_unions_colliding_mappings_recursively() {
        let mut base: RawMap = [(
            "links".to_string(),
            RawValue::Mapping([("self".to_string(), string("a"))].into_iter().collect()),
        )]
        .into_iter()
        .collect();
        let incoming: RawMap = [(
            "links".to_string(),
            RawValue::Mapping(
                [
                    ("self".to_string(), string("b")),
                    ("help".to_string(), string("c")),
                ]
                .into_iter()
                .collect(),
            ),
        )]
        .into_iter()
        .collect();

        base.deep_merge(&incoming);

        let links = base.get_mapping("links").unwrap();
        assert_eq!(links.get_str("self"), Some("b"));
        assert_eq!(links.get_str("help"), Some("c"));
    }

    #[test]
    fn deep_merge_replaces_sequences_wholesale() {
        let mut base: RawMap = [(
            "tags".to_string(),
            RawValue::Sequence(vec![string("a"), string("b")]),
        )]
        .into_iter()
        .collect();
        let incoming: RawMap =
            [("tags".to_string(), RawValue::Sequence(vec![string("c")]))]
                .into_iter()
                .collect();

        base.deep_merge(&incoming);

        assert_eq!(
            base.get("tags").unwrap().as_sequence().unwrap(),
            &[string("c")]
        );
    }

    #[test]
    fn deep_merge_appends_new_keys_in_order() {
        let mut base: RawMap = [("a".to_string(), string("1"))].into_iter().collect();
        let incoming: RawMap = [
            ("b".to_string(), string("2")),
            ("c".to_string(), string("3")),
        ]
        .into_iter()
        .collect();

        base.deep_merge(&incoming);

        let keys: Vec<&str> = base.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map: RawMap = [
            ("first".to_string(), string("1")),
            ("second".to_string(), string("2")),
        ]
        .into_iter()
        .collect();

        map.insert("first", string("updated"));

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["first", "second"]);
        assert_eq!(map.get_str("first"), Some("updated"));
    }

    #[test]
    fn yaml_conversion_preserves_mapping_order() {
        let value: serde_yaml::Value = serde_yaml::from_str("z: 1\na: 2\nm: 3\n").unwrap();
        let raw = RawValue::from(&value);

        let map = raw.as_mapping().unwrap();
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn document_name_defaults_to_root_id() {
        let document = DescriptorDocument::from_yaml_str("id: DRDs\ndescriptors: {}\n").unwrap();
        assert_eq!(document.name, "DRDs");
    }
}

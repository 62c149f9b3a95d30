use crate::ast::{DescriptorDocument, RawMap, RawValue};
use crate::error::ProfileLoadError;
use log::debug;
use std::collections::HashMap;

/// Run-scoped mapping from a qualified reference key to the raw
/// document branch it identifies.
///
/// Keys take the form `<document-name>#<id>` for document-local nodes
/// and the raw URL for externally loaded nodes. Registration is
/// idempotent: the first branch registered under a key wins and later
/// registrations for the same key are ignored.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, RawMap>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, node: RawMap) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            debug!("registry key {key} already present, keeping first registration");
            return;
        }
        self.entries.insert(key, node);
    }

    pub fn lookup(&self, key: &str) -> Option<&RawMap> {
        self.entries.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers every addressable node of a document: any mapping
    /// carrying an `id`, and every entry of a `descriptors` mapping
    /// (whose key doubles as its id), under `<document-name>#<id>`.
    pub fn register_document(&mut self, document: &DescriptorDocument) {
        debug!("registering addressable nodes of document {}", document.name);
        self.register_branch(&document.name, &document.root);
    }

    fn register_branch(&mut self, document_name: &str, node: &RawMap) {
        for (key, value) in node.iter() {
            match value {
                RawValue::Mapping(map) => {
                    if key == "descriptors" {
                        for (name, child) in map.iter() {
                            if let RawValue::Mapping(child_map) = child {
                                let id = child_map.get_str("id").unwrap_or(name);
                                self.register(format!("{document_name}#{id}"), child_map.clone());
                            }
                        }
                    }
                    if let Some(id) = map.get_str("id") {
                        self.register(format!("{document_name}#{id}"), map.clone());
                    }
                    self.register_branch(document_name, map);
                }
                RawValue::Sequence(items) => {
                    for item in items {
                        if let RawValue::Mapping(map) = item {
                            if let Some(id) = map.get_str("id") {
                                self.register(format!("{document_name}#{id}"), map.clone());
                            }
                            self.register_branch(document_name, map);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Capability for fetching external profile documents on demand.
///
/// The resolver calls `load` for every absolute href it encounters; the
/// loader parses the remote profile and registers its addressable nodes
/// in the registry it is handed. Implementations must tolerate repeated
/// calls for the same URL (the registry makes re-registration a no-op,
/// so loading twice is harmless but wasteful).
pub trait ProfileLoader {
    fn load(&mut self, url: &str, registry: &mut Registry) -> Result<(), ProfileLoadError>;
}

/// Loader that never resolves anything. External references pass
/// through unresolved, which is the correct behavior for documents
/// without external profiles.
#[derive(Debug, Default)]
pub struct NullProfileLoader;

impl ProfileLoader for NullProfileLoader {
    fn load(&mut self, _url: &str, _registry: &mut Registry) -> Result<(), ProfileLoadError> {
        Ok(())
    }
}

use crate::ast::DescriptorDocument;
use crate::descriptor::Resource;
use crate::error::ProfileError;
use crate::lint::{self, Diagnostics};
use crate::registry::{ProfileLoader, Registry};
use crate::resolver::Dereferencer;
use crate::serialization::{mapping_to_object, Value};
use serde::{Serialize, Serializer};

/// The result of a successful analysis of a descriptor document: the
/// resolved descriptor graph plus the registry it was resolved
/// against. Linting and serialization both start from here.
#[derive(Debug)]
pub struct Analysis {
    pub resource: Resource,
    pub registry: Registry,
}

impl Serialize for Analysis {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl Analysis {
    /// Runs the full lint pipeline over the resolved graph.
    #[must_use]
    pub fn lint(&self) -> Diagnostics {
        lint::lint(&self.resource)
    }

    /// The resolved descriptor hash as a generic, serializable `Value`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(mapping_to_object(self.resource.document()))
    }

    /// Serializes the resolved descriptor hash into pretty-printed JSON.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// Serializes the resolved descriptor hash into YAML.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }
}

/// Analyzes a YAML descriptor document: parse, build the id registry,
/// dereference, and construct the descriptor graph.
///
/// This is the primary entry point. External profile references are
/// fetched through `loader`; pass a
/// [`crate::registry::NullProfileLoader`] for documents without them.
///
/// # Errors
///
/// Returns a `ProfileError` if the document cannot be parsed, a
/// reference chain is circular, or the graph cannot be built (missing
/// root id, unsupported protocol).
pub fn analyze_yaml(
    source: &str,
    loader: &mut dyn ProfileLoader,
) -> Result<Analysis, ProfileError> {
    let document = DescriptorDocument::from_yaml_str(source)?;
    analyze_document(document, loader)
}

/// Analyzes a JSON descriptor document. See [`analyze_yaml`].
///
/// # Errors
///
/// Returns a `ProfileError` under the same conditions as
/// [`analyze_yaml`].
pub fn analyze_json(
    source: &str,
    loader: &mut dyn ProfileLoader,
) -> Result<Analysis, ProfileError> {
    let document = DescriptorDocument::from_json_str(source)?;
    analyze_document(document, loader)
}

/// Analyzes an already-parsed descriptor document.
///
/// # Errors
///
/// Returns a `ProfileError` on resolution or graph-construction
/// failure.
pub fn analyze_document(
    document: DescriptorDocument,
    loader: &mut dyn ProfileLoader,
) -> Result<Analysis, ProfileError> {
    let mut registry = Registry::new();
    registry.register_document(&document);

    let resolved =
        Dereferencer::new(&mut registry, loader).resolve(&document.name, &document.root)?;
    let resource = Resource::from_document(resolved)?;

    Ok(Analysis { resource, registry })
}

/// Parses, resolves and lints a YAML descriptor document in one step.
///
/// # Errors
///
/// Returns a `ProfileError` under the same conditions as
/// [`analyze_yaml`]; lint findings are never errors.
pub fn lint_yaml(
    source: &str,
    loader: &mut dyn ProfileLoader,
) -> Result<Diagnostics, ProfileError> {
    analyze_yaml(source, loader).map(|analysis| analysis.lint())
}

#[cfg(test)]
mod tests {
    use crate::registry::NullProfileLoader;
    use crate::{analyze_yaml, lint_yaml};

    const MINIMAL: &str = r"
id: DRDs
links:
  self: http://example.org/drds
descriptors:
  drds:
    doc: A collection of DRDs.
    type: semantic
    links:
      self: http://example.org/drds#drds
    descriptors:
      name:
        doc: The name of a DRD.
        type: semantic
        field_type: text
        sample: drdname
        href: http://alps.io/schema.org/Text
      list:
        doc:
          html: <p>Returns a list of DRDs.</p>
        type: safe
        rt: drds
states:
  drds:
    collection:
      doc: The entry collection.
      transitions:
        list:
          name: self
          next:
            - collection
protocols:
  http:
    list:
      method: GET
      uri: drds
      entry_point: drds
routes:
  list:
    controller: drds_controller
    action: index
";

    #[test]
    fn minimal_document_analyzes() {
        let analysis = analyze_yaml(MINIMAL, &mut NullProfileLoader).unwrap();
        assert_eq!(analysis.resource.id(), "DRDs");
        assert_eq!(analysis.resource.descriptors().len(), 1);
    }

    #[test]
    fn minimal_document_lints_clean() {
        let diagnostics = lint_yaml(MINIMAL, &mut NullProfileLoader).unwrap();
        assert!(
            diagnostics.is_clean(),
            "expected no findings, got:\n{diagnostics}"
        );
    }

    #[test]
    fn resolved_document_serializes_to_json() {
        let analysis = analyze_yaml(MINIMAL, &mut NullProfileLoader).unwrap();
        let json = analysis.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["id"], "DRDs");
        assert_eq!(
            value["descriptors"]["drds"]["descriptors"]["list"]["type"],
            "safe"
        );
    }
}

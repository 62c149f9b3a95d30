// Exercises an external profile loader backed by files on disk, the
// shape a real HTTP-fetching loader takes.

use alps_core::ast::DescriptorDocument;
use alps_core::error::ProfileLoadError;
use alps_core::registry::{ProfileLoader, Registry};
use alps_core::analyze_yaml;
use std::fs;
use std::path::PathBuf;

/// Maps profile URLs onto YAML files in a directory: the last path
/// segment of the URL names the file. Every addressable node of the
/// fetched profile is registered under the full reference URL.
struct FileProfileLoader {
    dir: PathBuf,
    loads: usize,
}

impl ProfileLoader for FileProfileLoader {
    fn load(&mut self, url: &str, registry: &mut Registry) -> Result<(), ProfileLoadError> {
        self.loads += 1;

        let (base, fragment) = url.split_once('#').unwrap_or((url, ""));
        let file_name = base
            .rsplit('/')
            .next()
            .ok_or_else(|| ProfileLoadError::new(url, "no path segment"))?;

        let path = self.dir.join(format!("{file_name}.yml"));
        let source = fs::read_to_string(&path)
            .map_err(|err| ProfileLoadError::new(url, err.to_string()))?;
        let document = DescriptorDocument::from_yaml_str(&source)
            .map_err(|err| ProfileLoadError::new(url, err.to_string()))?;

        // Register the addressed branch under the raw reference URL.
        let mut profile_registry = Registry::new();
        profile_registry.register_document(&document);
        if let Some(node) = profile_registry.lookup(&format!("{}#{fragment}", document.name)) {
            registry.register(url, node.clone());
        }
        Ok(())
    }
}

const EXTERNAL_PROFILE: &str = r"
id: Text
descriptors:
  text:
    doc: A plain text value.
    type: semantic
    sample: sample-text
";

const DOCUMENT: &str = r#"
id: DRDs
descriptors:
  drds:
    doc: DRDs.
    type: semantic
    links:
      self: "http://example.org/drds"
    descriptors:
      name:
        type: semantic
        href: "http://alps.io/profiles/Text#text"
states:
  drds:
    collection:
      doc: C.
      transitions: {}
protocols:
  http: {}
"#;

#[test]
fn external_profiles_load_from_disk_and_merge() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Text.yml"), EXTERNAL_PROFILE).unwrap();

    let mut loader = FileProfileLoader {
        dir: dir.path().to_path_buf(),
        loads: 0,
    };
    let analysis = analyze_yaml(DOCUMENT, &mut loader).unwrap();

    assert_eq!(loader.loads, 1);
    assert!(analysis.registry.has("http://alps.io/profiles/Text#text"));

    let name = analysis.resource.descriptors()[0]
        .children()
        .find(|d| d.id() == "name")
        .unwrap();
    assert_eq!(name.dhref(), Some("http://alps.io/profiles/Text#text"));
    assert_eq!(name.sample().and_then(|s| s.as_str()), Some("sample-text"));

    // the merged doc satisfies the lint doc rule for that node
    let diagnostics = analysis.lint();
    assert!(
        !diagnostics
            .errors()
            .iter()
            .any(|d| d.rule == "descriptors.property_missing"
                && d.context_value("resource") == Some("name")),
        "got:\n{diagnostics}"
    );
}

#[test]
fn missing_external_profiles_leave_the_reference_unresolved() {
    let dir = tempfile::tempdir().unwrap();

    let mut loader = FileProfileLoader {
        dir: dir.path().to_path_buf(),
        loads: 0,
    };
    let analysis = analyze_yaml(DOCUMENT, &mut loader).unwrap();

    assert_eq!(loader.loads, 1);
    let name = analysis.resource.descriptors()[0]
        .children()
        .find(|d| d.id() == "name")
        .unwrap();
    assert_eq!(name.href(), Some("http://alps.io/profiles/Text#text"));
    assert_eq!(name.dhref(), None);
}

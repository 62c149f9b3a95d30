use alps_core::descriptor::Condition;
use alps_core::registry::NullProfileLoader;
use alps_core::{analyze_json, analyze_yaml, Analysis};

const DOCUMENT: &str = r#"
id: DRDs
links:
  self: http://example.org/drds
descriptors:
  drds:
    doc: A collection of DRDs.
    type: semantic
    links:
      self: "http://example.org/drds#drds"
    descriptors:
      name:
        doc: The name of a DRD.
        type: semantic
        field_type: text
        sample: drdname
        href: "http://alps.io/schema.org/Text"
      list:
        doc: Returns a list of DRDs.
        type: safe
        rt: drds
      create:
        doc: Creates a DRD.
        type: unsafe
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
        create:
          conditions:
            - can_create
          next:
            - activated
    activated:
      doc: A created DRD.
      transitions:
        list:
          next:
            - collection
protocols:
  http:
    list:
      method: GET
      uri: drds
      entry_point: drds
      content_types:
        - application/json
    create:
      method: POST
      uri: drds
      status_codes:
        "201":
          description: Created
routes:
  list:
    controller: drds_controller
    action: index
  create:
    controller: drds_controller
    action: create
"#;

fn analyze() -> Analysis {
    analyze_yaml(DOCUMENT, &mut NullProfileLoader).unwrap()
}

#[test]
fn protocol_transitions_are_looked_up_by_name() {
    let analysis = analyze();
    let resource = &analysis.resource;

    let list = resource.protocol_transition("http", "list").unwrap();
    assert_eq!(list.method(), Some("GET"));
    assert_eq!(list.uri(), Some("drds"));
    assert_eq!(list.content_types(), ["application/json".to_string()]);

    assert!(resource.protocol_transition("http", "missing").is_none());
    assert!(resource.protocol_transition("ftp", "list").is_none());
}

#[test]
fn routes_reverse_into_protocol_transitions() {
    let analysis = analyze();
    let resource = &analysis.resource;

    let create = resource
        .protocol_route("http", "drds_controller", "create")
        .unwrap();
    assert_eq!(create.method(), Some("POST"));

    assert!(resource
        .protocol_route("http", "drds_controller", "destroy")
        .is_none());
}

#[test]
fn states_expose_transitions_and_conditions() {
    let analysis = analyze();
    let resource = &analysis.resource;

    let states = resource.resource_states("drds").unwrap();
    assert_eq!(states.len(), 2);

    let collection = &states[0];
    assert_eq!(collection.name(), "collection");
    assert_eq!(collection.doc(), Some("The entry collection."));

    let create = collection.transition("create").unwrap();
    assert_eq!(create.next(), ["activated".to_string()]);
    assert!(!create.is_available(&[]));
    assert!(create.is_available(&[Condition::Name("can_create".to_string())]));
    assert!(!create.is_available(&[Condition::Name("can_delete".to_string())]));

    // transitions without conditions are always available
    let list = collection.transition("list").unwrap();
    assert!(list.is_available(&[]));
}

#[test]
fn entry_points_come_from_http_transitions() {
    let analysis = analyze();
    let entry_points = analysis.resource.entry_points();

    assert_eq!(entry_points.len(), 1);
    assert_eq!(entry_points[0].uri, "drds");
    assert_eq!(entry_points[0].name, "drds");
    assert_eq!(entry_points[0].resource_id, "DRDs");
}

#[test]
fn registry_keeps_every_addressable_node() {
    let analysis = analyze();

    assert!(analysis.registry.has("DRDs#drds"));
    assert!(analysis.registry.has("DRDs#name"));
    assert!(analysis.registry.has("DRDs#list"));
}

#[test]
fn descriptor_kinds_are_classified_once() {
    let analysis = analyze();
    let drds = &analysis.resource.descriptors()[0];

    assert!(drds.is_resource());
    assert!(drds.is_semantic());

    let kinds: Vec<(&str, bool)> = drds
        .children()
        .map(|child| (child.id(), child.is_transition()))
        .collect();
    assert_eq!(
        kinds,
        vec![("name", false), ("list", true), ("create", true)]
    );
}

#[test]
fn doc_text_reads_plain_and_media_typed_docs() {
    let analysis = analyze();
    let drds = &analysis.resource.descriptors()[0];

    assert_eq!(drds.doc_text(), Some("A collection of DRDs."));

    let source = r#"
id: DRDs
descriptors:
  drds:
    doc:
      html: <p>DRDs.</p>
    type: semantic
states: {}
protocols: {}
"#;
    let analysis = analyze_yaml(source, &mut NullProfileLoader).unwrap();
    assert_eq!(
        analysis.resource.descriptors()[0].doc_text(),
        Some("<p>DRDs.</p>")
    );
}

#[test]
fn analysis_serializes_to_yaml_and_json() {
    let analysis = analyze();

    let yaml = analysis.to_yaml().unwrap();
    assert!(yaml.contains("id: DRDs"));

    let json: serde_json::Value = serde_json::from_str(&analysis.to_json().unwrap()).unwrap();
    assert_eq!(json["descriptors"]["drds"]["descriptors"]["create"]["type"], "unsafe");
}

#[test]
fn json_documents_analyze_like_yaml_ones() {
    let source = r#"{
        "id": "DRDs",
        "descriptors": {
            "drds": {
                "doc": "DRDs.",
                "type": "semantic",
                "descriptors": {
                    "name": {"doc": "N.", "type": "semantic"}
                }
            }
        },
        "states": {"drds": {"collection": {"doc": "C.", "transitions": {}}}},
        "protocols": {"http": {}}
    }"#;

    let analysis = analyze_json(source, &mut NullProfileLoader).unwrap();
    assert_eq!(analysis.resource.id(), "DRDs");
    assert_eq!(analysis.resource.descriptors()[0].id(), "drds");
}

#[test]
fn lint_runs_over_the_analysis() {
    let analysis = analyze();
    let diagnostics = analysis.lint();
    assert!(
        diagnostics.is_clean(),
        "expected a clean run, got:\n{diagnostics}"
    );
}

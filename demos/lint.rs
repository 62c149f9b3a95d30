use alps_core::registry::NullProfileLoader;
use alps_core::analyze_yaml;

fn main() {
    let descriptor_document = r#"
id: DRDs
descriptors:
  drds:
    doc: A collection of DRDs.
    type: semantic
    links:
      self: "http://example.org/drds"
    descriptors:
      name:
        doc: The name of a DRD.
        type: semantic
        field_type: text
      list:
        doc: Returns a list of DRDs.
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
"#;

    match analyze_yaml(descriptor_document, &mut NullProfileLoader) {
        Ok(analysis) => {
            let diagnostics = analysis.lint();
            if diagnostics.is_clean() {
                println!("all clear");
            } else {
                print!("{diagnostics}");
            }
            let json_output = analysis.to_json().unwrap();
            println!("Resolved descriptor document:\n{json_output}");
        }
        Err(e) => {
            eprintln!("Failed to analyze descriptor document: {e:?}");
        }
    }
}

use crate::ast::RawValue;
use crate::descriptor::{Descriptor, DescriptorType, Resource};
use crate::validators;
use log::debug;
use std::collections::HashSet;
use std::fmt;

const TOP_LEVEL: usize = 0;
const VALID_MEDIA_TYPES: &[&str] = &["html"];

/// Blocking violation or advisory finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A single lint finding: a rule key plus the named parameters needed
/// to render a human message. Immutable once collected.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub rule: &'static str,
    pub context: Vec<(&'static str, String)>,
}

impl Diagnostic {
    pub fn context_value(&self, name: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.as_str(), self.rule)?;
        if !self.context.is_empty() {
            let rendered: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{key}: {value}"))
                .collect();
            write!(f, " ({})", rendered.join(", "))?;
        }
        Ok(())
    }
}

/// The ordered findings of one validation run, errors and warnings
/// kept apart.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, rule: &'static str, context: Vec<(&'static str, String)>) {
        self.errors.push(Diagnostic {
            severity: Severity::Error,
            rule,
            context,
        });
    }

    pub fn add_warning(&mut self, rule: &'static str, context: Vec<(&'static str, String)>) {
        self.warnings.push(Diagnostic {
            severity: Severity::Warning,
            rule,
            context,
        });
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// The success case: no errors and no warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn error_rules(&self) -> Vec<&'static str> {
        self.errors.iter().map(|d| d.rule).collect()
    }

    pub fn warning_rules(&self) -> Vec<&'static str> {
        self.warnings.iter().map(|d| d.rule).collect()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in self.errors.iter().chain(self.warnings.iter()) {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

type Check = fn(&Resource, &mut Diagnostics);

/// The validation pipeline, in its fixed run order. Phases are
/// independent: each contributes diagnostics and none short-circuits
/// the rest, so a single run yields every finding it can.
const CHECKS: &[(&str, Check)] = &[
    ("check_required_sections", check_required_sections),
    ("check_descriptor_graph", check_descriptor_graph),
    ("compare_with_state_resources", compare_with_state_resources),
    ("check_id_uniqueness", check_id_uniqueness),
    ("check_transition_equivalence", check_transition_equivalence),
    ("check_states_section", check_states_section),
];

/// Runs every lint phase over a resolved descriptor graph.
pub fn lint(resource: &Resource) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    for (name, check) in CHECKS {
        debug!("running lint phase {name}");
        check(resource, &mut diagnostics);
    }
    diagnostics
}

fn check_required_sections(resource: &Resource, diagnostics: &mut Diagnostics) {
    for section in ["descriptors", "states", "protocols"] {
        if !resource.document().contains(section) {
            diagnostics.add_error(
                "catastrophic.section_missing",
                vec![("section", section.to_string())],
            );
        }
    }
}

fn check_descriptor_graph(resource: &Resource, diagnostics: &mut Diagnostics) {
    for descriptor in resource.descriptors() {
        check_descriptor_level(resource, descriptor, TOP_LEVEL, diagnostics);
    }
}

fn check_descriptor_level(
    resource: &Resource,
    descriptor: &Descriptor,
    level: usize,
    diagnostics: &mut Diagnostics,
) {
    common_properties_check(descriptor, level, diagnostics);
    if descriptor.is_semantic() {
        semantic_properties_check(resource, descriptor, level, diagnostics);
    }
    if descriptor.is_transition() {
        transition_properties_check(resource, descriptor, level, diagnostics);
    }
    for child in descriptor.children() {
        check_descriptor_level(resource, child, level + 1, diagnostics);
    }
}

// Rules common to semantic and transition descriptors.
fn common_properties_check(descriptor: &Descriptor, level: usize, diagnostics: &mut Diagnostics) {
    let resource_context = |extra: Vec<(&'static str, String)>| {
        let mut context = vec![("resource", descriptor.id().to_string())];
        context.extend(extra);
        context
    };

    match descriptor.doc() {
        Some(doc) => {
            if let Some(media_type) = invalid_media_type(doc) {
                diagnostics.add_error(
                    "descriptors.doc_media_type_invalid",
                    resource_context(vec![("media_type", media_type)]),
                );
            }
        }
        None => diagnostics.add_error(
            "descriptors.property_missing",
            resource_context(vec![("prop", "doc".to_string())]),
        ),
    }

    match descriptor.type_name() {
        Some(type_name) => {
            if descriptor.kind().is_none() {
                diagnostics.add_error(
                    "descriptors.type_invalid",
                    resource_context(vec![("type_prop", type_name.to_string())]),
                );
            }
        }
        None => diagnostics.add_error(
            "descriptors.property_missing",
            resource_context(vec![("prop", "type".to_string())]),
        ),
    }

    if level == TOP_LEVEL {
        if !descriptor.has_children() {
            diagnostics.add_error("catastrophic.no_descriptors", resource_context(vec![]));
        }

        if descriptor.links().is_empty() {
            diagnostics.add_warning(
                "descriptors.property_missing",
                resource_context(vec![("prop", "link".to_string())]),
            );
        } else if !valid_link_property(descriptor) {
            let first_rel = descriptor
                .links()
                .first()
                .map(|link| link.rel().to_string())
                .unwrap_or_default();
            diagnostics.add_error(
                "descriptors.link_invalid",
                resource_context(vec![("link", first_rel)]),
            );
        }
    }
}

// A doc is plain text, or a mapping from a supported media type to a
// non-empty value. Returns the offending media type when invalid.
fn invalid_media_type(doc: &RawValue) -> Option<String> {
    match doc {
        RawValue::String(_) => None,
        RawValue::Mapping(map) => {
            let last = map.iter().last();
            match last {
                Some((media_type, value))
                    if VALID_MEDIA_TYPES.contains(&media_type) && !value.is_empty_value() =>
                {
                    None
                }
                Some((media_type, _)) => Some(media_type.to_string()),
                None => Some(String::new()),
            }
        }
        other => Some(other.render()),
    }
}

fn valid_link_property(descriptor: &Descriptor) -> bool {
    descriptor
        .link("self")
        .is_some_and(|link| !link.href().is_empty())
}

fn semantic_properties_check(
    resource: &Resource,
    descriptor: &Descriptor,
    level: usize,
    diagnostics: &mut Diagnostics,
) {
    if level == TOP_LEVEL {
        return;
    }

    if descriptor.field_type().is_some() {
        validators::validate_field_type(descriptor, diagnostics);
    }
    if descriptor.options().is_some() {
        validators::validate_options(resource, descriptor, diagnostics);
    }

    // Every nested semantic should carry a sample and a reference.
    if descriptor.sample().is_none() {
        diagnostics.add_warning(
            "descriptors.property_missing",
            vec![
                ("resource", descriptor.id().to_string()),
                ("prop", "sample".to_string()),
            ],
        );
    }
    if descriptor.href().is_none() {
        diagnostics.add_warning(
            "descriptors.property_missing",
            vec![
                ("resource", descriptor.id().to_string()),
                ("prop", "href".to_string()),
            ],
        );
    }
}

fn transition_properties_check(
    resource: &Resource,
    descriptor: &Descriptor,
    level: usize,
    diagnostics: &mut Diagnostics,
) {
    if level == TOP_LEVEL {
        return;
    }

    match descriptor.rt() {
        Some(rt) => {
            if !valid_return_type(resource, rt) {
                diagnostics.add_error(
                    "descriptors.invalid_return_type",
                    vec![
                        ("resource", descriptor.id().to_string()),
                        ("rt", rt.to_string()),
                    ],
                );
            }
        }
        None => diagnostics.add_error(
            "descriptors.missing_return_type",
            vec![("resource", descriptor.id().to_string())],
        ),
    }

    let method = resource
        .transition_method(descriptor.id())
        .unwrap_or_default()
        .to_string();
    check_protocol_method_and_type(descriptor, &method, diagnostics);
}

// External return types are protocol-prefixed; "none" (any case) means
// no return; anything else must resolve in the states section.
fn valid_return_type(resource: &Resource, rt: &str) -> bool {
    crate::descriptor::is_protocol_prefixed(rt)
        || rt.eq_ignore_ascii_case("none")
        || resource.state_defined(rt)
}

fn check_protocol_method_and_type(
    descriptor: &Descriptor,
    method: &str,
    diagnostics: &mut Diagnostics,
) {
    let violation = match descriptor.kind() {
        Some(DescriptorType::Safe) => ["PUT", "POST", "DELETE"].contains(&method),
        Some(DescriptorType::Unsafe) => method != "POST",
        Some(DescriptorType::Idempotent) => method == "GET",
        _ => false,
    };
    if violation {
        diagnostics.add_error(
            "descriptors.invalid_method",
            vec![
                ("resource", descriptor.id().to_string()),
                ("mthd", method.to_string()),
                (
                    "type",
                    descriptor.type_name().unwrap_or_default().to_string(),
                ),
            ],
        );
    }
}

// The resources under `descriptors` and the resources under `states`
// must be the same set.
fn compare_with_state_resources(resource: &Resource, diagnostics: &mut Diagnostics) {
    let descriptor_names: Vec<&str> = resource.descriptors().iter().map(Descriptor::id).collect();
    let state_names: Vec<&str> = resource.state_resource_names().collect();

    for name in &descriptor_names {
        if !state_names.contains(name) {
            diagnostics.add_error(
                "descriptors.descriptor_resource_not_found",
                vec![("resource", name.to_string())],
            );
        }
    }
    for name in &state_names {
        if !descriptor_names.contains(name) {
            diagnostics.add_error(
                "descriptors.state_resource_not_found",
                vec![("resource", name.to_string())],
            );
        }
    }
}

fn check_id_uniqueness(resource: &Resource, diagnostics: &mut Diagnostics) {
    let mut seen = HashSet::new();
    review_descriptor_ids(resource.descriptors(), "", &mut seen, diagnostics);
}

fn review_descriptor_ids(
    descriptors: &[Descriptor],
    parent: &str,
    seen: &mut HashSet<String>,
    diagnostics: &mut Diagnostics,
) {
    for descriptor in descriptors {
        if !seen.insert(descriptor.id().to_string()) {
            diagnostics.add_error(
                "descriptors.non_unique_descriptor",
                vec![
                    ("id", descriptor.id().to_string()),
                    ("parent", parent.to_string()),
                ],
            );
        }
        review_descriptor_ids(descriptor.child_slice(), descriptor.id(), seen, diagnostics);
    }
}

// Transitions declared in the states and protocols sections must each
// have a matching transition descriptor. The reverse direction is
// deliberately not checked.
fn check_transition_equivalence(resource: &Resource, diagnostics: &mut Diagnostics) {
    let descriptor_transitions = build_descriptor_transition_list(resource);

    for transition in build_state_transition_list(resource) {
        if !descriptor_transitions.contains(&transition) {
            diagnostics.add_error(
                "descriptors.state_transition_not_found",
                vec![("transition", transition)],
            );
        }
    }

    for transition in resource.protocol_transition_names() {
        if !descriptor_transitions.iter().any(|t| t == transition) {
            diagnostics.add_error(
                "descriptors.protocol_transition_not_found",
                vec![("transition", transition.to_string())],
            );
        }
    }
}

fn build_descriptor_transition_list(resource: &Resource) -> Vec<String> {
    let mut transitions = Vec::new();
    fn collect(descriptors: &[Descriptor], transitions: &mut Vec<String>) {
        for descriptor in descriptors {
            if descriptor.is_transition() && !transitions.iter().any(|t| t == descriptor.id()) {
                transitions.push(descriptor.id().to_string());
            }
            collect(descriptor.child_slice(), transitions);
        }
    }
    collect(resource.descriptors(), &mut transitions);
    transitions
}

fn build_state_transition_list(resource: &Resource) -> Vec<String> {
    let mut transitions = Vec::new();
    for (_, states) in resource.states() {
        for state in states {
            for transition in state.transitions() {
                if !transitions.iter().any(|t| t == transition.name()) {
                    transitions.push(transition.name().to_string());
                }
            }
        }
    }
    transitions
}

// States-section hygiene: documented states, populated next lists that
// point at real states, and self-loops marked as such.
fn check_states_section(resource: &Resource, diagnostics: &mut Diagnostics) {
    for (resource_name, states) in resource.states() {
        let state_names: Vec<&str> = states.iter().map(|state| state.name()).collect();

        for state in states {
            if state.doc().is_none() {
                diagnostics.add_warning(
                    "states.doc_property_missing",
                    vec![
                        ("resource", resource_name.clone()),
                        ("state", state.name().to_string()),
                    ],
                );
            }

            for transition in state.transitions() {
                let transition_context = || {
                    vec![
                        ("resource", resource_name.clone()),
                        ("state", state.name().to_string()),
                        ("transition", transition.name().to_string()),
                    ]
                };

                if transition.next().is_empty() {
                    diagnostics.add_error("states.empty_missing_next", transition_context());
                } else {
                    for next_state in transition.next() {
                        if !state_names.contains(&next_state.as_str()) {
                            diagnostics.add_error(
                                "states.phantom_next_property",
                                vec![
                                    ("secondary_descriptor", resource_name.clone()),
                                    ("state", state.name().to_string()),
                                    ("transition", transition.name().to_string()),
                                    ("next_state", next_state.clone()),
                                ],
                            );
                        }
                    }

                    let re_enters_state = transition.next().iter().any(|n| n == state.name());
                    if re_enters_state && transition.marker() != Some("self") {
                        diagnostics.add_warning("states.no_self_property", transition_context());
                    }
                }
            }
        }
    }
}

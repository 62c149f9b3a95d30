use crate::ast::{RawMap, RawValue};
use crate::error::GraphError;

/// The protocols a resource descriptor document may bind transitions to.
pub const PROTOCOL_TYPES: &[&str] = &["http"];

/// True if `value` starts with a supported protocol name, the test the
/// lint rules apply to external return types and option URIs.
pub fn is_protocol_prefixed(value: &str) -> bool {
    PROTOCOL_TYPES.iter().any(|protocol| value.starts_with(protocol))
}

/// The fixed descriptor type vocabulary. `safe`, `unsafe` and
/// `idempotent` are collectively the transition types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    Semantic,
    Safe,
    Unsafe,
    Idempotent,
}

impl DescriptorType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "semantic" => Some(DescriptorType::Semantic),
            "safe" => Some(DescriptorType::Safe),
            "unsafe" => Some(DescriptorType::Unsafe),
            "idempotent" => Some(DescriptorType::Idempotent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorType::Semantic => "semantic",
            DescriptorType::Safe => "safe",
            DescriptorType::Unsafe => "unsafe",
            DescriptorType::Idempotent => "idempotent",
        }
    }

    pub fn is_transition(&self) -> bool {
        !matches!(self, DescriptorType::Semantic)
    }
}

/// A link associated with a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    rel: String,
    href: String,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Link {
            rel: rel.into(),
            href: href.into(),
        }
    }

    pub fn rel(&self) -> &str {
        &self.rel
    }

    pub fn href(&self) -> &str {
        &self.href
    }
}

/// A resolved descriptor node. Classification happens once, at
/// construction; downstream code never re-infers a node's kind from
/// its raw shape.
///
/// The graph tolerates duplicate ids and missing or unknown types —
/// structural problems are the lint engine's to report.
#[derive(Debug, Clone)]
pub struct Descriptor {
    id: String,
    resource: bool,
    type_name: Option<String>,
    kind: Option<DescriptorType>,
    links: Vec<Link>,
    children: Vec<Descriptor>,
    document: RawMap,
}

impl Descriptor {
    fn from_entry(name: &str, document: &RawMap, resource: bool) -> Self {
        let id = document.get_str("id").unwrap_or(name).to_string();
        let type_name = document.get_str("type").map(str::to_string);
        let kind = type_name.as_deref().and_then(DescriptorType::from_name);
        let links = document
            .get_mapping("links")
            .map(|links| {
                links
                    .iter()
                    .filter_map(|(rel, href)| href.as_str().map(|href| Link::new(rel, href)))
                    .collect()
            })
            .unwrap_or_default();
        let children = document
            .get_mapping("descriptors")
            .map(|children| {
                children
                    .iter()
                    .filter_map(|(child_name, child)| {
                        child
                            .as_mapping()
                            .map(|map| Descriptor::from_entry(child_name, map, false))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Descriptor {
            id,
            resource,
            type_name,
            kind,
            links,
            children,
            document: document.clone(),
        }
    }

    /// The descriptor id: the explicit `id` property, or the mapping
    /// key it was defined under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The presentation name: a `name` override, or the id.
    pub fn name(&self) -> &str {
        self.document.get_str("name").unwrap_or(&self.id)
    }

    /// The raw `type` property, which may name an unknown type.
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn kind(&self) -> Option<DescriptorType> {
        self.kind
    }

    /// True if this node is a top-level addressable resource.
    pub fn is_resource(&self) -> bool {
        self.resource
    }

    pub fn is_semantic(&self) -> bool {
        self.kind == Some(DescriptorType::Semantic)
    }

    pub fn is_transition(&self) -> bool {
        self.kind.is_some_and(|kind| kind.is_transition())
    }

    pub fn children(&self) -> impl Iterator<Item = &Descriptor> {
        self.children.iter()
    }

    pub fn child_slice(&self) -> &[Descriptor] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn doc(&self) -> Option<&RawValue> {
        self.document.get("doc")
    }

    /// The documentation text, whether plain or media-typed.
    pub fn doc_text(&self) -> Option<&str> {
        match self.doc()? {
            RawValue::String(text) => Some(text),
            RawValue::Mapping(map) => map.iter().last().and_then(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == rel)
    }

    /// The return type of a transition descriptor.
    pub fn rt(&self) -> Option<&str> {
        self.document.get_str("rt")
    }

    pub fn field_type(&self) -> Option<&str> {
        self.document.get_str("field_type")
    }

    pub fn validators(&self) -> Option<&RawMap> {
        self.document.get_mapping("validators")
    }

    pub fn options(&self) -> Option<&RawMap> {
        self.document.get_mapping("options")
    }

    pub fn sample(&self) -> Option<&RawValue> {
        self.document.get("sample")
    }

    /// The reference this descriptor carries. After resolution a merged
    /// reference survives as `dhref`, so both spellings count.
    pub fn href(&self) -> Option<&str> {
        self.document.get_str("href").or_else(|| self.dhref())
    }

    /// Provenance of a dereferenced link.
    pub fn dhref(&self) -> Option<&str> {
        self.document.get_str("dhref")
    }

    pub fn document(&self) -> &RawMap {
        &self.document
    }
}

/// A guard on a state transition: a bare condition name, or a
/// name/value pair.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Name(String),
    Attr { name: String, value: String },
}

impl Condition {
    fn from_raw(value: &RawValue) -> Option<Self> {
        match value {
            RawValue::String(name) => Some(Condition::Name(name.clone())),
            RawValue::Mapping(map) => map.iter().next().map(|(name, value)| Condition::Attr {
                name: name.to_string(),
                value: value.render(),
            }),
            _ => None,
        }
    }
}

/// A transition out of a state, with its guards and reachable states.
#[derive(Debug, Clone)]
pub struct StateTransition {
    name: String,
    marker: Option<String>,
    conditions: Vec<Condition>,
    next: Vec<String>,
}

impl StateTransition {
    fn from_entry(name: &str, document: &RawMap) -> Self {
        let conditions = document
            .get("conditions")
            .and_then(RawValue::as_sequence)
            .map(|items| items.iter().filter_map(Condition::from_raw).collect())
            .unwrap_or_default();
        let next = document
            .get("next")
            .and_then(RawValue::as_sequence)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        StateTransition {
            name: name.to_string(),
            marker: document.get_str("name").map(str::to_string),
            conditions,
            next,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `name` override, e.g. `self` for the transition that
    /// re-enters its own state.
    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn next(&self) -> &[String] {
        &self.next
    }

    /// Whether the transition is available given the granted
    /// conditions. A transition without guards is always available.
    pub fn is_available(&self, granted: &[Condition]) -> bool {
        self.conditions.is_empty()
            || granted
                .iter()
                .any(|condition| self.conditions.contains(condition))
    }
}

/// A state of a resource, with the transitions leaving it.
#[derive(Debug, Clone)]
pub struct State {
    name: String,
    doc: Option<String>,
    transitions: Vec<StateTransition>,
}

impl State {
    fn from_entry(name: &str, document: &RawMap) -> Self {
        let transitions = document
            .get_mapping("transitions")
            .map(|transitions| {
                transitions
                    .iter()
                    .filter_map(|(transition_name, transition)| {
                        transition
                            .as_mapping()
                            .map(|map| StateTransition::from_entry(transition_name, map))
                    })
                    .collect()
            })
            .unwrap_or_default();

        State {
            name: name.to_string(),
            doc: document.get_str("doc").map(str::to_string),
            transitions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn transition(&self, name: &str) -> Option<&StateTransition> {
        self.transitions.iter().find(|t| t.name == name)
    }
}

/// Wire-level details binding a transition to a protocol.
#[derive(Debug, Clone)]
pub struct ProtocolTransition {
    name: String,
    method: Option<String>,
    uri: Option<String>,
    entry_point: Option<String>,
    content_types: Vec<String>,
    headers: Vec<String>,
    status_codes: Option<RawMap>,
    slt: Option<RawMap>,
}

impl ProtocolTransition {
    fn from_entry(name: &str, document: &RawMap) -> Self {
        let string_list = |key: &str| {
            document
                .get(key)
                .and_then(RawValue::as_sequence)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default()
        };

        ProtocolTransition {
            name: name.to_string(),
            method: document.get_str("method").map(str::to_string),
            uri: document.get_str("uri").map(str::to_string),
            entry_point: document.get_str("entry_point").map(str::to_string),
            content_types: string_list("content_types"),
            headers: string_list("headers"),
            status_codes: document.get_mapping("status_codes").cloned(),
            slt: document.get_mapping("slt").cloned(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The uniform-interface method.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// The (templated) URI of the transition.
    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }

    pub fn entry_point(&self) -> Option<&str> {
        self.entry_point.as_deref()
    }

    pub fn content_types(&self) -> &[String] {
        &self.content_types
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Status codes the transition may return, used to generate
    /// human-readable documentation.
    pub fn status_codes(&self) -> Option<&RawMap> {
        self.status_codes.as_ref()
    }

    /// The service-level target specification.
    pub fn slt(&self) -> Option<&RawMap> {
        self.slt.as_ref()
    }
}

/// A routing entry for a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub controller: String,
    pub action: String,
}

/// An entry point advertised by a protocol transition.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPoint {
    pub uri: String,
    pub name: String,
    pub resource_id: String,
}

/// The resolved top-level resource descriptor: the descriptor graph
/// plus the states, protocols, routes and datalists sections.
#[derive(Debug, Clone)]
pub struct Resource {
    id: String,
    document: RawMap,
    descriptors: Vec<Descriptor>,
    states: Vec<(String, Vec<State>)>,
    protocols: Vec<(String, Vec<ProtocolTransition>)>,
    routes: Vec<(String, Route)>,
    datalists: Vec<(String, RawValue)>,
}

impl Resource {
    /// Builds the graph from a resolved document root.
    ///
    /// Fails on a missing top-level `id` and on unsupported protocol
    /// names; every other structural defect is left for lint.
    pub fn from_document(document: RawMap) -> Result<Self, GraphError> {
        let id = document
            .get_str("id")
            .map(str::to_string)
            .ok_or(GraphError::MissingIdentifier)?;

        let descriptors = document
            .get_mapping("descriptors")
            .map(|children| {
                children
                    .iter()
                    .filter_map(|(name, child)| {
                        child
                            .as_mapping()
                            .map(|map| Descriptor::from_entry(name, map, true))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let states = document
            .get_mapping("states")
            .map(|resources| {
                resources
                    .iter()
                    .filter_map(|(resource_name, states)| {
                        states.as_mapping().map(|states| {
                            let states = states
                                .iter()
                                .filter_map(|(state_name, state)| {
                                    state
                                        .as_mapping()
                                        .map(|map| State::from_entry(state_name, map))
                                })
                                .collect();
                            (resource_name.to_string(), states)
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut protocols = Vec::new();
        if let Some(section) = document.get_mapping("protocols") {
            for (protocol, transitions) in section.iter() {
                if !PROTOCOL_TYPES.contains(&protocol) {
                    return Err(GraphError::UnsupportedProtocol {
                        protocol: protocol.to_string(),
                        resource: id.clone(),
                    });
                }
                let transitions = transitions
                    .as_mapping()
                    .map(|transitions| {
                        transitions
                            .iter()
                            .filter_map(|(name, transition)| {
                                transition
                                    .as_mapping()
                                    .map(|map| ProtocolTransition::from_entry(name, map))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                protocols.push((protocol.to_string(), transitions));
            }
        }

        let routes = document
            .get_mapping("routes")
            .map(|routes| {
                routes
                    .iter()
                    .filter_map(|(transition, route)| {
                        route.as_mapping().map(|map| {
                            let route = Route {
                                controller: map.get_str("controller").unwrap_or_default().to_string(),
                                action: map.get_str("action").unwrap_or_default().to_string(),
                            };
                            (transition.to_string(), route)
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let datalists = document
            .get_mapping("datalists")
            .map(|datalists| {
                datalists
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Resource {
            id,
            document,
            descriptors,
            states,
            protocols,
            routes,
            datalists,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The resolved document root this graph was built from.
    pub fn document(&self) -> &RawMap {
        &self.document
    }

    /// The top-level descriptor nodes, in document order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// The top-level descriptors that represent addressable resources.
    pub fn resources(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.iter().filter(|d| d.is_resource())
    }

    /// The states section: resource name to its states, in document
    /// order.
    pub fn states(&self) -> &[(String, Vec<State>)] {
        &self.states
    }

    pub fn resource_states(&self, resource: &str) -> Option<&[State]> {
        self.states
            .iter()
            .find(|(name, _)| name == resource)
            .map(|(_, states)| states.as_slice())
    }

    /// Resource names appearing in the states section.
    pub fn state_resource_names(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(|(name, _)| name.as_str())
    }

    /// True if `name` appears in the states section, either as a
    /// resource name or as one of its state names. Return types of
    /// transition descriptors resolve against this set.
    pub fn state_defined(&self, name: &str) -> bool {
        self.states.iter().any(|(resource, states)| {
            resource == name || states.iter().any(|state| state.name() == name)
        })
    }

    pub fn protocols(&self) -> &[(String, Vec<ProtocolTransition>)] {
        &self.protocols
    }

    pub fn available_protocols(&self) -> impl Iterator<Item = &str> {
        self.protocols.iter().map(|(name, _)| name.as_str())
    }

    /// The default protocol: the first one defined in the document.
    pub fn default_protocol(&self) -> Option<&str> {
        self.protocols.first().map(|(name, _)| name.as_str())
    }

    /// Looks up a protocol-specific transition descriptor. A missing
    /// protocol or transition name is a plain `None`, not a failure.
    pub fn protocol_transition(&self, protocol: &str, transition: &str) -> Option<&ProtocolTransition> {
        self.protocols
            .iter()
            .find(|(name, _)| name == protocol)?
            .1
            .iter()
            .find(|t| t.name() == transition)
    }

    /// The method bound to a transition, from the first protocol that
    /// defines it.
    pub fn transition_method(&self, transition: &str) -> Option<&str> {
        self.protocols
            .iter()
            .find_map(|(_, transitions)| transitions.iter().find(|t| t.name() == transition))
            .and_then(ProtocolTransition::method)
    }

    /// Transition names appearing anywhere in the protocols section,
    /// first occurrence order, deduplicated.
    pub fn protocol_transition_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for (_, transitions) in &self.protocols {
            for transition in transitions {
                if !names.contains(&transition.name()) {
                    names.push(transition.name());
                }
            }
        }
        names
    }

    pub fn routes(&self) -> &[(String, Route)] {
        &self.routes
    }

    pub fn route(&self, transition: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|(name, _)| name == transition)
            .map(|(_, route)| route)
    }

    /// Reverse route lookup: the protocol transition whose route matches
    /// the controller/action pair.
    pub fn protocol_route(
        &self,
        protocol: &str,
        controller: &str,
        action: &str,
    ) -> Option<&ProtocolTransition> {
        let transition = self
            .routes
            .iter()
            .find(|(_, route)| route.controller == controller && route.action == action)
            .map(|(name, _)| name.as_str())?;
        self.protocol_transition(protocol, transition)
    }

    pub fn datalists(&self) -> &[(String, RawValue)] {
        &self.datalists
    }

    pub fn has_datalist(&self, name: &str) -> bool {
        self.datalists.iter().any(|(n, _)| n == name)
    }

    /// Entry points advertised by http transitions.
    pub fn entry_points(&self) -> Vec<EntryPoint> {
        self.protocols
            .iter()
            .filter(|(name, _)| name == "http")
            .flat_map(|(_, transitions)| transitions.iter())
            .filter_map(|transition| {
                transition.entry_point().map(|entry_point| EntryPoint {
                    uri: transition.uri().unwrap_or_default().to_string(),
                    name: entry_point.to_string(),
                    resource_id: self.id.clone(),
                })
            })
            .collect()
    }
}

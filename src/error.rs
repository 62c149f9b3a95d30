use miette::Diagnostic;
use thiserror::Error;

/// Top-level error for document analysis. Lint findings are not errors;
/// they are collected as [`crate::lint::Diagnostics`]. Only failures
/// that prevent building the descriptor graph surface here.
#[derive(Error, Debug, Diagnostic)]
pub enum ProfileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

/// Failures while reading a descriptor document into the raw model.
#[derive(Error, Debug, Diagnostic)]
pub enum DocumentError {
    #[error("descriptor document is not valid YAML")]
    #[diagnostic(
        code(document::invalid_yaml),
        help("The document could not be parsed as YAML.")
    )]
    InvalidYaml(#[source] serde_yaml::Error),

    #[error("descriptor document is not valid JSON")]
    #[diagnostic(
        code(document::invalid_json),
        help("The document could not be parsed as JSON.")
    )]
    InvalidJson(#[source] serde_json::Error),

    #[error("descriptor document root must be a mapping")]
    #[diagnostic(
        code(document::root_not_mapping),
        help("The top level of a descriptor document is a mapping with id, descriptors, states and protocols sections.")
    )]
    RootNotMapping,
}

/// Failures during reference resolution.
#[derive(Error, Debug, Diagnostic)]
pub enum ResolveError {
    #[error("circular reference: {chain}")]
    #[diagnostic(
        code(resolver::circular_reference),
        help("An href chain revisits a descriptor it is already being merged from. Break the cycle in the document.")
    )]
    CircularReference { chain: String },
}

/// Failures while building the descriptor graph from a resolved
/// document. These abort before lint runs.
#[derive(Error, Debug, Diagnostic)]
pub enum GraphError {
    #[error("resource descriptor document is missing an id")]
    #[diagnostic(
        code(descriptor::missing_identifier),
        help("Every resource descriptor document requires a top-level id.")
    )]
    MissingIdentifier,

    #[error("unknown protocol {protocol} defined in resource descriptor document {resource}")]
    #[diagnostic(
        code(descriptor::unsupported_protocol),
        help("Supported protocols: http.")
    )]
    UnsupportedProtocol { protocol: String, resource: String },
}

/// Error reported by a [`crate::registry::ProfileLoader`]. Loader
/// failures downgrade to unresolved references; the resolver logs them
/// and keeps the original href.
#[derive(Error, Debug, Diagnostic)]
#[error("failed to load external profile {url}: {reason}")]
#[diagnostic(
    code(registry::profile_load_failed),
    help("The external profile could not be fetched or parsed; its references stay unresolved.")
)]
pub struct ProfileLoadError {
    pub url: String,
    pub reason: String,
}

impl ProfileLoadError {
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        ProfileLoadError {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

pub mod api;
pub mod ast;
pub mod descriptor;
pub mod error;
pub mod lint;
pub mod registry;
pub mod resolver;
mod serialization;
mod validators;

pub use api::{analyze_document, analyze_json, analyze_yaml, lint_yaml, Analysis};
pub use registry::{NullProfileLoader, ProfileLoader, Registry};
pub use serialization::{Object, Value};

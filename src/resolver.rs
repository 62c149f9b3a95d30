use crate::ast::{RawMap, RawValue};
use crate::error::ResolveError;
use crate::registry::{ProfileLoader, Registry};
use log::warn;
use url::Url;

/// Rewrites a raw descriptor tree into a fully merged one by replacing
/// every `href` pointer with the deep-merged content of the node it
/// addresses.
///
/// Reference keys come in three forms:
/// - absolute URLs, resolved through the external profile loader and
///   looked up under the raw URL;
/// - semi-local references that already carry a `#` fragment, looked up
///   as-is;
/// - local fragment names, qualified as `<prefix>#<name>`.
///
/// References whose qualified key is absent from the registry pass
/// through verbatim; whether that matters is the lint engine's call,
/// not the resolver's.
pub struct Dereferencer<'a, L: ProfileLoader + ?Sized> {
    registry: &'a mut Registry,
    loader: &'a mut L,
}

impl<'a, L: ProfileLoader + ?Sized> Dereferencer<'a, L> {
    pub fn new(registry: &'a mut Registry, loader: &'a mut L) -> Self {
        Dereferencer { registry, loader }
    }

    /// Resolves `node` depth-first under the given document prefix.
    ///
    /// The prefix stays fixed for the whole traversal; subtrees merged
    /// in from other documents are still addressed through their
    /// qualified keys, never by switching the prefix.
    pub fn resolve(&mut self, prefix: &str, node: &RawMap) -> Result<RawMap, ResolveError> {
        self.resolve_node(prefix, node, &mut Vec::new())
    }

    fn resolve_node(
        &mut self,
        prefix: &str,
        node: &RawMap,
        stack: &mut Vec<String>,
    ) -> Result<RawMap, ResolveError> {
        let mut resolved = RawMap::new();
        for (key, value) in node.iter() {
            match value {
                RawValue::String(href) if key == "href" => {
                    self.resolve_reference(prefix, href, &mut resolved, stack)?;
                }
                RawValue::Mapping(map) => {
                    let merged = self.resolve_node(prefix, map, stack)?;
                    match resolved.get_mut(key) {
                        // An earlier href merge may already have produced
                        // content under this key.
                        Some(RawValue::Mapping(existing)) => existing.deep_merge(&merged),
                        Some(existing) => *existing = RawValue::Mapping(merged),
                        None => resolved.insert(key, RawValue::Mapping(merged)),
                    }
                }
                _ => resolved.insert(key, value.clone()),
            }
        }
        Ok(resolved)
    }

    fn resolve_reference(
        &mut self,
        prefix: &str,
        href: &str,
        resolved: &mut RawMap,
        stack: &mut Vec<String>,
    ) -> Result<(), ResolveError> {
        let qualified = self.qualify(prefix, href);

        let Some(target) = self.registry.lookup(&qualified).cloned() else {
            warn!("unresolvable reference {href} (qualified key {qualified}), keeping href verbatim");
            resolved.insert("href", RawValue::String(href.to_string()));
            return Ok(());
        };

        if stack.iter().any(|visited| visited == &qualified) {
            let chain = stack
                .iter()
                .map(String::as_str)
                .chain([qualified.as_str()])
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ResolveError::CircularReference { chain });
        }

        stack.push(qualified);
        let merged_target = self.resolve_node(prefix, &target, stack)?;
        stack.pop();

        // Provenance of the dereferenced link; only the first reference
        // merged into a node records it.
        if !resolved.contains("dhref") {
            resolved.insert("dhref", RawValue::String(href.to_string()));
        }
        resolved.deep_merge(&merged_target);
        Ok(())
    }

    /// Forms the qualified registry key for an href, invoking the
    /// external profile loader for absolute URLs.
    fn qualify(&mut self, prefix: &str, href: &str) -> String {
        if Url::parse(href).is_ok() {
            if let Err(err) = self.loader.load(href, self.registry) {
                warn!("external profile load failed, treating as unresolved: {err}");
            }
            href.to_string()
        } else if href.contains('#') {
            href.to_string()
        } else {
            format!("{prefix}#{href}")
        }
    }
}

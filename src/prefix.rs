//! Bidirectional prefix/namespace registry (`4.A Prefix registry`).

use crate::constants::config::DEFAULT_PREFIX_FALLBACK;
use crate::constants::DEFAULT_PREFIX_BINDINGS;
use crate::error::{BridgeError, BridgeResult};
use indexmap::IndexMap;
use std::collections::HashSet;

/// Bijection between short prefix strings and namespace IRIs.
///
/// Seeded with the fixed defaults (`rdf`, `rdfs`, `owl`, `dcterms`, `skos`)
/// and extended by user-supplied JSON, prefix declarations found in
/// reference Turtle files, and residual prefixes synthesized for namespaces
/// encountered but unbound.
#[derive(Debug, Clone)]
pub struct PrefixRegistry {
    prefix_to_ns: IndexMap<String, String>,
    ns_to_prefix: IndexMap<String, String>,
    gns_counter: usize,
}

impl Default for PrefixRegistry {
    fn default() -> Self {
        let mut registry = Self {
            prefix_to_ns: IndexMap::new(),
            ns_to_prefix: IndexMap::new(),
            gns_counter: 0,
        };
        for (prefix, ns) in DEFAULT_PREFIX_BINDINGS {
            registry.bind(prefix, ns);
        }
        registry
    }
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a prefix to a namespace, overwriting any previous binding for
    /// that prefix. The reverse map keeps the first prefix bound to a given
    /// namespace.
    pub fn bind(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        let prefix = prefix.into();
        let namespace = namespace.into();
        self.ns_to_prefix
            .entry(namespace.clone())
            .or_insert_with(|| prefix.clone());
        self.prefix_to_ns.insert(prefix, namespace);
    }

    /// Look up the namespace bound to a prefix.
    pub fn lookup(&self, prefix: &str) -> Option<&str> {
        self.prefix_to_ns.get(prefix).map(String::as_str)
    }

    /// Look up the prefix bound to a namespace, if any.
    pub fn reverse(&self, namespace: &str) -> Option<&str> {
        self.ns_to_prefix.get(namespace).map(String::as_str)
    }

    /// Split an IRI into `prefix:localname` form.
    ///
    /// Splits at the IRI's last `#` or `/`; the left part is the namespace,
    /// the right is the local name. Fails with [`BridgeError::UnknownNamespace`]
    /// if the namespace has no bound prefix — callers are expected to have
    /// run [`Self::synthesize_residuals`] over every namespace observed
    /// first.
    pub fn shorten(&self, iri: &str) -> BridgeResult<String> {
        let split = iri
            .rfind(['#', '/'])
            .map(|pos| iri.split_at(pos + 1))
            .unwrap_or(("", iri));
        let (namespace, local) = split;
        let prefix = self
            .reverse(namespace)
            .ok_or_else(|| BridgeError::UnknownNamespace(namespace.to_string()))?;
        Ok(format!("{prefix}:{local}"))
    }

    /// All bound (prefix, namespace) pairs, in binding order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefix_to_ns
            .iter()
            .map(|(p, n)| (p.as_str(), n.as_str()))
    }

    /// For each namespace not already bound, synthesize and bind a residual
    /// prefix (`4.A`, synthesis rule).
    ///
    /// Candidate extraction: strip trailing separators, take the last run
    /// of alphanumerics as the candidate prefix; if empty or purely numeric,
    /// fall back to `gns<counter>`. On collision within this call,
    /// disambiguate by appending 1-based indices.
    pub fn synthesize_residuals<'a>(&mut self, namespaces: impl IntoIterator<Item = &'a str>) {
        let mut used_this_call: HashSet<String> = HashSet::new();
        for namespace in namespaces {
            if namespace.is_empty() || self.reverse(namespace).is_some() {
                continue;
            }

            let candidate = Self::candidate_prefix(namespace);
            let base = if candidate.is_empty() || candidate.chars().all(|c| c.is_ascii_digit()) {
                let n = self.gns_counter;
                self.gns_counter += 1;
                format!("{DEFAULT_PREFIX_FALLBACK}{n}")
            } else {
                candidate
            };

            let mut disambiguated = base.clone();
            let mut index = 1;
            while self.prefix_to_ns.contains_key(&disambiguated)
                || used_this_call.contains(&disambiguated)
            {
                disambiguated = format!("{base}{index}");
                index += 1;
            }

            used_this_call.insert(disambiguated.clone());
            self.bind(disambiguated, namespace.to_string());
        }
    }

    /// Extract the candidate residual prefix from a namespace IRI: strip
    /// trailing separators, take the last run of alphanumerics, and strip
    /// non-alphanumerics from it.
    fn candidate_prefix(namespace: &str) -> String {
        let trimmed = namespace.trim_end_matches(['#', '/']);
        let last_token = trimmed
            .rsplit(['#', '/', ':'])
            .next()
            .unwrap_or(trimmed);
        last_token.chars().filter(|c| c.is_alphanumeric()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_splits_on_last_hash() {
        let registry = PrefixRegistry::new();
        assert_eq!(
            registry.shorten("http://www.w3.org/2000/01/rdf-schema#subClassOf").unwrap(),
            "rdfs:subClassOf"
        );
    }

    #[test]
    fn shorten_fails_for_unbound_namespace() {
        let registry = PrefixRegistry::new();
        assert!(matches!(
            registry.shorten("http://example.org/unbound#Thing"),
            Err(BridgeError::UnknownNamespace(_))
        ));
    }

    #[test]
    fn synthesize_residuals_is_idempotent() {
        let mut registry = PrefixRegistry::new();
        let namespaces = ["http://example.org/onto#", "http://example.org/onto#"];
        registry.synthesize_residuals(namespaces);
        let after_first = registry.bindings().count();
        registry.synthesize_residuals(namespaces);
        let after_second = registry.bindings().count();
        assert_eq!(after_first, after_second);
        assert_eq!(registry.reverse("http://example.org/onto#"), Some("onto"));
    }

    #[test]
    fn synthesize_residuals_disambiguates_collisions() {
        let mut registry = PrefixRegistry::new();
        registry.synthesize_residuals([
            "http://example.org/onto#",
            "http://other.org/onto#",
        ]);
        assert_eq!(registry.reverse("http://example.org/onto#"), Some("onto"));
        assert_eq!(registry.reverse("http://other.org/onto#"), Some("onto1"));
    }

    #[test]
    fn synthesize_residuals_falls_back_to_gns_for_empty_candidate() {
        let mut registry = PrefixRegistry::new();
        registry.synthesize_residuals(["http://example.org/123#"]);
        assert_eq!(registry.reverse("http://example.org/123#"), Some("gns0"));
    }
}

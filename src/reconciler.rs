//! Term reconciliation: resolving free-form diagram labels to canonical
//! IRIs (`4.C Term reconciler`).

use crate::config::ReconciliationConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::iri::IRI;
use crate::prefix::PrefixRegistry;
use crate::term::{Term, TermTable};

/// Whether a label is being reconciled in a predicate (edge) role or a
/// class/instance (node) role; the two take different camel-casing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    Predicate,
    NonPredicate,
}

/// The outcome of reconciling a single label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// The canonical IRI: either a term-table match or a freshly minted IRI.
    pub iri: IRI,
    /// Whether `iri` came from a term-table substitution (for provenance,
    /// see `4.J`'s `skos:exactMatch self` marker).
    pub substituted: bool,
    /// Aliases split from trailing parentheses, first usable as
    /// `rdfs:label`, remainder as `skos:altLabel` (`4.C` step 6).
    pub aliases: Vec<String>,
}

/// Reconcile a free-form label against the term table, constructing a new
/// IRI if no match clears the configured cutoff.
pub fn reconcile(
    label: &str,
    role: LabelRole,
    registry: &PrefixRegistry,
    table: &TermTable,
    config: &ReconciliationConfig,
) -> BridgeResult<Reconciled> {
    // Step 1: strip trailing parenthesized aliases.
    let (stripped, aliases) = strip_aliases(label);

    // Step 2: split prefix:local, or fall back to the default prefix.
    let (prefix, local) = match stripped.find(':') {
        Some(pos) => (&stripped[..pos], &stripped[pos + 1..]),
        None => (config.default_prefix.as_str(), stripped.as_str()),
    };

    let namespace = registry.lookup(prefix).ok_or_else(|| {
        BridgeError::UnknownPrefix(prefix.to_string())
    })?;

    // Step 3: normalise local part to the casing convention for this role.
    let normalized = match role {
        LabelRole::Predicate => lower_camel_case(&local.replace('_', " ")),
        LabelRole::NonPredicate => upper_camel_case(local),
    };

    // Step 4: build search keys in priority order.
    let spaced = split_camel_and_digits(&normalized);
    let keys = [
        stripped.clone(),
        format!("{prefix}:{normalized}"),
        format!("{prefix}:{spaced}"),
    ];

    // Step 5: query the term table.
    if let Some(term) = table.fuzzy(keys.iter().map(String::as_str), config.label_cutoff) {
        if let Term::Iri(iri) = term {
            return Ok(Reconciled {
                iri: iri.clone(),
                substituted: true,
                aliases,
            });
        }
    }

    let iri = IRI::new(format!("{namespace}{normalized}"))?;
    Ok(Reconciled {
        iri,
        substituted: false,
        aliases,
    })
}

/// Strip a trailing `(alias, alias, ...)` group from a label, returning the
/// stripped label and the list of aliases in order.
fn strip_aliases(label: &str) -> (String, Vec<String>) {
    let trimmed = label.trim();
    if let Some(open) = trimmed.find('(') {
        if trimmed.ends_with(')') {
            let head = trimmed[..open].trim_end().to_string();
            let inner = &trimmed[open + 1..trimmed.len() - 1];
            let aliases = inner
                .split(',')
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
            return (head, aliases);
        }
    }
    (trimmed.to_string(), Vec::new())
}

/// Split a string into words at whitespace/underscore/hyphen boundaries,
/// discarding empty words.
fn words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in s.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `Foo Bar` / `foo_bar` -> `FooBar`.
fn upper_camel_case(s: &str) -> String {
    words(s)
        .into_iter()
        .map(|w| capitalize(&w))
        .collect::<String>()
}

/// `Foo Bar` / `foo_bar` -> `fooBar`.
fn lower_camel_case(s: &str) -> String {
    let mut parts = words(s).into_iter();
    match parts.next() {
        Some(first) => {
            let mut out = first.to_lowercase();
            out.extend(parts.map(|w| capitalize(&w)));
            out
        }
        None => String::new(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Split a normalised (camel-cased) name at camel-case and digit boundaries,
/// producing a space-separated form (`4.C` step 4's third search key).
fn split_camel_and_digits(s: &str) -> String {
    let mut out = String::new();
    let chars: Vec<char> = s.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 {
            let prev = chars[i - 1];
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_ascii_digit())
                || (prev.is_ascii_digit() && c.is_alphabetic());
            if boundary {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::config::DEFAULT_PREFIX;

    fn registry_with(prefix: &str, ns: &str) -> PrefixRegistry {
        let mut r = PrefixRegistry::new();
        r.bind(prefix, ns);
        r
    }

    #[test]
    fn strips_trailing_aliases() {
        let (head, aliases) = strip_aliases("Foo (bar, baz)");
        assert_eq!(head, "Foo");
        assert_eq!(aliases, vec!["bar".to_string(), "baz".to_string()]);
    }

    #[test]
    fn mints_new_iri_when_no_match() {
        let registry = registry_with("ex", "http://example.org/");
        let table = TermTable::new();
        let config = ReconciliationConfig::default();
        let result = reconcile("Has Part", LabelRole::Predicate, &registry, &table, &config).unwrap();
        assert!(!result.substituted);
        assert_eq!(result.iri.as_str(), "http://example.org/hasPart");
    }

    #[test]
    fn unprefixed_label_falls_back_to_default_prefix() {
        let mut registry = PrefixRegistry::new();
        registry.bind(DEFAULT_PREFIX, "https://example.org/mds/");
        let table = TermTable::new();
        let config = ReconciliationConfig::default();
        let result = reconcile("Widget", LabelRole::NonPredicate, &registry, &table, &config).unwrap();
        assert_eq!(result.iri.as_str(), "https://example.org/mds/Widget");
    }

    #[test]
    fn unknown_prefix_is_an_error() {
        let registry = PrefixRegistry::new();
        let table = TermTable::new();
        let config = ReconciliationConfig::default();
        let err = reconcile("nope:Thing", LabelRole::NonPredicate, &registry, &table, &config)
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownPrefix(p) if p == "nope"));
    }

    #[test]
    fn reconciles_close_label_to_reference_term() {
        // Scenario 3: diagram label "has Part", reference label "has part".
        let registry = registry_with("ex", "http://example.org/");
        let mut table = TermTable::new();
        let target = Term::Iri(IRI::new("http://example.org/hasPart").unwrap());
        table.insert("ex:hasPart", target.clone());
        table.insert("ex:has part", target.clone());
        let config = ReconciliationConfig::default();
        let result = reconcile("has Part", LabelRole::Predicate, &registry, &table, &config).unwrap();
        assert!(result.substituted);
        assert_eq!(result.iri.as_str(), "http://example.org/hasPart");
    }

    #[test]
    fn upper_camel_case_for_non_predicate() {
        assert_eq!(upper_camel_case("supply chain event"), "SupplyChainEvent");
    }

    #[test]
    fn lower_camel_case_for_predicate() {
        assert_eq!(lower_camel_case("has_part"), "hasPart");
    }

    #[test]
    fn splits_camel_case_and_digit_boundaries() {
        assert_eq!(split_camel_and_digits("Room2D"), "room 2 d");
        assert_eq!(split_camel_and_digits("HasPart"), "has part");
    }
}

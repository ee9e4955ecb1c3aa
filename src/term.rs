//! Terms: the semantic identifiers that flow through every component.
//!
//! A [`Term`] is either an IRI, a literal, or a blank node (`3. DATA MODEL`).
//! [`TermTable`] is the lexicon of known terms built once per run from the
//! reference ontologies and queried by the reconciler (`4.B Term table`).

use crate::fuzzy;
use crate::iri::IRI;
use std::collections::HashMap;

/// A semantic identifier: an IRI, a literal value, or a blank node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// A named resource.
    Iri(IRI),
    /// A value with a lexical form and optional language tag or datatype.
    Literal(Literal),
    /// An anonymous identifier, locally unique to one graph.
    BlankNode(String),
}

impl Term {
    pub fn as_iri(&self) -> Option<&IRI> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }
}

/// A typed or language-tagged literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub lexical_form: String,
    pub language: Option<String>,
    pub datatype: Option<IRI>,
}

impl Literal {
    pub fn simple(value: impl Into<String>) -> Self {
        Self {
            lexical_form: value.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: IRI) -> Self {
        Self {
            lexical_form: value.into(),
            language: None,
            datatype: Some(datatype),
        }
    }

    pub fn lang_tagged(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            lexical_form: value.into(),
            language: Some(lang.into()),
            datatype: None,
        }
    }
}

/// One hex-suffixed prefix minted by [`make_unique`] and stripped again by
/// [`strip_unique`] so that distinct literal occurrences sharing a lexical
/// value don't collapse onto a single graph node (`3. DATA MODEL`,
/// `Literal identity`).
const LITERAL_ID_PREFIX: &str = "literal_id-";

/// Rewrite a literal's lexical form with a fresh `literal_id-<hex>:` tag.
pub fn make_unique(lexical_form: &str, counter: u64) -> String {
    format!("{LITERAL_ID_PREFIX}{counter:x}:{lexical_form}")
}

/// Strip a `literal_id-<hex>:` tag previously added by [`make_unique`], if
/// present.
pub fn strip_unique(lexical_form: &str) -> &str {
    if let Some(rest) = lexical_form.strip_prefix(LITERAL_ID_PREFIX) {
        if let Some(colon) = rest.find(':') {
            let (hex, value) = rest.split_at(colon);
            if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return &value[1..];
            }
        }
    }
    lexical_form
}

/// The lexicon of known terms: search keys of the form `prefix:localname` or
/// `prefix:label` mapped to canonical terms (`4.B Term table`).
///
/// Insertion order is preserved per key so that [`TermTable::fuzzy`] can
/// break score ties deterministically by "first insertion wins".
#[derive(Debug, Clone, Default)]
pub struct TermTable {
    /// Search key -> (term, insertion order).
    entries: HashMap<String, (Term, usize)>,
    next_order: usize,
}

impl TermTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a search key for a term. If the key is already bound, the
    /// existing binding is kept (first insertion wins per `4.B`).
    pub fn insert(&mut self, key: impl Into<String>, term: Term) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return;
        }
        let order = self.next_order;
        self.next_order += 1;
        self.entries.insert(key, (term, order));
    }

    /// Exact lookup of a `prefix:localname` or `prefix:label` search key.
    pub fn exact(&self, key: &str) -> Option<&Term> {
        self.entries.get(key).map(|(term, _)| term)
    }

    /// Every registered search key together with its insertion order,
    /// for use by the fuzzy matcher.
    pub fn keys(&self) -> impl Iterator<Item = (&str, &Term, usize)> {
        self.entries
            .iter()
            .map(|(key, (term, order))| (key.as_str(), term, *order))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Score an ordered list of candidate keys against every registered
    /// search key via token-sort ratio, returning the term of the
    /// best-scoring key provided its score is at least `cutoff` (`4.B`).
    ///
    /// Ties are broken by insertion order: the first-registered search key
    /// wins.
    pub fn fuzzy<'a>(&self, candidate_keys: impl IntoIterator<Item = &'a str>, cutoff: f64) -> Option<&Term> {
        let haystack: Vec<(&str, usize, &Term)> = self
            .entries
            .iter()
            .map(|(key, (term, order))| (key.as_str(), *order, term))
            .collect();

        let best = fuzzy::best_match(
            candidate_keys,
            haystack.iter().map(|(key, order, _)| (*key, *order)),
        )?;

        if best.1 < cutoff {
            return None;
        }
        haystack
            .iter()
            .find(|(_, order, _)| *order == best.0)
            .map(|(_, _, term)| *term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_literal_round_trips() {
        let tagged = make_unique("42", 0xab);
        assert_eq!(tagged, "literal_id-ab:42");
        assert_eq!(strip_unique(&tagged), "42");
    }

    #[test]
    fn strip_unique_is_noop_on_plain_values() {
        assert_eq!(strip_unique("42"), "42");
    }

    #[test]
    fn first_insertion_wins_for_duplicate_keys() {
        let mut table = TermTable::new();
        let iri_a = Term::Iri(IRI::new("http://example.org/A").unwrap());
        let iri_b = Term::Iri(IRI::new("http://example.org/B").unwrap());
        table.insert("ex:thing", iri_a.clone());
        table.insert("ex:thing", iri_b);
        assert_eq!(table.exact("ex:thing"), Some(&iri_a));
    }
}

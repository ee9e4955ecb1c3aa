//! Graph->triples serialization: reifying predicate/class typing, aliases,
//! and domain/range axioms out of the core graph (`4.J Graph→triples
//! serializer`).

use std::collections::{HashMap, HashSet};

use crate::constants::{mds, owl, rdf, rdfs, skos};
use crate::graph::Graph;
use crate::term::Term;
use crate::triple::{Triple, TripleStore};

/// Namespaces that never get a synthesized `owl:ObjectProperty`/`owl:Class`
/// declaration; they already carry their meaning in the standard vocabulary.
const DEFAULT_NAMESPACES: &[&str] = &[rdf::NS, rdfs::NS, owl::NS, mds::NS, skos::NS];

fn iri_term(s: &str) -> Term {
    Term::Iri(crate::iri::IRI::new(s).expect("well-known vocabulary IRI"))
}

fn is_default_vocabulary(term: &Term) -> bool {
    match term {
        Term::Iri(iri) => DEFAULT_NAMESPACES.contains(&iri.namespace()),
        _ => false,
    }
}

/// Serialize `graph` to an RDF [`TripleStore`]. Prefix shortening for text
/// output is a separate concern, handled by the Turtle writer.
pub fn serialize(graph: &Graph) -> TripleStore {
    let mut store = TripleStore::new();

    let predicate_terms: HashSet<Term> = graph
        .edge_ids()
        .map(|id| graph.edge(id).predicate.clone())
        .collect();

    let mut class_terms: HashSet<Term> = HashSet::new();
    for node_id in graph.node_ids() {
        let data = graph.node(node_id);
        if data.is_class {
            class_terms.insert(data.term.clone());
        }
    }
    for edge_id in graph.edge_ids() {
        let edge = graph.edge(edge_id);
        if !edge.is_rank {
            continue;
        }
        class_terms.insert(graph.node(edge.source).term.clone());
        class_terms.insert(graph.node(edge.target).term.clone());
    }
    class_terms.retain(|t| !predicate_terms.contains(t));

    // Direct relationship triples.
    for edge_id in graph.edge_ids() {
        let edge = graph.edge(edge_id);
        let subject = graph.node(edge.source).term.clone();
        let object = graph.node(edge.target).term.clone();
        store.insert(Triple::new(subject, edge.predicate.clone(), object));
    }

    // Predicate and class typing.
    let type_pred = iri_term(rdf::TYPE);
    for predicate in &predicate_terms {
        if is_default_vocabulary(predicate) {
            continue;
        }
        store.insert(Triple::new(predicate.clone(), type_pred.clone(), iri_term(owl::OBJECT_PROPERTY)));
    }
    for class in &class_terms {
        if is_default_vocabulary(class) {
            continue;
        }
        store.insert(Triple::new(class.clone(), type_pred.clone(), iri_term(owl::CLASS)));
    }

    emit_aliases(graph, &mut store);
    emit_domains_and_ranges(graph, &predicate_terms, &class_terms, &mut store);

    store
}

/// Emit `rdfs:label`/`skos:altLabel` from each node's alias list, and a
/// reflexive `skos:exactMatch self` for terms resolved via term-table
/// substitution rather than minted fresh (`4.J`).
fn emit_aliases(graph: &Graph, store: &mut TripleStore) {
    let label_pred = iri_term(rdfs::LABEL);
    let alt_label_pred = iri_term(skos::ALT_LABEL);
    let exact_match_pred = iri_term(skos::EXACT_MATCH);

    for node_id in graph.node_ids() {
        let data = graph.node(node_id);
        if data.is_literal {
            continue;
        }
        if !data.label.is_empty() {
            store.insert(Triple::new(
                data.term.clone(),
                label_pred.clone(),
                Term::Literal(crate::term::Literal::simple(data.label.clone())),
            ));
        }
        for alias in &data.alt_labels {
            store.insert(Triple::new(
                data.term.clone(),
                alt_label_pred.clone(),
                Term::Literal(crate::term::Literal::simple(alias.clone())),
            ));
        }
        if data.is_substituted {
            store.insert(Triple::new(data.term.clone(), exact_match_pred.clone(), data.term.clone()));
        }
    }
}

/// For every predicate, reify its observed domain (distinct edge sources)
/// and range (distinct non-literal edge targets): a singleton attaches
/// directly via `rdfs:domain`/`rdfs:range`; more than one distinct term
/// gets wrapped in a blank-node `owl:unionOf` class (`4.J`).
///
/// The source this is grounded on (`graph_to_turtle.py`/`transforms.py`)
/// always builds the union wrapper regardless of cardinality; this crate's
/// spec is explicit that singletons attach directly, so that's what's
/// implemented here (see `DESIGN.md`).
fn emit_domains_and_ranges(
    graph: &Graph,
    predicate_terms: &HashSet<Term>,
    class_terms: &HashSet<Term>,
    store: &mut TripleStore,
) {
    let domain_pred = iri_term(rdfs::DOMAIN);
    let range_pred = iri_term(rdfs::RANGE);

    let mut domains: HashMap<Term, Vec<Term>> = HashMap::new();
    let mut ranges: HashMap<Term, Vec<Term>> = HashMap::new();

    for edge_id in graph.edge_ids() {
        let edge = graph.edge(edge_id);
        if !predicate_terms.contains(&edge.predicate) || edge.is_rank {
            continue;
        }
        let subject = graph.node(edge.source).term.clone();
        let object_data = graph.node(edge.target);
        if class_terms.contains(&subject) {
            let entry = domains.entry(edge.predicate.clone()).or_default();
            if !entry.contains(&subject) {
                entry.push(subject);
            }
        }
        if !object_data.is_literal && class_terms.contains(&object_data.term) {
            let entry = ranges.entry(edge.predicate.clone()).or_default();
            if !entry.contains(&object_data.term) {
                entry.push(object_data.term.clone());
            }
        }
    }

    let mut counter: u64 = 0;
    for (predicate, terms) in domains {
        emit_reified_axiom(store, &predicate, &domain_pred, terms, &mut counter);
    }
    for (predicate, terms) in ranges {
        emit_reified_axiom(store, &predicate, &range_pred, terms, &mut counter);
    }
}

fn emit_reified_axiom(store: &mut TripleStore, head: &Term, relation: &Term, terms: Vec<Term>, counter: &mut u64) {
    match terms.len() {
        0 => {}
        1 => store.insert(Triple::new(head.clone(), relation.clone(), terms.into_iter().next().unwrap())),
        _ => {
            *counter += 1;
            let class_node = Term::BlankNode(format!("domain-range-class-{counter:x}"));
            let list_head = build_rdf_list(store, &terms, counter);
            store.insert(Triple::new(class_node.clone(), iri_term(rdf::TYPE), iri_term(owl::CLASS)));
            store.insert(Triple::new(class_node.clone(), iri_term(owl::UNION_OF), list_head));
            store.insert(Triple::new(head.clone(), relation.clone(), class_node));
        }
    }
}

/// Build an `rdf:first`/`rdf:rest` list out of `items`, terminated by
/// `rdf:nil`, returning the list's head term.
fn build_rdf_list(store: &mut TripleStore, items: &[Term], counter: &mut u64) -> Term {
    let first_pred = iri_term(rdf::FIRST);
    let rest_pred = iri_term(rdf::REST);
    let nil = iri_term(rdf::NIL);

    let mut next = nil;
    for item in items.iter().rev() {
        *counter += 1;
        let node = Term::BlankNode(format!("list-node-{counter:x}"));
        store.insert(Triple::new(node.clone(), first_pred.clone(), item.clone()));
        store.insert(Triple::new(node.clone(), rest_pred.clone(), next));
        next = node;
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeData;
    use crate::iri::IRI;

    fn iri(s: &str) -> Term {
        Term::Iri(IRI::new(s).unwrap())
    }

    #[test]
    fn predicate_and_class_nodes_get_typed() {
        let mut graph = Graph::new();
        let mut dog = NodeData::new(iri("http://example.org/Dog"), "Dog");
        dog.is_class = true;
        let mut animal = NodeData::new(iri("http://example.org/Animal"), "Animal");
        animal.is_class = true;
        let a = graph.add_node(dog);
        let b = graph.add_node(animal);
        let edge_id = graph.add_edge(a, b, iri_term(rdfs::SUB_CLASS_OF), "subClassOf");
        graph.edge_mut(edge_id).is_rank = true;
        graph.edge_mut(edge_id).is_strat = true;
        graph.edge_mut(edge_id).is_predicate = true;

        let store = serialize(&graph);

        let type_pred = iri_term(rdf::TYPE);
        let class_triples: Vec<_> = store
            .with_predicate(&type_pred)
            .filter(|t| t.object == iri_term(owl::CLASS))
            .collect();
        assert_eq!(class_triples.len(), 2);
    }

    #[test]
    fn singleton_domain_attaches_directly() {
        let mut graph = Graph::new();
        let mut whole = NodeData::new(iri("http://example.org/Whole"), "Whole");
        whole.is_class = true;
        let mut part = NodeData::new(iri("http://example.org/Part"), "Part");
        part.is_class = true;
        let a = graph.add_node(whole);
        let b = graph.add_node(part);
        let edge_id = graph.add_edge(a, b, iri("http://example.org/hasPart"), "hasPart");
        graph.edge_mut(edge_id).is_predicate = true;

        let store = serialize(&graph);

        let domain_pred = iri_term(rdfs::DOMAIN);
        let domain_triples: Vec<_> = store.with_predicate(&domain_pred).collect();
        assert_eq!(domain_triples.len(), 1);
        assert_eq!(domain_triples[0].object, iri("http://example.org/Whole"));
    }

    #[test]
    fn multiple_domains_are_wrapped_in_a_union_class() {
        let mut graph = Graph::new();
        let mut whole = NodeData::new(iri("http://example.org/Whole"), "Whole");
        whole.is_class = true;
        let mut vehicle = NodeData::new(iri("http://example.org/Vehicle"), "Vehicle");
        vehicle.is_class = true;
        let mut part = NodeData::new(iri("http://example.org/Part"), "Part");
        part.is_class = true;
        let a = graph.add_node(whole);
        let v = graph.add_node(vehicle);
        let b = graph.add_node(part);
        let e1 = graph.add_edge(a, b, iri("http://example.org/hasPart"), "hasPart");
        graph.edge_mut(e1).is_predicate = true;
        let e2 = graph.add_edge(v, b, iri("http://example.org/hasPart"), "hasPart");
        graph.edge_mut(e2).is_predicate = true;

        let store = serialize(&graph);

        let domain_pred = iri_term(rdfs::DOMAIN);
        let domain_triples: Vec<_> = store.with_predicate(&domain_pred).collect();
        assert_eq!(domain_triples.len(), 1);
        assert!(domain_triples[0].object.is_blank());

        let union_pred = iri_term(owl::UNION_OF);
        assert_eq!(store.with_predicate(&union_pred).count(), 1);
    }

    #[test]
    fn alias_list_emits_label_and_alt_labels() {
        let mut graph = Graph::new();
        let mut data = NodeData::new(iri("http://example.org/Dog"), "Dog");
        data.alt_labels = vec!["Puppy".to_string(), "Canine".to_string()];
        graph.add_node(data);

        let store = serialize(&graph);

        let label_pred = iri_term(rdfs::LABEL);
        let alt_label_pred = iri_term(skos::ALT_LABEL);
        assert_eq!(store.with_predicate(&label_pred).count(), 1);
        assert_eq!(store.with_predicate(&alt_label_pred).count(), 2);
    }

    #[test]
    fn substituted_term_gets_reflexive_exact_match() {
        let mut graph = Graph::new();
        let mut data = NodeData::new(iri("http://example.org/Dog"), "Dog");
        data.is_substituted = true;
        graph.add_node(data);

        let store = serialize(&graph);
        let exact_match_pred = iri_term(skos::EXACT_MATCH);
        let matches: Vec<_> = store.with_predicate(&exact_match_pred).collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].subject, matches[0].object);
    }
}

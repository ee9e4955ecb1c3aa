//! RDF->graph translation: building the core graph from a parsed triple
//! store, classifying terms, and reifying axioms and collections
//! (`4.E RDF→graph translator`).

use std::collections::{HashMap, HashSet};

use crate::constants::{mds, owl, rdf, rdfs, skos};
use crate::graph::{Graph, NodeData, NodeId};
use crate::prefix::PrefixRegistry;
use crate::term::{self, Literal, Term};
use crate::triple::{Triple, TripleStore};

/// Namespaces whose members are considered default vocabulary and excluded
/// from the display set unless exempted (`4.E` steps 2, 6).
const DEFAULT_NAMESPACES: &[&str] = &[rdf::NS, rdfs::NS, owl::NS, mds::NS, skos::NS];

fn is_default_vocabulary(term: &Term) -> bool {
    match term {
        Term::Iri(iri) => DEFAULT_NAMESPACES.contains(&iri.namespace()),
        _ => false,
    }
}

fn iri_term(s: &str) -> Term {
    Term::Iri(crate::iri::IRI::new(s).expect("well-known vocabulary IRI"))
}

/// Tuning specific to the RDF->graph direction.
#[derive(Debug, Clone)]
pub struct RdfTranslateOptions {
    /// When set, only the class hierarchy (`rdfs:subClassOf`/`rdf:type`) is
    /// extracted; instances, literals, and other predicates are skipped, and
    /// no `StructuralDiagramError` validation applies (`7. ERROR HANDLING`).
    pub classes_only: bool,
    /// Rewrite each literal occurrence with a unique `literal_id-<hex>:` tag
    /// so repeated lexical values don't collapse onto one graph node
    /// (`3. DATA MODEL`, Literal identity).
    pub unique_literals: bool,
    /// Predicates that induce `is_rank` on an edge.
    pub rank_predicates: HashSet<Term>,
    /// Additional stratifying predicates contributed by reference files,
    /// over and above the rank predicates and the file's own annotation-
    /// and datatype-property declarations (`4.E` step 4).
    pub reference_strat_predicates: HashSet<Term>,
    /// Terms transitively reachable from the configured root property
    /// families; kept in the display set even if they're default
    /// vocabulary (`4.E` step 6).
    pub exempted_terms: HashSet<Term>,
}

impl Default for RdfTranslateOptions {
    fn default() -> Self {
        Self {
            classes_only: false,
            unique_literals: true,
            rank_predicates: [iri_term(rdfs::SUB_CLASS_OF), iri_term(rdf::TYPE)]
                .into_iter()
                .collect(),
            reference_strat_predicates: HashSet::new(),
            exempted_terms: HashSet::new(),
        }
    }
}

/// Build the core graph from `store`, relabeling terms to prefixed-name form
/// on the way out.
///
/// `file_prefixes` are the `@prefix` declarations found in the input file
/// itself (`4.E` step 1); they're merged into `registry` before anything
/// else, and `registry` is expected to already have [`PrefixRegistry::synthesize_residuals`]
/// run over every namespace `store` mentions once this returns, if callers
/// plan to call [`PrefixRegistry::shorten`] elsewhere.
pub fn translate(
    store: &TripleStore,
    file_prefixes: &[(String, String)],
    registry: &mut PrefixRegistry,
    options: &RdfTranslateOptions,
) -> Graph {
    for (prefix, ns) in file_prefixes {
        registry.bind(prefix.clone(), ns.clone());
    }
    let namespaces: Vec<String> = store
        .iter()
        .flat_map(|t| [&t.subject, &t.predicate, &t.object])
        .filter_map(|t| t.as_iri())
        .map(|iri| iri.namespace().to_string())
        .collect();
    registry.synthesize_residuals(namespaces.iter().map(String::as_str));

    // Step 5/6: optionally rewrite literal occurrences to unique terms
    // before anything downstream keys off them.
    let store = if options.unique_literals {
        uniquify_literals(store)
    } else {
        store.clone()
    };

    let type_pred = iri_term(rdf::TYPE);
    let sub_class_of = iri_term(rdfs::SUB_CLASS_OF);
    let sub_property_of = iri_term(rdfs::SUB_PROPERTY_OF);
    let label_pred = iri_term(rdfs::LABEL);
    let alt_label_pred = iri_term(skos::ALT_LABEL);

    // Step 2: classes.
    let mut classes: HashSet<Term> = HashSet::new();
    for t in store.iter() {
        if t.predicate == sub_class_of || t.predicate == sub_property_of {
            classes.insert(t.subject.clone());
            classes.insert(t.object.clone());
        }
        if t.predicate == type_pred {
            classes.insert(t.object.clone());
        }
    }
    classes.retain(|t| !is_default_vocabulary(t) || options.exempted_terms.contains(t));

    // Step 3: instances.
    let mut instances: HashSet<Term> = HashSet::new();
    if !options.classes_only {
        for t in store.iter() {
            if t.predicate == type_pred && !classes.contains(&t.subject) {
                instances.insert(t.subject.clone());
            }
        }
    }

    // Step 4: predicates.
    let mut predicates: HashSet<Term> = HashSet::new();
    let mut literals: HashSet<Term> = HashSet::new();
    if options.classes_only {
        predicates.insert(sub_class_of.clone());
        predicates.insert(type_pred.clone());
    } else {
        let meta_classes = [
            iri_term(owl::ANNOTATION_PROPERTY),
            iri_term(owl::DATATYPE_PROPERTY),
            iri_term(owl::OBJECT_PROPERTY),
        ];
        let property_terms = transitive_type_subjects(&store, &meta_classes, &type_pred);
        predicates.extend(property_terms);
        predicates.extend(options.rank_predicates.iter().cloned());
        predicates.extend(options.reference_strat_predicates.iter().cloned());
        for t in store.iter() {
            if t.subject == t.object {
                predicates.remove(&t.predicate);
            }
        }
        predicates.remove(&label_pred);
        predicates.remove(&alt_label_pred);

        for t in store.iter() {
            if t.object.is_literal() {
                literals.insert(t.object.clone());
            }
        }
    }

    // Step 6: display set.
    let mut display_set: HashSet<Term> = classes.clone();
    display_set.extend(instances.iter().cloned());
    display_set.extend(literals.iter().cloned());
    display_set.extend(options.exempted_terms.iter().cloned());
    display_set.retain(|t| !is_default_vocabulary(t) || options.exempted_terms.contains(t));

    // Step 7/8: one edge per qualifying triple.
    let mut graph = Graph::new();
    let mut node_ids: HashMap<Term, NodeId> = HashMap::new();
    let strat_predicates: HashSet<Term> = options
        .rank_predicates
        .iter()
        .chain(options.reference_strat_predicates.iter())
        .cloned()
        .collect();

    for t in store.iter() {
        if display_set.contains(&t.subject) && display_set.contains(&t.object) && predicates.contains(&t.predicate) {
            let source = get_or_add(&mut graph, &mut node_ids, &classes, &instances, &t.subject);
            let target = get_or_add(&mut graph, &mut node_ids, &classes, &instances, &t.object);
            let _ = get_or_add(&mut graph, &mut node_ids, &classes, &instances, &t.predicate);
            let edge_id = graph.add_edge(source, target, t.predicate.clone(), predicate_label(&t.predicate));
            let edge = graph.edge_mut(edge_id);
            edge.is_predicate = true;
            edge.is_strat = strat_predicates.contains(&t.predicate);
            edge.is_rank = options.rank_predicates.contains(&t.predicate);
        }
    }

    // Step 9: axiom extraction over `rdfs:domain`/`rdfs:range`.
    let domain_pred = iri_term(rdfs::DOMAIN);
    let range_pred = iri_term(rdfs::RANGE);
    for t in store.iter() {
        if t.predicate != domain_pred && t.predicate != range_pred {
            continue;
        }
        let subj_ok = !is_default_vocabulary(&t.subject) || options.exempted_terms.contains(&t.subject);
        let obj_ok = !is_default_vocabulary(&t.object) || options.exempted_terms.contains(&t.object);
        if !subj_ok || !obj_ok {
            continue;
        }
        let source = get_or_add(&mut graph, &mut node_ids, &classes, &instances, &t.subject);
        let target = get_or_add(&mut graph, &mut node_ids, &classes, &instances, &t.object);
        graph.node_mut(source).is_axiom = true;
        graph.node_mut(target).is_axiom = true;
        let edge_id = graph.add_edge(source, target, t.predicate.clone(), predicate_label(&t.predicate));
        graph.edge_mut(edge_id).is_axiom = true;
    }

    // Step 10: collection extraction (`rdf:first`/`rdf:rest` lists).
    extract_collections(&mut graph, &mut node_ids, &store);

    // Step 11: multi-object syntactic sugar over the edges just built.
    collapse_multi_objects(&mut graph);

    apply_aliases(&mut graph, &store, &classes, &instances);
    relabel_to_prefixed_names(&mut graph, registry);

    graph
}

/// Look up or create the node for `term`, classifying it as it's created.
fn get_or_add(
    graph: &mut Graph,
    node_ids: &mut HashMap<Term, NodeId>,
    classes: &HashSet<Term>,
    instances: &HashSet<Term>,
    term: &Term,
) -> NodeId {
    if let Some(&id) = node_ids.get(term) {
        return id;
    }
    let mut data = NodeData::new(term.clone(), String::new());
    data.is_class = classes.contains(term);
    data.is_instance = instances.contains(term);
    data.is_literal = term.is_literal();
    data.is_in_diagram = true;
    let id = graph.add_node(data);
    node_ids.insert(term.clone(), id);
    id
}

/// The transitive closure, under `rdf:type`, of subjects reachable from the
/// given meta-classes (`4.E` step 4): every subject whose type is one of the
/// meta-classes, plus every subject whose type is itself such a subject, and
/// so on.
fn transitive_type_subjects(store: &TripleStore, roots: &[Term], type_pred: &Term) -> HashSet<Term> {
    let mut frontier: Vec<Term> = roots.to_vec();
    let mut closure: HashSet<Term> = HashSet::new();
    while let Some(class) = frontier.pop() {
        for t in store.iter() {
            if &t.predicate == type_pred && &t.object == &class && closure.insert(t.subject.clone()) {
                frontier.push(t.subject.clone());
            }
        }
    }
    closure
}

fn uniquify_literals(store: &TripleStore) -> TripleStore {
    let mut out = TripleStore::new();
    let mut counter: u64 = 0;
    for t in store.iter() {
        let object = match &t.object {
            Term::Literal(lit) => {
                let tagged = term::make_unique(&lit.lexical_form, counter);
                counter += 1;
                Term::Literal(Literal {
                    lexical_form: tagged,
                    language: lit.language.clone(),
                    datatype: lit.datatype.clone(),
                })
            }
            other => other.clone(),
        };
        out.insert(Triple::new(t.subject.clone(), t.predicate.clone(), object));
    }
    out
}

fn predicate_label(term: &Term) -> String {
    match term {
        Term::Iri(iri) => iri.as_str().to_string(),
        Term::BlankNode(id) => format!("_:{id}"),
        Term::Literal(lit) => lit.lexical_form.clone(),
    }
}

/// Walk `rdf:first`/`rdf:rest` lists, reifying each as a
/// `mds:CollectionType`/`mds:hasCollectionMember` pair of edge groups
/// (`4.E` step 10).
fn extract_collections(graph: &mut Graph, node_ids: &mut HashMap<Term, NodeId>, store: &TripleStore) {
    let first_pred = iri_term(rdf::FIRST);
    let rest_pred = iri_term(rdf::REST);
    let nil = iri_term(rdf::NIL);
    let collection_type_preds = [
        iri_term(owl::UNION_OF),
        iri_term(owl::INTERSECTION_OF),
        iri_term(owl::COMPLEMENT_OF),
    ];

    let first_of: HashMap<Term, Term> = store
        .with_predicate(&first_pred)
        .map(|t| (t.subject.clone(), t.object.clone()))
        .collect();
    let rest_of: HashMap<Term, Term> = store
        .with_predicate(&rest_pred)
        .map(|t| (t.subject.clone(), t.object.clone()))
        .collect();

    let heads: Vec<Term> = first_of.keys().cloned().collect();

    for head in &heads {
        let mut members = Vec::new();
        let mut cursor = head.clone();
        let mut guard = 0usize;
        loop {
            guard += 1;
            if guard > first_of.len() + 1 {
                break; // malformed cyclic list; stop rather than loop forever
            }
            let Some(member) = first_of.get(&cursor) else { break };
            let resolved = if member.is_blank() {
                collection_type_preds
                    .iter()
                    .find_map(|p| store.with_predicate(p).find(|t| &t.subject == member).map(|t| t.object.clone()))
                    .unwrap_or_else(|| member.clone())
            } else {
                member.clone()
            };
            members.push(resolved);
            match rest_of.get(&cursor) {
                Some(next) if next != &nil => cursor = next.clone(),
                _ => break,
            }
        }

        let collection_type = collection_type_preds
            .iter()
            .find(|p| store.with_predicate(p).any(|t| &t.object == head))
            .cloned();

        let head_id = node_or_new(graph, node_ids, head, true);
        for member in &members {
            let member_id = node_or_new(graph, node_ids, member, false);
            let edge_id = graph.add_edge(head_id, member_id, iri_term(mds::HAS_COLLECTION_MEMBER), mds::HAS_COLLECTION_MEMBER);
            let edge = graph.edge_mut(edge_id);
            edge.is_collection = true;
        }
        if let Some(collection_type) = collection_type {
            let type_id = node_or_new(graph, node_ids, &collection_type, true);
            let edge_id = graph.add_edge(type_id, head_id, iri_term(mds::COLLECTION_TYPE), mds::COLLECTION_TYPE);
            let edge = graph.edge_mut(edge_id);
            edge.is_axiom = true;
            edge.is_collection = true;
        }
    }
}

fn node_or_new(graph: &mut Graph, node_ids: &mut HashMap<Term, NodeId>, term: &Term, is_collection: bool) -> NodeId {
    if let Some(&id) = node_ids.get(term) {
        if is_collection {
            graph.node_mut(id).is_collection = true;
        }
        return id;
    }
    let mut data = NodeData::new(term.clone(), String::new());
    data.is_collection = is_collection;
    data.is_literal = term.is_literal();
    data.is_in_diagram = true;
    let id = graph.add_node(data);
    node_ids.insert(term.clone(), id);
    id
}

/// Fold every `(subject, predicate)` pair with more than one object into a
/// single anonymous `mds:TripleSyntaxSugar` collection node (`4.E` step 11).
fn collapse_multi_objects(graph: &mut Graph) {
    let mut groups: HashMap<(NodeId, Term), Vec<crate::graph::EdgeId>> = HashMap::new();
    for edge_id in graph.edge_ids() {
        let edge = graph.edge(edge_id);
        if edge.is_collection || edge.is_axiom || edge.is_rank || edge.is_strat {
            continue;
        }
        groups
            .entry((edge.source, edge.predicate.clone()))
            .or_default()
            .push(edge_id);
    }

    let mut counter: u64 = 0;
    for ((source, predicate_term), edge_ids) in groups {
        if edge_ids.len() < 2 {
            continue;
        }
        counter += 1;
        let sugar_term = Term::BlankNode(format!("triple-syntax-sugar-{counter:x}"));
        let mut sugar_data = NodeData::new(sugar_term, String::new());
        sugar_data.is_collection = true;
        sugar_data.is_axiom = true;
        let sugar_id = graph.add_node(sugar_data);

        let mut members = Vec::new();
        let wrapper_label = graph.edge(edge_ids[0]).label.clone();
        for &edge_id in &edge_ids {
            let edge = graph.edge(edge_id);
            members.push(edge.target);
            graph.remove_edge(edge_id);
        }
        let wrapper_id = graph.add_edge(source, sugar_id, predicate_term, wrapper_label);
        graph.edge_mut(wrapper_id).is_predicate = true;
        for target in members {
            let edge_id = graph.add_edge(sugar_id, target, iri_term(mds::HAS_COLLECTION_MEMBER), mds::HAS_COLLECTION_MEMBER);
            graph.edge_mut(edge_id).is_collection = true;
        }
    }
}

/// Collect each node's alias list from `rdfs:label`/`skos:altLabel` triples
/// in `store`, grouped by subject in encounter order. Display-label
/// computation itself happens in [`relabel_to_prefixed_names`], which also
/// needs the prefix registry.
fn apply_aliases(
    graph: &mut Graph,
    store: &TripleStore,
    classes: &HashSet<Term>,
    instances: &HashSet<Term>,
) {
    let label_pred = iri_term(rdfs::LABEL);
    let alt_label_pred = iri_term(skos::ALT_LABEL);
    let mut aliases: HashMap<Term, Vec<String>> = HashMap::new();
    for t in store.with_predicate(&label_pred).chain(store.with_predicate(&alt_label_pred)) {
        if let Term::Literal(lit) = &t.object {
            aliases.entry(t.subject.clone()).or_default().push(term::strip_unique(&lit.lexical_form).to_string());
        }
    }

    for node_id in graph.node_ids().collect::<Vec<_>>() {
        let term = graph.node(node_id).term.clone();
        let term_aliases = aliases.get(&term).cloned().unwrap_or_default();
        let is_class_or_instance = classes.contains(&term) || instances.contains(&term);
        let data = graph.node_mut(node_id);
        if term_aliases.is_empty() {
            continue;
        }
        if is_class_or_instance {
            data.alt_labels = term_aliases;
        } else {
            data.label = term_aliases[0].clone();
            data.alt_labels = term_aliases[1..].to_vec();
        }
    }
}

/// Final step of `4.E`: relabel every node and edge from raw IRI to
/// prefixed-name form, attaching the alias list in parentheses for classes
/// and instances, or substituting the first alias for predicate names
/// (already done for predicate-role nodes in [`apply_aliases`]; here we only
/// fill in the nodes/edges that step left untouched: classes, instances,
/// and the edges carrying a predicate's own prefixed name).
fn relabel_to_prefixed_names(graph: &mut Graph, registry: &PrefixRegistry) {
    for node_id in graph.node_ids().collect::<Vec<_>>() {
        let data = graph.node_mut(node_id);
        let Term::Iri(iri) = &data.term else { continue };
        if !data.label.is_empty() {
            continue;
        }
        let base = registry.shorten(iri.as_str()).unwrap_or_else(|_| iri.as_str().to_string());
        data.label = if data.alt_labels.is_empty() {
            base
        } else {
            format!("{base} ({})", data.alt_labels.join(", "))
        };
    }

    for edge_id in graph.edge_ids().collect::<Vec<_>>() {
        let edge = graph.edge(edge_id);
        let predicate_name = match &edge.predicate {
            Term::Iri(iri) => registry.shorten(iri.as_str()).unwrap_or_else(|_| iri.as_str().to_string()),
            _ => continue,
        };
        graph.edge_mut(edge_id).label = predicate_name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iri::IRI;

    fn iri(s: &str) -> Term {
        Term::Iri(IRI::new(s).unwrap())
    }

    #[test]
    fn simple_subclass_triple_becomes_one_rank_edge() {
        // Scenario 1: {(:A rdfs:subClassOf :B)}.
        let mut store = TripleStore::new();
        store.insert(Triple::new(
            iri("http://example.org/A"),
            iri_term(rdfs::SUB_CLASS_OF),
            iri("http://example.org/B"),
        ));
        let mut registry = PrefixRegistry::new();
        registry.bind("ex", "http://example.org/");
        let options = RdfTranslateOptions::default();
        let graph = translate(&store, &[], &mut registry, &options);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let edge_id = graph.edge_ids().next().unwrap();
        let edge = graph.edge(edge_id);
        assert!(edge.is_rank);
        assert!(edge.is_strat);
        let a = graph.node(edge.source);
        let b = graph.node(edge.target);
        assert!(a.is_class);
        assert!(b.is_class);
    }

    #[test]
    fn literal_occurrences_stay_distinct_when_unique() {
        // Scenario 6: repeated literal "42"^^xsd:integer.
        let mut store = TripleStore::new();
        let subj_a = iri("http://example.org/A");
        let subj_b = iri("http://example.org/B");
        let pred = iri("http://example.org/hasValue");
        store.insert(Triple::new(
            subj_a.clone(),
            iri_term(rdf::TYPE),
            iri("http://example.org/Thing"),
        ));
        store.insert(Triple::new(
            subj_b.clone(),
            iri_term(rdf::TYPE),
            iri("http://example.org/Thing"),
        ));
        let literal = Term::Literal(Literal::typed("42", IRI::new("http://www.w3.org/2001/XMLSchema#integer").unwrap()));
        store.insert(Triple::new(subj_a, pred.clone(), literal.clone()));
        store.insert(Triple::new(subj_b, pred, literal));

        let mut registry = PrefixRegistry::new();
        registry.bind("ex", "http://example.org/");
        let mut options = RdfTranslateOptions::default();
        options.rank_predicates.insert(iri("http://example.org/hasValue"));
        let graph = translate(&store, &[], &mut registry, &options);

        let literal_nodes: Vec<_> = graph
            .node_ids()
            .filter(|&n| graph.node(n).is_literal)
            .collect();
        assert_eq!(literal_nodes.len(), 2);
        assert_ne!(graph.node(literal_nodes[0]).term, graph.node(literal_nodes[1]).term);
    }

    #[test]
    fn domain_range_triples_are_marked_axiomatic() {
        let mut store = TripleStore::new();
        let p = iri("http://example.org/hasPart");
        store.insert(Triple::new(p.clone(), iri_term(rdfs::DOMAIN), iri("http://example.org/Whole")));
        let mut registry = PrefixRegistry::new();
        registry.bind("ex", "http://example.org/");
        let options = RdfTranslateOptions::default();
        let graph = translate(&store, &[], &mut registry, &options);
        let edge_id = graph.edge_ids().find(|&e| graph.edge(e).is_axiom).unwrap();
        assert!(graph.edge(edge_id).is_axiom);
    }

    #[test]
    fn multiple_objects_for_same_predicate_collapse_into_a_collection() {
        let mut store = TripleStore::new();
        let subj = iri("http://example.org/A");
        let pred = iri("http://example.org/related");
        store.insert(Triple::new(subj.clone(), iri_term(rdf::TYPE), iri("http://example.org/Thing")));
        store.insert(Triple::new(iri("http://example.org/X"), iri_term(rdf::TYPE), iri("http://example.org/Thing")));
        store.insert(Triple::new(iri("http://example.org/Y"), iri_term(rdf::TYPE), iri("http://example.org/Thing")));
        store.insert(Triple::new(subj.clone(), pred.clone(), iri("http://example.org/X")));
        store.insert(Triple::new(subj, pred.clone(), iri("http://example.org/Y")));

        let mut registry = PrefixRegistry::new();
        registry.bind("ex", "http://example.org/");
        let mut options = RdfTranslateOptions::default();
        options.rank_predicates.insert(pred);
        let graph = translate(&store, &[], &mut registry, &options);

        let collection_nodes: Vec<_> = graph.node_ids().filter(|&n| graph.node(n).is_collection).collect();
        assert_eq!(collection_nodes.len(), 1);
    }
}

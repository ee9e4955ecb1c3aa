//! Wires the ten core components into the two end-to-end data flows
//! (`2. SYSTEM OVERVIEW`): forward (diagram -> RDF) runs
//! `F -> C (via A,B) -> D -> J`, reverse (RDF -> diagram) runs
//! `E -> D -> G -> H -> I`. Reading/writing the diagram XML and downloading
//! reference ontologies are collaborator concerns handled by the CLI
//! front-end; this module takes already-parsed Turtle text and diagram
//! cells and hands back already-built Turtle text or laid-out cells.

use std::collections::HashSet;

use crate::config::BridgeConfig;
use crate::connector::{self, Attachment, ConnectorKind};
use crate::constants::{owl, rdf, rdfs, skos};
use crate::decomposer::{self, SeveredEdge, Tree};
use crate::diagram::DiagramCell;
use crate::diagram_translator;
use crate::error::BridgeResult;
use crate::graph::{Graph, NodeId};
use crate::layout::{self, Layout};
use crate::prefix::PrefixRegistry;
use crate::rdf_translator::{self, RdfTranslateOptions};
use crate::serializer;
use crate::term::{Term, TermTable};
use crate::triple::TripleStore;
use crate::turtle;

fn iri_term(s: &str) -> Term {
    Term::Iri(crate::iri::IRI::new(s).expect("well-known vocabulary IRI"))
}

/// A reference or defaults folder, already read from disk into text by the
/// caller (`6. EXTERNAL INTERFACES`).
pub struct ReferenceFile {
    pub name: String,
    pub content: String,
}

/// Parse every reference/defaults file, binding their `@prefix` directives
/// into `registry` and returning the resulting triple stores alongside the
/// source file name (so parse errors can be attributed).
fn parse_reference_files(files: &[ReferenceFile], registry: &mut PrefixRegistry) -> BridgeResult<Vec<TripleStore>> {
    let mut stores = Vec::with_capacity(files.len());
    for file in files {
        let store = turtle::parse(&file.content, registry)
            .map_err(|e| crate::error::BridgeError::ParseError(format!("{}: {e}", file.name)))?;
        stores.push(store);
    }
    Ok(stores)
}

/// Register every IRI appearing in `store`, plus any `rdfs:label`/
/// `skos:altLabel` attached to it, as a search key in `table`
/// (`3. DATA MODEL`, Term table, points (b) and (c)).
fn populate_term_table(store: &TripleStore, registry: &PrefixRegistry, table: &mut TermTable) {
    let label_pred = iri_term(rdfs::LABEL);
    let alt_label_pred = iri_term(skos::ALT_LABEL);

    for subject in store.subjects() {
        let Term::Iri(iri) = subject else { continue };
        let Ok(key) = registry.shorten(iri.as_str()) else {
            continue;
        };
        table.insert(key, subject.clone());

        for triple in store.subject(subject) {
            if triple.predicate != label_pred && triple.predicate != alt_label_pred {
                continue;
            }
            if let Term::Literal(literal) = &triple.object {
                let (prefix, _) = key.split_once(':').unwrap_or((key.as_str(), ""));
                table.insert(format!("{prefix}:{}", literal.lexical_form), subject.clone());
            }
        }
    }
}

/// Build the term table from reference and defaults stores: default
/// namespace member terms are registered implicitly by the default prefix
/// bindings every [`PrefixRegistry`] is seeded with.
fn build_term_table<'a>(stores: impl IntoIterator<Item = &'a TripleStore>, registry: &PrefixRegistry) -> TermTable {
    let mut table = TermTable::new();
    for store in stores {
        populate_term_table(store, registry, &mut table);
    }
    table
}

/// Collect the canonical rank-term labels from the defaults folder: each
/// subject's `rdfs:label`, falling back to its shortened prefixed name
/// (`6. EXTERNAL INTERFACES`, defaults folder).
fn rank_labels(defaults_stores: &[TripleStore], registry: &PrefixRegistry) -> Vec<String> {
    let label_pred = iri_term(rdfs::LABEL);
    let mut labels = Vec::new();
    for store in defaults_stores {
        for subject in store.subjects() {
            let mut found_label = false;
            for triple in store.subject(subject) {
                if triple.predicate == label_pred {
                    if let Term::Literal(literal) = &triple.object {
                        labels.push(literal.lexical_form.clone());
                        found_label = true;
                    }
                }
            }
            if !found_label {
                if let Term::Iri(iri) = subject {
                    if let Ok(key) = registry.shorten(iri.as_str()) {
                        labels.push(key);
                    }
                }
            }
        }
    }
    labels
}

/// Predicates declared `owl:AnnotationProperty`/`owl:DatatypeProperty` in a
/// reference or defaults file, contributed as additional stratifying
/// predicates over and above the configured rank set (`4.E` step 4).
fn reference_strat_predicates(stores: &[TripleStore]) -> HashSet<Term> {
    let type_pred = iri_term(rdf::TYPE);
    let annotation = iri_term(owl::ANNOTATION_PROPERTY);
    let datatype = iri_term(owl::DATATYPE_PROPERTY);
    let mut predicates = HashSet::new();
    for store in stores {
        for triple in store.iter() {
            if triple.predicate == type_pred && (triple.object == annotation || triple.object == datatype) {
                predicates.insert(triple.subject.clone());
            }
        }
    }
    predicates
}

fn synthesize_from_store(store: &TripleStore, registry: &mut PrefixRegistry) {
    let namespaces: Vec<String> = store
        .iter()
        .flat_map(|t| [&t.subject, &t.predicate, &t.object])
        .filter_map(|t| t.as_iri())
        .map(|iri| iri.namespace().to_string())
        .collect();
    registry.synthesize_residuals(namespaces.iter().map(String::as_str));
}

/// Forward flow: `F -> C (via A,B) -> D -> J`. Translates a diagram into
/// Turtle text, reconciling its labels against the reference/defaults
/// folders' term table.
pub fn diagram_to_turtle(
    cells: &[DiagramCell],
    user_prefixes: &[(String, String)],
    reference_files: &[ReferenceFile],
    defaults_files: &[ReferenceFile],
    config: &BridgeConfig,
) -> BridgeResult<String> {
    let mut registry = PrefixRegistry::new();
    for (prefix, namespace) in user_prefixes {
        registry.bind(prefix.clone(), namespace.clone());
    }

    let reference_stores = parse_reference_files(reference_files, &mut registry)?;
    let defaults_stores = parse_reference_files(defaults_files, &mut registry)?;

    let table = build_term_table(reference_stores.iter().chain(defaults_stores.iter()), &registry);
    let ranks = rank_labels(&defaults_stores, &registry);
    let rank_label_refs: Vec<&str> = ranks.iter().map(String::as_str).collect();

    let graph = diagram_translator::translate(cells, &registry, &table, &rank_label_refs, config)?;
    let triples = serializer::serialize(&graph);
    synthesize_from_store(&triples, &mut registry);
    turtle::write(&triples, &registry)
}

/// The reverse flow's output: a forest of laid-out trees, the edges severed
/// to produce the forest, and the per-edge connector attachments keyed by
/// the edge's id in the tree it was laid out in.
pub struct ReverseResult {
    pub trees: Vec<Tree>,
    pub layout: Layout,
    pub severed: Vec<SeveredEdge>,
    /// The pre-decomposition rank/strat subgraph `severed`'s node ids are
    /// expressed against, kept around so a severed edge's endpoints can be
    /// resolved back to a tree/placement by term identity (`4.G`).
    strat_graph: Graph,
}

/// Reverse flow: `E -> D -> G -> H -> I`. Translates Turtle text into a
/// laid-out forest ready for diagram cell assembly.
pub fn turtle_to_diagram(
    input: &str,
    user_prefixes: &[(String, String)],
    reference_files: &[ReferenceFile],
    defaults_files: &[ReferenceFile],
    config: &BridgeConfig,
) -> BridgeResult<ReverseResult> {
    let mut registry = PrefixRegistry::new();
    for (prefix, namespace) in user_prefixes {
        registry.bind(prefix.clone(), namespace.clone());
    }

    let reference_stores = parse_reference_files(reference_files, &mut registry)?;
    let defaults_stores = parse_reference_files(defaults_files, &mut registry)?;
    let strat_predicates = reference_strat_predicates(&reference_stores);

    let store = turtle::parse(input, &mut registry)
        .map_err(|e| crate::error::BridgeError::ParseError(format!("input file: {e}")))?;

    let mut rank_predicates: HashSet<Term> = config.graph.rank_predicates.iter().map(|s| iri_term(s)).collect();
    rank_predicates.extend(defaults_stores.iter().flat_map(|store| store.subjects().cloned()));

    let options = RdfTranslateOptions {
        classes_only: false,
        unique_literals: config.graph.unique_literals,
        rank_predicates,
        reference_strat_predicates: strat_predicates,
        exempted_terms: HashSet::new(),
    };

    let graph = rdf_translator::translate(&store, &[], &mut registry, &options);

    let strat = graph.strat_subgraph();
    let (trees, severed) = decomposer::decompose(&strat)?;
    let layout = layout::layout_forest(&trees, &config.layout);

    Ok(ReverseResult { trees, layout, severed, strat_graph: strat })
}

/// Assemble diagram cells from a laid-out forest: one vertex cell per node,
/// one edge cell per surviving tree edge plus one per severed edge
/// (ghost connectors, per `4.G`), with connector attachments from `4.I`
/// already resolved into the cell's geometry fields.
pub fn assemble_diagram_cells(result: &ReverseResult, config: &BridgeConfig) -> BridgeResult<Vec<PlacedCell>> {
    let mut cells = Vec::new();
    let mut next_id: u64 = 0;
    let mut fresh_id = || {
        let id = next_id;
        next_id += 1;
        format!("cell-{id}")
    };

    // Resolves a severed edge's original-graph endpoints back to a placed
    // cell and its pixel placement, by term identity (`4.G`).
    let mut cell_by_term: std::collections::HashMap<Term, (String, layout::Placement)> = std::collections::HashMap::new();

    for tree in &result.trees {
        let mut cell_ids: std::collections::HashMap<NodeId, String> = std::collections::HashMap::new();
        for node_id in tree.graph.node_ids() {
            let placement = *result.layout.get(node_id)?;
            let node = tree.graph.node(node_id);
            let id = fresh_id();
            cell_ids.insert(node_id, id.clone());
            cell_by_term.insert(node.term.clone(), (id.clone(), placement));
            cells.push(PlacedCell::Vertex {
                id,
                label: node.label.clone(),
                x: placement.pixel_x,
                y: placement.pixel_y,
                width: config.layout.shape_width,
                height: config.layout.shape_height,
            });
        }
        for edge_id in tree.graph.edge_ids() {
            let edge = tree.graph.edge(edge_id);
            let source_placement = result.layout.get(edge.source)?;
            let target_placement = result.layout.get(edge.target)?;
            let kind = if edge.is_strat { ConnectorKind::ClassOnlyOrStrat } else { ConnectorKind::Plain };
            let attachment = connector::attach(
                source_placement.pixel_x,
                source_placement.pixel_y,
                target_placement.pixel_x,
                target_placement.pixel_y,
                config.layout.shape_width,
                config.layout.shape_height,
                config.layout.horizontal,
                kind,
            );
            cells.push(PlacedCell::Edge {
                id: fresh_id(),
                source: cell_ids[&edge.source].clone(),
                target: cell_ids[&edge.target].clone(),
                label: edge.label.clone(),
                attachment,
                dashed: false,
            });
        }
    }

    // Severed edges (`4.G`) are redrawn as dashed ghost connectors once both
    // endpoints can be resolved back to a placed cell.
    for severed in &result.severed {
        let source_term = result.strat_graph.node(severed.source).term.clone();
        let target_term = result.strat_graph.node(severed.target).term.clone();
        let (Some((source_id, source_placement)), Some((target_id, target_placement))) =
            (cell_by_term.get(&source_term), cell_by_term.get(&target_term))
        else {
            continue;
        };
        let attachment = connector::attach(
            source_placement.pixel_x,
            source_placement.pixel_y,
            target_placement.pixel_x,
            target_placement.pixel_y,
            config.layout.shape_width,
            config.layout.shape_height,
            config.layout.horizontal,
            ConnectorKind::Plain,
        );
        cells.push(PlacedCell::Edge {
            id: fresh_id(),
            source: source_id.clone(),
            target: target_id.clone(),
            label: severed.label.clone(),
            attachment,
            dashed: true,
        });
    }

    Ok(cells)
}

/// A fully positioned diagram element, ready to be materialised into
/// `mxCell` XML by the diagram-writer collaborator.
pub enum PlacedCell {
    Vertex {
        id: String,
        label: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Edge {
        id: String,
        source: String,
        target: String,
        label: String,
        attachment: Attachment,
        dashed: bool,
    },
}

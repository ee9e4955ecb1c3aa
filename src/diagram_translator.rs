//! Diagram->graph translation: turning a flat list of `mxCell`s into the
//! core graph (`4.F Diagram→graph translator`).

use crate::config::{BridgeConfig, ReconciliationConfig};
use crate::diagram::DiagramCell;
use crate::error::BridgeResult;
use crate::graph::{Graph, NodeData, NodeId};
use crate::prefix::PrefixRegistry;
use crate::reconciler::{self, LabelRole};
use crate::term::TermTable;
use std::collections::HashMap;

/// Translate a flat cell list into a core graph.
///
/// `rank_table` supplies the canonical rank-term labels the relationship
/// labels are matched against (the defaults-folder term table, per
/// `6. EXTERNAL INTERFACES`).
pub fn translate(
    cells: &[DiagramCell],
    registry: &PrefixRegistry,
    term_table: &TermTable,
    rank_labels: &[&str],
    config: &BridgeConfig,
) -> BridgeResult<Graph> {
    let mut graph = Graph::new();
    let mut node_ids: HashMap<String, NodeId> = HashMap::new();
    let mut predicate_node_ids: HashMap<crate::term::Term, NodeId> = HashMap::new();

    // Promote edgeLabel cell values onto their parent edge cell.
    let mut promoted_labels: HashMap<String, String> = HashMap::new();
    for cell in cells {
        if cell.is_edge_label() {
            if let Some(parent) = &cell.parent {
                promoted_labels.insert(parent.clone(), cell.value.clone());
            }
        }
    }

    // Vertices become nodes.
    for cell in cells {
        if cell.is_vertex() {
            let reconciled = reconciler::reconcile(
                &cell.value,
                LabelRole::NonPredicate,
                registry,
                term_table,
                &config.reconciliation,
            )?;
            let mut data = NodeData::new(crate::term::Term::Iri(reconciled.iri), cell.value.clone());
            data.alt_labels = reconciled.aliases;
            let id = graph.add_node(data);
            node_ids.insert(cell.id.clone(), id);
        }
    }

    // Relationships (direct or via a promoted edgeLabel) become edges.
    for cell in cells {
        if cell.is_edge_label() {
            continue;
        }
        let (Some(source_id), Some(target_id)) = (&cell.source, &cell.target) else {
            continue;
        };
        let Some(&source) = node_ids.get(source_id) else {
            continue;
        };
        let Some(&target) = node_ids.get(target_id) else {
            continue;
        };

        let raw_label = promoted_labels
            .get(&cell.id)
            .cloned()
            .unwrap_or_else(|| cell.value.clone());
        let cleaned = clean_label(&raw_label);

        let reconciled = reconciler::reconcile(
            &cleaned,
            LabelRole::Predicate,
            registry,
            term_table,
            &config.reconciliation,
        )?;

        let rank_match = rank_labels
            .iter()
            .map(|&candidate| (candidate, crate::fuzzy::token_sort_ratio(&cleaned, candidate)))
            .filter(|(_, score)| *score > 85.0)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

        let (edge_label, is_rank) = match rank_match {
            Some((canonical, _)) => (canonical.to_string(), true),
            None => (cleaned.clone(), false),
        };

        let (final_source, final_target) = if is_rank && config.graph.invert_rank_arrows {
            (target, source)
        } else {
            (source, target)
        };

        let predicate_term = crate::term::Term::Iri(reconciled.iri);

        // Every edge label is also a first-class term (`8. TESTABLE
        // PROPERTIES`): register the predicate as a node, deduplicated by
        // its reconciled IRI, alongside the edge it labels.
        predicate_node_ids.entry(predicate_term.clone()).or_insert_with(|| {
            let mut data = NodeData::new(predicate_term.clone(), edge_label.clone());
            data.alt_labels = reconciled.aliases.clone();
            graph.add_node(data)
        });

        let edge_id = graph.add_edge(final_source, final_target, predicate_term, edge_label);
        let edge = graph.edge_mut(edge_id);
        edge.is_predicate = true;
        edge.is_rank = is_rank;
        // `is_rank ⇒ is_strat` (`3. DATA MODEL`); a diagram carries no other
        // source of stratifying annotations, so strat coincides with rank.
        edge.is_strat = is_rank;
    }

    Ok(graph)
}

/// Strip whitespace and any HTML the diagram editor may have embedded in a
/// label value.
fn clean_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_tag = false;
    for c in raw.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::Style;

    fn vertex(id: &str, value: &str) -> DiagramCell {
        DiagramCell {
            id: id.to_string(),
            parent: None,
            source: None,
            target: None,
            value: value.to_string(),
            style: Style::parse("rounded=1"),
        }
    }

    fn edge(id: &str, source: &str, target: &str, value: &str) -> DiagramCell {
        DiagramCell {
            id: id.to_string(),
            parent: None,
            source: Some(source.to_string()),
            target: Some(target.to_string()),
            value: value.to_string(),
            style: Style::parse("endArrow=block"),
        }
    }

    #[test]
    fn vertices_become_nodes_and_edges_link_them() {
        let cells = vec![
            vertex("1", "Person"),
            vertex("2", "Organization"),
            edge("3", "1", "2", "has Part"),
        ];
        let registry = PrefixRegistry::new();
        let table = TermTable::new();
        let config = BridgeConfig::default();
        let graph = translate(&cells, &registry, &table, &[], &config).unwrap();
        // Two vertices plus one predicate node - every edge label is also a
        // first-class term (`8. TESTABLE PROPERTIES`).
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn edge_label_is_also_registered_as_a_node() {
        let cells = vec![
            vertex("1", "Person"),
            vertex("2", "Organization"),
            edge("3", "1", "2", "has Part"),
        ];
        let registry = PrefixRegistry::new();
        let table = TermTable::new();
        let config = BridgeConfig::default();
        let graph = translate(&cells, &registry, &table, &[], &config).unwrap();
        let edge_id = graph.edge_ids().next().unwrap();
        let predicate_term = graph.edge(edge_id).predicate.clone();
        assert!(graph.node_ids().any(|n| graph.node(n).term == predicate_term));
    }

    #[test]
    fn edge_label_cell_value_is_promoted_onto_parent() {
        let cells = vec![
            vertex("1", "Person"),
            vertex("2", "Organization"),
            edge("3", "1", "2", ""),
            DiagramCell {
                id: "4".into(),
                parent: Some("3".into()),
                source: None,
                target: None,
                value: "has Part".into(),
                style: Style::parse("edgeLabel;html=1"),
            },
        ];
        let registry = PrefixRegistry::new();
        let table = TermTable::new();
        let config = BridgeConfig::default();
        let graph = translate(&cells, &registry, &table, &[], &config).unwrap();
        let edge_id = graph.edge_ids().next().unwrap();
        assert!(graph.edge(edge_id).label.to_lowercase().contains("part"));
    }

    #[test]
    fn close_rank_match_inverts_arrow_when_configured() {
        let cells = vec![
            vertex("1", "Dog"),
            vertex("2", "Animal"),
            edge("3", "1", "2", "is a"),
        ];
        let registry = PrefixRegistry::new();
        let table = TermTable::new();
        let config = BridgeConfig::default();
        let graph = translate(&cells, &registry, &table, &["is a"], &config).unwrap();
        let edge_id = graph.edge_ids().next().unwrap();
        let edge = graph.edge(edge_id);
        let dog_id = graph.node_ids().find(|n| graph.node(*n).label == "Dog").unwrap();
        assert_eq!(edge.target, dog_id);
        assert!(edge.is_rank);
        assert!(edge.is_strat);
    }

    #[test]
    fn non_rank_label_is_not_marked_rank() {
        let cells = vec![
            vertex("1", "Person"),
            vertex("2", "Organization"),
            edge("3", "1", "2", "works for"),
        ];
        let registry = PrefixRegistry::new();
        let table = TermTable::new();
        let config = BridgeConfig::default();
        let graph = translate(&cells, &registry, &table, &["is a"], &config).unwrap();
        let edge_id = graph.edge_ids().next().unwrap();
        let edge = graph.edge(edge_id);
        assert!(!edge.is_rank);
        assert!(edge.is_predicate);
    }

    #[test]
    fn strips_embedded_html_tags_from_labels() {
        assert_eq!(clean_label("has <b>Part</b>"), "has Part");
        assert_eq!(clean_label("<font>has Part</font>"), "has Part");
    }
}

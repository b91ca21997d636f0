//! Batch validator for assembled artifacts.
//!
//! Four independent checks, reported rather than thrown:
//!
//! - edge endpoints resolve to a known node or combo id (**error**)
//! - `comboId` / `secondaryClusters` references resolve to a combo
//!   (**error**)
//! - no duplicate edge ids (**error**)
//! - entities touched by zero edges (**warning** — orphans are allowed,
//!   just flagged)
//!
//! The caller decides what a failing verdict means; typically the CLI
//! maps it to a non-zero exit status gating a deploy.

use std::collections::BTreeSet;

use petgraph::graphmap::DiGraphMap;

use crate::properties::GraphData;

/// Itemized outcome of the four checks.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub edge_ref_errors: Vec<String>,
    pub combo_ref_errors: Vec<String>,
    pub duplicate_edge_errors: Vec<String>,
    pub orphan_warnings: Vec<String>,
}

impl ValidationReport {
    pub fn error_count(&self) -> usize {
        self.edge_ref_errors.len() + self.combo_ref_errors.len() + self.duplicate_edge_errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.orphan_warnings.len()
    }

    /// Warnings never fail a run; only errors do.
    pub fn passed(&self) -> bool {
        self.error_count() == 0
    }
}

/// Check an assembled artifact for structural integrity.
pub fn validate_graph(graph: &GraphData) -> ValidationReport {
    let mut report = ValidationReport::default();

    let node_ids: BTreeSet<&str> = graph
        .canvas_nodes
        .iter()
        .map(|n| n.id())
        .chain(graph.off_canvas_entities.iter().map(|e| e.id.as_str()))
        .collect();
    let combo_ids: BTreeSet<&str> = graph.combos.iter().map(|c| c.id.as_str()).collect();

    // Edge endpoints may land on nodes or on combos.
    for edge in &graph.edges {
        for (role, endpoint) in [("source", &edge.source), ("target", &edge.target)] {
            if !node_ids.contains(endpoint.as_str()) && !combo_ids.contains(endpoint.as_str()) {
                report.edge_ref_errors.push(format!(
                    "Edge {} ({}) references missing {role}: {endpoint}",
                    edge.id, edge.edge_type
                ));
            }
        }
    }

    for node in &graph.canvas_nodes {
        if let Some(combo_id) = &node.combo_id {
            if !combo_ids.contains(combo_id.as_str()) {
                report.combo_ref_errors.push(format!(
                    "Node {} references missing combo: {combo_id}",
                    node.id()
                ));
            }
        }
        for secondary in node.secondary_clusters.iter().flatten() {
            if !combo_ids.contains(secondary.as_str()) {
                report.combo_ref_errors.push(format!(
                    "Node {} secondary cluster references missing combo: {secondary}",
                    node.id()
                ));
            }
        }
    }

    let mut seen_edge_ids = BTreeSet::new();
    for edge in &graph.edges {
        if !seen_edge_ids.insert(edge.id.as_str()) {
            report
                .duplicate_edge_errors
                .push(format!("Duplicate edge ID: {}", edge.id));
        }
    }

    // Connectivity view over the edge list; anything the graph never
    // touches is an orphan.
    let mut connectivity: DiGraphMap<&str, ()> = DiGraphMap::new();
    for edge in &graph.edges {
        connectivity.add_edge(edge.source.as_str(), edge.target.as_str(), ());
    }

    for node in &graph.canvas_nodes {
        if !connectivity.contains_node(node.id()) {
            report.orphan_warnings.push(format!(
                "{} ({}: {}) has no edges",
                node.id(),
                node.entity.entity_type,
                node.entity.label
            ));
        }
    }
    for entity in &graph.off_canvas_entities {
        if !connectivity.contains_node(entity.id.as_str()) {
            report.orphan_warnings.push(format!(
                "{} ({}: {}) has no edges",
                entity.id, entity.entity_type, entity.label
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::{
        CanvasNode, Combo, EdgeData, Entity, EntityType, GraphData, GraphEdge,
    };
    use serde_yaml::Value as YamlValue;

    fn entity(id: &str, entity_type: EntityType) -> Entity {
        Entity {
            id: id.to_string(),
            entity_type,
            label: id.to_string(),
            yaml_key: id.to_string(),
            data: YamlValue::Null,
        }
    }

    fn edge(id: &str, source: &str, target: &str) -> GraphEdge {
        GraphEdge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            edge_type: "test_edge".to_string(),
            data: EdgeData::default(),
        }
    }

    fn graph_fixture() -> GraphData {
        let mut fp01 = CanvasNode::from_entity(entity("FP01", EntityType::Problem));
        fp01.combo_id = Some("CL_A".to_string());
        GraphData {
            canvas_nodes: vec![
                fp01,
                CanvasNode::from_entity(entity("MECH01", EntityType::Mechanism)),
            ],
            off_canvas_entities: vec![entity("C001", EntityType::Claim)],
            edges: vec![
                edge("e_0", "FP01", "MECH01"),
                edge("e_1", "FP01", "C001"),
                edge("e_2", "FP01", "CL_A"),
            ],
            combos: vec![Combo {
                id: "CL_A".to_string(),
                label: "Cluster A".to_string(),
                data: YamlValue::Null,
            }],
        }
    }

    #[test]
    fn test_consistent_graph_passes() {
        let report = validate_graph(&graph_fixture());
        assert!(report.passed());
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn test_dangling_edge_endpoint_is_error() {
        let mut graph = graph_fixture();
        graph.edges.push(edge("e_3", "FP01", "GHOST"));
        let report = validate_graph(&graph);
        assert!(!report.passed());
        assert_eq!(report.edge_ref_errors.len(), 1);
        assert!(report.edge_ref_errors[0].contains("GHOST"));
    }

    #[test]
    fn test_edge_to_combo_is_valid() {
        // e_2 targets the combo directly; combo ids count as endpoints.
        let report = validate_graph(&graph_fixture());
        assert!(report.edge_ref_errors.is_empty());
    }

    #[test]
    fn test_dangling_combo_reference_is_error() {
        let mut graph = graph_fixture();
        graph.canvas_nodes[0].combo_id = Some("CL_Z".to_string());
        graph.canvas_nodes[0].secondary_clusters = Some(vec!["CL_Y".to_string()]);
        let report = validate_graph(&graph);
        assert_eq!(report.combo_ref_errors.len(), 2);
    }

    #[test]
    fn test_duplicate_edge_id_is_error() {
        let mut graph = graph_fixture();
        graph.edges.push(edge("e_0", "FP01", "MECH01"));
        let report = validate_graph(&graph);
        assert_eq!(report.duplicate_edge_errors.len(), 1);
    }

    #[test]
    fn test_orphan_is_warning_only() {
        let mut graph = graph_fixture();
        graph
            .canvas_nodes
            .push(CanvasNode::from_entity(entity("FP07", EntityType::Problem)));
        let report = validate_graph(&graph);
        assert!(report.passed());
        assert_eq!(report.warning_count(), 1);
        assert!(report.orphan_warnings[0].contains("FP07"));
    }
}

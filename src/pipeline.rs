//! Graph Assembler: composes parsing, indexing, edge extraction,
//! compatibility parsing, and combo assignment into the final artifact,
//! plus its diagnostic statistics.
//!
//! `build_graph` is a pure, deterministic, idempotent function: identical
//! YAML input yields an identical artifact, including edge-id generation
//! order. The lookup index is built once per run and passed by reference
//! into every extraction stage; nothing global survives between runs.

use std::{fs, path::Path};

use crate::{
    combos::assign_combos,
    compatibility::parse_compatibility_matrix,
    corpus::parse_all_entities,
    error::OntographError,
    extract::extract_all_edges,
    lookup::EntityLookup,
    properties::{GraphData, PipelineStats, PipelineWarning},
};

/// Everything one pipeline run produces: the artifact, the accumulated
/// resolution warnings, and the stats the build CLI prints.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub graph: GraphData,
    pub warnings: Vec<PipelineWarning>,
    pub stats: PipelineStats,
}

/// Run the full YAML → artifact pipeline over a system-of-record
/// directory.
pub fn build_graph(yaml_dir: &Path) -> Result<PipelineResult, OntographError> {
    tracing::debug!("Building graph from {:?}", yaml_dir);

    let parsed = parse_all_entities(yaml_dir)?;

    let mut lookup = EntityLookup::default();
    lookup.index(&parsed.all);

    let mut edges = extract_all_edges(&parsed, &mut lookup);
    edges.extend(parse_compatibility_matrix(yaml_dir, &mut lookup)?);

    let (canvas_nodes, combos) = assign_combos(&parsed.all);
    let off_canvas_entities = parsed
        .all
        .iter()
        .filter(|e| e.entity_type.is_off_canvas())
        .cloned()
        .collect::<Vec<_>>();

    let graph = GraphData {
        canvas_nodes,
        off_canvas_entities,
        edges,
        combos,
    };

    let warnings = lookup.into_warnings();
    let stats = compute_stats(&graph, warnings.len());
    tracing::debug!(
        "Assembled {} canvas nodes, {} edges, {} combos ({} warnings)",
        stats.canvas_node_count,
        stats.edge_count,
        stats.combo_count,
        stats.warning_count
    );

    Ok(PipelineResult {
        graph,
        warnings,
        stats,
    })
}

/// Recompute stats from the finished artifact. Combo membership is
/// derived by filtering canvas nodes on `combo_id`, not tracked
/// incrementally during assembly.
fn compute_stats(graph: &GraphData, warning_count: usize) -> PipelineStats {
    let mut stats = PipelineStats {
        canvas_node_count: graph.canvas_nodes.len(),
        off_canvas_count: graph.off_canvas_entities.len(),
        edge_count: graph.edges.len(),
        combo_count: graph.combos.len(),
        warning_count,
        ..PipelineStats::default()
    };

    for node in &graph.canvas_nodes {
        *stats
            .node_counts_by_type
            .entry(node.entity.entity_type)
            .or_insert(0) += 1;
    }
    for entity in &graph.off_canvas_entities {
        *stats
            .node_counts_by_type
            .entry(entity.entity_type)
            .or_insert(0) += 1;
    }

    for edge in &graph.edges {
        *stats
            .edge_counts_by_type
            .entry(edge.edge_type.clone())
            .or_insert(0) += 1;
    }

    for combo in &graph.combos {
        let members = graph
            .canvas_nodes
            .iter()
            .filter(|n| n.combo_id.as_deref() == Some(combo.id.as_str()))
            .count();
        stats.combo_membership.insert(combo.id.clone(), members);
    }

    stats
}

/// Serialize the artifact as pretty-printed JSON.
pub fn write_artifact(path: &Path, graph: &GraphData) -> Result<(), OntographError> {
    let json = serde_json::to_string_pretty(graph)?;
    fs::write(path, json)
        .map_err(|e| OntographError::Artifact(format!("failed to write {}: {e}", path.display())))?;
    tracing::debug!("Wrote artifact to {:?}", path);
    Ok(())
}

/// Load a previously written artifact.
pub fn read_artifact(path: &Path) -> Result<GraphData, OntographError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| OntographError::Artifact(format!("failed to read {}: {e}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}

//! End-to-end pipeline tests over the fixture system-of-record: build,
//! artifact round-trip, and validator behavior on the assembled graph.

mod common;

use std::fs;

use ontograph::{
    corpus::parse_all_entities,
    lookup::{EntityLookup, ResolveContext},
    pipeline::{build_graph, read_artifact, write_artifact},
    properties::{EntityType, Rating},
    validate::validate_graph,
};
use test_log::test;

#[test]
fn test_build_is_idempotent() {
    let corpus = common::fixture_corpus();
    let first = build_graph(corpus.path()).unwrap();
    let second = build_graph(corpus.path()).unwrap();

    // Byte-identical serialization, edge-id generation order included.
    assert_eq!(
        serde_json::to_string(&first.graph).unwrap(),
        serde_json::to_string(&second.graph).unwrap()
    );
    assert_eq!(first.warnings, second.warnings);
    assert_eq!(first.stats, second.stats);
}

#[test]
fn test_problem_mechanism_scenario() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();

    let edge = result
        .graph
        .edges
        .iter()
        .find(|e| e.edge_type == "problem_mechanism" && e.source == "FP01")
        .expect("FP01 problem_mechanism edge");
    assert_eq!(edge.target, "MECH01");

    let fp01 = result
        .graph
        .canvas_nodes
        .iter()
        .find(|n| n.entity.id == "FP01")
        .unwrap();
    assert_eq!(fp01.combo_id.as_deref(), Some("CL_A"));
}

#[test]
fn test_convergence_point_detection() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();

    let fp04 = result
        .graph
        .canvas_nodes
        .iter()
        .find(|n| n.entity.id == "FP04")
        .unwrap();
    assert_eq!(fp04.combo_id.as_deref(), Some("CL_A"));
    assert_eq!(fp04.is_convergence_point, Some(true));
    assert_eq!(fp04.secondary_clusters, Some(vec!["CL_C".to_string()]));
}

#[test]
fn test_off_canvas_exclusion() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();

    assert!(result.graph.canvas_nodes.iter().all(|n| !matches!(
        n.entity.entity_type,
        EntityType::Claim | EntityType::Source | EntityType::Cluster
    )));
    assert!(result
        .graph
        .off_canvas_entities
        .iter()
        .all(|e| e.entity_type.is_off_canvas()));
    // Three claims and three sources ship off-canvas.
    assert_eq!(result.graph.off_canvas_entities.len(), 6);
}

#[test]
fn test_combo_exclusivity() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();

    let combo_ids: Vec<&str> = result.graph.combos.iter().map(|c| c.id.as_str()).collect();
    // Six cluster records exist in the fixture; only the main trio
    // materializes.
    assert_eq!(combo_ids, vec!["CL_A", "CL_B", "CL_C"]);
}

#[test]
fn test_cross_cluster_remapping() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();
    let edges = &result.graph.edges;

    // CL_AMP's claims re-attributed to FP05.
    assert!(edges
        .iter()
        .any(|e| e.edge_type == "problem_claim" && e.source == "FP05" && e.target == "C002"));
    assert!(edges
        .iter()
        .any(|e| e.edge_type == "problem_amplifies_cluster" && e.source == "FP05"));
    // Nothing in the artifact originates from a non-main cluster id.
    assert!(!edges
        .iter()
        .any(|e| e.source == "CL_AMP" || e.source == "CL_CONV_1" || e.source == "CL_NOTE_1"));

    // receives_from reverses: clusters feed the convergence problem.
    let feeds: Vec<_> = edges
        .iter()
        .filter(|e| e.edge_type == "cluster_feeds_problem")
        .collect();
    assert_eq!(feeds.len(), 2);
    assert!(feeds
        .iter()
        .all(|e| e.target == "FP04" && (e.source == "CL_A" || e.source == "CL_C")));
}

#[test]
fn test_compatibility_rating_scenario() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();

    let compat: Vec<_> = result
        .graph
        .edges
        .iter()
        .filter(|e| e.edge_type == "compatibility_rating" && e.source == "CL_A")
        .collect();
    assert_eq!(compat.len(), 2);
    let s_edge = compat.iter().find(|e| e.target == "EM01").unwrap();
    assert_eq!(
        serde_json::to_value(s_edge.data.rating.unwrap()).unwrap(),
        "S"
    );

    // Vulnerability section resolves through the same lookup and skips
    // the prose summary field.
    let vuln: Vec<_> = result
        .graph
        .edges
        .iter()
        .filter(|e| e.edge_type == "vulnerability_rating")
        .collect();
    assert_eq!(vuln.len(), 3);
    assert!(vuln
        .iter()
        .any(|e| e.source == "EM01" && e.target == "MC1" && matches!(e.data.rating, Some(Rating::Vulnerability(_)))));
}

#[test]
fn test_fixture_warnings_are_exactly_the_unresolvable_reference() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();

    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].source_entity, "CL_NOTE_1");
    assert_eq!(result.warnings[0].unresolved_value, "Unknown Problem Reference");
    assert_eq!(result.stats.warning_count, 1);
}

#[test]
fn test_resolve_miss_records_literal_value() {
    let corpus = common::fixture_corpus();
    let parsed = parse_all_entities(corpus.path()).unwrap();
    let mut lookup = EntityLookup::default();
    lookup.index(&parsed.all);

    let resolved = lookup.resolve(
        "Nonexistent Entity XYZ",
        ResolveContext::new("test", "field"),
    );
    assert_eq!(resolved, None);
    assert_eq!(lookup.warnings().len(), 1);
    assert_eq!(lookup.warnings()[0].unresolved_value, "Nonexistent Entity XYZ");
}

#[test]
fn test_validator_passes_on_fixture_artifact() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();

    let report = validate_graph(&result.graph);
    assert!(report.passed(), "errors: {:?}", report);
    assert_eq!(report.error_count(), 0);
    // FP07 is deliberately untouched by any edge.
    assert_eq!(report.warning_count(), 1);
    assert!(report.orphan_warnings[0].contains("FP07"));
}

#[test]
fn test_artifact_round_trip() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();

    let artifact_path = corpus.path().join("graph.json");
    write_artifact(&artifact_path, &result.graph).unwrap();
    let loaded = read_artifact(&artifact_path).unwrap();

    assert_eq!(loaded, result.graph);
    assert!(validate_graph(&loaded).passed());
}

#[test]
fn test_stats_reflect_artifact() {
    let corpus = common::fixture_corpus();
    let result = build_graph(corpus.path()).unwrap();
    let stats = &result.stats;

    assert_eq!(stats.canvas_node_count, result.graph.canvas_nodes.len());
    assert_eq!(stats.off_canvas_count, 6);
    assert_eq!(stats.edge_count, result.graph.edges.len());
    assert_eq!(stats.node_counts_by_type[&EntityType::Problem], 6);
    assert_eq!(stats.node_counts_by_type[&EntityType::Claim], 3);
    assert_eq!(stats.combo_count, 3);
    assert_eq!(stats.combo_membership["CL_A"], 2);
    assert_eq!(stats.combo_membership["CL_B"], 1);
    assert_eq!(stats.combo_membership["CL_C"], 1);
    assert_eq!(
        stats.edge_counts_by_type.values().sum::<usize>(),
        stats.edge_count
    );
}

#[test]
fn test_missing_required_file_is_fatal() {
    let corpus = common::fixture_corpus();
    fs::remove_file(corpus.path().join("mechanisms.yaml")).unwrap();
    assert!(build_graph(corpus.path()).is_err());
}

#[test]
fn test_malformed_file_is_fatal() {
    let corpus = common::fixture_corpus();
    fs::write(corpus.path().join("problems.yaml"), "problems: [unclosed").unwrap();
    assert!(build_graph(corpus.path()).is_err());
}

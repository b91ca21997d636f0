//! Edge Extractor: walks the reference-bearing fields of every entity
//! type and emits typed directed edges through the Lookup Engine.
//!
//! The per-type field contract is declared as const rule tables
//! ([`ListRule`] for plain lists of reference strings, [`NestedListRule`]
//! for lists one level down inside a mapping field). Shapes the tables
//! cannot express — cluster letter fields, `MC\d+`-prefixed mapping keys,
//! and the cross-cluster remapping — get bespoke handlers below.
//!
//! A reference that fails to resolve drops that one edge (the Lookup
//! Engine has already recorded the warning); extraction never aborts.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    corpus::ParsedEntities,
    lookup::{EntityLookup, ResolveContext},
    properties::{
        str_list_from, EdgeData, EdgeSubType, Entity, GraphEdge, MAIN_CLUSTER_IDS,
    },
    text::{cluster_letter_to_id, extract_cluster_letters},
};

/// Engagement-model vulnerability keys look like `MC1_novelty_decay`;
/// only the id prefix identifies the challenge.
static MC_ID_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(MC\d+)").expect("valid regex"));

/// One plain list field of reference strings and the edge it produces.
struct ListRule {
    field: &'static str,
    edge_type: &'static str,
    sub_type: Option<EdgeSubType>,
}

/// A list field nested one level under a parent mapping field.
struct NestedListRule {
    parent: &'static str,
    field: &'static str,
    edge_type: &'static str,
    sub_type: Option<EdgeSubType>,
}

const PROBLEM_LIST_RULES: &[ListRule] = &[
    ListRule {
        field: "mechanisms",
        edge_type: "problem_mechanism",
        sub_type: None,
    },
    ListRule {
        field: "claims",
        edge_type: "problem_claim",
        sub_type: None,
    },
];

const MECHANISM_LIST_RULES: &[ListRule] = &[
    ListRule {
        field: "affects_problems",
        edge_type: "mechanism_problem",
        sub_type: None,
    },
    ListRule {
        field: "favours_models",
        edge_type: "mechanism_model_favours",
        sub_type: Some(EdgeSubType::Favours),
    },
    ListRule {
        field: "disfavours_models",
        edge_type: "mechanism_model_disfavours",
        sub_type: Some(EdgeSubType::Disfavours),
    },
    ListRule {
        field: "underlies_challenges",
        edge_type: "mechanism_meta_challenge",
        sub_type: None,
    },
];

const META_CHALLENGE_LIST_RULES: &[ListRule] = &[
    ListRule {
        field: "favours_models",
        edge_type: "meta_challenge_model_favours",
        sub_type: Some(EdgeSubType::Favours),
    },
    ListRule {
        field: "disfavours_models",
        edge_type: "meta_challenge_model_disfavours",
        sub_type: Some(EdgeSubType::Disfavours),
    },
    ListRule {
        field: "claims",
        edge_type: "meta_challenge_claim",
        sub_type: None,
    },
];

const META_CHALLENGE_NESTED_RULES: &[NestedListRule] = &[NestedListRule {
    parent: "compound_effects",
    field: "amplifies",
    edge_type: "meta_challenge_amplifies",
    sub_type: None,
}];

const MODEL_LIST_RULES: &[ListRule] = &[
    ListRule {
        field: "claims",
        edge_type: "model_claim",
        sub_type: None,
    },
    ListRule {
        field: "primary_problems",
        edge_type: "model_problem_primary",
        sub_type: Some(EdgeSubType::Primary),
    },
    ListRule {
        field: "secondary_problems",
        edge_type: "model_problem_secondary",
        sub_type: Some(EdgeSubType::Secondary),
    },
];

const FOUNDATION_NESTED_RULES: &[NestedListRule] = &[
    NestedListRule {
        parent: "required_by",
        field: "required",
        edge_type: "foundation_model_required",
        sub_type: Some(EdgeSubType::Required),
    },
    NestedListRule {
        parent: "required_by",
        field: "optional",
        edge_type: "foundation_model_optional",
        sub_type: Some(EdgeSubType::Optional),
    },
];

const TECHNOLOGY_LIST_RULES: &[ListRule] = &[
    ListRule {
        field: "serves_foundations",
        edge_type: "technology_foundation",
        sub_type: None,
    },
    ListRule {
        field: "relevant_claims",
        edge_type: "technology_claim",
        sub_type: None,
    },
];

const TECHNOLOGY_NESTED_RULES: &[NestedListRule] = &[
    NestedListRule {
        parent: "needed_by_models",
        field: "required",
        edge_type: "technology_model_required",
        sub_type: Some(EdgeSubType::Required),
    },
    NestedListRule {
        parent: "needed_by_models",
        field: "optional",
        edge_type: "technology_model_optional",
        sub_type: Some(EdgeSubType::Optional),
    },
];

const CLAIM_LIST_RULES: &[ListRule] = &[ListRule {
    field: "sources",
    edge_type: "claim_source",
    sub_type: None,
}];

const CLAIM_NESTED_RULES: &[NestedListRule] = &[
    NestedListRule {
        parent: "relationships",
        field: "supports",
        edge_type: "claim_supports",
        sub_type: None,
    },
    NestedListRule {
        parent: "relationships",
        field: "challenged_by",
        edge_type: "claim_challenged_by",
        sub_type: None,
    },
    NestedListRule {
        parent: "relationships",
        field: "depends_on",
        edge_type: "claim_depends_on",
        sub_type: None,
    },
];

const IMPLICATION_LIST_RULES: &[ListRule] = &[ListRule {
    field: "evidence",
    edge_type: "implication_claim",
    sub_type: None,
}];

/// Allocates edge ids as `e_<edgeType>_<n>` with one running counter per
/// edge type; deterministic across rebuilds, unique, not semantic.
#[derive(Debug, Default)]
pub(crate) struct EdgeBuilder {
    edges: Vec<GraphEdge>,
    counters: BTreeMap<String, usize>,
}

impl EdgeBuilder {
    pub(crate) fn push(&mut self, source: &str, target: &str, edge_type: &str, data: EdgeData) {
        let counter = self.counters.entry(edge_type.to_string()).or_insert(0);
        let id = format!("e_{edge_type}_{counter}");
        *counter += 1;
        self.edges.push(GraphEdge {
            id,
            source: source.to_string(),
            target: target.to_string(),
            edge_type: edge_type.to_string(),
            data,
        });
    }

    fn resolve_and_push(
        &mut self,
        lookup: &mut EntityLookup,
        reference: &str,
        source_id: &str,
        edge_type: &str,
        field: &str,
        sub_type: Option<EdgeSubType>,
    ) {
        let ctx = ResolveContext::new(source_id, field);
        if let Some(target) = lookup.resolve(reference, ctx) {
            let data = match sub_type {
                Some(st) => EdgeData::sub_typed(st),
                None => EdgeData::default(),
            };
            self.push(source_id, &target, edge_type, data);
        }
    }

    pub(crate) fn into_edges(self) -> Vec<GraphEdge> {
        self.edges
    }
}

fn apply_list_rules(
    entity: &Entity,
    rules: &[ListRule],
    lookup: &mut EntityLookup,
    out: &mut EdgeBuilder,
) {
    for rule in rules {
        for reference in entity.str_list(rule.field) {
            out.resolve_and_push(
                lookup,
                &reference,
                &entity.id,
                rule.edge_type,
                rule.field,
                rule.sub_type,
            );
        }
    }
}

fn apply_nested_rules(
    entity: &Entity,
    rules: &[NestedListRule],
    lookup: &mut EntityLookup,
    out: &mut EdgeBuilder,
) {
    for rule in rules {
        let Some(value) = entity
            .data
            .get(rule.parent)
            .and_then(|parent| parent.get(rule.field))
        else {
            continue;
        };
        let field = format!("{}.{}", rule.parent, rule.field);
        for reference in str_list_from(value, &entity.id, &field) {
            out.resolve_and_push(
                lookup,
                &reference,
                &entity.id,
                rule.edge_type,
                &field,
                rule.sub_type,
            );
        }
    }
}

/// Extract every cross-reference edge from the parsed corpus. Extraction
/// order is fixed so edge-id generation is deterministic.
pub fn extract_all_edges(parsed: &ParsedEntities, lookup: &mut EntityLookup) -> Vec<GraphEdge> {
    let mut out = EdgeBuilder::default();

    for problem in &parsed.problems {
        apply_list_rules(problem, PROBLEM_LIST_RULES, lookup, &mut out);
        extract_problem_cluster_edges(problem, lookup, &mut out);
    }

    for mechanism in &parsed.mechanisms {
        apply_list_rules(mechanism, MECHANISM_LIST_RULES, lookup, &mut out);
    }

    for cluster in &parsed.clusters {
        if MAIN_CLUSTER_IDS.contains(&cluster.id.as_str()) {
            extract_main_cluster_edges(cluster, lookup, &mut out);
        } else {
            extract_cross_cluster_edges(cluster, lookup, &mut out);
        }
    }

    for challenge in &parsed.meta_challenges {
        extract_clusters_affected_edges(challenge, lookup, &mut out);
        apply_list_rules(challenge, META_CHALLENGE_LIST_RULES, lookup, &mut out);
        apply_nested_rules(challenge, META_CHALLENGE_NESTED_RULES, lookup, &mut out);
    }

    for model in &parsed.engagement_models {
        apply_list_rules(model, MODEL_LIST_RULES, lookup, &mut out);
        extract_vulnerability_key_edges(model, lookup, &mut out);
    }

    for foundation in &parsed.foundations {
        apply_nested_rules(foundation, FOUNDATION_NESTED_RULES, lookup, &mut out);
        if let Some(tech_ref) = foundation.str_field("technology_ref") {
            out.resolve_and_push(
                lookup,
                tech_ref,
                &foundation.id,
                "foundation_technology",
                "technology_ref",
                None,
            );
        }
    }

    for technology in &parsed.technologies {
        apply_list_rules(technology, TECHNOLOGY_LIST_RULES, lookup, &mut out);
        apply_nested_rules(technology, TECHNOLOGY_NESTED_RULES, lookup, &mut out);
    }

    for claim in &parsed.claims {
        apply_list_rules(claim, CLAIM_LIST_RULES, lookup, &mut out);
        apply_nested_rules(claim, CLAIM_NESTED_RULES, lookup, &mut out);
    }

    for implication in &parsed.implications {
        apply_list_rules(implication, IMPLICATION_LIST_RULES, lookup, &mut out);
    }

    out.into_edges()
}

/// A problem's `cluster` field yields one membership edge per extracted
/// letter. Existence-checked directly: a letter outside the corpus is
/// not a resolution failure.
fn extract_problem_cluster_edges(
    problem: &Entity,
    lookup: &EntityLookup,
    out: &mut EdgeBuilder,
) {
    let Some(cluster_field) = problem.str_field("cluster") else {
        return;
    };
    for letter in extract_cluster_letters(cluster_field) {
        let cluster_id = cluster_letter_to_id(&letter);
        if lookup.has(&cluster_id) {
            out.push(&problem.id, &cluster_id, "problem_cluster", EdgeData::default());
        }
    }
}

/// Main clusters reference their member problems, a primary mechanism,
/// and supporting claims.
fn extract_main_cluster_edges(cluster: &Entity, lookup: &mut EntityLookup, out: &mut EdgeBuilder) {
    if let Some(members) = cluster.data.get("members").and_then(|v| v.as_sequence()) {
        for member in members {
            let Some(problem_ref) = member.get("problem").and_then(|v| v.as_str()) else {
                continue;
            };
            out.resolve_and_push(
                lookup,
                problem_ref,
                &cluster.id,
                "cluster_problem",
                "members[].problem",
                None,
            );
        }
    }

    if let Some(mechanism_ref) = cluster.str_field("primary_mechanism") {
        out.resolve_and_push(
            lookup,
            mechanism_ref,
            &cluster.id,
            "cluster_mechanism",
            "primary_mechanism",
            None,
        );
    }

    for claim_ref in cluster.str_list("claims") {
        out.resolve_and_push(lookup, &claim_ref, &cluster.id, "cluster_claim", "claims", None);
    }
}

/// Non-main cluster records annotate exactly one problem and never render.
/// Their edges are re-attributed to the problem their `problem` field
/// resolves to; records with no resolvable problem are skipped entirely.
/// `receives_from` reverses direction: the referenced cluster feeds the
/// problem.
fn extract_cross_cluster_edges(
    cluster: &Entity,
    lookup: &mut EntityLookup,
    out: &mut EdgeBuilder,
) {
    let Some(problem_ref) = cluster.str_field("problem") else {
        return;
    };
    let ctx = ResolveContext::new(&cluster.id, "problem");
    let Some(problem_id) = lookup.resolve(problem_ref, ctx) else {
        return;
    };

    for claim_ref in cluster.str_list("claims") {
        out.resolve_and_push(lookup, &claim_ref, &problem_id, "problem_claim", "claims", None);
    }

    for affected_ref in cluster.str_list("affects") {
        out.resolve_and_push(
            lookup,
            &affected_ref,
            &problem_id,
            "problem_amplifies_cluster",
            "affects",
            None,
        );
    }

    for feeder_ref in cluster.str_list("receives_from") {
        let ctx = ResolveContext::new(&cluster.id, "receives_from");
        if let Some(feeder_id) = lookup.resolve(&feeder_ref, ctx) {
            out.push(&feeder_id, &problem_id, "cluster_feeds_problem", EdgeData::default());
        }
    }
}

/// `clusters_affected` entries are bare letters; mapped directly without
/// the resolution cascade.
fn extract_clusters_affected_edges(
    challenge: &Entity,
    lookup: &EntityLookup,
    out: &mut EdgeBuilder,
) {
    for letter in challenge.str_list("clusters_affected") {
        let cluster_id = cluster_letter_to_id(&letter);
        if lookup.has(&cluster_id) {
            out.push(&challenge.id, &cluster_id, "meta_challenge_cluster", EdgeData::default());
        }
    }
}

/// `meta_challenge_vulnerability` keys carry the challenge id as a
/// prefix (`MC1_novelty_decay`); the values are prose and ignored here —
/// the rated form of this relationship lives in the compatibility matrix.
fn extract_vulnerability_key_edges(
    model: &Entity,
    lookup: &EntityLookup,
    out: &mut EdgeBuilder,
) {
    let Some(vulnerability) = model.mapping_field("meta_challenge_vulnerability") else {
        return;
    };
    for (key, _value) in vulnerability {
        let Some(key) = key.as_str() else {
            continue;
        };
        if let Some(caps) = MC_ID_PREFIX.captures(key) {
            let challenge_id = &caps[1];
            if lookup.has(challenge_id) {
                out.push(&model.id, challenge_id, "model_meta_vulnerability", EdgeData::default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::EntityType;
    use serde_yaml::Value as YamlValue;

    fn entity(id: &str, entity_type: EntityType, key: &str, yaml: &str) -> Entity {
        Entity {
            id: id.to_string(),
            entity_type,
            label: key.to_string(),
            yaml_key: key.to_string(),
            data: serde_yaml::from_str::<YamlValue>(yaml).unwrap(),
        }
    }

    fn parsed_fixture() -> (ParsedEntities, EntityLookup) {
        let mut parsed = ParsedEntities::default();
        parsed.problems = vec![
            entity(
                "FP01",
                EntityType::Problem,
                "Task Initiation Failure",
                "cluster: \"A\"\nmechanisms: [\"Time Perception Distortion\"]\nclaims: [\"C001\"]",
            ),
            entity(
                "FP05",
                EntityType::Problem,
                "Systemic Amplifier",
                "cluster: \"Cross-cluster amplifier\"",
            ),
        ];
        parsed.clusters = vec![
            entity("CL_A", EntityType::Cluster, "Time-Perception Cascade", "{}"),
            entity(
                "CL_AMP",
                EntityType::Cluster,
                "Cross-Cluster Amplifier",
                "problem: \"FP05\"\nclaims: [\"C001\"]\naffects: [\"A\"]",
            ),
            entity(
                "CL_CONV_1",
                EntityType::Cluster,
                "Convergence Note",
                "problem: \"FP01\"\nreceives_from: [\"A\"]",
            ),
        ];
        parsed.mechanisms = vec![entity(
            "MECH01",
            EntityType::Mechanism,
            "Time Perception Distortion",
            "favours_models: [\"Ambient Monitor\"]",
        )];
        parsed.engagement_models = vec![entity(
            "EM01",
            EntityType::EngagementModel,
            "Ambient Monitor",
            "meta_challenge_vulnerability:\n  MC1_novelty_decay: \"High\"\n  pilot_notes: \"prose\"",
        )];
        parsed.meta_challenges = vec![entity("MC1", EntityType::MetaChallenge, "Novelty Decay", "{}")];
        parsed.claims = vec![entity("C001", EntityType::Claim, "C001", "{}")];
        let mut all = Vec::new();
        for list in [
            &parsed.problems,
            &parsed.clusters,
            &parsed.mechanisms,
            &parsed.engagement_models,
            &parsed.meta_challenges,
            &parsed.claims,
        ] {
            all.extend(list.iter().cloned());
        }
        parsed.all = all;

        let mut lookup = EntityLookup::default();
        lookup.index(&parsed.all);
        (parsed, lookup)
    }

    fn find<'a>(edges: &'a [GraphEdge], edge_type: &str) -> Vec<&'a GraphEdge> {
        edges.iter().filter(|e| e.edge_type == edge_type).collect()
    }

    #[test]
    fn test_problem_edges_and_ids() {
        let (parsed, mut lookup) = parsed_fixture();
        let edges = extract_all_edges(&parsed, &mut lookup);

        let mech = find(&edges, "problem_mechanism");
        assert_eq!(mech.len(), 1);
        assert_eq!(mech[0].source, "FP01");
        assert_eq!(mech[0].target, "MECH01");
        assert_eq!(mech[0].id, "e_problem_mechanism_0");

        let cluster = find(&edges, "problem_cluster");
        assert_eq!(cluster.len(), 1);
        assert_eq!(cluster[0].target, "CL_A");
    }

    #[test]
    fn test_per_type_counters() {
        let (parsed, mut lookup) = parsed_fixture();
        let edges = extract_all_edges(&parsed, &mut lookup);
        // Two problem_claim edges exist (FP01 direct, FP05 remapped);
        // their counter is independent of every other edge type's.
        let claims = find(&edges, "problem_claim");
        assert_eq!(claims.len(), 2);
        assert_eq!(claims[0].id, "e_problem_claim_0");
        assert_eq!(claims[1].id, "e_problem_claim_1");
    }

    #[test]
    fn test_cross_cluster_edges_remap_to_problem() {
        let (parsed, mut lookup) = parsed_fixture();
        let edges = extract_all_edges(&parsed, &mut lookup);

        // CL_AMP's claims belong to FP05, not to the cluster record.
        let remapped = find(&edges, "problem_claim")
            .into_iter()
            .find(|e| e.source == "FP05")
            .expect("remapped claim edge");
        assert_eq!(remapped.target, "C001");
        assert!(!edges.iter().any(|e| e.source == "CL_AMP"));

        let amplifies = find(&edges, "problem_amplifies_cluster");
        assert_eq!(amplifies.len(), 1);
        assert_eq!(amplifies[0].source, "FP05");
        assert_eq!(amplifies[0].target, "CL_A");
    }

    #[test]
    fn test_receives_from_reverses_direction() {
        let (parsed, mut lookup) = parsed_fixture();
        let edges = extract_all_edges(&parsed, &mut lookup);
        let feeds = find(&edges, "cluster_feeds_problem");
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].source, "CL_A");
        assert_eq!(feeds[0].target, "FP01");
    }

    #[test]
    fn test_vulnerability_keys_use_id_prefix() {
        let (parsed, mut lookup) = parsed_fixture();
        let edges = extract_all_edges(&parsed, &mut lookup);
        let vuln = find(&edges, "model_meta_vulnerability");
        assert_eq!(vuln.len(), 1);
        assert_eq!(vuln[0].source, "EM01");
        assert_eq!(vuln[0].target, "MC1");
    }

    #[test]
    fn test_sub_typed_edges() {
        let (parsed, mut lookup) = parsed_fixture();
        let edges = extract_all_edges(&parsed, &mut lookup);
        let favours = find(&edges, "mechanism_model_favours");
        assert_eq!(favours.len(), 1);
        assert_eq!(favours[0].data.sub_type, Some(EdgeSubType::Favours));
    }

    #[test]
    fn test_unresolved_reference_drops_single_edge() {
        let (mut parsed, _) = parsed_fixture();
        parsed.problems[0] = entity(
            "FP01",
            EntityType::Problem,
            "Task Initiation Failure",
            "mechanisms: [\"Nonexistent Entity XYZ\", \"Time Perception Distortion\"]",
        );
        parsed.all[0] = parsed.problems[0].clone();
        let mut lookup = EntityLookup::default();
        lookup.index(&parsed.all);
        let edges = extract_all_edges(&parsed, &mut lookup);

        let mech = find(&edges, "problem_mechanism");
        assert_eq!(mech.len(), 1);
        assert_eq!(mech[0].target, "MECH01");
        assert_eq!(lookup.warnings().len(), 1);
        assert_eq!(lookup.warnings()[0].unresolved_value, "Nonexistent Entity XYZ");
    }
}

//! Combo Assignment: cluster membership for problem nodes, convergence
//! detection, and materialization of the rendered combo groupings.
//!
//! Membership comes from each problem's own `cluster` free-text field,
//! not from the cluster records' member lists; the letters extracted from
//! that field are authoritative for rendering.

use std::collections::BTreeMap;

use crate::{
    properties::{CanvasNode, Combo, Entity, EntityType, MAIN_CLUSTER_IDS},
    text::{cluster_letter_to_id, extract_cluster_letters},
};

#[derive(Debug, Default)]
struct Membership {
    primary: Option<String>,
    secondary: Vec<String>,
    is_convergence: bool,
}

/// Compute canvas nodes and combos from the full entity list.
///
/// Zero extracted letters → standalone, no combo. One letter → plain
/// membership. Two or more → convergence point: first letter is primary,
/// the rest become secondary clusters.
pub fn assign_combos(entities: &[Entity]) -> (Vec<CanvasNode>, Vec<Combo>) {
    let mut membership: BTreeMap<String, Membership> = BTreeMap::new();

    for problem in entities
        .iter()
        .filter(|e| e.entity_type == EntityType::Problem)
    {
        let letters = problem
            .str_field("cluster")
            .map(extract_cluster_letters)
            .unwrap_or_default();

        let entry = match letters.len() {
            0 => Membership::default(),
            1 => Membership {
                primary: Some(cluster_letter_to_id(&letters[0])),
                secondary: Vec::new(),
                is_convergence: false,
            },
            _ => Membership {
                primary: Some(cluster_letter_to_id(&letters[0])),
                secondary: letters[1..]
                    .iter()
                    .map(|l| cluster_letter_to_id(l))
                    .collect(),
                is_convergence: true,
            },
        };
        membership.insert(problem.id.clone(), entry);
    }

    let mut canvas_nodes = Vec::new();
    for entity in entities {
        if !entity.entity_type.is_canvas() {
            continue;
        }
        let mut node = CanvasNode::from_entity(entity.clone());
        if entity.entity_type == EntityType::Problem {
            if let Some(m) = membership.get(&entity.id) {
                node.combo_id = m.primary.clone();
                if m.is_convergence {
                    node.is_convergence_point = Some(true);
                    node.secondary_clusters = Some(m.secondary.clone());
                }
            }
        }
        canvas_nodes.push(node);
    }

    // Only the three main clusters become rendered groupings; every other
    // cluster record is resolution-only metadata.
    let combos = entities
        .iter()
        .filter(|e| {
            e.entity_type == EntityType::Cluster && MAIN_CLUSTER_IDS.contains(&e.id.as_str())
        })
        .map(|e| Combo {
            id: e.id.clone(),
            label: e.label.clone(),
            data: e.data.clone(),
        })
        .collect();

    (canvas_nodes, combos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value as YamlValue;

    fn problem(id: &str, key: &str, cluster: &str) -> Entity {
        Entity {
            id: id.to_string(),
            entity_type: EntityType::Problem,
            label: key.to_string(),
            yaml_key: key.to_string(),
            data: serde_yaml::from_str(&format!("cluster: \"{cluster}\"")).unwrap(),
        }
    }

    fn cluster(id: &str, key: &str) -> Entity {
        Entity {
            id: id.to_string(),
            entity_type: EntityType::Cluster,
            label: key.to_string(),
            yaml_key: key.to_string(),
            data: YamlValue::Null,
        }
    }

    fn node<'a>(nodes: &'a [CanvasNode], id: &str) -> &'a CanvasNode {
        nodes.iter().find(|n| n.id() == id).unwrap()
    }

    #[test]
    fn test_single_cluster_membership() {
        let entities = vec![
            problem("FP01", "Task Initiation Failure", "A — Time-Perception Cascade"),
            cluster("CL_A", "Time-Perception Cascade"),
        ];
        let (nodes, _) = assign_combos(&entities);
        let fp01 = node(&nodes, "FP01");
        assert_eq!(fp01.combo_id.as_deref(), Some("CL_A"));
        assert_eq!(fp01.is_convergence_point, None);
        assert_eq!(fp01.secondary_clusters, None);
    }

    #[test]
    fn test_convergence_point() {
        let entities = vec![problem("FP04", "Context Switching Collapse", "A and C (convergence point)")];
        let (nodes, _) = assign_combos(&entities);
        let fp04 = node(&nodes, "FP04");
        assert_eq!(fp04.combo_id.as_deref(), Some("CL_A"));
        assert_eq!(fp04.is_convergence_point, Some(true));
        assert_eq!(
            fp04.secondary_clusters,
            Some(vec!["CL_C".to_string()])
        );
    }

    #[test]
    fn test_standalone_and_amplifier_have_no_combo() {
        let entities = vec![
            problem("FP07", "Standalone Drift", "Standalone"),
            problem("FP05", "Systemic Amplifier", "Cross-cluster amplifier"),
        ];
        let (nodes, _) = assign_combos(&entities);
        assert_eq!(node(&nodes, "FP07").combo_id, None);
        assert_eq!(node(&nodes, "FP05").combo_id, None);
    }

    #[test]
    fn test_only_main_clusters_become_combos() {
        let entities = vec![
            cluster("CL_A", "Time-Perception Cascade"),
            cluster("CL_B", "Activation Collapse"),
            cluster("CL_AMP", "Cross-Cluster Amplifier"),
            cluster("CL_CONV_1", "Convergence Note"),
        ];
        let (nodes, combos) = assign_combos(&entities);
        // Cluster records never become canvas nodes, main or otherwise.
        assert!(nodes.is_empty());
        let combo_ids: Vec<&str> = combos.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(combo_ids, vec!["CL_A", "CL_B"]);
    }

    #[test]
    fn test_non_canvas_types_excluded() {
        let mut claim = cluster("C001", "C001");
        claim.entity_type = EntityType::Claim;
        let mut source = cluster("barkley2015", "barkley2015");
        source.entity_type = EntityType::Source;
        let entities = vec![claim, source, problem("FP01", "P", "Standalone")];
        let (nodes, _) = assign_combos(&entities);
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].id(), "FP01");
    }
}

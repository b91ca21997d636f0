//! Compatibility Matrix Parser.
//!
//! `compatibility.yaml` is pure free text — row keys are problem/cluster
//! display names, column keys are engagement-model display names, with no
//! ids anywhere — so both axes of both sections lean on the full
//! resolution cascade. Two sections share the file:
//!
//! 1. problem/cluster → model → `S`/`P`/`X` compatibility ratings;
//! 2. under the distinguished key `meta_challenge_vulnerability`:
//!    model → challenge → `H`/`M`/`L` vulnerability ratings, where a
//!    nested `summary` entry is prose and skipped.

use std::path::Path;

use serde_yaml::Value as YamlValue;

use crate::{
    corpus::read_mapping,
    error::OntographError,
    lookup::{EntityLookup, ResolveContext},
    properties::{
        CompatibilityRating, EdgeData, GraphEdge, Rating, VulnerabilityRating,
    },
};

const VULNERABILITY_KEY: &str = "meta_challenge_vulnerability";

/// Parse `compatibility.yaml` into rating-typed edges. Edge ids share one
/// running counter across both sections, in file order.
pub fn parse_compatibility_matrix(
    yaml_dir: &Path,
    lookup: &mut EntityLookup,
) -> Result<Vec<GraphEdge>, OntographError> {
    let mapping = read_mapping(yaml_dir, "compatibility.yaml")?;
    let mut edges = Vec::new();
    let mut edge_idx = 0usize;

    for (key, value) in &mapping {
        let key = key.as_str().ok_or_else(|| {
            OntographError::Corpus("compatibility.yaml: non-string top-level key".to_string())
        })?;

        if key == VULNERABILITY_KEY {
            parse_vulnerability_section(value, lookup, &mut edges, &mut edge_idx)?;
        } else {
            parse_compatibility_row(key, value, lookup, &mut edges, &mut edge_idx)?;
        }
    }

    Ok(edges)
}

fn parse_compatibility_row(
    row_key: &str,
    value: &YamlValue,
    lookup: &mut EntityLookup,
    edges: &mut Vec<GraphEdge>,
    edge_idx: &mut usize,
) -> Result<(), OntographError> {
    let ratings = value.as_mapping().ok_or_else(|| {
        OntographError::Corpus(format!(
            "compatibility.yaml: row '{row_key}' is not a mapping of model -> rating"
        ))
    })?;

    let ctx = ResolveContext::new("compatibility", "problem_model_compatibility");
    let Some(source_id) = lookup.resolve(row_key, ctx) else {
        return Ok(());
    };

    let cell_field = format!("compatibility.{row_key}");
    for (model_key, rating_value) in ratings {
        let Some(model_name) = model_key.as_str() else {
            tracing::warn!("compatibility.yaml: skipping non-string model key under '{row_key}'");
            continue;
        };
        let ctx = ResolveContext::new("compatibility", &cell_field);
        let Some(model_id) = lookup.resolve(model_name, ctx) else {
            continue;
        };
        let Some(rating) = rating_value
            .as_str()
            .and_then(CompatibilityRating::parse)
        else {
            tracing::warn!(
                "compatibility.yaml: unrecognized rating {rating_value:?} for '{row_key}' x '{model_name}'"
            );
            continue;
        };

        edges.push(GraphEdge {
            id: format!("compat_{edge_idx}"),
            source: source_id.clone(),
            target: model_id,
            edge_type: "compatibility_rating".to_string(),
            data: EdgeData {
                label: Some(format!("{rating} compatibility")),
                rating: Some(Rating::Compatibility(rating)),
                sub_type: None,
            },
        });
        *edge_idx += 1;
    }
    Ok(())
}

fn parse_vulnerability_section(
    value: &YamlValue,
    lookup: &mut EntityLookup,
    edges: &mut Vec<GraphEdge>,
    edge_idx: &mut usize,
) -> Result<(), OntographError> {
    let models = value.as_mapping().ok_or_else(|| {
        OntographError::Corpus(format!(
            "compatibility.yaml: {VULNERABILITY_KEY} is not a mapping of model -> challenges"
        ))
    })?;

    for (model_key, challenges) in models {
        let Some(model_name) = model_key.as_str() else {
            tracing::warn!("compatibility.yaml: skipping non-string model key in {VULNERABILITY_KEY}");
            continue;
        };
        let ctx = ResolveContext::new("compatibility", VULNERABILITY_KEY);
        let Some(model_id) = lookup.resolve(model_name, ctx) else {
            continue;
        };

        let Some(challenges) = challenges.as_mapping() else {
            tracing::warn!(
                "compatibility.yaml: {VULNERABILITY_KEY}.{model_name} is not a mapping, skipping"
            );
            continue;
        };

        let cell_field = format!("{VULNERABILITY_KEY}.{model_name}");
        for (challenge_key, rating_value) in challenges {
            let Some(challenge_name) = challenge_key.as_str() else {
                continue;
            };
            // Prose, not a challenge name.
            if challenge_name == "summary" {
                continue;
            }
            let ctx = ResolveContext::new("compatibility", &cell_field);
            let Some(challenge_id) = lookup.resolve(challenge_name, ctx) else {
                continue;
            };
            let Some(rating) = rating_value
                .as_str()
                .and_then(VulnerabilityRating::parse)
            else {
                tracing::warn!(
                    "compatibility.yaml: unrecognized rating {rating_value:?} for '{model_name}' x '{challenge_name}'"
                );
                continue;
            };

            edges.push(GraphEdge {
                id: format!("compat_vuln_{edge_idx}"),
                source: model_id.clone(),
                target: challenge_id,
                edge_type: "vulnerability_rating".to_string(),
                data: EdgeData {
                    label: Some(format!("{rating} vulnerability")),
                    rating: Some(Rating::Vulnerability(rating)),
                    sub_type: None,
                },
            });
            *edge_idx += 1;
        }
    }
    Ok(())
}

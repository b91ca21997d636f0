//! Record Parser: reads the fixed set of system-of-record YAML files into
//! uniform [`Entity`] lists.
//!
//! Each source file is a top-level mapping of record-key → record-body and
//! follows one fixed convention for deriving ids and labels (see
//! [`parse_all_entities`]). These are configuration-time inputs, not user
//! input: a missing or malformed file aborts the whole build rather than
//! degrading.

use std::{fs::read_to_string, path::Path};

use serde_yaml::{Mapping, Value as YamlValue};

use crate::{
    error::OntographError,
    properties::{Entity, EntityType},
};

/// All entities parsed from one system-of-record directory, per file plus
/// a flattened `all` in file order.
#[derive(Debug, Clone, Default)]
pub struct ParsedEntities {
    pub problems: Vec<Entity>,
    pub clusters: Vec<Entity>,
    pub mechanisms: Vec<Entity>,
    pub engagement_models: Vec<Entity>,
    pub meta_challenges: Vec<Entity>,
    pub foundations: Vec<Entity>,
    pub technologies: Vec<Entity>,
    pub claims: Vec<Entity>,
    pub sources: Vec<Entity>,
    pub implications: Vec<Entity>,
    pub all: Vec<Entity>,
}

/// Read one YAML file as a top-level mapping. Fatal on a missing file,
/// unparseable content, or a non-mapping document.
pub(crate) fn read_mapping(dir: &Path, filename: &str) -> Result<Mapping, OntographError> {
    let path = dir.join(filename);
    tracing::debug!("Reading {:?}", path);
    let raw = read_to_string(&path)
        .map_err(|e| OntographError::Corpus(format!("failed to read {}: {e}", path.display())))?;
    let value: YamlValue = serde_yaml::from_str(&raw)
        .map_err(|e| OntographError::Corpus(format!("failed to parse {}: {e}", path.display())))?;
    match value {
        YamlValue::Mapping(mapping) => Ok(mapping),
        _ => Err(OntographError::Corpus(format!(
            "{filename}: expected a top-level mapping of record-key -> record-body"
        ))),
    }
}

/// Iterate a file's records as (key, body-mapping) pairs, rejecting
/// non-string keys and non-mapping bodies.
fn records(
    mapping: Mapping,
    filename: &str,
) -> Result<Vec<(String, YamlValue)>, OntographError> {
    let mut out = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = key
            .as_str()
            .ok_or_else(|| {
                OntographError::Corpus(format!("{filename}: non-string top-level key"))
            })?
            .to_string();
        if !value.is_mapping() {
            return Err(OntographError::Corpus(format!(
                "{filename}: record '{key}' is not a mapping"
            )));
        }
        out.push((key, value));
    }
    Ok(out)
}

/// Parse a file whose records carry an explicit inner `id` field
/// (problems, clusters, mechanisms, engagement models, meta-challenges,
/// foundations). The YAML key doubles as the display label.
fn parse_id_field_file(
    dir: &Path,
    filename: &str,
    entity_type: EntityType,
) -> Result<Vec<Entity>, OntographError> {
    let mapping = read_mapping(dir, filename)?;
    let mut entities = Vec::new();
    for (key, value) in records(mapping, filename)? {
        let id = value
            .get("id")
            .and_then(YamlValue::as_str)
            .ok_or_else(|| {
                OntographError::Corpus(format!(
                    "{filename}: record '{key}' is missing a string `id` field"
                ))
            })?
            .to_string();
        entities.push(Entity {
            id,
            entity_type,
            label: key.clone(),
            yaml_key: key,
            data: value,
        });
    }
    Ok(entities)
}

/// Parse a file whose records are keyed by their id (technologies,
/// claims, sources, implications); the label comes from a per-file field.
fn parse_keyed_file(
    dir: &Path,
    filename: &str,
    entity_type: EntityType,
    label: impl Fn(&str, &YamlValue) -> String,
) -> Result<Vec<Entity>, OntographError> {
    let mapping = read_mapping(dir, filename)?;
    let mut entities = Vec::new();
    for (key, value) in records(mapping, filename)? {
        entities.push(Entity {
            id: key.clone(),
            entity_type,
            label: label(&key, &value),
            yaml_key: key,
            data: value,
        });
    }
    Ok(entities)
}

fn name_or_key(key: &str, value: &YamlValue) -> String {
    value
        .get("name")
        .and_then(YamlValue::as_str)
        .unwrap_or(key)
        .to_string()
}

/// Claim labels are the statement truncated for display compactness.
fn claim_label(value: &YamlValue) -> String {
    let statement = value
        .get("statement")
        .and_then(YamlValue::as_str)
        .unwrap_or_default();
    if statement.chars().count() > 60 {
        let head: String = statement.chars().take(57).collect();
        format!("{}...", head.trim())
    } else {
        statement.to_string()
    }
}

/// Parse every YAML file in the system-of-record directory.
pub fn parse_all_entities(yaml_dir: &Path) -> Result<ParsedEntities, OntographError> {
    let problems = parse_id_field_file(yaml_dir, "problems.yaml", EntityType::Problem)?;
    let clusters = parse_id_field_file(yaml_dir, "clusters.yaml", EntityType::Cluster)?;
    let mechanisms = parse_id_field_file(yaml_dir, "mechanisms.yaml", EntityType::Mechanism)?;
    let engagement_models = parse_id_field_file(
        yaml_dir,
        "engagement_models.yaml",
        EntityType::EngagementModel,
    )?;
    let meta_challenges =
        parse_id_field_file(yaml_dir, "meta_challenges.yaml", EntityType::MetaChallenge)?;
    let foundations = parse_id_field_file(yaml_dir, "foundations.yaml", EntityType::Foundation)?;
    let technologies = parse_keyed_file(
        yaml_dir,
        "technologies.yaml",
        EntityType::Technology,
        name_or_key,
    )?;
    let claims = parse_keyed_file(yaml_dir, "claims.yaml", EntityType::Claim, |_, value| {
        claim_label(value)
    })?;
    let sources = parse_keyed_file(yaml_dir, "sources.yaml", EntityType::Source, name_or_key)?;
    let implications = parse_keyed_file(
        yaml_dir,
        "implications.yaml",
        EntityType::Implication,
        name_or_key,
    )?;

    let mut all = Vec::new();
    for list in [
        &problems,
        &clusters,
        &mechanisms,
        &engagement_models,
        &meta_challenges,
        &foundations,
        &technologies,
        &claims,
        &sources,
        &implications,
    ] {
        all.extend(list.iter().cloned());
    }

    tracing::debug!("Parsed {} entities from {:?}", all.len(), yaml_dir);

    Ok(ParsedEntities {
        problems,
        clusters,
        mechanisms,
        engagement_models,
        meta_challenges,
        foundations,
        technologies,
        claims,
        sources,
        implications,
        all,
    })
}

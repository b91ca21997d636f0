//! Basic building blocks of the ontograph data model: entities, canvas
//! nodes, typed edges, combos, the assembled artifact, and the pipeline's
//! diagnostic records.
//!
//! Everything here serializes with the camelCase field names the
//! presentation layer consumes (`canvasNodes`, `yamlKey`, `edgeType`, ...).
//! The record payloads themselves stay open attribute bags
//! ([`serde_yaml::Value`]): each source file carries type-specific fields
//! the pipeline only reads selectively during edge extraction.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value as YamlValue};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

/// The three cluster records that materialize as rendered [`Combo`]
/// groupings. Every other cluster-typed record is resolution-only
/// metadata.
pub const MAIN_CLUSTER_IDS: [&str; 3] = ["CL_A", "CL_B", "CL_C"];

/// Closed set of record types in the system-of-record corpus.
///
/// All types share one ID namespace: references are not type-scoped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Problem,
    Mechanism,
    Cluster,
    MetaChallenge,
    EngagementModel,
    Foundation,
    Technology,
    Claim,
    Source,
    Implication,
}

impl EntityType {
    /// Whether entities of this type are drawn as graph nodes.
    /// Clusters, claims and sources never reach the canvas.
    pub fn is_canvas(&self) -> bool {
        !matches!(
            self,
            EntityType::Cluster | EntityType::Claim | EntityType::Source
        )
    }

    /// Claim and source records ship with the artifact for detail-panel
    /// lookups but are never rendered.
    pub fn is_off_canvas(&self) -> bool {
        matches!(self, EntityType::Claim | EntityType::Source)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Problem => "problem",
            EntityType::Mechanism => "mechanism",
            EntityType::Cluster => "cluster",
            EntityType::MetaChallenge => "meta_challenge",
            EntityType::EngagementModel => "engagement_model",
            EntityType::Foundation => "foundation",
            EntityType::Technology => "technology",
            EntityType::Claim => "claim",
            EntityType::Source => "source",
            EntityType::Implication => "implication",
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One authored record, uniform across all source files.
///
/// `id` is canonical and globally unique. `yaml_key` is the original
/// authoring key, kept separately because authors key records by display
/// name while ids follow a coded scheme; key-based and substring
/// resolution both run against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub label: String,
    pub yaml_key: String,
    pub data: YamlValue,
}

impl Entity {
    /// Read a string field from the record body.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(YamlValue::as_str)
    }

    /// Read a list-of-strings field from the record body. Missing fields
    /// yield an empty list; non-string elements are skipped.
    pub fn str_list(&self, field: &str) -> Vec<String> {
        match self.data.get(field) {
            Some(value) => str_list_from(value, &self.id, field),
            None => Vec::new(),
        }
    }

    /// Read a nested mapping field from the record body.
    pub fn mapping_field(&self, field: &str) -> Option<&Mapping> {
        self.data.get(field).and_then(YamlValue::as_mapping)
    }
}

/// Collect the string elements of a YAML sequence value.
pub(crate) fn str_list_from(value: &YamlValue, owner: &str, field: &str) -> Vec<String> {
    let Some(seq) = value.as_sequence() else {
        tracing::warn!("{owner}.{field}: expected a list, ignoring value");
        return Vec::new();
    };
    seq.iter()
        .filter_map(|item| match item.as_str() {
            Some(s) => Some(s.to_string()),
            None => {
                tracing::warn!("{owner}.{field}: skipping non-string list element");
                None
            }
        })
        .collect()
}

/// An [`Entity`] restricted to the rendered type subset, extended with
/// cluster membership computed from the problem's own `cluster` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    #[serde(flatten)]
    pub entity: Entity,
    /// Primary cluster membership; problems only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combo_id: Option<String>,
    /// Set when the problem belongs to two or more clusters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_convergence_point: Option<bool>,
    /// Non-primary cluster ids for convergence points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_clusters: Option<Vec<String>>,
}

impl CanvasNode {
    pub fn from_entity(entity: Entity) -> Self {
        CanvasNode {
            entity,
            combo_id: None,
            is_convergence_point: None,
            secondary_clusters: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.entity.id
    }
}

/// Problem/cluster ↔ engagement-model compatibility cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompatibilityRating {
    S,
    P,
    X,
}

impl CompatibilityRating {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "S" => Some(CompatibilityRating::S),
            "P" => Some(CompatibilityRating::P),
            "X" => Some(CompatibilityRating::X),
            _ => None,
        }
    }
}

impl Display for CompatibilityRating {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            CompatibilityRating::S => "S",
            CompatibilityRating::P => "P",
            CompatibilityRating::X => "X",
        };
        write!(f, "{s}")
    }
}

/// Engagement-model → meta-challenge vulnerability cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VulnerabilityRating {
    H,
    M,
    L,
}

impl VulnerabilityRating {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "H" => Some(VulnerabilityRating::H),
            "M" => Some(VulnerabilityRating::M),
            "L" => Some(VulnerabilityRating::L),
            _ => None,
        }
    }
}

impl Display for VulnerabilityRating {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let s = match self {
            VulnerabilityRating::H => "H",
            VulnerabilityRating::M => "M",
            VulnerabilityRating::L => "L",
        };
        write!(f, "{s}")
    }
}

/// Either rating vocabulary; serializes as the bare letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rating {
    Compatibility(CompatibilityRating),
    Vulnerability(VulnerabilityRating),
}

/// Qualifier attached to certain edge types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeSubType {
    Required,
    Optional,
    Primary,
    Secondary,
    Favours,
    Disfavours,
}

/// Optional payload carried by an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_type: Option<EdgeSubType>,
}

impl EdgeData {
    pub fn sub_typed(sub_type: EdgeSubType) -> Self {
        EdgeData {
            sub_type: Some(sub_type),
            ..EdgeData::default()
        }
    }
}

/// A directed, typed relationship between two resolved ids.
///
/// Edge ids are deterministic but carry no meaning beyond uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub edge_type: String,
    #[serde(default)]
    pub data: EdgeData,
}

/// A rendered cluster grouping. Only the [`MAIN_CLUSTER_IDS`] trio ever
/// becomes a combo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combo {
    pub id: String,
    pub label: String,
    pub data: YamlValue,
}

/// The assembled artifact handed to the presentation layer. The
/// presentation layer never re-parses YAML; this is the sole hand-off
/// point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
    pub canvas_nodes: Vec<CanvasNode>,
    /// Claims and sources: resolvable and displayable, never drawn.
    pub off_canvas_entities: Vec<Entity>,
    pub edges: Vec<GraphEdge>,
    pub combos: Vec<Combo>,
}

/// One unresolved-reference diagnostic. Warnings are accumulated as data
/// and never thrown; the pipeline always completes and returns whatever
/// graph it could assemble alongside the full list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineWarning {
    pub source_entity: String,
    pub field: String,
    pub unresolved_value: String,
    pub message: String,
}

impl PipelineWarning {
    pub fn unresolved(source_entity: &str, field: &str, value: &str) -> Self {
        PipelineWarning {
            source_entity: source_entity.to_string(),
            field: field.to_string(),
            unresolved_value: value.to_string(),
            message: format!(
                "Could not resolve reference \"{value}\" from {source_entity}.{field}"
            ),
        }
    }
}

impl Display for PipelineWarning {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}.{}] {}", self.source_entity, self.field, self.message)
    }
}

/// Diagnostic statistics computed from the assembled artifact. All maps
/// are ordered so repeated builds print identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub node_counts_by_type: BTreeMap<EntityType, usize>,
    pub canvas_node_count: usize,
    pub off_canvas_count: usize,
    pub edge_count: usize,
    pub edge_counts_by_type: BTreeMap<String, usize>,
    pub combo_count: usize,
    pub combo_membership: BTreeMap<String, usize>,
    pub warning_count: usize,
}

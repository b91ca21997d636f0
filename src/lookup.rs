//! Entity Index / Lookup Engine.
//!
//! Indexes every parsed entity by id and by lowercased authoring key, and
//! resolves free-text references through a fixed six-tier cascade:
//!
//! 1. Exact id match
//! 2. Exact YAML key match (case-insensitive)
//! 3. Parenthetical content tried as an exact id
//! 4. Parentheticals stripped, exact YAML key match retried
//! 5. Substring / word-level match, non-cluster entities first
//! 6. Cluster letter mapping (`"A"` → `"CL_A"`)
//!
//! The ordering is the load-bearing design decision: it biases toward
//! precision over recall, and toward non-cluster entities over cluster
//! entities, so that matrix-style cluster metadata records never swallow
//! ambiguous substring matches. Each tier is a pure matcher; `resolve`
//! walks them in order and takes the first hit.
//!
//! Resolution never fails the build. A full-cascade miss appends one
//! [`PipelineWarning`] and returns `None` so the caller can drop that
//! single edge and continue.

use std::collections::BTreeMap;

use crate::{
    properties::{Entity, EntityType, PipelineWarning},
    text::{
        cluster_letter_to_id, extract_cluster_letters, extract_parenthetical, significant_words,
        strip_parentheticals, substring_match,
    },
};

/// Where a reference came from, for warning attribution.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub source_entity: &'a str,
    pub field: &'a str,
}

impl<'a> ResolveContext<'a> {
    pub fn new(source_entity: &'a str, field: &'a str) -> Self {
        ResolveContext {
            source_entity,
            field,
        }
    }
}

/// Entity resolution engine. Built once per pipeline run and passed by
/// reference into every extraction function; each build gets its own
/// instance.
#[derive(Debug, Default)]
pub struct EntityLookup {
    /// All indexed entities in insertion order; tier-5 scan order follows
    /// this order.
    entities: Vec<Entity>,
    by_id: BTreeMap<String, usize>,
    /// Lowercased yaml_key → entity; later entries win on collision.
    by_yaml_key: BTreeMap<String, usize>,
    /// Indices of non-cluster entities, preferred during tier 5.
    non_cluster: Vec<usize>,
    /// Indices of cluster entities, the tier-5 fallback pool.
    clusters: Vec<usize>,
    warnings: Vec<PipelineWarning>,
}

impl EntityLookup {
    /// Index entities for resolution.
    pub fn index(&mut self, entities: &[Entity]) {
        for entity in entities {
            let idx = self.entities.len();
            self.by_id.insert(entity.id.clone(), idx);
            self.by_yaml_key.insert(entity.yaml_key.to_lowercase(), idx);
            if entity.entity_type == EntityType::Cluster {
                self.clusters.push(idx);
            } else {
                self.non_cluster.push(idx);
            }
            self.entities.push(entity.clone());
        }
    }

    /// Resolve a reference string to an entity id, or record a warning
    /// and return `None`.
    pub fn resolve(&mut self, reference: &str, ctx: ResolveContext<'_>) -> Option<String> {
        let trimmed = reference.trim();

        let resolved = self
            .match_exact_id(trimmed)
            .or_else(|| self.match_exact_key(trimmed))
            .or_else(|| self.match_parenthetical_id(trimmed))
            .or_else(|| self.match_stripped_key(trimmed))
            .or_else(|| self.match_fuzzy(trimmed))
            .or_else(|| self.match_cluster_letter(trimmed));

        if resolved.is_none() {
            tracing::debug!(
                "Unresolved reference \"{trimmed}\" from {}.{}",
                ctx.source_entity,
                ctx.field
            );
            self.warnings.push(PipelineWarning::unresolved(
                ctx.source_entity,
                ctx.field,
                trimmed,
            ));
        }
        resolved
    }

    /// Resolve a list of references, silently dropping misses (each miss
    /// has already recorded its own warning).
    pub fn resolve_all(&mut self, references: &[String], ctx: ResolveContext<'_>) -> Vec<String> {
        references
            .iter()
            .filter_map(|r| self.resolve(r, ctx))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.by_id.get(id).map(|&idx| &self.entities[idx])
    }

    pub fn has(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn warnings(&self) -> &[PipelineWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<PipelineWarning> {
        self.warnings
    }

    // ── cascade tiers ────────────────────────────────────────────

    /// Tier 1: the reference is itself a known id.
    fn match_exact_id(&self, trimmed: &str) -> Option<String> {
        self.has(trimmed).then(|| trimmed.to_string())
    }

    /// Tier 2: case-insensitive authoring-key match.
    fn match_exact_key(&self, trimmed: &str) -> Option<String> {
        self.by_yaml_key
            .get(&trimmed.to_lowercase())
            .map(|&idx| self.entities[idx].id.clone())
    }

    /// Tier 3: `"Task Initiation Failure (FP01)"` → try `FP01` as an id.
    /// Runs before substring matching so coded ids in parentheticals beat
    /// fuzzy hits on the surrounding prose.
    fn match_parenthetical_id(&self, trimmed: &str) -> Option<String> {
        let content = extract_parenthetical(trimmed)?;
        self.get(&content).map(|e| e.id.clone())
    }

    /// Tier 4: strip parentheticals, retry the key match on what remains.
    fn match_stripped_key(&self, trimmed: &str) -> Option<String> {
        let stripped = strip_parentheticals(trimmed);
        if stripped.is_empty() || stripped == trimmed {
            return None;
        }
        self.by_yaml_key
            .get(&stripped.to_lowercase())
            .map(|&idx| self.entities[idx].id.clone())
    }

    /// Tier 5: substring and word-level matching over the stripped text,
    /// non-cluster entities first, cluster entities only when nothing
    /// else matched.
    fn match_fuzzy(&self, trimmed: &str) -> Option<String> {
        let stripped = strip_parentheticals(trimmed);
        let search = if stripped.is_empty() {
            trimmed.to_string()
        } else {
            stripped
        };
        if search.chars().count() < 3 {
            return None;
        }

        // 5a. A non-cluster key contains the search text.
        for &idx in &self.non_cluster {
            if substring_match(&self.entities[idx].yaml_key, &search) {
                return Some(self.entities[idx].id.clone());
            }
        }

        // 5b. The search text contains a non-cluster key. Keys under five
        // characters are excluded to avoid noise matches.
        for &idx in &self.non_cluster {
            let key = &self.entities[idx].yaml_key;
            if key.chars().count() >= 5 && substring_match(&search, key) {
                return Some(self.entities[idx].id.clone());
            }
        }

        // 5c. Word-level: every significant search token appears in the
        // key or in the label.
        let words = significant_words(&search);
        if words.len() >= 2 {
            for &idx in &self.non_cluster {
                let entity = &self.entities[idx];
                let key = entity.yaml_key.to_lowercase();
                let label = entity.label.to_lowercase();
                if words.iter().all(|w| key.contains(w))
                    || words.iter().all(|w| label.contains(w))
                {
                    return Some(entity.id.clone());
                }
            }
        }

        // 5d. Fall back to cluster entities.
        for &idx in &self.clusters {
            if substring_match(&self.entities[idx].yaml_key, &search) {
                return Some(self.entities[idx].id.clone());
            }
        }
        if words.len() >= 2 {
            for &idx in &self.clusters {
                let key = self.entities[idx].yaml_key.to_lowercase();
                if words.iter().all(|w| key.contains(w)) {
                    return Some(self.entities[idx].id.clone());
                }
            }
        }

        None
    }

    /// Tier 6: a lone cluster letter, a leading-letter prefix, or an
    /// `"and X"` fragment maps to `CL_<letter>` when that id exists.
    fn match_cluster_letter(&self, trimmed: &str) -> Option<String> {
        let letters = extract_cluster_letters(trimmed);
        if letters.len() == 1 {
            let cluster_id = cluster_letter_to_id(&letters[0]);
            if self.has(&cluster_id) {
                return Some(cluster_id);
            }
        }
        if matches!(trimmed, "A" | "B" | "C") {
            let cluster_id = cluster_letter_to_id(trimmed);
            if self.has(&cluster_id) {
                return Some(cluster_id);
            }
        }
        None
    }
}

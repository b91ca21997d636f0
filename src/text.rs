//! String heuristics shared by the lookup cascade and combo assignment.
//!
//! Authored references arrive as free text: display names with
//! parenthetical annotations (`"Task Initiation Failure (FP01)"`,
//! `"Time Blindness (primary)"`) and cluster fields mixing letters with
//! prose (`"A and C (convergence point)"`, `"Standalone"`). These helpers
//! normalize that text without attempting any real language understanding.

use once_cell::sync::Lazy;
use regex::Regex;

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("valid regex"));
static PAREN_CONTENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("valid regex"));
static CLUSTER_LEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-C])\b").expect("valid regex"));
static CLUSTER_AND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\band\s+([A-C])\b").expect("valid regex"));
static WORD_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-—]+").expect("valid regex"));

/// Remove every parenthetical annotation.
/// `"Task Initiation Failure (FP01)"` → `"Task Initiation Failure"`.
pub fn strip_parentheticals(s: &str) -> String {
    PARENTHETICAL.replace_all(s, "").trim().to_string()
}

/// Content of the first parenthetical, if any.
/// `"Task Initiation Failure (FP01)"` → `Some("FP01")`.
pub fn extract_parenthetical(s: &str) -> Option<String> {
    PAREN_CONTENT
        .captures(s)
        .map(|caps| caps[1].trim().to_string())
}

/// Case-insensitive substring containment.
pub fn substring_match(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Lowercased tokens of at least three characters, split on whitespace
/// and dashes. Used for word-level matching.
pub fn significant_words(s: &str) -> Vec<String> {
    WORD_SEPARATOR
        .split(&s.to_lowercase())
        .filter(|w| w.chars().count() >= 3)
        .map(|w| w.to_string())
        .collect()
}

/// Extract cluster letter(s) from a problem's `cluster` field.
///
/// `"A — Time-Perception Cascade"` → `["A"]`,
/// `"A and C (convergence point)"` → `["A", "C"]`,
/// `"Standalone"` / `"Cross-cluster amplifier"` → `[]`.
///
/// Only letters A–C with the literal separator word `and` are
/// recognized; the corpus defines exactly three main clusters.
pub fn extract_cluster_letters(cluster_field: &str) -> Vec<String> {
    if cluster_field.is_empty()
        || cluster_field == "Standalone"
        || cluster_field.starts_with("Cross-cluster")
    {
        return Vec::new();
    }

    let mut letters = Vec::new();
    if let Some(caps) = CLUSTER_LEAD.captures(cluster_field) {
        letters.push(caps[1].to_string());
    }
    for caps in CLUSTER_AND.captures_iter(cluster_field) {
        letters.push(caps[1].to_string());
    }
    letters
}

/// Map a cluster letter to its entity id: `"A"` → `"CL_A"`.
pub fn cluster_letter_to_id(letter: &str) -> String {
    format!("CL_{}", letter.to_uppercase())
}

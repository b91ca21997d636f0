//! # ontograph
//!
//! A Rust library for compiling a human-authored YAML system-of-record into a
//! validated, strongly-typed knowledge graph artifact.
//!
//! ## Overview
//!
//! ontograph is the build pipeline behind an interactive knowledge-graph
//! explorer. Authors maintain a curated domain model — problems, mechanisms,
//! engagement models, meta-challenges, foundations, technologies,
//! implications, claims, and sources — as cross-referencing YAML records.
//! Those cross-references are free text: display names with parenthetical
//! annotations, abbreviations, cluster letters, and inconsistent casing. The
//! pipeline turns that loosely-structured text into a deterministic graph
//! artifact the presentation layer can render without ever re-parsing YAML.
//!
//! ### Key Features
//!
//! - **Layered entity resolution**: a six-tier heuristic cascade maps
//!   free-text references to canonical ids, biased toward precision over
//!   recall (see [`lookup::EntityLookup`])
//! - **Typed edge extraction**: a fixed, enumerable field table per record
//!   type produces a closed vocabulary of directed edge types
//! - **Cluster combos and convergence points**: problems belonging to two or
//!   more clusters keep a primary membership plus secondary cluster links
//! - **Warnings as data**: an unresolved reference drops one edge and records
//!   one [`properties::PipelineWarning`]; the build always completes
//! - **Batch validation**: referential-integrity checks over the finished
//!   artifact gate deployment without ever throwing
//!
//! ## Pipeline
//!
//! ```text
//! YAML directory
//!   └─ corpus::parse_all_entities      uniform Entity lists
//!        └─ lookup::EntityLookup      id + key index, resolution cascade
//!             ├─ extract::extract_all_edges          entity cross-references
//!             └─ compatibility::parse_compatibility_matrix   rating matrix
//!        └─ combos::assign_combos     canvas nodes + combo groupings
//!   └─ pipeline::build_graph          artifact + warnings + stats
//!        └─ validate::validate_graph  pass/fail integrity report
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ontograph::{pipeline, validate};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ontograph::OntographError> {
//!     let result = pipeline::build_graph(Path::new("System_of_Record"))?;
//!
//!     for warning in &result.warnings {
//!         eprintln!("{warning}");
//!     }
//!
//!     let report = validate::validate_graph(&result.graph);
//!     assert!(report.passed());
//!
//!     pipeline::write_artifact(Path::new("graph.json"), &result.graph)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Model
//!
//! Two severities only. A missing or malformed input file is **fatal** —
//! these are configuration-time files, so the build aborts with no partial
//! artifact. Every single unresolved reference is a **warning**, accumulated
//! in a list the caller inspects after the fact. The pipeline is a pure,
//! idempotent transform: re-running on unchanged input reproduces the same
//! artifact and the same warnings.
//!
//! ## Module Guide
//!
//! Start with [`pipeline::build_graph`] for the one-call build, then explore
//! [`lookup`] for the resolution cascade and [`extract`] for the per-type
//! reference field tables. See [`properties`] for the entity, edge, and
//! artifact shapes.

pub mod combos;
pub mod compatibility;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod lookup;
pub mod pipeline;
pub mod properties;
pub mod text;
pub mod validate;

pub use error::*;

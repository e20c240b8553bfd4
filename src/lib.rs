// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # ontomatch
//!
//! Ontology alignment: find correspondences between the classes, properties
//! and individuals of two independently authored knowledge bases.
//!
//! ## Architecture
//!
//! - **Alignment** (`alignment`): deduplicated, bidirectionally indexed mapping set,
//!   with TSV and RDF-Alignment I/O
//! - **Engine** (`matcher`): pairwise scorers fanned out over a bounded rayon pool
//! - **Scorers** (`matcher::*`): lexical, string, word, structural, value,
//!   background-knowledge and property matching
//! - **Selection** (`selection`): greedy cardinality filtering and repair
//! - **Pipeline** (`pipeline`): size-aware stage planning folded over one alignment
//!
//! ## Library usage
//!
//! ```no_run
//! use std::path::Path;
//! use ontomatch::context::MatchContext;
//! use ontomatch::pipeline::Pipeline;
//!
//! let ctx = MatchContext::load(Path::new("source.json"), Path::new("target.json"), None).unwrap();
//! let outcome = Pipeline::from_config(ctx.config()).unwrap().run(&ctx).unwrap();
//! println!("{} mappings", outcome.alignment.len());
//! ```

pub mod alignment;
pub mod combination;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod matcher;
pub mod ontology;
pub mod pipeline;
pub mod selection;
pub mod similarity;

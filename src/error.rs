//! Rich diagnostic error types for the ontomatch engine.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes, help text, and source chains so callers know exactly
//! what went wrong and how to fix it.
//!
//! Two failure classes are deliberately *not* errors: a scoring task that panics
//! inside the parallel engine (the pair is dropped and logged), and an
//! [`Alignment::add`](crate::alignment::Alignment::add) that violates the
//! knowledge-base partition (it returns `false`).

use miette::Diagnostic;
use thiserror::Error;

use crate::entity::EntityType;

/// Top-level error type for the ontomatch engine.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum OntoMatchError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ontology(#[from] OntologyError),
}

// ---------------------------------------------------------------------------
// Matching errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MatchError {
    #[error("matcher {matcher} does not support entity type {kind}")]
    #[diagnostic(
        code(ontomatch::matcher::unsupported_type),
        help(
            "Each matcher declares the entity types it can score. \
             Check the pipeline configuration or pick a matcher that \
             handles this entity type."
        )
    )]
    UnsupportedEntityType { matcher: String, kind: EntityType },

    #[error("combination weight {weight} is outside [0, 1]")]
    #[diagnostic(
        code(ontomatch::matcher::invalid_weight),
        help("Linear weighted combination needs a weight between 0.0 and 1.0 inclusive.")
    )]
    InvalidWeight { weight: f64 },

    #[error("threshold {threshold} is outside [0, 1]")]
    #[diagnostic(
        code(ontomatch::matcher::invalid_threshold),
        help("Similarity thresholds are compared against scores in [0, 1].")
    )]
    InvalidThreshold { threshold: f64 },

    #[error("failed to build the scoring thread pool: {message}")]
    #[diagnostic(
        code(ontomatch::matcher::thread_pool),
        help(
            "The worker pool could not be started. Lower `threads` in the \
             configuration or leave it unset to use the available parallelism."
        )
    )]
    ThreadPool { message: String },
}

// ---------------------------------------------------------------------------
// Alignment file format errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum FormatError {
    #[error("I/O error on {path}")]
    #[diagnostic(
        code(ontomatch::format::io),
        help("Check that the file exists and that you have the right permissions.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unrecognized alignment file extension: {path}")]
    #[diagnostic(
        code(ontomatch::format::extension),
        help("Alignment files must end in `.tsv`, `.rdf` or `.xml`.")
    )]
    UnrecognizedExtension { path: String },

    #[error("unrecognized alignment file header: {detail}")]
    #[diagnostic(
        code(ontomatch::format::header),
        help(
            "TSV alignments start with `#ontomatch alignment` followed by the \
             source and target ontology lines. RDF alignments need an \
             `<Alignment>` element."
        )
    )]
    UnrecognizedFormat { detail: String },

    #[error("malformed row at line {line}: expected 6 or 7 columns, found {columns}")]
    #[diagnostic(
        code(ontomatch::format::malformed_row),
        help(
            "Every mapping row needs source URI, source label, target URI, \
             target label, similarity, relation and an optional status, \
             separated by tabs."
        )
    )]
    MalformedRow { line: u64, columns: usize },

    #[error("XML error: {message}")]
    #[diagnostic(
        code(ontomatch::format::xml),
        help("The RDF alignment document is not well-formed XML.")
    )]
    Xml { message: String },

    #[error("TSV error: {message}")]
    #[diagnostic(
        code(ontomatch::format::tsv),
        help("The TSV alignment could not be read or written.")
    )]
    Csv { message: String },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read match config: {path}")]
    #[diagnostic(
        code(ontomatch::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse match config: {path}: {message}")]
    #[diagnostic(
        code(ontomatch::config::parse),
        help("Check the TOML syntax and the field names in the config file.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write match config: {path}")]
    #[diagnostic(
        code(ontomatch::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value for `{field}`: {message}")]
    #[diagnostic(
        code(ontomatch::config::invalid),
        help("Thresholds and weights must lie in [0, 1]; batch_size must be positive.")
    )]
    Invalid { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Ontology snapshot errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OntologyError {
    #[error("failed to read ontology snapshot: {path}")]
    #[diagnostic(
        code(ontomatch::ontology::io),
        help("Check that the snapshot file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ontology snapshot: {path}: {message}")]
    #[diagnostic(
        code(ontomatch::ontology::parse),
        help("Snapshots are JSON documents with `uri` and an `entities` array.")
    )]
    Parse { path: String, message: String },

    #[error("entity {id} is declared twice in {ontology}")]
    #[diagnostic(
        code(ontomatch::ontology::duplicate),
        help("Entity ids must be unique within a knowledge base.")
    )]
    DuplicateEntity { id: u32, ontology: String },

    #[error("entity {id} is referenced but never declared")]
    #[diagnostic(
        code(ontomatch::ontology::unknown_entity),
        help("Declare the entity before using it as a parent, domain or range.")
    )]
    UnknownEntity { id: u32 },
}

/// Result type for matcher and engine operations.
pub type MatchResult<T> = std::result::Result<T, MatchError>;

/// Result type for alignment file operations.
pub type FormatResult<T> = std::result::Result<T, FormatError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for ontology snapshot operations.
pub type OntologyResult<T> = std::result::Result<T, OntologyError>;

/// Convenience alias for functions returning ontomatch results.
pub type OntoResult<T> = std::result::Result<T, OntoMatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_error_converts_to_top_level() {
        let err: OntoMatchError = MatchError::InvalidWeight { weight: 1.5 }.into();
        assert!(matches!(err, OntoMatchError::Match(_)));
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn unsupported_type_names_matcher_and_kind() {
        let err = MatchError::UnsupportedEntityType {
            matcher: "value".into(),
            kind: EntityType::Class,
        };
        let msg = err.to_string();
        assert!(msg.contains("value"));
        assert!(msg.contains("class"));
    }

    #[test]
    fn diagnostic_codes_are_namespaced() {
        let err = FormatError::MalformedRow { line: 7, columns: 3 };
        let code = err.code().map(|c| c.to_string()).unwrap_or_default();
        assert_eq!(code, "ontomatch::format::malformed_row");
    }
}

//! Error types for the diagram/RDF bridge core.

use thiserror::Error;

/// Core error type shared by every bridge component.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// An IRI string failed basic validation.
    #[error("Invalid IRI: {0}")]
    InvalidIri(String),

    /// A label used a prefix bound neither by defaults, user JSON, nor any
    /// reference file (see `4.A Prefix registry` and `4.C Term reconciler`).
    #[error("Unknown prefix: {0}")]
    UnknownPrefix(String),

    /// `PrefixRegistry::shorten` was asked to abbreviate an IRI whose
    /// namespace has no bound prefix.
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    /// Layout was invoked on a graph that was not first passed through the
    /// grid-allocation and draw-position passes.
    #[error("Missing layout key '{key}' on node {node_id}")]
    MissingRequiredLayoutKey { key: &'static str, node_id: usize },

    /// The rank subgraph handed to the decomposer still contains a cycle
    /// after self-loop removal.
    #[error("Cycle in rank subgraph involving node {0}")]
    CycleInRankSubgraph(usize),

    /// Aggregate of diagram-validation failures, only raised in
    /// non-classes-only mode.
    #[error("Structural diagram error(s): {0:?}")]
    StructuralDiagramError(Vec<DiagramIssue>),

    /// Turtle or diagram parsing failures.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Turtle serialization failures.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration errors.
    #[error("Configuration error: {parameter}: {message}")]
    ConfigError { parameter: String, message: String },

    /// I/O errors, surfaced verbatim from file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON (prefixes file) errors.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// One offending element of a [`BridgeError::StructuralDiagramError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagramIssue {
    /// A term cell participates in no relationship.
    DisconnectedTerm { cell_id: String },
    /// A relationship cell is missing a source or target endpoint.
    DanglingArrow { cell_id: String },
    /// A cell's `value` is empty where a label is required.
    BlankLabel { cell_id: String },
    /// An edge cell has no resolvable parent/child attachment.
    MissingAttachment { cell_id: String },
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

//! Well-known vocabulary IRIs and tuning constants for the bridge pipeline.
//!
//! Centralizing these avoids the magic strings and magic numbers that would
//! otherwise be scattered across the reconciler, translators, and layout
//! engine.

/// RDF vocabulary.
pub mod rdf {
    pub const NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
}

/// RDFS vocabulary.
pub mod rdfs {
    pub const NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";
    pub const SUB_PROPERTY_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subPropertyOf";
    pub const DOMAIN: &str = "http://www.w3.org/2000/01/rdf-schema#domain";
    pub const RANGE: &str = "http://www.w3.org/2000/01/rdf-schema#range";
    pub const LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
}

/// OWL vocabulary.
pub mod owl {
    pub const NS: &str = "http://www.w3.org/2002/07/owl#";
    pub const CLASS: &str = "http://www.w3.org/2002/07/owl#Class";
    pub const OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#ObjectProperty";
    pub const DATATYPE_PROPERTY: &str = "http://www.w3.org/2002/07/owl#DatatypeProperty";
    pub const ANNOTATION_PROPERTY: &str = "http://www.w3.org/2002/07/owl#AnnotationProperty";
    pub const UNION_OF: &str = "http://www.w3.org/2002/07/owl#unionOf";
    pub const INTERSECTION_OF: &str = "http://www.w3.org/2002/07/owl#intersectionOf";
    pub const COMPLEMENT_OF: &str = "http://www.w3.org/2002/07/owl#complementOf";
}

/// SKOS vocabulary.
pub mod skos {
    pub const NS: &str = "http://www.w3.org/2004/02/skos/core#";
    pub const ALT_LABEL: &str = "http://www.w3.org/2004/02/skos/core#altLabel";
    pub const EXACT_MATCH: &str = "http://www.w3.org/2004/02/skos/core#exactMatch";
}

/// XSD vocabulary.
pub mod xsd {
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
}

/// DCTERMS vocabulary, bound by default per `4.A Prefix registry`.
pub mod dcterms {
    pub const NS: &str = "http://purl.org/dc/terms/";
}

/// The `mds` (model diagramming support) vocabulary the reconciler falls
/// back to and the graph model uses for synthetic collection nodes.
pub mod mds {
    pub const NS: &str = "https://example.org/mds/";
    pub const HAS_COLLECTION_MEMBER: &str = "https://example.org/mds/hasCollectionMember";
    pub const COLLECTION_TYPE: &str = "https://example.org/mds/CollectionType";
    pub const TRIPLE_SYNTAX_SUGAR: &str = "https://example.org/mds/TripleSyntaxSugar";
}

/// Tuning constants governing term reconciliation, layout, and defaults.
pub mod config {
    /// Default prefix unprefixed diagram labels are reconciled under (`4.C`).
    pub const DEFAULT_PREFIX: &str = "mds";

    /// Fuzzy-match cutoff for reconciling a free-form diagram label (`4.C`).
    pub const FUZZY_CUTOFF_LABEL: f64 = 75.0;

    /// Fuzzy-match cutoff for matching a diagram edge label against the
    /// configured rank-term set (`4.F`).
    pub const FUZZY_CUTOFF_RANK: f64 = 85.0;

    /// Fuzzy-match cutoff used when resolving datatype annotations (`4.B`).
    pub const FUZZY_CUTOFF_DATATYPE: f64 = 90.0;

    /// Default fixed shape width in pixels used by the layout engine (`4.H`).
    pub const DEFAULT_SHAPE_WIDTH: f64 = 160.0;

    /// Default fixed shape height in pixels used by the layout engine (`4.H`).
    pub const DEFAULT_SHAPE_HEIGHT: f64 = 40.0;

    /// Default horizontal padding between grid cells, in pixels.
    pub const DEFAULT_PADDING_X: f64 = 40.0;

    /// Default vertical padding between grid cells, in pixels.
    pub const DEFAULT_PADDING_Y: f64 = 40.0;

    /// Default residual-prefix counter seed (`gns0`, `gns1`, ...).
    pub const DEFAULT_PREFIX_FALLBACK: &str = "gns";
}

/// The default rank predicates that seed `is_rank` classification until a
/// defaults folder contributes further stratifying properties (`4.D`, `4.E`).
pub const DEFAULT_RANK_PREDICATES: &[&str] = &[rdfs::SUB_CLASS_OF, rdf::TYPE];

/// Default prefix bindings every registry is seeded with (`4.A`).
pub const DEFAULT_PREFIX_BINDINGS: &[(&str, &str)] = &[
    ("rdf", rdf::NS),
    ("rdfs", rdfs::NS),
    ("owl", owl::NS),
    ("dcterms", dcterms::NS),
    ("skos", skos::NS),
];

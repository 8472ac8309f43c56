//! Error types shared by every atlas component.

/// Result alias for atlas operations.
pub type AtlasResult<T> = Result<T, AtlasError>;

/// Errors raised while building or querying an atlas.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtlasError {
    #[error("direction should be either 'up' or 'down', got '{0}'")]
    InvalidDirection(String),

    #[error("invalid hemisphere '{0}': expected 'left' or 'right'")]
    InvalidHemisphere(String),

    #[error("scheme '{scheme}' references ids missing from the store: {missing:?}")]
    SchemeValidation { scheme: String, missing: Vec<i64> },

    #[error("unknown region id {0}")]
    UnknownId(i64),

    #[error("no region matches '{0}'")]
    NotFound(String),

    #[error("unknown mapping scheme '{0}'")]
    UnknownScheme(String),

    #[error("mapping '{scheme}' has {actual} rows, expected {expected}")]
    TableShape {
        scheme: String,
        expected: usize,
        actual: usize,
    },

    #[error("mapping '{scheme}' points at position {position}, store has {len} rows")]
    PositionOutOfRange {
        scheme: String,
        position: usize,
        len: usize,
    },

    #[error("mapping '{0}' does not keep void at position 0")]
    VoidNotPinned(String),

    #[error("invalid taxonomy: {0}")]
    Store(#[from] StoreError),

    #[error("mapping table codec: {0}")]
    Codec(String),
}

/// Malformed raw hierarchy rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("hierarchy is empty")]
    Empty,

    #[error("first row must be the void region (id 0), found id {0}")]
    MissingVoid(i64),

    #[error("no root region (a non-void row without parent)")]
    MissingRoot,

    #[error("region id {0} must be positive")]
    NonPositiveId(i64),

    #[error("duplicate region id {0}")]
    DuplicateId(i64),

    #[error("region {id} references missing parent {parent}")]
    MissingParent { id: i64, parent: i64 },
}

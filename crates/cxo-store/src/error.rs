use cxo_schema::SchemaError;
use cxo_types::Reference;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(Reference),

    /// Stored bytes don't hash to the reference they were stored under.
    #[error("hash mismatch for {reference}: computed {computed}")]
    HashMismatch {
        reference: Reference,
        computed: Reference,
    },

    /// The object doesn't fit its schema, or the schema is unknown.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A backend lock was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

//! Error types for schemas, registries and values.

use cxo_types::SchemaRef;

use crate::kind::Kind;

/// Errors produced while building registries, decoding schemas, sizing
/// encoded data and reading values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    // ---------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------
    /// No schema is registered under the name.
    #[error("missing schema {0:?}")]
    MissingSchema(String),

    /// No schema has the identifier. Expected when a peer references a
    /// schema that has not arrived yet.
    #[error("missing schema {0}")]
    MissingSchemaRef(SchemaRef),

    /// The Rust type was never registered in this registry.
    #[error("type {0} is not registered")]
    UnregisteredType(&'static str),

    /// The registry was decoded from the wire and knows no local types.
    #[error("registry is not build-capable: it was decoded, not declared")]
    NotBuildCapable,

    // ---------------------------------------------------------------
    // Wire decoding
    // ---------------------------------------------------------------
    /// An encoded schema uses a discriminator/kind combination outside the
    /// recognized set.
    #[error("invalid encoded schema")]
    InvalidEncodedSchema,

    /// Input ended before a primitive could be read.
    #[error("unexpected end of data: need {need} bytes, have {have}")]
    UnexpectedEnd { need: usize, have: usize },

    // ---------------------------------------------------------------
    // Values
    // ---------------------------------------------------------------
    /// Computed size exceeds the available data.
    #[error("invalid schema or data")]
    InvalidSchemaOrData,

    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no such field: {0:?}")]
    NoSuchField(String),

    /// A dynamic reference names an object but no schema.
    #[error("invalid dynamic reference")]
    InvalidDynamicReference,

    /// A value accessor was used on a value of another kind.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: &'static str, actual: Kind },

    #[error("invalid UTF-8 in string value")]
    InvalidUtf8,

    // ---------------------------------------------------------------
    // Registration (declaration mistakes)
    // ---------------------------------------------------------------
    #[error("empty name")]
    EmptyName,

    #[error("name already registered: {0}")]
    DuplicateName(String),

    #[error("type {type_name} already registered as {name}")]
    DuplicateType {
        type_name: &'static str,
        name: String,
    },

    /// Reference marker types are annotations, not storable types.
    #[error("can't register reference type {0}")]
    ReferenceType(&'static str),

    /// A reference field has no `schema=` tag naming its target.
    #[error("reference field {field} needs a schema tag: {reason}")]
    MissingReferenceTag { field: String, reason: String },

    /// References are allowed only as a struct field's own schema.
    #[error("reference type {0} is not allowed in arrays and slices")]
    NestedReference(&'static str),

    /// An unregistered type contains itself and can't be described finitely.
    #[error("recursive type {0} must be registered")]
    RecursiveType(&'static str),
}

/// Convenience alias for schema results.
pub type SchemaResult<T> = Result<T, SchemaError>;

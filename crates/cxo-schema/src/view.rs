//! Registry-bound views over schemas.

use std::fmt;

use cxo_crypto::ContentHasher;
use cxo_types::SchemaRef;

use crate::codec::encode_schema;
use crate::error::{SchemaError, SchemaResult};
use crate::kind::{Kind, ReferenceKind};
use crate::registry::Registry;
use crate::schema::{Field, Schema};

/// A schema paired with the registry that owns it.
///
/// Placeholders are followed transparently: a view always points at a full
/// schema, never at a placeholder.
#[derive(Clone, Copy)]
pub struct SchemaView<'r> {
    registry: &'r Registry,
    schema: &'r Schema,
}

impl<'r> SchemaView<'r> {
    pub(crate) fn new(registry: &'r Registry, schema: &'r Schema) -> Self {
        Self { registry, schema }
    }

    /// Follow a placeholder to its registry entry.
    fn resolve(registry: &'r Registry, schema: &'r Schema) -> SchemaResult<Self> {
        match schema {
            Schema::Placeholder(p) => p
                .slot()
                .and_then(|slot| registry.slot(slot))
                .map(|schema| Self::new(registry, schema))
                .ok_or_else(|| SchemaError::MissingSchema(p.name().to_string())),
            schema => Ok(Self::new(registry, schema)),
        }
    }

    pub fn schema(&self) -> &'r Schema {
        self.schema
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn kind(&self) -> Kind {
        self.schema.kind()
    }

    pub fn name(&self) -> Option<&'r str> {
        self.schema.name()
    }

    pub fn is_reference(&self) -> bool {
        self.schema.is_reference()
    }

    pub fn reference_kind(&self) -> Option<ReferenceKind> {
        self.schema.reference_kind()
    }

    /// Element schema of an array or slice, or target schema of a Single or
    /// Slice reference.
    pub fn elem(&self) -> SchemaResult<SchemaView<'r>> {
        match self.schema {
            Schema::Array { elem, .. } | Schema::Slice { elem, .. } => {
                Self::resolve(self.registry, elem)
            }
            Schema::Reference {
                target: Some(target),
                ..
            } => Self::resolve(self.registry, target),
            _ => Err(SchemaError::TypeMismatch {
                expected: "array, slice or typed reference",
                actual: self.kind(),
            }),
        }
    }

    /// Length of an array schema.
    pub fn array_len(&self) -> Option<usize> {
        match self.schema {
            Schema::Array { length, .. } => Some(*length),
            _ => None,
        }
    }

    fn field_slice(&self) -> &'r [Field] {
        match self.schema {
            Schema::Struct { fields, .. } => fields,
            _ => &[],
        }
    }

    /// Struct fields in declaration order; empty for other kinds.
    pub fn fields(&self) -> impl Iterator<Item = FieldView<'r>> + 'r {
        let registry = self.registry;
        self.field_slice()
            .iter()
            .map(move |field| FieldView { registry, field })
    }

    pub fn field_count(&self) -> usize {
        self.field_slice().len()
    }

    pub fn field(&self, index: usize) -> Option<FieldView<'r>> {
        self.field_slice().get(index).map(|field| FieldView {
            registry: self.registry,
            field,
        })
    }

    /// First field named `name` with its index.
    pub fn field_by_name(&self, name: &str) -> Option<(usize, FieldView<'r>)> {
        self.fields().enumerate().find(|(_, f)| f.name() == name)
    }

    /// Encoded form of this schema.
    pub fn encode(&self) -> Vec<u8> {
        encode_schema(self.schema)
    }

    /// Identifier of this schema.
    pub fn schema_ref(&self) -> SchemaRef {
        ContentHasher::schema_ref(&self.encode())
    }
}

impl fmt::Debug for SchemaView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaView({})", self.schema)
    }
}

impl fmt::Display for SchemaView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.schema, f)
    }
}

/// A struct field bound to its registry.
#[derive(Clone, Copy)]
pub struct FieldView<'r> {
    registry: &'r Registry,
    field: &'r Field,
}

impl<'r> FieldView<'r> {
    pub fn name(&self) -> &'r str {
        &self.field.name
    }

    pub fn tag(&self) -> &'r str {
        &self.field.tag
    }

    pub fn schema(&self) -> SchemaResult<SchemaView<'r>> {
        SchemaView::resolve(self.registry, &self.field.schema)
    }
}

impl fmt::Debug for FieldView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldView({} {})", self.field.name, self.field.schema)
    }
}

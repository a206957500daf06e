//! A registry paired with a storage backend.
//!
//! [`Pack`] completes the dereference step the value accessor leaves open:
//! given a reference (and a schema, or a dynamic reference carrying one) it
//! fetches the bytes, checks them against their digest and against the
//! schema, and hands back an [`Object`] whose [`Value`] can be read.

use std::sync::Arc;

use cxo_crypto::ContentHasher;
use cxo_schema::{Dynamic, Encode, Registry, SchemaError, SchemaView, Value};
use cxo_types::Reference;

use crate::error::{StoreError, StoreResult};
use crate::traits::{Flags, ObjectStore};

/// Registry-bound object access over a store.
#[derive(Clone)]
pub struct Pack {
    registry: Arc<Registry>,
    store: Arc<dyn ObjectStore>,
}

impl Pack {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn ObjectStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn flags(&self) -> Flags {
        self.store.flags()
    }

    /// Raw bytes of an object, verified against its reference.
    pub fn object(&self, reference: &Reference) -> StoreResult<Vec<u8>> {
        let data = self.store.get(reference)?;
        if !ContentHasher::OBJECT.verify(&data, reference.as_bytes()) {
            return Err(StoreError::HashMismatch {
                reference: *reference,
                computed: ContentHasher::object_ref(&data),
            });
        }
        Ok(data)
    }

    /// Load an object of a known schema. The stored bytes must be exactly
    /// one value of that schema.
    pub fn load<'r>(&'r self, schema: SchemaView<'r>, reference: &Reference) -> StoreResult<Object<'r>> {
        let data = self.object(reference)?;
        if schema.size(&data)? != data.len() {
            return Err(SchemaError::InvalidSchemaOrData.into());
        }
        tracing::debug!(object = %reference.short_hex(), schema = %schema, "loaded object");
        Ok(Object { schema, data })
    }

    /// Load the object a dynamic reference points at, using the schema it
    /// carries. A blank dynamic reference is nil and loads nothing. Fails
    /// with `InvalidDynamicReference` when the schema half is blank but the
    /// object half isn't, and with `MissingSchemaRef` when the schema isn't
    /// in this registry.
    pub fn load_dynamic(&self, dynamic: &Dynamic) -> StoreResult<Option<Object<'_>>> {
        if dynamic.is_blank() {
            return Ok(None);
        }
        if !dynamic.is_valid() {
            return Err(SchemaError::InvalidDynamicReference.into());
        }
        let schema = self.registry.schema_by_reference(&dynamic.schema)?;
        self.load(schema, &dynamic.object).map(Some)
    }

    /// Encode `value`, store it and return its reference.
    pub fn save<T: Encode + ?Sized>(&self, value: &T) -> StoreResult<Reference> {
        self.store.add(value.to_bytes())
    }
}

impl std::fmt::Debug for Pack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pack")
            .field("registry", &self.registry.reference())
            .field("flags", &self.store.flags())
            .finish()
    }
}

/// Bytes of a loaded object together with their schema.
#[derive(Debug, Clone)]
pub struct Object<'r> {
    schema: SchemaView<'r>,
    data: Vec<u8>,
}

impl<'r> Object<'r> {
    pub fn schema(&self) -> SchemaView<'r> {
        self.schema
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Lazy view over the object.
    pub fn value(&self) -> Value<'_> {
        Value::new(self.schema, &self.data)
    }
}

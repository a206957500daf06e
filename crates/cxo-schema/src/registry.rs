//! The schema registry: an immutable, content-addressed set of named schemas.
//!
//! Registries are either declared locally through a [`Registrar`] or decoded
//! from bytes received from a peer. Both paths end in the same finalize
//! step, which links every placeholder to the registry entry it names.
//! Entries live in an arena; a resolved placeholder stores the index of its
//! entry, so cycles between named types never create cyclic ownership.
//!
//! Canonical encoding:
//!
//! ```text
//! [4: entry count]
//! per entry, sorted by name:
//!     [4 + n: name][4 + n: encoded schema]
//! ```
//!
//! The registry's [`RegistryRef`] is the digest of that encoding, so two
//! registries declaring the same names and shapes share an identifier
//! regardless of registration order.

use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use cxo_crypto::ContentHasher;
use cxo_types::{RegistryRef, SchemaRef};

use crate::codec::{decode_schema, encode_schema};
use crate::declare::Declare;
use crate::encoding::{put_bytes, put_len, Decoder};
use crate::error::{SchemaError, SchemaResult};
use crate::registrar::Registrar;
use crate::schema::Schema;
use crate::view::SchemaView;

struct Entry {
    schema: Schema,
    reference: SchemaRef,
}

/// Immutable set of named schemas.
pub struct Registry {
    reference: RegistryRef,
    entries: Vec<Entry>,
    by_name: BTreeMap<String, usize>,
    by_reference: HashMap<SchemaRef, usize>,
    /// Present only for locally declared registries.
    types: Option<HashMap<TypeId, String>>,
}

impl Registry {
    /// Declare and finalize a registry.
    ///
    /// `declare` registers types on the provided [`Registrar`]. Any error,
    /// from `declare` itself or from finalizing (for example a reference to
    /// a name that was never registered), is returned and no registry is
    /// produced.
    ///
    /// ```ignore
    /// let registry = Registry::new(|r| {
    ///     r.register::<User>("cxo.User")?;
    ///     r.register::<Group>("cxo.Group")
    /// })?;
    /// ```
    pub fn new<F>(declare: F) -> SchemaResult<Self>
    where
        F: FnOnce(&mut Registrar) -> SchemaResult<()>,
    {
        let mut registrar = Registrar::new();
        declare(&mut registrar)?;

        let mut registry = Self::empty();
        for (ty, name) in registrar.entries() {
            let schema = registrar.schema_of(*ty)?;
            registry.insert(name.clone(), schema)?;
        }
        registry.types = Some(registrar.into_names());
        registry.finalize()?;
        Ok(registry)
    }

    /// Decode a registry from its canonical encoding. The result resolves
    /// names and identifiers but can't look schemas up by Rust type.
    ///
    /// Only the canonical form is accepted: entries sorted by name, no
    /// duplicates, and placeholders carrying the kind of the entry they
    /// name. The identifier of a decoded registry is therefore always the
    /// digest of the bytes it was decoded from.
    pub fn decode(data: &[u8]) -> SchemaResult<Self> {
        let mut d = Decoder::new(data);
        let count = d.count()?;
        let mut registry = Self::empty();
        for _ in 0..count {
            let name = d.string()?;
            let schema = decode_schema(d.bytes()?)?;
            if name.is_empty() || schema.name() != Some(name) || schema.is_placeholder() {
                return Err(SchemaError::InvalidEncodedSchema);
            }
            registry
                .insert(name.to_string(), schema)
                .map_err(|_| SchemaError::InvalidEncodedSchema)?;
        }
        if !d.is_empty() {
            return Err(SchemaError::InvalidEncodedSchema);
        }
        registry.finalize()?;
        if registry.encode() != data {
            return Err(SchemaError::InvalidEncodedSchema);
        }
        Ok(registry)
    }

    fn empty() -> Self {
        Self {
            reference: RegistryRef::blank(),
            entries: Vec::new(),
            by_name: BTreeMap::new(),
            by_reference: HashMap::new(),
            types: None,
        }
    }

    fn insert(&mut self, name: String, schema: Schema) -> SchemaResult<()> {
        if self.by_name.contains_key(&name) {
            return Err(SchemaError::DuplicateName(name));
        }
        self.by_name.insert(name, self.entries.len());
        self.entries.push(Entry {
            schema,
            reference: SchemaRef::blank(),
        });
        Ok(())
    }

    /// Link every placeholder to its entry, then compute identifiers.
    fn finalize(&mut self) -> SchemaResult<()> {
        let kinds: Vec<_> = self.entries.iter().map(|e| e.schema.kind()).collect();
        let by_name = &self.by_name;
        let entries = &mut self.entries;

        let mut visited = HashSet::new();
        let mut pending: Vec<usize> = (0..entries.len()).rev().collect();
        while let Some(slot) = pending.pop() {
            if !visited.insert(slot) {
                continue;
            }
            entries[slot].schema.for_each_placeholder_mut(|placeholder| {
                let target = *by_name
                    .get(placeholder.name())
                    .ok_or_else(|| SchemaError::MissingSchema(placeholder.name().to_string()))?;
                placeholder.resolve(target, kinds[target]);
                if !visited.contains(&target) {
                    pending.push(target);
                }
                Ok(())
            })?;
        }

        for (slot, entry) in self.entries.iter_mut().enumerate() {
            entry.reference = ContentHasher::schema_ref(&encode_schema(&entry.schema));
            self.by_reference.insert(entry.reference, slot);
        }
        self.reference = ContentHasher::registry_ref(&self.encode());

        tracing::debug!(
            registry = %self.reference.short_hex(),
            schemas = self.entries.len(),
            build_capable = self.types.is_some(),
            "registry finalized"
        );
        Ok(())
    }

    /// Canonical encoding: entries sorted by name.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        put_len(&mut buf, self.by_name.len());
        for (name, &slot) in &self.by_name {
            put_bytes(&mut buf, name.as_bytes());
            put_bytes(&mut buf, &encode_schema(&self.entries[slot].schema));
        }
        buf
    }

    /// Identifier of this registry.
    pub fn reference(&self) -> RegistryRef {
        self.reference
    }

    pub fn schema_by_name(&self, name: &str) -> SchemaResult<SchemaView<'_>> {
        let slot = *self
            .by_name
            .get(name)
            .ok_or_else(|| SchemaError::MissingSchema(name.to_string()))?;
        Ok(SchemaView::new(self, &self.entries[slot].schema))
    }

    /// Look a schema up by its identifier. Fails with
    /// [`SchemaError::MissingSchemaRef`] when absent, which a sync layer may
    /// treat as "not yet received".
    pub fn schema_by_reference(&self, reference: &SchemaRef) -> SchemaResult<SchemaView<'_>> {
        let slot = *self
            .by_reference
            .get(reference)
            .ok_or(SchemaError::MissingSchemaRef(*reference))?;
        Ok(SchemaView::new(self, &self.entries[slot].schema))
    }

    /// Look up the schema registered for the Rust type `T`. Available only
    /// on registries built with [`Registry::new`].
    pub fn schema_by_type<T: Declare>(&self) -> SchemaResult<SchemaView<'_>> {
        let types = self.types.as_ref().ok_or(SchemaError::NotBuildCapable)?;
        let name = types
            .get(&TypeId::of::<T>())
            .ok_or(SchemaError::UnregisteredType(type_name::<T>()))?;
        self.schema_by_name(name)
    }

    /// Identifier of the schema registered under `name`.
    pub fn schema_reference(&self, name: &str) -> SchemaResult<SchemaRef> {
        self.by_name
            .get(name)
            .map(|&slot| self.entries[slot].reference)
            .ok_or_else(|| SchemaError::MissingSchema(name.to_string()))
    }

    /// Returns `true` if the registry was declared locally.
    pub fn is_build_capable(&self) -> bool {
        self.types.is_some()
    }

    /// Registered names in canonical (sorted) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Every schema in canonical order.
    pub fn schemas(&self) -> impl Iterator<Item = SchemaView<'_>> {
        self.by_name
            .values()
            .map(move |&slot| SchemaView::new(self, &self.entries[slot].schema))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry schema at `slot`. Slots come from resolved placeholders and are
    /// always in range.
    pub(crate) fn slot(&self, slot: usize) -> Option<&Schema> {
        self.entries.get(slot).map(|e| &e.schema)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("reference", &self.reference)
            .field("names", &self.by_name.keys().collect::<Vec<_>>())
            .field("build_capable", &self.is_build_capable())
            .finish()
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "registry {}", self.reference)?;
        for (name, &slot) in &self.by_name {
            writeln!(f, "  {name}: {}", self.entries[slot].schema)?;
        }
        Ok(())
    }
}

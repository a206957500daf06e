use cxo_types::{Reference, RegistryRef, SchemaRef, DIGEST_LEN};

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"cxo-schema-v1"`) that is
/// prepended to every hash computation, so a schema and a data object with
/// identical bytes never share an identifier. Within one domain the digest is
/// a pure function of the bytes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for encoded schemas.
    pub const SCHEMA: Self = Self {
        domain: "cxo-schema-v1",
    };
    /// Hasher for canonical registry encodings.
    pub const REGISTRY: Self = Self {
        domain: "cxo-registry-v1",
    };
    /// Hasher for encoded data objects.
    pub const OBJECT: Self = Self {
        domain: "cxo-object-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; DIGEST_LEN] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Verify that data produces the expected digest.
    pub fn verify(&self, data: &[u8], expected: &[u8; DIGEST_LEN]) -> bool {
        self.hash(data) == *expected
    }

    /// Identifier of an encoded schema.
    pub fn schema_ref(encoded: &[u8]) -> SchemaRef {
        SchemaRef::from_hash(Self::SCHEMA.hash(encoded))
    }

    /// Identifier of a canonical registry encoding.
    pub fn registry_ref(encoded: &[u8]) -> RegistryRef {
        RegistryRef::from_hash(Self::REGISTRY.hash(encoded))
    }

    /// Identifier of an encoded data object.
    pub fn object_ref(encoded: &[u8]) -> Reference {
        Reference::from_hash(Self::OBJECT.hash(encoded))
    }
}

//! Reference value types and their fixed wire layouts.
//!
//! ```text
//! Reference  [32 bytes: object digest]
//! Dynamic    [32 bytes: schema digest][32 bytes: object digest]
//! Refs (v1)  [4 bytes: count (little-endian u32)][count × 32 bytes: object digests]
//! ```

use bytes::BufMut;
use cxo_types::{Reference, SchemaRef, DIGEST_LEN};

use crate::encoding::{put_len, Decoder, Encode, LEN_PREFIX};
use crate::error::{SchemaError, SchemaResult};

/// Encoded size of a [`Reference`].
pub const REFERENCE_SIZE: usize = DIGEST_LEN;

/// Encoded size of a [`Dynamic`].
pub const DYNAMIC_SIZE: usize = 2 * DIGEST_LEN;

/// Version of the [`Refs`] wire layout described in the module docs.
pub const REFS_LAYOUT_VERSION: u32 = 1;

/// Ordered list of references to objects of one registered type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Refs {
    pub items: Vec<Reference>,
}

impl Refs {
    pub fn new(items: Vec<Reference>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Decode the list at the start of `data`. Returns the list and the
    /// number of bytes it occupies.
    pub fn decode(data: &[u8]) -> SchemaResult<(Self, usize)> {
        let mut d = Decoder::new(data);
        let count = d.count()?;
        let size = refs_size_for(count)?;
        let digests = d.take(size - LEN_PREFIX)?;
        let items = digests
            .chunks_exact(DIGEST_LEN)
            .map(|chunk| {
                Reference::from_slice(chunk).map_err(|_| SchemaError::InvalidSchemaOrData)
            })
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok((Self { items }, size))
    }
}

/// Size of a `Refs` with `count` items, or an error on overflow.
pub(crate) fn refs_size_for(count: usize) -> SchemaResult<usize> {
    count
        .checked_mul(DIGEST_LEN)
        .and_then(|n| n.checked_add(LEN_PREFIX))
        .ok_or(SchemaError::InvalidSchemaOrData)
}

/// Reference whose target schema travels with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dynamic {
    pub schema: SchemaRef,
    pub object: Reference,
}

impl Dynamic {
    pub fn new(schema: SchemaRef, object: Reference) -> Self {
        Self { schema, object }
    }

    /// Both halves blank: points at nothing.
    pub fn is_blank(&self) -> bool {
        self.schema.is_blank() && self.object.is_blank()
    }

    /// An object without a schema can't be interpreted.
    pub fn is_valid(&self) -> bool {
        !(self.schema.is_blank() && !self.object.is_blank())
    }

    /// Decode from the first [`DYNAMIC_SIZE`] bytes of `data`.
    pub fn decode(data: &[u8]) -> SchemaResult<Self> {
        let mut d = Decoder::new(data);
        let schema = SchemaRef::from_slice(d.take(DIGEST_LEN)?)
            .map_err(|_| SchemaError::InvalidSchemaOrData)?;
        let object = Reference::from_slice(d.take(DIGEST_LEN)?)
            .map_err(|_| SchemaError::InvalidSchemaOrData)?;
        Ok(Self { schema, object })
    }
}

impl Encode for Reference {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.as_bytes());
    }
}

impl Encode for Refs {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        put_len(buf, self.items.len());
        for item in &self.items {
            item.encode(buf);
        }
    }
}

impl Encode for Dynamic {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.schema.as_bytes());
        buf.put_slice(self.object.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_raw_digest() {
        let r = Reference::from_hash([5; DIGEST_LEN]);
        assert_eq!(r.to_bytes(), vec![5; REFERENCE_SIZE]);
    }

    #[test]
    fn dynamic_layout() {
        let d = Dynamic::new(
            SchemaRef::from_hash([1; DIGEST_LEN]),
            Reference::from_hash([2; DIGEST_LEN]),
        );
        let bytes = d.to_bytes();
        assert_eq!(bytes.len(), DYNAMIC_SIZE);
        assert_eq!(&bytes[..DIGEST_LEN], &[1; DIGEST_LEN]);
        assert_eq!(Dynamic::decode(&bytes).unwrap(), d);
    }

    #[test]
    fn dynamic_validity() {
        assert!(Dynamic::default().is_blank());
        assert!(Dynamic::default().is_valid());
        let orphan = Dynamic::new(SchemaRef::blank(), Reference::from_hash([9; DIGEST_LEN]));
        assert!(!orphan.is_valid());
        let typed_nothing = Dynamic::new(SchemaRef::from_hash([9; DIGEST_LEN]), Reference::blank());
        assert!(typed_nothing.is_valid());
    }

    #[test]
    fn refs_layout_v1() {
        let refs = Refs::new(vec![
            Reference::from_hash([1; DIGEST_LEN]),
            Reference::from_hash([2; DIGEST_LEN]),
        ]);
        let bytes = refs.to_bytes();
        assert_eq!(bytes.len(), LEN_PREFIX + 2 * DIGEST_LEN);
        assert_eq!(&bytes[..LEN_PREFIX], &[2, 0, 0, 0]);

        let (decoded, size) = Refs::decode(&bytes).unwrap();
        assert_eq!(decoded, refs);
        assert_eq!(size, bytes.len());
    }

    #[test]
    fn refs_truncated() {
        let refs = Refs::new(vec![Reference::from_hash([1; DIGEST_LEN])]);
        let bytes = refs.to_bytes();
        assert!(Refs::decode(&bytes[..bytes.len() - 1]).is_err());
    }

    #[test]
    fn refs_size_overflow() {
        assert_eq!(refs_size_for(usize::MAX), Err(SchemaError::InvalidSchemaOrData));
        assert_eq!(refs_size_for(0), Ok(LEN_PREFIX));
    }
}

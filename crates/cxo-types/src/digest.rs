use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Width in bytes of every content identifier.
pub const DIGEST_LEN: usize = 32;

macro_rules! content_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name([u8; DIGEST_LEN]);

        impl $name {
            /// Wrap a pre-computed digest.
            pub const fn from_hash(hash: [u8; DIGEST_LEN]) -> Self {
                Self(hash)
            }

            /// The blank identifier (all zeros). Represents "nothing".
            pub const fn blank() -> Self {
                Self([0u8; DIGEST_LEN])
            }

            /// Returns `true` if this is the blank identifier.
            pub fn is_blank(&self) -> bool {
                self.0 == [0u8; DIGEST_LEN]
            }

            /// The raw digest.
            pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
                &self.0
            }

            /// Read an identifier from the first [`DIGEST_LEN`] bytes of `data`.
            pub fn from_slice(data: &[u8]) -> Result<Self, TypeError> {
                let bytes: [u8; DIGEST_LEN] = data
                    .get(..DIGEST_LEN)
                    .and_then(|head| head.try_into().ok())
                    .ok_or(TypeError::InvalidLength {
                        expected: DIGEST_LEN,
                        actual: data.len(),
                    })?;
                Ok(Self(bytes))
            }

            /// Hex-encoded string representation.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Short hex representation (first 8 characters).
            pub fn short_hex(&self) -> String {
                hex::encode(&self.0[..4])
            }

            /// Parse from a hex string.
            pub fn from_hex(s: &str) -> Result<Self, TypeError> {
                let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
                if bytes.len() != DIGEST_LEN {
                    return Err(TypeError::InvalidLength {
                        expected: DIGEST_LEN,
                        actual: bytes.len(),
                    });
                }
                Self::from_slice(&bytes)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.short_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl From<[u8; DIGEST_LEN]> for $name {
            fn from(bytes: [u8; DIGEST_LEN]) -> Self {
                Self(bytes)
            }
        }

        impl From<$name> for [u8; DIGEST_LEN] {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

content_id!(
    /// Content-addressed identifier of an encoded data object.
    ///
    /// Identical encodings always produce the same `Reference`, making objects
    /// deduplicatable and verifiable. A blank reference points at nothing.
    Reference
);

content_id!(
    /// Identifier of a single schema: the digest of its canonical encoding.
    SchemaRef
);

content_id!(
    /// Identifier of a whole registry: the digest of its canonical,
    /// name-sorted encoding.
    RegistryRef
);

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_is_all_zeros() {
        let blank = Reference::blank();
        assert!(blank.is_blank());
        assert_eq!(blank.as_bytes(), &[0u8; DIGEST_LEN]);
        assert_eq!(Reference::default(), blank);
    }

    #[test]
    fn non_blank_detected() {
        assert!(!SchemaRef::from_hash([1; DIGEST_LEN]).is_blank());
    }

    #[test]
    fn short_hex_is_8_chars() {
        let id = RegistryRef::from_hash([0xab; DIGEST_LEN]);
        assert_eq!(id.short_hex(), "abababab");
    }

    #[test]
    fn display_is_full_hex() {
        let id = Reference::from_hash([7; DIGEST_LEN]);
        let display = format!("{id}");
        assert_eq!(display.len(), 64);
        assert_eq!(display, id.to_hex());
    }

    #[test]
    fn debug_names_the_identifier_family() {
        let id = SchemaRef::from_hash([0x10; DIGEST_LEN]);
        assert_eq!(format!("{id:?}"), "SchemaRef(10101010)");
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        let err = Reference::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: DIGEST_LEN,
                actual: 2
            }
        );
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(matches!(
            Reference::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn from_slice_reads_prefix() {
        let mut data = vec![3u8; DIGEST_LEN];
        data.extend_from_slice(b"trailing");
        let id = Reference::from_slice(&data).unwrap();
        assert_eq!(id.as_bytes(), &[3u8; DIGEST_LEN]);
    }

    #[test]
    fn from_slice_too_short() {
        let err = Reference::from_slice(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, TypeError::InvalidLength { actual: 3, .. }));
    }

    #[test]
    fn serde_roundtrip() {
        let id = SchemaRef::from_hash([42; DIGEST_LEN]);
        let json = serde_json::to_string(&id).unwrap();
        let parsed: SchemaRef = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ordering_is_consistent() {
        let id1 = Reference::from_hash([0; DIGEST_LEN]);
        let id2 = Reference::from_hash([1; DIGEST_LEN]);
        assert!(id1 < id2);
    }

    proptest! {
        #[test]
        fn hex_roundtrip(bytes in any::<[u8; 32]>()) {
            let id = Reference::from_hash(bytes);
            prop_assert_eq!(Reference::from_hex(&id.to_hex()).unwrap(), id);
        }
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::digest::DIGEST_LEN;
use crate::error::TypeError;

/// Public identity of a feed.
///
/// A feed is an application-level stream whose root object is periodically
/// replaced and broadcast. CXO only carries the identity around; it never
/// interprets it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeedId {
    key: [u8; DIGEST_LEN],
}

impl FeedId {
    /// Create from the raw public key bytes.
    pub fn from_raw(key: [u8; DIGEST_LEN]) -> Self {
        Self { key }
    }

    /// The raw public key bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.key
    }

    /// Full hex-encoded string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }

    /// Short identifier (first 8 hex characters).
    pub fn short_id(&self) -> String {
        format!("feed:{}", hex::encode(&self.key[..4]))
    }

    /// Parse from a hex string, with or without the `feed:` prefix.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let s = s.strip_prefix("feed:").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        let key: [u8; DIGEST_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| TypeError::InvalidLength {
                    expected: DIGEST_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self { key })
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", self.short_id())
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_id())
    }
}

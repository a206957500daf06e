//! Primitive byte encoding shared by schemas, registries and data values.
//!
//! Layout rules:
//!
//! ```text
//! bool                 1 byte (0 or 1)
//! (u)int8..64, f32/64  fixed width, little-endian
//! string, bytes, Vec   [4 bytes: count (little-endian u32)][payload]
//! [T; N]               N encoded elements, no prefix
//! ```

use bytes::{Buf, BufMut};

use crate::error::{SchemaError, SchemaResult};

/// Width of the count prefix carried by strings and slices.
pub const LEN_PREFIX: usize = 4;

/// A value with a canonical primitive encoding.
pub trait Encode {
    /// Append the encoding of `self` to `buf`.
    fn encode<B: BufMut>(&self, buf: &mut B);

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf);
        buf
    }
}

/// Write a count prefix. Counts above `u32::MAX` can't be represented.
pub fn put_len<B: BufMut>(buf: &mut B, len: usize) {
    debug_assert!(len <= u32::MAX as usize, "length {len} exceeds u32 prefix");
    buf.put_u32_le(len as u32);
}

/// Write a length-prefixed byte sequence.
pub fn put_bytes<B: BufMut>(buf: &mut B, data: &[u8]) {
    put_len(buf, data.len());
    buf.put_slice(data);
}

/// Read the count prefix at the start of `data` without consuming it.
pub fn read_len(data: &[u8]) -> SchemaResult<usize> {
    Decoder::new(data).count()
}

macro_rules! encode_fixed {
    ($($ty:ty => $put:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode<B: BufMut>(&self, buf: &mut B) {
                    buf.$put(*self);
                }
            }
        )*
    };
}

encode_fixed!(
    u8 => put_u8,
    i8 => put_i8,
    u16 => put_u16_le,
    i16 => put_i16_le,
    u32 => put_u32_le,
    i32 => put_i32_le,
    u64 => put_u64_le,
    i64 => put_i64_le,
    f32 => put_f32_le,
    f64 => put_f64_le,
);

impl Encode for bool {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(u8::from(*self));
    }
}

impl Encode for str {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        put_bytes(buf, self.as_bytes());
    }
}

impl Encode for String {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        self.as_str().encode(buf);
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        put_len(buf, self.len());
        for item in self {
            item.encode(buf);
        }
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode<B: BufMut>(&self, buf: &mut B) {
        for item in self {
            item.encode(buf);
        }
    }
}

/// Cursor over encoded bytes. Every read checks the remaining length first
/// and fails with [`SchemaError::UnexpectedEnd`] instead of panicking.
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn need(&self, need: usize) -> SchemaResult<()> {
        if self.buf.remaining() < need {
            return Err(SchemaError::UnexpectedEnd {
                need,
                have: self.buf.remaining(),
            });
        }
        Ok(())
    }

    pub fn u8(&mut self) -> SchemaResult<u8> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn u32(&mut self) -> SchemaResult<u32> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    /// A count prefix.
    pub fn count(&mut self) -> SchemaResult<usize> {
        Ok(self.u32()? as usize)
    }

    /// The next `n` raw bytes.
    pub fn take(&mut self, n: usize) -> SchemaResult<&'a [u8]> {
        self.need(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// A length-prefixed byte sequence.
    pub fn bytes(&mut self) -> SchemaResult<&'a [u8]> {
        let n = self.count()?;
        self.take(n)
    }

    /// A length-prefixed UTF-8 string.
    pub fn string(&mut self) -> SchemaResult<&'a str> {
        std::str::from_utf8(self.bytes()?).map_err(|_| SchemaError::InvalidUtf8)
    }
}

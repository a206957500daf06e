//! Self-describing schema encoding.
//!
//! ```text
//! [4: reference kind (0 none, 1 single, 2 slice, 3 dynamic)]
//! [4: kind code]
//! [4 + n: name]
//! [4: array length]
//! [4: field count] then per field [4 + n: [name][tag][schema]]
//! [4 + n: element schema, empty if none]
//! ```
//!
//! All integers are little-endian u32. A nested schema that has a name is
//! written as a placeholder (kind and name only) and decodes back into a
//! [`Schema::Placeholder`]; only the top-level schema is written in full.

use bytes::BufMut;

use crate::encoding::{put_bytes, put_len, Decoder};
use crate::error::{SchemaError, SchemaResult};
use crate::kind::{Kind, ReferenceKind};
use crate::schema::{Field, Schema};

/// Deepest anonymous nesting accepted when decoding.
const MAX_NESTING: usize = 128;

/// Encode a schema in full. Nested registered schemas become placeholders.
pub fn encode_schema(schema: &Schema) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(schema, true, &mut buf);
    buf
}

fn encode_into<B: BufMut>(schema: &Schema, top: bool, buf: &mut B) {
    if !top {
        if let Some(name) = schema.name() {
            header(buf, 0, schema.kind(), name, 0);
            put_len(buf, 0);
            put_bytes(buf, &[]);
            return;
        }
    }
    match schema {
        Schema::Scalar { kind, name } => {
            header(buf, 0, *kind, name.as_deref().unwrap_or_default(), 0);
            put_len(buf, 0);
            put_bytes(buf, &[]);
        }
        Schema::Array { name, length, elem } => {
            header(buf, 0, Kind::Array, name.as_deref().unwrap_or_default(), *length);
            put_len(buf, 0);
            put_bytes(buf, &nested(elem));
        }
        Schema::Slice { name, elem } => {
            header(buf, 0, Kind::Slice, name.as_deref().unwrap_or_default(), 0);
            put_len(buf, 0);
            put_bytes(buf, &nested(elem));
        }
        Schema::Struct { name, fields } => {
            header(buf, 0, Kind::Struct, name.as_deref().unwrap_or_default(), 0);
            put_len(buf, fields.len());
            for field in fields {
                let mut encoded = Vec::new();
                put_bytes(&mut encoded, field.name.as_bytes());
                put_bytes(&mut encoded, field.tag.as_bytes());
                put_bytes(&mut encoded, &nested(&field.schema));
                put_bytes(buf, &encoded);
            }
            put_bytes(buf, &[]);
        }
        Schema::Reference { kind, target } => {
            header(buf, kind.code(), Kind::Reference, "", 0);
            put_len(buf, 0);
            match target {
                Some(target) => put_bytes(buf, &nested(target)),
                None => put_bytes(buf, &[]),
            }
        }
        Schema::Placeholder(p) => {
            header(buf, 0, p.kind(), p.name(), 0);
            put_len(buf, 0);
            put_bytes(buf, &[]);
        }
    }
}

fn header<B: BufMut>(buf: &mut B, reference: u32, kind: Kind, name: &str, length: usize) {
    buf.put_u32_le(reference);
    buf.put_u32_le(kind.code());
    put_bytes(buf, name.as_bytes());
    put_len(buf, length);
}

fn nested(schema: &Schema) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(schema, false, &mut buf);
    buf
}

/// Decode a schema produced by [`encode_schema`].
///
/// Nested named schemas come back as unresolved placeholders. Unknown
/// discriminators, invalid kind combinations and trailing bytes fail with
/// [`SchemaError::InvalidEncodedSchema`]; truncated input fails with
/// [`SchemaError::UnexpectedEnd`].
pub fn decode_schema(data: &[u8]) -> SchemaResult<Schema> {
    decode(data, 0)
}

fn decode(data: &[u8], depth: usize) -> SchemaResult<Schema> {
    if depth > MAX_NESTING {
        return Err(SchemaError::InvalidEncodedSchema);
    }
    let mut d = Decoder::new(data);
    let reference =
        ReferenceKind::from_code(d.u32()?).map_err(|_| SchemaError::InvalidEncodedSchema)?;
    let kind = Kind::from_code(d.u32()?).ok_or(SchemaError::InvalidEncodedSchema)?;
    let name = d.string()?;
    let length = d.count()?;
    let field_count = d.count()?;
    let mut fields = Vec::new();
    for _ in 0..field_count {
        fields.push(decode_field(d.bytes()?, depth)?);
    }
    let elem = d.bytes()?;
    if !d.is_empty() {
        return Err(SchemaError::InvalidEncodedSchema);
    }

    let name = (!name.is_empty()).then(|| name.to_string());
    let bare = length == 0 && fields.is_empty();

    if let Some(reference) = reference {
        if kind != Kind::Reference || name.is_some() || !bare {
            return Err(SchemaError::InvalidEncodedSchema);
        }
        let target = match reference {
            ReferenceKind::Dynamic if elem.is_empty() => None,
            ReferenceKind::Dynamic => return Err(SchemaError::InvalidEncodedSchema),
            ReferenceKind::Single | ReferenceKind::Slice => {
                let target = decode(elem, depth + 1)?;
                if !target.is_placeholder() {
                    return Err(SchemaError::InvalidEncodedSchema);
                }
                Some(Box::new(target))
            }
        };
        return Ok(Schema::Reference {
            kind: reference,
            target,
        });
    }

    if depth > 0 {
        if let Some(name) = name {
            if !bare || !elem.is_empty() || kind == Kind::Reference {
                return Err(SchemaError::InvalidEncodedSchema);
            }
            return Ok(Schema::placeholder(kind, name));
        }
    }

    let schema = match kind {
        Kind::Reference => return Err(SchemaError::InvalidEncodedSchema),
        Kind::Array if fields.is_empty() && !elem.is_empty() => Schema::Array {
            name,
            length,
            elem: Box::new(decode_elem(elem, depth)?),
        },
        Kind::Slice if bare && !elem.is_empty() => Schema::Slice {
            name,
            elem: Box::new(decode_elem(elem, depth)?),
        },
        Kind::Struct if length == 0 && elem.is_empty() => Schema::Struct { name, fields },
        kind if kind.is_scalar() && bare && elem.is_empty() => Schema::Scalar { kind, name },
        _ => return Err(SchemaError::InvalidEncodedSchema),
    };
    Ok(schema)
}

fn decode_elem(data: &[u8], depth: usize) -> SchemaResult<Schema> {
    let elem = decode(data, depth + 1)?;
    if elem.is_reference() {
        return Err(SchemaError::InvalidEncodedSchema);
    }
    Ok(elem)
}

fn decode_field(data: &[u8], depth: usize) -> SchemaResult<Field> {
    let mut d = Decoder::new(data);
    let name = d.string()?;
    let tag = d.string()?;
    let schema = decode(d.bytes()?, depth + 1)?;
    if !d.is_empty() {
        return Err(SchemaError::InvalidEncodedSchema);
    }
    Ok(Field::new(name, tag, schema))
}

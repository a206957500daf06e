//! Size engine: the exact encoded size of a value, computed from its schema
//! and its bytes.
//!
//! Sizes are determined by the schema plus the count prefixes found in the
//! data. No reflection and no full decode is involved. A size larger than
//! the available bytes is reported as [`SchemaError::InvalidSchemaOrData`].

use crate::encoding::{read_len, LEN_PREFIX};
use crate::error::{SchemaError, SchemaResult};
use crate::kind::{Kind, ReferenceKind};
use crate::reference::{refs_size_for, DYNAMIC_SIZE, REFERENCE_SIZE};
use crate::schema::Schema;
use crate::view::SchemaView;

/// Deepest nesting the size engine follows. Schemas that contain
/// themselves by value never terminate otherwise.
const MAX_DEPTH: usize = 512;

impl<'r> SchemaView<'r> {
    /// Encoded size of the value at the start of `data`. Bytes after the
    /// value are ignored.
    pub fn size(&self, data: &[u8]) -> SchemaResult<usize> {
        size_at(*self, data, 0)
    }

    /// Encoded size of every value of this schema, when it doesn't depend
    /// on the data. Structs and arrays built only from fixed-size members
    /// are fixed-size too, including zero-size ones.
    pub fn fixed_size(&self) -> Option<usize> {
        fixed_size_at(*self, 0)
    }
}

fn fixed_size_at(view: SchemaView<'_>, depth: usize) -> Option<usize> {
    if depth > MAX_DEPTH {
        return None;
    }
    match view.schema() {
        Schema::Scalar { kind, .. } => kind.fixed_size(),
        Schema::Reference {
            kind: ReferenceKind::Single,
            ..
        } => Some(REFERENCE_SIZE),
        Schema::Reference {
            kind: ReferenceKind::Dynamic,
            ..
        } => Some(DYNAMIC_SIZE),
        Schema::Array { length: 0, .. } => Some(0),
        Schema::Array { length, .. } => {
            fixed_size_at(view.elem().ok()?, depth + 1)?.checked_mul(*length)
        }
        Schema::Struct { .. } => view.fields().try_fold(0usize, |n, field| {
            n.checked_add(fixed_size_at(field.schema().ok()?, depth + 1)?)
        }),
        _ => None,
    }
}

fn size_at(view: SchemaView<'_>, data: &[u8], depth: usize) -> SchemaResult<usize> {
    if depth > MAX_DEPTH {
        return Err(SchemaError::InvalidSchemaOrData);
    }
    let n = match view.schema() {
        Schema::Reference { kind, .. } => match kind {
            ReferenceKind::Single => REFERENCE_SIZE,
            ReferenceKind::Dynamic => DYNAMIC_SIZE,
            ReferenceKind::Slice => refs_size_for(prefix(data)?)?,
        },
        Schema::Scalar {
            kind: Kind::String, ..
        } => prefix(data)?
            .checked_add(LEN_PREFIX)
            .ok_or(SchemaError::InvalidSchemaOrData)?,
        Schema::Scalar { kind, .. } => kind.fixed_size().ok_or(SchemaError::InvalidSchemaOrData)?,
        Schema::Slice { .. } => sequence_size(view.elem()?, prefix(data)?, LEN_PREFIX, data, depth)?,
        Schema::Array { length, .. } => sequence_size(view.elem()?, *length, 0, data, depth)?,
        Schema::Struct { .. } => {
            let mut n = 0usize;
            for field in view.fields() {
                let rest = data.get(n..).ok_or(SchemaError::InvalidSchemaOrData)?;
                n += size_at(field.schema()?, rest, depth + 1)?;
            }
            n
        }
        // views never point at placeholders
        Schema::Placeholder(_) => return Err(SchemaError::InvalidSchemaOrData),
    };
    if n > data.len() {
        return Err(SchemaError::InvalidSchemaOrData);
    }
    Ok(n)
}

/// Count prefix at the start of `data`.
fn prefix(data: &[u8]) -> SchemaResult<usize> {
    read_len(data).map_err(|_| SchemaError::InvalidSchemaOrData)
}

/// Size of `count` elements starting `shift` bytes into `data`.
fn sequence_size(
    elem: SchemaView<'_>,
    count: usize,
    shift: usize,
    data: &[u8],
    depth: usize,
) -> SchemaResult<usize> {
    if let Some(fixed) = elem.fixed_size() {
        return count
            .checked_mul(fixed)
            .and_then(|n| n.checked_add(shift))
            .ok_or(SchemaError::InvalidSchemaOrData);
    }
    // without a fixed size an element takes at least a count prefix
    if count > data.len().saturating_sub(shift) {
        return Err(SchemaError::InvalidSchemaOrData);
    }
    let mut n = shift;
    for _ in 0..count {
        let rest = data.get(n..).ok_or(SchemaError::InvalidSchemaOrData)?;
        n += size_at(elem, rest, depth + 1)?;
    }
    Ok(n)
}

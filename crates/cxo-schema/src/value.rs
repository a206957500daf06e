//! Lazy, schema-driven access to encoded data.
//!
//! A [`Value`] borrows a schema and a byte slice and decodes only what is
//! asked for. Nested values are sliced out with the size engine.

use std::fmt;

use cxo_types::Reference;

use crate::encoding::{Decoder, LEN_PREFIX};
use crate::error::{SchemaError, SchemaResult};
use crate::kind::{Kind, ReferenceKind};
use crate::reference::{Dynamic, Refs};
use crate::schema::Schema;
use crate::view::SchemaView;

/// An encoded value together with its schema.
#[derive(Clone, Copy)]
pub struct Value<'a> {
    schema: SchemaView<'a>,
    data: &'a [u8],
}

impl<'a> Value<'a> {
    pub fn new(schema: SchemaView<'a>, data: &'a [u8]) -> Self {
        Self { schema, data }
    }

    pub fn schema(&self) -> SchemaView<'a> {
        self.schema
    }

    pub fn kind(&self) -> Kind {
        self.schema.kind()
    }

    /// The bytes of this value, without anything that follows it.
    pub fn data(&self) -> SchemaResult<&'a [u8]> {
        let n = self.schema.size(self.data)?;
        Ok(&self.data[..n])
    }

    fn mismatch(&self, expected: &'static str) -> SchemaError {
        SchemaError::TypeMismatch {
            expected,
            actual: self.kind(),
        }
    }

    // ---------------------------------------------------------------
    // Sequences
    // ---------------------------------------------------------------

    /// Element count of an array, slice or reference list; byte length of
    /// a string.
    pub fn len(&self) -> SchemaResult<usize> {
        match self.schema.schema() {
            Schema::Array { length, .. } => Ok(*length),
            Schema::Slice { .. }
            | Schema::Scalar {
                kind: Kind::String, ..
            }
            | Schema::Reference {
                kind: ReferenceKind::Slice,
                ..
            } => prefix(self.data),
            _ => Err(self.mismatch("array, slice, string or reference list")),
        }
    }

    pub fn is_empty(&self) -> SchemaResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Element schema, element count and offset of the first element.
    fn sequence(&self) -> SchemaResult<(SchemaView<'a>, usize, usize)> {
        match self.schema.schema() {
            Schema::Array { length, .. } => Ok((self.schema.elem()?, *length, 0)),
            Schema::Slice { .. } => Ok((self.schema.elem()?, prefix(self.data)?, LEN_PREFIX)),
            _ => Err(self.mismatch("array or slice")),
        }
    }

    /// Element `index` of an array or slice.
    pub fn index(&self, index: usize) -> SchemaResult<Value<'a>> {
        let (elem, len, shift) = self.sequence()?;
        if index >= len {
            return Err(SchemaError::IndexOutOfRange { index, len });
        }
        let offset = match elem.fixed_size() {
            Some(fixed) => index
                .checked_mul(fixed)
                .and_then(|n| n.checked_add(shift))
                .ok_or(SchemaError::InvalidSchemaOrData)?,
            None => {
                let mut n = shift;
                for _ in 0..index {
                    n += elem.size(rest(self.data, n)?)?;
                }
                n
            }
        };
        sub_value(elem, rest(self.data, offset)?)
    }

    /// Call `f` with every element of an array or slice, in order. Stops at
    /// the first error, which is returned.
    pub fn range_index<E, F>(&self, mut f: F) -> Result<(), E>
    where
        E: From<SchemaError>,
        F: FnMut(usize, Value<'a>) -> Result<(), E>,
    {
        let (elem, len, shift) = self.sequence()?;
        let mut offset = shift;
        for i in 0..len {
            let value = sub_value(elem, rest(self.data, offset)?)?;
            offset += value.data.len();
            f(i, value)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Structs
    // ---------------------------------------------------------------

    fn expect_struct(&self) -> SchemaResult<()> {
        match self.kind() {
            Kind::Struct => Ok(()),
            _ => Err(self.mismatch("struct")),
        }
    }

    pub fn field_count(&self) -> SchemaResult<usize> {
        self.expect_struct()?;
        Ok(self.schema.field_count())
    }

    pub fn field_names(&self) -> SchemaResult<Vec<&'a str>> {
        self.expect_struct()?;
        Ok(self.schema.fields().map(|f| f.name()).collect())
    }

    /// Field `index` in declaration order.
    pub fn field_by_index(&self, index: usize) -> SchemaResult<Value<'a>> {
        self.expect_struct()?;
        let len = self.schema.field_count();
        if index >= len {
            return Err(SchemaError::IndexOutOfRange { index, len });
        }
        let mut offset = 0;
        for (i, field) in self.schema.fields().enumerate() {
            let schema = field.schema()?;
            if i == index {
                return sub_value(schema, rest(self.data, offset)?);
            }
            offset += schema.size(rest(self.data, offset)?)?;
        }
        Err(SchemaError::IndexOutOfRange { index, len })
    }

    pub fn field_by_name(&self, name: &str) -> SchemaResult<Value<'a>> {
        self.expect_struct()?;
        let (index, _) = self
            .schema
            .field_by_name(name)
            .ok_or_else(|| SchemaError::NoSuchField(name.to_string()))?;
        self.field_by_index(index)
    }

    /// Call `f` with every field name and value, in declaration order.
    /// Stops at the first error, which is returned.
    pub fn range_fields<E, F>(&self, mut f: F) -> Result<(), E>
    where
        E: From<SchemaError>,
        F: FnMut(&'a str, Value<'a>) -> Result<(), E>,
    {
        self.expect_struct()?;
        let mut offset = 0;
        for field in self.schema.fields() {
            let value = sub_value(field.schema()?, rest(self.data, offset)?)?;
            offset += value.data.len();
            f(field.name(), value)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Scalars
    // ---------------------------------------------------------------

    fn fixed<const N: usize>(&self) -> SchemaResult<[u8; N]> {
        self.data
            .get(..N)
            .and_then(|b| b.try_into().ok())
            .ok_or(SchemaError::InvalidSchemaOrData)
    }

    pub fn bool(&self) -> SchemaResult<bool> {
        match self.kind() {
            Kind::Bool => Ok(self.fixed::<1>()?[0] != 0),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Any signed integer, widened.
    pub fn int(&self) -> SchemaResult<i64> {
        match self.kind() {
            Kind::Int8 => Ok(i8::from_le_bytes(self.fixed()?).into()),
            Kind::Int16 => Ok(i16::from_le_bytes(self.fixed()?).into()),
            Kind::Int32 => Ok(i32::from_le_bytes(self.fixed()?).into()),
            Kind::Int64 => Ok(i64::from_le_bytes(self.fixed()?)),
            _ => Err(self.mismatch("signed integer")),
        }
    }

    /// Any unsigned integer, widened.
    pub fn uint(&self) -> SchemaResult<u64> {
        match self.kind() {
            Kind::Uint8 => Ok(u8::from_le_bytes(self.fixed()?).into()),
            Kind::Uint16 => Ok(u16::from_le_bytes(self.fixed()?).into()),
            Kind::Uint32 => Ok(u32::from_le_bytes(self.fixed()?).into()),
            Kind::Uint64 => Ok(u64::from_le_bytes(self.fixed()?)),
            _ => Err(self.mismatch("unsigned integer")),
        }
    }

    /// Either float, widened.
    pub fn float(&self) -> SchemaResult<f64> {
        match self.kind() {
            Kind::Float32 => Ok(f32::from_le_bytes(self.fixed()?).into()),
            Kind::Float64 => Ok(f64::from_le_bytes(self.fixed()?)),
            _ => Err(self.mismatch("float")),
        }
    }

    pub fn string(&self) -> SchemaResult<&'a str> {
        match self.kind() {
            Kind::String => Decoder::new(self.data).string().map_err(malformed),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Contents of a byte slice.
    pub fn bytes(&self) -> SchemaResult<&'a [u8]> {
        let is_bytes = self.kind() == Kind::Slice
            && self.schema.elem().map(|e| e.kind()) == Ok(Kind::Uint8);
        if !is_bytes {
            return Err(self.mismatch("[]uint8"));
        }
        Decoder::new(self.data).bytes().map_err(malformed)
    }

    // ---------------------------------------------------------------
    // References
    // ---------------------------------------------------------------

    fn expect_reference(&self, kind: ReferenceKind, expected: &'static str) -> SchemaResult<()> {
        match self.schema.reference_kind() {
            Some(k) if k == kind => Ok(()),
            _ => Err(self.mismatch(expected)),
        }
    }

    pub fn reference(&self) -> SchemaResult<Reference> {
        self.expect_reference(ReferenceKind::Single, "reference")?;
        Reference::from_slice(self.data).map_err(|_| SchemaError::InvalidSchemaOrData)
    }

    pub fn references(&self) -> SchemaResult<Refs> {
        self.expect_reference(ReferenceKind::Slice, "reference list")?;
        Refs::decode(self.data).map(|(refs, _)| refs).map_err(malformed)
    }

    /// A dynamic reference. Fails with
    /// [`SchemaError::InvalidDynamicReference`] when it names an object but
    /// no schema.
    pub fn dynamic(&self) -> SchemaResult<Dynamic> {
        self.expect_reference(ReferenceKind::Dynamic, "dynamic reference")?;
        let dynamic = Dynamic::decode(self.data).map_err(malformed)?;
        if !dynamic.is_valid() {
            return Err(SchemaError::InvalidDynamicReference);
        }
        Ok(dynamic)
    }

    /// Schema of the objects a reference points at. For dynamic references
    /// the schema is looked up by the identifier carried in the value.
    pub fn target_schema(&self) -> SchemaResult<SchemaView<'a>> {
        match self.schema.reference_kind() {
            Some(ReferenceKind::Dynamic) => {
                let dynamic = self.dynamic()?;
                self.schema.registry().schema_by_reference(&dynamic.schema)
            }
            Some(_) => self.schema.elem(),
            None => Err(self.mismatch("reference")),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({}, {} bytes)", self.schema, self.data.len())
    }
}

fn prefix(data: &[u8]) -> SchemaResult<usize> {
    Decoder::new(data).count().map_err(malformed)
}

fn rest(data: &[u8], offset: usize) -> SchemaResult<&[u8]> {
    data.get(offset..).ok_or(SchemaError::InvalidSchemaOrData)
}

/// The value of `schema` at the start of `data`, trimmed to its size.
fn sub_value<'a>(schema: SchemaView<'a>, data: &'a [u8]) -> SchemaResult<Value<'a>> {
    let size = schema.size(data)?;
    Ok(Value::new(schema, &data[..size]))
}

/// Short input inside a value is bad data, not a truncated stream.
fn malformed(err: SchemaError) -> SchemaError {
    match err {
        SchemaError::UnexpectedEnd { .. } => SchemaError::InvalidSchemaOrData,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{Declare, FieldDecl, Layout};
    use crate::encoding::{put_len, Encode};
    use crate::registry::Registry;
    use cxo_types::SchemaRef;

    struct Nothing;
    impl Declare for Nothing {
        fn layout() -> Layout {
            Layout::Struct(Vec::new())
        }
    }

    #[test]
    fn index_into_huge_zero_sized_slice() {
        let registry = Registry::new(|r| r.register::<Vec<Nothing>>("cxo.Nothings")).unwrap();
        let schema = registry.schema_by_name("cxo.Nothings").unwrap();
        let data = u32::MAX.to_le_bytes();
        let value = Value::new(schema, &data);
        assert_eq!(value.len().unwrap(), u32::MAX as usize);
        assert_eq!(value.data().unwrap().len(), 4);
        let last = value.index(u32::MAX as usize - 1).unwrap();
        assert_eq!(last.kind(), Kind::Struct);
        assert!(last.data().unwrap().is_empty());
    }

    struct Sample;
    impl Declare for Sample {
        fn layout() -> Layout {
            Layout::Struct(vec![
                FieldDecl::new::<bool>("Flag"),
                FieldDecl::new::<i16>("Delta"),
                FieldDecl::new::<u64>("Count"),
                FieldDecl::new::<f32>("Ratio"),
                FieldDecl::new::<String>("Title"),
                FieldDecl::new::<Vec<u8>>("Blob"),
                FieldDecl::new::<Vec<String>>("Words"),
                FieldDecl::new::<[u32; 2]>("Pair"),
                FieldDecl::reference("Self", "cxo.Sample"),
                FieldDecl::references("Others", "cxo.Sample"),
                FieldDecl::dynamic("Any"),
            ])
        }
    }

    fn registry() -> Registry {
        Registry::new(|r| r.register::<Sample>("cxo.Sample")).unwrap()
    }

    fn encode(dynamic: Dynamic) -> Vec<u8> {
        let mut buf = Vec::new();
        true.encode(&mut buf);
        (-7i16).encode(&mut buf);
        42u64.encode(&mut buf);
        0.5f32.encode(&mut buf);
        "héllo".encode(&mut buf);
        vec![1u8, 2, 3].encode(&mut buf);
        vec!["x".to_string(), "yz".to_string()].encode(&mut buf);
        [10u32, 20u32].encode(&mut buf);
        Reference::from_hash([1; 32]).encode(&mut buf);
        Refs::new(vec![Reference::from_hash([2; 32]), Reference::from_hash([3; 32])])
            .encode(&mut buf);
        dynamic.encode(&mut buf);
        buf
    }

    #[test]
    fn scalars() {
        let registry = registry();
        let data = encode(Dynamic::default());
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);

        assert!(v.field_by_name("Flag").unwrap().bool().unwrap());
        assert_eq!(v.field_by_name("Delta").unwrap().int().unwrap(), -7);
        assert_eq!(v.field_by_name("Count").unwrap().uint().unwrap(), 42);
        assert_eq!(v.field_by_name("Ratio").unwrap().float().unwrap(), 0.5);
        assert_eq!(v.field_by_name("Title").unwrap().string().unwrap(), "héllo");
        assert_eq!(v.field_by_name("Blob").unwrap().bytes().unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn kind_mismatch() {
        let registry = registry();
        let data = encode(Dynamic::default());
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);
        let count = v.field_by_name("Count").unwrap();
        assert!(matches!(count.int(), Err(SchemaError::TypeMismatch { .. })));
        assert!(matches!(count.string(), Err(SchemaError::TypeMismatch { .. })));
        assert!(matches!(v.index(0), Err(SchemaError::TypeMismatch { .. })));
        assert!(matches!(
            v.field_by_name("Words").unwrap().bytes(),
            Err(SchemaError::TypeMismatch { .. })
        ));
        assert!(matches!(count.field_count(), Err(SchemaError::TypeMismatch { .. })));
    }

    #[test]
    fn struct_access() {
        let registry = registry();
        let data = encode(Dynamic::default());
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);
        assert_eq!(v.field_count().unwrap(), 11);
        assert_eq!(v.field_names().unwrap()[4], "Title");
        assert_eq!(
            v.field_by_name("Missing").unwrap_err(),
            SchemaError::NoSuchField("Missing".into())
        );
        assert_eq!(
            v.field_by_index(11).unwrap_err(),
            SchemaError::IndexOutOfRange { index: 11, len: 11 }
        );
        assert_eq!(v.data().unwrap().len(), data.len());

        let mut seen = Vec::new();
        v.range_fields(|name, value| -> SchemaResult<()> {
            seen.push((name, value.kind()));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen.len(), 11);
        assert_eq!(seen[7], ("Pair", Kind::Array));
    }

    #[test]
    fn sequences() {
        let registry = registry();
        let data = encode(Dynamic::default());
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);

        let words = v.field_by_name("Words").unwrap();
        assert_eq!(words.len().unwrap(), 2);
        assert_eq!(words.index(1).unwrap().string().unwrap(), "yz");
        assert_eq!(
            words.index(2).unwrap_err(),
            SchemaError::IndexOutOfRange { index: 2, len: 2 }
        );

        let pair = v.field_by_name("Pair").unwrap();
        assert_eq!(pair.len().unwrap(), 2);
        assert_eq!(pair.index(1).unwrap().uint().unwrap(), 20);

        let mut collected = Vec::new();
        words
            .range_index(|_, w| -> SchemaResult<()> {
                collected.push(w.string()?);
                Ok(())
            })
            .unwrap();
        assert_eq!(collected, vec!["x", "yz"]);
    }

    #[derive(Debug, PartialEq)]
    enum Stop {
        Early,
        Schema(SchemaError),
    }

    impl From<SchemaError> for Stop {
        fn from(err: SchemaError) -> Self {
            Stop::Schema(err)
        }
    }

    #[test]
    fn range_stops_on_callback_error() {
        let registry = registry();
        let data = encode(Dynamic::default());
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);
        let mut calls = 0;
        let result = v.range_fields(|_, _| {
            calls += 1;
            if calls == 3 {
                Err(Stop::Early)
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err(Stop::Early));
        assert_eq!(calls, 3);

        let count = v.field_by_name("Count").unwrap();
        let result = count.range_index(|_, _| Ok::<(), Stop>(()));
        assert!(matches!(result, Err(Stop::Schema(SchemaError::TypeMismatch { .. }))));
    }

    #[test]
    fn references() {
        let registry = registry();
        let data = encode(Dynamic::default());
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);

        let single = v.field_by_name("Self").unwrap();
        assert_eq!(single.reference().unwrap(), Reference::from_hash([1; 32]));
        assert_eq!(single.target_schema().unwrap().name(), Some("cxo.Sample"));

        let others = v.field_by_name("Others").unwrap();
        assert_eq!(others.len().unwrap(), 2);
        assert_eq!(others.references().unwrap().items[1], Reference::from_hash([3; 32]));
        assert!(matches!(others.reference(), Err(SchemaError::TypeMismatch { .. })));
    }

    #[test]
    fn dynamic_references() {
        let registry = registry();
        let sample_ref = registry.schema_reference("cxo.Sample").unwrap();
        let typed = Dynamic::new(sample_ref, Reference::from_hash([4; 32]));
        let data = encode(typed);
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);
        let any = v.field_by_name("Any").unwrap();
        assert_eq!(any.dynamic().unwrap(), typed);
        assert_eq!(any.target_schema().unwrap().name(), Some("cxo.Sample"));

        let orphan = Dynamic::new(SchemaRef::blank(), Reference::from_hash([4; 32]));
        let data = encode(orphan);
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);
        assert_eq!(
            v.field_by_name("Any").unwrap().dynamic().unwrap_err(),
            SchemaError::InvalidDynamicReference
        );
    }

    #[test]
    fn malformed_data() {
        let registry = registry();
        let mut data = encode(Dynamic::default());
        data.truncate(20);
        let v = Value::new(registry.schema_by_name("cxo.Sample").unwrap(), &data);
        assert_eq!(
            v.field_by_name("Any").unwrap_err(),
            SchemaError::InvalidSchemaOrData
        );

        let mut bad = Vec::new();
        put_len(&mut bad, 2);
        bad.extend_from_slice(&[0xff, 0xfe]);
        let registry = Registry::new(|r| r.register::<String>("cxo.Str")).unwrap();
        let v = Value::new(registry.schema_by_name("cxo.Str").unwrap(), &bad);
        assert_eq!(v.string().unwrap_err(), SchemaError::InvalidUtf8);
    }
}

//! Type declarations: how application types describe their shape.
//!
//! Application types implement [`Declare`] by hand, listing their fields
//! through [`FieldDecl`]:
//!
//! ```ignore
//! impl Declare for Group {
//!     fn layout() -> Layout {
//!         Layout::Struct(vec![
//!             FieldDecl::new::<String>("Name"),
//!             FieldDecl::references("Members", "cxo.User"),
//!         ])
//!     }
//! }
//! ```
//!
//! Nested types are described by [`TypeDesc`], which holds a function
//! pointer instead of the nested layout itself. Declaring a type that
//! contains itself therefore never recurses at declaration time.

use std::any::{type_name, TypeId};
use std::fmt;

use cxo_types::Reference;

use crate::kind::Kind;
use crate::reference::{Dynamic, Refs};

/// Separator between tag parts.
const TAG_SEPARATOR: char = ',';
/// Tag part naming the target schema of a reference field.
const TAG_SCHEMA: &str = "schema=";
/// Tag part excluding a field from the schema.
const TAG_EXCLUDE: &str = "-";
/// Field name that is always excluded.
pub const IGNORED_FIELD: &str = "_";

/// A type that can be registered or nested in registered types.
pub trait Declare: 'static {
    fn layout() -> Layout;
}

/// Shallow shape of a declared type.
#[derive(Clone, Debug)]
pub enum Layout {
    /// bool, integers, floats and `String`.
    Scalar(Kind),
    Slice(TypeDesc),
    Array(usize, TypeDesc),
    Struct(Vec<FieldDecl>),
    /// [`Reference`] marker: one object.
    Ref,
    /// [`Refs`] marker: a list of objects.
    Refs,
    /// [`Dynamic`] marker: one object with its schema.
    Dynamic,
}

impl Layout {
    /// Returns `true` for the three reference markers.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Ref | Self::Refs | Self::Dynamic)
    }
}

/// Lazy handle to a declared type.
#[derive(Clone, Copy)]
pub struct TypeDesc {
    id: TypeId,
    name: &'static str,
    layout: fn() -> Layout,
}

impl TypeDesc {
    pub fn of<T: Declare>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            layout: T::layout,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Rust type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn layout(&self) -> Layout {
        (self.layout)()
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDesc({})", self.name)
    }
}

/// Declaration of one struct field.
#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub(crate) name: String,
    pub(crate) tag: String,
    pub(crate) ty: TypeDesc,
    pub(crate) private: bool,
}

impl FieldDecl {
    /// Field of type `T`.
    pub fn new<T: Declare>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: String::new(),
            ty: TypeDesc::of::<T>(),
            private: false,
        }
    }

    /// Single reference to an object of the registered type `target`.
    pub fn reference(name: impl Into<String>, target: &str) -> Self {
        Self::new::<Reference>(name).tag(format!("{TAG_SCHEMA}{target}"))
    }

    /// List of references to objects of the registered type `target`.
    pub fn references(name: impl Into<String>, target: &str) -> Self {
        Self::new::<Refs>(name).tag(format!("{TAG_SCHEMA}{target}"))
    }

    /// Reference whose target schema travels with the value.
    pub fn dynamic(name: impl Into<String>) -> Self {
        Self::new::<Dynamic>(name)
    }

    /// Set the declaration tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Mark the field as not part of the encoded shape.
    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the field is left out of the schema: private, named
    /// [`IGNORED_FIELD`], or tagged with `-`.
    pub fn is_excluded(&self) -> bool {
        self.private
            || self.name == IGNORED_FIELD
            || tag_parts(&self.tag).any(|part| part == TAG_EXCLUDE)
    }
}

fn tag_parts(tag: &str) -> impl Iterator<Item = &str> {
    tag.split(TAG_SEPARATOR).map(str::trim).filter(|p| !p.is_empty())
}

/// Extract the target schema name from a tag such as `"schema=cxo.User"`.
pub fn tag_schema_name(tag: &str) -> Result<&str, String> {
    if tag.trim().is_empty() {
        return Err(r#"empty tag, expected "schema=Name""#.into());
    }
    for part in tag_parts(tag) {
        let Some(name) = part.strip_prefix(TAG_SCHEMA) else {
            continue;
        };
        if name.is_empty() {
            return Err(format!("empty tag schema name: {part:?}"));
        }
        if name.contains('=') {
            return Err(format!("invalid schema tag: {part:?}"));
        }
        return Ok(name);
    }
    Err(format!("no schema name in tag: {tag:?}"))
}

macro_rules! declare_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Declare for $ty {
                fn layout() -> Layout {
                    Layout::Scalar(Kind::$kind)
                }
            }
        )*
    };
}

declare_scalar!(
    bool => Bool,
    i8 => Int8,
    u8 => Uint8,
    i16 => Int16,
    u16 => Uint16,
    i32 => Int32,
    u32 => Uint32,
    i64 => Int64,
    u64 => Uint64,
    f32 => Float32,
    f64 => Float64,
    String => String,
);

impl<T: Declare> Declare for Vec<T> {
    fn layout() -> Layout {
        Layout::Slice(TypeDesc::of::<T>())
    }
}

impl<T: Declare, const N: usize> Declare for [T; N] {
    fn layout() -> Layout {
        Layout::Array(N, TypeDesc::of::<T>())
    }
}

impl Declare for Reference {
    fn layout() -> Layout {
        Layout::Ref
    }
}

impl Declare for Refs {
    fn layout() -> Layout {
        Layout::Refs
    }
}

impl Declare for Dynamic {
    fn layout() -> Layout {
        Layout::Dynamic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_schema_name_parses() {
        assert_eq!(tag_schema_name("schema=cxo.User"), Ok("cxo.User"));
        assert_eq!(tag_schema_name("json:x, schema=cxo.User"), Ok("cxo.User"));
    }

    #[test]
    fn tag_schema_name_errors() {
        assert!(tag_schema_name("").is_err());
        assert!(tag_schema_name("schema=").is_err());
        assert!(tag_schema_name("schema=a=b").is_err());
        assert!(tag_schema_name("other=1").is_err());
    }

    #[test]
    fn exclusion_rules() {
        assert!(!FieldDecl::new::<u32>("Age").is_excluded());
        assert!(FieldDecl::new::<u32>("Age").private().is_excluded());
        assert!(FieldDecl::new::<u32>("_").is_excluded());
        assert!(FieldDecl::new::<u32>("Age").tag("-").is_excluded());
        assert!(FieldDecl::new::<u32>("Age").tag("x, -").is_excluded());
        assert!(!FieldDecl::new::<u32>("Age").tag("x-y").is_excluded());
    }

    #[test]
    fn reference_helpers_set_tags() {
        let f = FieldDecl::reference("Owner", "cxo.User");
        assert_eq!(f.tag, "schema=cxo.User");
        assert!(matches!(f.ty.layout(), Layout::Ref));

        let f = FieldDecl::references("Members", "cxo.User");
        assert!(matches!(f.ty.layout(), Layout::Refs));

        let f = FieldDecl::dynamic("Any");
        assert!(f.tag.is_empty());
        assert!(matches!(f.ty.layout(), Layout::Dynamic));
    }

    #[test]
    fn container_layouts() {
        assert!(matches!(<Vec<u8>>::layout(), Layout::Slice(d) if d.id() == TypeId::of::<u8>()));
        assert!(matches!(<[u16; 3]>::layout(), Layout::Array(3, _)));
        assert!(matches!(String::layout(), Layout::Scalar(Kind::String)));
        assert!(Refs::layout().is_reference());
        assert!(!bool::layout().is_reference());
    }
}

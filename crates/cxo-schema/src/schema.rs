//! The schema model: shape descriptors for encoded values.

use std::fmt;

use crate::error::SchemaResult;
use crate::kind::{Kind, ReferenceKind};

/// Shape of an encoded value.
///
/// Nested named types are never embedded: they appear as
/// [`Schema::Placeholder`] and are linked to the registry entry holding the
/// full schema when the registry is finalized. This keeps every `Schema`
/// a finite tree even when the named types refer to each other in cycles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schema {
    /// Fixed-size scalar or string.
    Scalar { kind: Kind, name: Option<String> },
    /// Fixed number of elements, no count prefix.
    Array {
        name: Option<String>,
        length: usize,
        elem: Box<Schema>,
    },
    /// Count-prefixed sequence.
    Slice {
        name: Option<String>,
        elem: Box<Schema>,
    },
    /// Ordered fields.
    Struct {
        name: Option<String>,
        fields: Vec<Field>,
    },
    /// Reference to other objects. `target` is a placeholder for Single and
    /// Slice references and `None` for Dynamic ones.
    Reference {
        kind: ReferenceKind,
        target: Option<Box<Schema>>,
    },
    /// Named stand-in for a registered schema.
    Placeholder(Placeholder),
}

impl Schema {
    /// Anonymous scalar schema.
    pub fn scalar(kind: Kind) -> Self {
        Self::Scalar { kind, name: None }
    }

    /// Unresolved placeholder for the registered schema `name`.
    pub fn placeholder(kind: Kind, name: impl Into<String>) -> Self {
        Self::Placeholder(Placeholder::new(kind, name))
    }

    /// Reference schema; Single and Slice references point at `target`.
    pub fn reference(kind: ReferenceKind, target: Option<&str>) -> Self {
        Self::Reference {
            kind,
            target: target.map(|name| Box::new(Self::placeholder(Kind::Struct, name))),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Self::Scalar { kind, .. } => *kind,
            Self::Array { .. } => Kind::Array,
            Self::Slice { .. } => Kind::Slice,
            Self::Struct { .. } => Kind::Struct,
            Self::Reference { .. } => Kind::Reference,
            Self::Placeholder(p) => p.kind,
        }
    }

    /// Registered name, if any. References are never named.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Scalar { name, .. }
            | Self::Array { name, .. }
            | Self::Slice { name, .. }
            | Self::Struct { name, .. } => name.as_deref(),
            Self::Reference { .. } => None,
            Self::Placeholder(p) => Some(&p.name),
        }
    }

    /// Returns `true` for schemas of registered (named) types.
    pub fn is_registered(&self) -> bool {
        self.name().is_some()
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    pub fn reference_kind(&self) -> Option<ReferenceKind> {
        match self {
            Self::Reference { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    /// Visit every placeholder reachable inside this tree (not through other
    /// registry entries). Stops at the first error.
    pub(crate) fn for_each_placeholder_mut<F>(&mut self, mut f: F) -> SchemaResult<()>
    where
        F: FnMut(&mut Placeholder) -> SchemaResult<()>,
    {
        let mut stack: Vec<&mut Schema> = vec![self];
        while let Some(schema) = stack.pop() {
            match schema {
                Self::Scalar { .. } => {}
                Self::Array { elem, .. } | Self::Slice { elem, .. } => stack.push(elem),
                Self::Struct { fields, .. } => {
                    stack.extend(fields.iter_mut().map(|field| &mut field.schema));
                }
                Self::Reference { target, .. } => {
                    if let Some(target) = target {
                        stack.push(target);
                    }
                }
                Self::Placeholder(p) => f(p)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { kind, name } => match name {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "{kind}"),
            },
            Self::Placeholder(p) => write!(f, "{}", p.name),
            Self::Array { length, elem, .. } => write!(f, "[{length}]{elem}"),
            Self::Slice { elem, .. } => write!(f, "[]{elem}"),
            Self::Struct { name, fields } => {
                write!(f, "{} {{", name.as_deref().unwrap_or("struct"))?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ";")?;
                    }
                    write!(f, " {} {}", field.name, field.schema)?;
                }
                if !fields.is_empty() {
                    write!(f, " ")?;
                }
                write!(f, "}}")
            }
            Self::Reference { kind, target } => match (kind, target) {
                (ReferenceKind::Single, Some(t)) => write!(f, "*{t}"),
                (ReferenceKind::Slice, Some(t)) => write!(f, "[]*{t}"),
                _ => write!(f, "dynamic"),
            },
        }
    }
}

/// Named stand-in for a registered schema.
///
/// Two placeholders are equal when kind and name match; the registry slot
/// they resolve to is bookkeeping and never part of the shape.
#[derive(Clone, Debug)]
pub struct Placeholder {
    kind: Kind,
    name: String,
    slot: Option<usize>,
}

impl Placeholder {
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            slot: None,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_resolved(&self) -> bool {
        self.slot.is_some()
    }

    pub(crate) fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub(crate) fn resolve(&mut self, slot: usize, kind: Kind) {
        self.slot = Some(slot);
        self.kind = kind;
    }
}

impl PartialEq for Placeholder {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.name == other.name
    }
}

impl Eq for Placeholder {}

/// A struct field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Declaration tag; carries the target name of reference fields.
    pub tag: String,
    pub schema: Schema,
}

impl Field {
    pub fn new(name: impl Into<String>, tag: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            schema,
        }
    }
}

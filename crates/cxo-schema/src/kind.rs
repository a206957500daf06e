use std::fmt;

/// Primitive or structural tag of a schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    String,
    Slice,
    Array,
    Struct,
    /// Any of the three reference kinds; see [`ReferenceKind`].
    Reference,
}

impl Kind {
    /// Wire code of the kind (never 0).
    pub fn code(&self) -> u32 {
        match self {
            Self::Bool => 1,
            Self::Int8 => 2,
            Self::Uint8 => 3,
            Self::Int16 => 4,
            Self::Uint16 => 5,
            Self::Int32 => 6,
            Self::Uint32 => 7,
            Self::Int64 => 8,
            Self::Uint64 => 9,
            Self::Float32 => 10,
            Self::Float64 => 11,
            Self::String => 12,
            Self::Slice => 13,
            Self::Array => 14,
            Self::Struct => 15,
            Self::Reference => 16,
        }
    }

    /// Parse a wire code.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Bool),
            2 => Some(Self::Int8),
            3 => Some(Self::Uint8),
            4 => Some(Self::Int16),
            5 => Some(Self::Uint16),
            6 => Some(Self::Int32),
            7 => Some(Self::Uint32),
            8 => Some(Self::Int64),
            9 => Some(Self::Uint64),
            10 => Some(Self::Float32),
            11 => Some(Self::Float64),
            12 => Some(Self::String),
            13 => Some(Self::Slice),
            14 => Some(Self::Array),
            15 => Some(Self::Struct),
            16 => Some(Self::Reference),
            _ => None,
        }
    }

    /// Encoded size of a value of this kind, or `None` for variable-size
    /// kinds (strings, slices, arrays, structs, references).
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            Self::Bool | Self::Int8 | Self::Uint8 => Some(1),
            Self::Int16 | Self::Uint16 => Some(2),
            Self::Int32 | Self::Uint32 | Self::Float32 => Some(4),
            Self::Int64 | Self::Uint64 | Self::Float64 => Some(8),
            _ => None,
        }
    }

    /// Scalars are the fixed-size kinds plus strings.
    pub fn is_scalar(&self) -> bool {
        self.fixed_size().is_some() || *self == Self::String
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Slice => "slice",
            Self::Array => "array",
            Self::Struct => "struct",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the three reference shapes a reference schema describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// One target object of a statically known schema.
    Single,
    /// An ordered list of targets of a statically known schema.
    Slice,
    /// One target whose schema travels with the value.
    Dynamic,
}

impl ReferenceKind {
    /// Wire discriminator. 0 is reserved for "not a reference".
    pub fn code(&self) -> u32 {
        match self {
            Self::Single => 1,
            Self::Slice => 2,
            Self::Dynamic => 3,
        }
    }

    /// Parse a wire discriminator; `Ok(None)` means "not a reference".
    pub fn from_code(code: u32) -> Result<Option<Self>, u32> {
        match code {
            0 => Ok(None),
            1 => Ok(Some(Self::Single)),
            2 => Ok(Some(Self::Slice)),
            3 => Ok(Some(Self::Dynamic)),
            other => Err(other),
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Slice => write!(f, "slice"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

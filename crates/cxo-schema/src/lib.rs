//! # cxo-schema
//!
//! Content-addressed schema registry for CXO objects.
//!
//! Applications declare their types once with [`Registry::new`]. The
//! resulting registry is immutable, encodes canonically and is identified
//! by the digest of that encoding, so peers can exchange it by reference.
//! Given a schema, the size engine measures encoded data and [`Value`]
//! reads it lazily without any reflection.
//!
//! ## Modules
//!
//! - [`kind`]: value kinds and reference kinds
//! - [`schema`]: the schema model
//! - [`declare`]: how Rust types describe their layout
//! - [`registrar`] / [`registry`]: building, finalizing and looking up
//! - [`codec`]: self-describing schema encoding
//! - [`size`]: encoded-size computation
//! - [`value`]: lazy value access
//! - [`encoding`] / [`reference`]: primitive and reference wire layouts

pub mod codec;
pub mod declare;
pub mod encoding;
pub mod error;
pub mod kind;
pub mod reference;
pub mod registrar;
pub mod registry;
pub mod schema;
pub mod size;
pub mod value;
pub mod view;

pub use codec::{decode_schema, encode_schema};
pub use declare::{Declare, FieldDecl, Layout, TypeDesc};
pub use encoding::{Decoder, Encode};
pub use error::{SchemaError, SchemaResult};
pub use kind::{Kind, ReferenceKind};
pub use reference::{Dynamic, Refs, DYNAMIC_SIZE, REFERENCE_SIZE, REFS_LAYOUT_VERSION};
pub use registrar::Registrar;
pub use registry::Registry;
pub use schema::{Field, Placeholder, Schema};
pub use value::Value;
pub use view::{FieldView, SchemaView};

//! Foundation identifiers for CXO.
//!
//! Every registry, schema and data object exchanged between CXO peers is
//! named by a fixed-width digest of its canonical encoding. This crate holds
//! those identifiers; computing them is the job of `cxo-crypto`.
//!
//! # Key Types
//!
//! - [`Reference`]: digest of an encoded data object
//! - [`SchemaRef`]: digest of an encoded schema
//! - [`RegistryRef`]: digest of an encoded registry
//! - [`FeedId`]: public identity of a feed

pub mod digest;
pub mod error;
pub mod feed;

pub use digest::{Reference, RegistryRef, SchemaRef, DIGEST_LEN};
pub use error::TypeError;
pub use feed::FeedId;

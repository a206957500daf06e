//! Object storage for CXO.
//!
//! Every object is an immutable byte string identified by its BLAKE3 digest
//! (domain-separated from schema and registry digests). Backends implement
//! [`ObjectStore`]; [`Pack`] pairs a backend with a [`Registry`] so stored
//! objects can be loaded, checked against their schema and read lazily.
//!
//! # Storage Backends
//!
//! - [`InMemoryObjectStore`]: `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written.
//! 2. Reads verify content against the reference before use.
//! 3. Concurrent reads are always safe.
//! 4. The store never interprets object contents; [`Pack`] does, through
//!    the registry.
//!
//! [`Registry`]: cxo_schema::Registry

pub mod error;
pub mod memory;
pub mod pack;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use pack::{Object, Pack};
pub use traits::{Flags, ObjectStore};

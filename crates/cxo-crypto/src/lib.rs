//! Cryptographic primitives for CXO.
//!
//! Provides domain-separated BLAKE3 hashing used to derive every content
//! identifier: schemas, registries and data objects.
//!
//! All crypto operations wrap established libraries; no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;

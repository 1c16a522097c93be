//! Domain types and pure logic for the proof-of-render service.
//!
//! Everything in this crate is independent of the HTTP layer and the
//! render backend: job records and their status machine, the scene
//! preset catalog, glTF upload validation, SHA-256 digests, proof
//! document generation, and the upload rate limiter.

pub mod error;
pub mod gltf;
pub mod hashing;
pub mod job;
pub mod preset;
pub mod proof;
pub mod rate_limit;

pub use error::CoreError;

//! HTTP surface for the proof-of-render service.
//!
//! Exposes the upload -> render -> poll -> download workflow over axum,
//! backed by a filesystem job store and a pluggable render provider.

pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod store;

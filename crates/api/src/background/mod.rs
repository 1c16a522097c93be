//! Background tasks spawned by the server.
//!
//! - [`monitor`]: per-job poll loop that tracks a dispatched render on the
//!   backend until it completes, fails, or times out.
//! - [`cleanup`]: periodic sweep that removes expired jobs and their files.

pub mod cleanup;
pub mod monitor;

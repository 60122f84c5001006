//! In-memory mail store for integration testing
//!
//! Implements the host traits well enough to run the plugin
//! end-to-end: folders with UIDs and flags, namespaces matched by
//! prefix, transactions that only persist on commit, and failure
//! switches for opening, copying and committing.
//!
//! ## Module layout
//!
//! - `store` -- the store, its folders and the builder
//! - `logs` -- capture `tracing` output for assertions

pub mod store;

pub use logs::capture_logs;
pub use store::{FakeStore, FakeStoreBuilder};

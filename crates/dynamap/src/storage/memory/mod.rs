//! In-memory storage backend for testing.
//!
//! [`InMemoryStore`] keeps hash+range tables in ordered maps wrapped in an
//! `Arc<RwLock<_>>`. Besides honoring the store contract (key validation,
//! conditions, batch caps, pagination) it can inject faults, count calls
//! and simulate slow table creation, which is what the executor, batch and
//! lifecycle tests rely on.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynamap::storage::memory::{InMemoryStore, Operation};
//!
//! let store = InMemoryStore::new().with_page_size(10);
//! store.fail_next(Operation::Scan, StoreError::server("InternalServerError", "boom"));
//! ```

mod store;
mod table;

pub use store::{InMemoryStore, Operation};
